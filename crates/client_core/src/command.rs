//! User actions as data, mapped onto the controller in one place.

use std::path::PathBuf;

use shared::domain::Algorithm;

use crate::{
    controller::{DownloadedFile, OperationController, TextView},
    error::OperationError,
    file_selection::SelectedFile,
    operation::{LastOperation, OperationResult},
    session::Session,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Authenticate { key: String },
    Logout,
    EncryptText { text: String, algorithm: Algorithm },
    DecryptText { text: String, algorithm: Algorithm },
    SelectFile { path: PathBuf },
    ClearFile,
    ClearText,
    EncryptFile { algorithm: Algorithm },
    DecryptFile { algorithm: Algorithm },
    Download,
    Status,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Authenticate { .. } => "authenticate",
            Command::Logout => "logout",
            Command::EncryptText { .. } => "encrypt_text",
            Command::DecryptText { .. } => "decrypt_text",
            Command::SelectFile { .. } => "select_file",
            Command::ClearFile => "clear_file",
            Command::ClearText => "clear_text",
            Command::EncryptFile { .. } => "encrypt_file",
            Command::DecryptFile { .. } => "decrypt_file",
            Command::Download => "download",
            Command::Status => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub session: Session,
    pub selected_file: Option<SelectedFile>,
    pub last_operation: Option<LastOperation>,
    pub text: TextView,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Done,
    Operation(OperationResult),
    FileSelected(SelectedFile),
    Downloaded(DownloadedFile),
    Status(StatusReport),
}

pub async fn dispatch(
    controller: &mut OperationController,
    cmd: Command,
) -> Result<CommandOutcome, OperationError> {
    tracing::debug!(command = cmd.name(), "dispatching command");

    match cmd {
        Command::Authenticate { key } => {
            controller.authenticate(&key).await?;
            Ok(CommandOutcome::Done)
        }
        Command::Logout => {
            controller.logout();
            Ok(CommandOutcome::Done)
        }
        Command::EncryptText { text, algorithm } => {
            controller.set_text_input(&text);
            controller
                .encrypt_text(&text, algorithm)
                .await
                .map(CommandOutcome::Operation)
        }
        Command::DecryptText { text, algorithm } => {
            controller.set_text_input(&text);
            controller
                .decrypt_text(&text, algorithm)
                .await
                .map(CommandOutcome::Operation)
        }
        Command::SelectFile { path } => controller
            .select_path(&path)
            .await
            .map(CommandOutcome::FileSelected),
        Command::ClearFile => {
            controller.clear_file();
            Ok(CommandOutcome::Done)
        }
        Command::ClearText => {
            controller.clear_text();
            Ok(CommandOutcome::Done)
        }
        Command::EncryptFile { algorithm } => controller
            .encrypt_file(algorithm)
            .await
            .map(CommandOutcome::Operation),
        Command::DecryptFile { algorithm } => controller
            .decrypt_file(algorithm)
            .await
            .map(CommandOutcome::Operation),
        Command::Download => controller
            .download_last()
            .await
            .map(CommandOutcome::Downloaded),
        Command::Status => Ok(CommandOutcome::Status(StatusReport {
            session: controller.session(),
            selected_file: controller.selected_file(),
            last_operation: controller.last_operation().cloned(),
            text: controller.text_view(),
        })),
    }
}
