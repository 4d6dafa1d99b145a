//! Top-level orchestration of the four operations.
//!
//! Every entry point runs the same pipeline: session guard, local validation,
//! progress and visualization start, exactly one service call, then either
//! result application or failure reporting. Operation methods take
//! `&mut self`, so two operations never interleave on one controller.

use std::{path::Path, sync::Arc, time::Duration};

use shared::domain::{Algorithm, AlgorithmFamily, DownloadFolder, OperationKind};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    clock::{default_clock, Clock},
    config::ClientConfig,
    error::{capitalize, InputField, OperationError, SizeLimit},
    file_selection::{FileCandidate, FileResultSummary, FileSelection, FileView, SelectedFile},
    notify::{NotificationCenter, Toast, ToastKind},
    operation::{self, LastOperation, OperationRequest, OperationResult, SizeStats},
    progress::{ProgressSimulator, ProgressState},
    service::CryptoService,
    session::{Session, SessionGate},
    visualization::{VisualizationEngine, VisualizationEvent, VisualizationSnapshot},
};

/// Text panel: what was submitted, what came back, and its statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextView {
    pub input: String,
    pub output: String,
    pub algorithm: Option<Algorithm>,
    pub stats: Option<SizeStats>,
}

impl TextView {
    pub fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn char_count_label(&self) -> String {
        format!("{} characters", self.char_count())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub folder: DownloadFolder,
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct OperationController {
    service: Arc<dyn CryptoService>,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
    session: SessionGate,
    files: FileSelection,
    progress: ProgressSimulator,
    visualization: VisualizationEngine,
    notifications: NotificationCenter,
    last_operation: Option<LastOperation>,
    text: watch::Sender<TextView>,
}

impl OperationController {
    pub fn new(service: Arc<dyn CryptoService>, config: ClientConfig) -> Self {
        Self::with_clock(service, config, default_clock())
    }

    pub fn with_clock(
        service: Arc<dyn CryptoService>,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timings = config.timings;
        // Progress and visualization draw from separate streams of the same seed.
        let progress_seed = config.rng_seed;
        let visualization_seed = config.rng_seed.map(|seed| seed.wrapping_add(1));
        let (text, _) = watch::channel(TextView::default());

        Self {
            session: SessionGate::new(Arc::clone(&service)),
            files: FileSelection::new(config.max_file_bytes),
            progress: ProgressSimulator::new(
                Arc::clone(&clock),
                timings.progress_tick,
                timings.progress_hide_after,
                progress_seed,
            ),
            visualization: VisualizationEngine::new(
                Arc::clone(&clock),
                timings.visualization(),
                visualization_seed,
            ),
            notifications: NotificationCenter::new(Arc::clone(&clock), timings.toast_visible_for),
            last_operation: None,
            text,
            service,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn last_operation(&self) -> Option<&LastOperation> {
        self.last_operation.as_ref()
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.files.current()
    }

    pub fn text_view(&self) -> TextView {
        self.text.borrow().clone()
    }

    pub async fn authenticate(&mut self, key: &str) -> Result<(), OperationError> {
        match self.session.authenticate(key).await {
            Ok(()) => {
                self.notifications.success(
                    "Authentication Successful",
                    "🎉 Welcome to the Cryptographic System!",
                );
                Ok(())
            }
            Err(err) => {
                let err = OperationError::from(err);
                self.notifications.show(
                    ToastKind::Error,
                    err.title(None),
                    err.notice(None),
                    self.config.timings.auth_toast_visible_for,
                );
                Err(err)
            }
        }
    }

    /// Back to the initial state: signed out, attempts restored, nothing
    /// from the previous session left on screen.
    pub fn logout(&mut self) {
        self.session.logout();
        self.visualization.hide();
        self.files.clear();
        self.last_operation = None;
        self.text.send_if_modified(|view| {
            let changed = *view != TextView::default();
            *view = TextView::default();
            changed
        });
        info!("logged out");
    }

    /// Mirrors the text input as it is typed, for the character counter.
    pub fn set_text_input(&mut self, input: &str) {
        self.text.send_if_modified(|view| {
            if view.input == input {
                return false;
            }
            view.input = input.to_string();
            true
        });
    }

    pub fn clear_text(&mut self) {
        self.text.send_if_modified(|view| {
            let changed = *view != TextView::default();
            *view = TextView::default();
            changed
        });
        self.notifications.success("Reset Complete", "Text cleared");
    }

    pub async fn encrypt_text(
        &mut self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<OperationResult, OperationError> {
        let kind = OperationKind::EncryptText;
        self.ensure_authenticated(kind)?;
        let text = text.trim();
        if text.is_empty() {
            return self.reject(kind, OperationError::EmptyInput(InputField::Plaintext));
        }
        let chars = text.chars().count();
        if algorithm.family() == AlgorithmFamily::Asymmetric && chars > self.config.rsa_max_chars
        {
            return self.reject(
                kind,
                OperationError::SizeLimitExceeded(SizeLimit::RsaText {
                    chars,
                    max: self.config.rsa_max_chars,
                }),
            );
        }

        self.run(OperationRequest::encrypt_text(text, algorithm))
            .await
    }

    pub async fn decrypt_text(
        &mut self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<OperationResult, OperationError> {
        let kind = OperationKind::DecryptText;
        self.ensure_authenticated(kind)?;
        let text = text.trim();
        if text.is_empty() {
            return self.reject(kind, OperationError::EmptyInput(InputField::Ciphertext));
        }

        self.run(OperationRequest::decrypt_text(text, algorithm))
            .await
    }

    pub fn select_file(&mut self, candidate: FileCandidate) -> Result<SelectedFile, OperationError> {
        if !self.is_authenticated() {
            return self.reject_untyped(OperationError::AccessDenied);
        }
        match self.files.select(candidate) {
            Ok(selected) => {
                self.notifications
                    .success("File Ready", format!("📁 File selected: {}", selected.name));
                Ok(selected)
            }
            Err(rejection) => self.reject_untyped(rejection.into()),
        }
    }

    /// Reads metadata for `path` and selects it.
    pub async fn select_path(&mut self, path: &Path) -> Result<SelectedFile, OperationError> {
        if !self.is_authenticated() {
            return self.reject_untyped(OperationError::AccessDenied);
        }
        match FileCandidate::from_path(path).await {
            Ok(candidate) => self.select_file(candidate),
            Err(err) => self.reject_untyped(OperationError::FileUnreadable(format!(
                "{}: {err}",
                path.display()
            ))),
        }
    }

    pub fn clear_file(&mut self) {
        self.files.clear();
        self.notifications
            .success("Reset Complete", "File selection cleared");
    }

    pub async fn encrypt_file(
        &mut self,
        algorithm: Algorithm,
    ) -> Result<OperationResult, OperationError> {
        let kind = OperationKind::EncryptFile;
        self.ensure_authenticated(kind)?;
        let Some(file) = self.files.current() else {
            return self.reject(kind, OperationError::NoFileSelected);
        };

        self.run(OperationRequest::encrypt_file(file, algorithm))
            .await
    }

    pub async fn decrypt_file(
        &mut self,
        algorithm: Algorithm,
    ) -> Result<OperationResult, OperationError> {
        let kind = OperationKind::DecryptFile;
        self.ensure_authenticated(kind)?;
        let Some(file) = self.files.current() else {
            return self.reject(kind, OperationError::NoFileSelected);
        };

        self.run(OperationRequest::decrypt_file(file, algorithm))
            .await
    }

    /// Fetches the file produced by the last file operation.
    pub async fn download_last(&mut self) -> Result<DownloadedFile, OperationError> {
        if !self.is_authenticated() {
            return self.reject_untyped(OperationError::AccessDenied);
        }
        let Some(last) = self.last_operation.clone() else {
            return self.reject_untyped(OperationError::NothingToDownload);
        };

        let folder = last.folder();
        match self.service.download(folder, &last.filename).await {
            Ok(bytes) => {
                info!(folder = folder.as_str(), file = %last.filename, bytes = bytes.len(), "download finished");
                self.notifications
                    .success("Download Initiated", "⬇️ Download started");
                Ok(DownloadedFile {
                    folder,
                    filename: last.filename,
                    bytes,
                })
            }
            Err(err) => {
                let err = OperationError::from(err);
                warn!(folder = folder.as_str(), file = %last.filename, error = %err, "download failed");
                self.notifications.error("Download Failed", err.to_string());
                Err(err)
            }
        }
    }

    async fn run(&mut self, request: OperationRequest) -> Result<OperationResult, OperationError> {
        let kind = request.kind();
        let algorithm = request.algorithm();
        info!(operation = kind.endpoint(), %algorithm, "operation started");

        if let Some(text) = request.text() {
            let submitted = text.to_string();
            self.text.send_modify(|view| {
                view.input = submitted;
                view.output.clear();
                view.algorithm = Some(algorithm);
                view.stats = None;
            });
        }

        let started = self.clock.now();
        self.visualization.begin(algorithm);
        let progress = self.progress.start(request.progress_title());

        let result = match operation::perform(self.service.as_ref(), &request).await {
            Ok(result) => result,
            Err(err) => {
                self.progress.stop(progress);
                self.visualization.abort();
                warn!(operation = kind.endpoint(), %algorithm, error = %err, "operation failed");
                self.notifications
                    .error(err.title(Some(kind)), err.notice(Some(kind)));
                return Err(err);
            }
        };
        let processing = self.clock.now().saturating_duration_since(started);

        if let Err(err) = self
            .visualization
            .play(request.display_input(), result.produced())
            .await
        {
            debug!(error = %err, "visualization did not finish");
        }

        self.apply_result(algorithm, &result, processing);
        self.progress.stop(progress);

        let subject = if kind.is_file() { "File" } else { "Text" };
        let verb = if kind.is_encryption() {
            "encrypted"
        } else {
            "decrypted"
        };
        self.notifications.success(
            format!("{} Complete", kind.noun()),
            format!("✅ {subject} {verb} successfully using {algorithm}"),
        );
        info!(
            operation = kind.endpoint(),
            %algorithm,
            processing_ms = processing.as_millis() as u64,
            "operation finished"
        );
        Ok(result)
    }

    fn apply_result(&mut self, algorithm: Algorithm, result: &OperationResult, processing: Duration) {
        let kind = result.kind();
        if let Some(filename) = result.produced_filename() {
            self.last_operation = Some(LastOperation {
                kind,
                filename: filename.to_string(),
                algorithm: result_algorithm(result).unwrap_or(algorithm),
            });
            let verb = if kind.is_encryption() {
                "encrypted"
            } else {
                "decrypted"
            };
            self.files.show_result(FileResultSummary {
                title: format!("File {} Successfully!", capitalize(verb)),
                description: format!("Your file has been {verb} using {algorithm} algorithm"),
                processing_secs: processing.as_secs_f64(),
                size_change_percent: result.file_size_change().unwrap_or_default(),
            });
            return;
        }

        let output = result.produced().to_string();
        let stats = result.size_stats();
        self.text.send_modify(|view| {
            view.output = output;
            view.algorithm = Some(algorithm);
            view.stats = stats;
        });
    }

    fn ensure_authenticated(&self, kind: OperationKind) -> Result<(), OperationError> {
        if self.is_authenticated() {
            return Ok(());
        }
        self.reject(kind, OperationError::AccessDenied)
    }

    fn reject<T>(&self, kind: OperationKind, err: OperationError) -> Result<T, OperationError> {
        debug!(operation = kind.endpoint(), error = %err, "operation rejected locally");
        self.notifications
            .error(err.title(Some(kind)), err.notice(Some(kind)));
        Err(err)
    }

    fn reject_untyped<T>(&self, err: OperationError) -> Result<T, OperationError> {
        debug!(error = %err, "request rejected locally");
        self.notifications.error(err.title(None), err.notice(None));
        Err(err)
    }

    pub fn subscribe_session(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn subscribe_files(&self) -> watch::Receiver<FileView> {
        self.files.subscribe()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    pub fn subscribe_visualization(&self) -> watch::Receiver<VisualizationSnapshot> {
        self.visualization.subscribe()
    }

    pub fn subscribe_visualization_events(&self) -> broadcast::Receiver<VisualizationEvent> {
        self.visualization.subscribe_events()
    }

    pub fn subscribe_toasts(&self) -> watch::Receiver<Option<Toast>> {
        self.notifications.subscribe()
    }

    pub fn subscribe_posted_toasts(&self) -> broadcast::Receiver<Toast> {
        self.notifications.subscribe_posted()
    }

    pub fn subscribe_text(&self) -> watch::Receiver<TextView> {
        self.text.subscribe()
    }
}

fn result_algorithm(result: &OperationResult) -> Option<Algorithm> {
    match result {
        OperationResult::EncryptedFile(reply) => Some(reply.algorithm),
        OperationResult::DecryptedFile(reply) => Some(reply.algorithm),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
