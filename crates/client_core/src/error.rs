use shared::domain::OperationKind;
use thiserror::Error;

use crate::{file_selection::FileRejection, service::ServiceError, session::AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    MasterKey,
    Plaintext,
    Ciphertext,
}

impl InputField {
    fn prompt(self) -> &'static str {
        match self {
            InputField::MasterKey => "Please enter the master key",
            InputField::Plaintext => "Please enter text to encrypt",
            InputField::Ciphertext => "Please enter ciphertext to decrypt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLimit {
    RsaText { chars: usize, max: usize },
    File { size_bytes: u64, max: u64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("{}", .0.prompt())]
    EmptyInput(InputField),
    #[error("Invalid key. {remaining} attempts remaining.")]
    InvalidKey { remaining: u32 },
    #[error("Access denied. Too many failed attempts.")]
    LockedOut,
    #[error("Authentication failed. Please try again.")]
    AuthUnavailable(String),
    #[error("Please authenticate first")]
    AccessDenied,
    #[error("{}", size_limit_message(.0))]
    SizeLimitExceeded(SizeLimit),
    #[error("Please select a file first")]
    NoFileSelected,
    #[error("could not read selected file: {0}")]
    FileUnreadable(String),
    #[error("{0}")]
    TransportFailure(String),
    #[error("{0}")]
    RemoteRejected(String),
    #[error("No file to download")]
    NothingToDownload,
}

fn size_limit_message(limit: &SizeLimit) -> String {
    match limit {
        SizeLimit::RsaText { max, .. } => {
            format!("RSA can only encrypt small text (max ~{max} characters)")
        }
        SizeLimit::File { max, .. } => {
            format!("File too large! Maximum size is {}MB", max / (1024 * 1024))
        }
    }
}

impl OperationError {
    /// Detected locally, before any network call or timer.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            OperationError::EmptyInput(_)
                | OperationError::SizeLimitExceeded(_)
                | OperationError::NoFileSelected
                | OperationError::AccessDenied
        )
    }

    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            OperationError::TransportFailure(_) | OperationError::RemoteRejected(_)
        )
    }

    /// Toast title for this error, in the context of `kind` when the error
    /// came out of an operation.
    pub fn title(&self, kind: Option<OperationKind>) -> String {
        match self {
            OperationError::EmptyInput(_) => "Input Required".to_string(),
            OperationError::InvalidKey { .. }
            | OperationError::LockedOut
            | OperationError::AuthUnavailable(_) => "Authentication Failed".to_string(),
            OperationError::AccessDenied => "Access Denied".to_string(),
            OperationError::SizeLimitExceeded(_) => "Size Limit Exceeded".to_string(),
            OperationError::NoFileSelected => "No File Selected".to_string(),
            OperationError::NothingToDownload => "Download Failed".to_string(),
            OperationError::FileUnreadable(_)
            | OperationError::TransportFailure(_)
            | OperationError::RemoteRejected(_) => match kind {
                Some(kind) => format!("{} Failed", kind.noun()),
                None => "Error".to_string(),
            },
        }
    }

    /// Toast body for this error.
    pub fn notice(&self, kind: Option<OperationKind>) -> String {
        match (self, kind) {
            (OperationError::AccessDenied, _) => format!("🔒 {self}"),
            (OperationError::NoFileSelected, Some(OperationKind::DecryptFile)) => {
                "Please select an encrypted file first".to_string()
            }
            (
                OperationError::FileUnreadable(_)
                | OperationError::TransportFailure(_)
                | OperationError::RemoteRejected(_),
                Some(kind),
            ) => {
                let subject = if kind.is_file() { "File " } else { "" };
                let verb = if kind.is_encryption() {
                    "encryption"
                } else {
                    "decryption"
                };
                let subject_verb = if subject.is_empty() {
                    capitalize(verb)
                } else {
                    format!("{subject}{verb}")
                };
                format!("❌ {subject_verb} failed: {self}")
            }
            _ => self.to_string(),
        }
    }
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<AuthError> for OperationError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::EmptyInput => OperationError::EmptyInput(InputField::MasterKey),
            AuthError::InvalidKey { remaining } => OperationError::InvalidKey { remaining },
            AuthError::LockedOut => OperationError::LockedOut,
            AuthError::Unavailable(reason) => OperationError::AuthUnavailable(reason),
        }
    }
}

impl From<ServiceError> for OperationError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Transport(reason) | ServiceError::Decode(reason) => {
                OperationError::TransportFailure(reason)
            }
            ServiceError::Rejected(rejection) => OperationError::RemoteRejected(rejection.message),
        }
    }
}

impl From<FileRejection> for OperationError {
    fn from(value: FileRejection) -> Self {
        match value {
            FileRejection::TooLarge { size_bytes, limit } => {
                OperationError::SizeLimitExceeded(SizeLimit::File {
                    size_bytes,
                    max: limit,
                })
            }
        }
    }
}
