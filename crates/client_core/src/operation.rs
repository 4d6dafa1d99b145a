use shared::{
    domain::{Algorithm, DownloadFolder, OperationKind},
    protocol::{DecryptFileResponse, DecryptTextResponse, EncryptFileResponse, EncryptTextResponse},
};

use crate::{
    error::OperationError,
    file_selection::SelectedFile,
    service::{CryptoService, FileUpload},
};

/// One operation, ready to be sent. Text kinds carry text and file kinds
/// carry the selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    EncryptText { text: String, algorithm: Algorithm },
    DecryptText { text: String, algorithm: Algorithm },
    EncryptFile { file: SelectedFile, algorithm: Algorithm },
    DecryptFile { file: SelectedFile, algorithm: Algorithm },
}

impl OperationRequest {
    pub fn encrypt_text(text: impl Into<String>, algorithm: Algorithm) -> Self {
        OperationRequest::EncryptText {
            text: text.into(),
            algorithm,
        }
    }

    pub fn decrypt_text(text: impl Into<String>, algorithm: Algorithm) -> Self {
        OperationRequest::DecryptText {
            text: text.into(),
            algorithm,
        }
    }

    pub fn encrypt_file(file: SelectedFile, algorithm: Algorithm) -> Self {
        OperationRequest::EncryptFile { file, algorithm }
    }

    pub fn decrypt_file(file: SelectedFile, algorithm: Algorithm) -> Self {
        OperationRequest::DecryptFile { file, algorithm }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::EncryptText { .. } => OperationKind::EncryptText,
            OperationRequest::DecryptText { .. } => OperationKind::DecryptText,
            OperationRequest::EncryptFile { .. } => OperationKind::EncryptFile,
            OperationRequest::DecryptFile { .. } => OperationKind::DecryptFile,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            OperationRequest::EncryptText { algorithm, .. }
            | OperationRequest::DecryptText { algorithm, .. }
            | OperationRequest::EncryptFile { algorithm, .. }
            | OperationRequest::DecryptFile { algorithm, .. } => *algorithm,
        }
    }

    /// The submitted text, for text operations.
    pub fn text(&self) -> Option<&str> {
        match self {
            OperationRequest::EncryptText { text, .. }
            | OperationRequest::DecryptText { text, .. } => Some(text),
            OperationRequest::EncryptFile { .. } | OperationRequest::DecryptFile { .. } => None,
        }
    }

    /// What the visualization shows as the input: the text or the file name.
    pub fn display_input(&self) -> &str {
        match self {
            OperationRequest::EncryptText { text, .. }
            | OperationRequest::DecryptText { text, .. } => text,
            OperationRequest::EncryptFile { file, .. }
            | OperationRequest::DecryptFile { file, .. } => &file.name,
        }
    }

    pub fn progress_title(&self) -> &'static str {
        match self.kind() {
            OperationKind::EncryptText => "Encrypting text...",
            OperationKind::DecryptText => "Decrypting text...",
            OperationKind::EncryptFile => "Encrypting file...",
            OperationKind::DecryptFile => "Decrypting file...",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    EncryptedText(EncryptTextResponse),
    DecryptedText(DecryptTextResponse),
    EncryptedFile(EncryptFileResponse),
    DecryptedFile(DecryptFileResponse),
}

impl OperationResult {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationResult::EncryptedText(_) => OperationKind::EncryptText,
            OperationResult::DecryptedText(_) => OperationKind::DecryptText,
            OperationResult::EncryptedFile(_) => OperationKind::EncryptFile,
            OperationResult::DecryptedFile(_) => OperationKind::DecryptFile,
        }
    }

    /// Ciphertext, plaintext, or the name of the produced file.
    pub fn produced(&self) -> &str {
        match self {
            OperationResult::EncryptedText(reply) => &reply.encrypted_text,
            OperationResult::DecryptedText(reply) => &reply.decrypted_text,
            OperationResult::EncryptedFile(reply) => &reply.encrypted_filename,
            OperationResult::DecryptedFile(reply) => &reply.decrypted_filename,
        }
    }

    pub fn produced_filename(&self) -> Option<&str> {
        match self {
            OperationResult::EncryptedFile(reply) => Some(&reply.encrypted_filename),
            OperationResult::DecryptedFile(reply) => Some(&reply.decrypted_filename),
            _ => None,
        }
    }

    /// Length statistics for text results.
    pub fn size_stats(&self) -> Option<SizeStats> {
        match self {
            OperationResult::EncryptedText(reply) => Some(SizeStats::expansion(
                reply.original_length,
                reply.encrypted_length,
            )),
            OperationResult::DecryptedText(reply) => Some(SizeStats::reduction(
                reply.encrypted_length,
                reply.decrypted_length,
            )),
            _ => None,
        }
    }

    /// Signed size change shown on the file result surface.
    pub fn file_size_change(&self) -> Option<f64> {
        match self {
            OperationResult::EncryptedFile(reply) => Some(reply.compression_ratio - 100.0),
            OperationResult::DecryptedFile(reply) => {
                if reply.encrypted_size == 0 {
                    return Some(0.0);
                }
                let encrypted = reply.encrypted_size as f64;
                Some((reply.file_size as f64 - encrypted) / encrypted * 100.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeDirection {
    Expansion,
    Reduction,
}

/// Lengths before and after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeStats {
    pub input_length: u64,
    pub output_length: u64,
    pub direction: SizeDirection,
}

impl SizeStats {
    pub fn expansion(original_length: u64, encrypted_length: u64) -> Self {
        Self {
            input_length: original_length,
            output_length: encrypted_length,
            direction: SizeDirection::Expansion,
        }
    }

    pub fn reduction(encrypted_length: u64, decrypted_length: u64) -> Self {
        Self {
            input_length: encrypted_length,
            output_length: decrypted_length,
            direction: SizeDirection::Reduction,
        }
    }

    /// Growth for encryption, shrinkage for decryption, relative to the input.
    pub fn percent(&self) -> f64 {
        if self.input_length == 0 {
            return 0.0;
        }
        let input = self.input_length as f64;
        let output = self.output_length as f64;
        match self.direction {
            SizeDirection::Expansion => (output - input) / input * 100.0,
            SizeDirection::Reduction => (input - output) / input * 100.0,
        }
    }

    pub fn label(&self) -> String {
        let sign = match self.direction {
            SizeDirection::Expansion => '+',
            SizeDirection::Reduction => '-',
        };
        format!("{sign}{:.1}%", self.percent())
    }
}

/// Download target recorded by the last successful file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOperation {
    pub kind: OperationKind,
    pub filename: String,
    pub algorithm: Algorithm,
}

impl LastOperation {
    pub fn folder(&self) -> DownloadFolder {
        DownloadFolder::for_kind(self.kind)
    }
}

/// Issues the single service call for `request`.
pub async fn perform(
    service: &dyn CryptoService,
    request: &OperationRequest,
) -> Result<OperationResult, OperationError> {
    match request {
        OperationRequest::EncryptText { text, algorithm } => service
            .encrypt_text(text, *algorithm)
            .await
            .map(OperationResult::EncryptedText)
            .map_err(Into::into),
        OperationRequest::DecryptText { text, algorithm } => service
            .decrypt_text(text, *algorithm)
            .await
            .map(OperationResult::DecryptedText)
            .map_err(Into::into),
        OperationRequest::EncryptFile { file, algorithm } => {
            let upload = open_upload(file).await?;
            service
                .encrypt_file(upload, *algorithm)
                .await
                .map(OperationResult::EncryptedFile)
                .map_err(Into::into)
        }
        OperationRequest::DecryptFile { file, algorithm } => {
            let upload = open_upload(file).await?;
            service
                .decrypt_file(upload, *algorithm, &file.decrypted_name_hint())
                .await
                .map(OperationResult::DecryptedFile)
                .map_err(Into::into)
        }
    }
}

async fn open_upload(file: &SelectedFile) -> Result<FileUpload, OperationError> {
    let (body, size_bytes) = file
        .source
        .open()
        .await
        .map_err(|err| OperationError::FileUnreadable(format!("{}: {err}", file.name)))?;
    Ok(FileUpload {
        filename: file.name.clone(),
        mime_type: file.upload_mime().to_string(),
        size_bytes,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_selection::{FileIcon, FileSource};

    #[test]
    fn encryption_expansion_for_hello() {
        // "hello" under AES comes back as 24 base64 characters.
        let stats = SizeStats::expansion(5, 24);
        assert_eq!(stats.percent(), 380.0);
        assert_eq!(stats.label(), "+380.0%");
    }

    #[test]
    fn decryption_reduction_is_relative_to_the_ciphertext() {
        let stats = SizeStats::reduction(24, 5);
        assert_eq!(stats.label(), "-79.2%");
        assert_eq!(SizeStats::reduction(0, 0).percent(), 0.0);
    }

    #[test]
    fn file_size_change_per_direction() {
        let encrypted = OperationResult::EncryptedFile(EncryptFileResponse {
            success: true,
            encrypted_filename: "encrypted_a.txt.enc".into(),
            original_filename: "a.txt".into(),
            algorithm: Algorithm::Aes,
            file_size: Some(100),
            encrypted_size: Some(136),
            compression_ratio: 136.0,
        });
        assert_eq!(encrypted.file_size_change(), Some(36.0));
        assert_eq!(encrypted.produced_filename(), Some("encrypted_a.txt.enc"));
        assert!(encrypted.size_stats().is_none());

        let decrypted = OperationResult::DecryptedFile(DecryptFileResponse {
            success: true,
            decrypted_filename: "decrypted_a.txt".into(),
            algorithm: Algorithm::Aes,
            file_size: 100,
            encrypted_size: 200,
        });
        assert_eq!(decrypted.file_size_change(), Some(-50.0));
        assert_eq!(decrypted.kind(), OperationKind::DecryptFile);
    }

    #[test]
    fn request_exposes_input_and_progress_title() {
        let request = OperationRequest::decrypt_text("U2FsdGVk", Algorithm::Des);
        assert_eq!(request.kind(), OperationKind::DecryptText);
        assert_eq!(request.algorithm(), Algorithm::Des);
        assert_eq!(request.text(), Some("U2FsdGVk"));
        assert_eq!(request.display_input(), "U2FsdGVk");
        assert_eq!(request.progress_title(), "Decrypting text...");
    }

    #[test]
    fn file_requests_carry_the_file_not_text() {
        let file = SelectedFile {
            name: "encrypted_notes.txt.enc".into(),
            size_bytes: 3,
            mime_type: String::new(),
            icon: FileIcon::Other,
            source: FileSource::Memory(bytes::Bytes::from_static(b"abc")),
        };
        let request = OperationRequest::decrypt_file(file, Algorithm::Aes);
        assert_eq!(request.kind(), OperationKind::DecryptFile);
        assert_eq!(request.text(), None);
        assert_eq!(request.display_input(), "encrypted_notes.txt.enc");
        assert_eq!(request.progress_title(), "Decrypting file...");
    }

    #[tokio::test]
    async fn unreadable_file_fails_before_the_service_call() {
        let service = crate::test_support::ScriptedService::new("key");
        let missing = std::env::temp_dir().join("cipherviz_vanished_upload.bin");
        let file = SelectedFile {
            name: "vanished.bin".into(),
            size_bytes: 10,
            mime_type: String::new(),
            icon: FileIcon::Other,
            source: FileSource::Path(missing),
        };

        let err = perform(&service, &OperationRequest::encrypt_file(file, Algorithm::Aes))
            .await
            .expect_err("missing file");
        assert!(matches!(err, OperationError::FileUnreadable(_)));
        assert_eq!(service.operation_calls(), 0);
    }
}
