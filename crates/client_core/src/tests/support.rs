//! In-memory crypto service used by the unit tests.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::{
    domain::{Algorithm, DownloadFolder},
    protocol::{
        AuthenticateResponse, DecryptFileResponse, DecryptTextResponse, EncryptFileResponse,
        EncryptTextResponse,
    },
};

use crate::service::{CryptoService, FileUpload, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Authenticate(String),
    EncryptText {
        text: String,
        algorithm: Algorithm,
    },
    DecryptText {
        text: String,
        algorithm: Algorithm,
    },
    EncryptFile {
        filename: String,
        algorithm: Algorithm,
        size: u64,
    },
    DecryptFile {
        filename: String,
        algorithm: Algorithm,
        original_filename: String,
    },
    Download {
        folder: DownloadFolder,
        filename: String,
    },
}

pub(crate) struct ScriptedService {
    accepted_key: String,
    latency: Duration,
    auth_unavailable: bool,
    fail_with: Mutex<Option<ServiceError>>,
    calls: Mutex<Vec<Call>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedService {
    pub(crate) fn new(accepted_key: &str) -> Self {
        Self {
            accepted_key: accepted_key.to_string(),
            latency: Duration::ZERO,
            auth_unavailable: false,
            fail_with: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn auth_unavailable(mut self) -> Self {
        self.auth_unavailable = true;
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every following operation call fails with `err`.
    pub(crate) fn fail_operations(&self, err: ServiceError) {
        *lock(&self.fail_with) = Some(err);
    }

    pub(crate) fn succeed_operations(&self) {
        *lock(&self.fail_with) = None;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub(crate) fn operation_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, Call::Authenticate(_)))
            .count()
    }

    async fn record(&self, call: Call) -> Result<(), ServiceError> {
        lock(&self.calls).push(call);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match lock(&self.fail_with).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Deterministic stand-in for a block cipher: output is base64 of the input
/// padded to a 16-byte boundary.
pub(crate) fn fake_ciphertext(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let pad = 16 - bytes.len() % 16;
    bytes.extend(std::iter::repeat(pad as u8).take(pad));
    STANDARD.encode(bytes)
}

#[async_trait]
impl CryptoService for ScriptedService {
    async fn authenticate(&self, key: &str) -> Result<AuthenticateResponse, ServiceError> {
        lock(&self.calls).push(Call::Authenticate(key.to_string()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.auth_unavailable {
            return Err(ServiceError::Transport("connection refused".into()));
        }
        let granted = key == self.accepted_key;
        Ok(AuthenticateResponse {
            success: granted,
            access_granted: granted,
            message: None,
        })
    }

    async fn encrypt_text(
        &self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<EncryptTextResponse, ServiceError> {
        self.record(Call::EncryptText {
            text: text.to_string(),
            algorithm,
        })
        .await?;
        let encrypted_text = fake_ciphertext(text);
        Ok(EncryptTextResponse {
            success: true,
            encrypted_length: encrypted_text.len() as u64,
            encrypted_text,
            algorithm: Some(algorithm),
            original_length: text.chars().count() as u64,
        })
    }

    async fn decrypt_text(
        &self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<DecryptTextResponse, ServiceError> {
        self.record(Call::DecryptText {
            text: text.to_string(),
            algorithm,
        })
        .await?;
        Ok(DecryptTextResponse {
            success: true,
            decrypted_text: "hello".to_string(),
            algorithm: Some(algorithm),
            encrypted_length: text.len() as u64,
            decrypted_length: 5,
        })
    }

    async fn encrypt_file(
        &self,
        upload: FileUpload,
        algorithm: Algorithm,
    ) -> Result<EncryptFileResponse, ServiceError> {
        self.record(Call::EncryptFile {
            filename: upload.filename.clone(),
            algorithm,
            size: upload.size_bytes,
        })
        .await?;
        let size = upload.size_bytes;
        Ok(EncryptFileResponse {
            success: true,
            encrypted_filename: format!("encrypted_{}.enc", upload.filename),
            original_filename: upload.filename,
            algorithm,
            file_size: Some(size),
            encrypted_size: Some(size + size / 2),
            compression_ratio: 150.0,
        })
    }

    async fn decrypt_file(
        &self,
        upload: FileUpload,
        algorithm: Algorithm,
        original_filename: &str,
    ) -> Result<DecryptFileResponse, ServiceError> {
        self.record(Call::DecryptFile {
            filename: upload.filename.clone(),
            algorithm,
            original_filename: original_filename.to_string(),
        })
        .await?;
        let size = upload.size_bytes;
        Ok(DecryptFileResponse {
            success: true,
            decrypted_filename: format!("decrypted_{original_filename}"),
            algorithm,
            file_size: size / 2,
            encrypted_size: size,
        })
    }

    async fn download(
        &self,
        folder: DownloadFolder,
        filename: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        self.record(Call::Download {
            folder,
            filename: filename.to_string(),
        })
        .await?;
        Ok(format!("{}/{filename}", folder.as_str()).into_bytes())
    }
}
