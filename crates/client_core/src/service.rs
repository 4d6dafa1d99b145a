//! Boundary to the remote crypto service.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    multipart::{Form, Part},
    Body, Client, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Algorithm, DownloadFolder},
    error::{ApiError, RemoteRejection},
    protocol::{
        AuthenticateRequest, AuthenticateResponse, DecryptFileResponse, DecryptTextResponse,
        EncryptFileResponse, EncryptTextResponse, ServiceReply, SuccessFlag,
        TextOperationRequest, MULTIPART_ALGORITHM_FIELD, MULTIPART_FILE_FIELD,
        MULTIPART_ORIGINAL_FILENAME_FIELD,
    },
};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed service response: {0}")]
    Decode(String),
    #[error(transparent)]
    Rejected(#[from] RemoteRejection),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Contents of the `file` multipart field. Files on disk are streamed, never
/// buffered whole.
#[derive(Debug)]
pub enum UploadBody {
    File(tokio::fs::File),
    Memory(Bytes),
}

#[derive(Debug)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub body: UploadBody,
}

impl FileUpload {
    pub fn in_memory(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            body: UploadBody::Memory(bytes),
        }
    }
}

#[async_trait]
pub trait CryptoService: Send + Sync {
    /// Denials come back as `Ok` with `access_granted == false`; only
    /// transport and decode problems are errors.
    async fn authenticate(&self, key: &str) -> Result<AuthenticateResponse, ServiceError>;
    async fn encrypt_text(
        &self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<EncryptTextResponse, ServiceError>;
    async fn decrypt_text(
        &self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<DecryptTextResponse, ServiceError>;
    async fn encrypt_file(
        &self,
        upload: FileUpload,
        algorithm: Algorithm,
    ) -> Result<EncryptFileResponse, ServiceError>;
    async fn decrypt_file(
        &self,
        upload: FileUpload,
        algorithm: Algorithm,
        original_filename: &str,
    ) -> Result<DecryptFileResponse, ServiceError>;
    async fn download(
        &self,
        folder: DownloadFolder,
        filename: &str,
    ) -> Result<Vec<u8>, ServiceError>;
}

pub struct HttpCryptoService {
    http: Client,
    base_url: Url,
}

impl HttpCryptoService {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(server_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ServiceError::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    pub fn download_url(&self, folder: DownloadFolder, filename: &str) -> Result<Url, ServiceError> {
        let mut url = self.endpoint("download/")?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::Transport("server url cannot be a base".to_string()))?
            .pop_if_empty()
            .push(folder.as_str())
            .push(filename);
        Ok(url)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + SuccessFlag,
    {
        let url = self.endpoint(path)?;
        let response = self.http.post(url).json(body).send().await?;
        read_reply(path, response).await
    }

    async fn post_multipart<T>(&self, path: &str, form: Form) -> Result<T, ServiceError>
    where
        T: DeserializeOwned + SuccessFlag,
    {
        let url = self.endpoint(path)?;
        let response = self.http.post(url).multipart(form).send().await?;
        read_reply(path, response).await
    }
}

async fn read_reply<T>(path: &str, response: reqwest::Response) -> Result<T, ServiceError>
where
    T: DeserializeOwned + SuccessFlag,
{
    let status = response.status();
    let bytes = response.bytes().await?;
    let reply: ServiceReply<T> = serde_json::from_slice(&bytes).map_err(|err| {
        warn!(path, %status, "undecodable service response: {err}");
        ServiceError::Decode(format!("HTTP {status}: {err}"))
    })?;

    match reply {
        ServiceReply::Success(body) if body.success() => {
            debug!(path, %status, "service call succeeded");
            Ok(body)
        }
        ServiceReply::Success(_) => Err(RemoteRejection::new(format!(
            "service reported failure (HTTP {status})"
        ))
        .into()),
        ServiceReply::Failure(err) => Err(RemoteRejection::from(err).into()),
    }
}

fn file_part(upload: FileUpload) -> Result<Part, ServiceError> {
    let body = match upload.body {
        UploadBody::File(file) => Body::wrap_stream(ReaderStream::new(file)),
        UploadBody::Memory(bytes) => Body::from(bytes),
    };
    let part = Part::stream_with_length(body, upload.size_bytes).file_name(upload.filename);
    if upload.mime_type.is_empty() {
        return Ok(part);
    }
    Ok(part.mime_str(&upload.mime_type)?)
}

#[async_trait]
impl CryptoService for HttpCryptoService {
    async fn authenticate(&self, key: &str) -> Result<AuthenticateResponse, ServiceError> {
        let url = self.endpoint("authenticate")?;
        let response = self
            .http
            .post(url)
            .json(&AuthenticateRequest {
                key: key.to_string(),
            })
            .send()
            .await?;

        // A denial is a 401 carrying the normal body, so the status is not an error here.
        let status = response.status();
        let bytes = response.bytes().await?;
        serde_json::from_slice::<AuthenticateResponse>(&bytes)
            .map_err(|err| ServiceError::Decode(format!("HTTP {status}: {err}")))
    }

    async fn encrypt_text(
        &self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<EncryptTextResponse, ServiceError> {
        self.post_json(
            "encrypt-text",
            &TextOperationRequest {
                text: text.to_string(),
                algorithm,
            },
        )
        .await
    }

    async fn decrypt_text(
        &self,
        text: &str,
        algorithm: Algorithm,
    ) -> Result<DecryptTextResponse, ServiceError> {
        self.post_json(
            "decrypt-text",
            &TextOperationRequest {
                text: text.to_string(),
                algorithm,
            },
        )
        .await
    }

    async fn encrypt_file(
        &self,
        upload: FileUpload,
        algorithm: Algorithm,
    ) -> Result<EncryptFileResponse, ServiceError> {
        let form = Form::new()
            .part(MULTIPART_FILE_FIELD, file_part(upload)?)
            .text(MULTIPART_ALGORITHM_FIELD, algorithm.as_str());
        self.post_multipart("encrypt-file", form).await
    }

    async fn decrypt_file(
        &self,
        upload: FileUpload,
        algorithm: Algorithm,
        original_filename: &str,
    ) -> Result<DecryptFileResponse, ServiceError> {
        let form = Form::new()
            .part(MULTIPART_FILE_FIELD, file_part(upload)?)
            .text(MULTIPART_ALGORITHM_FIELD, algorithm.as_str())
            .text(
                MULTIPART_ORIGINAL_FILENAME_FIELD,
                original_filename.to_string(),
            );
        self.post_multipart("decrypt-file", form).await
    }

    async fn download(
        &self,
        folder: DownloadFolder,
        filename: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        let url = self.download_url(folder, filename)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let reason = match serde_json::from_slice::<ApiError>(&bytes) {
            Ok(body) => body.reason(),
            Err(_) if status == StatusCode::NOT_FOUND => "File not found".to_string(),
            Err(_) => format!("download failed with HTTP {status}"),
        };
        Err(RemoteRejection::new(reason).into())
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
