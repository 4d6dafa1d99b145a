use serde::{Deserialize, Serialize};

use crate::{domain::Algorithm, error::ApiError};

pub const MULTIPART_FILE_FIELD: &str = "file";
pub const MULTIPART_ALGORITHM_FIELD: &str = "algorithm";
pub const MULTIPART_ORIGINAL_FILENAME_FIELD: &str = "original_filename";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub access_granted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthenticateResponse {
    pub fn granted(&self) -> bool {
        self.success && self.access_granted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOperationRequest {
    pub text: String,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptTextResponse {
    pub success: bool,
    pub encrypted_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    pub original_length: u64,
    pub encrypted_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptTextResponse {
    pub success: bool,
    pub decrypted_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    pub encrypted_length: u64,
    pub decrypted_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptFileResponse {
    pub success: bool,
    pub encrypted_filename: String,
    pub original_filename: String,
    pub algorithm: Algorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_size: Option<u64>,
    /// Encrypted size as a percentage of the original size.
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecryptFileResponse {
    pub success: bool,
    pub decrypted_filename: String,
    pub algorithm: Algorithm,
    pub file_size: u64,
    pub encrypted_size: u64,
}

/// Either the typed success body of a route or the service's error body.
///
/// `Success` is tried first; a body missing any required success field falls
/// through to `Failure`, which accepts anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServiceReply<T> {
    Success(T),
    Failure(ApiError),
}

/// Success bodies all carry the service's `success` flag.
pub trait SuccessFlag {
    fn success(&self) -> bool;
}

macro_rules! success_flag {
    ($($name:ident),* $(,)?) => {
        $(
            impl SuccessFlag for $name {
                fn success(&self) -> bool {
                    self.success
                }
            }
        )*
    };
}

success_flag!(
    EncryptTextResponse,
    DecryptTextResponse,
    EncryptFileResponse,
    DecryptFileResponse,
);
