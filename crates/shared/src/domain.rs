use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    Aes,
    Des,
    Rsa,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Aes, Algorithm::Des, Algorithm::Rsa];

    pub fn family(self) -> AlgorithmFamily {
        match self {
            Algorithm::Aes | Algorithm::Des => AlgorithmFamily::Symmetric,
            Algorithm::Rsa => AlgorithmFamily::Asymmetric,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::Rsa => "RSA",
        }
    }

    /// Placeholder shown in the text input for this algorithm.
    pub fn input_hint(self) -> &'static str {
        match self {
            Algorithm::Rsa => "Enter small text (RSA limitation: ~200 characters max)",
            Algorithm::Aes | Algorithm::Des => "Enter your text here...",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown algorithm '{0}', expected one of AES, DES, RSA")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AES" => Ok(Algorithm::Aes),
            "DES" => Ok(Algorithm::Des),
            "RSA" => Ok(Algorithm::Rsa),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmFamily {
    Symmetric,
    Asymmetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    EncryptText,
    DecryptText,
    EncryptFile,
    DecryptFile,
}

impl OperationKind {
    pub fn is_encryption(self) -> bool {
        matches!(self, OperationKind::EncryptText | OperationKind::EncryptFile)
    }

    pub fn is_file(self) -> bool {
        matches!(self, OperationKind::EncryptFile | OperationKind::DecryptFile)
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            OperationKind::EncryptText => "encrypt-text",
            OperationKind::DecryptText => "decrypt-text",
            OperationKind::EncryptFile => "encrypt-file",
            OperationKind::DecryptFile => "decrypt-file",
        }
    }

    /// Verb used in notifications ("Encryption", "Decryption").
    pub fn noun(self) -> &'static str {
        if self.is_encryption() {
            "Encryption"
        } else {
            "Decryption"
        }
    }
}

/// Server-side folder a produced file can be downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadFolder {
    Encrypted,
    Decrypted,
}

impl DownloadFolder {
    pub fn for_kind(kind: OperationKind) -> Self {
        if kind.is_encryption() {
            DownloadFolder::Encrypted
        } else {
            DownloadFolder::Decrypted
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownloadFolder::Encrypted => "encrypted",
            DownloadFolder::Decrypted => "decrypted",
        }
    }
}
