//! The single file candidate and the result surface that belongs to it.

use std::{
    io,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::service::UploadBody;

/// 500 MiB.
pub const MAX_FILE_BYTES: u64 = 500 * 1024 * 1024;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Bytes),
}

impl FileSource {
    /// Opens the contents for upload along with their current length. Paths
    /// are opened, not read; memory is shared, not copied.
    pub async fn open(&self) -> io::Result<(UploadBody, u64)> {
        match self {
            FileSource::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let len = file.metadata().await?.len();
                Ok((UploadBody::File(file), len))
            }
            FileSource::Memory(bytes) => {
                Ok((UploadBody::Memory(bytes.clone()), bytes.len() as u64))
            }
        }
    }
}

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub source: FileSource,
}

impl FileCandidate {
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    Image,
    Video,
    Audio,
    Pdf,
    Archive,
    Other,
}

impl FileIcon {
    pub fn classify(mime_type: &str) -> Self {
        let mime_type = mime_type.to_ascii_lowercase();
        if mime_type.starts_with("image/") {
            FileIcon::Image
        } else if mime_type.starts_with("video/") {
            FileIcon::Video
        } else if mime_type.starts_with("audio/") {
            FileIcon::Audio
        } else if mime_type.contains("pdf") {
            FileIcon::Pdf
        } else if mime_type.contains("zip") || mime_type.contains("rar") {
            FileIcon::Archive
        } else {
            FileIcon::Other
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            FileIcon::Image => "🖼️",
            FileIcon::Video => "🎥",
            FileIcon::Audio => "🎵",
            FileIcon::Pdf | FileIcon::Other => "📄",
            FileIcon::Archive => "📦",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub icon: FileIcon,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn display_mime(&self) -> &str {
        if self.mime_type.is_empty() {
            "Unknown"
        } else {
            &self.mime_type
        }
    }

    pub fn upload_mime(&self) -> &str {
        if self.mime_type.is_empty() {
            FALLBACK_MIME_TYPE
        } else {
            &self.mime_type
        }
    }

    pub fn display_size(&self) -> String {
        format_file_size(self.size_bytes)
    }

    /// Name sent as `original_filename` when decrypting: the first ".enc" is dropped.
    pub fn decrypted_name_hint(&self) -> String {
        self.name.replacen(".enc", "", 1)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileRejection {
    #[error("File too large! Maximum size is 500MB")]
    TooLarge { size_bytes: u64, limit: u64 },
}

/// What the result section shows after a file operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FileResultSummary {
    pub title: String,
    pub description: String,
    pub processing_secs: f64,
    pub size_change_percent: f64,
}

impl FileResultSummary {
    pub fn processing_label(&self) -> String {
        format!("{:.1}s", self.processing_secs)
    }

    pub fn size_change_label(&self) -> String {
        let sign = if self.size_change_percent > 0.0 { "+" } else { "" };
        format!("{sign}{:.1}%", self.size_change_percent)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileView {
    pub selected: Option<SelectedFile>,
    pub result: Option<FileResultSummary>,
}

pub struct FileSelection {
    limit: u64,
    view: watch::Sender<FileView>,
}

impl Default for FileSelection {
    fn default() -> Self {
        Self::new(MAX_FILE_BYTES)
    }
}

impl FileSelection {
    pub fn new(limit: u64) -> Self {
        let (view, _) = watch::channel(FileView::default());
        Self { limit, view }
    }

    pub fn select(&mut self, candidate: FileCandidate) -> Result<SelectedFile, FileRejection> {
        if candidate.size_bytes > self.limit {
            return Err(FileRejection::TooLarge {
                size_bytes: candidate.size_bytes,
                limit: self.limit,
            });
        }

        let selected = SelectedFile {
            icon: FileIcon::classify(&candidate.mime_type),
            name: candidate.name,
            size_bytes: candidate.size_bytes,
            mime_type: candidate.mime_type,
            source: candidate.source,
        };
        info!(
            file = %selected.name,
            size_bytes = selected.size_bytes,
            mime = %selected.display_mime(),
            "file selected"
        );
        self.view
            .send_modify(|view| view.selected = Some(selected.clone()));
        Ok(selected)
    }

    pub fn clear(&mut self) {
        self.view.send_if_modified(|view| {
            let changed = view.selected.is_some() || view.result.is_some();
            view.selected = None;
            view.result = None;
            changed
        });
    }

    pub fn current(&self) -> Option<SelectedFile> {
        self.view.borrow().selected.clone()
    }

    pub fn show_result(&mut self, result: FileResultSummary) {
        self.view.send_modify(|view| view.result = Some(result));
    }

    pub fn clear_result(&mut self) {
        self.view.send_if_modified(|view| view.result.take().is_some());
    }

    pub fn result(&self) -> Option<FileResultSummary> {
        self.view.borrow().result.clone()
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn subscribe(&self) -> watch::Receiver<FileView> {
        self.view.subscribe()
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / scale as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{value} {}", UNITS[unit])
}
