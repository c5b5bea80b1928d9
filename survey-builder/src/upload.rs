//! File upload checks, encoding and previews.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use survey_builder_types::{AnswerPath, FileField};

/// Size limit applied when a file question sets no `maxSize` (5 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Why an upload was rejected. The messages are shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file selected")]
    NoFile,

    #[error("File size exceeds limit of {}MB", megabytes(.limit))]
    TooLarge { limit: u64, size: u64 },

    #[error("File type not allowed. Accepted types: {accepted}")]
    TypeNotAllowed { accepted: String },

    #[error("Failed to read file")]
    Read(#[source] std::io::Error),

    #[error("'{0}' is not a file question")]
    NotAFileField(AnswerPath),
}

fn megabytes(bytes: &u64) -> u64 {
    (*bytes as f64 / 1_048_576.0).round() as u64
}

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let bytes = fs_err::read(path).map_err(UploadError::Read)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = extension(&name)
            .as_deref()
            .and_then(mime_for)
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An upload request for the file question at `field`. Only the first
/// selected file is considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub field: AnswerPath,
    pub files: Vec<SelectedFile>,
}

impl UploadRequest {
    pub fn new(field: impl Into<AnswerPath>, file: SelectedFile) -> Self {
        Self {
            field: field.into(),
            files: vec![file],
        }
    }

    /// A request with nothing selected.
    pub fn empty(field: impl Into<AnswerPath>) -> Self {
        Self {
            field: field.into(),
            files: Vec::new(),
        }
    }
}

/// The answer value stored for an accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    /// `data:<mime>;base64,<payload>`
    pub content: String,
}

impl From<UploadedFile> for serde_json::Value {
    fn from(file: UploadedFile) -> Self {
        serde_json::json!({
            "name": file.name,
            "type": file.mime_type,
            "size": file.size,
            "content": file.content,
        })
    }
}

/// What the user sees after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilePreview {
    #[serde(rename_all = "camelCase")]
    Image {
        file_name: String,
        base64_content: String,
        file_size: u64,
        size_text: String,
    },
    #[serde(rename_all = "camelCase")]
    Audio {
        file_name: String,
        base64_content: String,
        file_size: u64,
        size_text: String,
    },
    #[serde(rename_all = "camelCase")]
    Document {
        file_name: String,
        file_type: String,
        file_size: u64,
        icon: String,
        type_text: String,
        size_text: String,
    },
}

impl FilePreview {
    pub fn for_file(file: &UploadedFile) -> Self {
        let size_text = size_text(file.size);
        if file.mime_type.starts_with("image/") {
            Self::Image {
                file_name: file.name.clone(),
                base64_content: file.content.clone(),
                file_size: file.size,
                size_text,
            }
        } else if file.mime_type.starts_with("audio/") {
            Self::Audio {
                file_name: file.name.clone(),
                base64_content: file.content.clone(),
                file_size: file.size,
                size_text,
            }
        } else {
            Self::Document {
                file_name: file.name.clone(),
                file_type: file.mime_type.clone(),
                file_size: file.size,
                icon: document_icon(&file.mime_type).to_string(),
                type_text: document_type_text(&file.mime_type, &file.name).to_string(),
                size_text,
            }
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Image { file_name, .. }
            | Self::Audio { file_name, .. }
            | Self::Document { file_name, .. } => file_name,
        }
    }

    /// One-line description for terminal output.
    pub fn headline(&self) -> String {
        match self {
            Self::Image {
                file_name,
                size_text,
                ..
            } => format!("📷 Image Preview: {file_name} ({size_text})"),
            Self::Audio {
                file_name,
                size_text,
                ..
            } => format!("🎵 Audio Preview: {file_name} ({size_text})"),
            Self::Document {
                file_name,
                icon,
                type_text,
                size_text,
                ..
            } => format!("{icon} {type_text} Uploaded: {file_name} ({size_text})"),
        }
    }
}

/// An accepted upload: the stored answer and its preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub file: UploadedFile,
    pub preview: FilePreview,
}

/// Check the first selected file against the question's limits and encode
/// it.
pub fn accept_upload(
    field: &FileField,
    files: &[SelectedFile],
) -> Result<AcceptedUpload, UploadError> {
    let file = files.first().ok_or(UploadError::NoFile)?;

    let limit = field.max_size.unwrap_or(DEFAULT_MAX_SIZE);
    if file.size() > limit {
        return Err(UploadError::TooLarge {
            limit,
            size: file.size(),
        });
    }

    if let Some(accepted) = field.accepted_types.as_deref()
        && !is_type_accepted(accepted, &file.name, &file.mime_type)
    {
        return Err(UploadError::TypeNotAllowed {
            accepted: accepted.to_string(),
        });
    }

    let mime_type = if file.mime_type.is_empty() {
        FALLBACK_MIME
    } else {
        &file.mime_type
    };
    let uploaded = UploadedFile {
        name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        size: file.size(),
        content: format!("data:{mime_type};base64,{}", STANDARD.encode(&file.bytes)),
    };
    let preview = FilePreview::for_file(&uploaded);

    Ok(AcceptedUpload {
        file: uploaded,
        preview,
    })
}

/// Match a file against a comma-separated whitelist of `type/*` wildcards,
/// exact MIME types and `.ext` extensions.
pub fn is_type_accepted(accepted: &str, file_name: &str, mime_type: &str) -> bool {
    let ext = extension(file_name);
    accepted
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .any(|token| {
            if let Some(wanted) = token.strip_prefix('.') {
                ext.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(wanted))
                    || mime_for(&wanted.to_ascii_lowercase())
                        .is_some_and(|m| m.eq_ignore_ascii_case(mime_type))
            } else if let Some(family) = token.strip_suffix("/*") {
                mime_type
                    .split_once('/')
                    .is_some_and(|(top, _)| top.eq_ignore_ascii_case(family))
            } else {
                token.eq_ignore_ascii_case(mime_type)
            }
        })
}

fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

fn mime_for(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "epub" => "application/epub+zip",
        "mobi" => "application/x-mobipocket-ebook",
        _ => return None,
    })
}

/// `N KB`, rounded to the nearest kilobyte.
pub fn size_text(size: u64) -> String {
    format!("{} KB", (size as f64 / 1024.0).round() as u64)
}

fn document_icon(mime_type: &str) -> &'static str {
    let t = mime_type;
    if t.contains("pdf") {
        "📄"
    } else if t.contains("doc") || t.contains("word") {
        "📝"
    } else if t.contains("excel") || t.contains("sheet") {
        "📊"
    } else if t.contains("text") || t.contains("txt") {
        "📃"
    } else if t.contains("zip") || t.contains("rar") {
        "📦"
    } else {
        "📎"
    }
}

fn document_type_text(mime_type: &str, file_name: &str) -> &'static str {
    let t = mime_type;
    let name = file_name.to_lowercase();
    if t.contains("pdf") {
        "PDF Document"
    } else if t.contains("doc") || t.contains("word") {
        "Word Document"
    } else if t.contains("excel") || t.contains("sheet") {
        "Excel Spreadsheet"
    } else if t.contains("text") || t.contains("txt") {
        "Text File"
    } else if name.contains(".epub") {
        "eBook (EPUB)"
    } else if name.contains(".mobi") {
        "eBook (MOBI)"
    } else {
        "Document"
    }
}
