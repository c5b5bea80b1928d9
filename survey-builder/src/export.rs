//! JSON export of the survey document together with its build metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use survey_builder_types::SurveyDocument;

use crate::metadata::{BuildMetadata, Clock, FORMAT_VERSION};

/// File name every export is written under.
pub const EXPORT_FILE_NAME: &str = "survey_export_with_metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The exported file: `{ survey, metadata }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub survey: SurveyDocument,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    #[serde(flatten)]
    pub build: BuildMetadata,
    pub exported_at: DateTime<Utc>,
    pub export_version: String,
}

impl ExportDocument {
    pub fn new(survey: &SurveyDocument, metadata: &BuildMetadata, clock: &dyn Clock) -> Self {
        Self {
            survey: survey.clone(),
            metadata: ExportMetadata {
                build: metadata.clone(),
                exported_at: metadata.stamp(clock),
                export_version: FORMAT_VERSION.to_string(),
            },
        }
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to `dir/survey_export_with_metadata.json`, creating `dir` if
    /// needed. Returns the written path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let dir = dir.as_ref();
        fs_err::create_dir_all(dir)?;
        let path = dir.join(EXPORT_FILE_NAME);
        fs_err::write(&path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "survey exported");
        Ok(path)
    }
}
