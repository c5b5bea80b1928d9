use serde::{Deserialize, Serialize};

use crate::FieldDefinition;

/// A named, reusable group of field definitions added to a survey in one step.
///
/// Bundles are read-only templates; adding one copies its definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: String,
    pub bundle_title: String,
    pub question_schemas: Vec<FieldDefinition>,
}

impl Bundle {
    pub fn new(
        id: impl Into<String>,
        bundle_title: impl Into<String>,
        question_schemas: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            id: id.into(),
            bundle_title: bundle_title.into(),
            question_schemas,
        }
    }

    /// Names of the top-level fields this bundle contributes.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.question_schemas.iter().map(|f| f.name.as_str())
    }
}
