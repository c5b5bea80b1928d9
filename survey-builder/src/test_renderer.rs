//! Scripted renderer for driving a survey without user interaction.
//!
//! `TestRenderer` replays a fixed list of steps against the host (setting
//! values, uploading files, clearing uploads) and then completes the form.
//! Every step goes through the host exactly like a real renderer's events.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_builder::{Action, Store, SyncRules, TestRenderer};
//!
//! let mut store = Store::new(SyncRules::new());
//! store.dispatch(Action::AddFields(vec![/* ... */]));
//!
//! let notice = store
//!     .run(
//!         &TestRenderer::new()
//!             .with_string("name", "Alice")
//!             .with_int("age", 30),
//!     )
//!     .unwrap();
//! ```

use serde_json::Value;
use survey_builder_types::{AnswerPath, Answers, PathParseError, RenderError};

use crate::renderer::{FormRenderer, RendererHost};
use crate::sync::ValueChange;
use crate::upload::{SelectedFile, UploadError, UploadRequest};

/// One scripted renderer event.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    SetValue { path: String, value: Value },
    Upload { path: String, file: SelectedFile },
    ClearFiles { path: String },
    /// Abort as if the user cancelled.
    Cancel,
}

/// A renderer that replays pre-configured steps.
#[derive(Debug, Clone, Default)]
pub struct TestRenderer {
    steps: Vec<ScriptStep>,
}

/// Error type for TestRenderer.
#[derive(Debug, thiserror::Error)]
pub enum TestRendererError {
    #[error("Invalid answer path: {0}")]
    InvalidPath(#[from] PathParseError),

    #[error("Upload for '{path}' rejected: {source}")]
    UploadRejected {
        path: String,
        #[source]
        source: UploadError,
    },

    #[error("Survey cancelled by user")]
    Cancelled,
}

impl From<TestRendererError> for RenderError {
    fn from(err: TestRendererError) -> Self {
        match err {
            TestRendererError::Cancelled => RenderError::Cancelled,
            TestRendererError::InvalidPath(err) => RenderError::InvalidPath(err),
            other => RenderError::backend("test", other),
        }
    }
}

impl TestRenderer {
    /// Create a renderer with no steps.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Set the answer at `path` (e.g. `household_members[0].member_name`).
    pub fn with_response(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.steps.push(ScriptStep::SetValue {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    /// Add a string response.
    pub fn with_string(self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_response(path, Value::String(value.into()))
    }

    /// Add an integer response.
    pub fn with_int(self, path: impl Into<String>, value: i64) -> Self {
        self.with_response(path, value)
    }

    /// Add a boolean response.
    pub fn with_bool(self, path: impl Into<String>, value: bool) -> Self {
        self.with_response(path, value)
    }

    /// Add a multi-choice response (checkbox, ranking).
    pub fn with_choices<S: Into<String>>(
        self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.with_response(path, Value::Array(values))
    }

    /// Upload a file to the file question at `path`.
    pub fn with_upload(mut self, path: impl Into<String>, file: SelectedFile) -> Self {
        self.steps.push(ScriptStep::Upload {
            path: path.into(),
            file,
        });
        self
    }

    /// Clear the uploads of the file question at `path`.
    pub fn with_clear_files(mut self, path: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::ClearFiles { path: path.into() });
        self
    }

    /// Cancel after the steps configured so far.
    pub fn cancelled(mut self) -> Self {
        self.steps.push(ScriptStep::Cancel);
        self
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }
}

impl FormRenderer for TestRenderer {
    type Error = TestRendererError;

    fn render(&self, host: &mut dyn RendererHost) -> Result<Answers, Self::Error> {
        for step in &self.steps {
            match step {
                ScriptStep::SetValue { path, value } => {
                    let path = AnswerPath::parse(path)?;
                    host.value_changed(ValueChange::user(path, value.clone()));
                }
                ScriptStep::Upload { path, file } => {
                    let field = AnswerPath::parse(path)?;
                    host.upload(UploadRequest::new(field, file.clone()))
                        .map_err(|source| TestRendererError::UploadRejected {
                            path: path.clone(),
                            source,
                        })?;
                }
                ScriptStep::ClearFiles { path } => {
                    host.clear_files(&AnswerPath::parse(path)?);
                }
                ScriptStep::Cancel => return Err(TestRendererError::Cancelled),
            }
        }

        Ok(host.answers().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Notice, Store};
    use crate::sync::SyncRules;
    use serde_json::json;
    use survey_builder_types::{FieldDefinition, FieldKind, FileField, InputType};

    fn store() -> Store {
        let mut store = Store::new(SyncRules::new());
        store.dispatch(crate::Action::AddFields(vec![
            FieldDefinition::text("name", "Name"),
            FieldDefinition::input("age", "Age", InputType::Number),
            FieldDefinition::new("doc", FieldKind::File(FileField::default())),
        ]));
        store
    }

    #[test]
    fn replays_values_and_completes() {
        let mut store = store();
        let notice = store
            .run(&TestRenderer::new().with_string("name", "Alice").with_int("age", 30))
            .unwrap();

        let Notice::Completed(report) = notice else {
            panic!("expected completion");
        };
        assert_eq!(report.answers.get_field("name"), Some(&json!("Alice")));
        assert_eq!(report.answers.get_field("age"), Some(&json!(30)));
        assert!(store.document().is_empty());
    }

    #[test]
    fn cancel_keeps_state() {
        let mut store = store();
        let err = store
            .run(&TestRenderer::new().with_string("name", "Bob").cancelled())
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(store.answers().get_field("name"), Some(&json!("Bob")));
        assert_eq!(store.question_count(), 3);
    }

    #[test]
    fn invalid_path_is_reported() {
        let mut store = store();
        let err = store
            .run(&TestRenderer::new().with_string("a[x]", "1"))
            .unwrap_err();
        assert!(!err.is_cancelled());
        assert!(matches!(err, RenderError::InvalidPath(_)));
    }

    #[test]
    fn upload_then_clear() {
        let mut store = store();
        let renderer = TestRenderer::new()
            .with_upload("doc", SelectedFile::new("a.pdf", "application/pdf", vec![1, 2]))
            .with_clear_files("doc");

        let Notice::Completed(report) = store.run(&renderer).unwrap() else {
            panic!("expected completion");
        };
        assert!(report.answers.is_empty());
        assert_eq!(renderer.steps().len(), 2);
    }

    #[test]
    fn rejected_upload_fails_the_run() {
        let mut store = store();
        let err = store
            .run(&TestRenderer::new().with_upload("name", SelectedFile::new("a.pdf", "", vec![])))
            .unwrap_err();
        assert!(err.to_string().contains("not a file question"));
    }
}
