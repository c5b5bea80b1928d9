//! Application state and the actions that change it.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use survey_builder_types::{
    AnswerPath, Answers, Bundle, FieldDefinition, FieldKind, RenderError, SurveyDocument,
};

use crate::export::ExportDocument;
use crate::merge::merge_fields;
use crate::metadata::{BuildMetadata, Clock, CompletedMetadata, SystemClock};
use crate::renderer::{FormRenderer, RendererHost};
use crate::sync::{FormState, SyncRules, ValueChange, synchronize};
use crate::upload::{FilePreview, UploadError, UploadRequest, accept_upload};

pub const CLEAR_CONFIRMATION: &str =
    "Are you sure you want to clear all questions from the survey? This will also clear all answers.";

/// Something the user asked for.
#[derive(Debug, Clone)]
pub enum Action {
    /// Add a catalog bundle's fields.
    AddBundle(Bundle),
    /// Add loose field definitions.
    AddFields(Vec<FieldDefinition>),
    ValueChanged(ValueChange),
    /// The renderer reported completion.
    Complete,
    /// Remove all fields and answers. Without confirmation this only asks.
    Clear { confirmed: bool },
    Upload(UploadRequest),
    ClearFiles(AnswerPath),
}

/// Outcome of an [`Action`], to be reported to the user.
#[derive(Debug)]
pub enum Notice {
    Added {
        added: Vec<String>,
        duplicates: Vec<String>,
    },
    /// Every field of the addition already exists; nothing changed.
    AllDuplicates { duplicates: Vec<String> },
    Updated,
    Completed(Box<CompletionReport>),
    ConfirmClear,
    Cleared,
    AlreadyEmpty,
    Uploaded(FilePreview),
    UploadRejected(UploadError),
    FilesCleared(AnswerPath),
}

impl Notice {
    /// Notices that need no user-facing message.
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Updated | Self::FilesCleared(_) => true,
            Self::Added { duplicates, .. } => duplicates.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { added, duplicates } if duplicates.is_empty() => {
                write!(f, "Added {} new questions.", added.len())
            }
            Self::Added { added, duplicates } => write!(
                f,
                "Added {} new questions. Skipped duplicates: {}",
                added.len(),
                duplicates.join(", ")
            ),
            Self::AllDuplicates { duplicates } => write!(
                f,
                "This feature (or all of its questions) is already in the survey.\nDuplicate questions: {}",
                duplicates.join(", ")
            ),
            Self::Updated => Ok(()),
            Self::Completed(report) => f.write_str(&report.summary),
            Self::ConfirmClear => f.write_str(CLEAR_CONFIRMATION),
            Self::Cleared => f.write_str("Survey cleared."),
            Self::AlreadyEmpty => f.write_str("Survey is already empty."),
            Self::Uploaded(preview) => f.write_str(&preview.headline()),
            Self::UploadRejected(err) => write!(f, "{err}"),
            Self::FilesCleared(field) => write!(f, "Files cleared for question: {field}"),
        }
    }
}

/// Everything recorded when a survey is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub answers: Answers,
    pub metadata: CompletedMetadata,
    pub summary: String,
}

/// Human-readable list of answers, one `key: value` line each.
pub fn completion_summary(answers: &Answers) -> String {
    let mut text = String::from("Survey completed successfully!\n\nAnswers summary:\n");
    for (key, value) in answers {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        text.push_str(&format!("{key}: {rendered}\n"));
    }
    text.push_str("\nFull details logged to console.");
    text
}

/// The single owner of the survey being built.
///
/// All mutation goes through [`Store::dispatch`]. The render key changes only
/// when the form must be rebuilt from scratch (completion or clear), never on
/// pure additions, so answers already entered survive adding more fields.
#[derive(Debug)]
pub struct Store {
    state: FormState,
    metadata: BuildMetadata,
    previews: BTreeMap<AnswerPath, FilePreview>,
    render_key: u64,
    rules: SyncRules,
    clock: Box<dyn Clock>,
}

impl Store {
    pub fn new(rules: SyncRules) -> Self {
        Self::with_clock(rules, SystemClock)
    }

    pub fn with_clock(rules: SyncRules, clock: impl Clock + 'static) -> Self {
        let metadata = BuildMetadata::new(&clock);
        Self {
            state: FormState::new(SurveyDocument::initial(), Answers::new()),
            metadata,
            previews: BTreeMap::new(),
            render_key: 0,
            rules,
            clock: Box::new(clock),
        }
    }

    pub fn document(&self) -> &SurveyDocument {
        &self.state.document
    }

    pub fn answers(&self) -> &Answers {
        &self.state.answers
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn metadata(&self) -> &BuildMetadata {
        &self.metadata
    }

    pub fn previews(&self) -> &BTreeMap<AnswerPath, FilePreview> {
        &self.previews
    }

    /// Identity of the current form instance.
    pub fn render_key(&self) -> u64 {
        self.render_key
    }

    pub fn question_count(&self) -> usize {
        self.state.document.field_count()
    }

    pub fn dispatch(&mut self, action: Action) -> Notice {
        match action {
            Action::AddBundle(bundle) => {
                tracing::info!(bundle = %bundle.id, "adding bundle");
                self.add_fields(Some(&bundle.id), &bundle.question_schemas)
            }
            Action::AddFields(fields) => self.add_fields(None, &fields),
            Action::ValueChanged(change) => {
                tracing::trace!(path = %change.path, value = %change.value, "value changed");
                self.state = synchronize(&self.rules, &change, &self.state);
                Notice::Updated
            }
            Action::Complete => Notice::Completed(Box::new(self.complete())),
            Action::Clear { confirmed } => self.clear(confirmed),
            Action::Upload(request) => match self.upload_file(request) {
                Ok(preview) => Notice::Uploaded(preview),
                Err(err) => Notice::UploadRejected(err),
            },
            Action::ClearFiles(field) => match self.remove_files(&field) {
                Ok(()) => Notice::FilesCleared(field),
                Err(err) => Notice::UploadRejected(err),
            },
        }
    }

    /// Hand the form to `renderer` and complete the survey with the answers
    /// it returns.
    pub fn run<R: FormRenderer>(&mut self, renderer: &R) -> Result<Notice, RenderError> {
        let answers = renderer.render(self).map_err(Into::into)?;
        self.state.answers = answers;
        Ok(self.dispatch(Action::Complete))
    }

    /// Snapshot for the JSON export.
    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(&self.state.document, &self.metadata, self.clock.as_ref())
    }

    fn add_fields(&mut self, bundle_id: Option<&str>, fields: &[FieldDefinition]) -> Notice {
        let outcome = merge_fields(&self.state.document, fields);
        if outcome.is_noop() {
            tracing::info!(duplicates = ?outcome.duplicates, "nothing added");
            return Notice::AllDuplicates {
                duplicates: outcome.duplicates,
            };
        }

        self.state.document = outcome.document;
        self.metadata.record_addition(
            self.clock.as_ref(),
            bundle_id,
            &outcome.added,
            self.state.document.field_count(),
        );
        tracing::info!(
            added = outcome.added.len(),
            skipped = outcome.duplicates.len(),
            total = self.state.document.field_count(),
            "questions added"
        );

        Notice::Added {
            added: outcome.added,
            duplicates: outcome.duplicates,
        }
    }

    fn complete(&mut self) -> CompletionReport {
        let answers = self.state.answers.clone();
        let metadata =
            self.metadata
                .complete(self.clock.as_ref(), &answers, self.state.document.field_count());
        tracing::info!(
            response_id = %metadata.completion_data.response_id,
            responses = metadata.response_count,
            "survey completed"
        );
        if let Ok(json) = serde_json::to_string_pretty(&metadata) {
            tracing::debug!(metadata = %json, "completion metadata");
        }

        let summary = completion_summary(&answers);
        self.reset();
        CompletionReport {
            answers,
            metadata,
            summary,
        }
    }

    fn clear(&mut self, confirmed: bool) -> Notice {
        if self.state.document.is_empty() {
            return Notice::AlreadyEmpty;
        }
        if !confirmed {
            return Notice::ConfirmClear;
        }
        self.reset();
        tracing::info!("survey cleared");
        Notice::Cleared
    }

    fn reset(&mut self) {
        self.state = FormState::new(SurveyDocument::initial(), Answers::new());
        self.previews.clear();
        self.metadata = BuildMetadata::new(self.clock.as_ref());
        self.render_key += 1;
    }

    fn upload_file(&mut self, request: UploadRequest) -> Result<FilePreview, UploadError> {
        let result = self.store_upload(request);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "upload rejected");
        }
        result
    }

    fn store_upload(&mut self, request: UploadRequest) -> Result<FilePreview, UploadError> {
        let field = match self.state.document.resolve(&request.field).map(|f| &f.kind) {
            Some(FieldKind::File(field)) => field,
            _ => return Err(UploadError::NotAFileField(request.field)),
        };
        let allow_multiple = field.allow_multiple.unwrap_or(false);
        let accepted = accept_upload(field, &request.files)?;

        let entry = Value::from(accepted.file.clone());
        let mut files = match self.state.answers.get(&request.field) {
            Some(Value::Array(existing)) if allow_multiple => existing.clone(),
            _ => Vec::new(),
        };
        files.push(entry);
        self.state.answers.set(&request.field, Value::Array(files));

        tracing::info!(
            field = %request.field,
            name = %accepted.file.name,
            size = %crate::upload::size_text(accepted.file.size),
            "file uploaded"
        );
        self.previews.insert(request.field, accepted.preview.clone());
        Ok(accepted.preview)
    }

    fn remove_files(&mut self, field: &AnswerPath) -> Result<(), UploadError> {
        if !matches!(
            self.state.document.resolve(field).map(|f| &f.kind),
            Some(FieldKind::File(_))
        ) {
            tracing::warn!(%field, "ignoring file clear for a non-file question");
            return Err(UploadError::NotAFileField(field.clone()));
        }
        self.state.answers.remove(field);
        self.previews.remove(field);
        tracing::info!(%field, "files cleared");
        Ok(())
    }
}

impl RendererHost for Store {
    fn document(&self) -> &SurveyDocument {
        &self.state.document
    }

    fn answers(&self) -> &Answers {
        &self.state.answers
    }

    fn panel_count(&self, panel: &AnswerPath) -> usize {
        self.state.panel_count(panel)
    }

    fn value_changed(&mut self, change: ValueChange) {
        self.dispatch(Action::ValueChanged(change));
    }

    fn upload(&mut self, request: UploadRequest) -> Result<FilePreview, UploadError> {
        self.upload_file(request)
    }

    fn clear_files(&mut self, field: &AnswerPath) {
        let _ = self.remove_files(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ManualClock;
    use crate::sync::CountBinding;
    use crate::upload::SelectedFile;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use survey_builder_types::{DynamicPanelField, FileField, InputType};

    fn store() -> Store {
        let rules = SyncRules::new().count(CountBinding::new("children_count", "children_details"));
        Store::with_clock(
            rules,
            ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        )
    }

    fn age_bundle() -> Bundle {
        Bundle::new(
            "bundle_age_v1",
            "Age",
            vec![FieldDefinition::input("age", "What is your age?", InputType::Number)],
        )
    }

    #[test]
    fn adding_twice_reports_duplicate() {
        let mut store = store();
        let notice = store.dispatch(Action::AddBundle(age_bundle()));
        assert!(notice.is_silent());
        assert_eq!(store.question_count(), 1);

        let notice = store.dispatch(Action::AddBundle(age_bundle()));
        assert_eq!(
            notice.to_string(),
            "This feature (or all of its questions) is already in the survey.\nDuplicate questions: age"
        );
        assert_eq!(store.question_count(), 1);
        assert_eq!(store.metadata().total_bundles_added, 1);
    }

    #[test]
    fn partial_addition_message() {
        let mut store = store();
        store.dispatch(Action::AddBundle(age_bundle()));
        let notice = store.dispatch(Action::AddFields(vec![
            FieldDefinition::text("age", "Age"),
            FieldDefinition::text("email", "Email"),
        ]));

        assert!(!notice.is_silent());
        assert_eq!(notice.to_string(), "Added 1 new questions. Skipped duplicates: age");
    }

    #[test]
    fn additions_keep_answers_and_render_key() {
        let mut store = store();
        store.dispatch(Action::AddBundle(age_bundle()));
        store.dispatch(Action::ValueChanged(ValueChange::user("age", 42)));
        let before = store.answers().clone();

        store.dispatch(Action::AddFields(vec![FieldDefinition::text("email", "Email")]));

        assert_eq!(store.answers(), &before);
        assert_eq!(store.render_key(), 0);
    }

    #[test]
    fn clear_needs_confirmation() {
        let mut store = store();
        assert!(matches!(
            store.dispatch(Action::Clear { confirmed: true }),
            Notice::AlreadyEmpty
        ));

        store.dispatch(Action::AddBundle(age_bundle()));
        store.dispatch(Action::ValueChanged(ValueChange::user("age", 42)));

        let notice = store.dispatch(Action::Clear { confirmed: false });
        assert_eq!(notice.to_string(), CLEAR_CONFIRMATION);
        assert_eq!(store.question_count(), 1);

        assert!(matches!(
            store.dispatch(Action::Clear { confirmed: true }),
            Notice::Cleared
        ));
        assert_eq!(store.document(), &SurveyDocument::initial());
        assert!(store.answers().is_empty());
        assert_eq!(store.metadata().total_bundles_added, 0);
        assert_eq!(store.render_key(), 1);
    }

    #[test]
    fn completion_resets_and_summarizes() {
        let mut store = store();
        store.dispatch(Action::AddFields(vec![
            FieldDefinition::text("name", "Name"),
            FieldDefinition::new("tags", FieldKind::Checkbox(Default::default())),
        ]));
        store.dispatch(Action::ValueChanged(ValueChange::user("name", "Ada")));
        store.dispatch(Action::ValueChanged(ValueChange::user("tags", json!(["a", "b"]))));

        let Notice::Completed(report) = store.dispatch(Action::Complete) else {
            panic!("expected completion");
        };

        assert_eq!(
            report.summary,
            "Survey completed successfully!\n\nAnswers summary:\nname: Ada\ntags: [\"a\",\"b\"]\n\nFull details logged to console."
        );
        assert_eq!(report.metadata.final_question_count, 2);
        assert_eq!(report.metadata.response_count, 2);
        assert!(store.document().is_empty());
        assert!(store.answers().is_empty());
        assert_eq!(store.render_key(), 1);
    }

    #[test]
    fn completion_of_empty_survey_is_accepted() {
        let mut store = store();
        let notice = store.dispatch(Action::Complete);
        assert!(matches!(notice, Notice::Completed(_)));
        assert_eq!(store.render_key(), 1);
    }

    #[test]
    fn count_change_through_store() {
        let mut store = store();
        store.dispatch(Action::AddFields(vec![
            FieldDefinition::input("children_count", "Children", InputType::Number),
            FieldDefinition::new(
                "children_details",
                FieldKind::PanelDynamic(DynamicPanelField::default()),
            ),
        ]));
        store.dispatch(Action::ValueChanged(ValueChange::user("children_count", 2)));

        assert_eq!(RendererHost::panel_count(&store, &AnswerPath::new("children_details")), 2);
    }

    #[test]
    fn upload_and_clear_files() {
        let mut store = store();
        store.dispatch(Action::AddFields(vec![FieldDefinition::new(
            "photo",
            FieldKind::File(FileField {
                accepted_types: Some("image/*".to_string()),
                ..Default::default()
            }),
        )]));

        let notice = store.dispatch(Action::Upload(UploadRequest::new(
            "photo",
            SelectedFile::new("me.png", "image/png", vec![0xff]),
        )));
        assert!(matches!(notice, Notice::Uploaded(_)));
        assert_eq!(
            store.answers().get_field("photo"),
            Some(&json!([{ "name": "me.png", "type": "image/png", "size": 1, "content": "data:image/png;base64,/w==" }]))
        );
        assert_eq!(store.previews().len(), 1);

        let notice = store.dispatch(Action::Upload(UploadRequest::new(
            "photo",
            SelectedFile::new("me.txt", "text/plain", vec![1]),
        )));
        assert_eq!(notice.to_string(), "File type not allowed. Accepted types: image/*");

        store.dispatch(Action::ClearFiles(AnswerPath::new("photo")));
        assert!(store.answers().is_empty());
        assert!(store.previews().is_empty());
    }

    #[test]
    fn upload_to_non_file_question() {
        let mut store = store();
        store.dispatch(Action::AddBundle(age_bundle()));
        let notice = store.dispatch(Action::Upload(UploadRequest::empty("age")));
        assert!(matches!(
            notice,
            Notice::UploadRejected(UploadError::NotAFileField(_))
        ));
    }

    #[test]
    fn clearing_files_of_non_file_question_keeps_answer() {
        let mut store = store();
        store.dispatch(Action::AddBundle(age_bundle()));
        store.dispatch(Action::ValueChanged(ValueChange::user("age", 30)));

        let notice = store.dispatch(Action::ClearFiles(AnswerPath::new("age")));
        assert!(matches!(
            notice,
            Notice::UploadRejected(UploadError::NotAFileField(_))
        ));
        assert_eq!(store.answers().get_field("age"), Some(&json!(30)));

        RendererHost::clear_files(&mut store, &AnswerPath::new("age"));
        assert_eq!(store.answers().get_field("age"), Some(&json!(30)));
    }

    #[test]
    fn export_carries_metadata() {
        let mut store = store();
        store.dispatch(Action::AddBundle(age_bundle()));
        let export = store.export();

        assert_eq!(export.survey.field_count(), 1);
        assert_eq!(export.metadata.build.total_bundles_added, 1);
        assert_eq!(
            export.metadata.build.bundle_history[0].bundle_id.as_deref(),
            Some("bundle_age_v1")
        );
    }
}
