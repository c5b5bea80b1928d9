//! The seam between the builder and whatever renders the form.

use survey_builder_types::{AnswerPath, Answers, RenderError, SurveyDocument};

use crate::sync::ValueChange;
use crate::upload::{FilePreview, UploadError, UploadRequest};

/// Application state as seen by a renderer.
///
/// A renderer reads the document and answers from the host and reports every
/// change back through it, so panel counts and dependent choices are
/// synchronized before the next question is shown.
pub trait RendererHost {
    fn document(&self) -> &SurveyDocument;

    fn answers(&self) -> &Answers;

    /// Current number of instances of the dynamic panel at `panel`.
    fn panel_count(&self, panel: &AnswerPath) -> usize;

    fn value_changed(&mut self, change: ValueChange);

    fn upload(&mut self, request: UploadRequest) -> Result<FilePreview, UploadError>;

    fn clear_files(&mut self, field: &AnswerPath);
}

/// Presents a survey document and collects answers.
///
/// Implementations return once the user completes the form; the returned
/// answers are the final snapshot.
pub trait FormRenderer {
    /// The error type for this renderer.
    type Error: Into<RenderError>;

    fn render(&self, host: &mut dyn RendererHost) -> Result<Answers, Self::Error>;
}
