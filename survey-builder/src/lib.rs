//! # survey-builder
//!
//! Build survey documents from predefined question bundles. Renderer-agnostic.
//!
//! A [`Store`] owns the survey being built. Bundles are merged into its
//! document without duplicating field names; a [`FormRenderer`] presents the
//! document and reports every answer change back, and the store keeps
//! dynamic panel counts and dependent choices consistent.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use survey_builder::{Action, Store, SyncRules, TestRenderer};
//!
//! let mut store = Store::new(SyncRules::new());
//! store.dispatch(Action::AddBundle(bundle.clone()));
//!
//! let notice = store.run(&TestRenderer::new().with_int("age", 30))?;
//! println!("{notice}");
//! ```
//!
//! ## Modules
//!
//! - `merge` - Fold field definitions into a document, skipping duplicates
//! - `metadata` - Hidden build log with timestamps and counts
//! - `expression` - Visibility and calculation expressions
//! - `sync` - Pure synchronization of panel counts and dependent choices
//! - `upload` - File upload checks, data URLs and previews
//! - `store` - Application state and actions
//! - `export` - JSON export with metadata

// Re-export all types from survey-builder-types
pub use survey_builder_types::*;

pub mod expression;
pub use expression::{EvalContext, Expr, ExpressionError};

mod visibility;
pub use visibility::{context_for, is_field_visible, retain_choices, visible_choices};

mod merge;
pub use merge::{MergeOutcome, merge_fields};

pub mod metadata;
pub use metadata::{BuildMetadata, Clock, CompletedMetadata, ManualClock, SystemClock};

mod sync;
pub use sync::{
    ChangeOrigin, ChoiceDependency, CountBinding, FormState, PanelCounts, SyncRules, ValueChange,
    synchronize,
};

pub mod upload;
pub use upload::{
    AcceptedUpload, FilePreview, SelectedFile, UploadError, UploadRequest, UploadedFile,
    accept_upload,
};

mod export;
pub use export::{EXPORT_FILE_NAME, ExportDocument, ExportError, ExportMetadata};

mod renderer;
pub use renderer::{FormRenderer, RendererHost};

mod store;
pub use store::{Action, CLEAR_CONFIRMATION, CompletionReport, Notice, Store, completion_summary};

// Test renderer for driving surveys without user interaction
mod test_renderer;
pub use test_renderer::{ScriptStep, TestRenderer, TestRendererError};
