//! Core types for the survey-builder crates.
//!
//! This crate provides the data model shared by the builder and renderers:
//! - `SurveyDocument` and `Page` - The editable survey definition
//! - `FieldDefinition` and `FieldKind` - Individual questions and their types
//! - `Bundle` - Predefined groups of questions
//! - `Answers` and `AnswerPath` - Entered data and path-based keys

mod answer_path;
pub use answer_path::{AnswerPath, PathParseError, Segment};

mod answers;
pub use answers::{AnswerError, Answers, coerce_count, is_empty_value, type_name};

mod field;
pub use field::{
    Choice, ChoiceField, ChoiceItem, DynamicPanelField, ExpressionField, FieldDefinition,
    FieldKind, FileField, InputType, MatrixField, NumericValidator, PanelField, RatingField,
    RegexValidator, TextField, Validator,
};

mod document;
pub use document::{Page, SurveyDocument};

mod bundle;
pub use bundle::Bundle;

mod error;
pub use error::RenderError;
