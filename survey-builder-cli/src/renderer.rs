//! Dialoguer implementation of [`FormRenderer`].

use chrono::{Local, NaiveDate};
use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use regex::Regex;
use serde_json::{Map, Value};
use survey_builder::expression::{self, as_number, display, number_value};
use survey_builder::upload::{DEFAULT_MAX_SIZE, UploadError};
use survey_builder::{
    AnswerPath, Answers, ChoiceItem, DynamicPanelField, FieldDefinition, FieldKind, FileField,
    FormRenderer, InputType, MatrixField, RatingField, RenderError, RendererHost, SelectedFile,
    TextField, UploadRequest, ValueChange, Validator, context_for, is_field_visible,
    visible_choices,
};
use survey_catalog::defaults::TODAY;
use thiserror::Error;

const SKIP: &str = "(skip)";
const DONE: &str = "(done)";

/// Error type for the Dialoguer renderer.
#[derive(Debug, Error)]
pub enum DialoguerError {
    /// User cancelled the survey (e.g., pressed Ctrl+C or Escape).
    #[error("Survey cancelled by user")]
    Cancelled,

    /// An I/O error occurred during prompting.
    #[error("Dialoguer error: {0}")]
    Dialoguer(#[from] dialoguer::Error),
}

impl From<DialoguerError> for RenderError {
    fn from(err: DialoguerError) -> Self {
        match err {
            DialoguerError::Cancelled => RenderError::Cancelled,
            other => RenderError::backend("dialoguer", other),
        }
    }
}

/// Helper to check if a dialoguer error is a cancellation (Ctrl+C / Escape)
fn is_cancelled(err: &dialoguer::Error) -> bool {
    matches!(err, dialoguer::Error::IO(io_err) if io_err.kind() == std::io::ErrorKind::Interrupted)
}

fn prompt_error(err: dialoguer::Error) -> DialoguerError {
    if is_cancelled(&err) {
        DialoguerError::Cancelled
    } else {
        DialoguerError::Dialoguer(err)
    }
}

/// A choice as offered to the user: stored value and display text.
#[derive(Debug, Clone, PartialEq)]
struct Offered {
    value: String,
    text: String,
}

/// Step-by-step terminal form.
///
/// Fields are asked in document order. Hidden fields are skipped, every
/// answer is reported to the host immediately, and dynamic panels repeat as
/// many times as the host says they currently do.
#[derive(Debug, Clone)]
pub struct DialoguerRenderer {
    colorful: bool,
    default_max_size: u64,
}

impl Default for DialoguerRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DialoguerRenderer {
    /// Create a renderer with the colorful theme.
    pub fn new() -> Self {
        Self {
            colorful: true,
            default_max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Create a renderer with the plain (no color) theme.
    pub fn plain() -> Self {
        Self {
            colorful: false,
            ..Self::new()
        }
    }

    pub fn with_colors(mut self, colorful: bool) -> Self {
        self.colorful = colorful;
        self
    }

    /// Size limit for file questions that set no `maxSize`.
    pub fn with_default_max_size(mut self, bytes: u64) -> Self {
        self.default_max_size = bytes;
        self
    }

    fn theme(&self) -> Box<dyn Theme> {
        if self.colorful {
            Box::new(ColorfulTheme::default())
        } else {
            Box::new(SimpleTheme)
        }
    }

    /// Ask one field answering under `scope` (the page, or a panel instance).
    fn ask_field(
        &self,
        field: &FieldDefinition,
        scope: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let path = scope.child(&field.name);
        if !is_field_visible(field, &context_for(host.answers(), &path)) {
            tracing::trace!(%path, "skipping hidden field");
            return Ok(());
        }

        match &field.kind {
            FieldKind::Text(text) => self.ask_text(field, text, &path, host),
            FieldKind::RadioGroup(_) => self.ask_one(field, &path, host),
            FieldKind::Checkbox(_) => self.ask_many(field, &path, host),
            FieldKind::Ranking(_) => self.ask_ranking(field, &path, host),
            FieldKind::Rating(rating) => self.ask_rating(field, rating, &path, host),
            FieldKind::Matrix(matrix) => self.ask_matrix(field, matrix, &path, host),
            FieldKind::File(file) => self.ask_file(field, file, &path, host),
            FieldKind::Panel(panel) => {
                if let Some(title) = &field.title {
                    println!();
                    println!("== {title} ==");
                }
                // Plain panel elements answer in the enclosing scope.
                for child in &panel.elements {
                    self.ask_field(child, scope, host)?;
                }
                Ok(())
            }
            FieldKind::PanelDynamic(panel) => self.ask_dynamic_panel(field, panel, &path, host),
            FieldKind::Expression(calc) => {
                let value = expression::parse(&calc.expression)
                    .map(|expr| expr.evaluate(&context_for(host.answers(), &path)))
                    .unwrap_or_else(|err| {
                        tracing::warn!(%path, error = %err, "invalid calculation");
                        Value::Null
                    });
                println!("{}: {}", field.prompt(), display(&value));
                if host.answers().get(&path) != Some(&value) {
                    host.value_changed(ValueChange::programmatic(path, value));
                }
                Ok(())
            }
        }
    }

    fn ask_text(
        &self,
        field: &FieldDefinition,
        text: &TextField,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let input_type = text.input_type.unwrap_or(InputType::Text);
        let current = host.answers().get(path).or(field.default_value.as_ref());
        let default = current.map(resolve_default).map(|v| display(&v));

        loop {
            let raw = if input_type == InputType::Password {
                self.read_masked(field)?
            } else {
                self.read_line(field, default.as_deref())?
            };
            let raw = raw.trim();

            if raw.is_empty() {
                if field.is_required {
                    println!("Error: Response required.");
                    continue;
                }
                return Ok(());
            }

            let value = match parse_text(input_type, raw) {
                Ok(value) => value,
                Err(msg) => {
                    println!("Error: {msg}");
                    continue;
                }
            };
            if let Err(msg) = validate_answer(field, &value) {
                println!("Error: {msg}");
                continue;
            }
            host.value_changed(ValueChange::user(path.clone(), value));
            return Ok(());
        }
    }

    fn read_line(
        &self,
        field: &FieldDefinition,
        default: Option<&str>,
    ) -> Result<String, DialoguerError> {
        let theme = self.theme();
        let mut builder = Input::<String>::with_theme(theme.as_ref())
            .with_prompt(field.prompt())
            .allow_empty(true);
        if let Some(default) = default {
            builder = builder.default(default.to_string());
        }
        builder.interact_text().map_err(prompt_error)
    }

    fn read_masked(&self, field: &FieldDefinition) -> Result<String, DialoguerError> {
        let theme = self.theme();
        Password::with_theme(theme.as_ref())
            .with_prompt(field.prompt())
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_error)
    }

    fn ask_one(
        &self,
        field: &FieldDefinition,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let options = offered(field, path, &*host);
        if options.is_empty() {
            println!("{}: no options available", field.prompt());
            return Ok(());
        }

        let current = host
            .answers()
            .get(path)
            .or(field.default_value.as_ref())
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut items: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
        if !field.is_required {
            items.push(SKIP);
        }
        let default = current
            .and_then(|c| options.iter().position(|o| o.value == c))
            .unwrap_or(0);

        let theme = self.theme();
        let selected = Select::with_theme(theme.as_ref())
            .with_prompt(field.prompt())
            .items(&items)
            .default(default)
            .interact()
            .map_err(prompt_error)?;

        if let Some(option) = options.get(selected) {
            host.value_changed(ValueChange::user(
                path.clone(),
                Value::String(option.value.clone()),
            ));
        }
        Ok(())
    }

    fn ask_many(
        &self,
        field: &FieldDefinition,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let options = offered(field, path, &*host);
        if options.is_empty() {
            println!("{}: no options available", field.prompt());
            return Ok(());
        }

        let chosen = selected_values(host.answers().get(path));
        let defaults: Vec<bool> = options.iter().map(|o| chosen.contains(&o.value)).collect();
        let items: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();

        loop {
            let theme = self.theme();
            let selections = MultiSelect::with_theme(theme.as_ref())
                .with_prompt(field.prompt())
                .items(&items)
                .defaults(&defaults)
                .interact()
                .map_err(prompt_error)?;

            if selections.is_empty() {
                if field.is_required {
                    println!("Error: Response required.");
                    continue;
                }
                if host.answers().contains(path) {
                    host.value_changed(ValueChange::user(path.clone(), Value::Null));
                }
                return Ok(());
            }

            let values: Vec<Value> = selections
                .iter()
                .map(|&i| Value::String(options[i].value.clone()))
                .collect();
            host.value_changed(ValueChange::user(path.clone(), Value::Array(values)));
            return Ok(());
        }
    }

    /// Rank by picking the most preferred remaining item each round.
    fn ask_ranking(
        &self,
        field: &FieldDefinition,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let mut remaining = offered(field, path, &*host);
        let mut ranked = Vec::with_capacity(remaining.len());
        println!("{}", field.prompt());

        while !remaining.is_empty() {
            let mut items: Vec<&str> = remaining.iter().map(|o| o.text.as_str()).collect();
            if !field.is_required {
                items.push(DONE);
            }

            let theme = self.theme();
            let selected = Select::with_theme(theme.as_ref())
                .with_prompt(format!("Rank #{}", ranked.len() + 1))
                .items(&items)
                .default(0)
                .interact()
                .map_err(prompt_error)?;

            if selected >= remaining.len() {
                break;
            }
            ranked.push(Value::String(remaining.remove(selected).value));
        }

        if !ranked.is_empty() {
            host.value_changed(ValueChange::user(path.clone(), Value::Array(ranked)));
        }
        Ok(())
    }

    fn ask_rating(
        &self,
        field: &FieldDefinition,
        rating: &RatingField,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let values = rating.values();
        let mut items = rating_labels(rating);
        if !field.is_required {
            items.push(SKIP.to_string());
        }
        let default = host
            .answers()
            .get(path)
            .and_then(Value::as_i64)
            .and_then(|current| values.iter().position(|v| *v == current))
            .unwrap_or(0);

        let theme = self.theme();
        let selected = Select::with_theme(theme.as_ref())
            .with_prompt(field.prompt())
            .items(&items)
            .default(default)
            .interact()
            .map_err(prompt_error)?;

        if let Some(value) = values.get(selected) {
            host.value_changed(ValueChange::user(path.clone(), *value));
        }
        Ok(())
    }

    /// One select per row; the answer maps row values to column values.
    fn ask_matrix(
        &self,
        field: &FieldDefinition,
        matrix: &MatrixField,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        println!("{}", field.prompt());
        let mut items: Vec<&str> = matrix.columns.iter().map(label).collect();
        if !field.is_required {
            items.push(SKIP);
        }

        let mut answer = match host.answers().get(path) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        for row in &matrix.rows {
            let default = answer
                .get(&row.value)
                .and_then(Value::as_str)
                .and_then(|current| matrix.columns.iter().position(|c| c.value == current))
                .unwrap_or(0);

            let theme = self.theme();
            let selected = Select::with_theme(theme.as_ref())
                .with_prompt(label(row))
                .items(&items)
                .default(default)
                .interact()
                .map_err(prompt_error)?;

            match matrix.columns.get(selected) {
                Some(column) => {
                    answer.insert(row.value.clone(), Value::String(column.value.clone()));
                }
                None => {
                    answer.remove(&row.value);
                }
            }
        }

        if !answer.is_empty() {
            host.value_changed(ValueChange::user(path.clone(), Value::Object(answer)));
        }
        Ok(())
    }

    fn ask_file(
        &self,
        field: &FieldDefinition,
        file: &FileField,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        if host.answers().has_value(path) {
            let theme = self.theme();
            let choice = Select::with_theme(theme.as_ref())
                .with_prompt(format!("{} (files already uploaded)", field.prompt()))
                .items(&["Keep current files", "Upload another file", "Clear files"])
                .default(0)
                .interact()
                .map_err(prompt_error)?;
            match choice {
                0 => return Ok(()),
                2 => host.clear_files(path),
                _ => {}
            }
        }

        if let Some(accepted) = &file.accepted_types {
            println!("Accepted types: {accepted}");
        }
        loop {
            let theme = self.theme();
            let location = Input::<String>::with_theme(theme.as_ref())
                .with_prompt(format!("{} (path to file)", field.prompt()))
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_error)?;
            let location = location.trim();

            if location.is_empty() {
                if field.is_required && !host.answers().has_value(path) {
                    println!("Error: {}", UploadError::NoFile);
                    continue;
                }
                return Ok(());
            }

            let selected = match SelectedFile::read(location) {
                Ok(selected) => selected,
                Err(err) => {
                    println!("Error: {err}");
                    continue;
                }
            };
            if file.max_size.is_none() && selected.size() > self.default_max_size {
                let err = UploadError::TooLarge {
                    limit: self.default_max_size,
                    size: selected.size(),
                };
                println!("Error: {err}");
                continue;
            }

            match host.upload(UploadRequest::new(path.clone(), selected)) {
                Ok(preview) => println!("{}", preview.headline()),
                Err(err) => {
                    println!("Error: {err}");
                    continue;
                }
            }

            if !file.allow_multiple.unwrap_or(false) {
                return Ok(());
            }
            let theme = self.theme();
            let again = Confirm::with_theme(theme.as_ref())
                .with_prompt("Upload another file?")
                .default(false)
                .interact()
                .map_err(prompt_error)?;
            if !again {
                return Ok(());
            }
        }
    }

    fn ask_dynamic_panel(
        &self,
        field: &FieldDefinition,
        panel: &DynamicPanelField,
        path: &AnswerPath,
        host: &mut dyn RendererHost,
    ) -> Result<(), DialoguerError> {
        let count = host.panel_count(path);
        tracing::debug!(%path, count, "rendering dynamic panel");
        if count == 0 {
            return Ok(());
        }

        println!();
        println!("== {} ==", field.prompt());
        for index in 0..count {
            println!("-- {} --", panel.instance_title(index));
            let instance = path.index(index);
            for child in &panel.template_elements {
                self.ask_field(child, &instance, host)?;
            }
        }
        Ok(())
    }
}

impl FormRenderer for DialoguerRenderer {
    type Error = DialoguerError;

    fn render(&self, host: &mut dyn RendererHost) -> Result<Answers, Self::Error> {
        // The document only changes in panel counts while rendering, and
        // those are read back from the host.
        let document = host.document().clone();

        if !document.title.is_empty() {
            println!("{}", document.title);
            println!();
        }

        let top = AnswerPath::empty();
        for page in &document.pages {
            for field in &page.elements {
                self.ask_field(field, &top, host)?;
            }
        }

        Ok(host.answers().clone())
    }
}

/// The visible choices of `field` at `path`, as owned values.
fn offered(field: &FieldDefinition, path: &AnswerPath, host: &dyn RendererHost) -> Vec<Offered> {
    let ctx = context_for(host.answers(), path);
    visible_choices(field, &ctx)
        .into_iter()
        .map(|c| Offered {
            value: c.value().to_string(),
            text: c.text().to_string(),
        })
        .collect()
}

fn label(item: &ChoiceItem) -> &str {
    item.text.as_deref().unwrap_or(&item.value)
}

fn selected_values(current: Option<&Value>) -> Vec<String> {
    match current {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Resolve placeholder defaults such as `today()`.
fn resolve_default(value: &Value) -> Value {
    match value.as_str() {
        Some(TODAY) => Value::String(Local::now().date_naive().format("%Y-%m-%d").to_string()),
        _ => value.clone(),
    }
}

/// Rating items, with the end descriptions attached to the first and last.
fn rating_labels(rating: &RatingField) -> Vec<String> {
    let values = rating.values();
    let last = values.len().saturating_sub(1);
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let note = match i {
                0 => rating.min_rate_description.as_deref(),
                i if i == last => rating.max_rate_description.as_deref(),
                _ => None,
            };
            match note {
                Some(note) => format!("{value} ({note})"),
                None => value.to_string(),
            }
        })
        .collect()
}

/// Convert typed text into the stored answer for an input type.
fn parse_text(input_type: InputType, raw: &str) -> Result<Value, String> {
    match input_type {
        InputType::Number | InputType::Range => as_number(&Value::String(raw.to_string()))
            .map(number_value)
            .ok_or_else(|| "Please enter a number.".to_string()),
        InputType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|_| Value::String(raw.to_string()))
            .map_err(|_| "Please enter a date as YYYY-MM-DD.".to_string()),
        InputType::Email => {
            let valid = raw
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if valid {
                Ok(Value::String(raw.to_string()))
            } else {
                Err("Please enter a valid e-mail address.".to_string())
            }
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Run the field's validators against an answer.
fn validate_answer(field: &FieldDefinition, value: &Value) -> Result<(), String> {
    for validator in &field.validators {
        let passed = match validator {
            Validator::Numeric(range) => as_number(value).is_some_and(|n| {
                range.min_value.is_none_or(|min| n >= min)
                    && range.max_value.is_none_or(|max| n <= max)
            }),
            Validator::Regex(pattern) => match Regex::new(&pattern.regex) {
                Ok(re) => re.is_match(&display(value)),
                Err(err) => {
                    tracing::warn!(field = %field.name, error = %err, "invalid regex validator");
                    true
                }
            },
        };
        if !passed {
            return Err(validator
                .text()
                .map(str::to_string)
                .unwrap_or_else(|| default_message(validator)));
        }
    }
    Ok(())
}

fn default_message(validator: &Validator) -> String {
    match validator {
        Validator::Numeric(range) => match (range.min_value, range.max_value) {
            (Some(min), Some(max)) => format!("The value should be between {min} and {max}."),
            (Some(min), None) => format!("The value should not be less than {min}."),
            (None, Some(max)) => format!("The value should not be greater than {max}."),
            (None, None) => "Please enter a number.".to_string(),
        },
        Validator::Regex(_) => "The value does not match the expected format.".to_string(),
    }
}
