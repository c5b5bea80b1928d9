use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Write integral bounds as JSON integers (`18`, not `18.0`).
fn serialize_bound<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            serializer.serialize_some(&(*n as i64))
        }
        Some(n) => serializer.serialize_some(n),
        None => serializer.serialize_none(),
    }
}

/// A single question (or question container) in a survey document.
///
/// Serializes to the JSON shape understood by web form engines: the variant
/// is selected by the `type` key and all attribute names are camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Type tag plus type-specific attributes.
    #[serde(flatten)]
    pub kind: FieldKind,

    /// Unique name; also the answer key.
    pub name: String,

    /// Prompt text shown to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_required: bool,

    /// Visibility expression evaluated against current answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl FieldDefinition {
    /// Create a field of the given kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            kind,
            name: name.into(),
            title: None,
            is_required: false,
            visible_if: None,
            default_value: None,
            validators: Vec::new(),
        }
    }

    /// Single-line text question.
    pub fn text(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text(TextField::default())).with_title(title)
    }

    /// Text question with a specific input type (number, date, email, ...).
    pub fn input(name: impl Into<String>, title: impl Into<String>, input_type: InputType) -> Self {
        Self::new(name, FieldKind::Text(TextField::of_type(input_type))).with_title(title)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Mark the question as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn visible_if(mut self, expression: impl Into<String>) -> Self {
        self.visible_if = Some(expression.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validator(mut self, validator: impl Into<Validator>) -> Self {
        self.validators.push(validator.into());
        self
    }

    /// The JSON `type` tag of this field.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// The prompt, falling back to the field name.
    pub fn prompt(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn as_dynamic_panel(&self) -> Option<&DynamicPanelField> {
        match &self.kind {
            FieldKind::PanelDynamic(panel) => Some(panel),
            _ => None,
        }
    }

    pub fn as_dynamic_panel_mut(&mut self) -> Option<&mut DynamicPanelField> {
        match &mut self.kind {
            FieldKind::PanelDynamic(panel) => Some(panel),
            _ => None,
        }
    }

    /// Nested definitions (panel elements or dynamic panel template).
    pub fn children(&self) -> &[FieldDefinition] {
        match &self.kind {
            FieldKind::Panel(panel) => &panel.elements,
            FieldKind::PanelDynamic(panel) => &panel.template_elements,
            _ => &[],
        }
    }

    /// Choices offered by choice-based kinds.
    pub fn choices(&self) -> &[Choice] {
        match &self.kind {
            FieldKind::Text(text) => &text.choices,
            FieldKind::RadioGroup(c) | FieldKind::Checkbox(c) | FieldKind::Ranking(c) => {
                &c.choices
            }
            _ => &[],
        }
    }

    /// True for plain containers whose children answer at the same level.
    pub fn is_panel(&self) -> bool {
        matches!(self.kind, FieldKind::Panel(_))
    }
}

/// The kind of field, carrying type-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line input (text, number, date, email, ...).
    Text(TextField),

    /// Pick exactly one choice.
    RadioGroup(ChoiceField),

    /// Pick any number of choices.
    Checkbox(ChoiceField),

    File(FileField),

    Rating(RatingField),

    /// Order all choices.
    Ranking(ChoiceField),

    /// One column choice per row.
    Matrix(MatrixField),

    /// Static group of fields answered at the enclosing level.
    Panel(PanelField),

    /// Repeating group of fields.
    PanelDynamic(DynamicPanelField),

    /// Read-only computed value.
    Expression(ExpressionField),
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::RadioGroup(_) => "radiogroup",
            Self::Checkbox(_) => "checkbox",
            Self::File(_) => "file",
            Self::Rating(_) => "rating",
            Self::Ranking(_) => "ranking",
            Self::Matrix(_) => "matrix",
            Self::Panel(_) => "panel",
            Self::PanelDynamic(_) => "paneldynamic",
            Self::Expression(_) => "expression",
        }
    }
}

/// Input type of a text question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Date,
    Email,
    Tel,
    Url,
    Password,
    Color,
    Time,
    Month,
    Week,
    Range,
    #[serde(rename = "datetime-local")]
    DatetimeLocal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,

    /// Suggested values; the form engine ignores them for plain text input.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl TextField {
    pub fn of_type(input_type: InputType) -> Self {
        Self {
            input_type: Some(input_type),
            choices: Vec::new(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.input_type == Some(InputType::Number)
    }
}

/// Attributes shared by radiogroup, checkbox and ranking questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChoiceField {
    pub choices: Vec<Choice>,

    /// Guard expression enabling per-choice `visibleIf` filtering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices_visible_if: Option<String>,
}

impl ChoiceField {
    /// Choice field from plain string choices.
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(|c| Choice::Plain(c.into())).collect(),
            choices_visible_if: None,
        }
    }
}

/// A selectable choice: either a bare value or a value/text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    Plain(String),
    Item(ChoiceItem),
}

impl Choice {
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Item(item) => &item.value,
        }
    }

    /// Display text, falling back to the value.
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Item(item) => item.text.as_deref().unwrap_or(&item.value),
        }
    }

    pub fn visible_if(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Item(item) => item.visible_if.as_deref(),
        }
    }
}

impl From<&str> for Choice {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,
}

impl ChoiceItem {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: Some(text.into()),
            visible_if: None,
        }
    }

    pub fn visible_if(mut self, expression: impl Into<String>) -> Self {
        self.visible_if = Some(expression.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileField {
    /// Comma-separated whitelist (`image/*`, `.pdf`, `application/pdf`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_types: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_data_as_text: Option<bool>,

    /// Maximum file size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_multiple: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RatingField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_min: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_max: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_step: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rate_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rate_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<String>,
}

impl RatingField {
    pub fn new(rate_min: i64, rate_max: i64) -> Self {
        Self {
            rate_min: Some(rate_min),
            rate_max: Some(rate_max),
            ..Default::default()
        }
    }

    /// The selectable rating values, in ascending order.
    ///
    /// Unset bounds default to 1..=5 with step 1, like the web form engine.
    pub fn values(&self) -> Vec<i64> {
        let min = self.rate_min.unwrap_or(1);
        let max = self.rate_max.unwrap_or(5);
        let step = self.rate_step.filter(|s| *s > 0).unwrap_or(1);
        (min..=max).step_by(step as usize).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatrixField {
    pub columns: Vec<ChoiceItem>,
    pub rows: Vec<ChoiceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelField {
    pub elements: Vec<FieldDefinition>,
}

/// A repeating group whose instance count is `panel_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DynamicPanelField {
    pub template_elements: Vec<FieldDefinition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_panel_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_panel_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_add_panel: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_remove_panel: Option<bool>,

    /// Title per instance; `{panelIndex}` is replaced by the 1-based index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_title: Option<String>,
}

impl DynamicPanelField {
    /// Clamp a requested count to `max_panel_count`.
    pub fn clamp_count(&self, count: usize) -> usize {
        match self.max_panel_count {
            Some(max) => count.min(max),
            None => count,
        }
    }

    /// Title of the panel instance at `index` (0-based).
    pub fn instance_title(&self, index: usize) -> String {
        match &self.template_title {
            Some(title) => title.replace("{panelIndex}", &(index + 1).to_string()),
            None => format!("#{}", index + 1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpressionField {
    pub expression: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_style: Option<String>,
}

/// Validation rule embedded in a field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Validator {
    Numeric(NumericValidator),
    Regex(RegexValidator),
}

impl Validator {
    /// Custom error text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Numeric(v) => v.text.as_deref(),
            Self::Regex(v) => v.text.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumericValidator {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_bound")]
    pub min_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_bound")]
    pub max_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl NumericValidator {
    pub fn new(min_value: Option<f64>, max_value: Option<f64>) -> Self {
        Self {
            min_value,
            max_value,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl From<NumericValidator> for Validator {
    fn from(v: NumericValidator) -> Self {
        Self::Numeric(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegexValidator {
    pub regex: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RegexValidator {
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl From<RegexValidator> for Validator {
    fn from(v: RegexValidator) -> Self {
        Self::Regex(v)
    }
}
