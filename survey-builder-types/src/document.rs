use serde::{Deserialize, Serialize};

use crate::{AnswerPath, FieldDefinition};

/// The editable survey definition handed to the form renderer.
///
/// Field names are unique across the top-level elements; the merger
/// enforces this whenever fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDocument {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub pages: Vec<Page>,
}

/// One page of a survey document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,

    #[serde(default)]
    pub elements: Vec<FieldDefinition>,
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }
}

impl SurveyDocument {
    pub const DEFAULT_TITLE: &'static str = "XLS Form Compatible Survey";
    pub const DEFAULT_DESCRIPTION: &'static str =
        "A survey built with XLS form compatible question types";
    pub const FIRST_PAGE: &'static str = "page1";

    /// The document every build session starts from: one empty page.
    pub fn initial() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            description: Self::DEFAULT_DESCRIPTION.to_string(),
            pages: vec![Page::new(Self::FIRST_PAGE)],
        }
    }

    /// All top-level fields, page by page.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }

    /// Number of top-level fields.
    pub fn field_count(&self) -> usize {
        self.pages.iter().map(|p| p.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Names of all top-level fields, in document order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields().map(|f| f.name.as_str()).collect()
    }

    /// Check whether a top-level field with this name exists.
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields().any(|f| f.name == name)
    }

    /// Find the field that answers under `name` at the top level.
    ///
    /// Plain panels are searched recursively because their elements answer at
    /// the page level; dynamic panel templates are not.
    pub fn find_field(&self, name: &str) -> Option<&FieldDefinition> {
        find_in(self.fields(), name)
    }

    pub fn find_field_mut(&mut self, name: &str) -> Option<&mut FieldDefinition> {
        self.pages
            .iter_mut()
            .flat_map(|p| p.elements.iter_mut())
            .find_map(|f| find_in_mut(f, name))
    }

    /// Resolve the definition answering at `path`, descending through
    /// dynamic panel templates for nested paths.
    pub fn resolve(&self, path: &AnswerPath) -> Option<&FieldDefinition> {
        let mut keys = path.keys();
        let mut current = self.find_field(keys.next()?)?;
        for key in keys {
            current = find_in(current.children().iter(), key)?;
        }
        Some(current)
    }
}

impl Default for SurveyDocument {
    fn default() -> Self {
        Self::initial()
    }
}

fn find_in<'a>(
    fields: impl IntoIterator<Item = &'a FieldDefinition>,
    name: &str,
) -> Option<&'a FieldDefinition> {
    for field in fields {
        if field.name == name {
            return Some(field);
        }
        if field.is_panel()
            && let Some(found) = find_in(field.children(), name)
        {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(field: &'a mut FieldDefinition, name: &str) -> Option<&'a mut FieldDefinition> {
    if field.name == name {
        return Some(field);
    }
    match &mut field.kind {
        crate::FieldKind::Panel(panel) => panel
            .elements
            .iter_mut()
            .find_map(|child| find_in_mut(child, name)),
        _ => None,
    }
}
