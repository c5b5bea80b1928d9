use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AnswerPath, Segment};

/// Error type for answer access operations.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("Missing answer for path: {0}")]
    MissingPath(AnswerPath),

    #[error("Type mismatch at path '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        path: AnswerPath,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Answer data entered into a survey.
///
/// Serializes as a plain JSON object keyed by top-level field name. Dynamic
/// panels hold an array with one object per panel instance, so the answer for
/// `household_members[1].asset_count` lives inside the second element of the
/// `household_members` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers {
    values: Map<String, Value>,
}

impl Answers {
    /// Create an empty answer set.
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Build answers from an existing JSON object.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Get the value stored at `path`.
    pub fn get(&self, path: &AnswerPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let Segment::Key(key) = first else {
            return None;
        };
        let mut current = self.values.get(key)?;
        for segment in rest {
            current = match segment {
                Segment::Key(k) => current.as_object()?.get(k)?,
                Segment::Index(i) => current.as_array()?.get(*i)?,
            };
        }
        Some(current)
    }

    /// Get the value of a top-level field.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store `value` at `path`, creating intermediate panel arrays and
    /// instance objects as needed.
    pub fn set(&mut self, path: &AnswerPath, value: impl Into<Value>) {
        if path.first_key().is_none() {
            return;
        }
        let mut root = Value::Object(std::mem::take(&mut self.values));
        set_in(&mut root, path.segments(), value.into());
        if let Value::Object(values) = root {
            self.values = values;
        }
    }

    /// Remove the value at `path`, returning it if present.
    pub fn remove(&mut self, path: &AnswerPath) -> Option<Value> {
        match path.segments() {
            [] => None,
            [Segment::Key(key)] => self.values.remove(key),
            [parent @ .., last] => {
                let parent = self.get_mut_segments(parent)?;
                match last {
                    Segment::Key(k) => parent.as_object_mut()?.remove(k),
                    Segment::Index(i) => {
                        let items = parent.as_array_mut()?;
                        (*i < items.len()).then(|| items.remove(*i))
                    }
                }
            }
        }
    }

    /// Shrink the array stored at `path` to at most `len` elements.
    ///
    /// Returns `true` if any element was dropped.
    pub fn truncate_array(&mut self, path: &AnswerPath, len: usize) -> bool {
        match self
            .get_mut_segments(path.segments())
            .and_then(Value::as_array_mut)
        {
            Some(items) if items.len() > len => {
                items.truncate(len);
                true
            }
            _ => false,
        }
    }

    fn get_mut_segments(&mut self, segments: &[Segment]) -> Option<&mut Value> {
        let (first, rest) = segments.split_first()?;
        let Segment::Key(key) = first else {
            return None;
        };
        let mut current = self.values.get_mut(key)?;
        for segment in rest {
            current = match segment {
                Segment::Key(k) => current.as_object_mut()?.get_mut(k)?,
                Segment::Index(i) => current.as_array_mut()?.get_mut(*i)?,
            };
        }
        Some(current)
    }

    /// Check if an answer exists at the given path.
    pub fn contains(&self, path: &AnswerPath) -> bool {
        self.get(path).is_some()
    }

    /// Iterate over top-level field answers.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of top-level answers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    // === Convenience accessors ===

    /// Get a string answer at the given path.
    pub fn get_str(&self, path: &AnswerPath) -> Result<&str, AnswerError> {
        match self.get(path) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(AnswerError::TypeMismatch {
                path: path.clone(),
                expected: "string",
                actual: type_name(other),
            }),
            None => Err(AnswerError::MissingPath(path.clone())),
        }
    }

    /// Get a numeric answer at the given path.
    pub fn get_f64(&self, path: &AnswerPath) -> Result<f64, AnswerError> {
        match self.get(path) {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| AnswerError::TypeMismatch {
                path: path.clone(),
                expected: "number",
                actual: "number",
            }),
            Some(other) => Err(AnswerError::TypeMismatch {
                path: path.clone(),
                expected: "number",
                actual: type_name(other),
            }),
            None => Err(AnswerError::MissingPath(path.clone())),
        }
    }

    /// Get an array answer (checkbox selections, ranking order, panel instances).
    pub fn get_array(&self, path: &AnswerPath) -> Result<&[Value], AnswerError> {
        match self.get(path) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(AnswerError::TypeMismatch {
                path: path.clone(),
                expected: "array",
                actual: type_name(other),
            }),
            None => Err(AnswerError::MissingPath(path.clone())),
        }
    }

    /// Check if the answer at `path` is present and non-empty.
    ///
    /// Empty strings and empty arrays count as unanswered.
    pub fn has_value(&self, path: &AnswerPath) -> bool {
        !is_empty_value(self.get(path))
    }
}

fn set_in(slot: &mut Value, segments: &[Segment], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *slot = value;
        return;
    };
    match first {
        Segment::Key(key) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                set_in(child, rest, value);
            }
        }
        Segment::Index(index) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                while items.len() <= *index {
                    items.push(Value::Object(Map::new()));
                }
                set_in(&mut items[*index], rest, value);
            }
        }
    }
}

/// JSON type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// True for missing, null, empty-string, empty-array and empty-object values.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Coerce an answer into a panel repeat count.
///
/// Numbers and numeric strings are truncated towards zero; negative,
/// non-finite and non-numeric values become `0`.
pub fn coerce_count(value: &Value) -> usize {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n >= 0.0 => n.trunc() as usize,
        _ => 0,
    }
}

impl IntoIterator for Answers {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Answers {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> AnswerPath {
        AnswerPath::parse(s).unwrap()
    }

    #[test]
    fn set_and_get_top_level() {
        let mut answers = Answers::new();
        answers.set(&path("name"), "Alice");
        answers.set(&path("age"), 30);

        assert_eq!(answers.get_str(&path("name")).unwrap(), "Alice");
        assert_eq!(answers.get_f64(&path("age")).unwrap(), 30.0);
    }

    #[test]
    fn set_creates_panel_instances() {
        let mut answers = Answers::new();
        answers.set(&path("household_members[1].asset_count"), 2);

        assert_eq!(
            answers.into_value(),
            json!({ "household_members": [{}, { "asset_count": 2 }] })
        );
    }

    #[test]
    fn remove_nested() {
        let mut answers = Answers::new();
        answers.set(&path("members[0].name"), "Ann");
        answers.set(&path("members[0].age"), 4);

        assert_eq!(answers.remove(&path("members[0].name")), Some(json!("Ann")));
        assert!(!answers.contains(&path("members[0].name")));
        assert!(answers.contains(&path("members[0].age")));
    }

    #[test]
    fn truncate_array_only_shrinks() {
        let mut answers = Answers::new();
        answers.set(&path("kids"), json!([{ "n": 1 }, { "n": 2 }, { "n": 3 }]));

        assert!(!answers.truncate_array(&path("kids"), 5));
        assert!(answers.truncate_array(&path("kids"), 1));
        assert_eq!(answers.get_array(&path("kids")).unwrap().len(), 1);
    }

    #[test]
    fn type_mismatch_error() {
        let mut answers = Answers::new();
        answers.set(&path("age"), 30);

        let result = answers.get_str(&path("age"));
        assert!(matches!(result, Err(AnswerError::TypeMismatch { .. })));
    }

    #[test]
    fn coerce_count_rules() {
        assert_eq!(coerce_count(&json!(3)), 3);
        assert_eq!(coerce_count(&json!("4")), 4);
        assert_eq!(coerce_count(&json!(2.9)), 2);
        assert_eq!(coerce_count(&json!(-1)), 0);
        assert_eq!(coerce_count(&json!("many")), 0);
        assert_eq!(coerce_count(&json!(null)), 0);
    }

    #[test]
    fn has_value_ignores_blank() {
        let mut answers = Answers::new();
        answers.set(&path("note"), "  ");
        answers.set(&path("tags"), json!([]));
        answers.set(&path("ok"), false);

        assert!(!answers.has_value(&path("note")));
        assert!(!answers.has_value(&path("tags")));
        assert!(answers.has_value(&path("ok")));
    }
}
