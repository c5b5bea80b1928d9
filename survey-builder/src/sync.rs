//! Keeping the document and answers consistent after a value change.
//!
//! [`synchronize`] is a pure function from a change and the prior state to
//! the next state. It records the new value, resizes dynamic panels bound to
//! count fields and clears choice answers whose controller changed.

use std::collections::BTreeMap;

use serde_json::Value;
use survey_builder_types::{AnswerPath, Answers, SurveyDocument, Segment, coerce_count};

use crate::visibility::{context_for, retain_choices, visible_choices};

/// Per-instance repeat counts of dynamic panels nested in other dynamic
/// panels, keyed by the nested panel's path (`household_members[1].member_assets`).
///
/// Top-level panels keep their count in the document's `panelCount`.
pub type PanelCounts = BTreeMap<AnswerPath, usize>;

/// Pairs a numeric field with the dynamic panel it sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountBinding {
    pub count_field: String,
    pub panel_field: String,
    /// Dynamic panel both fields are template elements of, if any.
    pub within: Option<String>,
}

impl CountBinding {
    pub fn new(count_field: impl Into<String>, panel_field: impl Into<String>) -> Self {
        Self {
            count_field: count_field.into(),
            panel_field: panel_field.into(),
            within: None,
        }
    }

    /// Binding between two template elements of `container`; each container
    /// instance sizes its own nested panel.
    pub fn within(
        container: impl Into<String>,
        count_field: impl Into<String>,
        panel_field: impl Into<String>,
    ) -> Self {
        Self {
            within: Some(container.into()),
            ..Self::new(count_field, panel_field)
        }
    }

    /// The panel this binding resizes when the answer at `changed` changes.
    pub fn panel_for(&self, changed: &AnswerPath) -> Option<AnswerPath> {
        match (&self.within, changed.segments()) {
            (None, [Segment::Key(field)]) if *field == self.count_field => {
                Some(AnswerPath::new(&self.panel_field))
            }
            (Some(container), [.., Segment::Key(outer), Segment::Index(_), Segment::Key(field)])
                if outer == container && *field == self.count_field =>
            {
                Some(changed.parent().child(&self.panel_field))
            }
            _ => None,
        }
    }
}

/// A choice field whose offered choices depend on another field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDependency {
    pub controller: String,
    pub dependent: String,
}

impl ChoiceDependency {
    pub fn new(controller: impl Into<String>, dependent: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            dependent: dependent.into(),
        }
    }

    /// The dependent answer affected by a change at `changed`. Both fields
    /// live at the same level (top level or the same panel instance).
    pub fn dependent_for(&self, changed: &AnswerPath) -> Option<AnswerPath> {
        match changed.segments().last() {
            Some(Segment::Key(field)) if *field == self.controller => {
                Some(changed.parent().child(&self.dependent))
            }
            _ => None,
        }
    }
}

/// Everything [`synchronize`] reacts to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRules {
    pub counts: Vec<CountBinding>,
    pub dependencies: Vec<ChoiceDependency>,
}

impl SyncRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, binding: CountBinding) -> Self {
        self.counts.push(binding);
        self
    }

    pub fn dependency(mut self, dependency: ChoiceDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// Who caused a value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeOrigin {
    /// Typed or selected by the user.
    #[default]
    User,
    /// Restored or set by code (loading saved answers, defaults).
    Programmatic,
}

/// A single answer change.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub path: AnswerPath,
    /// New value; `null` removes the answer.
    pub value: Value,
    pub origin: ChangeOrigin,
}

impl ValueChange {
    pub fn user(path: impl Into<AnswerPath>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
            origin: ChangeOrigin::User,
        }
    }

    pub fn programmatic(path: impl Into<AnswerPath>, value: impl Into<Value>) -> Self {
        Self {
            origin: ChangeOrigin::Programmatic,
            ..Self::user(path, value)
        }
    }
}

/// Document, answers and nested panel counts as one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub document: SurveyDocument,
    pub answers: Answers,
    pub panel_counts: PanelCounts,
}

impl FormState {
    pub fn new(document: SurveyDocument, answers: Answers) -> Self {
        Self {
            document,
            answers,
            panel_counts: PanelCounts::new(),
        }
    }

    /// Current repeat count of the dynamic panel at `path`.
    ///
    /// Nested panels without a recorded count use their template's
    /// `panelCount`.
    pub fn panel_count(&self, path: &AnswerPath) -> usize {
        if let Some(count) = self.panel_counts.get(path) {
            return *count;
        }
        self.document
            .resolve(path)
            .and_then(|f| f.as_dynamic_panel())
            .and_then(|p| p.panel_count)
            .unwrap_or(0)
    }

    /// Resize the dynamic panel at `path`, returning the count applied.
    ///
    /// The count is clamped to the panel's `maxPanelCount`; answers and nested
    /// counts of dropped instances are discarded.
    pub fn set_panel_count(&mut self, path: &AnswerPath, requested: usize) -> Option<usize> {
        let Some(panel) = self.document.resolve(path).and_then(|f| f.as_dynamic_panel()) else {
            tracing::debug!(%path, "count binding target is not in the document");
            return None;
        };
        let count = panel.clamp_count(requested);

        if path.is_top_level() {
            let panel = self
                .document
                .find_field_mut(path.first_key()?)
                .and_then(|f| f.as_dynamic_panel_mut())?;
            panel.panel_count = Some(count);
        } else {
            self.panel_counts.insert(path.clone(), count);
        }

        if self.answers.truncate_array(path, count) {
            tracing::debug!(%path, count, "dropped answers of removed panel instances");
        }
        let prefix = path.segments();
        self.panel_counts.retain(|nested, _| {
            !(nested.segments().starts_with(prefix)
                && matches!(nested.segments().get(prefix.len()), Some(Segment::Index(i)) if *i >= count))
        });

        tracing::debug!(%path, requested, count, "panel count synchronized");
        Some(count)
    }

    /// Whether every dynamic panel index along `path` names an existing
    /// instance.
    fn within_instances(&self, path: &AnswerPath) -> bool {
        let mut prefix = AnswerPath::empty();
        for segment in path.segments() {
            match segment {
                Segment::Key(key) => prefix = prefix.child(key),
                Segment::Index(index) => {
                    let is_panel = self
                        .document
                        .resolve(&prefix)
                        .is_some_and(|f| f.as_dynamic_panel().is_some());
                    if is_panel && *index >= self.panel_count(&prefix) {
                        return false;
                    }
                    prefix = prefix.index(*index);
                }
            }
        }
        true
    }

    /// Remove the answer at `path` if it is no longer among the field's
    /// visible choices.
    fn prune_choices(&mut self, path: &AnswerPath) {
        let next = {
            let Some(field) = self.document.resolve(path) else {
                return;
            };
            let Some(current) = self.answers.get(path) else {
                return;
            };
            if field.choices().is_empty() {
                return;
            }
            let ctx = context_for(&self.answers, path);
            let allowed = visible_choices(field, &ctx);
            match retain_choices(current, &allowed) {
                Some(kept) if kept == *current => return,
                other => other,
            }
        };

        tracing::debug!(%path, "dropping answer outside the offered choices");
        match next {
            Some(kept) => self.answers.set(path, kept),
            None => {
                self.answers.remove(path);
            }
        }
    }
}

/// Apply one value change to `prior` and return the next state.
///
/// Changes addressing a panel instance past the panel's current count are
/// ignored. Re-reporting a controller's current value leaves its dependent
/// answer alone.
pub fn synchronize(rules: &SyncRules, change: &ValueChange, prior: &FormState) -> FormState {
    if !prior.within_instances(&change.path) {
        tracing::warn!(path = %change.path, "ignoring change outside the current panel instances");
        return prior.clone();
    }

    let unchanged = match prior.answers.get(&change.path) {
        Some(current) => *current == change.value,
        None => change.value.is_null(),
    };
    let mut state = prior.clone();

    if change.value.is_null() {
        state.answers.remove(&change.path);
    } else {
        state.answers.set(&change.path, change.value.clone());
    }

    for binding in &rules.counts {
        if let Some(panel) = binding.panel_for(&change.path) {
            state.set_panel_count(&panel, coerce_count(&change.value));
        }
    }

    for dependency in &rules.dependencies {
        if let Some(dependent) = dependency.dependent_for(&change.path) {
            if change.origin == ChangeOrigin::User
                && !unchanged
                && state.answers.remove(&dependent).is_some()
            {
                tracing::debug!(%dependent, controller = %change.path, "cleared dependent answer");
            }
            state.prune_choices(&dependent);
        }
    }

    state
}
