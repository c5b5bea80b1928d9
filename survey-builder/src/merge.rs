//! Folding candidate field definitions into a survey document.

use survey_builder_types::{FieldDefinition, SurveyDocument};

/// Result of [`merge_fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The document with accepted fields appended. Equal to the input when
    /// nothing was added.
    pub document: SurveyDocument,
    /// Names of the fields that were appended, in insertion order.
    pub added: Vec<String>,
    /// Names that collided with an existing field or an earlier candidate.
    pub duplicates: Vec<String>,
}

impl MergeOutcome {
    /// True if no candidate was accepted.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
    }
}

/// Append every candidate whose name is not yet used.
///
/// Candidates are cloned, so the caller's templates are never shared with the
/// document. Accepted fields go to the end of the first page; the page's
/// element list is rebuilt rather than mutated in place.
pub fn merge_fields(document: &SurveyDocument, candidates: &[FieldDefinition]) -> MergeOutcome {
    let mut accepted: Vec<FieldDefinition> = Vec::new();
    let mut duplicates = Vec::new();

    for candidate in candidates {
        let taken = document.contains_field(&candidate.name)
            || accepted.iter().any(|f| f.name == candidate.name);
        if taken {
            duplicates.push(candidate.name.clone());
            continue;
        }
        let mut field = candidate.clone();
        apply_panel_defaults(&mut field);
        accepted.push(field);
    }

    let added: Vec<String> = accepted.iter().map(|f| f.name.clone()).collect();

    if accepted.is_empty() {
        tracing::debug!(?duplicates, "merge skipped, all candidates are duplicates");
        return MergeOutcome {
            document: document.clone(),
            added,
            duplicates,
        };
    }

    let mut next = document.clone();
    if next.pages.is_empty() {
        next.pages = SurveyDocument::initial().pages;
    }
    let first = &mut next.pages[0];
    first.elements = first
        .elements
        .iter()
        .cloned()
        .chain(accepted)
        .collect();

    tracing::debug!(?added, ?duplicates, "merged fields into document");

    MergeOutcome {
        document: next,
        added,
        duplicates,
    }
}

/// Fill in the dynamic panel attributes a renderer needs when a template
/// leaves them out.
fn apply_panel_defaults(field: &mut FieldDefinition) {
    if let Some(panel) = field.as_dynamic_panel_mut() {
        panel.panel_count.get_or_insert(0);
        panel.allow_add_panel.get_or_insert(true);
        panel.allow_remove_panel.get_or_insert(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use survey_builder_types::{DynamicPanelField, FieldKind, InputType};

    fn age() -> FieldDefinition {
        FieldDefinition::input("age", "What is your age?", InputType::Number)
    }

    #[test]
    fn adds_into_empty_document() {
        let outcome = merge_fields(&SurveyDocument::initial(), &[age()]);

        assert_eq!(outcome.added, vec!["age"]);
        assert!(outcome.duplicates.is_empty());
        assert_eq!(outcome.document.pages.len(), 1);
        assert_eq!(outcome.document.field_names(), vec!["age"]);
    }

    #[test]
    fn all_duplicates_is_noop() {
        let doc = merge_fields(&SurveyDocument::initial(), &[age()]).document;
        let outcome = merge_fields(&doc, &[age()]);

        assert!(outcome.is_noop());
        assert_eq!(outcome.duplicates, vec!["age"]);
        assert_eq!(outcome.document, doc);
    }

    #[test]
    fn mixed_candidates_keep_existing_order() {
        let doc = merge_fields(
            &SurveyDocument::initial(),
            &[FieldDefinition::text("a", "A"), FieldDefinition::text("b", "B")],
        )
        .document;

        let outcome = merge_fields(
            &doc,
            &[
                FieldDefinition::text("b", "B again"),
                FieldDefinition::text("c", "C"),
                FieldDefinition::text("c", "C twice"),
            ],
        );

        assert_eq!(outcome.document.field_names(), vec!["a", "b", "c"]);
        assert_eq!(outcome.added, vec!["c"]);
        assert_eq!(outcome.duplicates, vec!["b", "c"]);
        assert_eq!(
            outcome.document.find_field("b").and_then(|f| f.title.as_deref()),
            Some("B")
        );
    }

    #[test]
    fn dynamic_panel_defaults_filled() {
        let panel = FieldDefinition::new(
            "children_details",
            FieldKind::PanelDynamic(DynamicPanelField {
                max_panel_count: Some(10),
                ..Default::default()
            }),
        );

        let outcome = merge_fields(&SurveyDocument::initial(), &[panel]);
        let merged = outcome
            .document
            .find_field("children_details")
            .and_then(|f| f.as_dynamic_panel())
            .unwrap();

        assert_eq!(merged.panel_count, Some(0));
        assert_eq!(merged.allow_add_panel, Some(true));
        assert_eq!(merged.allow_remove_panel, Some(true));
        assert_eq!(merged.max_panel_count, Some(10));
    }

    #[test]
    fn existing_panel_settings_are_kept() {
        let panel = FieldDefinition::new(
            "members",
            FieldKind::PanelDynamic(DynamicPanelField {
                panel_count: Some(2),
                allow_add_panel: Some(false),
                ..Default::default()
            }),
        );

        let outcome = merge_fields(&SurveyDocument::initial(), &[panel]);
        let merged = outcome.document.fields().next().and_then(|f| f.as_dynamic_panel()).unwrap();

        assert_eq!(merged.panel_count, Some(2));
        assert_eq!(merged.allow_add_panel, Some(false));
        assert_eq!(merged.allow_remove_panel, Some(true));
    }
}
