//! Field and choice visibility against the current answers.

use serde_json::Value;
use survey_builder_types::{AnswerPath, Answers, Choice, FieldDefinition, FieldKind, Segment};

use crate::expression::{EvalContext, is_visible};

/// Evaluation context for the field answering at `path`.
///
/// Fields inside a dynamic panel instance see that instance as `{panel}`.
pub fn context_for<'a>(answers: &'a Answers, path: &AnswerPath) -> EvalContext<'a> {
    let parent = path.parent();
    match parent.segments().last() {
        Some(Segment::Index(_)) => EvalContext::in_panel(answers, parent),
        _ => EvalContext::new(answers),
    }
}

/// Whether `field` is shown.
pub fn is_field_visible(field: &FieldDefinition, ctx: &EvalContext<'_>) -> bool {
    is_visible(field.visible_if.as_deref(), ctx)
}

/// The choices of `field` currently offered to the user.
///
/// A choice is offered when its own `visibleIf` holds and the field's
/// `choicesVisibleIf` holds with `{item}` bound to the choice value.
pub fn visible_choices<'f>(field: &'f FieldDefinition, ctx: &EvalContext<'_>) -> Vec<&'f Choice> {
    let list_rule = match &field.kind {
        FieldKind::RadioGroup(c) | FieldKind::Checkbox(c) | FieldKind::Ranking(c) => {
            c.choices_visible_if.as_deref()
        }
        _ => None,
    };

    field
        .choices()
        .iter()
        .filter(|choice| {
            is_visible(choice.visible_if(), ctx)
                && (list_rule.is_none()
                    || is_visible(
                        list_rule,
                        &ctx.with_item(Value::String(choice.value().to_string())),
                    ))
        })
        .collect()
}

/// Drop the parts of `value` that are not among `allowed` choice values.
///
/// Returns `None` when nothing valid is left. Values of other shapes pass
/// through untouched.
pub fn retain_choices(value: &Value, allowed: &[&Choice]) -> Option<Value> {
    let offered = |v: &str| allowed.iter().any(|c| c.value() == v);
    match value {
        Value::String(s) => offered(s).then(|| value.clone()),
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .iter()
                .filter(|item| item.as_str().is_none_or(|v| offered(v)))
                .cloned()
                .collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_builder_types::{ChoiceField, ChoiceItem};
    use serde_json::json;

    fn city() -> FieldDefinition {
        FieldDefinition::new(
            "city",
            FieldKind::RadioGroup(ChoiceField {
                choices: vec![
                    Choice::Item(ChoiceItem::new("Toronto", "Toronto").visible_if("{country} = 'Canada'")),
                    Choice::Item(ChoiceItem::new("Boston", "Boston").visible_if("{country} = 'USA'")),
                ],
                choices_visible_if: Some("true".to_string()),
            }),
        )
        .visible_if("{country} notempty")
    }

    #[test]
    fn choices_follow_controller() {
        let answers: Answers = serde_json::from_value(json!({ "country": "USA" })).unwrap();
        let field = city();
        let ctx = EvalContext::new(&answers);

        let offered: Vec<&str> = visible_choices(&field, &ctx).iter().map(|c| c.value()).collect();
        assert_eq!(offered, vec!["Boston"]);
        assert!(is_field_visible(&field, &ctx));
    }

    #[test]
    fn item_binding_in_list_rule() {
        let mut field = city();
        if let FieldKind::RadioGroup(c) = &mut field.kind {
            c.choices = vec![Choice::from("a"), Choice::from("b")];
            c.choices_visible_if = Some("{item} != 'b'".to_string());
        }
        let answers = Answers::new();

        let offered: Vec<&str> = visible_choices(&field, &EvalContext::new(&answers))
            .iter()
            .map(|c| c.value())
            .collect();
        assert_eq!(offered, vec!["a"]);
    }

    #[test]
    fn panel_context_from_path() {
        let answers: Answers =
            serde_json::from_value(json!({ "members": [{ "n": 1 }, { "n": 0 }] })).unwrap();
        let field = FieldDefinition::text("assets", "Assets").visible_if("{panel.n} > 0");

        let first = AnswerPath::parse("members[0].assets").unwrap();
        let second = AnswerPath::parse("members[1].assets").unwrap();
        assert!(is_field_visible(&field, &context_for(&answers, &first)));
        assert!(!is_field_visible(&field, &context_for(&answers, &second)));
    }

    #[test]
    fn retain_filters_values() {
        let a = Choice::from("a");
        let allowed = vec![&a];

        assert_eq!(retain_choices(&json!("a"), &allowed), Some(json!("a")));
        assert_eq!(retain_choices(&json!("z"), &allowed), None);
        assert_eq!(retain_choices(&json!(["a", "z"]), &allowed), Some(json!(["a"])));
        assert_eq!(retain_choices(&json!(["z"]), &allowed), None);
        assert_eq!(retain_choices(&json!(3), &allowed), Some(json!(3)));
    }
}
