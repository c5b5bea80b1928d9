//! End-to-end flows over the real catalog: merging bundles, synchronizing
//! repeating groups and dependent choices, completing and clearing.

use pretty_assertions::assert_eq;
use serde_json::json;
use survey_builder::{
    Action, AnswerPath, EvalContext, FieldKind, Notice, RendererHost, SelectedFile, Store,
    SurveyDocument, TestRenderer, ValueChange, expression, is_field_visible,
};
use survey_catalog::{catalog, sync_rules};

fn store() -> Store {
    Store::new(sync_rules())
}

fn add(store: &mut Store, id: &str) -> Notice {
    let bundle = catalog().get(id).cloned().unwrap();
    store.dispatch(Action::AddBundle(bundle))
}

fn path(s: &str) -> AnswerPath {
    AnswerPath::parse(s).unwrap()
}

#[test]
fn age_bundle_added_once() {
    let mut store = store();
    add(&mut store, "bundle_age_v1");

    assert_eq!(store.document().pages.len(), 1);
    assert_eq!(store.document().field_names(), vec!["age"]);

    let notice = add(&mut store, "bundle_age_v1");
    let Notice::AllDuplicates { duplicates } = &notice else {
        panic!("expected duplicates, got {notice:?}");
    };
    assert_eq!(duplicates, &vec!["age".to_string()]);
    assert_eq!(store.question_count(), 1);
}

#[test]
fn age_bundle_serializes_like_the_web_form_schema() {
    let bundle = catalog().get("bundle_age_v1").cloned().unwrap();
    let value = serde_json::to_value(&bundle).unwrap();

    assert_eq!(
        value,
        json!({
            "id": "bundle_age_v1",
            "bundleTitle": "Age Question (with validation)",
            "questionSchemas": [{
                "type": "text",
                "inputType": "number",
                "name": "age",
                "title": "What is your age? (Must be 18 or older)",
                "isRequired": true,
                "validators": [{
                    "type": "numeric",
                    "minValue": 18,
                    "text": "You must be at least 18 years old."
                }]
            }]
        })
    );
}

#[test]
fn every_bundle_round_trips_through_json() {
    for bundle in &catalog() {
        let text = serde_json::to_string(bundle).unwrap();
        let back: survey_builder::Bundle = serde_json::from_str(&text).unwrap();
        assert_eq!(&back, bundle, "bundle {}", bundle.id);
    }
}

#[test]
fn whole_catalog_merges_without_duplicates() {
    let mut store = store();
    for bundle in &catalog() {
        let notice = store.dispatch(Action::AddBundle(bundle.clone()));
        assert!(notice.is_silent(), "{}: {notice}", bundle.id);
    }
    assert_eq!(store.metadata().total_bundles_added, 18);
    assert_eq!(store.question_count(), 42);
}

#[test]
fn children_count_drives_panel() {
    let mut store = store();
    add(&mut store, "bundle_simple_repeat_v2");

    store.dispatch(Action::ValueChanged(ValueChange::user("children_count", 3)));
    assert_eq!(store.panel_count(&path("children_details")), 3);

    store.dispatch(Action::ValueChanged(ValueChange::user("children_count", -1)));
    assert_eq!(store.panel_count(&path("children_details")), 0);

    store.dispatch(Action::ValueChanged(ValueChange::user("children_count", "abc")));
    assert_eq!(store.panel_count(&path("children_details")), 0);
}

#[test]
fn asset_panels_are_per_member() {
    let mut store = store();
    add(&mut store, "bundle_nested_repeat_v2");

    let renderer = TestRenderer::new()
        .with_int("household_size", 3)
        .with_int("household_members[0].asset_count", 1)
        .with_int("household_members[2].asset_count", 4);
    survey_builder::FormRenderer::render(&renderer, &mut store).unwrap();

    assert_eq!(store.panel_count(&path("household_members")), 3);
    assert_eq!(store.panel_count(&path("household_members[0].member_assets")), 1);
    assert_eq!(store.panel_count(&path("household_members[1].member_assets")), 0);
    assert_eq!(store.panel_count(&path("household_members[2].member_assets")), 4);

    let assets = store.document().resolve(&path("household_members[1].member_assets")).unwrap();
    let ctx = survey_builder::context_for(store.answers(), &path("household_members[1].member_assets"));
    assert!(!is_field_visible(assets, &ctx));
    let ctx = survey_builder::context_for(store.answers(), &path("household_members[2].member_assets"));
    assert!(is_field_visible(assets, &ctx));
}

#[test]
fn country_change_clears_city() {
    let mut store = store();
    add(&mut store, "bundle_choice_filter_v2");

    store.dispatch(Action::ValueChanged(ValueChange::user("country", "Canada")));
    store.dispatch(Action::ValueChanged(ValueChange::user("city", "Vancouver")));
    store.dispatch(Action::ValueChanged(ValueChange::user("country", "India")));

    assert_eq!(store.answers().get_field("city"), None);

    let city = store.document().find_field("city").unwrap();
    let offered: Vec<&str> =
        survey_builder::visible_choices(city, &EvalContext::new(store.answers()))
            .iter()
            .map(|c| c.value())
            .collect();
    assert_eq!(offered, vec!["Delhi", "Mumbai"]);
}

#[test]
fn additions_preserve_answers() {
    let mut store = store();
    add(&mut store, "bundle_email_v1");
    store.dispatch(Action::ValueChanged(ValueChange::user("has_email", "Yes")));
    store.dispatch(Action::ValueChanged(ValueChange::user("email_address", "a@b.c")));
    let before = store.answers().clone();

    add(&mut store, "bundle_constraints_v1");
    add(&mut store, "bundle_email_v1");

    assert_eq!(store.answers(), &before);
}

#[test]
fn calculations_chain() {
    let mut store = store();
    add(&mut store, "bundle_calculations_v1");
    store.dispatch(Action::ValueChanged(ValueChange::user("product_price", 25)));
    store.dispatch(Action::ValueChanged(ValueChange::user("quantity", 2)));

    let evaluate = |name: &str, store: &Store| {
        let Some(FieldKind::Expression(calc)) = store.document().find_field(name).map(|f| &f.kind)
        else {
            panic!("{name} is not an expression");
        };
        expression::parse(&calc.expression)
            .unwrap()
            .evaluate(&EvalContext::new(store.answers()))
    };

    let subtotal = evaluate("subtotal", &store);
    assert_eq!(subtotal, json!(50));
    store.dispatch(Action::ValueChanged(ValueChange::programmatic("subtotal", subtotal)));
    let tax = evaluate("tax", &store);
    assert_eq!(tax, json!(4));
    store.dispatch(Action::ValueChanged(ValueChange::programmatic("tax", tax)));
    assert_eq!(evaluate("total", &store), json!(54));
}

#[test]
fn media_upload_limits() {
    let mut store = store();
    add(&mut store, "bundle_media_upload_v1");

    let too_big = SelectedFile::new("me.png", "image/png", vec![0; 3 * 1024 * 1024]);
    let err = RendererHost::upload(
        &mut store,
        survey_builder::UploadRequest::new("profile_photo", too_big),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "File size exceeds limit of 2MB");

    let doc = SelectedFile::new("passport.pdf", "application/pdf", vec![1; 10]);
    RendererHost::upload(
        &mut store,
        survey_builder::UploadRequest::new("identity_document", doc),
    )
    .unwrap();
    assert_eq!(store.previews().len(), 1);
}

#[test]
fn completion_then_clear_flow() {
    let mut store = store();
    add(&mut store, "bundle_equipment_v1");
    add(&mut store, "bundle_ranking_v1");

    let renderer = TestRenderer::new()
        .with_choices("equipment", ["Laptop", "Printer"])
        .with_choices("priority_ranking", ["Ease of Use", "Price", "Customer Support"]);
    let Notice::Completed(report) = store.run(&renderer).unwrap() else {
        panic!("expected completion");
    };

    assert_eq!(report.metadata.final_question_count, 2);
    assert!(report.summary.contains("equipment: [\"Laptop\",\"Printer\"]\n"));
    assert_eq!(store.document(), &SurveyDocument::initial());
    assert!(matches!(
        store.dispatch(Action::Clear { confirmed: true }),
        Notice::AlreadyEmpty
    ));
}

#[test]
fn clearing_non_empty_survey() {
    let mut store = store();
    add(&mut store, "bundle_matrix_v1");
    store.dispatch(Action::ValueChanged(ValueChange::user(
        "service_ratings",
        json!({ "speed": "good" }),
    )));

    assert!(matches!(
        store.dispatch(Action::Clear { confirmed: false }),
        Notice::ConfirmClear
    ));
    assert!(matches!(
        store.dispatch(Action::Clear { confirmed: true }),
        Notice::Cleared
    ));
    assert_eq!(store.document(), &SurveyDocument::initial());
    assert!(store.answers().is_empty());
}
