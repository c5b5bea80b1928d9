//! Questions pre-filled with default values.

use survey_builder::{Bundle, ChoiceField, FieldDefinition, FieldKind, InputType};

/// Default value resolved to the current date by renderers.
pub const TODAY: &str = "today()";

pub fn defaults() -> Bundle {
    Bundle::new(
        "bundle_defaults_v1",
        "Questions with Default Values",
        vec![
            FieldDefinition::text("country_of_residence", "What is your country of residence?")
                .with_default("Canada"),
            FieldDefinition::input("survey_date", "Survey Date", InputType::Date).with_default(TODAY),
            FieldDefinition::new(
                "preferred_language",
                FieldKind::RadioGroup(ChoiceField::new(["English", "Spanish", "French", "Other"])),
            )
            .with_title("Preferred Language")
            .with_default("English"),
        ],
    )
}
