//! Choice questions, including ones whose visibility or choices depend on
//! earlier answers.

use survey_builder::{
    Bundle, Choice, ChoiceField, ChoiceItem, FieldDefinition, FieldKind, InputType,
    NumericValidator, TextField,
};

fn radio<const N: usize>(name: &str, title: &str, choices: [&str; N]) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::RadioGroup(ChoiceField::new(choices))).with_title(title)
}

fn checkbox<const N: usize>(name: &str, title: &str, choices: [&str; N]) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Checkbox(ChoiceField::new(choices))).with_title(title)
}

fn city(value: &str, country: &str) -> Choice {
    Choice::Item(ChoiceItem::new(value, value).visible_if(format!("{{country}} = '{country}'")))
}

/// Country selector with a city list filtered by country.
pub fn choice_filter() -> Bundle {
    Bundle::new(
        "bundle_choice_filter_v2",
        "Dependent Choices (Country/City)",
        vec![
            radio("country", "Please select a country:", ["Canada", "USA", "India"]).required(),
            FieldDefinition::new(
                "city",
                FieldKind::RadioGroup(ChoiceField {
                    choices: vec![
                        city("Toronto", "Canada"),
                        city("Vancouver", "Canada"),
                        city("New York", "USA"),
                        city("Boston", "USA"),
                        city("Delhi", "India"),
                        city("Mumbai", "India"),
                    ],
                    choices_visible_if: Some("true".to_string()),
                }),
            )
            .with_title("Please select a city:")
            .visible_if("{country} notempty"),
        ],
    )
}

/// Employment status with one follow-up per status.
pub fn skip_logic() -> Bundle {
    let when = |status: &str| format!("{{employment_status}} = '{status}'");

    Bundle::new(
        "bundle_skip_logic_v1",
        "Skip Logic Group (Employment)",
        vec![
            radio(
                "employment_status",
                "What is your employment status?",
                ["Employed", "Self-Employed", "Unemployed", "Student", "Retired"],
            )
            .required(),
            FieldDefinition::text("company_name", "What is the name of your company?")
                .visible_if(when("Employed"))
                .required(),
            FieldDefinition::text("business_type", "What type of business do you run?")
                .visible_if(when("Self-Employed"))
                .required(),
            radio("job_seeking", "Are you actively looking for a job?", ["Yes", "No"])
                .visible_if(when("Unemployed"))
                .required(),
            FieldDefinition::text("field_of_study", "What is your field of study?")
                .visible_if(when("Student"))
                .required(),
            FieldDefinition::input("retirement_year", "What year did you retire?", InputType::Number)
                .visible_if(when("Retired"))
                .with_validator(NumericValidator::new(Some(1950.0), Some(2025.0))),
        ],
    )
}

fn suggestions<const N: usize>(name: &str, title: &str, choices: [&str; N]) -> FieldDefinition {
    FieldDefinition::new(
        name,
        FieldKind::Text(TextField {
            input_type: None,
            choices: choices.into_iter().map(Choice::from).collect(),
        }),
    )
    .with_title(title)
}

/// Feature checklist with follow-ups for selected features.
pub fn multiple_select_logic() -> Bundle {
    Bundle::new(
        "bundle_multiple_select_logic_v1",
        "Multiple Selection with Follow-up Logic",
        vec![
            checkbox(
                "preferred_features",
                "Which features are most important to you? (Select all that apply)",
                ["Fast Delivery", "Low Price", "Quality", "Customer Support", "Easy Returns"],
            )
            .required(),
            suggestions(
                "delivery_preference",
                "What is your preferred delivery time?",
                ["Same Day", "Next Day", "2-3 Days", "Within a Week"],
            )
            .visible_if("{preferred_features} contains 'Fast Delivery'"),
            suggestions(
                "support_channel",
                "How do you prefer to contact customer support?",
                ["Phone", "Email", "Live Chat", "In-Person"],
            )
            .visible_if("{preferred_features} contains 'Customer Support'"),
        ],
    )
}

/// Yes/No with an email follow-up.
pub fn email() -> Bundle {
    Bundle::new(
        "bundle_email_v1",
        "Email Logic Block (Yes/No with Follow-up)",
        vec![
            radio("has_email", "Do you have an email address?", ["Yes", "No"]).required(),
            FieldDefinition::input(
                "email_address",
                "Please enter your email address.",
                InputType::Email,
            )
            .required()
            .visible_if("{has_email} = 'Yes'"),
        ],
    )
}

pub fn equipment() -> Bundle {
    Bundle::new(
        "bundle_equipment_v1",
        "Multiple Choice Question",
        vec![checkbox(
            "equipment",
            "What office equipment do you use?",
            ["Laptop", "External Monitor", "Printer", "Other"],
        )],
    )
}

pub fn ranking() -> Bundle {
    Bundle::new(
        "bundle_ranking_v1",
        "Ranking Question",
        vec![
            FieldDefinition::new(
                "priority_ranking",
                FieldKind::Ranking(ChoiceField::new(["Price", "Customer Support", "Ease of Use"])),
            )
            .with_title("Please rank these features in order of importance."),
        ],
    )
}
