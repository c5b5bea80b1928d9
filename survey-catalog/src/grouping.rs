//! Static panels and matrix grids.

use survey_builder::{
    Bundle, ChoiceItem, FieldDefinition, FieldKind, InputType, MatrixField, PanelField,
};

fn panel(name: &str, title: &str, elements: Vec<FieldDefinition>) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Panel(PanelField { elements })).with_title(title)
}

pub fn grouped_questions() -> Bundle {
    Bundle::new(
        "bundle_grouped_questions_v1",
        "Grouped Questions (Personal Info)",
        vec![
            panel(
                "personal_info_group",
                "Personal Information",
                vec![
                    FieldDefinition::text("first_name", "First Name").required(),
                    FieldDefinition::text("last_name", "Last Name").required(),
                    FieldDefinition::input("date_of_birth", "Date of Birth", InputType::Date)
                        .required(),
                ],
            ),
            panel(
                "contact_info_group",
                "Contact Information",
                vec![
                    FieldDefinition::input("email_contact", "Email Address", InputType::Email)
                        .required(),
                    FieldDefinition::text("phone_contact", "Phone Number").required(),
                    FieldDefinition::text("address", "Home Address"),
                ],
            ),
        ],
    )
}

fn items(pairs: &[(&str, &str)]) -> Vec<ChoiceItem> {
    pairs.iter().map(|(v, t)| ChoiceItem::new(*v, *t)).collect()
}

pub fn matrix() -> Bundle {
    Bundle::new(
        "bundle_matrix_v1",
        "Matrix Questions (Rating Grid)",
        vec![
            FieldDefinition::new(
                "service_ratings",
                FieldKind::Matrix(MatrixField {
                    columns: items(&[
                        ("excellent", "Excellent"),
                        ("good", "Good"),
                        ("fair", "Fair"),
                        ("poor", "Poor"),
                    ]),
                    rows: items(&[
                        ("speed", "Speed of Service"),
                        ("quality", "Quality"),
                        ("friendliness", "Staff Friendliness"),
                        ("value", "Value for Money"),
                    ]),
                }),
            )
            .with_title("Please rate the following aspects of our service:")
            .required(),
        ],
    )
}
