//! Repeating groups sized by a count question.

use survey_builder::{
    Bundle, DynamicPanelField, FieldDefinition, FieldKind, InputType, NumericValidator,
};

fn numeric(min: f64, max: f64, text: &str) -> NumericValidator {
    NumericValidator::new(Some(min), Some(max)).with_text(text)
}

/// Children count plus one details panel per child.
pub fn simple_repeat() -> Bundle {
    Bundle::new(
        "bundle_simple_repeat_v2",
        "Repeating Group (for Children)",
        vec![
            FieldDefinition::input(
                "children_count",
                "How many children do you have?",
                InputType::Number,
            )
            .required()
            .with_validator(numeric(0.0, 10.0, "Value must be between 0 and 10.")),
            FieldDefinition::new(
                "children_details",
                FieldKind::PanelDynamic(DynamicPanelField {
                    template_elements: vec![
                        FieldDefinition::text("child_name", "Child's Name").required(),
                        FieldDefinition::input("child_age", "Child's Age", InputType::Number)
                            .required()
                            .with_validator(numeric(0.0, 17.0, "Age must be between 0 and 17.")),
                    ],
                    panel_count: Some(0),
                    min_panel_count: Some(0),
                    max_panel_count: Some(10),
                    allow_add_panel: Some(false),
                    allow_remove_panel: Some(false),
                    template_title: Some("Child #{panelIndex}".to_string()),
                }),
            )
            .with_title("Children Details")
            .visible_if("{children_count} > 0"),
        ],
    )
}

/// Household members, each with their own list of assets.
pub fn nested_repeat() -> Bundle {
    let assets = FieldDefinition::new(
        "member_assets",
        FieldKind::PanelDynamic(DynamicPanelField {
            template_elements: vec![
                FieldDefinition::text("asset_name", "Asset Name (e.g., Phone, Bicycle)").required(),
                FieldDefinition::input(
                    "asset_value",
                    "Estimated Value (in local currency)",
                    InputType::Number,
                )
                .with_validator(
                    NumericValidator::new(Some(0.0), None).with_text("Value must be positive."),
                ),
            ],
            panel_count: Some(0),
            max_panel_count: Some(20),
            allow_add_panel: Some(false),
            allow_remove_panel: Some(false),
            template_title: Some("Asset #{panelIndex}".to_string()),
            ..Default::default()
        }),
    )
    .with_title("Asset Details")
    .visible_if("{panel.asset_count} > 0");

    Bundle::new(
        "bundle_nested_repeat_v2",
        "Nested Repeats (Household & Assets)",
        vec![
            FieldDefinition::input(
                "household_size",
                "How many members are in your household?",
                InputType::Number,
            )
            .required()
            .with_validator(numeric(1.0, 15.0, "Household size must be between 1 and 15.")),
            FieldDefinition::new(
                "household_members",
                FieldKind::PanelDynamic(DynamicPanelField {
                    template_elements: vec![
                        FieldDefinition::text("member_name", "Member's Name").required(),
                        FieldDefinition::input(
                            "asset_count",
                            "How many assets does this person own?",
                            InputType::Number,
                        )
                        .with_validator(numeric(0.0, 20.0, "Asset count must be between 0 and 20.")),
                        assets,
                    ],
                    panel_count: Some(0),
                    min_panel_count: Some(0),
                    max_panel_count: Some(15),
                    allow_add_panel: Some(false),
                    allow_remove_panel: Some(false),
                    template_title: Some("Member #{panelIndex}".to_string()),
                }),
            )
            .with_title("Household Member Information")
            .visible_if("{household_size} > 0"),
        ],
    )
}
