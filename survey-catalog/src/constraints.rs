//! Questions with numeric range and pattern validation.

use survey_builder::{Bundle, FieldDefinition, InputType, NumericValidator, RegexValidator};

pub fn constraints() -> Bundle {
    Bundle::new(
        "bundle_constraints_v1",
        "Constraint Questions (Age, Income)",
        vec![
            FieldDefinition::input(
                "participant_age",
                "Enter your age (must be 18-65)",
                InputType::Number,
            )
            .required()
            .with_validator(
                NumericValidator::new(Some(18.0), Some(65.0))
                    .with_text("Age must be between 18 and 65 years."),
            ),
            FieldDefinition::input(
                "monthly_income",
                "Monthly income (minimum $1000)",
                InputType::Number,
            )
            .required()
            .with_validator(
                NumericValidator::new(Some(1000.0), None)
                    .with_text("Monthly income must be at least $1000."),
            ),
            FieldDefinition::text("phone_number", "Enter your phone number (10 digits)")
                .required()
                .with_validator(
                    RegexValidator::new("^[0-9]{10}$")
                        .with_text("Phone number must be exactly 10 digits."),
                ),
        ],
    )
}

pub fn age() -> Bundle {
    Bundle::new(
        "bundle_age_v1",
        "Age Question (with validation)",
        vec![
            FieldDefinition::input(
                "age",
                "What is your age? (Must be 18 or older)",
                InputType::Number,
            )
            .required()
            .with_validator(
                NumericValidator::new(Some(18.0), None)
                    .with_text("You must be at least 18 years old."),
            ),
        ],
    )
}
