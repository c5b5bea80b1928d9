//! Auto-computed expression fields.

use survey_builder::{
    Bundle, ExpressionField, FieldDefinition, FieldKind, InputType, NumericValidator,
};

fn currency(name: &str, title: &str, expression: &str) -> FieldDefinition {
    FieldDefinition::new(
        name,
        FieldKind::Expression(ExpressionField {
            expression: expression.to_string(),
            display_style: Some("currency".to_string()),
        }),
    )
    .with_title(title)
}

/// Price times quantity, plus 8% tax.
pub fn calculations() -> Bundle {
    Bundle::new(
        "bundle_calculations_v1",
        "Calculations (Auto-computed Fields)",
        vec![
            FieldDefinition::input("product_price", "Enter product price ($)", InputType::Number)
                .required()
                .with_validator(NumericValidator::new(Some(0.0), None)),
            FieldDefinition::input("quantity", "Enter quantity", InputType::Number)
                .required()
                .with_validator(NumericValidator::new(Some(1.0), None)),
            currency("subtotal", "Subtotal", "{product_price} * {quantity}"),
            currency("tax", "Tax (8%)", "{subtotal} * 0.08"),
            currency("total", "Total Amount", "{subtotal} + {tax}"),
        ],
    )
}
