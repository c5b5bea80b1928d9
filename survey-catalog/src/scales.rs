//! Rating scales.

use survey_builder::{Bundle, FieldDefinition, FieldKind, RatingField};

fn rating(name: &str, title: &str, field: RatingField) -> FieldDefinition {
    FieldDefinition::new(name, FieldKind::Rating(field)).with_title(title)
}

fn described(min: i64, max: i64, low: &str, high: &str) -> RatingField {
    RatingField {
        rate_step: Some(1),
        min_rate_description: Some(low.to_string()),
        max_rate_description: Some(high.to_string()),
        ..RatingField::new(min, max)
    }
}

pub fn range_scale() -> Bundle {
    Bundle::new(
        "bundle_range_scale_v1",
        "Range & Scale Questions",
        vec![
            rating(
                "service_satisfaction",
                "Rate our service (1-10)",
                described(1, 10, "Very Poor", "Excellent"),
            )
            .required(),
            rating(
                "likelihood_recommend",
                "How likely are you to recommend us? (0-10)",
                described(0, 10, "Not at all likely", "Extremely likely"),
            ),
            rating(
                "price_rating",
                "Rate our pricing (1-5 stars)",
                RatingField {
                    rate_step: Some(1),
                    display_mode: Some("stars".to_string()),
                    ..RatingField::new(1, 5)
                },
            ),
        ],
    )
}

pub fn satisfaction() -> Bundle {
    Bundle::new(
        "bundle_satisfaction_v1",
        "Rating Scale (Slider)",
        vec![rating(
            "satisfaction_score",
            "On a scale of 1 to 10, how satisfied are you?",
            RatingField::new(1, 10),
        )],
    )
}
