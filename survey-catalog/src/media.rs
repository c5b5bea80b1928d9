//! File upload questions.

use survey_builder::{Bundle, FieldDefinition, FieldKind, FileField};

const MB: u64 = 1024 * 1024;

fn file(name: &str, title: &str, accepted: &str, max_size: u64) -> FieldDefinition {
    FieldDefinition::new(
        name,
        FieldKind::File(FileField {
            accepted_types: Some(accepted.to_string()),
            store_data_as_text: Some(false),
            max_size: Some(max_size),
            allow_multiple: Some(false),
        }),
    )
    .with_title(title)
}

/// Image, audio and document uploads with per-kind limits.
pub fn media_upload() -> Bundle {
    Bundle::new(
        "bundle_media_upload_v1",
        "Media Upload (Image, Audio, Document)",
        vec![
            file(
                "profile_photo",
                "Upload your profile photo (Image)",
                "image/*",
                2 * MB,
            ),
            file(
                "voice_recording",
                "Upload a voice recording (Audio)",
                "audio/*",
                10 * MB,
            ),
            file(
                "identity_document",
                "Upload identity document (PDF/Image)",
                ".pdf,.jpg,.jpeg,.png,.doc,.docx",
                5 * MB,
            ),
        ],
    )
}

pub fn photo_id() -> Bundle {
    Bundle::new(
        "bundle_photo_id_v1",
        "Simple Image Upload Question",
        vec![file(
            "photo_id",
            "Please upload a picture of your photo ID.",
            "image/*",
            2 * MB,
        )],
    )
}
