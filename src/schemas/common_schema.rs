// Common fields shared by every page type

use crate::ent_schema::{FieldDefault, FieldDefinition, FieldType, FieldValidator};

pub fn common_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("name", FieldType::String)
            .validate(FieldValidator::MinLength(1))
            .validate(FieldValidator::MaxLength(120)),
        FieldDefinition::new("description", FieldType::String)
            .optional()
            .validate(FieldValidator::MaxLength(5000)),
        FieldDefinition::new("location", FieldType::String)
            .optional()
            .validate(FieldValidator::MaxLength(255)),
        // Email address or phone number
        FieldDefinition::new("contactInfo", FieldType::String)
            .optional()
            .validate(FieldValidator::pattern(
                r"^([^@\s]+@[^@\s]+\.[^@\s]+|\+?[0-9][0-9 ()-]{5,})$",
            )),
        FieldDefinition::new("website", FieldType::String)
            .optional()
            .validate(FieldValidator::pattern(r"^https?://\S+$")),
        FieldDefinition::new("galleryImages", FieldType::StringList)
            .default_value(FieldDefault::EmptyList)
            .validate(FieldValidator::MaxLength(50)),
    ]
}
