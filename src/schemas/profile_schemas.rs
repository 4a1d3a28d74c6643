// Personal profile schemas: player and coach

use crate::core::PageType;
use crate::ent_schema::{FieldDefinition, FieldType, FieldValidator, PageSchema};

pub struct PlayerSchema;

impl PageSchema for PlayerSchema {
    fn page_type() -> PageType {
        PageType::Player
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("position", FieldType::String).optional(),
            FieldDefinition::new("dateOfBirth", FieldType::String)
                .optional()
                .validate(FieldValidator::pattern(r"^\d{4}-\d{2}-\d{2}$")),
            FieldDefinition::new("preferredFoot", FieldType::one_of(&["left", "right", "both"]))
                .optional(),
            FieldDefinition::new("heightCm", FieldType::Int)
                .optional()
                .validate(FieldValidator::Range(100.0, 250.0)),
            FieldDefinition::new("currentClub", FieldType::String).optional(),
        ]
    }
}

pub struct CoachSchema;

impl PageSchema for CoachSchema {
    fn page_type() -> PageType {
        PageType::Coach
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("licenseLevel", FieldType::String).optional(),
            FieldDefinition::new("specialization", FieldType::String).optional(),
            FieldDefinition::new("yearsExperience", FieldType::Int)
                .optional()
                .validate(FieldValidator::Range(0.0, 80.0)),
        ]
    }
}
