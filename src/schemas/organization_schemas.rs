// Organization page schemas: academy, venue, community, club, pitch

use crate::core::PageType;
use crate::ent_schema::{FieldDefault, FieldDefinition, FieldType, FieldValidator, PageSchema};

fn surface_type() -> FieldType {
    FieldType::one_of(&["grass", "artificial", "hybrid", "indoor"])
}

fn founded_year() -> FieldDefinition {
    FieldDefinition::new("foundedYear", FieldType::Int)
        .optional()
        .validate(FieldValidator::Range(1800.0, 2100.0))
}

pub struct AcademySchema;

impl PageSchema for AcademySchema {
    fn page_type() -> PageType {
        PageType::Academy
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("staffCount", FieldType::Int)
                .default_value(FieldDefault::Int(0))
                .validate(FieldValidator::Range(0.0, 10_000.0)),
            FieldDefinition::new("programsOffered", FieldType::StringList)
                .default_value(FieldDefault::EmptyList),
            FieldDefinition::new("ageGroups", FieldType::StringList)
                .default_value(FieldDefault::EmptyList),
            founded_year(),
        ]
    }
}

pub struct VenueSchema;

impl PageSchema for VenueSchema {
    fn page_type() -> PageType {
        PageType::Venue
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("capacity", FieldType::Int)
                .default_value(FieldDefault::Int(0))
                .validate(FieldValidator::Range(0.0, 200_000.0)),
            // e.g. "105x68m"
            FieldDefinition::new("groundDimensions", FieldType::String).optional(),
            FieldDefinition::new("floodlights", FieldType::Bool)
                .default_value(FieldDefault::Bool(false)),
            FieldDefinition::new("surfaceType", surface_type()).optional(),
        ]
    }
}

pub struct CommunitySchema;

impl PageSchema for CommunitySchema {
    fn page_type() -> PageType {
        PageType::Community
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("memberCount", FieldType::Int)
                .default_value(FieldDefault::Int(0))
                .validate(FieldValidator::Range(0.0, 10_000_000.0)),
            FieldDefinition::new("rules", FieldType::StringList)
                .default_value(FieldDefault::EmptyList)
                .validate(FieldValidator::MaxLength(100)),
            FieldDefinition::new("visibility", FieldType::one_of(&["public", "private"]))
                .default_value(FieldDefault::String("public".to_string())),
        ]
    }
}

pub struct ClubSchema;

impl PageSchema for ClubSchema {
    fn page_type() -> PageType {
        PageType::Club
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            founded_year(),
            FieldDefinition::new("league", FieldType::String).optional(),
            FieldDefinition::new("homeGround", FieldType::String).optional(),
            FieldDefinition::new("squadSize", FieldType::Int)
                .default_value(FieldDefault::Int(0))
                .validate(FieldValidator::Range(0.0, 500.0)),
        ]
    }
}

pub struct PitchSchema;

impl PageSchema for PitchSchema {
    fn page_type() -> PageType {
        PageType::Pitch
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("surfaceType", surface_type()).optional(),
            FieldDefinition::new("pitchSize", FieldType::one_of(&["5-a-side", "7-a-side", "11-a-side"]))
                .optional(),
            FieldDefinition::new("hourlyRate", FieldType::Float)
                .optional()
                .validate(FieldValidator::Range(0.0, 100_000.0)),
            FieldDefinition::new("floodlights", FieldType::Bool)
                .default_value(FieldDefault::Bool(false)),
        ]
    }
}
