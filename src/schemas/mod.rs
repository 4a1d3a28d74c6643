// Schema definitions module - centralized, static page schema registry

pub mod common_schema;
pub mod organization_schemas;
pub mod profile_schemas;

use once_cell::sync::Lazy;

use crate::ent_schema::SchemaRegistry;

pub use common_schema::common_fields;
pub use organization_schemas::{AcademySchema, ClubSchema, CommunitySchema, PitchSchema, VenueSchema};
pub use profile_schemas::{CoachSchema, PlayerSchema};

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(create_schema_registry);

/// Build the registry with every page type
pub fn create_schema_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new(common_fields());

    registry.register::<AcademySchema>();
    registry.register::<VenueSchema>();
    registry.register::<CommunitySchema>();
    registry.register::<ClubSchema>();
    registry.register::<PitchSchema>();
    registry.register::<PlayerSchema>();
    registry.register::<CoachSchema>();

    registry
}

/// Process-wide registry; built once and never mutated
pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageType;
    use crate::ent_schema::{FieldMap, FieldScope};
    use crate::error::AppError;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FieldMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn venue_accepts_capacity_community_rejects_it() {
        let reg = registry();
        assert!(reg.validate(PageType::Venue, &fields(json!({"capacity": 500}))).is_ok());

        let violations = reg
            .validate(PageType::Community, &fields(json!({"capacity": 500})))
            .unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "capacity");
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let reg = registry();
        assert_eq!(
            reg.schema_for_tag("stadium").unwrap_err(),
            AppError::UnknownType("stadium".to_string())
        );
        assert!(matches!(
            reg.validate_tag("stadium", &FieldMap::new()),
            Err(AppError::UnknownType(_))
        ));
    }

    #[test]
    fn common_fields_come_first_for_every_type() {
        let reg = registry();
        for page_type in PageType::ALL {
            let schema = reg.schema_for(page_type);
            let names: Vec<&str> = schema.field_names().take(6).collect();
            assert_eq!(
                names,
                ["name", "description", "location", "contactInfo", "website", "galleryImages"]
            );
            assert!(schema.fields()[6..].iter().all(|f| f.scope == FieldScope::Type));
            assert!(schema.type_fields().count() > 0, "{page_type} has no type fields");
        }
    }

    #[test]
    fn type_and_validator_failures_are_reported_per_field() {
        let reg = registry();
        let violations = reg
            .validate(
                PageType::Academy,
                &fields(json!({
                    "staffCount": "three",
                    "foundedYear": 1500,
                    "website": "ftp://example.org",
                    "name": "Northside Academy"
                })),
            )
            .unwrap_err();
        let mut named: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        named.sort();
        assert_eq!(named, ["foundedYear", "staffCount", "website"]);
    }

    #[test]
    fn enum_fields_only_accept_declared_values() {
        let reg = registry();
        assert!(reg
            .validate_field(PageType::Player, "preferredFoot", &json!("left"))
            .is_ok());
        assert!(reg
            .validate_field(PageType::Player, "preferredFoot", &json!("middle"))
            .is_err());
    }

    #[test]
    fn name_cannot_be_cleared_but_optional_fields_can() {
        let reg = registry();
        assert!(reg.validate_field(PageType::Club, "name", &json!(null)).is_err());
        assert!(reg.validate_field(PageType::Club, "description", &json!(null)).is_ok());
    }

    #[test]
    fn complete_validation_requires_name_and_defaults_fill_the_rest() {
        let reg = registry();
        let violations = reg
            .validate_complete(PageType::Venue, &fields(json!({"capacity": 100})))
            .unwrap_err();
        assert_eq!(violations[0].field, "name");

        let mut map = fields(json!({"name": "Riverside Ground"}));
        assert!(reg.validate_complete(PageType::Venue, &map).is_ok());
        reg.apply_defaults(PageType::Venue, &mut map);
        assert_eq!(map["floodlights"], json!(false));
        assert_eq!(map["galleryImages"], json!([]));
        assert!(reg.validate(PageType::Venue, &map).is_ok());
    }
}
