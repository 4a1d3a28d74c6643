// Page entity - polymorphic root keyed by its type tag

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::{PageId, PageType};
use crate::ent_schema::{FieldMap, SchemaRegistry};
use crate::error::{AppError, AppResult};

/// Profile exactly as the remote service returns it: `{id, type, ...fields}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProfile {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(flatten)]
    pub fields: FieldMap,
}

/// Payload for creating a new page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDraft {
    #[serde(rename = "type")]
    pub page_type: PageType,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl PageDraft {
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            fields: FieldMap::new(),
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// A page with schema-checked values for every field its type defines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub fields: FieldMap,
}

impl Page {
    /// Decode a remote profile. Fields outside the type's schema, or failing
    /// its checks, are dropped and replaced by defaults.
    pub fn from_profile(id: PageId, profile: RemoteProfile, registry: &SchemaRegistry) -> AppResult<Self> {
        let page_type: PageType = profile.page_type.parse()?;
        let schema = registry.schema_for(page_type);

        let mut fields = FieldMap::new();
        for (name, value) in profile.fields {
            match schema.field(&name) {
                None => {
                    warn!(page_id = %id, field = %name, "dropping field not defined for {} pages", page_type);
                }
                Some(def) => match def.check(&value) {
                    Ok(()) => {
                        fields.insert(name, value);
                    }
                    Err(violation) => {
                        warn!(page_id = %id, "dropping invalid remote value: {}", violation);
                    }
                },
            }
        }
        registry.apply_defaults(page_type, &mut fields);

        Ok(Self {
            id,
            page_type,
            fields,
        })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn name(&self) -> &str {
        self.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    /// Typed view of the fields every page carries
    pub fn common(&self) -> CommonFields {
        let object: serde_json::Map<String, Value> = CommonFields::FIELDS
            .iter()
            .filter_map(|name| self.fields.get(*name).map(|v| (name.to_string(), v.clone())))
            .collect();
        serde_json::from_value(Value::Object(object)).unwrap_or_default()
    }

    /// Typed view of the type-specific fields; consumers branch on the tag
    pub fn details(&self, registry: &SchemaRegistry) -> AppResult<PageDetails> {
        let object: serde_json::Map<String, Value> = registry
            .schema_for(self.page_type)
            .type_fields()
            .filter_map(|def| self.fields.get(&def.name).map(|v| (def.name.clone(), v.clone())))
            .collect();
        let value = Value::Object(object);

        let details = match self.page_type {
            PageType::Academy => PageDetails::Academy(serde_json::from_value(value)?),
            PageType::Venue => PageDetails::Venue(serde_json::from_value(value)?),
            PageType::Community => PageDetails::Community(serde_json::from_value(value)?),
            PageType::Club => PageDetails::Club(serde_json::from_value(value)?),
            PageType::Pitch => PageDetails::Pitch(serde_json::from_value(value)?),
            PageType::Player => PageDetails::Player(serde_json::from_value(value)?),
            PageType::Coach => PageDetails::Coach(serde_json::from_value(value)?),
        };
        Ok(details)
    }

    pub(crate) fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Check the invariant that every value validates against the type schema
    pub fn validate(&self, registry: &SchemaRegistry) -> AppResult<()> {
        registry
            .validate(self.page_type, &self.fields)
            .map_err(AppError::Validation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonFields {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub website: Option<String>,
    pub gallery_images: Vec<String>,
}

impl CommonFields {
    pub const FIELDS: [&'static str; 6] = [
        "name",
        "description",
        "location",
        "contactInfo",
        "website",
        "galleryImages",
    ];
}

/// Type-specific shape of a page, one variant per tag
#[derive(Debug, Clone, PartialEq)]
pub enum PageDetails {
    Academy(AcademyDetails),
    Venue(VenueDetails),
    Community(CommunityDetails),
    Club(ClubDetails),
    Pitch(PitchDetails),
    Player(PlayerDetails),
    Coach(CoachDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademyDetails {
    pub staff_count: i64,
    pub programs_offered: Vec<String>,
    pub age_groups: Vec<String>,
    pub founded_year: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueDetails {
    pub capacity: i64,
    pub ground_dimensions: Option<String>,
    pub floodlights: bool,
    pub surface_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunityDetails {
    pub member_count: i64,
    pub rules: Vec<String>,
    pub visibility: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClubDetails {
    pub founded_year: Option<i64>,
    pub league: Option<String>,
    pub home_ground: Option<String>,
    pub squad_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PitchDetails {
    pub surface_type: Option<String>,
    pub pitch_size: Option<String>,
    pub hourly_rate: Option<f64>,
    pub floodlights: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDetails {
    pub position: Option<String>,
    pub date_of_birth: Option<String>,
    pub preferred_foot: Option<String>,
    pub height_cm: Option<i64>,
    pub current_club: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoachDetails {
    pub license_level: Option<String>,
    pub specialization: Option<String>,
    pub years_experience: Option<i64>,
}
