// Page Schema Framework - declarative field definitions and validation per page type
// Fields are declared with a builder, collected per type, and checked against JSON values

use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::core::PageType;
use crate::error::{AppError, AppResult, FieldViolation};

/// Field values of a page keyed by wire (camelCase) name
pub type FieldMap = BTreeMap<String, Value>;

/// Schema definition trait - one implementation per page type
pub trait PageSchema {
    /// Page type this schema defines
    fn page_type() -> PageType;

    /// Type-specific fields, in display order
    fn fields() -> Vec<FieldDefinition>;
}

/// Whether a field is shared by every page type or owned by one type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    Common,
    Type,
}

/// Field definition
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub scope: FieldScope,
    pub optional: bool,
    pub default: Option<FieldDefault>,
    pub validators: Vec<FieldValidator>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            scope: FieldScope::Type,
            optional: false,
            default: None,
            validators: Vec::new(),
        }
    }

    /// Mark field as shared by every page type
    pub fn common(mut self) -> Self {
        self.scope = FieldScope::Common;
        self
    }

    /// Mark field as optional (may be null or absent)
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Add default value
    pub fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Add field validator
    pub fn validate(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn default_json(&self) -> Option<Value> {
        self.default.as_ref().map(FieldDefault::to_json)
    }

    /// Check one value against this definition
    pub fn check(&self, value: &Value) -> Result<(), FieldViolation> {
        if value.is_null() {
            return if self.optional {
                Ok(())
            } else {
                Err(FieldViolation::new(&self.name, "is required"))
            };
        }

        self.field_type.check(&self.name, value)?;

        for validator in &self.validators {
            validator.check(&self.name, value)?;
        }
        Ok(())
    }
}

/// Field types supported by page schemas
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    StringList,
    Enum(Vec<String>),
}

impl FieldType {
    pub fn one_of(values: &[&str]) -> Self {
        FieldType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    fn check(&self, field: &str, value: &Value) -> Result<(), FieldViolation> {
        let ok = match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::StringList => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            FieldType::Enum(allowed) => {
                return match value.as_str() {
                    Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
                    _ => Err(FieldViolation::new(
                        field,
                        format!("must be one of {}", allowed.join(", ")),
                    )),
                };
            }
        };

        if ok {
            Ok(())
        } else {
            Err(FieldViolation::new(
                field,
                format!("expected {}", self.describe()),
            ))
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Int => "an integer",
            FieldType::Float => "a number",
            FieldType::Bool => "a boolean",
            FieldType::StringList => "a list of strings",
            FieldType::Enum(_) => "an enum value",
        }
    }
}

/// Field default values
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    EmptyList,
}

impl FieldDefault {
    pub fn to_json(&self) -> Value {
        match self {
            FieldDefault::String(s) => Value::String(s.clone()),
            FieldDefault::Int(i) => Value::from(*i),
            FieldDefault::Float(f) => Value::from(*f),
            FieldDefault::Bool(b) => Value::Bool(*b),
            FieldDefault::EmptyList => Value::Array(Vec::new()),
        }
    }
}

/// Field validators
#[derive(Debug, Clone)]
pub enum FieldValidator {
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    Range(f64, f64),
}

impl FieldValidator {
    /// Build a pattern validator from a static, known-good expression
    pub fn pattern(expr: &str) -> Self {
        match Regex::new(expr) {
            Ok(re) => FieldValidator::Pattern(re),
            // Static patterns are covered by the registry tests
            Err(e) => panic!("invalid schema pattern {expr}: {e}"),
        }
    }

    fn check(&self, field: &str, value: &Value) -> Result<(), FieldViolation> {
        match self {
            FieldValidator::MinLength(min) => match length_of(value) {
                Some(len) if len < *min => Err(FieldViolation::new(
                    field,
                    format!("must have at least {} characters or items", min),
                )),
                _ => Ok(()),
            },
            FieldValidator::MaxLength(max) => match length_of(value) {
                Some(len) if len > *max => Err(FieldViolation::new(
                    field,
                    format!("must have at most {} characters or items", max),
                )),
                _ => Ok(()),
            },
            FieldValidator::Pattern(re) => {
                let texts: Vec<&str> = match value {
                    Value::String(s) => vec![s.as_str()],
                    Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                    _ => Vec::new(),
                };
                match texts.into_iter().find(|t| !re.is_match(t)) {
                    Some(bad) => Err(FieldViolation::new(
                        field,
                        format!("'{}' does not match the expected format", bad),
                    )),
                    None => Ok(()),
                }
            }
            FieldValidator::Range(min, max) => match value.as_f64() {
                Some(n) if n < *min || n > *max => Err(FieldViolation::new(
                    field,
                    format!("must be between {} and {}", min, max),
                )),
                _ => Ok(()),
            },
        }
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Ordered field list for one page type: common fields first, then type fields
#[derive(Debug, Clone)]
pub struct FieldSchema {
    page_type: PageType,
    fields: Vec<FieldDefinition>,
}

impl FieldSchema {
    pub fn new(page_type: PageType, common: Vec<FieldDefinition>, specific: Vec<FieldDefinition>) -> Self {
        let fields = common
            .into_iter()
            .map(FieldDefinition::common)
            .chain(specific.into_iter().map(|mut f| {
                f.scope = FieldScope::Type;
                f
            }))
            .collect();
        Self { page_type, fields }
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn defines(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn type_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.scope == FieldScope::Type)
    }
}

/// Schema registry - immutable table from page type to field schema
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<PageType, FieldSchema>,
}

impl SchemaRegistry {
    pub fn new(common: Vec<FieldDefinition>) -> Self {
        Self {
            schemas: HashMap::new(),
        }
        .with_common(common)
    }

    fn with_common(mut self, common: Vec<FieldDefinition>) -> Self {
        // Seed every type with the shared fields so no tag is ever missing
        for page_type in PageType::ALL {
            self.schemas
                .insert(page_type, FieldSchema::new(page_type, common.clone(), Vec::new()));
        }
        self
    }

    /// Register the type-specific fields of a schema
    pub fn register<S: PageSchema>(&mut self) {
        let page_type = S::page_type();
        if let Some(schema) = self.schemas.get_mut(&page_type) {
            schema.fields.extend(S::fields().into_iter().map(|mut f| {
                f.scope = FieldScope::Type;
                f
            }));
        }
    }

    /// Ordered field list, defaults and validators for a type
    pub fn schema_for(&self, page_type: PageType) -> &FieldSchema {
        // Every PageType is inserted by `with_common`
        &self.schemas[&page_type]
    }

    /// Look a schema up by raw tag; unknown tags are fatal
    pub fn schema_for_tag(&self, tag: &str) -> AppResult<&FieldSchema> {
        let page_type: PageType = tag.parse()?;
        Ok(self.schema_for(page_type))
    }

    /// Validate a (partial) field map. Absent fields are not violations.
    pub fn validate(&self, page_type: PageType, fields: &FieldMap) -> Result<(), Vec<FieldViolation>> {
        let schema = self.schema_for(page_type);
        let violations: Vec<FieldViolation> = fields
            .iter()
            .filter_map(|(name, value)| match schema.field(name) {
                None => Some(FieldViolation::new(
                    name,
                    format!("is not defined for {} pages", page_type),
                )),
                Some(def) => def.check(value).err(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Validate a raw tag plus fields; unknown tags surface as `UnknownType`
    pub fn validate_tag(&self, tag: &str, fields: &FieldMap) -> AppResult<()> {
        let page_type: PageType = tag.parse()?;
        self.validate(page_type, fields).map_err(AppError::Validation)
    }

    /// Validate a single field edit
    pub fn validate_field(&self, page_type: PageType, name: &str, value: &Value) -> AppResult<()> {
        let schema = self.schema_for(page_type);
        match schema.field(name) {
            None => Err(AppError::validation(
                name,
                format!("is not defined for {} pages", page_type),
            )),
            Some(def) => def
                .check(value)
                .map_err(|violation| AppError::Validation(vec![violation])),
        }
    }

    /// Validate a full field map for creation: required fields must be present
    pub fn validate_complete(&self, page_type: PageType, fields: &FieldMap) -> Result<(), Vec<FieldViolation>> {
        let mut violations = self.validate(page_type, fields).err().unwrap_or_default();
        for def in self.schema_for(page_type).fields() {
            if !def.optional && def.default.is_none() && !fields.contains_key(&def.name) {
                violations.push(FieldViolation::new(&def.name, "is required"));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Fill absent fields that declare a default
    pub fn apply_defaults(&self, page_type: PageType, fields: &mut FieldMap) {
        for def in self.schema_for(page_type).fields() {
            if !fields.contains_key(&def.name) {
                if let Some(default) = def.default_json() {
                    fields.insert(def.name.clone(), default);
                }
            }
        }
    }
}
