//! Declarative attribute schemas and the validation table.
//!
//! Validation runs before any network call and collects every problem
//! instead of stopping at the first.

use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use serde_json::{Map, Value};

/// Attributes every resource accepts without declaring them.
const RESERVED: &[&str] = &["id", "timeouts"];

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Int,
    Bool,
    List(Box<FieldType>),
    Set(Box<FieldType>),
    Block(Schema),
}

impl FieldType {
    pub fn list_of(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    pub fn set_of(inner: FieldType) -> Self {
        FieldType::Set(Box::new(inner))
    }

    fn type_name(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::List(inner) => format!("list({})", inner.type_name()),
            FieldType::Set(inner) => format!("set({})", inner.type_name()),
            FieldType::Block(_) => "block".to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Compiled `Validator::Regex` patterns, keyed by pattern text.
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> = LazyLock::new(Default::default);

fn compiled(pattern: &'static str) -> Result<Regex, regex::Error> {
    let mut patterns = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = patterns.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    patterns.insert(pattern, re.clone());
    Ok(re)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    Regex {
        pattern: &'static str,
        message: &'static str,
    },
    Length {
        min: usize,
        max: usize,
    },
    Range {
        min: i64,
        max: i64,
    },
    OneOf(&'static [&'static str]),
    Cidr,
}

impl Validator {
    pub fn regex(pattern: &'static str, message: &'static str) -> Self {
        Validator::Regex { pattern, message }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (Validator::Regex { pattern, message }, Value::String(s)) => {
                let re = compiled(pattern).map_err(|e| format!("invalid pattern: {}", e))?;
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(message.to_string())
                }
            }
            (Validator::Length { min, max }, Value::String(s)) => {
                let len = s.chars().count();
                if (*min..=*max).contains(&len) {
                    Ok(())
                } else {
                    Err(format!("length must be between {} and {}, got {}", min, max, len))
                }
            }
            (Validator::Range { min, max }, Value::Number(n)) => match n.as_i64() {
                Some(v) if (*min..=*max).contains(&v) => Ok(()),
                _ => Err(format!("must be between {} and {}, got {}", min, max, n)),
            },
            (Validator::OneOf(allowed), Value::String(s)) => {
                if allowed.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(format!("must be one of [{}], got {}", allowed.join(", "), s))
                }
            }
            (Validator::Cidr, Value::String(s)) => {
                if s.contains('/') && s.parse::<ipnetwork::Ipv4Network>().is_ok() {
                    Ok(())
                } else {
                    Err(format!("must be a valid IPv4 CIDR block, got {}", s))
                }
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Set by the provider only.
    Computed,
    /// Optional; filled in by the provider when omitted.
    OptionalComputed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub presence: Presence,
    pub force_new: bool,
    pub sensitive: bool,
    pub max_items: Option<usize>,
    pub validators: Vec<Validator>,
    pub description: &'static str,
}

impl Field {
    fn new(name: &'static str, ty: FieldType, presence: Presence) -> Self {
        Self {
            name,
            ty,
            presence,
            force_new: false,
            sensitive: false,
            max_items: None,
            validators: Vec::new(),
            description: "",
        }
    }

    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, ty, Presence::Required)
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, ty, Presence::Optional)
    }

    pub fn computed(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, ty, Presence::Computed)
    }

    pub fn optional_computed(name: &'static str, ty: FieldType) -> Self {
        Self::new(name, ty, Presence::OptionalComputed)
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn is_computed_only(&self) -> bool {
        self.presence == Presence::Computed
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of force-new fields.
    pub fn force_new_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.force_new).map(|f| f.name)
    }

    /// Validates user configuration against the schema.
    pub fn validate(&self, config: &Map<String, Value>) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        self.validate_into("", config, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    fn validate_into(&self, prefix: &str, config: &Map<String, Value>, errors: &mut Vec<FieldError>) {
        for key in config.keys() {
            if prefix.is_empty() && RESERVED.contains(&key.as_str()) {
                continue;
            }
            if self.field(key).is_none() {
                errors.push(FieldError::new(prefix, key, "unsupported argument"));
            }
        }

        for field in &self.fields {
            let value = config.get(field.name).filter(|v| !v.is_null());
            match (value, field.presence) {
                (None, Presence::Required) => {
                    errors.push(FieldError::new(prefix, field.name, "required argument missing"));
                }
                (Some(_), Presence::Computed) => {
                    errors.push(FieldError::new(
                        prefix,
                        field.name,
                        "computed attribute cannot be set",
                    ));
                }
                (Some(value), _) => {
                    let path = join_path(prefix, field.name);
                    check_value(&path, field, &field.ty, value, errors);
                }
                (None, _) => {}
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn check_value(path: &str, field: &Field, ty: &FieldType, value: &Value, errors: &mut Vec<FieldError>) {
    let type_ok = match (ty, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Int, Value::Number(n)) => n.is_i64(),
        (FieldType::Bool, Value::Bool(_)) => true,
        (FieldType::List(inner) | FieldType::Set(inner), Value::Array(items)) => {
            if let Some(max) = field.max_items
                && items.len() > max
            {
                errors.push(FieldError::at(
                    path,
                    format!("at most {} items allowed, got {}", max, items.len()),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                check_item(&item_path, field, inner, item, errors);
            }
            return;
        }
        (FieldType::Block(schema), Value::Object(map)) => {
            schema.validate_into(path, map, errors);
            return;
        }
        _ => false,
    };

    if !type_ok {
        errors.push(FieldError::at(path, format!("expected {}", ty)));
        return;
    }

    for validator in &field.validators {
        if let Err(message) = validator.check(value) {
            errors.push(FieldError::at(path, message));
        }
    }
}

fn check_item(path: &str, field: &Field, ty: &FieldType, value: &Value, errors: &mut Vec<FieldError>) {
    match (ty, value) {
        (FieldType::Block(schema), Value::Object(map)) => schema.validate_into(path, map, errors),
        _ => check_value(path, field, ty, value, errors),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    fn new(prefix: &str, name: &str, message: &str) -> Self {
        Self {
            path: join_path(prefix, name),
            message: message.to_string(),
        }
    }

    fn at(path: &str, message: String) -> Self {
        Self {
            path: path.to_string(),
            message,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Name rule shared by most resources: lowercase start, then lowercase,
/// digits or hyphens, no trailing hyphen.
pub fn name_validators() -> Vec<Validator> {
    vec![
        Validator::Length { min: 3, max: 30 },
        Validator::regex(
            r"^[a-z]+[a-z0-9-]*[a-z0-9]$",
            "must start with a lowercase letter and contain only lowercase letters, digits and hyphens",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        let mut name = Field::optional("name", FieldType::String);
        name.validators = name_validators();
        Schema::new(vec![
            name,
            Field::required("cidr", FieldType::String).validate(Validator::Cidr),
            Field::optional("idle_timeout", FieldType::Int)
                .validate(Validator::Range { min: 1, max: 3600 }),
            Field::optional("type", FieldType::String)
                .validate(Validator::OneOf(&["PUBLIC", "PRIVATE"])),
            Field::optional("subnets", FieldType::list_of(FieldType::String)).max_items(2),
            Field::optional(
                "node",
                FieldType::list_of(FieldType::Block(Schema::new(vec![Field::required(
                    "product",
                    FieldType::String,
                )]))),
            )
            .max_items(1),
            Field::computed("vpc_no", FieldType::String),
        ])
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_regex_compiled_once_per_pattern() {
        const PATTERN: &str = r"^cached-[a-z]+$";
        let validator = Validator::regex(PATTERN, "must look cached");

        assert!(validator.check(&json!("cached-one")).is_ok());
        let first = PATTERNS.lock().unwrap().get(PATTERN).cloned().unwrap();
        assert!(validator.check(&json!("Cached")).is_err());
        let second = PATTERNS.lock().unwrap().get(PATTERN).cloned().unwrap();

        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(
            PATTERNS.lock().unwrap().keys().filter(|k| **k == PATTERN).count(),
            1
        );
    }

    fn paths(result: Result<(), ValidationErrors>) -> Vec<String> {
        result.unwrap_err().0.into_iter().map(|e| e.path).collect()
    }

    #[test]
    fn test_valid_config() {
        let config = obj(json!({
            "name": "my-vpc",
            "cidr": "10.0.0.0/16",
            "idle_timeout": 60,
            "type": "PUBLIC",
            "subnets": ["1", "2"],
            "node": [{"product": "SVR"}],
            "id": "ignored",
            "timeouts": {"create": "30m"}
        }));
        assert!(schema().validate(&config).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let result = schema().validate(&obj(json!({})));
        assert_eq!(paths(result), vec!["cidr"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let result = schema().validate(&obj(json!({"cidr": null})));
        assert_eq!(paths(result), vec!["cidr"]);
    }

    #[test]
    fn test_collects_all_errors() {
        let config = obj(json!({
            "name": "Bad_Name",
            "cidr": "10.0.0.0/33",
            "idle_timeout": 0,
            "type": "INTERNAL",
            "unknown": true,
            "vpc_no": "1"
        }));
        let errors = schema().validate(&config).unwrap_err();
        let paths: Vec<&str> = errors.errors().iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"unknown"));
        assert!(paths.contains(&"name"));
        assert!(paths.contains(&"cidr"));
        assert!(paths.contains(&"idle_timeout"));
        assert!(paths.contains(&"type"));
        assert!(paths.contains(&"vpc_no"));
    }

    #[test]
    fn test_type_mismatch() {
        let config = obj(json!({"cidr": "10.0.0.0/16", "idle_timeout": "60"}));
        let errors = schema().validate(&config).unwrap_err();
        assert_eq!(errors.to_string(), "idle_timeout: expected int");
    }

    #[test]
    fn test_max_items() {
        let config = obj(json!({"cidr": "10.0.0.0/16", "subnets": ["1", "2", "3"]}));
        let errors = schema().validate(&config).unwrap_err();
        assert_eq!(errors.to_string(), "subnets: at most 2 items allowed, got 3");
    }

    #[test]
    fn test_nested_block_errors_have_paths() {
        let config = obj(json!({"cidr": "10.0.0.0/16", "node": [{"extra": 1}]}));
        let result = schema().validate(&config);
        let mut found = paths(result);
        found.sort();
        assert_eq!(found, vec!["node.0.extra", "node.0.product"]);
    }

    #[test]
    fn test_name_validators() {
        let validators = name_validators();
        let ok = |s: &str| validators.iter().all(|v| v.check(&json!(s)).is_ok());
        assert!(ok("abc"));
        assert!(ok("my-vpc-01"));
        assert!(!ok("ab"));
        assert!(!ok("1abc"));
        assert!(!ok("abc-"));
        assert!(!ok("ABC"));
    }

    #[test]
    fn test_force_new_fields() {
        let schema = Schema::new(vec![
            Field::required("a", FieldType::String).force_new(),
            Field::optional("b", FieldType::String),
        ]);
        assert_eq!(schema.force_new_fields().collect::<Vec<_>>(), vec!["a"]);
    }
}
