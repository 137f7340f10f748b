//! `filter` blocks shared by list data sources.

use regex::Regex;
use serde_json::{Map, Value};

use super::schema::{Field, FieldType, Schema};
use crate::error::ProviderError;

pub fn filter_field() -> Field {
    Field::optional(
        "filter",
        FieldType::set_of(FieldType::Block(Schema::new(vec![
            Field::required("name", FieldType::String),
            Field::required("values", FieldType::list_of(FieldType::String)),
            Field::optional("regex", FieldType::Bool),
        ]))),
    )
    .describe("Keeps items whose attribute matches one of the values")
}

#[derive(Debug)]
struct Filter {
    name: String,
    values: Vec<String>,
    patterns: Option<Vec<Regex>>,
}

impl Filter {
    fn parse(block: &Map<String, Value>) -> Result<Self, ProviderError> {
        let name = block
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::MissingAttribute("filter.name".to_string()))?
            .to_string();
        let values: Vec<String> = block
            .get("values")
            .and_then(|v| v.as_array())
            .map(|vs| {
                vs.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let regex = block.get("regex").and_then(|v| v.as_bool()).unwrap_or(false);

        let patterns = if regex {
            let compiled = values
                .iter()
                .map(|v| {
                    Regex::new(v).map_err(|e| {
                        ProviderError::Config(format!("invalid filter regex '{}': {}", v, e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(compiled)
        } else {
            None
        };

        Ok(Self {
            name,
            values,
            patterns,
        })
    }

    fn matches(&self, item: &Map<String, Value>) -> bool {
        let actual = match item.get(&self.name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => return false,
            Some(other) => other.to_string(),
        };
        match &self.patterns {
            Some(patterns) => patterns.iter().any(|re| re.is_match(&actual)),
            None => self.values.iter().any(|v| *v == actual),
        }
    }
}

/// Keeps the items that pass every filter block.
pub fn apply_filters(
    items: Vec<Map<String, Value>>,
    filters: &[Map<String, Value>],
) -> Result<Vec<Map<String, Value>>, ProviderError> {
    let filters = filters
        .iter()
        .map(Filter::parse)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items
        .into_iter()
        .filter(|item| filters.iter().all(|f| f.matches(item)))
        .collect())
}

/// Id of a list lookup that kept nothing.
pub const NO_MATCHES_ID: &str = "none";

/// Id of a list lookup: the kept values joined with `,`. Never empty, since
/// an empty id reads back as unset.
pub fn list_id<S: AsRef<str>>(values: &[S]) -> String {
    if values.is_empty() {
        return NO_MATCHES_ID.to_string();
    }
    values
        .iter()
        .map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}
