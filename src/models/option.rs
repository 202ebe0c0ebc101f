use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ListParams, RecordStatus, validation};
use crate::error::AppError;

/// ProductOption
///
/// A selectable product dimension such as "Size" with values `["S", "M", "L"]`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct ProductOption {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub values: Vec<String>,
    #[sqlx(try_from = "String")]
    pub status: RecordStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl ProductOption {
    pub const SORTABLE: &'static [&'static str] = &["created_at", "updated_at", "name"];
}

const MAX_VALUES: usize = 50;

fn validate_values(values: &[String]) -> Result<(), AppError> {
    if values.is_empty() || values.len() > MAX_VALUES {
        return Err(AppError::Validation(format!(
            "values must contain between 1 and {MAX_VALUES} entries"
        )));
    }
    for value in values {
        validation::require_length("values", value, 1, 40)?;
    }
    let mut seen = std::collections::HashSet::new();
    if !values.iter().all(|v| seen.insert(v.trim().to_lowercase())) {
        return Err(AppError::Validation("values must be unique".to_string()));
    }
    Ok(())
}

/// Trims each value; the dashboard sends them straight from tag inputs.
pub fn normalize_values(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateOptionRequest {
    pub name: String,
    pub display_name: String,
    pub values: Vec<String>,
}

impl CreateOptionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("name", &self.name, 2, 50)?;
        validation::require_length("display_name", &self.display_name, 2, 50)?;
        validate_values(&self.values)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateOptionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl UpdateOptionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validation::require_length("name", name, 2, 50)?;
        }
        if let Some(display_name) = &self.display_name {
            validation::require_length("display_name", display_name, 2, 50)?;
        }
        if let Some(values) = &self.values {
            validate_values(values)?;
        }
        Ok(())
    }

    pub fn apply(self, option: &mut ProductOption) {
        if let Some(name) = self.name {
            option.name = name.trim().to_string();
        }
        if let Some(display_name) = self.display_name {
            option.display_name = display_name.trim().to_string();
        }
        if let Some(values) = self.values {
            option.values = normalize_values(values);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptionFilter {
    pub list: ListParams,
    pub status: Option<RecordStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_values_are_rejected_case_insensitively() {
        let req = CreateOptionRequest {
            name: "size".into(),
            display_name: "Size".into(),
            values: vec!["M".into(), " m ".into()],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_values_are_rejected() {
        let req = CreateOptionRequest {
            name: "size".into(),
            display_name: "Size".into(),
            values: vec![],
        };
        assert!(req.validate().is_err());
    }
}
