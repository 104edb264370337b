use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Group names are 1-128 printable characters: letters, marks, symbols,
/// numbers and punctuation. Whitespace and control characters are rejected.
pub fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > 128 {
        return Err(ValidationError::new("group_name_length"));
    }
    if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::new("group_name_characters"));
    }
    Ok(())
}

pub fn validate_group_names(names: &[String]) -> Result<(), ValidationError> {
    names.iter().try_for_each(|name| validate_group_name(name))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(custom(function = "validate_group_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateGroupRequest {
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMembershipRequest {
    #[validate(custom(function = "validate_group_names"))]
    pub groups: Vec<String>,
}
