use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ContactField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("section id must not be empty")]
    EmptyId,
    #[error("duplicate section id: {0}")]
    Duplicate(String),
}

/// Local form rejection. Never reaches the send capability.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "field", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(ContactField),
    #[error("email address is malformed")]
    InvalidEmail,
}

impl ValidationError {
    pub fn field(&self) -> ContactField {
        match self {
            Self::MissingField(field) => *field,
            Self::InvalidEmail => ContactField::Email,
        }
    }
}
