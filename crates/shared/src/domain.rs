use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Result<Self, RegistryError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// In-page anchor target, e.g. `#about`.
    pub fn anchor(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SectionId {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionId> for String {
    fn from(value: SectionId) -> Self {
        value.0
    }
}

/// Ordered, immutable list of navigable sections.
///
/// Order is document order and navigation order; the active-section scan
/// walks it front to back. Per-section state elsewhere is indexed by the
/// position returned from [`SectionRegistry::position`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRegistry {
    sections: Vec<SectionId>,
}

impl SectionRegistry {
    pub fn new<I, S>(ids: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sections = ids
            .into_iter()
            .map(SectionId::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_ids(sections)
    }

    pub fn from_ids(sections: Vec<SectionId>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(sections.len());
        for id in &sections {
            if !seen.insert(id.as_str()) {
                return Err(RegistryError::Duplicate(id.to_string()));
            }
        }
        Ok(Self { sections })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SectionId> {
        self.sections.get(index)
    }

    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|candidate| candidate == id)
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.position(id).is_some()
    }
}

/// Vertical extent of an element relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self {
            top,
            bottom: top + height.max(0.0),
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Inclusive on both edges, so adjacent sections can both match a line
    /// sitting exactly on their shared border.
    pub fn contains_line(&self, line: f64) -> bool {
        self.top <= line && self.bottom >= line
    }

    pub fn visible_fraction(&self, viewport_height: f64) -> f64 {
        let height = self.height();
        if height <= 0.0 || viewport_height <= 0.0 {
            return 0.0;
        }
        let visible = self.bottom.min(viewport_height) - self.top.max(0.0);
        (visible.max(0.0) / height).min(1.0)
    }
}

/// Placement of a section in document coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionExtent {
    pub id: SectionId,
    pub top: f64,
    pub height: f64,
}

impl SectionExtent {
    pub fn bounds_at(&self, scroll_y: f64) -> Bounds {
        Bounds::new(self.top - scroll_y, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Message,
}

impl fmt::Display for ContactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactFields {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        let slot = match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Message => &mut self.message,
        };
        *slot = value.into();
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
        self.message.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.message.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in [ContactField::Name, ContactField::Email, ContactField::Message] {
            if self.get(field).trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        if !validate_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }
}

/// Basic `local@domain.tld` shape check; deliverability is the relay's problem.
pub fn validate_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels = domain.split('.').collect::<Vec<_>>();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_rejects_duplicates_and_blank_ids() {
        assert_eq!(
            SectionRegistry::new(["about", "skills", "about"]),
            Err(RegistryError::Duplicate("about".to_string()))
        );
        assert_eq!(
            SectionRegistry::new(["about", "  "]),
            Err(RegistryError::EmptyId)
        );
    }

    #[test]
    fn registry_preserves_insertion_order() {
        let registry =
            SectionRegistry::new(["about", "skills", "projects", "experience", "contact"])
                .expect("registry");
        let ids = registry.iter().map(SectionId::as_str).collect::<Vec<_>>();
        assert_eq!(ids, ["about", "skills", "projects", "experience", "contact"]);
        let projects = SectionId::new("projects").expect("id");
        assert_eq!(registry.position(&projects), Some(2));
        assert_eq!(projects.anchor(), "#projects");
    }

    #[test]
    fn bounds_line_check_is_inclusive() {
        let bounds = Bounds::new(100.0, 400.0);
        assert!(bounds.contains_line(100.0));
        assert!(bounds.contains_line(500.0));
        assert!(!bounds.contains_line(500.5));
        assert!(!bounds.contains_line(99.0));
    }

    #[test]
    fn visible_fraction_clips_to_viewport() {
        let viewport_height = 800.0;
        assert_eq!(Bounds::new(0.0, 400.0).visible_fraction(viewport_height), 1.0);
        assert_eq!(Bounds::new(700.0, 400.0).visible_fraction(viewport_height), 0.25);
        assert_eq!(Bounds::new(-300.0, 400.0).visible_fraction(viewport_height), 0.25);
        assert_eq!(Bounds::new(900.0, 400.0).visible_fraction(viewport_height), 0.0);
        assert_eq!(Bounds::new(10.0, 0.0).visible_fraction(viewport_height), 0.0);
    }

    #[test]
    fn email_shape_check() {
        assert!(validate_email("ada@example.com"));
        assert!(validate_email("  ada.lovelace+site@mail.example.org "));
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("ada@example"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("ada@@example.com"));
        assert!(!validate_email("ada @example.com"));
        assert!(!validate_email("ada@example..com"));
    }

    #[test]
    fn validation_reports_first_missing_field() {
        let fields = ContactFields::new("Ada", "", "");
        assert_eq!(
            fields.validate(),
            Err(ValidationError::MissingField(ContactField::Email))
        );
        let fields = ContactFields::new("Ada", "not-an-email", "Hello");
        assert_eq!(fields.validate(), Err(ValidationError::InvalidEmail));
        let fields = ContactFields::new("Ada", "ada@example.com", "   ");
        assert_eq!(
            fields.validate().map_err(|err| err.field()),
            Err(ContactField::Message)
        );
        assert!(ContactFields::new("Ada", "ada@example.com", "Hello")
            .validate()
            .is_ok());
    }
}
