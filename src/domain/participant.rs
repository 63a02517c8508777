use crate::error::{Result, SantaError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque participant identifier, unique within a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member of a gift exchange.
///
/// Names and emails are compared case-insensitively when checking uniqueness
/// inside a game, but stored as entered (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub email: Option<String>,
    /// Access token handed to this participant. Compared as an opaque string.
    pub token: String,
    pub wish: Option<String>,
    pub has_confirmed_assignment: bool,
    pub has_pending_reassignment_request: bool,
}

impl Participant {
    /// Creates a participant after normalizing and validating name and email.
    pub fn new(
        id: ParticipantId,
        name: &str,
        email: Option<&str>,
        token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id,
            name: normalize_name(name)?,
            email: normalize_email(email)?,
            token: token.into(),
            wish: None,
            has_confirmed_assignment: false,
            has_pending_reassignment_request: false,
        })
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|own| own.to_lowercase() == email.trim().to_lowercase())
    }
}

pub(crate) fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SantaError::ValidationError(
            "Participant name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Blank emails are treated as absent.
pub(crate) fn normalize_email(email: Option<&str>) -> Result<Option<String>> {
    match email.map(str::trim) {
        None | Some("") => Ok(None),
        Some(email) if email.contains('@') => Ok(Some(email.to_string())),
        Some(email) => Err(SantaError::ValidationError(format!(
            "Invalid email address '{}'",
            email
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_new_trims_input() {
        let p = Participant::new("1".into(), "  Alice ", Some(" alice@example.com "), "t").unwrap();
        assert_eq!(p.name, "Alice");
        assert_eq!(p.email.as_deref(), Some("alice@example.com"));
        assert!(!p.has_confirmed_assignment);
        assert!(!p.has_pending_reassignment_request);
    }

    #[test]
    fn test_participant_validation() {
        assert!(matches!(
            Participant::new("1".into(), "   ", None, "t"),
            Err(SantaError::ValidationError(_))
        ));
        assert!(matches!(
            Participant::new("1".into(), "Alice", Some("not-an-email"), "t"),
            Err(SantaError::ValidationError(_))
        ));
        let p = Participant::new("1".into(), "Alice", Some("  "), "t").unwrap();
        assert_eq!(p.email, None);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let p = Participant::new("1".into(), "Alice", Some("Alice@Example.com"), "t").unwrap();
        assert!(p.has_name("ALICE"));
        assert!(p.has_name(" alice "));
        assert!(!p.has_name("Bob"));
        assert!(p.has_email("alice@example.COM"));

        let no_email = Participant::new("2".into(), "Bob", None, "t").unwrap();
        assert!(!no_email.has_email("bob@example.com"));
    }

    #[test]
    fn test_participant_id_serializes_transparently() {
        let id = ParticipantId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
