//! Entity taxonomy for the built-in and enterprise pattern catalogs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a detected entity.
///
/// `Custom` carries the caller-supplied name for runtime-registered
/// patterns; every other variant corresponds to a built-in catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Email,
    Phone,
    SocialSecurityNumber,
    CreditCard,
    Ipv4,
    ApiKey,
    Uuid,
    Url,
    WindowsPath,
    CloudAccessKey,
    PrivateKeyPem,
    EmployeeId,
    TicketId,
    ServerName,
    DbName,
    Person,
    Location,
    Date,
    Custom(String),
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "EMAIL"),
            Self::Phone => write!(f, "PHONE"),
            Self::SocialSecurityNumber => write!(f, "SSN"),
            Self::CreditCard => write!(f, "CREDIT_CARD"),
            Self::Ipv4 => write!(f, "IPV4"),
            Self::ApiKey => write!(f, "API_KEY"),
            Self::Uuid => write!(f, "UUID"),
            Self::Url => write!(f, "URL"),
            Self::WindowsPath => write!(f, "WINDOWS_PATH"),
            Self::CloudAccessKey => write!(f, "CLOUD_ACCESS_KEY"),
            Self::PrivateKeyPem => write!(f, "PRIVATE_KEY"),
            Self::EmployeeId => write!(f, "EMPLOYEE_ID"),
            Self::TicketId => write!(f, "TICKET_ID"),
            Self::ServerName => write!(f, "SERVER_NAME"),
            Self::DbName => write!(f, "DB_NAME"),
            Self::Person => write!(f, "PERSON"),
            Self::Location => write!(f, "LOCATION"),
            Self::Date => write!(f, "DATE"),
            Self::Custom(name) => write!(f, "{}", name.to_uppercase()),
        }
    }
}

/// A single detected entity occurrence within a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMatch {
    /// Type of entity detected.
    pub entity_type: EntityType,
    /// Byte offset of the match start within the source text.
    pub start: usize,
    /// Byte offset of the match end (exclusive).
    pub end: usize,
    /// Detector confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// The matched substring, captured at detection time.
    pub span: String,
}

impl EntityMatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
