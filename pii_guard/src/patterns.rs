//! Static regex catalog for the built-in and enterprise entity layers.
//!
//! Mirrors the `pat!`-macro catalog style used elsewhere in this codebase
//! for compile-time pattern tables, specialized here to PII entity
//! detection rather than prompt-injection heuristics.

use std::borrow::Cow;

use crate::entities::EntityType;

/// A built-in PII detection pattern.
#[derive(Debug, Clone)]
pub struct PiiPattern {
    /// Unique identifier (e.g. `"EMAIL-001"`).
    pub id: Cow<'static, str>,
    /// Entity this pattern recognizes.
    pub entity_type: EntityType,
    /// Human-readable description.
    pub description: Cow<'static, str>,
    /// Raw regex source.
    pub regex_str: Cow<'static, str>,
    /// Detector confidence assigned to a match from this pattern.
    pub confidence: f32,
}

macro_rules! pat {
    ($id:expr, $entity:expr, $desc:expr, $re:expr, $conf:expr) => {
        PiiPattern {
            id: Cow::Borrowed($id),
            entity_type: $entity,
            description: Cow::Borrowed($desc),
            regex_str: Cow::Borrowed($re),
            confidence: $conf,
        }
    };
}

/// Returns the full built-in entity catalog (§4.3): the generic layer plus
/// the enterprise layer (employee id, ticket id, server name, db name).
#[must_use]
pub fn builtin_patterns() -> Vec<PiiPattern> {
    use EntityType::{
        ApiKey, CloudAccessKey, CreditCard, DbName, EmployeeId, Ipv4, Phone, PrivateKeyPem,
        ServerName, SocialSecurityNumber, TicketId, Url, Uuid, WindowsPath,
    };

    vec![
        // ── Generic layer ───────────────────────────────────────────
        pat!(
            "EMAIL-001",
            EntityType::Email,
            "Email address",
            r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}",
            0.95
        ),
        pat!(
            "PHONE-001",
            Phone,
            "Phone number (NANP-style)",
            r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
            0.75
        ),
        pat!(
            "SSN-001",
            SocialSecurityNumber,
            "Social-security-like number",
            r"\b\d{3}-\d{2}-\d{4}\b",
            0.9
        ),
        pat!(
            "CC-001",
            CreditCard,
            "Credit-card-like number",
            r"\b(?:\d[ -]*?){13,16}\b",
            0.7
        ),
        pat!("IPV4-001", Ipv4, "IPv4 address", r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b", 0.85),
        pat!(
            "APIKEY-001",
            ApiKey,
            "Generic API key (32+ alnum)",
            r"\b[A-Za-z0-9_\-]{32,}\b",
            0.55
        ),
        pat!(
            "UUID-001",
            Uuid,
            "UUID",
            r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b",
            0.9
        ),
        pat!(
            "URL-001",
            Url,
            "URL",
            r"(?i)\bhttps?://[^\s<>\x22]+",
            0.9
        ),
        pat!(
            "WINPATH-001",
            WindowsPath,
            "Windows filesystem path",
            r"[A-Za-z]:\\(?:[^\\/:*?\x22<>|\r\n]+\\)*[^\\/:*?\x22<>|\r\n]*",
            0.7
        ),
        pat!(
            "CLOUDKEY-001",
            CloudAccessKey,
            "AWS-style access key id",
            r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b",
            0.97
        ),
        pat!(
            "PEM-001",
            PrivateKeyPem,
            "PEM private key header",
            r"-----BEGIN (?:RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----",
            0.99
        ),
        // ── Enterprise layer ─────────────────────────────────────────
        pat!(
            "ENT-EMP-001",
            EmployeeId,
            "Employee id",
            r"\bEMP\d+\b",
            0.9
        ),
        pat!(
            "ENT-TICKET-001",
            TicketId,
            "Ticket id",
            r"\b[A-Z]{2,5}-\d+\b",
            0.85
        ),
        pat!(
            "ENT-SERVER-001",
            ServerName,
            "Server name",
            r"\b[a-z]+-[a-z]+-\d{2,3}\b",
            0.6
        ),
        pat!(
            "ENT-DB-001",
            DbName,
            "Database name",
            r"\b[a-z]+_db_[a-z0-9]+\b",
            0.7
        ),
    ]
}
