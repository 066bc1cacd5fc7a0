//! Immutable, hash-linked append-only audit log (§4.9).
//!
//! ```text
//! NewAuditEntry ─► AuditChain::append ─► AuditLogEntry { hash, previous_hash }
//!                                              │
//!                                              └─► verify_chain ─► VerificationReport
//! ```

pub mod chain;
pub mod entry;
pub mod error;
pub mod sqlite;

pub mod prelude {
    pub use crate::chain::{verify_chain, AuditChain, InMemoryAuditChain, VerificationReport};
    pub use crate::entry::{AuditLogEntry, NewAuditEntry, Severity};
    pub use crate::error::AuditError;
    pub use crate::sqlite::SqliteAuditChain;
}
