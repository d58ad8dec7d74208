//! Shared value types and AWS request signing for the auditmon workspace.

pub mod sigv4;
pub mod types;
