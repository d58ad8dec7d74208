//! Compute-instance enumeration over a paginated listing API.
//!
//! The provisioning run has no data dependency on this crate; enumeration
//! is an independently triggered unit of work (typically on a recurring
//! timer) backing the unexpected-instance-type check.

pub mod aws;
pub mod enumerator;
pub mod error;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Compute instance metadata discovered from the provider API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeInstance {
    pub instance_id: String,
    pub instance_type: String,
    /// Lifecycle state as reported by the provider (e.g., "running").
    pub state: String,
}

/// One page of a paginated listing. A `next_token` that is absent or empty
/// marks the final page.
#[derive(Debug, Clone, Default)]
pub struct InstancePage {
    pub instances: Vec<ComputeInstance>,
    pub next_token: Option<String>,
}

/// The instance enumeration API: a paginated list call with an opaque
/// continuation token, plus a single-call running-instance listing.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Fetch one page of instances. `None` fetches the first page.
    async fn describe_instances(&self, next_token: Option<&str>) -> Result<InstancePage>;

    /// Unpaginated listing restricted to running instances.
    async fn describe_running_instances(&self) -> Result<Vec<ComputeInstance>>;
}
