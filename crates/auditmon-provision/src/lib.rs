//! Materialization of the security alarm baseline.
//!
//! The [`MonitoringApi`] trait is the seam to the resource-creation API:
//! metric filters, threshold alarms, and notification topics. A provisioning
//! run builds a pure [`baseline::BaselinePlan`] from the effective catalog,
//! resolves the notification topic ([`topic::resolve_topic`]), then applies
//! the plan. Creation failures are never caught or retried here; they
//! propagate and abort the rest of the run, leaving earlier resources in
//! place.

pub mod aws;
pub mod baseline;
pub mod error;
pub mod topic;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use std::str::FromStr;

/// Inputs for a log-based metric filter: scan `log_group` for records
/// matching `pattern` and emit `metric_value` into
/// `metric_namespace`/`metric_name` for each match.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFilterSpec {
    pub filter_name: String,
    pub log_group: String,
    pub pattern: String,
    pub metric_name: String,
    pub metric_namespace: String,
    pub metric_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThanOrEqualToThreshold => write!(f, "GreaterThanOrEqualToThreshold"),
            Self::GreaterThanThreshold => write!(f, "GreaterThanThreshold"),
            Self::LessThanThreshold => write!(f, "LessThanThreshold"),
            Self::LessThanOrEqualToThreshold => write!(f, "LessThanOrEqualToThreshold"),
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "GreaterThanOrEqualToThreshold" | "gte" => Ok(Self::GreaterThanOrEqualToThreshold),
            "GreaterThanThreshold" | "gt" => Ok(Self::GreaterThanThreshold),
            "LessThanThreshold" | "lt" => Ok(Self::LessThanThreshold),
            "LessThanOrEqualToThreshold" | "lte" => Ok(Self::LessThanOrEqualToThreshold),
            _ => Err(format!("unknown comparison operator: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
    Average,
    Minimum,
    Maximum,
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "Sum"),
            Self::Average => write!(f, "Average"),
            Self::Minimum => write!(f, "Minimum"),
            Self::Maximum => write!(f, "Maximum"),
        }
    }
}

/// How the alarm treats evaluation periods with no data points. The baseline
/// always uses [`NotBreaching`](Self::NotBreaching): a gap in events must
/// never itself trigger an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingDataTreatment {
    NotBreaching,
    Breaching,
    Ignore,
    Missing,
}

impl std::fmt::Display for MissingDataTreatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotBreaching => write!(f, "notBreaching"),
            Self::Breaching => write!(f, "breaching"),
            Self::Ignore => write!(f, "ignore"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Inputs for a threshold alarm over a filter-backed metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricAlarmSpec {
    pub alarm_name: String,
    pub description: String,
    pub namespace: String,
    pub metric_name: String,
    pub comparison: ComparisonOperator,
    pub evaluation_periods: u32,
    pub statistic: Statistic,
    pub period_secs: u64,
    pub threshold: f64,
    pub treat_missing_data: MissingDataTreatment,
    /// Notification topic ARNs to publish to on transition into alarm state.
    pub alarm_actions: Vec<String>,
}

/// Inputs for a new notification topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSpec {
    pub name: String,
    pub display_name: String,
    /// Encryption-at-rest key. `None` means provider-managed encryption.
    pub kms_master_key_id: Option<String>,
}

/// The resource-creation API consumed by a provisioning run. Implemented
/// over raw AWS HTTP calls by [`aws::AwsMonitoringApi`] and by recording
/// mocks in tests.
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// Create or update a log-based metric filter.
    async fn put_metric_filter(&self, filter: &MetricFilterSpec) -> Result<()>;

    /// Create or update a threshold alarm.
    async fn put_metric_alarm(&self, alarm: &MetricAlarmSpec) -> Result<()>;

    /// Create a notification topic, returning its ARN.
    async fn create_topic(&self, topic: &TopicSpec) -> Result<String>;

    /// Replace the topic's resource access policy.
    async fn set_topic_policy(&self, topic_arn: &str, policy: &serde_json::Value) -> Result<()>;
}
