use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global fallback threshold applied when a definition leaves it unset.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Global fallback evaluation period (5 minutes).
pub const DEFAULT_PERIOD_SECS: u64 = 300;

/// Definitions are enabled unless they say otherwise.
pub const DEFAULT_ENABLED: bool = true;

/// Metric namespace used when the caller does not supply one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A named security alarm definition: which log pattern to count and at what
/// threshold/period to raise an alert. The name is the catalog key, not a
/// field. Threshold, period and enabled fall back to the global defaults
/// when unset.
///
/// The fallback is [`Option::unwrap_or`], so an explicit zero threshold or
/// period is honored as given rather than treated as absent.
///
/// # Examples
///
/// ```
/// use auditmon_common::types::AlarmDefinition;
///
/// let def = AlarmDefinition {
///     description: "Monitoring root account usage".to_string(),
///     pattern: "{ $.userIdentity.type = \"Root\" }".to_string(),
///     threshold: None,
///     period_secs: None,
///     enabled: None,
/// };
/// assert_eq!(def.effective_threshold(), 1.0);
/// assert_eq!(def.effective_period_secs(), 300);
/// assert!(def.is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    pub description: String,
    /// Filter expression over log records; opaque to auditmon, passed
    /// through verbatim to the metric filter.
    pub pattern: String,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub period_secs: Option<u64>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl AlarmDefinition {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(DEFAULT_ENABLED)
    }

    pub fn effective_threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn effective_period_secs(&self) -> u64 {
        self.period_secs.unwrap_or(DEFAULT_PERIOD_SECS)
    }
}

/// A catalog layer or the effective catalog: name keyed alarm definitions.
/// `BTreeMap` gives deterministic iteration, so provisioning order and test
/// output are stable.
pub type AlarmCatalog = BTreeMap<String, AlarmDefinition>;

/// An enabled definition after global defaults have been applied. Disabled
/// definitions never resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAlarm {
    pub name: String,
    pub description: String,
    pub pattern: String,
    pub threshold: f64,
    pub period_secs: u64,
}

/// The partition/region/account a provisioning run targets. Used to scope
/// the notification topic's publish permission to alarms in the same
/// account and region.
///
/// # Examples
///
/// ```
/// use auditmon_common::types::DeploymentContext;
///
/// let ctx = DeploymentContext {
///     partition: "aws".to_string(),
///     region: "eu-west-1".to_string(),
///     account: "123456789012".to_string(),
/// };
/// assert_eq!(
///     ctx.alarm_source_arn_pattern(),
///     "arn:aws:cloudwatch:eu-west-1:123456789012:alarm:*"
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentContext {
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl DeploymentContext {
    /// ARN pattern matching every alarm in this account and region.
    pub fn alarm_source_arn_pattern(&self) -> String {
        format!(
            "arn:{}:cloudwatch:{}:{}:alarm:*",
            self.partition, self.region, self.account
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_zero_threshold_is_not_treated_as_absent() {
        let def = AlarmDefinition {
            description: "d".to_string(),
            pattern: "p".to_string(),
            threshold: Some(0.0),
            period_secs: Some(0),
            enabled: None,
        };
        assert_eq!(def.effective_threshold(), 0.0);
        assert_eq!(def.effective_period_secs(), 0);
    }

    #[test]
    fn definition_deserializes_with_optional_fields_absent() {
        let def: AlarmDefinition = serde_json::from_value(serde_json::json!({
            "description": "Monitoring root account usage",
            "pattern": "{ $.userIdentity.type = \"Root\" }"
        }))
        .expect("definition should parse");

        assert!(def.threshold.is_none());
        assert!(def.period_secs.is_none());
        assert!(def.is_enabled());
    }
}
