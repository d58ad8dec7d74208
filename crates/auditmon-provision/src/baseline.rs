use crate::{
    ComparisonOperator, MetricAlarmSpec, MetricFilterSpec, MissingDataTreatment, MonitoringApi,
    Statistic,
};
use anyhow::{Context, Result};
use auditmon_common::types::{AlarmCatalog, ResolvedAlarm, DEFAULT_NAMESPACE};

/// The resolved, side-effect-free provisioning plan: every enabled
/// definition from the effective catalog with global defaults applied.
/// Construction is pure; resources are only created by [`apply`](Self::apply).
#[derive(Debug, Clone, PartialEq)]
pub struct BaselinePlan {
    pub namespace: String,
    pub log_group: String,
    pub alarms: Vec<ResolvedAlarm>,
}

impl BaselinePlan {
    /// Resolve the effective catalog against `log_group` and the optional
    /// metric namespace. Disabled definitions are skipped entirely; they do
    /// not appear in the plan and produce no resources.
    pub fn new(log_group: &str, namespace: Option<&str>, catalog: &AlarmCatalog) -> Self {
        let alarms = catalog
            .iter()
            .filter(|(_, definition)| definition.is_enabled())
            .map(|(name, definition)| ResolvedAlarm {
                name: name.clone(),
                description: definition.description.clone(),
                pattern: definition.pattern.clone(),
                threshold: definition.effective_threshold(),
                period_secs: definition.effective_period_secs(),
            })
            .collect();

        Self {
            namespace: namespace.unwrap_or(DEFAULT_NAMESPACE).to_string(),
            log_group: log_group.to_string(),
            alarms,
        }
    }

    /// Materialize the plan: one metric filter plus one threshold alarm per
    /// entry, in catalog order, every alarm publishing to `topic_arn`.
    ///
    /// # Errors
    ///
    /// The first creation failure aborts the remainder of the run. Nothing
    /// is rolled back; resources created before the failure remain.
    pub async fn apply(
        &self,
        api: &dyn MonitoringApi,
        topic_arn: &str,
    ) -> Result<Vec<String>> {
        let mut provisioned = Vec::with_capacity(self.alarms.len());

        for alarm in &self.alarms {
            api.put_metric_filter(&MetricFilterSpec {
                filter_name: alarm.name.clone(),
                log_group: self.log_group.clone(),
                pattern: alarm.pattern.clone(),
                metric_name: alarm.name.clone(),
                metric_namespace: self.namespace.clone(),
                // Each matching log record counts as one occurrence
                metric_value: "1".to_string(),
            })
            .await
            .with_context(|| format!("Failed to create metric filter {}", alarm.name))?;

            api.put_metric_alarm(&MetricAlarmSpec {
                alarm_name: alarm.name.clone(),
                description: alarm.description.clone(),
                namespace: self.namespace.clone(),
                metric_name: alarm.name.clone(),
                comparison: ComparisonOperator::GreaterThanOrEqualToThreshold,
                evaluation_periods: 1,
                statistic: Statistic::Sum,
                period_secs: alarm.period_secs,
                threshold: alarm.threshold,
                treat_missing_data: MissingDataTreatment::NotBreaching,
                alarm_actions: vec![topic_arn.to_string()],
            })
            .await
            .with_context(|| format!("Failed to create alarm {}", alarm.name))?;

            tracing::info!(
                alarm = %alarm.name,
                threshold = alarm.threshold,
                period_secs = alarm.period_secs,
                "Provisioned baseline alarm"
            );
            provisioned.push(alarm.name.clone());
        }

        Ok(provisioned)
    }
}
