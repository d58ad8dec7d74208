use crate::baseline::BaselinePlan;
use crate::topic::{resolve_topic, TOPIC_NAME};
use crate::{
    ComparisonOperator, MetricAlarmSpec, MetricFilterSpec, MissingDataTreatment, MonitoringApi,
    Statistic, TopicSpec,
};
use async_trait::async_trait;
use auditmon_common::types::{AlarmCatalog, AlarmDefinition, DeploymentContext};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Call {
    Filter(MetricFilterSpec),
    Alarm(MetricAlarmSpec),
    Topic(TopicSpec),
    Policy {
        topic_arn: String,
        policy: serde_json::Value,
    },
}

#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    /// Alarm name whose put_metric_alarm call should fail.
    fail_on_alarm: Option<String>,
}

impl RecordingApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MonitoringApi for RecordingApi {
    async fn put_metric_filter(&self, filter: &MetricFilterSpec) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Filter(filter.clone()));
        Ok(())
    }

    async fn put_metric_alarm(&self, alarm: &MetricAlarmSpec) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Alarm(alarm.clone()));
        if self.fail_on_alarm.as_deref() == Some(alarm.alarm_name.as_str()) {
            anyhow::bail!("InvalidParameterValue: simulated rejection");
        }
        Ok(())
    }

    async fn create_topic(&self, topic: &TopicSpec) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(Call::Topic(topic.clone()));
        Ok(format!(
            "arn:aws:sns:eu-west-1:123456789012:{}",
            topic.name
        ))
    }

    async fn set_topic_policy(
        &self,
        topic_arn: &str,
        policy: &serde_json::Value,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Policy {
            topic_arn: topic_arn.to_string(),
            policy: policy.clone(),
        });
        Ok(())
    }
}

fn definition(
    pattern: &str,
    threshold: Option<f64>,
    period_secs: Option<u64>,
    enabled: Option<bool>,
) -> AlarmDefinition {
    AlarmDefinition {
        description: "test definition".to_string(),
        pattern: pattern.to_string(),
        threshold,
        period_secs,
        enabled,
    }
}

fn context() -> DeploymentContext {
    DeploymentContext {
        partition: "aws".to_string(),
        region: "eu-west-1".to_string(),
        account: "123456789012".to_string(),
    }
}

#[test]
fn plan_skips_disabled_definitions_entirely() {
    let mut catalog = AlarmCatalog::new();
    catalog.insert("A".to_string(), definition("p1", None, None, None));
    catalog.insert("B".to_string(), definition("p2", None, None, Some(false)));

    let plan = BaselinePlan::new("/aws/cloudtrail", None, &catalog);

    assert_eq!(plan.alarms.len(), 1);
    assert_eq!(plan.alarms[0].name, "A");
}

#[test]
fn plan_applies_global_defaults_to_unset_fields() {
    let mut catalog = AlarmCatalog::new();
    catalog.insert("A".to_string(), definition("p1", None, None, None));

    let plan = BaselinePlan::new("/aws/cloudtrail", None, &catalog);

    assert_eq!(plan.namespace, "default");
    assert_eq!(plan.alarms[0].threshold, 1.0);
    assert_eq!(plan.alarms[0].period_secs, 300);
}

#[test]
fn plan_honors_explicit_zero_threshold() {
    // The layered-config heritage used `value || default`, which would have
    // silently replaced an explicit 0 with the default. unwrap_or keeps it.
    let mut catalog = AlarmCatalog::new();
    catalog.insert("A".to_string(), definition("p1", Some(0.0), Some(60), None));

    let plan = BaselinePlan::new("/aws/cloudtrail", None, &catalog);

    assert_eq!(plan.alarms[0].threshold, 0.0);
    assert_eq!(plan.alarms[0].period_secs, 60);
}

#[tokio::test]
async fn apply_creates_filter_and_alarm_per_enabled_definition() {
    let mut catalog = AlarmCatalog::new();
    catalog.insert("A".to_string(), definition("p1", None, None, None));

    let api = RecordingApi::default();
    let plan = BaselinePlan::new("/aws/cloudtrail", Some("Security"), &catalog);
    let provisioned = plan
        .apply(&api, "arn:aws:sns:eu-west-1:123456789012:alerts")
        .await
        .unwrap();

    assert_eq!(provisioned, vec!["A".to_string()]);
    let calls = api.calls();
    assert_eq!(calls.len(), 2);

    match &calls[0] {
        Call::Filter(filter) => {
            assert_eq!(filter.filter_name, "A");
            assert_eq!(filter.log_group, "/aws/cloudtrail");
            assert_eq!(filter.pattern, "p1");
            assert_eq!(filter.metric_name, "A");
            assert_eq!(filter.metric_namespace, "Security");
            assert_eq!(filter.metric_value, "1");
        }
        other => panic!("expected metric filter first, got {other:?}"),
    }

    match &calls[1] {
        Call::Alarm(alarm) => {
            assert_eq!(alarm.alarm_name, "A");
            assert_eq!(
                alarm.comparison,
                ComparisonOperator::GreaterThanOrEqualToThreshold
            );
            assert_eq!(alarm.evaluation_periods, 1);
            assert_eq!(alarm.statistic, Statistic::Sum);
            assert_eq!(alarm.period_secs, 300);
            assert_eq!(alarm.threshold, 1.0);
            assert_eq!(
                alarm.treat_missing_data,
                MissingDataTreatment::NotBreaching
            );
            assert_eq!(
                alarm.alarm_actions,
                vec!["arn:aws:sns:eu-west-1:123456789012:alerts".to_string()]
            );
        }
        other => panic!("expected alarm second, got {other:?}"),
    }
}

#[tokio::test]
async fn override_scenario_materializes_exactly_one_alarm() {
    // catalog = {A: p1, B: p2 disabled}, override A with threshold 3
    let mut catalog = AlarmCatalog::new();
    catalog.insert("A".to_string(), definition("p1", None, None, None));
    catalog.insert("B".to_string(), definition("p2", None, None, Some(false)));

    let mut overrides = AlarmCatalog::new();
    overrides.insert("A".to_string(), definition("p1", Some(3.0), None, None));
    catalog.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

    let api = RecordingApi::default();
    let plan = BaselinePlan::new("/aws/cloudtrail", None, &catalog);
    let provisioned = plan
        .apply(&api, "arn:aws:sns:eu-west-1:123456789012:alerts")
        .await
        .unwrap();

    assert_eq!(provisioned, vec!["A".to_string()]);
    let alarms: Vec<_> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Alarm(a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(alarms.len(), 1);
    assert_eq!(alarms[0].alarm_name, "A");
    assert_eq!(alarms[0].threshold, 3.0);
    assert_eq!(alarms[0].period_secs, 300);
}

#[tokio::test]
async fn creation_failure_aborts_run_and_keeps_earlier_resources() {
    let mut catalog = AlarmCatalog::new();
    catalog.insert("A".to_string(), definition("p1", None, None, None));
    catalog.insert("B".to_string(), definition("p2", None, None, None));

    let api = RecordingApi {
        fail_on_alarm: Some("B".to_string()),
        ..Default::default()
    };
    let plan = BaselinePlan::new("/aws/cloudtrail", None, &catalog);
    let err = plan
        .apply(&api, "arn:aws:sns:eu-west-1:123456789012:alerts")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to create alarm B"));

    // A's resources were created before the failure and are not rolled back
    let calls = api.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(&calls[0], Call::Filter(f) if f.filter_name == "A"));
    assert!(matches!(&calls[1], Call::Alarm(a) if a.alarm_name == "A"));
    assert!(matches!(&calls[2], Call::Filter(f) if f.filter_name == "B"));
}

#[tokio::test]
async fn resolve_topic_uses_existing_topic_untouched() {
    let api = RecordingApi::default();
    let arn = resolve_topic(
        &api,
        &context(),
        Some("arn:aws:sns:eu-west-1:123456789012:existing"),
        Some("ignored-key"),
    )
    .await
    .unwrap();

    assert_eq!(arn, "arn:aws:sns:eu-west-1:123456789012:existing");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn resolve_topic_creates_topic_with_scoped_publish_policy() {
    let api = RecordingApi::default();
    let arn = resolve_topic(&api, &context(), None, None).await.unwrap();

    assert_eq!(
        arn,
        format!("arn:aws:sns:eu-west-1:123456789012:{TOPIC_NAME}")
    );

    let calls = api.calls();
    assert_eq!(calls.len(), 2);

    match &calls[0] {
        Call::Topic(topic) => {
            assert_eq!(topic.name, TOPIC_NAME);
            assert!(topic.kms_master_key_id.is_none());
        }
        other => panic!("expected topic creation first, got {other:?}"),
    }

    match &calls[1] {
        Call::Policy { topic_arn, policy } => {
            assert_eq!(topic_arn, &arn);
            let statements = policy["Statement"].as_array().unwrap();
            assert_eq!(statements.len(), 2);

            let allow = &statements[0];
            assert_eq!(allow["Effect"], "Allow");
            assert_eq!(allow["Action"], "sns:Publish");
            assert_eq!(allow["Principal"]["Service"], "cloudwatch.amazonaws.com");
            assert_eq!(
                allow["Condition"]["ArnLike"]["aws:SourceArn"],
                "arn:aws:cloudwatch:eu-west-1:123456789012:alarm:*"
            );

            let deny = &statements[1];
            assert_eq!(deny["Effect"], "Deny");
            assert_eq!(deny["Condition"]["Bool"]["aws:SecureTransport"], "false");
        }
        other => panic!("expected policy attachment second, got {other:?}"),
    }
}

#[tokio::test]
async fn resolve_topic_passes_kms_key_through() {
    let api = RecordingApi::default();
    resolve_topic(&api, &context(), None, Some("alias/audit"))
        .await
        .unwrap();

    match &api.calls()[0] {
        Call::Topic(topic) => {
            assert_eq!(topic.kms_master_key_id.as_deref(), Some("alias/audit"));
        }
        other => panic!("expected topic creation, got {other:?}"),
    }
}

#[tokio::test]
async fn full_baseline_provisions_every_default_definition() {
    let api = RecordingApi::default();
    let catalog = auditmon_catalog::effective_catalog(true, None);
    let topic_arn = resolve_topic(&api, &context(), None, None).await.unwrap();

    let plan = BaselinePlan::new("/aws/cloudtrail", None, &catalog);
    let provisioned = plan.apply(&api, &topic_arn).await.unwrap();

    // 15 defaults + 2 extras, each a filter and an alarm, after the topic pair
    assert_eq!(provisioned.len(), 17);
    assert_eq!(api.calls().len(), 2 + 17 * 2);
}
