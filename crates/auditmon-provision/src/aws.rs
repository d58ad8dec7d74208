//! SigV4-signed HTTP implementation of [`MonitoringApi`].
//!
//! CloudWatch Logs speaks the JSON 1.1 target protocol; CloudWatch and SNS
//! speak the form-encoded query protocol with XML responses. All requests
//! are POSTs to the regional endpoint root.

use crate::error::{ProvisionError, Result};
use crate::{MetricAlarmSpec, MetricFilterSpec, MonitoringApi, TopicSpec};
use async_trait::async_trait;
use auditmon_common::sigv4::{sign_request, Credentials};
use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

const LOGS_TARGET_PUT_METRIC_FILTER: &str = "Logs_20140328.PutMetricFilter";
const MONITORING_VERSION: &str = "2010-08-01";
const SNS_VERSION: &str = "2010-03-31";
const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const QUERY_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

pub struct AwsMonitoringApi {
    client: Client,
    credentials: Credentials,
    region: String,
}

impl AwsMonitoringApi {
    pub fn new(region: &str, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            credentials,
            region: region.to_string(),
        })
    }

    async fn post(
        &self,
        service: &str,
        host: &str,
        content_type: &str,
        extra_headers: &[(&str, &str)],
        payload: String,
    ) -> Result<String> {
        let signature = sign_request(
            &self.credentials,
            service,
            &self.region,
            host,
            content_type,
            &payload,
            Utc::now().timestamp(),
        )?;

        let url = format!("https://{}/", host);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", content_type)
            .header("Host", host)
            .header("X-Amz-Date", &signature.amz_date)
            .header("Authorization", &signature.authorization);
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        let response = request.body(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProvisionError::HttpError {
                service: service.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    async fn post_query(
        &self,
        service: &str,
        host: &str,
        params: &[(&str, String)],
    ) -> Result<String> {
        self.post(service, host, QUERY_CONTENT_TYPE, &[], form_encode(params))
            .await
    }

    fn logs_host(&self) -> String {
        format!("logs.{}.amazonaws.com", self.region)
    }

    fn monitoring_host(&self) -> String {
        format!("monitoring.{}.amazonaws.com", self.region)
    }

    fn sns_host(&self) -> String {
        format!("sns.{}.amazonaws.com", self.region)
    }
}

#[async_trait]
impl MonitoringApi for AwsMonitoringApi {
    async fn put_metric_filter(&self, filter: &MetricFilterSpec) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "filterName": filter.filter_name,
            "filterPattern": filter.pattern,
            "logGroupName": filter.log_group,
            "metricTransformations": [{
                "metricName": filter.metric_name,
                "metricNamespace": filter.metric_namespace,
                "metricValue": filter.metric_value,
            }],
        });

        self.post(
            "logs",
            &self.logs_host(),
            JSON_CONTENT_TYPE,
            &[("X-Amz-Target", LOGS_TARGET_PUT_METRIC_FILTER)],
            payload.to_string(),
        )
        .await?;
        Ok(())
    }

    async fn put_metric_alarm(&self, alarm: &MetricAlarmSpec) -> anyhow::Result<()> {
        let action_keys: Vec<String> = (1..=alarm.alarm_actions.len())
            .map(|i| format!("AlarmActions.member.{i}"))
            .collect();
        let mut params = vec![
            ("Action", "PutMetricAlarm".to_string()),
            ("Version", MONITORING_VERSION.to_string()),
            ("AlarmName", alarm.alarm_name.clone()),
            ("AlarmDescription", alarm.description.clone()),
            ("ComparisonOperator", alarm.comparison.to_string()),
            ("EvaluationPeriods", alarm.evaluation_periods.to_string()),
            ("MetricName", alarm.metric_name.clone()),
            ("Namespace", alarm.namespace.clone()),
            ("Period", alarm.period_secs.to_string()),
            ("Statistic", alarm.statistic.to_string()),
            ("Threshold", alarm.threshold.to_string()),
            ("TreatMissingData", alarm.treat_missing_data.to_string()),
        ];
        for (key, action) in action_keys.iter().zip(&alarm.alarm_actions) {
            params.push((key.as_str(), action.clone()));
        }

        self.post_query("monitoring", &self.monitoring_host(), &params)
            .await?;
        Ok(())
    }

    async fn create_topic(&self, topic: &TopicSpec) -> anyhow::Result<String> {
        let mut params = vec![
            ("Action", "CreateTopic".to_string()),
            ("Version", SNS_VERSION.to_string()),
            ("Name", topic.name.clone()),
            ("Attributes.entry.1.key", "DisplayName".to_string()),
            ("Attributes.entry.1.value", topic.display_name.clone()),
        ];
        if let Some(key_id) = &topic.kms_master_key_id {
            params.push(("Attributes.entry.2.key", "KmsMasterKeyId".to_string()));
            params.push(("Attributes.entry.2.value", key_id.clone()));
        }

        let body = self.post_query("sns", &self.sns_host(), &params).await?;
        let topic_arn =
            xml_text(&body, "TopicArn").ok_or_else(|| ProvisionError::MalformedResponse {
                service: "sns".to_string(),
                detail: "missing TopicArn".to_string(),
            })?;
        Ok(topic_arn)
    }

    async fn set_topic_policy(
        &self,
        topic_arn: &str,
        policy: &serde_json::Value,
    ) -> anyhow::Result<()> {
        let params = [
            ("Action", "SetTopicAttributes".to_string()),
            ("Version", SNS_VERSION.to_string()),
            ("TopicArn", topic_arn.to_string()),
            ("AttributeName", "Policy".to_string()),
            ("AttributeValue", policy.to_string()),
        ];

        self.post_query("sns", &self.sns_host(), &params).await?;
        Ok(())
    }
}

/// Form-encode query-protocol parameters (RFC 3986 escaping, space as %20).
fn form_encode(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

/// Text content of the first `tag` element in an XML document.
pub(crate) fn xml_text(xml: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == tag.as_bytes() => inside = true,
            Ok(Event::Text(t)) if inside => {
                return t.unescape().ok().map(|s| s.trim().to_string())
            }
            Ok(Event::End(e)) if e.name().as_ref() == tag.as_bytes() => inside = false,
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}
