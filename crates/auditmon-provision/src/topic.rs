use crate::{MonitoringApi, TopicSpec};
use anyhow::{Context, Result};
use auditmon_common::types::DeploymentContext;
use serde_json::json;

/// Name given to a topic created by the baseline.
pub const TOPIC_NAME: &str = "auditmon-baseline-notifications";

/// Resource policy for a baseline-created topic: CloudWatch may publish,
/// but only on behalf of alarms in this account and region, and plaintext
/// transport is rejected.
pub fn publish_policy(ctx: &DeploymentContext, topic_arn: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": { "Service": "cloudwatch.amazonaws.com" },
                "Action": "sns:Publish",
                "Resource": topic_arn,
                "Condition": {
                    "ArnLike": { "aws:SourceArn": ctx.alarm_source_arn_pattern() }
                }
            },
            {
                "Effect": "Deny",
                "Principal": "*",
                "Action": "sns:Publish",
                "Resource": topic_arn,
                "Condition": {
                    "Bool": { "aws:SecureTransport": "false" }
                }
            }
        ]
    })
}

/// Return the notification topic for this provisioning run.
///
/// A caller-supplied ARN is used as-is; its existing policy and encryption
/// configuration are not modified. Otherwise a new topic is created with
/// optional KMS encryption at rest (provider-managed encryption when no key
/// is given) and the scoped publish policy attached. Exactly one topic is in
/// effect per run, resolved before any alarm is materialized.
pub async fn resolve_topic(
    api: &dyn MonitoringApi,
    ctx: &DeploymentContext,
    existing: Option<&str>,
    kms_key: Option<&str>,
) -> Result<String> {
    if let Some(arn) = existing {
        tracing::debug!(topic_arn = arn, "Using caller-supplied notification topic");
        return Ok(arn.to_string());
    }

    let topic_arn = api
        .create_topic(&TopicSpec {
            name: TOPIC_NAME.to_string(),
            display_name: TOPIC_NAME.to_string(),
            kms_master_key_id: kms_key.map(str::to_string),
        })
        .await
        .context("Failed to create notification topic")?;

    api.set_topic_policy(&topic_arn, &publish_policy(ctx, &topic_arn))
        .await
        .context("Failed to attach notification topic policy")?;

    tracing::info!(topic_arn = %topic_arn, "Created notification topic");
    Ok(topic_arn)
}
