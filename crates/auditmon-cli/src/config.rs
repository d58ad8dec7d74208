use anyhow::Context;
use auditmon_common::sigv4::Credentials;
use auditmon_common::types::{AlarmCatalog, DeploymentContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub provision: ProvisionConfig,
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Log group where CloudTrail events are delivered.
    pub log_group: String,
    /// Metric namespace for the filter-backed metrics. Falls back to the
    /// built-in default namespace when unset.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub enable_extras: bool,
    /// Existing notification topic to use as-is. A new topic is created
    /// when unset.
    #[serde(default)]
    pub notification_topic_arn: Option<String>,
    /// KMS key for encryption at rest on a newly created topic.
    #[serde(default)]
    pub kms_key_id: Option<String>,
    /// Per-alarm overrides, keyed by alarm name. An entry replaces the
    /// built-in definition of the same name wholesale; unknown names add
    /// new alarms.
    #[serde(default)]
    pub overrides: AlarmCatalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub account_id: String,
    #[serde(default = "default_partition")]
    pub partition: String,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

fn default_partition() -> String {
    "aws".to_string()
}

impl CliConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

impl AwsConfig {
    /// Credentials from the config file, falling back to the standard
    /// environment variables.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        let access_key_id = match &self.access_key_id {
            Some(value) => value.clone(),
            None => std::env::var("AWS_ACCESS_KEY_ID")
                .context("aws.access_key_id not configured and AWS_ACCESS_KEY_ID not set")?,
        };
        let secret_access_key = match &self.secret_access_key {
            Some(value) => value.clone(),
            None => std::env::var("AWS_SECRET_ACCESS_KEY")
                .context("aws.secret_access_key not configured and AWS_SECRET_ACCESS_KEY not set")?,
        };

        Ok(Credentials {
            access_key_id,
            secret_access_key,
        })
    }

    pub fn deployment_context(&self) -> DeploymentContext {
        DeploymentContext {
            partition: self.partition.clone(),
            region: self.region.clone(),
            account: self.account_id.clone(),
        }
    }
}
