use anyhow::Result;
use auditmon_catalog::effective_catalog;
use auditmon_cloud::aws::AwsComputeApi;
use auditmon_cloud::enumerator;
use auditmon_provision::aws::AwsMonitoringApi;
use auditmon_provision::baseline::BaselinePlan;
use auditmon_provision::topic;
use tracing_subscriber::EnvFilter;

mod config;

use config::CliConfig;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  auditmon plan <config.toml>        Print the resolved baseline without side effects");
    eprintln!("  auditmon provision <config.toml>   Create metric filters, alarms, and the notification topic");
    eprintln!("  auditmon instances <config.toml>   Enumerate compute instances and summarize running types");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("auditmon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let (command, config_path) = match (args.get(1).map(|s| s.as_str()), args.get(2)) {
        (Some(command), Some(path)) => (command, path),
        _ => {
            print_usage();
            anyhow::bail!("expected a subcommand and a config path");
        }
    };

    let config = CliConfig::load(config_path)?;

    match command {
        "plan" => plan(&config),
        "provision" => provision(&config).await,
        "instances" => instances(&config).await,
        other => {
            print_usage();
            anyhow::bail!("unknown subcommand: {other}");
        }
    }
}

fn resolve_plan(config: &CliConfig) -> BaselinePlan {
    let catalog = effective_catalog(
        config.provision.enable_extras,
        Some(&config.provision.overrides),
    );
    BaselinePlan::new(
        &config.provision.log_group,
        config.provision.namespace.as_deref(),
        &catalog,
    )
}

#[allow(clippy::print_stdout)]
fn plan(config: &CliConfig) -> Result<()> {
    let plan = resolve_plan(config);
    tracing::info!(
        namespace = %plan.namespace,
        log_group = %plan.log_group,
        alarms = plan.alarms.len(),
        "Resolved baseline plan"
    );
    println!("{}", serde_json::to_string_pretty(&plan.alarms)?);
    Ok(())
}

async fn provision(config: &CliConfig) -> Result<()> {
    let credentials = config.aws.credentials()?;
    let api = AwsMonitoringApi::new(&config.aws.region, credentials)?;
    let ctx = config.aws.deployment_context();

    let topic_arn = topic::resolve_topic(
        &api,
        &ctx,
        config.provision.notification_topic_arn.as_deref(),
        config.provision.kms_key_id.as_deref(),
    )
    .await?;

    let plan = resolve_plan(config);
    let provisioned = plan.apply(&api, &topic_arn).await?;

    tracing::info!(
        count = provisioned.len(),
        topic_arn = %topic_arn,
        "Provisioning run complete"
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn instances(config: &CliConfig) -> Result<()> {
    let credentials = config.aws.credentials()?;
    let api = AwsComputeApi::new(&config.aws.region, credentials)?;

    let instances = enumerator::enumerate_all(&api).await?;
    tracing::info!(count = instances.len(), "Enumerated compute instances");

    let types = enumerator::running_instance_types(&api).await?;
    for instance_type in &types {
        println!("{instance_type}");
    }
    Ok(())
}
