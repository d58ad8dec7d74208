use crate::{ComputeApi, ComputeInstance};
use anyhow::Result;

/// Walk every page of the listing, following the continuation token until
/// the provider reports no further pages (token absent or empty).
///
/// # Errors
///
/// A failed page fetch aborts the walk and surfaces the error. Instances
/// from pages fetched before the failure are discarded with it. (The
/// predecessor of this enumerator caught and dropped such errors silently;
/// that was a defect, not a contract.)
pub async fn enumerate_all(api: &dyn ComputeApi) -> Result<Vec<ComputeInstance>> {
    let mut instances = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = api.describe_instances(next_token.as_deref()).await?;
        instances.extend(page.instances);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(count = instances.len(), "Enumerated compute instances");
    Ok(instances)
}

/// Summarize the instance types currently running: one unpaginated call,
/// returning sorted, deduplicated type names.
pub async fn running_instance_types(api: &dyn ComputeApi) -> Result<Vec<String>> {
    let instances = api.describe_running_instances().await?;

    let mut types: Vec<String> = instances
        .into_iter()
        .map(|instance| instance.instance_type)
        .collect();
    types.sort();
    types.dedup();
    Ok(types)
}
