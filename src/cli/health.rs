//! Health command: probe the local backend once.

use super::output::{format_health_json, format_health_pretty, HealthView};
use super::{Components, HealthArgs};
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle_health(args: &HealthArgs, components: &Components) -> Result<String> {
    let snapshot = components.health.probe(&CancellationToken::new()).await;

    let view = HealthView::from(snapshot);
    if args.json {
        Ok(format_health_json(&view))
    } else {
        Ok(format_health_pretty(&view))
    }
}
