//! Usage command: rolling spend against configured caps.

use super::output::{format_usage_json, format_usage_table, UsageView};
use super::{Components, UsageArgs};
use anyhow::Result;

pub async fn handle_usage(args: &UsageArgs, components: &Components) -> Result<String> {
    let usage = components.budget.current_usage().await;
    let limits = components.budget.limits().await;

    let view = UsageView::new(usage, limits);
    if args.json {
        Ok(format_usage_json(&view))
    } else {
        Ok(format_usage_table(&view))
    }
}
