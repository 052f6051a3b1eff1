//! Route command: decide a backend without dispatching.

use super::output::{format_decision_json, format_decision_table, DecisionView};
use super::{Components, RouteArgs};
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle_route(args: &RouteArgs, components: &Components) -> Result<String> {
    let decision = components
        .executor
        .router()
        .route(&args.prompt, args.options(), &CancellationToken::new())
        .await?;

    let view = DecisionView::from(&decision);
    if args.json {
        Ok(format_decision_json(&view))
    } else {
        Ok(format_decision_table(&view))
    }
}
