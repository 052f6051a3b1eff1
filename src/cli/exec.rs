//! Exec command: route a prompt, dispatch it, print the response.

use super::output::{format_outcome_json, format_outcome_pretty, OutcomeView};
use super::{Components, ExecArgs};
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn handle_exec(args: &ExecArgs, components: &Components) -> Result<String> {
    let cancel = CancellationToken::new();

    // Ctrl-C propagates as cancellation into the in-flight backend call.
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let outcome = components
        .executor
        .execute(&args.prompt, args.options(), &cancel)
        .await?;

    let view = OutcomeView::from(&outcome);
    if args.json {
        Ok(format_outcome_json(&view))
    } else {
        Ok(format_outcome_pretty(&view))
    }
}
