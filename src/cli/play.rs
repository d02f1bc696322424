use std::sync::Arc;

use action_flow::{FlowResult, StepEngine};
use action_locator::DefaultElementResolver;
use action_primitives::{ChannelTabDispatcher, DefaultActionExecutor};
use anyhow::{bail, Context, Result};
use clap::Args;
use page_adapter::{CdpSession, LaunchOptions};
use tracing::{info, warn};

use crate::cli::context::CliContext;
use crate::cli::output::{emit, OutputFormat};
use crate::cli::scripts::load;

#[derive(Args, Clone, Debug)]
pub struct PlayArgs {
    /// Saved script name
    pub name: String,

    /// Open this URL instead of the one the script was recorded on
    #[arg(long)]
    pub url: Option<String>,

    /// Run the browser without a window
    #[arg(long, conflicts_with = "headful")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

pub async fn cmd_play(args: PlayArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let script = load(&ctx.store(), &args.name).await?;
    if !script.can_execute() {
        bail!(
            "Script '{}' has incomplete steps; run `webminer scripts check {}`",
            script.name,
            script.name
        );
    }

    let url = args.url.clone().unwrap_or_else(|| script.url.clone());
    let options = LaunchOptions {
        executable: config.browser.executable.clone(),
        headless: match (args.headless, args.headful) {
            (true, _) => true,
            (_, true) => false,
            _ => config.browser.headless,
        },
    };
    let session = CdpSession::launch(&options)
        .await
        .context("Failed to launch Chromium")?;
    let page = match session.open(&url).await {
        Ok(page) => page,
        Err(err) => {
            session.close().await;
            return Err(err).with_context(|| format!("Failed to open {}", url));
        }
    };
    info!(script = %script.name, url = %url, "Page ready");

    let (dispatcher, mut requests) = ChannelTabDispatcher::new();
    let output = ctx.output();
    let tab_host = tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            match output {
                OutputFormat::Human => {
                    println!(
                        "open {} link(s) (max {} tabs{}):",
                        request.link_urls.len(),
                        request.max_tabs,
                        request
                            .script_name
                            .as_deref()
                            .map(|name| format!(", then play '{}'", name))
                            .unwrap_or_default()
                    );
                    for link in &request.link_urls {
                        println!("    {}", link);
                    }
                }
                OutputFormat::Json => {
                    if let Ok(line) = serde_json::to_string(&request) {
                        eprintln!("{}", line);
                    }
                }
            }
        }
    });

    let resolver = DefaultElementResolver::new(config.resolver);
    let executor = DefaultActionExecutor::new(Arc::new(resolver), Arc::new(dispatcher))
        .with_tab_settings(config.tabs);
    let engine = StepEngine::open_saved(script, Arc::new(page), Arc::new(executor))
        .with_playback(config.playback);

    let cancel = engine.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping playback");
            cancel.cancel();
        }
    });

    let flow = engine.play_all().await;
    interrupt.abort();
    drop(engine);
    let _ = tab_host.await;
    session.close().await;

    emit(ctx.output(), &flow, print_flow)?;
    if !flow.success {
        bail!(
            "{} of {} step(s) failed{}",
            flow.failed_steps().count(),
            flow.step_results.len(),
            if flow.cancelled { " (cancelled)" } else { "" }
        );
    }
    Ok(())
}

fn print_flow(flow: &FlowResult) {
    for result in &flow.step_results {
        match (&result.report, &result.error) {
            (Some(report), _) => println!(
                "  {}. ok     {} on {} element(s) in {} ms",
                result.index + 1,
                report.command,
                report.matched_elements,
                result.latency_ms
            ),
            (None, Some(error)) => println!("  {}. failed {}", result.index + 1, error),
            (None, None) => println!("  {}. failed", result.index + 1),
        }
    }
    println!(
        "{}: {} in {} ms",
        flow.script,
        if flow.success { "done" } else { "finished with errors" },
        flow.latency_ms
    );
}
