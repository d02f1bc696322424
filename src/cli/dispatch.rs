use super::env::CliArgs;
use super::play::cmd_play;
use super::scripts::cmd_scripts;
use super::synthesize::cmd_synthesize;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Scripts(args) => cmd_scripts(args, ctx).await,
        Commands::Synthesize(args) => cmd_synthesize(args, ctx).await,
        Commands::Play(args) => cmd_play(args, ctx).await,
    }
}
