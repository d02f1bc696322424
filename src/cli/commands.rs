use clap::Subcommand;

use super::play::PlayArgs;
use super::scripts::ScriptsArgs;
use super::synthesize::SynthesizeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Manage saved scripts
    Scripts(ScriptsArgs),

    /// Turn a fingerprint and a facet selection into query descriptors
    Synthesize(SynthesizeArgs),

    /// Replay a saved script in Chromium
    Play(PlayArgs),
}
