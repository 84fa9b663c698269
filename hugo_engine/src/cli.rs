use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use hugo_engine::GameRelease;

#[derive(Parser, Debug)]
#[command(
    about = "Runs a Hugo action script on the sandbox host and prints the dispatch trace",
    version
)]
pub struct Args {
    /// Script resource holding the action lists of every release
    #[arg(long)]
    pub script: PathBuf,

    /// Optional JSON scheduler config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Release to emulate; overrides the config
    #[arg(long, value_enum)]
    pub release: Option<GameRelease>,

    /// Number of release sections stored in the script resource
    #[arg(long)]
    pub variants: Option<usize>,

    /// Section to load instead of the release's own
    #[arg(long)]
    pub variant: Option<usize>,

    /// Action list rewritten and scheduled when the hero leaves a maze screen
    #[arg(long)]
    pub maze_list: Option<u16>,

    /// Action list scheduled before the first tick
    #[arg(long)]
    pub start_list: Option<u16>,

    /// Screen entered before the first tick
    #[arg(long)]
    pub start_screen: Option<i16>,

    /// Tick the manual clock starts at
    #[arg(long, default_value_t = 0)]
    pub start_tick: u32,

    /// Number of scheduler passes to run
    #[arg(long, default_value_t = 1)]
    pub ticks: u32,

    /// Save file to restore before running
    #[arg(long)]
    pub restore: Option<PathBuf>,

    /// Save file to write after the last tick
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Path to write the dispatch trace and host event log as JSON
    #[arg(long)]
    pub trace_json: Option<PathBuf>,

    /// Print every host effect next to the dispatch trace
    #[arg(long)]
    pub verbose: bool,
}

pub fn parse() -> Result<Args> {
    let args = Args::parse();
    args.validate()?;
    Ok(args)
}

impl Args {
    fn validate(&self) -> Result<()> {
        if self.start_list.is_none() && self.start_screen.is_none() && self.restore.is_none() {
            bail!("nothing to run: pass --start-list, --start-screen or --restore");
        }
        if let (Some(save), Some(restore)) = (&self.save, &self.restore) {
            if save == restore {
                bail!("--save would overwrite the --restore file {}", save.display());
            }
        }
        if matches!(self.variants, Some(0)) {
            bail!("--variants must be at least 1");
        }
        Ok(())
    }
}
