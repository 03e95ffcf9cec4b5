use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Small, file-backed task pad.
/// Storage defaults to ~/.taskpad or a directory passed via --dir.
#[derive(Parser)]
#[command(name = "tp", version, about = "Quick task pad with light/dark/system themes")]
pub struct Cli {
    /// Directory holding the task and theme files.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print without colours.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}
