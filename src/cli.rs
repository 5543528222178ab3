use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "shoko-watched-sync",
    version,
    about = "Relay watched episode states from Plex to Shoko Server"
)]
pub struct Cli {
    /// Only sync episodes viewed within this window, e.g. 2w or 3d
    /// (1-999 followed by m, h, d, w, mon or y). Defaults to all time.
    pub window: Option<String>,

    /// Config file to read instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
