mod error;
mod reconcile;
mod report;
mod services;
mod window;


use std::io::Write;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::config::Config;
use crate::paths::config_file_path;
use crate::plex::PlexClient;
use crate::shoko::ShokoClient;

use self::error::SyncError;
use self::reconcile::SyncSummary;
use self::report::Reporter;

pub(crate) use self::services::{
    Account, ApiKey, Episode, MediaLibrary, MediaServer, Section, SeriesGroup, TrackedFile,
    TrackingServer, WatchedState,
};
pub(crate) use self::reconcile::path_matches_key;
pub(crate) use self::window::RelativeWindow;

pub fn run(cli: Cli) -> ExitCode {
    let mut report = Reporter::stdout();
    let result = execute(cli, &mut report);
    if let Err(err) = &result {
        report.fatal(err);
    }
    ExitCode::from(exit_status(&result))
}

fn execute<W: Write>(cli: Cli, report: &mut Reporter<W>) -> Result<SyncSummary, SyncError> {
    // Validate the window before anything touches the network.
    let window = cli
        .window
        .as_deref()
        .map(RelativeWindow::parse)
        .transpose()?;

    let config_path = match cli.config {
        Some(path) => path,
        None => config_file_path().map_err(SyncError::Config)?,
    };
    tracing::debug!(path = %config_path.display(), "loading config");
    let config = Config::load(&config_path).map_err(SyncError::Config)?;

    let plex = PlexClient::new(&config.plex.client_identifier);
    let shoko = ShokoClient::new(&config.shoko);
    reconcile::sync(&config, window.as_ref(), &plex, &shoko, report)
}

fn exit_status(result: &Result<SyncSummary, SyncError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            debug_assert!(err.is_fatal(), "recoverable error escaped the run: {err}");
            1
        }
    }
}
