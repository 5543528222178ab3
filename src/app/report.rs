use std::io::{self, Write};

use crossterm::style::Stylize;

use super::error::SyncError;
use super::reconcile::SyncSummary;

// Write errors are ignored; the tree is progress output only.
pub(crate) struct Reporter<W: Write> {
    out: W,
    opened: bool,
}

impl Reporter<io::Stdout> {
    pub(crate) fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Reporter<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out, opened: false }
    }

    pub(crate) fn begin(&mut self) {
        self.opened = true;
        self.line("\n┌Shoko Watched Sync");
    }

    pub(crate) fn querying(&mut self, account: &str, server: &str, library: &str) {
        self.line(&format!("├┬Querying: {account} @ {server}/{library}"));
    }

    pub(crate) fn relaying(&mut self, suffix_key: &str, episode_title: &str) {
        self.line(&format!("│├─Relaying: {suffix_key} → {episode_title}"));
    }

    pub(crate) fn library_finished(&mut self) {
        self.line("│└─Finished!");
    }

    pub(crate) fn recoverable(&mut self, err: &SyncError) {
        tracing::debug!(error = %err, "skipping after recoverable failure");
        let marker = failure_marker();
        let line = match err {
            SyncError::Relay { .. } => format!("│├{marker}─Failed: {err}"),
            SyncError::LibraryResolution { .. } | SyncError::LibrarySearch { .. } => {
                format!("│{marker}─Failed: {err}")
            }
            _ => format!("{marker}Failed: {err}"),
        };
        self.line(&line);
    }

    pub(crate) fn fatal(&mut self, err: &SyncError) {
        tracing::debug!(error = %err, "aborting sync");
        let marker = failure_marker();
        if self.opened {
            self.line(&format!("└{marker}Failed: {err}"));
        } else {
            self.line(&format!("{marker}Failed: {err}"));
        }
    }

    pub(crate) fn complete(&mut self, summary: &SyncSummary) {
        self.line(&format!(
            "└Watched Sync Complete ({} relayed, {} already tracked, {} failed)",
            summary.relayed, summary.already_tracked, summary.failures
        ));
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

fn failure_marker() -> String {
    "⨯".red().to_string()
}
