use std::io::Write;

use anyhow::{Result, anyhow};

use super::error::{Service, SyncError};
use super::report::Reporter;
use super::services::{
    Account, ApiKey, Episode, MediaLibrary, MediaServer, TrackedFile, TrackingServer,
    WatchedState,
};
use super::window::RelativeWindow;
use crate::config::Config;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SyncSummary {
    pub(crate) relayed: usize,
    pub(crate) already_tracked: usize,
    pub(crate) failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RelayDecision<'a> {
    Skip,
    Relay(&'a [u64]),
    Unmatched,
}

// Definite states are never overwritten; only the first series group is marked.
pub(crate) fn decide(file: &TrackedFile) -> RelayDecision<'_> {
    match file.watched {
        WatchedState::Watched | WatchedState::Unwatched => RelayDecision::Skip,
        WatchedState::Unknown => match file.series.first() {
            Some(group) => RelayDecision::Relay(&group.episode_ids),
            None => RelayDecision::Unmatched,
        },
    }
}

// Leading separator keeps `S01E01.mkv` from matching `XS01E01.mkv`. Plex may
// run on Windows, so both separators split.
pub(crate) fn suffix_key(file_path: &str) -> Option<String> {
    let name = file_path
        .rsplit(['/', '\\'])
        .find(|component| !component.is_empty())?;
    Some(format!("/{name}"))
}

// Stored paths may be relative to an import folder, so a root-level file
// still needs the leading separator to compare. Shoko matches ignoring case.
pub(crate) fn path_matches_key(stored_path: &str, key: &str) -> bool {
    let stored = format!("/{}", stored_path.replace('\\', "/"));
    stored.to_lowercase().ends_with(&key.to_lowercase())
}

pub(crate) fn sync<M, T, W>(
    config: &Config,
    window: Option<&RelativeWindow>,
    plex: &M,
    shoko: &T,
    report: &mut Reporter<W>,
) -> Result<SyncSummary, SyncError>
where
    M: MediaServer,
    T: TrackingServer,
    W: Write,
{
    let mut summary = SyncSummary::default();

    let credentials = config.plex.credentials().map_err(SyncError::Config)?;
    let admin = plex
        .sign_in(&credentials)
        .map_err(|source| SyncError::Auth {
            service: Service::Plex,
            source,
        })?;
    let accounts = resolve_accounts(plex, admin, &config.plex.extra_users, report, &mut summary);

    let api_key = shoko.authenticate().map_err(|source| SyncError::Auth {
        service: Service::Shoko,
        source,
    })?;

    match window {
        Some(window) => tracing::info!(
            window = window.as_str(),
            amount = window.amount(),
            unit = ?window.unit(),
            "limiting sync to recently viewed episodes"
        ),
        None => tracing::info!("syncing all watched episodes"),
    }

    report.begin();
    let server_name = config.plex.server_name.as_str();
    for account in &accounts {
        let server = plex
            .connect(account, server_name)
            .map_err(|source| SyncError::ServerNotFound {
                server: server_name.to_string(),
                source,
            })?;

        for library in &config.plex.library_names {
            report.querying(&account.name, server_name, library);
            let episodes = match watched_episodes(&server, account, library, window) {
                Ok(episodes) => episodes,
                Err(err) => {
                    summary.failures += 1;
                    report.recoverable(&err);
                    continue;
                }
            };
            tracing::debug!(
                account = %account.name,
                library = %library,
                count = episodes.len(),
                "watched episodes found"
            );

            for episode in &episodes {
                relay_episode(shoko, &api_key, episode, report, &mut summary);
            }
            report.library_finished();
        }
    }

    report.complete(&summary);
    Ok(summary)
}

fn resolve_accounts<M: MediaServer, W: Write>(
    plex: &M,
    admin: Account,
    extra_users: &[String],
    report: &mut Reporter<W>,
    summary: &mut SyncSummary,
) -> Vec<Account> {
    let mut accounts = Vec::with_capacity(extra_users.len() + 1);
    for username in extra_users {
        match plex.switch_user(&admin, username) {
            Ok(account) => accounts.push(account),
            Err(source) => {
                summary.failures += 1;
                report.recoverable(&SyncError::UserResolution {
                    username: username.clone(),
                    source,
                });
            }
        }
    }
    accounts.insert(0, admin);
    accounts
}

fn watched_episodes<L: MediaLibrary>(
    server: &L,
    account: &Account,
    library: &str,
    window: Option<&RelativeWindow>,
) -> Result<Vec<Episode>, SyncError> {
    let section = server
        .section(library)
        .map_err(|source| SyncError::LibraryResolution {
            library: library.to_string(),
            account: account.name.clone(),
            source,
        })?;
    server
        .watched_episodes(&section, window)
        .map_err(|source| SyncError::LibrarySearch {
            library: library.to_string(),
            account: account.name.clone(),
            source,
        })
}

fn relay_episode<T: TrackingServer, W: Write>(
    shoko: &T,
    api_key: &ApiKey,
    episode: &Episode,
    report: &mut Reporter<W>,
    summary: &mut SyncSummary,
) {
    for file_path in &episode.file_paths {
        let Some(key) = suffix_key(file_path) else {
            summary.failures += 1;
            report.recoverable(&SyncError::Relay {
                path: file_path.clone(),
                source: anyhow!("file path has no file name"),
            });
            continue;
        };

        match relay_file(shoko, api_key, &key, episode, report) {
            Ok(true) => summary.relayed += 1,
            Ok(false) => summary.already_tracked += 1,
            Err(source) => {
                summary.failures += 1;
                report.recoverable(&SyncError::Relay { path: key, source });
            }
        }
    }
}

fn relay_file<T: TrackingServer, W: Write>(
    shoko: &T,
    api_key: &ApiKey,
    key: &str,
    episode: &Episode,
    report: &mut Reporter<W>,
) -> Result<bool> {
    let file = shoko
        .find_by_path_suffix(api_key, key)?
        .ok_or_else(|| anyhow!("no tracked file ends with {key}"))?;

    match decide(&file) {
        RelayDecision::Skip => {
            tracing::debug!(path = key, state = ?file.watched, "already tracked by Shoko");
            Ok(false)
        }
        RelayDecision::Unmatched => Err(anyhow!("tracked file has no series episodes")),
        RelayDecision::Relay(episode_ids) => {
            report.relaying(key, &episode.display_title());
            for &episode_id in episode_ids {
                shoko.mark_watched(api_key, episode_id)?;
            }
            Ok(true)
        }
    }
}
