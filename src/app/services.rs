use std::fmt;

use anyhow::Result;

use super::window::RelativeWindow;
use crate::config::PlexCredentials;

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Account {
    pub(crate) name: String,
    pub(crate) token: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section {
    pub(crate) key: String,
    pub(crate) title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Episode {
    pub(crate) title: String,
    pub(crate) show_title: Option<String>,
    pub(crate) file_paths: Vec<String>,
}

impl Episode {
    pub(crate) fn display_title(&self) -> String {
        match self.show_title.as_deref() {
            Some(show) if !show.is_empty() => format!("{show} - {}", self.title),
            _ => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum WatchedState {
    Watched,
    Unwatched,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeriesGroup {
    pub(crate) episode_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedFile {
    pub(crate) watched: WatchedState,
    pub(crate) series: Vec<SeriesGroup>,
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct ApiKey(pub(crate) String);

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

pub(crate) trait MediaServer {
    type Library: MediaLibrary;

    fn sign_in(&self, credentials: &PlexCredentials) -> Result<Account>;

    fn switch_user(&self, admin: &Account, username: &str) -> Result<Account>;

    fn connect(&self, account: &Account, server_name: &str) -> Result<Self::Library>;
}

pub(crate) trait MediaLibrary {
    fn section(&self, name: &str) -> Result<Section>;

    fn watched_episodes(
        &self,
        section: &Section,
        window: Option<&RelativeWindow>,
    ) -> Result<Vec<Episode>>;
}

pub(crate) trait TrackingServer {
    fn authenticate(&self) -> Result<ApiKey>;

    fn find_by_path_suffix(
        &self,
        api_key: &ApiKey,
        suffix_key: &str,
    ) -> Result<Option<TrackedFile>>;

    fn mark_watched(&self, api_key: &ApiKey, episode_id: u64) -> Result<()>;
}
