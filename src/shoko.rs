use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::app::{
    ApiKey, SeriesGroup, TrackedFile, TrackingServer, WatchedState, path_matches_key,
};
use crate::config::{Secret, ShokoConfig};
use crate::http::{default_agent, read_json, read_text};

const DEVICE_NAME: &str = "Shoko Watched Sync";

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    user: &'a str,
    pass: &'a str,
    device: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    apikey: Option<String>,
    #[serde(default)]
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ShokoFile {
    #[serde(default, deserialize_with = "deserialize_watched")]
    watched: WatchedState,
    #[serde(rename = "SeriesIDs", default)]
    series_ids: Vec<SeriesIds>,
    #[serde(default)]
    locations: Vec<FileLocation>,
}

#[derive(Debug, Deserialize)]
struct SeriesIds {
    #[serde(rename = "EpisodeIDs", default)]
    episode_ids: Vec<EpisodeIds>,
}

#[derive(Debug, Deserialize)]
struct EpisodeIds {
    #[serde(rename = "ID")]
    id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileLocation {
    #[serde(default)]
    relative_path: String,
}

impl ShokoFile {
    fn matches(&self, suffix_key: &str) -> bool {
        self.locations.is_empty()
            || self
                .locations
                .iter()
                .any(|location| path_matches_key(&location.relative_path, suffix_key))
    }

    fn into_tracked(self) -> TrackedFile {
        TrackedFile {
            watched: self.watched,
            series: self
                .series_ids
                .into_iter()
                .map(|series| SeriesGroup {
                    episode_ids: series.episode_ids.into_iter().map(|episode| episode.id).collect(),
                })
                .collect(),
        }
    }
}

/// `null` means Shoko has no opinion yet; booleans and watch timestamps are
/// definite.
fn deserialize_watched<'de, D>(deserializer: D) -> Result<WatchedState, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(WatchedState::Unknown),
        Some(Value::Bool(true)) => Ok(WatchedState::Watched),
        Some(Value::Bool(false)) => Ok(WatchedState::Unwatched),
        Some(Value::String(stamp)) if !stamp.trim().is_empty() => Ok(WatchedState::Watched),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unexpected watched value {other}"
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct ShokoClient {
    agent: ureq::Agent,
    base_url: String,
    username: String,
    password: Secret,
}

impl ShokoClient {
    pub fn new(config: &ShokoConfig) -> Self {
        Self {
            agent: default_agent(),
            base_url: format!("http://{}:{}", config.hostname.trim(), config.port),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn is_credential_rejection(status: u16) -> bool {
    status == 400 || status == 401
}

impl TrackingServer for ShokoClient {
    fn authenticate(&self) -> Result<ApiKey> {
        let body = serde_json::to_string(&AuthRequest {
            user: &self.username,
            pass: self.password.expose(),
            device: DEVICE_NAME,
        })?;
        tracing::debug!(base_url = %self.base_url, "requesting Shoko API key");

        let result = self
            .agent
            .post(&self.url("/api/auth"))
            .set("Content-Type", "application/json")
            .send_string(&body);
        let response: AuthResponse = match read_json(result) {
            Ok(response) => response,
            Err(err) if err.status().is_some_and(is_credential_rejection) => {
                return Err(anyhow::Error::new(err).context("Shoko rejected the credentials"));
            }
            Err(err) if err.is_transport() => {
                return Err(anyhow::Error::new(err).context("unable to connect to Shoko Server"));
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Shoko auth request failed")),
        };

        if let Some(status) = response.status.filter(|status| is_credential_rejection(*status)) {
            bail!("Shoko rejected the credentials (status {status})");
        }
        let apikey = response
            .apikey
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("Shoko auth response had no apikey"))?;
        Ok(ApiKey(apikey))
    }

    fn find_by_path_suffix(
        &self,
        api_key: &ApiKey,
        suffix_key: &str,
    ) -> Result<Option<TrackedFile>> {
        tracing::debug!(path = suffix_key, "looking up Shoko file by path suffix");
        let files: Vec<ShokoFile> = read_json(
            self.agent
                .get(&self.url("/api/v3/File/PathEndsWith"))
                .set("apikey", &api_key.0)
                .query("path", suffix_key)
                .query("limit", "1")
                .call(),
        )
        .with_context(|| format!("Shoko lookup for {suffix_key} failed"))?;

        Ok(files
            .into_iter()
            .next()
            .filter(|file| file.matches(suffix_key))
            .map(ShokoFile::into_tracked))
    }

    fn mark_watched(&self, api_key: &ApiKey, episode_id: u64) -> Result<()> {
        tracing::debug!(episode_id, "marking Shoko episode watched");
        read_text(
            self.agent
                .post(&self.url(&format!("/api/v3/Episode/{episode_id}/Watched/true")))
                .set("apikey", &api_key.0)
                .call(),
        )
        .with_context(|| format!("failed to mark Shoko episode {episode_id} watched"))?;
        Ok(())
    }
}
