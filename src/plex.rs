use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::app::{Account, Episode, MediaLibrary, MediaServer, RelativeWindow, Section};
use crate::config::PlexCredentials;
use crate::http::{default_agent, read_json, read_text};

const PLEX_TV_URL: &str = "https://plex.tv";
const PRODUCT: &str = "Shoko Watched Sync";
const EPISODE_TYPE: &str = "4";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlexUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    title: Option<String>,
    auth_token: String,
}

impl PlexUser {
    fn into_account(self) -> Account {
        let name = [self.title, self.username]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "unnamed".to_string());
        Account {
            name,
            token: self.auth_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HomeUsers {
    #[serde(default)]
    users: Vec<HomeUser>,
}

#[derive(Debug, Deserialize)]
struct HomeUser {
    uuid: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl HomeUser {
    fn answers_to(&self, wanted: &str) -> bool {
        [self.username.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .any(|name| name.eq_ignore_ascii_case(wanted.trim()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
    name: String,
    #[serde(default)]
    provides: String,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    connections: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct Container<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct SectionList {
    #[serde(rename = "Directory", default)]
    directories: Vec<Directory>,
}

#[derive(Debug, Deserialize)]
struct Directory {
    key: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct MetadataList {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(default)]
    title: String,
    #[serde(default)]
    grandparent_title: Option<String>,
    #[serde(rename = "Media", default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(rename = "Part", default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    file: Option<String>,
}

impl Metadata {
    fn into_episode(self) -> Episode {
        let file_paths = self
            .media
            .into_iter()
            .flat_map(|media| media.parts)
            .filter_map(|part| part.file)
            .filter(|file| !file.is_empty())
            .collect();
        Episode {
            title: self.title,
            show_title: self.grandparent_title,
            file_paths,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlexClient {
    agent: ureq::Agent,
    plex_tv_url: String,
    client_identifier: String,
}

impl PlexClient {
    pub fn new(client_identifier: &str) -> Self {
        Self::with_base_url(PLEX_TV_URL, client_identifier)
    }

    pub fn with_base_url(plex_tv_url: &str, client_identifier: &str) -> Self {
        Self {
            agent: default_agent(),
            plex_tv_url: plex_tv_url.trim_end_matches('/').to_string(),
            client_identifier: client_identifier.to_string(),
        }
    }

    fn request(&self, method: &str, path: &str, token: Option<&str>) -> ureq::Request {
        let request = self
            .agent
            .request(method, &format!("{}{path}", self.plex_tv_url))
            .set("Accept", "application/json")
            .set("X-Plex-Product", PRODUCT)
            .set("X-Plex-Client-Identifier", &self.client_identifier);
        match token {
            Some(token) => request.set("X-Plex-Token", token),
            None => request,
        }
    }

    fn server(&self, base_url: &str, token: &str) -> PlexServer {
        PlexServer {
            agent: self.agent.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client_identifier: self.client_identifier.clone(),
        }
    }
}

impl MediaServer for PlexClient {
    type Library = PlexServer;

    fn sign_in(&self, credentials: &PlexCredentials) -> Result<Account> {
        let user: PlexUser = match credentials {
            PlexCredentials::Token(token) => {
                tracing::debug!("signing in to plex.tv with token");
                read_json(self.request("GET", "/api/v2/user", Some(token.expose())).call())
                    .context("plex.tv rejected the token")?
            }
            PlexCredentials::Password { username, password } => {
                tracing::debug!(username = %username, "signing in to plex.tv with password");
                read_json(
                    self.request("POST", "/api/v2/users/signin", None)
                        .send_form(&[("login", username.as_str()), ("password", password.expose())]),
                )
                .context("plex.tv rejected the username/password")?
            }
        };
        Ok(user.into_account())
    }

    fn switch_user(&self, admin: &Account, username: &str) -> Result<Account> {
        let home: HomeUsers =
            read_json(self.request("GET", "/api/v2/home/users", Some(&admin.token)).call())
                .context("failed to list Plex Home users")?;
        let user = home
            .users
            .into_iter()
            .find(|user| user.answers_to(username))
            .ok_or_else(|| anyhow!("no Plex Home user named {username}"))?;

        tracing::debug!(username, uuid = %user.uuid, "switching to Plex Home user");
        let switched: PlexUser = read_json(
            self.request(
                "POST",
                &format!("/api/v2/home/users/{}/switch", user.uuid),
                Some(&admin.token),
            )
            .call(),
        )
        .with_context(|| format!("failed to switch to Plex Home user {username}"))?;
        Ok(switched.into_account())
    }

    fn connect(&self, account: &Account, server_name: &str) -> Result<PlexServer> {
        let resources: Vec<Resource> = read_json(
            self.request("GET", "/api/v2/resources", Some(&account.token))
                .query("includeHttps", "1")
                .query("includeRelay", "1")
                .call(),
        )
        .context("failed to list Plex resources")?;

        let resource = resources
            .into_iter()
            .find(|resource| {
                resource.name == server_name
                    && resource.provides.split(',').any(|role| role == "server")
            })
            .ok_or_else(|| anyhow!("{} has no server named {server_name}", account.name))?;
        let token = resource.access_token.as_deref().unwrap_or(&account.token);

        let mut last_error = None;
        for connection in &resource.connections {
            let server = self.server(&connection.uri, token);
            match server.identity() {
                Ok(()) => {
                    tracing::debug!(uri = %connection.uri, server_name, "connected to Plex server");
                    return Ok(server);
                }
                Err(err) => {
                    tracing::debug!(uri = %connection.uri, error = %err, "Plex connection failed");
                    last_error = Some(err);
                }
            }
        }
        match last_error {
            Some(err) => Err(err.context(format!("no reachable connection for {server_name}"))),
            None => bail!("{server_name} advertises no connections"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlexServer {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    client_identifier: String,
}

impl PlexServer {
    fn get(&self, path: &str) -> ureq::Request {
        self.agent
            .get(&format!("{}{path}", self.base_url))
            .set("Accept", "application/json")
            .set("X-Plex-Product", PRODUCT)
            .set("X-Plex-Client-Identifier", &self.client_identifier)
            .set("X-Plex-Token", &self.token)
    }

    fn identity(&self) -> Result<()> {
        read_text(self.get("/identity").call())?;
        Ok(())
    }
}

impl MediaLibrary for PlexServer {
    fn section(&self, name: &str) -> Result<Section> {
        let sections: Container<SectionList> = read_json(self.get("/library/sections").call())
            .context("failed to list library sections")?;
        sections
            .media_container
            .directories
            .into_iter()
            .find(|directory| directory.title.eq_ignore_ascii_case(name.trim()))
            .map(|directory| Section {
                key: directory.key,
                title: directory.title,
            })
            .ok_or_else(|| anyhow!("library section {name} not found"))
    }

    fn watched_episodes(
        &self,
        section: &Section,
        window: Option<&RelativeWindow>,
    ) -> Result<Vec<Episode>> {
        let mut request = self
            .get(&format!("/library/sections/{}/all", section.key))
            .query("type", EPISODE_TYPE)
            .query("viewCount>>", "0");
        if let Some(window) = window {
            request = request.query("lastViewedAt>>", &window.plex_filter_value());
        }

        let listing: Container<MetadataList> = read_json(request.call())
            .with_context(|| format!("failed to search episodes in {}", section.title))?;
        Ok(listing
            .media_container
            .metadata
            .into_iter()
            .map(Metadata::into_episode)
            .collect())
    }
}
