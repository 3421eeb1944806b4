use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;

use crate::{download::ArtifactDownloader, github::GitHub, http::HttpClient, runtime::Runtime};

const USER_AGENT: &str = concat!("ybm-tap/", env!("YBM_TAP_VERSION"));

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub downloader: ArtifactDownloader<GitHub>,
    pub bin_dir: PathBuf,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, bin_dir: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let token = github_token(&runtime);
        let headers = match &token {
            Some(token) => auth_headers(token)?,
            None => HeaderMap::new(),
        };

        let http_client = HttpClient::new(build_client(headers)?);
        let github = GitHub::new(http_client.clone(), api_url);
        let downloader = ArtifactDownloader::new(http_client, github, token.is_some());

        let bin_dir = match bin_dir {
            Some(dir) => dir,
            None => default_bin_dir(&runtime)?,
        };
        debug!("Installing into {:?}", bin_dir);

        Ok(Self {
            runtime,
            downloader,
            bin_dir,
        })
    }
}

/// GitHub client for release lookups only.
///
/// Needs no bin directory, and an unusable `GITHUB_TOKEN` falls back to
/// anonymous requests.
pub fn github_client<R: Runtime>(runtime: &R, api_url: Option<String>) -> Result<GitHub> {
    let headers = match github_token(runtime) {
        Some(token) => auth_headers(&token).unwrap_or_else(|e| {
            debug!("Ignoring GITHUB_TOKEN: {:#}", e);
            HeaderMap::new()
        }),
        None => HeaderMap::new(),
    };
    Ok(GitHub::new(HttpClient::new(build_client(headers)?), api_url))
}

fn github_token<R: Runtime>(runtime: &R) -> Option<String> {
    runtime
        .env_var("GITHUB_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn auth_headers(token: &str) -> Result<HeaderMap> {
    let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
        .context("GITHUB_TOKEN is not a valid header value")?;
    auth_value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth_value);
    debug!("Using GITHUB_TOKEN for authentication: {}", mask_token(token));
    Ok(headers)
}

fn build_client(headers: HeaderMap) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?)
}

/// `/usr/local/bin` when privileged, otherwise `~/.local/bin`
pub fn default_bin_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    #[cfg(unix)]
    if runtime.is_privileged() {
        return Ok(PathBuf::from("/usr/local/bin"));
    }

    runtime
        .home_dir()
        .map(|home| home.join(".local").join("bin"))
        .context("Could not determine home directory; pass --bin-dir")
}

/// Keep only the ends of a token for log output
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
