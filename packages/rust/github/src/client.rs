//! GitHub REST API implementation of [`SourceControl`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use takeaways_shared::{ChangeRequest, GitHubConfig, Result, TakeawaysError};

use crate::{FileWrite, NewChangeRequest, RemoteFile, SourceControl};

/// User-Agent string for API requests (GitHub rejects requests without one).
const USER_AGENT: &str = concat!("takeaways/", env!("CARGO_PKG_VERSION"));

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// Maximum characters of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubOptions {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl GitHubOptions {
    /// Options from config plus a resolved token.
    pub fn from_config(config: &GitHubConfig, token: String) -> Self {
        Self {
            api_base: config.api_base.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token,
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Client for one repository.
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    owner: String,
    repo: String,
    token: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GitHubClient {
    pub fn new(opts: GitHubOptions) -> Result<Self> {
        let api_base = Url::parse(&opts.api_base).map_err(|e| {
            TakeawaysError::config(format!("invalid GitHub api_base {}: {e}", opts.api_base))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(TakeawaysError::config(format!(
                "GitHub api_base {} cannot be used as a base URL",
                opts.api_base
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| TakeawaysError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            owner: opts.owner,
            repo: opts.repo,
            token: opts.token,
        })
    }

    /// `<api_base>/repos/<owner>/<repo>/<segments...>`, each segment escaped.
    fn repo_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str()])
                .extend(segments.iter().flat_map(|s| s.split('/')));
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| TakeawaysError::Network(format!("{what}: {e}")))
    }
}

/// Turn a non-success response into an `Http` error carrying the status.
async fn expect_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    Err(TakeawaysError::http(status.as_u16(), format!("{what}: {snippet}")))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| TakeawaysError::parse(format!("{what}: invalid response payload: {e}")))
}

fn decode_content(encoded: &str, path: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| TakeawaysError::parse(format!("{path}: invalid base64 content: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| TakeawaysError::parse(format!("{path}: content is not UTF-8: {e}")))
}

#[async_trait]
impl SourceControl for GitHubClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_file(&self, path: &str, git_ref: &str) -> Result<RemoteFile> {
        let mut url = self.repo_url(&["contents", path]);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = self.send(self.request(Method::GET, url), path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TakeawaysError::not_found(path));
        }
        let response = expect_success(response, path).await?;
        let file: ContentResponse = read_json(response, path).await?;

        if let Some(encoding) = file.encoding.as_deref().filter(|e| *e != "base64") {
            return Err(TakeawaysError::parse(format!(
                "{path}: unsupported content encoding {encoding}"
            )));
        }

        let content = decode_content(&file.content, path)?;
        debug!(sha = %file.sha, len = content.len(), "fetched file");

        Ok(RemoteFile {
            content,
            version: file.sha,
        })
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_ref(&self, branch: &str) -> Result<String> {
        let url = self.repo_url(&["git", "ref", "heads", branch]);
        let what = format!("ref heads/{branch}");
        let response = self.send(self.request(Method::GET, url), &what).await?;
        let response = expect_success(response, &what).await?;
        let reference: RefResponse = read_json(response, &what).await?;
        Ok(reference.object.sha)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn create_ref(&self, branch: &str, from_sha: &str) -> Result<()> {
        let url = self.repo_url(&["git", "refs"]);
        let body = serde_json::json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": from_sha,
        });
        let what = format!("create ref heads/{branch}");
        let response = self
            .send(self.request(Method::POST, url).json(&body), &what)
            .await?;
        expect_success(response, &what).await?;
        info!(branch, "created branch");
        Ok(())
    }

    #[instrument(skip_all, fields(repo = %self.repo, path = write.path, branch = write.branch))]
    async fn put_file(&self, write: &FileWrite<'_>) -> Result<()> {
        let url = self.repo_url(&["contents", write.path]);
        let body = serde_json::json!({
            "message": write.message,
            "content": STANDARD.encode(write.content.as_bytes()),
            "sha": write.expected_version,
            "branch": write.branch,
        });
        let response = self
            .send(self.request(Method::PUT, url).json(&body), write.path)
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(TakeawaysError::conflict(write.path));
        }
        expect_success(response, write.path).await?;
        info!("committed file");
        Ok(())
    }

    #[instrument(skip_all, fields(repo = %self.repo, branch = request.branch))]
    async fn open_change_request(&self, request: &NewChangeRequest<'_>) -> Result<ChangeRequest> {
        let url = self.repo_url(&["pulls"]);
        let body = serde_json::json!({
            "title": request.title,
            "body": request.body,
            "head": request.branch,
            "base": request.base,
        });
        let what = "open pull request";
        let response = self
            .send(self.request(Method::POST, url).json(&body), what)
            .await?;
        let response = expect_success(response, what).await?;
        let pull: PullResponse = read_json(response, what).await?;
        info!(number = pull.number, url = %pull.html_url, "opened pull request");
        Ok(ChangeRequest {
            number: pull.number,
            url: pull.html_url,
        })
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn close_change_request(&self, number: u64) -> Result<()> {
        let url = self.repo_url(&["pulls", &number.to_string()]);
        let what = format!("close pull request #{number}");
        let response = self
            .send(
                self.request(Method::PATCH, url)
                    .json(&serde_json::json!({ "state": "closed" })),
                &what,
            )
            .await?;
        expect_success(response, &what).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn delete_ref(&self, branch: &str) -> Result<()> {
        let url = self.repo_url(&["git", "refs", "heads", branch]);
        let what = format!("delete ref heads/{branch}");
        let response = self.send(self.request(Method::DELETE, url), &what).await?;
        expect_success(response, &what).await?;
        Ok(())
    }
}
