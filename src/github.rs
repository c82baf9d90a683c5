//! GitHub REST v3 client implementing the [`RemoteRepo`] capability.
//!
//! File reads and single-file writes go through the contents endpoints,
//! which carry base64 content on the wire. The batch path talks to the
//! Git-data endpoints directly so a whole submission lands as one commit on
//! `main`: read the branch ref, read that commit's tree, create a tree on
//! top of it, create a commit, fast-forward the ref. A failure at any step
//! abandons the sequence; objects created so far are unreachable garbage
//! and the branch is left untouched.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::contract::{
    FileChange, NewRepository, PutFile, RemoteRepo, RepoCredentials, RepoFile, RepoInfo,
};
use crate::error::RepoError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT_HEADER: &str = "leethub";
const FILE_MODE: &str = "100644";
const FILE_TYPE: &str = "blob";

/// Base64-encode file content for the contents endpoints.
pub fn encode_content(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

/// Decode base64 content as returned by the contents endpoints, which wrap
/// the payload in newlines.
pub fn decode_content(raw: &str) -> Result<String, RepoError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| RepoError::Malformed(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes).map_err(|e| RepoError::Malformed(format!("content is not UTF-8: {e}")))
}

fn tree_entries(files: &[FileChange]) -> Value {
    Value::Array(
        files
            .iter()
            .map(|file| {
                json!({
                    "path": file.path,
                    "content": file.content,
                    "mode": FILE_MODE,
                    "type": FILE_TYPE,
                })
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct ContentsPayload {
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutPayload {
    content: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct RefPayload {
    object: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    tree: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

pub struct GitHubClient {
    http: Client,
    api_url: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    pub fn new() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }

    /// Point the client at a different API root, e.g. a GitHub Enterprise
    /// instance.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let mut api_url = api_url.into();
        while api_url.ends_with('/') {
            api_url.pop();
        }
        Self {
            http: Client::new(),
            api_url,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        creds: &RepoCredentials,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<T, RepoError> {
        debug!(method = %method, url, "remote call");
        let mut request = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", creds.token))
            .header(ACCEPT, ACCEPT_HEADER)
            .header(USER_AGENT, USER_AGENT_HEADER);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::Status {
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| RepoError::Malformed(e.to_string()))
    }

    fn contents_url(&self, creds: &RepoCredentials, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_url, creds.hook, path)
    }

    fn ref_url(&self, creds: &RepoCredentials) -> String {
        format!("{}/repos/{}/git/refs/heads/main", self.api_url, creds.hook)
    }
}

#[async_trait]
impl RemoteRepo for GitHubClient {
    async fn get_file(&self, creds: &RepoCredentials, path: &str) -> Result<RepoFile, RepoError> {
        let url = self.contents_url(creds, path);
        let payload: ContentsPayload = self
            .call(creds, Method::GET, &url, None)
            .await
            .map_err(|err| match err {
                RepoError::Status {
                    status: status @ 404,
                } => {
                    debug!(path, status, "file not present in repository");
                    RepoError::NotFound {
                        path: path.to_owned(),
                    }
                }
                other => other,
            })?;
        Ok(RepoFile {
            text: decode_content(&payload.content)?,
            sha: payload.sha,
        })
    }

    async fn put_file<'a>(
        &self,
        creds: &RepoCredentials,
        req: PutFile<'a>,
    ) -> Result<String, RepoError> {
        let url = self.contents_url(creds, req.path);
        let mut body = json!({
            "message": req.message,
            "content": encode_content(req.content),
        });
        if let Some(sha) = req.sha {
            body["sha"] = json!(sha);
        }
        let payload: PutPayload = self.call(creds, Method::PUT, &url, Some(body)).await?;
        info!(path = req.path, "wrote repository file");
        Ok(payload.content.sha)
    }

    async fn commit_batch(
        &self,
        creds: &RepoCredentials,
        files: &[FileChange],
        message: &str,
    ) -> Result<String, RepoError> {
        let ref_url = self.ref_url(creds);
        info!(files = files.len(), repo = %creds.hook, "starting batch commit");

        // Step 1: sha of the last commit on main.
        let current: RefPayload = self.call(creds, Method::GET, &ref_url, None).await?;
        let parent_sha = current.object.sha;

        // Step 2: sha of that commit's root tree.
        let commit_url = format!(
            "{}/repos/{}/git/commits/{}",
            self.api_url, creds.hook, parent_sha
        );
        let parent_commit: CommitPayload = self.call(creds, Method::GET, &commit_url, None).await?;

        // Step 3: a new tree layered on top of it, one entry per file.
        let trees_url = format!("{}/repos/{}/git/trees", self.api_url, creds.hook);
        let tree: ShaOnly = self
            .call(
                creds,
                Method::POST,
                &trees_url,
                Some(json!({
                    "base_tree": parent_commit.tree.sha,
                    "tree": tree_entries(files),
                })),
            )
            .await?;

        // Step 4: a commit pointing at the new tree.
        let commits_url = format!("{}/repos/{}/git/commits", self.api_url, creds.hook);
        let created: ShaOnly = self
            .call(
                creds,
                Method::POST,
                &commits_url,
                Some(json!({
                    "message": message,
                    "tree": tree.sha,
                    "parents": [parent_sha],
                })),
            )
            .await?;

        // Step 5: fast-forward main to the created commit.
        let _: Value = self
            .call(
                creds,
                Method::POST,
                &ref_url,
                Some(json!({ "sha": created.sha })),
            )
            .await?;

        info!(commit = %created.sha, "batch commit applied");
        Ok(created.sha)
    }

    async fn authenticated_user(&self, creds: &RepoCredentials) -> Result<String, RepoError> {
        let url = format!("{}/user", self.api_url);
        let payload: UserPayload = self.call(creds, Method::GET, &url, None).await?;
        Ok(payload.login)
    }

    async fn repository(
        &self,
        creds: &RepoCredentials,
        full_name: &str,
    ) -> Result<RepoInfo, RepoError> {
        let url = format!("{}/repos/{}", self.api_url, full_name);
        self.call(creds, Method::GET, &url, None).await
    }

    async fn create_repository<'a>(
        &self,
        creds: &RepoCredentials,
        req: NewRepository<'a>,
    ) -> Result<RepoInfo, RepoError> {
        let url = format!("{}/user/repos", self.api_url);
        let body = json!({
            "name": req.name,
            "private": true,
            "auto_init": true,
            "description": req.description,
        });
        let created: RepoInfo = self.call(creds, Method::POST, &url, Some(body)).await?;
        info!(repo = %created.full_name, "created repository");
        Ok(created)
    }
}
