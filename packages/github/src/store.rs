//! [`RemoteFileStore`] over the GitHub REST API.

use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use repodb_remote_store::{RemoteFile, RemoteFileStore, Revision, StoreError};

use crate::api::{encode_content, CommitResponse, ContentEntry, FileContent};
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::options::{GithubOptions, GithubOptionsPatch};
use crate::types::{HttpRequest, HttpResponse};

const USER_AGENT: &str = concat!("repodb/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// A repository on GitHub, seen as a flat set of files.
///
/// The blob SHA of each file is its [`Revision`]. Options can be changed
/// after construction with [`GithubStore::update_options`]; a new timeout is
/// pushed down to the executor.
pub struct GithubStore<E = ReqwestExecutor> {
    options: RwLock<GithubOptions>,
    executor: E,
}

impl GithubStore<ReqwestExecutor> {
    /// Create a store that talks to GitHub with reqwest.
    pub fn new(options: GithubOptions) -> Result<Self, crate::Error> {
        let executor = ReqwestExecutor::new(options.timeout())?;
        Self::with_executor(options, executor)
    }
}

impl<E: HttpExecutor> GithubStore<E> {
    /// Create a store that sends requests through `executor`.
    pub fn with_executor(options: GithubOptions, executor: E) -> Result<Self, crate::Error> {
        options.validate()?;
        Ok(Self {
            options: RwLock::new(options),
            executor,
        })
    }

    /// A snapshot of the current options.
    pub fn options(&self) -> GithubOptions {
        self.options.read().unwrap().clone()
    }

    /// Merge `patch` into the current options.
    ///
    /// A changed timeout is applied to the executor before the merge is
    /// committed. Leaves the options untouched if the merged result is
    /// invalid or the executor rejects the timeout.
    pub fn update_options(&self, patch: GithubOptionsPatch) -> Result<(), crate::Error> {
        let mut options = self.options.write().unwrap();
        let mut merged = options.clone();
        merged.merge(patch);
        merged.validate()?;
        if merged.timeout_secs != options.timeout_secs {
            self.executor.set_timeout(merged.timeout())?;
            tracing::debug!(timeout_secs = merged.timeout_secs, "applied new request timeout");
        }
        *options = merged;
        Ok(())
    }

    fn repo_url(&self) -> String {
        let options = self.options.read().unwrap();
        format!(
            "{}/repos/{}/{}",
            options.api_base.trim_end_matches('/'),
            options.owner,
            options.repository
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), path.trim_start_matches('/'))
    }

    fn user_repos_url(&self) -> String {
        let options = self.options.read().unwrap();
        format!("{}/user/repos", options.api_base.trim_end_matches('/'))
    }

    fn branch(&self) -> String {
        self.options.read().unwrap().branch.clone()
    }

    fn repository(&self) -> String {
        self.options.read().unwrap().repository.clone()
    }

    /// Attach the headers every API call needs.
    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        let token = self.options.read().unwrap().token.clone();
        let request = request
            .with_header("Accept", ACCEPT)
            .with_header("User-Agent", USER_AGENT)
            .with_header("X-GitHub-Api-Version", API_VERSION);
        if token.is_empty() {
            request
        } else {
            request.with_header("Authorization", format!("Bearer {}", token))
        }
    }

    async fn send(&self, request: HttpRequest, target: &str) -> Result<HttpResponse, StoreError> {
        let request = self.authorize(request);
        tracing::debug!(method = %request.method, url = %request.url, "github request");
        let response = self
            .executor
            .execute(&request)
            .await
            .map_err(|e| StoreError::Transport(format!("{} [{}]: {}", request.method, target, e)))?;
        tracing::debug!(status = response.status, url = %request.url, "github response");
        Ok(response)
    }

    async fn get_contents(&self, path: &str) -> Result<HttpResponse, StoreError> {
        let request = HttpRequest::get(self.contents_url(path)).with_query("ref", self.branch());
        self.send(request, path).await
    }

    fn parse_file(path: &str, response: &HttpResponse) -> Result<FileContent, StoreError> {
        response.json::<FileContent>().map_err(|e| StoreError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Map a non-success response onto the store error taxonomy.
fn failure(action: &str, target: &str, response: &HttpResponse) -> StoreError {
    let detail = response.error_message();
    match response.status {
        401 | 403 => StoreError::Unauthorized {
            message: format!("Cannot {} [{}]: {}", action, target, detail),
        },
        404 => StoreError::not_found(target),
        status => StoreError::Protocol {
            status,
            message: format!("Cannot {} [{}]: {}", action, target, detail),
        },
    }
}

/// Like [`failure`], for calls that carry a revision: a stale or missing SHA
/// comes back as 409 or 422.
fn revision_failure(action: &str, target: &str, response: &HttpResponse) -> StoreError {
    match response.status {
        409 | 422 => StoreError::conflict(target),
        _ => failure(action, target, response),
    }
}

fn committed_revision(path: &str, response: &HttpResponse) -> Result<Revision, StoreError> {
    let commit: CommitResponse = response.json().map_err(|e| StoreError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    commit
        .content
        .map(|file| Revision::new(file.sha))
        .ok_or_else(|| StoreError::Decode {
            path: path.to_string(),
            message: "response carries no content sha".to_string(),
        })
}

#[async_trait]
impl<E: HttpExecutor> RemoteFileStore for GithubStore<E> {
    async fn repository_exists(&self) -> Result<bool, StoreError> {
        let repository = self.repository();
        let response = self
            .send(HttpRequest::get(self.repo_url()), &repository)
            .await?;
        match response.status {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(failure("check repository existence", &repository, &response)),
        }
    }

    async fn create_repository(&self, private: bool) -> Result<(), StoreError> {
        let repository = self.repository();
        let request = HttpRequest::post(self.user_repos_url())
            .with_json_body(json!({ "name": repository, "private": private }));
        let response = self.send(request, &repository).await?;
        match response.status {
            201 => {
                tracing::info!(repository = %repository, private, "created repository");
                Ok(())
            }
            _ => Err(failure("create the repository", &repository, &response)),
        }
    }

    async fn delete_repository(&self) -> Result<(), StoreError> {
        let repository = self.repository();
        let response = self
            .send(HttpRequest::delete(self.repo_url()), &repository)
            .await?;
        match response.status {
            204 => {
                tracing::info!(repository = %repository, "deleted repository");
                Ok(())
            }
            _ => Err(failure("delete the repository", &repository, &response)),
        }
    }

    async fn list_paths(&self) -> Result<Vec<String>, StoreError> {
        let repository = self.repository();
        let response = self.get_contents("").await?;
        match response.status {
            200 => {
                let entries: Vec<ContentEntry> =
                    response.json().map_err(|e| StoreError::Decode {
                        path: repository.clone(),
                        message: e.to_string(),
                    })?;
                Ok(entries
                    .into_iter()
                    .filter(ContentEntry::is_file)
                    .map(|entry| entry.path)
                    .collect())
            }
            // Empty repositories have no contents at all
            404 => Ok(Vec::new()),
            _ => Err(failure("list the repository files", &repository, &response)),
        }
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StoreError> {
        let response = self.get_contents(path).await?;
        match response.status {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(failure("check file existence", path, &response)),
        }
    }

    async fn read_revision(&self, path: &str) -> Result<Revision, StoreError> {
        let response = self.get_contents(path).await?;
        if !response.is_success() {
            return Err(failure("get the file sha", path, &response));
        }
        let file = Self::parse_file(path, &response)?;
        Ok(Revision::new(file.sha))
    }

    async fn read_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        let response = self.get_contents(path).await?;
        match response.status {
            200 => {
                let file = Self::parse_file(path, &response)?;
                let content = file.decode().map_err(|message| StoreError::Decode {
                    path: path.to_string(),
                    message,
                })?;
                Ok(Some(RemoteFile {
                    content,
                    revision: Revision::new(file.sha),
                }))
            }
            404 => Ok(None),
            _ => Err(failure("get the file", path, &response)),
        }
    }

    async fn create_file(
        &self,
        path: &str,
        content: Bytes,
        message: Option<&str>,
    ) -> Result<Revision, StoreError> {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("created file [{}]", path));
        let request = HttpRequest::put(self.contents_url(path)).with_json_body(json!({
            "message": message,
            "content": encode_content(&content),
            "branch": self.branch(),
        }));
        let response = self.send(request, path).await?;
        match response.status {
            200 | 201 => {
                let revision = committed_revision(path, &response)?;
                tracing::info!(path, revision = %revision, "created file");
                Ok(revision)
            }
            _ => Err(revision_failure("create file", path, &response)),
        }
    }

    async fn update_file(
        &self,
        path: &str,
        content: Bytes,
        revision: Option<&Revision>,
        message: Option<&str>,
    ) -> Result<Revision, StoreError> {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("updated file [{}]", path));
        let mut body = json!({
            "message": message,
            "content": encode_content(&content),
            "branch": self.branch(),
        });
        if let Some(revision) = revision {
            body["sha"] = json!(revision.as_str());
        }
        let request = HttpRequest::put(self.contents_url(path)).with_json_body(body);
        let response = self.send(request, path).await?;
        if !response.is_success() {
            return Err(revision_failure("update file", path, &response));
        }
        let revision = committed_revision(path, &response)?;
        tracing::info!(path, revision = %revision, "updated file");
        Ok(revision)
    }

    async fn delete_file(
        &self,
        path: &str,
        revision: Option<&Revision>,
        message: Option<&str>,
    ) -> Result<(), StoreError> {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("deleted file [{}]", path));
        let mut body = json!({
            "message": message,
            "branch": self.branch(),
        });
        if let Some(revision) = revision {
            body["sha"] = json!(revision.as_str());
        }
        let request = HttpRequest::delete(self.contents_url(path)).with_json_body(body);
        let response = self.send(request, path).await?;
        if !response.is_success() {
            return Err(revision_failure("delete file", path, &response));
        }
        tracing::info!(path, "deleted file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::MockExecutor;
    use crate::types::Method;
    use std::time::Duration;

    const CONTENTS: &str = "/repos/octocat/db/contents/users.json";

    fn store(executor: MockExecutor) -> GithubStore<MockExecutor> {
        GithubStore::with_executor(GithubOptions::new("token", "octocat", "db"), executor).unwrap()
    }

    fn file_response(sha: &str, content: &[u8]) -> HttpResponse {
        MockExecutor::success_response(json!({
            "type": "file",
            "path": "users.json",
            "sha": sha,
            "encoding": "base64",
            "content": encode_content(content),
        }))
    }

    fn commit_response(status: u16, sha: &str) -> HttpResponse {
        HttpResponse::with_status(status, json!({ "content": { "sha": sha }, "commit": {} }))
    }

    #[tokio::test]
    async fn requests_carry_auth_and_branch() {
        let executor = MockExecutor::new().with_response(Method::GET, CONTENTS, file_response("abc", b"[]"));
        let store = store(executor.clone());

        store.file_exists("users.json").await.unwrap();

        let request = &executor.recorded_requests()[0];
        assert_eq!(request.url, "https://api.github.com/repos/octocat/db/contents/users.json");
        assert_eq!(request.headers["Authorization"], "Bearer token");
        assert_eq!(request.headers["Accept"], ACCEPT);
        assert!(request.headers["User-Agent"].starts_with("repodb/"));
        assert_eq!(request.query["ref"], "main");
    }

    #[tokio::test]
    async fn read_file_returns_content_and_sha_from_one_request() {
        let executor = MockExecutor::new().with_response(
            Method::GET,
            CONTENTS,
            file_response("abc", br#"[{"name":"Bob"}]"#),
        );
        let store = store(executor.clone());

        let file = store.read_file("users.json").await.unwrap().unwrap();

        assert_eq!(file.revision, Revision::from("abc"));
        assert_eq!(file.content, Bytes::from_static(br#"[{"name":"Bob"}]"#));
        assert_eq!(executor.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn read_missing_file_is_none() {
        let store = store(MockExecutor::new());
        assert!(store.read_file("users.json").await.unwrap().is_none());
        assert!(!store.file_exists("users.json").await.unwrap());
        assert!(matches!(
            store.read_revision("users.json").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_sends_sha_and_base64_content() {
        let executor = MockExecutor::new().with_response(Method::PUT, CONTENTS, commit_response(200, "def"));
        let store = store(executor.clone());

        let revision = store
            .update_file(
                "users.json",
                Bytes::from_static(b"[]"),
                Some(&Revision::from("abc")),
                None,
            )
            .await
            .unwrap();

        assert_eq!(revision, Revision::from("def"));
        let body = executor.recorded_requests()[0].body.clone().unwrap();
        assert_eq!(body["sha"], "abc");
        assert_eq!(body["content"], "W10=");
        assert_eq!(body["branch"], "main");
        assert_eq!(body["message"], "updated file [users.json]");
    }

    #[tokio::test]
    async fn update_conflict_statuses_map_to_conflict() {
        for status in [409, 422] {
            let executor = MockExecutor::new().with_response(
                Method::PUT,
                CONTENTS,
                MockExecutor::error_response(status, "users.json does not match"),
            );
            let store = store(executor);

            let result = store
                .update_file("users.json", Bytes::from_static(b"[]"), Some(&Revision::from("old")), None)
                .await;

            assert!(matches!(result, Err(StoreError::Conflict { .. })), "status {}", status);
        }
    }

    #[tokio::test]
    async fn create_uses_default_message_and_no_sha() {
        let executor = MockExecutor::new().with_response(Method::PUT, CONTENTS, commit_response(201, "new"));
        let store = store(executor.clone());

        let revision = store
            .create_file("users.json", Bytes::from_static(b"[]"), None)
            .await
            .unwrap();

        assert_eq!(revision, Revision::from("new"));
        let body = executor.recorded_requests()[0].body.clone().unwrap();
        assert_eq!(body["message"], "created file [users.json]");
        assert!(body.get("sha").is_none());
    }

    #[tokio::test]
    async fn delete_uses_custom_message() {
        let executor = MockExecutor::new().with_response(
            Method::DELETE,
            CONTENTS,
            MockExecutor::success_response(json!({ "content": null, "commit": {} })),
        );
        let store = store(executor.clone());

        store
            .delete_file("users.json", Some(&Revision::from("abc")), Some("drop users"))
            .await
            .unwrap();

        let body = executor.recorded_requests()[0].body.clone().unwrap();
        assert_eq!(body["message"], "drop users");
        assert_eq!(body["sha"], "abc");
    }

    #[tokio::test]
    async fn delete_missing_file_is_not_found() {
        let store = store(MockExecutor::new());
        let result = store
            .delete_file("users.json", Some(&Revision::from("abc")), None)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_paths_keeps_files_only() {
        let executor = MockExecutor::new().with_response(
            Method::GET,
            "/repos/octocat/db/contents/",
            MockExecutor::success_response(json!([
                { "path": "a.json", "type": "file" },
                { "path": "b.txt", "type": "file" },
                { "path": "nested", "type": "dir" },
            ])),
        );
        let store = store(executor);

        assert_eq!(store.list_paths().await.unwrap(), vec!["a.json", "b.txt"]);
    }

    #[tokio::test]
    async fn list_paths_of_empty_repository_is_empty() {
        let store = store(MockExecutor::new());
        assert!(store.list_paths().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repository_lifecycle_statuses() {
        let executor = MockExecutor::new()
            .with_response(Method::POST, "/user/repos", HttpResponse::with_status(201, json!({})))
            .with_response(Method::DELETE, "/repos/octocat/db", HttpResponse::with_status(204, serde_json::Value::Null));
        let store = store(executor.clone());

        assert!(!store.repository_exists().await.unwrap());
        store.create_repository(true).await.unwrap();
        store.delete_repository().await.unwrap();

        let create = &executor.recorded_requests()[1];
        assert_eq!(create.body, Some(json!({ "name": "db", "private": true })));
    }

    #[tokio::test]
    async fn unauthorized_and_server_errors_are_distinct() {
        let executor = MockExecutor::new()
            .with_response(Method::GET, "/repos/octocat/db", MockExecutor::error_response(401, "Bad credentials"))
            .with_response(Method::POST, "/user/repos", MockExecutor::error_response(500, "boom"));
        let store = store(executor);

        match store.repository_exists().await {
            Err(StoreError::Unauthorized { message }) => assert!(message.contains("Bad credentials")),
            other => panic!("expected unauthorized, got {:?}", other),
        }
        match store.create_repository(true).await {
            Err(StoreError::Protocol { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("Cannot create the repository [db]: boom"));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transport_failures_are_reported() {
        let store = store(MockExecutor::new().fail_with("connection refused"));
        match store.file_exists("users.json").await {
            Err(StoreError::Transport(message)) => {
                assert!(message.contains("users.json"));
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_options_merges_and_validates() {
        let store = store(MockExecutor::new());

        store
            .update_options(GithubOptionsPatch::default().branch("dev"))
            .unwrap();
        assert_eq!(store.options().branch, "dev");
        assert_eq!(store.options().owner, "octocat");

        let result = store.update_options(GithubOptionsPatch::default().owner(""));
        assert!(result.is_err());
        assert_eq!(store.options().owner, "octocat");
    }

    #[tokio::test]
    async fn update_options_applies_timeout_to_executor() {
        let executor = MockExecutor::new();
        let store = store(executor.clone());

        store
            .update_options(GithubOptionsPatch::default().branch("dev"))
            .unwrap();
        assert!(executor.timeouts().is_empty());

        store
            .update_options(GithubOptionsPatch::default().timeout(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(executor.timeouts(), vec![Duration::from_secs(5)]);
        assert_eq!(store.options().timeout(), Duration::from_secs(5));

        // A rejected merge applies nothing.
        let result = store.update_options(
            GithubOptionsPatch::default()
                .timeout(Duration::from_secs(9))
                .repository(""),
        );
        assert!(result.is_err());
        assert_eq!(executor.timeouts(), vec![Duration::from_secs(5)]);
    }
}
