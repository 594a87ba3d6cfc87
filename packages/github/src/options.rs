//! Connection options for the GitHub backend.
//!
//! Options are given once, then changed by merging a [`GithubOptionsPatch`]:
//! fields present in the patch replace the current ones, absent fields are
//! kept.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Where the collections live and how to reach them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubOptions {
    /// Personal access token sent as a bearer token.
    pub token: String,

    /// Account that owns the repository.
    #[serde(alias = "username")]
    pub owner: String,

    /// Repository name.
    #[serde(alias = "repo")]
    pub repository: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Root of the REST API. Overridden for GitHub Enterprise and tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout, applied when the HTTP client is built.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GithubOptions {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repository: repository.into(),
            branch: default_branch(),
            api_base: default_api_base(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self.normalized()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Overlay the fields set in `patch`.
    pub fn merge(&mut self, patch: GithubOptionsPatch) {
        if let Some(token) = patch.token {
            self.token = token;
        }
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
        if let Some(repository) = patch.repository {
            self.repository = repository;
        }
        if let Some(branch) = patch.branch {
            self.branch = branch;
        }
        if let Some(api_base) = patch.api_base {
            self.api_base = api_base;
        }
        if let Some(timeout_secs) = patch.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if self.branch.is_empty() {
            self.branch = default_branch();
        }
    }

    /// Check that the options can address a repository at all.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.owner.is_empty() {
            return Err(crate::Error::InvalidOptions {
                message: "owner is empty".to_string(),
            });
        }
        if self.repository.is_empty() {
            return Err(crate::Error::InvalidOptions {
                message: "repository is empty".to_string(),
            });
        }
        url::Url::parse(&self.api_base)?;
        Ok(())
    }

    fn normalized(mut self) -> Self {
        if self.branch.is_empty() {
            self.branch = default_branch();
        }
        self
    }
}

// The token stays out of logs.
impl std::fmt::Debug for GithubOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubOptions")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A partial update to [`GithubOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubOptionsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, alias = "username", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, alias = "repo", skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl GithubOptionsPatch {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }
}
