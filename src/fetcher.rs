//! Branch-fallback fetcher.
//!
//! The default branch of a plugin repository is unknown (`main` or `master`)
//! and so is the raw-content URL layout of its host. For a classified
//! repository and a file name we build an ordered candidate list and try
//! each one in turn; the first 2xx response wins.
//!
//! Candidate order:
//! - GitHub: `{raw_base}/{owner}/{name}/{branch}/{file}` for `main`, then `master`
//! - Generic: for each branch, `{base}/raw/{branch}/{file}` then
//!   `{base}/-/raw/{branch}/{file}` (GitLab layout)

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::repo::RepoRef;

/// Default raw-content host for GitHub repositories
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

/// Branches tried, in priority order
pub const BRANCHES: [&str; 2] = ["main", "master"];

/// Raw path layouts tried for generic hosts, in priority order
const GENERIC_RAW_LAYOUTS: [&str; 2] = ["raw", "-/raw"];

/// Network-level failure for a single candidate
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Status and body of a GET response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET-capable transport used by the fetcher
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        // Bodies of failed candidates are never used
        let body = if status.is_success() {
            response.text().await?
        } else {
            String::new()
        };

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// One (branch, URL) pair attempted during fallback resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCandidate {
    pub branch: &'static str,
    pub url: String,
}

/// Result of a fallback fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found {
        candidate: FetchCandidate,
        body: String,
    },
    NotFound,
}

impl FetchOutcome {
    pub fn into_body(self) -> Option<String> {
        match self {
            FetchOutcome::Found { body, .. } => Some(body),
            FetchOutcome::NotFound => None,
        }
    }
}

/// Build the ordered candidate list for `file_name` in `repo`.
pub fn candidates(repo: &RepoRef, file_name: &str, github_raw_base: &str) -> Vec<FetchCandidate> {
    match repo {
        RepoRef::GitHub { owner, name } => {
            let base = github_raw_base.trim_end_matches('/');
            BRANCHES
                .iter()
                .map(|&branch| FetchCandidate {
                    branch,
                    url: format!("{}/{}/{}/{}/{}", base, owner, name, branch, file_name),
                })
                .collect()
        }
        RepoRef::Generic { base_url } => BRANCHES
            .iter()
            .flat_map(|&branch| {
                GENERIC_RAW_LAYOUTS.iter().map(move |layout| FetchCandidate {
                    branch,
                    url: format!("{}/{}/{}/{}", base_url, layout, branch, file_name),
                })
            })
            .collect(),
    }
}

/// Sequential fallback fetcher over a shared transport
#[derive(Clone)]
pub struct BranchFetcher {
    transport: Arc<dyn Transport>,
    github_raw_base: String,
}

impl BranchFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            github_raw_base: GITHUB_RAW_BASE.to_string(),
        }
    }

    /// Override the GitHub raw-content host (mirrors, tests)
    pub fn with_github_raw_base(mut self, base: impl Into<String>) -> Self {
        self.github_raw_base = base.into();
        self
    }

    pub fn candidates(&self, repo: &RepoRef, file_name: &str) -> Vec<FetchCandidate> {
        candidates(repo, file_name, &self.github_raw_base)
    }

    /// Fetch `file_name` from `repo`, trying candidates strictly in order.
    ///
    /// Network failures and non-2xx responses both move on to the next
    /// candidate. Never fails: exhaustion yields `FetchOutcome::NotFound`.
    pub async fn fetch_file(&self, repo: &RepoRef, file_name: &str) -> FetchOutcome {
        for candidate in self.candidates(repo, file_name) {
            debug!(url = %candidate.url, branch = candidate.branch, "Trying candidate");

            match self.transport.get(&candidate.url).await {
                Ok(response) if response.is_success() => {
                    debug!(url = %candidate.url, status = response.status, "Candidate succeeded");
                    return FetchOutcome::Found {
                        candidate,
                        body: response.body,
                    };
                }
                Ok(response) => {
                    debug!(url = %candidate.url, status = response.status, "Candidate missed");
                }
                Err(e) => {
                    debug!(url = %candidate.url, error = %e, "Candidate request failed");
                }
            }
        }

        info!(repo = %repo, file = %file_name, "No candidate succeeded");
        FetchOutcome::NotFound
    }
}
