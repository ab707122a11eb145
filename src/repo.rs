//! Repository URL classification.
//!
//! Decides which hosting-provider family a repository URL belongs to and
//! extracts what the fetcher needs to build raw-content URLs:
//! - GitHub: `https://github.com/<owner>/<name>[.git]` -> owner + name
//! - Anything else: the URL itself, minus a trailing `.git`

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

static GITHUB_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)$").expect("valid GitHub repo regex")
});

/// Errors produced while classifying a repository URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid GitHub repository URL: {0}")]
    InvalidGithubUrl(String),
}

/// Hosting provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    Generic,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::GitHub => write!(f, "github"),
            Provider::Generic => write!(f, "generic"),
        }
    }
}

/// A classified repository reference, derived per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    GitHub { owner: String, name: String },
    Generic { base_url: String },
}

impl RepoRef {
    pub fn provider(&self) -> Provider {
        match self {
            RepoRef::GitHub { .. } => Provider::GitHub,
            RepoRef::Generic { .. } => Provider::Generic,
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoRef::GitHub { owner, name } => write!(f, "github:{}/{}", owner, name),
            RepoRef::Generic { base_url } => write!(f, "{}", base_url),
        }
    }
}

/// Classify a repository URL.
///
/// Pure function of its input: no network access.
pub fn classify(repo_url: &str) -> Result<RepoRef, ClassifyError> {
    let parsed = Url::parse(repo_url).map_err(|e| ClassifyError::InvalidUrl {
        url: repo_url.to_string(),
        reason: e.to_string(),
    })?;

    let is_github = parsed
        .host_str()
        .is_some_and(|host| host.contains("github.com"));

    if is_github {
        let caps = GITHUB_REPO
            .captures(repo_url)
            .ok_or_else(|| ClassifyError::InvalidGithubUrl(repo_url.to_string()))?;

        let owner = caps[1].to_string();
        let name = strip_git_suffix(&caps[2]).to_string();
        if name.is_empty() {
            return Err(ClassifyError::InvalidGithubUrl(repo_url.to_string()));
        }

        return Ok(RepoRef::GitHub { owner, name });
    }

    Ok(RepoRef::Generic {
        base_url: strip_git_suffix(repo_url).to_string(),
    })
}

fn strip_git_suffix(s: &str) -> &str {
    s.strip_suffix(".git").unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_github() {
        let repo = classify("https://github.com/acme/tool").unwrap();
        assert_eq!(
            repo,
            RepoRef::GitHub {
                owner: "acme".to_string(),
                name: "tool".to_string()
            }
        );
        assert_eq!(repo.provider(), Provider::GitHub);
    }

    #[test]
    fn test_classify_github_strips_git_suffix() {
        let repo = classify("https://github.com/acme/tool.git").unwrap();
        assert_eq!(
            repo,
            RepoRef::GitHub {
                owner: "acme".to_string(),
                name: "tool".to_string()
            }
        );
    }

    #[test]
    fn test_classify_github_keeps_inner_dots() {
        let repo = classify("https://github.com/acme/tool.rs").unwrap();
        assert!(matches!(repo, RepoRef::GitHub { name, .. } if name == "tool.rs"));
    }

    #[test]
    fn test_classify_github_rejects_extra_segments() {
        let err = classify("https://github.com/acme/tool/tree/main").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidGithubUrl(_)));
    }

    #[test]
    fn test_classify_github_rejects_trailing_slash() {
        let err = classify("https://github.com/acme/tool/").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidGithubUrl(_)));
    }

    #[test]
    fn test_classify_github_rejects_http_scheme() {
        // Host matches but the anchored pattern requires https
        let err = classify("http://github.com/acme/tool").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidGithubUrl(_)));
    }

    #[test]
    fn test_classify_github_rejects_bare_git_name() {
        let err = classify("https://github.com/acme/.git").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidGithubUrl(_)));
    }

    #[test]
    fn test_classify_generic() {
        let repo = classify("https://gitlab.example.com/acme/tool").unwrap();
        assert_eq!(
            repo,
            RepoRef::Generic {
                base_url: "https://gitlab.example.com/acme/tool".to_string()
            }
        );
        assert_eq!(repo.provider(), Provider::Generic);
    }

    #[test]
    fn test_classify_generic_strips_git_suffix() {
        let repo = classify("https://codeberg.org/acme/tool.git").unwrap();
        assert_eq!(
            repo,
            RepoRef::Generic {
                base_url: "https://codeberg.org/acme/tool".to_string()
            }
        );
    }

    #[test]
    fn test_classify_invalid_url() {
        let err = classify("not a url").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidUrl { .. }));

        let err = classify("github.com/acme/tool").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidUrl { .. }));
    }

    #[test]
    fn test_repo_ref_display() {
        let repo = classify("https://github.com/acme/tool").unwrap();
        assert_eq!(repo.to_string(), "github:acme/tool");
        assert_eq!(Provider::Generic.to_string(), "generic");
    }
}
