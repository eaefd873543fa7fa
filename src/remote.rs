//! Base URL discovery from git remotes.

use anyhow::{Context, Result};
use gix::bstr::ByteSlice;
use std::path::Path;
use tracing::debug;

/// Branch used when HEAD is detached or unborn.
const FALLBACK_BRANCH: &str = "master";

/// Converts a git remote URL into a browsable https URL.
///
/// Handles the forms hosting services hand out for cloning:
/// - `https://github.com/org/repo.git`
/// - `http://host/org/repo` (upgraded to https)
/// - `ssh://git@github.com/org/repo.git`
/// - `git://host/org/repo`
/// - `git@github.com:org/repo.git` (scp style)
///
/// A trailing `.git` and trailing slashes are stripped and user info is
/// dropped.
///
/// # Arguments
///
/// * `remote`: Remote URL as configured in the repository
///
/// # Returns
///
/// Web URL, or None for local paths and unrecognized forms
pub fn web_url(remote: &str) -> Option<String> {
    let remote = remote.trim();

    let (host, path) = if let Some((scheme, rest)) = remote.split_once("://") {
        if !matches!(scheme, "https" | "http" | "ssh" | "git" | "git+ssh") {
            return None;
        }
        let (authority, path) = rest.split_once('/')?;
        let host = strip_user(authority);
        // ssh URLs may carry a port meant for git, not for the web host
        let host = if scheme == "https" || scheme == "http" {
            host
        } else {
            host.split(':').next().unwrap_or(host)
        };
        (host, path)
    } else {
        // scp style: [user@]host:path, but never a Windows drive or local path
        let (authority, path) = remote.split_once(':')?;
        if authority.contains('/') || authority.len() < 2 {
            return None;
        }
        (strip_user(authority), path)
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if host.is_empty() || path.is_empty() {
        return None;
    }

    Some(format!("https://{}/{}", host, path))
}

fn strip_user(authority: &str) -> &str {
    authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host)
}

/// Joins web URL and branch into the base for blob links.
///
/// # Arguments
///
/// * `web_url`: Repository web URL without trailing slash
/// * `branch`: Branch name, may contain slashes
pub fn blob_base_url(web_url: &str, branch: &str) -> String {
    format!("{}/blob/{}", web_url.trim_end_matches('/'), branch)
}

/// Discovers base URL for `examples/` links from repository metadata.
///
/// Reads the default fetch remote of the repository at `repo_path` and the
/// branch HEAD points to. An explicit branch takes precedence over HEAD.
///
/// # Arguments
///
/// * `repo_path`: Path inside the git repository
/// * `branch`: Optional branch override
///
/// # Errors
///
/// Returns error if the repository cannot be opened, has no remote, or the
/// remote URL cannot be mapped to a web URL.
pub fn discover_base_url(repo_path: impl AsRef<Path>, branch: Option<&str>) -> Result<String> {
    let repo_path = repo_path.as_ref();
    let repo = gix::discover(repo_path)
        .with_context(|| format!("Failed to open repository at {}", repo_path.display()))?;

    let remote = repo
        .find_default_remote(gix::remote::Direction::Fetch)
        .context("Repository has no remote configured")?
        .context("Failed to read default remote")?;

    let remote_url = remote
        .url(gix::remote::Direction::Fetch)
        .context("Default remote has no fetch URL")?
        .to_bstring()
        .to_string();

    let web = web_url(&remote_url)
        .with_context(|| format!("Cannot derive web URL from remote: {}", remote_url))?;

    let branch = match branch {
        Some(branch) => branch.to_string(),
        None => head_branch(&repo)?,
    };

    debug!(remote = %remote_url, %branch, "derived base URL from repository");
    Ok(blob_base_url(&web, &branch))
}

fn head_branch(repo: &gix::Repository) -> Result<String> {
    let head_ref = repo.head_ref().context("Failed to read HEAD reference")?;
    Ok(head_ref
        .and_then(|r| r.name().shorten().to_str().ok().map(|s| s.to_string()))
        .unwrap_or_else(|| FALLBACK_BRANCH.to_string()))
}
