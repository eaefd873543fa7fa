//! Shared test utilities for integration tests.
//!
//! Provides helpers for laying out documentation trees and creating
//! temporary git repositories with a configured remote.

#![allow(dead_code)]

use anyhow::Result;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

pub const BASE_URL: &str = "https://github.com/org/repo/blob/master";

/// Runs git in the given directory, failing on non-zero exit.
///
/// # Errors
///
/// Returns error if git cannot be spawned or exits unsuccessfully
pub fn git(repo_path: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(())
}

/// Creates temporary git repository with a remote and one commit.
///
/// HEAD points to `branch` so base URL discovery is deterministic
/// regardless of the local git default branch.
///
/// # Errors
///
/// Returns error if git commands fail or directory creation fails
pub fn create_test_repo(remote: &str, branch: &str) -> Result<TempDir> {
    let dir = TempDir::new()?;
    let path = dir.path();

    git(path, &["init", "--quiet"])?;
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "user.email", "test@example.com"])?;
    git(path, &["config", "commit.gpgsign", "false"])?;
    git(path, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", branch)])?;
    git(path, &["remote", "add", "origin", remote])?;

    write_file(path, "README.md", "# Test\n")?;
    git(path, &["add", "."])?;
    git(path, &["commit", "--quiet", "-m", "Initial commit"])?;

    Ok(dir)
}

/// Writes file under root, creating parent directories as needed.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_file(root: &Path, path: &str, content: &str) -> Result<()> {
    let file_path = root.join(path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// Lays out a docs tree with every kind of examples/ link.
///
/// - `guide/intro.md`: Markdown link, raw HTML link, unrelated link, include
/// - `_includes/snippet.md`: Markdown link only reachable through include
/// - `assets/style.css`: static file
///
/// # Errors
///
/// Returns error if any file cannot be written
pub fn create_docs(root: &Path) -> Result<()> {
    write_file(
        root,
        "guide/intro.md",
        "# Intro\n\
         \n\
         See [the demo](../../examples/demo/run.py) for details.\n\
         \n\
         Jump to [a line](../../examples/demo/run.py#L10) or read [the FAQ](../faq.md).\n\
         \n\
         <a href=\"../../examples/raw/app.sh\">raw anchor</a>\n\
         \n\
         {% include snippet.md %}\n",
    )?;
    write_file(
        root,
        "_includes/snippet.md",
        "Included [spouse example](../examples/spouse/udf/supervise.py).\n",
    )?;
    write_file(root, "faq.md", "# FAQ\n\nNo links here.\n")?;
    write_file(root, "assets/style.css", "body { margin: 0; }\n")?;
    Ok(())
}
