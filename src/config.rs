//! Command line configuration.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

use crate::host::HostApi;
use crate::remote;

/// Command line configuration for doclinks.
#[derive(Debug, Clone, Parser)]
#[command(name = "doclinks", version, about, long_about = None)]
pub struct Config {
    /// Documentation source directory
    #[arg(default_value = "docs")]
    pub source: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "_site")]
    pub output: PathBuf,

    /// Repository used to discover the base URL
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Base URL for examples/ links (e.g. https://github.com/org/repo/blob/master)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Branch used in the discovered base URL instead of HEAD
    #[arg(long)]
    pub branch: Option<String>,

    /// Site name shown in page titles
    #[arg(long)]
    pub name: Option<String>,

    /// Lifecycle API exposed by the site builder
    #[arg(long, value_enum, default_value_t = HostApi::Hooks)]
    pub api: HostApi,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if source path is not a directory.
    pub fn validate(&self) -> Result<()> {
        if !self.source.is_dir() {
            bail!("Source directory does not exist: {}", self.source.display());
        }

        Ok(())
    }

    /// Returns base URL from configuration or repository remote.
    ///
    /// # Errors
    ///
    /// Returns error if no base URL is given and discovery fails.
    pub fn base_url(&self) -> Result<String> {
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }

        remote::discover_base_url(&self.repo, self.branch.as_deref())
            .context("Cannot determine base URL, pass --base-url explicitly")
    }

    /// Returns site name from configuration or source directory.
    ///
    /// # Errors
    ///
    /// Returns error if source path has no name component or contains invalid UTF8.
    pub fn site_name(&self) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }

        let path = self
            .source
            .canonicalize()
            .unwrap_or_else(|_| self.source.clone());

        path.file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Cannot extract site name from path: {}", path.display()))
            .map(String::from)
    }
}
