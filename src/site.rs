//! Static site build pipeline hosting the render lifecycle.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::host::{Generator, Hook, HookList, Host, HostApi, Page, Priority};
use crate::layout;
use crate::markdown::{self, MarkdownRenderer};

/// Directory under the source holding includable files.
pub const INCLUDES_DIR: &str = "_includes";

/// Counts of what a build produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildReport {
    pub pages: usize,
    pub static_files: usize,
}

/// Documentation site built from a directory of Markdown files.
///
/// Markdown files become pages, everything else is copied verbatim.
/// Directories starting with `_` or `.` are not published.
pub struct Site {
    source: PathBuf,
    output: PathBuf,
    name: String,
    api: HostApi,
    pages: Vec<Page>,
    static_files: Vec<PathBuf>,
    pre_render: HookList,
    post_render: HookList,
    generators: Vec<Box<dyn Generator>>,
}

impl Site {
    /// Creates empty site.
    ///
    /// # Arguments
    ///
    /// * `source`: Directory with Markdown sources
    /// * `output`: Directory the built site is written to
    /// * `name`: Site name used in page titles
    /// * `api`: Lifecycle API level this site exposes to plugins
    pub fn new(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        name: impl Into<String>,
        api: HostApi,
    ) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            name: name.into(),
            api,
            pages: Vec::new(),
            static_files: Vec::new(),
            pre_render: HookList::default(),
            post_render: HookList::default(),
            generators: Vec::new(),
        }
    }

    /// Pages in source order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Static files relative to the source directory.
    pub fn static_files(&self) -> &[PathBuf] {
        &self.static_files
    }

    /// Directory includes are resolved against.
    pub fn includes_dir(&self) -> PathBuf {
        self.source.join(INCLUDES_DIR)
    }

    /// Scans the source directory for pages and static files.
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be listed or a page is not UTF8
    pub fn load(&mut self) -> Result<()> {
        let source = self.source.clone();
        self.pages.clear();
        self.static_files.clear();
        let mut visited = HashSet::new();
        self.scan(&source, Path::new(""), &mut visited)?;
        info!(
            pages = self.pages.len(),
            static_files = self.static_files.len(),
            source = %self.source.display(),
            "loaded site"
        );
        Ok(())
    }

    /// Walks one directory, following symlinks.
    ///
    /// `visited` holds canonical directories already walked so a link back
    /// to an ancestor is not followed twice.
    fn scan(&mut self, dir: &Path, relative: &Path, visited: &mut HashSet<PathBuf>) -> Result<()> {
        let canonical = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory: {}", dir.display()))?;
        if !visited.insert(canonical) {
            warn!(dir = %relative.display(), "directory already scanned, skipping link cycle");
            return Ok(());
        }

        let mut entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();
            let rel = relative.join(&name);
            // fs::metadata follows symlinks, DirEntry::file_type does not
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %rel.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if metadata.is_dir() {
                let hidden = name
                    .to_str()
                    .is_some_and(|n| n.starts_with('_') || n.starts_with('.'));
                if hidden {
                    debug!(dir = %rel.display(), "skipping unpublished directory");
                    continue;
                }
                self.scan(&path, &rel, visited)?;
            } else if !metadata.is_file() {
                debug!(path = %rel.display(), "skipping special file");
            } else if is_markdown(&path) {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read page: {}", path.display()))?;
                self.pages.push(Page::new(rel, content));
            } else {
                self.static_files.push(rel);
            }
        }

        Ok(())
    }

    /// Runs generators, then renders every page through its hooks.
    ///
    /// Per page the order is: pre-render hooks, Markdown rendering,
    /// layout, post-render hooks. Hooks only run when the site exposes
    /// [`HostApi::Hooks`].
    ///
    /// # Errors
    ///
    /// Returns error if any page fails to render
    pub fn build(&mut self, renderer: &MarkdownRenderer) -> Result<BuildReport> {
        for generator in &self.generators {
            debug!(generator = generator.name(), "running generator");
            generator.generate(&mut self.pages);
        }

        let hooks = self.api == HostApi::Hooks;
        for page in &mut self.pages {
            if hooks {
                self.pre_render.run(page);
            }

            let body = renderer
                .render(&page.content)
                .with_context(|| format!("Failed to render page: {}", page.path().display()))?;
            let fallback = page
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled");
            let title = markdown::title(&page.content, fallback);
            page.output = Some(layout::page(&title, &self.name, &body).into_string());

            if hooks {
                self.post_render.run(page);
            }
        }

        let report = BuildReport {
            pages: self.pages.len(),
            static_files: self.static_files.len(),
        };
        info!(
            pages = report.pages,
            static_files = report.static_files,
            "built site"
        );
        Ok(report)
    }

    /// Writes rendered pages and copies static files to the output directory.
    ///
    /// # Errors
    ///
    /// Returns error if any file cannot be written
    pub fn write(&self) -> Result<()> {
        fs::create_dir_all(&self.output).with_context(|| {
            format!("Failed to create output directory: {}", self.output.display())
        })?;

        for page in &self.pages {
            let Some(output) = &page.output else {
                warn!(page = %page.path().display(), "page was not rendered, skipping");
                continue;
            };
            let target = self.output.join(page.path().with_extension("html"));
            ensure_parent(&target)?;
            fs::write(&target, output)
                .with_context(|| format!("Failed to write page: {}", target.display()))?;
            debug!(path = %target.display(), "wrote page");
        }

        for file in &self.static_files {
            let from = self.source.join(file);
            let target = self.output.join(file);
            ensure_parent(&target)?;
            fs::copy(&from, &target)
                .with_context(|| format!("Failed to copy static file: {}", from.display()))?;
        }

        Ok(())
    }
}

impl Host for Site {
    fn api(&self) -> HostApi {
        self.api
    }

    fn register_pre_render(&mut self, priority: Priority, hook: Hook) {
        if self.api != HostApi::Hooks {
            warn!("site does not support render hooks, pre-render hook ignored");
            return;
        }
        self.pre_render.insert(priority, hook);
    }

    fn register_post_render(&mut self, priority: Priority, hook: Hook) {
        if self.api != HostApi::Hooks {
            warn!("site does not support render hooks, post-render hook ignored");
            return;
        }
        self.post_render.insert(priority, hook);
    }

    fn register_generator(&mut self, generator: Box<dyn Generator>) {
        self.generators.push(generator);
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
