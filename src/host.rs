//! Adapter between the link rewriter and a page rendering lifecycle.
//!
//! A host exposes either render hooks (a pre-render callback on Markdown
//! source and a post-render callback on HTML output) or, on older hosts,
//! only site-wide generators that run before any page is rendered.
//! [`register`] checks which one the host supports and wires the
//! rewriter accordingly.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::rewrite::LinkRewriter;

/// Page flowing through the render lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    path: PathBuf,
    /// Markdown source, mutable until rendering.
    pub content: String,
    /// Rendered HTML, None until the page has been rendered.
    pub output: Option<String>,
}

impl Page {
    /// Creates unrendered page.
    ///
    /// # Arguments
    ///
    /// * `path`: Source path relative to the site source directory
    /// * `content`: Markdown source
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            output: None,
        }
    }

    /// Source path relative to the site source directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lifecycle API level a host supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HostApi {
    /// Pre-render and post-render hooks per page.
    Hooks,
    /// Only generators over the whole page set, run before rendering.
    Generators,
}

/// Hook ordering, highest runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Highest,
    High,
    #[default]
    Normal,
    Low,
    Lowest,
}

/// Callback over a single page.
pub type Hook = Box<dyn Fn(&mut Page) + Send + Sync>;

/// Site-wide pass over all pages, run before rendering.
pub trait Generator: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Mutates the page set.
    fn generate(&self, pages: &mut [Page]);
}

/// Page rendering lifecycle that accepts hooks or generators.
pub trait Host {
    /// API level of this host.
    fn api(&self) -> HostApi;

    /// Registers callback on Markdown source before rendering.
    fn register_pre_render(&mut self, priority: Priority, hook: Hook);

    /// Registers callback on HTML output after rendering.
    fn register_post_render(&mut self, priority: Priority, hook: Hook);

    /// Registers site-wide generator.
    fn register_generator(&mut self, generator: Box<dyn Generator>);
}

/// Hooks of one lifecycle point kept in execution order.
///
/// Insertion keeps the list sorted by priority; hooks of equal priority
/// run in registration order.
#[derive(Default)]
pub struct HookList {
    hooks: Vec<(Priority, Hook)>,
}

impl HookList {
    /// Adds hook after every hook of equal or higher priority.
    ///
    /// # Arguments
    ///
    /// * `priority`: Position class of the hook
    /// * `hook`: Callback to run on each page
    pub fn insert(&mut self, priority: Priority, hook: Hook) {
        let at = self.hooks.partition_point(|(p, _)| *p <= priority);
        self.hooks.insert(at, (priority, hook));
    }

    /// Runs every hook on the page in order.
    pub fn run(&self, page: &mut Page) {
        for (_, hook) in &self.hooks {
            hook(page);
        }
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Generator applying the Markdown rewrite to every page.
///
/// Used on hosts without render hooks. Included content is never seen
/// by it, so links inside includes stay relative on such hosts.
pub struct RewriteGenerator {
    rewriter: Arc<LinkRewriter>,
}

impl RewriteGenerator {
    /// Creates generator sharing the given rewriter.
    ///
    /// # Arguments
    ///
    /// * `rewriter`: Rewriter applied to each page's Markdown source
    pub fn new(rewriter: Arc<LinkRewriter>) -> Self {
        Self { rewriter }
    }
}

impl Generator for RewriteGenerator {
    fn name(&self) -> &str {
        "examples-link-rewrite"
    }

    fn generate(&self, pages: &mut [Page]) {
        for page in pages {
            rewrite_content(&self.rewriter, page);
        }
    }
}

fn rewrite_content(rewriter: &LinkRewriter, page: &mut Page) {
    if let Cow::Owned(content) = rewriter.rewrite_markdown_links(&page.content) {
        debug!(page = %page.path.display(), "rewrote Markdown links");
        page.content = content;
    }
}

fn rewrite_output(rewriter: &LinkRewriter, page: &mut Page) {
    let Some(output) = page.output.as_deref() else {
        return;
    };
    if let Cow::Owned(output) = rewriter.rewrite_html_links(output) {
        debug!(page = %page.path.display(), "rewrote HTML links");
        page.output = Some(output);
    }
}

/// Wires link rewriting into the host's lifecycle.
///
/// With [`HostApi::Hooks`] the Markdown rewrite runs as the last
/// pre-render hook, so links produced by other pre-render hooks are seen
/// too, and the HTML rewrite runs after rendering. With
/// [`HostApi::Generators`] only the Markdown rewrite is installed, as a
/// generator.
///
/// # Arguments
///
/// * `host`: Lifecycle to register with
/// * `rewriter`: Shared rewriter
///
/// # Returns
///
/// The API level that was used
pub fn register<H: Host + ?Sized>(host: &mut H, rewriter: Arc<LinkRewriter>) -> HostApi {
    let api = host.api();
    match api {
        HostApi::Hooks => {
            let pre = Arc::clone(&rewriter);
            host.register_pre_render(
                Priority::Lowest,
                Box::new(move |page: &mut Page| rewrite_content(&pre, page)),
            );
            host.register_post_render(
                Priority::Normal,
                Box::new(move |page: &mut Page| rewrite_output(&rewriter, page)),
            );
        }
        HostApi::Generators => {
            host.register_generator(Box::new(RewriteGenerator::new(rewriter)));
        }
    }
    info!(?api, "registered examples link rewriting");
    api
}
