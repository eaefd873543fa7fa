//! Rewriting of relative `examples/` links to hosted repository URLs.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Markdown inline link whose target climbs out with `../` into `examples/`.
///
/// Groups: 1 = `[label](`, 2 = last `../`, 3 = `examples/...` path,
/// 4 = optional `#fragment`.
static MARKDOWN_LINK: OnceLock<Regex> = OnceLock::new();

/// Double quoted `href` attribute pointing into `examples/` via `../`.
///
/// Groups: 1 = last `../`, 2 = `examples/...` path, 3 = optional `#fragment`.
static HTML_HREF: OnceLock<Regex> = OnceLock::new();

fn markdown_link() -> &'static Regex {
    MARKDOWN_LINK.get_or_init(|| {
        Regex::new(r"(\[[^\]]*\]\()(\.\./)+(examples/[^:)]*)(#[^)]*)?\)")
            .expect("Markdown link regex should compile")
    })
}

fn html_href() -> &'static Regex {
    HTML_HREF.get_or_init(|| {
        Regex::new(r#"href="(\.\./)+(examples/[^":]*)(#[^"]*)?""#)
            .expect("HTML href regex should compile")
    })
}

/// Rewrites links into the `examples/` tree to absolute repository URLs.
///
/// A page at `docs/guide/intro.md` links to `../../examples/demo/run.py`
/// so the link works when browsing the repository. Once the docs are
/// published as a site that relative path no longer exists, so the
/// rewriter replaces the `../` prefix with a base URL such as
/// `https://github.com/org/repo/blob/master`.
///
/// Both operations are pure: they never fail and unmatched text passes
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewriter {
    base_url: String,
}

impl LinkRewriter {
    /// Creates rewriter resolving `examples/` under the given base URL.
    ///
    /// Trailing slashes are trimmed so joined URLs carry exactly one `/`
    /// before `examples/`. The value is not validated; an empty or
    /// malformed base URL still produces a textual substitution.
    ///
    /// # Arguments
    ///
    /// * `base_url`: Absolute root under which `examples/` is browsable
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        let trimmed = base_url.trim_end_matches('/').len();
        base_url.truncate(trimmed);
        Self { base_url }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rewrites Markdown links of the form `[label](../examples/path#frag)`.
    ///
    /// Any number of leading `../` segments is accepted. Links whose path
    /// contains `:` (protocol qualified URLs) or that do not point into
    /// `examples/` are left as they are. All matches are replaced in one
    /// left to right pass.
    ///
    /// # Arguments
    ///
    /// * `text`: Markdown source
    ///
    /// # Returns
    ///
    /// Rewritten text, borrowed from the input when nothing matched
    pub fn rewrite_markdown_links<'t>(&self, text: &'t str) -> Cow<'t, str> {
        markdown_link().replace_all(text, |caps: &Captures<'_>| {
            format!(
                "{}{}/{}{})",
                &caps[1],
                self.base_url,
                &caps[3],
                caps.get(4).map_or("", |m| m.as_str())
            )
        })
    }

    /// Rewrites HTML attributes of the form `href="../examples/path#frag"`.
    ///
    /// Needed for content that never went through the Markdown pass, such
    /// as included files, which only show up as `href` attributes once the
    /// page is rendered.
    ///
    /// # Arguments
    ///
    /// * `text`: Rendered HTML
    ///
    /// # Returns
    ///
    /// Rewritten text, borrowed from the input when nothing matched
    pub fn rewrite_html_links<'t>(&self, text: &'t str) -> Cow<'t, str> {
        html_href().replace_all(text, |caps: &Captures<'_>| {
            format!(
                "href=\"{}/{}{}\"",
                self.base_url,
                &caps[2],
                caps.get(3).map_or("", |m| m.as_str())
            )
        })
    }
}
