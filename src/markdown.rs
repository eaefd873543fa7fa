//! Markdown rendering with GitHub Flavored Markdown support.
//!
//! Pages are rendered with comrak, code blocks are highlighted with
//! syntect CSS classes, and `{% include name %}` directives are spliced in
//! from an includes directory at render time.

use anyhow::{Context, Result, bail};
use comrak::Options;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static INCLUDE: OnceLock<Regex> = OnceLock::new();
static CODE_BLOCK: OnceLock<Regex> = OnceLock::new();

fn include_directive() -> &'static Regex {
    INCLUDE.get_or_init(|| {
        Regex::new(r"\{%\s*include\s+([^\s%]+)\s*%\}").expect("Include regex should compile")
    })
}

fn code_block() -> &'static Regex {
    CODE_BLOCK.get_or_init(|| {
        Regex::new(r#"(?s)<code class="language-([^"]+)">(.*?)</code>"#)
            .expect("Code block regex should compile")
    })
}

/// Renders markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is passed through untouched, so pages may embed
/// anchors directly.
pub struct MarkdownRenderer {
    options: Options<'static>,
    syntax_set: SyntaxSet,
    includes_dir: Option<PathBuf>,
}

impl MarkdownRenderer {
    /// Creates renderer without include support.
    pub fn new() -> Self {
        let mut options = Options::default();

        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.footnotes = true;

        // Docs are trusted input
        options.render.unsafe_ = true;

        Self {
            options,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            includes_dir: None,
        }
    }

    /// Creates renderer resolving `{% include name %}` against a directory.
    ///
    /// # Arguments
    ///
    /// * `includes_dir`: Directory holding includable files
    pub fn with_includes(includes_dir: impl Into<PathBuf>) -> Self {
        let mut renderer = Self::new();
        renderer.includes_dir = Some(includes_dir.into());
        renderer
    }

    /// Renders markdown content to HTML string.
    ///
    /// Includes are expanded first, so their text reaches the HTML without
    /// having passed any pre-render hook.
    ///
    /// # Errors
    ///
    /// Returns error if an include cannot be read or highlighting fails
    pub fn render(&self, content: &str) -> Result<String> {
        let expanded = self.expand_includes(content)?;
        let html = comrak::markdown_to_html(&expanded, &self.options);
        self.highlight_code_blocks(&html)
    }

    /// Replaces include directives with the named file's content.
    ///
    /// Expansion is not recursive.
    fn expand_includes(&self, content: &str) -> Result<String> {
        let re = include_directive();
        if !re.is_match(content) {
            return Ok(content.to_string());
        }

        let Some(dir) = &self.includes_dir else {
            bail!("Include directive found but no includes directory is configured");
        };

        let mut result = String::with_capacity(content.len());
        let mut last_end = 0;
        for caps in re.captures_iter(content) {
            let directive = caps.get(0).context("Capture group 0 always exists")?;
            let name = &caps[1];
            let path = include_path(dir, name)?;
            let included = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read include: {}", path.display()))?;

            result.push_str(&content[last_end..directive.start()]);
            result.push_str(&included);
            last_end = directive.end();
        }
        result.push_str(&content[last_end..]);

        Ok(result)
    }

    /// Applies syntax highlighting to code blocks with a language class.
    fn highlight_code_blocks(&self, html: &str) -> Result<String> {
        let mut result = String::with_capacity(html.len());
        let mut last_end = 0;

        for caps in code_block().captures_iter(html) {
            let block = caps.get(0).context("Capture group 0 always exists")?;
            let language = &caps[1];
            let code = html_decode(&caps[2]);

            let highlighted = self
                .highlight_code(&code, language)
                .with_context(|| format!("Failed to highlight {} code block", language))?;

            result.push_str(&html[last_end..block.start()]);
            result.push_str("<code class=\"language-");
            result.push_str(language);
            result.push_str("\">");
            result.push_str(&highlighted);
            result.push_str("</code>");
            last_end = block.end();
        }
        result.push_str(&html[last_end..]);

        Ok(result)
    }

    /// Highlights code with `hljs-` prefixed CSS classes.
    ///
    /// Unknown languages fall back to escaped plain text.
    fn highlight_code(&self, code: &str, language: &str) -> Result<String> {
        if code.is_empty() {
            return Ok(String::new());
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language));

        let Some(syntax) = syntax else {
            return Ok(html_escape(code));
        };

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::SpacedPrefixed { prefix: "hljs-" },
        );
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .context("Failed to parse line for syntax highlighting")?;
        }

        Ok(generator.finalize())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves include name inside the includes directory.
///
/// Rejects absolute names and parent directory segments.
fn include_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("Include escapes includes directory: {}", name);
    }
    Ok(dir.join(relative))
}

/// Extracts page title from the first level one ATX heading.
///
/// # Arguments
///
/// * `content`: Markdown source
/// * `fallback`: Title used when no heading exists
pub fn title(content: &str, fallback: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().trim_end_matches('#').trim_end())
        .filter(|heading| !heading.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

// comrak escapes &, <, >, " inside code blocks
fn html_decode(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_render_basic_markdown() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let html = renderer
            .render("# Title\n\nSome **bold** text.")
            .expect("Should render");

        // Assert
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_keeps_relative_link_href() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let html = renderer
            .render("[demo](../examples/demo/run.py#L3)")
            .expect("Should render");

        // Assert
        assert!(
            html.contains(r#"href="../examples/demo/run.py#L3""#),
            "Link should render as plain href: {}",
            html
        );
    }

    #[test]
    fn test_render_passes_raw_html_through() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let html = renderer
            .render("<a href=\"../examples/raw.sh\">raw</a>\n")
            .expect("Should render");

        // Assert
        assert!(html.contains(r#"<a href="../examples/raw.sh">raw</a>"#));
    }

    #[test]
    fn test_render_table() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let html = renderer
            .render("| a | b |\n|---|---|\n| 1 | 2 |\n")
            .expect("Should render table");

        // Assert
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_render_highlights_known_language() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let html = renderer
            .render("```rust\nfn main() {}\n```\n")
            .expect("Should render code block");

        // Assert
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("hljs-"), "Should carry highlight classes: {}", html);
    }

    #[test]
    fn test_render_unknown_language_stays_escaped() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let html = renderer
            .render("```nosuchlang\na < b && c\n```\n")
            .expect("Should render code block");

        // Assert
        assert!(html.contains("a &lt; b &amp;&amp; c"));
        assert!(!html.contains("hljs-"));
    }

    #[test]
    fn test_render_expands_include() {
        // Arrange
        let dir = TempDir::new().expect("Should create temp dir");
        fs::write(dir.path().join("note.md"), "Included [x](../examples/x.py)\n")
            .expect("Should write include");
        let renderer = MarkdownRenderer::with_includes(dir.path());

        // Act
        let html = renderer
            .render("Before\n\n{% include note.md %}\n\nAfter\n")
            .expect("Should render with include");

        // Assert
        assert!(html.contains("Included"));
        assert!(html.contains(r#"href="../examples/x.py""#));
        assert!(!html.contains("{%"));
    }

    #[test]
    fn test_render_missing_include_errors() {
        // Arrange
        let dir = TempDir::new().expect("Should create temp dir");
        let renderer = MarkdownRenderer::with_includes(dir.path());

        // Act
        let result = renderer.render("{% include missing.md %}");

        // Assert
        let err = result.expect_err("Missing include should fail");
        assert!(format!("{:#}", err).contains("missing.md"));
    }

    #[test]
    fn test_render_include_without_directory_errors() {
        // Arrange
        let renderer = MarkdownRenderer::new();

        // Act
        let result = renderer.render("{% include note.md %}");

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_include_path_rejects_traversal() {
        // Arrange
        let dir = Path::new("/site/_includes");

        // Act & Assert
        assert!(include_path(dir, "../secret.md").is_err());
        assert!(include_path(dir, "/etc/passwd").is_err());
        assert_eq!(
            include_path(dir, "nested/a.md").expect("Should resolve"),
            dir.join("nested/a.md")
        );
    }

    #[test]
    fn test_title_from_heading() {
        assert_eq!(title("intro\n# Getting Started #\n", "x"), "Getting Started");
        assert_eq!(title("## Sub only\n", "fallback"), "fallback");
        assert_eq!(title("#\n", "fallback"), "fallback");
    }

    #[test]
    fn test_html_decode_ampersand_last() {
        assert_eq!(html_decode("&amp;lt;"), "&lt;");
        assert_eq!(html_decode("a &lt; b"), "a < b");
    }
}
