//! Rewrites relative `examples/` links in documentation to hosted repository URLs.

mod config;
pub mod host;
mod layout;
mod markdown;
pub mod remote;
mod rewrite;
mod site;

pub use config::Config;
pub use host::{Generator, Host, HostApi, Page, Priority, register};
pub use markdown::MarkdownRenderer;
pub use rewrite::LinkRewriter;
pub use site::{BuildReport, INCLUDES_DIR, Site};
