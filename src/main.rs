use anyhow::{Context, Result};
use doclinks::{Config, LinkRewriter, MarkdownRenderer, Site};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "doclinks=debug" } else { "doclinks=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.verbose);
    config.validate().context("Invalid configuration")?;

    let base_url = config.base_url()?;
    info!(%base_url, "rewriting examples/ links");
    let rewriter = Arc::new(LinkRewriter::new(base_url));

    let mut site = Site::new(
        &config.source,
        &config.output,
        config.site_name()?,
        config.api,
    );
    site.load().context("Failed to load site")?;
    doclinks::register(&mut site, rewriter);

    let renderer = MarkdownRenderer::with_includes(site.includes_dir());
    let report = site.build(&renderer).context("Failed to build site")?;
    site.write().context("Failed to write site")?;

    println!(
        "Generated {} pages and copied {} static files into {}",
        report.pages,
        report.static_files,
        config.output.display()
    );

    Ok(())
}
