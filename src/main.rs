use std::fs;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

use renderfeed::browser::{
    wait_for_element, PageRenderer, RendererFactory, WebDriverFactory, DEFAULT_WAIT_TICKS,
};
use renderfeed::cli::{Cli, Commands};
use renderfeed::config::Config;
use renderfeed::errors::{RenderFeedError, RenderFeedResult};
use renderfeed::feed::SourceFeedReader;
use renderfeed::services::FeedAssembler;
use renderfeed::sites::{Extraction, SiteRegistry, SiteStrategy};
use renderfeed::storage::{ArticleCacheRepository, SqliteArticleCacheRepository, SqliteStorage};

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Logs go to stderr; stdout is reserved for the feed XML.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("renderfeed=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("loading configuration")?;

    let registry = SiteRegistry::new();
    info!(sites = ?registry.names(), "site parsers activated");

    match cli.command {
        Commands::Build {
            feed_id,
            limit,
            output,
        } => cmd_build(&feed_id, limit, output, &registry, &config)?,
        Commands::Preview { feed_id, url } => cmd_preview(&feed_id, &url, &registry, &config)?,
        Commands::Flush { feed_id } => cmd_flush(&feed_id, &registry, &config)?,
        Commands::Sites => cmd_sites(&registry),
    }

    Ok(())
}

fn find_site<'a>(
    registry: &'a SiteRegistry,
    feed_id: &str,
) -> RenderFeedResult<&'a renderfeed::sites::SiteParser> {
    registry
        .find(feed_id)
        .ok_or_else(|| RenderFeedError::UnknownFeed(feed_id.to_string()))
}

fn cmd_build(
    feed_id: &str,
    limit: Option<usize>,
    output: Option<String>,
    registry: &SiteRegistry,
    config: &Config,
) -> RenderFeedResult<()> {
    let site = find_site(registry, feed_id)?;

    let storage = SqliteStorage::new(&config.db_path)?;
    let cache = SqliteArticleCacheRepository::new(storage, site.name())?;

    let source = SourceFeedReader::new().fetch(site.feed_url())?;

    let factory = WebDriverFactory::new(&config.webdriver_url);
    let assembler = FeedAssembler::new(&cache, &factory);

    let limit = limit.or(site.default_limit());
    let document = assembler.assemble(site, &source, limit)?;
    let xml = document.to_xml();

    match output {
        Some(path) => {
            fs::write(&path, &xml)?;
            println!("Wrote {} items to {}", document.items.len(), path);
        }
        None => println!("{}", xml),
    }

    // Pruning runs after the document is out and never fails the build.
    if let Err(err) = cache.prune(config.max_cache_entries) {
        warn!(site = site.name(), error = %err, "cache pruning failed");
    }

    Ok(())
}

fn cmd_preview(
    feed_id: &str,
    url: &str,
    registry: &SiteRegistry,
    config: &Config,
) -> RenderFeedResult<()> {
    let site = find_site(registry, feed_id)?;
    let url = Url::parse(url).map_err(|_| RenderFeedError::InvalidUrl(url.to_string()))?;

    let factory = WebDriverFactory::new(&config.webdriver_url);
    let mut renderer = factory.create()?;

    let extracted = preview_once(site, &url, &mut *renderer);

    if let Err(err) = renderer.close() {
        warn!(error = %err, "failed to close the render session");
    }

    match extracted? {
        Extraction::Article(fields) => {
            if let Some(author) = &fields.author {
                println!("Author: {}", author);
                println!();
            }
            println!("{}", fields.body);
        }
        Extraction::Skip => println!("The site rules skip this page."),
    }

    Ok(())
}

fn preview_once(
    site: &dyn SiteStrategy,
    url: &Url,
    renderer: &mut dyn PageRenderer,
) -> RenderFeedResult<Extraction> {
    renderer.open(url)?;
    let markup = wait_for_element(renderer, site.article_selector(), DEFAULT_WAIT_TICKS)?;
    site.extract(&markup, renderer)
}

fn cmd_flush(feed_id: &str, registry: &SiteRegistry, config: &Config) -> RenderFeedResult<()> {
    let site = find_site(registry, feed_id)?;

    let storage = SqliteStorage::new(&config.db_path)?;
    let cache = SqliteArticleCacheRepository::new(storage, site.name())?;
    cache.flush()?;

    println!("Flushed the {} cache.", site.name());
    Ok(())
}

fn cmd_sites(registry: &SiteRegistry) {
    println!("Registered sites:\n");
    for site in registry.all() {
        println!("  {}", site.name());
        println!("    Feed: {}", site.feed_url());
        match site.default_limit() {
            Some(limit) => println!("    Default limit: {}", limit),
            None => println!("    Default limit: whole feed"),
        }
        println!();
    }
}
