use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "renderfeed")]
#[command(about = "Builds full-content feeds by rendering each article in a real browser")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a site's feed and print it as RSS XML
    Build {
        /// Feed identifier (see `sites`)
        feed_id: String,

        /// Maximum number of accepted items (defaults to the site's own limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write the XML to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Render and extract a single article URL, bypassing the cache
    Preview {
        /// Feed identifier whose extraction rules to use
        feed_id: String,

        /// Article URL to render
        url: String,
    },

    /// Delete every cached article for a site
    Flush {
        /// Feed identifier (see `sites`)
        feed_id: String,
    },

    /// List the registered sites
    Sites,
}
