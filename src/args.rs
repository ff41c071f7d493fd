use clap::{Parser, Subcommand};

use crate::repositories::RepoSort;

/// Repo Scout: browse GitHub repositories and find fresh issues to contribute to.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Search open GitHub issues enriched with repository language and contribution templates, and discover top, popular and growing repositories."
)]
pub struct Args {
    /// GitHub API token for direct requests. Falls back to GITHUB_TOKEN.
    #[clap(short, long, global = true)]
    pub token: Option<String>,

    /// Prefer the same-origin relay over direct API calls. Needs
    /// `REPO_SCOUT_PROXY_BASE`.
    #[clap(long, global = true)]
    pub proxy: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search open issues, newest first.
    Issues {
        /// Restrict to repository language
        #[clap(short, long)]
        language: Option<String>,

        /// Required labels (repeatable)
        #[clap(short = 'L', long = "label")]
        labels: Vec<String>,

        /// Restrict to an organization
        #[clap(short, long)]
        org: Option<String>,

        /// Results per page (max 100)
        #[clap(short = 'n', long, default_value = "100")]
        per_page: u32,

        /// Page number
        #[clap(short, long, default_value = "1")]
        page: u32,

        /// Free text, passed through to GitHub search unchanged
        query: Vec<String>,
    },

    /// Highest starred repositories.
    Top(ListingArgs),

    /// Well starred repositories with recent pushes.
    Popular(ListingArgs),

    /// Young repositories gaining stars.
    Growing(ListingArgs),

    /// Search repositories by free text.
    Search {
        /// Search text
        #[clap(required = true, num_args = 1..)]
        query: Vec<String>,

        #[clap(long, value_enum, default_value = "stars")]
        sort: RepoSort,

        #[clap(flatten)]
        listing: ListingArgs,
    },

    /// Print a repository README.
    Readme {
        /// Repository full name, e.g. tokio-rs/tokio
        full_name: String,
    },

    /// List the suggested language filters.
    Languages,

    /// Inspect or reset the anonymous search counter.
    Quota {
        #[clap(subcommand)]
        action: Option<QuotaAction>,
    },
}

#[derive(clap::Args)]
pub struct ListingArgs {
    /// Restrict to repository language
    #[clap(short, long)]
    pub language: Option<String>,

    /// Results per page
    #[clap(short = 'n', long, default_value = "30")]
    pub per_page: u32,

    /// Page number
    #[clap(short, long, default_value = "1")]
    pub page: u32,
}

#[derive(Subcommand, Clone, Copy)]
pub enum QuotaAction {
    /// Show the counter (default)
    Show,
    /// Clear the counter
    Reset,
}
