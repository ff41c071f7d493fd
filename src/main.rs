use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use repo_scout::{
    popular_languages, Args, Command, Config, Gated, GitHubSearcher, IssueFilter, ListingArgs, Page,
    QuotaAction, SessionFlag,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize the tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("repo_scout=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv().ok();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(token) = args.token.filter(|t| !t.trim().is_empty()) {
        config.token = Some(token);
    }
    if args.proxy {
        config.use_proxy = true;
    }

    // Holding a token counts as a signed-in session
    let session = SessionFlag::new(config.token.is_some());
    let mut searcher = GitHubSearcher::new(&config, Arc::new(session))?;

    let result = match args.command {
        Command::Issues {
            language,
            labels,
            org,
            per_page,
            page,
            query,
        } => {
            let filter = IssueFilter {
                organization: org,
                language,
                labels,
                text: Some(query.join(" ")),
            };
            let page = Page::new(per_page, page);
            let outcome = with_spinner("Searching issues", searcher.search_issues(&filter, page)).await;
            print_gated(outcome)
        }
        Command::Top(listing) => {
            let ListingArgs { language, per_page, page } = listing;
            let outcome = with_spinner(
                "Fetching top repositories",
                searcher.top_repositories(language.as_deref(), Page::new(per_page, page)),
            )
            .await;
            print_gated(outcome)
        }
        Command::Popular(listing) => {
            let ListingArgs { language, per_page, page } = listing;
            let outcome = with_spinner(
                "Fetching popular repositories",
                searcher.popular_repositories(language.as_deref(), Page::new(per_page, page)),
            )
            .await;
            print_gated(outcome)
        }
        Command::Growing(listing) => {
            let ListingArgs { language, per_page, page } = listing;
            let outcome = with_spinner(
                "Fetching growing repositories",
                searcher.growing_repositories(language.as_deref(), Page::new(per_page, page)),
            )
            .await;
            print_gated(outcome)
        }
        Command::Search { query, sort, listing } => {
            let ListingArgs { language, per_page, page } = listing;
            let query = query.join(" ");
            let outcome = with_spinner(
                "Searching repositories",
                searcher.search_repositories(&query, language.as_deref(), sort, Page::new(per_page, page)),
            )
            .await;
            print_gated(outcome)
        }
        Command::Readme { full_name } => {
            match with_spinner("Fetching README", searcher.readme(&full_name)).await {
                Some(readme) => println!("{}", readme),
                None => info!("No README found for {}", full_name),
            }
            Ok(())
        }
        Command::Languages => {
            for language in popular_languages() {
                println!("{}", language);
            }
            Ok(())
        }
        Command::Quota { action } => match action.unwrap_or(QuotaAction::Show) {
            QuotaAction::Show => {
                let quota = searcher.quota();
                println!(
                    "searches: {}\nauthenticated: {}\nlimit reached: {}",
                    quota.count(),
                    quota.is_authenticated(),
                    quota.is_limit_reached()
                );
                Ok(())
            }
            QuotaAction::Reset => match searcher.quota_mut().reset() {
                Ok(()) => {
                    info!("Search counter reset");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
        },
    };

    if let Err(e) = result {
        error!("Search failed, try again: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Run `task` while a spinner ticks on stderr.
async fn with_spinner<F: Future>(message: &str, task: F) -> F::Output {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {wide_msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));

    let output = task.await;

    pb.finish_and_clear();
    output
}

fn print_gated<T: Serialize>(
    outcome: repo_scout::Result<Gated<Vec<T>>>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match outcome? {
        Gated::Completed(records) => {
            info!("{} results", records.len());
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Gated::LimitReached => {
            eprintln!(
                "You have used all free searches. Sign in (set GITHUB_TOKEN or pass --token) to keep searching."
            );
        }
    }
    Ok(())
}
