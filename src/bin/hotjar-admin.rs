use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotjar::config::Config;
use hotjar::models::{parse_roles, RequestContext, Settings};
use hotjar::snippet::SnippetAsset;
use hotjar::visibility::{Verdict, VisibilityMatcher};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hotjar-admin")]
#[command(about = "Hotjar snippet management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configured settings
    Validate,
    /// Render the tracking snippet
    Render {
        /// Write the snippet to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Force compaction on
        #[arg(long, conflicts_with = "no_compact")]
        compact: bool,
        /// Force compaction off
        #[arg(long)]
        no_compact: bool,
    },
    /// Check whether a page view would be tracked
    Check {
        /// Request path, e.g. /blog/post-1
        #[arg(long)]
        path: String,
        /// Path alias of the same page
        #[arg(long)]
        alias: Option<String>,
        /// Comma-separated user roles
        #[arg(long, default_value = "")]
        roles: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hotjar=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let settings = &config.tracking;

    match cli.command {
        Commands::Validate => {
            println!("✓ Settings are valid");
            println!("{:<20} {}", "Hotjar ID", settings.account_id);
            println!("{:<20} {}", "Snippet version", settings.snippet_version);
            println!("{:<20} {}", "Page visibility", settings.page_visibility);
            for page in &settings.pages {
                println!("{:<20} {}", "", page);
            }
            println!("{:<20} {}", "Role visibility", settings.role_visibility);
            for role in &settings.roles {
                println!("{:<20} {}", "", role);
            }
        }
        Commands::Render {
            out,
            compact,
            no_compact,
        } => {
            let policy = config
                .performance
                .compact_policy()
                .with_override(compact_override(compact, no_compact));
            let asset = SnippetAsset::new(settings, policy);

            match out {
                Some(path) => {
                    save_snippet(&asset, &path).await?;
                    println!("✓ Created snippet file {}", path.display());
                }
                None => println!("{}", asset.body()),
            }
        }
        Commands::Check { path, alias, roles } => {
            let matcher = VisibilityMatcher::new(config.site.front_path.clone());
            println!("{}", check(&matcher, settings, path, alias, &roles));
        }
    }

    Ok(())
}

const SAVE_FAILED: &str =
    "An error occurred saving the snippet file. Tracking is not active until it is saved";

/// `--compact` / `--no-compact` as an override of the host policy
fn compact_override(compact: bool, no_compact: bool) -> Option<bool> {
    match (compact, no_compact) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

async fn save_snippet(asset: &SnippetAsset, path: &Path) -> Result<()> {
    asset.write_to(path).await.context(SAVE_FAILED)
}

fn check(
    matcher: &VisibilityMatcher,
    settings: &Settings,
    path: String,
    alias: Option<String>,
    roles: &str,
) -> Verdict {
    let mut context = RequestContext::new(path, parse_roles(roles));
    if let Some(alias) = alias {
        context = context.with_alias(alias);
    }
    matcher.verdict(settings, &context)
}
