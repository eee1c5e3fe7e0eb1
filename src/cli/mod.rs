//! CLI commands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::Settings;
use crate::services::{persist, scrape};

#[derive(Parser)]
#[command(name = "udyam")]
#[command(about = "Udyam registration form schema scraper")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true, env = "UDYAM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the live form and persist the merged schema
    Scrape {
        /// Target form URL
        #[arg(long, env = "UDYAM_URL")]
        url: Option<String>,
        /// Directory for the schema output files
        #[arg(long, env = "UDYAM_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
        /// Directory for page screenshots
        #[arg(long)]
        screenshots_dir: Option<PathBuf>,
        /// Run the browser with a visible window
        #[arg(long)]
        headed: bool,
        /// Connect to a remote Chrome DevTools endpoint instead of launching
        #[arg(long, env = "UDYAM_REMOTE_BROWSER")]
        remote_url: Option<String>,
        /// Discard the persisted schema instead of merging with it
        #[arg(long)]
        no_merge: bool,
    },

    /// Show a summary of the persisted schema
    Status {
        /// Directory holding the schema output files
        #[arg(long, env = "UDYAM_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scrape {
            url,
            output_dir,
            screenshots_dir,
            headed,
            remote_url,
            no_merge,
        } => {
            if let Some(url) = url {
                settings.target_url = url;
            }
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(dir) = screenshots_dir {
                settings.screenshots_dir = dir;
            }
            if headed {
                settings.browser.headless = false;
            }
            if remote_url.is_some() {
                settings.browser.remote_url = remote_url;
            }
            cmd_scrape(&settings, !no_merge).await
        }
        Commands::Status { output_dir } => {
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            cmd_status(&settings)
        }
    }
}

async fn cmd_scrape(settings: &Settings, merge_existing: bool) -> anyhow::Result<()> {
    let summary = scrape::run(settings, merge_existing).await?;
    let schema = &summary.schema;

    println!("\n{}", style("Scrape Summary").bold());
    println!("  Title:            {}", schema.title);
    println!("  Steps:            {}", schema.steps.len());
    println!("  Fields:           {}", schema.total_fields());
    println!("  Validation rules: {}", schema.validation_rules.len());
    if summary.fallback_used {
        println!(
            "  {} live scrape failed, fallback schema was used",
            style("!").yellow()
        );
    } else {
        println!("  {} scraped live", style("✓").green());
    }
    println!(
        "  Output: {}",
        settings.output_dir.join(persist::SCHEMA_FILENAME).display()
    );
    Ok(())
}

fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let Some(schema) = persist::load_existing(&settings.output_dir) else {
        println!(
            "{} No schema found in {}",
            style("!").yellow(),
            settings.output_dir.display()
        );
        return Ok(());
    };

    println!("\n{}", style(&schema.title).bold());
    for step in &schema.steps {
        println!(
            "  {} {} ({} fields)",
            style(format!("Step {}:", step.step_number)).cyan(),
            step.title,
            step.fields.len()
        );
        for field in &step.fields {
            let pattern = field
                .validation
                .as_ref()
                .and_then(|v| v.pattern.as_deref())
                .unwrap_or("-");
            println!(
                "      {:<18} {:<8} pattern: {}",
                field.name,
                field.field_type.as_str(),
                pattern
            );
        }
    }
    println!("  Validation rules: {}", schema.validation_rules.len());
    println!("  Scraped at:       {}", schema.metadata.scraped_at);
    if let Some(updated) = schema.metadata.last_updated {
        println!("  Last updated:     {}", updated);
    }
    if schema.metadata.fallback_used == Some(true) {
        println!(
            "  {} last run used the fallback schema",
            style("!").yellow()
        );
    }
    Ok(())
}
