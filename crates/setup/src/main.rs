//! CMEK Setup CLI.
//!
//! This CLI prepares a Google Cloud project for customer-managed encryption
//! keys: it enables the required APIs, creates a KMS key ring and key, and
//! grants the product's service agents access to the key.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::error;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use cmek_cloud::auth::resolve_access_token;
use cmek_cloud::Gcp;
use cmek_setup::prompt::{collect_request, Prompter, TerminalPrompter};
use cmek_setup::{ui, PrerequisitesValidator, Provisioner};

/// CMEK Setup - customer-managed encryption keys on Google Cloud.
#[derive(Parser)]
#[command(
    name = "cmek-setup",
    version,
    about = "Provision Cloud KMS resources for customer-managed encryption keys",
    long_about = "Provision Cloud KMS resources for customer-managed encryption keys.\n\n\
                  Enables the required APIs, creates a key ring and key, and grants the\n\
                  product's service agents access to the key. All answers are collected\n\
                  interactively.\n\n\
                  All operations are idempotent - re-running is always safe."
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing; WARN and ERROR go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info,cmek_setup=debug,cmek_cloud=debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(
            std::io::stderr
                .with_max_level(tracing::Level::WARN)
                .or_else(std::io::stdout),
        )
        .init();

    ExitCode::from(exit_status(&run().await))
}

/// Process exit status for a finished run: 0 on success, 1 on any failure.
fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Setup failed");
            1
        }
    }
}

async fn run() -> Result<()> {
    ui::print_banner();

    ui::print_section("Checking prerequisites");
    PrerequisitesValidator::new().validate()?;

    let mut prompter = TerminalPrompter::new();
    let request = collect_request(&mut prompter)?;

    ui::print_request_summary(&request);
    println!();

    if !prompter.confirm("Proceed with provisioning?", true)? {
        println!("{}", "Setup cancelled.".yellow());
        return Ok(());
    }

    let token = resolve_access_token()
        .await
        .context("Failed to obtain a Google Cloud access token")?;
    let gcp = Gcp::new(token)?;

    ui::print_section("Provisioning");
    let report = Provisioner::new(&gcp, &request).run().await?;

    ui::print_report_summary(&request, &report);
    Ok(())
}
