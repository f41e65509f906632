// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Manual runner for the data migration jobs.
//!
//! ```text
//! agency-migrate --job email-signups --dry-run
//! agency-migrate --job event-registrations --resume
//! ```

use agency_admin::{
    config::Config,
    db::{DocumentStore, FirestoreDb},
    services::{migration, run_migration, MigrationJob, MigrationOptions},
};
use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agency-migrate")]
#[command(about = "Copy legacy Airtable/Firestore records into Firestore", long_about = None)]
struct Cli {
    /// Job to run (email-signups, event-registrations, crm-contacts, team-members)
    #[arg(long, value_parser = parse_job)]
    job: MigrationJob,

    /// Skip records already covered by the saved checkpoint
    #[arg(long)]
    resume: bool,

    /// Report what would be migrated without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Delete the saved checkpoint before running
    #[arg(long, conflicts_with = "resume")]
    reset_checkpoint: bool,
}

fn parse_job(value: &str) -> Result<MigrationJob, String> {
    value.parse().map_err(|_| {
        let names: Vec<_> = MigrationJob::ALL.iter().map(|job| job.name()).collect();
        format!("unknown job '{}' (expected one of: {})", value, names.join(", "))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive("agency_admin=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .context("Failed to connect to Firestore")?;

    let legacy_db: Option<Arc<dyn DocumentStore>> = match &config.legacy_firestore_project_id {
        Some(project) => Some(Arc::new(
            FirestoreDb::new(project)
                .await
                .context("Failed to connect to legacy Firestore")?,
        )),
        None => None,
    };

    if cli.reset_checkpoint && !cli.dry_run {
        let removed = migration::reset_checkpoint(&db, cli.job.name()).await?;
        tracing::info!(job = %cli.job, removed, "Checkpoint reset");
    }

    let source = cli.job.build_source(&config, legacy_db)?;
    let options = MigrationOptions {
        resume: cli.resume,
        dry_run: cli.dry_run,
    };
    let report = run_migration(source.as_ref(), &db, &cli.job.plan(), options).await?;

    println!(
        "{}{}: migrated={} skipped={} before_checkpoint={} errored={}",
        cli.job,
        if cli.dry_run { " (dry run)" } else { "" },
        report.migrated,
        report.skipped,
        report.checkpoint_skipped,
        report.errored
    );
    for error in &report.errors {
        eprintln!("  {}", error);
    }

    Ok(if report.errored == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
