//! quorum bot entrypoint
//!
//! Wires up the database, Slack client, scheduler, and voting engine,
//! then runs the overdue-poll reaper until interrupted.

use clap::Parser;
use quorum::channels::slack::SlackChannel;
use quorum::channels::ChatClient;
use quorum::config::Config;
use quorum::cron::TokioScheduler;
use quorum::polls::VotingEngine;
use quorum::store::{Database, PollStore, VoteStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "quorum", about = "Chat-native poll bot")]
struct Args {
    /// Path to the JSON5 configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("quorum: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = quorum::logging::init(&config.logging) {
        eprintln!("quorum: {}", e);
        std::process::exit(1);
    }

    if let Some(parent) = config.database.path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!(error = %e, "failed to create data directory");
            std::process::exit(1);
        }
    }

    info!(path = %config.database.path.display(), "opening database");
    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "failed to open database");
            std::process::exit(1);
        }
    };

    let slack = Arc::new(SlackChannel::new(config.slack.clone()));
    if let Err(e) = slack.connect().await {
        warn!(error = %e, "Slack auth check failed, continuing anyway");
    }

    let scheduler = Arc::new(TokioScheduler::new());
    let engine = VotingEngine::new(
        PollStore::new(db.clone()),
        VoteStore::new(db),
        slack.clone(),
        scheduler,
    );

    if let Some(channel) = &config.slack.startup_channel {
        if let Err(e) = slack
            .post_message(channel, "quorum is up and taking polls", &[])
            .await
        {
            warn!(error = %e, "failed to post startup message");
        }
    }

    // Reaper: closes open polls whose deadline passed while no close
    // job was pending (lost registration or process restart).
    let reaper = engine.clone();
    let interval = Duration::from_secs(config.polls.reaper_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match reaper.sweep_overdue().await {
                Ok(0) => {}
                Ok(n) => info!(closed = n, "reaper closed overdue polls"),
                Err(e) => error!(error = %e, "reaper sweep failed"),
            }
        }
    });

    info!("quorum running, press ctrl-c to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
