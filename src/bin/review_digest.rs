//! One-shot digest: pull Apple reviews and/or read a Google Play export, summarize,
//! and print the dashboard JSON to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use app_review_insights::config::ai::AiConfig;
use app_review_insights::config::apps::load_reviews_config_default;
use app_review_insights::report::Dashboard;
use app_review_insights::AggregateInput;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "review_digest")]
#[command(about = "Aggregate and summarize App Store / Google Play reviews")]
#[command(version)]
struct Args {
    /// App Store id, or the key of a configured app profile
    #[arg(short, long, env = "REVIEWS_APP_ID")]
    app_id: Option<String>,

    /// Storefront country for the Apple feed
    #[arg(short, long)]
    country: Option<String>,

    /// Google Play Console review export (CSV)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Number of newest reviews in the `recent` list
    #[arg(long, default_value_t = 5)]
    recent: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app_review_insights=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let ai = AiConfig::load_default()?;
    let reviews = load_reviews_config_default()?;

    // allow `--app-id app_a` to mean the configured profile
    let app_id = args.app_id.map(|id| match reviews.app(&id) {
        Some(profile) => profile.apple_id.clone(),
        None => id,
    });

    let google_csv = match &args.csv {
        Some(p) => Some(
            tokio::fs::read(p)
                .await
                .with_context(|| format!("reading {}", p.display()))?,
        ),
        None => None,
    };

    let aggregator = app_review_insights::build_aggregator(&ai, &reviews)?;
    let report = aggregator
        .run(&AggregateInput {
            app_id,
            country: args.country,
            google_csv,
        })
        .await;

    let dashboard = Dashboard::from_report(report, args.recent);
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}
