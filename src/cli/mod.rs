//! AQI Forecast CLI Module
//!
//! Command-line front end over the pipeline stages.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::inference::AqiCategory;
use crate::pipeline::Pipeline;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn category_color(category: AqiCategory) -> ColoredString {
    let label = category.label();
    match category {
        AqiCategory::Good => label.truecolor(100, 210, 120),
        AqiCategory::Moderate => label.truecolor(230, 200, 90),
        AqiCategory::Unhealthy => label.truecolor(240, 150, 70),
        AqiCategory::VeryUnhealthy => label.truecolor(230, 80, 80),
        AqiCategory::Hazardous => label.truecolor(170, 60, 140),
    }
    .bold()
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "aqi-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Air-quality forecasting: ingest, build features, train, predict")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON config file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the current reading from WAQI and store it
    Fetch,

    /// Store hourly history from Open-Meteo
    Backfill {
        /// Days of history (defaults to the configured backfill_days)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Rebuild the feature group from the raw table
    Features,

    /// Train candidates and register the champion
    Train,

    /// Forecast AQI 1h, 24h and 72h ahead
    Predict {
        /// Print the forecast as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show table sizes and the current model
    Status,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_fetch(pipeline: &Pipeline) -> anyhow::Result<()> {
    section("Fetch");

    step_run(&format!("Polling WAQI for {}", pipeline.config().city.cyan()));
    let start = Instant::now();
    let reading = pipeline.fetch_current().await?;
    step_done(&format!("{:?}", start.elapsed()));

    kv("Timestamp", &reading.timestamp.to_string());
    kv("AQI", &format!("{:.0}", reading.aqi));
    if let Some(pm25) = reading.pm25 {
        kv("PM2.5", &format!("{:.1}", pm25));
    }
    println!();
    Ok(())
}

pub async fn cmd_backfill(pipeline: &Pipeline) -> anyhow::Result<()> {
    section("Backfill");

    let config = pipeline.config();
    step_run(&format!(
        "Fetching {} days at {:.4}, {:.4}",
        config.backfill_days, config.latitude, config.longitude
    ));
    let start = Instant::now();
    let n = pipeline.backfill().await?;
    step_done(&format!("{} readings in {:?}", n, start.elapsed()));
    println!();
    Ok(())
}

pub fn cmd_features(pipeline: &Pipeline) -> anyhow::Result<()> {
    section("Features");

    step_run("Building feature rows");
    let start = Instant::now();
    let n = pipeline.push_features()?;
    step_done(&format!("{} rows in {:?}", n, start.elapsed()));

    if n == 0 {
        println!("  {}", muted("not enough history yet; at least 75 hourly readings are needed"));
    }
    println!();
    Ok(())
}

pub fn cmd_train(pipeline: &Pipeline) -> anyhow::Result<()> {
    section("Train");

    step_run("Training candidates");
    let start = Instant::now();
    let (report, card) = pipeline.train()?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!("  {:<20} {:>10} {:>10} {:>10}", muted("Candidate"), muted("MAE"), muted("R²"), muted("Time"));
    println!("  {}", dim(&"─".repeat(54)));
    for score in &report.leaderboard {
        let name = if score.candidate == report.champion() {
            score.candidate.white().bold()
        } else {
            score.candidate.normal()
        };
        println!(
            "  {:<20} {:>10.3} {:>10.4} {:>9.2}s",
            name, score.metrics.avg_mae, score.metrics.avg_r2, score.training_time_secs
        );
    }
    println!("  {}", dim(&"─".repeat(54)));

    println!();
    println!(
        "  {} {} {}",
        ok("champion"),
        card.candidate.white().bold(),
        muted(&format!("registered as {} v{}", card.name, card.version))
    );
    if report.dropped_rows > 0 {
        kv("Dropped rows", &report.dropped_rows.to_string());
    }
    println!();
    Ok(())
}

pub fn cmd_predict(pipeline: &Pipeline, json: bool) -> anyhow::Result<()> {
    let forecast = pipeline.predict()?;
    let category = AqiCategory::for_forecast(&forecast.values);

    if json {
        let out = serde_json::json!({
            "based_on": forecast.based_on.to_string(),
            "model": forecast.model,
            "predictions": forecast.targets.iter().zip(&forecast.values)
                .map(|(t, v)| (t.clone(), serde_json::json!(v)))
                .collect::<serde_json::Map<_, _>>(),
            "category": category.label(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    section(&format!("Forecast for {}", pipeline.config().city));
    kv("Based on", &forecast.based_on.to_string());
    kv("Model", &forecast.model);
    println!();

    for (label, value) in ["Next hour", "Tomorrow", "In 3 days"].iter().zip(&forecast.values) {
        let band = AqiCategory::from_aqi(*value);
        println!("  {:<16} {:>6.0}  {}", muted(label), value, category_color(band));
    }

    println!();
    println!("  {} {}", muted("Outlook"), category_color(category));
    println!("  {}", category.advice());
    println!();
    Ok(())
}

pub fn cmd_status(pipeline: &Pipeline) -> anyhow::Result<()> {
    section("Status");

    let config = pipeline.config();
    let status = pipeline.status()?;
    let rows = |n: Option<usize>| n.map_or_else(|| "missing".to_string(), |n| format!("{} rows", n));

    kv("City", &config.city);
    kv(&config.raw_table, &rows(status.raw_rows));
    kv(
        &format!("{} v{}", config.feature_group, config.feature_group_version),
        &rows(status.feature_rows),
    );

    println!();
    match status.model {
        Some(card) => {
            kv("Model", &format!("{} v{}", card.name, card.version));
            kv("Candidate", &card.candidate);
            kv("Trained", &card.created_at.format("%Y-%m-%d %H:%M UTC").to_string());
            for key in ["avg_mae", "avg_r2"] {
                if let Some(value) = card.metrics.get(key) {
                    kv(key, &format!("{:.4}", value));
                }
            }
            if !card.feature_importances.is_empty() {
                println!("  {}", muted("Top features"));
                for (column, weight) in card.feature_importances.iter().take(5) {
                    println!("    {:<12} {}", column, dim(&format!("{:.3}", weight)));
                }
            }
        }
        None => println!("  {}", muted("no model registered; run `aqi-forecast train`")),
    }

    println!();
    Ok(())
}
