use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod houses;
mod kpi;
mod models;
mod period;
mod report;

use period::Period;
use report::PeriodKpis;

#[derive(Parser)]
#[command(name = "arena-das-casas")]
#[command(about = "KPI snapshot generator for the Arena das Casas dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small deterministic seed dataset
    Seed,
    /// Compute all KPIs and write the snapshot document
    Generate {
        #[arg(long, default_value = "data.json")]
        out: PathBuf,
        /// Reference date (defaults to today); KPI windows derive from it
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Length of the accumulated window in calendar months
        #[arg(long, default_value_t = 3)]
        months: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Generate { out, as_of, months } => {
            let today = as_of.unwrap_or_else(|| Local::now().date_naive());
            generate(&pool, today, months, &out).await?;
        }
    }

    Ok(())
}

/// One full snapshot run: both windows, all extractors in fixed order, one
/// assembled document, one file write. Any failure aborts the whole run and
/// leaves the previous snapshot in place.
async fn generate(pool: &PgPool, today: NaiveDate, months: u32, out: &Path) -> anyhow::Result<()> {
    let current = period::current_period(today);
    let accumulated = period::accumulated_period(today, months);

    println!("Current period:     {} -> {}", current.start, current.end);
    println!("Accumulated period: {} -> {}", accumulated.start, accumulated.end);

    println!("[1/4] House directory...");
    let basics = db::fetch_house_basics(pool).await?;
    for key in houses::HouseKey::ALL {
        let counts = basics.get(&key).copied().unwrap_or_default();
        println!(
            "  {}: {} therapists, {} active patients",
            key.as_str(),
            counts.therapists_count,
            counts.active_patients
        );
    }

    println!("[2/4] Period KPIs (current)...");
    let current_kpis = collect_period_kpis(pool, &current, today).await?;

    println!("[3/4] Period KPIs (accumulated)...");
    let accumulated_kpis = collect_period_kpis(pool, &accumulated, today).await?;

    println!("[4/4] Clinical delta (all history)...");
    let assessments = db::fetch_assessments(pool).await?;
    let evolucao_ors = kpi::clinical_delta(&assessments);

    let report = report::build_report(
        Local::now().naive_local(),
        &basics,
        &current,
        &current_kpis,
        &accumulated,
        &accumulated_kpis,
        &evolucao_ors,
    );

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Snapshot written to {}.", out.display());

    Ok(())
}

/// The four period-scoped extractors, issued serially in fixed order.
async fn collect_period_kpis(
    pool: &PgPool,
    period: &Period,
    today: NaiveDate,
) -> anyhow::Result<PeriodKpis> {
    let adherence = db::fetch_adherence_counts(pool, period.start, period.end).await?;
    let sessions = db::fetch_session_counts(pool, period.start, period.end).await?;
    let quality = db::fetch_quality_counts(pool, period.start, period.end).await?;
    let attendance = db::fetch_attendance_counts(pool, period.start, period.end, today).await?;

    Ok(PeriodKpis {
        adimplencia: adherence
            .into_iter()
            .map(|(house, counts)| (house, kpi::adherence_rate(counts, period.month_count)))
            .collect(),
        sessoes_paciente: sessions
            .into_iter()
            .map(|(house, counts)| (house, kpi::sessions_per_patient(counts)))
            .collect(),
        qualidade: quality
            .into_iter()
            .map(|(house, counts)| (house, kpi::quality_score(counts)))
            .collect(),
        comparecimento: attendance
            .into_iter()
            .map(|(house, counts)| (house, kpi::attendance_rate(counts)))
            .collect(),
    })
}
