use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod dashboard;
mod db;
mod error;
mod metrics;
mod models;
mod report;
mod sentiment;

use models::{ExperienceLevel, NewFeedback, UserRole};
use sentiment::{ClassifierConfig, SentimentAnalyzer};

#[derive(Parser)]
#[command(name = "feedback-analytics")]
#[command(about = "Feedback collection and sentiment analytics dashboard", long_about = None)]
struct Cli {
    /// Classifier settings file (endpoint, timeout, label map)
    #[arg(long, global = true)]
    classifier_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema and the default admin account
    InitDb,
    /// Load realistic sample feedback
    Seed,
    /// Submit one piece of feedback
    Submit {
        #[arg(long, value_enum)]
        role: UserRole,
        #[arg(long, value_enum)]
        experience: ExperienceLevel,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 7)]
        usability: i32,
        #[arg(long, default_value_t = 7)]
        performance: i32,
        #[arg(long, default_value_t = 7)]
        ui: i32,
        #[arg(long, default_value_t = 7)]
        documentation: i32,
    },
    /// Import feedback rows from a CSV file, scoring each through the classifier
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Render the admin analytics dashboard
    Dashboard {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long)]
        password: String,
        /// Write the markdown dashboard here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit chart-ready JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let classifier_config = match &cli.classifier_config {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::default(),
    };

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool).await?;
            println!("Seeded {inserted} feedback entries.");
        }
        Commands::Submit {
            role,
            experience,
            text,
            usability,
            performance,
            ui,
            documentation,
        } => {
            let analyzer = SentimentAnalyzer::new(classifier_config)?;
            let feedback = NewFeedback {
                user_role: role,
                experience_level: experience,
                feedback_text: text,
                usability_rating: usability,
                performance_rating: performance,
                ui_rating: ui,
                documentation_rating: documentation,
            };
            let receipt = dashboard::submit_feedback(&pool, &analyzer, &feedback).await?;
            println!("Thank you for your valuable feedback!");
            println!(
                "Recorded {} with sentiment {} (score {:.1}).",
                receipt.id, receipt.sentiment.label, receipt.sentiment.score
            );
        }
        Commands::Import { csv } => {
            let analyzer = SentimentAnalyzer::new(classifier_config)?;
            let inserted = db::import_csv(&pool, &analyzer, &csv).await?;
            println!("Inserted {inserted} feedback rows from {}.", csv.display());
        }
        Commands::Dashboard {
            username,
            password,
            out,
            json,
        } => {
            let mut session = dashboard::SessionContext::new();
            session.login(&pool, &username, &password).await?;

            match dashboard::load_dashboard(&pool, &session).await? {
                None => println!("No feedback data available yet."),
                Some(data) => {
                    let rendered = if json {
                        serde_json::to_string_pretty(&data)?
                    } else {
                        report::render_dashboard(&data)
                    };
                    match out {
                        Some(path) => {
                            std::fs::write(&path, rendered)?;
                            println!("Dashboard written to {}.", path.display());
                        }
                        None => println!("{rendered}"),
                    }
                }
            }

            session.logout();
        }
    }

    Ok(())
}
