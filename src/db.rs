use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AggregateMetrics, ExperienceLevel, FeedbackRecord, NewFeedback, TrendPoint, UserRole,
};
use crate::sentiment::{SentimentAnalyzer, SentimentOutcome};

pub const ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    ensure_admin_account(pool).await?;
    Ok(())
}

/// Create the privileged account on a fresh database. Checked by username
/// first, so repeated runs insert nothing.
pub async fn ensure_admin_account(pool: &PgPool) -> anyhow::Result<()> {
    let existing: i64 = sqlx::query(
        "SELECT COUNT(*) AS count FROM feedback_analytics.users WHERE username = $1",
    )
    .bind(ADMIN_USERNAME)
    .fetch_one(pool)
    .await?
    .get("count");

    if existing > 0 {
        return Ok(());
    }

    let password_hash = bcrypt::hash(DEFAULT_ADMIN_PASSWORD, bcrypt::DEFAULT_COST)
        .context("failed to hash default admin password")?;

    sqlx::query(
        r#"
        INSERT INTO feedback_analytics.users (id, username, password_hash, role, created_at)
        VALUES ($1, $2, $3, 'admin', $4)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(ADMIN_USERNAME)
    .bind(password_hash)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    info!("default admin account created");
    Ok(())
}

/// Check credentials against the stored hash. Unknown usernames and wrong
/// passwords both come back `false`; neither is an error.
pub async fn verify_user(pool: &PgPool, username: &str, password: &str) -> anyhow::Result<bool> {
    let row = sqlx::query(
        "SELECT password_hash FROM feedback_analytics.users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(false);
    };

    let hash: String = row.get("password_hash");
    Ok(bcrypt::verify(password, &hash).unwrap_or(false))
}

/// Append one scored submission. `created_at` is stamped here; the insert
/// type has no timestamp field for a caller to supply.
pub async fn save_feedback(
    pool: &PgPool,
    feedback: &NewFeedback,
    sentiment: &SentimentOutcome,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO feedback_analytics.feedback
        (id, user_role, experience_level, feedback_text,
         usability_rating, performance_rating, ui_rating, documentation_rating,
         sentiment_label, sentiment_score, sentiment_confidence, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(id)
    .bind(feedback.user_role.as_str())
    .bind(feedback.experience_level.as_str())
    .bind(&feedback.feedback_text)
    .bind(feedback.usability_rating)
    .bind(feedback.performance_rating)
    .bind(feedback.ui_rating)
    .bind(feedback.documentation_rating)
    .bind(&sentiment.label)
    .bind(sentiment.score)
    .bind(sentiment.confidence)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Every record in chronological order. The table is append-only, so this is
/// also insertion order.
pub async fn fetch_all(pool: &PgPool) -> anyhow::Result<Vec<FeedbackRecord>> {
    let rows = sqlx::query(
        "SELECT id, user_role, experience_level, feedback_text, \
         usability_rating, performance_rating, ui_rating, documentation_rating, \
         sentiment_label, sentiment_score, sentiment_confidence, created_at \
         FROM feedback_analytics.feedback ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(record_from_row).collect())
}

fn record_from_row(row: &PgRow) -> FeedbackRecord {
    FeedbackRecord {
        id: row.get("id"),
        user_role: row.get("user_role"),
        experience_level: row.get("experience_level"),
        feedback_text: row.get("feedback_text"),
        usability_rating: row.get("usability_rating"),
        performance_rating: row.get("performance_rating"),
        ui_rating: row.get("ui_rating"),
        documentation_rating: row.get("documentation_rating"),
        sentiment_label: row.get("sentiment_label"),
        sentiment_score: row.get("sentiment_score"),
        sentiment_confidence: row.get("sentiment_confidence"),
        created_at: row.get("created_at"),
    }
}

/// Single grouped pass over the whole collection. `None` when it is empty;
/// averaging over zero rows is never attempted.
pub async fn aggregate_metrics(pool: &PgPool) -> anyhow::Result<Option<AggregateMetrics>> {
    let row = sqlx::query(
        r#"
        SELECT
            AVG(usability_rating)::DOUBLE PRECISION AS avg_usability,
            AVG(performance_rating)::DOUBLE PRECISION AS avg_performance,
            AVG(ui_rating)::DOUBLE PRECISION AS avg_ui,
            AVG(documentation_rating)::DOUBLE PRECISION AS avg_documentation,
            AVG(sentiment_score)::DOUBLE PRECISION AS avg_sentiment,
            COUNT(*) AS total_feedback
        FROM feedback_analytics.feedback
        "#,
    )
    .fetch_one(pool)
    .await?;

    let total_feedback: i64 = row.get("total_feedback");
    if total_feedback == 0 {
        return Ok(None);
    }

    Ok(Some(AggregateMetrics {
        avg_usability: row.get("avg_usability"),
        avg_performance: row.get("avg_performance"),
        avg_ui: row.get("avg_ui"),
        avg_documentation: row.get("avg_documentation"),
        avg_sentiment: row.get("avg_sentiment"),
        total_feedback,
    }))
}

/// Per-day submission count and average sentiment, ascending by day key.
/// Buckets use the UTC date component of `created_at`.
pub async fn daily_trend(pool: &PgPool) -> anyhow::Result<Vec<TrendPoint>> {
    let rows = sqlx::query(
        r#"
        SELECT
            to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS day,
            COUNT(*) AS count,
            AVG(sentiment_score)::DOUBLE PRECISION AS avg_sentiment
        FROM feedback_analytics.feedback
        GROUP BY day
        ORDER BY day ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TrendPoint {
            day: row.get("day"),
            count: row.get("count"),
            avg_sentiment: row.get("avg_sentiment"),
        })
        .collect())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let entries = [
        (
            "seed-001",
            UserRole::Developer,
            ExperienceLevel::OneToSixMonths,
            "Great tool! The editor feels noticeably faster this release.",
            [8, 6, 9, 5],
            ("POSITIVE", 1.0, 0.97),
            (2026, 7, 27, 9, 15),
        ),
        (
            "seed-002",
            UserRole::Designer,
            ExperienceLevel::MoreThanAYear,
            "The new palette is lovely but exports keep timing out.",
            [7, 3, 9, 6],
            ("NEGATIVE", -1.0, 0.81),
            (2026, 7, 27, 16, 40),
        ),
        (
            "seed-003",
            UserRole::ProductManager,
            ExperienceLevel::SixToTwelveMonths,
            "Docs lag behind the API again. Search within docs helps though.",
            [6, 7, 6, 3],
            ("NEGATIVE", -1.0, 0.74),
            (2026, 7, 28, 11, 5),
        ),
        (
            "seed-004",
            UserRole::BusinessAnalyst,
            ExperienceLevel::LessThanAMonth,
            "Onboarding was smooth, dashboards answered most of my questions.",
            [9, 8, 8, 7],
            ("POSITIVE", 1.0, 0.93),
            (2026, 7, 29, 14, 30),
        ),
        (
            "seed-005",
            UserRole::Other,
            ExperienceLevel::OneToSixMonths,
            "Works fine for what I need.",
            [7, 7, 7, 7],
            ("POSITIVE", 1.0, 0.58),
            (2026, 7, 30, 8, 55),
        ),
    ];

    let mut inserted = 0usize;

    for (source_key, role, experience, text, [usability, performance, ui, documentation], sentiment, stamp) in
        entries
    {
        let feedback = NewFeedback {
            user_role: role,
            experience_level: experience,
            feedback_text: text.to_string(),
            usability_rating: usability,
            performance_rating: performance,
            ui_rating: ui,
            documentation_rating: documentation,
        };
        let (label, score, confidence) = sentiment;
        let outcome = SentimentOutcome {
            label: label.to_string(),
            score,
            confidence,
            inference_failed: false,
        };
        let (year, month, day, hour, minute) = stamp;
        let created_at = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .context("invalid seed timestamp")?;

        if insert_scored(pool, &feedback, &outcome, created_at, source_key).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_csv(
    pool: &PgPool,
    analyzer: &SentimentAnalyzer,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        user_role: UserRole,
        experience_level: ExperienceLevel,
        feedback_text: String,
        usability_rating: i32,
        performance_rating: i32,
        ui_rating: i32,
        documentation_rating: i32,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let feedback = NewFeedback {
            user_role: row.user_role,
            experience_level: row.experience_level,
            feedback_text: row.feedback_text,
            usability_rating: row.usability_rating,
            performance_rating: row.performance_rating,
            ui_rating: row.ui_rating,
            documentation_rating: row.documentation_rating,
        };
        feedback.validate()?;

        let sentiment = analyzer.analyze(&feedback.feedback_text).await;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_scored(pool, &feedback, &sentiment, Utc::now(), &source_key).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

// Seed and import both re-run safely: rows keyed by source_key are inserted
// at most once.
async fn insert_scored(
    pool: &PgPool,
    feedback: &NewFeedback,
    sentiment: &SentimentOutcome,
    created_at: DateTime<Utc>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO feedback_analytics.feedback
        (id, user_role, experience_level, feedback_text,
         usability_rating, performance_rating, ui_rating, documentation_rating,
         sentiment_label, sentiment_score, sentiment_confidence, source_key, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(feedback.user_role.as_str())
    .bind(feedback.experience_level.as_str())
    .bind(&feedback.feedback_text)
    .bind(feedback.usability_rating)
    .bind(feedback.performance_rating)
    .bind(feedback.ui_rating)
    .bind(feedback.documentation_rating)
    .bind(&sentiment.label)
    .bind(sentiment.score)
    .bind(sentiment.confidence)
    .bind(source_key)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
