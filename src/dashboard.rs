use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::FeedbackError;
use crate::metrics;
use crate::models::{DisplayMetrics, FeedbackRecord, NewFeedback, TrendPoint};
use crate::sentiment::{SentimentAnalyzer, SentimentOutcome};

pub const RECENT_FEEDBACK_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SessionState {
    #[default]
    Unauthenticated,
    AdminAuthenticated,
}

/// Per-session login state, owned by the caller. Two sessions never share it,
/// and it dies with the process.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: SessionState,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn login(
        &mut self,
        pool: &PgPool,
        username: &str,
        password: &str,
    ) -> anyhow::Result<()> {
        let verified = db::verify_user(pool, username, password).await?;
        self.apply_verification(verified)?;
        Ok(())
    }

    // Failed verification leaves the state untouched.
    fn apply_verification(&mut self, verified: bool) -> Result<(), FeedbackError> {
        if verified {
            self.state = SessionState::AdminAuthenticated;
            Ok(())
        } else {
            Err(FeedbackError::AuthFailure)
        }
    }

    pub fn logout(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    pub fn is_admin(&self) -> bool {
        self.state == SessionState::AdminAuthenticated
    }
}

pub struct SubmissionReceipt {
    pub id: Uuid,
    pub sentiment: SentimentOutcome,
}

/// The submission flow: validate at the boundary, score, persist. The scorer
/// cannot fail this path; a classifier outage degrades to a neutral score.
pub async fn submit_feedback(
    pool: &PgPool,
    analyzer: &SentimentAnalyzer,
    feedback: &NewFeedback,
) -> anyhow::Result<SubmissionReceipt> {
    feedback.validate()?;

    let sentiment = analyzer.analyze(&feedback.feedback_text).await;
    let id = db::save_feedback(pool, feedback, &sentiment).await?;
    info!(%id, label = %sentiment.label, fallback = sentiment.inference_failed, "feedback stored");

    Ok(SubmissionReceipt { id, sentiment })
}

/// Trend series handed to the chart renderer: one {x, y} point per day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeriesPoint {
    pub x: String,
    pub y: f64,
}

/// One radar axis (the four rating averages).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPoint {
    pub axis: &'static str,
    pub value: f64,
}

/// Everything one dashboard render needs, already shaped for display. The
/// chart renderer consumes `trend_series` and `radar`; the report consumes
/// the rest.
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub metrics: DisplayMetrics,
    pub trend: Vec<TrendPoint>,
    pub trend_series: Vec<TrendSeriesPoint>,
    pub radar: Vec<RadarPoint>,
    pub recent: Vec<FeedbackRecord>,
}

pub fn trend_series(points: &[TrendPoint]) -> Vec<TrendSeriesPoint> {
    points
        .iter()
        .map(|point| TrendSeriesPoint {
            x: point.day.clone(),
            y: point.avg_sentiment,
        })
        .collect()
}

pub fn radar_values(metrics: &DisplayMetrics) -> Vec<RadarPoint> {
    vec![
        RadarPoint {
            axis: "Usability",
            value: metrics.avg_usability,
        },
        RadarPoint {
            axis: "Performance",
            value: metrics.avg_performance,
        },
        RadarPoint {
            axis: "UI",
            value: metrics.avg_ui,
        },
        RadarPoint {
            axis: "Documentation",
            value: metrics.avg_documentation,
        },
    ]
}

/// Assemble the admin view. Requires an authenticated session; returns `None`
/// when no feedback exists yet, which the caller renders as the no-data state.
pub async fn load_dashboard(
    pool: &PgPool,
    session: &SessionContext,
) -> anyhow::Result<Option<DashboardData>> {
    if !session.is_admin() {
        return Err(FeedbackError::AuthFailure.into());
    }

    let Some(aggregate) = db::aggregate_metrics(pool).await? else {
        return Ok(None);
    };

    let display = metrics::format_metrics(&aggregate)?;
    let trend = db::daily_trend(pool).await?;

    let all = db::fetch_all(pool).await?;
    let skip = all.len().saturating_sub(RECENT_FEEDBACK_LIMIT);
    let recent = all[skip..].to_vec();

    Ok(Some(DashboardData {
        trend_series: trend_series(&trend),
        radar: radar_values(&display),
        metrics: display,
        trend,
        recent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_moves_to_admin_on_verification() {
        let mut session = SessionContext::new();
        assert!(!session.is_admin());

        session.apply_verification(true).unwrap();
        assert!(session.is_admin());
    }

    #[test]
    fn failed_login_leaves_state_unchanged() {
        let mut session = SessionContext::new();
        let err = session.apply_verification(false).unwrap_err();
        assert_eq!(err, FeedbackError::AuthFailure);
        assert!(!session.is_admin());

        // A failed attempt must not demote an authenticated session either.
        session.apply_verification(true).unwrap();
        let _ = session.apply_verification(false);
        assert!(session.is_admin());
    }

    #[test]
    fn logout_always_returns_to_unauthenticated() {
        let mut session = SessionContext::new();
        session.logout();
        assert!(!session.is_admin());

        session.apply_verification(true).unwrap();
        session.logout();
        assert!(!session.is_admin());
    }

    #[test]
    fn trend_series_preserves_day_order() {
        let points = vec![
            TrendPoint {
                day: "2026-07-27".to_string(),
                count: 2,
                avg_sentiment: 0.0,
            },
            TrendPoint {
                day: "2026-07-28".to_string(),
                count: 1,
                avg_sentiment: -1.0,
            },
            TrendPoint {
                day: "2026-07-30".to_string(),
                count: 1,
                avg_sentiment: 1.0,
            },
        ];

        let series = trend_series(&points);
        let days: Vec<&str> = series.iter().map(|p| p.x.as_str()).collect();
        assert_eq!(days, vec!["2026-07-27", "2026-07-28", "2026-07-30"]);
        assert_eq!(series[1].y, -1.0);
    }

    #[test]
    fn radar_carries_the_four_rating_axes() {
        let metrics = DisplayMetrics {
            total_feedback: 3,
            avg_sentiment: 0.33,
            avg_usability: 7.25,
            avg_performance: 6.0,
            avg_ui: 8.5,
            avg_documentation: 5.75,
        };

        let radar = radar_values(&metrics);
        let axes: Vec<&str> = radar.iter().map(|p| p.axis).collect();
        assert_eq!(axes, vec!["Usability", "Performance", "UI", "Documentation"]);
        assert_eq!(radar[2].value, 8.5);
    }
}
