use crate::error::FeedbackError;
use crate::models::{AggregateMetrics, DisplayMetrics};

/// Shape aggregate output for display: the five averages rounded to two
/// decimal places, the count passed through untouched.
pub fn format_metrics(metrics: &AggregateMetrics) -> Result<DisplayMetrics, FeedbackError> {
    Ok(DisplayMetrics {
        total_feedback: metrics.total_feedback,
        avg_sentiment: round2(require(metrics.avg_sentiment, "avg_sentiment")?),
        avg_usability: round2(require(metrics.avg_usability, "avg_usability")?),
        avg_performance: round2(require(metrics.avg_performance, "avg_performance")?),
        avg_ui: round2(require(metrics.avg_ui, "avg_ui")?),
        avg_documentation: round2(require(metrics.avg_documentation, "avg_documentation")?),
    })
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64, FeedbackError> {
    value.ok_or(FeedbackError::MissingField(field))
}

// Two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> AggregateMetrics {
        AggregateMetrics {
            avg_usability: Some(7.333333333),
            avg_performance: Some(6.0),
            avg_ui: Some(4.375),
            avg_documentation: Some(4.125),
            avg_sentiment: Some(2.0 / 3.0),
            total_feedback: 12,
        }
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(7.333333333), 7.33);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(6.0), 6.0);
    }

    #[test]
    fn ties_round_to_even() {
        // Both inputs are exact in binary, so the tie is real.
        assert_eq!(round2(4.375), 4.38);
        assert_eq!(round2(4.125), 4.12);
        assert_eq!(round2(-4.375), -4.38);
    }

    #[test]
    fn formats_all_fields() {
        let display = format_metrics(&sample_metrics()).unwrap();
        assert_eq!(display.total_feedback, 12);
        assert_eq!(display.avg_usability, 7.33);
        assert_eq!(display.avg_performance, 6.0);
        assert_eq!(display.avg_ui, 4.38);
        assert_eq!(display.avg_documentation, 4.12);
        assert_eq!(display.avg_sentiment, 0.67);
    }

    #[test]
    fn missing_average_is_an_error() {
        let mut metrics = sample_metrics();
        metrics.avg_sentiment = None;
        let err = format_metrics(&metrics).unwrap_err();
        assert_eq!(err, FeedbackError::MissingField("avg_sentiment"));
    }
}
