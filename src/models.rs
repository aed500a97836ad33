use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FeedbackError;

pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum UserRole {
    Developer,
    Designer,
    #[serde(rename = "Product Manager")]
    ProductManager,
    #[serde(rename = "Business Analyst")]
    BusinessAnalyst,
    Other,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Developer => "Developer",
            UserRole::Designer => "Designer",
            UserRole::ProductManager => "Product Manager",
            UserRole::BusinessAnalyst => "Business Analyst",
            UserRole::Other => "Other",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Less than a month")]
    LessThanAMonth,
    #[serde(rename = "1-6 months")]
    OneToSixMonths,
    #[serde(rename = "6-12 months")]
    SixToTwelveMonths,
    #[serde(rename = "More than a year")]
    MoreThanAYear,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::LessThanAMonth => "Less than a month",
            ExperienceLevel::OneToSixMonths => "1-6 months",
            ExperienceLevel::SixToTwelveMonths => "6-12 months",
            ExperienceLevel::MoreThanAYear => "More than a year",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission as it arrives from the form, before scoring and persistence.
/// Carries no timestamp; `created_at` is stamped at insert time.
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub user_role: UserRole,
    pub experience_level: ExperienceLevel,
    pub feedback_text: String,
    pub usability_rating: i32,
    pub performance_rating: i32,
    pub ui_rating: i32,
    pub documentation_rating: i32,
}

impl NewFeedback {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.feedback_text.trim().is_empty() {
            return Err(FeedbackError::Validation(
                "feedback text must not be blank".to_string(),
            ));
        }

        let ratings = [
            ("usability", self.usability_rating),
            ("performance", self.performance_rating),
            ("ui", self.ui_rating),
            ("documentation", self.documentation_rating),
        ];
        for (name, value) in ratings {
            if !(RATING_MIN..=RATING_MAX).contains(&value) {
                return Err(FeedbackError::Validation(format!(
                    "{name} rating {value} is outside {RATING_MIN}..={RATING_MAX}"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub user_role: String,
    pub experience_level: String,
    pub feedback_text: String,
    pub usability_rating: i32,
    pub performance_rating: i32,
    pub ui_rating: i32,
    pub documentation_rating: i32,
    pub sentiment_label: String,
    pub sentiment_score: f64,
    pub sentiment_confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Collection-wide averages straight out of the store. Averages are absent
/// when the grouped pass saw no rows.
#[derive(Debug, Clone, Default)]
pub struct AggregateMetrics {
    pub avg_usability: Option<f64>,
    pub avg_performance: Option<f64>,
    pub avg_ui: Option<f64>,
    pub avg_documentation: Option<f64>,
    pub avg_sentiment: Option<f64>,
    pub total_feedback: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMetrics {
    pub total_feedback: i64,
    pub avg_sentiment: f64,
    pub avg_usability: f64,
    pub avg_performance: f64,
    pub avg_ui: f64,
    pub avg_documentation: f64,
}

/// One calendar-day bucket (UTC date component of `created_at`).
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub day: String,
    pub count: i64,
    pub avg_sentiment: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feedback(text: &str) -> NewFeedback {
        NewFeedback {
            user_role: UserRole::Developer,
            experience_level: ExperienceLevel::OneToSixMonths,
            feedback_text: text.to_string(),
            usability_rating: 8,
            performance_rating: 6,
            ui_rating: 9,
            documentation_rating: 5,
        }
    }

    #[test]
    fn valid_submission_passes() {
        assert!(sample_feedback("Great tool!").validate().is_ok());
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = sample_feedback("   \n\t").validate().unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let mut feedback = sample_feedback("fine");
        feedback.ui_rating = 11;
        assert!(feedback.validate().is_err());

        feedback.ui_rating = 0;
        assert!(feedback.validate().is_err());

        feedback.ui_rating = 10;
        assert!(feedback.validate().is_ok());
    }

    #[test]
    fn enum_labels_match_stored_strings() {
        assert_eq!(UserRole::ProductManager.as_str(), "Product Manager");
        assert_eq!(ExperienceLevel::MoreThanAYear.as_str(), "More than a year");
    }

    #[test]
    fn enums_deserialize_from_display_strings() {
        let role: UserRole = serde_json::from_str("\"Business Analyst\"").unwrap();
        assert_eq!(role, UserRole::BusinessAnalyst);

        let level: ExperienceLevel = serde_json::from_str("\"6-12 months\"").unwrap();
        assert_eq!(level, ExperienceLevel::SixToTwelveMonths);
    }
}
