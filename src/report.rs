use std::fmt::Write;

use crate::dashboard::DashboardData;

pub fn render_dashboard(data: &DashboardData) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Feedback Analytics Dashboard");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total feedback: {}", data.metrics.total_feedback);
    let _ = writeln!(
        output,
        "- Average sentiment: {:.2}",
        data.metrics.avg_sentiment
    );
    let _ = writeln!(
        output,
        "- Average usability: {:.2}/10",
        data.metrics.avg_usability
    );
    let _ = writeln!(
        output,
        "- Average performance: {:.2}/10",
        data.metrics.avg_performance
    );
    let _ = writeln!(output, "- Average UI: {:.2}/10", data.metrics.avg_ui);
    let _ = writeln!(
        output,
        "- Average documentation: {:.2}/10",
        data.metrics.avg_documentation
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment Trend");

    if data.trend.is_empty() {
        let _ = writeln!(output, "No daily activity recorded yet.");
    } else {
        for point in data.trend.iter() {
            let _ = writeln!(
                output,
                "- {}: {} submissions, avg sentiment {:.2}",
                point.day, point.count, point.avg_sentiment
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Rating Radar");

    for point in data.radar.iter() {
        let _ = writeln!(output, "- {}: {:.2}/10", point.axis, point.value);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");

    if data.recent.is_empty() {
        let _ = writeln!(output, "No feedback submitted yet.");
    } else {
        for record in data.recent.iter() {
            let _ = writeln!(
                output,
                "- [{}] {} ({}, {}): {}",
                record.created_at.format("%Y-%m-%d %H:%M"),
                record.sentiment_label,
                record.user_role,
                record.experience_level,
                record.feedback_text
            );
            let _ = writeln!(
                output,
                "  Usability {}/10, Performance {}/10",
                record.usability_rating, record.performance_rating
            );
        }
    }

    output
}
