//! Plain-text output for analyses and history.

use scorecard_shared::{MAX_COMPONENT_SCORE, QualificationAnalysis};
use scorecard_storage::{AnalysisSummary, LoadedAnalysis};

pub(crate) fn mode_label(demo_mode: bool) -> &'static str {
    if demo_mode { "demo mode" } else { "live mode" }
}

/// `●●○` for a score of 2.
fn score_dots(score: u8) -> String {
    (0..MAX_COMPONENT_SCORE)
        .map(|i| if i < score { '●' } else { '○' })
        .collect()
}

pub(crate) fn print_analysis(analysis: &QualificationAnalysis) {
    let summary = analysis.score_summary();

    println!();
    println!(
        "  MEDDPICC score: {}/{} ({}%)",
        summary.overall, summary.max, summary.percentage
    );
    if let Some(cloud) = &analysis.cloud_provider {
        println!("  Cloud provider: {cloud}");
    }
    println!();

    for component in analysis.components.values() {
        println!(
            "  {} {:<18} {:>3.0}%  {}",
            score_dots(component.score),
            component.name,
            component.confidence * 100.0,
            component.text
        );
        if !component.citation.is_empty() {
            println!("      \"{}\"", component.citation);
        }
    }

    if !analysis.tags.is_empty() {
        println!();
        println!("  Tags:");
        for tag in &analysis.tags {
            println!("    [{}] {}", tag.tag_type, tag.value);
        }
    }

    if !analysis.follow_up_questions.is_empty() {
        println!();
        println!("  Follow-up questions:");
        for question in &analysis.follow_up_questions {
            println!(
                "    {}. ({}) {}",
                question.id,
                question.component.name(),
                question.question
            );
        }
    }

    if !analysis.email_draft.is_empty() {
        println!();
        println!("  Email draft:");
        for line in analysis.email_draft.lines() {
            println!("    {line}");
        }
    }
    println!();
}

pub(crate) fn print_loaded(loaded: &LoadedAnalysis) {
    println!();
    println!("  Analysis: {}", loaded.analysis_id);
    if let Some(title) = &loaded.meeting.title {
        println!("  Meeting:  {title}");
    }
    println!("  Date:     {}", loaded.meeting.date.format("%Y-%m-%d %H:%M UTC"));
    print_analysis(&loaded.analysis);
}

pub(crate) fn print_list(summaries: &[AnalysisSummary]) {
    if summaries.is_empty() {
        println!("No saved analyses.");
        return;
    }

    for summary in summaries {
        println!(
            "{}  {}  {:>3}%  {}",
            summary.analysis_id,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.summary.percentage,
            summary.title.as_deref().unwrap_or("(untitled)")
        );
    }
}
