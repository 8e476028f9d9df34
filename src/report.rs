use serde::Serialize;

use crate::aggregate::RankedCategory;
use crate::map::OrderedMap;
use crate::normalize::TextMetrics;
use crate::scorer::Feedback;
use crate::violations::Violations;

// ---------------------------------------------------------------------------
// Result record
// ---------------------------------------------------------------------------

/// Outcome of one transcript analysis. Owned by the caller; nothing is
/// retained by the checker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub overall_score: f64,
    pub category_scores: OrderedMap<f64>,
    pub feedback: OrderedMap<Feedback>,
    pub violations: Violations,
    pub text_metrics: TextMetrics,
    pub top_categories: Vec<RankedCategory>,
    pub bottom_categories: Vec<RankedCategory>,
}

impl AnalysisResult {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Text report
// ---------------------------------------------------------------------------

/// Layout knobs taken from the checker configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Categories scoring below this get a detailed feedback block.
    pub detail_below: f64,
    pub violation_examples: usize,
}

pub fn render(result: &AnalysisResult, options: &ReportOptions) -> String {
    let mut report: Vec<String> = Vec::new();
    report.push("PROTOCOL COMPLIANCE REPORT".to_string());
    report.push(format!("Overall Score: {}/100", result.overall_score));
    report.push(format!(
        "Text Length: {} words",
        result.text_metrics.word_count
    ));

    report.push("\nTOP PERFORMING CATEGORIES:".to_string());
    for RankedCategory(cat, score) in &result.top_categories {
        report.push(format!("- {cat}: {score}/100"));
    }

    report.push("\nNEEDS IMPROVEMENT:".to_string());
    for RankedCategory(cat, score) in &result.bottom_categories {
        report.push(format!("- {cat}: {score}/100"));
    }

    if !result.violations.is_empty() {
        report.push("\nPROTOCOL VIOLATIONS DETECTED:".to_string());
        for (violation_type, phrases) in result.violations.iter() {
            report.push(format!("- {violation_type}:"));
            for phrase in phrases.iter().take(options.violation_examples) {
                report.push(format!("  * '{phrase}'"));
            }
        }
    }

    report.push("\nDETAILED FEEDBACK:".to_string());
    for (category, feedback) in result.feedback.iter() {
        if feedback.score >= options.detail_below {
            continue;
        }
        report.push(format!("\n{category} ({}/100):", feedback.score));
        report.push(format!("Verdict: {}", feedback.verdict));
        report.push("Suggestions:".to_string());
        for suggestion in &feedback.suggestions {
            report.push(format!("- {suggestion}"));
        }
        report.push("Example phrases:".to_string());
        for example in &feedback.examples {
            report.push(format!("* '{example}'"));
        }
    }

    report.join("\n")
}
