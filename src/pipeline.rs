use crate::aggregate::{aggregate, Aggregates};
use crate::corpus::Corpus;
use crate::filter::{filter_records, Criteria, FilterOutput};
use crate::recommend::{recommend, Recommendations};
use crate::report::{build_report, Report};
use crate::trend::{analyze_trends, TrendAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Filter,
    Aggregate,
    Trend,
    Recommend,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Filter,
        Stage::Aggregate,
        Stage::Trend,
        Stage::Recommend,
        Stage::Report,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Filter => "publication search",
            Stage::Aggregate => "statistics",
            Stage::Trend => "trend analysis",
            Stage::Recommend => "recommendations",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every stage's output, in dependency order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub filtered: FilterOutput,
    pub aggregates: Aggregates,
    pub trends: TrendAnalysis,
    pub recommendations: Recommendations,
    pub report: Report,
    pub completed: Vec<Stage>,
}

/// Runs the five stages in order. `observe` is called once after each stage
/// finishes, before the next one starts.
pub fn run(
    corpus: &Corpus,
    criteria: &Criteria,
    generated_at: DateTime<Utc>,
    mut observe: impl FnMut(Stage),
) -> PipelineOutput {
    let mut completed = Vec::with_capacity(Stage::ALL.len());
    let mut finish = |stage: Stage| {
        info!("Stage completed: {}", stage);
        completed.push(stage);
        observe(stage);
    };

    let filtered = filter_records(&corpus.records, criteria);
    info!(
        "Found {} papers ({} citations, {:.1} avg)",
        filtered.summary.papers_found,
        filtered.summary.total_citations,
        filtered.summary.avg_citations
    );
    finish(Stage::Filter);

    let aggregates = aggregate(&filtered.records);
    finish(Stage::Aggregate);

    let trends = analyze_trends(&filtered.records, &corpus.topics);
    finish(Stage::Trend);

    let recommendations = recommend(&aggregates, &trends);
    finish(Stage::Recommend);

    let report = build_report(&filtered, &aggregates, &trends, &recommendations, generated_at);
    finish(Stage::Report);

    PipelineOutput {
        filtered,
        aggregates,
        trends,
        recommendations,
        report,
        completed,
    }
}
