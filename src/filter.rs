use crate::corpus::PublicationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Selection applied by the filter stage. Every condition must hold; an
/// empty institution or topic set selects nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub institutions: BTreeSet<String>,
    pub topics: BTreeSet<String>,
    pub year_min: i32,
    pub year_max: i32,
    #[serde(default)]
    pub min_citations: u64,
}

impl Criteria {
    pub fn matches(&self, record: &PublicationRecord) -> bool {
        self.institutions.contains(&record.institution)
            && self.topics.contains(&record.topic)
            && self.year_min <= record.year
            && record.year <= self.year_max
            && record.citations >= self.min_citations
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub papers_found: usize,
    pub total_citations: u64,
    /// 0.0 when nothing matched.
    pub avg_citations: f64,
}

impl FilterSummary {
    fn over(records: &[PublicationRecord]) -> Self {
        let total_citations: u64 = records.iter().map(|r| r.citations).sum();
        FilterSummary {
            papers_found: records.len(),
            total_citations,
            avg_citations: mean(total_citations, records.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOutput {
    pub records: Vec<PublicationRecord>,
    pub summary: FilterSummary,
}

/// `total / count`, or 0.0 for an empty group.
pub(crate) fn mean(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Copies out the records matching `criteria`, keeping input order.
pub fn filter_records(records: &[PublicationRecord], criteria: &Criteria) -> FilterOutput {
    let selected: Vec<PublicationRecord> = records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect();

    let summary = FilterSummary::over(&selected);
    debug!(
        "Filter kept {} of {} records ({} citations)",
        summary.papers_found,
        records.len(),
        summary.total_citations
    );

    FilterOutput {
        records: selected,
        summary,
    }
}
