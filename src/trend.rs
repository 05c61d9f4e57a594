//! Topic growth ranking.
//!
//! Growth rates and trend labels are relayed from the topic reference data
//! unchanged. They are not adjusted to the filtered subset, so a topic keeps
//! its reference growth figure even when only a handful of its papers
//! survive the filter.

use crate::corpus::{PublicationRecord, Topic, TrendLabel};
use crate::filter::mean;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const HOT_TOPIC_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicGrowth {
    pub topic: String,
    pub observed_papers: usize,
    pub observed_avg_citations: f64,
    pub trend_label: TrendLabel,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationStrength {
    pub institution: String,
    pub mean_author_count: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// Every reference topic seen in the filtered set, fastest growing first.
    pub growth: Vec<TopicGrowth>,
    pub hot_topics: Vec<TopicGrowth>,
    pub collaboration_strength: Vec<CollaborationStrength>,
}

impl TrendAnalysis {
    pub fn growth_of(&self, topic: &str) -> Option<&TopicGrowth> {
        self.growth.iter().find(|g| g.topic == topic)
    }
}

fn rank_growth(growth: &mut [TopicGrowth]) {
    growth.sort_by(|a, b| {
        b.growth_rate
            .total_cmp(&a.growth_rate)
            .then_with(|| b.observed_papers.cmp(&a.observed_papers))
            .then_with(|| a.topic.cmp(&b.topic))
    });
}

/// Mean author count per institution, most collaborative first.
pub fn collaboration_strength(records: &[PublicationRecord]) -> Vec<CollaborationStrength> {
    let mut authors: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for record in records {
        let entry = authors.entry(record.institution.as_str()).or_default();
        entry.0 += u64::from(record.author_count);
        entry.1 += 1;
    }

    let mut strength: Vec<CollaborationStrength> = authors
        .into_iter()
        .map(|(name, (total, papers))| CollaborationStrength {
            institution: name.to_string(),
            mean_author_count: mean(total, papers),
        })
        .collect();
    strength.sort_by(|a, b| {
        b.mean_author_count
            .total_cmp(&a.mean_author_count)
            .then_with(|| a.institution.cmp(&b.institution))
    });
    strength
}

pub fn analyze_trends(records: &[PublicationRecord], topics: &[Topic]) -> TrendAnalysis {
    let mut observed: HashMap<&str, (u64, usize)> = HashMap::new();
    for record in records {
        let entry = observed.entry(record.topic.as_str()).or_default();
        entry.0 += record.citations;
        entry.1 += 1;
    }

    let mut growth: Vec<TopicGrowth> = topics
        .iter()
        .filter_map(|topic| {
            let &(citations, papers) = observed.get(topic.name.as_str())?;
            Some(TopicGrowth {
                topic: topic.name.clone(),
                observed_papers: papers,
                observed_avg_citations: mean(citations, papers),
                trend_label: topic.trend_label,
                growth_rate: topic.growth_rate,
            })
        })
        .collect();
    rank_growth(&mut growth);

    let hot_topics: Vec<TopicGrowth> = growth.iter().take(HOT_TOPIC_LIMIT).cloned().collect();
    debug!(
        "Trend analysis: {} topics observed, hottest {:?}",
        growth.len(),
        hot_topics.first().map(|g| g.topic.as_str())
    );

    TrendAnalysis {
        growth,
        hot_topics,
        collaboration_strength: collaboration_strength(records),
    }
}
