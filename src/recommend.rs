use crate::aggregate::Aggregates;
use crate::trend::TrendAnalysis;
use serde::{Deserialize, Serialize};
use tracing::debug;

const TOP_N: usize = 3;
pub const EMERGING_GROWTH_THRESHOLD: f64 = 30.0;

pub const STRATEGIC_ADVICE: [&str; 2] = [
    "Increase industry-academia collaboration for real-world AI applications",
    "Invest in AI Ethics and Responsible AI research (currently underrepresented)",
];

/// Guidance strings grouped into named buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub research_focus: Vec<String>,
    pub collaboration: Vec<String>,
    pub emerging_areas: Vec<String>,
    pub strategic: Vec<String>,
}

pub fn recommend(aggregates: &Aggregates, trends: &TrendAnalysis) -> Recommendations {
    let research_focus: Vec<String> = aggregates
        .by_topic
        .iter()
        .take(TOP_N)
        .filter_map(|stats| trends.growth_of(&stats.topic))
        .map(|g| {
            format!(
                "Focus on {} {} - high impact area with {}% growth",
                g.topic, g.trend_label, g.growth_rate
            )
        })
        .collect();

    let partners: Vec<&str> = aggregates
        .by_institution
        .iter()
        .take(TOP_N)
        .map(|s| s.institution.as_str())
        .collect();
    let mut collaboration = Vec::new();
    if !partners.is_empty() {
        collaboration.push(format!(
            "Consider partnerships with: {} - leading research output",
            partners.join(", ")
        ));
    }

    // growth is already fastest-first
    let emerging: Vec<&str> = trends
        .growth
        .iter()
        .filter(|g| g.growth_rate > EMERGING_GROWTH_THRESHOLD)
        .take(TOP_N)
        .map(|g| g.topic.as_str())
        .collect();
    let mut emerging_areas = Vec::new();
    if !emerging.is_empty() {
        emerging_areas.push(format!("Emerging opportunities: {}", emerging.join(", ")));
    }

    let recommendations = Recommendations {
        research_focus,
        collaboration,
        emerging_areas,
        strategic: STRATEGIC_ADVICE.iter().map(|s| s.to_string()).collect(),
    };
    debug!(
        "Recommendations: {} focus, {} collaboration, {} emerging",
        recommendations.research_focus.len(),
        recommendations.collaboration.len(),
        recommendations.emerging_areas.len()
    );
    recommendations
}
