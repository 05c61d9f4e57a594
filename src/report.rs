//! Report assembly: a Markdown document plus chart-ready tables.
//!
//! Nothing here filters or aggregates; every number comes straight from the
//! earlier stage outputs so the document and the datasets cannot disagree
//! with them.

use crate::aggregate::{round2, Aggregates};
use crate::filter::FilterOutput;
use crate::recommend::Recommendations;
use crate::trend::TrendAnalysis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOP_INSTITUTIONS: usize = 5;
pub const TOP_TOPICS: usize = 8;
pub const CHART_TOP: usize = 8;

const OUTLOOK: [&str; 3] = [
    "- **2022-2023:** Foundation building in core AI topics",
    "- **2024:** Explosive growth in Generative AI and AI Ethics",
    "- **Future:** Expected expansion in Edge AI, XAI, and Industry Applications",
];

// ====== CHART DATASETS ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

// Counts past i64::MAX fall back to a float rather than wrapping.
impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Cell::Float(value as f64), Cell::Int)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Cell::Float(value as f64), Cell::Int)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(round2(value))
    }
}

/// A named table for an external chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub name: String,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ChartDataset {
    fn new(name: &str, title: &str, columns: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        ChartDataset {
            name: name.to_string(),
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$(Cell::from($cell)),*]
    };
}

pub fn chart_datasets(aggregates: &Aggregates) -> Vec<ChartDataset> {
    let institutions = aggregates
        .by_institution
        .iter()
        .take(CHART_TOP)
        .map(|s| row![s.institution.as_str(), s.paper_count, s.avg_citations])
        .collect();
    let topic_share = aggregates
        .by_topic
        .iter()
        .map(|s| row![s.topic.as_str(), s.paper_count])
        .collect();
    let topic_citations = aggregates
        .by_topic
        .iter()
        .take(CHART_TOP)
        .map(|s| row![s.topic.as_str(), s.total_citations])
        .collect();
    let series = aggregates
        .by_year_topic
        .iter()
        .map(|c| row![c.year, c.topic.as_str(), c.count])
        .collect();
    let countries = aggregates
        .by_country
        .iter()
        .map(|c| row![c.country.as_str(), c.paper_count, c.total_citations])
        .collect();

    vec![
        ChartDataset::new(
            "institutions",
            "Top Institutions: Papers vs Average Citations",
            &["institution", "paper_count", "avg_citations"],
            institutions,
        ),
        ChartDataset::new(
            "topics_pie",
            "Research Distribution by Topic",
            &["topic", "paper_count"],
            topic_share,
        ),
        ChartDataset::new(
            "topics_bar",
            "Top Topics by Total Citations",
            &["topic", "total_citations"],
            topic_citations,
        ),
        ChartDataset::new(
            "trends",
            "Research Trends Over Time",
            &["year", "topic", "count"],
            series,
        ),
        ChartDataset::new(
            "countries",
            "Research Output by Country",
            &["country", "paper_count", "total_citations"],
            countries,
        ),
    ]
}

// ====== DOCUMENT ======

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn medal(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{n}."),
    }
}

struct Document<'a> {
    filtered: &'a FilterOutput,
    aggregates: &'a Aggregates,
    trends: &'a TrendAnalysis,
    recommendations: &'a Recommendations,
    generated_at: DateTime<Utc>,
}

impl Document<'_> {
    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.filtered.summary;
        writeln!(f, "# 🎓 AI Research Trends Analysis Report")?;
        writeln!(f)?;
        writeln!(f, "**Generated:** {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "## Executive Summary")?;
        writeln!(f)?;
        writeln!(
            f,
            "This analysis covers **{}** research papers.",
            summary.papers_found
        )?;
        writeln!(f)?;
        writeln!(f, "### Key Metrics")?;
        writeln!(f, "- **Total Citations:** {}", group_thousands(summary.total_citations))?;
        writeln!(f, "- **Average Citations per Paper:** {:.1}", summary.avg_citations)?;
        writeln!(f, "- **Institutions Analyzed:** {}", self.aggregates.by_institution.len())?;
        writeln!(f, "- **Research Topics:** {}", self.aggregates.by_topic.len())?;
        writeln!(f, "- **Countries Represented:** {}", self.aggregates.by_country.len())?;
        writeln!(f)
    }

    fn write_institutions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "## 🏆 Top Institutions by Research Output")?;
        writeln!(f)?;
        let leaders = self.aggregates.by_institution.iter().take(TOP_INSTITUTIONS);
        for (idx, stats) in leaders.enumerate() {
            writeln!(f, "{} **{}**", medal(idx + 1), stats.institution)?;
            writeln!(f, "   - Papers: {}", stats.paper_count)?;
            writeln!(f, "   - Total Citations: {}", stats.total_citations)?;
            writeln!(f, "   - Average Citations: {:.1}", stats.avg_citations)?;
            writeln!(f, "   - Impact Sum: {:.1}", stats.impact_sum)?;
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_topics(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "## 📊 Top Research Topics")?;
        writeln!(f)?;
        for (idx, stats) in self.aggregates.by_topic.iter().take(TOP_TOPICS).enumerate() {
            match self.trends.growth_of(&stats.topic) {
                Some(growth) => {
                    writeln!(f, "{}. **{}** {}", idx + 1, stats.topic, growth.trend_label)?
                }
                None => writeln!(f, "{}. **{}**", idx + 1, stats.topic)?,
            }
            writeln!(f, "   - Papers: {}", stats.paper_count)?;
            writeln!(f, "   - Total Citations: {}", stats.total_citations)?;
            writeln!(f, "   - Avg Citations: {:.1}", stats.avg_citations)?;
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_hot_topics(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "## 🔥 Hot Topics & Emerging Trends")?;
        writeln!(f)?;
        for growth in &self.trends.hot_topics {
            writeln!(f, "### {} {}", growth.topic, growth.trend_label)?;
            writeln!(f, "- Growth Rate: **{}%**", growth.growth_rate)?;
            writeln!(f, "- Papers: {}", growth.observed_papers)?;
            writeln!(f, "- Avg Citations: {:.1}", growth.observed_avg_citations)?;
            writeln!(f)?;
        }

        let fastest = self.trends.hot_topics.first();
        let most_papers = self
            .aggregates
            .by_topic
            .iter()
            .min_by(|a, b| b.paper_count.cmp(&a.paper_count));
        let most_cited = self.aggregates.by_topic.first();
        if fastest.is_some() || most_papers.is_some() {
            writeln!(f, "### 🎯 Quick Insights")?;
            if let Some(g) = fastest {
                writeln!(f, "- **Fastest Growing:** {}", g.topic)?;
            }
            if let Some(t) = most_papers {
                writeln!(f, "- **Most Papers:** {}", t.topic)?;
            }
            if let Some(t) = most_cited {
                writeln!(f, "- **Highest Citations:** {}", t.topic)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_recommendations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "## 💡 Strategic Recommendations")?;
        let buckets = [
            ("Research Focus", &self.recommendations.research_focus),
            ("Collaboration Opportunities", &self.recommendations.collaboration),
            ("Emerging Areas", &self.recommendations.emerging_areas),
            ("Strategic Actions", &self.recommendations.strategic),
        ];
        for (label, items) in buckets {
            writeln!(f)?;
            writeln!(f, "### {label}")?;
            for item in items {
                writeln!(f, "- {item}")?;
            }
        }
        writeln!(f)
    }

    fn write_closing(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "## 📅 Timeline & Future Outlook")?;
        writeln!(f)?;
        writeln!(f, "The region is experiencing rapid growth in AI research:")?;
        writeln!(f)?;
        for line in OUTLOOK {
            writeln!(f, "{line}")?;
        }
        writeln!(f)?;
        writeln!(f, "---")?;
        writeln!(f)?;
        writeln!(f, "*Report generated by the research trends pipeline*")?;
        write!(
            f,
            "*Data Source: {} research papers*",
            self.filtered.summary.papers_found
        )
    }
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        self.write_institutions(f)?;
        self.write_topics(f)?;
        self.write_hot_topics(f)?;
        self.write_recommendations(f)?;
        self.write_closing(f)
    }
}

// ====== REPORT ======

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub document: String,
    pub datasets: Vec<ChartDataset>,
}

impl Report {
    pub fn dataset(&self, name: &str) -> Option<&ChartDataset> {
        self.datasets.iter().find(|d| d.name == name)
    }
}

pub fn build_report(
    filtered: &FilterOutput,
    aggregates: &Aggregates,
    trends: &TrendAnalysis,
    recommendations: &Recommendations,
    generated_at: DateTime<Utc>,
) -> Report {
    let document = Document {
        filtered,
        aggregates,
        trends,
        recommendations,
        generated_at,
    }
    .to_string();

    Report {
        generated_at,
        document,
        datasets: chart_datasets(aggregates),
    }
}
