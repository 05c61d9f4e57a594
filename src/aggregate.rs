use crate::corpus::PublicationRecord;
use crate::filter::mean;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionStats {
    pub institution: String,
    pub total_citations: u64,
    pub avg_citations: f64,
    pub paper_count: usize,
    pub impact_sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStats {
    pub topic: String,
    pub total_citations: u64,
    pub avg_citations: f64,
    pub paper_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTopicCount {
    pub year: i32,
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryStats {
    pub country: String,
    pub total_citations: u64,
    pub paper_count: usize,
}

/// Grouped views over a filtered record set. A group only exists if at
/// least one record falls into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Descending by total citations, ties by name.
    pub by_institution: Vec<InstitutionStats>,
    /// Descending by total citations, ties by name.
    pub by_topic: Vec<TopicStats>,
    /// Sparse, ascending by (year, topic).
    pub by_year_topic: Vec<YearTopicCount>,
    /// Ascending by country.
    pub by_country: Vec<CountryStats>,
}

impl Aggregates {
    pub fn is_empty(&self) -> bool {
        self.by_institution.is_empty()
            && self.by_topic.is_empty()
            && self.by_year_topic.is_empty()
            && self.by_country.is_empty()
    }
}

/// Rounds to two decimals. Display only; stored averages stay exact.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn by_citations_then_name(a: (u64, &str), b: (u64, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

#[derive(Default)]
struct Tally {
    citations: u64,
    papers: usize,
    impact: f64,
}

impl Tally {
    fn add(&mut self, record: &PublicationRecord) {
        self.citations += record.citations;
        self.papers += 1;
        self.impact += record.impact_weight;
    }
}

fn tally_by<'a>(
    records: &'a [PublicationRecord],
    key: impl Fn(&'a PublicationRecord) -> &'a str,
) -> BTreeMap<&'a str, Tally> {
    let mut groups: BTreeMap<&str, Tally> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().add(record);
    }
    groups
}

pub fn institution_view(records: &[PublicationRecord]) -> Vec<InstitutionStats> {
    let mut view: Vec<InstitutionStats> = tally_by(records, |r| r.institution.as_str())
        .into_iter()
        .map(|(name, t)| InstitutionStats {
            institution: name.to_string(),
            total_citations: t.citations,
            avg_citations: mean(t.citations, t.papers),
            paper_count: t.papers,
            impact_sum: t.impact,
        })
        .collect();
    view.sort_by(|a, b| {
        by_citations_then_name(
            (a.total_citations, &a.institution),
            (b.total_citations, &b.institution),
        )
    });
    view
}

pub fn topic_view(records: &[PublicationRecord]) -> Vec<TopicStats> {
    let mut view: Vec<TopicStats> = tally_by(records, |r| r.topic.as_str())
        .into_iter()
        .map(|(name, t)| TopicStats {
            topic: name.to_string(),
            total_citations: t.citations,
            avg_citations: mean(t.citations, t.papers),
            paper_count: t.papers,
        })
        .collect();
    view.sort_by(|a, b| {
        by_citations_then_name((a.total_citations, &a.topic), (b.total_citations, &b.topic))
    });
    view
}

pub fn year_topic_view(records: &[PublicationRecord]) -> Vec<YearTopicCount> {
    let mut counts: BTreeMap<(i32, &str), usize> = BTreeMap::new();
    for record in records {
        *counts.entry((record.year, record.topic.as_str())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((year, topic), count)| YearTopicCount {
            year,
            topic: topic.to_string(),
            count,
        })
        .collect()
}

pub fn country_view(records: &[PublicationRecord]) -> Vec<CountryStats> {
    tally_by(records, |r| r.country.as_str())
        .into_iter()
        .map(|(name, t)| CountryStats {
            country: name.to_string(),
            total_citations: t.citations,
            paper_count: t.papers,
        })
        .collect()
}

/// Builds the four grouped views. They do not depend on each other, so they
/// are computed on the rayon pool; each view is sorted deterministically.
pub fn aggregate(records: &[PublicationRecord]) -> Aggregates {
    let ((by_institution, by_topic), (by_year_topic, by_country)) = rayon::join(
        || rayon::join(|| institution_view(records), || topic_view(records)),
        || rayon::join(|| year_topic_view(records), || country_view(records)),
    );

    debug!(
        "Aggregated {} records into {} institutions, {} topics, {} year/topic cells, {} countries",
        records.len(),
        by_institution.len(),
        by_topic.len(),
        by_year_topic.len(),
        by_country.len()
    );

    Aggregates {
        by_institution,
        by_topic,
        by_year_topic,
        by_country,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn record(
        institution: &str,
        country: &str,
        topic: &str,
        year: i32,
        citations: u64,
    ) -> PublicationRecord {
        PublicationRecord {
            id: format!("{institution}-{topic}-{year}-{citations}"),
            title: String::new(),
            institution: institution.to_string(),
            country: country.to_string(),
            topic: topic.to_string(),
            year,
            month: 6,
            citations,
            author_count: 4,
            venue: "ACL".to_string(),
            open_access: true,
            impact_weight: 1.5,
        }
    }

    fn sample() -> Vec<PublicationRecord> {
        vec![
            record("AUC", "Egypt", "NLP", 2022, 30),
            record("KAUST", "Saudi Arabia", "NLP", 2023, 100),
            record("KAUST", "Saudi Arabia", "Robotics", 2023, 20),
            record("AUB", "Lebanon", "Robotics", 2024, 50),
            record("AUC", "Egypt", "Robotics", 2024, 20),
        ]
    }

    #[test]
    fn institution_view_orders_by_citations_then_name() {
        let view = institution_view(&sample());
        let names: Vec<&str> = view.iter().map(|s| s.institution.as_str()).collect();
        // AUB and AUC tie on 50
        assert_eq!(names, vec!["KAUST", "AUB", "AUC"]);
        assert_eq!(view[0].paper_count, 2);
        assert_eq!(view[0].avg_citations, 60.0);
        assert_eq!(view[2].impact_sum, 3.0);
    }

    #[test]
    fn topic_view_orders_by_citations() {
        let view = topic_view(&sample());
        assert_eq!(
            view,
            vec![
                TopicStats {
                    topic: "NLP".to_string(),
                    total_citations: 130,
                    avg_citations: 65.0,
                    paper_count: 2,
                },
                TopicStats {
                    topic: "Robotics".to_string(),
                    total_citations: 90,
                    avg_citations: 30.0,
                    paper_count: 3,
                },
            ]
        );
    }

    #[test]
    fn topic_view_breaks_citation_ties_by_name() {
        let records = vec![
            record("A", "UAE", "Zeta", 2023, 10),
            record("A", "UAE", "Alpha", 2023, 10),
            record("A", "UAE", "Mid", 2023, 20),
        ];
        let view = topic_view(&records);
        let names: Vec<&str> = view.iter().map(|s| s.topic.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn year_topic_view_is_sparse() {
        let view = year_topic_view(&sample());
        let cells: Vec<(i32, &str, usize)> =
            view.iter().map(|c| (c.year, c.topic.as_str(), c.count)).collect();
        assert_eq!(
            cells,
            vec![(2022, "NLP", 1), (2023, "NLP", 1), (2023, "Robotics", 1), (2024, "Robotics", 2)]
        );
    }

    #[test]
    fn country_view_groups_by_country() {
        let view = country_view(&sample());
        let rows: Vec<(&str, u64, usize)> = view
            .iter()
            .map(|c| (c.country.as_str(), c.total_citations, c.paper_count))
            .collect();
        assert_eq!(rows, vec![("Egypt", 50, 2), ("Lebanon", 50, 1), ("Saudi Arabia", 120, 2)]);
    }

    #[test]
    fn averages_keep_full_precision() {
        let records = vec![
            record("A", "UAE", "X", 2023, 1),
            record("A", "UAE", "X", 2023, 1),
            record("A", "UAE", "X", 2023, 2),
        ];
        let view = institution_view(&records);
        assert_eq!(view[0].avg_citations, 4.0 / 3.0);
        assert_eq!(round2(view[0].avg_citations), 1.33);
    }

    #[test]
    fn empty_input_yields_empty_views() {
        let aggregates = aggregate(&[]);
        assert!(aggregates.is_empty());
        assert_eq!(aggregates, Aggregates::default());
    }

    #[test]
    fn aggregate_matches_individual_views() {
        let records = sample();
        let aggregates = aggregate(&records);
        assert_eq!(aggregates.by_institution, institution_view(&records));
        assert_eq!(aggregates.by_topic, topic_view(&records));
        assert_eq!(aggregates.by_year_topic, year_topic_view(&records));
        assert_eq!(aggregates.by_country, country_view(&records));
    }

    proptest! {
        #[test]
        fn views_partition_the_same_citations(
            rows in prop::collection::vec(
                (
                    prop::sample::select(vec!["A", "B", "C", "D"]),
                    prop::sample::select(vec!["X", "Y", "Z"]),
                    2022i32..2025,
                    0u64..500,
                ),
                0..80,
            )
        ) {
            let records: Vec<PublicationRecord> = rows
                .into_iter()
                .map(|(inst, topic, year, cites)| record(inst, inst, topic, year, cites))
                .collect();
            let total: u64 = records.iter().map(|r| r.citations).sum();
            let a = aggregate(&records);

            prop_assert_eq!(a.by_institution.iter().map(|g| g.total_citations).sum::<u64>(), total);
            prop_assert_eq!(a.by_topic.iter().map(|g| g.total_citations).sum::<u64>(), total);
            prop_assert_eq!(a.by_country.iter().map(|g| g.total_citations).sum::<u64>(), total);
            prop_assert_eq!(a.by_year_topic.iter().map(|c| c.count).sum::<usize>(), records.len());
            prop_assert!(a.by_year_topic.iter().all(|c| c.count > 0));

            for pair in a.by_institution.windows(2) {
                prop_assert!(
                    pair[0].total_citations > pair[1].total_citations
                        || (pair[0].total_citations == pair[1].total_citations
                            && pair[0].institution < pair[1].institution)
                );
            }
            for pair in a.by_topic.windows(2) {
                prop_assert!(
                    pair[0].total_citations > pair[1].total_citations
                        || (pair[0].total_citations == pair[1].total_citations
                            && pair[0].topic < pair[1].topic)
                );
            }
        }
    }
}
