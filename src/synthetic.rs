//! Built-in reference data and a seeded synthetic corpus.
//!
//! The pipeline does not depend on anything here; this is just one corpus
//! source among others, used when no corpus directory is given.

use crate::corpus::{CollaborationEdge, Corpus, Institution, PublicationRecord, Topic, TrendLabel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

pub const DEFAULT_PAPERS: usize = 500;
pub const DEFAULT_COLLABORATIONS: usize = 50;
pub const YEARS: [i32; 3] = [2022, 2023, 2024];
pub const VENUES: [&str; 8] = ["NeurIPS", "CVPR", "ICML", "AAAI", "ACL", "ICLR", "KDD", "Local"];

const INSTITUTIONS: [(&str, &str); 9] = [
    ("KAUST", "Saudi Arabia"),
    ("MBZUAI", "UAE"),
    ("AUC", "Egypt"),
    ("Qatar University", "Qatar"),
    ("UAE University", "UAE"),
    ("King Saud University", "Saudi Arabia"),
    ("Cairo University", "Egypt"),
    ("AUB", "Lebanon"),
    ("UAEU", "UAE"),
];

const TOPICS: [(&str, TrendLabel, f64); 10] = [
    ("Computer Vision", TrendLabel::Moderate, 15.0),
    ("NLP", TrendLabel::High, 25.0),
    ("Deep Learning", TrendLabel::Stable, 5.0),
    ("Robotics", TrendLabel::Moderate, 12.0),
    ("Machine Learning", TrendLabel::Stable, 3.0),
    ("AI Ethics", TrendLabel::Explosive, 45.0),
    ("Generative AI", TrendLabel::Explosive, 85.0),
    ("Reinforcement Learning", TrendLabel::Moderate, 18.0),
    ("Edge AI", TrendLabel::High, 35.0),
    ("Explainable AI", TrendLabel::High, 28.0),
];

pub fn reference_institutions() -> Vec<Institution> {
    INSTITUTIONS
        .iter()
        .zip(1..)
        .map(|(&(name, country), rank)| Institution {
            name: name.to_string(),
            country: country.to_string(),
            rank,
        })
        .collect()
}

pub fn reference_topics() -> Vec<Topic> {
    TOPICS
        .iter()
        .map(|&(name, trend_label, growth_rate)| Topic {
            name: name.to_string(),
            trend_label,
            growth_rate,
        })
        .collect()
}

/// Older papers have had longer to collect citations.
fn age_adjusted_citations(base: u64, year: i32) -> u64 {
    match year {
        2022 => base * 3 / 2,
        2024 => base * 7 / 10,
        _ => base,
    }
}

/// Generates `papers` records over the reference institutions and topics.
/// The same seed always yields the same corpus.
pub fn generate(papers: usize, seed: u64) -> Corpus {
    let mut rng = StdRng::seed_from_u64(seed);
    let institutions = reference_institutions();
    let topics = reference_topics();

    let mut records = Vec::with_capacity(papers);
    for i in 0..papers {
        let inst = &institutions[rng.gen_range(0..institutions.len())];
        let topic = &topics[rng.gen_range(0..topics.len())];
        let year = YEARS[rng.gen_range(0..YEARS.len())];
        let citations = age_adjusted_citations(rng.gen_range(5..=150), year);

        records.push(PublicationRecord {
            id: format!("P{:04}", i + 1),
            title: format!("{} Applications in Smart Systems - Study {}", topic.name, i + 1),
            institution: inst.name.clone(),
            country: inst.country.clone(),
            topic: topic.name.clone(),
            year,
            month: rng.gen_range(1..=12),
            citations,
            author_count: rng.gen_range(2..=8),
            venue: VENUES[rng.gen_range(0..VENUES.len())].to_string(),
            open_access: rng.gen_bool(0.5),
            impact_weight: f64::from(rng.gen_range(1..=5u32)),
        });
    }

    let names: Vec<&str> = institutions.iter().map(|i| i.name.as_str()).collect();
    let collaborations = (0..DEFAULT_COLLABORATIONS)
        .map(|_| {
            let pair: Vec<&&str> = names.choose_multiple(&mut rng, 2).collect();
            CollaborationEdge {
                institution_a: pair[0].to_string(),
                institution_b: pair[1].to_string(),
                paper_count: rng.gen_range(3..=15),
                citation_count: rng.gen_range(50..=300),
            }
        })
        .collect();

    info!("Generated synthetic corpus of {} records (seed {})", papers, seed);

    Corpus {
        institutions,
        topics,
        records,
        collaborations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_corpus() {
        assert_eq!(generate(50, 7), generate(50, 7));
        assert_ne!(generate(50, 7).records, generate(50, 8).records);
    }

    #[test]
    fn generated_corpus_is_referentially_sound() {
        let corpus = generate(DEFAULT_PAPERS, 42);
        assert_eq!(corpus.records.len(), DEFAULT_PAPERS);
        assert_eq!(corpus.collaborations.len(), DEFAULT_COLLABORATIONS);
        assert!(corpus.integrity_issues().is_empty());
        for edge in &corpus.collaborations {
            assert_ne!(edge.institution_a, edge.institution_b);
        }
    }

    #[test]
    fn citations_scale_with_age() {
        assert_eq!(age_adjusted_citations(100, 2022), 150);
        assert_eq!(age_adjusted_citations(100, 2023), 100);
        assert_eq!(age_adjusted_citations(100, 2024), 70);
    }

    #[test]
    fn reference_labels_match_growth_legend_where_explosive() {
        let topics = reference_topics();
        let generative = topics.iter().find(|t| t.name == "Generative AI").unwrap();
        assert_eq!(generative.trend_label, TrendLabel::for_growth(generative.growth_rate));
        assert_eq!(reference_institutions()[8].rank, 9);
    }
}
