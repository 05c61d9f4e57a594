use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use glob::glob;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const INSTITUTIONS_FILE: &str = "institutions.json";
pub const TOPICS_FILE: &str = "topics.json";
pub const COLLABORATIONS_FILE: &str = "collaborations.json";
pub const RECORDS_DIR: &str = "records";

// ====== ENTITIES ======

/// One research paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub id: String,
    pub title: String,
    pub institution: String,
    pub country: String,
    pub topic: String,
    pub year: i32,
    pub month: u8,
    pub citations: u64,
    pub author_count: u32,
    pub venue: String,
    pub open_access: bool,
    pub impact_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    pub country: String,
    pub rank: u32,
}

/// Qualitative growth trajectory carried as static topic metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    #[serde(alias = "→")]
    Stable,
    #[serde(alias = "↑")]
    Moderate,
    #[serde(alias = "↑↑")]
    High,
    #[serde(alias = "↑↑↑")]
    Explosive,
}

impl TrendLabel {
    /// Legend buckets: explosive above 50%, high from 25%, moderate from 10%.
    pub fn for_growth(growth_rate: f64) -> Self {
        if growth_rate > 50.0 {
            TrendLabel::Explosive
        } else if growth_rate >= 25.0 {
            TrendLabel::High
        } else if growth_rate >= 10.0 {
            TrendLabel::Moderate
        } else {
            TrendLabel::Stable
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            TrendLabel::Stable => "→",
            TrendLabel::Moderate => "↑",
            TrendLabel::High => "↑↑",
            TrendLabel::Explosive => "↑↑↑",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TopicEntry")]
pub struct Topic {
    pub name: String,
    pub trend_label: TrendLabel,
    pub growth_rate: f64,
}

/// On-disk topic; the label may be left out and is then bucketed from the
/// growth rate.
#[derive(Deserialize)]
struct TopicEntry {
    name: String,
    trend_label: Option<TrendLabel>,
    growth_rate: f64,
}

impl From<TopicEntry> for Topic {
    fn from(entry: TopicEntry) -> Self {
        Topic {
            trend_label: entry
                .trend_label
                .unwrap_or_else(|| TrendLabel::for_growth(entry.growth_rate)),
            name: entry.name,
            growth_rate: entry.growth_rate,
        }
    }
}

/// Unordered institution pair. Part of the corpus only; no stage reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationEdge {
    pub institution_a: String,
    pub institution_b: String,
    pub paper_count: u32,
    pub citation_count: u64,
}

/// Everything the pipeline reads. Loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub institutions: Vec<Institution>,
    pub topics: Vec<Topic>,
    pub records: Vec<PublicationRecord>,
    #[serde(default)]
    pub collaborations: Vec<CollaborationEdge>,
}

// ====== LOADING ======

fn find_record_parts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for suffix in ["jsonl", "jsonl.gz"] {
        let pattern = format!("{}/{}/part_*.{}", dir.display(), RECORDS_DIR, suffix);
        info!("Searching for record parts with pattern: {}", pattern);

        for entry in glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if path.metadata()?.len() > 0 {
                        files.push(path);
                    }
                }
                Err(e) => warn!("Error reading glob entry: {}", e),
            }
        }
    }

    files.sort();
    info!("Found {} record parts", files.len());
    Ok(files)
}

fn read_json_array<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let items = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(items)
}

fn read_record_part(path: &Path) -> Result<Vec<PublicationRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let inner: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let reader = BufReader::new(inner);

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: PublicationRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

impl Corpus {
    /// Reads a corpus directory: `institutions.json`, `topics.json`, an
    /// optional `collaborations.json` and `records/part_*.jsonl[.gz]`.
    pub fn load(dir: &Path) -> Result<Self> {
        info!("Loading corpus from {}", dir.display());

        let institutions = read_json_array(&dir.join(INSTITUTIONS_FILE))?;
        let topics = read_json_array(&dir.join(TOPICS_FILE))?;
        let collab_path = dir.join(COLLABORATIONS_FILE);
        let collaborations = if collab_path.exists() {
            read_json_array(&collab_path)?
        } else {
            Vec::new()
        };

        // collect() on an indexed parallel iterator keeps path order
        let parts = find_record_parts(dir)?;
        let chunks: Result<Vec<Vec<PublicationRecord>>> =
            parts.par_iter().map(|path| read_record_part(path)).collect();
        let records: Vec<PublicationRecord> = chunks?.into_iter().flatten().collect();

        info!(
            "Loaded {} records, {} institutions, {} topics, {} collaboration edges",
            records.len(),
            institutions.len(),
            topics.len(),
            collaborations.len()
        );

        Ok(Corpus {
            institutions,
            topics,
            records,
            collaborations,
        })
    }

    /// Writes the layout `load` reads, with all records in one gzip part.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let records_dir = dir.join(RECORDS_DIR);
        create_dir_all(&records_dir)
            .with_context(|| format!("creating {}", records_dir.display()))?;

        write_json_array(&dir.join(INSTITUTIONS_FILE), &self.institutions)?;
        write_json_array(&dir.join(TOPICS_FILE), &self.topics)?;
        write_json_array(&dir.join(COLLABORATIONS_FILE), &self.collaborations)?;

        let part_path = records_dir.join("part_0000.jsonl.gz");
        let file = File::create(&part_path)
            .with_context(|| format!("creating {}", part_path.display()))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        for record in &self.records {
            serde_json::to_writer(&mut encoder, record)?;
            encoder.write_all(b"\n")?;
        }
        encoder.finish()?.flush()?;

        info!("Wrote {} records to {}", self.records.len(), dir.display());
        Ok(())
    }

    /// Referential-integrity defects, one description per offending field.
    pub fn integrity_issues(&self) -> Vec<String> {
        let countries: HashMap<&str, &str> = self
            .institutions
            .iter()
            .map(|inst| (inst.name.as_str(), inst.country.as_str()))
            .collect();
        let known_topic = |name: &str| self.topics.iter().any(|t| t.name == name);

        let mut issues = Vec::new();
        for record in &self.records {
            match countries.get(record.institution.as_str()) {
                None => issues.push(format!(
                    "{}: unknown institution '{}'",
                    record.id, record.institution
                )),
                Some(country) if *country != record.country => issues.push(format!(
                    "{}: country '{}' does not match institution '{}' ({})",
                    record.id, record.country, record.institution, country
                )),
                Some(_) => {}
            }
            if !known_topic(&record.topic) {
                issues.push(format!("{}: unknown topic '{}'", record.id, record.topic));
            }
            if !(1..=12).contains(&record.month) {
                issues.push(format!("{}: month {} out of range", record.id, record.month));
            }
            if record.author_count == 0 {
                issues.push(format!("{}: author count is zero", record.id));
            }
            if record.impact_weight.is_nan() || record.impact_weight < 0.0 {
                issues.push(format!(
                    "{}: impact weight {} is not a non-negative number",
                    record.id, record.impact_weight
                ));
            }
        }
        issues
    }
}

fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, institution: &str, country: &str, topic: &str) -> PublicationRecord {
        PublicationRecord {
            id: id.to_string(),
            title: format!("{topic} study"),
            institution: institution.to_string(),
            country: country.to_string(),
            topic: topic.to_string(),
            year: 2023,
            month: 4,
            citations: 10,
            author_count: 3,
            venue: "ICML".to_string(),
            open_access: true,
            impact_weight: 2.0,
        }
    }

    fn small_corpus() -> Corpus {
        Corpus {
            institutions: vec![Institution {
                name: "KAUST".to_string(),
                country: "Saudi Arabia".to_string(),
                rank: 1,
            }],
            topics: vec![Topic {
                name: "NLP".to_string(),
                trend_label: TrendLabel::High,
                growth_rate: 25.0,
            }],
            records: vec![record("P0001", "KAUST", "Saudi Arabia", "NLP")],
            collaborations: Vec::new(),
        }
    }

    #[test]
    fn trend_label_accepts_glyphs_and_names() {
        let labels: Vec<TrendLabel> =
            serde_json::from_str(r#"["→", "moderate", "↑↑", "↑↑↑"]"#).unwrap();
        assert_eq!(
            labels,
            vec![
                TrendLabel::Stable,
                TrendLabel::Moderate,
                TrendLabel::High,
                TrendLabel::Explosive
            ]
        );
        assert_eq!(serde_json::to_string(&TrendLabel::High).unwrap(), "\"high\"");
        assert_eq!(TrendLabel::Explosive.to_string(), "↑↑↑");
        assert!(TrendLabel::Stable < TrendLabel::Explosive);
    }

    #[test]
    fn growth_buckets_follow_legend() {
        assert_eq!(TrendLabel::for_growth(85.0), TrendLabel::Explosive);
        assert_eq!(TrendLabel::for_growth(35.0), TrendLabel::High);
        assert_eq!(TrendLabel::for_growth(15.0), TrendLabel::Moderate);
        assert_eq!(TrendLabel::for_growth(3.0), TrendLabel::Stable);
        assert_eq!(TrendLabel::for_growth(-12.0), TrendLabel::Stable);
    }

    #[test]
    fn topic_label_defaults_from_growth() {
        let topics: Vec<Topic> = serde_json::from_str(
            r#"[{"name": "Edge AI", "growth_rate": 35},
                {"name": "AI Ethics", "trend_label": "↑↑↑", "growth_rate": 45}]"#,
        )
        .unwrap();
        assert_eq!(topics[0].trend_label, TrendLabel::High);
        assert_eq!(topics[1].trend_label, TrendLabel::Explosive);
    }

    #[test]
    fn clean_corpus_has_no_issues() {
        assert!(small_corpus().integrity_issues().is_empty());
    }

    #[test]
    fn integrity_issues_reports_each_defect() {
        let mut corpus = small_corpus();
        corpus.records.push(record("P0002", "Nowhere U", "Mars", "NLP"));
        corpus.records.push(record("P0003", "KAUST", "Egypt", "Alchemy"));
        corpus.records[0].month = 13;

        let issues = corpus.integrity_issues();
        assert_eq!(issues.len(), 4);
        assert!(issues[0].contains("month 13"));
        assert!(issues[1].contains("unknown institution 'Nowhere U'"));
        assert!(issues[2].contains("does not match institution 'KAUST'"));
        assert!(issues[3].contains("unknown topic 'Alchemy'"));
    }

    #[test]
    fn write_then_load_restores_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = small_corpus();
        corpus.write(dir.path()).unwrap();

        let loaded = Corpus::load(dir.path()).unwrap();
        assert_eq!(loaded, corpus);
    }

    #[test]
    fn load_reads_plain_parts_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = small_corpus();
        corpus.write(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join(COLLABORATIONS_FILE)).unwrap();

        let mut extra = record("P0009", "KAUST", "Saudi Arabia", "NLP");
        extra.citations = 99;
        let line = serde_json::to_string(&extra).unwrap();
        std::fs::write(
            dir.path().join(RECORDS_DIR).join("part_0001.jsonl"),
            format!("{line}\n\n"),
        )
        .unwrap();

        let loaded = Corpus::load(dir.path()).unwrap();
        assert!(loaded.collaborations.is_empty());
        let ids: Vec<&str> = loaded.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["P0001", "P0009"]);
    }

    #[test]
    fn load_reports_the_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        small_corpus().write(dir.path()).unwrap();
        std::fs::write(
            dir.path().join(RECORDS_DIR).join("part_0002.jsonl"),
            "{\"id\": \"broken\"}\n",
        )
        .unwrap();

        let err = Corpus::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("part_0002.jsonl:1"));
    }

    #[test]
    fn load_skips_empty_and_foreign_parts() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = small_corpus();
        corpus.write(dir.path()).unwrap();
        let records_dir = dir.path().join(RECORDS_DIR);
        File::create(records_dir.join("part_0001.jsonl.gz")).unwrap();
        std::fs::write(records_dir.join("part_0002.jsonl.bak"), "not json\n").unwrap();

        let loaded = Corpus::load(dir.path()).unwrap();
        assert_eq!(loaded, corpus);
    }

    #[test]
    fn load_names_the_unreadable_part() {
        let dir = tempfile::tempdir().unwrap();
        small_corpus().write(dir.path()).unwrap();
        std::fs::write(
            dir.path().join(RECORDS_DIR).join("part_0003.jsonl.gz"),
            "plain text, not gzip\n",
        )
        .unwrap();

        let err = Corpus::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("part_0003.jsonl.gz:1"));
    }
}
