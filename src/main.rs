use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use research_trends::export;
use research_trends::synthetic;
use research_trends::{run, Corpus, Criteria, Stage};
use std::collections::BTreeSet;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "research_trends")]
#[command(about = "Research publication trend analyzer")]
struct Cli {
    /// Corpus directory (institutions.json, topics.json, records/part_*.jsonl[.gz]).
    /// A synthetic corpus is generated when omitted.
    #[arg(short, long)]
    corpus_dir: Option<PathBuf>,

    /// Papers in the synthetic corpus
    #[arg(long, default_value_t = synthetic::DEFAULT_PAPERS)]
    papers: usize,

    /// Seed for the synthetic corpus
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Write the corpus in use to this directory (loadable with --corpus-dir)
    #[arg(long)]
    save_corpus: Option<PathBuf>,

    /// JSON criteria file; overrides the selection flags below
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Institutions to include (comma-separated, default: first 5 in the corpus)
    #[arg(short, long, value_delimiter = ',')]
    institutions: Vec<String>,

    /// Topics to include (comma-separated, default: first 6 in the corpus)
    #[arg(short, long, value_delimiter = ',')]
    topics: Vec<String>,

    #[arg(long, default_value = "2022")]
    year_min: i32,

    #[arg(long, default_value = "2024")]
    year_max: i32,

    #[arg(long, default_value = "0")]
    min_citations: u64,

    /// Output directory for the report, analysis JSON and exports
    #[arg(short, long, default_value = "./research_report")]
    output_dir: PathBuf,

    /// Number of worker threads (default: all cores)
    #[arg(short, long)]
    workers: Option<usize>,
}

fn load_corpus(args: &Cli) -> Result<Corpus> {
    let corpus = match &args.corpus_dir {
        Some(dir) => Corpus::load(dir)?,
        None => synthetic::generate(args.papers, args.seed),
    };

    let issues = corpus.integrity_issues();
    if !issues.is_empty() {
        warn!("Corpus has {} integrity issues", issues.len());
        for issue in issues.iter().take(20) {
            warn!("  {}", issue);
        }
    }
    Ok(corpus)
}

fn resolve_criteria(args: &Cli, corpus: &Corpus) -> Result<Criteria> {
    if let Some(path) = &args.criteria {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let criteria =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        return Ok(criteria);
    }

    let institutions: BTreeSet<String> = if args.institutions.is_empty() {
        corpus.institutions.iter().take(5).map(|i| i.name.clone()).collect()
    } else {
        args.institutions.iter().map(|s| s.trim().to_string()).collect()
    };
    let topics: BTreeSet<String> = if args.topics.is_empty() {
        corpus.topics.iter().take(6).map(|t| t.name.clone()).collect()
    } else {
        args.topics.iter().map(|s| s.trim().to_string()).collect()
    };

    Ok(Criteria {
        institutions,
        topics,
        year_min: args.year_min,
        year_max: args.year_max,
        min_citations: args.min_citations,
    })
}

async fn write_text(path: &Path, contents: String) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Cli::parse();

    let num_workers = args.workers.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .thread_name(|i| format!("research-worker-{}", i))
        .build_global()?;
    info!("Using {} workers", num_workers);

    let corpus = load_corpus(&args)?;
    if let Some(dir) = &args.save_corpus {
        corpus.write(dir)?;
    }

    let criteria = resolve_criteria(&args, &corpus)?;
    info!(
        "Criteria: {} institutions, {} topics, years {}-{}, min {} citations",
        criteria.institutions.len(),
        criteria.topics.len(),
        criteria.year_min,
        criteria.year_max,
        criteria.min_citations
    );

    let progress = ProgressBar::new(Stage::ALL.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:50.cyan/blue} {pos}/{len} stages | {msg}",
    )?);
    progress.set_message("Running analysis...");

    let output = run(&corpus, &criteria, Utc::now(), |stage| {
        progress.set_message(format!("{} done", stage));
        progress.inc(1);
    });
    progress.finish_with_message("All stages completed");

    let output_path = args.output_dir.as_path();
    create_dir_all(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    info!("Output directory: {}", output_path.display());

    let stamp = output.report.generated_at.format("%Y%m%d_%H%M");
    write_text(
        &output_path.join(format!("research_report_{}.md", stamp)),
        output.report.document.clone(),
    )
    .await?;
    write_text(
        &output_path.join("analysis.json"),
        serde_json::to_string_pretty(&output)?,
    )
    .await?;

    export::write_records_csv(&output_path.join("research_data.csv"), &output.filtered.records)?;
    export::write_institutions_csv(
        &output_path.join("institution_stats.csv"),
        &output.aggregates.by_institution,
    )?;
    export::write_records_parquet(
        &output_path.join("research_data.parquet"),
        &output.filtered.records,
    )?;
    export::write_institutions_parquet(
        &output_path.join("institution_stats.parquet"),
        &output.aggregates.by_institution,
    )?;

    // Print final statistics
    info!("Final Analysis Statistics:");
    info!("  Papers found: {}", output.filtered.summary.papers_found);
    info!("  Total citations: {}", output.filtered.summary.total_citations);
    info!("  Institutions: {}", output.aggregates.by_institution.len());
    info!("  Topics: {}", output.aggregates.by_topic.len());
    if let Some(hot) = output.trends.hot_topics.first() {
        info!("  Fastest growing topic: {} ({}%)", hot.topic, hot.growth_rate);
    }

    info!("Report and exports written to: {}", output_path.display());

    Ok(())
}
