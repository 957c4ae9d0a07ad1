//! Stats command - load both corpora and report on them

use super::Context;
use crate::output::{OutputFormat, Status, format_count, format_duration, print_json};
use crate::progress::with_spinner;
use anyhow::Result;
use catalog_search::{CatalogSummary, Corpus, EntityKind, Searchable};
use std::collections::BTreeMap;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::time::Duration;

/// JSON output for stats
#[derive(Debug, Serialize)]
struct JsonStatsOutput {
    corpora: Vec<CorpusStats>,
    summary: CatalogSummary,
    metrics: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CorpusStats {
    kind: EntityKind,
    records: usize,
    pages: u32,
    load_ms: u128,
    #[serde(skip)]
    load_time: Duration,
}

impl CorpusStats {
    fn of<T: Searchable>(corpus: &Corpus<T>) -> Self {
        Self {
            kind: corpus.kind(),
            records: corpus.len(),
            pages: corpus.pages(),
            load_ms: corpus.load_time().as_millis(),
            load_time: corpus.load_time(),
        }
    }
}

/// Run stats
pub async fn run(ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog(None);
    let (composers, works) = with_spinner(ctx.interactive(), "Loading catalog…", catalog.load_all()).await?;
    let stats = [CorpusStats::of(composers.as_ref()), CorpusStats::of(works.as_ref())];
    let summary = CatalogSummary::from_corpora(&composers, &works);

    if ctx.format == OutputFormat::Json {
        return print_json(&JsonStatsOutput {
            corpora: stats.into(),
            summary,
            metrics: catalog_telemetry::metrics().export_json(),
        });
    }

    Status::header("Catalog corpora");
    for corpus in &stats {
        println!(
            "  {:<10} {:>8}  {}",
            corpus.kind.to_string().bold(),
            corpus.records.to_string().green(),
            format!(
                "{} in {}",
                format_count(corpus.pages as usize, "page", "pages"),
                format_duration(corpus.load_time)
            )
            .dimmed()
        );
    }

    Status::header("Catalog summary");
    println!(
        "  {} from {}, {} living",
        format_count(summary.total_composers, "composer", "composers"),
        format_count(summary.total_countries, "country", "countries"),
        summary.living_composers.to_string().green()
    );
    print_breakdown("Composers by period", &summary.composers_by_period);
    print_breakdown("Works by instrumentation", &summary.works_by_instrumentation);

    println!();
    Status::success(&format!(
        "{} searchable records",
        stats.iter().map(|s| s.records).sum::<usize>()
    ));
    Ok(())
}

/// Largest groups first, ties in name order
fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut rows: Vec<(&str, usize)> = counts.iter().map(|(label, n)| (label.as_str(), *n)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}

fn print_breakdown(title: &str, counts: &BTreeMap<String, usize>) {
    println!();
    println!("  {}", title.bold());
    for (label, count) in ranked(counts) {
        println!("    {label:<24} {:>6}", count.to_string().cyan());
    }
}
