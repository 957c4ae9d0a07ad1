//! Composer, work and combined search commands

use super::Context;
use crate::output::{OutputFormat, Status, format_count, print_json};
use crate::progress::with_spinner;
use anyhow::{Result, bail};
use catalog_api_client::{ComposerRecord, Period, WorkRecord};
use catalog_search::{
    CombinedSearch, ComposerFilter, Delivery, EntityKind, MatchPath, SearchOutcome, SearchResult, WorkFilter,
};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Composer filter flags
#[derive(Debug, Default, Args)]
pub struct ComposerFilterArgs {
    /// Style period, e.g. Baroque or Romantic
    #[arg(long)]
    period: Option<String>,

    /// Country name
    #[arg(long)]
    country: Option<String>,

    /// Only living (true) or deceased (false) composers
    #[arg(long)]
    living: Option<bool>,

    /// Earliest birth year
    #[arg(long, value_name = "YEAR")]
    born_after: Option<i32>,

    /// Latest birth year
    #[arg(long, value_name = "YEAR")]
    born_before: Option<i32>,
}

impl ComposerFilterArgs {
    pub fn to_filter(&self) -> ComposerFilter {
        let mut filter = ComposerFilter::new().with_birth_years(self.born_after, self.born_before);
        if let Some(period) = &self.period {
            filter = filter.with_period(Period::from(period.clone()));
        }
        if let Some(country) = &self.country {
            filter = filter.with_country(country);
        }
        if let Some(living) = self.living {
            filter = filter.with_living(living);
        }
        filter
    }
}

/// Work filter flags
#[derive(Debug, Default, Args)]
pub struct WorkFilterArgs {
    /// Composer id
    #[arg(long, value_name = "ID")]
    composer_id: Option<i64>,

    /// Instrumentation category, e.g. "Solo Guitar"
    #[arg(long)]
    instrumentation: Option<String>,

    /// Lowest difficulty level
    #[arg(long, value_name = "LEVEL")]
    difficulty_min: Option<i32>,

    /// Highest difficulty level
    #[arg(long, value_name = "LEVEL")]
    difficulty_max: Option<i32>,

    /// Earliest composition year
    #[arg(long, value_name = "YEAR")]
    year_min: Option<i32>,

    /// Latest composition year
    #[arg(long, value_name = "YEAR")]
    year_max: Option<i32>,
}

impl WorkFilterArgs {
    pub fn to_filter(&self) -> WorkFilter {
        let mut filter = WorkFilter::new()
            .with_difficulty(self.difficulty_min, self.difficulty_max)
            .with_years(self.year_min, self.year_max);
        if let Some(id) = self.composer_id {
            filter = filter.with_composer(id);
        }
        if let Some(category) = &self.instrumentation {
            filter = filter.with_instrumentation(category);
        }
        filter
    }
}

/// JSON output for a single-entity search
#[derive(Debug, Serialize)]
struct JsonSearchOutput<'a, T, F> {
    query: &'a str,
    kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a F>,
    #[serde(flatten)]
    outcome: &'a SearchOutcome<T>,
}

/// Run `composers`
pub async fn composers(
    ctx: &Context,
    query: &str,
    limit: Option<NonZeroUsize>,
    filter: &ComposerFilter,
) -> Result<()> {
    let catalog = ctx.catalog(limit);
    let outcome = with_spinner(
        ctx.interactive(),
        "Loading composers…",
        catalog.search_composers_where(query, filter),
    )
    .await?;

    match ctx.format {
        OutputFormat::Json => print_json(&JsonSearchOutput {
            query,
            kind: EntityKind::Composer,
            filter: (!filter.is_empty()).then_some(filter),
            outcome: &outcome,
        }),
        OutputFormat::Text => {
            print_section("Composers", query, outcome.results(), composer_line);
            Ok(())
        }
    }
}

/// Run `works`
pub async fn works(ctx: &Context, query: &str, limit: Option<NonZeroUsize>, filter: &WorkFilter) -> Result<()> {
    let catalog = ctx.catalog(limit);
    let outcome = with_spinner(
        ctx.interactive(),
        "Loading works…",
        catalog.search_works_where(query, filter),
    )
    .await?;

    match ctx.format {
        OutputFormat::Json => print_json(&JsonSearchOutput {
            query,
            kind: EntityKind::Work,
            filter: (!filter.is_empty()).then_some(filter),
            outcome: &outcome,
        }),
        OutputFormat::Text => {
            print_section("Works", query, outcome.results(), work_line);
            Ok(())
        }
    }
}

/// Run `all`
pub async fn all(ctx: &Context, query: &str, limit: Option<NonZeroUsize>) -> Result<()> {
    let combined = CombinedSearch::new(Arc::new(ctx.catalog(limit)));
    let delivery = with_spinner(ctx.interactive(), "Loading catalog…", combined.search_all(query)).await?;

    let results = match delivery {
        Delivery::Accepted(results) => results,
        Delivery::Superseded { token } => bail!("search {token} was superseded"),
    };

    match ctx.format {
        OutputFormat::Json => print_json(results.as_ref()),
        OutputFormat::Text => {
            print_section("Composers", query, &results.composers, composer_line);
            print_section("Works", query, &results.works, work_line);
            Ok(())
        }
    }
}

fn print_section<T>(title: &str, query: &str, results: &[SearchResult<T>], line: fn(&T) -> String) {
    let how = match results.first().map(|r| r.path) {
        Some(MatchPath::Fuzzy) => " (approximate)",
        _ => "",
    };
    Status::header(&format!(
        "{title} matching \"{query}\": {}{how}",
        format_count(results.len(), "result", "results")
    ));

    if results.is_empty() {
        println!("  {}", "No matches".dimmed());
        return;
    }

    for (n, result) in results.iter().enumerate() {
        let score = match result.path {
            MatchPath::Fuzzy => format!(" [{:.3}]", result.score),
            MatchPath::Substring => String::new(),
        };
        println!("  {:>3}. {}{}", n + 1, line(&result.item), score.dimmed());
    }
}

fn composer_line(composer: &ComposerRecord) -> String {
    let details: Vec<String> = [
        composer.life_span(),
        composer.country_name.clone(),
        composer.period.as_ref().map(ToString::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();

    if details.is_empty() {
        composer.full_name.bold().to_string()
    } else {
        format!("{}  {}", composer.full_name.bold(), details.join(" · ").dimmed())
    }
}

fn work_line(work: &WorkRecord) -> String {
    let details: Vec<&str> = [
        work.composer_name(),
        work.catalog_number.as_deref(),
        work.instrumentation(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if details.is_empty() {
        work.title.bold().to_string()
    } else {
        format!("{}  {}", work.title.bold(), details.join(" · ").dimmed())
    }
}
