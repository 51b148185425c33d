//! eventide CLI
//!
//! Inspect the response cache configuration and watch the cache work in
//! front of a simulated event backend.

mod backend;
mod service;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eventide_cache::{CacheManager, CacheRead, Freshness, PolicyResolver};
use eventide_core::{CacheConfig, CachePolicy};

use crate::backend::MemoryBackend;
use crate::service::EventService;

/// eventide - response cache tooling
#[derive(Parser)]
#[command(name = "eventide")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON cache configuration (defaults to EVENTIDE_CACHE_CONFIG or the built-in table)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the policy table
    Policies,

    /// Show which policy applies to each key
    Resolve {
        /// Cache keys, e.g. `event:42` or `metrics:admin`
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Run the cache against an in-memory event backend
    Demo {
        /// TTL for event keys in milliseconds
        #[arg(long, default_value = "200")]
        ttl_ms: u64,
        /// Simulated backend latency in milliseconds
        #[arg(long, default_value = "50")]
        latency_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "eventide=debug,eventide_cache=debug,info"
    } else {
        "eventide=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Policies => cmd_policies(&config),
        Commands::Resolve { keys } => cmd_resolve(&config, &keys),
        Commands::Demo { ttl_ms, latency_ms } => cmd_demo(config, ttl_ms, latency_ms).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<CacheConfig> {
    match path {
        Some(path) => CacheConfig::from_json_file(path)
            .with_context(|| format!("Failed to load cache config from {}", path.display())),
        None => CacheConfig::from_env().context("Failed to load cache config from environment"),
    }
}

fn describe(policy: CachePolicy) -> String {
    let swr = if policy.stale_while_revalidate {
        "stale-while-revalidate".green()
    } else {
        "blocking refetch".yellow()
    };
    format!("ttl {:>8}  {}", format!("{}ms", policy.ttl.as_millis()), swr)
}

/// Print the policy table
fn cmd_policies(config: &CacheConfig) -> Result<()> {
    println!("{}", "Cache policies (first match wins)".cyan().bold());
    println!();

    for rule in &config.rules {
        println!("  {:<20} {}", rule.prefix.bold(), describe(rule.policy));
    }
    println!("  {:<20} {}", "(default)".dimmed(), describe(config.default_policy));
    println!();
    println!("  sweep every {}ms", config.sweep_interval.as_millis());

    Ok(())
}

/// Resolve keys against the policy table
fn cmd_resolve(config: &CacheConfig, keys: &[String]) -> Result<()> {
    let resolver = PolicyResolver::from_config(config);

    for key in keys {
        let rule = config.rules.iter().find(|r| r.matches(key));
        let source = rule.map_or_else(|| "(default)".dimmed().to_string(), |r| r.prefix.clone());
        println!("{:<28} {:<20} {}", key.bold(), source, describe(resolver.resolve(key)));
    }

    Ok(())
}

fn report<T>(step: &str, read: &CacheRead<T>, summary: impl std::fmt::Display) {
    let freshness = match read.freshness {
        Freshness::Fresh => "fresh".green(),
        Freshness::Stale => "stale".yellow(),
        Freshness::Fetched => "fetched".cyan(),
    };
    println!("  {:<36} {:<8} {}", step, freshness, summary);
}

/// Run the cache against an in-memory backend
async fn cmd_demo(config: CacheConfig, ttl_ms: u64, latency_ms: u64) -> Result<()> {
    println!("{}", "Running cache demo...".cyan().bold());
    println!();

    let ttl = Duration::from_millis(ttl_ms);
    let latency = Duration::from_millis(latency_ms);

    // Event keys get the requested TTL ahead of whatever the table says.
    let mut demo_config = CacheConfig::default()
        .with_rule("events", ttl, true)
        .with_rule("event:", ttl, true)
        .with_default_policy(config.default_policy)
        .with_sweep_interval(config.sweep_interval);
    demo_config.rules.extend(config.rules);

    let cache = CacheManager::new(demo_config).context("Failed to start cache")?;
    let backend = Arc::new(MemoryBackend::new(latency));
    backend.seed("Beach cleanup");
    backend.seed("Food bank shift");

    let service = EventService::new(backend.clone(), cache.clone());

    let read = service.list_events().await?;
    report("list events (cold)", &read, format!("{} events", read.value.len()));

    let read = service.list_events().await?;
    report("list events (warm)", &read, format!("{} events", read.value.len()));

    backend.seed("Tree planting");
    tokio::time::sleep(ttl + Duration::from_millis(10)).await;

    let read = service.list_events().await?;
    report("list events (after ttl)", &read, format!("{} events, refresh started", read.value.len()));

    tokio::time::sleep(latency + Duration::from_millis(10)).await;

    let read = service.list_events().await?;
    report("list events (after refresh)", &read, format!("{} events", read.value.len()));

    let read = service.get_event(1).await?;
    report("get event 1", &read, &read.value.title);

    let created = service.create_event("Shelter meal prep").await?;
    println!("  {:<36} {:<8} event {}", "create event", "", created.id);

    let read = service.list_events().await?;
    report("list events (after create)", &read, format!("{} events", read.value.len()));

    println!();
    println!("{}", "Stats".cyan().bold());
    let stats = cache.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("  hit ratio: {:.0}%", stats.hit_ratio() * 100.0);
    println!("  backend calls: {}", backend.calls());

    cache.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "rules": [ { "prefix": "events", "ttl_ms": 500, "stale_while_revalidate": true } ] }"#)
            .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].policy, CachePolicy::from_millis(500, true));
    }

    #[test]
    fn test_load_config_reports_path() {
        let err = load_config(Some(Path::new("/nonexistent/eventide.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/eventide.json"));
    }

    #[test]
    fn test_describe_policy() {
        colored::control::set_override(false);
        let text = describe(CachePolicy::from_millis(120_000, true));
        assert!(text.contains("120000ms"));
        assert!(text.contains("stale-while-revalidate"));
    }
}
