use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::aggregate::{aggregate, TOP_DOMAINS_LIMIT};
use crate::cache::StatsCache;
use crate::config::Settings;
use crate::domain::redact_domain;
use crate::stats::StatsSnapshot;
use crate::tail::tail_lines;
use crate::utils::format_number;

/// Statistics and log access for the admin dashboard
pub struct Dashboard {
    log_file: PathBuf,
    tail_lines: usize,
    cache: StatsCache,
}

impl Dashboard {
    pub fn new(settings: &Settings) -> Self {
        Self {
            log_file: settings.log_file.clone(),
            tail_lines: settings.tail_lines,
            cache: StatsCache::new(settings.cache_file.clone(), settings.cache_ttl()),
        }
    }

    /// Current statistics. With `use_cache` a fresh cached snapshot is returned
    /// as-is; otherwise, or on a miss, the log is re-parsed and the cache refreshed.
    pub fn get_stats(&self, use_cache: bool) -> StatsSnapshot {
        if use_cache {
            if let Some(cached) = self.cache.get() {
                return cached;
            }
        }

        let start_time = Instant::now();
        let lines = tail_lines(&self.log_file, self.tail_lines);
        let snapshot = aggregate(&lines, Local::now());

        info!(
            action = "complete",
            component = "stats",
            file_path = ?self.log_file,
            line_count = lines.len(),
            total = snapshot.totals.total,
            duration_ms = start_time.elapsed().as_millis(),
            "Statistics recomputed from log"
        );

        self.cache.set(&snapshot);
        snapshot
    }

    /// The last `count` raw log lines, newest first.
    pub fn get_recent_logs(&self, count: usize) -> Vec<String> {
        let mut lines = tail_lines(&self.log_file, count);
        lines.reverse();
        lines
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

pub fn print_stats(snapshot: &StatsSnapshot, top: usize, redact: bool) {
    println!("\n--- Spam Filter Statistics ({}) ---", snapshot.generated_at);

    for (label, counts) in [
        ("All time", &snapshot.totals),
        ("Today", &snapshot.today),
        ("Last 24h", &snapshot.last_24h),
    ] {
        println!(
            "{:<9} {} checked, {} blocked, {} safe",
            format!("{label}:"),
            format_number(counts.total),
            format_number(counts.blocked),
            format_number(counts.safe)
        );
    }

    if !snapshot.by_hour.is_empty() {
        println!("\nBy hour (last 24h):");
        for (hour, counts) in &snapshot.by_hour {
            println!(
                "- {}: {} blocked, {} safe",
                hour,
                format_number(counts.blocked),
                format_number(counts.safe)
            );
        }
    }

    let top = top.min(TOP_DOMAINS_LIMIT);
    if !snapshot.top_blocked_domains.is_empty() {
        println!(
            "\nTop {} blocked sender domains:",
            top.min(snapshot.top_blocked_domains.len())
        );
        for entry in snapshot.top_blocked_domains.iter().take(top) {
            let display_domain = if redact {
                redact_domain(&entry.domain)
            } else {
                entry.domain.clone()
            };
            println!("- {}: {}", display_domain, format_number(entry.count));
        }
    }

    if !snapshot.last_entries.is_empty() {
        println!("\nRecent entries:");
        for entry in &snapshot.last_entries {
            println!(
                "- {} {:<8} score={:<6} from={} ip={}",
                entry.timestamp, entry.status, entry.score, entry.from, entry.ip
            );
        }
    }
}
