use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use tracing::debug;

use crate::domain::extract_domain;
use crate::parser::{parse_line, LogEntry, TIMESTAMP_FORMAT};
use crate::stats::{DomainCount, EntrySummary, StatsSnapshot};

pub const TOP_DOMAINS_LIMIT: usize = 10;
pub const RECENT_ENTRIES_LIMIT: usize = 50;

/// Folds log lines into a [`StatsSnapshot`] relative to a fixed processing time.
pub struct Aggregator {
    now: DateTime<Local>,
    today: NaiveDate,
    window_start: DateTime<Local>,
    snapshot: StatsSnapshot,
    domain_counts: HashMap<String, u64>,
    recent: VecDeque<EntrySummary>,
    skipped: usize,
}

impl Aggregator {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now,
            today: now.date_naive(),
            window_start: now - Duration::seconds(86_400),
            snapshot: StatsSnapshot::default(),
            domain_counts: HashMap::new(),
            recent: VecDeque::with_capacity(RECENT_ENTRIES_LIMIT + 1),
            skipped: 0,
        }
    }

    /// Feed one raw line. Lines that do not parse, debug lines and lines without
    /// a status are skipped.
    pub fn push_line(&mut self, line: &str) {
        match parse_line(line) {
            Some(entry) if !entry.is_debug() && entry.fields.status.is_some() => {
                self.push_entry(&entry)
            }
            _ => self.skipped += 1,
        }
    }

    fn push_entry(&mut self, entry: &LogEntry) {
        let fields = &entry.fields;
        let blocked = fields.is_blocked();

        self.snapshot.totals.record(blocked);

        if entry.timestamp.date() == self.today {
            self.snapshot.today.record(blocked);
        }

        if to_local(&entry.timestamp) >= self.window_start {
            self.snapshot.last_24h.record(blocked);

            let hour = entry.timestamp.format("%H:00").to_string();
            let bucket = self.snapshot.by_hour.entry(hour).or_default();
            if blocked {
                bucket.blocked += 1;
            } else {
                bucket.safe += 1;
            }
        }

        if blocked {
            if let Some(domain) = fields.from.as_deref().and_then(extract_domain) {
                *self.domain_counts.entry(domain).or_insert(0) += 1;
            }
        }

        self.recent.push_back(EntrySummary {
            timestamp: entry.timestamp_raw.clone(),
            from: fields.from.clone().unwrap_or_default(),
            ip: fields.ip.clone().unwrap_or_default(),
            status: fields.status.clone().unwrap_or_default(),
            score: fields.score,
        });
        if self.recent.len() > RECENT_ENTRIES_LIMIT {
            self.recent.pop_front();
        }
    }

    pub fn finish(self) -> StatsSnapshot {
        let Aggregator {
            now,
            mut snapshot,
            domain_counts,
            recent,
            skipped,
            ..
        } = self;

        let mut domains: Vec<DomainCount> = domain_counts
            .into_iter()
            .map(|(domain, count)| DomainCount { domain, count })
            .collect();
        domains.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
        domains.truncate(TOP_DOMAINS_LIMIT);

        snapshot.top_blocked_domains = domains;
        snapshot.last_entries = recent.into_iter().rev().collect();
        snapshot.generated_at = now.format(TIMESTAMP_FORMAT).to_string();

        debug!(
            action = "complete",
            component = "log_aggregation",
            total = snapshot.totals.total,
            blocked = snapshot.totals.blocked,
            skipped,
            "Aggregated log entries"
        );

        snapshot
    }
}

/// Interpret a naive log timestamp in the local time zone.
fn to_local(timestamp: &NaiveDateTime) -> DateTime<Local> {
    resolve_local(timestamp, |t| Local.from_local_datetime(t))
        .unwrap_or_else(|| Local.from_utc_datetime(timestamp))
}

/// Ambiguous times take the earlier instant. A time skipped by a DST jump does
/// not exist on the wall clock; it is moved forward by the usual one-hour gap.
fn resolve_local<T>(
    timestamp: &NaiveDateTime,
    lookup: impl Fn(&NaiveDateTime) -> LocalResult<T>,
) -> Option<T> {
    lookup(timestamp)
        .earliest()
        .or_else(|| lookup(&(*timestamp + Duration::hours(1))).earliest())
}

/// Aggregate a sequence of raw lines, oldest first.
pub fn aggregate<I, S>(lines: I, now: DateTime<Local>) -> StatsSnapshot
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let start_time = Instant::now();
    let mut aggregator = Aggregator::new(now);
    for line in lines {
        aggregator.push_line(line.as_ref());
    }
    let snapshot = aggregator.finish();

    debug!(
        action = "timing",
        component = "log_aggregation",
        duration_ms = start_time.elapsed().as_millis(),
        "Aggregation timing"
    );
    snapshot
}
