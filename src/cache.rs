//! Short-lived on-disk cache for [`StatsSnapshot`].
//!
//! The file's modification time is the TTL clock; nothing else is stored.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::stats::StatsSnapshot;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct StatsCache {
    path: PathBuf,
    ttl: Duration,
}

impl StatsCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached snapshot, or `None` when the file is missing, older than the TTL
    /// or unreadable.
    pub fn get(&self) -> Option<StatsSnapshot> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        // An mtime in the future counts as fresh.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > self.ttl {
            debug!(action = "miss", component = "stats_cache", age_secs = age.as_secs(), "Cache expired");
            return None;
        }

        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(snapshot) => {
                debug!(action = "hit", component = "stats_cache", age_secs = age.as_secs(), "Serving cached stats");
                Some(snapshot)
            }
            Err(e) => {
                debug!(action = "decode", component = "stats_cache", error = %e, "Ignoring unreadable cache file");
                None
            }
        }
    }

    /// Store a snapshot. Failures are logged and otherwise ignored.
    pub fn set(&self, snapshot: &StatsSnapshot) {
        if let Err(e) = self.write(snapshot) {
            warn!(action = "write", component = "stats_cache", file_path = ?self.path, error = %e, "Failed to save stats cache");
        }
    }

    /// Remove the cache file if present.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(action = "clear", component = "stats_cache", file_path = ?self.path, "Cache cleared"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(action = "clear", component = "stats_cache", file_path = ?self.path, error = %e, "Failed to remove stats cache")
            }
        }
    }

    fn write(&self, snapshot: &StatsSnapshot) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                let missing: Vec<&Path> = dir
                    .ancestors()
                    .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
                    .collect();
                fs::create_dir_all(dir)?;
                for created in missing {
                    set_mode(created, 0o770)?;
                }
            }
        }

        let content = serde_json::to_string(snapshot)?;

        // Readers only ever see a complete file.
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(format!(".{}.tmp", std::process::id()));
        let tmp_path = PathBuf::from(tmp_name);

        let result = create_private(&tmp_path)
            .and_then(|mut file| {
                // A stale temp file keeps its old mode until reset here.
                set_mode(&tmp_path, 0o660)?;
                file.write_all(content.as_bytes())
            })
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o660)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<File> {
    File::create(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Counts, DomainCount, EntrySummary};
    use tempfile::TempDir;

    fn sample() -> StatsSnapshot {
        let mut snapshot = StatsSnapshot {
            totals: Counts {
                total: 3,
                blocked: 2,
                safe: 1,
            },
            today: Counts {
                total: 1,
                blocked: 1,
                safe: 0,
            },
            top_blocked_domains: vec![DomainCount {
                domain: "example.com".to_string(),
                count: 2,
            }],
            last_entries: vec![EntrySummary {
                timestamp: "2024-01-15 10:30:45".to_string(),
                from: "user@example.com".to_string(),
                ip: "1.2.3.4".to_string(),
                status: "blocked".to_string(),
                score: 15.5,
            }],
            generated_at: "2024-01-15 12:00:00".to_string(),
            ..StatsSnapshot::default()
        };
        snapshot.by_hour.entry("10:00".to_string()).or_default().blocked = 1;
        snapshot
    }

    #[test]
    fn round_trip_within_ttl() {
        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("nested/cache/stats.json"), DEFAULT_TTL);

        assert!(cache.get().is_none());
        cache.set(&sample());
        assert_eq!(cache.get(), Some(sample()));
    }

    #[test]
    fn scores_survive_the_round_trip_exactly() {
        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("stats.json"), DEFAULT_TTL);

        let mut snapshot = sample();
        for score in [23.616500053273878, 12.212148059071673, 0.1 + 0.2] {
            let mut entry = snapshot.last_entries[0].clone();
            entry.score = score;
            snapshot.last_entries.push(entry);
        }

        cache.set(&snapshot);
        assert_eq!(cache.get(), Some(snapshot));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("stats.json"), Duration::from_secs(60));
        cache.set(&sample());

        let file = File::options().write(true).open(cache.path()).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(120))
            .unwrap();

        assert!(cache.get().is_none());
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("stats.json"), DEFAULT_TTL);
        fs::write(cache.path(), "{not json").unwrap();
        assert!(cache.get().is_none());
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("stats.json"), DEFAULT_TTL);
        cache.set(&sample());
        assert!(cache.path().exists());

        cache.clear();
        assert!(!cache.path().exists());
        cache.clear();
    }

    #[test]
    fn unwritable_location_is_ignored() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let cache = StatsCache::new(blocker.join("stats.json"), DEFAULT_TTL);

        cache.set(&sample());
        assert!(cache.get().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn cache_file_is_group_readable_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("stats.json"), DEFAULT_TTL);
        cache.set(&sample());

        let mode = fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o660);
    }

    #[cfg(unix)]
    #[test]
    fn every_created_directory_is_group_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("data/cache/stats.json"), DEFAULT_TTL);
        cache.set(&sample());

        for created in [dir.path().join("data"), dir.path().join("data/cache")] {
            let mode = fs::metadata(&created).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o770, "{created:?}");
        }
        let parent_mode = fs::metadata(dir.path()).unwrap().permissions().mode();
        assert_ne!(parent_mode & 0o777, 0o770);
    }

    #[cfg(unix)]
    #[test]
    fn stale_temp_file_is_reset_before_writing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cache = StatsCache::new(dir.path().join("stats.json"), DEFAULT_TTL);
        let stale = dir
            .path()
            .join(format!("stats.json.{}.tmp", std::process::id()));
        fs::write(&stale, "old").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        cache.set(&sample());
        assert!(!stale.exists());
        assert_eq!(cache.get(), Some(sample()));
        let mode = fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o660);
    }
}
