use crate::error::Result;
use crate::io;
use crate::paths;
use crate::query::{CategorySummary, QueryResult, TechnologySummary};
use crate::record::SubagentRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

pub const DEFAULT_FILTER_TTL_SECS: i64 = 5 * 60;
pub const DEFAULT_STALE_AFTER_SECS: i64 = 60 * 60;

// ---------------------------------------------------------------------------
// Cached sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCache {
    pub subagents: Vec<SubagentRecord>,
    pub last_update: DateTime<Utc>,
    /// Source revision the index was built from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCacheEntry {
    pub result: QueryResult,
    pub filters: Value,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesCache {
    pub categories: Vec<CategorySummary>,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologiesCache {
    pub technologies: Vec<TechnologySummary>,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    index: Option<IndexCache>,
    filters: HashMap<String, FilterCacheEntry>,
    categories: Option<CategoriesCache>,
    technologies: Option<TechnologiesCache>,
    /// Raw markdown by subagent id. Never persisted.
    content: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub has_index: bool,
    pub index_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    pub filter_entries: usize,
    pub has_categories: bool,
    pub categories_count: usize,
    pub has_technologies: bool,
    pub technologies_count: usize,
    pub content_entries: usize,
    pub is_stale: bool,
}

/// What a load from disk picked up. Each section is independent: a corrupt
/// file only costs that section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<&'static str>,
    pub failed: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

/// JSON text with object keys sorted at every depth, so two equivalent
/// filter objects serialize identically regardless of insertion order.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// Fingerprint of a filter object: first 128 bits of SHA-256 over its
/// canonical JSON, as 32 lowercase hex chars.
pub fn cache_key(filters: &Value) -> String {
    let digest = Sha256::digest(canonical_json(filters).as_bytes());
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}

fn is_cache_key(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// CacheService
// ---------------------------------------------------------------------------

/// Two-tier cache: in-memory state guarded by a mutex, mirrored to JSON
/// files under the cache directory. Disk failures are logged and the cache
/// keeps working from memory.
pub struct CacheService {
    dir: PathBuf,
    filter_ttl: Duration,
    state: Mutex<CacheState>,
}

impl CacheService {
    pub fn open(dir: &Path) -> Self {
        Self::open_with_ttl(dir, Duration::seconds(DEFAULT_FILTER_TTL_SECS))
    }

    /// Open the cache at `dir`, creating it if needed and loading whatever
    /// sections are already on disk.
    pub fn open_with_ttl(dir: &Path, filter_ttl: Duration) -> Self {
        let cache = Self {
            dir: dir.to_path_buf(),
            filter_ttl,
            state: Mutex::new(CacheState::default()),
        };
        if let Err(e) = io::ensure_dir(&paths::filters_dir(dir)) {
            warn!("cache directory {} unavailable, using memory only: {e}", dir.display());
        }
        let report = cache.reload();
        debug!(loaded = ?report.loaded, failed = report.failed.len(), "cache opened");
        cache
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Flush every in-memory section to disk.
    pub fn close(&self) -> Result<()> {
        let state = self.state();
        self.persist(&state)
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -----------------------------------------------------------------------
    // Disk
    // -----------------------------------------------------------------------

    /// Replace the in-memory persisted sections with what is on disk.
    /// Content stays as is since it never touches disk.
    pub fn reload(&self) -> LoadReport {
        let mut report = LoadReport::default();
        let mut state = self.state();

        state.index = load_section(&paths::index_path(&self.dir), "index", &mut report);
        state.categories =
            load_section(&paths::categories_path(&self.dir), "categories", &mut report);
        state.technologies =
            load_section(&paths::technologies_path(&self.dir), "technologies", &mut report);
        state.filters = self.load_filters(&mut report);

        report
    }

    fn load_filters(&self, report: &mut LoadReport) -> HashMap<String, FilterCacheEntry> {
        let mut filters = HashMap::new();
        let dir = paths::filters_dir(&self.dir);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return filters,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| is_cache_key(s))
                .map(str::to_string)
            else {
                continue;
            };
            let section = format!("filters/{key}");
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|data| {
                    serde_json::from_str::<FilterCacheEntry>(&data).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(entry) => {
                    filters.insert(key, entry);
                }
                Err(e) => {
                    warn!("ignoring unreadable cache file {}: {e}", path.display());
                    report.failed.push((section, e));
                }
            }
        }
        if !filters.is_empty() {
            report.loaded.push("filters");
        }
        filters
    }

    /// Rewrite every held section. Filter files with no in-memory entry are
    /// removed so disk mirrors memory.
    fn persist(&self, state: &CacheState) -> Result<()> {
        let filters_dir = paths::filters_dir(&self.dir);
        io::ensure_dir(&filters_dir)?;

        if let Some(index) = &state.index {
            io::write_json(&paths::index_path(&self.dir), index)?;
        }
        if let Some(categories) = &state.categories {
            io::write_json(&paths::categories_path(&self.dir), categories)?;
        }
        if let Some(technologies) = &state.technologies {
            io::write_json(&paths::technologies_path(&self.dir), technologies)?;
        }

        for (key, entry) in &state.filters {
            io::write_json(&paths::filter_path(&self.dir, key), entry)?;
        }
        for entry in std::fs::read_dir(&filters_dir)? {
            let path = entry?.path();
            let stale = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|key| is_cache_key(key) && !state.filters.contains_key(key));
            if stale {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn persist_logged(&self, state: &CacheState) {
        if let Err(e) = self.persist(state) {
            warn!("failed to persist cache to {}: {e}", self.dir.display());
        }
    }

    // -----------------------------------------------------------------------
    // Index
    // -----------------------------------------------------------------------

    pub fn set_index(&self, subagents: Vec<SubagentRecord>, commit: Option<String>) {
        let mut state = self.state();
        state.index = Some(IndexCache {
            subagents,
            last_update: Utc::now(),
            commit,
        });
        self.persist_logged(&state);
    }

    pub fn get_index(&self) -> Option<IndexCache> {
        self.state().index.clone()
    }

    /// True when there is no index or it is older than `max_age`
    /// (one hour when `None`).
    pub fn is_stale(&self, max_age: Option<Duration>) -> bool {
        self.is_stale_at(max_age, Utc::now())
    }

    fn is_stale_at(&self, max_age: Option<Duration>, now: DateTime<Utc>) -> bool {
        let max_age = max_age.unwrap_or_else(|| Duration::seconds(DEFAULT_STALE_AFTER_SECS));
        match &self.state().index {
            None => true,
            Some(index) => now.signed_duration_since(index.last_update) > max_age,
        }
    }

    // -----------------------------------------------------------------------
    // Filter results
    // -----------------------------------------------------------------------

    pub fn set_filter_result(&self, filters: &Value, result: QueryResult) {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.filter_ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut state = self.state();
        state.filters.insert(
            cache_key(filters),
            FilterCacheEntry {
                result,
                filters: filters.clone(),
                cached_at: now,
                expires_at,
            },
        );
        self.persist_logged(&state);
    }

    /// Cached result for `filters`. An expired entry is evicted and reported
    /// as a miss.
    pub fn get_filter_result(&self, filters: &Value) -> Option<QueryResult> {
        self.get_filter_result_at(filters, Utc::now())
    }

    fn get_filter_result_at(&self, filters: &Value, now: DateTime<Utc>) -> Option<QueryResult> {
        let key = cache_key(filters);
        let mut state = self.state();
        let expired = state.filters.get(&key)?.expires_at <= now;
        if expired {
            state.filters.remove(&key);
            self.persist_logged(&state);
            return None;
        }
        state.filters.get(&key).map(|e| e.result.clone())
    }

    // -----------------------------------------------------------------------
    // Categories and technologies
    // -----------------------------------------------------------------------

    pub fn set_categories(&self, categories: Vec<CategorySummary>) {
        let mut state = self.state();
        state.categories = Some(CategoriesCache {
            categories,
            cached_at: Utc::now(),
        });
        self.persist_logged(&state);
    }

    pub fn get_categories(&self) -> Option<Vec<CategorySummary>> {
        self.state().categories.as_ref().map(|c| c.categories.clone())
    }

    pub fn set_technologies(&self, technologies: Vec<TechnologySummary>) {
        let mut state = self.state();
        state.technologies = Some(TechnologiesCache {
            technologies,
            cached_at: Utc::now(),
        });
        self.persist_logged(&state);
    }

    pub fn get_technologies(&self) -> Option<Vec<TechnologySummary>> {
        self.state()
            .technologies
            .as_ref()
            .map(|t| t.technologies.clone())
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    pub fn set_content(&self, id: &str, content: String) {
        self.state().content.insert(id.to_string(), content);
    }

    pub fn get_content(&self, id: &str) -> Option<String> {
        self.state().content.get(id).cloned()
    }

    /// Replace the whole content map, dropping ids that are not in `content`.
    pub fn set_contents(&self, content: HashMap<String, String>) {
        self.state().content = content;
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> CacheStats {
        let stale = self.is_stale(None);
        let state = self.state();
        CacheStats {
            has_index: state.index.is_some(),
            index_size: state.index.as_ref().map_or(0, |i| i.subagents.len()),
            last_update: state.index.as_ref().map(|i| i.last_update),
            filter_entries: state.filters.len(),
            has_categories: state.categories.is_some(),
            categories_count: state.categories.as_ref().map_or(0, |c| c.categories.len()),
            has_technologies: state.technologies.is_some(),
            technologies_count: state
                .technologies
                .as_ref()
                .map_or(0, |t| t.technologies.len()),
            content_entries: state.content.len(),
            is_stale: stale,
        }
    }

    /// Drop expired filter entries, returning how many went.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now())
    }

    fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state();
        let before = state.filters.len();
        state.filters.retain(|_, e| e.expires_at > now);
        let removed = before - state.filters.len();
        if removed > 0 {
            self.persist_logged(&state);
        }
        removed
    }

    /// Empty every section and delete everything under the cache directory.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state();
        *state = CacheState::default();
        io::clear_dir(&self.dir)?;
        io::ensure_dir(&paths::filters_dir(&self.dir))
    }
}

fn load_section<T: serde::de::DeserializeOwned>(
    path: &Path,
    name: &'static str,
    report: &mut LoadReport,
) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|data| serde_json::from_str::<T>(&data).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => {
            report.loaded.push(name);
            Some(value)
        }
        Err(e) => {
            warn!("ignoring unreadable cache file {}: {e}", path.display());
            report.failed.push((name.to_string(), e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tests::record;
    use crate::types::{Complexity, ExperienceLevel};
    use serde_json::json;
    use tempfile::TempDir;

    fn empty_result() -> QueryResult {
        QueryResult {
            subagents: Vec::new(),
            total: 0,
            page: 1,
            limit: 20,
            total_pages: 0,
            has_more: false,
        }
    }

    fn one_record() -> SubagentRecord {
        record(
            "api-designer",
            "01-core-development",
            &["Node.js"],
            ExperienceLevel::Senior,
            Complexity::Moderate,
        )
    }

    #[test]
    fn key_ignores_object_key_order() {
        let a = json!({"category": "infrastructure", "technologies": ["react"], "page": 1});
        let b = json!({"page": 1, "technologies": ["react"], "category": "infrastructure"});
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(cache_key(&a).len(), 32);
        assert!(is_cache_key(&cache_key(&a)));

        let nested_a = json!({"x": {"b": 1, "a": 2}});
        let nested_b = json!({"x": {"a": 2, "b": 1}});
        assert_eq!(cache_key(&nested_a), cache_key(&nested_b));

        let c = json!({"category": "infrastructure", "technologies": ["react"], "page": 2});
        assert_ne!(cache_key(&a), cache_key(&c));
    }

    #[test]
    fn index_round_trips_across_reopen() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        assert!(cache.get_index().is_none());
        assert!(cache.is_stale(None));

        cache.set_index(vec![one_record()], Some("abc123".into()));
        let stored = cache.get_index().unwrap();
        assert!(!cache.is_stale(None));
        drop(cache);

        let reopened = CacheService::open(dir.path());
        let index = reopened.get_index().unwrap();
        assert_eq!(index, stored);
        assert_eq!(index.commit.as_deref(), Some("abc123"));
        assert_eq!(index.subagents[0].id, "api-designer");
    }

    #[test]
    fn staleness_uses_max_age() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        cache.set_index(Vec::new(), None);
        let later = Utc::now() + Duration::hours(2);
        assert!(cache.is_stale_at(None, later));
        assert!(!cache.is_stale_at(Some(Duration::hours(3)), later));
    }

    #[test]
    fn filter_results_hit_then_expire() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        let filters = json!({"search": "rust"});
        assert!(cache.get_filter_result(&filters).is_none());

        cache.set_filter_result(&filters, empty_result());
        assert_eq!(cache.get_filter_result(&filters), Some(empty_result()));
        let file = paths::filter_path(dir.path(), &cache_key(&filters));
        assert!(file.exists());

        let later = Utc::now() + Duration::minutes(6);
        assert!(cache.get_filter_result_at(&filters, later).is_none());
        assert_eq!(cache.stats().filter_entries, 0);
        assert!(!file.exists());
    }

    #[test]
    fn cleanup_removes_only_expired_entries() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        let now = Utc::now();
        {
            let mut state = cache.state();
            for (i, offset) in [-10i64, -1, 10].into_iter().enumerate() {
                let filters = json!({"page": i});
                state.filters.insert(
                    cache_key(&filters),
                    FilterCacheEntry {
                        result: empty_result(),
                        filters,
                        cached_at: now,
                        expires_at: now + Duration::minutes(offset),
                    },
                );
            }
        }
        assert_eq!(cache.cleanup_expired_at(now), 2);
        assert_eq!(cache.stats().filter_entries, 1);
        assert_eq!(cache.cleanup_expired_at(now), 0);
    }

    #[test]
    fn corrupt_section_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        cache.set_index(vec![one_record()], None);
        cache.set_technologies(vec![TechnologySummary {
            name: "Rust".into(),
            count: 1,
        }]);
        drop(cache);

        std::fs::write(paths::categories_path(dir.path()), "{not json").unwrap();
        std::fs::write(paths::technologies_path(dir.path()), "[]").unwrap();

        let cache = CacheService::open(dir.path());
        let report = cache.reload();
        assert_eq!(report.loaded, vec!["index"]);
        let failed: Vec<&str> = report.failed.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(failed, vec!["categories", "technologies"]);
        assert!(cache.get_index().is_some());
        assert!(cache.get_categories().is_none());
    }

    #[test]
    fn content_is_memory_only() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        cache.set_content("api-designer", "# API".into());
        assert_eq!(cache.get_content("api-designer").as_deref(), Some("# API"));
        cache.close().unwrap();

        let reopened = CacheService::open(dir.path());
        assert!(reopened.get_content("api-designer").is_none());
    }

    #[test]
    fn set_contents_replaces_every_entry() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        cache.set_content("old", "# Old".into());
        cache.set_content("kept", "# Kept v1".into());

        cache.set_contents(HashMap::from([("kept".to_string(), "# Kept v2".to_string())]));
        assert!(cache.get_content("old").is_none());
        assert_eq!(cache.get_content("kept").as_deref(), Some("# Kept v2"));
        assert_eq!(cache.stats().content_entries, 1);
    }

    #[test]
    fn clear_empties_memory_and_disk() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        cache.set_index(vec![one_record()], None);
        cache.set_filter_result(&json!({"page": 1}), empty_result());
        cache.set_content("x", "y".into());

        cache.clear().unwrap();
        let stats = cache.stats();
        assert!(!stats.has_index);
        assert_eq!(stats.filter_entries, 0);
        assert_eq!(stats.content_entries, 0);
        assert!(!paths::index_path(dir.path()).exists());
        assert!(paths::filters_dir(dir.path()).is_dir());
    }

    #[test]
    fn stats_reflect_sections() {
        let dir = TempDir::new().unwrap();
        let cache = CacheService::open(dir.path());
        cache.set_index(vec![one_record(), one_record()], None);
        cache.set_categories(Vec::new());
        let stats = cache.stats();
        assert!(stats.has_index);
        assert_eq!(stats.index_size, 2);
        assert!(stats.has_categories);
        assert!(!stats.has_technologies);
        assert!(!stats.is_stale);
    }
}
