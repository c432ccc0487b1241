use crate::cache::{CacheService, CacheStats, IndexCache};
use crate::config::CatalogConfig;
use crate::discover::{self, SourceFile};
use crate::error::{CatalogError, Result};
use crate::query::{self, CategorySummary, Paging, QueryResult, SubagentFilter, TechnologySummary};
use crate::record::{self, SubagentRecord};
use crate::validator::{BatchValidation, ValidatedFile, ValidationStats, Validator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub records: Vec<SubagentRecord>,
    pub invalid: Vec<ValidatedFile>,
    pub stats: ValidationStats,
    /// Valid files the record builder still had to drop.
    pub dropped: usize,
    /// Raw markdown keyed by final record id.
    #[serde(skip)]
    pub content: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub indexed: usize,
    pub invalid: usize,
    pub dropped: usize,
    pub stats: ValidationStats,
    pub categories: usize,
    pub technologies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// `ok`, `stale`, or `empty` when no index has been built.
    pub status: &'static str,
    pub cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    pub source_dir: String,
}

/// Pick a free id for `id`, appending `-2`, `-3`, ... on collision.
fn unique_id(id: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(id) {
        return id.to_string();
    }
    (2..)
        .map(|n| format!("{id}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| id.to_string())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The ingestion pipeline plus read side over the cache. Synchronous; share
/// it behind an `Arc` and call it from blocking threads.
pub struct Catalog {
    config: CatalogConfig,
    validator: Validator,
    cache: CacheService,
    paging: Paging,
}

impl Catalog {
    pub fn open(config: CatalogConfig) -> Result<Self> {
        config.ensure_valid()?;
        let cache = CacheService::open_with_ttl(&config.cache_dir, config.filter_ttl());
        Ok(Self {
            validator: Validator::new(config.min_content_lines),
            paging: Paging {
                default_limit: config.default_page_size,
                max_limit: config.max_page_size,
            },
            cache,
            config,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Validate every file under `dir` (the configured source dir when
    /// `None`) without touching the cache.
    pub fn validate(&self, dir: Option<&Path>) -> Result<BatchValidation> {
        let files = discover::discover(dir.unwrap_or(&self.config.source_dir))?;
        Ok(self.validator.validate_batch(files))
    }

    /// Validate, then build records for the files that passed. Ids are made
    /// unique in input order.
    pub fn ingest(&self, files: Vec<SourceFile>) -> IngestReport {
        let batch = self.validator.validate_batch(files);
        let mut taken = HashSet::new();
        let mut records = Vec::with_capacity(batch.valid.len());
        let mut content = HashMap::new();
        let mut dropped = 0;

        for entry in batch.valid {
            let Some(mut rec) = record::build_record(&entry.file) else {
                dropped += 1;
                continue;
            };
            let id = unique_id(&rec.id, &taken);
            if id != rec.id {
                warn!(path = %entry.file.file_path, "duplicate subagent id '{}', using '{id}'", rec.id);
                rec.id = id;
            }
            taken.insert(rec.id.clone());
            content.insert(rec.id.clone(), entry.file.content);
            records.push(rec);
        }

        IngestReport {
            records,
            invalid: batch.invalid,
            stats: batch.stats,
            dropped,
            content,
        }
    }

    /// Rebuild the index from the source directory and rewrite every derived
    /// cache section.
    pub fn refresh(&self, commit: Option<String>) -> Result<RefreshReport> {
        let files = discover::discover(&self.config.source_dir)?;
        let report = self.ingest(files);

        let categories = query::summarize_categories(&report.records);
        let technologies = query::summarize_technologies(&report.records);
        let indexed = report.records.len();

        self.cache.set_index(report.records, commit.clone());
        self.cache.set_categories(categories.clone());
        self.cache.set_technologies(technologies.clone());
        self.cache.set_contents(report.content);

        let last_update = self
            .cache
            .get_index()
            .map(|i| i.last_update)
            .unwrap_or_else(Utc::now);
        info!(
            indexed,
            invalid = report.invalid.len(),
            dropped = report.dropped,
            "subagent index refreshed"
        );
        Ok(RefreshReport {
            indexed,
            invalid: report.invalid.len(),
            dropped: report.dropped,
            stats: report.stats,
            categories: categories.len(),
            technologies: technologies.len(),
            commit,
            last_update,
        })
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn index(&self) -> Result<IndexCache> {
        self.cache.get_index().ok_or(CatalogError::IndexUnavailable)
    }

    pub fn categories(&self) -> Result<Vec<CategorySummary>> {
        if let Some(categories) = self.cache.get_categories() {
            return Ok(categories);
        }
        let categories = query::summarize_categories(&self.index()?.subagents);
        self.cache.set_categories(categories.clone());
        Ok(categories)
    }

    pub fn technologies(&self) -> Result<Vec<TechnologySummary>> {
        if let Some(technologies) = self.cache.get_technologies() {
            return Ok(technologies);
        }
        let technologies = query::summarize_technologies(&self.index()?.subagents);
        self.cache.set_technologies(technologies.clone());
        Ok(technologies)
    }

    pub fn subagent(&self, id: &str) -> Result<SubagentRecord> {
        self.index()?
            .subagents
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CatalogError::SubagentNotFound(id.to_string()))
    }

    /// Raw markdown for `id`, from the content cache or else the source file.
    /// An unreadable source is an availability error, not a missing id.
    pub fn content(&self, id: &str) -> Result<String> {
        if let Some(content) = self.cache.get_content(id) {
            return Ok(content);
        }
        let record = self.subagent(id)?;
        let source_dir = &self.config.source_dir;
        if !source_dir.is_dir() {
            return Err(CatalogError::SourceNotFound(source_dir.display().to_string()));
        }
        let path = source_dir.join(&record.relative_path);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            warn!("cannot read {}: {e}", path.display());
            CatalogError::Io(e)
        })?;
        self.cache.set_content(id, content.clone());
        Ok(content)
    }

    /// Filtered, sorted page of the index, served from the filter cache when
    /// an identical query ran within the TTL.
    pub fn query(&self, filter: &SubagentFilter) -> Result<QueryResult> {
        let index = self.index()?;
        let filter = filter.normalized(&self.paging);
        let fingerprint = serde_json::to_value(&filter)?;
        if let Some(hit) = self.cache.get_filter_result(&fingerprint) {
            return Ok(hit);
        }
        let result = query::run_query(&index.subagents, &filter, &self.paging);
        self.cache.set_filter_result(&fingerprint, result.clone());
        Ok(result)
    }

    pub fn is_stale(&self) -> bool {
        self.cache.is_stale(Some(self.config.stale_after()))
    }

    pub fn health(&self) -> Health {
        let mut cache = self.cache.stats();
        cache.is_stale = self.is_stale();
        let status = if !cache.has_index {
            "empty"
        } else if cache.is_stale {
            "stale"
        } else {
            "ok"
        };
        Health {
            status,
            cache,
            last_commit: self.cache.get_index().and_then(|i| i.commit),
            source_dir: self.config.source_dir.display().to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    pub fn close(&self) -> Result<()> {
        self.cache.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortField;
    use tempfile::TempDir;

    fn agent_doc(name: &str, tools: &str) -> String {
        let filler: String = (0..20).map(|i| format!("Guideline {i}.\n")).collect();
        format!(
            "---\nname: {name}\ndescription: {name} helper\ntools: {tools}\n---\n\
             # {name}\n## Description\nBuilds {name} things.\n\
             ## MCP Tool Suite\n- **{tools}**\n\
             ## Communication Protocol\nYou are a senior engineer specializing in {name}.\n\
             Collaborate with backend-developer on contracts.\n\
             {filler}"
        )
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn setup() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("subagents");
        write(
            &src,
            "categories/01-core-development/api-designer.md",
            &agent_doc("api-designer", "React, Node.js"),
        );
        write(
            &src,
            "categories/03-infrastructure/devops-engineer.md",
            &agent_doc("devops-engineer", "Docker, Kubernetes"),
        );
        write(&src, "categories/01-core-development/README.md", "# readme");
        write(&src, "categories/01-core-development/broken.md", "no frontmatter");
        let catalog = Catalog::open(CatalogConfig::default().rooted(dir.path())).unwrap();
        (dir, catalog)
    }

    #[test]
    fn reads_before_refresh_report_unavailable() {
        let (_dir, catalog) = setup();
        assert!(matches!(catalog.index(), Err(CatalogError::IndexUnavailable)));
        assert!(matches!(
            catalog.query(&SubagentFilter::default()),
            Err(CatalogError::IndexUnavailable)
        ));
        assert!(matches!(catalog.categories(), Err(CatalogError::IndexUnavailable)));
        assert_eq!(catalog.health().status, "empty");
    }

    #[test]
    fn refresh_builds_index_and_summaries() {
        let (_dir, catalog) = setup();
        let report = catalog.refresh(Some("abc123".into())).unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.invalid, 2);
        assert_eq!(report.stats.total, 4);

        let api = catalog.subagent("api-designer").unwrap();
        assert_eq!(api.technologies, vec!["React", "Node.js"]);
        assert_eq!(api.category.id, "core-development");
        assert_eq!(api.integrations, vec!["backend-developer"]);

        let techs = catalog.technologies().unwrap();
        assert_eq!(techs.len(), 4);
        let cats = catalog.categories().unwrap();
        let infra = cats.iter().find(|c| c.category.id == "infrastructure").unwrap();
        assert_eq!(infra.count, 1);

        let health = catalog.health();
        assert_eq!(health.status, "ok");
        assert_eq!(health.last_commit.as_deref(), Some("abc123"));
    }

    #[test]
    fn query_filters_and_caches() {
        let (_dir, catalog) = setup();
        catalog.refresh(None).unwrap();

        let filter = SubagentFilter {
            technologies: vec!["react".into()],
            ..Default::default()
        };
        let result = catalog.query(&filter).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.subagents[0].id, "api-designer");
        assert_eq!(catalog.cache_stats().filter_entries, 1);

        // Same query, different spelling, same cache entry.
        let again = SubagentFilter {
            technologies: vec!["React".into()],
            page: Some(1),
            ..Default::default()
        };
        assert_eq!(catalog.query(&again).unwrap(), result);
        assert_eq!(catalog.cache_stats().filter_entries, 1);

        let none = SubagentFilter {
            search: Some("nothing-like-this".into()),
            sort_by: SortField::Updated,
            ..Default::default()
        };
        let empty = catalog.query(&none).unwrap();
        assert_eq!(empty.total, 0);
        assert!(empty.subagents.is_empty());
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let (_dir, catalog) = setup();
        let doc = agent_doc("rust-pro", "Rust");
        let files = vec![
            SourceFile::new("rust-pro.md", "categories/02-language-specialists/rust-pro.md", doc.clone()),
            SourceFile::new("Rust Pro.md", "categories/05-data-ai/Rust Pro.md", doc.clone()),
            SourceFile::new("rust_pro.md", "categories/06-developer-experience/rust_pro.md", doc),
        ];
        let report = catalog.ingest(files);
        let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rust-pro", "rust-pro-2", "rust-pro-3"]);
        assert_eq!(report.content.len(), 3);
    }

    #[test]
    fn content_falls_back_to_source_file() {
        let (dir, catalog) = setup();
        catalog.refresh(None).unwrap();
        let cached = catalog.content("devops-engineer").unwrap();
        assert!(cached.contains("name: devops-engineer"));

        let reopened = Catalog::open(CatalogConfig::default().rooted(dir.path())).unwrap();
        assert_eq!(reopened.cache_stats().content_entries, 0);
        assert_eq!(reopened.content("devops-engineer").unwrap(), cached);
        assert!(matches!(
            reopened.content("missing"),
            Err(CatalogError::SubagentNotFound(_))
        ));
    }

    #[test]
    fn refresh_drops_content_of_removed_files() {
        let (dir, catalog) = setup();
        let gone = dir.path().join("subagents/categories/03-infrastructure/gone.md");
        std::fs::write(&gone, agent_doc("gone", "Terraform")).unwrap();
        catalog.refresh(None).unwrap();
        assert!(catalog.content("gone").is_ok());

        std::fs::remove_file(&gone).unwrap();
        catalog.refresh(None).unwrap();
        assert!(matches!(catalog.subagent("gone"), Err(CatalogError::SubagentNotFound(_))));
        assert!(matches!(catalog.content("gone"), Err(CatalogError::SubagentNotFound(_))));
        assert_eq!(catalog.cache_stats().content_entries, 2);
    }

    #[test]
    fn unreadable_source_is_not_a_missing_id() {
        let (dir, catalog) = setup();
        catalog.refresh(None).unwrap();
        let reopened = Catalog::open(CatalogConfig::default().rooted(dir.path())).unwrap();

        std::fs::remove_file(
            dir.path().join("subagents/categories/01-core-development/api-designer.md"),
        )
        .unwrap();
        assert!(matches!(reopened.content("api-designer"), Err(CatalogError::Io(_))));

        std::fs::remove_dir_all(dir.path().join("subagents")).unwrap();
        assert!(matches!(
            reopened.content("devops-engineer"),
            Err(CatalogError::SourceNotFound(_))
        ));
    }

    #[test]
    fn clear_cache_forgets_the_index() {
        let (_dir, catalog) = setup();
        catalog.refresh(None).unwrap();
        catalog.clear_cache().unwrap();
        assert!(matches!(catalog.index(), Err(CatalogError::IndexUnavailable)));
        assert!(catalog.is_stale());
    }

    #[test]
    fn validate_reports_without_caching() {
        let (_dir, catalog) = setup();
        let batch = catalog.validate(None).unwrap();
        assert_eq!(batch.valid.len(), 2);
        assert_eq!(batch.invalid.len(), 2);
        assert!(!catalog.cache_stats().has_index);
    }
}
