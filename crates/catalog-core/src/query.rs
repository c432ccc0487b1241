use crate::category::{self, SubagentCategory};
use crate::record::SubagentRecord;
use crate::types::{Complexity, ExperienceLevel, SortField, SortOrder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// SubagentFilter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentFilter {
    /// Category id or source directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Matches records carrying any of these technologies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl Paging {
    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        let max = self.max_limit.max(1);
        limit.unwrap_or(self.default_limit).clamp(1, max)
    }
}

impl SubagentFilter {
    /// Canonical form used for cache fingerprints: blank strings dropped,
    /// technologies lowercased and sorted, paging resolved.
    pub fn normalized(&self, paging: &Paging) -> SubagentFilter {
        let mut technologies: Vec<String> = self
            .technologies
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        technologies.sort();
        technologies.dedup();

        SubagentFilter {
            category: non_blank(self.category.as_deref()),
            technologies,
            experience_level: self.experience_level,
            complexity: self.complexity,
            search: non_blank(self.search.as_deref()),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            page: Some(self.page.unwrap_or(1).max(1)),
            limit: Some(paging.clamp_limit(self.limit)),
        }
    }

    pub fn matches(&self, record: &SubagentRecord) -> bool {
        if let Some(cat) = self.category.as_deref() {
            if !record.category.id.eq_ignore_ascii_case(cat)
                && !record.category.source_directory.eq_ignore_ascii_case(cat)
            {
                return false;
            }
        }

        if !self.technologies.is_empty() {
            let wanted: Vec<String> = self.technologies.iter().map(|t| t.to_lowercase()).collect();
            let hit = record
                .technologies
                .iter()
                .any(|t| wanted.contains(&t.to_lowercase()));
            if !hit {
                return false;
            }
        }

        if self.experience_level.is_some_and(|l| l != record.experience_level) {
            return false;
        }
        if self.complexity.is_some_and(|c| c != record.complexity) {
            return false;
        }

        if let Some(q) = self.search.as_deref() {
            let q = q.to_lowercase();
            let hit = record.title.to_lowercase().contains(&q)
                || record.name.to_lowercase().contains(&q)
                || record.description.to_lowercase().contains(&q)
                || record.keywords.iter().any(|k| k.contains(&q))
                || record
                    .technologies
                    .iter()
                    .any(|t| t.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }

        true
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// QueryResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub subagents: Vec<SubagentRecord>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

fn compare(a: &SubagentRecord, b: &SubagentRecord, field: SortField) -> Ordering {
    let by_title = || {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    };
    match field {
        SortField::Name => by_title(),
        SortField::Category => a
            .category
            .sort_order
            .cmp(&b.category.sort_order)
            .then_with(by_title),
        SortField::Experience => a
            .experience_level
            .cmp(&b.experience_level)
            .then_with(by_title),
        SortField::Complexity => a.complexity.cmp(&b.complexity).then_with(by_title),
        SortField::Updated => a.last_updated.cmp(&b.last_updated).then_with(by_title),
    }
}

/// Filter, sort and paginate `records`.
pub fn run_query(records: &[SubagentRecord], filter: &SubagentFilter, paging: &Paging) -> QueryResult {
    let filter = filter.normalized(paging);
    let mut hits: Vec<&SubagentRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    hits.sort_by(|a, b| {
        let ord = compare(a, b, filter.sort_by);
        match filter.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = hits.len();
    let limit = filter.limit.unwrap_or(paging.default_limit).max(1);
    let page = filter.page.unwrap_or(1);
    let total_pages = total.div_ceil(limit);
    let subagents = hits
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect();

    QueryResult {
        subagents,
        total,
        page,
        limit,
        total_pages,
        has_more: page < total_pages,
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: SubagentCategory,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologySummary {
    pub name: String,
    pub count: usize,
}

/// Every known category with its record count, in sort order. The fallback
/// category is listed only when something landed in it.
pub fn summarize_categories(records: &[SubagentRecord]) -> Vec<CategorySummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.category.id.as_str()).or_default() += 1;
    }
    let fallback = category::fallback_category();
    category::all_categories()
        .into_iter()
        .map(|c| CategorySummary {
            count: counts.get(c.id.as_str()).copied().unwrap_or(0),
            category: c,
        })
        .filter(|s| s.category.id != fallback.id || s.count > 0)
        .collect()
}

/// Technologies by descending usage, ties broken by name.
pub fn summarize_technologies(records: &[SubagentRecord]) -> Vec<TechnologySummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        for t in &r.technologies {
            *counts.entry(t.as_str()).or_default() += 1;
        }
    }
    let mut out: Vec<TechnologySummary> = counts
        .into_iter()
        .map(|(name, count)| TechnologySummary {
            name: name.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}
