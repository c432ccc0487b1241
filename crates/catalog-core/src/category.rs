use serde::{Deserialize, Serialize};

/// Sort order assigned to the fallback category so it always lists last.
pub const FALLBACK_SORT_ORDER: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentCategory {
    pub id: String,
    pub display_name: String,
    pub source_directory: String,
    pub sort_order: u32,
    pub icon: String,
    pub color: String,
}

struct CategoryDef {
    id: &'static str,
    display_name: &'static str,
    source_directory: &'static str,
    sort_order: u32,
    icon: &'static str,
    color: &'static str,
}

impl CategoryDef {
    fn to_category(&self) -> SubagentCategory {
        SubagentCategory {
            id: self.id.to_string(),
            display_name: self.display_name.to_string(),
            source_directory: self.source_directory.to_string(),
            sort_order: self.sort_order,
            icon: self.icon.to_string(),
            color: self.color.to_string(),
        }
    }
}

const CATEGORIES: &[CategoryDef] = &[
    CategoryDef {
        id: "core-development",
        display_name: "Core Development",
        source_directory: "01-core-development",
        sort_order: 1,
        icon: "code",
        color: "#3b82f6",
    },
    CategoryDef {
        id: "language-specialists",
        display_name: "Language Specialists",
        source_directory: "02-language-specialists",
        sort_order: 2,
        icon: "languages",
        color: "#8b5cf6",
    },
    CategoryDef {
        id: "infrastructure",
        display_name: "Infrastructure",
        source_directory: "03-infrastructure",
        sort_order: 3,
        icon: "server",
        color: "#10b981",
    },
    CategoryDef {
        id: "quality-security",
        display_name: "Quality & Security",
        source_directory: "04-quality-security",
        sort_order: 4,
        icon: "shield-check",
        color: "#ef4444",
    },
    CategoryDef {
        id: "data-ai",
        display_name: "Data & AI",
        source_directory: "05-data-ai",
        sort_order: 5,
        icon: "brain",
        color: "#f59e0b",
    },
    CategoryDef {
        id: "developer-experience",
        display_name: "Developer Experience",
        source_directory: "06-developer-experience",
        sort_order: 6,
        icon: "wrench",
        color: "#06b6d4",
    },
    CategoryDef {
        id: "specialized-domains",
        display_name: "Specialized Domains",
        source_directory: "07-specialized-domains",
        sort_order: 7,
        icon: "compass",
        color: "#ec4899",
    },
    CategoryDef {
        id: "business-product",
        display_name: "Business & Product",
        source_directory: "08-business-product",
        sort_order: 8,
        icon: "briefcase",
        color: "#84cc16",
    },
    CategoryDef {
        id: "meta-orchestration",
        display_name: "Meta & Orchestration",
        source_directory: "09-meta-orchestration",
        sort_order: 9,
        icon: "network",
        color: "#6366f1",
    },
    CategoryDef {
        id: "research-analysis",
        display_name: "Research & Analysis",
        source_directory: "10-research-analysis",
        sort_order: 10,
        icon: "search",
        color: "#14b8a6",
    },
];

const FALLBACK: CategoryDef = CategoryDef {
    id: "other",
    display_name: "Other",
    source_directory: "",
    sort_order: FALLBACK_SORT_ORDER,
    icon: "folder",
    color: "#6b7280",
};

/// Whitelisted category directory names, in sort order.
pub fn category_directories() -> impl Iterator<Item = &'static str> {
    CATEGORIES.iter().map(|c| c.source_directory)
}

pub fn is_category_directory(dir: &str) -> bool {
    category_directories().any(|d| d == dir)
}

/// Every known category plus the fallback, ordered by `sort_order`.
pub fn all_categories() -> Vec<SubagentCategory> {
    CATEGORIES
        .iter()
        .chain(std::iter::once(&FALLBACK))
        .map(CategoryDef::to_category)
        .collect()
}

pub fn fallback_category() -> SubagentCategory {
    FALLBACK.to_category()
}

/// Resolve a containing directory name to its category. Unknown directories
/// map to the fallback "Other" entry.
pub fn resolve_category(dir: &str) -> SubagentCategory {
    CATEGORIES
        .iter()
        .find(|c| c.source_directory == dir)
        .map(CategoryDef::to_category)
        .unwrap_or_else(fallback_category)
}

/// Look up a category by id or by source directory.
pub fn find_category(key: &str) -> Option<SubagentCategory> {
    CATEGORIES
        .iter()
        .chain(std::iter::once(&FALLBACK))
        .find(|c| c.id == key || (!c.source_directory.is_empty() && c.source_directory == key))
        .map(CategoryDef::to_category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_whitelisted_directories() {
        assert_eq!(category_directories().count(), 10);
        assert!(is_category_directory("03-infrastructure"));
        assert!(!is_category_directory("infrastructure"));
    }

    #[test]
    fn known_directory_resolves() {
        let c = resolve_category("05-data-ai");
        assert_eq!(c.id, "data-ai");
        assert_eq!(c.sort_order, 5);
    }

    #[test]
    fn unknown_directory_falls_back_to_other() {
        for dir in ["", "misc", "11-future"] {
            let c = resolve_category(dir);
            assert_eq!(c.id, "other");
            assert_eq!(c.sort_order, FALLBACK_SORT_ORDER);
        }
    }

    #[test]
    fn all_categories_sorted_with_fallback_last() {
        let all = all_categories();
        assert_eq!(all.len(), 11);
        assert!(all.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
        assert_eq!(all.last().unwrap().id, "other");
    }

    #[test]
    fn find_by_id_or_directory() {
        assert_eq!(find_category("infrastructure").unwrap().sort_order, 3);
        assert_eq!(find_category("03-infrastructure").unwrap().sort_order, 3);
        assert!(find_category("nope").is_none());
    }
}
