use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ExperienceLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Junior,
    Intermediate,
    Senior,
    Expert,
}

impl ExperienceLevel {
    pub fn all() -> &'static [ExperienceLevel] {
        &[
            ExperienceLevel::Junior,
            ExperienceLevel::Intermediate,
            ExperienceLevel::Senior,
            ExperienceLevel::Expert,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Expert => "expert",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExperienceLevel {
    type Err = crate::error::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExperienceLevel::all()
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| crate::error::CatalogError::InvalidExperienceLevel(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    Advanced,
}

impl Complexity {
    pub fn all() -> &'static [Complexity] {
        &[
            Complexity::Simple,
            Complexity::Moderate,
            Complexity::Complex,
            Complexity::Advanced,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = crate::error::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Complexity::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| crate::error::CatalogError::InvalidComplexity(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// EstimatedComplexity
// ---------------------------------------------------------------------------

/// Coarse size estimate produced by the validator. Deliberately separate from
/// [`Complexity`], which the classifier derives from tools and keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedComplexity {
    Low,
    Medium,
    High,
}

impl EstimatedComplexity {
    pub fn as_str(self) -> &'static str {
        match self {
            EstimatedComplexity::Low => "low",
            EstimatedComplexity::Medium => "medium",
            EstimatedComplexity::High => "high",
        }
    }
}

impl fmt::Display for EstimatedComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValidationCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    FileExclusion,
    CategoryValidation,
    FrontmatterValidation,
    ContentValidation,
    SubagentValidation,
    ValidSubagent,
}

impl ValidationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCategory::FileExclusion => "file_exclusion",
            ValidationCategory::CategoryValidation => "category_validation",
            ValidationCategory::FrontmatterValidation => "frontmatter_validation",
            ValidationCategory::ContentValidation => "content_validation",
            ValidationCategory::SubagentValidation => "subagent_validation",
            ValidationCategory::ValidSubagent => "valid_subagent",
        }
    }
}

impl fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SortField / SortOrder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Category,
    Experience,
    Complexity,
    Updated,
}

impl std::str::FromStr for SortField {
    type Err = crate::error::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "title" => Ok(SortField::Name),
            "category" => Ok(SortField::Category),
            "experience" | "experience_level" => Ok(SortField::Experience),
            "complexity" => Ok(SortField::Complexity),
            "updated" | "last_updated" => Ok(SortField::Updated),
            _ => Err(crate::error::CatalogError::InvalidFilter(format!(
                "unknown sort field '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = crate::error::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(crate::error::CatalogError::InvalidFilter(format!(
                "unknown sort order '{s}'"
            ))),
        }
    }
}
