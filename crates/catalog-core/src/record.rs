use crate::category::{self, SubagentCategory};
use crate::classifier;
use crate::discover::SourceFile;
use crate::frontmatter;
use crate::types::{Complexity, ExperienceLevel};
use crate::validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_TITLE: &str = "Untitled Subagent";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

// ---------------------------------------------------------------------------
// SubagentRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubagentRecord {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub relative_path: String,
    pub category: SubagentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub technologies: Vec<String>,
    pub tool_count: usize,
    pub experience_level: ExperienceLevel,
    pub complexity: Complexity,
    pub keywords: Vec<String>,
    pub integrations: Vec<String>,
    pub use_cases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_matters: Option<String>,
    pub when_to_use: Vec<String>,
    pub what_to_do_next: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_code: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub visible: bool,
    pub selected: bool,
    pub expanded: bool,
}

/// Stable id from a filename: extension dropped, lowercased, runs of
/// anything outside `[a-z0-9]` collapsed to one hyphen.
pub fn subagent_id(filename: &str) -> String {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let mut id = String::with_capacity(stem.len());
    for c in stem.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            id.push(c);
        } else if !id.ends_with('-') {
            id.push('-');
        }
    }
    let id = id.trim_matches('-');
    if id.is_empty() {
        "subagent".to_string()
    } else {
        id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Why a record could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    EmptyContent,
    EmptyFilename,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::EmptyContent => f.write_str("document is empty"),
            BuildError::EmptyFilename => f.write_str("filename is empty"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Parse and classify an already-validated file into a record.
pub fn try_build_record(file: &SourceFile, now: DateTime<Utc>) -> Result<SubagentRecord, BuildError> {
    if file.file_name.trim().is_empty() {
        return Err(BuildError::EmptyFilename);
    }
    if file.content.trim().is_empty() {
        return Err(BuildError::EmptyContent);
    }

    let parsed = frontmatter::parse(&file.content);
    let fm = &parsed.frontmatter;
    let sections = frontmatter::parse_sections(&parsed.body);

    let tools = frontmatter::tools(fm);
    let technologies = classifier::extract_technologies(&tools);
    let tool_count = tools.len();

    let title = frontmatter::first_heading(&parsed.body)
        .or_else(|| frontmatter::get_str(fm, "name").map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = sections
        .description
        .clone()
        .or_else(|| frontmatter::get_str(fm, "description").map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let id = subagent_id(&file.file_name);
    Ok(SubagentRecord {
        name: frontmatter::get_str(fm, "name")
            .map(str::to_string)
            .unwrap_or_else(|| id.clone()),
        id,
        title,
        description,
        filename: file.file_name.clone(),
        relative_path: file.file_path.clone(),
        category: category::resolve_category(
            validator::category_dir(&file.file_path).unwrap_or_else(|| file.parent_dir()),
        ),
        model: frontmatter::get_str(fm, "model").map(str::to_string),
        experience_level: classifier::determine_experience_level(&file.content, fm, tool_count),
        complexity: classifier::assess_complexity(&file.content, tool_count),
        keywords: classifier::extract_keywords(&parsed.body, &technologies),
        integrations: classifier::extract_integrations(&file.content),
        use_cases: classifier::extract_use_cases(&parsed.body),
        technologies,
        tool_count,
        why_matters: sections.why_matters,
        when_to_use: sections.when_to_use,
        what_to_do_next: sections.what_to_do_next,
        example_code: sections.example_code,
        last_updated: now,
        visible: true,
        selected: false,
        expanded: false,
    })
}

/// Build a record, logging and dropping it on failure so a batch never stops
/// on one bad file.
pub fn build_record(file: &SourceFile) -> Option<SubagentRecord> {
    match try_build_record(file, Utc::now()) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %file.file_path, "dropping subagent record: {e}");
            None
        }
    }
}
