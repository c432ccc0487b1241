//! Gatekeeper deciding which markdown files are genuine subagent definitions.
//!
//! Rules run in a fixed order and the first failure wins, so a file that is
//! both hidden and missing frontmatter is reported as a file exclusion.

use crate::category;
use crate::discover::SourceFile;
use crate::frontmatter;
use crate::paths;
use crate::types::{EstimatedComplexity, ValidationCategory};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Fixed rule data
// ---------------------------------------------------------------------------

pub const EXCLUDED_FILES: &[&str] = &[
    "README.md",
    "CONTRIBUTING.md",
    "CHANGELOG.md",
    "CODE_OF_CONDUCT.md",
    "SECURITY.md",
    "LICENSE",
    "LICENSE.md",
    "TEMPLATE.md",
    "index.md",
];

pub const REQUIRED_FIELDS: &[&str] = &["name", "description"];

pub const ALLOWED_MODELS: &[&str] = &["sonnet", "opus", "haiku", "inherit"];

pub const REQUIRED_SECTIONS: &[&str] = &["MCP Tool Suite", "Communication Protocol"];

/// Phrases (matched lowercase) showing the body addresses an agent persona.
pub const PERSONA_INDICATORS: &[&str] = &[
    "you are a",
    "your role is",
    "you specialize",
    "specializing in",
    "expert in",
];

pub const DEFAULT_MIN_CONTENT_LINES: usize = 20;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").unwrap())
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetadata {
    pub frontmatter: Mapping,
    pub category_dir: String,
    pub estimated_complexity: EstimatedComplexity,
    pub content_lines: usize,
    pub word_count: usize,
    pub section_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: String,
    pub category: ValidationCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ValidationMetadata>,
}

impl ValidationResult {
    fn reject(category: ValidationCategory, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
            category,
            metadata: None,
        }
    }

    /// Reason text without per-file detail, used to group batch statistics.
    pub fn reason_key(&self) -> &str {
        self.reason
            .split_once(':')
            .map(|(head, _)| head)
            .unwrap_or(&self.reason)
    }
}

// ---------------------------------------------------------------------------
// Rule chain
// ---------------------------------------------------------------------------

struct Candidate<'a> {
    file: &'a SourceFile,
    min_content_lines: usize,
}

/// A fn-pointer rule; `Err` carries the human-readable rejection reason.
struct Rule {
    category: ValidationCategory,
    check: fn(&Candidate) -> Result<(), String>,
}

const RULES: &[Rule] = &[
    Rule {
        category: ValidationCategory::FileExclusion,
        check: check_file_exclusion,
    },
    Rule {
        category: ValidationCategory::CategoryValidation,
        check: check_category,
    },
    Rule {
        category: ValidationCategory::FrontmatterValidation,
        check: check_frontmatter,
    },
    Rule {
        category: ValidationCategory::ContentValidation,
        check: check_content_length,
    },
    Rule {
        category: ValidationCategory::SubagentValidation,
        check: check_structure,
    },
];

fn check_file_exclusion(c: &Candidate) -> Result<(), String> {
    let name = c.file.file_name.as_str();
    if EXCLUDED_FILES.contains(&name) {
        return Err(format!("Excluded file: {name}"));
    }
    if name.starts_with('.') {
        return Err(format!("Hidden file: {name}"));
    }
    if !name.ends_with(".md") {
        return Err(format!("Not a markdown file: {name}"));
    }
    if !c.file.file_path.contains('/') {
        return Err(format!(
            "Root-level file is not inside a category directory: {}",
            c.file.file_path
        ));
    }
    Ok(())
}

/// Category directory of `file_path`: the segment right after `categories/`,
/// provided the file sits below it.
pub fn category_dir(file_path: &str) -> Option<&str> {
    let segments: Vec<&str> = file_path.split('/').collect();
    let pos = segments
        .iter()
        .position(|s| *s == paths::CATEGORIES_SEGMENT)?;
    if pos + 2 < segments.len() {
        Some(segments[pos + 1])
    } else {
        None
    }
}

fn check_category(c: &Candidate) -> Result<(), String> {
    let Some(dir) = category_dir(&c.file.file_path) else {
        return Err(format!(
            "Not under a categories/ directory: {}",
            c.file.file_path
        ));
    };
    if !category::is_category_directory(dir) {
        return Err(format!("Unknown category directory: {dir}"));
    }
    Ok(())
}

fn non_empty_string(fm: &Mapping, field: &str) -> Result<(), String> {
    match fm.get(field) {
        None | Some(Value::Null) => Err(format!("Missing required frontmatter field: {field}")),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(format!(
            "Invalid frontmatter field: '{field}' must be a non-empty string"
        )),
    }
}

fn check_frontmatter(c: &Candidate) -> Result<(), String> {
    let content = c.file.content.trim_start_matches('\u{feff}');
    if !content.starts_with("---") {
        return Err("Missing frontmatter: file must start with ---".to_string());
    }
    let opening = content.lines().next().unwrap_or_default();
    if opening.trim_end() != "---" {
        return Err(format!(
            "Invalid frontmatter: opening --- must be on its own line, found '{opening}'"
        ));
    }
    let Some((yaml, _)) = frontmatter::split_frontmatter(content) else {
        return Err("Invalid frontmatter: closing --- not found".to_string());
    };
    let fm = frontmatter::parse_yaml(yaml).map_err(|e| format!("Invalid YAML in frontmatter: {e}"))?;

    for field in REQUIRED_FIELDS {
        non_empty_string(&fm, field)?;
    }

    if let Some(tools) = fm.get("tools") {
        match tools {
            Value::String(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(
                    "Invalid frontmatter field: 'tools' must be a non-empty string".to_string(),
                )
            }
        }
    }

    if let Some(model) = fm.get("model") {
        let model = model.as_str().unwrap_or_default();
        if !ALLOWED_MODELS.contains(&model) {
            return Err(format!(
                "Invalid model: '{model}' (expected one of {})",
                ALLOWED_MODELS.join(", ")
            ));
        }
    }

    let name = fm.get("name").and_then(Value::as_str).unwrap_or_default();
    if !name_re().is_match(name) {
        return Err(format!(
            "Invalid name: '{name}' must contain only lowercase letters, digits and hyphens"
        ));
    }
    Ok(())
}

fn body_of(content: &str) -> &str {
    frontmatter::split_frontmatter(content)
        .map(|(_, body)| body)
        .unwrap_or(content)
}

fn non_blank_lines(body: &str) -> usize {
    body.lines().filter(|l| !l.trim().is_empty()).count()
}

fn check_content_length(c: &Candidate) -> Result<(), String> {
    let lines = non_blank_lines(body_of(&c.file.content));
    if lines < c.min_content_lines {
        return Err(format!(
            "Content too short: {lines} non-blank lines (minimum {})",
            c.min_content_lines
        ));
    }
    Ok(())
}

fn check_structure(c: &Candidate) -> Result<(), String> {
    let body = body_of(&c.file.content);
    for section in REQUIRED_SECTIONS {
        if !body.contains(section) {
            return Err(format!("Missing required section: {section}"));
        }
    }
    let lower = body.to_lowercase();
    if !PERSONA_INDICATORS.iter().any(|p| lower.contains(p)) {
        return Err(
            "Not a subagent definition: no persona indicator phrase found".to_string(),
        );
    }
    Ok(())
}

/// Coarse size estimate from word and heading counts.
pub fn estimate_complexity(word_count: usize, section_count: usize) -> EstimatedComplexity {
    if word_count > 2000 || section_count > 15 {
        EstimatedComplexity::High
    } else if word_count > 800 || section_count > 8 {
        EstimatedComplexity::Medium
    } else {
        EstimatedComplexity::Low
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Validator {
    min_content_lines: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONTENT_LINES)
    }
}

impl Validator {
    pub fn new(min_content_lines: usize) -> Self {
        Self { min_content_lines }
    }

    pub fn validate(&self, file_name: &str, file_path: &str, content: &str) -> ValidationResult {
        self.validate_file(&SourceFile::new(file_name, file_path, content))
    }

    pub fn validate_file(&self, file: &SourceFile) -> ValidationResult {
        let candidate = Candidate {
            file,
            min_content_lines: self.min_content_lines,
        };
        for rule in RULES {
            if let Err(reason) = (rule.check)(&candidate) {
                debug!(path = %file.file_path, category = %rule.category, "rejected: {reason}");
                return ValidationResult::reject(rule.category, reason);
            }
        }

        let parsed = frontmatter::parse(&file.content);
        let word_count = parsed.body.split_whitespace().count();
        let section_count = parsed
            .body
            .lines()
            .filter(|l| l.trim_start().starts_with('#'))
            .count();
        ValidationResult {
            valid: true,
            reason: "Valid subagent definition".to_string(),
            category: ValidationCategory::ValidSubagent,
            metadata: Some(ValidationMetadata {
                category_dir: category_dir(&file.file_path)
                    .unwrap_or_default()
                    .to_string(),
                content_lines: non_blank_lines(&parsed.body),
                estimated_complexity: estimate_complexity(word_count, section_count),
                word_count,
                section_count,
                frontmatter: parsed.frontmatter,
            }),
        }
    }

    /// Validate every file and split the batch into accepted and rejected
    /// entries. The statistics are diagnostic only.
    pub fn validate_batch(&self, files: Vec<SourceFile>) -> BatchValidation {
        let mut batch = BatchValidation::default();
        for file in files {
            let result = self.validate_file(&file);
            batch.stats.record(&result);
            if result.valid {
                batch.valid.push(ValidatedFile { file, result });
            } else {
                batch.invalid.push(ValidatedFile { file, result });
            }
        }
        info!(
            total = batch.stats.total,
            valid = batch.stats.valid,
            invalid = batch.stats.invalid,
            "validated subagent batch"
        );
        batch
    }
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ValidatedFile {
    pub file: SourceFile,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub by_reason: BTreeMap<String, usize>,
    pub by_category: BTreeMap<ValidationCategory, usize>,
}

impl ValidationStats {
    fn record(&mut self, result: &ValidationResult) {
        self.total += 1;
        if result.valid {
            self.valid += 1;
            return;
        }
        self.invalid += 1;
        *self
            .by_reason
            .entry(result.reason_key().to_string())
            .or_default() += 1;
        *self.by_category.entry(result.category).or_default() += 1;
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchValidation {
    pub valid: Vec<ValidatedFile>,
    pub invalid: Vec<ValidatedFile>,
    pub stats: ValidationStats,
}
