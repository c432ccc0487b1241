//! Frontmatter splitting and section-aware body scanning for subagent
//! markdown files.

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;
use tracing::warn;

const DELIM: &str = "---";
const FENCE: &str = "```";

// ---------------------------------------------------------------------------
// Document split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub frontmatter: Mapping,
    pub body: String,
}

/// Split a leading `---` / YAML / `---` block off `text`.
///
/// Returns `(yaml, body)` borrowed from `text`, or `None` when the document
/// does not open with that exact pattern.
pub fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix(DELIM)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIM {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse a frontmatter block into a mapping. An empty block is an empty
/// mapping; any other non-mapping document is an error.
pub fn parse_yaml(yaml: &str) -> Result<Mapping, String> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(m)) => Ok(m),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err("frontmatter is not a key/value mapping".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Split and parse a document. Never fails: a missing block leaves the text
/// untouched as body, and malformed YAML degrades to an empty mapping.
pub fn parse(text: &str) -> ParsedDocument {
    let Some((yaml, body)) = split_frontmatter(text) else {
        return ParsedDocument {
            frontmatter: Mapping::new(),
            body: text.to_string(),
        };
    };
    let frontmatter = parse_yaml(yaml).unwrap_or_else(|e| {
        warn!("ignoring malformed frontmatter: {e}");
        Mapping::new()
    });
    ParsedDocument {
        frontmatter,
        body: body.to_string(),
    }
}

/// Non-empty trimmed string value for `key`, if any.
pub fn get_str<'a>(fm: &'a Mapping, key: &str) -> Option<&'a str> {
    fm.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Compact JSON rendering of the frontmatter, used for keyword scans.
pub fn to_json_string(fm: &Mapping) -> String {
    serde_json::to_string(fm).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ToolsField
// ---------------------------------------------------------------------------

/// The `tools` key appears either as a YAML list or as one delimited string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsField {
    List(Vec<String>),
    Delimited(String),
}

impl ToolsField {
    pub fn from_frontmatter(fm: &Mapping) -> Option<Self> {
        match fm.get("tools")? {
            Value::String(s) => Some(ToolsField::Delimited(s.clone())),
            Value::Sequence(items) => Some(ToolsField::List(
                items.iter().filter_map(scalar_to_string).collect(),
            )),
            _ => None,
        }
    }

    /// Ordered, trimmed, non-empty tool tokens.
    pub fn normalize(&self) -> Vec<String> {
        let tokens: Vec<&str> = match self {
            ToolsField::List(items) => items.iter().map(String::as_str).collect(),
            ToolsField::Delimited(s) => s.split(',').collect(),
        };
        tokens
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalized tool list straight from the frontmatter; empty when absent.
pub fn tools(fm: &Mapping) -> Vec<String> {
    ToolsField::from_frontmatter(fm)
        .map(|t| t.normalize())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Body sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Description,
    Why,
    When,
    What,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodySections {
    pub title: Option<String>,
    pub description: Option<String>,
    pub why_matters: Option<String>,
    pub when_to_use: Vec<String>,
    pub what_to_do_next: Vec<String>,
    pub example_code: Option<String>,
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*]\s+(.+)$").unwrap())
}

/// Text of a `-` / `*` bullet line, if `line` is one.
pub fn list_item(line: &str) -> Option<&str> {
    list_item_re()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

fn heading_section(line: &str) -> Option<Section> {
    if line.starts_with("## Description") {
        Some(Section::Description)
    } else if line.starts_with("## Why") {
        Some(Section::Why)
    } else if line.starts_with("## When to") {
        Some(Section::When)
    } else if line.starts_with("## What to") {
        Some(Section::What)
    } else if line.starts_with('#') {
        Some(Section::None)
    } else {
        None
    }
}

struct SectionScanner {
    section: Section,
    in_code_block: bool,
    pending_list: Vec<String>,
    code: String,
    blocks: Vec<String>,
    description: Vec<String>,
    why: Vec<String>,
    title: Option<String>,
}

impl SectionScanner {
    fn new() -> Self {
        Self {
            section: Section::None,
            in_code_block: false,
            pending_list: Vec::new(),
            code: String::new(),
            blocks: Vec::new(),
            description: Vec::new(),
            why: Vec::new(),
            title: None,
        }
    }

    fn enter(&mut self, section: Section) {
        self.section = section;
        self.pending_list.clear();
    }

    fn close_block(&mut self) {
        let block = std::mem::take(&mut self.code);
        let block = block.trim();
        if !block.is_empty() {
            self.blocks.push(block.to_string());
        }
    }

    fn line(&mut self, line: &str) {
        let line = line.trim_end();

        if line.starts_with(FENCE) {
            if self.in_code_block {
                self.close_block();
            }
            self.in_code_block = !self.in_code_block;
            return;
        }
        if self.in_code_block {
            self.code.push_str(line);
            self.code.push('\n');
            return;
        }

        if let Some(h1) = line.strip_prefix("# ") {
            if self.title.is_none() {
                self.title = Some(h1.trim().to_string());
            }
            self.enter(Section::None);
            return;
        }
        if let Some(section) = heading_section(line) {
            self.enter(section);
            return;
        }

        if let Some(item) = list_item(line) {
            self.pending_list.push(item.to_string());
            return;
        }

        let text = line.trim();
        if text.is_empty() {
            return;
        }
        match self.section {
            Section::Description => self.description.push(text.to_string()),
            Section::Why => self.why.push(text.to_string()),
            _ => {}
        }
    }

    /// Only the list of the section active at end of input is committed.
    fn finish(mut self) -> BodySections {
        if self.in_code_block {
            self.close_block();
        }
        let mut out = BodySections {
            title: self.title,
            description: join_nonempty(&self.description),
            why_matters: join_nonempty(&self.why),
            example_code: if self.blocks.is_empty() {
                None
            } else {
                Some(self.blocks.join("\n\n"))
            },
            ..BodySections::default()
        };
        match self.section {
            Section::When => out.when_to_use = self.pending_list,
            Section::What => out.what_to_do_next = self.pending_list,
            _ => {}
        }
        out
    }
}

fn join_nonempty(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

/// Single-pass scan of a markdown body into its named sections.
pub fn parse_sections(body: &str) -> BodySections {
    let mut scanner = SectionScanner::new();
    for line in body.lines() {
        scanner.line(line);
    }
    scanner.finish()
}

/// Text of the first level-1 heading, independent of any frontmatter name.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find_map(|l| l.strip_prefix("# "))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}
