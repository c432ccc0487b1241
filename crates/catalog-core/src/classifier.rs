//! Heuristic enrichment of parsed subagent content: technologies, experience
//! level, complexity, keywords, integrations and use cases.

use crate::frontmatter;
use crate::types::{Complexity, ExperienceLevel};
use regex::Regex;
use serde_yaml::Mapping;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Technologies
// ---------------------------------------------------------------------------

/// A substring rule: the first rule with any needle contained in the
/// lowercased token names the technology.
struct TechRule {
    needles: &'static [&'static str],
    name: &'static str,
}

const TECH_RULES: &[TechRule] = &[
    TechRule { needles: &["react"], name: "React" },
    TechRule { needles: &["vue"], name: "Vue.js" },
    TechRule { needles: &["angular"], name: "Angular" },
    TechRule { needles: &["svelte"], name: "Svelte" },
    TechRule { needles: &["next"], name: "Next.js" },
    TechRule { needles: &["node"], name: "Node.js" },
    TechRule { needles: &["typescript", "ts"], name: "TypeScript" },
    TechRule { needles: &["javascript", "js"], name: "JavaScript" },
    TechRule { needles: &["python", "py"], name: "Python" },
    TechRule { needles: &["rust"], name: "Rust" },
    TechRule { needles: &["golang"], name: "Go" },
    TechRule { needles: &["docker"], name: "Docker" },
    TechRule { needles: &["kubernetes", "k8s"], name: "Kubernetes" },
    TechRule { needles: &["aws"], name: "AWS" },
    TechRule { needles: &["postgres"], name: "PostgreSQL" },
    TechRule { needles: &["mongo"], name: "MongoDB" },
    TechRule { needles: &["redis"], name: "Redis" },
    TechRule { needles: &["graphql"], name: "GraphQL" },
];

fn normalize_technology(token: &str) -> Option<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower == "go" {
        return Some("Go".to_string());
    }
    let name = TECH_RULES
        .iter()
        .find(|r| r.needles.iter().any(|n| lower.contains(n)))
        .map(|r| r.name.to_string())
        .unwrap_or_else(|| trimmed.to_string());
    Some(name)
}

/// Map raw tool tokens to normalized technology names, deduplicated in
/// first-occurrence order.
pub fn extract_technologies<S: AsRef<str>>(tools: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tool in tools {
        if let Some(name) = normalize_technology(tool.as_ref()) {
            push_unique(&mut out, name);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Experience level
// ---------------------------------------------------------------------------

const SENIOR_KEYWORDS: &[&str] = &["senior", "architect", "lead", "principal", "expert"];
const INTERMEDIATE_KEYWORDS: &[&str] = &["intermediate", "experienced", "proficient", "advanced"];
const JUNIOR_KEYWORDS: &[&str] = &["junior", "beginner", "basic", "entry"];

fn tier_score(text: &str, keywords: &[&str], weight: u32) -> u32 {
    keywords
        .iter()
        .filter(|k| text.contains(*k))
        .map(|_| weight)
        .sum()
}

/// Raw score behind [`determine_experience_level`]. Every keyword present adds
/// its tier weight; tool count adds +2 above 8 and a further +1 above 12.
pub fn experience_score(content: &str, fm: &Mapping, tool_count: usize) -> u32 {
    let text = format!("{} {}", content, frontmatter::to_json_string(fm)).to_lowercase();
    let mut score = tier_score(&text, SENIOR_KEYWORDS, 3)
        + tier_score(&text, INTERMEDIATE_KEYWORDS, 2)
        + tier_score(&text, JUNIOR_KEYWORDS, 1);
    if tool_count > 8 {
        score += 2;
    }
    if tool_count > 12 {
        score += 1;
    }
    score
}

pub fn determine_experience_level(content: &str, fm: &Mapping, tool_count: usize) -> ExperienceLevel {
    match experience_score(content, fm, tool_count) {
        s if s >= 5 => ExperienceLevel::Expert,
        s if s >= 3 => ExperienceLevel::Senior,
        s if s >= 2 => ExperienceLevel::Intermediate,
        _ => ExperienceLevel::Junior,
    }
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

const COMPLEXITY_KEYWORDS: &[&str] = &[
    "architecture",
    "distributed",
    "microservices",
    "scalability",
    "enterprise",
    "optimization",
];

pub fn complexity_score(content: &str, tool_count: usize) -> u32 {
    let mut score = 0;

    if tool_count > 10 {
        score += 3;
    } else if tool_count > 6 {
        score += 2;
    } else if tool_count > 3 {
        score += 1;
    }

    let length = content.chars().count();
    if length > 10_000 {
        score += 2;
    } else if length > 5_000 {
        score += 1;
    }

    let lower = content.to_lowercase();
    score += tier_score(&lower, COMPLEXITY_KEYWORDS, 1);
    score
}

pub fn assess_complexity(content: &str, tool_count: usize) -> Complexity {
    match complexity_score(content, tool_count) {
        s if s >= 5 => Complexity::Advanced,
        s if s >= 3 => Complexity::Complex,
        s if s >= 1 => Complexity::Moderate,
        _ => Complexity::Simple,
    }
}

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "being", "below", "between", "could", "doing", "during",
    "other", "should", "their", "there", "these", "those", "through", "under", "until", "where",
    "which", "while", "would", "your", "yours",
];

fn clean_token(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// Text between a `## Description` heading and the next heading, code fence
/// or end of input.
fn description_block(content: &str) -> String {
    let mut out = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        if inside {
            if line.starts_with('#') || line.starts_with("```") {
                break;
            }
            out.push(line);
        } else if line.starts_with("## Description") {
            inside = true;
        }
    }
    out.join(" ")
}

pub fn extract_keywords(content: &str, technologies: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    if let Some(title) = frontmatter::first_heading(content) {
        for word in title.split_whitespace() {
            let token = clean_token(word);
            if token.chars().count() > 3 {
                push_unique(&mut out, token);
            }
        }
    }

    for tech in technologies {
        push_unique(&mut out, tech.to_lowercase());
    }

    for word in description_block(content).split_whitespace() {
        let token = clean_token(word);
        if token.chars().count() > 4 && !STOPWORDS.contains(&token.as_str()) {
            push_unique(&mut out, token);
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

fn integration_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)collaborates?\s+with\s+([\w-]+)",
            r"(?i)works?\s+with\s+([\w-]+)",
            r"(?i)coordinates?\s+with\s+([\w-]+)",
            r"(?i)integrates?\s+with\s+([\w-]+)",
            r"(?i)partners?\s+with\s+([\w-]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Peer agents or systems named after collaboration verbs, lowercased.
pub fn extract_integrations(content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for re in integration_patterns() {
        for caps in re.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                let phrase = m.as_str().to_lowercase();
                if phrase.chars().count() > 2 {
                    push_unique(&mut out, phrase);
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Use cases
// ---------------------------------------------------------------------------

fn use_case_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:#+\s*)?(?:when to|usage|use cases)").unwrap())
}

/// Bullet items following the first "When to / Usage / Use Cases" heading,
/// up to the next heading or code fence.
pub fn extract_use_cases(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        if !inside {
            inside = use_case_heading_re().is_match(line);
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') || trimmed.starts_with("```") {
            break;
        }
        if let Some(item) = frontmatter::list_item(line) {
            out.push(item.to_string());
        }
    }
    out
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !out.contains(&value) {
        out.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse;

    #[test]
    fn technology_variants_collapse() {
        assert_eq!(extract_technologies(&["React", "react ", "REACT.js"]), vec!["React"]);
    }

    #[test]
    fn technologies_keep_first_occurrence_order() {
        assert_eq!(
            extract_technologies(&["React", "Node", "k8s", "Kubernetes", "Terraform "]),
            vec!["React", "Node.js", "Kubernetes", "Terraform"]
        );
    }

    #[test]
    fn node_wins_over_javascript_suffix() {
        assert_eq!(extract_technologies(&["node.js", "vanilla js"]), vec!["Node.js", "JavaScript"]);
    }

    #[test]
    fn go_needs_exact_token() {
        assert_eq!(extract_technologies(&["go", "Golang", "Google"]), vec!["Go", "Google"]);
    }

    #[test]
    fn empty_tokens_are_skipped() {
        assert!(extract_technologies(&["", "  "]).is_empty());
    }

    #[test]
    fn experience_thresholds() {
        let fm = Mapping::new();
        assert_eq!(determine_experience_level("plain text", &fm, 0), ExperienceLevel::Junior);
        assert_eq!(determine_experience_level("a proficient dev", &fm, 0), ExperienceLevel::Intermediate);
        assert_eq!(determine_experience_level("a senior dev", &fm, 0), ExperienceLevel::Senior);
        assert_eq!(
            determine_experience_level("senior architect", &fm, 0),
            ExperienceLevel::Expert
        );
    }

    #[test]
    fn tool_count_bonus_is_cumulative() {
        let fm = Mapping::new();
        assert_eq!(experience_score("", &fm, 8), 0);
        assert_eq!(experience_score("", &fm, 9), 2);
        assert_eq!(experience_score("", &fm, 13), 3);
    }

    #[test]
    fn frontmatter_text_is_scanned() {
        let fm = parse("---\nname: x\ndescription: Principal engineer\n---\n").frontmatter;
        assert_eq!(experience_score("", &fm, 0), 3);
    }

    #[test]
    fn experience_monotonic_in_senior_keywords() {
        let fm = Mapping::new();
        let base = "helps with basic tasks";
        let mut previous = determine_experience_level(base, &fm, 0);
        let mut text = base.to_string();
        for kw in SENIOR_KEYWORDS {
            text.push(' ');
            text.push_str(kw);
            let level = determine_experience_level(&text, &fm, 0);
            assert!(level >= previous, "{text}");
            previous = level;
        }
        assert_eq!(previous, ExperienceLevel::Expert);
    }

    #[test]
    fn complexity_tool_tiers_are_exclusive() {
        assert_eq!(complexity_score("", 3), 0);
        assert_eq!(complexity_score("", 4), 1);
        assert_eq!(complexity_score("", 7), 2);
        assert_eq!(complexity_score("", 11), 3);
    }

    #[test]
    fn complexity_length_and_keywords() {
        let long = "x".repeat(5_001);
        assert_eq!(complexity_score(&long, 0), 1);
        let longer = "x".repeat(10_001);
        assert_eq!(complexity_score(&longer, 0), 2);
        assert_eq!(complexity_score("Distributed microservices architecture", 0), 3);
        assert_eq!(assess_complexity("", 0), Complexity::Simple);
        assert_eq!(assess_complexity("enterprise", 0), Complexity::Moderate);
        assert_eq!(assess_complexity("Distributed microservices architecture", 0), Complexity::Complex);
        assert_eq!(
            assess_complexity("distributed microservices architecture enterprise", 11),
            Complexity::Advanced
        );
    }

    #[test]
    fn keywords_from_title_technologies_and_description() {
        let content = "\
# Test Agent for APIs
## Description
Handles things between services, which matters.
## Next
ignored words here
";
        let kws = extract_keywords(content, &["React".to_string()]);
        assert_eq!(
            kws,
            vec!["test", "agent", "apis", "react", "handles", "things", "services", "matters"]
        );
    }

    #[test]
    fn description_block_stops_at_code_fence() {
        let content = "## Description\nalpha bravo charlie\n```\nsecret\n```\n";
        let kws = extract_keywords(content, &[]);
        assert_eq!(kws, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn integrations_are_captured() {
        let content = "Collaborate with backend-developer on APIs. Works with QA and \
                       coordinates with devops-engineer. Integrate with api-designer.";
        assert_eq!(
            extract_integrations(content),
            vec!["backend-developer", "devops-engineer", "api-designer"]
        );
    }

    #[test]
    fn use_cases_under_heading() {
        let content = "\
intro
## When to Use
- Reviewing pull requests
* Auditing dependencies
plain text
## Other
- not a use case
";
        assert_eq!(
            extract_use_cases(content),
            vec!["Reviewing pull requests", "Auditing dependencies"]
        );
        assert!(extract_use_cases("- orphan item").is_empty());
    }

    #[test]
    fn use_cases_heading_without_hashes() {
        assert_eq!(extract_use_cases("Usage:\n- one\n```\n- two\n```"), vec!["one"]);
    }
}
