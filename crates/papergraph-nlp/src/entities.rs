use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use papergraph_core::{Entity, EntityType, Section, SectionType};

use crate::patterns::{
    BASELINE_PATTERNS, DATASET_GENERIC_RE, DATASET_PATTERNS, METHOD_PATTERNS, METRIC_PATTERNS,
    RESEARCH_PROBLEM_PATTERNS, THEORY_PATTERNS, TOOL_PATTERNS,
};

/// Content shorter than this yields no entities.
const MIN_CONTENT_CHARS: usize = 30;
/// Content is truncated to this many chars to bound pattern matching cost.
const CONTENT_CHAR_CAP: usize = 12_000;

const CURATED_CONFIDENCE: f32 = 0.8;
const GENERIC_DATASET_CONFIDENCE: f32 = 0.65;
const HEURISTIC_CONFIDENCE: f32 = 0.6;

/// Extract entities from a paper section using the local pattern libraries.
///
/// Recognizes datasets, metrics, methods, tools, theories, research problems,
/// and baselines. Entities carry the section's `order` as `section_ref`.
pub fn extract_entities(section: &Section) -> Vec<Entity> {
    extract_entities_from_content(section.section_type, &section.content, section.order)
}

/// Pattern extraction over raw `(section_type, content)` input.
///
/// Research problems are only mined from abstract/introduction-like text and
/// baselines from experimental text. Fails closed: degenerate content yields
/// an empty list, never an error.
pub fn extract_entities_from_content(
    section_type: SectionType,
    content: &str,
    section_ref: usize,
) -> Vec<Entity> {
    if content.trim().chars().count() < MIN_CONTENT_CHARS {
        return Vec::new();
    }
    let text = truncate_chars(content, CONTENT_CHAR_CAP);

    let mut seen: HashSet<String> = HashSet::new();
    let mut entities: Vec<Entity> = Vec::new();

    match_patterns(text, &DATASET_PATTERNS, EntityType::Dataset, &mut seen, &mut entities, section_ref);
    match_patterns(text, &METRIC_PATTERNS, EntityType::Metric, &mut seen, &mut entities, section_ref);
    match_patterns(text, &METHOD_PATTERNS, EntityType::Method, &mut seen, &mut entities, section_ref);
    match_patterns(text, &TOOL_PATTERNS, EntityType::Tool, &mut seen, &mut entities, section_ref);
    match_patterns(text, &THEORY_PATTERNS, EntityType::Theory, &mut seen, &mut entities, section_ref);

    // Generic dataset mentions, e.g. "XYZ dataset"
    for caps in DATASET_GENERIC_RE.captures_iter(text) {
        let name = caps.get(1).map_or("", |m| m.as_str()).trim();
        let key = name.to_lowercase();
        if name.chars().count() > 2 && !seen.contains(&key) {
            seen.insert(key);
            entities.push(Entity {
                text: name.to_string(),
                entity_type: EntityType::Dataset,
                confidence: GENERIC_DATASET_CONFIDENCE,
                section_ref,
            });
        }
    }

    if matches!(
        section_type,
        SectionType::Abstract | SectionType::Introduction | SectionType::Other
    ) {
        extract_research_problems(text, &mut seen, &mut entities, section_ref);
    }

    if matches!(
        section_type,
        SectionType::Experiments | SectionType::Results | SectionType::Discussion | SectionType::Other
    ) {
        extract_baselines(text, &mut seen, &mut entities, section_ref);
    }

    entities
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn match_patterns(
    text: &str,
    patterns: &[Regex],
    entity_type: EntityType,
    seen: &mut HashSet<String>,
    entities: &mut Vec<Entity>,
    section_ref: usize,
) {
    for re in patterns {
        for caps in re.captures_iter(text) {
            let matched = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map_or("", |m| m.as_str())
                .trim();
            let key = matched.to_lowercase();
            if key.chars().count() > 1 && !seen.contains(&key) {
                seen.insert(key);
                entities.push(Entity {
                    text: matched.to_string(),
                    entity_type,
                    confidence: CURATED_CONFIDENCE,
                    section_ref,
                });
            }
        }
    }
}

fn extract_research_problems(
    text: &str,
    seen: &mut HashSet<String>,
    entities: &mut Vec<Entity>,
    section_ref: usize,
) {
    for re in RESEARCH_PROBLEM_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let matched = caps.get(1).map_or("", |m| m.as_str()).trim();
            let key = matched.to_lowercase();
            let chars = matched.chars().count();
            if !seen.contains(&key) && chars > 10 && chars < 200 {
                seen.insert(key);
                entities.push(Entity {
                    text: matched.to_string(),
                    entity_type: EntityType::ResearchProblem,
                    confidence: HEURISTIC_CONFIDENCE,
                    section_ref,
                });
            }
        }
    }
}

static BASELINE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*|\s+and\s+").unwrap());

fn extract_baselines(
    text: &str,
    seen: &mut HashSet<String>,
    entities: &mut Vec<Entity>,
    section_ref: usize,
) {
    for re in BASELINE_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let raw = caps.get(1).map_or("", |m| m.as_str()).trim();
            for part in BASELINE_SPLIT_RE.split(raw) {
                let part = part.trim().trim_end_matches('.');
                let key = part.to_lowercase();
                let chars = part.chars().count();
                let lowercase_leading = part.chars().next().is_some_and(|c| c.is_lowercase());
                if !seen.contains(&key) && chars > 2 && chars < 80 && !lowercase_leading {
                    seen.insert(key);
                    entities.push(Entity {
                        text: part.to_string(),
                        entity_type: EntityType::Baseline,
                        confidence: HEURISTIC_CONFIDENCE,
                        section_ref,
                    });
                }
            }
        }
    }
}
