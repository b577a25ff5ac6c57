use std::collections::HashSet;

use regex::Regex;

use papergraph_core::{Entity, RelationType, Relationship};

use crate::patterns::{RELATION_INDICATORS, type_relation};

/// Only the first 40 entities take part in pairing, bounding the O(n²) scan.
pub const MAX_RELATION_ENTITIES: usize = 40;

/// Two mentions within this many bytes of lowercased context count as
/// co-occurring.
pub const CO_OCCURRENCE_WINDOW: usize = 250;

const LEXICAL_CONFIDENCE: f32 = 0.7;
const CO_OCCURRENCE_CONFIDENCE: f32 = 0.5;

/// Infer typed directed relationships between entities from the paper text.
///
/// For every unordered entity pair, explicit lexical patterns are tried in
/// both orientations first; only when none match does the co-occurrence
/// window plus the entity-type-pair table decide. Pairs matching neither
/// yield no edge, and each unordered pair is processed at most once.
pub fn extract_relationships(entities: &[Entity], context: &str) -> Vec<Relationship> {
    if entities.len() < 2 {
        return Vec::new();
    }

    let limited = &entities[..entities.len().min(MAX_RELATION_ENTITIES)];
    let context_lower = context.to_lowercase();

    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut relationships: Vec<Relationship> = Vec::new();

    for i in 0..limited.len() {
        for j in (i + 1)..limited.len() {
            let e1 = &limited[i];
            let e2 = &limited[j];
            let pair_key = unordered_key(&e1.text, &e2.text);
            if seen_pairs.contains(&pair_key) {
                continue;
            }

            // Lexical patterns first, trying both orientations
            let mut source = e1.text.clone();
            let mut target = e2.text.clone();
            let mut relation = check_pattern_relation(&source, &target, &context_lower);
            if relation.is_none() {
                if let Some(reversed) = check_pattern_relation(&target, &source, &context_lower) {
                    std::mem::swap(&mut source, &mut target);
                    relation = Some(reversed);
                }
            }

            if let Some(relation) = relation {
                seen_pairs.insert(pair_key);
                relationships.push(make_relationship(
                    source,
                    target,
                    relation,
                    LEXICAL_CONFIDENCE,
                ));
                continue;
            }

            // Co-occurrence window plus type heuristics
            if !co_occur(&e1.text, &e2.text, &context_lower) {
                continue;
            }
            let mut source = e1.text.clone();
            let mut target = e2.text.clone();
            let mut relation = type_relation(e1.entity_type, e2.entity_type);
            if relation.is_none() {
                if let Some(reversed) = type_relation(e2.entity_type, e1.entity_type) {
                    std::mem::swap(&mut source, &mut target);
                    relation = Some(reversed);
                }
            }
            if let Some(relation) = relation {
                seen_pairs.insert(pair_key);
                relationships.push(make_relationship(
                    source,
                    target,
                    relation,
                    CO_OCCURRENCE_CONFIDENCE,
                ));
            }
        }
    }

    relationships
}

/// Case-insensitive, order-normalized key so each unordered pair is
/// considered exactly once.
fn unordered_key(a: &str, b: &str) -> (String, String) {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a <= b { (a, b) } else { (b, a) }
}

fn make_relationship(
    source: String,
    target: String,
    relation_type: RelationType,
    confidence: f32,
) -> Relationship {
    let description = format!("{} {} {}", source, relation_type.as_str(), target);
    Relationship {
        source_text: source,
        target_text: target,
        relation_type,
        description,
        confidence,
    }
}

/// Try every relation template with `{src}`/`{tgt}` substituted in.
///
/// Patterns are compiled from escaped entity text on demand; matching stays
/// a pure function of the inputs.
fn check_pattern_relation(
    source: &str,
    target: &str,
    context_lower: &str,
) -> Option<RelationType> {
    let src_escaped = regex::escape(&source.to_lowercase());
    let tgt_escaped = regex::escape(&target.to_lowercase());

    for (relation, templates) in RELATION_INDICATORS.iter() {
        for template in templates.iter() {
            let pattern = template
                .replace("{src}", &src_escaped)
                .replace("{tgt}", &tgt_escaped);
            if let Ok(re) = Regex::new(&pattern) {
                if re.is_match(context_lower) {
                    return Some(*relation);
                }
            }
        }
    }
    None
}

/// Whether both entity strings appear within the co-occurrence window of
/// each other anywhere in the context.
fn co_occur(a: &str, b: &str, context_lower: &str) -> bool {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    if a_lower.is_empty() || b_lower.is_empty() {
        return false;
    }

    let positions_a: Vec<usize> = context_lower.match_indices(&a_lower).map(|(i, _)| i).collect();
    if positions_a.is_empty() {
        return false;
    }
    let positions_b: Vec<usize> = context_lower.match_indices(&b_lower).map(|(i, _)| i).collect();

    positions_a.iter().any(|&pa| {
        positions_b
            .iter()
            .any(|&pb| pa.abs_diff(pb) < CO_OCCURRENCE_WINDOW)
    })
}
