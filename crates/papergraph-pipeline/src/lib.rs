use std::path::Path;

use serde::{Deserialize, Serialize};

use papergraph_core::{
    Entity, ExternalExtractor, ExtractionError, Language, ParsedDocument, PdfBackend, Reference,
    Relationship, Section, SectionType, Table,
};
use papergraph_nlp::{extract_entities, extract_relationships};
use papergraph_parsing::{analyze_layout, extract_tables, parse_references};

/// The relationship context is capped at this many chars.
pub const CONTEXT_CHAR_LIMIT: usize = 15_000;

/// Everything the pipeline derives from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperAnalysis {
    pub sections: Vec<Section>,
    pub language: Language,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub references: Vec<Reference>,
    pub tables: Vec<Table>,
}

/// The full document analysis pipeline.
///
/// Holds an extraction backend (plus an optional fallback used when the
/// primary fails) and an optional external extractor. All heuristic stages
/// are pure functions of the parsed document, so identical input bytes
/// always produce identical output.
pub struct PaperPipeline {
    primary: Box<dyn PdfBackend>,
    fallback: Option<Box<dyn PdfBackend>>,
    external: Option<Box<dyn ExternalExtractor>>,
}

impl PaperPipeline {
    pub fn new(primary: Box<dyn PdfBackend>) -> Self {
        Self {
            primary,
            fallback: None,
            external: None,
        }
    }

    /// Backend to retry with when the primary backend fails.
    pub fn with_fallback(mut self, backend: Box<dyn PdfBackend>) -> Self {
        self.fallback = Some(backend);
        self
    }

    /// Optional externally-backed extractor. The heuristic path remains the
    /// default whenever this is absent or fails.
    pub fn with_external_extractor(mut self, extractor: Box<dyn ExternalExtractor>) -> Self {
        self.external = Some(extractor);
        self
    }

    /// Run the full pipeline on a PDF file.
    pub fn analyze_file(&self, path: &Path) -> Result<PaperAnalysis, ExtractionError> {
        let doc = match self.primary.parse(path) {
            Ok(doc) => doc,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(
                        error = %primary_err,
                        "primary extraction backend failed, escalating to fallback"
                    );
                    fallback.parse(path)?
                }
                None => return Err(primary_err),
            },
        };
        Ok(self.analyze_document(&doc))
    }

    /// Run the analysis stages over an already-extracted document.
    pub fn analyze_document(&self, doc: &ParsedDocument) -> PaperAnalysis {
        let (sections, language) = analyze_layout(doc);
        let tables = extract_tables(doc);

        let references = sections
            .iter()
            .find(|s| s.section_type == SectionType::References)
            .map(|s| parse_references(&s.content))
            .unwrap_or_default();

        let entities = self.collect_entities(&sections);
        let context = build_relation_context(&sections);
        let relationships = self.collect_relationships(&entities, &context);

        PaperAnalysis {
            sections,
            language,
            entities,
            relationships,
            references,
            tables,
        }
    }

    fn collect_entities(&self, sections: &[Section]) -> Vec<Entity> {
        let mut all = Vec::new();
        for section in sections {
            if matches!(
                section.section_type,
                SectionType::Title | SectionType::References
            ) {
                continue;
            }

            let mut entities = match &self.external {
                Some(extractor) => {
                    match extractor.extract_entities(section.section_type, &section.content) {
                        Ok(found) => found,
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                section = section.order,
                                "external entity extraction failed, using local patterns"
                            );
                            extract_entities(section)
                        }
                    }
                }
                None => extract_entities(section),
            };

            for entity in &mut entities {
                entity.section_ref = section.order;
            }
            all.extend(entities);
        }
        all
    }

    fn collect_relationships(&self, entities: &[Entity], context: &str) -> Vec<Relationship> {
        match &self.external {
            Some(extractor) => match extractor.extract_relationships(entities, context) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "external relationship extraction failed, using local heuristics"
                    );
                    extract_relationships(entities, context)
                }
            },
            None => extract_relationships(entities, context),
        }
    }
}

/// Concatenated non-title, non-reference sections rendered as
/// `## heading\ncontent`, capped for bounded matching cost.
pub fn build_relation_context(sections: &[Section]) -> String {
    let parts: Vec<String> = sections
        .iter()
        .filter(|s| {
            !matches!(
                s.section_type,
                SectionType::Title | SectionType::References
            )
        })
        .map(|s| format!("## {}\n{}", s.heading, s.content))
        .collect();
    let text = parts.join("\n\n");

    match text.char_indices().nth(CONTEXT_CHAR_LIMIT) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_excludes_title_and_references() {
        let section = |section_type, heading: &str, content: &str, order| Section {
            section_type,
            heading: heading.to_string(),
            content: content.to_string(),
            page_start: 0,
            page_end: 0,
            order,
        };
        let sections = vec![
            section(SectionType::Title, "A Paper", "A Paper", 0),
            section(SectionType::Abstract, "Abstract", "The abstract text.", 1),
            section(SectionType::References, "References", "[1] Ref.", 2),
        ];
        let context = build_relation_context(&sections);
        assert!(context.contains("## Abstract"));
        assert!(context.contains("The abstract text."));
        assert!(!context.contains("A Paper"));
        assert!(!context.contains("[1] Ref."));
    }

    #[test]
    fn context_is_capped() {
        let long = "x".repeat(CONTEXT_CHAR_LIMIT * 2);
        let sections = vec![Section {
            section_type: SectionType::Methods,
            heading: "Methods".to_string(),
            content: long,
            page_start: 0,
            page_end: 0,
            order: 0,
        }];
        let context = build_relation_context(&sections);
        assert_eq!(context.chars().count(), CONTEXT_CHAR_LIMIT);
    }
}
