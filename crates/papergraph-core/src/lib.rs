use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod document;
pub mod language;

pub use document::{ParsedDocument, ParsedPage, TextFragment};
pub use language::{Language, detect_language};

/// The fixed, closed section taxonomy for scientific papers.
///
/// `Other` is the catch-all for headings that match no known section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Title,
    Abstract,
    Introduction,
    RelatedWork,
    Methods,
    Experiments,
    Results,
    Discussion,
    Conclusion,
    Acknowledgments,
    Appendix,
    References,
    Other,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Title => "title",
            SectionType::Abstract => "abstract",
            SectionType::Introduction => "introduction",
            SectionType::RelatedWork => "related_work",
            SectionType::Methods => "methods",
            SectionType::Experiments => "experiments",
            SectionType::Results => "results",
            SectionType::Discussion => "discussion",
            SectionType::Conclusion => "conclusion",
            SectionType::Acknowledgments => "acknowledgments",
            SectionType::Appendix => "appendix",
            SectionType::References => "references",
            SectionType::Other => "other",
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous, typed span of a paper's text.
///
/// `order` reconstructs reading order: values are contiguous, zero-based, and
/// assigned at emission time. Duplicate `title`/`abstract` sections can occur
/// from fallback recovery and are tolerated by consumers, not deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_type: SectionType,
    pub heading: String,
    pub content: String,
    pub page_start: usize,
    pub page_end: usize,
    pub order: usize,
}

/// Entity categories recognized by the pattern libraries.
///
/// `Innovation` is never produced by the heuristic path; it exists for
/// optional external extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    ResearchProblem,
    Method,
    Dataset,
    Metric,
    Innovation,
    Baseline,
    Tool,
    Theory,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::ResearchProblem => "research_problem",
            EntityType::Method => "method",
            EntityType::Dataset => "dataset",
            EntityType::Metric => "metric",
            EntityType::Innovation => "innovation",
            EntityType::Baseline => "baseline",
            EntityType::Tool => "tool",
            EntityType::Theory => "theory",
        }
    }
}

/// A typed, extracted mention of a domain concept.
///
/// Text is case-preserved; dedup keys are case-insensitive. `section_ref` is
/// the `order` of the section the mention was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub entity_type: EntityType,
    pub confidence: f32,
    pub section_ref: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Uses,
    EvaluatesOn,
    Improves,
    Comparative,
    PartOf,
    Causal,
    CoOccurrence,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Uses => "uses",
            RelationType::EvaluatesOn => "evaluates_on",
            RelationType::Improves => "improves",
            RelationType::Comparative => "comparative",
            RelationType::PartOf => "part_of",
            RelationType::Causal => "causal",
            RelationType::CoOccurrence => "co_occurrence",
        }
    }
}

/// A typed directed edge between two entities inferred from text.
///
/// `source_text` and `target_text` always match the text of some previously
/// emitted [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_text: String,
    pub target_text: String,
    pub relation_type: RelationType,
    pub description: String,
    pub confidence: f32,
}

/// A single bibliographic entry parsed from a references section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub raw_text: String,
    pub title: Option<String>,
    /// Appearance order, at most 10 retained.
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub doi: Option<String>,
    pub order: usize,
}

/// A table recovered from a page, with a best-effort caption.
///
/// `page` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub page: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub caption: String,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to extract text: {0}")]
    Extraction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF extraction backends.
///
/// Implementors provide the low-level extraction step: a page-ordered stream
/// of positioned text fragments with whatever font metadata the backend can
/// offer. Backends without font information report a uniform body-size
/// placeholder and no bold flag; downstream analysis treats that as "no
/// strong heading signal", not as an error.
pub trait PdfBackend: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParsedDocument, ExtractionError>;
}

#[derive(Error, Debug)]
pub enum ExternalExtractorError {
    #[error("external extractor unavailable")]
    Unavailable,
    #[error("external extractor failed: {0}")]
    Failed(String),
}

/// An optional externally-backed extractor (e.g. an LLM service) that can
/// replace the heuristic entity/relationship path when configured.
///
/// The heuristic path is always the default and must stay fully
/// self-sufficient; implementations of this trait are injected by the caller
/// and any failure falls back to the heuristics.
pub trait ExternalExtractor: Send + Sync {
    fn extract_entities(
        &self,
        section_type: SectionType,
        content: &str,
    ) -> Result<Vec<Entity>, ExternalExtractorError>;

    fn extract_relationships(
        &self,
        entities: &[Entity],
        context: &str,
    ) -> Result<Vec<Relationship>, ExternalExtractorError>;
}
