use once_cell::sync::Lazy;
use regex::Regex;

use papergraph_core::SectionType;

/// Bilingual (English/Chinese) heading patterns per section type, matched
/// against normalized heading text. Order matters: the first match wins.
static SECTION_PATTERNS: Lazy<Vec<(SectionType, Vec<Regex>)>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
            .collect()
    };

    vec![
        (
            SectionType::Abstract,
            compile(&[r"^abstract\s*$", r"^摘\s*要\s*$", r"^summary\s*$"]),
        ),
        (
            SectionType::Introduction,
            compile(&[
                r"^(?:[\d.]+\s*)?introduction\s*$",
                r"^(?:[\d.]+\s*)?引\s*言\s*$",
                r"^(?:[\d.]+\s*)?绪\s*论\s*$",
                r"^(?:[\d.]+\s*)?overview\s*$",
            ]),
        ),
        (
            SectionType::RelatedWork,
            compile(&[
                r"^(?:[\d.]+\s*)?related\s+work[s]?\s*$",
                r"^(?:[\d.]+\s*)?background\s*$",
                r"^(?:[\d.]+\s*)?background\s+and\s+related\s+work\s*$",
                r"^(?:[\d.]+\s*)?literature\s+review\s*$",
                r"^(?:[\d.]+\s*)?previous\s+work\s*$",
                r"^(?:[\d.]+\s*)?prior\s+work\s*$",
                r"^(?:[\d.]+\s*)?相关工作\s*$",
                r"^(?:[\d.]+\s*)?研究背景\s*$",
            ]),
        ),
        (
            SectionType::Methods,
            compile(&[
                r"^(?:[\d.]+\s*)?method(?:s|ology)?\s*$",
                r"^(?:[\d.]+\s*)?approach\s*$",
                r"^(?:[\d.]+\s*)?(?:proposed\s+)?(?:method|framework|model|system|architecture)\s*$",
                r"^(?:[\d.]+\s*)?(?:our\s+)?(?:method|approach|framework|model)\s*$",
                r"^(?:[\d.]+\s*)?technical\s+approach\s*$",
                r"^(?:[\d.]+\s*)?problem\s+(?:formulation|definition|setup)\s*$",
                r"^(?:[\d.]+\s*)?方法\s*$",
                r"^(?:[\d.]+\s*)?模型\s*$",
            ]),
        ),
        (
            SectionType::Experiments,
            compile(&[
                r"^(?:[\d.]+\s*)?experiments?\s*$",
                r"^(?:[\d.]+\s*)?experimental\s+(?:setup|results?|settings?|evaluation)\s*$",
                r"^(?:[\d.]+\s*)?evaluation\s*$",
                r"^(?:[\d.]+\s*)?empirical\s+(?:study|evaluation|results?)\s*$",
                r"^(?:[\d.]+\s*)?实验\s*$",
                r"^(?:[\d.]+\s*)?实验设置\s*$",
            ]),
        ),
        (
            SectionType::Results,
            compile(&[
                r"^(?:[\d.]+\s*)?results?\s*$",
                r"^(?:[\d.]+\s*)?results?\s+and\s+(?:discussion|analysis)\s*$",
                r"^(?:[\d.]+\s*)?main\s+results?\s*$",
                r"^(?:[\d.]+\s*)?findings?\s*$",
                r"^(?:[\d.]+\s*)?结果\s*$",
                r"^(?:[\d.]+\s*)?实验结果\s*$",
            ]),
        ),
        (
            SectionType::Discussion,
            compile(&[
                r"^(?:[\d.]+\s*)?discussion\s*$",
                r"^(?:[\d.]+\s*)?analysis\s*$",
                r"^(?:[\d.]+\s*)?discussion\s+and\s+(?:analysis|future\s+work)\s*$",
                r"^(?:[\d.]+\s*)?ablation\s+stud(?:y|ies)\s*$",
                r"^(?:[\d.]+\s*)?讨论\s*$",
                r"^(?:[\d.]+\s*)?分析\s*$",
            ]),
        ),
        (
            SectionType::Conclusion,
            compile(&[
                r"^(?:[\d.]+\s*)?conclusions?\s*$",
                r"^(?:[\d.]+\s*)?(?:conclusion|summary)\s+and\s+future\s+work\s*$",
                r"^(?:[\d.]+\s*)?concluding\s+remarks?\s*$",
                r"^(?:[\d.]+\s*)?future\s+work\s*$",
                r"^(?:[\d.]+\s*)?结论\s*$",
                r"^(?:[\d.]+\s*)?总结\s*$",
            ]),
        ),
        (
            SectionType::Acknowledgments,
            compile(&[r"^acknowledgm?ents?\s*$", r"^致\s*谢\s*$"]),
        ),
        (
            SectionType::Appendix,
            compile(&[
                r"^(?:[\d.]+\s*)?appendix\s*(?:[a-z])?\s*$",
                r"^(?:[\d.]+\s*)?supplementary\s+(?:material|information)\s*$",
                r"^附\s*录\s*$",
            ]),
        ),
        (
            SectionType::References,
            compile(&[r"^references?\s*$", r"^bibliography\s*$", r"^参考文献\s*$"]),
        ),
    ]
});

static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d.]+\s*").unwrap());
static LEADING_ROMAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ivxlcdm]+[.\s]+").unwrap());
static LEADING_LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][.\s]+").unwrap());

static NUMBERED_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\.?\s+\S").unwrap());
static ROMAN_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[IVXLCDM]+\.\s+\S").unwrap());
static NUMBER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\.?\s+").unwrap());

/// Classify a heading into a section type.
///
/// Normalization strips leading numbering ("1.", "1.1"), Roman numerals
/// ("II.") and letter markers ("A.") before matching the pattern table.
pub fn classify_section(heading: &str) -> SectionType {
    let clean = heading.trim().to_lowercase();
    let clean = LEADING_NUMBER_RE.replace(&clean, "");
    let clean = LEADING_ROMAN_RE.replace(&clean, "");
    let clean = LEADING_LETTER_RE.replace(&clean, "");
    let clean = clean.trim();

    for (section_type, patterns) in SECTION_PATTERNS.iter() {
        for pattern in patterns {
            if pattern.is_match(clean) {
                return *section_type;
            }
        }
    }
    SectionType::Other
}

/// Whether text looks like a numbered section heading (e.g. "3.1 Method").
pub fn is_numbered_heading(text: &str) -> bool {
    let text = text.trim();
    let char_len = text.chars().count();
    if char_len >= 150 {
        return false;
    }
    NUMBERED_HEADING_RE.is_match(text) || ROMAN_HEADING_RE.is_match(text)
}

/// Text following a numeric heading prefix ("3. Methods" -> "Methods"),
/// or `None` when the text has no such prefix.
pub fn numbered_heading_rest(text: &str) -> Option<&str> {
    let m = NUMBER_PREFIX_RE.find(text)?;
    let rest = &text[m.end()..];
    if rest.is_empty() { None } else { Some(rest) }
}
