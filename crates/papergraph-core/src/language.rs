use serde::{Deserialize, Serialize};

/// Ratio of CJK codepoints above which a document is considered Chinese.
pub const CJK_RATIO_THRESHOLD: f64 = 0.3;

/// Detected document language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Detect whether text is primarily Chinese or English.
///
/// Counts CJK codepoints over all non-whitespace characters; empty input is
/// English.
pub fn detect_language(text: &str) -> Language {
    let mut cjk = 0usize;
    let mut total = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        total += 1;
        if is_cjk(c) {
            cjk += 1;
        }
    }
    if total == 0 {
        return Language::En;
    }
    if cjk as f64 / total as f64 > CJK_RATIO_THRESHOLD {
        Language::Zh
    } else {
        Language::En
    }
}
