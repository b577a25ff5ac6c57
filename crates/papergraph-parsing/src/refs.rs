use once_cell::sync::Lazy;
use regex::Regex;

use papergraph_core::Reference;

/// At most this many authors are retained per reference.
const MAX_AUTHORS: usize = 10;

/// Minimum line length for the marker-less fallback segmentation.
const MIN_FALLBACK_LINE_CHARS: usize = 20;

/// Venue strings outside this range are treated as extraction noise.
const MIN_VENUE_CHARS: usize = 2;
const MAX_VENUE_CHARS: usize = 120;

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:\[(\d+)\]|(\d+)\.\s)").unwrap());

/// Parse a references section into structured entries.
///
/// Entries are split on leading `[n]` / `n.` markers at line starts; the
/// block following marker `n` gets `order = n`. When no markers exist
/// anywhere, every line longer than 20 chars becomes one reference.
pub fn parse_references(text: &str) -> Vec<Reference> {
    let mut references = Vec::new();

    let markers: Vec<(usize, usize, usize)> = MARKER_RE
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            let number = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            (whole.start(), whole.end(), number)
        })
        .collect();

    if !markers.is_empty() {
        let preamble = text[..markers[0].0].trim();
        if !preamble.is_empty() {
            references.push(parse_single_reference(preamble, 0));
        }
        for (i, &(_, end, number)) in markers.iter().enumerate() {
            let block_end = markers.get(i + 1).map_or(text.len(), |m| m.0);
            let block = text[end..block_end].trim();
            if !block.is_empty() {
                references.push(parse_single_reference(block, number));
            }
        }
    }

    if references.is_empty() {
        for (i, line) in text.trim().split('\n').enumerate() {
            let line = line.trim();
            if line.chars().count() > MIN_FALLBACK_LINE_CHARS {
                references.push(parse_single_reference(line, i + 1));
            }
        }
    }

    references
}

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s]+").unwrap());
static QUOTED_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\"\u{201c}\u{201d}](.+?)[\"\u{201c}\u{201d}]").unwrap());

/// Parse one reference string. Never fails; missing fields stay `None`.
fn parse_single_reference(text: &str, order: usize) -> Reference {
    let year_match = YEAR_RE.find(text);
    let year = year_match.and_then(|m| m.as_str().parse::<i32>().ok());

    let doi = DOI_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches('.').to_string());

    let segments = sentence_segments(text);

    let mut title_from_segments = false;
    let title = match QUOTED_TITLE_RE.captures(text) {
        Some(caps) => {
            let quoted = caps.get(1).unwrap().as_str().trim();
            if quoted.is_empty() {
                None
            } else {
                Some(quoted.to_string())
            }
        }
        None => {
            if segments.len() >= 2 && segments[1].chars().count() > 10 {
                title_from_segments = true;
                Some(segments[1].trim().to_string())
            } else {
                None
            }
        }
    };

    let venue = if title_from_segments && segments.len() >= 3 {
        clean_venue(segments[2])
    } else {
        None
    };

    let author_text = match year_match {
        Some(m) => text[..m.start()].trim().to_string(),
        None => text.chars().take(50).collect::<String>(),
    };
    let author_text = author_text
        .trim_end_matches([',', '.', '('])
        .trim_end()
        .to_string();
    // Authors end at the first period that is not an initial
    let author_text = match find_first_real_period(&author_text) {
        Some(pos) => author_text[..pos].to_string(),
        None => author_text,
    };
    let authors = split_authors(&author_text);

    Reference {
        raw_text: text.to_string(),
        title,
        authors,
        year,
        venue,
        doi,
        order,
    }
}

/// Periods that close a mid-reference abbreviation, not a sentence.
const MID_REF_ABBREVIATIONS: &[&str] = &[
    "vs", "eg", "ie", "cf", "fig", "figs", "eq", "eqs", "sec", "ch", "pt", "no",
];

static PERIOD_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+").unwrap());

/// Patterns that mark the text after a period as a continuation of an author
/// list, so the period belongs to an initial rather than a sentence boundary.
static AUTHOR_CONTINUATION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^[A-Z][a-z'\-]+\s*,").unwrap(),
        Regex::new(r"^[A-Z][a-z'\-]+\s+[A-Z]{1,2},").unwrap(),
        Regex::new(r"(?i)^and\s+[A-Z]").unwrap(),
        Regex::new(r"^[A-Z]\.").unwrap(),
        Regex::new(r"(?i)^[A-Z][a-z'\-]+\s+and\s+[A-Z]").unwrap(),
        Regex::new(r"^[A-Z][a-z'\-]+\s+[A-Z][a-z'\-]+\s*,").unwrap(),
    ]
});

/// Split a reference into sentence segments, skipping periods that belong to
/// author initials ("J.", "A.") or common abbreviations ("vs.", "fig.").
fn sentence_segments(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0usize;

    for m in PERIOD_SPACE_RE.find_iter(text) {
        let pos = m.start();
        if pos == 0 {
            continue;
        }

        // Single uppercase letter before the period: an initial, but only
        // while the following text still looks like more authors.
        let before = bytes[pos - 1];
        if before.is_ascii_uppercase() && (pos == 1 || !bytes[pos - 2].is_ascii_alphabetic()) {
            let after = &text[m.end()..];
            if AUTHOR_CONTINUATION_RES.iter().any(|re| re.is_match(after)) {
                continue;
            }
        }

        // Abbreviation check on the word before the period
        let mut word_start = pos;
        while word_start > 0 && bytes[word_start - 1].is_ascii_alphabetic() {
            word_start -= 1;
        }
        while word_start > 0 && !text.is_char_boundary(word_start) {
            word_start -= 1;
        }
        let word_before = &text[word_start..pos];
        if MID_REF_ABBREVIATIONS.contains(&word_before.to_lowercase().as_str()) {
            continue;
        }

        let segment = text[start..pos].trim();
        if !segment.is_empty() {
            segments.push(segment);
        }
        start = m.end();
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        segments.push(rest);
    }
    segments
}

/// First period that is not an author initial like "M." or "J.".
fn find_first_real_period(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for m in PERIOD_SPACE_RE.find_iter(text) {
        let pos = m.start();
        if pos == 0 {
            continue;
        }
        let before = bytes[pos - 1];
        if before.is_ascii_uppercase() && (pos == 1 || !bytes[pos - 2].is_ascii_alphabetic()) {
            continue;
        }
        return Some(pos);
    }
    None
}

static AND_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+and\s+|\s*&\s*").unwrap());
static LEADING_INITIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]\.").unwrap());
static SURNAME_INITIALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][\w'\-]+,(?:\s*[A-Z]\.)+").unwrap());

/// Split an author region into individual names.
///
/// `and`/`&` always separate authors. Comma handling is surname-initial
/// aware: `Surname, I.` groups survive intact; parts without that shape are
/// split on commas (IEEE-style `J. Smith, A. Jones` lists).
fn split_authors(author_text: &str) -> Vec<String> {
    let mut authors = Vec::new();

    for part in AND_SPLIT_RE.split(author_text) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if !LEADING_INITIAL_RE.is_match(part) {
            let names: Vec<&str> = SURNAME_INITIALS_RE
                .find_iter(part)
                .map(|m| m.as_str())
                .collect();
            if !names.is_empty() {
                for name in names {
                    push_author(&mut authors, name);
                }
                continue;
            }
        }

        for piece in part.split(',') {
            push_author(&mut authors, piece);
        }
    }

    authors.truncate(MAX_AUTHORS);
    authors
}

fn push_author(authors: &mut Vec<String>, raw: &str) {
    let name = raw.trim();
    if name.chars().count() > 1 {
        authors.push(name.to_string());
    }
}

static VENUE_LEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:in[:\s]\s*|proceedings\s+of\s+(?:the\s+)?)").unwrap());
static VENUE_TRAILING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[,;\s]*\b(?:19|20)\d{2}[a-z]?\b.*|[,;\s]*\bpp?\.\s*\d+.*|[.,;:\s]+)$").unwrap()
});

fn clean_venue(raw: &str) -> Option<String> {
    let venue = VENUE_LEADING_RE.replace(raw, "");
    let venue = VENUE_TRAILING_RE.replace(&venue, "");
    let venue = venue.trim();
    let chars = venue.chars().count();
    if chars < MIN_VENUE_CHARS || chars > MAX_VENUE_CHARS {
        return None;
    }
    if venue.chars().next().is_some_and(|c| c.is_lowercase()) {
        return None;
    }
    Some(venue.to_string())
}
