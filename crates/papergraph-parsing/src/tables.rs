use once_cell::sync::Lazy;
use regex::Regex;

use papergraph_core::{ParsedDocument, ParsedPage, Table, TextFragment};

/// Fragments within this y-distance belong to the same table row.
const ROW_Y_TOLERANCE: f32 = 3.0;
/// Column origins must align within this across rows.
const COLUMN_X_TOLERANCE: f32 = 10.0;
/// Fragments closer than this on the x axis are one cell.
const CELL_MERGE_GAP: f32 = 4.0;
const MIN_TABLE_COLUMNS: usize = 2;
const MIN_TABLE_ROWS: usize = 2;

/// Cell contents treated as placeholders when deciding whether a data row
/// carries any information.
const PLACEHOLDER_CELLS: &[&str] = &["", "\u{2014}", "-"];

#[derive(Debug, Clone)]
struct Cell {
    x0: f32,
    x1: f32,
    text: String,
}

#[derive(Debug, Clone)]
struct RowCluster {
    cells: Vec<Cell>,
}

/// Extract tables from every page of a document.
pub fn extract_tables(doc: &ParsedDocument) -> Vec<Table> {
    doc.pages.iter().flat_map(extract_page_tables).collect()
}

/// Scan one page for grid-like structures.
///
/// A table is a run of at least two consecutive rows sharing a column
/// signature (same cell count, x-origins aligned). The first row is the
/// header; empty-header candidates and candidates without any informative
/// data row are skipped, never failing the page.
pub fn extract_page_tables(page: &ParsedPage) -> Vec<Table> {
    let rows = cluster_rows(&page.fragments);

    let mut tables = Vec::new();
    let mut table_index = 0usize;
    let mut i = 0usize;
    while i < rows.len() {
        let run = grid_run_length(&rows[i..]);
        if run >= MIN_TABLE_ROWS {
            match build_table(&rows[i..i + run], page, table_index) {
                Some(table) => tables.push(table),
                None => {
                    tracing::debug!(
                        page = page.page_index,
                        table = table_index,
                        "skipped malformed table candidate"
                    );
                }
            }
            table_index += 1;
            i += run;
        } else {
            i += 1;
        }
    }
    tables
}

/// Group fragments into rows by y origin, and row fragments into cells by
/// x adjacency.
fn cluster_rows(fragments: &[TextFragment]) -> Vec<RowCluster> {
    let mut positioned: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty())
        .collect();
    positioned.sort_by(|a, b| {
        a.bbox
            .1
            .total_cmp(&b.bbox.1)
            .then(a.bbox.0.total_cmp(&b.bbox.0))
    });

    let mut rows: Vec<Vec<&TextFragment>> = Vec::new();
    let mut row_y = f32::MIN;
    for frag in positioned {
        match rows.last_mut() {
            Some(row) if (frag.bbox.1 - row_y).abs() < ROW_Y_TOLERANCE => row.push(frag),
            _ => {
                row_y = frag.bbox.1;
                rows.push(vec![frag]);
            }
        }
    }

    rows.into_iter()
        .map(|frags| {
            let mut cells: Vec<Cell> = Vec::new();
            let mut sorted = frags;
            sorted.sort_by(|a, b| a.bbox.0.total_cmp(&b.bbox.0));
            for frag in sorted {
                match cells.last_mut() {
                    Some(cell) if frag.bbox.0 - cell.x1 < CELL_MERGE_GAP => {
                        cell.text.push(' ');
                        cell.text.push_str(frag.text.trim());
                        cell.x1 = cell.x1.max(frag.bbox.2);
                    }
                    _ => cells.push(Cell {
                        x0: frag.bbox.0,
                        x1: frag.bbox.2,
                        text: frag.text.trim().to_string(),
                    }),
                }
            }
            RowCluster { cells }
        })
        .collect()
}

/// Length of the longest grid run starting at `rows[0]`.
fn grid_run_length(rows: &[RowCluster]) -> usize {
    let first = match rows.first() {
        Some(row) if row.cells.len() >= MIN_TABLE_COLUMNS => row,
        _ => return 0,
    };

    let mut run = 1;
    for row in &rows[1..] {
        let aligned = row.cells.len() == first.cells.len()
            && row
                .cells
                .iter()
                .zip(first.cells.iter())
                .all(|(cell, anchor)| (cell.x0 - anchor.x0).abs() <= COLUMN_X_TOLERANCE);
        if !aligned {
            break;
        }
        run += 1;
    }
    run
}

fn build_table(rows: &[RowCluster], page: &ParsedPage, table_index: usize) -> Option<Table> {
    let raw_headers: Vec<String> = rows[0].cells.iter().map(|c| c.text.trim().to_string()).collect();

    let non_empty_indices: Vec<usize> = raw_headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty())
        .map(|(i, _)| i)
        .collect();
    if non_empty_indices.is_empty() {
        return None;
    }

    let headers: Vec<String> = non_empty_indices
        .iter()
        .map(|&i| raw_headers[i].clone())
        .collect();

    let mut data_rows: Vec<Vec<String>> = Vec::new();
    for row in &rows[1..] {
        let clean_row: Vec<String> = non_empty_indices
            .iter()
            .map(|&i| row.cells[i].text.trim().to_string())
            .collect();
        let informative = clean_row
            .iter()
            .any(|c| !PLACEHOLDER_CELLS.contains(&c.as_str()));
        if informative {
            data_rows.push(clean_row);
        }
    }
    if data_rows.is_empty() {
        return None;
    }

    let caption = clean_caption(&find_table_caption(&page.raw_text, table_index));

    Some(Table {
        page: page.page_index + 1,
        headers,
        rows: data_rows,
        caption,
    })
}

static CAPTION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(Table\s+\d+[.:]\s*.{5,200}?)(?:\n|$)").unwrap(),
        Regex::new(r"(?i)(表\s*\d+[.:：]\s*.{5,200}?)(?:\n|$)").unwrap(),
        Regex::new(r"(?i)(TABLE\s+\d+[.:]\s*.{5,200}?)(?:\n|$)").unwrap(),
    ]
});

/// Associate a caption with a table by position in the page's caption list,
/// falling back to the first caption on the page.
fn find_table_caption(page_text: &str, table_index: usize) -> String {
    let mut captions: Vec<String> = Vec::new();
    for re in CAPTION_RES.iter() {
        for caps in re.captures_iter(page_text) {
            captions.push(caps.get(1).unwrap().as_str().trim().to_string());
        }
    }

    if let Some(caption) = captions.get(table_index) {
        caption.clone()
    } else if let Some(caption) = captions.first() {
        caption.clone()
    } else {
        String::new()
    }
}

static CAPTION_PREFIX_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^Table\s+\d+[.:]?\s*").unwrap(),
        Regex::new(r"(?i)^Tab\.?\s+\d+[.:]?\s*").unwrap(),
        Regex::new(r"^表\s*\d+[.:：]?\s*").unwrap(),
    ]
});

/// Drop the redundant "Table N" prefix from a stored caption.
fn clean_caption(caption: &str) -> String {
    let mut cleaned = caption.to_string();
    for re in CAPTION_PREFIX_RES.iter() {
        cleaned = re.replace(&cleaned, "").to_string();
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_frag(text: &str, x: f32, y: f32) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            font_size: 9.0,
            font_name: String::new(),
            is_bold: false,
            page_index: 0,
            bbox: (x, y, x + 40.0, y + 10.0),
        }
    }

    fn grid_page(raw_text: &str, fragments: Vec<TextFragment>) -> ParsedPage {
        ParsedPage {
            page_index: 0,
            width: 612.0,
            height: 792.0,
            fragments,
            raw_text: raw_text.to_string(),
        }
    }

    fn simple_grid() -> Vec<TextFragment> {
        vec![
            cell_frag("Model", 50.0, 100.0),
            cell_frag("Accuracy", 150.0, 100.0),
            cell_frag("F1", 250.0, 100.0),
            cell_frag("BERT", 50.0, 115.0),
            cell_frag("91.2", 150.0, 115.0),
            cell_frag("90.8", 250.0, 115.0),
            cell_frag("RoBERTa", 50.0, 130.0),
            cell_frag("93.1", 150.0, 130.0),
            cell_frag("92.5", 250.0, 130.0),
        ]
    }

    #[test]
    fn extracts_simple_grid() {
        let page = grid_page("Table 1: Results on the benchmark.\nbody text", simple_grid());
        let tables = extract_page_tables(&page);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.headers, vec!["Model", "Accuracy", "F1"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["BERT", "91.2", "90.8"]);
        assert_eq!(table.page, 1);
        assert_eq!(table.caption, "Results on the benchmark.");
    }

    #[test]
    fn placeholder_rows_are_dropped() {
        let mut fragments = simple_grid();
        fragments.push(cell_frag("\u{2014}", 50.0, 145.0));
        fragments.push(cell_frag("-", 150.0, 145.0));
        fragments.push(cell_frag("\u{2014}", 250.0, 145.0));
        let page = grid_page("", fragments);
        let tables = extract_page_tables(&page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn single_row_grid_is_not_a_table() {
        let fragments = vec![
            cell_frag("Model", 50.0, 100.0),
            cell_frag("Accuracy", 150.0, 100.0),
        ];
        let page = grid_page("", fragments);
        assert!(extract_page_tables(&page).is_empty());
    }

    #[test]
    fn prose_lines_are_not_tables() {
        // Single-column lines never reach the minimum column count.
        let fragments = vec![
            cell_frag("This is a line of prose.", 50.0, 100.0),
            cell_frag("Another line of prose follows.", 50.0, 115.0),
            cell_frag("And a third line of prose.", 50.0, 130.0),
        ];
        let page = grid_page("", fragments);
        assert!(extract_page_tables(&page).is_empty());
    }

    #[test]
    fn misaligned_columns_break_the_run() {
        let fragments = vec![
            cell_frag("A", 50.0, 100.0),
            cell_frag("B", 150.0, 100.0),
            cell_frag("left", 80.0, 115.0),
            cell_frag("right", 220.0, 115.0),
        ];
        let page = grid_page("", fragments);
        assert!(extract_page_tables(&page).is_empty());
    }

    #[test]
    fn chinese_caption_is_found_and_cleaned() {
        let page = grid_page("表1：主要实验结果对比分析。", simple_grid());
        let tables = extract_page_tables(&page);
        assert_eq!(tables[0].caption, "主要实验结果对比分析。");
    }

    #[test]
    fn caption_falls_back_to_first_on_page() {
        let page = grid_page("Table 3: Only caption present here.", simple_grid());
        let tables = extract_page_tables(&page);
        assert_eq!(tables[0].caption, "Only caption present here.");
    }

    #[test]
    fn fragments_without_geometry_produce_no_tables() {
        let fragments = vec![
            TextFragment {
                text: "line one of fallback text".to_string(),
                font_size: 12.0,
                font_name: String::new(),
                is_bold: false,
                page_index: 0,
                bbox: (0.0, 0.0, 0.0, 0.0),
            },
            TextFragment {
                text: "line two of fallback text".to_string(),
                font_size: 12.0,
                font_name: String::new(),
                is_bold: false,
                page_index: 0,
                bbox: (0.0, 0.0, 0.0, 0.0),
            },
        ];
        let page = grid_page("", fragments);
        assert!(extract_page_tables(&page).is_empty());
    }

    #[test]
    fn clean_caption_strips_prefixes() {
        assert_eq!(clean_caption("Table 2: Ablation results"), "Ablation results");
        assert_eq!(clean_caption("TABLE 4. Timing"), "Timing");
        assert_eq!(clean_caption("表2：结果"), "结果");
        assert_eq!(clean_caption(""), "");
    }
}
