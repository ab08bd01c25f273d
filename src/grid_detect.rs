use std::collections::HashMap;

use crate::model::PageGrid;

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

pub(crate) fn split_line_into_cells(line: &str) -> Vec<Option<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.contains('\t') {
        return trimmed
            .split('\t')
            .map(|field| {
                let field = field.trim();
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = 0_usize;

    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            whitespace_run += 1;
            if whitespace_run >= 2 {
                if !current.trim().is_empty() {
                    cells.push(Some(current.trim().to_string()));
                    current.clear();
                }
                continue;
            }
            current.push(' ');
            continue;
        }

        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        cells.push(Some(current.trim().to_string()));
    }

    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<Option<String>> {
    line.split_whitespace()
        .map(|field| Some(field.to_string()))
        .collect()
}

fn populated_cell_count(cells: &[Option<String>]) -> usize {
    cells.iter().filter(|cell| cell.is_some()).count()
}

pub(crate) fn modal_width(rows: &[Vec<Option<String>>]) -> usize {
    let mut freq = HashMap::new();
    for width in rows.iter().map(Vec::len) {
        *freq.entry(width).or_insert(0_usize) += 1;
    }

    freq.into_iter()
        .max_by_key(|(width, count)| (*count, *width))
        .map_or(0, |(width, _)| width)
}

pub(crate) fn grid_confidence(rows: &[Vec<Option<String>>]) -> f32 {
    if rows.len() < 2 {
        return 0.0;
    }

    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = if max_width == 0 {
        0.0
    } else {
        1.0 - ((max_width - min_width) as f32 / max_width as f32)
    };

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

pub(crate) fn detect_page_grid(
    page_number: u32,
    text: &str,
    min_cols: usize,
) -> Option<(PageGrid, f32)> {
    let mut blocks: Vec<Vec<Vec<Option<String>>>> = Vec::new();
    let mut current_rows: Vec<Vec<Option<String>>> = Vec::new();

    let flush_current =
        |rows: &mut Vec<Vec<Option<String>>>, blocks: &mut Vec<Vec<Vec<Option<String>>>>| {
            if rows.len() >= 2 {
                blocks.push(std::mem::take(rows));
            } else {
                rows.clear();
            }
        };

    for line in text.lines() {
        let mut cells = split_line_into_cells(line);
        if populated_cell_count(&cells) < min_cols {
            let soft_cells = soft_split_line_into_cells(line);
            let has_numeric = soft_cells.iter().flatten().any(|cell| {
                cell.chars().any(|ch| ch.is_ascii_digit())
            });
            let looks_like_sentence = ['.', '!', '?']
                .iter()
                .any(|punctuation| line.trim_end().ends_with(*punctuation));
            if soft_cells.len() >= min_cols
                && !looks_like_sentence
                && (has_numeric || soft_cells.len() <= 6)
            {
                cells = soft_cells;
            }
        }

        if populated_cell_count(&cells) >= min_cols {
            current_rows.push(cells);
        } else {
            flush_current(&mut current_rows, &mut blocks);
        }
    }

    flush_current(&mut current_rows, &mut blocks);

    let rows = blocks
        .into_iter()
        .max_by_key(Vec::len)?;
    let confidence = grid_confidence(&rows);
    Some((PageGrid { page_number, rows }, confidence))
}

#[cfg(test)]
mod tests {
    use super::{
        detect_page_grid, grid_confidence, modal_width, soft_split_line_into_cells,
        split_line_into_cells,
    };

    fn cell(text: &str) -> Option<String> {
        Some(text.to_string())
    }

    #[test]
    fn splits_double_space_separated_cells() {
        let cells = split_line_into_cells("Consulta odontológica  OD  AMB");
        assert_eq!(cells, vec![cell("Consulta odontológica"), cell("OD"), cell("AMB")]);
    }

    #[test]
    fn tab_separated_cells_keep_empty_positions_as_null() {
        let cells = split_line_into_cells("0001\t\tAMB");
        assert_eq!(cells, vec![cell("0001"), None, cell("AMB")]);
    }

    #[test]
    fn soft_splits_single_space_cells() {
        let cells = soft_split_line_into_cells("Código Procedimento Segmento");
        assert_eq!(
            cells,
            vec![cell("Código"), cell("Procedimento"), cell("Segmento")]
        );
    }

    #[test]
    fn detects_modal_width() {
        let rows = vec![
            vec![cell("a"), cell("b")],
            vec![cell("1"), cell("2")],
            vec![cell("x")],
        ];
        assert_eq!(modal_width(&rows), 2);
    }

    #[test]
    fn consistent_rows_score_high_confidence() {
        let rows = vec![
            vec![cell("Código"), cell("Procedimento")],
            vec![cell("1"), cell("Consulta")],
            vec![cell("2"), cell("Radiografia")],
        ];
        assert!(grid_confidence(&rows) > 0.9);
    }

    #[test]
    fn detects_largest_block_as_page_grid() {
        let text = "Vigência  2021\n\nCódigo  Procedimento  Seg\n0001  Consulta  OD\n0002  Radiografia  AMB\n";
        let (grid, confidence) = detect_page_grid(3, text, 2).expect("grid should be detected");
        assert_eq!(grid.page_number, 3);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[0][0], cell("Código"));
        assert!(confidence > 0.5);
    }

    #[test]
    fn prose_page_yields_no_grid() {
        let text = "Este anexo lista os procedimentos de cobertura obrigatória.\nNada além de texto corrido.";
        assert!(detect_page_grid(1, text, 2).is_none());
    }

    #[test]
    fn single_table_like_line_is_not_a_grid() {
        assert!(detect_page_grid(1, "Legenda  OD  AMB", 2).is_none());
    }
}
