use crate::model::{MergedTable, NO_VALUE_MARKER, NormalizedTable};
use crate::vocabulary::Vocabulary;

fn clean_header_text(text: &str) -> String {
    text.chars()
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

pub(crate) fn derive_schema(header: &[Option<String>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(header.len());
    for (index, cell) in header.iter().enumerate() {
        let cleaned = cell.as_deref().map(clean_header_text).unwrap_or_default();
        let mut name = if cleaned.is_empty() {
            format!("col_{index}")
        } else {
            cleaned
        };
        if columns.contains(&name) {
            name = format!("{name}_{index}");
        }
        columns.push(name);
    }
    columns
}

fn normalize_cell(cell: Option<&str>, vocabulary: &Vocabulary) -> String {
    let Some(text) = cell else {
        return NO_VALUE_MARKER.to_string();
    };

    let trimmed = text.trim();
    match vocabulary.expand(trimmed) {
        Some(expansion) => expansion.to_string(),
        None => trimmed.to_string(),
    }
}

/// Derive the column schema from row 0 and rewrite every data cell through
/// trim + exact-match vocabulary substitution. Row widths are left as
/// extracted; the sink enforces the schema width.
#[must_use]
pub fn normalize(table: &MergedTable, vocabulary: &Vocabulary) -> NormalizedTable {
    let Some((header, data)) = table.rows.split_first() else {
        return NormalizedTable::default();
    };

    let columns = derive_schema(header);
    let rows = data
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| normalize_cell(cell.as_deref(), vocabulary))
                .collect()
        })
        .collect();

    NormalizedTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{derive_schema, normalize};
    use crate::model::MergedTable;
    use crate::vocabulary::Vocabulary;

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|cell| Some((*cell).to_string())).collect()
    }

    #[test]
    fn schema_strips_line_breaks_and_whitespace() {
        let columns = derive_schema(&row(&[" Código ", "Descrição\ndo item"]));
        assert_eq!(columns, vec!["Código", "Descrição do item"]);
    }

    #[test]
    fn blank_header_cells_get_positional_identifiers() {
        let columns = derive_schema(&[Some("Código".to_string()), None, Some("  ".to_string())]);
        assert_eq!(columns, vec!["Código", "col_1", "col_2"]);
    }

    #[test]
    fn duplicate_header_cells_stay_unique() {
        let columns = derive_schema(&row(&["Seg", "Seg"]));
        assert_eq!(columns, vec!["Seg", "Seg_1"]);
    }

    #[test]
    fn null_cells_become_the_no_value_marker() {
        let table = MergedTable {
            rows: vec![row(&["Código", "Seg"]), vec![Some("1".to_string()), None]],
        };
        let normalized = normalize(&table, &Vocabulary::empty());
        assert_eq!(normalized.rows, vec![vec!["1", "None"]]);
    }

    #[test]
    fn empty_string_cells_stay_empty() {
        let table = MergedTable {
            rows: vec![
                row(&["Código", "Seg"]),
                vec![Some("1".to_string()), Some(String::new())],
            ],
        };
        let normalized = normalize(&table, &Vocabulary::empty());
        assert_eq!(normalized.rows, vec![vec!["1", ""]]);
    }

    #[test]
    fn vocabulary_matches_whole_trimmed_cells_only() {
        let table = MergedTable {
            rows: vec![
                row(&["Código", "Seg", "Extra"]),
                row(&["1", " OD ", "ODX"]),
            ],
        };
        let normalized = normalize(&table, &Vocabulary::ans_coverage_legend());
        assert_eq!(
            normalized.rows,
            vec![vec!["1", "Seg. Odontológica", "ODX"]]
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let vocabulary = Vocabulary::ans_coverage_legend();
        let table = MergedTable {
            rows: vec![row(&["Código", "Seg"]), row(&["1", "OD"])],
        };
        let first = normalize(&table, &vocabulary);

        let again = MergedTable {
            rows: std::iter::once(
                first.columns.iter().cloned().map(Some).collect::<Vec<_>>(),
            )
            .chain(
                first
                    .rows
                    .iter()
                    .map(|row| row.iter().cloned().map(Some).collect()),
            )
            .collect(),
        };
        let second = normalize(&again, &vocabulary);
        assert_eq!(first, second);
    }

    #[test]
    fn row_count_matches_data_row_count() {
        let table = MergedTable {
            rows: vec![row(&["A", "B"]), row(&["1", "2"]), row(&["3", "4"])],
        };
        let normalized = normalize(&table, &Vocabulary::empty());
        assert_eq!(normalized.rows.len(), table.data_row_count());
    }

    #[test]
    fn empty_table_normalizes_to_nothing() {
        let normalized = normalize(&MergedTable::default(), &Vocabulary::empty());
        assert!(normalized.columns.is_empty());
        assert!(normalized.rows.is_empty());
    }

    #[test]
    fn two_page_rol_excerpt_normalizes_end_to_end() {
        let table = MergedTable {
            rows: vec![
                row(&["Code", "Desc"]),
                row(&["1", "OD"]),
                vec![Some("2".to_string()), None],
                row(&["3", "AMB"]),
            ],
        };
        let normalized = normalize(&table, &Vocabulary::ans_coverage_legend());
        assert_eq!(normalized.columns, vec!["Code", "Desc"]);
        assert_eq!(
            normalized.rows,
            vec![
                vec!["1", "Seg. Odontológica"],
                vec!["2", "None"],
                vec!["3", "Seg. Ambulatorial"],
            ]
        );
    }
}
