use tracing::debug;

use crate::model::{MergedTable, PageGrid};

/// Equality used to decide whether a page's first surviving row repeats the
/// established header. `Exact` reproduces the source behavior byte for byte;
/// `IgnoreOuterWhitespace` tolerates trailing/leading extraction noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMatch {
    #[default]
    Exact,
    IgnoreOuterWhitespace,
}

impl HeaderMatch {
    #[must_use]
    pub fn matches(self, candidate: &[Option<String>], header: &[Option<String>]) -> bool {
        match self {
            Self::Exact => candidate == header,
            Self::IgnoreOuterWhitespace => {
                candidate.len() == header.len()
                    && candidate.iter().zip(header).all(|(left, right)| {
                        match (left, right) {
                            (Some(left), Some(right)) => left.trim() == right.trim(),
                            (None, None) => true,
                            _ => false,
                        }
                    })
            }
        }
    }
}

pub(crate) fn is_blank_row(row: &[Option<String>]) -> bool {
    row.iter()
        .all(|cell| cell.as_deref().is_none_or(|text| text.trim().is_empty()))
}

#[must_use]
pub fn stitch(grids: impl IntoIterator<Item = PageGrid>) -> MergedTable {
    stitch_with(grids, HeaderMatch::Exact)
}

/// Merge per-page grids into one table: blank rows are dropped, the first
/// non-empty grid seeds the header, and a later grid whose first surviving
/// row matches that header contributes only its remainder. A grid whose
/// first row does not match is appended whole, never truncated.
#[must_use]
pub fn stitch_with(
    grids: impl IntoIterator<Item = PageGrid>,
    header_match: HeaderMatch,
) -> MergedTable {
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for grid in grids {
        let page_number = grid.page_number;
        let surviving = grid
            .rows
            .into_iter()
            .filter(|row| !is_blank_row(row))
            .collect::<Vec<_>>();
        if surviving.is_empty() {
            continue;
        }

        if rows.is_empty() {
            debug!(page = page_number, rows = surviving.len(), "header established");
            rows.extend(surviving);
            continue;
        }

        if header_match.matches(&surviving[0], &rows[0]) {
            debug!(page = page_number, rows = surviving.len() - 1, "repeated header elided");
            rows.extend(surviving.into_iter().skip(1));
        } else {
            debug!(page = page_number, rows = surviving.len(), "continuation without header");
            rows.extend(surviving);
        }
    }

    MergedTable { rows }
}
