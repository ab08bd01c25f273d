use std::collections::BTreeSet;
use std::str::FromStr;

use crate::stitch::HeaderMatch;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputEncoding {
    /// BOM-prefixed UTF-8, the spreadsheet-friendly default.
    #[default]
    Utf8Bom,
    Utf8,
    Windows1252,
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "utf8-bom" | "utf-8-sig" => Ok(Self::Utf8Bom),
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "windows1252" | "windows-1252" | "latin1" => Ok(Self::Windows1252),
            _ => Err(format!(
                "unknown encoding '{name}', expected utf8-bom, utf8 or windows1252"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub delimiter: u8,
    pub encoding: OutputEncoding,
    pub vocabulary: Vocabulary,
    pub min_cols: usize,
    pub header_match: HeaderMatch,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            delimiter: b';',
            encoding: OutputEncoding::Utf8Bom,
            vocabulary: Vocabulary::ans_coverage_legend(),
            min_cols: 2,
            header_match: HeaderMatch::Exact,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{OutputEncoding, PageSelection};

    #[test]
    fn parse_page_selection_range_and_single() {
        let selection = PageSelection::from_str("1-3,5").expect("selection should parse");
        assert!(selection.contains(1));
        assert!(selection.contains(2));
        assert!(selection.contains(3));
        assert!(selection.contains(5));
        assert!(!selection.contains(4));
    }

    #[test]
    fn reject_invalid_page_selection() {
        let err = PageSelection::from_str("3-1").expect_err("invalid range should fail");
        assert!(err.contains("invalid range"));
    }

    #[test]
    fn parse_output_encoding_aliases() {
        assert_eq!(
            OutputEncoding::from_str("utf-8-sig").expect("alias should parse"),
            OutputEncoding::Utf8Bom
        );
        assert_eq!(
            OutputEncoding::from_str("latin1").expect("alias should parse"),
            OutputEncoding::Windows1252
        );
        assert!(OutputEncoding::from_str("ebcdic").is_err());
    }
}
