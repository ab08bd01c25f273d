use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::Document;
use lopdf::Object;
use lopdf::content::Content;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::grid_detect::{LOW_CONFIDENCE_THRESHOLD, detect_page_grid, split_line_into_cells};
use crate::model::PageGrid;
use crate::options::{ExtractOptions, PageSelection};
use crate::warning::{AnomalyCode, PageAnomaly};

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        let bytes = if bytes.len() > 2 { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("winansi") || lower.contains("latin") || lower.contains("ansi") {
            let (latin, _, had_errors) = WINDOWS_1252.decode(bytes);
            if !had_errors && !latin.is_empty() {
                return latin.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut wide_cell_lines = 0_i64;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        non_empty_lines += 1;

        let cells = split_line_into_cells(line).len();
        if cells >= 2 {
            multi_cell_lines += 1;
        }
        if cells >= 3 {
            wide_cell_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + wide_cell_lines * 15 + non_empty_lines - broken_penalty
}

fn choose_best_text(candidates: &[String]) -> String {
    candidates
        .iter()
        .max_by_key(|text| extraction_quality_score(text))
        .cloned()
        .unwrap_or_default()
}

fn extract_text_from_page_content(document: &Document, page_id: lopdf::ObjectId) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    text.push_str(&decode_pdf_bytes(encoding, bytes));
                }
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                Object::Integer(value) => {
                    if *value < -100 {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Forward-only reader that yields one [`PageGrid`] per page with a
/// detectable grid, in physical page order. Pages without a grid are
/// recorded as anomalies and skipped.
pub struct PageGridReader {
    document: Document,
    pages: Vec<(u32, lopdf::ObjectId)>,
    cursor: usize,
    fallback_pages: Option<Vec<String>>,
    whole_text: Option<String>,
    selection: Option<PageSelection>,
    min_cols: usize,
    grids_yielded: usize,
    anomalies: Vec<PageAnomaly>,
}

impl PageGridReader {
    pub fn open(input_pdf: &Path, options: &ExtractOptions) -> Result<Self, ExtractError> {
        let document =
            Document::load(input_pdf).map_err(|source| ExtractError::DocumentUnreadable {
                path: input_pdf.to_path_buf(),
                source,
            })?;
        let extracted = pdf_extract::extract_text(input_pdf).ok();
        Ok(Self::from_parts(document, extracted, options))
    }

    pub fn from_bytes(input_pdf: &[u8], options: &ExtractOptions) -> Result<Self, ExtractError> {
        let document =
            Document::load_mem(input_pdf).map_err(|source| ExtractError::DocumentUnreadable {
                path: "<bytes>".into(),
                source,
            })?;
        let extracted = pdf_extract::extract_text_from_mem(input_pdf).ok();
        Ok(Self::from_parts(document, extracted, options))
    }

    fn from_parts(document: Document, extracted: Option<String>, options: &ExtractOptions) -> Self {
        let pages = document.get_pages().into_iter().collect::<Vec<_>>();

        let (fallback_pages, whole_text) = match extracted {
            Some(text) => {
                let split = split_text_into_pages(&text);
                if split.len() == pages.len() {
                    (Some(split), None)
                } else {
                    (None, Some(text))
                }
            }
            None => (None, None),
        };

        debug!(pages = pages.len(), "document opened");

        Self {
            document,
            pages,
            cursor: 0,
            fallback_pages,
            whole_text,
            selection: options.pages.clone(),
            min_cols: options.min_cols,
            grids_yielded: 0,
            anomalies: Vec::new(),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn grids_yielded(&self) -> usize {
        self.grids_yielded
    }

    pub fn take_anomalies(&mut self) -> Vec<PageAnomaly> {
        std::mem::take(&mut self.anomalies)
    }

    fn page_text(&self, index: usize, page_no: u32, page_id: lopdf::ObjectId) -> String {
        let mut candidates = Vec::new();
        if let Some(text) = self
            .fallback_pages
            .as_ref()
            .and_then(|fallback| fallback.get(index).cloned())
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }
        if let Some(text) = extract_text_from_page_content(&self.document, page_id) {
            candidates.push(text);
        }
        if let Some(text) = self
            .document
            .extract_text(&[page_no])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }

        let local_best_score = candidates
            .iter()
            .map(|text| extraction_quality_score(text))
            .max()
            .unwrap_or(i64::MIN / 4);
        if index == 0
            && local_best_score < 80
            && let Some(text) = self
                .whole_text
                .as_ref()
                .filter(|text| !text.trim().is_empty())
                .cloned()
        {
            candidates.push(text);
        }

        choose_best_text(&candidates)
    }
}

impl Iterator for PageGridReader {
    type Item = PageGrid;

    fn next(&mut self) -> Option<PageGrid> {
        while self.cursor < self.pages.len() {
            let index = self.cursor;
            let (page_no, page_id) = self.pages[index];
            self.cursor += 1;

            if let Some(selection) = &self.selection
                && !selection.contains(page_no)
            {
                continue;
            }

            let text = self.page_text(index, page_no, page_id);
            match detect_page_grid(page_no, &text, self.min_cols) {
                Some((grid, confidence)) => {
                    if confidence < LOW_CONFIDENCE_THRESHOLD {
                        warn!(page = page_no, confidence, "low-confidence grid");
                        self.anomalies.push(
                            PageAnomaly::new(
                                AnomalyCode::LowConfidenceGrid,
                                "grid structure on page is ambiguous",
                            )
                            .with_page(page_no)
                            .with_confidence(confidence),
                        );
                    }
                    debug!(page = page_no, rows = grid.rows.len(), "grid detected");
                    self.grids_yielded += 1;
                    return Some(grid);
                }
                None => {
                    debug!(page = page_no, "no grid on page");
                    self.anomalies.push(
                        PageAnomaly::new(AnomalyCode::NoGridOnPage, "no table grid detected")
                            .with_page(page_no),
                    );
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_pdf_bytes, extraction_quality_score, split_text_into_pages};

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn decodes_windows_1252_when_encoding_hint_is_present() {
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode("Odontológica");
        assert!(!had_errors);
        let decoded = decode_pdf_bytes(Some("WinAnsiEncoding"), &bytes);
        assert_eq!(decoded, "Odontológica");
    }

    #[test]
    fn tabular_text_outscores_prose() {
        let tabular = "Código  Procedimento  Seg\n0001  Consulta  OD\n0002  Radiografia  AMB";
        let prose = "Este anexo descreve a cobertura obrigatória dos planos.";
        assert!(extraction_quality_score(tabular) > extraction_quality_score(prose));
    }
}
