use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCode {
    NoGridOnPage,
    LowConfidenceGrid,
    RowPadded,
    RowTruncated,
    EmptyResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAnomaly {
    pub code: AnomalyCode,
    pub message: String,
    pub page: Option<u32>,
    pub row: Option<usize>,
    pub confidence: Option<f32>,
}

impl PageAnomaly {
    #[must_use]
    pub fn new(code: AnomalyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            row: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
