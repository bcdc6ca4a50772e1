//! Page, document, and corpus aggregation types.
//!
//! A failed page yields an empty redaction list and a non-empty error but
//! never aborts its document; a failed document never aborts the corpus.

use serde::{Deserialize, Serialize};

use crate::types::Redaction;

/// Results from processing a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: u32,
    pub redactions: Vec<Redaction>,
    pub error: Option<String>,
}

impl PageResult {
    pub fn ok(page_num: u32, redactions: Vec<Redaction>) -> Self {
        Self {
            page_num,
            redactions,
            error: None,
        }
    }

    pub fn failed(page_num: u32, error: impl Into<String>) -> Self {
        Self {
            page_num,
            redactions: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Results from processing a single document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub doc_id: String,
    pub file_path: String,
    pub total_pages: u32,
    pub pages: Vec<PageResult>,
    pub error: Option<String>,
}

impl DocumentResult {
    pub fn failed(doc_id: &str, file_path: &str, error: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            file_path: file_path.to_string(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn total_redactions(&self) -> usize {
        self.pages.iter().map(|p| p.redactions.len()).sum()
    }

    pub fn redactions(&self) -> impl Iterator<Item = &Redaction> {
        self.pages.iter().flat_map(|p| p.redactions.iter())
    }
}

/// Results from processing an entire corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusResult {
    pub documents: Vec<DocumentResult>,
    /// True when the run was interrupted and only completed documents are
    /// present.
    #[serde(default)]
    pub partial: bool,
}

impl CorpusResult {
    pub fn total_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn total_pages(&self) -> u32 {
        self.documents.iter().map(|d| d.total_pages).sum()
    }

    pub fn total_redactions(&self) -> usize {
        self.documents.iter().map(|d| d.total_redactions()).sum()
    }

    pub fn redactions(&self) -> impl Iterator<Item = &Redaction> {
        self.documents.iter().flat_map(|d| d.redactions())
    }

    pub fn failed_documents(&self) -> impl Iterator<Item = &DocumentResult> {
        self.documents.iter().filter(|d| d.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PixelRect, PointRect};
    use crate::types::DetectionMethod;

    fn redaction(doc: &str, page: u32, index: u32) -> Redaction {
        Redaction::new(
            doc,
            page,
            index,
            PointRect::new(10.0, 10.0, 110.0, 22.0),
            PixelRect::new(21, 21, 229, 46),
            DetectionMethod::Pixel,
            0.9,
        )
    }

    #[test]
    fn totals_roll_up_across_layers() {
        let corpus = CorpusResult {
            documents: vec![
                DocumentResult {
                    doc_id: "a".into(),
                    file_path: "a.pdf".into(),
                    total_pages: 2,
                    pages: vec![
                        PageResult::ok(1, vec![redaction("a", 1, 0), redaction("a", 1, 1)]),
                        PageResult::failed(2, "render failed"),
                    ],
                    error: None,
                },
                DocumentResult::failed("b", "b.pdf", "cannot open"),
            ],
            partial: false,
        };

        assert_eq!(corpus.total_documents(), 2);
        assert_eq!(corpus.total_pages(), 2);
        assert_eq!(corpus.total_redactions(), 2);
        assert_eq!(corpus.failed_documents().count(), 1);
    }

    #[test]
    fn failed_page_keeps_document_alive() {
        let doc = DocumentResult {
            doc_id: "a".into(),
            file_path: "a.pdf".into(),
            total_pages: 1,
            pages: vec![PageResult::failed(1, "boom")],
            error: None,
        };
        assert!(doc.error.is_none());
        assert_eq!(doc.total_redactions(), 0);
        assert_eq!(doc.pages[0].error.as_deref(), Some("boom"));
    }
}
