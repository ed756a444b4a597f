// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open source documents and expose their pages, page boxes,
// content streams, and image streams using the `lopdf` crate.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument};
use unredact_core::error::{Result, UnredactError};
use unredact_core::types::Rect;

use crate::pdf::objects::{self, resolve_inherited};

/// US Letter, used when a page declares no usable /MediaBox.
const FALLBACK_PAGE_BOX: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// One page of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage {
    /// 1-indexed page number.
    pub number: u32,
    /// Object id of the page dictionary.
    pub id: ObjectId,
    /// The visible page box: CropBox clipped to MediaBox.
    pub visible_box: Rect,
    /// Page rotation in degrees, normalised to 0, 90, 180, or 270.
    pub rotate: i64,
}

impl SourcePage {
    pub fn width(&self) -> f64 {
        self.visible_box.width()
    }

    pub fn height(&self) -> f64 {
        self.visible_box.height()
    }
}

/// Read-only access to a source PDF.
///
/// Wraps `lopdf::Document`. The reader owns the parsed document for the
/// duration of one reconstruction and is dropped afterwards.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            UnredactError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            UnredactError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// All pages in document order.
    pub fn pages(&self) -> Vec<SourcePage> {
        self.document
            .get_pages()
            .into_iter()
            .map(|(number, id)| SourcePage {
                number,
                id,
                visible_box: self.visible_box(id),
                rotate: self.rotation(id),
            })
            .collect()
    }

    /// Look up a single page (1-indexed).
    pub fn page(&self, number: u32) -> Result<SourcePage> {
        let pages = self.document.get_pages();
        let id = *pages.get(&number).ok_or_else(|| {
            UnredactError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                number,
                pages.len()
            ))
        })?;
        Ok(SourcePage {
            number,
            id,
            visible_box: self.visible_box(id),
            rotate: self.rotation(id),
        })
    }

    // -- Page attributes ------------------------------------------------------

    fn visible_box(&self, page_id: ObjectId) -> Rect {
        let media = resolve_inherited(&self.document, page_id, b"MediaBox")
            .and_then(|obj| objects::rect(&self.document, obj))
            .filter(|rect| !rect.is_empty())
            .unwrap_or(FALLBACK_PAGE_BOX);
        resolve_inherited(&self.document, page_id, b"CropBox")
            .and_then(|obj| objects::rect(&self.document, obj))
            .and_then(|crop| crop.intersect(&media))
            .unwrap_or(media)
    }

    fn rotation(&self, page_id: ObjectId) -> i64 {
        resolve_inherited(&self.document, page_id, b"Rotate")
            .and_then(objects::number)
            .map(|degrees| ((degrees as i64) % 360 + 360) % 360 / 90 * 90)
            .unwrap_or(0)
    }

    /// The page's resource dictionary, following /Parent inheritance.
    pub fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        match resolve_inherited(&self.document, page_id, b"Resources")? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Decoded content of a page. Multiple content streams are joined with
    /// whitespace so operators never fuse across stream boundaries.
    pub fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page = match self.document.get_object(page_id) {
            Ok(Object::Dictionary(dict)) => dict,
            _ => {
                return Err(UnredactError::PdfError(format!(
                    "page object {:?} is not a dictionary",
                    page_id
                )));
            }
        };

        let contents = match page.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };

        let streams: Vec<&Object> = match objects::resolve(&self.document, contents) {
            Some(Object::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => {
                return Err(UnredactError::PdfError(
                    "cannot resolve page /Contents".to_string(),
                ));
            }
        };

        let mut content = Vec::new();
        for item in streams {
            match objects::resolve(&self.document, item) {
                Some(Object::Stream(stream)) => {
                    let bytes = objects::stream_data(&self.document, stream)?;
                    if !content.is_empty() {
                        content.push(b'\n');
                    }
                    content.extend_from_slice(&bytes);
                }
                _ => {
                    return Err(UnredactError::PdfError(
                        "/Contents entry is not a stream".to_string(),
                    ));
                }
            }
        }
        Ok(content)
    }

    /// Fetch a stream object by id.
    pub fn stream(&self, id: ObjectId) -> Result<&Stream> {
        match self.document.get_object(id) {
            Ok(Object::Stream(stream)) => Ok(stream),
            Ok(_) => Err(UnredactError::PdfError(format!(
                "object {} {} R is not a stream",
                id.0, id.1
            ))),
            Err(err) => Err(UnredactError::PdfError(format!(
                "cannot resolve object {} {} R: {}",
                id.0, id.1, err
            ))),
        }
    }
}
