// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — materialise page plans into a fresh document using `lopdf`.
//
// Output pages share nothing with the source page objects. Only the image
// streams a plan actually paints are copied across, together with whatever
// they reference (colour spaces, soft masks, palettes).

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, info, instrument, warn};
use unredact_core::error::{Result, UnredactError};

use crate::pdf::encoding;
use crate::reconstruct::{PagePlan, PaintOp};

/// Resource name of the single font used for recovered text.
const TEXT_FONT: &str = "F1";

/// Builds a new PDF from page plans, copying kept images from `source`.
pub struct PdfWriter<'src> {
    source: &'src Document,
    target: Document,
    /// Reserved id of the /Pages node; written in `finish`.
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
    /// Source object id -> copy in the target.
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'src> PdfWriter<'src> {
    pub fn new(source: &'src Document) -> Self {
        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();
        let font_id = target.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        Self {
            source,
            target,
            pages_id,
            font_id,
            kids: Vec::new(),
            copied: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    // -- Pages ----------------------------------------------------------------

    /// Append one page built from `plan`.
    #[instrument(skip_all, fields(page = plan.number, ops = plan.ops.len()))]
    pub fn add_page(&mut self, plan: &PagePlan) -> Result<()> {
        let mut xobjects = Dictionary::new();
        let mut names: HashMap<ObjectId, String> = HashMap::new();
        let mut operations = Vec::new();

        for op in &plan.ops {
            match op {
                PaintOp::Image { placement } => {
                    let name = match names.get(&placement.object_id) {
                        Some(name) => name.clone(),
                        None => {
                            let copy = self.copy_object(placement.object_id)?;
                            let name = format!("Im{}", names.len());
                            xobjects.set(name.as_bytes().to_vec(), Object::Reference(copy));
                            names.insert(placement.object_id, name.clone());
                            name
                        }
                    };
                    let m = placement.matrix.to_array();
                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new(
                        "cm",
                        m.iter().map(|value| real(*value)).collect(),
                    ));
                    operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                    operations.push(Operation::new("Q", vec![]));
                }
                PaintOp::Text { span, color } => {
                    let (r, g, b) = color.rgb();
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new(
                        "Tf",
                        vec![Object::Name(TEXT_FONT.as_bytes().to_vec()), real(span.size)],
                    ));
                    operations.push(Operation::new(
                        "rg",
                        vec![Object::Real(r), Object::Real(g), Object::Real(b)],
                    ));
                    operations.push(Operation::new(
                        "Tm",
                        vec![
                            1.into(),
                            0.into(),
                            0.into(),
                            1.into(),
                            real(span.origin.x),
                            real(span.origin.y),
                        ],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::String(
                            encoding::encode_str(&span.text),
                            StringFormat::Literal,
                        )],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
            }
        }

        let content = Content { operations }
            .encode()
            .map_err(|err| UnredactError::PdfError(format!("cannot encode page content: {}", err)))?;
        let content_id = self.target.add_object(Stream::new(Dictionary::new(), content));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(plan.width), real(plan.height)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { TEXT_FONT => self.font_id },
                "XObject" => xobjects,
            },
        };
        if plan.rotate != 0 {
            page.set("Rotate", plan.rotate);
        }
        let page_id = self.target.add_object(page);
        self.kids.push(Object::Reference(page_id));

        debug!(images = names.len(), "Page written");
        Ok(())
    }

    // -- Finish ---------------------------------------------------------------

    /// Close the page tree and serialise the document.
    #[instrument(skip_all, fields(pages = self.kids.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.target.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.target.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.target.trailer.set("Root", catalog_id);
        self.target.compress();

        let mut output = Vec::new();
        self.target.save_to(&mut output).map_err(|err| {
            UnredactError::PdfError(format!("failed to serialise reconstructed PDF: {}", err))
        })?;

        info!(bytes = output.len(), pages = count, "Reconstructed PDF serialised");
        Ok(output)
    }

    // -- Object copying -------------------------------------------------------

    /// Copy a source object (and everything it references) into the target,
    /// at most once per source id.
    fn copy_object(&mut self, id: ObjectId) -> Result<ObjectId> {
        if let Some(copy) = self.copied.get(&id) {
            return Ok(*copy);
        }
        let object = self.source.get_object(id).map_err(|err| {
            UnredactError::PdfError(format!("cannot read object {} {} R: {}", id.0, id.1, err))
        })?;

        // Reserve the id first so reference cycles resolve to it.
        let copy = self.target.new_object_id();
        self.copied.insert(id, copy);
        let cloned = self.clone_value(object);
        self.target.objects.insert(copy, cloned);
        Ok(copy)
    }

    fn clone_value(&mut self, object: &'src Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dict(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.clone_value(item)).collect())
            }
            Object::Reference(ref_id) => match self.copy_object(*ref_id) {
                Ok(copy) => Object::Reference(copy),
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            },
            Object::Stream(stream) => {
                let mut dict = self.clone_dict(&stream.dict);
                dict.remove(b"Length");
                let already_encoded = dict.has(b"Filter");
                Object::Stream(
                    Stream::new(dict, stream.content.clone()).with_compression(!already_encoded),
                )
            }
            other => other.clone(),
        }
    }

    fn clone_dict(&mut self, dict: &'src Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.clone_value(value));
        }
        copy
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}
