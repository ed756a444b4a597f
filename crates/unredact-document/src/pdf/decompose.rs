// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page decomposition — interprets a page's content stream to enumerate every
// image placement (with its page-space rectangle) and every recovered text
// span (origin, size, string).
//
// The interpreter tracks the graphics state stack (`q`/`Q`/`cm`), enters Form
// XObjects recursively, and follows the text state far enough to know where
// each shown string starts. Failures on one object are recorded as warnings
// and never abort the page.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};
use unredact_core::EngineConfig;
use unredact_core::types::{Matrix, ObjectWarning, Point, Rect, TextSpan};

use crate::pdf::font::{FontDecoder, Glyph};
use crate::pdf::objects::{self, get, get_dict, number};
use crate::pdf::reader::{PdfReader, SourcePage};

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 12;

/// A `TJ` adjustment larger than this (in 1/1000 em, leftwards) reads as a
/// word break.
const TJ_SPACE_THRESHOLD: f64 = 200.0;

/// Fraction of the font size within which a new string is considered to
/// continue the previous span.
const SPAN_JOIN_TOLERANCE: f64 = 0.15;

/// One placement of an image XObject on a page.
///
/// The same image object may be placed several times; each placement is a
/// separate value sharing the source object id.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Resource name used by the content stream (e.g. `Im0`).
    pub resource: String,
    /// The image stream in the source document.
    pub object_id: ObjectId,
    /// Full placement transform in page space. Maps the unit square onto the
    /// painted area.
    pub matrix: Matrix,
    /// Axis-aligned footprint of the placement.
    pub rect: Rect,
}

/// Everything recovered from one source page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecomposedPage {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub rotate: i64,
    /// Image placements in painting order.
    pub images: Vec<ImagePlacement>,
    /// Placements dropped for being too short.
    pub filtered: usize,
    /// Text spans in content order.
    pub spans: Vec<TextSpan>,
    pub warnings: Vec<ObjectWarning>,
}

/// Extracts image placements and text spans from source pages.
#[derive(Debug, Clone)]
pub struct PageDecomposer {
    min_placement_height: f64,
}

impl PageDecomposer {
    pub fn new(min_placement_height: f64) -> Self {
        Self {
            min_placement_height,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.min_placement_height)
    }

    /// Decompose one page. Unreadable content yields an empty page with a
    /// warning rather than an error.
    #[instrument(skip_all, fields(page = page.number))]
    pub fn decompose(&self, reader: &PdfReader, page: &SourcePage) -> DecomposedPage {
        let mut result = DecomposedPage {
            number: page.number,
            width: page.width(),
            height: page.height(),
            rotate: page.rotate,
            ..DecomposedPage::default()
        };

        let content = match reader.page_content(page.id) {
            Ok(content) => content,
            Err(err) => {
                warn!(page = page.number, %err, "Skipping unreadable page content");
                result.warnings.push(ObjectWarning {
                    resource: "page contents".into(),
                    message: err.to_string(),
                });
                return result;
            }
        };

        let base = GraphicsState {
            ctm: Matrix::translate(-page.visible_box.x0, -page.visible_box.y0),
            text: TextParams::default(),
        };
        let mut interpreter = Interpreter::new(reader.document(), self.min_placement_height);
        interpreter.run(&content, reader.page_resources(page.id), base, 0);

        result.images = interpreter.images;
        result.filtered = interpreter.filtered;
        result.spans = interpreter.spans.finish();
        result.warnings = interpreter.warnings;

        debug!(
            images = result.images.len(),
            filtered = result.filtered,
            spans = result.spans.len(),
            warnings = result.warnings.len(),
            "Page decomposed"
        );
        result
    }
}

impl Default for PageDecomposer {
    fn default() -> Self {
        Self::new(unredact_core::config::DEFAULT_MIN_PLACEMENT_HEIGHT)
    }
}

// -- Interpreter state ----------------------------------------------------------

/// Text parameters saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextParams {
    font: Rc<FontDecoder>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// Horizontal scaling as a fraction (Tz / 100).
    scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: Rc::new(FontDecoder::default()),
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextParams,
}

struct Interpreter<'a> {
    doc: &'a Document,
    min_height: f64,
    fonts: HashMap<ObjectId, Rc<FontDecoder>>,
    /// Forms currently being interpreted, to refuse self-reference.
    active_forms: Vec<ObjectId>,
    images: Vec<ImagePlacement>,
    filtered: usize,
    spans: SpanCollector,
    warnings: Vec<ObjectWarning>,
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, min_height: f64) -> Self {
        Self {
            doc,
            min_height,
            fonts: HashMap::new(),
            active_forms: Vec::new(),
            images: Vec::new(),
            filtered: 0,
            spans: SpanCollector::default(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, resource: impl Into<String>, message: impl Into<String>) {
        let warning = ObjectWarning {
            resource: resource.into(),
            message: message.into(),
        };
        warn!(resource = %warning.resource, message = %warning.message, "Skipping object");
        self.warnings.push(warning);
    }

    /// Interpret one content stream with its resources, starting from the
    /// graphics state in effect where it is invoked.
    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        mut state: GraphicsState,
        depth: usize,
    ) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(err) => {
                self.warn("content stream", format!("cannot parse content: {}", err));
                return;
            }
        };

        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = &op.operands;
            let num = |index: usize| operands.get(index).and_then(number);

            match op.operator.as_str() {
                // -- Graphics state --
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }

                // -- XObjects --
                "Do" => {
                    if let Some(name) = operands.first().and_then(objects::name) {
                        self.paint_xobject(name, resources, &state, depth);
                    }
                }

                // -- Text objects and state --
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    if let Some(name) = operands.first().and_then(objects::name) {
                        state.text.font = self.font(name, resources);
                    }
                    if let Some(size) = num(1) {
                        state.text.size = size;
                    }
                }
                "Tc" => state.text.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => state.text.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => state.text.scaling = num(0).unwrap_or(100.0) / 100.0,
                "TL" => state.text.leading = num(0).unwrap_or(0.0),
                "Ts" => state.text.rise = num(0).unwrap_or(0.0),
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        tm = m;
                        tlm = m;
                    }
                }
                "Td" | "TD" => {
                    let (tx, ty) = (num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
                    if op.operator == "TD" {
                        state.text.leading = -ty;
                    }
                    tlm = Matrix::translate(tx, ty).multiply(&tlm);
                    tm = tlm;
                }
                "T*" => {
                    tlm = Matrix::translate(0.0, -state.text.leading).multiply(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&state, &mut tm, &[TextItem::Bytes(bytes)]);
                    }
                }
                "'" => {
                    tlm = Matrix::translate(0.0, -state.text.leading).multiply(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&state, &mut tm, &[TextItem::Bytes(bytes)]);
                    }
                }
                "\"" => {
                    state.text.word_spacing = num(0).unwrap_or(0.0);
                    state.text.char_spacing = num(1).unwrap_or(0.0);
                    tlm = Matrix::translate(0.0, -state.text.leading).multiply(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(&state, &mut tm, &[TextItem::Bytes(bytes)]);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let items: Vec<TextItem<'_>> = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(TextItem::Bytes(bytes)),
                                other => number(other).map(TextItem::Adjust),
                            })
                            .collect();
                        self.show(&state, &mut tm, &items);
                    }
                }
                _ => {}
            }
        }
    }

    fn font(&mut self, name: &[u8], resources: Option<&'a Dictionary>) -> Rc<FontDecoder> {
        let entry = resources
            .and_then(|res| get_dict(self.doc, res, b"Font"))
            .and_then(|fonts| fonts.get(name).ok());

        match entry {
            Some(Object::Reference(id)) => {
                if let Some(decoder) = self.fonts.get(id) {
                    return Rc::clone(decoder);
                }
                let decoder = match self.doc.get_object(*id) {
                    Ok(Object::Dictionary(dict)) => Rc::new(FontDecoder::from_dict(self.doc, dict)),
                    _ => {
                        debug!(font = %objects::name_string(name), "unresolvable font, using WinAnsi");
                        Rc::new(FontDecoder::default())
                    }
                };
                self.fonts.insert(*id, Rc::clone(&decoder));
                decoder
            }
            Some(Object::Dictionary(dict)) => Rc::new(FontDecoder::from_dict(self.doc, dict)),
            _ => {
                debug!(font = %objects::name_string(name), "font not in resources, using WinAnsi");
                Rc::new(FontDecoder::default())
            }
        }
    }

    fn paint_xobject(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        state: &GraphicsState,
        depth: usize,
    ) {
        let resource = objects::name_string(name);
        let ctm = state.ctm;
        let entry = resources
            .and_then(|res| get_dict(self.doc, res, b"XObject"))
            .and_then(|xobjects| xobjects.get(name).ok());

        let id = match entry {
            Some(Object::Reference(id)) => *id,
            Some(_) => {
                self.warn(resource, "XObject entry is not an indirect reference");
                return;
            }
            None => {
                self.warn(resource, "XObject not found in resources");
                return;
            }
        };

        let stream = match self.doc.get_object(id) {
            Ok(Object::Stream(stream)) => stream,
            Ok(_) => {
                self.warn(resource, format!("object {} {} R is not a stream", id.0, id.1));
                return;
            }
            Err(err) => {
                self.warn(resource, format!("cannot resolve object {} {} R: {}", id.0, id.1, err));
                return;
            }
        };

        match get(self.doc, &stream.dict, b"Subtype").and_then(objects::name) {
            Some(b"Image") => {
                let rect = Rect::from_unit_square(&ctm);
                if rect.height() <= self.min_height {
                    debug!(%resource, %rect, "Ignoring short placement");
                    self.filtered += 1;
                    return;
                }
                self.images.push(ImagePlacement {
                    resource,
                    object_id: id,
                    matrix: ctm,
                    rect,
                });
            }
            Some(b"Form") => {
                if depth >= MAX_FORM_DEPTH || self.active_forms.contains(&id) {
                    self.warn(resource, "form nesting too deep or recursive");
                    return;
                }
                let data = match objects::stream_data(self.doc, stream) {
                    Ok(data) => data,
                    Err(err) => {
                        self.warn(resource, err.to_string());
                        return;
                    }
                };
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|obj| objects::matrix(self.doc, obj))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = get_dict(self.doc, &stream.dict, b"Resources").or(resources);

                self.active_forms.push(id);
                self.spans.break_run();
                let form_state = GraphicsState {
                    ctm: form_matrix.multiply(&ctm),
                    text: state.text.clone(),
                };
                self.run(&data, form_resources, form_state, depth + 1);
                self.spans.break_run();
                self.active_forms.pop();
            }
            _ => debug!(%resource, "Ignoring XObject of unknown subtype"),
        }
    }

    /// Show a sequence of strings and adjustments, advancing the text matrix.
    fn show(&mut self, state: &GraphicsState, tm: &mut Matrix, items: &[TextItem<'_>]) {
        let text = &state.text;
        let size = text.size;
        let trm = tm.multiply(&state.ctm);
        let origin = trm.apply(Point::new(0.0, text.rise));
        let effective_size = size.abs() * trm.vertical_scale();

        let mut shown = String::new();
        for item in items {
            match item {
                TextItem::Bytes(bytes) => {
                    for Glyph {
                        text: glyph_text,
                        width,
                        is_word_space,
                    } in text.font.decode(bytes)
                    {
                        shown.push_str(&glyph_text);
                        let spacing = text.char_spacing
                            + if is_word_space { text.word_spacing } else { 0.0 };
                        let advance = (width / 1000.0 * size + spacing) * text.scaling;
                        *tm = Matrix::translate(advance, 0.0).multiply(tm);
                    }
                }
                TextItem::Adjust(amount) => {
                    let advance = -amount / 1000.0 * size * text.scaling;
                    *tm = Matrix::translate(advance, 0.0).multiply(tm);
                    if -amount > TJ_SPACE_THRESHOLD && !shown.is_empty() && !shown.ends_with(' ') {
                        shown.push(' ');
                    }
                }
            }
        }

        let end = tm.multiply(&state.ctm).apply(Point::new(0.0, text.rise));
        self.spans.push(origin, effective_size, shown, end);
    }
}

/// An element of a `TJ` array.
enum TextItem<'b> {
    Bytes(&'b [u8]),
    Adjust(f64),
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut values = [0.0; 6];
    for (slot, operand) in values.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(Matrix::new(
        values[0], values[1], values[2], values[3], values[4], values[5],
    ))
}

// -- Span assembly --------------------------------------------------------------

/// Joins consecutive shown strings into spans.
///
/// A string continues the previous span when it has the same size and
/// starts where the previous one ended. Whitespace-only spans are dropped at
/// the end, after joining had a chance to absorb them.
#[derive(Debug, Default)]
struct SpanCollector {
    spans: Vec<TextSpan>,
    /// Pen position after the last span, if it may still be extended.
    open_end: Option<Point>,
}

impl SpanCollector {
    fn push(&mut self, origin: Point, size: f64, text: String, end: Point) {
        if text.is_empty() {
            return;
        }
        if let (Some(last), Some(open_end)) = (self.spans.last_mut(), self.open_end) {
            let tolerance = SPAN_JOIN_TOLERANCE * size.max(1.0);
            let same_size = (last.size - size).abs() <= 0.01 * size.max(1.0);
            let touching = (origin.x - open_end.x).hypot(origin.y - open_end.y) <= tolerance;
            if same_size && touching {
                last.text.push_str(&text);
                self.open_end = Some(end);
                return;
            }
        }
        self.spans.push(TextSpan { origin, size, text });
        self.open_end = Some(end);
    }

    fn break_run(&mut self) {
        self.open_end = None;
    }

    fn finish(self) -> Vec<TextSpan> {
        self.spans
            .into_iter()
            .filter(|span| !span.text.trim().is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureImage, FixturePage, build_pdf};

    fn decompose(page: FixturePage) -> DecomposedPage {
        let bytes = build_pdf(&[page]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let source = reader.page(1).unwrap();
        PageDecomposer::default().decompose(&reader, &source)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn image_placement_rect_follows_ctm() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(4, 2, 5))
                .content("q 200 0 0 20 60 690 cm /Im0 Do Q"),
        );
        assert_eq!(page.images.len(), 1);
        let placement = &page.images[0];
        assert_eq!(placement.resource, "Im0");
        assert!(approx(placement.rect.x0, 60.0));
        assert!(approx(placement.rect.y0, 690.0));
        assert!(approx(placement.rect.width(), 200.0));
        assert!(approx(placement.rect.height(), 20.0));
    }

    #[test]
    fn each_placement_of_a_shared_image_is_separate() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .content(
                    "q 100 0 0 30 10 10 cm /Im0 Do Q q 50 0 0 40 300 400 cm /Im0 Do Q",
                ),
        );
        assert_eq!(page.images.len(), 2);
        assert_eq!(page.images[0].object_id, page.images[1].object_id);
        assert_ne!(page.images[0].rect, page.images[1].rect);
    }

    #[test]
    fn short_placements_are_filtered() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .content("q 300 0 0 8 50 50 cm /Im0 Do Q q 300 0 0 10 50 80 cm /Im0 Do Q"),
        );
        assert!(page.images.is_empty());
        assert_eq!(page.filtered, 2);
    }

    #[test]
    fn graphics_state_is_restored() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .content("q 2 0 0 2 0 0 cm q 50 0 0 50 10 10 cm /Im0 Do Q Q q 50 0 0 50 10 10 cm /Im0 Do Q"),
        );
        assert_eq!(page.images.len(), 2);
        assert!(approx(page.images[0].rect.height(), 100.0));
        assert!(approx(page.images[1].rect.height(), 50.0));
    }

    #[test]
    fn images_inside_forms_are_found() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .form(
                    "Fm0",
                    "q 100 0 0 50 0 0 cm /Im0 Do Q",
                    Some([1.0, 0.0, 0.0, 1.0, 20.0, 30.0]),
                )
                .content("q 1 0 0 1 100 100 cm /Fm0 Do Q"),
        );
        assert_eq!(page.images.len(), 1);
        assert!(approx(page.images[0].rect.x0, 120.0));
        assert!(approx(page.images[0].rect.y0, 130.0));
    }

    #[test]
    fn forms_inherit_the_callers_text_state() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .form("Fm0", "BT 100 100 Td (Inside) Tj ET", None)
                .content("/F1 14 Tf /Fm0 Do"),
        );
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "Inside");
        assert!(approx(page.spans[0].size, 14.0));
    }

    #[test]
    fn self_referencing_form_is_entered_once() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .shared_form("Fm0", "q 100 0 0 50 0 0 cm /Im0 Do Q /Fm0 Do")
                .content("/Fm0 Do"),
        );
        assert_eq!(page.images.len(), 1);
        assert_eq!(page.warnings.len(), 1);
        assert_eq!(page.warnings[0].resource, "Fm0");
    }

    #[test]
    fn form_nesting_is_bounded() {
        let chain = |length: usize| {
            let mut page = FixturePage::new(612.0, 792.0)
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .content("/Fm0 Do");
            for level in 0..length {
                let body = if level + 1 == length {
                    "q 100 0 0 50 0 0 cm /Im0 Do Q".to_string()
                } else {
                    format!("/Fm{} Do", level + 1)
                };
                page = page.shared_form(&format!("Fm{}", level), &body);
            }
            decompose(page)
        };

        let shallow = chain(3);
        assert_eq!(shallow.images.len(), 1);
        assert!(shallow.warnings.is_empty());

        let deep = chain(MAX_FORM_DEPTH + 2);
        assert!(deep.images.is_empty());
        assert_eq!(deep.warnings.len(), 1);
        assert_eq!(deep.warnings[0].resource, format!("Fm{}", MAX_FORM_DEPTH));
    }

    #[test]
    fn rotation_is_carried_on_the_page() {
        let page = decompose(FixturePage::new(612.0, 792.0).rotate(-90));
        assert_eq!(page.rotate, 270);
    }

    #[test]
    fn crop_box_offsets_page_space() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .crop_box([50.0, 100.0, 550.0, 700.0])
                .image("Im0", FixtureImage::gray(2, 2, 0))
                .content("q 100 0 0 50 60 110 cm /Im0 Do Q BT /F1 12 Tf 72 500 Td (Visible) Tj ET"),
        );
        assert!(approx(page.width, 500.0));
        assert!(approx(page.height, 600.0));
        assert!(approx(page.images[0].rect.x0, 10.0));
        assert!(approx(page.images[0].rect.y0, 10.0));
        assert!(approx(page.spans[0].origin.x, 22.0));
        assert!(approx(page.spans[0].origin.y, 400.0));
    }

    #[test]
    fn missing_xobject_is_a_warning_not_a_failure() {
        let page = decompose(
            FixturePage::new(612.0, 792.0)
                .content("q 100 0 0 50 0 0 cm /Missing Do Q BT /F1 10 Tf 10 10 Td (still here) Tj ET"),
        );
        assert!(page.images.is_empty());
        assert_eq!(page.warnings.len(), 1);
        assert_eq!(page.warnings[0].resource, "Missing");
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "still here");
    }

    #[test]
    fn text_span_has_origin_size_and_string() {
        let page = decompose(
            FixturePage::new(612.0, 792.0).content("BT /F1 12 Tf 72 700 Td (Jane Doe) Tj ET"),
        );
        assert_eq!(page.spans.len(), 1);
        let span = &page.spans[0];
        assert_eq!(span.text, "Jane Doe");
        assert!(approx(span.origin.x, 72.0));
        assert!(approx(span.origin.y, 700.0));
        assert!(approx(span.size, 12.0));
    }

    #[test]
    fn text_matrix_scales_font_size() {
        let page = decompose(
            FixturePage::new(612.0, 792.0).content("BT /F1 1 Tf 18 0 0 18 100 200 Tm (Big) Tj ET"),
        );
        assert!(approx(page.spans[0].size, 18.0));
        assert!(approx(page.spans[0].origin.x, 100.0));
    }

    #[test]
    fn whitespace_only_spans_are_dropped() {
        let page = decompose(FixturePage::new(612.0, 792.0).content(
            "BT /F1 12 Tf 72 700 Td (   ) Tj 0 -20 Td () Tj 0 -20 Td (Name) Tj ET",
        ));
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "Name");
    }

    #[test]
    fn contiguous_strings_join_into_one_span() {
        // Default glyph width is half an em: "Jane" advances 4 * 6 = 24 units.
        let page = decompose(FixturePage::new(612.0, 792.0).content(
            "BT /F1 12 Tf 72 700 Td (Jane) Tj ( ) Tj (Doe) Tj ET",
        ));
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "Jane Doe");
    }

    #[test]
    fn separate_lines_are_separate_spans() {
        let page = decompose(FixturePage::new(612.0, 792.0).content(
            "BT /F1 12 Tf 14 TL 72 700 Td (First line) Tj T* (Second line) Tj ET",
        ));
        assert_eq!(page.spans.len(), 2);
        assert!(approx(page.spans[1].origin.y, 686.0));
        assert_eq!(page.spans[1].text, "Second line");
    }

    #[test]
    fn tj_kerning_gap_inserts_space() {
        let page = decompose(FixturePage::new(612.0, 792.0).content(
            "BT /F1 10 Tf 50 50 Td [(Jane) -300 (Doe) 20 (!)] TJ ET",
        ));
        assert_eq!(page.spans[0].text, "Jane Doe!");
    }

    #[test]
    fn decomposition_is_repeatable() {
        let page = FixturePage::new(612.0, 792.0)
            .image("Im0", FixtureImage::gray(2, 2, 5))
            .content("q 200 0 0 20 60 690 cm /Im0 Do Q BT /F1 12 Tf 72 700 Td (Jane Doe) Tj ET");
        assert_eq!(decompose(page.clone()), decompose(page));
    }
}
