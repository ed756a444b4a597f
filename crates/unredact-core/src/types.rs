// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Unredact engine: page-space geometry, recovered
// text, classification decisions, and run reports.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// -- Geometry -----------------------------------------------------------------

/// A point in page space (PDF user units, origin at the lower-left corner of
/// the visible page box).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An affine transformation `[a b c d e f]` in PDF row-vector convention:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// `self × rhs`: applying the result is applying `self` first, then `rhs`.
    pub fn multiply(&self, rhs: &Matrix) -> Matrix {
        Matrix {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
            e: self.e * rhs.a + self.f * rhs.c + rhs.e,
            f: self.e * rhs.b + self.f * rhs.d + rhs.f,
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }

    /// Length of the transformed unit vertical vector. Used as the effective
    /// scale of a font size through a text rendering matrix.
    pub fn vertical_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// An axis-aligned rectangle in page space. Always normalised so that
/// `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Bounding box of the unit square mapped through `matrix`. This is the
    /// footprint of an image placed with `matrix` as its CTM.
    pub fn from_unit_square(matrix: &Matrix) -> Self {
        let corners = [
            matrix.apply(Point::new(0.0, 0.0)),
            matrix.apply(Point::new(1.0, 0.0)),
            matrix.apply(Point::new(0.0, 1.0)),
            matrix.apply(Point::new(1.0, 1.0)),
        ];
        let mut rect = Rect {
            x0: f64::INFINITY,
            y0: f64::INFINITY,
            x1: f64::NEG_INFINITY,
            y1: f64::NEG_INFINITY,
        };
        for corner in corners {
            rect.x0 = rect.x0.min(corner.x);
            rect.y0 = rect.y0.min(corner.y);
            rect.x1 = rect.x1.max(corner.x);
            rect.y1 = rect.y1.max(corner.y);
        }
        rect
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Overlapping region of two rectangles, if any.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let rect = Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        if rect.is_empty() { None } else { Some(rect) }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({:.2}, {:.2}, {:.2}, {:.2})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

// -- Text ---------------------------------------------------------------------

/// One contiguous run of recovered glyphs sharing font size and baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Baseline origin of the first glyph.
    pub origin: Point,
    /// Effective font size in page units.
    pub size: f64,
    /// Decoded string content.
    pub text: String,
}

/// Colour used to paint recovered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextColor {
    Red,
    Black,
}

impl TextColor {
    /// Red when highlighting is enabled, black otherwise.
    pub fn for_highlight(highlight: bool) -> Self {
        if highlight { Self::Red } else { Self::Black }
    }

    /// DeviceRGB components in the 0.0..=1.0 range.
    pub fn rgb(&self) -> (f32, f32, f32) {
        match self {
            Self::Red => (1.0, 0.0, 0.0),
            Self::Black => (0.0, 0.0, 0.0),
        }
    }
}

// -- Classification -----------------------------------------------------------

/// Outcome of the redaction test for one image placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Keep,
    Discard,
}

// -- Reports ------------------------------------------------------------------

/// An image placement that was dropped as a redaction overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedImage {
    /// Resource name the page used to paint the image (e.g. `Im0`).
    pub resource: String,
    /// Object number and generation of the image stream in the source file.
    pub object_id: Option<(u32, u16)>,
    /// Placement rectangle in page space.
    pub rect: Rect,
    /// Mean sample value that triggered the removal.
    pub brightness: f64,
}

/// A non-fatal problem with one object on a page. The object was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectWarning {
    pub resource: String,
    pub message: String,
}

/// Per-page summary of a reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number in the source document.
    pub page_number: u32,
    pub images_kept: usize,
    pub images_removed: Vec<RemovedImage>,
    /// Placements dropped by the minimum-height filter.
    pub images_filtered: usize,
    pub text_spans: usize,
    pub warnings: Vec<ObjectWarning>,
}

/// Summary of one reconstructed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub pages: Vec<PageReport>,
}

impl DocumentReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn removed_count(&self) -> usize {
        self.pages.iter().map(|page| page.images_removed.len()).sum()
    }

    pub fn kept_count(&self) -> usize {
        self.pages.iter().map(|page| page.images_kept).sum()
    }

    pub fn text_span_count(&self) -> usize {
        self.pages.iter().map(|page| page.text_spans).sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ObjectWarning> {
        self.pages.iter().flat_map(|page| page.warnings.iter())
    }
}

/// What happened to one input file in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Written {
        output: PathBuf,
        report: DocumentReport,
    },
    Failed {
        /// Technical error text.
        error: String,
        /// Plain-language advice for the user.
        hint: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Written { .. })
    }
}

/// Summary of a whole run over a file or a directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Set when the run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn placement_matrix_maps_unit_square_to_rect() {
        // `200 0 0 50 100 300 cm` paints an image 200 wide, 50 tall at (100, 300).
        let ctm = Matrix::new(200.0, 0.0, 0.0, 50.0, 100.0, 300.0);
        let rect = Rect::from_unit_square(&ctm);
        assert_eq!(rect, Rect::new(100.0, 300.0, 300.0, 350.0));
        assert!(approx(rect.height(), 50.0));
    }

    #[test]
    fn multiply_applies_left_operand_first() {
        let scale = Matrix::scale(2.0, 2.0);
        let shift = Matrix::translate(10.0, 5.0);
        let p = scale.multiply(&shift).apply(Point::new(1.0, 1.0));
        assert!(approx(p.x, 12.0));
        assert!(approx(p.y, 7.0));

        let q = shift.multiply(&scale).apply(Point::new(1.0, 1.0));
        assert!(approx(q.x, 22.0));
        assert!(approx(q.y, 12.0));
    }

    #[test]
    fn flipped_placement_is_normalised() {
        let ctm = Matrix::new(100.0, 0.0, 0.0, -40.0, 0.0, 500.0);
        let rect = Rect::from_unit_square(&ctm);
        assert!(approx(rect.y0, 460.0));
        assert!(approx(rect.y1, 500.0));
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersect(&b).is_none());
        assert_eq!(
            a.intersect(&Rect::new(5.0, 5.0, 15.0, 15.0)),
            Some(Rect::new(5.0, 5.0, 10.0, 10.0))
        );
    }

    #[test]
    fn highlight_selects_red() {
        assert_eq!(TextColor::for_highlight(true).rgb(), (1.0, 0.0, 0.0));
        assert_eq!(TextColor::for_highlight(false).rgb(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn batch_report_splits_outcomes() {
        let report = BatchReport {
            outcomes: vec![
                FileOutcome {
                    input: "a.pdf".into(),
                    status: FileStatus::Written {
                        output: "out/a_UNREDACTED.pdf".into(),
                        report: DocumentReport::default(),
                    },
                },
                FileOutcome {
                    input: "b.pdf".into(),
                    status: FileStatus::Failed {
                        error: "PDF operation failed: bad xref".into(),
                        hint: "The file may be damaged.".into(),
                    },
                },
            ],
            cancelled: false,
        };
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert!(report.has_failures());
    }
}
