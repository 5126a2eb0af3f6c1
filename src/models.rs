use imageproc::point::Point;
use imageproc::rect::Rect;
use std::fmt;

/// Classes of fumarole the detector can emit or the annotators can label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FumaroleType {
    Hole,
    OpenVent,
    HiddenVent,
    HeatedArea,
    Unknown,
}

impl FumaroleType {
    /// Every type, in confusion matrix order
    pub const ALL: [FumaroleType; 5] = [
        FumaroleType::Hole,
        FumaroleType::OpenVent,
        FumaroleType::HiddenVent,
        FumaroleType::HeatedArea,
        FumaroleType::Unknown,
    ];

    /// Label string used in annotation files and reports
    pub fn label(&self) -> &'static str {
        match self {
            FumaroleType::Hole => "fumarole_hole",
            FumaroleType::OpenVent => "fumarole_open_vent",
            FumaroleType::HiddenVent => "fumarole_hidden",
            FumaroleType::HeatedArea => "fumarole_heated_area",
            FumaroleType::Unknown => "unknown",
        }
    }

    /// Exact match on the label string; anything unrecognised is `Unknown`
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == label)
            .unwrap_or(FumaroleType::Unknown)
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|t| t.label().to_string()).collect()
    }
}

impl fmt::Display for FumaroleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Axis-aligned rectangle in pixel coordinates.
///
/// `x + width` and `y + height` are exclusive, so a box built from the
/// points of a single pixel has a width and height of 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    /// Midpoint of the box
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Overlap of two boxes, `None` unless the overlap has a positive area
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return None;
        }

        Some(BoundingBox::new(x, y, right - x, bottom - y))
    }

    /// True when `other` lies entirely inside this box
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.intersection(other) == Some(*other)
    }

    /// Smallest box enclosing every box in `boxes`
    pub fn enclosing(boxes: &[BoundingBox]) -> Option<BoundingBox> {
        let first = boxes.first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.right(), first.bottom());

        for b in &boxes[1..] {
            min_x = min_x.min(b.x);
            min_y = min_y.min(b.y);
            max_x = max_x.max(b.right());
            max_y = max_y.max(b.bottom());
        }

        Some(BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Grow the box by `margin` pixels on every side
    pub fn expand(&self, margin: i32) -> BoundingBox {
        BoundingBox::new(
            self.x - margin,
            self.y - margin,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }

    /// Minimal box around a set of pixel positions
    pub fn from_points(points: &[Point<i32>]) -> Option<BoundingBox> {
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);

        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some(BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Drawing rectangle, `None` for empty boxes
    pub fn to_rect(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        Some(Rect::at(self.x, self.y).of_size(self.width as u32, self.height as u32))
    }
}

/// Outline of a connected hot region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Enclosed polygon area (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut twice_area: i64 = 0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }

        twice_area.abs() as f64 / 2.0
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points).unwrap_or_default()
    }

    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A located and classified fumarole candidate
#[derive(Debug, Clone, PartialEq)]
pub struct FumaroleDetection {
    pub kind: FumaroleType,
    pub bounding_box: BoundingBox,
    /// Empty for detections synthesized by clustering
    pub contour: Contour,
}

impl FumaroleDetection {
    /// Leaf detection; the bounding box is derived from the contour
    pub fn from_contour(kind: FumaroleType, contour: Contour) -> Self {
        Self {
            kind,
            bounding_box: contour.bounding_box(),
            contour,
        }
    }

    /// Detection without an outline, e.g. an enclosing cluster box
    pub fn synthesized(kind: FumaroleType, bounding_box: BoundingBox) -> Self {
        Self {
            kind,
            bounding_box,
            contour: Contour::default(),
        }
    }

    pub fn center(&self) -> (f32, f32) {
        self.bounding_box.center()
    }
}

/// A hand-labelled box from the ground truth set
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthAnnotation {
    pub label: String,
    pub kind: FumaroleType,
    pub bounding_box: BoundingBox,
}

impl GroundTruthAnnotation {
    pub fn new(label: impl Into<String>, bounding_box: BoundingBox) -> Self {
        let label = label.into();
        let kind = FumaroleType::from_label(&label);
        Self {
            label,
            kind,
            bounding_box,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        self.bounding_box.center()
    }
}
