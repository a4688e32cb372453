//! Drawing context and command recording
//!
//! Nodes draw through the [`DrawContext`] trait. The [`RecordingContext`]
//! captures the calls as a flat list of [`DrawCommand`]s, which is how
//! offscreen layers store their content and how headless hosts inspect a
//! frame.

use crate::layer::{Affine2D, Brush, ClipShape, CornerRadius, LayerId, Point, Rect, Size};

// ─────────────────────────────────────────────────────────────────────────────
// Stroke Types
// ─────────────────────────────────────────────────────────────────────────────

/// Stroke style configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    /// Line width
    pub width: f32,
}

impl Default for Stroke {
    fn default() -> Self {
        Self { width: 1.0 }
    }
}

impl Stroke {
    pub fn new(width: f32) -> Self {
        Self { width }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Types
// ─────────────────────────────────────────────────────────────────────────────

/// Path command for building vector paths
#[derive(Clone, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    Close,
}

/// A vector path
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    pub fn cubic_to(mut self, cx1: f32, cy1: f32, cx2: f32, cy2: f32, x: f32, y: f32) -> Self {
        self.commands.push(PathCommand::CubicTo {
            control1: Point::new(cx1, cy1),
            control2: Point::new(cx2, cy2),
            end: Point::new(x, y),
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// Create a rectangle path
    pub fn rect(rect: Rect) -> Self {
        Self::new()
            .move_to(rect.x(), rect.y())
            .line_to(rect.right(), rect.y())
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.x(), rect.bottom())
            .close()
    }

    /// Create a rounded rectangle path
    ///
    /// Radii are clamped to half the minimum dimension.
    pub fn rounded_rect(rect: Rect, corner_radius: impl Into<CornerRadius>) -> Self {
        let r = corner_radius.into();
        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());

        let max_r = (w.min(h) / 2.0).max(0.0);
        let tl = r.top_left.min(max_r);
        let tr = r.top_right.min(max_r);
        let br = r.bottom_right.min(max_r);
        let bl = r.bottom_left.min(max_r);

        // Cubic Bézier quarter-circle approximation
        let k = 1.0 - 0.552_284_8;

        let mut path = Self::new().move_to(x + tl, y).line_to(x + w - tr, y);
        if tr > 0.0 {
            path = path.cubic_to(x + w - tr * k, y, x + w, y + tr * k, x + w, y + tr);
        }
        path = path.line_to(x + w, y + h - br);
        if br > 0.0 {
            path = path.cubic_to(x + w, y + h - br * k, x + w - br * k, y + h, x + w - br, y + h);
        }
        path = path.line_to(x + bl, y + h);
        if bl > 0.0 {
            path = path.cubic_to(x + bl * k, y + h, x, y + h - bl * k, x, y + h - bl);
        }
        path = path.line_to(x, y + tl);
        if tl > 0.0 {
            path = path.cubic_to(x, y + tl * k, x + tl * k, y, x + tl, y);
        }
        path.close()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Color Filters
// ─────────────────────────────────────────────────────────────────────────────

/// Color filter applied when a layer is composited
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFilter {
    /// 4x5 row-major color matrix (RGBA rows, last column is offset)
    ColorMatrix { matrix: [f32; 20] },
}

impl ColorFilter {
    /// Saturation adjustment, 0 is grayscale and 1 leaves colors untouched
    pub fn saturation(factor: f32) -> Self {
        let inv = 1.0 - factor;
        let r = 0.299 * inv;
        let g = 0.587 * inv;
        let b = 0.114 * inv;
        #[rustfmt::skip]
        let matrix = [
            r + factor, g, b, 0.0, 0.0,
            r, g + factor, b, 0.0, 0.0,
            r, g, b + factor, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        ColorFilter::ColorMatrix { matrix }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draw Context
// ─────────────────────────────────────────────────────────────────────────────

/// Immediate-mode drawing surface
pub trait DrawContext {
    /// Push a transform, concatenated onto the current one
    fn push_transform(&mut self, transform: Affine2D);

    fn pop_transform(&mut self);

    /// The accumulated transform
    fn current_transform(&self) -> Affine2D;

    fn push_clip(&mut self, shape: ClipShape);

    fn pop_clip(&mut self);

    fn fill_rect(&mut self, rect: Rect, corner_radius: CornerRadius, brush: Brush);

    fn fill_path(&mut self, path: &Path, brush: Brush);

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, brush: Brush);

    /// Composite an offscreen layer at the current transform
    fn draw_layer(&mut self, layer: LayerId);

    fn viewport_size(&self) -> Size;
}

/// A recorded draw call
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    PushTransform(Affine2D),
    PopTransform,
    PushClip(ClipShape),
    PopClip,
    FillRect {
        rect: Rect,
        corner_radius: CornerRadius,
        brush: Brush,
    },
    FillPath {
        path: Path,
        brush: Brush,
    },
    StrokePath {
        path: Path,
        stroke: Stroke,
        brush: Brush,
    },
    DrawLayer(LayerId),
}

/// A [`DrawContext`] that records commands instead of rasterizing
#[derive(Debug)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    transform_stack: Vec<Affine2D>,
    viewport: Size,
}

impl RecordingContext {
    pub fn new(viewport: Size) -> Self {
        Self {
            commands: Vec::new(),
            transform_stack: vec![Affine2D::IDENTITY],
            viewport,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl DrawContext for RecordingContext {
    fn push_transform(&mut self, transform: Affine2D) {
        self.commands.push(DrawCommand::PushTransform(transform));
        let combined = self.current_transform().then(&transform);
        self.transform_stack.push(combined);
    }

    fn pop_transform(&mut self) {
        self.commands.push(DrawCommand::PopTransform);
        if self.transform_stack.len() > 1 {
            self.transform_stack.pop();
        }
    }

    fn current_transform(&self) -> Affine2D {
        self.transform_stack.last().copied().unwrap_or_default()
    }

    fn push_clip(&mut self, shape: ClipShape) {
        self.commands.push(DrawCommand::PushClip(shape));
    }

    fn pop_clip(&mut self) {
        self.commands.push(DrawCommand::PopClip);
    }

    fn fill_rect(&mut self, rect: Rect, corner_radius: CornerRadius, brush: Brush) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            corner_radius,
            brush,
        });
    }

    fn fill_path(&mut self, path: &Path, brush: Brush) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            brush,
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, brush: Brush) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            stroke: stroke.clone(),
            brush,
        });
    }

    fn draw_layer(&mut self, layer: LayerId) {
        self.commands.push(DrawCommand::DrawLayer(layer));
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }
}
