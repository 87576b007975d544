use std::hash::{Hash, Hasher};

// Canonical float storage: NaN and non-finite collapse to 0.0, -0.0 to +0.0,
// so derived equality is reflexive and `to_bits` hashing agrees with it.
pub(crate) fn canon_f32(value: f32) -> f32 {
    if value.is_finite() { value + 0.0 } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
    pub const BLACK: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
    pub const WHITE: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: canon_f32(width).max(0.0),
            height: canon_f32(height).max(0.0),
        }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Eq for Size {}

impl Hash for Size {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.to_bits().hash(state);
        self.height.to_bits().hash(state);
    }
}

// Integer pixel box of a component; geometry treats the origin as (0,0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

// Four independently-optional insets. An unset side is not the same thing as
// a zero side: margins, padding and border widths distinguish "not styled"
// from "styled to nothing".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Outline {
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
}

impl Outline {
    pub const NONE: Outline = Outline {
        top: None,
        right: None,
        bottom: None,
        left: None,
    };

    pub fn of(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top: Some(canon_f32(top)),
            right: Some(canon_f32(right)),
            bottom: Some(canon_f32(bottom)),
            left: Some(canon_f32(left)),
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::of(value, value, value, value)
    }

    pub fn with_top(mut self, value: f32) -> Self {
        self.top = Some(canon_f32(value));
        self
    }

    pub fn with_right(mut self, value: f32) -> Self {
        self.right = Some(canon_f32(value));
        self
    }

    pub fn with_bottom(mut self, value: f32) -> Self {
        self.bottom = Some(canon_f32(value));
        self
    }

    pub fn with_left(mut self, value: f32) -> Self {
        self.left = Some(canon_f32(value));
        self
    }

    pub fn is_unset(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }

    pub fn has_positive(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .any(|side| side.is_some_and(|v| v > 0.0))
    }
}

impl Eq for Outline {}

impl Hash for Outline {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.top.map(f32::to_bits).hash(state);
        self.right.map(f32::to_bits).hash(state);
        self.bottom.map(f32::to_bits).hash(state);
        self.left.map(f32::to_bits).hash(state);
    }
}

// Full horizontal/vertical arc extents of one rounded corner, so a corner
// radius of r is a CornerArc of (2r, 2r). ZERO means unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerArc {
    pub width: f32,
    pub height: f32,
}

impl CornerArc {
    pub const ZERO: CornerArc = CornerArc {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: canon_f32(width).max(0.0),
            height: canon_f32(height).max(0.0),
        }
    }

    pub fn is_rounded(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Eq for CornerArc {}

impl Hash for CornerArc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.to_bits().hash(state);
        self.height.to_bits().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CornerRadius {
    #[default]
    None,
    Uniform(CornerArc),
    PerCorner {
        top_left: CornerArc,
        top_right: CornerArc,
        bottom_right: CornerArc,
        bottom_left: CornerArc,
    },
}

impl CornerRadius {
    pub fn arc(&self, corner: Corner) -> CornerArc {
        match *self {
            CornerRadius::None => CornerArc::ZERO,
            CornerRadius::Uniform(arc) => arc,
            CornerRadius::PerCorner {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            } => match corner {
                Corner::TopLeft => top_left,
                Corner::TopRight => top_right,
                Corner::BottomRight => bottom_right,
                Corner::BottomLeft => bottom_left,
            },
        }
    }

    // Some(arc) when all four corners carry one identical arc.
    pub fn uniform_arc(&self) -> Option<CornerArc> {
        match *self {
            CornerRadius::None => Some(CornerArc::ZERO),
            CornerRadius::Uniform(arc) => Some(arc),
            CornerRadius::PerCorner {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            } => {
                if top_left == top_right && top_right == bottom_right && bottom_right == bottom_left
                {
                    Some(top_left)
                } else {
                    None
                }
            }
        }
    }

    pub fn is_rounded(&self) -> bool {
        match *self {
            CornerRadius::None => false,
            CornerRadius::Uniform(arc) => arc.is_rounded(),
            CornerRadius::PerCorner {
                top_left,
                top_right,
                bottom_right,
                bottom_left,
            } => {
                top_left.is_rounded()
                    || top_right.is_rounded()
                    || bottom_right.is_rounded()
                    || bottom_left.is_rounded()
            }
        }
    }
}

// Independently cached and composited rendering layers, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Content,
    Border,
    Foreground,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Background,
        Layer::Content,
        Layer::Border,
        Layer::Foreground,
    ];

    pub fn index(self) -> usize {
        match self {
            Layer::Background => 0,
            Layer::Content => 1,
            Layer::Border => 2,
            Layer::Foreground => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentArea {
    Body,
    Interior,
    Exterior,
    Border,
}
