use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tiny_skia::Pixmap;

use crate::error::BezelError;
use crate::graphics::Graphics;
use crate::types::{Bounds, ComponentArea, CornerRadius, Layer, Outline, Rgba, Size, canon_f32};

// Flat base colors: the foundation fills the margin region outside the
// body, the background fills the body itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BaseColors {
    pub background: Option<Rgba>,
    pub foundation: Option<Rgba>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BorderConf {
    pub widths: Outline,
    pub color: Option<Rgba>,
    pub radius: CornerRadius,
}

impl BorderConf {
    pub fn has_width(&self) -> bool {
        self.widths.has_positive()
    }
}

// Pixel payload of an image decoration. Compared and hashed by handle
// identity, which keeps cache keys conservative without touching pixels.
#[derive(Clone)]
pub struct ImageSource(Arc<Pixmap>);

impl ImageSource {
    pub fn new(pixmap: Pixmap) -> Self {
        Self(Arc::new(pixmap))
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.0
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageSource({}x{} @ {:p})",
            self.0.width(),
            self.0.height(),
            Arc::as_ptr(&self.0)
        )
    }
}

impl PartialEq for ImageSource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ImageSource {}

impl Hash for ImageSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageConf {
    pub source: Option<ImageSource>,
    pub opacity: f32,
}

impl ImageConf {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source: Some(source),
            opacity: 1.0,
        }
    }

    pub fn is_present(&self) -> bool {
        self.source.is_some()
    }
}

impl Default for ImageConf {
    fn default() -> Self {
        Self {
            source: None,
            opacity: 1.0,
        }
    }
}

impl Eq for ImageConf {}

impl Hash for ImageConf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.opacity.to_bits().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GradientConf {
    pub kind: GradientKind,
    pub colors: Vec<Rgba>,
}

impl GradientConf {
    pub fn linear(colors: Vec<Rgba>) -> Self {
        Self {
            kind: GradientKind::Linear,
            colors,
        }
    }

    pub fn is_colored(&self) -> bool {
        !self.colors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowConf {
    pub color: Option<Rgba>,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
    pub inset: bool,
}

impl ShadowConf {
    pub fn new(color: Rgba, offset_x: f32, offset_y: f32, blur: f32) -> Self {
        Self {
            color: Some(color),
            offset_x: canon_f32(offset_x),
            offset_y: canon_f32(offset_y),
            blur: canon_f32(blur).max(0.0),
            spread: 0.0,
            inset: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.color.is_some_and(|c| c.is_visible())
    }
}

impl Default for ShadowConf {
    fn default() -> Self {
        Self {
            color: None,
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            spread: 0.0,
            inset: false,
        }
    }
}

impl Eq for ShadowConf {}

impl Hash for ShadowConf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.color.hash(state);
        self.offset_x.to_bits().hash(state);
        self.offset_y.to_bits().hash(state);
        self.blur.to_bits().hash(state);
        self.spread.to_bits().hash(state);
        self.inset.hash(state);
    }
}

// Arbitrary user drawing injected into a layer. Painters are opaque to the
// engine: it cannot prove one idempotent, so their presence disables raster
// caching for the layer.
pub trait Painter: Send + Sync {
    fn paint(&self, graphics: &mut Graphics<'_>) -> Result<(), BezelError>;
}

// A user painter together with the component area its drawing is confined
// to. Defaults to the body.
#[derive(Clone)]
pub struct PainterConf {
    painter: Arc<dyn Painter>,
    clip: ComponentArea,
}

impl PainterConf {
    pub fn new(painter: impl Painter + 'static) -> Self {
        Self {
            painter: Arc::new(painter),
            clip: ComponentArea::Body,
        }
    }

    pub fn clipped_to(mut self, area: ComponentArea) -> Self {
        self.clip = area;
        self
    }

    pub fn clip_area(&self) -> ComponentArea {
        self.clip
    }

    pub fn paint(&self, graphics: &mut Graphics<'_>) -> Result<(), BezelError> {
        self.painter.paint(graphics)
    }
}

impl fmt::Debug for PainterConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PainterConf(@ {:p}, clip {:?})",
            Arc::as_ptr(&self.painter),
            self.clip
        )
    }
}

impl PartialEq for PainterConf {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.painter, &other.painter) && self.clip == other.clip
    }
}

impl Eq for PainterConf {}

impl Hash for PainterConf {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.painter) as *const () as usize).hash(state);
        self.clip.hash(state);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerStyle {
    pub images: Vec<ImageConf>,
    pub gradients: Vec<GradientConf>,
    pub shadows: Vec<ShadowConf>,
    pub painters: Vec<PainterConf>,
}

impl LayerStyle {
    pub fn has_painters(&self) -> bool {
        !self.painters.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
            && self.gradients.is_empty()
            && self.shadows.is_empty()
            && self.painters.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StyleConf {
    pub base: BaseColors,
    pub margin: Outline,
    pub padding: Outline,
    pub border: BorderConf,
    pub layers: [LayerStyle; 4],
}

impl StyleConf {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn layer(&self, layer: Layer) -> &LayerStyle {
        &self.layers[layer.index()]
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut LayerStyle {
        &mut self.layers[layer.index()]
    }
}

// Style plus pixel bounds: the per-paint-cycle snapshot every cache node
// validates against. `base_outline` is an extra inset applied by the host
// component around all styled geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ComponentConf {
    pub style: StyleConf,
    pub bounds: Bounds,
    pub base_outline: Outline,
}

impl ComponentConf {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn box_model(&self) -> BoxModelConf {
        BoxModelConf::of(self)
    }

    // Narrows this snapshot to the inputs that can influence the pixels of
    // one layer, so edits outside the layer leave its projection untouched.
    pub fn render_conf_for(&self, layer: Layer) -> LayerRenderConf {
        LayerRenderConf {
            box_model: self.box_model(),
            colors: self.base_colors_for(layer),
            decorations: self.style.layer(layer).clone(),
        }
    }

    fn base_colors_for(&self, layer: Layer) -> BaseColorConf {
        match layer {
            Layer::Background => BaseColorConf {
                foundation: self.style.base.foundation,
                background: self.style.base.background,
                border: None,
            },
            Layer::Border => BaseColorConf {
                foundation: None,
                background: None,
                border: self.style.border.color,
            },
            Layer::Content | Layer::Foreground => BaseColorConf::default(),
        }
    }
}

// Geometry inputs only: everything the area resolver reads, nothing more.
// Color or decoration edits leave the box model untouched, which is what
// lets the area graph skip recomputation for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoxModelConf {
    pub radius: CornerRadius,
    pub widths: Outline,
    pub margin: Outline,
    pub padding: Outline,
    pub base_outline: Outline,
    pub size: Size,
}

impl BoxModelConf {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(conf: &ComponentConf) -> Self {
        Self {
            radius: conf.style.border.radius,
            widths: conf.style.border.widths,
            margin: conf.style.margin,
            padding: conf.style.padding,
            base_outline: conf.base_outline,
            size: conf.bounds.size(),
        }
    }

    // True when nothing shapes the box, the base outline included; the
    // resolver then short-circuits to a plain rectangle.
    pub(crate) fn is_style_free(&self) -> bool {
        self.radius == CornerRadius::None
            && self.widths.is_unset()
            && self.margin.is_unset()
            && self.padding.is_unset()
            && self.base_outline.is_unset()
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.size.width.round() as u32,
            self.size.height.round() as u32,
        )
    }

    pub fn pixel_count(&self) -> u64 {
        let (w, h) = self.pixel_size();
        w as u64 * h as u64
    }
}

// Base colors surviving into one layer's render conf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BaseColorConf {
    pub foundation: Option<Rgba>,
    pub background: Option<Rgba>,
    pub border: Option<Rgba>,
}

// An immutable per-layer projection of a component snapshot, used as the
// raster cache key. Equality is the caching contract: two equal confs must
// render to identical pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerRenderConf {
    pub box_model: BoxModelConf,
    pub colors: BaseColorConf,
    pub decorations: LayerStyle,
}

impl LayerRenderConf {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_area(&self) -> bool {
        self.box_model.size.has_area()
    }
}
