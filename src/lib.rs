mod area;
mod cache;
mod engine;
mod error;
mod geometry;
mod graphics;
mod layer_cache;
mod render;
mod style;
mod types;

pub use area::Area;
pub use cache::ComponentAreas;
pub use engine::StyleEngine;
pub use error::BezelError;
pub use graphics::{DrawState, Graphics, StrokeConf};
pub use layer_cache::{CacheTuning, LayerCache, RasterCache, StoreStats};
pub use style::{
    BaseColorConf, BaseColors, BorderConf, BoxModelConf, ComponentConf, GradientConf, GradientKind,
    ImageConf, ImageSource, LayerRenderConf, LayerStyle, Painter, PainterConf, ShadowConf,
    StyleConf,
};
pub use types::{
    Bounds, ComponentArea, Corner, CornerArc, CornerRadius, Layer, Outline, Rgba, Size,
};
