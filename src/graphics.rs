use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Mask, Paint, Path, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::area::Area;
use crate::types::Rgba;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeConf {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

impl Default for StrokeConf {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
        }
    }
}

#[derive(Clone)]
pub struct DrawState {
    pub fill_color: Rgba,
    pub stroke_color: Rgba,
    pub stroke: StrokeConf,
    pub blend: BlendMode,
    pub anti_alias: bool,
    clip: Option<Mask>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill_color: Rgba::BLACK,
            stroke_color: Rgba::BLACK,
            stroke: StrokeConf::default(),
            blend: BlendMode::SourceOver,
            anti_alias: true,
            clip: None,
        }
    }
}

pub struct Graphics<'a> {
    pixmap: &'a mut Pixmap,
    state: DrawState,
}

impl<'a> Graphics<'a> {
    pub fn new(pixmap: &'a mut Pixmap) -> Self {
        Self {
            pixmap,
            state: DrawState::default(),
        }
    }

    pub fn with_state(pixmap: &'a mut Pixmap, state: DrawState) -> Self {
        Self { pixmap, state }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn set_fill(&mut self, color: Rgba) {
        self.state.fill_color = color;
    }

    pub fn set_stroke_color(&mut self, color: Rgba) {
        self.state.stroke_color = color;
    }

    pub fn set_stroke(&mut self, stroke: StrokeConf) {
        self.state.stroke = stroke;
    }

    pub fn set_blend(&mut self, blend: BlendMode) {
        self.state.blend = blend;
    }

    pub fn set_anti_alias(&mut self, on: bool) {
        self.state.anti_alias = on;
    }

    // Snapshot of the drawing state without the clip. Clips are bound to
    // the pixel grid of this target and must not leak into contexts of a
    // different size.
    pub fn capture_state(&self) -> DrawState {
        DrawState {
            clip: None,
            ..self.state.clone()
        }
    }

    pub fn restore_state(&mut self, state: DrawState) {
        self.state = state;
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixmap.fill(color.to_skia());
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let Some(rect) = Rect::from_xywh(x, y, width, height) else {
            return;
        };
        let paint = fill_paint(self.state.fill_color, self.state.blend, self.state.anti_alias);
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), self.state.clip.as_ref());
    }

    pub fn fill_path(&mut self, path: &Path) {
        let paint = fill_paint(self.state.fill_color, self.state.blend, self.state.anti_alias);
        self.pixmap.fill_path(
            path,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    pub fn stroke_path(&mut self, path: &Path) {
        let paint = fill_paint(
            self.state.stroke_color,
            self.state.blend,
            self.state.anti_alias,
        );
        let stroke = build_stroke(self.state.stroke);
        self.pixmap.stroke_path(
            path,
            &paint,
            &stroke,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }

    pub fn fill_area(&mut self, area: &Area) {
        let width = self.pixmap.width();
        let height = self.pixmap.height();
        let Some(mut mask) = area.coverage(width, height, self.state.anti_alias) else {
            return;
        };
        if let Some(clip) = self.state.clip.as_ref() {
            combine_masks(&mut mask, clip);
        }
        let Some(rect) = Rect::from_xywh(0.0, 0.0, width as f32, height as f32) else {
            return;
        };
        let paint = fill_paint(self.state.fill_color, self.state.blend, self.state.anti_alias);
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), Some(&mask));
    }

    // Intersects the clip with `area` rather than replacing it.
    pub fn set_clip_area(&mut self, area: &Area) {
        let Some(mask) = area.coverage(self.pixmap.width(), self.pixmap.height(), true) else {
            return;
        };
        match self.state.clip.as_mut() {
            Some(clip) => combine_masks(clip, &mask),
            None => self.state.clip = Some(mask),
        }
    }

    pub fn clear_clip(&mut self) {
        self.state.clip = None;
    }

    // Blits `source` under the current clip. The copy is unfiltered, so a
    // full-size blit at the origin reproduces the source exactly.
    pub fn draw_pixmap(&mut self, x: i32, y: i32, source: &Pixmap, opacity: f32) {
        let mut paint = PixmapPaint::default();
        paint.opacity = opacity.clamp(0.0, 1.0);
        paint.quality = tiny_skia::FilterQuality::Nearest;
        paint.blend_mode = self.state.blend;
        self.pixmap.draw_pixmap(
            x,
            y,
            source.as_ref(),
            &paint,
            Transform::identity(),
            self.state.clip.as_ref(),
        );
    }
}

// Coverage intersection: byte product with rounding, so full coverage is
// the identity and zero annihilates.
fn combine_masks(dst: &mut Mask, src: &Mask) {
    for (d, s) in dst.data_mut().iter_mut().zip(src.data()) {
        *d = ((*d as u16 * *s as u16 + 127) / 255) as u8;
    }
}

fn fill_paint(color: Rgba, blend: BlendMode, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.blend_mode = blend;
    paint.anti_alias = anti_alias;
    paint
}

fn build_stroke(conf: StrokeConf) -> Stroke {
    let mut stroke = Stroke::default();
    stroke.width = conf.width.max(0.0);
    stroke.miter_limit = conf.miter_limit.max(0.0);
    stroke.line_cap = conf.cap;
    stroke.line_join = conf.join;
    stroke
}
