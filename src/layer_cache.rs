use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use tiny_skia::Pixmap;
use tracing::warn;

use crate::error::BezelError;
use crate::graphics::{DrawState, Graphics};
use crate::style::LayerRenderConf;
use crate::types::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTuning {
    // Upper bound on live cached buffers across the store.
    pub max_entries: usize,
    // Pixel allowance per heavy decoration when judging whether a layer is
    // worth buffering.
    pub pixels_per_heavy: u64,
    // Heavy decorations beyond this count stop raising the allowance.
    pub max_counted_heavies: u32,
}

impl Default for CacheTuning {
    fn default() -> Self {
        Self {
            max_entries: 128,
            pixels_per_heavy: 65536,
            max_counted_heavies: 5,
        }
    }
}

// A write-once raster buffer shared by every cache node with an equal
// render conf.
pub struct CachedImage {
    pixels: Mutex<Pixmap>,
    rendered: AtomicBool,
}

impl CachedImage {
    fn new(width: u32, height: u32) -> Result<Self, BezelError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            BezelError::InvalidConfiguration(format!(
                "invalid layer buffer size {width}x{height}"
            ))
        })?;
        Ok(Self {
            pixels: Mutex::new(pixmap),
            rendered: AtomicBool::new(false),
        })
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.load(Ordering::Acquire)
    }

    // The claim happens before any pixel is drawn: a failed render leaves
    // the buffer blank but claimed, which costs one blank frame instead of
    // retry loops on a poisoned conf.
    fn claim(&self) -> bool {
        !self.rendered.swap(true, Ordering::AcqRel)
    }

    fn render_into(
        &self,
        state: DrawState,
        render: impl FnOnce(&mut Graphics<'_>) -> Result<(), BezelError>,
    ) -> Result<(), BezelError> {
        let Ok(mut pixels) = self.pixels.lock() else {
            return Ok(());
        };
        let mut graphics = Graphics::with_state(&mut pixels, state);
        render(&mut graphics)
    }

    // Each buffer is filled exactly once in its lifetime; a second call is
    // a contract violation.
    pub(crate) fn render_once(
        &self,
        state: DrawState,
        render: impl FnOnce(&mut Graphics<'_>) -> Result<(), BezelError>,
    ) -> Result<(), BezelError> {
        if !self.claim() {
            panic!("cached layer buffer rendered twice");
        }
        self.render_into(state, render)
    }

    fn blit(&self, graphics: &mut Graphics<'_>) {
        if let Ok(pixels) = self.pixels.lock() {
            graphics.draw_pixmap(0, 0, &pixels, 1.0);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub live_entries: usize,
    pub rendered_entries: usize,
}

// Process-wide store of layer buffers. It holds weak references only: a
// buffer lives exactly as long as some cache node keeps it, and dropping
// the last node releases the pixels.
pub struct RasterCache {
    entries: Mutex<HashMap<Arc<LayerRenderConf>, Weak<CachedImage>>>,
    tuning: CacheTuning,
}

impl RasterCache {
    pub fn new(tuning: CacheTuning) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            tuning,
        }
    }

    // The store shared by every engine that does not bring its own.
    pub fn shared() -> Arc<RasterCache> {
        static SHARED: OnceLock<Arc<RasterCache>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(RasterCache::new(CacheTuning::default()))))
    }

    pub fn tuning(&self) -> CacheTuning {
        self.tuning
    }

    pub fn stats(&self) -> StoreStats {
        let Ok(entries) = self.entries.lock() else {
            return StoreStats::default();
        };
        let mut stats = StoreStats::default();
        for weak in entries.values() {
            if let Some(image) = weak.upgrade() {
                stats.live_entries += 1;
                if image.is_rendered() {
                    stats.rendered_entries += 1;
                }
            }
        }
        stats
    }

    // Looks up or allocates the buffer for `conf`. Returns the canonical
    // key held by the store together with the buffer, or `None` when the
    // store is at capacity after sweeping dead entries.
    fn acquire(
        &self,
        conf: &LayerRenderConf,
    ) -> Result<Option<(Arc<LayerRenderConf>, Arc<CachedImage>)>, BezelError> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(None);
        };
        entries.retain(|_, image| image.strong_count() > 0);

        if let Some((key, weak)) = entries.get_key_value(conf) {
            if let Some(image) = weak.upgrade() {
                return Ok(Some((Arc::clone(key), image)));
            }
        }

        if entries.len() >= self.tuning.max_entries {
            return Ok(None);
        }

        let (width, height) = conf.box_model.pixel_size();
        let image = Arc::new(CachedImage::new(width, height)?);
        let key = Arc::new(conf.clone());
        entries.insert(Arc::clone(&key), Arc::downgrade(&image));
        Ok(Some((key, image)))
    }
}

// A layer is worth buffering only when something expensive draws into it
// and the buffer is not disproportionally large for what it saves. Painters
// are opaque and may not be idempotent, so they veto caching outright.
fn caching_makes_sense(layer: Layer, conf: &LayerRenderConf, tuning: &CacheTuning) -> bool {
    if conf.decorations.has_painters() {
        return false;
    }

    let mut heavy = 0u32;
    for image in &conf.decorations.images {
        if image.is_present() {
            heavy += 1;
        }
    }
    for gradient in &conf.decorations.gradients {
        if gradient.is_colored() {
            heavy += 1;
        }
    }
    for shadow in &conf.decorations.shadows {
        if shadow.is_visible() {
            heavy += 1;
        }
    }
    match layer {
        Layer::Border => {
            if conf.colors.border.is_some_and(|c| c.is_visible())
                && conf.box_model.widths.has_positive()
            {
                heavy += 1;
            }
        }
        Layer::Background => {
            // A plain rectangular fill is cheap; only rounded or margined
            // fills count, and background and foundation count separately.
            if conf.box_model.radius.is_rounded() || !conf.box_model.margin.is_unset() {
                if conf.colors.background.is_some_and(|c| c.is_visible()) {
                    heavy += 1;
                }
                if conf.colors.foundation.is_some_and(|c| c.is_visible()) {
                    heavy += 1;
                }
            }
        }
        Layer::Content | Layer::Foreground => {}
    }
    if heavy == 0 {
        return false;
    }

    let allowance = tuning.pixels_per_heavy * u64::from(heavy.min(tuning.max_counted_heavies));
    conf.box_model.pixel_count() <= allowance
}

// Cache node for one layer of one component. `validate` moves the node to
// a new render conf and decides whether the layer goes through the store;
// `paint` then either blits the shared buffer or hands the target straight
// to the renderer.
pub struct LayerCache {
    layer: Layer,
    conf: Arc<LayerRenderConf>,
    image: Option<Arc<CachedImage>>,
    cachable: bool,
}

impl LayerCache {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            conf: Arc::new(LayerRenderConf::none()),
            image: None,
            cachable: false,
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    // While the layer is cached this is the canonical key allocation shared
    // with the store and every other node on the same buffer.
    pub fn current_conf(&self) -> Arc<LayerRenderConf> {
        Arc::clone(&self.conf)
    }

    pub fn is_cached(&self) -> bool {
        self.image.is_some()
    }

    pub fn validate(&mut self, store: &RasterCache, conf: &LayerRenderConf) {
        if !conf.has_area() {
            self.conf = Arc::new(LayerRenderConf::none());
            self.image = None;
            self.cachable = false;
            return;
        }

        let changed = *self.conf != *conf;
        if changed {
            self.image = None;
            self.cachable = caching_makes_sense(self.layer, conf, &store.tuning);
        }
        if !self.cachable {
            if changed {
                self.conf = Arc::new(conf.clone());
            }
            return;
        }
        if self.image.is_some() {
            return;
        }

        // Reached with an unchanged conf too: a node that came away empty
        // while the store was full retries until a slot frees up.
        match store.acquire(conf) {
            Ok(Some((key, image))) => {
                self.conf = key;
                self.image = Some(image);
            }
            Ok(None) => {
                if changed {
                    self.conf = Arc::new(conf.clone());
                }
            }
            Err(error) => {
                // The conf cannot be buffered; render it directly until it
                // changes.
                warn!(layer = ?self.layer, %error, "layer buffer unavailable");
                self.cachable = false;
                if changed {
                    self.conf = Arc::new(conf.clone());
                }
            }
        }
    }

    // Layers not worth buffering render directly; cached layers render into
    // their buffer on first use and blit it afterwards. A layer worth
    // buffering that holds no buffer (the store was full at validation)
    // stays blank for the frame. The renderer must derive its output from
    // the conf alone: equal confs share one buffer, across components and
    // across layers.
    pub fn paint(
        &mut self,
        graphics: &mut Graphics<'_>,
        mut renderer: impl FnMut(&LayerRenderConf, &mut Graphics<'_>) -> Result<(), BezelError>,
    ) -> Result<(), BezelError> {
        if !self.conf.has_area() {
            return Ok(());
        }
        if !self.cachable {
            return renderer(&self.conf, graphics);
        }
        let Some(image) = self.image.clone() else {
            return Ok(());
        };
        if image.claim() {
            let state = graphics.capture_state();
            let conf = Arc::clone(&self.conf);
            image.render_into(state, |g| renderer(&conf, g))?;
        }
        image.blit(graphics);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ComponentConf, GradientConf, Painter, PainterConf, StyleConf};
    use crate::types::{Bounds, Outline, Rgba, Size};
    use std::cell::Cell;

    fn store() -> RasterCache {
        RasterCache::new(CacheTuning::default())
    }

    fn gradient_background(width: u32, height: u32) -> LayerRenderConf {
        let mut style = StyleConf::none();
        style
            .layer_mut(Layer::Background)
            .gradients
            .push(GradientConf::linear(vec![Rgba::BLACK, Rgba::WHITE]));
        ComponentConf {
            style,
            bounds: Bounds::new(width, height),
            base_outline: Outline::NONE,
        }
        .render_conf_for(Layer::Background)
    }

    fn fill_red(conf: &LayerRenderConf, g: &mut Graphics<'_>) -> Result<(), BezelError> {
        let (w, h) = conf.box_model.pixel_size();
        g.set_fill(Rgba::rgb(255, 0, 0));
        g.fill_rect(0.0, 0.0, w as f32, h as f32);
        Ok(())
    }

    #[test]
    fn worthwhile_layers_render_once_and_blit_after() {
        let store = store();
        let conf = gradient_background(32, 32);
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &conf);
        assert!(node.is_cached());

        let renders = Cell::new(0u32);
        let mut target = Pixmap::new(32, 32).unwrap();
        for _ in 0..3 {
            let mut g = Graphics::new(&mut target);
            node.paint(&mut g, |conf, g| {
                renders.set(renders.get() + 1);
                fill_red(conf, g)
            })
            .unwrap();
        }
        assert_eq!(renders.get(), 1);
        assert_eq!(target.pixel(16, 16).unwrap().red(), 255);
    }

    #[test]
    fn equal_confs_share_one_buffer_and_canonical_key() {
        let store = store();
        let conf = gradient_background(24, 24);
        let mut a = LayerCache::new(Layer::Background);
        let mut b = LayerCache::new(Layer::Background);
        let conf_twin = conf.clone();
        a.validate(&store, &conf);
        b.validate(&store, &conf_twin);

        assert!(Arc::ptr_eq(&a.current_conf(), &b.current_conf()));
        assert_eq!(store.stats().live_entries, 1);

        let renders = Cell::new(0u32);
        let mut count_and_fill = |conf: &LayerRenderConf, g: &mut Graphics<'_>| {
            renders.set(renders.get() + 1);
            fill_red(conf, g)
        };
        let mut target = Pixmap::new(24, 24).unwrap();
        let mut g = Graphics::new(&mut target);
        a.paint(&mut g, &mut count_and_fill).unwrap();
        b.paint(&mut g, &mut count_and_fill).unwrap();
        assert_eq!(renders.get(), 1);
        assert_eq!(store.stats().rendered_entries, 1);
    }

    #[test]
    fn painters_veto_caching() {
        struct Nop;
        impl Painter for Nop {
            fn paint(&self, _graphics: &mut Graphics<'_>) -> Result<(), BezelError> {
                Ok(())
            }
        }
        let mut conf = gradient_background(24, 24);
        conf.decorations.painters.push(PainterConf::new(Nop));

        let store = store();
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &conf);
        assert!(!node.is_cached());
        assert_eq!(store.stats().live_entries, 0);

        let renders = Cell::new(0u32);
        let mut target = Pixmap::new(24, 24).unwrap();
        for _ in 0..2 {
            let mut g = Graphics::new(&mut target);
            node.paint(&mut g, |conf, g| {
                renders.set(renders.get() + 1);
                fill_red(conf, g)
            })
            .unwrap();
        }
        assert_eq!(renders.get(), 2);
    }

    #[test]
    fn light_layers_are_not_worth_buffering() {
        let conf = ComponentConf {
            bounds: Bounds::new(24, 24),
            ..ComponentConf::none()
        }
        .render_conf_for(Layer::Background);
        let store = store();
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &conf);
        assert!(!node.is_cached());
    }

    #[test]
    fn oversized_layers_are_not_worth_buffering() {
        let conf = gradient_background(1000, 1000);
        let store = store();
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &conf);
        assert!(!node.is_cached());
    }

    #[test]
    fn a_margined_foundation_fill_is_heavy_enough_to_buffer() {
        let mut style = StyleConf::none();
        style.base.foundation = Some(Rgba::rgb(30, 30, 30));
        style.margin = Outline::uniform(4.0);
        let conf = ComponentConf {
            style,
            bounds: Bounds::new(32, 32),
            base_outline: Outline::NONE,
        }
        .render_conf_for(Layer::Background);

        let store = store();
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &conf);
        assert!(node.is_cached());
    }

    #[test]
    fn zero_area_resets_the_node_and_paint_is_a_no_op() {
        let store = store();
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &gradient_background(24, 24));
        assert!(node.is_cached());

        node.validate(&store, &gradient_background(0, 24));
        assert!(!node.is_cached());
        assert_eq!(*node.current_conf(), LayerRenderConf::none());

        let renders = Cell::new(0u32);
        let mut target = Pixmap::new(8, 8).unwrap();
        let mut g = Graphics::new(&mut target);
        node.paint(&mut g, |_, _| {
            renders.set(renders.get() + 1);
            Ok(())
        })
        .unwrap();
        assert_eq!(renders.get(), 0);
    }

    #[test]
    fn store_capacity_bounds_live_buffers() {
        let store = RasterCache::new(CacheTuning {
            max_entries: 2,
            ..CacheTuning::default()
        });
        let mut nodes: Vec<LayerCache> = Vec::new();
        for size in [20, 21, 22] {
            let mut node = LayerCache::new(Layer::Background);
            node.validate(&store, &gradient_background(size, size));
            nodes.push(node);
        }
        assert!(nodes[0].is_cached());
        assert!(nodes[1].is_cached());
        assert!(!nodes[2].is_cached());
        assert_eq!(store.stats().live_entries, 2);

        // Dropping a holder frees its slot for the next validation.
        nodes.remove(0);
        let mut late = LayerCache::new(Layer::Background);
        late.validate(&store, &gradient_background(22, 22));
        assert!(late.is_cached());
        assert_eq!(store.stats().live_entries, 2);

        // The node that came away empty retries with its unchanged conf and
        // joins the buffer the late node allocated.
        nodes[1].validate(&store, &gradient_background(22, 22));
        assert!(nodes[1].is_cached());
        assert!(Arc::ptr_eq(&nodes[1].current_conf(), &late.current_conf()));
        assert_eq!(store.stats().live_entries, 2);
    }

    #[test]
    fn capacity_skipped_layers_paint_nothing_until_a_buffer_frees() {
        let store = RasterCache::new(CacheTuning {
            max_entries: 1,
            ..CacheTuning::default()
        });
        let mut first = LayerCache::new(Layer::Background);
        first.validate(&store, &gradient_background(20, 20));
        assert!(first.is_cached());

        let conf = gradient_background(24, 24);
        let mut skipped = LayerCache::new(Layer::Background);
        skipped.validate(&store, &conf);
        assert!(!skipped.is_cached());

        let renders = Cell::new(0u32);
        let mut target = Pixmap::new(24, 24).unwrap();
        let mut g = Graphics::new(&mut target);
        skipped
            .paint(&mut g, |conf, g| {
                renders.set(renders.get() + 1);
                fill_red(conf, g)
            })
            .unwrap();
        assert_eq!(renders.get(), 0);
        assert_eq!(target.pixel(12, 12).unwrap().alpha(), 0);

        drop(first);
        skipped.validate(&store, &conf);
        assert!(skipped.is_cached());
        let mut g = Graphics::new(&mut target);
        skipped
            .paint(&mut g, |conf, g| {
                renders.set(renders.get() + 1);
                fill_red(conf, g)
            })
            .unwrap();
        assert_eq!(renders.get(), 1);
        assert_eq!(target.pixel(12, 12).unwrap().red(), 255);
    }

    #[test]
    fn buffer_allocation_failure_degrades_to_direct_rendering() {
        let store = store();
        // Has area but rounds to a zero-width buffer, which the store
        // cannot allocate.
        let mut conf = gradient_background(24, 24);
        conf.box_model.size = Size::new(0.4, 24.0);

        let mut node = LayerCache::new(Layer::Background);
        let renders = Cell::new(0u32);
        let mut target = Pixmap::new(24, 24).unwrap();
        for _ in 0..2 {
            node.validate(&store, &conf);
            assert!(!node.is_cached());
            let mut g = Graphics::new(&mut target);
            node.paint(&mut g, |_, _| {
                renders.set(renders.get() + 1);
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(renders.get(), 2);
        assert_eq!(store.stats().live_entries, 0);
    }

    #[test]
    fn dropping_every_holder_releases_the_buffer() {
        let store = store();
        let conf = gradient_background(24, 24);
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &conf);
        assert_eq!(store.stats().live_entries, 1);
        drop(node);
        assert_eq!(store.stats().live_entries, 0);
    }

    #[test]
    fn failed_renders_cost_one_blank_frame_without_retry() {
        let store = store();
        let mut node = LayerCache::new(Layer::Background);
        node.validate(&store, &gradient_background(16, 16));

        let renders = Cell::new(0u32);
        let mut target = Pixmap::new(16, 16).unwrap();

        let mut g = Graphics::new(&mut target);
        let result = node.paint(&mut g, |_, _| {
            renders.set(renders.get() + 1);
            Err(BezelError::RenderFailed("boom".into()))
        });
        assert!(result.is_err());

        let mut g = Graphics::new(&mut target);
        node.paint(&mut g, |_, _| {
            renders.set(renders.get() + 1);
            Ok(())
        })
        .unwrap();
        assert_eq!(renders.get(), 1);
        assert_eq!(target.pixel(8, 8).unwrap().alpha(), 0);
    }

    #[test]
    #[should_panic(expected = "rendered twice")]
    fn double_render_is_a_contract_violation() {
        let image = CachedImage::new(4, 4).unwrap();
        let state = DrawState::default();
        image.render_once(state.clone(), |_| Ok(())).unwrap();
        image.render_once(state, |_| Ok(())).unwrap();
    }
}
