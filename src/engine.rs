use std::sync::Arc;

use tracing::error;

use crate::area::Area;
use crate::cache::ComponentAreas;
use crate::error::BezelError;
use crate::graphics::Graphics;
use crate::layer_cache::{LayerCache, RasterCache, StoreStats};
use crate::render;
use crate::style::{ComponentConf, LayerRenderConf};
use crate::types::{ComponentArea, Layer};

// Drives styling for one component: the memoized area graph plus one cache
// node per layer. Validate the current conf once per paint cycle, then
// paint layers in order; anything unchanged since the last cycle is reused.
pub struct StyleEngine {
    conf: ComponentConf,
    areas: ComponentAreas,
    caches: [LayerCache; 4],
    store: Arc<RasterCache>,
}

impl StyleEngine {
    pub fn new() -> Self {
        Self::with_store(RasterCache::shared())
    }

    // For embedders that want their own capacity limit or an isolated cache.
    pub fn with_store(store: Arc<RasterCache>) -> Self {
        Self {
            conf: ComponentConf::none(),
            areas: ComponentAreas::new(),
            caches: Layer::ALL.map(LayerCache::new),
            store,
        }
    }

    pub fn conf(&self) -> &ComponentConf {
        &self.conf
    }

    // A snapshot equal to the current one is a no-op; otherwise the area
    // graph and every layer cache revalidate against their narrowed
    // projections of it.
    pub fn validate(&mut self, conf: &ComponentConf) {
        if self.conf == *conf {
            return;
        }
        let box_model = conf.box_model();
        self.areas = self.areas.validate(&box_model);
        for cache in &mut self.caches {
            let layer = cache.layer();
            cache.validate(&self.store, &conf.render_conf_for(layer));
        }
        self.conf = conf.clone();
    }

    pub fn paint(&mut self, layer: Layer, graphics: &mut Graphics<'_>) -> Result<(), BezelError> {
        let Self { areas, caches, .. } = self;
        caches[layer.index()].paint(graphics, |conf, g| {
            render::render_base_layer(conf, areas, g)
        })
    }

    // The renderer runs under the layer cache and must derive its output
    // from the conf it is given.
    pub fn paint_with(
        &mut self,
        layer: Layer,
        graphics: &mut Graphics<'_>,
        renderer: impl FnMut(&LayerRenderConf, &mut Graphics<'_>) -> Result<(), BezelError>,
    ) -> Result<(), BezelError> {
        self.caches[layer.index()].paint(graphics, renderer)
    }

    // A failing layer is logged and skipped so the layers above it still
    // render.
    pub fn paint_all(&mut self, graphics: &mut Graphics<'_>) {
        for layer in Layer::ALL {
            if let Err(error) = self.paint(layer, graphics) {
                error!(?layer, %error, "layer failed to render");
            }
        }
    }

    pub fn body_area(&self) -> Area {
        self.areas.body()
    }

    pub fn interior_area(&self) -> Area {
        self.areas.interior()
    }

    pub fn exterior_area(&self) -> Area {
        self.areas.exterior()
    }

    pub fn border_area(&self) -> Area {
        self.areas.border()
    }

    pub fn area(&self, which: ComponentArea) -> Area {
        self.areas.area_for(which)
    }

    // While the layer is cached this is the canonical store key.
    pub fn layer_key(&self, layer: Layer) -> Arc<LayerRenderConf> {
        self.caches[layer.index()].current_conf()
    }

    pub fn store_stats(&self) -> StoreStats {
        self.store.stats()
    }
}

impl Default for StyleEngine {
    fn default() -> Self {
        Self::new()
    }
}
