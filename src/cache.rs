use std::sync::{Arc, OnceLock};

use crate::area::Area;
use crate::geometry;
use crate::style::BoxModelConf;
use crate::types::ComponentArea;

// A lazily computed value bound to the state it was computed from. An
// unchanged state keeps the cell as is, a state the predicate accepts
// carries the memoized value into a fresh cell, anything else resets to
// lazy. Acceptance may only err toward recomputing.
pub(crate) struct Cached<S, V> {
    state: S,
    value: OnceLock<V>,
}

impl<S: Clone + PartialEq, V: Clone> Cached<S, V> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            value: OnceLock::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn validate(
        self: &Arc<Self>,
        state: &S,
        still_valid: impl FnOnce(&S, &S) -> bool,
    ) -> Arc<Self> {
        if self.state == *state {
            return Arc::clone(self);
        }
        let cell = Cached::new(state.clone());
        if still_valid(&self.state, state) {
            if let Some(value) = self.value.get() {
                let _ = cell.value.set(value.clone());
            }
        }
        Arc::new(cell)
    }

    pub fn get_with(&self, produce: impl FnOnce(&S) -> V) -> &V {
        self.value.get_or_init(|| produce(&self.state))
    }
}

// Padding shapes no area, so any two box models agreeing on everything
// else resolve to identical geometry.
fn yields_same_areas(a: &BoxModelConf, b: &BoxModelConf) -> bool {
    a.radius == b.radius
        && a.widths == b.widths
        && a.margin == b.margin
        && a.base_outline == b.base_outline
        && a.size == b.size
}

// The four component areas of one component, each independently memoized.
// Cells are shared through `Arc`, so keeping an old generation alive never
// duplicates geometry work.
#[derive(Clone)]
pub struct ComponentAreas {
    body: Arc<Cached<BoxModelConf, Area>>,
    interior: Arc<Cached<BoxModelConf, Area>>,
    exterior: Arc<Cached<BoxModelConf, Area>>,
    border: Arc<Cached<BoxModelConf, Area>>,
}

impl ComponentAreas {
    pub fn new() -> Self {
        Self::for_conf(BoxModelConf::none())
    }

    fn for_conf(conf: BoxModelConf) -> Self {
        Self {
            body: Arc::new(Cached::new(conf)),
            interior: Arc::new(Cached::new(conf)),
            exterior: Arc::new(Cached::new(conf)),
            border: Arc::new(Cached::new(conf)),
        }
    }

    // Unchanged cells are shared, equivalent cells keep their areas, the
    // rest recompute on first use.
    pub fn validate(&self, conf: &BoxModelConf) -> ComponentAreas {
        ComponentAreas {
            body: self.body.validate(conf, yields_same_areas),
            interior: self.interior.validate(conf, yields_same_areas),
            exterior: self.exterior.validate(conf, yields_same_areas),
            border: self.border.validate(conf, yields_same_areas),
        }
    }

    pub(crate) fn conf(&self) -> &BoxModelConf {
        self.body.state()
    }

    pub fn body(&self) -> Area {
        self.body.get_with(geometry::body_area).clone()
    }

    pub fn interior(&self) -> Area {
        self.interior.get_with(geometry::interior_area).clone()
    }

    pub fn exterior(&self) -> Area {
        self.exterior
            .get_with(|conf| {
                Area::rect(0.0, 0.0, conf.size.width, conf.size.height).subtract(self.body())
            })
            .clone()
    }

    // The ring between body and interior.
    pub fn border(&self) -> Area {
        self.border
            .get_with(|_conf| self.body().subtract(self.interior()))
            .clone()
    }

    pub fn area_for(&self, which: ComponentArea) -> Area {
        match which {
            ComponentArea::Body => self.body(),
            ComponentArea::Interior => self.interior(),
            ComponentArea::Exterior => self.exterior(),
            ComponentArea::Border => self.border(),
        }
    }
}

impl Default for ComponentAreas {
    fn default() -> Self {
        Self::new()
    }
}
