use tracing::warn;

use crate::cache::ComponentAreas;
use crate::error::BezelError;
use crate::graphics::Graphics;
use crate::style::LayerRenderConf;

// Flat base of one layer: the foundation and background fills, the ring
// fill, then any user painters. Which fills apply is already decided by the
// conf's filtered colors, so no layer tag is needed here. `areas` must
// describe the same geometry as `conf.box_model`.
pub(crate) fn render_base_layer(
    conf: &LayerRenderConf,
    areas: &ComponentAreas,
    graphics: &mut Graphics<'_>,
) -> Result<(), BezelError> {
    if let Some(color) = conf.colors.foundation.filter(|c| c.is_visible()) {
        graphics.set_fill(color);
        graphics.fill_area(&areas.exterior());
    }
    if let Some(color) = conf.colors.background.filter(|c| c.is_visible()) {
        graphics.set_fill(color);
        graphics.fill_area(&areas.body());
    }
    if let Some(color) = conf.colors.border.filter(|c| c.is_visible()) {
        if conf.box_model.widths.has_positive() {
            graphics.set_fill(color);
            graphics.fill_area(&areas.border());
        }
    }
    // A painter may leave any state behind, so each one starts from the
    // caller's state clipped to its own component area.
    for (index, painter) in conf.decorations.painters.iter().enumerate() {
        let saved = graphics.state().clone();
        graphics.set_clip_area(&areas.area_for(painter.clip_area()));
        if let Err(error) = painter.paint(graphics) {
            warn!(painter = index, %error, "user painter failed");
        }
        graphics.restore_state(saved);
    }
    Ok(())
}
