use crate::area::Area;
use crate::style::BoxModelConf;
use crate::types::{Corner, CornerArc, CornerRadius, Outline};

pub(crate) fn body_area(conf: &BoxModelConf) -> Area {
    compute_area(conf, Outline::NONE)
}

pub(crate) fn interior_area(conf: &BoxModelConf) -> Area {
    compute_area(conf, conf.widths)
}

// Builds the box for `conf` inset by `extra`. Margins move the box edges
// but never shrink the corner arcs; arc insets do both.
pub(crate) fn compute_area(conf: &BoxModelConf, extra: Outline) -> Area {
    let width = conf.size.width;
    let height = conf.size.height;

    let ins_top = side(extra.top) + side(conf.base_outline.top);
    let ins_right = side(extra.right) + side(conf.base_outline.right);
    let ins_bottom = side(extra.bottom) + side(conf.base_outline.bottom);
    let ins_left = side(extra.left) + side(conf.base_outline.left);

    let top = side(conf.margin.top) + ins_top;
    let right = side(conf.margin.right) + ins_right;
    let bottom = side(conf.margin.bottom) + ins_bottom;
    let left = side(conf.margin.left) + ins_left;

    // Nothing styled: the plain rectangle under the combined insets.
    if conf.is_style_free() {
        return Area::rect(left, top, width - left - right, height - top - bottom);
    }

    // The single round rect shortcut needs one arc and one arc inset for
    // all corners. Margins may still differ per side.
    if let Some(arc) = conf.radius.uniform_arc() {
        if ins_top == ins_right && ins_right == ins_bottom && ins_bottom == ins_left {
            return uniform_area(width, height, top, right, bottom, left, arc, ins_top);
        }
    }

    composite_area(
        width,
        height,
        top,
        right,
        bottom,
        left,
        ins_top,
        ins_right,
        ins_bottom,
        ins_left,
        conf.radius,
    )
}

// NaN and negative inset components count as zero.
fn side(value: Option<f32>) -> f32 {
    match value {
        Some(v) if v > 0.0 => v,
        _ => 0.0,
    }
}

fn half(v: f32) -> f32 {
    (v / 2.0).floor()
}

fn shrunk(arc: CornerArc, adjustment: f32) -> CornerArc {
    CornerArc::new(arc.width - adjustment, arc.height - adjustment)
}

fn uniform_area(
    width: f32,
    height: f32,
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
    arc: CornerArc,
    arc_inset: f32,
) -> Area {
    let arc_width = (arc.width - arc_inset).max(0.0);
    let arc_height = (arc.height - arc_inset).max(0.0);
    let box_width = width - left - right;
    let box_height = height - top - bottom;
    if arc_width <= 0.0 || arc_height <= 0.0 {
        Area::rect(left, top, box_width, box_height)
    } else {
        Area::round_rect(left, top, box_width, box_height, arc_width, arc_height)
    }
}

// Per-corner construction: four quarter pies, four edge strips between
// them and a center rectangle. Strip extents use floored half arcs so they
// always reach under the pie interiors instead of leaving slivers.
#[allow(clippy::too_many_arguments)]
fn composite_area(
    width: f32,
    height: f32,
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
    ins_top: f32,
    ins_right: f32,
    ins_bottom: f32,
    ins_left: f32,
    radius: CornerRadius,
) -> Area {
    // Each corner arc shrinks by the smaller of its two adjacent insets.
    let arc_tl = shrunk(radius.arc(Corner::TopLeft), ins_left.min(ins_top));
    let arc_tr = shrunk(radius.arc(Corner::TopRight), ins_top.min(ins_right));
    let arc_br = shrunk(radius.arc(Corner::BottomRight), ins_bottom.min(ins_right));
    let arc_bl = shrunk(radius.arc(Corner::BottomLeft), ins_bottom.min(ins_left));

    let mut area = Area::corner_pie(left, top, arc_tl.width, arc_tl.height, Corner::TopLeft);
    area = area.union(Area::corner_pie(
        width - right - arc_tr.width,
        top,
        arc_tr.width,
        arc_tr.height,
        Corner::TopRight,
    ));
    area = area.union(Area::corner_pie(
        width - right - arc_br.width,
        height - bottom - arc_br.height,
        arc_br.width,
        arc_br.height,
        Corner::BottomRight,
    ));
    area = area.union(Area::corner_pie(
        left,
        height - bottom - arc_bl.height,
        arc_bl.width,
        arc_bl.height,
        Corner::BottomLeft,
    ));

    let top_distance = half(arc_tl.height).max(half(arc_tr.height));
    let right_distance = half(arc_tr.width).max(half(arc_br.width));
    let bottom_distance = half(arc_br.height).max(half(arc_bl.height));
    let left_distance = half(arc_bl.width).max(half(arc_tl.width));

    let inner_left = left + half(arc_tl.width);
    let inner_right = width - right - half(arc_tr.width);
    area = area.union(Area::rect(
        inner_left,
        top,
        inner_right - inner_left,
        top_distance,
    ));

    let inner_top = top + half(arc_tr.height);
    let inner_bottom = height - bottom - half(arc_br.height);
    area = area.union(Area::rect(
        width - right - right_distance,
        inner_top,
        right_distance,
        inner_bottom - inner_top,
    ));

    let inner_left = left + half(arc_bl.width);
    let inner_right = width - right - half(arc_br.width);
    area = area.union(Area::rect(
        inner_left,
        height - bottom - bottom_distance,
        inner_right - inner_left,
        bottom_distance,
    ));

    let inner_top = top + half(arc_tl.height);
    let inner_bottom = height - bottom - half(arc_bl.height);
    area = area.union(Area::rect(
        left,
        inner_top,
        left_distance,
        inner_bottom - inner_top,
    ));

    area.union(Area::rect(
        left + left_distance,
        top + top_distance,
        width - left - left_distance - right - right_distance,
        height - top - top_distance - bottom - bottom_distance,
    ))
}
