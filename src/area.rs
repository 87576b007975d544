use std::sync::Arc;

use tiny_skia::{FillRule, Mask, Path, PathBuilder, Transform};

use crate::types::Corner;

// Cubic Bezier circle approximation, one quarter turn.
const KAPPA: f32 = 0.552_284_8;

// A 2D region built from axis-aligned primitives combined with union and
// subtraction. Subtrees are shared, so cloning is cheap and derived areas
// reference their inputs instead of copying them.
#[derive(Debug, Clone, PartialEq)]
pub enum Area {
    Empty,
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    RoundRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        arc_width: f32,
        arc_height: f32,
    },
    // Quarter-ellipse sector of the given bounding box, filled out to the
    // box corner named by `corner` (wedge includes the two center lines).
    Pie {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        corner: Corner,
    },
    Union(Arc<Area>, Arc<Area>),
    Diff(Arc<Area>, Arc<Area>),
}

impl Area {
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Area {
        if width <= 0.0 || height <= 0.0 {
            return Area::Empty;
        }
        Area::Rect {
            x,
            y,
            width,
            height,
        }
    }

    // `arc_width`/`arc_height` are full arc extents, not radii.
    pub fn round_rect(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        arc_width: f32,
        arc_height: f32,
    ) -> Area {
        if width <= 0.0 || height <= 0.0 {
            return Area::Empty;
        }
        if arc_width <= 0.0 || arc_height <= 0.0 {
            return Area::rect(x, y, width, height);
        }
        Area::RoundRect {
            x,
            y,
            width,
            height,
            arc_width,
            arc_height,
        }
    }

    pub fn corner_pie(x: f32, y: f32, width: f32, height: f32, corner: Corner) -> Area {
        if width <= 0.0 || height <= 0.0 {
            return Area::Empty;
        }
        Area::Pie {
            x,
            y,
            width,
            height,
            corner,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Area::Empty)
    }

    pub fn union(self, other: Area) -> Area {
        match (self, other) {
            (Area::Empty, b) => b,
            (a, Area::Empty) => a,
            (a, b) => Area::Union(Arc::new(a), Arc::new(b)),
        }
    }

    pub fn subtract(self, other: Area) -> Area {
        match (self, other) {
            (Area::Empty, _) => Area::Empty,
            (a, Area::Empty) => a,
            (a, b) => Area::Diff(Arc::new(a), Arc::new(b)),
        }
    }

    // Pixel coverage within a `width` x `height` box anchored at the
    // origin. With `anti_alias` off the mask is exact set membership, 0 or
    // 255 per pixel.
    pub fn coverage(&self, width: u32, height: u32, anti_alias: bool) -> Option<Mask> {
        if width == 0 || height == 0 {
            return None;
        }
        self.eval(width, height, anti_alias)
    }

    fn eval(&self, width: u32, height: u32, anti_alias: bool) -> Option<Mask> {
        match self {
            Area::Empty => Mask::new(width, height),
            Area::Rect { .. } | Area::RoundRect { .. } | Area::Pie { .. } => {
                let mut mask = Mask::new(width, height)?;
                if let Some(path) = self.primitive_path() {
                    mask.fill_path(&path, FillRule::Winding, anti_alias, Transform::identity());
                }
                Some(mask)
            }
            Area::Union(a, b) => {
                let mut left = a.eval(width, height, anti_alias)?;
                let right = b.eval(width, height, anti_alias)?;
                for (dst, src) in left.data_mut().iter_mut().zip(right.data()) {
                    *dst = (*dst).max(*src);
                }
                Some(left)
            }
            Area::Diff(a, b) => {
                let mut left = a.eval(width, height, anti_alias)?;
                let right = b.eval(width, height, anti_alias)?;
                for (dst, src) in left.data_mut().iter_mut().zip(right.data()) {
                    *dst = ((*dst as u16 * (255 - *src as u16) + 127) / 255) as u8;
                }
                Some(left)
            }
        }
    }

    fn primitive_path(&self) -> Option<Path> {
        match *self {
            Area::Rect {
                x,
                y,
                width,
                height,
            } => {
                let rect = tiny_skia::Rect::from_xywh(x, y, width, height)?;
                Some(PathBuilder::from_rect(rect))
            }
            Area::RoundRect {
                x,
                y,
                width,
                height,
                arc_width,
                arc_height,
            } => round_rect_path(x, y, width, height, arc_width, arc_height),
            Area::Pie {
                x,
                y,
                width,
                height,
                corner,
            } => corner_pie_path(x, y, width, height, corner),
            // Composites and Empty have no single path; eval combines masks.
            _ => None,
        }
    }
}

fn round_rect_path(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    arc_width: f32,
    arc_height: f32,
) -> Option<Path> {
    // Arc extents clamp to the box, mirroring the classic round-rect
    // path iterator.
    let rx = arc_width.min(width) / 2.0;
    let ry = arc_height.min(height) / 2.0;
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    let right = x + width;
    let bottom = y + height;

    let mut pb = PathBuilder::new();
    pb.move_to(x + rx, y);
    pb.line_to(right - rx, y);
    pb.cubic_to(right - rx + kx, y, right, y + ry - ky, right, y + ry);
    pb.line_to(right, bottom - ry);
    pb.cubic_to(
        right,
        bottom - ry + ky,
        right - rx + kx,
        bottom,
        right - rx,
        bottom,
    );
    pb.line_to(x + rx, bottom);
    pb.cubic_to(x + rx - kx, bottom, x, bottom - ry + ky, x, bottom - ry);
    pb.line_to(x, y + ry);
    pb.cubic_to(x, y + ry - ky, x + rx - kx, y, x + rx, y);
    pb.close();
    pb.finish()
}

fn corner_pie_path(x: f32, y: f32, width: f32, height: f32, corner: Corner) -> Option<Path> {
    let rx = width / 2.0;
    let ry = height / 2.0;
    let cx = x + rx;
    let cy = y + ry;
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy);
    match corner {
        Corner::TopLeft => {
            pb.line_to(cx, cy - ry);
            pb.cubic_to(cx - kx, cy - ry, cx - rx, cy - ky, cx - rx, cy);
        }
        Corner::TopRight => {
            pb.line_to(cx + rx, cy);
            pb.cubic_to(cx + rx, cy - ky, cx + kx, cy - ry, cx, cy - ry);
        }
        Corner::BottomRight => {
            pb.line_to(cx, cy + ry);
            pb.cubic_to(cx + kx, cy + ry, cx + rx, cy + ky, cx + rx, cy);
        }
        Corner::BottomLeft => {
            pb.line_to(cx - rx, cy);
            pb.cubic_to(cx - rx, cy + ky, cx - kx, cy + ry, cx, cy + ry);
        }
    }
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(mask: &Mask) -> usize {
        mask.data().iter().filter(|&&v| v > 0).count()
    }

    #[test]
    fn degenerate_primitives_collapse_to_empty() {
        assert!(Area::rect(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(Area::rect(0.0, 0.0, 5.0, -1.0).is_empty());
        assert!(Area::corner_pie(0.0, 0.0, 0.0, 0.0, Corner::TopLeft).is_empty());
        assert_eq!(
            Area::round_rect(0.0, 0.0, 10.0, 10.0, 0.0, 8.0),
            Area::rect(0.0, 0.0, 10.0, 10.0)
        );
    }

    #[test]
    fn union_and_subtract_elide_empty() {
        let r = Area::rect(1.0, 1.0, 2.0, 2.0);
        assert_eq!(r.clone().union(Area::Empty), r);
        assert_eq!(Area::Empty.union(r.clone()), r);
        assert_eq!(r.clone().subtract(Area::Empty), r);
        assert!(Area::Empty.subtract(r).is_empty());
    }

    #[test]
    fn empty_area_coverage_is_blank() {
        let mask = Area::Empty.coverage(6, 4, false).unwrap();
        assert_eq!(covered(&mask), 0);
    }

    #[test]
    fn rect_coverage_is_exact_without_anti_aliasing() {
        let area = Area::rect(2.0, 3.0, 10.0, 5.0);
        let mask = area.coverage(20, 20, false).unwrap();
        assert_eq!(covered(&mask), 50);
        // Pixel (2,3) is inside, (1,3) and (12,3) are not.
        assert!(mask.data()[3 * 20 + 2] > 0);
        assert_eq!(mask.data()[3 * 20 + 1], 0);
        assert_eq!(mask.data()[3 * 20 + 12], 0);
    }

    #[test]
    fn union_is_pointwise_max_and_diff_removes() {
        let a = Area::rect(0.0, 0.0, 4.0, 4.0);
        let b = Area::rect(2.0, 0.0, 4.0, 4.0);
        let union = a.clone().union(b.clone());
        let mask = union.coverage(8, 4, false).unwrap();
        assert_eq!(covered(&mask), 24);

        let diff = a.subtract(b);
        let mask = diff.coverage(8, 4, false).unwrap();
        assert_eq!(covered(&mask), 8);
        assert!(mask.data()[0] > 0);
        assert_eq!(mask.data()[2], 0);
    }

    #[test]
    fn coverage_clips_to_bounds() {
        let area = Area::rect(-5.0, -5.0, 100.0, 100.0);
        let mask = area.coverage(10, 10, false).unwrap();
        assert_eq!(covered(&mask), 100);
        assert!(area.coverage(0, 10, false).is_none());
    }

    #[test]
    fn four_pies_tile_the_full_ellipse() {
        // The four quarter wedges of one box must cover the box's inscribed
        // ellipse exactly once each.
        let corners = [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomRight,
            Corner::BottomLeft,
        ];
        let mut combined = Area::Empty;
        for corner in corners {
            combined = combined.union(Area::corner_pie(0.0, 0.0, 40.0, 30.0, corner));
        }
        let mask = combined.coverage(40, 30, false).unwrap();
        let total = covered(&mask);
        // Close to the ellipse's analytic pixel area.
        let expected = std::f32::consts::PI * 20.0 * 15.0;
        let delta = (total as f32 - expected).abs();
        assert!(delta < expected * 0.02, "covered {total}, expected ~{expected}");
    }

    #[test]
    fn round_rect_with_oversized_arcs_clamps() {
        let a = Area::round_rect(0.0, 0.0, 10.0, 10.0, 100.0, 100.0);
        let mask = a.coverage(10, 10, false).unwrap();
        let total = covered(&mask);
        // Fully clamped arcs degenerate the box to its inscribed ellipse.
        let expected = std::f32::consts::PI * 5.0 * 5.0;
        assert!((total as f32 - expected).abs() < 8.0, "covered {total}");
    }
}
