//! Pure geometry helpers shared by the layout engine and the decorators.
//!
//! Angles are in degrees measured clockwise on screen (SVG y axis points
//! down), so a point at angle `a` and radius `r` from `c` is
//! `c + r * (cos a, sin a)`.

use std::fmt::Write as _;

use glam::DVec2;

/// Largest angular span (degrees) for which the far edge of a collapsed
/// wedge is drawn as a straight chord.
pub const CHORD_MAX_SPAN: f64 = 15.0;

/// Angular resolution (degrees) used when sampling curved wedge edges.
const WEDGE_SAMPLE_STEP: f64 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    /// Increasing angle (SVG sweep flag 1).
    Clockwise,
    /// Decreasing angle (SVG sweep flag 0).
    CounterClockwise,
}

impl ArcDirection {
    pub fn sweep_flag(self) -> u8 {
        match self {
            ArcDirection::Clockwise => 1,
            ArcDirection::CounterClockwise => 0,
        }
    }
}

/// Direction in which to sweep an arc drawn from `child_angle` to
/// `parent_angle` so that it always takes the short way round.
pub fn arc_direction(child_angle: f64, parent_angle: f64) -> ArcDirection {
    if (child_angle - parent_angle).rem_euclid(360.0) <= 180.0 {
        ArcDirection::CounterClockwise
    } else {
        ArcDirection::Clockwise
    }
}

/// Normalised position along an edge (0 at the node, 1 at the parent) at
/// which a linearly varying value reaches `threshold`. A branch carrying the
/// same value at both ends crosses at the node.
pub fn interpolate_crossing(node_value: f64, parent_value: f64, threshold: f64) -> f64 {
    if node_value == parent_value {
        return 0.0;
    }
    (node_value - threshold) / (node_value - parent_value)
}

pub fn polar(center: DVec2, radius: f64, angle_deg: f64) -> DVec2 {
    let rad = angle_deg.to_radians();
    center + radius * DVec2::new(rad.cos(), rad.sin())
}

/// Midpoint of the smallest arc containing every angle in `angles`.
///
/// For two angles this is the midpoint of the shorter arc between them. When
/// both arcs are equally long the arc starting at the later angle is used,
/// so `[0, 180]` resolves to 270.
pub fn mid_angle(angles: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = angles.iter().map(|a| a.rem_euclid(360.0)).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    match sorted.len() {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }

    // The largest gap between neighbouring angles lies outside the arc.
    let n = sorted.len();
    let mut widest = 0;
    let mut widest_gap = f64::NEG_INFINITY;
    for i in 0..n {
        let next = if i + 1 == n { sorted[0] + 360.0 } else { sorted[i + 1] };
        let gap = next - sorted[i];
        if gap > widest_gap {
            widest_gap = gap;
            widest = i;
        }
    }

    let start = sorted[(widest + 1) % n];
    let end = sorted[widest];
    let span = (end - start).rem_euclid(360.0);
    (start + 0.5 * span).rem_euclid(360.0)
}

/// Orthogonal projection of `r` onto the line through `p` and `q`.
pub fn project_onto_line(p: DVec2, q: DVec2, r: DVec2) -> DVec2 {
    let dir = q - p;
    let len_sq = dir.length_squared();
    if len_sq <= f64::EPSILON {
        return p;
    }
    p + dir * ((r - p).dot(dir) / len_sq)
}

/// Percentile with linear interpolation between the closest ranks.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

pub fn polygon_centroid(points: &[DVec2]) -> DVec2 {
    let n = points.len();
    if n == 0 {
        return DVec2::ZERO;
    }

    let mut signed_area = 0.0;
    let mut centroid = DVec2::ZERO;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        signed_area += cross;
        centroid += (a + b) * cross;
    }
    signed_area *= 0.5;

    if signed_area.abs() <= f64::EPSILON {
        // degenerate polygon
        return points.iter().copied().sum::<DVec2>() / n as f64;
    }
    centroid / (6.0 * signed_area)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn as_str(self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    MoveTo(DVec2),
    LineTo(DVec2),
    Arc {
        radius: f64,
        large_arc: bool,
        direction: ArcDirection,
        to: DVec2,
    },
    Close,
}

/// A sequence of path segments with its fill rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub segments: Vec<Segment>,
    pub fill_rule: FillRule,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn even_odd(mut self) -> Self {
        self.fill_rule = FillRule::EvenOdd;
        self
    }

    pub fn move_to(&mut self, p: DVec2) -> &mut Self {
        self.segments.push(Segment::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: DVec2) -> &mut Self {
        self.segments.push(Segment::LineTo(p));
        self
    }

    pub fn arc_to(
        &mut self,
        to: DVec2,
        radius: f64,
        large_arc: bool,
        direction: ArcDirection,
    ) -> &mut Self {
        self.segments.push(Segment::Arc {
            radius,
            large_arc,
            direction,
            to,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.segments.push(Segment::Close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every explicit vertex of the path in drawing order.
    pub fn points(&self) -> Vec<DVec2> {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::MoveTo(p) | Segment::LineTo(p) => Some(*p),
                Segment::Arc { to, .. } => Some(*to),
                Segment::Close => None,
            })
            .collect()
    }

    /// Serialise as SVG path data.
    pub fn to_svg_data(&self) -> String {
        let mut data = String::new();
        for seg in &self.segments {
            match seg {
                Segment::MoveTo(p) => {
                    let _ = write!(data, "M {} {} ", fmt_num(p.x), fmt_num(p.y));
                }
                Segment::LineTo(p) => {
                    let _ = write!(data, "L {} {} ", fmt_num(p.x), fmt_num(p.y));
                }
                Segment::Arc {
                    radius,
                    large_arc,
                    direction,
                    to,
                } => {
                    let _ = write!(
                        data,
                        "A {r} {r} 0 {} {} {} {} ",
                        u8::from(*large_arc),
                        direction.sweep_flag(),
                        fmt_num(to.x),
                        fmt_num(to.y),
                        r = fmt_num(*radius),
                    );
                }
                Segment::Close => data.push_str("Z "),
            }
        }
        data.trim_end().to_string()
    }
}

pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{rounded}")
}

pub fn fmt_points(points: &[DVec2]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ring between two concentric circles. The circles are wound in opposite
/// directions so an even-odd fill leaves the centre empty.
pub fn donut(center: DVec2, inner_radius: f64, outer_radius: f64) -> Path {
    let mut path = Path::new().even_odd();

    let top = center - DVec2::new(0.0, outer_radius);
    let bottom = center + DVec2::new(0.0, outer_radius);
    path.move_to(top)
        .arc_to(bottom, outer_radius, true, ArcDirection::Clockwise)
        .arc_to(top, outer_radius, true, ArcDirection::Clockwise)
        .close();

    if inner_radius > 0.0 {
        let top = center - DVec2::new(0.0, inner_radius);
        let bottom = center + DVec2::new(0.0, inner_radius);
        path.move_to(top)
            .arc_to(bottom, inner_radius, true, ArcDirection::CounterClockwise)
            .arc_to(top, inner_radius, true, ArcDirection::CounterClockwise)
            .close();
    }

    path
}

/// Closed outline of a collapsed lineage in a circular layout.
///
/// The base runs along the circle of `inner_radius` around `apex` from
/// `end_angle` back to `start_angle`; the far corners sit `outer.0` beyond the
/// base at `start_angle` and `outer.1` beyond it at `end_angle`.
pub fn wedge(
    apex: DVec2,
    start_angle: f64,
    end_angle: f64,
    inner_radius: f64,
    outer: (f64, f64),
) -> Path {
    let span = (end_angle - start_angle).rem_euclid(360.0);
    let far_start_radius = inner_radius + outer.0;
    let far_end_radius = inner_radius + outer.1;

    let mut path = Path::new();
    path.move_to(polar(apex, inner_radius, end_angle));
    path.arc_to(
        polar(apex, inner_radius, start_angle),
        inner_radius,
        span > 180.0,
        ArcDirection::CounterClockwise,
    );
    path.line_to(polar(apex, far_start_radius, start_angle));

    if span > CHORD_MAX_SPAN {
        let steps = ((span / WEDGE_SAMPLE_STEP).ceil() as usize).max(4);
        for i in 1..steps {
            let t = i as f64 / steps as f64;
            let radius = far_start_radius + t * (far_end_radius - far_start_radius);
            path.line_to(polar(apex, radius, start_angle + t * span));
        }
    }

    path.line_to(polar(apex, far_end_radius, end_angle));
    path.close();
    path
}
