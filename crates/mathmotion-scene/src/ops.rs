use mathmotion_core::math::{Bounds, Complex, Matrix3, Point3};
use mathmotion_core::{Color, SceneConfig};

use crate::object::Snapshot;

/// Transformation operations shared by live objects, snapshots and deferred
/// proxies.
///
/// Implementors only provide [`ObjectOps::edit`], which hands out the family
/// state to mutate; every operation is expressed on top of it. None of the
/// operations change the family's structure.
///
/// Frame-relative operations read [`ObjectOps::config`]. Live handles and
/// proxies answer with their tree's configuration; a bare snapshot uses the
/// process-wide one.
pub trait ObjectOps {
    fn edit<F: FnOnce(&mut Snapshot)>(&mut self, f: F) -> &mut Self;

    fn config(&self) -> &SceneConfig {
        SceneConfig::global()
    }

    fn shift(&mut self, offset: Point3) -> &mut Self {
        self.edit(|s| s.for_each_point_mut(&mut |p| *p += offset))
    }

    /// Move so the family's center lands on `point`.
    fn move_to(&mut self, point: Point3) -> &mut Self {
        self.edit(|s| {
            let offset = point - s.center();
            s.for_each_point_mut(&mut |p| *p += offset);
        })
    }

    /// Scale about the family's center.
    fn scale(&mut self, factor: f64) -> &mut Self {
        self.edit(|s| {
            let c = s.center();
            s.for_each_point_mut(&mut |p| *p = c + (*p - c) * factor);
        })
    }

    /// Rotate counter-clockwise about the family's center, in the xy plane.
    fn rotate(&mut self, angle: f64) -> &mut Self {
        self.edit(|s| {
            let c = s.center();
            s.for_each_point_mut(&mut |p| *p = c + (*p - c).rotate_z(angle));
        })
    }

    /// Scale uniformly so the family is `height` tall. A flat family is left alone.
    fn set_height(&mut self, height: f64) -> &mut Self {
        self.edit(|s| {
            if let Some(bounds) = s.bounds() {
                if bounds.height() > 0.0 {
                    scale_about(s, bounds.center(), height / bounds.height());
                }
            }
        })
    }

    /// Scale uniformly so the family is `width` wide. A zero-width family is left alone.
    fn set_width(&mut self, width: f64) -> &mut Self {
        self.edit(|s| {
            if let Some(bounds) = s.bounds() {
                if bounds.width() > 0.0 {
                    scale_about(s, bounds.center(), width / bounds.width());
                }
            }
        })
    }

    /// Push the family against a frame edge, leaving `buff` of room.
    fn to_edge(&mut self, direction: Point3, buff: f64) -> &mut Self {
        let (width, height) = (self.config().frame.width, self.config().frame.height);
        self.edit(move |s| {
            let Some(bounds) = s.bounds() else { return };
            let sign = |v: f64| if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 };
            let target = Point3::new(
                sign(direction.x) * width / 2.0,
                sign(direction.y) * height / 2.0,
                0.0,
            );
            let delta = target - bounds.critical_point(direction) - direction * buff;
            let offset = Point3::new(
                delta.x * sign(direction.x).abs(),
                delta.y * sign(direction.y).abs(),
                0.0,
            );
            s.for_each_point_mut(&mut |p| *p += offset);
        })
    }

    /// Push the family into a frame corner; `direction` is a diagonal such as `UL`.
    fn to_corner(&mut self, direction: Point3, buff: f64) -> &mut Self {
        self.to_edge(direction, buff)
    }

    /// Lay the children out along `direction`, each `buff` from the previous,
    /// keeping the family's center where it was.
    fn arrange(&mut self, direction: Point3, buff: f64) -> &mut Self {
        self.edit(|s| {
            let center = s.center();
            let mut previous: Option<Bounds> = None;
            for child in &mut s.children {
                let Some(bounds) = child.bounds() else { continue };
                if let Some(prev) = previous {
                    let offset = prev.critical_point(direction) - bounds.critical_point(-direction)
                        + direction * buff;
                    child.for_each_point_mut(&mut |p| *p += offset);
                }
                previous = child.bounds();
            }
            let offset = center - s.center();
            s.for_each_point_mut(&mut |p| *p += offset);
        })
    }

    /// Set stroke and fill color across the family.
    fn set_color(&mut self, color: Color) -> &mut Self {
        self.edit(|s| {
            s.for_each_mut(&mut |m| {
                m.state.stroke.color = color;
                m.state.fill.color = color;
            })
        })
    }

    fn set_stroke(&mut self, color: Color, width: f64) -> &mut Self {
        self.edit(|s| {
            s.for_each_mut(&mut |m| {
                m.state.stroke.color = color;
                m.state.stroke.width = width;
            })
        })
    }

    fn set_fill(&mut self, color: Color, opacity: f64) -> &mut Self {
        self.edit(|s| {
            s.for_each_mut(&mut |m| {
                m.state.fill.color = color;
                m.state.fill.opacity = opacity.clamp(0.0, 1.0);
            })
        })
    }

    fn set_opacity(&mut self, opacity: f64) -> &mut Self {
        self.edit(|s| s.for_each_mut(&mut |m| m.state.opacity = opacity.clamp(0.0, 1.0)))
    }

    /// Color the members that carry points along a gradient through `stops`,
    /// in family order.
    fn set_submobject_colors_by_gradient(&mut self, stops: &[Color]) -> &mut Self {
        let space = self.config().color_space;
        self.edit(|s| {
            let total = s.family().iter().filter(|m| !m.state.points.is_empty()).count();
            let mut i = 0usize;
            s.for_each_mut(&mut |m| {
                if m.state.points.is_empty() {
                    return;
                }
                let t = if total > 1 {
                    i as f64 / (total - 1) as f64
                } else {
                    0.0
                };
                if let Some(color) = Color::gradient(stops, t, space) {
                    m.state.stroke.color = color;
                    m.state.fill.color = color;
                }
                i += 1;
            })
        })
    }

    /// Map every point through `f`.
    fn apply_function<F: Fn(Point3) -> Point3>(&mut self, f: F) -> &mut Self {
        self.edit(|s| s.for_each_point_mut(&mut |p| *p = f(*p)))
    }

    /// Apply a linear map about the origin. Accepts 2x2 (xy plane) or 3x3 matrices.
    fn apply_matrix(&mut self, matrix: impl Into<Matrix3>) -> &mut Self {
        let m = matrix.into();
        self.edit(|s| s.for_each_point_mut(&mut |p| *p = m.apply(*p)))
    }

    /// Treat the xy plane as the complex plane and map every point through `f`.
    fn apply_complex_function<F: Fn(Complex) -> Complex>(&mut self, f: F) -> &mut Self {
        self.edit(|s| s.for_each_point_mut(&mut |p| *p = f(Complex::from_point(*p)).to_point(p.z)))
    }

    /// Subdivide every segment into `pieces` so curved maps bend straight lines
    /// smoothly. Existing vertices are kept.
    fn prepare_for_nonlinear_transform(&mut self, pieces: usize) -> &mut Self {
        self.edit(|s| s.for_each_mut(&mut |m| m.state.points = subdivide(&m.state.points, pieces)))
    }
}

fn scale_about(s: &mut Snapshot, center: Point3, factor: f64) {
    s.for_each_point_mut(&mut |p| *p = center + (*p - center) * factor);
}

fn subdivide(points: &[Point3], pieces: usize) -> Vec<Point3> {
    if pieces <= 1 || points.len() < 2 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity((points.len() - 1) * pieces + 1);
    for w in points.windows(2) {
        for k in 0..pieces {
            out.push(w[0].lerp(&w[1], k as f64 / pieces as f64));
        }
    }
    out.extend(points.last().copied());
    out
}

impl ObjectOps for Snapshot {
    fn edit<F: FnOnce(&mut Snapshot)>(&mut self, f: F) -> &mut Self {
        f(self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectState;
    use mathmotion_core::math::{DOWN, ORIGIN, RIGHT, UP};
    use mathmotion_core::ObjectKind;

    fn square(center: Point3, side: f64) -> Snapshot {
        let h = side / 2.0;
        let pts = [(-h, -h), (h, -h), (h, h), (-h, h), (-h, -h)]
            .iter()
            .map(|(x, y)| Point3::new(center.x + x, center.y + y, 0.0))
            .collect();
        Snapshot::new(ObjectKind::Path, ObjectState::with_points(pts))
    }

    fn close(a: Point3, b: Point3) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn test_shift_and_move_to() {
        let mut s = square(ORIGIN, 2.0);
        s.shift(RIGHT * 3.0);
        assert!(close(s.center(), Point3::new(3.0, 0.0, 0.0)));
        s.move_to(UP);
        assert!(close(s.center(), UP));
    }

    #[test]
    fn test_scale_keeps_center() {
        let mut s = square(Point3::new(1.0, 1.0, 0.0), 2.0);
        s.scale(3.0);
        let b = s.bounds().unwrap();
        assert!((b.width() - 6.0).abs() < 1e-9);
        assert!(close(b.center(), Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut s = Snapshot::new(
            ObjectKind::Path,
            ObjectState::with_points(vec![Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]),
        );
        s.rotate(std::f64::consts::FRAC_PI_2);
        assert!(close(s.state.points[0], DOWN));
        assert!(close(s.state.points[1], UP));
    }

    #[test]
    fn test_set_height() {
        let mut s = square(ORIGIN, 2.0);
        s.set_height(5.0);
        assert!((s.bounds().unwrap().height() - 5.0).abs() < 1e-9);
        assert!((s.bounds().unwrap().width() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_arrange_right() {
        let mut group = Snapshot::group(vec![square(ORIGIN, 1.0), square(ORIGIN, 1.0), square(ORIGIN, 1.0)]);
        group.arrange(RIGHT, 0.5);
        let xs: Vec<f64> = group.children.iter().map(|c| c.center().x).collect();
        assert!((xs[1] - xs[0] - 1.5).abs() < 1e-9);
        assert!((xs[2] - xs[1] - 1.5).abs() < 1e-9);
        assert!(close(group.center(), ORIGIN));
    }

    #[test]
    fn test_arrange_is_deterministic() {
        let mut a = Snapshot::group(vec![square(UP, 1.0), square(DOWN, 2.0)]);
        let mut b = a.clone();
        a.arrange(DOWN, 0.25);
        b.arrange(DOWN, 0.25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_edge_left() {
        let mut s = square(ORIGIN, 1.0);
        s.to_edge(mathmotion_core::math::LEFT, 0.5);
        let frame = &SceneConfig::global().frame;
        let b = s.bounds().unwrap();
        assert!((b.min.x - (-frame.width / 2.0 + 0.5)).abs() < 1e-9);
        assert!(b.center().y.abs() < 1e-9);
    }

    #[test]
    fn test_apply_matrix_shear() {
        let mut s = Snapshot::new(
            ObjectKind::Path,
            ObjectState::with_points(vec![Point3::new(0.0, 1.0, 0.0)]),
        );
        s.apply_matrix([[1.0, 1.0], [0.0, 1.0]]);
        assert!(close(s.state.points[0], Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_apply_complex_square() {
        let mut s = Snapshot::new(
            ObjectKind::Path,
            ObjectState::with_points(vec![Point3::new(0.0, 1.0, 0.5)]),
        );
        s.apply_complex_function(|z| z.powi(2));
        assert!(close(s.state.points[0], Point3::new(-1.0, 0.0, 0.5)));
    }

    #[test]
    fn test_prepare_for_nonlinear_transform() {
        let mut s = Snapshot::new(
            ObjectKind::Path,
            ObjectState::with_points(vec![ORIGIN, RIGHT * 4.0]),
        );
        s.prepare_for_nonlinear_transform(4);
        assert_eq!(s.state.points.len(), 5);
        assert!(close(s.state.points[1], RIGHT));
        assert!(close(s.state.points[4], RIGHT * 4.0));
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut group = Snapshot::group(vec![square(ORIGIN, 1.0), square(ORIGIN, 1.0), square(ORIGIN, 1.0)]);
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        group.set_submobject_colors_by_gradient(&[red, blue]);
        assert_eq!(group.children[0].state.fill.color, red);
        assert_eq!(group.children[2].state.fill.color, blue);
    }

    #[test]
    fn test_set_opacity_reaches_family() {
        let mut group = Snapshot::group(vec![square(ORIGIN, 1.0)]);
        group.set_opacity(0.25);
        assert!(group.family().iter().all(|m| (m.state.opacity - 0.25).abs() < 1e-12));
    }
}
