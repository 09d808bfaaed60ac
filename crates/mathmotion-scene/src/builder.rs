use mathmotion_core::math::{Point3, ORIGIN};
use mathmotion_core::{Color, ObjectId, ObjectKind};

use crate::object::{ObjectState, Snapshot};
use crate::ops::ObjectOps;
use crate::tree::ObjectTree;

/// A builder for shapes, for scene code and tests.
///
/// Shapes are built around the origin; position them with the `at` setter or
/// the transformation ops once inserted.
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    snapshot: Snapshot,
}

impl ShapeBuilder {
    fn path(points: Vec<Point3>) -> Self {
        Self {
            snapshot: Snapshot::new(ObjectKind::Path, ObjectState::with_points(points)),
        }
    }

    /// Closed axis-aligned rectangle.
    pub fn rectangle(width: f64, height: f64) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        Self::path(vec![
            Point3::new(-w, -h, 0.0),
            Point3::new(w, -h, 0.0),
            Point3::new(w, h, 0.0),
            Point3::new(-w, h, 0.0),
            Point3::new(-w, -h, 0.0),
        ])
    }

    pub fn square(side: f64) -> Self {
        Self::rectangle(side, side)
    }

    /// Closed polygon approximating a circle, starting at angle zero.
    pub fn circle(radius: f64, segments: usize) -> Self {
        let segments = segments.max(3);
        Self::path(
            (0..=segments)
                .map(|k| {
                    let angle = std::f64::consts::TAU * k as f64 / segments as f64;
                    Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
                })
                .collect(),
        )
    }

    pub fn line(start: Point3, end: Point3) -> Self {
        Self::path(vec![start, end])
    }

    /// Coordinate grid: one vertical line per integer x in `x_range` and one
    /// horizontal line per integer y in `y_range`, each split into
    /// `pieces_per_unit` segments per unit so nonlinear maps bend them.
    pub fn number_plane(x_range: (i32, i32), y_range: (i32, i32), pieces_per_unit: usize) -> Self {
        let (x0, x1) = (x_range.0.min(x_range.1), x_range.0.max(x_range.1));
        let (y0, y1) = (y_range.0.min(y_range.1), y_range.0.max(y_range.1));
        let pieces = pieces_per_unit.max(1);
        let blue = Color::from_hex("#29ABCA").unwrap_or(Color::WHITE);

        let mut lines = Vec::new();
        for x in x0..=x1 {
            let mut line = Self::line(
                Point3::new(x as f64, y0 as f64, 0.0),
                Point3::new(x as f64, y1 as f64, 0.0),
            )
            .snapshot;
            line.prepare_for_nonlinear_transform(pieces * (y1 - y0).max(1) as usize)
                .set_stroke(blue, 2.0);
            lines.push(line);
        }
        for y in y0..=y1 {
            let mut line = Self::line(
                Point3::new(x0 as f64, y as f64, 0.0),
                Point3::new(x1 as f64, y as f64, 0.0),
            )
            .snapshot;
            line.prepare_for_nonlinear_transform(pieces * (x1 - x0).max(1) as usize)
                .set_stroke(blue, 2.0);
            lines.push(line);
        }
        Self {
            snapshot: Snapshot::group(lines),
        }
    }

    pub fn at(mut self, center: Point3) -> Self {
        self.snapshot.move_to(center);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.snapshot.set_color(color);
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.snapshot.set_stroke(color, width);
        self
    }

    pub fn with_fill(mut self, color: Color, opacity: f64) -> Self {
        self.snapshot.set_fill(color, opacity);
        self
    }

    /// The built state, without inserting it anywhere.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Insert into `tree` as a detached object.
    pub fn build(self, tree: &mut ObjectTree) -> ObjectId {
        tree.instantiate(&self.snapshot)
    }
}

impl Default for ShapeBuilder {
    fn default() -> Self {
        Self::square(2.0).at(ORIGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathmotion_core::math::{RIGHT, UP};

    #[test]
    fn test_rectangle_is_closed_and_centered() {
        let rect = ShapeBuilder::rectangle(4.0, 2.0);
        let pts = &rect.snapshot().state.points;
        assert_eq!(pts.first(), pts.last());
        let b = rect.snapshot().bounds().unwrap();
        assert!((b.width() - 4.0).abs() < 1e-12);
        assert!((b.height() - 2.0).abs() < 1e-12);
        assert!(b.center().norm() < 1e-12);
    }

    #[test]
    fn test_circle_radius() {
        let circle = ShapeBuilder::circle(1.5, 32);
        assert_eq!(circle.snapshot().state.points.len(), 33);
        assert!(circle
            .snapshot()
            .state
            .points
            .iter()
            .all(|p| (p.norm() - 1.5).abs() < 1e-9));
    }

    #[test]
    fn test_builder_setters() {
        let mut tree = ObjectTree::new();
        let red = Color::rgb(1.0, 0.0, 0.0);
        let id = ShapeBuilder::square(1.0)
            .at(RIGHT + UP)
            .with_fill(red, 0.5)
            .build(&mut tree);
        let node = tree.get(id).unwrap();
        assert_eq!(node.state.fill.color, red);
        assert!((node.state.fill.opacity - 0.5).abs() < 1e-12);
        assert!((tree.snapshot(id).unwrap().center() - (RIGHT + UP)).norm() < 1e-12);
    }

    #[test]
    fn test_number_plane_lines() {
        let mut tree = ObjectTree::new();
        let plane = ShapeBuilder::number_plane((-2, 2), (-1, 1), 4).build(&mut tree);
        let lines = tree.children(plane).unwrap();
        assert_eq!(lines.len(), 5 + 3);
        // Vertical lines span 2 units at 4 pieces per unit.
        assert_eq!(tree.get(lines[0]).unwrap().state.points.len(), 9);
        assert_eq!(tree.get(lines[5]).unwrap().state.points.len(), 17);
    }
}
