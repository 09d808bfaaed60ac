use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mathmotion_core::math::{path_along_arc, Bounds, Point3, ORIGIN};
use mathmotion_core::{Color, ColorSpace, ObjectId, ObjectKind, SceneError, SceneResult};

/// Outline paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// Interior paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub color: Color,
    pub opacity: f64,
}

/// Typographic state. Only text and glyph objects make use of it, but every
/// object carries one so the state shape is uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Text content; `Some` for text objects and single-char strings for glyphs.
    pub text: Option<String>,
    pub font: String,
    pub font_size: f64,
    /// Substrings to recolor whenever they occur (`t2c`).
    pub color_map: BTreeMap<String, Color>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            text: None,
            font: "CMU Serif".to_string(),
            font_size: 48.0,
            color_map: BTreeMap::new(),
        }
    }
}

impl Style {
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Paint every occurrence of `key` in `color`.
    pub fn with_color(mut self, key: impl Into<String>, color: Color) -> Self {
        self.color_map.insert(key.into(), color);
        self
    }
}

/// Geometric and style state of one object (not including its children).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    /// Polyline vertices in scene space.
    pub points: Vec<Point3>,
    pub stroke: Stroke,
    pub fill: Fill,
    /// Overall opacity multiplier.
    pub opacity: f64,
    /// Fraction of the outline drawn so far (0 = nothing, 1 = complete).
    pub draw_fraction: f64,
    pub visible: bool,
    pub style: Style,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            stroke: Stroke {
                color: Color::WHITE,
                width: 4.0,
            },
            fill: Fill {
                color: Color::WHITE,
                opacity: 0.0,
            },
            opacity: 1.0,
            draw_fraction: 1.0,
            visible: true,
            style: Style::default(),
        }
    }
}

impl ObjectState {
    /// A state with the given points and default paint.
    pub fn with_points(points: Vec<Point3>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Blend toward `end`. Continuous fields interpolate; discrete fields
    /// (visibility and style) keep the start value, since callers hand back
    /// the end state verbatim once progress reaches 1.
    fn blend(&self, end: &ObjectState, alpha: f64, path_arc: f64, space: ColorSpace) -> Self {
        let lerp = |a: f64, b: f64| a + (b - a) * alpha;
        ObjectState {
            points: self
                .points
                .iter()
                .zip(&end.points)
                .map(|(a, b)| path_along_arc(*a, *b, path_arc, alpha))
                .collect(),
            stroke: Stroke {
                color: self.stroke.color.interpolate(&end.stroke.color, alpha, space),
                width: lerp(self.stroke.width, end.stroke.width),
            },
            fill: Fill {
                color: self.fill.color.interpolate(&end.fill.color, alpha, space),
                opacity: lerp(self.fill.opacity, end.fill.opacity),
            },
            opacity: lerp(self.opacity, end.opacity),
            draw_fraction: lerp(self.draw_fraction, end.draw_fraction),
            visible: self.visible,
            style: Style {
                font_size: lerp(self.style.font_size, end.style.font_size),
                ..self.style.clone()
            },
        }
    }
}

/// A detached, recursive copy of an object family's state.
///
/// Snapshots are what animations interpolate between and what the deferred
/// proxy mutates. Each node remembers the id it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub state: ObjectState,
    pub children: Vec<Snapshot>,
}

impl Snapshot {
    pub fn new(kind: ObjectKind, state: ObjectState) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            state,
            children: Vec::new(),
        }
    }

    /// A group snapshot over `children`, used for fragments that span
    /// several objects.
    pub fn group(children: Vec<Snapshot>) -> Self {
        Self {
            children,
            ..Self::new(ObjectKind::Group, ObjectState::default())
        }
    }

    /// Depth-first, pre-order walk over the family.
    pub fn family(&self) -> Vec<&Snapshot> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.family());
        }
        out
    }

    /// Visit every member of the family, parents before children.
    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Snapshot)) {
        f(self);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }

    /// Visit every point of the family.
    pub fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point3)) {
        self.for_each_mut(&mut |s| s.state.points.iter_mut().for_each(&mut *f));
    }

    pub fn points(&self) -> Vec<Point3> {
        self.family()
            .into_iter()
            .flat_map(|s| s.state.points.iter().copied())
            .collect()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.points())
    }

    /// Center of the family's bounding box, or the origin for an empty family.
    pub fn center(&self) -> Point3 {
        self.bounds().map(|b| b.center()).unwrap_or(ORIGIN)
    }

    /// Check that `other` has the same child structure and point counts.
    pub fn check_compatible(&self, other: &Snapshot) -> SceneResult<()> {
        if self.state.points.len() != other.state.points.len() {
            return Err(SceneError::incompatible(format!(
                "{} has {} points but its counterpart has {}",
                self.id,
                self.state.points.len(),
                other.state.points.len()
            )));
        }
        if self.children.len() != other.children.len() {
            return Err(SceneError::incompatible(format!(
                "{} has {} children but its counterpart has {}",
                self.id,
                self.children.len(),
                other.children.len()
            )));
        }
        for (a, b) in self.children.iter().zip(&other.children) {
            a.check_compatible(b)?;
        }
        Ok(())
    }

    /// Interpolate toward `end` at eased progress `alpha`. Points follow an arc
    /// of `path_arc` radians. Fails if the two families are shaped differently.
    pub fn interpolate(
        &self,
        end: &Snapshot,
        alpha: f64,
        path_arc: f64,
        space: ColorSpace,
    ) -> SceneResult<Snapshot> {
        self.check_compatible(end)?;
        Ok(self.blend(end, alpha, path_arc, space))
    }

    fn blend(&self, end: &Snapshot, alpha: f64, path_arc: f64, space: ColorSpace) -> Snapshot {
        Snapshot {
            id: self.id,
            kind: self.kind.clone(),
            state: self.state.blend(&end.state, alpha, path_arc, space),
            children: self
                .children
                .iter()
                .zip(&end.children)
                .map(|(a, b)| a.blend(b, alpha, path_arc, space))
                .collect(),
        }
    }

    /// Reshape `target` to this snapshot's structure so the two can be
    /// interpolated. Used where a match deliberately pairs fragments of
    /// different shapes.
    ///
    /// Children are paired proportionally by index; surplus children collapse
    /// onto their counterpart, and point lists are resampled along their path.
    pub fn aligned(&self, target: &Snapshot) -> Snapshot {
        let mut state = target.state.clone();
        state.points = if target.state.points.is_empty() && !self.state.points.is_empty() {
            vec![target.center(); self.state.points.len()]
        } else {
            resample(&target.state.points, self.state.points.len())
        };

        let children = if target.children.is_empty() {
            self.children
                .iter()
                .map(|child| child.collapsed_onto(target))
                .collect()
        } else {
            let (n, m) = (self.children.len(), target.children.len());
            self.children
                .iter()
                .enumerate()
                .map(|(i, child)| child.aligned(&target.children[i * m / n]))
                .collect()
        };

        Snapshot {
            id: self.id,
            kind: target.kind.clone(),
            state,
            children,
        }
    }

    fn collapsed_onto(&self, target: &Snapshot) -> Snapshot {
        let center = target.center();
        let mut out = self.clone();
        out.for_each_mut(&mut |s| {
            s.state.points.iter_mut().for_each(|p| *p = center);
            s.state.stroke = target.state.stroke.clone();
            s.state.fill = target.state.fill.clone();
            s.state.opacity = 0.0;
        });
        out
    }
}

/// Resample a polyline to `n` points evenly spaced by arc length.
/// Endpoints are preserved exactly.
pub fn resample(points: &[Point3], n: usize) -> Vec<Point3> {
    if points.len() == n {
        return points.to_vec();
    }
    match (points, n) {
        (_, 0) => Vec::new(),
        ([], _) => vec![ORIGIN; n],
        ([only], _) => vec![*only; n],
        (_, 1) => vec![points[0]],
        _ => {
            let mut cumulative = Vec::with_capacity(points.len());
            let mut total = 0.0;
            cumulative.push(0.0);
            for w in points.windows(2) {
                total += (w[1] - w[0]).norm();
                cumulative.push(total);
            }
            if total == 0.0 {
                return vec![points[0]; n];
            }
            let last = points.len() - 1;
            (0..n)
                .map(|k| {
                    if k == n - 1 {
                        return points[last];
                    }
                    let target = total * k as f64 / (n - 1) as f64;
                    let seg = cumulative
                        .windows(2)
                        .position(|w| target <= w[1])
                        .unwrap_or(last - 1);
                    let span = cumulative[seg + 1] - cumulative[seg];
                    let local = if span == 0.0 {
                        0.0
                    } else {
                        (target - cumulative[seg]) / span
                    };
                    points[seg].lerp(&points[seg + 1], local)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f64, f64)]) -> Snapshot {
        Snapshot::new(
            ObjectKind::Path,
            ObjectState::with_points(
                points.iter().map(|(x, y)| Point3::new(*x, *y, 0.0)).collect(),
            ),
        )
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = path(&[(0.0, 0.0), (1.0, 0.0)]);
        let mut b = path(&[(2.0, 0.0), (3.0, 2.0)]);
        b.state.opacity = 0.0;
        let mid = a.interpolate(&b, 0.5, 0.0, ColorSpace::LinearRgb).unwrap();
        assert_eq!(mid.state.points[0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mid.state.points[1], Point3::new(2.0, 1.0, 0.0));
        assert!((mid.state.opacity - 0.5).abs() < 1e-12);
        assert_eq!(mid.id, a.id);
    }

    #[test]
    fn test_discrete_fields_hold_start_value() {
        let mut a = path(&[(0.0, 0.0)]);
        let mut b = path(&[(1.0, 0.0)]);
        a.state.style.text = Some("+".into());
        b.state.style.text = Some("-".into());
        b.state.visible = false;
        let near_end = a.interpolate(&b, 0.99, 0.0, ColorSpace::Srgb).unwrap();
        assert_eq!(near_end.state.style.text.as_deref(), Some("+"));
        assert!(near_end.state.visible);
    }

    #[test]
    fn test_incompatible_point_counts() {
        let a = path(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = path(&[(0.0, 0.0)]);
        let err = a.interpolate(&b, 0.5, 0.0, ColorSpace::Srgb).unwrap_err();
        assert!(matches!(err, SceneError::IncompatibleShape(_)));
    }

    #[test]
    fn test_incompatible_children() {
        let a = Snapshot::group(vec![path(&[(0.0, 0.0)])]);
        let b = Snapshot::group(vec![path(&[(0.0, 0.0)]), path(&[(1.0, 0.0)])]);
        assert!(a.check_compatible(&b).is_err());
    }

    #[test]
    fn test_aligned_matches_shape() {
        let one = Snapshot::group(vec![path(&[(0.0, 0.0), (1.0, 0.0)])]);
        let many = Snapshot::group(vec![
            path(&[(5.0, 0.0), (6.0, 0.0), (7.0, 0.0)]),
            path(&[(8.0, 0.0)]),
        ]);
        let aligned = one.aligned(&many);
        assert!(one.check_compatible(&aligned).is_ok());
        assert_eq!(aligned.children[0].state.points[0], Point3::new(5.0, 0.0, 0.0));
        assert_eq!(aligned.children[0].state.points[1], Point3::new(7.0, 0.0, 0.0));

        let back = many.aligned(&one);
        assert!(many.check_compatible(&back).is_ok());
    }

    #[test]
    fn test_aligned_onto_childless_target_collapses() {
        let group = Snapshot::group(vec![path(&[(0.0, 0.0)]), path(&[(4.0, 0.0)])]);
        let dot = path(&[(1.0, 1.0), (3.0, 1.0)]);
        let aligned = group.aligned(&dot);
        assert!(group.check_compatible(&aligned).is_ok());
        for child in &aligned.children {
            assert_eq!(child.state.points[0], Point3::new(2.0, 1.0, 0.0));
            assert_eq!(child.state.opacity, 0.0);
        }
    }

    #[test]
    fn test_resample_keeps_endpoints() {
        let pts = [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)];
        let out = resample(&pts, 5);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[4], pts[1]);
        assert!((out[1].x - 1.0).abs() < 1e-12);
        assert_eq!(resample(&pts, 1), vec![pts[0]]);
        assert!(resample(&pts, 0).is_empty());
    }

    #[test]
    fn test_family_order_is_preorder() {
        let leaf_a = path(&[(0.0, 0.0)]);
        let leaf_b = path(&[(1.0, 0.0)]);
        let (a_id, b_id) = (leaf_a.id, leaf_b.id);
        let inner = Snapshot::group(vec![leaf_a]);
        let inner_id = inner.id;
        let root = Snapshot::group(vec![inner, leaf_b]);
        let ids: Vec<_> = root.family().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![root.id, inner_id, a_id, b_id]);
    }
}
