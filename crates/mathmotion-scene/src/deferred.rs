use mathmotion_core::{Duration, Easing, ObjectId, SceneConfig, SceneResult};

use crate::animation::{Animation, AnimationKind, Subject};
use crate::object::Snapshot;
use crate::ops::ObjectOps;
use crate::tree::ObjectTree;

/// A recorded intent to change an object.
///
/// The proxy holds a clone of the target's state taken when it was created.
/// Transformation operations mutate that clone and compose in call order;
/// the live object is left alone until the resulting animation runs.
///
/// ```ignore
/// let mut grid = tree.animate(grid_id)?;
/// grid.apply_matrix([[1.0, 1.0], [0.0, 1.0]]);
/// scene.play(vec![grid.build(scene.tree())?])?;
/// ```
#[derive(Debug, Clone)]
pub struct Deferred {
    target: ObjectId,
    end: Snapshot,
    run_time: Option<Duration>,
    easing: Easing,
    path_arc: f64,
    config: &'static SceneConfig,
}

/// Begin a deferred mutation of `id`.
pub fn begin_deferred(tree: &ObjectTree, id: ObjectId) -> SceneResult<Deferred> {
    Deferred::new(tree, id)
}

impl Deferred {
    pub fn new(tree: &ObjectTree, id: ObjectId) -> SceneResult<Self> {
        Ok(Self {
            target: id,
            end: tree.snapshot(id)?,
            run_time: None,
            easing: Easing::default(),
            path_arc: 0.0,
            config: tree.config(),
        })
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// The target's live state and the recorded end state.
    pub fn resolve(&self, tree: &ObjectTree) -> SceneResult<(Snapshot, Snapshot)> {
        Ok((tree.snapshot(self.target)?, self.end.clone()))
    }

    /// Turn the recorded change into a transform of the target.
    pub fn build(&self, tree: &ObjectTree) -> SceneResult<Animation> {
        let (start, end) = self.resolve(tree)?;
        start.check_compatible(&end)?;
        let mut animation = Animation::new(
            AnimationKind::Transform,
            Subject::Object(self.target),
            start,
            end,
        )
        .with_easing(self.easing)
        .with_path_arc(self.path_arc);
        animation.run_time = self.run_time;
        Ok(animation)
    }

    pub fn run_time(&mut self, seconds: f64) -> &mut Self {
        self.run_time = Some(Duration::from_seconds(seconds));
        self
    }

    pub fn easing(&mut self, easing: Easing) -> &mut Self {
        self.easing = easing;
        self
    }

    pub fn path_arc(&mut self, radians: f64) -> &mut Self {
        self.path_arc = radians;
        self
    }
}

impl ObjectOps for Deferred {
    fn edit<F: FnOnce(&mut Snapshot)>(&mut self, f: F) -> &mut Self {
        f(&mut self.end);
        self
    }

    fn config(&self) -> &SceneConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathmotion_core::math::{Point3, ORIGIN, RIGHT, UP};
    use mathmotion_core::{Color, ColorSpace};

    fn square(tree: &mut ObjectTree) -> ObjectId {
        tree.add_path(vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn test_live_object_untouched() {
        let mut tree = ObjectTree::new();
        let id = square(&mut tree);
        let before = tree.snapshot(id).unwrap();
        let mut proxy = tree.animate(id).unwrap();
        proxy.shift(RIGHT).set_color(Color::BLACK);
        assert_eq!(tree.snapshot(id).unwrap(), before);
        let (start, end) = proxy.resolve(&tree).unwrap();
        assert_eq!(start, before);
        assert!((end.center() - RIGHT).norm() < 1e-9);
        assert_eq!(end.state.stroke.color, Color::BLACK);
    }

    #[test]
    fn test_calls_compose() {
        let mut tree = ObjectTree::new();
        let id = square(&mut tree);
        let mut proxy = begin_deferred(&tree, id).unwrap();
        proxy.shift(UP * 2.0);
        proxy.scale(2.0);
        // Scaling happens about the already-shifted center.
        let (_, end) = proxy.resolve(&tree).unwrap();
        let bounds = end.bounds().unwrap();
        assert!((bounds.center() - UP * 2.0).norm() < 1e-9);
        assert!((bounds.width() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_start_is_state_at_resolve_time() {
        let mut tree = ObjectTree::new();
        let id = square(&mut tree);
        let mut proxy = tree.animate(id).unwrap();
        proxy.move_to(RIGHT * 5.0);
        tree.object_mut(id).unwrap().shift(UP);
        let (start, _) = proxy.resolve(&tree).unwrap();
        assert!((start.center() - UP).norm() < 1e-9);
    }

    #[test]
    fn test_build_carries_settings() {
        let mut tree = ObjectTree::new();
        let id = square(&mut tree);
        let mut proxy = tree.animate(id).unwrap();
        proxy.shift(RIGHT).run_time(3.0).path_arc(1.5);
        let anim = proxy.build(&tree).unwrap();
        assert_eq!(anim.run_time, Some(Duration::from_seconds(3.0)));
        assert_eq!(anim.path_arc, 1.5);
        assert!((anim.start.center() - ORIGIN).norm() < 1e-9);
        let end = anim.interpolate(1.0, ColorSpace::LinearRgb).unwrap();
        assert!((end.center() - RIGHT).norm() < 1e-9);
    }
}
