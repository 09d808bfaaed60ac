use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use mathmotion_core::{Duration, ObjectId, ObjectKind, SceneConfig, SceneError, SceneResult, Timestamp};

use crate::animation::Animation;
use crate::deferred::Deferred;
use crate::layout::{GlyphLayout, MonospaceLayout};
use crate::object::{ObjectState, Style};
use crate::sink::{NullSink, SampleSink};
use crate::timeline::{Stage, Timeline};
use crate::tree::{ObjectMut, ObjectTree};

/// Flag another party can raise to stop a scene at the next beat boundary.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of running a [`Construct`]. Displays as `ok` or `failed:<beat>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStatus {
    Ok,
    Failed { beat: usize, reason: String },
}

impl CompletionStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, CompletionStatus::Ok)
    }
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionStatus::Ok => write!(f, "ok"),
            CompletionStatus::Failed { beat, .. } => write!(f, "failed:{}", beat),
        }
    }
}

/// A scene description: declares objects and plays beats on a [`Scene`].
pub trait Construct {
    fn name(&self) -> &str;
    fn construct(&self, scene: &mut Scene) -> SceneResult<()>;
}

/// One object tree, one stage and one timeline.
///
/// Only objects in the stage's family are sampled. `Scene` is `Send`; hosts
/// that share it between callers must serialize access themselves.
pub struct Scene {
    tree: ObjectTree,
    stage: ObjectId,
    timeline: Timeline,
    config: &'static SceneConfig,
    layout: Box<dyn GlyphLayout + Send>,
    sink: Box<dyn SampleSink + Send>,
    abort: AbortHandle,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// A scene on the process-wide configuration.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::global())
    }

    pub fn with_config(config: &'static SceneConfig) -> Self {
        let mut tree = ObjectTree::with_config(config);
        let stage = tree.insert(ObjectKind::Group, ObjectState::default());
        Self {
            tree,
            stage,
            timeline: Timeline::new(),
            config,
            layout: Box::new(MonospaceLayout::default()),
            sink: Box::new(NullSink),
            abort: AbortHandle::default(),
        }
    }

    pub fn with_sink(mut self, sink: impl SampleSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_layout(mut self, layout: impl GlyphLayout + Send + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    pub fn config(&self) -> &'static SceneConfig {
        self.config
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ObjectTree {
        &mut self.tree
    }

    /// Root group of everything on screen.
    pub fn stage(&self) -> ObjectId {
        self.stage
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn clock(&self) -> Timestamp {
        self.timeline.clock()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Put objects on stage, in order. An object already on stage moves to the front.
    pub fn add(&mut self, ids: &[ObjectId]) -> SceneResult<()> {
        for id in ids {
            if self.tree.parent(*id)? == Some(self.stage) {
                self.tree.remove_child(self.stage, *id)?;
            }
            self.tree.add_child(self.stage, *id)?;
        }
        Ok(())
    }

    /// Take objects off stage, detaching nested ones from their group.
    /// Objects not on stage are ignored.
    pub fn remove(&mut self, ids: &[ObjectId]) -> SceneResult<()> {
        for id in ids {
            if let Some(parent) = self.tree.parent(*id)? {
                if self.tree.is_ancestor(self.stage, parent) {
                    self.tree.remove_child(parent, *id)?;
                }
            }
        }
        Ok(())
    }

    /// Lay out `content` with the scene's layout engine. The text starts off stage.
    pub fn text(&mut self, content: &str, style: Style) -> ObjectId {
        self.tree.add_text(content, style, self.layout.as_ref())
    }

    pub fn object_mut(&mut self, id: ObjectId) -> SceneResult<ObjectMut<'_>> {
        self.tree.object_mut(id)
    }

    pub fn animate(&self, id: ObjectId) -> SceneResult<Deferred> {
        self.tree.animate(id)
    }

    /// Play one beat at the default run time.
    pub fn play(&mut self, animations: impl IntoIterator<Item = Animation>) -> SceneResult<()> {
        self.play_beat(animations.into_iter().collect(), None)
    }

    /// Play one beat, `seconds` long unless an animation asks for longer.
    pub fn play_for(
        &mut self,
        animations: impl IntoIterator<Item = Animation>,
        seconds: f64,
    ) -> SceneResult<()> {
        self.play_beat(
            animations.into_iter().collect(),
            Some(Duration::from_seconds(seconds)),
        )
    }

    fn play_beat(&mut self, animations: Vec<Animation>, duration: Option<Duration>) -> SceneResult<()> {
        self.check_abort()?;
        let stage = Stage {
            tree: &mut self.tree,
            root: self.stage,
            config: self.config,
            sink: self.sink.as_mut(),
        };
        self.timeline.play(stage, &animations, duration)?;
        Ok(())
    }

    /// Hold the current state for the default wait.
    pub fn wait(&mut self) -> SceneResult<()> {
        self.wait_beat(None)
    }

    pub fn wait_for(&mut self, seconds: f64) -> SceneResult<()> {
        self.wait_beat(Some(Duration::from_seconds(seconds)))
    }

    fn wait_beat(&mut self, duration: Option<Duration>) -> SceneResult<()> {
        self.check_abort()?;
        let stage = Stage {
            tree: &mut self.tree,
            root: self.stage,
            config: self.config,
            sink: self.sink.as_mut(),
        };
        self.timeline.wait(stage, duration)?;
        Ok(())
    }

    fn check_abort(&self) -> SceneResult<()> {
        if self.abort.is_aborted() {
            return Err(SceneError::Aborted {
                beat: self.timeline.next_beat(),
            });
        }
        Ok(())
    }

    /// Clear a failed timeline so beats can be played again.
    pub fn reset(&mut self) {
        self.timeline.reset();
    }

    /// Run `construct` against this scene and report how it ended.
    pub fn run(&mut self, construct: &dyn Construct) -> CompletionStatus {
        info!(scene = construct.name(), "constructing scene");
        match construct.construct(self) {
            Ok(()) => {
                info!(
                    scene = construct.name(),
                    beats = self.timeline.history().len(),
                    clock = %self.clock(),
                    "scene finished"
                );
                CompletionStatus::Ok
            }
            Err(err) => {
                let beat = err.beat().unwrap_or_else(|| self.timeline.next_beat());
                error!(scene = construct.name(), beat, error = %err, "scene failed");
                CompletionStatus::Failed {
                    beat,
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Fade;
    use crate::ops::ObjectOps;
    use crate::sink::RecordingSink;
    use mathmotion_core::math::{Point3, RIGHT, UP};

    fn line(scene: &mut Scene) -> ObjectId {
        scene.tree_mut().add_path(vec![Point3::zero(), RIGHT])
    }

    struct Slide;

    impl Construct for Slide {
        fn name(&self) -> &str {
            "Slide"
        }

        fn construct(&self, scene: &mut Scene) -> SceneResult<()> {
            let id = scene.tree_mut().add_path(vec![Point3::zero(), RIGHT]);
            scene.add(&[id])?;
            let mut proxy = scene.animate(id)?;
            proxy.shift(UP);
            let anim = proxy.build(scene.tree())?;
            scene.play(vec![anim])?;
            scene.wait()
        }
    }

    struct Broken;

    impl Construct for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        fn construct(&self, scene: &mut Scene) -> SceneResult<()> {
            scene.wait()?;
            let id = scene.tree_mut().add_path(vec![Point3::zero()]);
            let anim = Animation::fade_in(scene.tree(), id, Fade::default())?;
            scene.tree_mut().release(id)?;
            scene.play(vec![anim])
        }
    }

    #[test]
    fn test_run_ok() {
        let sink = RecordingSink::new();
        let mut scene = Scene::new().with_sink(sink.clone());
        let status = scene.run(&Slide);
        assert_eq!(status, CompletionStatus::Ok);
        assert_eq!(status.to_string(), "ok");
        assert!((scene.clock().as_seconds() - 2.0).abs() < 1e-9);
        assert_eq!(sink.len(), 60);
    }

    #[test]
    fn test_run_reports_failed_beat() {
        let mut scene = Scene::new();
        let status = scene.run(&Broken);
        assert_eq!(status.to_string(), "failed:1");
        assert!(!status.is_ok());
    }

    #[test]
    fn test_abort_between_beats() {
        let mut scene = Scene::new();
        scene.wait_for(0.5).unwrap();
        scene.abort_handle().abort();
        let err = scene.wait().unwrap_err();
        assert!(matches!(err, SceneError::Aborted { beat: 1 }));
        assert_eq!(scene.timeline().history().len(), 1);
    }

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::new();
        let (a, b) = (line(&mut scene), line(&mut scene));
        scene.add(&[a, b]).unwrap();
        scene.add(&[a]).unwrap();
        assert_eq!(scene.tree().children(scene.stage()).unwrap(), &[b, a]);
        scene.remove(&[a]).unwrap();
        scene.remove(&[a]).unwrap();
        assert_eq!(scene.tree().children(scene.stage()).unwrap(), &[b]);
    }

    #[test]
    fn test_cycle_leaves_tree_unchanged() {
        let mut scene = Scene::new();
        let a = scene.tree_mut().add_group(&[]).unwrap();
        let b = scene.tree_mut().add_group(&[]).unwrap();
        scene.tree_mut().add_child(a, b).unwrap();
        let before = scene.tree().snapshot(a).unwrap();
        let err = scene.tree_mut().add_child(b, a).unwrap_err();
        assert!(matches!(err, SceneError::Cycle { .. }));
        assert_eq!(scene.tree().snapshot(a).unwrap(), before);
        assert_eq!(scene.tree().parent(a).unwrap(), None);
    }

    fn narrow_config() -> &'static SceneConfig {
        let mut config = SceneConfig::default();
        config.frame.width = 4.0;
        config.spacing.med_small_buff = 1.0;
        Box::leak(Box::new(config))
    }

    fn unit_square(scene: &mut Scene) -> ObjectId {
        scene.tree_mut().add_path(vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ])
    }

    #[test]
    fn test_layout_uses_scene_config() {
        let mut scene = Scene::with_config(narrow_config());
        let live = unit_square(&mut scene);
        scene
            .object_mut(live)
            .unwrap()
            .to_edge(mathmotion_core::math::LEFT, 0.5);
        let left = scene.tree().snapshot(live).unwrap().bounds().unwrap().min.x;
        assert!((left - (-1.5)).abs() < 1e-9);

        let deferred = unit_square(&mut scene);
        let mut proxy = scene.animate(deferred).unwrap();
        proxy.to_edge(RIGHT, 0.5);
        let (_, end) = proxy.resolve(scene.tree()).unwrap();
        assert!((end.bounds().unwrap().max.x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_grid_spacing_uses_scene_config() {
        let mut scene = Scene::with_config(narrow_config());
        let cell = unit_square(&mut scene);
        let grid = scene.tree_mut().get_grid(cell, 1, 2, 1.0).unwrap();
        let cells = scene.tree().children(grid).unwrap().to_vec();
        let a = scene.tree().snapshot(cells[0]).unwrap().bounds().unwrap();
        let b = scene.tree().snapshot(cells[1]).unwrap().bounds().unwrap();
        // Cells are one unit wide with a one unit gap, before scaling to height 1.
        assert!(((b.min.x - a.max.x) - a.width()).abs() < 1e-9);
    }

    #[test]
    fn test_scene_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Scene>();
    }
}
