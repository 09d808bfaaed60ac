use serde::{Deserialize, Serialize};

use mathmotion_core::math::Point3;
use mathmotion_core::{ColorSpace, Duration, Easing, ObjectId, SceneError, SceneResult};

use crate::object::Snapshot;
use crate::ops::ObjectOps;
use crate::tree::ObjectTree;

/// What an animation writes its interpolated state into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Subject {
    /// A whole object family.
    Object(ObjectId),
    /// Independent objects animated as one; the snapshots are groups whose
    /// children line up with these ids.
    Pieces(Vec<ObjectId>),
}

impl Subject {
    pub fn ids(&self) -> Vec<ObjectId> {
        match self {
            Subject::Object(id) => vec![*id],
            Subject::Pieces(ids) => ids.clone(),
        }
    }
}

/// Stage membership changes attached to an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEffect {
    /// Put the object on stage when the beat begins, if it is not attached anywhere.
    AddOnStart(ObjectId),
    /// Put the object on stage once the beat completes.
    AddOnFinish(ObjectId),
    /// Take the object off stage once the beat completes.
    RemoveOnFinish(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    Transform,
    FadeIn,
    FadeOut,
    Create,
    /// Matched or remapped text fragments gliding into place.
    MatchedPieces,
    /// Discrete switch that makes objects visible at the end of the beat.
    Reveal,
}

impl std::fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimationKind::Transform => write!(f, "transform"),
            AnimationKind::FadeIn => write!(f, "fade_in"),
            AnimationKind::FadeOut => write!(f, "fade_out"),
            AnimationKind::Create => write!(f, "create"),
            AnimationKind::MatchedPieces => write!(f, "matched_pieces"),
            AnimationKind::Reveal => write!(f, "reveal"),
        }
    }
}

/// Offset and scale a fade starts from (fade in) or ends at (fade out).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub shift: Point3,
    pub scale: f64,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            shift: Point3::zero(),
            scale: 1.0,
        }
    }
}

impl Fade {
    pub fn shift(shift: Point3) -> Self {
        Self {
            shift,
            ..Self::default()
        }
    }

    pub fn scale(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }
}

/// Interpolation of a subject from a start state to an end state.
///
/// The animation refers to its subject by id and never owns it. Progress is
/// the beat's normalized time, remapped through `window` so animations can
/// start late or finish early inside a beat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    pub kind: AnimationKind,
    pub subject: Subject,
    pub start: Snapshot,
    pub end: Snapshot,
    /// Overrides the beat's run time when longer.
    pub run_time: Option<Duration>,
    pub easing: Easing,
    /// Arc (radians) points travel along; zero is a straight line.
    pub path_arc: f64,
    /// Color blending space; the scene's configured space when unset.
    pub color_space: Option<ColorSpace>,
    /// Slice of the beat, in normalized time, during which this animation runs.
    pub window: (f64, f64),
    pub effects: Vec<SceneEffect>,
}

impl Animation {
    /// Build an animation without checking that `start` and `end` are
    /// compatible. Evaluation fails with `IncompatibleShape` if they are not.
    pub fn new(kind: AnimationKind, subject: Subject, start: Snapshot, end: Snapshot) -> Self {
        Self {
            kind,
            subject,
            start,
            end,
            run_time: None,
            easing: Easing::Smooth,
            path_arc: 0.0,
            color_space: None,
            window: (0.0, 1.0),
            effects: Vec::new(),
        }
    }

    /// Morph `source` into the current state of `target`. Both families must
    /// have the same structure.
    pub fn transform(tree: &ObjectTree, source: ObjectId, target: ObjectId) -> SceneResult<Self> {
        let start = tree.snapshot(source)?;
        let end = tree.snapshot(target)?;
        start.check_compatible(&end)?;
        Ok(Self::new(
            AnimationKind::Transform,
            Subject::Object(source),
            start,
            end,
        ))
    }

    /// Like [`Animation::transform`], then swap `source` for `target` on stage.
    pub fn replacement_transform(
        tree: &ObjectTree,
        source: ObjectId,
        target: ObjectId,
    ) -> SceneResult<Self> {
        Ok(Self::transform(tree, source, target)?
            .with_effect(SceneEffect::RemoveOnFinish(source))
            .with_effect(SceneEffect::AddOnFinish(target)))
    }

    /// Fade `id` in from transparent, starting offset by `-fade.shift` and
    /// scaled by `fade.scale`.
    pub fn fade_in(tree: &ObjectTree, id: ObjectId, fade: Fade) -> SceneResult<Self> {
        let end = tree.snapshot(id)?;
        let mut start = end.clone();
        start
            .shift(-fade.shift)
            .scale(fade.scale)
            .set_opacity(0.0);
        Ok(Self::new(AnimationKind::FadeIn, Subject::Object(id), start, end)
            .with_effect(SceneEffect::AddOnStart(id)))
    }

    /// Fade `id` out to transparent, drifting by `fade.shift` and ending
    /// scaled by `fade.scale`, then take it off stage.
    pub fn fade_out(tree: &ObjectTree, id: ObjectId, fade: Fade) -> SceneResult<Self> {
        let start = tree.snapshot(id)?;
        let mut end = start.clone();
        end.shift(fade.shift).scale(fade.scale).set_opacity(0.0);
        Ok(Self::new(AnimationKind::FadeOut, Subject::Object(id), start, end)
            .with_effect(SceneEffect::RemoveOnFinish(id)))
    }

    /// Cross-fade: `source` fades out while moving onto `target`'s place and
    /// size, and `target` fades in from `source`'s place and size. The two
    /// families may differ in shape.
    pub fn fade_transform(
        tree: &ObjectTree,
        source: ObjectId,
        target: ObjectId,
    ) -> SceneResult<Vec<Self>> {
        let from = tree.snapshot(source)?;
        let to = tree.snapshot(target)?;
        let height = |s: &Snapshot| s.bounds().map_or(0.0, |b| b.height());

        let mut out_end = from.clone();
        out_end.move_to(to.center()).set_opacity(0.0);
        if height(&from) > 0.0 && height(&to) > 0.0 {
            out_end.set_height(height(&to));
        }
        let mut in_start = to.clone();
        in_start.move_to(from.center()).set_opacity(0.0);
        if height(&from) > 0.0 && height(&to) > 0.0 {
            in_start.set_height(height(&from));
        }

        Ok(vec![
            Self::new(AnimationKind::FadeOut, Subject::Object(source), from, out_end)
                .with_effect(SceneEffect::RemoveOnFinish(source)),
            Self::new(AnimationKind::FadeIn, Subject::Object(target), in_start, to)
                .with_effect(SceneEffect::AddOnStart(target)),
        ])
    }

    /// Draw `id`'s outline progressively from nothing.
    pub fn create(tree: &ObjectTree, id: ObjectId) -> SceneResult<Self> {
        let end = tree.snapshot(id)?;
        let mut start = end.clone();
        start.for_each_mut(&mut |m| m.state.draw_fraction = 0.0);
        Ok(Self::new(AnimationKind::Create, Subject::Object(id), start, end)
            .with_effect(SceneEffect::AddOnStart(id)))
    }

    pub fn with_run_time(mut self, seconds: f64) -> Self {
        self.run_time = Some(Duration::from_seconds(seconds));
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_path_arc(mut self, radians: f64) -> Self {
        self.path_arc = radians;
        self
    }

    pub fn with_color_space(mut self, space: ColorSpace) -> Self {
        self.color_space = Some(space);
        self
    }

    /// Restrict the animation to `[start, end]` of the beat (normalized).
    /// A non-finite start reads as 0 and a non-finite end as 1.
    pub fn with_window(mut self, start: f64, end: f64) -> Self {
        let start = if start.is_finite() { start.clamp(0.0, 1.0) } else { 0.0 };
        let end = if end.is_finite() { end.clamp(start, 1.0) } else { 1.0 };
        self.window = (start, end);
        self
    }

    pub fn with_effect(mut self, effect: SceneEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Map beat time `t` to this animation's own progress in [0, 1].
    pub fn local_progress(&self, t: f64) -> f64 {
        let (a, b) = self.window;
        if b - a <= f64::EPSILON {
            return if t >= b { 1.0 } else { 0.0 };
        }
        ((t - a) / (b - a)).clamp(0.0, 1.0)
    }

    /// State of the subject at beat time `t`. Exactly `start` at or before the
    /// window opens, exactly `end` once it closes.
    pub fn interpolate(&self, t: f64, default_space: ColorSpace) -> SceneResult<Snapshot> {
        self.start.check_compatible(&self.end)?;
        let local = self.local_progress(t);
        if local <= 0.0 {
            return Ok(self.start.clone());
        }
        if local >= 1.0 {
            return Ok(self.end.clone());
        }
        self.start.interpolate(
            &self.end,
            self.easing.apply(local),
            self.path_arc,
            self.color_space.unwrap_or(default_space),
        )
    }

    /// Validate against the live tree: states must be compatible and the
    /// subject and every effect target must exist with the snapshot's shape.
    pub fn check(&self, tree: &ObjectTree) -> SceneResult<()> {
        self.start.check_compatible(&self.end)?;
        match &self.subject {
            Subject::Object(id) => tree.check_structure(*id, &self.start)?,
            Subject::Pieces(ids) => {
                if ids.len() != self.start.children.len() {
                    return Err(SceneError::incompatible(format!(
                        "{} pieces but {} piece states",
                        ids.len(),
                        self.start.children.len()
                    )));
                }
                for (id, piece) in ids.iter().zip(&self.start.children) {
                    tree.check_structure(*id, piece)?;
                }
            }
        }
        for effect in &self.effects {
            let (SceneEffect::AddOnStart(id)
            | SceneEffect::AddOnFinish(id)
            | SceneEffect::RemoveOnFinish(id)) = effect;
            tree.get(*id)?;
        }
        Ok(())
    }

    /// Write the state at beat time `t` into the tree.
    pub fn apply(&self, tree: &mut ObjectTree, t: f64, default_space: ColorSpace) -> SceneResult<()> {
        let state = self.interpolate(t, default_space)?;
        match &self.subject {
            Subject::Object(id) => tree.restore(*id, &state),
            Subject::Pieces(ids) => ids
                .iter()
                .zip(&state.children)
                .try_for_each(|(id, piece)| tree.restore(*id, piece)),
        }
    }
}

/// Stagger `animations` inside one beat, each starting `lag_ratio` of an
/// animation's length after the previous one.
pub fn lagged_start(animations: Vec<Animation>, lag_ratio: f64) -> Vec<Animation> {
    let n = animations.len();
    if n == 0 {
        return animations;
    }
    let lag = if lag_ratio.is_finite() { lag_ratio.max(0.0) } else { 0.0 };
    let total = (n - 1) as f64 * lag + 1.0;
    animations
        .into_iter()
        .enumerate()
        .map(|(i, anim)| {
            let begin = i as f64 * lag;
            anim.with_window(begin / total, (begin + 1.0) / total)
        })
        .collect()
}
