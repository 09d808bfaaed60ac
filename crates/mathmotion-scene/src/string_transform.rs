use tracing::debug;

use mathmotion_core::{Duration, Easing, ObjectId, SceneError, SceneResult};

use crate::animation::{Animation, AnimationKind, SceneEffect, Subject};
use crate::layout::TextGlyphs;
use crate::matching::{resolve_matches, MatchKind, MatchSet};
use crate::object::Snapshot;
use crate::ops::ObjectOps;
use crate::tree::ObjectTree;

/// Morph one text object into another, glyph fragment by glyph fragment.
///
/// Fragments the two texts share glide (along `path_arc`) onto their new
/// place; source-only fragments shrink and fade out; target-only fragments
/// grow and fade in. The source leaves the stage when the beat ends and the
/// target is on stage from the start, its matched glyphs hidden until the end.
#[derive(Debug, Clone)]
pub struct TransformMatchingStrings {
    source: ObjectId,
    target: ObjectId,
    matched_keys: Vec<String>,
    key_map: Vec<(String, String)>,
    path_arc: f64,
    run_time: Option<Duration>,
    easing: Easing,
}

impl TransformMatchingStrings {
    pub fn new(source: ObjectId, target: ObjectId) -> Self {
        Self {
            source,
            target,
            matched_keys: Vec::new(),
            key_map: Vec::new(),
            path_arc: 0.0,
            run_time: None,
            easing: Easing::default(),
        }
    }

    /// Substrings to pair up before the greedy pass, in order.
    pub fn matched_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matched_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Explicit substitutions, source key to target key, in order.
    pub fn key_map<I, A, B>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        self.key_map
            .extend(pairs.into_iter().map(|(a, b)| (a.into(), b.into())));
        self
    }

    pub fn path_arc(mut self, radians: f64) -> Self {
        self.path_arc = radians;
        self
    }

    pub fn run_time(mut self, seconds: f64) -> Self {
        self.run_time = Some(Duration::from_seconds(seconds));
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    fn texts(&self, tree: &ObjectTree) -> SceneResult<(TextGlyphs, TextGlyphs)> {
        if self.source == self.target {
            return Err(SceneError::InvalidArgument(
                "cannot match a text against itself".into(),
            ));
        }
        Ok((tree.text_glyphs(self.source)?, tree.text_glyphs(self.target)?))
    }

    /// The match set between the two texts' current contents.
    pub fn resolve(&self, tree: &ObjectTree) -> SceneResult<MatchSet> {
        let (source, target) = self.texts(tree)?;
        resolve_matches(&source.content, &target.content, &self.matched_keys, &self.key_map)
    }

    /// One animation per match that covers at least one glyph, plus a reveal
    /// of the target's matched glyphs that carries the stage effects.
    pub fn build(&self, tree: &ObjectTree) -> SceneResult<Vec<Animation>> {
        let (source, target) = self.texts(tree)?;
        let matches = resolve_matches(&source.content, &target.content, &self.matched_keys, &self.key_map)?;

        let mut animations = Vec::new();
        let mut revealed = Vec::new();
        for m in matches.iter() {
            let from = m.source.as_ref().map(|r| source.in_range(r)).unwrap_or_default();
            let to = m.target.as_ref().map(|r| target.in_range(r)).unwrap_or_default();
            match (m.kind, from.is_empty(), to.is_empty()) {
                (_, true, true) => {}
                (MatchKind::Matched | MatchKind::Remapped, false, false) => {
                    let start = pieces(tree, &from)?;
                    let end = start.aligned(&pieces(tree, &to)?);
                    animations.push(self.tune(Animation::new(
                        AnimationKind::MatchedPieces,
                        Subject::Pieces(from),
                        start,
                        end,
                    ))
                    .with_path_arc(self.path_arc));
                    revealed.extend(to);
                }
                (_, false, _) => {
                    let start = pieces(tree, &from)?;
                    let mut end = start.clone();
                    end.scale(0.0).set_opacity(0.0);
                    animations.push(self.tune(Animation::new(
                        AnimationKind::FadeOut,
                        Subject::Pieces(from),
                        start,
                        end,
                    )));
                    if !to.is_empty() {
                        animations.push(self.fade_in_pieces(tree, to)?);
                    }
                }
                (_, true, false) => animations.push(self.fade_in_pieces(tree, to)?),
            }
        }

        let end = pieces(tree, &revealed)?;
        let mut start = end.clone();
        start.for_each_mut(&mut |m| m.state.visible = false);
        animations.push(
            self.tune(Animation::new(
                AnimationKind::Reveal,
                Subject::Pieces(revealed),
                start,
                end,
            ))
            .with_effect(SceneEffect::AddOnStart(self.source))
            .with_effect(SceneEffect::AddOnStart(self.target))
            .with_effect(SceneEffect::RemoveOnFinish(self.source)),
        );

        debug!(
            source = %source.content,
            target = %target.content,
            animations = animations.len(),
            "built matching transform"
        );
        Ok(animations)
    }

    fn fade_in_pieces(&self, tree: &ObjectTree, ids: Vec<ObjectId>) -> SceneResult<Animation> {
        let end = pieces(tree, &ids)?;
        let mut start = end.clone();
        start.scale(0.0).set_opacity(0.0);
        Ok(self.tune(Animation::new(
            AnimationKind::FadeIn,
            Subject::Pieces(ids),
            start,
            end,
        )))
    }

    fn tune(&self, mut animation: Animation) -> Animation {
        animation.run_time = self.run_time;
        animation.with_easing(self.easing)
    }
}

/// Group snapshot of independent objects, children in `ids` order.
fn pieces(tree: &ObjectTree, ids: &[ObjectId]) -> SceneResult<Snapshot> {
    Ok(Snapshot::group(
        ids.iter()
            .map(|id| tree.snapshot(*id))
            .collect::<SceneResult<_>>()?,
    ))
}
