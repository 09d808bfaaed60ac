use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use mathmotion_core::{hash_value, Duration, ObjectId, SceneConfig, SceneError, SceneResult, Timestamp};

use crate::animation::{Animation, SceneEffect};
use crate::sink::{Sample, SampleSink};
use crate::tree::ObjectTree;

/// Lifecycle of a timeline. `Running` only holds while a beat executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineState {
    Idle,
    Running { beat: usize },
    Failed { beat: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatKind {
    Play,
    Wait,
}

/// A completed beat. Holds no object references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatRecord {
    pub index: usize,
    pub kind: BeatKind,
    pub start: Timestamp,
    pub duration: Duration,
    pub animations: usize,
}

impl BeatRecord {
    pub fn end(&self) -> Timestamp {
        self.start + self.duration
    }
}

/// Everything a beat reads and writes.
pub struct Stage<'a> {
    pub tree: &'a mut ObjectTree,
    /// Group whose family is what the renderer sees.
    pub root: ObjectId,
    pub config: &'a SceneConfig,
    pub sink: &'a mut dyn SampleSink,
}

/// Sequencer for beats on one logical clock.
///
/// Beats run one at a time, to completion, in submission order. A beat that
/// fails rolls the tree back to its state at the beat's start and leaves the
/// timeline `Failed` until [`Timeline::reset`].
#[derive(Debug, Clone)]
pub struct Timeline {
    state: TimelineState,
    clock: Timestamp,
    history: Vec<BeatRecord>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            state: TimelineState::Idle,
            clock: Timestamp::zero(),
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn history(&self) -> &[BeatRecord] {
        &self.history
    }

    /// Index the next submitted beat will get.
    pub fn next_beat(&self) -> usize {
        self.history.len()
    }

    /// Leave the `Failed` state. Clock and history are kept.
    pub fn reset(&mut self) {
        self.state = TimelineState::Idle;
    }

    /// Run `animations` as one beat.
    ///
    /// The beat lasts as long as its longest animation; an animation without
    /// its own run time lasts `duration`, or the configured default.
    pub fn play(
        &mut self,
        stage: Stage<'_>,
        animations: &[Animation],
        duration: Option<Duration>,
    ) -> SceneResult<&BeatRecord> {
        let base = duration.unwrap_or_else(|| stage.config.default_run_time());
        let length = if animations.is_empty() {
            base
        } else {
            animations
                .iter()
                .map(|a| a.run_time.unwrap_or(base))
                .fold(Duration::zero(), Duration::max)
        };
        self.run_beat(BeatKind::Play, stage, animations, length)
    }

    /// Run an empty beat that only advances the clock.
    pub fn wait(&mut self, stage: Stage<'_>, duration: Option<Duration>) -> SceneResult<&BeatRecord> {
        let length = duration.unwrap_or_else(|| stage.config.default_wait());
        self.run_beat(BeatKind::Wait, stage, &[], length)
    }

    fn run_beat(
        &mut self,
        kind: BeatKind,
        mut stage: Stage<'_>,
        animations: &[Animation],
        duration: Duration,
    ) -> SceneResult<&BeatRecord> {
        if let TimelineState::Failed { beat } = self.state {
            return Err(SceneError::TimelineNotIdle { beat });
        }
        let index = self.history.len();
        self.state = TimelineState::Running { beat: index };
        debug!(
            beat = index,
            kind = ?kind,
            duration = %duration,
            animations = animations.len(),
            "beat started"
        );

        let checkpoint = stage.tree.clone();
        match self.execute(index, &mut stage, animations, duration) {
            Ok(samples) => {
                for sample in &samples {
                    stage.sink.sample(sample);
                }
                let record = BeatRecord {
                    index,
                    kind,
                    start: self.clock,
                    duration,
                    animations: animations.len(),
                };
                self.clock = record.end();
                self.state = TimelineState::Idle;
                debug!(beat = index, clock = %self.clock, samples = samples.len(), "beat finished");
                self.history.push(record);
                Ok(&self.history[index])
            }
            Err(err) => {
                *stage.tree = checkpoint;
                self.state = TimelineState::Failed { beat: index };
                error!(beat = index, error = %err, "beat failed; tree rolled back");
                Err(SceneError::in_beat(index, err))
            }
        }
    }

    /// Evaluate a beat against the tree, returning the samples it produced.
    /// Samples are only handed to the sink once the whole beat succeeded.
    fn execute(
        &self,
        index: usize,
        stage: &mut Stage<'_>,
        animations: &[Animation],
        duration: Duration,
    ) -> SceneResult<Vec<Sample>> {
        let space = stage.config.color_space;
        for animation in animations {
            animation.check(stage.tree)?;
        }
        for animation in animations {
            for effect in &animation.effects {
                if let SceneEffect::AddOnStart(id) = effect {
                    attach(stage, *id)?;
                }
            }
        }

        let count = duration.sample_count(stage.config.timing.sample_rate);
        if count == 0 {
            for animation in animations {
                animation.apply(stage.tree, 1.0, space)?;
            }
            finish(stage, animations)?;
            return Ok(Vec::new());
        }

        let mut samples = Vec::with_capacity(count as usize);
        for k in 1..=count {
            let t = k as f64 / count as f64;
            for animation in animations {
                animation.apply(stage.tree, t, space)?;
            }
            if k == count {
                finish(stage, animations)?;
            }
            let snapshot = stage.tree.snapshot(stage.root)?;
            samples.push(Sample {
                timestamp: self.clock + duration * t,
                beat: index,
                fingerprint: hash_value(&snapshot)?,
                stage: snapshot,
            });
        }
        Ok(samples)
    }
}

fn attach(stage: &mut Stage<'_>, id: ObjectId) -> SceneResult<()> {
    if id != stage.root && stage.tree.parent(id)?.is_none() {
        stage.tree.add_child(stage.root, id)?;
    }
    Ok(())
}

/// Take `id` off stage wherever it sits in the stage's family.
fn detach(stage: &mut Stage<'_>, id: ObjectId) -> SceneResult<()> {
    if let Some(parent) = stage.tree.parent(id)? {
        if stage.tree.is_ancestor(stage.root, parent) {
            stage.tree.remove_child(parent, id)?;
        }
    }
    Ok(())
}

fn finish(stage: &mut Stage<'_>, animations: &[Animation]) -> SceneResult<()> {
    for animation in animations {
        for effect in &animation.effects {
            match effect {
                SceneEffect::AddOnFinish(id) => attach(stage, *id)?,
                SceneEffect::RemoveOnFinish(id) => detach(stage, *id)?,
                SceneEffect::AddOnStart(_) => {}
            }
        }
    }
    Ok(())
}
