//! # mathmotion-scene
//!
//! The scene model of mathmotion: an arena tree of drawable objects, the
//! animations that interpolate between their states, and the timeline that
//! plays animations in beats and hands sampled state to a sink.
//!
//! Scene code declares objects, stages them, and plays beats:
//!
//! ```ignore
//! let mut scene = Scene::new();
//! let square = ShapeBuilder::square(2.0).build(scene.tree_mut());
//! scene.add(&[square])?;
//! let mut proxy = scene.animate(square)?;
//! proxy.shift(RIGHT).rotate(PI / 4.0);
//! scene.play([proxy.build(scene.tree())?])?;
//! ```

pub mod animation;
pub mod builder;
pub mod deferred;
pub mod layout;
pub mod matching;
pub mod object;
pub mod ops;
pub mod scene;
pub mod sink;
pub mod string_transform;
pub mod timeline;
pub mod tree;
pub mod validate;

pub use animation::{lagged_start, Animation, AnimationKind, Fade, SceneEffect, Subject};
pub use builder::ShapeBuilder;
pub use deferred::Deferred;
pub use layout::{GlyphLayout, GlyphOutline, MonospaceLayout, TextGlyphs};
pub use matching::{resolve_matches, Match, MatchKind, MatchSet};
pub use object::{ObjectState, Snapshot, Style};
pub use ops::ObjectOps;
pub use scene::{AbortHandle, CompletionStatus, Construct, Scene};
pub use sink::{NullSink, RecordingSink, Sample, SampleSink};
pub use string_transform::TransformMatchingStrings;
pub use timeline::{BeatKind, BeatRecord, Timeline, TimelineState};
pub use tree::{ObjectMut, ObjectNode, ObjectTree};
pub use validate::validate_tree;
