use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity of an object in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Eight hex digits are plenty to tell objects apart in logs.
        write!(f, "obj-{}", &self.0.simple().to_string()[..8])
    }
}

/// The kind of visual primitive an object is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A container with no geometry of its own.
    Group,
    /// A stroked and/or filled polyline.
    Path,
    /// A laid-out string; its children are glyphs.
    Text,
    /// One glyph of a text object, remembering the char index it was laid out from.
    Glyph { index: usize },
}

impl ObjectKind {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            ObjectKind::Group => Capabilities {
                drawable: false,
                textual: false,
                groupable: true,
            },
            ObjectKind::Path => Capabilities {
                drawable: true,
                textual: false,
                groupable: true,
            },
            ObjectKind::Text => Capabilities {
                drawable: false,
                textual: true,
                groupable: true,
            },
            ObjectKind::Glyph { .. } => Capabilities {
                drawable: true,
                textual: true,
                groupable: false,
            },
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Group => write!(f, "group"),
            ObjectKind::Path => write!(f, "path"),
            ObjectKind::Text => write!(f, "text"),
            ObjectKind::Glyph { index } => write!(f, "glyph[{}]", index),
        }
    }
}

/// What an object of a given kind can take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Carries its own points and is sampled by the renderer.
    pub drawable: bool,
    /// Participates in string matching.
    pub textual: bool,
    /// May own children.
    pub groupable: bool,
}

/// Rate function mapping normalized time to animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Smoothstep; the default for scene animations.
    #[default]
    Smooth,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Easing {
    /// Apply the easing function to a normalized time value t in [0, 1].
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smooth => t * t * (3.0 - 2.0 * t),
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let t1 = t - 1.0;
                t1 * t1 * t1 + 1.0
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let t1 = 2.0 * t - 2.0;
                    0.5 * t1 * t1 * t1 + 1.0
                }
            }
        }
    }
}
