//! Library half of the `mathmotion` binary: the demonstration scenes and the
//! registry the CLI looks them up in.

pub mod scenes;

pub use scenes::{all_scenes, find_scene};
