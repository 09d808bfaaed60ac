use std::sync::{Arc, Mutex};

use mathmotion_core::{ContentHash, Timestamp};

use crate::object::Snapshot;

/// One stage state handed to the renderer.
#[derive(Debug, Clone)]
pub struct Sample {
    pub timestamp: Timestamp,
    /// Beat that produced every change since the previous sample.
    pub beat: usize,
    pub stage: Snapshot,
    /// SHA-256 of the serialized stage, for cheap change detection.
    pub fingerprint: ContentHash,
}

/// Consumer of the sample stream. Timestamps arrive strictly increasing.
pub trait SampleSink {
    fn sample(&mut self, sample: &Sample);
}

/// Discards every sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn sample(&mut self, _sample: &Sample) {}
}

/// Keeps every sample. Clones share storage, so a clone kept by the caller
/// can read what the scene recorded.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SampleSink for RecordingSink {
    fn sample(&mut self, sample: &Sample) {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sample.clone());
    }
}
