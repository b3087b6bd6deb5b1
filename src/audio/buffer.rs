use std::collections::VecDeque;

/// Reassembles capture chunks into fixed-size analysis frames.
///
/// The capture callback delivers whatever chunk size the device driver
/// favors; the estimator wants exactly `frame_size` samples per tick.
/// Samples queue here in arrival order and leave as complete frames.
pub struct FrameAssembler {
    pending: VecDeque<f32>,
    frame_size: usize,
}

impl FrameAssembler {
    pub fn new(frame_size: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(frame_size * 2),
            frame_size,
        }
    }

    /// Queue captured samples.
    pub fn push(&mut self, samples: &[f32]) {
        self.pending.extend(samples.iter().copied());
    }

    /// Take the next complete frame, if one has accumulated.
    pub fn next_frame(&mut self) -> Option<Vec<f32>> {
        if self.pending.len() < self.frame_size {
            return None;
        }
        Some(self.pending.drain(..self.frame_size).collect())
    }

    /// Samples queued but not yet framed.
    #[allow(dead_code)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop queued samples, e.g. when capture restarts.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
