use std::ops::Range;

/// Outcome of advancing a [`RevealCursor`] by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealStep {
    /// Sample `at` became visible; everything in `0..=at` is now revealed.
    Revealed { at: usize },
    /// The cursor already sits at the end of the series.
    Exhausted,
}

/// Per-signal index that drives progressive reveal.
///
/// Invariant: `0 <= position <= len`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealCursor {
    position: usize,
    len: usize,
}

impl RevealCursor {
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.len
    }

    /// Range of sample indices currently visible.
    pub fn revealed(&self) -> Range<usize> {
        0..self.position
    }

    pub fn advance(&mut self) -> RevealStep {
        if self.position < self.len {
            let at = self.position;
            self.position += 1;
            RevealStep::Revealed { at }
        } else {
            RevealStep::Exhausted
        }
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}
