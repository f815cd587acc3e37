/// Vertical stacking policy for one lane.
///
/// Two independent offsets exist: the join-time offset derived from lane
/// occupancy, and the move-time offset drawn from a running counter that
/// only ever grows.
#[derive(Clone, Copy, Debug)]
pub struct OffsetStacker {
    join_spacing: f64,
    move_step: f64,
    running_move: f64,
}

impl OffsetStacker {
    pub fn new(join_spacing: f64, move_step: f64) -> Self {
        Self {
            join_spacing,
            move_step,
            running_move: 0.0,
        }
    }

    /// Offset for a freshly loaded signal; `occupancy` counts the signal itself.
    pub fn join_offset(&self, occupancy: usize) -> f64 {
        self.join_spacing * occupancy as f64
    }

    /// Offset for a signal moved into this lane. Advances the counter.
    pub fn next_move_offset(&mut self) -> f64 {
        self.running_move += self.move_step;
        self.running_move
    }
}
