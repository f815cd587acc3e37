/// Numeric knobs of the rewind animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewindSettings {
    /// Right edge of the view when the animation starts.
    pub initial: f64,
    /// Growth of the right edge per tick.
    pub step: f64,
    /// Right-edge position after which the left edge starts sliding too.
    pub slide_threshold: f64,
}

impl Default for RewindSettings {
    fn default() -> Self {
        Self {
            initial: 0.001,
            step: 0.001,
            slide_threshold: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RewindFrame {
    /// New x window to apply to the lane.
    Window { x_min: f64, x_max: f64 },
    /// The right edge reached the lane's full extent.
    Done,
}

/// Replays the x-axis growth of a finished lane from a minimal span up to
/// its full extent. Only the view window animates; data stays put.
#[derive(Clone, Debug)]
pub struct RewindAnimator {
    min_x: f64,
    target: f64,
    progress: f64,
    slide: f64,
    settings: RewindSettings,
}

impl RewindAnimator {
    pub fn new(min_x: f64, target: f64, settings: RewindSettings) -> Self {
        Self {
            min_x,
            target,
            progress: settings.initial,
            slide: 0.0,
            settings,
        }
    }

    /// Window applied when the rewind begins.
    pub fn opening_window(&self) -> (f64, f64) {
        (0.0, self.settings.initial)
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn step(&mut self) -> RewindFrame {
        if self.progress >= self.target {
            self.progress = 0.0;
            return RewindFrame::Done;
        }
        self.progress += self.settings.step;
        if self.progress < self.settings.slide_threshold {
            RewindFrame::Window {
                x_min: self.min_x,
                x_max: self.progress,
            }
        } else {
            self.slide += self.settings.step;
            RewindFrame::Window {
                x_min: self.min_x + self.slide,
                x_max: self.progress,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(animator: &mut RewindAnimator) -> Vec<(f64, f64)> {
        let mut frames = Vec::new();
        while let RewindFrame::Window { x_min, x_max } = animator.step() {
            frames.push((x_min, x_max));
            assert!(frames.len() < 100_000, "rewind never terminated");
        }
        frames
    }

    #[test]
    fn grows_then_slides() {
        let mut animator = RewindAnimator::new(0.0, 0.1, RewindSettings::default());
        assert_eq!(animator.opening_window(), (0.0, 0.001));
        let frames = run(&mut animator);

        let (first_min, first_max) = frames[0];
        assert_eq!(first_min, 0.0);
        assert!((first_max - 0.002).abs() < 1e-9);

        // growth phase pins the left edge
        assert!(frames
            .iter()
            .filter(|(_, hi)| *hi < 0.049)
            .all(|(lo, _)| *lo == 0.0));
        // slide phase moves both edges by the same step
        let sliding: Vec<_> = frames.iter().filter(|(lo, _)| *lo > 0.0).collect();
        assert!(!sliding.is_empty());
        for pair in sliding.windows(2) {
            let d_lo = pair[1].0 - pair[0].0;
            let d_hi = pair[1].1 - pair[0].1;
            assert!((d_lo - 0.001).abs() < 1e-9);
            assert!((d_hi - 0.001).abs() < 1e-9);
        }
        let last = frames.last().unwrap();
        assert!(last.1 >= 0.1 - 1e-9 && last.1 < 0.1 + 0.002);
        assert_eq!(animator.progress(), 0.0);
    }

    #[test]
    fn finishes_immediately_when_target_is_tiny() {
        let mut animator = RewindAnimator::new(0.0, 0.0005, RewindSettings::default());
        assert_eq!(animator.step(), RewindFrame::Done);
    }
}
