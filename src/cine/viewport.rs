use crate::cine::signal::Signal;

/// Scale applied by one zoom-in step.
pub const ZOOM_IN: f64 = 0.5;
/// Scale applied by one zoom-out step.
pub const ZOOM_OUT: f64 = 2.0;
/// Accumulated zoom is kept within `1/MAX_ZOOM..=MAX_ZOOM`.
pub const MAX_ZOOM: f64 = 1024.0;
/// Number of pages a lane extent is split into when scrolling.
pub const PAGE_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Visible x/y window of a lane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRange {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewRange {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            x_min: x.0,
            x_max: x.1,
            y_min: y.0,
            y_max: y.1,
        }
    }

    pub fn x(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn y(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    /// Scales both spans about the center. Factors below one zoom in.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |(lo, hi): (f64, f64)| {
            let center = (lo + hi) / 2.0;
            let half = (hi - lo) / 2.0 * factor;
            (center - half, center + half)
        };
        Self::new(scale(self.x()), scale(self.y()))
    }

    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            (self.x_min + dx, self.x_max + dx),
            (self.y_min + dy, self.y_max + dy),
        )
    }
}

/// Page `page` of [`PAGE_COUNT`] equal slices of `extent`, counted from the
/// upper end: page 0 holds the newest samples, the last page the oldest.
pub fn page_range((lo, hi): (f64, f64), page: usize) -> (f64, f64) {
    let page = page.min(PAGE_COUNT - 1);
    let size = (hi - lo) / PAGE_COUNT as f64;
    let top = hi - size * page as f64;
    (top - size, top)
}

/// User zoom, pan and page choices layered over the range the player
/// computes for a lane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewAdjust {
    zoom: f64,
    pan: (f64, f64),
    x_page: Option<(f64, f64)>,
    y_page: Option<(f64, f64)>,
}

impl Default for ViewAdjust {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: (0.0, 0.0),
            x_page: None,
            y_page: None,
        }
    }
}

impl ViewAdjust {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(1.0 / MAX_ZOOM, MAX_ZOOM);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan = (self.pan.0 + dx, self.pan.1 + dy);
    }

    /// Pins one axis to `range`. Zoom and pan still apply on top.
    pub fn pin(&mut self, axis: Axis, range: (f64, f64)) {
        match axis {
            Axis::X => self.x_page = Some(range),
            Axis::Y => self.y_page = Some(range),
        }
    }

    pub fn apply(&self, base: ViewRange) -> ViewRange {
        let x = self.x_page.unwrap_or(base.x());
        let y = self.y_page.unwrap_or(base.y());
        let mut view = ViewRange::new(x, y);
        // unit zoom must leave the range bit-identical
        if self.zoom != 1.0 {
            view = view.scaled(self.zoom);
        }
        view.shifted(self.pan.0, self.pan.1)
    }
}

/// Computes lane view ranges from reveal cursors and sample extents.
#[derive(Clone, Copy, Debug)]
pub struct ViewportWindower {
    window: usize,
    y_padding: f64,
}

impl ViewportWindower {
    pub fn new(window: usize, y_padding: f64) -> Self {
        Self { window, y_padding }
    }

    /// X window for a reveal tick at cursor `at` (value before increment).
    ///
    /// Past the first `window` samples the range rolls along the series.
    /// Before that it is anchored at zero and reaches `time[window]`, clamped
    /// to the last available sample for short series.
    pub fn reveal_x_range(&self, time: &[f64], at: usize) -> (f64, f64) {
        let Some(last) = time.len().checked_sub(1) else {
            return (0.0, 0.0);
        };
        let at = at.min(last);
        if at > self.window {
            (time[at - self.window], time[at])
        } else {
            (0.0, time[self.window.min(last)])
        }
    }

    /// Padded y extrema over every displayed point of the given signals.
    pub fn lane_y_range<'a>(
        &self,
        signals: impl IntoIterator<Item = &'a Signal>,
    ) -> Option<(f64, f64)> {
        let (min, max) = signals
            .into_iter()
            .flat_map(|s| s.displayed().1.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        if min > max {
            return None;
        }
        Some((min - self.y_padding, max + self.y_padding))
    }

    /// Min and max x over every displayed point of the given signals.
    pub fn lane_x_extent<'a>(
        &self,
        signals: impl IntoIterator<Item = &'a Signal>,
    ) -> Option<(f64, f64)> {
        let (min, max) = signals
            .into_iter()
            .flat_map(|s| s.displayed().0.iter().copied())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        (min <= max).then_some((min, max))
    }
}
