use serde::Serialize;

use crate::cine::error::CineError;
use crate::cine::signal::{LaneId, SampleSeries};

/// Columns beyond this count switch the grid to its compact layout.
const FULL_LAYOUT_MAX_SIGNALS: usize = 8;

/// Summary of one signal's original (un-offset) series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SignalStatistics {
    pub name: String,
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
    pub duration: f64,
}

impl SignalStatistics {
    /// Values are rounded to three decimals. Sample standard deviation needs
    /// at least two samples.
    pub fn compute(name: &str, series: &SampleSeries) -> Result<Self, CineError> {
        let amplitude = series.amplitude();
        let n = amplitude.len();
        if n < 2 {
            return Err(CineError::StatisticsUndefined {
                name: name.to_owned(),
                samples: n,
            });
        }
        let mean = amplitude.iter().sum::<f64>() / n as f64;
        let variance = amplitude
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        let max = amplitude.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = amplitude.iter().copied().fold(f64::INFINITY, f64::min);
        let duration = series
            .time()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(Self {
            name: name.to_owned(),
            mean: round3(mean),
            std_dev: round3(variance.sqrt()),
            max: round3(max),
            min: round3(min),
            duration: round3(duration),
        })
    }
}

/// Statistics of every member of a lane, in display order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatisticsTable {
    pub lane: LaneId,
    pub rows: Vec<SignalStatistics>,
}

impl StatisticsTable {
    pub fn compute<'a>(
        lane: LaneId,
        members: impl IntoIterator<Item = (&'a str, &'a SampleSeries)>,
    ) -> Result<Self, CineError> {
        let rows = members
            .into_iter()
            .map(|(name, series)| SignalStatistics::compute(name, series))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lane, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Report grid: a heading row of signal names followed by one row per
    /// statistic. Wide tables use numbered headings and a short `STD` label.
    pub fn grid(&self) -> Vec<Vec<String>> {
        let compact = self.rows.len() > FULL_LAYOUT_MAX_SIGNALS;
        let mut heading = vec![String::new()];
        if compact {
            heading.extend((1..=self.rows.len()).map(|n| n.to_string()));
        } else {
            heading.extend(self.rows.iter().map(|r| r.name.clone()));
        }
        let std_label = if compact { "STD" } else { "Standard Deviation" };
        vec![
            heading,
            self.stat_row("Mean", |r| r.mean),
            self.stat_row(std_label, |r| r.std_dev),
            self.stat_row("Max", |r| r.max),
            self.stat_row("Min", |r| r.min),
            self.stat_row("Duration", |r| r.duration),
        ]
    }

    fn stat_row(&self, label: &str, pick: impl Fn(&SignalStatistics) -> f64) -> Vec<String> {
        let mut cells = vec![label.to_owned()];
        cells.extend(self.rows.iter().map(|r| format_value(pick(r))));
        cells
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn format_value(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_rounded_summary() {
        let series =
            SampleSeries::new(vec![0.0, 0.5, 1.0, 1.5], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let stats = SignalStatistics::compute("ECG", &series).unwrap();
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.std_dev, 1.291);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.duration, 1.5);
    }

    #[test]
    fn single_sample_is_reported_not_panicked() {
        let series = SampleSeries::new(vec![0.0], vec![1.0]).unwrap();
        let err = SignalStatistics::compute("tiny", &series).unwrap_err();
        assert!(matches!(
            err,
            CineError::StatisticsUndefined { ref name, samples: 1 } if name == "tiny"
        ));
    }

    #[test]
    fn grid_layouts() {
        let series = SampleSeries::new(vec![0.0, 1.0], vec![0.0, 2.0]).unwrap();
        let table = StatisticsTable::compute(LaneId::Left, [("A", &series), ("B", &series)])
            .unwrap();
        let grid = table.grid();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0], vec!["", "A", "B"]);
        assert_eq!(grid[1], vec!["Mean", "1", "1"]);
        assert_eq!(grid[2][0], "Standard Deviation");

        let names: Vec<String> = (0..9).map(|i| format!("S{i}")).collect();
        let wide = StatisticsTable::compute(
            LaneId::Right,
            names.iter().map(|n| (n.as_str(), &series)),
        )
        .unwrap();
        let grid = wide.grid();
        assert_eq!(grid[0].len(), 10);
        assert_eq!(grid[0][1], "1");
        assert_eq!(grid[0][9], "9");
        assert_eq!(grid[2][0], "STD");
    }
}
