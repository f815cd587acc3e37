use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use log::info;
use plotters::prelude::*;
use serde::Serialize;

use crate::cine::{CineError, LaneFrame, LaneId, StatisticsTable, ViewRange};

pub const REPORT_TITLE: &str = "Patient Biosignals Analysis and Statistical Summary";

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Caption, axis labels and legend. Needs a system font.
    pub show_text: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, CYAN, MAGENTA, YELLOW, WHITE],
            show_text: true,
        }
    }
}

impl PlotStyle {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Draws what a lane currently shows, clipped to its view range.
pub fn render_lane_png(
    frame: &LaneFrame,
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, CineError> {
    let view = frame.view.unwrap_or_else(|| fallback_view(frame));
    let (x_min, x_max) = widen(view.x());
    let (y_min, y_max) = widen(view.y());
    let mut buffer = vec![0u8; style.width as usize * style.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.show_text {
            builder
                .caption(caption, ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 45)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        {
            let mut mesh = chart.configure_mesh();
            mesh.light_line_style(&WHITE.mix(0.1));
            if style.show_text {
                mesh.x_desc("Time").y_desc("Amplitude");
            } else {
                mesh.x_labels(0).y_labels(0);
            }
            mesh.draw()?;
        }
        for (idx, trace) in frame.traces.iter().enumerate() {
            let color = match style.palette.len() {
                0 => WHITE,
                n => style.palette[idx % n],
            };
            let points = trace
                .points
                .iter()
                .filter(|p| p[0] >= x_min && p[0] <= x_max)
                .map(|p| (p[0], p[1].clamp(y_min, y_max)));
            chart
                .draw_series(LineSeries::new(points, &color))?
                .label(trace.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        if style.show_text && !frame.traces.is_empty() {
            chart
                .configure_series_labels()
                .border_style(&WHITE.mix(0.2))
                .background_style(&style.background)
                .draw()?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn fallback_view(frame: &LaneFrame) -> ViewRange {
    let (mut x, mut y) = ((f64::INFINITY, f64::NEG_INFINITY), (f64::INFINITY, f64::NEG_INFINITY));
    for p in frame.traces.iter().flat_map(|t| t.points.iter()) {
        x = (x.0.min(p[0]), x.1.max(p[0]));
        y = (y.0.min(p[1]), y.1.max(p[1]));
    }
    if x.0 > x.1 {
        return ViewRange::new((0.0, 1.0), (-1.0, 1.0));
    }
    ViewRange::new(x, y)
}

// plotters rejects empty ranges
fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi - lo > f64::EPSILON {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CineError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| CineError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

/// A rendered lane plus the statistics captured with it.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub file_name: String,
    pub lane: LaneId,
    pub png: Vec<u8>,
    pub statistics: StatisticsTable,
}

#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    title: &'a str,
    pages: Vec<ReportPage<'a>>,
}

#[derive(Debug, Serialize)]
struct ReportPage<'a> {
    image: &'a str,
    lane: LaneId,
    statistics: Vec<Vec<String>>,
}

/// Queues lane snapshots and writes them out as a report.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    style: PlotStyle,
    snapshots: Vec<Snapshot>,
    exports: u32,
}

impl ReportBuilder {
    pub fn new(style: PlotStyle) -> Self {
        Self {
            style,
            snapshots: Vec::new(),
            exports: 0,
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Renders `frame` and queues it as `snapshot_{L|R}{n}.png`, where `n`
    /// counts snapshots already queued.
    pub fn take_snapshot(
        &mut self,
        lane: LaneId,
        frame: &LaneFrame,
        statistics: StatisticsTable,
    ) -> Result<&Snapshot, CineError> {
        let file_name = format!("snapshot_{}{}.png", lane.tag(), self.snapshots.len());
        let caption = format!("{} lane", capitalize(&lane.to_string()));
        let png = render_lane_png(frame, &caption, &self.style)?;
        info!("queued {file_name} ({} bytes)", png.len());
        self.snapshots.push(Snapshot {
            file_name,
            lane,
            png,
            statistics,
        });
        Ok(&self.snapshots[self.snapshots.len() - 1])
    }

    /// Writes queued images and `BioSignal Report{k}.json` into `dir`, then
    /// empties the queue. Returns the document path.
    pub fn export(&mut self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report directory {:?}", dir))?;
        for snapshot in &self.snapshots {
            let path = dir.join(&snapshot.file_name);
            std::fs::write(&path, &snapshot.png)
                .with_context(|| format!("failed to write snapshot {:?}", path))?;
        }
        let document = ReportDocument {
            title: REPORT_TITLE,
            pages: self
                .snapshots
                .iter()
                .map(|s| ReportPage {
                    image: &s.file_name,
                    lane: s.lane,
                    statistics: s.statistics.grid(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&document).context("failed to serialize report")?;
        let path = dir.join(format!("BioSignal Report{}.json", self.exports + 1));
        std::fs::write(&path, json).with_context(|| format!("failed to write report {:?}", path))?;
        self.exports += 1;
        info!(
            "exported {} snapshot(s) to {}",
            self.snapshots.len(),
            path.display()
        );
        self.snapshots.clear();
        Ok(path)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
