// src/gui.rs
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Instant;

use biosignal_cine::cine::{
    Axis, CanvasSurface, CinePlayer, LaneId, SignalId, PAGE_COUNT, ZOOM_IN, ZOOM_OUT,
};
use biosignal_cine::config::CineConfig;
use biosignal_cine::report::{PlotStyle, ReportBuilder};
use biosignal_cine::source::{FileSource, SignalSource};
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};
use log::warn;

const LOG_CAPACITY: usize = 200;

/// 每个通道面板的输入状态
struct LanePanel {
    lane: LaneId,
    path: String,
    selected: Option<SignalId>,
    rename: String,
    speed: u32,
    x_page: usize,
    y_page: usize,
}

impl LanePanel {
    fn new(lane: LaneId, speed: u32) -> Self {
        Self {
            lane,
            path: String::new(),
            selected: None,
            rename: String::new(),
            speed,
            x_page: 0,
            y_page: 0,
        }
    }
}

/// 面板按钮产生的动作，绘制结束后统一执行
enum LaneAction {
    Load,
    Remove,
    Rename,
    TogglePlay,
    Stop,
    Rewind,
    Move,
    Speed(u32),
    Snapshot,
    ZoomIn,
    ZoomOut,
    Page(Axis, usize),
    Pan(f64, f64),
    ResetView,
}

pub struct CineApp {
    player: CinePlayer<CanvasSurface>,
    source: FileSource,
    report: ReportBuilder,
    report_dir: PathBuf,
    panels: [LanePanel; 2],
    linked: bool,
    error: Option<String>,
    last_frame: Instant,
    log_messages: Vec<String>,
}

impl CineApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: CineConfig) -> Self {
        let speed = config.playback.default_speed;
        let style = PlotStyle::sized(config.report.snapshot_width, config.report.snapshot_height);
        Self {
            report_dir: config.report.output_dir.clone(),
            report: ReportBuilder::new(style),
            player: CinePlayer::new(config, CanvasSurface::new()),
            source: FileSource::new(),
            panels: LaneId::ALL.map(|lane| LanePanel::new(lane, speed)),
            linked: false,
            error: None,
            last_frame: Instant::now(),
            log_messages: vec!["Biosignal cine ready.".to_owned()],
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        self.log_messages.push(message.into());
        if self.log_messages.len() > LOG_CAPACITY {
            self.log_messages.remove(0);
        }
    }

    fn report_error(&mut self, err: impl Display) {
        let message = err.to_string();
        warn!("{message}");
        self.log(format!("error: {message}"));
        self.error = Some(message);
    }

    fn lane_controls(&mut self, ui: &mut egui::Ui, lane: LaneId) -> Option<LaneAction> {
        let controls = self.player.controls(lane);
        let (min_speed, max_speed) = (
            self.player.config().playback.min_speed,
            self.player.config().playback.max_speed,
        );
        let members: Vec<(SignalId, String)> = self
            .player
            .signals_in(lane)
            .iter()
            .map(|s| (s.id(), s.name().to_owned()))
            .collect();
        let panel = &mut self.panels[lane.index()];
        if panel
            .selected
            .is_some_and(|id| !members.iter().any(|(m, _)| *m == id))
        {
            panel.selected = None;
        }

        let mut action = None;
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("{lane}").to_uppercase()).strong());
            ui.add(egui::TextEdit::singleline(&mut panel.path).hint_text("signal file"));
            if ui.button("Load").clicked() {
                action = Some(LaneAction::Load);
            }
            let selected_text = panel
                .selected
                .and_then(|id| members.iter().find(|(m, _)| *m == id))
                .map(|(_, name)| name.clone())
                .unwrap_or_else(|| "(none)".to_owned());
            egui::ComboBox::from_id_source(("signal", panel.lane.index()))
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (id, name) in &members {
                        ui.selectable_value(&mut panel.selected, Some(*id), name.as_str());
                    }
                });
            if ui
                .add_enabled(panel.selected.is_some(), egui::Button::new("Remove"))
                .clicked()
            {
                action = Some(LaneAction::Remove);
            }
        });
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut panel.rename).hint_text("new name"));
            if ui
                .add_enabled(panel.selected.is_some(), egui::Button::new("Rename"))
                .clicked()
            {
                action = Some(LaneAction::Rename);
            }
            if ui.button(controls.play_label.as_str()).clicked() {
                action = Some(LaneAction::TogglePlay);
            }
            if ui
                .add_enabled(controls.stop_enabled, egui::Button::new("Stop"))
                .clicked()
            {
                action = Some(LaneAction::Stop);
            }
            if ui
                .add_enabled(controls.rewind_enabled, egui::Button::new("Rewind"))
                .clicked()
            {
                action = Some(LaneAction::Rewind);
            }
            let arrow = match lane {
                LaneId::Left => "Move ⬇",
                LaneId::Right => "Move ⬆",
            };
            if ui
                .add_enabled(controls.move_enabled, egui::Button::new(arrow))
                .clicked()
            {
                action = Some(LaneAction::Move);
            }
            if ui
                .add(egui::Slider::new(&mut panel.speed, min_speed..=max_speed).text("ms / sample"))
                .changed()
            {
                action = Some(LaneAction::Speed(panel.speed));
            }
            if ui.button("Snapshot").clicked() {
                action = Some(LaneAction::Snapshot);
            }
        });
        // 视图：缩放与分页
        ui.horizontal(|ui| {
            if ui.button("Zoom In").clicked() {
                action = Some(LaneAction::ZoomIn);
            }
            if ui.button("Zoom Out").clicked() {
                action = Some(LaneAction::ZoomOut);
            }
            let last_page = PAGE_COUNT - 1;
            if ui
                .add(egui::Slider::new(&mut panel.x_page, 0..=last_page).text("x page"))
                .changed()
            {
                action = Some(LaneAction::Page(Axis::X, panel.x_page));
            }
            if ui
                .add(egui::Slider::new(&mut panel.y_page, 0..=last_page).text("y page"))
                .changed()
            {
                action = Some(LaneAction::Page(Axis::Y, panel.y_page));
            }
            if ui.button("Reset view").clicked() {
                action = Some(LaneAction::ResetView);
            }
        });
        action
    }

    fn apply(&mut self, lane: LaneId, action: LaneAction) {
        let selected = self.panels[lane.index()].selected;
        let result: anyhow::Result<()> = match action {
            LaneAction::Load => {
                let path = self.panels[lane.index()].path.trim().to_owned();
                self.source
                    .load(Path::new(&path))
                    .and_then(|series| self.player.load(lane, series))
                    .map(|id| {
                        self.panels[lane.index()].selected = Some(id);
                        self.log(format!("loaded {path} into {lane} lane"));
                    })
                    .map_err(Into::into)
            }
            LaneAction::Remove => match selected {
                Some(id) => self.player.remove_signal(id).map_err(Into::into),
                None => Ok(()),
            },
            LaneAction::Rename => match selected {
                Some(id) => {
                    let name = self.panels[lane.index()].rename.clone();
                    self.player
                        .rename_signal(id, &name)
                        .map(|()| self.panels[lane.index()].rename.clear())
                        .map_err(Into::into)
                }
                None => Ok(()),
            },
            LaneAction::TogglePlay => {
                self.player.toggle_play_pause(lane);
                Ok(())
            }
            LaneAction::Stop => self.player.stop(lane).map_err(Into::into),
            LaneAction::Rewind => self.player.rewind(lane).map_err(Into::into),
            LaneAction::Move => self
                .player
                .move_selected(lane, selected)
                .map(|moved| {
                    if let Some(id) = moved {
                        self.panels[lane.other().index()].selected = Some(id);
                    }
                })
                .map_err(Into::into),
            LaneAction::Speed(value) => self.player.set_speed(lane, value).map_err(Into::into),
            LaneAction::Snapshot => self.snapshot(lane),
            LaneAction::ZoomIn => self.player.zoom(lane, ZOOM_IN).map_err(Into::into),
            LaneAction::ZoomOut => self.player.zoom(lane, ZOOM_OUT).map_err(Into::into),
            LaneAction::Page(axis, page) => {
                self.player.page(lane, axis, page);
                Ok(())
            }
            LaneAction::Pan(dx, dy) => {
                self.player.pan(lane, dx, dy);
                Ok(())
            }
            LaneAction::ResetView => {
                self.player.reset_view(lane);
                let panel = &mut self.panels[lane.index()];
                panel.x_page = 0;
                panel.y_page = 0;
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report_error(err);
        }
        for panel in &mut self.panels {
            panel.speed = self.player.lane(panel.lane).speed();
        }
    }

    fn snapshot(&mut self, lane: LaneId) -> anyhow::Result<()> {
        let table = self.player.statistics(lane)?;
        let frame = self.player.surface().frame(lane).clone();
        let name = self.report.take_snapshot(lane, &frame, table)?.file_name.clone();
        self.log(format!("snapshot {name} queued"));
        Ok(())
    }

    fn export(&mut self) {
        match self.report.export(&self.report_dir) {
            Ok(path) => self.log(format!("report written to {}", path.display())),
            Err(err) => self.report_error(format!("{err:#}")),
        }
    }

    /// Draws the lane. Dragging the plot pans the view.
    fn lane_plot(&self, ui: &mut egui::Ui, lane: LaneId, height: f32) -> Option<LaneAction> {
        let frame = self.player.surface().frame(lane);
        let shown = Plot::new(("lane_plot", lane.index()))
            .legend(Legend::default())
            .height(height)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .show(ui, |plot_ui| {
                if let Some(view) = frame.view {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [view.x_min, view.y_min],
                        [view.x_max, view.y_max],
                    ));
                }
                for trace in &frame.traces {
                    plot_ui.line(Line::new(PlotPoints::new(trace.points.clone())).name(&trace.name));
                }
                plot_ui.pointer_coordinate_drag_delta()
            });
        // 拖动方向与视图移动方向相反
        let delta = shown.inner;
        (shown.response.dragged() && delta != egui::Vec2::ZERO)
            .then(|| LaneAction::Pan(-f64::from(delta.x), -f64::from(delta.y)))
    }
}

impl eframe::App for CineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 推进虚拟时钟
        let now = Instant::now();
        self.player.advance(now.duration_since(self.last_frame));
        self.last_frame = now;

        // 2. 全局控制
        egui::TopBottomPanel::top("global").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Biosignal Cine");
                ui.separator();
                if ui.checkbox(&mut self.linked, "Link lanes").changed() {
                    self.player.set_linked(self.linked);
                    let state = if self.linked { "linked" } else { "unlinked" };
                    self.log(format!("lanes {state}"));
                }
                let pending = self.report.snapshots().len();
                if ui.button(format!("Export report ({pending})")).clicked() {
                    self.export();
                }
            });
        });
        egui::TopBottomPanel::bottom("log").show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .max_height(80.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for m in &self.log_messages {
                        ui.monospace(m);
                    }
                });
        });

        // 3. 双通道
        egui::CentralPanel::default().show(ctx, |ui| {
            let plot_height = (ui.available_height() / 2.0 - 95.0).max(120.0);
            for lane in LaneId::ALL {
                ui.group(|ui| {
                    if let Some(action) = self.lane_controls(ui, lane) {
                        self.apply(lane, action);
                    }
                    if let Some(action) = self.lane_plot(ui, lane, plot_height) {
                        self.apply(lane, action);
                    }
                });
            }
        });

        // 4. 错误窗口
        if let Some(message) = self.error.clone() {
            let mut open = true;
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(RichText::new(message).color(Color32::LIGHT_RED));
                });
            if !open {
                self.error = None;
            }
        }

        // 空通道的待播状态不需要刷新
        if LaneId::ALL.iter().any(|lane| {
            let lane = self.player.lane(*lane);
            !lane.is_empty() && lane.is_running()
        }) {
            ctx.request_repaint();
        }
    }
}
