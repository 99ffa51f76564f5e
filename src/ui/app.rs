//! Main application UI

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use egui::{CentralPanel, Context, SidePanel, TopBottomPanel};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::components::LatchBadge;
use super::dialogs::{self, PromptQueue, WindowLifecycle, WindowPrompt};
use super::panels::dashboard::{DashboardAction, DashboardView};
use super::panels::settings::SettingsAction;
use super::panels;
use super::theme::{Icons, Theme};
use crate::core::settings::PromptStyle;
use crate::core::{
    AlertEntry, ChannelNotifier, ConfirmPrompt, LatchState, MonitorBuilder, MonitorEvent,
    MonitorHandle, SampleUpdate, Settings, Thresholds,
};
use crate::persistence::Database;
use crate::platform::NativePrompt;

/// Samples kept for the dashboard
const RECENT_SAMPLES: usize = 120;

/// Alerts shown in the history view
const HISTORY_LIMIT: usize = 200;

/// Active view/tab in the main panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Dashboard,
    Alerts,
    Settings,
}

impl ActiveView {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Alerts => "Alerts",
            Self::Settings => "Settings",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Self::Dashboard => Icons::DASHBOARD,
            Self::Alerts => Icons::ALERTS,
            Self::Settings => Icons::SETTINGS,
        }
    }
}

/// Notification message
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Toast shown for a latch transition, if any
fn latch_notice(previous: LatchState, state: LatchState) -> Option<(&'static str, NotificationLevel)> {
    match (previous, state) {
        (LatchState::Prompting, LatchState::Armed) => {
            Some(("Alert dismissed, monitoring continues", NotificationLevel::Info))
        }
        (_, LatchState::Suspended) => Some((
            "The alert prompt could not be shown. Re-arm alerts from the dashboard.",
            NotificationLevel::Warning,
        )),
        (_, LatchState::Terminated) => Some(("Closing the browser", NotificationLevel::Error)),
        _ => None,
    }
}

/// Main application struct
pub struct MonitorApp {
    runtime: Handle,
    db: Arc<Database>,
    /// Settings as edited in the Settings view
    settings: Settings,
    /// Thresholds the running monitor uses
    thresholds: Thresholds,
    log_file: PathBuf,
    monitor: Option<MonitorHandle>,
    events: mpsc::UnboundedReceiver<MonitorEvent>,
    prompts: PromptQueue,
    latch: LatchState,
    /// Set while an alert is raised and not yet resolved
    freeze: Option<String>,
    recent: VecDeque<SampleUpdate>,
    alerts: Vec<AlertEntry>,
    active_view: ActiveView,
    notifications: Vec<Notification>,
}

impl MonitorApp {
    /// Wire the monitor to this window and start it.
    ///
    /// `builder` already carries the metric source, sink, journal and timing.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: Handle,
        db: Arc<Database>,
        settings: Settings,
        builder: MonitorBuilder,
    ) -> Self {
        Theme::apply(&cc.egui_ctx, settings.theme);

        let (tx, events) = mpsc::unbounded_channel();
        let (window_prompt, prompts) = WindowPrompt::new(cc.egui_ctx.clone());
        let prompt: Arc<dyn ConfirmPrompt> = match settings.prompt_style {
            PromptStyle::InWindow => Arc::new(window_prompt),
            PromptStyle::Native => Arc::new(NativePrompt::new()),
        };

        let mut app = Self {
            runtime,
            db,
            thresholds: settings.thresholds(),
            log_file: settings.get_log_file(),
            settings,
            monitor: None,
            events,
            prompts: PromptQueue::new(prompts),
            latch: LatchState::Armed,
            freeze: None,
            recent: VecDeque::with_capacity(RECENT_SAMPLES),
            alerts: Vec::new(),
            active_view: ActiveView::Dashboard,
            notifications: Vec::new(),
        };

        let built = builder
            .notifier(Arc::new(
                ChannelNotifier::new(tx).with_repaint(cc.egui_ctx.clone()),
            ))
            .prompt(prompt)
            .lifecycle(Arc::new(WindowLifecycle::new(cc.egui_ctx.clone())))
            .build();

        match built {
            Ok(monitor) => {
                let _enter = app.runtime.enter();
                app.monitor = Some(monitor.start());
                info!("Monitoring {:?}", app.log_file);
            }
            Err(e) => {
                error!("Failed to start monitor: {:#}", e);
                app.notify(format!("Monitoring failed to start: {}", e), NotificationLevel::Error);
            }
        }

        app.reload_alerts();
        app
    }

    /// Add a notification
    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.notifications.push(Notification {
            message: message.into(),
            level,
            created_at: Instant::now(),
        });
    }

    fn reload_alerts(&mut self) {
        match self.db.recent_alerts(HISTORY_LIMIT) {
            Ok(alerts) => self.alerts = alerts,
            Err(e) => error!("Failed to load alert history: {}", e),
        }
    }

    /// Apply everything the monitor pushed since the last frame
    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                MonitorEvent::Sample(update) => {
                    if self.recent.len() == RECENT_SAMPLES {
                        self.recent.pop_front();
                    }
                    self.recent.push_back(update);
                }
                MonitorEvent::Freeze { detail } => self.freeze = Some(detail),
                MonitorEvent::Resume => self.freeze = None,
                MonitorEvent::Latch(state) => {
                    self.on_latch_change(state);
                }
            }
        }

        self.prompts.poll();
    }

    fn on_latch_change(&mut self, state: LatchState) {
        let previous = std::mem::replace(&mut self.latch, state);
        if state == LatchState::Terminated {
            self.freeze = None;
        }
        if let Some((message, level)) = latch_notice(previous, state) {
            self.notify(message, level);
        }
        // every transition settles or opens an alert row
        self.reload_alerts();
    }

    /// Clean up old notifications
    fn cleanup_notifications(&mut self) {
        let timeout = Duration::from_secs(5);
        self.notifications
            .retain(|n| n.created_at.elapsed() < timeout);
    }

    fn render_sidebar(&mut self, ctx: &Context) {
        SidePanel::left("sidebar")
            .resizable(false)
            .default_width(200.0)
            .frame(
                egui::Frame::none()
                    .fill(Theme::BG_SECONDARY)
                    .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT)),
            )
            .show(ctx, |ui| {
                ui.add_space(20.0);
                ui.horizontal(|ui| {
                    ui.add_space(16.0);
                    ui.label(egui::RichText::new("◈").size(24.0).color(Theme::PRIMARY));
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new(crate::APP_NAME)
                            .size(18.0)
                            .strong()
                            .color(Theme::TEXT_PRIMARY),
                    );
                });
                ui.add_space(24.0);

                for view in [ActiveView::Dashboard, ActiveView::Alerts, ActiveView::Settings] {
                    let selected = self.active_view == view;
                    let text_color = if selected {
                        Theme::PRIMARY_LIGHT
                    } else {
                        Theme::TEXT_SECONDARY
                    };

                    let response = egui::Frame::none()
                        .fill(if selected {
                            Theme::PRIMARY.linear_multiply(0.15)
                        } else {
                            egui::Color32::TRANSPARENT
                        })
                        .rounding(egui::Rounding::same(8.0))
                        .inner_margin(egui::Margin::symmetric(16.0, 12.0))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width() - 16.0);
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(view.icon()).size(16.0).color(text_color),
                                );
                                ui.add_space(12.0);
                                ui.label(
                                    egui::RichText::new(view.label()).size(14.0).color(text_color),
                                );
                            });
                        });

                    if response.response.interact(egui::Sense::click()).clicked() {
                        self.active_view = view;
                        if view == ActiveView::Alerts {
                            self.reload_alerts();
                        }
                    }
                    ui.add_space(2.0);
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.add_space(16.0);
                    ui.horizontal(|ui| {
                        ui.add_space(16.0);
                        ui.label(
                            egui::RichText::new(format!("v{}", crate::APP_VERSION))
                                .small()
                                .color(Theme::TEXT_MUTED),
                        );
                    });
                });
            });
    }

    fn render_top_bar(&mut self, ctx: &Context) {
        TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::none()
                    .fill(Theme::BG_PRIMARY)
                    .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
                    .inner_margin(egui::Margin::symmetric(20.0, 12.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(self.active_view.label())
                            .size(24.0)
                            .strong()
                            .color(Theme::TEXT_PRIMARY),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        LatchBadge::show(ui, self.latch);
                        ui.add_space(8.0);
                        if let Some(latest) = self.recent.back() {
                            ui.label(
                                egui::RichText::new(format!(
                                    "CPU {} · RAM {}",
                                    latest.cpu_formatted, latest.mem_formatted
                                ))
                                .monospace()
                                .color(Theme::TEXT_SECONDARY),
                            );
                        }
                    });
                });
            });
    }

    fn render_main_content(&mut self, ctx: &Context) {
        CentralPanel::default().show(ctx, |ui| match self.active_view {
            ActiveView::Dashboard => {
                let view = DashboardView {
                    recent: &self.recent,
                    capacity: RECENT_SAMPLES,
                    thresholds: self.thresholds,
                    latch: self.latch,
                    log_file: &self.log_file,
                    running: self.monitor.is_some(),
                };
                match panels::dashboard::render(ui, &view) {
                    Some(DashboardAction::Rearm) => self.rearm(),
                    Some(DashboardAction::OpenLog) => crate::platform::open_path(&self.log_file),
                    None => {}
                }
            }
            ActiveView::Alerts => {
                if panels::history::render(ui, &self.alerts) {
                    self.reload_alerts();
                }
            }
            ActiveView::Settings => {
                match panels::settings::render(ui, &mut self.settings, ctx) {
                    Some(SettingsAction::Save) => self.save_settings(),
                    Some(SettingsAction::Reset) => {
                        self.settings = Settings::default();
                        Theme::apply(ctx, self.settings.theme);
                    }
                    None => {}
                }
            }
        });
    }

    fn rearm(&mut self) {
        let rearmed = self.monitor.as_ref().is_some_and(|m| m.rearm());
        if rearmed {
            self.notify("Alerts re-armed", NotificationLevel::Success);
        }
    }

    fn save_settings(&mut self) {
        self.settings.validate();
        match self.db.save_settings(&self.settings) {
            Ok(()) => self.notify(
                "Settings saved. They apply the next time ShellGuard starts.",
                NotificationLevel::Success,
            ),
            Err(e) => {
                error!("Failed to save settings: {}", e);
                self.notify(format!("Failed to save settings: {}", e), NotificationLevel::Error);
            }
        }
    }

    /// Dim the window the way a hung browser looks while the alert is up
    fn render_freeze_overlay(&self, ctx: &Context) {
        let Some(detail) = &self.freeze else {
            return;
        };

        egui::Area::new(egui::Id::new("freeze_overlay"))
            .order(egui::Order::Middle)
            .fixed_pos(egui::Pos2::ZERO)
            .interactable(true)
            .show(ctx, |ui| {
                let screen = ctx.screen_rect();
                ui.allocate_rect(screen, egui::Sense::click_and_drag());
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(170));
                ui.painter().text(
                    screen.center() - egui::vec2(0.0, 140.0),
                    egui::Align2::CENTER_CENTER,
                    format!("Not responding · {}", detail),
                    egui::FontId::proportional(18.0),
                    Theme::TEXT_SECONDARY,
                );
            });
    }

    fn render_prompt(&mut self, ctx: &Context) {
        let choice = match self.prompts.current() {
            Some(request) => dialogs::confirm::render(ctx, request),
            None => return,
        };

        if let Some(choice) = choice {
            if self.prompts.answer(choice) {
                info!(choice = choice.label(), "Alert answered");
            }
        }
    }

    fn render_notifications(&mut self, ctx: &Context) {
        if self.notifications.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("notifications"))
            .order(egui::Order::Tooltip)
            .fixed_pos(egui::pos2(ctx.screen_rect().width() - 360.0, 80.0))
            .show(ctx, |ui| {
                for notification in &self.notifications {
                    let (icon, accent) = match notification.level {
                        NotificationLevel::Info => ("ℹ", Theme::INFO),
                        NotificationLevel::Success => ("✓", Theme::SUCCESS),
                        NotificationLevel::Warning => ("⚠", Theme::WARNING),
                        NotificationLevel::Error => ("✕", Theme::ERROR),
                    };

                    egui::Frame::none()
                        .fill(Theme::BG_ELEVATED)
                        .rounding(egui::Rounding::same(10.0))
                        .stroke(egui::Stroke::new(1.0, accent.linear_multiply(0.5)))
                        .inner_margin(egui::Margin::same(16.0))
                        .show(ui, |ui| {
                            ui.set_width(320.0);
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(icon).size(14.0).color(accent));
                                ui.add_space(12.0);
                                ui.label(
                                    egui::RichText::new(&notification.message)
                                        .size(13.0)
                                        .color(Theme::TEXT_PRIMARY),
                                );
                            });
                        });

                    ui.add_space(10.0);
                }
            });
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.cleanup_notifications();

        // keep toasts expiring without new samples
        ctx.request_repaint_after(Duration::from_millis(250));

        self.render_sidebar(ctx);
        self.render_top_bar(ctx);
        self.render_main_content(ctx);
        self.render_freeze_overlay(ctx);
        self.render_prompt(ctx);
        self.render_notifications(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // nobody is left to answer; the prompt thread sees the drop as unavailable
        self.prompts.clear();

        if let Some(monitor) = self.monitor.take() {
            self.runtime.block_on(monitor.stop());
        }

        info!("Application exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_transitions_pick_a_toast_level() {
        let level = |from, to| latch_notice(from, to).map(|(_, level)| level);

        assert_eq!(
            level(LatchState::Prompting, LatchState::Armed),
            Some(NotificationLevel::Info)
        );
        assert_eq!(
            level(LatchState::Prompting, LatchState::Suspended),
            Some(NotificationLevel::Warning)
        );
        assert_eq!(
            level(LatchState::Suspended, LatchState::Terminated),
            Some(NotificationLevel::Error)
        );
        // re-arming is confirmed by the button handler
        assert_eq!(level(LatchState::Suspended, LatchState::Armed), None);
        assert_eq!(level(LatchState::Armed, LatchState::Prompting), None);
    }
}
