use eframe::egui::{self, Color32, RichText, Stroke};
use rfd::FileDialog;
use std::path::Path;

use crate::config::RESOLUTION_CHOICES;
use crate::localizations::Localizations;
use crate::models::{AppState, Browser, DownloadFormat};
use crate::theme::*;

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Download,
    Stop,
    Resume,
    Clear,
    Exit,
    OpenLog,
}

fn role_button(text: String, fill: Color32) -> impl egui::Widget {
    egui::Button::new(
        RichText::new(text)
            .size(BUTTON_FONT_SIZE)
            .color(BUTTON_MAIN_TEXT),
    )
    .min_size(MIN_SIZE_BUTTON)
    .fill(fill)
    .rounding(ROUNDING_BUTTON)
    .stroke(Stroke::new(1.0, BORDER_COLOR))
}

pub fn render_url_input(ui: &mut egui::Ui, state: &mut AppState, localizer: &Localizations) -> egui::Response {
    ui.label(localizer.text("url-label"));

    egui::Frame::group(ui.style())
        .fill(Color32::from_rgb(250, 250, 250))
        .stroke(Stroke::new(1.0, Color32::LIGHT_GRAY))
        .rounding(ROUNDING_FRAME)
        .show(ui, |ui| {
            ui.add_sized(
                [ui.available_width(), 32.0],
                egui::TextEdit::singleline(&mut state.url)
                    .hint_text(localizer.text("url-placeholder"))
                    .font(egui::FontId::proportional(16.0)),
            )
        })
        .inner
}

pub fn render_format_selector(ui: &mut egui::Ui, state: &mut AppState, localizer: &Localizations) {
    ui.horizontal(|ui| {
        ui.label(localizer.text("download-format"));
        ui.radio_value(&mut state.format, DownloadFormat::MP4, localizer.text("format-mp4"));
        ui.radio_value(&mut state.format, DownloadFormat::MP3, localizer.text("format-mp3"));

        ui.add_space(24.0);
        ui.label(localizer.text("max-resolution"));
        let selected = RESOLUTION_CHOICES
            .iter()
            .find(|(height, _)| *height == state.max_height)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| format!("{}p", state.max_height));
        egui::ComboBox::from_id_source("max-resolution")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for (height, label) in RESOLUTION_CHOICES {
                    ui.selectable_value(&mut state.max_height, height, label);
                }
            });
    });
}

pub fn render_download_dir_selector(ui: &mut egui::Ui, state: &mut AppState, localizer: &Localizations) -> bool {
    let mut changed = false;

    ui.label(localizer.text("download-to"));
    ui.horizontal(|ui| {
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .rounding(ROUNDING_FRAME)
            .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
            .show(ui, |ui| {
                let response = ui.add_sized(
                    [ui.available_width() - 110.0, 28.0],
                    egui::TextEdit::singleline(&mut state.download_dir)
                        .hint_text(localizer.text("dir-placeholder"))
                        .frame(false)
                        .margin(egui::vec2(8.0, 6.0)),
                );
                changed = response.changed();
            });

        let button = egui::Button::new(RichText::new(localizer.text("browse-button")).size(14.0))
            .min_size(egui::vec2(100.0, 28.0))
            .fill(ui.visuals().widgets.inactive.bg_fill)
            .rounding(ROUNDING_FRAME);

        if ui.add(button).clicked() {
            let start = if state.download_dir.trim().is_empty() {
                Path::new(".")
            } else {
                Path::new(&state.download_dir)
            };
            if let Some(path) = FileDialog::new().set_directory(start).pick_folder() {
                state.download_dir = path.to_string_lossy().to_string();
                changed = true;
            }
        }
    });

    changed
}

/// Archive checkbox plus the cookie and log utilities.
pub fn render_extras(ui: &mut egui::Ui, state: &mut AppState, localizer: &Localizations) -> Option<UiAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.checkbox(&mut state.ignore_archive, localizer.text("ignore-archive"))
            .on_hover_text(localizer.text("ignore-archive-tooltip"));
    });

    ui.horizontal(|ui| {
        if ui
            .add(role_button(localizer.text("cookies-file-button"), SECONDARY_BUTTON_BG))
            .clicked()
        {
            if let Some(path) = FileDialog::new()
                .add_filter("Text Files", &["txt"])
                .pick_file()
            {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                state.status = localizer.format("cookies-loaded", &[("name", name.as_str())]);
                state.cookies_path = Some(path);
            }
        }
        if ui
            .add(role_button(localizer.text("cookies-browser-button"), SECONDARY_BUTTON_BG))
            .clicked()
        {
            state.browser_picker_open = true;
        }
        if ui
            .add(role_button(localizer.text("open-log-button"), SECONDARY_BUTTON_BG))
            .clicked()
        {
            action = Some(UiAction::OpenLog);
        }
    });

    action
}

pub fn render_history(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) {
    ui.label(localizer.text("history-label"));
    egui::Frame::group(ui.style())
        .fill(PANEL_BG)
        .rounding(ROUNDING_FRAME)
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_source("history")
                .max_height(LIST_HEIGHT)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in state.history.entries() {
                        let mut text = RichText::new(entry.label()).color(entry_color(entry.status));
                        if entry.status == crate::models::EntryStatus::Active {
                            text = text.strong();
                        }
                        ui.label(text);
                    }
                });
        });
}

pub fn render_skipped(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) {
    ui.label(localizer.text("skipped-label"));
    egui::Frame::group(ui.style())
        .fill(PANEL_BG)
        .rounding(ROUNDING_FRAME)
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_source("skipped")
                .max_height(LIST_HEIGHT / 1.5)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for reason in &state.skipped {
                        ui.label(RichText::new(reason).color(TEXT_ERROR));
                    }
                });
        });
}

pub fn render_status(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) {
    let progress = (state.progress / 100.0).clamp(0.0, 1.0);
    let text = if state.is_downloading && !state.download_speed.is_empty() {
        localizer.format(
            "status-progress",
            &[("speed", state.download_speed.as_str()), ("eta", state.eta.as_str())],
        )
    } else {
        format!("{:.0}%", state.progress)
    };
    ui.add(egui::ProgressBar::new(progress).text(text));

    let status_text = match &state.last_error {
        Some(error) => RichText::new(localizer.format("status-failed", &[("message", error.as_str())])).color(TEXT_ERROR),
        None => RichText::new(&state.status).color(SECONDARY_TEXT),
    };
    ui.label(status_text);
}

pub fn render_buttons(ui: &mut egui::Ui, state: &AppState, localizer: &Localizations) -> Option<UiAction> {
    let mut action = None;
    let running = state.is_downloading;

    ui.horizontal(|ui| {
        let buttons = [
            (UiAction::Clear, "clear-button", SECONDARY_BUTTON_BG, !running),
            (UiAction::Download, "download-button", PRIMARY_BUTTON_BG, !running),
            (UiAction::Stop, "stop-button", DANGER_BUTTON_BG, running && !state.stop_requested),
            (
                UiAction::Resume,
                "resume-button",
                ACCENT_BUTTON_BG,
                !running && state.last_request.is_some(),
            ),
            (UiAction::Exit, "exit-button", EXIT_BUTTON_BG, true),
        ];
        for (kind, key, fill, enabled) in buttons {
            if ui
                .add_enabled(enabled, role_button(localizer.text(key), fill))
                .clicked()
            {
                action = Some(kind);
            }
        }
    });

    action
}

fn centered_window(title: String) -> egui::Window<'static> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

pub fn render_browser_picker(ctx: &egui::Context, state: &mut AppState, localizer: &Localizations) {
    if !state.browser_picker_open {
        return;
    }
    let mut chosen = None;
    let mut cancelled = false;

    centered_window(localizer.text("cookies-browser-button")).show(ctx, |ui| {
        ui.label(localizer.text("choose-browser"));
        ui.horizontal(|ui| {
            for browser in Browser::ALL {
                if ui.button(browser.as_str()).clicked() {
                    chosen = Some(browser);
                }
            }
        });
        ui.add_space(8.0);
        if ui.button(localizer.text("cancel-button")).clicked() {
            cancelled = true;
        }
    });

    if let Some(browser) = chosen {
        state.cookies_browser = Some(browser);
        state.status = localizer.format("cookies-browser-selected", &[("browser", browser.as_str())]);
    }
    if chosen.is_some() || cancelled {
        state.browser_picker_open = false;
    }
}

pub fn render_error_dialog(ctx: &egui::Context, state: &mut AppState, localizer: &Localizations) {
    let Some(report) = &state.error_report else {
        return;
    };
    let mut details = report.message.clone();
    if !report.log_tail.is_empty() {
        details.push_str("\n\n--- Log ---\n");
        details.push_str(&report.log_tail);
    }

    let mut dismissed = false;
    centered_window(localizer.text("error-title")).show(ctx, |ui| {
        ui.label(RichText::new(localizer.text("error-intro")).color(TEXT_ERROR).strong());
        ui.label(localizer.text("error-copied"));
        egui::ScrollArea::vertical()
            .id_source("error-details")
            .max_height(260.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut details.as_str())
                        .font(egui::TextStyle::Monospace)
                        .desired_width(f32::INFINITY),
                );
            });
        if ui.button(localizer.text("ok-button")).clicked() {
            dismissed = true;
        }
    });

    if dismissed {
        state.error_report = None;
    }
}

pub fn render_summary_dialog(ctx: &egui::Context, state: &mut AppState, localizer: &Localizations) {
    // The failure dialog goes first.
    if state.error_report.is_some() {
        return;
    }
    let Some(summary) = &state.summary else {
        return;
    };

    let mut dismissed = false;
    centered_window(localizer.text("summary-title")).show(ctx, |ui| {
        ui.label(localizer.text("summary-intro"));
        ui.add_space(6.0);
        ui.label(RichText::new(summary.as_str()).monospace());
        if ui.button(localizer.text("ok-button")).clicked() {
            dismissed = true;
        }
    });

    if dismissed {
        state.summary = None;
    }
}
