use std::sync::mpsc::{self, Receiver};

use eframe::egui::{self, Color32, RichText};

use system_equalizer::audio;
use system_equalizer::config::{self, AppConfig};
use system_equalizer::eq::presets::{self, EqPreset, MENU_GROUPS, RESET};
use system_equalizer::eq::state::{Equalizer, StatusKind};
use system_equalizer::eq::{band_label, gain_label, EqCommand, GAIN_MAX, GAIN_MIN, NUM_BANDS};
use system_equalizer::heartbeat::{self, Heartbeat};
use system_equalizer::hotkeys::{self, HotkeyListener};

const HOTKEY_HINT: &str = "Hotkeys: F1-F9 - presets";

const FUNCTION_KEYS: [(egui::Key, u8); 9] = [
    (egui::Key::F1, 1),
    (egui::Key::F2, 2),
    (egui::Key::F3, 3),
    (egui::Key::F4, 4),
    (egui::Key::F5, 5),
    (egui::Key::F6, 6),
    (egui::Key::F7, 7),
    (egui::Key::F8, 8),
    (egui::Key::F9, 9),
];

pub struct EqualizerPanel {
    equalizer: Equalizer,
    presets: Vec<EqPreset>,
    command_rx: Receiver<EqCommand>,
    hotkeys: Option<HotkeyListener>,
    heartbeat: Option<Heartbeat>,
    config_watcher: Option<(notify::RecommendedWatcher, Receiver<()>)>,
}

impl EqualizerPanel {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Self {
        let volume_control = match audio::connect_default_endpoint() {
            Ok(control) => Some(control),
            Err(e) => {
                tracing::error!("Audio initialisation failed, running without volume control: {e}");
                None
            }
        };

        let (command_tx, command_rx) = mpsc::channel();
        let hotkeys = if config.hotkeys_enabled {
            match hotkeys::register_global_hotkeys(command_tx) {
                Ok(listener) => Some(listener),
                Err(e) => {
                    tracing::warn!("Global hotkeys unavailable: {e}");
                    None
                }
            }
        } else {
            tracing::info!("Global hotkeys disabled");
            None
        };

        let ctx = cc.egui_ctx.clone();
        let heartbeat = match Heartbeat::spawn(heartbeat::DEFAULT_INTERVAL, move || {
            ctx.request_repaint()
        }) {
            Ok(heartbeat) => Some(heartbeat),
            Err(e) => {
                tracing::error!("Failed to start the heartbeat thread: {e}");
                None
            }
        };

        let config_watcher = match config::watch_config_dir() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Preset changes will not be picked up: {e}");
                None
            }
        };

        EqualizerPanel {
            equalizer: Equalizer::new(volume_control),
            presets: presets::all_presets(),
            command_rx,
            hotkeys,
            heartbeat,
            config_watcher,
        }
    }

    fn run(&mut self, command: EqCommand) {
        self.equalizer.execute(&command, &self.presets);
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        while let Ok(command) = self.command_rx.try_recv() {
            self.run(command);
        }

        if let Some((_, changes)) = &self.config_watcher {
            if changes.try_iter().count() > 0 {
                self.presets = presets::all_presets();
                tracing::debug!("Reloaded {} presets", self.presets.len());
            }
        }

        // registered hotkeys never reach the window
        let local = hotkeys::keys_without_global_hotkey(self.hotkeys.as_ref());
        if local.is_empty() {
            return;
        }
        let pressed: Vec<u8> = ctx.input(|input| {
            FUNCTION_KEYS
                .iter()
                .filter(|(key, number)| local.contains(number) && input.key_pressed(*key))
                .map(|&(_, number)| number)
                .collect()
        });
        for command in pressed
            .into_iter()
            .filter_map(presets::command_for_function_key)
        {
            self.run(command);
        }
    }

    fn menu_bar(&self, ui: &mut egui::Ui) -> Option<EqCommand> {
        let mut command = None;
        egui::menu::bar(ui, |ui| {
            ui.menu_button("Presets", |ui| {
                for group in MENU_GROUPS {
                    for name in group {
                        if ui.button(presets::menu_label(name)).clicked() {
                            command = Some(EqCommand::ApplyPreset(name.to_string()));
                            ui.close_menu();
                        }
                    }
                    ui.separator();
                }

                let user: Vec<&EqPreset> = self
                    .presets
                    .iter()
                    .filter(|p| !presets::is_builtin(&p.name))
                    .collect();
                if !user.is_empty() {
                    for preset in user {
                        if ui.button(preset.name.as_str()).clicked() {
                            command = Some(EqCommand::ApplyPreset(preset.name.clone()));
                            ui.close_menu();
                        }
                    }
                    ui.separator();
                }

                if ui.button(presets::menu_label(RESET)).clicked() {
                    command = Some(EqCommand::Reset);
                    ui.close_menu();
                }
            });
        });
        command
    }

    fn volume_section(&mut self, ui: &mut egui::Ui) {
        ui.add_space(20.0);
        ui.label(RichText::new("System volume:").strong().size(16.0));

        let mut percent = self.equalizer.volume_percent();
        ui.spacing_mut().slider_width = 300.0;
        let response = ui.add_enabled(
            self.equalizer.has_audio_control(),
            egui::Slider::new(&mut percent, 0..=100),
        );
        if response.changed() {
            self.equalizer.set_volume_percent(percent);
        }
    }

    fn band_section(&mut self, ui: &mut egui::Ui) {
        ui.add_space(20.0);
        ui.horizontal(|ui| {
            for index in 0..NUM_BANDS {
                ui.vertical(|ui| {
                    ui.label(RichText::new(band_label(index)).strong());

                    let mut gain = self.equalizer.gains()[index];
                    ui.spacing_mut().slider_width = 220.0;
                    let slider = egui::Slider::new(&mut gain, GAIN_MIN..=GAIN_MAX)
                        .orientation(egui::SliderOrientation::Vertical)
                        .show_value(false);
                    if ui.add(slider).changed() {
                        self.equalizer.set_gain(index, gain);
                    }

                    ui.label(gain_label(self.equalizer.gains()[index]));
                });
                ui.add_space(8.0);
            }
        });
    }

    fn quick_buttons(&self, ui: &mut egui::Ui) -> Option<EqCommand> {
        let mut command = None;
        ui.add_space(15.0);
        ui.horizontal(|ui| {
            if quick_button(ui, "Normal", Color32::LIGHT_GRAY).clicked() {
                command = Some(EqCommand::ApplyPreset(presets::NORMAL.to_string()));
            }
            if quick_button(ui, "Bass", Color32::LIGHT_BLUE).clicked() {
                command = Some(EqCommand::ApplyPreset(presets::BASS.to_string()));
            }
            if quick_button(ui, "Reset", Color32::LIGHT_RED).clicked() {
                command = Some(EqCommand::Reset);
            }
        });
        command
    }

    fn status_line(&self, ui: &mut egui::Ui) {
        let status = self.equalizer.status();
        ui.add_space(10.0);
        ui.label(RichText::new(&status.text).color(status_color(status.kind)));
        ui.label(RichText::new(HOTKEY_HINT).small().color(Color32::GRAY));
    }
}

fn status_color(kind: StatusKind) -> Color32 {
    match kind {
        StatusKind::Active => Color32::GREEN,
        StatusKind::PresetApplied => Color32::BLUE,
        StatusKind::Reset => Color32::ORANGE,
    }
}

fn quick_button(ui: &mut egui::Ui, text: &str, fill: Color32) -> egui::Response {
    ui.add(
        egui::Button::new(RichText::new(text).color(Color32::BLACK))
            .fill(fill)
            .min_size(egui::vec2(110.0, 28.0)),
    )
}

impl eframe::App for EqualizerPanel {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background(ctx);

        let mut pending = Vec::new();
        egui::TopBottomPanel::top("presets_menu").show(ctx, |ui| {
            pending.extend(self.menu_bar(ui));
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                self.volume_section(ui);
                self.band_section(ui);
                pending.extend(self.quick_buttons(ui));
                self.status_line(ui);
            });
        });

        for command in pending {
            self.run(command);
        }
    }
}

impl Drop for EqualizerPanel {
    fn drop(&mut self) {
        if let Some(mut heartbeat) = self.heartbeat.take() {
            heartbeat.stop();
        }
        // unregisters F1-F9
        self.hotkeys.take();
        tracing::info!("Equalizer closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_colors() {
        assert_eq!(status_color(StatusKind::Active), Color32::from_rgb(0, 255, 0));
        assert_eq!(status_color(StatusKind::PresetApplied), Color32::from_rgb(0, 0, 255));
        assert_eq!(status_color(StatusKind::Reset), Color32::ORANGE);
    }

    #[test]
    fn every_function_key_has_an_egui_key() {
        let numbers: Vec<u8> = FUNCTION_KEYS.iter().map(|&(_, n)| n).collect();
        assert_eq!(numbers, hotkeys::keys_without_global_hotkey(None));
    }
}
