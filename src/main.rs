use clap::{Arg, ArgAction, Command};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

mod panel;
use panel::EqualizerPanel;
use system_equalizer::{config, icon, init_logging};

fn main() -> eframe::Result<()> {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("A slider panel for the system volume with F1-F9 equalizer presets.")
        .arg(
            Arg::new("no_hotkeys")
                .long("no_hotkeys")
                .required(false)
                .help("Do not register F1-F9 system wide. The keys still work while the panel has focus.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("icon")
                .long("icon")
                .required(false)
                .help("Window icon (.ico or .png) tried before the icons/ directory")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .required(false)
                .help("Log debug messages")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let mut config = config::load_config();
    if matches.get_flag("no_hotkeys") {
        config.hotkeys_enabled = false;
    }
    if let Some(path) = matches.get_one::<PathBuf>("icon") {
        config.icon_path = Some(path.clone());
    }

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 650.0])
        .with_resizable(true)
        .with_title("Equalizer");
    if let Some(icon) = icon::load_window_icon(config.icon_path.as_deref()) {
        viewport = viewport.with_icon(Arc::new(egui::IconData {
            rgba: icon.rgba,
            width: icon.width,
            height: icon.height,
        }));
    }
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Equalizer",
        options,
        Box::new(move |cc| Ok(Box::new(EqualizerPanel::new(cc, &config)))),
    )
}
