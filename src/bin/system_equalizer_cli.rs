use clap::{Arg, ArgAction, Command};

use system_equalizer::audio::{connect_default_endpoint, VolumeControl};
use system_equalizer::eq::presets::{self, all_presets, find_preset};
use system_equalizer::eq::{gain_label, EQ_FREQUENCIES};
use system_equalizer::init_logging;

fn main() {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("A CLI for the system volume and the equalizer presets.")
        .arg(
            Arg::new("volume")
                .long("volume")
                .required(false)
                .help("Set the system volume in percent.")
                .value_parser(clap::value_parser!(u8).range(0..=100)),
        )
        .arg(
            Arg::new("list_presets")
                .long("list_presets")
                .required(false)
                .help("List built-in and user presets.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show_preset")
                .long("show_preset")
                .required(false)
                .help("Print the band gains of a preset.")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("eq")
                .long("eq")
                .required(false)
                .help("Open the interactive preset editor.")
                .hide(!cfg!(feature = "eq-editor"))
                .action(ArgAction::SetTrue),
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

    if matches.get_flag("list_presets") {
        for preset in all_presets() {
            let label = presets::menu_label(&preset.name);
            let kind = if presets::is_builtin(&preset.name) { "" } else { " (custom)" };
            println!("{label}{kind}");
        }
        println!("{}", presets::menu_label(presets::RESET));
    }

    if let Some(name) = matches.get_one::<String>("show_preset") {
        let all = all_presets();
        let Some(preset) = find_preset(&all, name) else {
            eprintln!("ERROR: Unknown preset {name}");
            std::process::exit(1);
        };
        println!("{}", preset.name);
        for (freq, gain) in EQ_FREQUENCIES.iter().zip(preset.bands) {
            println!("{:>8} {:>6}", format!("{freq}Hz"), gain_label(gain));
        }
    }

    let wants_audio = matches.get_one::<u8>("volume").is_some()
        || matches.get_flag("eq")
        || !(matches.get_flag("list_presets") || matches.contains_id("show_preset"));
    if !wants_audio {
        return;
    }

    let mut endpoint = match connect_default_endpoint() {
        Ok(endpoint) => Some(endpoint),
        Err(error) => {
            eprintln!("{error}");
            None
        }
    };

    if let Some(percent) = matches.get_one::<u8>("volume") {
        let Some(control) = endpoint.as_mut() else {
            std::process::exit(1);
        };
        if let Err(error) = control.set_master_volume(f32::from(*percent) / 100.0) {
            eprintln!("Failed to set the volume with error: {error}");
            std::process::exit(1);
        }
    }

    if matches.get_flag("eq") {
        run_editor(
            endpoint
                .as_mut()
                .map(|e| &mut **e as &mut dyn VolumeControl),
        );
    }

    match endpoint.as_ref().map(|e| e.master_volume()) {
        Some(Ok(level)) => println!("System volume: {}%", (level * 100.0).round() as u8),
        Some(Err(error)) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
        None => {}
    }
}

#[cfg(feature = "eq-editor")]
fn run_editor(volume: Option<&mut dyn VolumeControl>) {
    use system_equalizer::eq::editor::EqEditor;

    if let Err(error) = EqEditor::new().run(volume) {
        eprintln!("Editor failed with error: {error}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "eq-editor"))]
fn run_editor(_volume: Option<&mut dyn VolumeControl>) {
    eprintln!("ERROR: Built without the eq-editor feature");
    std::process::exit(1);
}
