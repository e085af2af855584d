use std::path::{Path, PathBuf};

/// File names tried in order; all `.ico` files before any `.png`.
pub const ICON_FILE_NAMES: [&str; 6] = [
    "equalizer.ico",
    "icon.ico",
    "app.ico",
    "equalizer.png",
    "icon.png",
    "app.png",
];

/// Decoded window icon.
#[derive(Debug, Clone)]
pub struct WindowIcon {
    pub path: PathBuf,
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// `icons/<name>` next to the executable first, then relative to the working directory.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(dir);
    }
    roots.push(PathBuf::new());
    candidates_in(&roots)
}

pub fn candidates_in(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| {
            ICON_FILE_NAMES
                .iter()
                .map(move |name| root.join("icons").join(name))
        })
        .collect()
}

pub fn decode_icon(path: &Path) -> image::ImageResult<WindowIcon> {
    let rgba = image::open(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(WindowIcon {
        path: path.to_path_buf(),
        rgba: rgba.into_raw(),
        width,
        height,
    })
}

/// First candidate that exists and decodes. Broken files are logged and skipped.
pub fn load_first(candidates: &[PathBuf]) -> Option<WindowIcon> {
    for path in candidates.iter().filter(|p| p.exists()) {
        match decode_icon(path) {
            Ok(icon) => {
                tracing::info!("Icon loaded: {}", path.display());
                return Some(icon);
            }
            Err(e) => tracing::warn!("Failed to load icon {}: {e}", path.display()),
        }
    }
    tracing::warn!("No icon could be loaded");
    None
}

/// Loads the configured icon if any, falling back to the candidate list.
pub fn load_window_icon(preferred: Option<&Path>) -> Option<WindowIcon> {
    let mut candidates: Vec<PathBuf> = preferred.map(Path::to_path_buf).into_iter().collect();
    candidates.extend(candidate_paths());
    load_first(&candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, size: u32) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(size, size, image::Rgba([10, 20, 30, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn ico_names_come_first() {
        let paths = candidates_in(&[PathBuf::from("root")]);
        assert_eq!(paths.len(), ICON_FILE_NAMES.len());
        assert_eq!(paths[0], Path::new("root").join("icons").join("equalizer.ico"));
        assert!(paths[..3].iter().all(|p| p.extension().unwrap() == "ico"));
        assert!(paths[3..].iter().all(|p| p.extension().unwrap() == "png"));
    }

    #[test]
    fn skips_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let roots = vec![dir.path().to_path_buf()];
        let candidates = candidates_in(&roots);

        // icon.ico exists but is not an image
        let broken = dir.path().join("icons").join("icon.ico");
        std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
        std::fs::write(&broken, b"not an icon").unwrap();
        write_png(&dir.path().join("icons").join("app.png"), 4);

        let icon = load_first(&candidates).unwrap();
        assert_eq!(icon.path, dir.path().join("icons").join("app.png"));
        assert_eq!((icon.width, icon.height), (4, 4));
        assert_eq!(icon.rgba.len(), 4 * 4 * 4);
        assert_eq!(&icon.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_first(&candidates_in(&[dir.path().to_path_buf()])).is_none());
    }

    #[test]
    fn preferred_icon_wins() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom.png");
        write_png(&custom, 2);
        let icon = load_window_icon(Some(&custom)).unwrap();
        assert_eq!(icon.path, custom);
    }
}
