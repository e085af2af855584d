// IMMDevice::Activate is gated on these in the windows crate; the endpoint
// backend is only built on Windows, so check the manifest here.
const ENDPOINT_FEATURES: [&str; 5] = [
    "Win32_Media_Audio",
    "Win32_Media_Audio_Endpoints",
    "Win32_System_Com",
    "Win32_System_Com_StructuredStorage",
    "Win32_System_Variant",
];

#[test]
fn windows_dependency_enables_endpoint_activation() {
    let manifest = include_str!("../Cargo.toml");
    let windows = manifest
        .split("[target.'cfg(target_os = \"windows\")'.dependencies]")
        .nth(1)
        .expect("windows target table");
    for feature in ENDPOINT_FEATURES {
        assert!(
            windows.contains(&format!("\"{feature}\"")),
            "{feature} not enabled"
        );
    }
}
