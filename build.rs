#[cfg(windows)]
fn main() {
    let mut res = winres::WindowsResource::new();
    if std::path::Path::new("icons/icon.ico").exists() {
        res.set_icon("icons/icon.ico");
    }
    res.set("ProductName", "GammaSwitch");
    res.set("FileDescription", "GammaSwitch - Per-application display calibration");
    res.set("LegalCopyright", "© 2025 GammaSwitch Contributors");
    res.set("CompanyName", "GammaSwitch");
    res.set("OriginalFilename", "gammaswitch.exe");

    if let Err(e) = res.compile() {
        eprintln!("Failed to compile Windows resource: {}", e);
    }
}

#[cfg(not(windows))]
fn main() {
}
