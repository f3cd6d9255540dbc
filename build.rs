fn main() {
    // Rerun when a fixture script is added, removed or edited, so the
    // #[files] test cases are regenerated
    println!("cargo:rerun-if-changed=tests/scripts");

    let Ok(entries) = std::fs::read_dir("tests/scripts") else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}
