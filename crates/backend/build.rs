use std::env;
use std::fs;
use std::path::Path;

// Copies config.toml from the workspace root next to the built binary so
// the server finds it without an install step.
fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let out_dir = env::var("OUT_DIR").unwrap();
    let profile = env::var("PROFILE").unwrap();

    let out_path = Path::new(&out_dir);
    let target_dir = match out_path.ancestors().find(|p| p.ends_with(&profile)) {
        Some(dir) => dir,
        None => return,
    };

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent());

    if let Some(root) = workspace_root {
        let source = root.join("config.toml");
        if source.exists() {
            let dest = target_dir.join("config.toml");
            if let Err(err) = fs::copy(&source, &dest) {
                println!("cargo:warning=Failed to copy config.toml: {err}");
            }
        }
    }
}
