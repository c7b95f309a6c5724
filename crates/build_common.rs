// Shared build script utilities for README-to-rustdoc generation.
// Include this in build.rs files with: include!("../build_common.rs");
//
// Required imports in the including file:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Prepare a crate's README.md for use as its rustdoc front page.
///
/// Intra-repo links are rewritten so rustdoc resolves them as modules:
/// `](src/foo.rs)` becomes `](foo)`. If the crate has no README an empty
/// doc page is emitted so `include_str!` in lib.rs always has a target.
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");

    let readme_path = Path::new(crate_dir).join("README.md");
    let content = fs::read_to_string(&readme_path).unwrap_or_default();

    let rustdoc_content = content.replace("](src/", "](").replace(".rs)", ")");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR set by cargo");
    let dest_path = Path::new(&out_dir).join("README_GENERATED.md");
    fs::write(dest_path, rustdoc_content).expect("write README_GENERATED.md");
}
