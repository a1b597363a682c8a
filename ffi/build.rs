//! Generate `include/hyperdrive.h` from the `extern "C"` surface.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let include_dir = crate_dir.join("include");
    if let Err(e) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=cannot create {}: {e}", include_dir.display());
        return;
    }
    let header = include_dir.join("hyperdrive.h");

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("HYPERDRIVE_H")
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        // A header that cannot be generated must not break the Rust build.
        Err(e) => println!("cargo:warning=cbindgen: {e}"),
    }
}
