//! Generates `include/httpkit.h` from the `extern "C"` surface.

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => std::path::PathBuf::from(dir),
        Err(_) => return,
    };
    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")).unwrap_or_default();

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            let include = crate_dir.join("include");
            if std::fs::create_dir_all(&include).is_ok() {
                bindings.write_to_file(include.join("httpkit.h"));
            }
        }
        Err(err) => println!("cargo:warning=httpkit.h was not regenerated: {err}"),
    }
}
