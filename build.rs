// build.rs: link directives for the native libfov engine.
//
// The `libfov` feature binds `fov_beam`, `fov_circle` and friends from the C
// library. The extern block already carries `#[link(name = "fov")]`; this
// script only adds a search path when the library lives outside the system
// linker paths.

fn main() {
    // Pure-Rust builds (`cargo test` with fake engines) need nothing from here.
    if std::env::var_os("CARGO_FEATURE_LIBFOV").is_some() {
        if let Ok(dir) = std::env::var("LIBFOV_LIB_DIR") {
            println!("cargo:rustc-link-search=native={dir}");
        }
    }

    println!("cargo:rerun-if-env-changed=LIBFOV_LIB_DIR");
    println!("cargo:rerun-if-changed=build.rs");
}
