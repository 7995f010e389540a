//! Locates the system ROHC library (rohc-lib.org, package `librohc`) the
//! same way any other `-sys`-style crate in this ecosystem would: via
//! `pkg-config`, falling back to linking `rohc` by name so a manual
//! `ROHC_LIB_DIR`/`ROHC_INCLUDE_DIR` override still works in a cross build.

use std::env;

fn main() {
    if pkg_config::Config::new()
        .atleast_version("1.7")
        .probe("rohc")
        .is_ok()
    {
        return;
    }

    if let Ok(dir) = env::var("ROHC_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }
    println!("cargo:rustc-link-lib=dylib=rohc");
}
