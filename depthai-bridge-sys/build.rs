use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=DEPTHAI_ANDROID_API_LIB_DIR");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let lib_dir = env::var("DEPTHAI_ANDROID_API_LIB_DIR").ok();

    if let Some(lib_dir) = &lib_dir {
        println!("cargo:rustc-link-search=native={}", lib_dir);
    }

    // host builds without the prebuilt library only compile the declarations
    if target_os == "android" || lib_dir.is_some() {
        println!("cargo:rustc-link-lib=dylib=depthai_android_api");
        if target_os == "android" {
            println!("cargo:rustc-link-lib=dylib=log");
        }
    }
}
