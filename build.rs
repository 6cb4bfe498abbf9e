fn main() {
    println!("cargo:rerun-if-changed=src/xslt/generic_error.c");

    cc::Build::new()
        .file("src/xslt/generic_error.c")
        .warnings(true)
        .compile("evtx_transform_generic_error");

    // The shim calls into both libraries, list them after it.
    println!("cargo:rustc-link-lib=dylib=xslt");
    println!("cargo:rustc-link-lib=dylib=xml2");
}
