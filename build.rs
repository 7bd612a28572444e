// Build script for ShellBar
// Embeds Windows resources (manifest, version information)

fn main() {
    // Only run on Windows
    #[cfg(target_os = "windows")]
    {
        // Embed Windows resources if the .rc file exists
        let rc_path = std::path::Path::new("resources/shellbar.rc");
        if rc_path.exists() {
            embed_resource::compile("resources/shellbar.rc", embed_resource::NONE);
        }

        // Link with required Windows libraries
        println!("cargo:rustc-link-lib=user32");
        println!("cargo:rustc-link-lib=gdi32");
        println!("cargo:rustc-link-lib=shell32");
        println!("cargo:rustc-link-lib=comctl32");
    }

    // Rebuild if resources change
    println!("cargo:rerun-if-changed=resources/shellbar.rc");
    println!("cargo:rerun-if-changed=resources/shellbar.manifest");
    println!("cargo:rerun-if-changed=build.rs");
}
