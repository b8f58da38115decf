//! Build script for pardec
//!
//! Captures build identification (git hash, profile) for the startup log and,
//! when the `avccelt` feature is enabled, adds the vendor decoder library
//! directory to the link search path.

use std::process::Command;

fn main() {
    // Capture git commit hash (short form, 8 characters)
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    if std::env::var_os("CARGO_FEATURE_AVCCELT").is_some() {
        if let Ok(dir) = std::env::var("AVCCELT_LIB_DIR") {
            println!("cargo:rustc-link-search=native={}", dir);
        }
    }

    println!("cargo:rerun-if-env-changed=AVCCELT_LIB_DIR");
    println!("cargo:rerun-if-changed=build.rs");
}
