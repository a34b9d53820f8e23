//! Build script for monotrack-player
//!
//! Stamps the binary with the git revision, build time and profile. The
//! values surface in `GET /health` and in the startup log line.

use std::process::Command;

fn git_revision() -> String {
    Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=MONOTRACK_GIT_HASH={}", git_revision());
    println!("cargo:rustc-env=MONOTRACK_BUILD_TIMESTAMP={}", built_at);
    println!("cargo:rustc-env=MONOTRACK_BUILD_PROFILE={}", profile);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
