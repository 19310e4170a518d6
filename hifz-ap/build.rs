//! Build script for hifz-ap
//!
//! Embeds the git revision and build time reported by GET /health.

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    println!("cargo:rustc-env=HIFZ_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=HIFZ_BUILT_AT={}", built_at);
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
