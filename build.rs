//! Embeds version details for `--version`.
//!
//! `GIT_HASH` is the short commit hash, empty outside a git checkout.
//! `ON_RELEASE_TAG` is `true` when HEAD is exactly a tag; release builds then
//! report the package version instead of `dev@<hash>`.

use std::process::{Command, Output};

fn git(args: &[&str]) -> Option<Output> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
}

fn main() {
    for path in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let hash = git(&["rev-parse", "--short", "HEAD"])
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_owned())
        .unwrap_or_default();
    let release = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    println!("cargo:rustc-env=GIT_HASH={hash}");
    println!("cargo:rustc-env=ON_RELEASE_TAG={release}");
}
