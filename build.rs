use std::process::Command;

fn main() {
    println!("cargo:rustc-env=PROXYPICK_VERSION={}", build_version());
}

/// Prefer the git describe output; fall back to the crate version when the
/// build happens outside a git checkout.
fn build_version() -> String {
    Command::new("git")
        .args(&["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}
