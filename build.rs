fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-env-changed=FIRMWARE_GIT_REV");

    // An explicit revision wins, e.g. from a CI checkout without .git.
    if std::env::var_os("FIRMWARE_GIT_REV").is_some() {
        return;
    }

    // Outside a git checkout the banner falls back to "unknown".
    if let Ok(output) = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
    {
        if output.status.success() {
            let revision = String::from_utf8_lossy(&output.stdout);
            println!("cargo:rustc-env=FIRMWARE_GIT_REV={}", revision.trim());
        } else {
            println!("cargo:warning=git rev-parse failed, banner shows an unknown revision");
        }
    }
}
