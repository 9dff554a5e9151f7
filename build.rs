use std::process::Command;

fn main() {
    let build_date = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    println!("cargo:rustc-env=BUILD_DATE={build_date}");

    for (var, args) in [
        ("GIT_HASH", ["rev-parse", "--short", "HEAD"]),
        ("GIT_BRANCH", ["rev-parse", "--abbrev-ref", "HEAD"]),
    ] {
        let value = git(&args).unwrap_or_else(|| "unknown".to_string());
        println!("cargo:rustc-env={var}={value}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
