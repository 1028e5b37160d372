use std::process::Command;

/// 运行命令并取 stdout，失败时返回 "unknown"
fn capture(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let commit = capture("git", &["rev-parse", "--short", "HEAD"]);
    let build_time = capture("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"]);
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=KBGEN_GIT_COMMIT={commit}");
    println!("cargo:rustc-env=KBGEN_BUILD_TIME={build_time}");
    println!("cargo:rustc-env=KBGEN_BUILD_TARGET={target}");

    // 仅在 git HEAD 变化时重新运行
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
}
