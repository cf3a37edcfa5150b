#![allow(dead_code)]

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// The parse-failure sentinels as a POSIX parent observes them (8-bit exit status).
pub const UNPARSEABLE_STATUS: i32 = 911911 & 0xff;

pub async fn run_xexec(args: &[&str], envs: &[(&str, &str)], input: Option<&[u8]>) -> Output {
    let mut cmd = Command::new(xexec_exe_path());
    cmd.args(args)
        .env_remove("XEXEC_DEBUG")
        .env_remove("XEXEC_QUIET")
        .envs(envs.iter().copied())
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().expect("failed to spawn xexec");
    if let Some(input) = input {
        let mut stdin = child.stdin.take().expect("stdin was not piped");
        let input = input.to_vec();
        tokio::spawn(async move {
            stdin
                .write_all(&input)
                .await
                .expect("failed to write xexec stdin");
        });
    }

    tokio::time::timeout(Duration::from_secs(10), child.wait_with_output())
        .await
        .expect("timed out waiting for xexec")
        .expect("failed to collect xexec output")
}

pub async fn run_xexec_os(args: &[&OsStr], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(xexec_exe_path());
    cmd.args(args)
        .env_remove("XEXEC_DEBUG")
        .env_remove("XEXEC_QUIET")
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    tokio::time::timeout(Duration::from_secs(10), cmd.output())
        .await
        .expect("timed out waiting for xexec")
        .expect("failed to collect xexec output")
}

fn xexec_exe_path() -> PathBuf {
    if let Ok(exe) = std::env::var("CARGO_BIN_EXE_xexec") {
        return PathBuf::from(exe);
    }

    let current = std::env::current_exe().expect("failed to read current test binary path");
    let target_dir = current
        .parent()
        .and_then(|path| path.parent())
        .expect("failed to derive target/debug directory from test binary path");
    let fallback = target_dir.join(format!("xexec{}", std::env::consts::EXE_SUFFIX));
    assert!(
        fallback.exists(),
        "xexec binary not found at {}",
        fallback.display()
    );
    fallback
}

pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
