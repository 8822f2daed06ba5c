//! Drives the built binary through piped stdin, the way a script would.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn scratch_home(rc: Option<&str>) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let home = std::env::temp_dir().join(format!(
        "smallsh-home-{}-{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::SeqCst)
    ));
    fs::create_dir_all(&home).expect("create home");
    if let Some(rc) = rc {
        fs::write(home.join(".smallshrc"), rc).expect("write rc");
    }
    home
}

fn run_shell(args: &[&str], rc: Option<&str>, input: &str) -> Output {
    let home = scratch_home(rc);
    let mut child = Command::new(env!("CARGO_BIN_EXE_smallsh"))
        .args(args)
        .env("HOME", &home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn smallsh");

    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write input");
    let output = child.wait_with_output().expect("wait for smallsh");
    let _ = fs::remove_dir_all(home);
    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn background_pid(out: &str) -> u32 {
    let (_, rest) = out
        .split_once("background pid is ")
        .unwrap_or_else(|| panic!("no background notice in {:?}", out));
    rest.split_whitespace()
        .next()
        .and_then(|pid| pid.parse().ok())
        .unwrap_or_else(|| panic!("no pid after notice in {:?}", out))
}

#[test]
fn finished_job_is_reported_exactly_once() {
    for args in [&[][..], &["-q"][..]] {
        let output = run_shell(args, None, "true &\nsleep 1\nstatus\nexit\n");
        let out = stdout(&output);

        let pid = background_pid(&out);
        let done = format!("background pid {} is done: exit value 0", pid);
        assert_eq!(out.matches(&done).count(), 1, "args {:?}: {:?}", args, out);
        assert_eq!(out.matches(" is done: ").count(), 1, "args {:?}: {:?}", args, out);
        assert!(output.status.success());
    }
}

#[test]
fn status_ignores_background_jobs() {
    let started = Instant::now();
    let output = run_shell(&[], None, "false\nsleep 5 &\nstatus\nexit\n");
    let out = stdout(&output);

    assert!(out.contains("background pid is "), "{:?}", out);
    assert!(out.contains("exit value 1"), "{:?}", out);
    // `exit` terminates the outstanding job instead of waiting for it.
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn end_of_input_exits_like_exit() {
    let started = Instant::now();
    let output = run_shell(&[], None, "sleep 5 &\n");

    assert!(stdout(&output).contains("background pid is "));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn bad_settings_do_not_stop_startup() {
    let output = run_shell(&[], Some("max_jobs = 0\nlog_level = loud\n"), "status\nexit\n");

    assert!(stdout(&output).contains("exit value 0"));
    assert_eq!(output.status.code(), Some(0));
}
