//! CLI tests for the non-interactive subcommands.
//!
//! Spawns the sshmux binary with `HOME` pointed at a temporary directory and
//! checks output and exit codes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use sshmux::exit_codes;
use sshmux::io::layout_store::LayoutStore;
use sshmux::test_support::{TestHome, ops_windows, write_layout};

fn sshmux(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sshmux"))
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run sshmux")
}

#[test]
fn list_on_fresh_home_prints_nothing() {
    let home = TestHome::new().expect("home");
    let output = sshmux(home.path(), &["list"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(output.stdout.is_empty());
}

#[test]
fn list_prints_sorted_layout_names() {
    let home = TestHome::new().expect("home");
    let store = LayoutStore::new(home.path().join(".sshmux/layouts"));
    write_layout(&store, "web", &ops_windows()).expect("write web");
    write_layout(&store, "ops", &ops_windows()).expect("write ops");

    let output = sshmux(home.path(), &["list"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "ops\nweb\n");
}

#[test]
fn load_missing_layout_exits_with_not_found() {
    let home = TestHome::new().expect("home");
    let output = sshmux(home.path(), &["load", "nope"]);
    assert_eq!(output.status.code(), Some(exit_codes::NOT_FOUND));
    assert!(String::from_utf8_lossy(&output.stderr).contains("layout 'nope' not found"));
}

#[test]
fn load_with_bad_name_exits_with_invalid_input() {
    let home = TestHome::new().expect("home");
    let output = sshmux(home.path(), &["load", "../etc"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID_INPUT));
}

#[test]
fn init_config_writes_defaults_once() {
    let home = TestHome::new().expect("home");
    let config = home.path().join(".sshmux/config.toml");

    let output = sshmux(home.path(), &["init-config"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let written = fs::read_to_string(&config).expect("read config");
    assert!(written.contains("session_prefix = \"sshmux-\""));

    fs::write(&config, "session_prefix = \"custom-\"\n").expect("edit config");
    let output = sshmux(home.path(), &["init-config"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        fs::read_to_string(&config).expect("read config"),
        "session_prefix = \"custom-\"\n"
    );
}

#[test]
fn config_option_moves_layouts_dir() {
    let home = TestHome::new().expect("home");
    let layouts = home.path().join("elsewhere");
    write_layout(&LayoutStore::new(&layouts), "ops", &ops_windows()).expect("write");
    let config = home.path().join("custom.toml");
    fs::write(
        &config,
        format!("[paths]\nlayouts_dir = \"{}\"\n", layouts.display()),
    )
    .expect("write config");

    let output = sshmux(
        home.path(),
        &["--config", config.to_str().expect("utf-8 path"), "list"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "ops\n");
}

#[test]
fn invalid_config_exits_with_invalid_input() {
    let home = TestHome::new().expect("home");
    let config = home.path().join("bad.toml");
    fs::write(&config, "session_prefix = \"\"\n").expect("write config");

    let output = sshmux(
        home.path(),
        &["--config", config.to_str().expect("utf-8 path"), "list"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::INVALID_INPUT));
}

#[test]
fn sync_without_inventory_exits_with_invalid_input() {
    let home = TestHome::new().expect("home");
    let output = sshmux(home.path(), &["sync"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID_INPUT));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no server list"));
}
