//! Layout store and session builder working together on a real directory.
//!
//! tmux and ssh are replaced by the recording fakes from `test_support`, so
//! these tests check exactly which multiplexer commands a layout produces.

use std::fs;

use sshmux::Error;
use sshmux::core::layout::WindowSpec;
use sshmux::core::remote::SshClient;
use sshmux::io::config::Config;
use sshmux::io::layout_store::LayoutStore;
use sshmux::session::{build_interactive, replay};
use sshmux::test_support::{
    MuxCall, RecordingMultiplexer, ScriptedDialog, ops_windows, write_layout,
};

fn store() -> (tempfile::TempDir, LayoutStore) {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = LayoutStore::new(temp.path().join("layouts"));
    (temp, store)
}

/// With the shipped config, the `ops` layout replays as three windows in
/// file order, window 0 is selected, and the session is attached last.
///
/// ```text
/// db1|db1|bash
/// db1|db1-tail|tail -f /var/log/syslog
/// web1|web1|bash
/// ```
#[test]
fn ops_layout_replays_in_file_order() {
    let (_temp, store) = store();
    write_layout(&store, "ops", &ops_windows()).expect("write layout");
    let mux = RecordingMultiplexer::new();
    let cfg = Config::default();
    let ssh = SshClient::new(cfg.ssh.program.as_str(), cfg.ssh.keep_shell);

    replay(&store, "ops", &mux, &ssh, &cfg.session_prefix).expect("replay");

    assert_eq!(
        mux.windows(),
        vec![
            (0, "db1".to_string()),
            (1, "db1-tail".to_string()),
            (2, "web1".to_string()),
        ]
    );
    assert_eq!(
        shlex::split(&mux.lines_for(0)[0]).expect("split"),
        vec!["ssh", "db1"]
    );
    assert_eq!(
        shlex::split(&mux.lines_for(1)[0]).expect("split"),
        vec!["ssh", "db1", "-t", "tail -f /var/log/syslog"]
    );
    assert_eq!(
        shlex::split(&mux.lines_for(2)[0]).expect("split"),
        vec!["ssh", "web1"]
    );

    let calls = mux.calls();
    assert_eq!(
        calls.first(),
        Some(&MuxCall::NewSession {
            session: "sshmux-ops".to_string()
        })
    );
    assert_eq!(
        &calls[calls.len() - 2..],
        &[
            MuxCall::SelectWindow {
                session: "sshmux-ops".to_string(),
                index: 0,
            },
            MuxCall::Attach {
                session: "sshmux-ops".to_string()
            },
        ]
    );
}

#[test]
fn interactive_build_then_replay_produces_same_windows() {
    let (_temp, store) = store();
    let built = RecordingMultiplexer::new();
    let dialog = ScriptedDialog::texts(&["1", "tail -f /var/log/syslog", "db1-tail", "0"]);

    build_interactive(
        &store,
        "ops",
        "db1\nweb1\n",
        &built,
        &SshClient::default(),
        &dialog,
        "sshmux-",
    )
    .expect("build");
    assert_eq!(store.read_all("ops").expect("read"), ops_windows());

    let replayed = RecordingMultiplexer::new();
    replay(&store, "ops", &replayed, &SshClient::default(), "sshmux-").expect("replay");

    assert_eq!(built.windows(), replayed.windows());
    for index in 0..3 {
        assert_eq!(built.lines_for(index), replayed.lines_for(index));
    }
}

#[test]
fn reading_twice_gives_identical_windows() {
    let (_temp, store) = store();
    write_layout(&store, "ops", &ops_windows()).expect("write layout");
    let first = store.read_all("ops").expect("first read");
    let second = store.read_all("ops").expect("second read");
    assert_eq!(first, second);
}

#[test]
fn fresh_store_lists_nothing() {
    let (_temp, store) = store();
    assert!(store.list().expect("list").is_empty());
}

#[test]
fn listed_names_round_trip_through_read() {
    let (_temp, store) = store();
    write_layout(&store, "ops", &ops_windows()).expect("write ops");
    let web = WindowSpec::new("web2", "web2", "").expect("spec");
    write_layout(&store, "web", &[web]).expect("write web");
    fs::write(store.dir().join("notes.txt"), "ignored\n").expect("write stray");

    let names: Vec<String> = store.list().expect("list").into_iter().collect();
    assert_eq!(names, vec!["ops", "web"]);
    for name in &names {
        assert!(!store.read_all(name).expect("read").is_empty());
    }
}

#[test]
fn malformed_record_stops_replay_before_tmux() {
    let (_temp, store) = store();
    fs::create_dir_all(store.dir()).expect("mkdir");
    fs::write(
        store.dir().join("ops.layout"),
        "db1|db1|bash\nweb1|only-two-fields\n",
    )
    .expect("write");
    let mux = RecordingMultiplexer::new();

    let err = replay(&store, "ops", &mux, &SshClient::default(), "sshmux-")
        .expect_err("malformed");

    match err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        Some(Error::MalformedRecord { line, content, .. }) => {
            assert_eq!(*line, 2);
            assert_eq!(content, "web1|only-two-fields");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(mux.calls().is_empty());
}

#[test]
fn missing_layout_is_not_found() {
    let (_temp, store) = store();
    let mux = RecordingMultiplexer::new();
    let err = replay(&store, "nope", &mux, &SshClient::default(), "sshmux-")
        .expect_err("missing");
    assert!(matches!(
        err.chain().find_map(|cause| cause.downcast_ref::<Error>()),
        Some(Error::NotFound { name }) if name == "nope"
    ));
    assert!(mux.calls().is_empty());
}
