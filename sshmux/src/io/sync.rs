//! Mirror a remote log directory from every host into local storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument, warn};

use crate::io::config::{Config, SyncTransport};
use crate::io::process::{ensure_success, run_command_with_timeout};

const OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// Copy `host:remote_dir` into `local_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub host: String,
    pub remote_dir: String,
    pub local_dir: PathBuf,
}

/// A file transfer strategy.
pub trait Transfer {
    /// Program and arguments for `request`.
    fn argv(&self, request: &SyncRequest) -> (String, Vec<String>);

    /// Run the transfer to completion.
    fn run(&self, request: &SyncRequest) -> Result<()>;
}

/// `rsync -az` over ssh.
#[derive(Debug, Clone)]
pub struct Rsync {
    pub ssh_program: String,
    pub timeout: Duration,
}

/// `scp -r`.
#[derive(Debug, Clone)]
pub struct Scp {
    pub timeout: Duration,
}

fn remote_contents(remote_dir: &str) -> String {
    remote_dir.trim_end_matches('/').to_string()
}

fn local_arg(local_dir: &Path) -> String {
    format!("{}/", local_dir.display())
}

impl Transfer for Rsync {
    fn argv(&self, request: &SyncRequest) -> (String, Vec<String>) {
        (
            "rsync".to_string(),
            vec![
                "-az".to_string(),
                "-e".to_string(),
                self.ssh_program.clone(),
                format!("{}:{}/", request.host, remote_contents(&request.remote_dir)),
                local_arg(&request.local_dir),
            ],
        )
    }

    fn run(&self, request: &SyncRequest) -> Result<()> {
        run_transfer(self.argv(request), self.timeout)
    }
}

impl Transfer for Scp {
    fn argv(&self, request: &SyncRequest) -> (String, Vec<String>) {
        (
            "scp".to_string(),
            vec![
                "-r".to_string(),
                format!("{}:{}/.", request.host, remote_contents(&request.remote_dir)),
                local_arg(&request.local_dir),
            ],
        )
    }

    fn run(&self, request: &SyncRequest) -> Result<()> {
        run_transfer(self.argv(request), self.timeout)
    }
}

#[instrument(skip_all, fields(program = %program))]
fn run_transfer((program, args): (String, Vec<String>), timeout: Duration) -> Result<()> {
    let mut cmd = Command::new(&program);
    cmd.args(&args);
    let output = run_command_with_timeout(cmd, timeout, OUTPUT_LIMIT_BYTES)
        .with_context(|| format!("run {program}"))?;
    if output.timed_out {
        return Err(anyhow!("{program} timed out after {timeout:?}"));
    }
    ensure_success(&program, &args, output.status, &output.stderr)
}

/// Transfer strategy selected by `cfg.sync.transport`.
pub fn transfer_for(cfg: &Config) -> Box<dyn Transfer> {
    let timeout = Duration::from_secs(cfg.sync.timeout_secs);
    match cfg.sync.transport {
        SyncTransport::Rsync => Box::new(Rsync {
            ssh_program: cfg.ssh.program.clone(),
            timeout,
        }),
        SyncTransport::Scp => Box::new(Scp { timeout }),
    }
}

/// Outcome for one host.
#[derive(Debug)]
pub struct HostSync {
    pub host: String,
    pub local_dir: PathBuf,
    pub result: Result<()>,
}

/// Per-host outcomes of a sync pass, in inventory order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub hosts: Vec<HostSync>,
}

impl SyncReport {
    pub fn failed(&self) -> impl Iterator<Item = &HostSync> {
        self.hosts.iter().filter(|h| h.result.is_err())
    }

    pub fn all_ok(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Human-readable one-line-per-host summary.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for host in &self.hosts {
            match &host.result {
                Ok(()) => lines.push(format!("{}: ok -> {}", host.host, host.local_dir.display())),
                Err(err) => lines.push(format!("{}: failed: {err:#}", host.host)),
            }
        }
        lines.join("\n")
    }
}

/// Sync every host sequentially. A failing host does not stop the rest.
#[instrument(skip_all, fields(hosts = hosts.len(), remote_dir))]
pub fn sync_all<T: Transfer + ?Sized>(
    transfer: &T,
    hosts: &[String],
    remote_dir: &str,
    logs_dir: &Path,
) -> SyncReport {
    let mut report = SyncReport::default();
    let mut seen = Vec::new();
    for host in hosts {
        if seen.contains(host) {
            continue;
        }
        seen.push(host.clone());
        let local_dir = logs_dir.join(host);
        let request = SyncRequest {
            host: host.clone(),
            remote_dir: remote_dir.to_string(),
            local_dir: local_dir.clone(),
        };
        let result = fs::create_dir_all(&local_dir)
            .with_context(|| format!("create directory {}", local_dir.display()))
            .and_then(|()| transfer.run(&request));
        match &result {
            Ok(()) => info!(host = %host, "logs synced"),
            Err(err) => warn!(host = %host, err = %err, "log sync failed"),
        }
        report.hosts.push(HostSync {
            host: host.clone(),
            local_dir,
            result,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingTransfer {
        fail_host: Option<String>,
        seen: RefCell<Vec<SyncRequest>>,
    }

    impl Transfer for RecordingTransfer {
        fn argv(&self, request: &SyncRequest) -> (String, Vec<String>) {
            ("true".to_string(), vec![request.host.clone()])
        }

        fn run(&self, request: &SyncRequest) -> Result<()> {
            self.seen.borrow_mut().push(request.clone());
            if self.fail_host.as_deref() == Some(request.host.as_str()) {
                return Err(anyhow!("connection refused"));
            }
            Ok(())
        }
    }

    fn request() -> SyncRequest {
        SyncRequest {
            host: "db1".to_string(),
            remote_dir: "/var/log/".to_string(),
            local_dir: PathBuf::from("/home/ops/.sshmux/logs/db1"),
        }
    }

    #[test]
    fn rsync_mirrors_directory_contents() {
        let rsync = Rsync {
            ssh_program: "ssh".to_string(),
            timeout: Duration::from_secs(1),
        };
        let (program, args) = rsync.argv(&request());
        assert_eq!(program, "rsync");
        assert_eq!(
            args,
            vec!["-az", "-e", "ssh", "db1:/var/log/", "/home/ops/.sshmux/logs/db1/"]
        );
    }

    #[test]
    fn scp_copies_directory_contents() {
        let scp = Scp {
            timeout: Duration::from_secs(1),
        };
        let (program, args) = scp.argv(&request());
        assert_eq!(program, "scp");
        assert_eq!(args, vec!["-r", "db1:/var/log/.", "/home/ops/.sshmux/logs/db1/"]);
    }

    #[test]
    fn transfer_follows_config() {
        let mut cfg = Config::default();
        assert_eq!(transfer_for(&cfg).argv(&request()).0, "rsync");
        cfg.sync.transport = SyncTransport::Scp;
        assert_eq!(transfer_for(&cfg).argv(&request()).0, "scp");
    }

    #[test]
    fn failing_host_does_not_stop_the_rest() {
        let temp = tempfile::tempdir().expect("tempdir");
        let transfer = RecordingTransfer {
            fail_host: Some("db1".to_string()),
            seen: RefCell::new(Vec::new()),
        };
        let hosts = vec!["db1".to_string(), "web1".to_string(), "db1".to_string()];
        let report = sync_all(&transfer, &hosts, "/var/log", temp.path());

        assert_eq!(transfer.seen.borrow().len(), 2);
        assert_eq!(report.hosts.len(), 2);
        assert!(!report.all_ok());
        let failed: Vec<&str> = report.failed().map(|h| h.host.as_str()).collect();
        assert_eq!(failed, vec!["db1"]);
        assert!(temp.path().join("web1").is_dir());
        assert!(report.summary().contains("web1: ok"));
        assert!(report.summary().contains("db1: failed: connection refused"));
    }
}
