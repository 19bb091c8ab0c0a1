//! Running `helm` / `kubectl` and mapping their failures to backend errors

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendErrorKind};

/// Extra time granted on top of the tool's own `--timeout` before giving up on it
const TIMEOUT_GRACE: Duration = Duration::from_secs(30);

/// An external CLI tool invoked by a backend
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    grace: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            grace: TIMEOUT_GRACE,
        }
    }

    /// Override the time granted past the caller's timeout
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Run the tool and return its stdout.
    ///
    /// `stdin` is fed to the child while its output is collected. The call is
    /// bounded by `timeout` plus a grace period so the tool can honour its own
    /// deadline first; past that the child is killed.
    ///
    /// The child runs in its own process group, so a terminal Ctrl-C reaches
    /// only this process and an in-flight helm/kubectl call finishes.
    pub async fn run(
        &self,
        args: &[String],
        stdin: Option<&str>,
        timeout: Duration,
    ) -> Result<String, BackendError> {
        let command_line = format!("{} {}", self.program.display(), args.join(" "));
        debug!(command = %command_line, "Running command");

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            BackendError::rejected(format!("failed to start {}: {}", self.program.display(), e))
        })?;

        let stdin_pipe = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let feed = async move {
            if let (Some(input), Some(mut pipe)) = (stdin, stdin_pipe) {
                match pipe.write_all(input.as_bytes()).await {
                    // The tool exited without reading; its status tells why
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    other => other?,
                }
                // Dropping the pipe lets the tool see EOF
            }
            Ok::<(), std::io::Error>(())
        };

        let bound = timeout.saturating_add(self.grace);
        let finished = tokio::time::timeout(bound, async {
            let ((), stdout, stderr, status) = tokio::try_join!(
                feed,
                read_pipe(stdout_pipe),
                read_pipe(stderr_pipe),
                child.wait()
            )?;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(result) => result.map_err(|e| {
                BackendError::unreachable(format!("{} failed: {}", command_line, e))
            })?,
            Err(_) => {
                warn!(command = %command_line, "Command exceeded its deadline, killing it");
                if let Err(e) = child.kill().await {
                    warn!(command = %command_line, error = %e, "Failed to kill command");
                }
                return Err(BackendError::timeout(bound));
            }
        };

        if status.success() {
            Ok(String::from_utf8_lossy(&stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
            Err(BackendError::new(classify_failure(&stderr), stderr))
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Best-effort mapping of helm/kubectl error text to an error kind
pub fn classify_failure(stderr: &str) -> BackendErrorKind {
    let text = stderr.to_lowercase();

    const UNREACHABLE: &[&str] = &[
        "kubernetes cluster unreachable",
        "unable to connect to the server",
        "connection refused",
        "no such host",
        "i/o timeout",
        "tls handshake timeout",
    ];
    const TIMEOUT: &[&str] = &["timed out waiting", "context deadline exceeded", "timeout"];

    if UNREACHABLE.iter().any(|p| text.contains(p)) {
        BackendErrorKind::Unreachable
    } else if TIMEOUT.iter().any(|p| text.contains(p)) {
        BackendErrorKind::Timeout
    } else if text.contains("not found") {
        BackendErrorKind::NotFound
    } else {
        BackendErrorKind::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unreachable() {
        assert_eq!(
            classify_failure("Error: Kubernetes cluster unreachable: Get \"https://10.0.0.1:6443/version\": dial tcp: connection refused"),
            BackendErrorKind::Unreachable
        );
        assert_eq!(
            classify_failure("Unable to connect to the server: dial tcp: lookup api.example: no such host"),
            BackendErrorKind::Unreachable
        );
    }

    #[test]
    fn test_classify_timeout() {
        assert_eq!(
            classify_failure("Error: UPGRADE FAILED: context deadline exceeded"),
            BackendErrorKind::Timeout
        );
        assert_eq!(
            classify_failure("error: timed out waiting for the condition on deployments/colqwen2"),
            BackendErrorKind::Timeout
        );
    }

    #[test]
    fn test_classify_not_found() {
        assert_eq!(
            classify_failure("Error: release: not found"),
            BackendErrorKind::NotFound
        );
        assert_eq!(
            classify_failure("Error: uninstall: Release not loaded: qdrant: release: not found"),
            BackendErrorKind::NotFound
        );
    }

    #[test]
    fn test_classify_rejected() {
        assert_eq!(
            classify_failure("Error: values don't meet the specifications of the schema(s)"),
            BackendErrorKind::Rejected
        );
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    /// `(pid, process group)` from a `/proc/<pid>/stat` line
    #[cfg(target_os = "linux")]
    fn pid_and_group(stat: &str) -> (String, String) {
        let pid = stat.split_whitespace().next().unwrap().to_string();
        let after_name = &stat[stat.rfind(')').unwrap() + 1..];
        let group = after_name.split_whitespace().nth(2).unwrap().to_string();
        (pid, group)
    }

    #[tokio::test]
    async fn test_stdin_is_fed_to_tool() {
        let out = ToolCommand::new("cat")
            .run(&[], Some("persistence:\n  enabled: true\n"), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out, "persistence:\n  enabled: true\n");
    }

    #[tokio::test]
    async fn test_failure_is_classified_from_stderr() {
        let err = ToolCommand::new("sh")
            .run(
                &sh("echo 'Error: release: not found' >&2; exit 1"),
                None,
                Duration::from_secs(10),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::NotFound);
        assert_eq!(err.message, "Error: release: not found");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timed_out_tool_is_killed() {
        let pid_file =
            std::env::temp_dir().join(format!("ragstack-tool-{}.pid", uuid::Uuid::new_v4()));
        let script = format!("echo $$ > {}; exec sleep 120", pid_file.display());

        let started = std::time::Instant::now();
        let err = ToolCommand::new("sh")
            .with_grace(Duration::ZERO)
            .run(&sh(&script), None, Duration::from_millis(1500))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(30));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let _ = std::fs::remove_file(&pid_file);
        assert!(
            !std::path::Path::new(&format!("/proc/{}", pid.trim())).exists(),
            "tool {} still running after its deadline",
            pid.trim()
        );
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_tool_runs_in_its_own_process_group() {
        let stat = ToolCommand::new("cat")
            .run(&["/proc/self/stat".to_string()], None, Duration::from_secs(10))
            .await
            .unwrap();
        let (child_pid, child_group) = pid_and_group(&stat);
        let (_, our_group) = pid_and_group(&std::fs::read_to_string("/proc/self/stat").unwrap());

        // Terminal interrupts go to our group, not the tool's
        assert_eq!(child_group, child_pid);
        assert_ne!(child_group, our_group);
    }

    #[tokio::test]
    async fn test_missing_program_is_rejected() {
        let tool = ToolCommand::new("/nonexistent/ragstack-test-tool");
        let err = tool
            .run(&["version".to_string()], None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Rejected);
    }
}
