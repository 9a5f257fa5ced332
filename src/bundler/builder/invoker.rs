//! Bounded-time execution of external build tools.
//!
//! Output is captured line by line into shared buffers while the tool runs, so
//! whatever a tool printed before it timed out is still available for the
//! failure report. Tools run in their own process group on Unix and the whole
//! group is killed on timeout.

use crate::bundler::{
    builder::tool_detection::ToolResolver,
    error::{Error, Result},
    settings::ToolSettings,
};
use std::{
    path::PathBuf,
    process::Stdio,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    task::JoinHandle,
};

/// How long to wait for output readers after the child is gone.
const READER_GRACE: Duration = Duration::from_secs(2);

/// One fully resolved tool invocation.
#[derive(Debug, Clone)]
pub struct ExternalToolSpec {
    /// Tool name used in logs and errors.
    pub tool: String,
    /// Resolved executable.
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Working directory for this invocation only.
    pub working_dir: PathBuf,
    pub timeout: Duration,
    pub env: Vec<(String, String)>,
}

/// Output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Resolves tools once per run and executes them one at a time.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    resolver: ToolResolver,
}

impl ToolInvoker {
    pub fn new(resolver: ToolResolver) -> Self {
        Self { resolver }
    }

    /// Resolves `tool` on the search path (cached for the run).
    pub fn resolve(&mut self, tool: &ToolSettings) -> Result<PathBuf> {
        self.resolver.resolve(tool)
    }

    /// Runs `spec` to completion or until its timeout elapses.
    ///
    /// Never retries.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolTimeout`] if the time budget ran out; the process group is killed.
    /// - [`Error::ToolInvocationFailed`] on a non-zero exit, a signal, or a spawn failure.
    pub async fn invoke(&self, spec: &ExternalToolSpec) -> Result<ToolOutput> {
        log::info!(
            "Running {} {}",
            spec.tool,
            spec.args
                .iter()
                .map(|a| if a.contains(' ') { format!("\"{a}\"") } else { a.clone() })
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| Error::ToolInvocationFailed {
            tool: spec.tool.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: format!("failed to start {}: {e}", spec.program.display()),
        })?;

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_capture(stdout, stdout_buf.clone(), spec.tool.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_capture(stderr, stderr_buf.clone(), spec.tool.clone()));
        }

        let waited = tokio::time::timeout(spec.timeout, child.wait()).await;

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                terminate(&mut child, &spec.tool).await;
                drain(readers).await;
                return Err(Error::ToolInvocationFailed {
                    tool: spec.tool.clone(),
                    exit_code: None,
                    stdout: take(&stdout_buf),
                    stderr: format!("{}\nfailed waiting for process: {e}", take(&stderr_buf)),
                });
            }
            Err(_elapsed) => {
                log::warn!(
                    "{} timed out after {}s, terminating",
                    spec.tool,
                    spec.timeout.as_secs_f64()
                );
                terminate(&mut child, &spec.tool).await;
                drain(readers).await;
                return Err(Error::ToolTimeout {
                    tool: spec.tool.clone(),
                    timeout: spec.timeout,
                    stdout: take(&stdout_buf),
                    stderr: take(&stderr_buf),
                });
            }
        };

        drain(readers).await;
        let stdout = take(&stdout_buf);
        let stderr = take(&stderr_buf);

        if !status.success() {
            return Err(Error::ToolInvocationFailed {
                tool: spec.tool.clone(),
                exit_code: status.code(),
                stdout,
                stderr,
            });
        }

        Ok(ToolOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(0),
        })
    }
}

fn spawn_capture<R>(reader: R, buf: Arc<Mutex<Vec<u8>>>, tool: String) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    log::debug!("[{tool}] {}", String::from_utf8_lossy(&line).trim_end());
                    if let Ok(mut out) = buf.lock() {
                        out.extend_from_slice(&line);
                    }
                }
            }
        }
    })
}

async fn drain(readers: Vec<JoinHandle<()>>) {
    let all = async {
        for reader in readers {
            let _ = reader.await;
        }
    };
    if tokio::time::timeout(READER_GRACE, all).await.is_err() {
        log::debug!("Output readers still open after process exit; keeping captured output");
    }
}

fn take(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    buf.lock()
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default()
}

/// Kills the child's process group (Unix) and the child itself, then reaps it.
async fn terminate(child: &mut Child, tool: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::{sys::signal::{Signal, killpg}, unistd::Pid};
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            log::debug!("killpg for {tool} failed: {e}");
        }
    }
    if let Err(e) = child.kill().await {
        log::warn!("Failed to kill {tool}: {e}");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str, timeout: Duration) -> (ToolInvoker, ExternalToolSpec) {
        let mut invoker = ToolInvoker::new(ToolResolver::new(None, &std::env::temp_dir()));
        let program = invoker
            .resolve(&ToolSettings {
                program: "sh".into(),
                timeout,
                install_hint: String::new(),
                extra_args: Vec::new(),
            })
            .unwrap();
        let spec = ExternalToolSpec {
            tool: "sh".into(),
            program,
            args: vec!["-c".into(), script.into()],
            working_dir: std::env::temp_dir(),
            timeout,
            env: vec![("GREETING".into(), "hello".into())],
        };
        (invoker, spec)
    }

    #[tokio::test]
    async fn captures_output_and_env() {
        let (invoker, spec) = sh("echo \"$GREETING\"; echo oops >&2", Duration::from_secs(10));
        let out = invoker.invoke(&spec).await.unwrap();
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
        assert_eq!(out.exit_code, 0);
    }

    #[tokio::test]
    async fn non_zero_exit_is_invocation_failure() {
        let (invoker, spec) = sh("echo broken >&2; exit 3", Duration::from_secs(10));
        match invoker.invoke(&spec).await.unwrap_err() {
            Error::ToolInvocationFailed { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "broken\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn timeout_kills_and_keeps_partial_output() {
        let marker = tempfile::tempdir().unwrap();
        let late = marker.path().join("late");
        let script = format!(
            "echo started; sleep 5; touch '{}'",
            late.display()
        );
        let (invoker, spec) = sh(&script, Duration::from_millis(300));

        let begin = Instant::now();
        let err = invoker.invoke(&spec).await.unwrap_err();
        assert!(begin.elapsed() < Duration::from_secs(4));
        match err {
            Error::ToolTimeout { stdout, tool, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(stdout, "started\n");
            }
            other => panic!("unexpected error: {other}"),
        }

        // The whole group is gone: the script never reaches `touch`.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!late.exists());
    }

    #[tokio::test]
    async fn working_directory_is_per_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let (invoker, mut spec) = sh("pwd", Duration::from_secs(10));
        spec.working_dir = dir.path().to_path_buf();
        let out = invoker.invoke(&spec).await.unwrap();
        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
