use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::ToolsConfig;
use crate::error::AuditError;

/// Typed result of one external tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Resolved external tool programs shared by the expander and mounter.
#[derive(Debug, Clone)]
pub struct ToolSet {
    pub sevenzip: String,
    pub unzip: String,
    pub mount: String,
    pub unmount: String,
    pub timeout: Duration,
}

impl ToolSet {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            sevenzip: config.sevenzip.clone(),
            unzip: config.unzip.clone(),
            mount: config.mount.clone(),
            unmount: config.unmount.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new(&ToolsConfig::default())
    }
}

/// A single external tool invocation with a bounded timeout.
///
/// A missing binary maps to `ToolMissing`, a non-zero exit to
/// `ToolFailed` with captured stderr, and an expired timeout kills the
/// child and maps to `ToolTimeout`. Callers never see a raw OS command
/// string.
#[derive(Debug)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion, enforcing the timeout.
    pub fn run(&self) -> Result<ToolOutput, AuditError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AuditError::ToolMissing(self.program.clone())
                } else {
                    AuditError::Io(e)
                }
            })?;

        // Drain pipes on separate threads so a chatty tool cannot
        // deadlock against a full pipe buffer while we poll for exit.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = self.wait_with_deadline(&mut child)?;
        let stdout = join_reader(stdout);
        let stderr = join_reader(stderr);

        if status.success() {
            Ok(ToolOutput {
                code: status.code(),
                stdout,
                stderr,
            })
        } else {
            Err(AuditError::ToolFailed {
                tool: self.program.clone(),
                code: status.code(),
                stderr: stderr.trim().to_string(),
            })
        }
    }

    fn wait_with_deadline(
        &self,
        child: &mut Child,
    ) -> Result<std::process::ExitStatus, AuditError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AuditError::ToolTimeout {
                    tool: self.program.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
            std::thread::sleep(Duration::from_millis(25));
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<std::thread::JoinHandle<String>> {
    source.map(|mut r| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = r.read_to_string(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
