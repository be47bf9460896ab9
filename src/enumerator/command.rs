//! External process execution and the generic line-per-device enumerator.

use super::DeviceEnumerator;
use crate::error::{MonitorError, Result};
use crate::snapshot::DeviceSnapshot;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_SLICE: Duration = Duration::from_millis(20);

/// Run `program` with `args` and return its stdout.
///
/// A non-zero exit status is an error carrying the tool's stderr. When
/// `timeout` is set the child is killed once it expires.
pub fn run_command(program: &str, args: &[String], timeout: Option<Duration>) -> Result<String> {
    log::debug!("running {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| MonitorError::Spawn {
            program: program.to_string(),
            source,
        })?;

    // Drain both pipes off-thread so a chatty tool can't block on a full pipe
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    // A limit too large to represent as an Instant is the same as no limit
    let deadline = timeout.and_then(|limit| Some((Instant::now().checked_add(limit)?, limit)));
    let status = match deadline {
        Some((deadline, limit)) => wait_with_deadline(&mut child, program, deadline, limit)?,
        None => child.wait()?,
    };

    let stdout = join_output(stdout);
    let stderr = join_output(stderr);

    if !status.success() {
        let detail = stderr.trim();
        return Err(MonitorError::CommandFailed(if detail.is_empty() {
            format!("{} exited with {}", program, status)
        } else {
            format!("{} exited with {}: {}", program, status, detail)
        }));
    }

    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_output(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn wait_with_deadline(
    child: &mut Child,
    program: &str,
    deadline: Instant,
    limit: Duration,
) -> Result<std::process::ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MonitorError::Timeout {
                program: program.to_string(),
                limit,
            });
        }
        thread::sleep(WAIT_SLICE);
    }
}

/// Parse free-form tabular output, one device per line.
///
/// Blank lines, the `Name ...` column header and `----` separator rows are
/// skipped; everything else is kept verbatim (trimmed).
pub fn parse_table_lines(output: &str) -> DeviceSnapshot {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Name") && !line.starts_with("----"))
        .collect()
}

/// Enumerator for an arbitrary user-supplied listing command.
#[derive(Debug, Clone)]
pub struct CommandEnumerator {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandEnumerator {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl DeviceEnumerator for CommandEnumerator {
    fn name(&self) -> &str {
        "command"
    }

    fn enumerate(&self) -> Result<DeviceSnapshot> {
        let output = run_command(&self.program, &self.args, self.timeout)?;
        Ok(parse_table_lines(&output))
    }
}
