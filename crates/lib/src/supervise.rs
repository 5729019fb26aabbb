//! Installer process supervision.
//!
//! Runs one subprocess while two tasks copy its stdout and stderr, line by line,
//! to the caller's sinks. Both drains are joined after the process exits, so every
//! line the process wrote has been forwarded before the exit status is reported.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Errors that can occur while supervising a process.
#[derive(Debug, Error)]
pub enum SuperviseError {
  /// The process could not be started.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// Waiting for the process failed.
  #[error("failed to wait for '{program}': {source}")]
  Wait {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The process outlived its timeout and was killed.
  #[error("'{program}' did not finish within {limit:?}")]
  TimedOut { program: String, limit: Duration },

  /// The run was interrupted while waiting; the process was killed.
  #[error("interrupted while waiting for '{program}' to finish")]
  Interrupted { program: String },

  /// An output drain task panicked or was cancelled.
  #[error("output drain for '{program}' failed: {message}")]
  Drain { program: String, message: String },
}

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
  /// The process exited with this code.
  Code(i32),
  /// The process was terminated by a signal.
  Terminated,
}

impl Exit {
  pub fn success(&self) -> bool {
    matches!(self, Exit::Code(0))
  }
}

impl std::fmt::Display for Exit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Exit::Code(code) => write!(f, "exit code {code}"),
      Exit::Terminated => write!(f, "terminated by signal"),
    }
  }
}

/// A cloneable flag that fires once when the run should stop.
#[derive(Debug, Clone)]
pub struct Interrupt(watch::Receiver<bool>);

/// Fires the paired [`Interrupt`].
#[derive(Debug)]
pub struct InterruptTrigger(watch::Sender<bool>);

impl InterruptTrigger {
  pub fn fire(&self) {
    let _ = self.0.send(true);
  }
}

impl Interrupt {
  /// An interrupt that never fires.
  pub fn never() -> Self {
    let (_tx, rx) = watch::channel(false);
    Self(rx)
  }

  /// An interrupt fired by the returned trigger.
  pub fn manual() -> (InterruptTrigger, Self) {
    let (tx, rx) = watch::channel(false);
    (InterruptTrigger(tx), Self(rx))
  }

  /// An interrupt fired by Ctrl-C. Must be called inside a tokio runtime.
  pub fn ctrl_c() -> Self {
    let (trigger, interrupt) = Self::manual();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received");
        trigger.fire();
      }
    });
    interrupt
  }

  pub fn is_triggered(&self) -> bool {
    *self.0.borrow()
  }

  /// Resolves once the interrupt fires. Never resolves if it cannot fire anymore.
  pub async fn triggered(&self) {
    let mut rx = self.0.clone();
    if rx.wait_for(|fired| *fired).await.is_err() {
      std::future::pending::<()>().await;
    }
  }
}

/// Run `program` with `args`, echoing its output to this process's stdout and stderr.
pub async fn run(
  program: &Path,
  args: &[String],
  timeout: Option<Duration>,
  interrupt: &Interrupt,
) -> Result<Exit, SuperviseError> {
  let (exit, _, _) = run_with_sinks(program, args, timeout, interrupt, tokio::io::stdout(), tokio::io::stderr()).await?;
  Ok(exit)
}

/// Run `program` with `args`, copying its stdout into `stdout` and its stderr into `stderr`.
///
/// Returns the exit and the sinks once both streams are fully drained. On timeout or
/// interrupt the process is killed and the drains are abandoned.
pub async fn run_with_sinks<O, E>(
  program: &Path,
  args: &[String],
  timeout: Option<Duration>,
  interrupt: &Interrupt,
  stdout: O,
  stderr: E,
) -> Result<(Exit, O, E), SuperviseError>
where
  O: AsyncWrite + Unpin + Send + 'static,
  E: AsyncWrite + Unpin + Send + 'static,
{
  let program_name = program.display().to_string();
  debug!(program = %program_name, ?args, "spawning process");

  let mut child = Command::new(program)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|e| SuperviseError::Spawn {
      program: program_name.clone(),
      source: e,
    })?;

  let (child_out, child_err) = match (child.stdout.take(), child.stderr.take()) {
    (Some(out), Some(err)) => (out, err),
    _ => {
      return Err(SuperviseError::Spawn {
        program: program_name,
        source: io::Error::other("child output pipes unavailable"),
      });
    }
  };

  let out_task = tokio::spawn(drain_lines(child_out, stdout));
  let err_task = tokio::spawn(drain_lines(child_err, stderr));

  let waited = tokio::select! {
    waited = wait_for(&mut child, timeout) => waited,
    _ = interrupt.triggered() => Waited::Interrupted,
  };

  let exit = match waited {
    Waited::Exited(Ok(status)) => match status.code() {
      Some(code) => Exit::Code(code),
      None => Exit::Terminated,
    },
    Waited::Exited(Err(e)) => {
      abort_drains(&mut child, out_task, err_task).await;
      return Err(SuperviseError::Wait {
        program: program_name,
        source: e,
      });
    }
    Waited::TimedOut(limit) => {
      warn!(program = %program_name, ?limit, "process timed out, killing");
      abort_drains(&mut child, out_task, err_task).await;
      return Err(SuperviseError::TimedOut {
        program: program_name,
        limit,
      });
    }
    Waited::Interrupted => {
      abort_drains(&mut child, out_task, err_task).await;
      return Err(SuperviseError::Interrupted { program: program_name });
    }
  };

  let stdout = join_drain(&program_name, out_task).await?;
  let stderr = join_drain(&program_name, err_task).await?;

  debug!(program = %program_name, %exit, "process finished");
  Ok((exit, stdout, stderr))
}

enum Waited {
  Exited(io::Result<std::process::ExitStatus>),
  TimedOut(Duration),
  Interrupted,
}

async fn wait_for(child: &mut Child, timeout: Option<Duration>) -> Waited {
  match timeout {
    Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
      Ok(result) => Waited::Exited(result),
      Err(_) => Waited::TimedOut(limit),
    },
    None => Waited::Exited(child.wait().await),
  }
}

/// Kill the child and stop draining; descendants may still hold the pipes open.
async fn abort_drains<O, E>(child: &mut Child, out_task: JoinHandle<O>, err_task: JoinHandle<E>) {
  if let Err(e) = child.kill().await {
    debug!(error = %e, "kill failed, process already gone");
  }
  out_task.abort();
  err_task.abort();
}

async fn join_drain<W>(program: &str, task: JoinHandle<W>) -> Result<W, SuperviseError> {
  task.await.map_err(|e| SuperviseError::Drain {
    program: program.to_string(),
    message: e.to_string(),
  })
}

/// Copy `reader` into `sink` line by line until EOF.
///
/// Lines are forwarded as raw bytes. A failing sink does not stop the drain: the
/// rest of the stream is read and discarded so the child never blocks on a full pipe.
async fn drain_lines<R, W>(reader: R, mut sink: W) -> W
where
  R: AsyncRead + Unpin,
  W: AsyncWrite + Unpin,
{
  let mut reader = BufReader::new(reader);
  let mut line = Vec::new();
  let mut sink_ok = true;

  loop {
    line.clear();
    match reader.read_until(b'\n', &mut line).await {
      Ok(0) => break,
      Ok(_) => {
        if !line.ends_with(b"\n") {
          line.push(b'\n');
        }
        if sink_ok && let Err(e) = write_line(&mut sink, &line).await {
          warn!(error = %e, "failed to forward process output");
          sink_ok = false;
        }
      }
      Err(e) => {
        warn!(error = %e, "failed to read process output");
        break;
      }
    }
  }

  sink
}

async fn write_line<W: AsyncWrite + Unpin>(sink: &mut W, line: &[u8]) -> io::Result<()> {
  sink.write_all(line).await?;
  sink.flush().await
}
