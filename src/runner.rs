//! Channel that pipes command batches through an external program.
//!
//! Each batch spawns the configured program, writes the batch to its stdin,
//! closes it and captures stdout. Session handling (SSH, console servers,
//! authentication) is the program's business.

use crate::config::Config;
use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use translate::{Channel, ChannelError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct ProcessChannel {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessChannel {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Channel for the `[exec]` section of `config`
    pub fn from_config(config: &Config, timeout: Duration) -> Result<Self> {
        let program = config
            .exec
            .program
            .clone()
            .context("No exec program configured (set [exec] program in config.toml)")?;
        Ok(Self::new(program, config.exec.args.clone(), timeout))
    }

    /// Program and arguments, for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn timed_out(&self, command: &str) -> ChannelError {
        ChannelError::Timeout {
            command: command.lines().next().unwrap_or_default().to_string(),
            after: self.timeout,
        }
    }

    fn wait(
        &self,
        child: &mut Child,
        command: &str,
        deadline: Instant,
    ) -> Result<ExitStatus, ChannelError> {
        loop {
            let status = match child.try_wait() {
                Ok(status) => status,
                Err(e) => {
                    kill(child);
                    return Err(e.into());
                }
            };
            if let Some(status) = status {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                kill(child);
                return Err(self.timed_out(command));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Result of a pipe thread, waiting no longer than `deadline`.
    ///
    /// A background process started by the program can hold the pipe open
    /// after the program itself has exited.
    fn collect<T>(
        &self,
        pipe: &Receiver<std::io::Result<T>>,
        command: &str,
        deadline: Instant,
    ) -> Result<T, ChannelError> {
        match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => result.map_err(ChannelError::from),
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out(command)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(ChannelError::Other("pipe thread panicked".to_string()))
            }
        }
    }
}

impl Channel for ProcessChannel {
    fn execute(&self, command: &str) -> Result<String, ChannelError> {
        log::debug!(
            "Sending {} line(s) to {}",
            command.lines().count(),
            self.program
        );

        let deadline = Instant::now() + self.timeout;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed and drain on threads so a chatty program cannot block on a full pipe
        let input = command.to_string();
        let stdin = child.stdin.take();
        let writer = spawn_pipe(move || {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(input.as_bytes()) {
                // Program exited without reading everything; its status tells why
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        });
        let stdout = child.stdout.take();
        let stdout_reader = spawn_pipe(move || drain(stdout));
        let stderr = child.stderr.take();
        let stderr_reader = spawn_pipe(move || drain(stderr));

        let status = self.wait(&mut child, command, deadline)?;

        self.collect(&writer, command, deadline)?;
        let output = self.collect(&stdout_reader, command, deadline)?;
        let errors = self.collect(&stderr_reader, command, deadline)?;
        log::trace!("{} answered:\n{output}", self.program);

        if !status.success() {
            return Err(ChannelError::Other(format!(
                "{} exited with {status}: {}",
                self.program,
                errors.trim()
            )));
        }
        Ok(output)
    }
}

fn kill(child: &mut Child) {
    // The child may already be gone
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_pipe<T, F>(work: F) -> Receiver<std::io::Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone once the batch timed out
        let _ = tx.send(work());
    });
    rx
}

fn drain<R: Read>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
