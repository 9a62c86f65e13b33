//! User command execution
//!
//! Setup and finalize commands are arbitrary shell strings. They run as
//! `<shell> -c <command>` with the working directory set on the child, so
//! nothing is spliced into a larger command line.

use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Shell used when none is configured
pub const DEFAULT_SHELL: &str = "sh";

/// What happens to a child's stdout and stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Discard all output
    #[default]
    Quiet,
    /// Forward each line to our stdout as it arrives
    Stream,
}

/// Runs user commands through a shell
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
    output: OutputMode,
}

impl CommandRunner {
    pub fn new(shell: impl Into<String>, output: OutputMode) -> Self {
        Self {
            shell: shell.into(),
            output,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output
    }

    /// Run `command` in `working_dir` and return its exit status
    ///
    /// A non-zero status is returned as-is; deciding whether it is a
    /// failure is up to the caller. A child killed by a signal reports -1.
    /// `Err` means the shell could not be started at all.
    pub async fn run(&self, command: &str, working_dir: &Path) -> io::Result<i32> {
        match self.output {
            OutputMode::Quiet => self.run_quiet(command, working_dir).await,
            OutputMode::Stream => {
                self.run_streaming(command, working_dir, &|line: String| println!("{}", line))
                    .await
            }
        }
    }

    fn command(&self, command: &str, working_dir: &Path) -> Command {
        debug!(
            "Executing in {}: {} -c {:?}",
            working_dir.display(),
            self.shell,
            command
        );

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command).current_dir(working_dir);
        cmd
    }

    async fn run_quiet(&self, command: &str, working_dir: &Path) -> io::Result<i32> {
        let status = self
            .command(command, working_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        Ok(status.code().unwrap_or(-1))
    }

    pub(crate) async fn run_streaming(
        &self,
        command: &str,
        working_dir: &Path,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> io::Result<i32> {
        let mut child = self
            .command(command, working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let lines = forward_child_output(&mut child, on_output).await;
        let status = child.wait().await?;
        debug!("Command produced {} lines, status {}", lines, status);

        Ok(status.code().unwrap_or(-1))
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL, OutputMode::Quiet)
    }
}

/// Forward stdout+stderr of a child process line by line, in arrival order.
///
/// Lines are decoded lossily, so bytes that are not UTF-8 never stop the
/// forwarding. Returns the number of lines forwarded once both streams are
/// closed.
async fn forward_child_output(
    child: &mut Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> usize {
    let mut stdout_reader = child.stdout.take().map(BufReader::new);
    let mut stderr_reader = child.stderr.take().map(BufReader::new);
    // Kept across iterations: a cancelled read leaves its partial line here
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let mut stdout_done = stdout_reader.is_none();
    let mut stderr_done = stderr_reader.is_none();
    let mut forwarded = 0;

    while !stdout_done || !stderr_done {
        tokio::select! {
            line = next_line(&mut stderr_reader, &mut stderr_buf), if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(line);
                        forwarded += 1;
                    }
                    None => stderr_done = true,
                }
            }
            line = next_line(&mut stdout_reader, &mut stdout_buf), if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(line);
                        forwarded += 1;
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    forwarded
}

/// Read the next line, without its terminator
///
/// `None` means the stream is finished. On a read error the reader is
/// dropped, closing our end of the pipe so the child cannot block on it.
async fn next_line<R>(reader: &mut Option<R>, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let stream = reader.as_mut()?;

    match stream.read_until(b'\n', buf).await {
        Ok(0) if buf.is_empty() => None,
        Ok(_) => {
            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            Some(line)
        }
        Err(e) => {
            warn!("Stopped reading command output: {}", e);
            *reader = None;
            None
        }
    }
}
