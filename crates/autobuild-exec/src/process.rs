//! Process spawning with line-by-line output streaming.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use autobuild_core::{AutobuildError, ProcessCommand, ProcessOutput, ProcessSpawner, Result};

/// Spawns processes on the tokio runtime and logs their output as it arrives.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessSpawner;

impl TokioProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

/// Read `reader` to the end, logging each line. Returns the lines read.
async fn pump<R>(reader: Option<R>, program: &str, stream: &'static str) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Vec::new();
    };
    let mut lines = BufReader::new(reader).lines();
    let mut collected = Vec::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                info!(program = %program, stream, "{}", line);
                collected.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(program = %program, stream, error = %e, "Failed to read process output");
                break;
            }
        }
    }
    collected
}

#[async_trait]
impl ProcessSpawner for TokioProcessSpawner {
    async fn start(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
        let start = Instant::now();
        info!(
            command = %command.display(),
            dir = %command.working_dir.display(),
            "Starting process"
        );

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AutobuildError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout_lines, _, status) = tokio::join!(
            pump(stdout, &command.program, "stdout"),
            pump(stderr, &command.program, "stderr"),
            child.wait(),
        );
        let exit_code = status?.code().unwrap_or(-1);

        info!(
            command = %command.display(),
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "Process finished"
        );
        Ok(ProcessOutput {
            exit_code,
            stdout_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_streams_stdout_lines() {
        let cmd = ProcessCommand::new("sh", Path::new(".")).args(["-c", "echo one; echo two"]);
        let output = TokioProcessSpawner::new().start(&cmd).await.unwrap();
        assert!(output.succeeded());
        assert_eq!(output.stdout_lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_ok_with_code() {
        let cmd = ProcessCommand::new("sh", Path::new(".")).args(["-c", "echo oops >&2; exit 3"]);
        let output = TokioProcessSpawner::new().start(&cmd).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert!(output.stdout_lines.is_empty());
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let cmd = ProcessCommand::new("ls", dir.path());
        let output = TokioProcessSpawner::new().start(&cmd).await.unwrap();
        assert_eq!(output.stdout_lines, vec!["marker.txt"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let cmd = ProcessCommand::new("autobuild-no-such-program", Path::new("."));
        let err = TokioProcessSpawner::new().start(&cmd).await.unwrap_err();
        assert!(matches!(err, AutobuildError::Spawn { .. }));
        assert!(err.to_string().contains("autobuild-no-such-program"));
    }
}
