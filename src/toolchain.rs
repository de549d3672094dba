//! External build toolchain invocation.
//!
//! The toolchain is an opaque collaborator: a command line that reads the
//! staging directory and either produces the artifact tree or fails. Two
//! steps run per build: dependency resolution (best-effort) and the release
//! build (must succeed). Captured output is bounded per invocation, and a
//! successful exit code alone is never trusted; the artifact tree must exist
//! on disk.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::BuildError;

/// Longest failure excerpt taken from captured output.
const MAX_EXCERPT_LEN: usize = 2000;

/// Exit status plus bounded captured output of one toolchain invocation.
///
/// `success` reflects the exit code only. The overall build success
/// additionally requires the artifact post-condition checked by
/// [`build_release`].
#[derive(Debug)]
pub struct CommandOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Short excerpt of the captured output for failure messages, preferring
    /// stderr. Build tools print the actual error last, so the tail is kept.
    pub fn excerpt(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if text.is_empty() {
            return "(no output captured)".to_string();
        }
        if text.len() <= MAX_EXCERPT_LEN {
            return text.to_string();
        }
        let mut start = text.len() - MAX_EXCERPT_LEN;
        while !text.is_char_boundary(start) {
            start += 1;
        }
        format!("... {}", &text[start..])
    }
}

/// Runs `command` through the platform shell with `cwd` as the working
/// directory, capturing at most `output_limit` bytes per stream.
///
/// Exceeding the limit kills the child and fails the invocation; a non-zero
/// exit is not an error here, it is reported through the outcome.
pub async fn run_shell(
    stage: &'static str,
    command: &str,
    cwd: &Path,
    output_limit: u64,
) -> Result<CommandOutcome, BuildError> {
    let (shell, shell_arg) = platform_shell();
    debug!(stage, command, cwd = %cwd.display(), "spawning toolchain process");

    let mut child = Command::new(shell)
        .arg(shell_arg)
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BuildError::Build(format!("failed to spawn `{command}`: {e}")))?;

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let (stdout, stderr) = tokio::join!(
        read_capped(stdout_pipe, output_limit),
        read_capped(stderr_pipe, output_limit),
    );

    let (stdout, stderr) = match (stdout, stderr) {
        (Ok(Some(out)), Ok(Some(err))) => (out, err),
        (Ok(None), _) | (_, Ok(None)) => {
            let _ = child.kill().await;
            return Err(BuildError::OutputLimit {
                stage,
                limit: output_limit,
            });
        }
        (Err(e), _) | (_, Err(e)) => {
            let _ = child.kill().await;
            return Err(BuildError::Build(format!(
                "failed to capture {stage} output: {e}"
            )));
        }
    };

    let status = child
        .wait()
        .await
        .map_err(|e| BuildError::Build(format!("failed to wait for `{command}`: {e}")))?;

    debug!(stage, code = ?status.code(), "toolchain process finished");
    Ok(CommandOutcome {
        success: status.success(),
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

/// Runs the dependency-resolution command.
///
/// Best-effort: every failure mode (spawn error, non-zero exit, output over
/// the cap) is logged and tolerated, and the pipeline continues.
pub async fn resolve_dependencies(config: &Config, staging: &Path) {
    match run_shell("pub-get", &config.deps_cmd, staging, config.deps_output_limit).await {
        Ok(outcome) if outcome.success => {
            debug!(command = %config.deps_cmd, "dependency resolution succeeded");
        }
        Ok(outcome) => {
            warn!(
                command = %config.deps_cmd,
                exit = %describe_exit(outcome.exit_code),
                detail = %outcome.excerpt(),
                "dependency resolution failed (continuing)"
            );
        }
        Err(e) => {
            warn!(command = %config.deps_cmd, error = %e, "dependency resolution failed (continuing)");
        }
    }
}

/// Runs the release-build command and checks the artifact post-condition.
///
/// Toolchains can exit zero while failing to produce output, so the artifact
/// tree's existence on disk is part of the success contract. Returns the
/// absolute artifact path.
pub async fn build_release(config: &Config, staging: &Path) -> Result<PathBuf, BuildError> {
    let outcome = run_shell(
        "build",
        &config.build_cmd,
        staging,
        config.build_output_limit,
    )
    .await?;

    if !outcome.success {
        return Err(BuildError::Build(format!(
            "`{}` exited with {}: {}",
            config.build_cmd,
            describe_exit(outcome.exit_code),
            outcome.excerpt()
        )));
    }

    let artifact = staging.join(&config.artifact_dir);
    let is_dir = tokio::fs::metadata(&artifact)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(BuildError::ArtifactMissing(config.artifact_dir.clone()));
    }

    Ok(artifact)
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Shell used to interpret the configured command strings.
fn platform_shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Reads from `pipe` up to `limit` bytes. Returns `Ok(None)` when the stream
/// exceeded the limit.
async fn read_capped<R>(pipe: Option<R>, limit: u64) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(Some(String::new()));
    };
    let mut buf = Vec::new();
    pipe.take(limit + 1).read_to_end(&mut buf).await?;
    if buf.len() as u64 > limit {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(build_cmd: &str) -> Config {
        Config {
            deps_cmd: "true".to_string(),
            build_cmd: build_cmd.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let dir = TempDir::new().unwrap();
        let outcome = run_shell("test", "echo hello", dir.path(), 1024 * 1024)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn reports_nonzero_exit_with_output() {
        let dir = TempDir::new().unwrap();
        let outcome = run_shell("test", "echo broken >&2; exit 3", dir.path(), 1024 * 1024)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.excerpt(), "broken");
    }

    #[tokio::test]
    async fn output_over_the_cap_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = run_shell("test", "head -c 4096 /dev/zero", dir.path(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::OutputLimit {
                stage: "test",
                limit: 1024
            }
        ));
    }

    #[tokio::test]
    async fn runs_in_the_given_working_directory() {
        let dir = TempDir::new().unwrap();
        run_shell("test", "touch marker", dir.path(), 1024)
            .await
            .unwrap();
        assert!(dir.path().join("marker").is_file());
    }

    #[tokio::test]
    async fn build_release_returns_artifact_path() {
        let dir = TempDir::new().unwrap();
        let config = test_config("mkdir -p build/web && echo ok > build/web/index.html");
        let artifact = build_release(&config, dir.path()).await.unwrap();
        assert_eq!(artifact, dir.path().join("build/web"));
        assert!(artifact.join("index.html").is_file());
    }

    #[tokio::test]
    async fn zero_exit_without_artifact_is_a_build_failure() {
        let dir = TempDir::new().unwrap();
        let config = test_config("true");
        let err = build_release(&config, dir.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::ArtifactMissing(_)));
        assert!(err.to_string().contains("build output not found"));
    }

    #[tokio::test]
    async fn failing_build_reports_captured_output() {
        let dir = TempDir::new().unwrap();
        let config = test_config("echo 'compile error in main.dart' >&2; exit 1");
        let err = build_release(&config, dir.path()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("status 1"));
        assert!(msg.contains("compile error in main.dart"));
    }

    #[tokio::test]
    async fn resolve_dependencies_tolerates_failure() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            deps_cmd: "exit 1".to_string(),
            ..Default::default()
        };
        // Must not panic; failure is logged and swallowed.
        resolve_dependencies(&config, dir.path()).await;
    }
}
