// kettle-aio/src/process.rs
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;

use kettle_common::error::{KettleError, Result};
use tracing::{debug, error};

const SHELL: &str = "/bin/sh";

/// Runs `command` with `args` and waits for it to exit.
///
/// Stdout and stderr are inherited so build output reaches the user as it is
/// produced; stdin is closed to keep configure scripts from prompting.
pub fn run_command_status(
    command: &str,
    args: &[String],
    cwd: &Path,
    envs: &HashMap<String, String>,
) -> Result<ExitStatus> {
    debug!(
        "Running command: {} {:?} (cwd: {}, envs: {:?})",
        command,
        args,
        cwd.display(),
        envs.keys().collect::<Vec<_>>()
    );

    let mut cmd = Command::new(command);
    cmd.args(args)
        .current_dir(cwd)
        .envs(envs)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    match cmd.status() {
        Ok(status) => {
            if status.success() {
                debug!("Command finished successfully.");
            } else {
                debug!("Command failed with status: {}", status);
            }
            Ok(status)
        }
        Err(e) => {
            error!("Failed to execute command '{}': {}", command, e);
            Err(KettleError::Io(Arc::new(std::io::Error::new(
                e.kind(),
                format!("Failed to execute '{command}': {e}"),
            ))))
        }
    }
}

/// Runs `script` through `/bin/sh -c`.
pub fn run_shell_status(
    script: &str,
    cwd: &Path,
    envs: &HashMap<String, String>,
) -> Result<ExitStatus> {
    run_command_status(SHELL, &["-c".to_string(), script.to_string()], cwd, envs)
}
