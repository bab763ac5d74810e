// kettle-core/src/install/runner.rs
use kettle_aio::process::{run_command_status, run_shell_status};
use kettle_common::error::Result;
use kettle_common::model::InstallStep;

use crate::build::env::BuildEnvironment;

/// How one step ended. `code` is `None` when the process died by signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub success: bool,
    pub code: Option<i32>,
}

impl StepOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
        }
    }
}

/// Executes a single, already interpolated, install step. Blocks until the
/// step has finished.
pub trait StepRunner {
    fn run_step(&mut self, step: &InstallStep, env: &BuildEnvironment) -> Result<StepOutcome>;
}

/// Runs steps as child processes in the build directory. Every step starts
/// from the build directory; a `cd` inside one step does not carry over.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl StepRunner for ShellRunner {
    fn run_step(&mut self, step: &InstallStep, env: &BuildEnvironment) -> Result<StepOutcome> {
        let status = match step {
            InstallStep::Shell(script) => run_shell_status(script, env.buildpath(), env.vars())?,
            InstallStep::Exec { program, args } => {
                run_command_status(program, args, env.buildpath(), env.vars())?
            }
        };
        Ok(if status.success() {
            StepOutcome::ok()
        } else {
            StepOutcome::failed(status.code())
        })
    }
}
