//! External command execution.
//!
//! Platform providers describe what to run as a [`CommandSpec`] and hand it to
//! a [`CommandRunner`]. [`SystemRunner`] spawns real processes; tests record.

use std::fmt;
use std::process::{Command, Stdio};

use laraserve_detector::Probe;

use crate::error::StepError;

/// A program invocation: argv plus extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub trait CommandRunner {
    /// Run `cmd` to completion; a non-zero exit is an error.
    fn run(&self, cmd: &CommandSpec) -> Result<(), StepError>;

    /// `true` if `program` can be found on `PATH`.
    fn is_available(&self, program: &str) -> bool;
}

/// Spawns real processes, capturing their output.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    probe: Probe,
}

impl SystemRunner {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<(), StepError> {
        tracing::debug!(command = %cmd, "exec");
        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(cmd.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| StepError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(StepError::Command {
            command: cmd.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn is_available(&self, program: &str) -> bool {
        self.probe.find_program(program).is_some()
    }
}

#[cfg(test)]
pub(crate) mod recording {
    //! A [`CommandRunner`] that records instead of executing.

    use std::cell::RefCell;
    use std::collections::BTreeSet;

    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        pub calls: RefCell<Vec<String>>,
        /// Programs whose invocations fail.
        pub failing: BTreeSet<String>,
        /// Programs reported as present on `PATH`.
        pub available: BTreeSet<String>,
    }

    impl RecordingRunner {
        pub(crate) fn available(programs: &[&str]) -> Self {
            Self {
                available: programs.iter().map(|p| p.to_string()).collect(),
                ..Self::default()
            }
        }

        pub(crate) fn failing(mut self, program: &str) -> Self {
            self.failing.insert(program.to_string());
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, cmd: &CommandSpec) -> Result<(), StepError> {
            self.calls.borrow_mut().push(cmd.to_string());
            if self.failing.contains(&cmd.program) {
                return Err(StepError::Command {
                    command: cmd.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: String::new(),
                });
            }
            Ok(())
        }

        fn is_available(&self, program: &str) -> bool {
            self.available.contains(program)
        }
    }
}
