use std::process::{Command, Output};

use netfence_core::error::ControlError;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// One invocation of the firewall control binary, optionally behind an elevation launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallCommand {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub text: String,
}

impl FirewallCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Wraps the command so `launcher` runs it, e.g. `gsudo netsh ...`.
    pub fn elevated(self, launcher: Option<&str>) -> Self {
        match launcher {
            Some(launcher) if !launcher.trim().is_empty() => {
                let mut args = Vec::with_capacity(self.args.len() + 1);
                args.push(self.program);
                args.extend(self.args);
                Self {
                    program: launcher.trim().to_string(),
                    args,
                }
            }
            _ => self,
        }
    }

    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            if arg.contains(' ') {
                rendered.push('"');
                rendered.push_str(arg);
                rendered.push('"');
            } else {
                rendered.push_str(arg);
            }
        }
        rendered
    }

    /// Runs to completion and captures combined stdout/stderr.
    pub fn run(&self) -> Result<CommandOutput, ControlError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }
        let output = command.output().map_err(|err| ControlError::Spawn {
            program: self.program.clone(),
            message: err.to_string(),
        })?;
        Ok(CommandOutput::from_output(&output))
    }
}

impl CommandOutput {
    fn from_output(output: &Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = match (stdout.trim(), stderr.trim()) {
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        };
        Self {
            success: output.status.success(),
            status: output.status.to_string(),
            text,
        }
    }
}
