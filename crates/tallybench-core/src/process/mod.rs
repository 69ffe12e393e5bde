//! OS process lifecycle: spawn, output redirection, wait, kill, exit status.
//!
//! A [`ChildProcess`] moves through three states, each transition happening
//! at most once: not started, running (after [`execute`]), terminated
//! (after [`wait_for_exit`] or [`kill`]). Both output streams are forwarded
//! line-by-line to this process's stdout/stderr for as long as the child
//! runs.
//!
//! [`execute`]: ChildProcess::execute
//! [`wait_for_exit`]: ChildProcess::wait_for_exit
//! [`kill`]: ChildProcess::kill

pub mod console;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::error::{Error, Result};

pub use console::Redirector;

/// The deterministic command line a child process is started from:
/// program path, arguments, and environment overrides.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
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

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Short label for redirector thread names.
    fn label(&self) -> String {
        self.program
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "child".to_string())
    }

    /// The full command line as one loggable string.
    fn render(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }
}

/// A child process and the two threads forwarding its output.
pub struct ChildProcess {
    spec: CommandSpec,
    child: Option<Child>,
    exit: Option<ExitStatus>,
    redirectors: Vec<Redirector>,
}

impl ChildProcess {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            child: None,
            exit: None,
            redirectors: Vec::new(),
        }
    }

    /// Spawn the process and start forwarding its stdout and stderr, each
    /// line prefixed with `console_prefix`.
    ///
    /// Fails with [`Error::Spawn`] if the OS cannot create the process,
    /// leaving this handle in its not-started state. Fails with
    /// [`Error::ProcessState`] if the process was already started.
    pub fn execute(&mut self, console_prefix: &str) -> Result<()> {
        if self.child.is_some() || self.exit.is_some() {
            return Err(Error::ProcessState(
                "the process has already been started".to_string(),
            ));
        }

        tracing::info!("executing command: '{}'", self.spec.render());

        let mut command = self.spec.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| Error::Spawn {
            program: self.spec.program.display().to_string(),
            source: e,
        })?;

        let label = self.spec.label();
        let mut redirectors = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            let thread_name = format!("{}-stdout-redirector", label);
            match console::spawn(console_prefix, &thread_name, stdout, io::stdout()) {
                Ok(redirector) => redirectors.push(redirector),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }
        }

        if let Some(stderr) = child.stderr.take() {
            let thread_name = format!("{}-stderr-redirector", label);
            match console::spawn(console_prefix, &thread_name, stderr, io::stderr()) {
                Ok(redirector) => redirectors.push(redirector),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }
        }

        self.child = Some(child);
        self.redirectors = redirectors;
        Ok(())
    }

    /// Block until the process exits, stop both redirectors, and return the
    /// exit status.
    ///
    /// Fails with [`Error::ProcessState`] if the process was never started.
    pub fn wait_for_exit(&mut self) -> Result<ExitStatus> {
        let child = self.child.as_mut().ok_or_else(|| {
            Error::ProcessState(
                "the process has not been started, so there is nothing to wait for".to_string(),
            )
        })?;

        let waited = child.wait();
        self.stop_redirectors();

        let status = waited
            .map_err(|e| Error::Interrupted(format!("wait for child process failed: {}", e)))?;
        self.exit = Some(status);
        Ok(status)
    }

    /// Forcibly terminate a running process, then stop the redirectors.
    ///
    /// Fails with [`Error::ProcessState`] if the process was never started
    /// or has already terminated.
    pub fn kill(&mut self) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::ProcessState(
                "the process is not alive, so it cannot be killed".to_string(),
            ));
        }

        if let Some(child) = self.child.as_mut() {
            tracing::debug!("killing child process {}", child.id());
            child.kill()?;
            // Reap, so the child does not linger as a zombie.
            let status = child
                .wait()
                .map_err(|e| Error::Interrupted(format!("wait after kill failed: {}", e)))?;
            self.exit = Some(status);
        }

        self.stop_redirectors();
        Ok(())
    }

    /// Non-blocking liveness probe.
    pub fn is_alive(&mut self) -> bool {
        match self.child.as_mut() {
            None => false,
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    self.exit = Some(status);
                    false
                }
                Err(_) => false,
            },
        }
    }

    /// The exit status of a terminated process, without blocking.
    ///
    /// Fails with [`Error::ProcessState`] if the process has not started or
    /// has not yet terminated.
    pub fn exit_value(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit {
            return Ok(status);
        }

        let child = self.child.as_mut().ok_or_else(|| {
            Error::ProcessState(
                "the process has not been started, so no exit value can be retrieved".to_string(),
            )
        })?;

        match child.try_wait()? {
            Some(status) => {
                self.exit = Some(status);
                Ok(status)
            }
            None => Err(Error::ProcessState(
                "the process is still running, so no exit value can be retrieved".to_string(),
            )),
        }
    }

    /// OS process id, if the process has been started.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn stop_redirectors(&mut self) {
        for mut redirector in self.redirectors.drain(..) {
            redirector.stop();
        }
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        if self.is_alive() {
            let _ = self.kill();
        }
    }
}
