//! Process supervision with captured output and escalating termination
//!
//! A supervisor owns at most one live process. Its standard streams are
//! redirected into `stdout.txt`/`stderr.txt` in the working directory and
//! read back when the process is terminated.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};

use crate::error::{ClusterError, ClusterResult};
use crate::services::process_tree::SystemProcessTree;
use crate::traits::ProcessTree;
use shared::{service_debug, service_error, service_info, service_warn, UNKNOWN_EXIT_CODE};

pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";

/// Program plus arguments to launch; no shell is involved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
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

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit code and captured output of a terminated process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runtime state of one supervised OS process
///
/// Dropping it kills the child if it is still alive.
#[derive(Debug)]
pub struct ManagedProcess {
    pid: u32,
    child: Child,
    working_dir: PathBuf,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
}

impl ManagedProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }

    /// Read back both capture files and release the child handle
    fn finish(self) -> (String, String) {
        (read_capture(&self.stdout_path), read_capture(&self.stderr_path))
    }
}

fn read_capture(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!("⚠️ Failed to read captured output {}: {}", path.display(), e);
            String::new()
        }
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    UNKNOWN_EXIT_CODE
}

async fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<i32> {
    match tokio::time::timeout(limit, child.wait()).await {
        Ok(Ok(status)) => Some(exit_code_of(status)),
        Ok(Err(e)) => {
            tracing::warn!("⚠️ Error waiting for process: {}", e);
            None
        }
        Err(_) => None,
    }
}

/// Spawns one command and stops it again, descendants included
pub struct ProcessSupervisor {
    name: String,
    tree: Arc<dyn ProcessTree>,
    process: Option<ManagedProcess>,
}

impl ProcessSupervisor {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            tree: Arc::new(SystemProcessTree::new()),
            process: None,
        }
    }

    /// Replace the process table used for descendant lookup and signalling
    pub fn with_process_tree(mut self, tree: Arc<dyn ProcessTree>) -> Self {
        self.tree = tree;
        self
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(ManagedProcess::pid)
    }

    /// Launch `command` in `working_dir` and return without waiting for it
    pub fn spawn(&mut self, command: &LaunchCommand, working_dir: &Path) -> ClusterResult<&ManagedProcess> {
        if let Some(process) = &self.process {
            return Err(ClusterError::AlreadyRunning { pid: process.pid });
        }

        let spawn_failed = |reason: String| ClusterError::SpawnFailed {
            command: command.to_string(),
            working_dir: working_dir.to_path_buf(),
            reason,
        };

        let stdout_path = working_dir.join(STDOUT_FILE);
        let stderr_path = working_dir.join(STDERR_FILE);
        let stdout = File::create(&stdout_path)?;
        let stderr = File::create(&stderr_path)?;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| spawn_failed(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_failed("process exited before its pid was captured".to_string()))?;

        service_info!(self.name, "🚀 Started {} with PID {} in {}", command, pid, working_dir.display());

        Ok(&*self.process.insert(ManagedProcess {
            pid,
            child,
            working_dir: working_dir.to_path_buf(),
            stdout_path,
            stderr_path,
        }))
    }

    /// Stop the owned process: hard-kill descendants, SIGTERM, then SIGKILL
    ///
    /// Each wait is bounded by `timeout`. The captured output is read back
    /// on every path, including `TerminationFailed`, and the supervisor no
    /// longer owns a process afterwards.
    pub async fn terminate(&mut self, timeout: Duration) -> ClusterResult<Termination> {
        let mut process = self.process.take().ok_or(ClusterError::NotRunning)?;
        let pid = process.pid;

        let exit_code = self.escalate(&mut process, timeout).await;
        let (stdout, stderr) = process.finish();

        match exit_code {
            Some(exit_code) => {
                service_info!(self.name, "🏁 Process {} terminated with exit code {}", pid, exit_code);
                Ok(Termination {
                    exit_code,
                    stdout,
                    stderr,
                })
            }
            None => Err(ClusterError::TerminationFailed {
                pid,
                timeout,
                stdout,
                stderr,
            }),
        }
    }

    async fn escalate(&self, process: &mut ManagedProcess, timeout: Duration) -> Option<i32> {
        let pid = process.pid;

        if let Ok(Some(status)) = process.child.try_wait() {
            service_info!(self.name, "Process {} had already exited", pid);
            return Some(exit_code_of(status));
        }

        service_debug!(self.name, "Checking for child processes of {}", pid);
        for descendant in self.tree.descendants(pid) {
            if descendant == pid {
                continue;
            }
            service_debug!(self.name, "Sending SIGKILL to descendant {}", descendant);
            if let Err(e) = self.tree.kill(descendant) {
                service_warn!(self.name, "⚠️ Failed to kill descendant {}: {}", descendant, e);
            }
        }

        service_info!(self.name, "📤 Sending SIGTERM to PID {}", pid);
        if let Err(e) = self.tree.terminate(pid) {
            service_warn!(self.name, "⚠️ Failed to send SIGTERM to {}: {}", pid, e);
        }
        if let Some(code) = wait_for_exit(&mut process.child, timeout).await {
            return Some(code);
        }

        service_warn!(self.name, "🔨 Process {} did not terminate after {:?}, sending SIGKILL", pid, timeout);
        if let Err(e) = self.tree.kill(pid) {
            service_warn!(self.name, "⚠️ Failed to send SIGKILL to {}: {}", pid, e);
        }
        if let Some(code) = wait_for_exit(&mut process.child, timeout).await {
            return Some(code);
        }

        service_error!(self.name, "❌ Process {} failed to terminate even after SIGKILL", pid);
        None
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        // Emergency cleanup - the child itself is killed when its handle drops
        if let Some(process) = self.process.take() {
            service_warn!(self.name, "🚨 Emergency cleanup: force killing PID {}", process.pid);
            for descendant in self.tree.descendants(process.pid) {
                let _ = self.tree.kill(descendant);
            }
        }
    }
}
