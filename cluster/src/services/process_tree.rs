//! Process table inspection and signalling
//!
//! Descendants are enumerated from a process table snapshot taken at call
//! time; anything forked afterwards is not seen.

use std::collections::{HashMap, HashSet, VecDeque};
use sysinfo::System;

use crate::error::ClusterResult;
use crate::traits::ProcessTree;

/// Process tree backed by the operating system's process table
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessTree;

impl SystemProcessTree {
    pub fn new() -> Self {
        Self
    }

    /// (pid, parent pid) for every process in the current table
    fn snapshot() -> Vec<(u32, Option<u32>)> {
        let mut system = System::new();
        system.refresh_processes();

        // On Linux threads can show up next to processes; a thread id must
        // never be signalled as if it were a child.
        #[cfg(target_os = "linux")]
        let threads: HashSet<u32> = system
            .processes()
            .iter()
            .filter_map(|(pid, process)| process.tasks().map(|tasks| (pid.as_u32(), tasks)))
            .flat_map(|(owner, tasks)| {
                tasks
                    .iter()
                    .map(|task| task.as_u32())
                    .filter(move |task| *task != owner)
            })
            .collect();
        #[cfg(not(target_os = "linux"))]
        let threads: HashSet<u32> = HashSet::new();

        system
            .processes()
            .iter()
            .map(|(pid, process)| (pid.as_u32(), process.parent().map(|parent| parent.as_u32())))
            .filter(|(pid, _)| !threads.contains(pid))
            .collect()
    }
}

impl ProcessTree for SystemProcessTree {
    fn descendants(&self, pid: u32) -> Vec<u32> {
        collect_descendants(pid, &Self::snapshot())
    }

    fn terminate(&self, pid: u32) -> ClusterResult<()> {
        signal::graceful(pid)
    }

    fn kill(&self, pid: u32) -> ClusterResult<()> {
        signal::hard(pid)
    }
}

/// Breadth-first walk of a (pid, parent) table starting below `root`
pub fn collect_descendants(root: u32, table: &[(u32, Option<u32>)]) -> Vec<u32> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for (pid, parent) in table {
        if let Some(parent) = parent {
            if pid != parent {
                children.entry(*parent).or_default().push(*pid);
            }
        }
    }

    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    let mut descendants = Vec::new();

    while let Some(current) = queue.pop_front() {
        let Some(kids) = children.get(&current) else {
            continue;
        };
        let mut kids = kids.clone();
        kids.sort_unstable();
        for kid in kids {
            if seen.insert(kid) {
                descendants.push(kid);
                queue.push_back(kid);
            }
        }
    }

    descendants
}

#[cfg(unix)]
mod signal {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    use crate::error::{ClusterError, ClusterResult};

    pub fn graceful(pid: u32) -> ClusterResult<()> {
        send(pid, Signal::SIGTERM)
    }

    pub fn hard(pid: u32) -> ClusterResult<()> {
        send(pid, Signal::SIGKILL)
    }

    fn send(pid: u32, sig: Signal) -> ClusterResult<()> {
        let raw = i32::try_from(pid)
            .map_err(|_| ClusterError::config(format!("pid {pid} out of range")))?;
        match signal::kill(Pid::from_raw(raw), sig) {
            Ok(()) => Ok(()),
            // Already gone
            Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ClusterError::IoError(std::io::Error::from(e))),
        }
    }
}

#[cfg(not(unix))]
mod signal {
    use sysinfo::{Pid, System};

    use crate::error::ClusterResult;

    // No graceful signal outside unix; both steps force-kill.
    pub fn graceful(pid: u32) -> ClusterResult<()> {
        hard(pid)
    }

    pub fn hard(pid: u32) -> ClusterResult<()> {
        let mut system = System::new();
        system.refresh_processes();
        if let Some(process) = system.process(Pid::from_u32(pid)) {
            process.kill();
        }
        Ok(())
    }
}
