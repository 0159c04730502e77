/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
 */

use super::{ChildProc, ChildProcState};
use crate::error::ChildSetupError;
use crate::signals::SignalGate;

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{chdir, chroot, dup2, execvp, fork, setgid, setsid, setuid, ForkResult, Pid};
use std::ffi::CString;
use std::thread::sleep;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{event, info_span, Level};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Forks a child to run [`exec_child`] in, and records `respawn_last` as of the fork, not the
/// eventual `execvp()` -- the respawn window is measured from when we *tried* to start the
/// child, since a child that fails setup over and over should still count against the window.
pub fn start(proc: &mut ChildProc) {
    proc.set_state(ChildProcState::Starting);

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            exec_child(proc);
            std::process::exit(1);
        }
        Ok(ForkResult::Parent { child }) => {
            proc.child_pid = Some(child);
        }
        Err(e) => {
            event!(Level::ERROR, "{}: fork failed: {}", proc.config.prog_name, e);
            std::process::exit(1);
        }
    }

    proc.respawn_last = now_secs();
}

/// Runs entirely in the freshly forked child. Every failure here is logged and the child exits;
/// the parent observes this as an ordinary crash and the respawn policy decides what happens
/// next.
fn exec_child(proc: &ChildProc) {
    let _ = info_span!("child", prog = %proc.config.prog_name).entered();
    SignalGate::unblock();
    let _ = setsid();

    let pid = std::process::id();
    event!(Level::INFO, "{}: starting, pid {}", proc.config.prog_name, pid);

    if let Err(e) = setup_child(proc) {
        event!(Level::INFO, "{}: {}", proc.config.prog_name, e);
        return;
    }
}

fn setup_child(proc: &ChildProc) -> Result<(), ChildSetupError> {
    let cfg = &proc.config;

    if let Some(path) = &cfg.dir_chroot {
        chroot(path.as_str()).map_err(|source| ChildSetupError::Chroot {
            path: path.into(),
            source,
        })?;
    }

    if let Some(path) = &cfg.dir_chdir {
        chdir(path.as_str()).map_err(|source| ChildSetupError::Chdir {
            path: path.into(),
            source,
        })?;
    }

    // Drop the group before the user: once the uid is dropped, the process typically no longer
    // has permission to change its gid.
    if let Some(gid) = cfg.child_gid {
        setgid(gid).map_err(|source| ChildSetupError::Setgid {
            gid: gid.as_raw(),
            source,
        })?;
    }

    if let Some(uid) = cfg.child_uid {
        setuid(uid).map_err(|source| ChildSetupError::Setuid {
            uid: uid.as_raw(),
            source,
        })?;
    }

    let _ = dup2(cfg.stdin_fd, 0);
    let _ = dup2(cfg.stdout_fd, 1);
    let _ = dup2(cfg.stderr_fd, 2);

    for fd in 3..nix::unistd::sysconf(nix::unistd::SysconfVar::OPEN_MAX)
        .ok()
        .flatten()
        .unwrap_or(1024)
    {
        let _ = nix::fcntl::fcntl(
            fd as i32,
            nix::fcntl::FcntlArg::F_SETFD(nix::fcntl::FdFlag::FD_CLOEXEC),
        );
    }

    let prog = CString::new(cfg.prog_name.as_str()).unwrap();
    let argv: Vec<CString> = cfg
        .prog_argv
        .iter()
        .map(|a| CString::new(a.as_str()).unwrap())
        .collect();

    let err = execvp(&prog, &argv).unwrap_err();
    Err(ChildSetupError::Exec {
        prog: cfg.prog_name.clone(),
        source: err,
    })
}

/// Escalating shutdown: `SIGTERM`, a short grace period, then `SIGKILL`. Returns whether the
/// process was confirmed dead. When `should_wait` is false this only sends the signal and
/// returns immediately -- used when the caller intends to reap the child itself later (e.g. the
/// `SIGCHLD` path, where `waitpid` has already been called by the kernel delivering the signal).
pub fn kill(proc: &mut ChildProc, should_wait: bool) -> bool {
    let pid = match proc.child_pid {
        Some(pid) => pid,
        None => return true,
    };

    let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM);

    if !should_wait {
        return true;
    }

    if reaped(pid) {
        return true;
    }

    sleep(Duration::from_secs(proc.config.kill_delay));

    if reaped(pid) {
        return true;
    }

    let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL);

    matches!(
        waitpid(pid, None),
        Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..))
    )
}

fn reaped(pid: Pid) -> bool {
    matches!(
        waitpid(pid, Some(WaitPidFlag::WNOHANG)),
        Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..))
    )
}

/// Reaps the child and applies the respawn policy. Returns `true` if the caller should start a
/// new child, `false` if the child is finished for good (either because it's being deliberately
/// stopped, or because it has exceeded `respawn_max`).
pub fn monitor(proc: &mut ChildProc) -> bool {
    let pid = match proc.child_pid {
        Some(pid) => pid,
        None => return false,
    };

    let _ = waitpid(pid, None);

    if proc.exiting() {
        let verb = if proc.state == ChildProcState::Down { "stopped" } else { "stopping" };
        event!(Level::INFO, "{}: {}, pid {}", proc.config.prog_name, verb, pid);

        if proc.state != ChildProcState::Down {
            kill(proc, true);
            proc.set_state(ChildProcState::Down);
        }

        return false;
    }

    proc.set_state(ChildProcState::Crashed);

    let current = now_secs();
    if proc.config.respawn_period > 0
        && (current - proc.respawn_last) as u64 > proc.config.respawn_period
    {
        proc.restart_count = 0;
    }
    proc.restart_count += 1;

    if proc.config.respawn_max > 0 && proc.restart_count > proc.config.respawn_max {
        event!(Level::INFO, "{}: restarted too many times, giving up", proc.config.prog_name);
        return false;
    }

    true
}
