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

//! Command-line surface and config assembly: turning `--flags` plus a trailing `-- prog args...`
//! into a [`ChildConfig`] and the bits the supervisor loop itself needs.

use crate::child::ChildConfig;
use crate::credentials::{resolve_gid, resolve_uid};
use crate::error::ConfigError;

use clap::Parser;
use std::os::unix::io::RawFd;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "supervise", version, about = "supervise a child process and restart it if necessary")]
pub struct Cli {
    /// Redirect program stdout to PATH
    #[clap(long, value_name = "PATH")]
    pub stdout: Option<PathBuf>,

    /// Redirect program stderr to PATH
    #[clap(long, value_name = "PATH")]
    pub stderr: Option<PathBuf>,

    /// Change directory to PATH before exec
    #[clap(long, value_name = "PATH")]
    pub chdir: Option<String>,

    /// Change root directory to PATH before exec
    #[clap(long, value_name = "PATH")]
    pub chroot: Option<String>,

    /// Wait SECONDS before respawning a crashed child
    #[clap(long, value_name = "SECONDS", default_value = "0")]
    pub respawn_delay: u64,

    /// Give up respawning after NUMBER restarts within the respawn period (0 = unlimited)
    #[clap(long, value_name = "NUMBER", default_value = "0")]
    pub respawn_max: u32,

    /// Sliding window, in SECONDS, over which restarts count toward respawn-max (0 = no window)
    #[clap(long, value_name = "SECONDS", default_value = "0")]
    pub respawn_period: u64,

    /// Seconds to wait after SIGTERM before escalating to SIGKILL
    #[clap(long, value_name = "SECONDS", default_value = "3")]
    pub kill_delay: u64,

    /// Run the child as USER (name or numeric uid)
    #[clap(long, value_name = "USER")]
    pub uid: Option<String>,

    /// Run the child as GROUP (name or numeric gid)
    #[clap(long, value_name = "GROUP")]
    pub gid: Option<String>,

    /// Octal umask for the supervisor process
    #[clap(long, value_name = "UMASK", default_value = "022")]
    pub umask: String,

    /// Perform manager-supervisor IPC on the given descriptor number
    #[clap(long, value_name = "FD")]
    pub manager_fd: Option<RawFd>,

    /// Program to supervise and its arguments
    #[clap(last = true, required = true)]
    pub command: Vec<String>,
}

pub struct Assembled {
    pub config: ChildConfig,
    pub manager_fd: Option<RawFd>,
    pub umask: u32,
}

impl Cli {
    /// Turns parsed flags into the structures the supervisor actually runs with. This is the
    /// "Config assembly" step: resolving names, opening redirect targets, and parsing the octal
    /// umask all happen here, before a single `fork()` is attempted.
    pub fn assemble(self) -> Result<Assembled, ConfigError> {
        let prog_name = self.command.first().cloned().ok_or(ConfigError::NoProgram)?;

        let child_uid = match &self.uid {
            Some(name) => Some(resolve_uid(name).ok_or_else(|| ConfigError::UnknownUser(name.clone()))?),
            None => None,
        };

        let child_gid = match &self.gid {
            Some(name) => Some(resolve_gid(name).ok_or_else(|| ConfigError::UnknownGroup(name.clone()))?),
            None => None,
        };

        let umask = u32::from_str_radix(&self.umask, 8).map_err(|_| ConfigError::InvalidUmask(self.umask.clone()))?;

        let stdout_fd = open_redirect(&self.stdout)?.unwrap_or(1);
        let stderr_fd = open_redirect(&self.stderr)?.unwrap_or(2);

        let config = ChildConfig {
            prog_name,
            prog_argv: self.command,
            dir_chroot: self.chroot,
            dir_chdir: self.chdir,
            child_uid,
            child_gid,
            stdin_fd: 0,
            stdout_fd,
            stderr_fd,
            respawn_delay: self.respawn_delay,
            respawn_max: self.respawn_max,
            respawn_period: self.respawn_period,
            kill_delay: self.kill_delay,
        };

        Ok(Assembled {
            config,
            manager_fd: self.manager_fd,
            umask,
        })
    }
}

fn open_redirect(path: &Option<PathBuf>) -> Result<Option<RawFd>, ConfigError> {
    use nix::fcntl::{open, OFlag};
    use nix::sys::stat::Mode;

    let path = match path {
        Some(p) => p,
        None => return Ok(None),
    };

    let fd = open(path, OFlag::O_CREAT | OFlag::O_APPEND | OFlag::O_RDWR, Mode::from_bits_truncate(0o644))
        .map_err(|source| ConfigError::Redirect {
            path: path.clone(),
            source: std::io::Error::from_raw_os_error(source as i32),
        })?;

    Ok(Some(fd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_umask_is_a_config_error() {
        let cli = Cli {
            stdout: None,
            stderr: None,
            chdir: None,
            chroot: None,
            respawn_delay: 0,
            respawn_max: 0,
            respawn_period: 0,
            kill_delay: 3,
            uid: None,
            gid: None,
            umask: "not-octal".into(),
            manager_fd: None,
            command: vec!["/bin/true".into()],
        };
        assert!(matches!(cli.assemble(), Err(ConfigError::InvalidUmask(_))));
    }

    #[test]
    fn unresolvable_user_is_a_config_error() {
        let cli = Cli {
            stdout: None,
            stderr: None,
            chdir: None,
            chroot: None,
            respawn_delay: 0,
            respawn_max: 0,
            respawn_period: 0,
            kill_delay: 3,
            uid: Some("0day".into()),
            gid: None,
            umask: "022".into(),
            manager_fd: None,
            command: vec!["/bin/true".into()],
        };
        assert!(matches!(cli.assemble(), Err(ConfigError::UnknownUser(_))));
    }
}
