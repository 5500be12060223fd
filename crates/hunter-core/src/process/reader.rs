#![cfg_attr(not(target_os = "linux"), allow(unused_variables))]

use crate::error::{Error, Result};
use crate::process::maps::{MapEntry, read_process_maps};
use crate::process::source::MemorySource;

#[cfg(target_os = "linux")]
use nix::sys::uio::{RemoteIoVec, process_vm_readv};
#[cfg(target_os = "linux")]
use nix::unistd::Pid;
#[cfg(target_os = "linux")]
use std::io::IoSliceMut;

/// A running process read through `process_vm_readv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveProcess {
    pid: i32,
}

impl LiveProcess {
    pub fn new(pid: i32) -> Self {
        Self { pid }
    }

    /// Check that `/proc/<pid>` exists.
    pub fn is_alive(&self) -> bool {
        std::path::Path::new(&format!("/proc/{}", self.pid)).exists()
    }

    #[cfg(target_os = "linux")]
    fn read_into_impl(&self, address: u64, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        let mut local = [IoSliceMut::new(buf)];
        let remote = [RemoteIoVec {
            base: address as usize,
            len,
        }];

        // A short count is not an error here; callers decide whether a
        // partial copy is acceptable.
        process_vm_readv(Pid::from_raw(self.pid), &mut local, &remote).map_err(|errno| {
            Error::RegionReadFailure {
                begin: address,
                end: address.saturating_add(len as u64),
                message: format!("process_vm_readv: {}", errno.desc()),
            }
        })
    }

    #[cfg(not(target_os = "linux"))]
    fn read_into_impl(&self, address: u64, buf: &mut [u8]) -> Result<usize> {
        Err(Error::RegionReadFailure {
            begin: address,
            end: address.saturating_add(buf.len() as u64),
            message: "Linux only: process_vm_readv not supported on this platform".to_string(),
        })
    }
}

impl MemorySource for LiveProcess {
    fn pid(&self) -> i32 {
        self.pid
    }

    fn memory_map(&self) -> Result<Vec<MapEntry>> {
        read_process_maps(self.pid)
    }

    fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<usize> {
        self.read_into_impl(address, buf)
    }
}
