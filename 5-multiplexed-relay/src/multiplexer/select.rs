use std::{io, mem, ptr, time::Duration};

use super::{Interest, Multiplexer, ReadySet};

/// `select(2)` backend. Holds no state; the read set is rebuilt on every wait.
#[derive(Debug, Default)]
pub struct SelectMultiplexer;

impl SelectMultiplexer {
    pub fn new() -> Self {
        Self
    }
}

impl Multiplexer for SelectMultiplexer {
    fn wait(&mut self, interest: &[Interest], timeout: Option<Duration>) -> io::Result<ReadySet> {
        let mut read_fds: libc::fd_set = unsafe { mem::zeroed() };
        unsafe { libc::FD_ZERO(&mut read_fds) };

        let mut max_fd: libc::c_int = -1;
        for entry in interest {
            if entry.fd < 0 || entry.fd as usize >= libc::FD_SETSIZE as usize {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("descriptor {} does not fit in an fd_set", entry.fd),
                ));
            }
            unsafe { libc::FD_SET(entry.fd, &mut read_fds) };
            max_fd = max_fd.max(entry.fd);
        }

        let mut tv = timeout.map(|duration| libc::timeval {
            tv_sec: duration.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
            tv_usec: duration.subsec_micros() as libc::suseconds_t,
        });
        let tv_ptr = tv
            .as_mut()
            .map_or(ptr::null_mut(), |tv| tv as *mut libc::timeval);

        let rc = unsafe {
            libc::select(
                max_fd + 1,
                &mut read_fds,
                ptr::null_mut(),
                ptr::null_mut(),
                tv_ptr,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(ReadySet::new());
            }
            return Err(err);
        }

        Ok(interest
            .iter()
            .filter(|entry| unsafe { libc::FD_ISSET(entry.fd, &read_fds) })
            .map(|entry| entry.token)
            .collect())
    }

    fn name(&self) -> &'static str {
        "select"
    }
}
