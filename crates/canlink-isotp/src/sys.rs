//! Raw socket plumbing for kernel ISO-TP sockets.

use std::ffi::CString;
use std::io;
use std::mem::size_of;
use std::os::fd::RawFd;

use socket2::{Domain, Protocol, Socket, Type};

use crate::addr::BindTarget;
use crate::options::{FlowControlOptions, IsoTpOptions};

const SOL_CAN_ISOTP: libc::c_int = libc::SOL_CAN_BASE + libc::CAN_ISOTP;
const CAN_ISOTP_OPTS: libc::c_int = 1;
const CAN_ISOTP_RECV_FC: libc::c_int = 2;

/// `struct sockaddr_can` restricted to the ISO-TP (`tp`) member of its
/// address union. The trailing pad keeps the size equal to the kernel
/// struct, whose union is sized by the J1939 member.
#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct sockaddr_can_tp {
    can_family: libc::sa_family_t,
    can_ifindex: libc::c_int,
    rx_id: u32,
    tx_id: u32,
    _j1939_pad: [u32; 2],
}

/// Resolve a network interface name to its index.
pub(crate) fn if_nametoindex(name: &str) -> io::Result<u32> {
    let c_name = CString::new(name)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "interface name contains NUL"))?;
    let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
    if index == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(index)
}

pub(crate) fn open_isotp_socket() -> io::Result<Socket> {
    Socket::new(
        Domain::from(libc::AF_CAN),
        Type::DGRAM,
        Some(Protocol::from(libc::CAN_ISOTP)),
    )
}

pub(crate) fn set_isotp_options(fd: RawFd, options: &IsoTpOptions) -> io::Result<()> {
    setsockopt_bytes(fd, CAN_ISOTP_OPTS, &options.to_bytes())
}

pub(crate) fn set_flow_control(fd: RawFd, fc: &FlowControlOptions) -> io::Result<()> {
    setsockopt_bytes(fd, CAN_ISOTP_RECV_FC, &fc.to_bytes())
}

fn setsockopt_bytes(fd: RawFd, name: libc::c_int, value: &[u8]) -> io::Result<()> {
    let res = unsafe {
        libc::setsockopt(
            fd,
            SOL_CAN_ISOTP,
            name,
            value.as_ptr().cast(),
            value.len() as libc::socklen_t,
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) fn bind_isotp(fd: RawFd, target: BindTarget) -> io::Result<()> {
    let ifindex = libc::c_int::try_from(target.ifindex)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "interface index out of range"))?;
    let addr = sockaddr_can_tp {
        can_family: libc::AF_CAN as libc::sa_family_t,
        can_ifindex: ifindex,
        rx_id: target.rx_id,
        tx_id: target.tx_id,
        _j1939_pad: [0; 2],
    };
    let res = unsafe {
        libc::bind(
            fd,
            (&addr as *const sockaddr_can_tp).cast(),
            size_of::<sockaddr_can_tp>() as libc::socklen_t,
        )
    };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) fn recv(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let read = unsafe { libc::recv(fd, buf.as_mut_ptr().cast(), buf.len(), libc::MSG_DONTWAIT) };
    if read < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(read as usize)
}

pub(crate) fn send(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    let sent = unsafe { libc::send(fd, buf.as_ptr().cast(), buf.len(), libc::MSG_DONTWAIT) };
    if sent < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(sent as usize)
}

/// Close `fd`, reporting the kernel's verdict instead of discarding it.
pub(crate) fn close(fd: RawFd) -> io::Result<()> {
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
