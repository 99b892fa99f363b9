//! This crate connects the router's `NetIf` seam to Linux `AF_PACKET` sockets, one bound socket
//! per interface.
#![cfg(target_os = "linux")]
#![deny(missing_docs)]

use afpacket::{BoundSocket, Socket};
use failure::{format_err, ResultExt};
use netif::{Error, InterfaceId, InterfaceInfo, NetIf};
use router_packets::MacAddr;
use std::{ffi::CString, io, os::unix::io::AsRawFd};
use tracing::{debug, info};

/// A set of raw sockets, numbered in the order their interfaces were named.
pub struct AfPacketNetIf {
    sockets: Vec<BoundSocket>,
    interfaces: Vec<InterfaceInfo>,
    pollfds: Vec<libc::pollfd>,
    // where the next readiness scan starts, so one busy interface can't starve the others
    next: usize,
}

impl AfPacketNetIf {
    /// Opens and binds a socket on every named interface and reads its MAC and IPv4 address
    /// from the kernel. Needs `CAP_NET_RAW`.
    pub fn open(names: &[String], promiscuous: bool) -> Result<AfPacketNetIf, Error> {
        if names.is_empty() {
            return Err(format_err!("at least one interface is required"));
        }

        let mut sockets = Vec::with_capacity(names.len());
        let mut interfaces = Vec::with_capacity(names.len());
        for name in names {
            let iface = CString::new(name.as_str())
                .with_context(|_| format!("bad interface name {:?}", name))?;
            let mut socket = Socket::new()
                .and_then(|socket| socket.bind(&iface))
                .with_context(|_| format!("cannot open raw socket on {}", name))?;
            if promiscuous {
                socket
                    .set_promiscuous(true)
                    .with_context(|_| format!("cannot make {} promiscuous", name))?;
            }
            let mac = socket
                .hardware_addr()
                .with_context(|_| format!("cannot read MAC address of {}", name))?;
            let ipv4 = socket
                .ipv4_addr()
                .with_context(|_| format!("cannot read IPv4 address of {}", name))?;

            let info = InterfaceInfo {
                name: name.clone(),
                mac: MacAddr::new(mac),
                ipv4,
            };
            info!(
                iface = interfaces.len(),
                name = %info.name,
                mac = %info.mac,
                ipv4 = %info.ipv4,
                promiscuous,
                "interface up"
            );
            interfaces.push(info);
            sockets.push(socket);
        }

        let pollfds = sockets
            .iter()
            .map(|socket| libc::pollfd {
                fd: socket.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        Ok(AfPacketNetIf {
            sockets,
            interfaces,
            pollfds,
            next: 0,
        })
    }

    /// Blocks until at least one socket is readable.
    fn wait_readable(&mut self) -> io::Result<()> {
        loop {
            // FFI over our own pollfd array; its length is passed along with it.
            let ready = unsafe {
                libc::poll(
                    self.pollfds.as_mut_ptr(),
                    self.pollfds.len() as libc::nfds_t,
                    -1,
                )
            };
            if ready > 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if ready < 0 && err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

impl NetIf for AfPacketNetIf {
    fn recv_any(&mut self, buf: &mut [u8]) -> Result<(InterfaceId, usize), Error> {
        loop {
            self.wait_readable().context("poll on raw sockets failed")?;

            let count = self.pollfds.len();
            let ready = (0..count)
                .map(|offset| (self.next + offset) % count)
                .find(|&iface| self.pollfds[iface].revents != 0);
            let iface = match ready {
                Some(iface) => iface,
                None => continue,
            };
            self.next = (iface + 1) % count;

            let revents = self.pollfds[iface].revents;
            if revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                return Err(format_err!(
                    "raw socket on {} failed (revents {:#x})",
                    self.interfaces[iface].name,
                    revents
                ));
            }

            let (len, _) = self.sockets[iface]
                .recv(buf)
                .with_context(|_| format!("recv on {} failed", self.interfaces[iface].name))?;
            return Ok((iface, len));
        }
    }

    fn send(&mut self, iface: InterfaceId, frame: &[u8]) -> Result<(), Error> {
        let socket = self
            .sockets
            .get_mut(iface)
            .ok_or_else(|| format_err!("no interface with id {}", iface))?;
        let name = &self.interfaces[iface].name;
        let sent = socket
            .send(frame)
            .with_context(|_| format!("send on {} failed", name))?;
        if sent != frame.len() {
            debug!(iface, sent, len = frame.len(), "short send");
        }
        Ok(())
    }

    fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }
}
