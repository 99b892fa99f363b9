#![deny(missing_docs)]

use crate::linux;
use std::{
    ffi::{CStr, CString},
    io,
    mem::{self, MaybeUninit},
    net::Ipv4Addr,
    os::unix::io::{AsRawFd, RawFd},
};

/// Represents a link-local address.
/// At this time, it's not particularly useful.
pub struct Addr {
    _inner: libc::sockaddr_storage,
    _len: libc::socklen_t,
}

/// Represents an unbound `AF_PACKET` socket.  At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be read
/// to/written from.
pub struct BoundSocket {
    fd: libc::c_int,
    iface: CString,
    send_addr: libc::sockaddr_ll,
}

impl Socket {
    /// Creates a new unbound socket.
    pub fn new() -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe the code
        // in this block to be safe because it does not interact with any memory owned by Rust
        // code, nor does it violate the invariant of the Socket type -- namely, that it return an
        // Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#socket
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_ALL as u16).to_be() as libc::c_int,
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to a network interface. This function consumes the `Socket` instance, as
    /// no more configuration options may be safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let iface = iface.as_ref();
        let mut ifr = linux::ifreq::with_name(iface);

        // This block is marked as unsafe because it uses FFI, however, we believe it to be safe
        // because it handles FFI failures in accordance with the bound API's conventions, and the
        // only memory handed to the kernel is the stack-owned ifreq and sockaddr_ll.
        let send_addr = unsafe {
            // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
            // Resources:
            // man 7 netdevice
            let err = libc::ioctl(self.fd, linux::SIOCGIFINDEX, &mut ifr);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }

            // bind the socket
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#bind
            // man 7 packet regarding sockaddr_ll
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
            ll.sll_ifindex = ifr.ifr_ifru.ifru_ivalue; // expanded from `ifr_ifindex` in kernel headers
            let err = libc::bind(
                self.fd,
                &mut ll as *mut _ as *mut libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::c_uint,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            ll
        };
        let fd = self.fd;
        // This ensures that `self` does not attempt to close the file descriptor, as the file
        // descriptor is transferred to the BoundSocket we're returning.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            iface: iface.to_owned(),
            send_addr,
        })
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        set_nonblocking(self.fd, nonblocking)
    }

    /// Returns true if the socket is configured not to block, false otherwise.
    pub fn is_nonblocking(&self) -> io::Result<bool> {
        is_nonblocking(self.fd)
    }
}

impl BoundSocket {
    /// Name of the interface this socket is bound to.
    pub fn iface(&self) -> &CStr {
        &self.iface
    }

    /// Kernel index of the interface this socket is bound to.
    pub fn ifindex(&self) -> i32 {
        self.send_addr.sll_ifindex
    }

    /// Sends a frame to the NIC.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be safe,
        // because it safely borrows the Rust-owned frame and passes the length of the frame to the
        // libc function, so it should not exhibit any C-side undefined behaviour.
        unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC. Blocks unless the socket was made non-blocking.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<(usize, Addr)> {
        // Note comment in `send` call.
        unsafe {
            let mut storage = MaybeUninit::<libc::sockaddr_storage>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                0,
                storage.as_mut_ptr() as *mut _,
                &mut addrlen,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok((
                    bytes as usize,
                    Addr {
                        _inner: storage.assume_init(),
                        _len: addrlen,
                    },
                ))
            }
        }
    }

    /// Puts the interface in (or takes it out of) promiscuous mode for as long as this socket
    /// stays open.
    pub fn set_promiscuous(&mut self, promiscuous: bool) -> io::Result<()> {
        let mreq = linux::packet_mreq {
            mr_ifindex: self.send_addr.sll_ifindex,
            mr_type: linux::PACKET_MR_PROMISC,
            mr_alen: 0,
            mr_address: [0; 8],
        };
        let option = if promiscuous {
            linux::PACKET_ADD_MEMBERSHIP
        } else {
            linux::PACKET_DROP_MEMBERSHIP
        };
        // FFI; the kernel only reads the stack-owned packet_mreq for the duration of the call.
        // Resources:
        // man 7 packet regarding PACKET_ADD_MEMBERSHIP
        let err = unsafe {
            libc::setsockopt(
                self.fd,
                linux::SOL_PACKET,
                option,
                &mreq as *const _ as *const libc::c_void,
                mem::size_of::<linux::packet_mreq>() as libc::socklen_t,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Hardware (MAC) address of the bound interface.
    pub fn hardware_addr(&self) -> io::Result<[u8; 6]> {
        let mut ifr = linux::ifreq::with_name(&self.iface);
        // FFI on a stack-owned ifreq; on success the kernel has filled in ifru_hwaddr.
        // Resources:
        // man 7 netdevice regarding SIOCGIFHWADDR
        let data = unsafe {
            if libc::ioctl(self.fd, linux::SIOCGIFHWADDR, &mut ifr) < 0 {
                return Err(io::Error::last_os_error());
            }
            ifr.ifr_ifru.ifru_hwaddr.sa_data
        };
        let mut mac = [0u8; 6];
        for (byte, raw) in mac.iter_mut().zip(data.iter()) {
            *byte = *raw as u8;
        }
        Ok(mac)
    }

    /// Primary IPv4 address of the bound interface.
    pub fn ipv4_addr(&self) -> io::Result<Ipv4Addr> {
        let mut ifr = linux::ifreq::with_name(&self.iface);
        // FFI on a stack-owned ifreq; on success ifru_addr holds a sockaddr_in, which has the
        // same size as the sockaddr it is stored in.
        // Resources:
        // man 7 netdevice regarding SIOCGIFADDR
        let addr = unsafe {
            if libc::ioctl(self.fd, linux::SIOCGIFADDR, &mut ifr) < 0 {
                return Err(io::Error::last_os_error());
            }
            let sin = &*(&ifr.ifr_ifru.ifru_addr as *const libc::sockaddr
                as *const libc::sockaddr_in);
            if sin.sin_family != libc::AF_INET as libc::sa_family_t {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "interface address is not IPv4",
                ));
            }
            sin.sin_addr.s_addr
        };
        Ok(Ipv4Addr::from(u32::from_be(addr)))
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        set_nonblocking(self.fd, nonblocking)
    }
}

impl AsRawFd for BoundSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

fn set_nonblocking(fd: libc::c_int, nonblocking: bool) -> io::Result<()> {
    // This block is marked as unsafe because it uses FFI, however, we assume this code to be
    // safe because we handle fcntl's failures properly. Additionally, we do not borrow any
    // Rust-owned memory.
    // Resources used to write syscall code:
    // https://beej.us/guide/bgnet/html/multi/advanced.html#blocking
    // man 2 fcntl
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let new_flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & (!libc::O_NONBLOCK)
        };
        let err = libc::fcntl(fd, libc::F_SETFL, new_flags);
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn is_nonblocking(fd: libc::c_int) -> io::Result<bool> {
    // See comments on block above (in set_nonblocking).
    let flags = unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        flags
    };
    Ok(flags & libc::O_NONBLOCK == libc::O_NONBLOCK)
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
