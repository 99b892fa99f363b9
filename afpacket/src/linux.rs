#![allow(non_camel_case_types)]

use std::ffi::CStr;
use std::mem::MaybeUninit;

// Resources:
// man 7 netdevice
pub(crate) const SIOCGIFINDEX: libc::c_ulong = 0x8933;
pub(crate) const SIOCGIFHWADDR: libc::c_ulong = 0x8927;
pub(crate) const SIOCGIFADDR: libc::c_ulong = 0x8915;

// Resources:
// man 7 packet, linux/if_packet.h
pub(crate) const SOL_PACKET: libc::c_int = 263;
pub(crate) const PACKET_ADD_MEMBERSHIP: libc::c_int = 1;
pub(crate) const PACKET_DROP_MEMBERSHIP: libc::c_int = 2;
pub(crate) const PACKET_MR_PROMISC: libc::c_ushort = 1;

#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct ifmap {
    pub(crate) mem_start: libc::c_ulong,
    pub(crate) mem_end: libc::c_ulong,
    pub(crate) base_addr: libc::c_ushort,
    pub(crate) irq: libc::c_uchar,
    pub(crate) dma: libc::c_uchar,
    pub(crate) port: libc::c_uchar,
}

#[repr(C)]
pub(crate) union ifru {
    pub(crate) ifru_addr: libc::sockaddr,
    pub(crate) ifru_dstaddr: libc::sockaddr,
    pub(crate) ifru_netmask: libc::sockaddr,
    pub(crate) ifru_hwaddr: libc::sockaddr,
    pub(crate) ifru_flags: libc::c_short,
    pub(crate) ifru_ivalue: libc::c_int,
    pub(crate) ifru_mtu: libc::c_int,
    pub(crate) ifru_map: ifmap,
    pub(crate) ifru_slave: [libc::c_char; libc::IFNAMSIZ],
    pub(crate) ifru_newname: [libc::c_char; libc::IFNAMSIZ],
}

#[repr(C)]
pub(crate) union ifrn {
    pub(crate) ifrn_name: [libc::c_char; libc::IFNAMSIZ],
}

#[repr(C)]
pub(crate) struct ifreq {
    pub(crate) ifr_ifrn: ifrn,
    pub(crate) ifr_ifru: ifru,
}

impl ifreq {
    /// A zeroed request naming `iface`. Names longer than `IFNAMSIZ - 1` bytes are cut so the
    /// result stays NUL terminated.
    pub(crate) fn with_name(iface: &CStr) -> ifreq {
        // All-zero bytes are a valid ifreq: every field is a plain integer or array.
        let mut ifr: ifreq = unsafe { MaybeUninit::zeroed().assume_init() };
        let name = iface.to_bytes();
        let len = name.len().min(libc::IFNAMSIZ - 1);
        // ifrn has a single variant, the name.
        let dest = unsafe { &mut ifr.ifr_ifrn.ifrn_name };
        for (d, s) in dest.iter_mut().zip(&name[..len]) {
            *d = *s as libc::c_char;
        }
        ifr
    }
}

#[repr(C)]
pub(crate) struct packet_mreq {
    pub(crate) mr_ifindex: libc::c_int,
    pub(crate) mr_type: libc::c_ushort,
    pub(crate) mr_alen: libc::c_ushort,
    pub(crate) mr_address: [libc::c_uchar; 8],
}
