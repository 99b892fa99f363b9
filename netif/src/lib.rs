//! This crate defines an interface for accessing a set of raw network interfaces.
//! Actual implementations are found in sister crates.

use router_packets::MacAddr;
use std::net::Ipv4Addr;

pub use failure::Error;

/// Interfaces are numbered from 0 in the order they were configured.
pub type InterfaceId = usize;

/// What the router needs to know about one of its own interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub mac: MacAddr,
    pub ipv4: Ipv4Addr,
}

pub trait NetIf {
    /// Blocks until a frame arrives on any interface, copies it into `buf` and returns where it
    /// came from and how long it is.
    fn recv_any(&mut self, buf: &mut [u8]) -> Result<(InterfaceId, usize), Error>;

    /// Transmits one complete Ethernet frame on `iface`.
    fn send(&mut self, iface: InterfaceId, frame: &[u8]) -> Result<(), Error>;

    fn interfaces(&self) -> &[InterfaceInfo];

    fn interface(&self, iface: InterfaceId) -> Result<&InterfaceInfo, Error> {
        self.interfaces()
            .get(iface)
            .ok_or_else(|| failure::format_err!("no interface with id {}", iface))
    }

    fn mac_addr(&self, iface: InterfaceId) -> Result<MacAddr, Error> {
        Ok(self.interface(iface)?.mac)
    }

    fn ipv4_addr(&self, iface: InterfaceId) -> Result<Ipv4Addr, Error> {
        Ok(self.interface(iface)?.ipv4)
    }
}
