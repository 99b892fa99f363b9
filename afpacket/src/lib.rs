#![cfg(target_os = "linux")]
//! Blocking Linux `AF_PACKET` sockets: whole Ethernet frames in and out of one interface.
mod linux;
mod sockets;

pub use sockets::{Addr, BoundSocket, Socket};
