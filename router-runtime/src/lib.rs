//! The forwarding core of a static IPv4 router.
//!
//! A `Router` owns the route table and the ARP state, and handles one Ethernet frame at a time
//! from any `NetIf`: frames addressed to the router are answered (ICMP echo, ARP), everything
//! else is validated, routed by longest-prefix match and handed to the ARP resolver, which sends
//! it right away or parks it until the next hop's MAC is known.

/// Binary trie doing the longest-prefix match behind the route table.
pub mod trie;

/// Static routes, their file format, and LPM lookup.
pub mod route;

/// ARP cache, pending packet queue, and the resolver that drains it.
pub mod arp;

/// Header checks done before forwarding: checksum and TTL.
pub mod ipv4;

/// Echo replies and error messages originated by the router.
pub mod icmp;

/// Classifiers sort frames without touching them.
pub mod classifier;

/// The per-frame state machine and the receive loop.
pub mod dispatch;

/// In-memory links for simulations and tests.
pub mod link;

mod error;

pub use crate::dispatch::{Router, Verdict};
pub use crate::error::RouterError;
