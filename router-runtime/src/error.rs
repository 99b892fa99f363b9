use failure::Fail;
use netif::InterfaceId;
use std::net::Ipv4Addr;

/// Conditions the router cannot continue from. Anything that is merely a bad or unwanted frame
/// is dropped with a `Verdict` instead.
#[derive(Debug, Fail)]
pub enum RouterError {
    #[fail(display = "no route back to {}", _0)]
    NoReturnRoute(Ipv4Addr),

    #[fail(display = "interface {} is not configured", _0)]
    UnknownInterface(InterfaceId),

    #[fail(display = "route table line {}: {} ({:?})", line, reason, text)]
    RouteTable {
        line: usize,
        text: String,
        reason: &'static str,
    },

    #[fail(display = "could not read route table {}: {}", path, error)]
    RouteTableIo {
        path: String,
        #[cause]
        error: std::io::Error,
    },

    #[fail(display = "link failure: {}", _0)]
    Link(failure::Error),
}
