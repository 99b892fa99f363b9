use crate::arp::{transmit, ArpResolver, Resolution};
use crate::classifier::{Classifier, ClassifyDestination, ClassifyEtherType, FrameKind};
use crate::error::RouterError;
use crate::icmp::IcmpGenerator;
use crate::ipv4::{decrement_ttl, verify_checksum};
use crate::route::{RouteId, RouteTable};
use netif::{InterfaceId, NetIf};
use router_packets::{
    ArpFrame, ArpOp, EthernetFrame, IcmpMessage, IcmpType, IpProtocol, Ipv4Packet, MacAddr,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tracing::{debug, info, trace, warn};

/// Largest frame `run` will receive; anything longer is truncated by the link.
pub const MAX_FRAME_LEN: usize = 1600;

/// What became of one received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Link destination was neither us nor broadcast.
    NotForUs,
    /// Headers too short or inconsistent to act on.
    Malformed,
    BadChecksum,
    /// Not something this router handles: unknown EtherType, ARP for another host, and so on.
    Ignored,
    EchoReplied(Resolution),
    TimeExceeded(Resolution),
    Unreachable(Resolution),
    Forwarded(Resolution),
    ArpReplied,
    /// An ARP reply was learned and this many parked packets went out.
    ArpResolved { flushed: usize },
}

///
/// The router's state: route table, ARP cache and pending queue, plus the interfaces it owns.
/// `run` drives it from a single thread, one frame at a time, each frame fully handled before
/// the next is received.
///
pub struct Router<N: NetIf> {
    netif: N,
    routes: RouteTable,
    resolver: ArpResolver,
    icmp: IcmpGenerator,
}

impl<N: NetIf> Router<N> {
    /// Fails if a route points at an interface `netif` does not have.
    pub fn new(netif: N, routes: RouteTable) -> Result<Router<N>, RouterError> {
        let configured = netif.interfaces().len();
        if let Some(entry) = routes.entries().iter().find(|e| e.interface >= configured) {
            return Err(RouterError::UnknownInterface(entry.interface));
        }
        for (id, iface) in netif.interfaces().iter().enumerate() {
            info!(id, name = %iface.name, mac = %iface.mac, ip = %iface.ipv4, "interface");
        }
        Ok(Router {
            netif,
            routes,
            resolver: ArpResolver::new(),
            icmp: IcmpGenerator::new(),
        })
    }

    /// Receives and handles frames until the link or a fatal condition stops it.
    pub fn run(&mut self) -> Result<(), RouterError> {
        let mut buf = vec![0u8; MAX_FRAME_LEN];
        loop {
            let (iface, len) = self
                .netif
                .recv_any(&mut buf)
                .map_err(RouterError::Link)?;
            let verdict = self.handle_frame(iface, &buf[..len])?;
            trace!(iface, len, ?verdict, "handled frame");
        }
    }

    /// Handles one frame received on `iface`.
    pub fn handle_frame(&mut self, iface: InterfaceId, data: &[u8]) -> Result<Verdict, RouterError> {
        let (local_mac, local_ip) = {
            let info = self
                .netif
                .interface(iface)
                .map_err(|_| RouterError::UnknownInterface(iface))?;
            (info.mac, info.ipv4)
        };

        let frame = match EthernetFrame::from_buffer(data.to_vec()) {
            Ok(frame) => frame,
            Err(reason) => {
                debug!(iface, reason, "dropping runt frame");
                return Ok(Verdict::Malformed);
            }
        };

        if !ClassifyDestination::new(local_mac).classify(&frame).is_for_us() {
            trace!(iface, dst = %frame.dest_mac(), "frame not for us");
            return Ok(Verdict::NotForUs);
        }

        match ClassifyEtherType.classify(&frame) {
            FrameKind::Ipv4 => self.handle_ipv4(iface, local_ip, frame),
            FrameKind::Arp => self.handle_arp(iface, local_mac, local_ip, frame),
            FrameKind::Other(ether_type) => {
                trace!(iface, ether_type, "ignoring frame");
                Ok(Verdict::Ignored)
            }
        }
    }

    fn handle_ipv4(
        &mut self,
        iface: InterfaceId,
        local_ip: Ipv4Addr,
        frame: EthernetFrame,
    ) -> Result<Verdict, RouterError> {
        let mut packet = match Ipv4Packet::try_from(frame) {
            Ok(packet) => packet,
            Err(reason) => {
                debug!(iface, reason, "dropping malformed IPv4 packet");
                return Ok(Verdict::Malformed);
            }
        };

        if packet.dest_addr() == local_ip && packet.protocol() == IpProtocol::ICMP {
            if let Ok(echo) = IcmpMessage::try_from(packet.clone()) {
                if echo.is_type(IcmpType::EchoRequest) {
                    let (reply, route) = self.icmp.echo_reply(&packet, &echo, &self.routes)?;
                    info!(iface, src = %packet.src_addr(), "echo request, replying");
                    return Ok(Verdict::EchoReplied(self.send(reply, route)?));
                }
            }
        }

        if !verify_checksum(&mut packet) {
            debug!(iface, src = %packet.src_addr(), dst = %packet.dest_addr(), "bad checksum");
            return Ok(Verdict::BadChecksum);
        }

        if !decrement_ttl(&mut packet) {
            let (error, route) =
                self.icmp
                    .time_exceeded(&packet, &self.routes, self.netif.interfaces())?;
            info!(iface, src = %packet.src_addr(), dst = %packet.dest_addr(), "TTL exceeded");
            return Ok(Verdict::TimeExceeded(self.send(error, route)?));
        }

        let route = match self.routes.lookup(packet.dest_addr()) {
            Some((route, _)) => route,
            None => {
                let (error, route) = self.icmp.destination_unreachable(
                    &packet,
                    &self.routes,
                    self.netif.interfaces(),
                )?;
                info!(iface, src = %packet.src_addr(), dst = %packet.dest_addr(), "no route");
                return Ok(Verdict::Unreachable(self.send(error, route)?));
            }
        };

        let frame = match EthernetFrame::try_from(packet) {
            Ok(frame) => frame,
            Err(reason) => {
                warn!(iface, reason, "lost the Ethernet header of a forwarded packet");
                return Ok(Verdict::Malformed);
            }
        };
        Ok(Verdict::Forwarded(self.send(frame, route)?))
    }

    fn handle_arp(
        &mut self,
        iface: InterfaceId,
        local_mac: MacAddr,
        local_ip: Ipv4Addr,
        frame: EthernetFrame,
    ) -> Result<Verdict, RouterError> {
        let arp = match ArpFrame::try_from(frame) {
            Ok(arp) if arp.is_ethernet_ipv4() => arp,
            Ok(_) => return Ok(Verdict::Ignored),
            Err(reason) => {
                debug!(iface, reason, "dropping malformed ARP frame");
                return Ok(Verdict::Malformed);
            }
        };
        let (sender_mac, sender_ip, target_ip) = match (
            arp.sender_mac_addr(),
            arp.sender_ipv4_addr(),
            arp.target_ipv4_addr(),
        ) {
            (Ok(sender_mac), Ok(sender_ip), Ok(target_ip)) => (sender_mac, sender_ip, target_ip),
            _ => return Ok(Verdict::Malformed),
        };

        if arp.is_op(ArpOp::Request) {
            if target_ip != local_ip {
                trace!(iface, target = %target_ip, "ARP request for someone else");
                return Ok(Verdict::Ignored);
            }
            let reply =
                ArpFrame::ipv4(ArpOp::Reply, local_mac, local_ip, sender_mac, sender_ip).frame();
            transmit(&mut self.netif, iface, &reply)?;
            debug!(iface, requester = %sender_ip, "answered ARP request");
            Ok(Verdict::ArpReplied)
        } else if arp.is_op(ArpOp::Reply) {
            let flushed =
                self.resolver
                    .on_arp_reply(&mut self.netif, &self.routes, sender_ip, sender_mac)?;
            Ok(Verdict::ArpResolved { flushed })
        } else {
            Ok(Verdict::Ignored)
        }
    }

    fn send(&mut self, frame: EthernetFrame, route: RouteId) -> Result<Resolution, RouterError> {
        self.resolver
            .send_or_queue(&mut self.netif, &self.routes, frame, route)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn resolver(&self) -> &ArpResolver {
        &self.resolver
    }

    /// Packets parked waiting for ARP.
    pub fn pending(&self) -> usize {
        self.resolver.queue().len()
    }

    pub fn netif(&self) -> &N {
        &self.netif
    }
}
