use crate::arp::{ArpCache, PendingPacket, PendingQueue};
use crate::error::RouterError;
use crate::route::{RouteId, RouteTable};
use netif::{InterfaceId, NetIf};
use router_packets::{ArpFrame, ArpOp, EthernetFrame, MacAddr};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// What `send_or_queue` did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The next hop was cached, the frame is on the wire.
    Sent,
    /// The frame is parked and an ARP request went out for the next hop.
    Queued,
}

/// Owns the ARP cache and the pending queue, and is the only path frames take to the wire
/// once a route has been picked for them.
#[derive(Debug, Default)]
pub struct ArpResolver {
    cache: ArpCache,
    queue: PendingQueue,
}

impl ArpResolver {
    pub fn new() -> Self {
        ArpResolver {
            cache: ArpCache::new(),
            queue: PendingQueue::new(),
        }
    }

    pub fn cache(&self) -> &ArpCache {
        &self.cache
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    ///
    /// Sends `frame` along `route` if its next hop's MAC is cached, rewriting the link addresses
    /// to (next hop, outgoing interface). Otherwise parks the frame and broadcasts an ARP
    /// request for the next hop on the outgoing interface. Every unresolved frame triggers its
    /// own request.
    ///
    pub fn send_or_queue<N: NetIf>(
        &mut self,
        netif: &mut N,
        routes: &RouteTable,
        mut frame: EthernetFrame,
        route_id: RouteId,
    ) -> Result<Resolution, RouterError> {
        let route = routes.get(route_id);
        let (local_mac, local_ip) = local_addrs(netif, route.interface)?;

        match self.cache.lookup(route.next_hop) {
            Some(next_hop_mac) => {
                frame.set_link_addrs(next_hop_mac, local_mac);
                transmit(netif, route.interface, &frame)?;
                trace!(
                    iface = route.interface,
                    next_hop = %route.next_hop,
                    mac = %next_hop_mac,
                    "sent"
                );
                Ok(Resolution::Sent)
            }
            None => {
                self.queue.push(PendingPacket::new(frame, route_id));
                let request = ArpFrame::ipv4(
                    ArpOp::Request,
                    local_mac,
                    local_ip,
                    MacAddr::BROADCAST,
                    route.next_hop,
                )
                .frame();
                transmit(netif, route.interface, &request)?;
                debug!(
                    iface = route.interface,
                    next_hop = %route.next_hop,
                    pending = self.queue.len(),
                    "next hop unresolved, queued and sent ARP request"
                );
                Ok(Resolution::Queued)
            }
        }
    }

    ///
    /// Records `sender_ip -> sender_mac`, then makes one pass over the pending queue sending
    /// every packet whose next hop is `sender_ip`. The other packets stay queued in order.
    /// Returns how many packets were sent.
    ///
    pub fn on_arp_reply<N: NetIf>(
        &mut self,
        netif: &mut N,
        routes: &RouteTable,
        sender_ip: Ipv4Addr,
        sender_mac: MacAddr,
    ) -> Result<usize, RouterError> {
        self.cache.record(sender_ip, sender_mac);

        let ready = self
            .queue
            .take_ready(|pending| routes.get(pending.route).next_hop == sender_ip);
        let flushed = ready.len();

        for PendingPacket { mut frame, route } in ready {
            let route = routes.get(route);
            let (local_mac, _) = local_addrs(netif, route.interface)?;
            frame.set_link_addrs(sender_mac, local_mac);
            transmit(netif, route.interface, &frame)?;
        }

        debug!(
            next_hop = %sender_ip,
            mac = %sender_mac,
            flushed,
            pending = self.queue.len(),
            "learned next hop"
        );
        Ok(flushed)
    }
}

fn local_addrs<N: NetIf>(netif: &N, iface: InterfaceId) -> Result<(MacAddr, Ipv4Addr), RouterError> {
    let info = netif
        .interface(iface)
        .map_err(|_| RouterError::UnknownInterface(iface))?;
    Ok((info.mac, info.ipv4))
}

pub(crate) fn transmit<N: NetIf>(
    netif: &mut N,
    iface: InterfaceId,
    frame: &EthernetFrame,
) -> Result<(), RouterError> {
    netif.send(iface, &frame.data).map_err(RouterError::Link)
}
