use crate::route::RouteId;
use router_packets::EthernetFrame;
use std::collections::VecDeque;

/// A forwardable frame parked until the MAC of its route's next hop is known.
#[derive(Debug, Clone)]
pub struct PendingPacket {
    pub frame: EthernetFrame,
    pub route: RouteId,
}

impl PendingPacket {
    pub fn new(frame: EthernetFrame, route: RouteId) -> Self {
        PendingPacket { frame, route }
    }
}

/// FIFO of pending packets. Unbounded, and nothing ever times out of it.
#[derive(Debug, Default)]
pub struct PendingQueue {
    packets: VecDeque<PendingPacket>,
}

impl PendingQueue {
    pub fn new() -> Self {
        PendingQueue {
            packets: VecDeque::new(),
        }
    }

    pub fn push(&mut self, packet: PendingPacket) {
        self.packets.push_back(packet);
    }

    ///
    /// One full pass over the queue: removes every packet `ready` accepts and returns them in
    /// queue order. The packets left behind keep their relative order.
    ///
    pub fn take_ready<F>(&mut self, mut ready: F) -> Vec<PendingPacket>
    where
        F: FnMut(&PendingPacket) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.packets.len());
        for packet in self.packets.drain(..) {
            if ready(&packet) {
                taken.push(packet);
            } else {
                kept.push_back(packet);
            }
        }
        self.packets = kept;
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingPacket> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RouteEntry, RouteTable};
    use std::net::Ipv4Addr;

    fn marked_frame(mark: u8) -> EthernetFrame {
        let mut frame = EthernetFrame::empty();
        frame.set_payload(&[mark]);
        frame
    }

    #[test]
    fn take_ready_keeps_order_of_the_rest() {
        let routes = RouteTable::new(vec![
            RouteEntry::new(
                Ipv4Addr::new(10, 0, 0, 0),
                Ipv4Addr::new(255, 0, 0, 0),
                Ipv4Addr::new(10, 0, 0, 1),
                0,
            )
            .unwrap(),
            RouteEntry::new(
                Ipv4Addr::new(20, 0, 0, 0),
                Ipv4Addr::new(255, 0, 0, 0),
                Ipv4Addr::new(20, 0, 0, 1),
                1,
            )
            .unwrap(),
        ]);
        let (to_a, _) = routes.lookup(Ipv4Addr::new(10, 1, 1, 1)).unwrap();
        let (to_b, _) = routes.lookup(Ipv4Addr::new(20, 1, 1, 1)).unwrap();

        let mut queue = PendingQueue::new();
        queue.push(PendingPacket::new(marked_frame(1), to_b));
        queue.push(PendingPacket::new(marked_frame(2), to_a));
        queue.push(PendingPacket::new(marked_frame(3), to_b));
        queue.push(PendingPacket::new(marked_frame(4), to_a));

        let taken = queue.take_ready(|packet| packet.route == to_a);
        let marks: Vec<u8> = taken.iter().map(|p| p.frame.payload()[0]).collect();
        assert_eq!(marks, vec![2, 4]);

        let left: Vec<u8> = queue.iter().map(|p| p.frame.payload()[0]).collect();
        assert_eq!(left, vec![1, 3]);
        assert_eq!(queue.len(), 2);

        assert!(queue.take_ready(|packet| packet.route == to_a).is_empty());
        assert_eq!(queue.len(), 2);
    }
}
