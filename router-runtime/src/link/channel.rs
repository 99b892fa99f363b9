use crossbeam::crossbeam_channel::{self, Receiver, Sender};
use netif::{Error, InterfaceId, InterfaceInfo, NetIf};

/// A frame on the simulated wire, tagged with the interface it arrives on or leaves from.
pub type WireFrame = (InterfaceId, Vec<u8>);

///
/// In-memory `NetIf` over crossbeam channels. Whatever is sent into the ingress channel is
/// received by the router as if it arrived on that interface; whatever the router transmits
/// shows up on the egress channel.
///
pub struct ChannelNetIf {
    interfaces: Vec<InterfaceInfo>,
    ingress: Receiver<WireFrame>,
    egress: Sender<WireFrame>,
}

/// The far side of a `ChannelNetIf`.
pub struct Wire {
    pub ingress: Sender<WireFrame>,
    pub egress: Receiver<WireFrame>,
}

impl ChannelNetIf {
    pub fn new(interfaces: Vec<InterfaceInfo>) -> (ChannelNetIf, Wire) {
        let (ingress_sender, ingress_receiver) = crossbeam_channel::unbounded();
        let (egress_sender, egress_receiver) = crossbeam_channel::unbounded();
        let netif = ChannelNetIf {
            interfaces,
            ingress: ingress_receiver,
            egress: egress_sender,
        };
        let wire = Wire {
            ingress: ingress_sender,
            egress: egress_receiver,
        };
        (netif, wire)
    }
}

impl NetIf for ChannelNetIf {
    /// Frames longer than `buf` are cut short, the way a raw socket truncates them.
    /// Fails once every ingress sender has been dropped.
    fn recv_any(&mut self, buf: &mut [u8]) -> Result<(InterfaceId, usize), Error> {
        let (iface, frame) = self
            .ingress
            .recv()
            .map_err(|_| failure::err_msg("ingress channel disconnected"))?;
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Ok((iface, len))
    }

    fn send(&mut self, iface: InterfaceId, frame: &[u8]) -> Result<(), Error> {
        self.interface(iface)?;
        self.egress
            .send((iface, frame.to_vec()))
            .map_err(|_| failure::err_msg("egress channel disconnected"))
    }

    fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_packets::MacAddr;
    use std::net::Ipv4Addr;

    fn interfaces() -> Vec<InterfaceInfo> {
        vec![InterfaceInfo {
            name: "r-0".to_string(),
            mac: MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0, 0]),
            ipv4: Ipv4Addr::new(192, 168, 0, 1),
        }]
    }

    #[test]
    fn frames_cross_the_wire() {
        let (mut netif, wire) = ChannelNetIf::new(interfaces());

        wire.ingress.send((0, vec![1, 2, 3])).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(netif.recv_any(&mut buf).unwrap(), (0, 2));
        assert_eq!(buf, [1, 2]);

        netif.send(0, &[9, 9]).unwrap();
        assert_eq!(wire.egress.try_recv().unwrap(), (0, vec![9, 9]));
        assert!(netif.send(1, &[9, 9]).is_err());
    }

    #[test]
    fn disconnect_ends_receive() {
        let (mut netif, wire) = ChannelNetIf::new(interfaces());
        drop(wire);
        let mut buf = [0u8; 64];
        assert!(netif.recv_any(&mut buf).is_err());
    }
}
