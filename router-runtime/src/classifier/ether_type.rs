use crate::classifier::Classifier;
use router_packets::{EthernetFrame, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Ipv4,
    Arp,
    Other(u16),
}

/// Sorts Ethernet frames by their EtherType field.
/// https://en.wikipedia.org/wiki/EtherType
#[derive(Default)]
pub struct ClassifyEtherType;

impl Classifier for ClassifyEtherType {
    type Packet = EthernetFrame;
    type Class = FrameKind;

    fn classify(&self, frame: &Self::Packet) -> Self::Class {
        match frame.ether_type() {
            IPV4_ETHER_TYPE => FrameKind::Ipv4,
            ARP_ETHER_TYPE => FrameKind::Arp,
            other => FrameKind::Other(other),
        }
    }
}
