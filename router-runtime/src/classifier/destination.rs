use crate::classifier::Classifier;
use router_packets::{EthernetFrame, MacAddr};

/// True when a frame sent to `dest` should be picked up by an interface whose address is `local`.
pub fn is_for_us(dest: MacAddr, local: MacAddr) -> bool {
    dest.is_broadcast() || dest == local
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDestination {
    Local,
    Broadcast,
    Elsewhere,
}

impl LinkDestination {
    pub fn is_for_us(self) -> bool {
        self != LinkDestination::Elsewhere
    }
}

/// Sorts frames arriving on one interface by who they were sent to.
pub struct ClassifyDestination {
    pub local: MacAddr,
}

impl ClassifyDestination {
    pub fn new(local: MacAddr) -> Self {
        ClassifyDestination { local }
    }
}

impl Classifier for ClassifyDestination {
    type Packet = EthernetFrame;
    type Class = LinkDestination;

    fn classify(&self, frame: &Self::Packet) -> Self::Class {
        let dest = frame.dest_mac();
        if dest.is_broadcast() {
            LinkDestination::Broadcast
        } else if is_for_us(dest, self.local) {
            LinkDestination::Local
        } else {
            LinkDestination::Elsewhere
        }
    }
}
