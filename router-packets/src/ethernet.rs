use crate::*;
use std::convert::{TryFrom, TryInto};

pub const ETHERNET_HEADER_LEN: usize = 14;

#[derive(Clone, Debug)]
pub struct EthernetFrame {
    pub data: PacketData,
    pub payload_offset: usize,
}

impl Packet for EthernetFrame {}

impl EthernetFrame {
    pub fn from_buffer(frame: PacketData) -> Result<EthernetFrame, &'static str> {
        // Ethernet II frames must be at least the header, which is 14bytes
        // 0                    6                    12                      14
        // |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
        // No 802.1Q tags, the router only ever speaks untagged Ethernet II.

        if frame.len() < ETHERNET_HEADER_LEN {
            return Err("Frame is less than the minimum of 14 bytes");
        }

        Ok(EthernetFrame {
            data: frame,
            payload_offset: ETHERNET_HEADER_LEN,
        })
    }

    /// Returns an empty EthernetFrame where all values all populated to zero. This function allocates a
    /// new array to hold the header.
    pub fn empty() -> EthernetFrame {
        EthernetFrame {
            data: vec![0; ETHERNET_HEADER_LEN],
            payload_offset: ETHERNET_HEADER_LEN,
        }
    }

    pub fn dest_mac(&self) -> MacAddr {
        let bytes: [u8; 6] = self.data[0..6].try_into().unwrap();
        MacAddr::new(bytes)
    }

    pub fn src_mac(&self) -> MacAddr {
        let bytes: [u8; 6] = self.data[6..12].try_into().unwrap();
        MacAddr::new(bytes)
    }

    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        self.data[..6].copy_from_slice(&mac.bytes);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        self.data[6..12].copy_from_slice(&mac.bytes);
    }

    /// Points the frame at its next link-layer hop.
    pub fn set_link_addrs(&mut self, dest: MacAddr, src: MacAddr) {
        self.set_dest_mac(dest);
        self.set_src_mac(src);
    }

    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.data[12..=13].try_into().unwrap())
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        self.data[12..=13].copy_from_slice(&ether_type.to_be_bytes());
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..]
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend_from_slice(payload);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn encap_ipv4(ipv4: Ipv4Packet) -> EthernetFrame {
        let mut frame = EthernetFrame::empty();
        frame.set_payload(&ipv4.data[ipv4.layer3_offset..]);
        frame.set_ether_type(IPV4_ETHER_TYPE);
        frame
    }
}

/// EthernetFrames are considered the same if they carry the same bytes.
impl PartialEq for EthernetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for EthernetFrame {}

impl TryFrom<Ipv4Packet> for EthernetFrame {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        match packet.layer2_offset {
            Some(0) => EthernetFrame::from_buffer(packet.data),
            Some(_) => Err("Ethernet header does not start the buffer"),
            None => Err("IPv4 Packet does not contain an Ethernet Frame"),
        }
    }
}

impl TryFrom<IcmpMessage> for EthernetFrame {
    type Error = &'static str;

    fn try_from(message: IcmpMessage) -> Result<Self, Self::Error> {
        EthernetFrame::try_from(Ipv4Packet::try_from(message)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn ethernet_frame() {
        let data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0, 0];
        let frame = EthernetFrame::from_buffer(data).unwrap();
        assert_eq!(
            frame.dest_mac(),
            MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0xff, 0xff])
        );
        assert_eq!(frame.src_mac(), MacAddr::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(frame.ether_type(), 0);
        assert_eq!(frame.payload().len(), 0);
    }

    #[test]
    fn set_payload() {
        let data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0, 0];
        let mut frame = EthernetFrame::from_buffer(data).unwrap();
        assert_eq!(frame.payload().len(), 0);

        let new_payload: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9];
        frame.set_payload(&new_payload);
        assert_eq!(frame.payload(), &new_payload[..]);
        assert_eq!(frame.len(), 14 + 9);

        frame.set_payload(&[7]);
        assert_eq!(frame.payload(), &[7]);
    }

    #[test]
    fn invalid_data_length() {
        let data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6];
        assert_eq!(
            EthernetFrame::from_buffer(data),
            Err("Frame is less than the minimum of 14 bytes")
        );
    }

    #[test]
    fn set_link_addrs() {
        let mut frame = EthernetFrame::empty();
        let dest = MacAddr::new([0x98, 0x88, 0x18, 0x12, 0xb4, 0xdf]);
        let src = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0, 1]);
        frame.set_link_addrs(dest, src);
        assert_eq!(frame.dest_mac(), dest);
        assert_eq!(frame.src_mac(), src);
    }

    #[test]
    fn ether_type() {
        let data: Vec<u8> = vec![
            0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x06,
        ];
        let mut frame = EthernetFrame::from_buffer(data).unwrap();
        assert_eq!(frame.ether_type(), ARP_ETHER_TYPE);
        frame.set_ether_type(IPV4_ETHER_TYPE);
        assert_eq!(&frame.data[12..], &[0x08, 0x00]);
    }

    #[test]
    fn encap_ipv4() {
        let frame = EthernetFrame::encap_ipv4(Ipv4Packet::empty());
        assert_eq!(frame.payload_offset, 14);
        assert_eq!(frame.len(), 34);
        assert_eq!(frame.ether_type(), IPV4_ETHER_TYPE);
    }

    #[test]
    fn ipv4_back_to_frame() {
        let frame = EthernetFrame::encap_ipv4(Ipv4Packet::empty());
        let packet = Ipv4Packet::try_from(frame.clone()).unwrap();
        assert_eq!(EthernetFrame::try_from(packet), Ok(frame));

        assert!(EthernetFrame::try_from(Ipv4Packet::empty()).is_err());
    }
}
