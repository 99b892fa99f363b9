use crate::*;
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

pub const IPV4_HEADER_LEN: usize = 20;

#[derive(Clone, Debug)]
pub struct Ipv4Packet {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: usize,
    pub payload_offset: usize,
}

impl Packet for Ipv4Packet {}

impl Ipv4Packet {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: usize,
    ) -> Result<Ipv4Packet, &'static str> {
        // Header of Ethernet Frame: 14 bytes
        // Header of IPv4 Frame: 20 bytes
        if data.len() < layer3_offset + IPV4_HEADER_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }

        // Check version number
        let version: u8 = (data[layer3_offset] & 0xF0) >> 4;
        if version != 4 {
            return Err("Packet has incorrect version, is not Ipv4Packet");
        }

        // This is the header length in 32bit words
        let ihl = (data[layer3_offset] & 0x0F) as usize;
        if ihl < 5 {
            return Err("Packet has an IHL smaller than the minimum header");
        }
        let payload_offset = layer3_offset + (ihl * 4);

        // TotalLen is the 3rd and 4th byte of the IP Header. Frames may be padded past it by the
        // link layer, but never cut short of it.
        let total_len = u16::from_be_bytes(
            data[layer3_offset + 2..=layer3_offset + 3]
                .try_into()
                .unwrap(),
        ) as usize;
        if total_len < ihl * 4 || data.len() < layer3_offset + total_len {
            return Err("Packet has invalid total length field");
        }

        Ok(Ipv4Packet {
            data,
            layer2_offset,
            layer3_offset,
            payload_offset,
        })
    }

    /// Returns a 20 byte header with version and IHL set and every other field zeroed.
    pub fn empty() -> Ipv4Packet {
        let mut data = vec![0; IPV4_HEADER_LEN];
        data[0] = 0x45;
        data[3] = IPV4_HEADER_LEN as u8;
        Ipv4Packet::from_buffer(data, None, 0).unwrap()
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[self.layer3_offset + 12..self.layer3_offset + 16]
            .try_into()
            .unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        self.data[self.layer3_offset + 12..self.layer3_offset + 16].copy_from_slice(&addr.octets());
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[self.layer3_offset + 16..self.layer3_offset + 20]
            .try_into()
            .unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_dest_addr(&mut self, addr: Ipv4Addr) {
        self.data[self.layer3_offset + 16..self.layer3_offset + 20].copy_from_slice(&addr.octets());
    }

    pub fn ihl(&self) -> u8 {
        self.data[self.layer3_offset] & 0x0F
    }

    pub fn header_len(&self) -> usize {
        self.payload_offset - self.layer3_offset
    }

    /// The header bytes, options included.
    pub fn header(&self) -> &[u8] {
        &self.data[self.layer3_offset..self.payload_offset]
    }

    /// The payload as delimited by the total length field, link-layer padding excluded.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..self.end()]
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend_from_slice(payload);
        let total_len = self.header_len() + payload.len();
        self.set_total_len(total_len as u16);
    }

    pub fn tos(&self) -> u8 {
        self.data[self.layer3_offset + 1]
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.data[self.layer3_offset + 1] = tos;
    }

    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 2..=self.layer3_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_total_len(&mut self, total_len: u16) {
        self.data[self.layer3_offset + 2..=self.layer3_offset + 3]
            .copy_from_slice(&total_len.to_be_bytes());
    }

    pub fn identification(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 4..=self.layer3_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_identification(&mut self, id: u16) {
        self.data[self.layer3_offset + 4..=self.layer3_offset + 5].copy_from_slice(&id.to_be_bytes());
    }

    /// Flags and fragment offset as the raw 16 bit field.
    pub fn fragment_field(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 6..=self.layer3_offset + 7]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_fragment_field(&mut self, field: u16) {
        self.data[self.layer3_offset + 6..=self.layer3_offset + 7]
            .copy_from_slice(&field.to_be_bytes());
    }

    pub fn fragment_offset(&self) -> u16 {
        self.fragment_field() & 0x1FFF
    }

    /// Returns tuple of (Don't Fragment, More Fragments)
    pub fn flags(&self) -> (bool, bool) {
        let df = (self.data[self.layer3_offset + 6] & 0x40) != 0;
        let mf = (self.data[self.layer3_offset + 6] & 0x20) != 0;
        (df, mf)
    }

    pub fn ttl(&self) -> u8 {
        self.data[self.layer3_offset + 8]
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.data[self.layer3_offset + 8] = ttl;
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[self.layer3_offset + 9])
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) {
        self.data[self.layer3_offset + 9] = protocol.into();
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 10..=self.layer3_offset + 11]
                .try_into()
                .unwrap(),
        )
    }

    /// Stores `checksum` as is, nothing gets recomputed.
    pub fn set_checksum(&mut self, checksum: u16) {
        self.data[self.layer3_offset + 10..=self.layer3_offset + 11]
            .copy_from_slice(&checksum.to_be_bytes());
    }

    /// Internet checksum over the header bytes exactly as they are now, checksum field included.
    pub fn header_checksum(&self) -> u16 {
        internet_checksum(self.header())
    }

    /// Zeroes the checksum field, then stores the checksum of the resulting header.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = self.header_checksum();
        self.set_checksum(checksum);
    }

    pub fn encap_icmp(icmp: IcmpMessage) -> Ipv4Packet {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(IpProtocol::ICMP);
        packet.set_payload(&icmp.data[icmp.layer4_offset..icmp.end()]);
        packet
    }

    fn end(&self) -> usize {
        self.layer3_offset + self.total_len() as usize
    }
}

/// Ipv4Packets are considered the same if they have the same data from the layer 3
/// header and onward. This function does not consider the data before the start of
/// the IPv4 header.
impl PartialEq for Ipv4Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer3_offset..] == other.data[other.layer3_offset..]
    }
}

impl Eq for Ipv4Packet {}

impl TryFrom<EthernetFrame> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != IPV4_ETHER_TYPE {
            return Err("Frame does not have IPv4 ether type.");
        }
        let payload_offset = frame.payload_offset;
        Ipv4Packet::from_buffer(frame.data, Some(0), payload_offset)
    }
}

impl TryFrom<IcmpMessage> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(message: IcmpMessage) -> Result<Self, Self::Error> {
        if let Some(layer3_offset) = message.layer3_offset {
            Ipv4Packet::from_buffer(message.data, message.layer2_offset, layer3_offset)
        } else {
            Err("ICMP Message does not contain an IP Packet")
        }
    }
}
