use crate::*;
use std::convert::{TryFrom, TryInto};

/// Type, code, checksum and the 4 byte rest-of-header.
pub const ICMP_HEADER_LEN: usize = 8;

/// The ICMP message types the router emits or reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    EchoRequest = 8,
    TimeExceeded = 11,
}

///
/// ICMP message (RFC 792) sitting on top of an optional IPv4 header.
/// https://tools.ietf.org/html/rfc792
///
#[derive(Clone, Debug)]
pub struct IcmpMessage {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
    pub payload_offset: usize,
}

impl Packet for IcmpMessage {}

impl IcmpMessage {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: Option<usize>,
        layer4_offset: usize,
    ) -> Result<IcmpMessage, &'static str> {
        if data.len() < layer4_offset + ICMP_HEADER_LEN {
            return Err("Message too short to contain valid ICMP Header");
        }

        if let Some(layer3_offset) = layer3_offset {
            if data.len() <= layer3_offset + 9 || (data[layer3_offset] & 0xF0) != 0x40 {
                return Err("ICMP Message is not carried by an IPv4 header");
            }
            if IpProtocol::from(data[layer3_offset + 9]) != IpProtocol::ICMP {
                return Err("Protocol is incorrect, since it isn't ICMP");
            }
        }

        let message = IcmpMessage {
            data,
            layer2_offset,
            layer3_offset,
            layer4_offset,
            payload_offset: layer4_offset + ICMP_HEADER_LEN,
        };
        if message.end() < message.payload_offset {
            return Err("IP total length leaves no room for the ICMP Header");
        }
        Ok(message)
    }

    /// An 8 byte ICMP header of zeroes with no layer 3 header in front of it.
    pub fn empty() -> IcmpMessage {
        IcmpMessage::from_buffer(vec![0; ICMP_HEADER_LEN], None, None, 0).unwrap()
    }

    pub fn msg_type(&self) -> u8 {
        self.data[self.layer4_offset]
    }

    pub fn set_msg_type(&mut self, msg_type: IcmpType) {
        self.data[self.layer4_offset] = msg_type as u8;
    }

    pub fn is_type(&self, msg_type: IcmpType) -> bool {
        self.msg_type() == msg_type as u8
    }

    pub fn code(&self) -> u8 {
        self.data[self.layer4_offset + 1]
    }

    pub fn set_code(&mut self, code: u8) {
        self.data[self.layer4_offset + 1] = code;
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
            .copy_from_slice(&checksum.to_be_bytes());
    }

    /// Echo identifier, the first half of the rest-of-header field.
    pub fn echo_identifier(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 4..=self.layer4_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_echo_identifier(&mut self, identifier: u16) {
        self.data[self.layer4_offset + 4..=self.layer4_offset + 5]
            .copy_from_slice(&identifier.to_be_bytes());
    }

    /// Echo sequence number, the second half of the rest-of-header field.
    pub fn echo_sequence(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_echo_sequence(&mut self, sequence: u16) {
        self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
            .copy_from_slice(&sequence.to_be_bytes());
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..self.end()]
    }

    /// Replaces the payload. Does not touch the checksum, nor any enclosing IPv4 header.
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend_from_slice(payload);
    }

    /// Zeroes the checksum field, then stores the checksum of the header and payload.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = internet_checksum(&self.data[self.layer4_offset..self.end()]);
        self.set_checksum(checksum);
    }

    /// True when the stored checksum matches the message.
    pub fn validate_checksum(&self) -> bool {
        internet_checksum(&self.data[self.layer4_offset..self.end()]) == 0
    }

    /// One past the last byte of the message. With an IPv4 header in front that is where its
    /// total length says the datagram ends, link-layer padding is not part of the message.
    pub(crate) fn end(&self) -> usize {
        match self.layer3_offset {
            Some(layer3_offset) => {
                let total_len = u16::from_be_bytes(
                    self.data[layer3_offset + 2..=layer3_offset + 3]
                        .try_into()
                        .unwrap(),
                ) as usize;
                (layer3_offset + total_len).min(self.data.len())
            }
            None => self.data.len(),
        }
    }
}

impl PartialEq for IcmpMessage {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer4_offset..] == other.data[other.layer4_offset..]
    }
}

impl Eq for IcmpMessage {}

impl TryFrom<Ipv4Packet> for IcmpMessage {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        let layer4_offset = packet.payload_offset;
        IcmpMessage::from_buffer(
            packet.data,
            packet.layer2_offset,
            Some(packet.layer3_offset),
            layer4_offset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn echo_request_packet() -> Ipv4Packet {
        let ip_data: Vec<u8> = vec![
            0x45, 0, 0, 30, 0, 1, 0, 0, 64, 1, 0, 0, 10, 0, 0, 2, 10, 0, 0, 1, // IPv4
            8, 0, 0, 0, 0, 7, 0, 3, // ICMP echo request, id 7, seq 3
            0xaa, 0xbb,
        ];
        Ipv4Packet::from_buffer(ip_data, None, 0).unwrap()
    }

    #[test]
    fn icmp_message() {
        let message = IcmpMessage::try_from(echo_request_packet()).unwrap();
        assert!(message.is_type(IcmpType::EchoRequest));
        assert_eq!(message.code(), 0);
        assert_eq!(message.echo_identifier(), 7);
        assert_eq!(message.echo_sequence(), 3);
        assert_eq!(message.payload(), &[0xaa, 0xbb]);
        assert_eq!(message.layer3_offset, Some(0));
        assert_eq!(message.layer4_offset, 20);
    }

    #[test]
    fn rejects_other_protocols() {
        let mut packet = echo_request_packet();
        packet.set_protocol(IpProtocol::UDP);
        assert!(IcmpMessage::try_from(packet).is_err());
    }

    #[test]
    fn rejects_short_messages() {
        assert!(IcmpMessage::from_buffer(vec![0; 7], None, None, 0).is_err());
    }

    #[test]
    fn checksum() {
        let mut message = IcmpMessage::try_from(echo_request_packet()).unwrap();
        assert!(!message.validate_checksum());
        message.fill_checksum();
        assert!(message.validate_checksum());
    }

    #[test]
    fn encap_decap() {
        let mut message = IcmpMessage::empty();
        message.set_msg_type(IcmpType::EchoReply);
        message.set_echo_identifier(0x1234);
        message.set_payload(&[1, 2, 3]);
        message.fill_checksum();

        let mut packet = Ipv4Packet::encap_icmp(message.clone());
        packet.set_dest_addr(Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(packet.protocol(), IpProtocol::ICMP);
        assert_eq!(packet.total_len(), 20 + 8 + 3);

        let frame = EthernetFrame::encap_ipv4(packet);
        let decapped = IcmpMessage::try_from(Ipv4Packet::try_from(frame).unwrap()).unwrap();
        assert_eq!(decapped, message);
        assert_eq!(decapped.layer2_offset, Some(0));
        assert_eq!(decapped.layer3_offset, Some(14));
        assert_eq!(decapped.layer4_offset, 34);
        assert!(decapped.validate_checksum());
    }
}
