//! RFC 826 ARP messages, restricted to the Ethernet/IPv4 combination this
//! stack needs (hw_type=1, proto_type=0x0800, hlen=6, plen=4).

use crate::address::EthernetAddress;

pub const HW_TYPE_ETHERNET: u16 = 1;
pub const PROTO_TYPE_IPV4: u16 = 0x0800;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArpOpcode {
    Request,
    Reply,
}

#[derive(Clone, Debug)]
pub struct ArpMessage {
    pub opcode: ArpOpcode,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: u32,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: u32,
}

impl ArpMessage {
    const WIRE_LEN: usize = 28;

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIRE_LEN);
        out.extend_from_slice(&HW_TYPE_ETHERNET.to_be_bytes());
        out.extend_from_slice(&PROTO_TYPE_IPV4.to_be_bytes());
        out.push(6); // hlen
        out.push(4); // plen
        let opcode: u16 = match self.opcode {
            ArpOpcode::Request => 1,
            ArpOpcode::Reply => 2,
        };
        out.extend_from_slice(&opcode.to_be_bytes());
        out.extend_from_slice(&self.sender_ethernet_address.0);
        out.extend_from_slice(&self.sender_ip_address.to_be_bytes());
        out.extend_from_slice(&self.target_ethernet_address.0);
        out.extend_from_slice(&self.target_ip_address.to_be_bytes());
        out
    }

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::WIRE_LEN {
            return None;
        }
        let hw_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        let proto_type = u16::from_be_bytes([bytes[2], bytes[3]]);
        let hlen = bytes[4];
        let plen = bytes[5];
        if hw_type != HW_TYPE_ETHERNET || proto_type != PROTO_TYPE_IPV4 || hlen != 6 || plen != 4 {
            return None;
        }
        let opcode = match u16::from_be_bytes([bytes[6], bytes[7]]) {
            1 => ArpOpcode::Request,
            2 => ArpOpcode::Reply,
            _ => return None,
        };

        let mut sender_mac = [0u8; 6];
        sender_mac.copy_from_slice(&bytes[8..14]);
        let sender_ip = u32::from_be_bytes(bytes[14..18].try_into().ok()?);
        let mut target_mac = [0u8; 6];
        target_mac.copy_from_slice(&bytes[18..24]);
        let target_ip = u32::from_be_bytes(bytes[24..28].try_into().ok()?);

        Some(ArpMessage {
            opcode,
            sender_ethernet_address: EthernetAddress(sender_mac),
            sender_ip_address: sender_ip,
            target_ethernet_address: EthernetAddress(target_mac),
            target_ip_address: target_ip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let msg = ArpMessage {
            opcode: ArpOpcode::Request,
            sender_ethernet_address: EthernetAddress([1, 2, 3, 4, 5, 6]),
            sender_ip_address: 0x0101_0101,
            target_ethernet_address: EthernetAddress::default(),
            target_ip_address: 0x0202_0202,
        };
        let bytes = msg.serialize();
        let parsed = ArpMessage::parse(&bytes).expect("should parse");
        assert_eq!(parsed.opcode, ArpOpcode::Request);
        assert_eq!(parsed.sender_ip_address, 0x0101_0101);
        assert_eq!(parsed.target_ip_address, 0x0202_0202);
    }

    #[test]
    fn rejects_truncated_message() {
        assert!(ArpMessage::parse(&[0u8; 10]).is_none());
    }
}
