//! IPv4 datagrams, as seen by `NetworkInterface` and `Router`: only the
//! destination address and TTL matter to this crate, so this wraps
//! `etherparse::Ipv4Header` rather than hand-rolling a second IPv4 codec.

use etherparse::{Ipv4Header, Ipv4HeaderSlice};

use crate::address::Address;

#[derive(Clone, Debug)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    pub fn new(header: Ipv4Header, payload: Vec<u8>) -> Self {
        Ipv4Datagram { header, payload }
    }

    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let slice = Ipv4HeaderSlice::from_slice(bytes).ok()?;
        let header = slice.to_header();
        let payload = bytes[slice.slice().len()..].to_vec();
        Some(Ipv4Datagram { header, payload })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.header_len() + self.payload.len());
        self.header.write(&mut out).expect("header write to a Vec cannot fail");
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn dst(&self) -> Address {
        Address::from(std::net::Ipv4Addr::from(self.header.destination))
    }

    pub fn ttl(&self) -> u8 {
        self.header.time_to_live
    }

    pub fn decrement_ttl(&mut self) {
        self.header.time_to_live -= 1;
    }
}
