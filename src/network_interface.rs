//! The link-layer adapter: translates IP datagrams into Ethernet frames
//! via ARP resolution, and Ethernet frames back into IP datagrams.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::address::{Address, EthernetAddress};
use crate::arp::{ArpMessage, ArpOpcode};
use crate::ethernet::{EthernetFrame, ETHERTYPE_ARP, ETHERTYPE_IPV4};
use crate::ip::Ipv4Datagram;

/// ARP entries are learned for 30s.
pub const ARP_ENTRY_TTL_MS: u64 = 30_000;
/// A single ARP request is outstanding for at most 5s before a new
/// `send_datagram` call for the same IP will issue another one.
pub const ARP_REQUEST_TTL_MS: u64 = 5_000;

struct ArpEntry {
    eth_addr: EthernetAddress,
    ttl_ms: u64,
}

pub struct NetworkInterface {
    ethernet_address: EthernetAddress,
    ip_address: Address,

    frames_out: VecDeque<EthernetFrame>,

    arp_table: HashMap<u32, ArpEntry>,
    pending_datagrams: HashMap<u32, Vec<(Address, Ipv4Datagram)>>,
    pending_arp_request_ttl: HashMap<u32, u64>,
}

impl NetworkInterface {
    pub fn new(ethernet_address: EthernetAddress, ip_address: Address) -> Self {
        debug!("network interface has ethernet address {ethernet_address} and IP address {ip_address}");
        NetworkInterface {
            ethernet_address,
            ip_address,
            frames_out: VecDeque::new(),
            arp_table: HashMap::new(),
            pending_datagrams: HashMap::new(),
            pending_arp_request_ttl: HashMap::new(),
        }
    }

    pub fn frames_out(&mut self) -> &mut VecDeque<EthernetFrame> {
        &mut self.frames_out
    }

    fn send(&mut self, dst: EthernetAddress, ethertype: u16, payload: Vec<u8>) {
        self.frames_out.push_back(EthernetFrame::new(dst, self.ethernet_address, ethertype, payload));
    }

    /// Sends an IPv4 datagram, resolving the next hop's Ethernet address
    /// via ARP first if necessary; queues the datagram until resolved.
    pub fn send_datagram(&mut self, dgram: Ipv4Datagram, next_hop: Address) {
        let next_hop_ip = next_hop.ipv4_numeric();

        if let Some(entry) = self.arp_table.get(&next_hop_ip) {
            self.send(entry.eth_addr, ETHERTYPE_IPV4, dgram.serialize());
            return;
        }

        if !self.pending_arp_request_ttl.contains_key(&next_hop_ip) {
            let request = ArpMessage {
                opcode: ArpOpcode::Request,
                sender_ethernet_address: self.ethernet_address,
                sender_ip_address: self.ip_address.ipv4_numeric(),
                target_ethernet_address: EthernetAddress::default(),
                target_ip_address: next_hop_ip,
            };
            self.send(EthernetAddress::BROADCAST, ETHERTYPE_ARP, request.serialize());
            self.pending_arp_request_ttl.insert(next_hop_ip, ARP_REQUEST_TTL_MS);
        }

        self.pending_datagrams.entry(next_hop_ip).or_default().push((next_hop, dgram));
    }

    /// Receives an Ethernet frame; returns the enclosed IP datagram if the
    /// frame was IPv4 and addressed to us.
    pub fn recv_frame(&mut self, frame: &EthernetFrame) -> Option<Ipv4Datagram> {
        if !frame.dst.is_broadcast() && frame.dst != self.ethernet_address {
            return None;
        }

        if frame.ethertype == ETHERTYPE_IPV4 {
            return Ipv4Datagram::parse(&frame.payload);
        }

        if frame.ethertype == ETHERTYPE_ARP {
            let Some(msg) = ArpMessage::parse(&frame.payload) else {
                return None;
            };

            let my_ip = self.ip_address.ipv4_numeric();
            let sender_ip = msg.sender_ip_address;

            self.arp_table.insert(sender_ip, ArpEntry { eth_addr: msg.sender_ethernet_address, ttl_ms: ARP_ENTRY_TTL_MS });
            debug!("learned {sender_ip:#010x} => {}", msg.sender_ethernet_address);

            if msg.opcode == ArpOpcode::Request && msg.target_ip_address == my_ip {
                let reply = ArpMessage {
                    opcode: ArpOpcode::Reply,
                    sender_ethernet_address: self.ethernet_address,
                    sender_ip_address: my_ip,
                    target_ethernet_address: msg.sender_ethernet_address,
                    target_ip_address: sender_ip,
                };
                self.send(msg.sender_ethernet_address, ETHERTYPE_ARP, reply.serialize());
            }

            if let Some(waiting) = self.pending_datagrams.remove(&sender_ip) {
                for (_, dgram) in waiting {
                    self.send(msg.sender_ethernet_address, ETHERTYPE_IPV4, dgram.serialize());
                }
                self.pending_arp_request_ttl.remove(&sender_ip);
            }
        }

        None
    }

    pub fn tick(&mut self, ms: u64) {
        self.arp_table.retain(|_, entry| {
            if entry.ttl_ms <= ms {
                false
            } else {
                entry.ttl_ms -= ms;
                true
            }
        });

        let mut timed_out = Vec::new();
        for (ip, ttl) in self.pending_arp_request_ttl.iter_mut() {
            if *ttl <= ms {
                timed_out.push(*ip);
            } else {
                *ttl -= ms;
            }
        }
        for ip in timed_out {
            self.pending_arp_request_ttl.remove(&ip);
            if self.pending_datagrams.remove(&ip).is_some() {
                debug!("ARP request for {ip:#010x} timed out, dropping queued datagrams");
            }
        }
    }
}
