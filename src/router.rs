//! Multi-interface longest-prefix-match IP forwarder.

use log::debug;

use crate::address::Address;
use crate::ip::Ipv4Datagram;
use crate::network_interface::NetworkInterface;

struct Route {
    prefix: u32,
    prefix_length: u8,
    next_hop: Option<Address>,
    interface_num: usize,
}

pub struct Router {
    interfaces: Vec<NetworkInterface>,
    routing_table: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Router { interfaces: Vec::new(), routing_table: Vec::new() }
    }

    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&mut self, num: usize) -> &mut NetworkInterface {
        &mut self.interfaces[num]
    }

    pub fn add_route(&mut self, prefix: u32, prefix_length: u8, next_hop: Option<Address>, interface_num: usize) {
        debug!(
            "adding route {}/{} => {} on interface {interface_num}",
            Address::from_ipv4_numeric(prefix),
            prefix_length,
            next_hop.map(|a| a.to_string()).unwrap_or_else(|| "(direct)".to_string())
        );
        self.routing_table.push(Route { prefix, prefix_length, next_hop, interface_num });
    }

    fn matches(route: &Route, dst: u32) -> bool {
        route.prefix_length == 0 || (route.prefix ^ dst) >> (32 - route.prefix_length as u32) == 0
    }

    pub fn route_one_datagram(&mut self, mut dgram: Ipv4Datagram) {
        let dst = dgram.dst().ipv4_numeric();

        let mut best: Option<usize> = None;
        for (i, route) in self.routing_table.iter().enumerate() {
            if Self::matches(route, dst) {
                let better = match best {
                    None => true,
                    Some(b) => route.prefix_length > self.routing_table[b].prefix_length,
                };
                if better {
                    best = Some(i);
                }
            }
        }

        let Some(best) = best else { return };
        if dgram.ttl() <= 1 {
            return;
        }
        dgram.decrement_ttl();

        let route_next_hop = self.routing_table[best].next_hop;
        let interface_num = self.routing_table[best].interface_num;
        let next_hop = route_next_hop.unwrap_or_else(|| Address::from_ipv4_numeric(dst));
        self.interfaces[interface_num].send_datagram(dgram, next_hop);
    }

    /// Drains each interface's inbound datagram queue through
    /// `route_one_datagram`. Interfaces in this crate don't separately
    /// buffer inbound datagrams (callers hand `route_one_datagram` each
    /// datagram as `recv_frame` yields it); this is kept for callers that
    /// accumulate a batch of datagrams across interfaces before routing.
    pub fn route(&mut self, inbound: Vec<Ipv4Datagram>) {
        for dgram in inbound {
            self.route_one_datagram(dgram);
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::EthernetAddress;
    use etherparse::Ipv4Header;

    fn addr(octets: [u8; 4]) -> u32 {
        u32::from_be_bytes(octets)
    }

    fn new_interface(ip: [u8; 4]) -> NetworkInterface {
        NetworkInterface::new(EthernetAddress([1, 2, 3, 4, 5, 6]), Address::from_ipv4_numeric(addr(ip)))
    }

    fn dgram(dst: [u8; 4], ttl: u8) -> Ipv4Datagram {
        Ipv4Datagram::new(Ipv4Header::new(0, ttl, 6, [9, 9, 9, 9], dst), Vec::new())
    }

    #[test]
    fn longest_prefix_match_picks_most_specific_route() {
        let mut r = Router::new();
        let if0 = r.add_interface(new_interface([10, 0, 0, 1]));
        let if1 = r.add_interface(new_interface([10, 1, 0, 1]));
        let if2 = r.add_interface(new_interface([8, 8, 8, 1]));

        r.add_route(addr([10, 0, 0, 0]), 8, None, if0);
        r.add_route(addr([10, 1, 0, 0]), 16, None, if1);
        r.add_route(0, 0, None, if2);

        r.route_one_datagram(dgram([10, 1, 2, 3], 64));
        assert_eq!(r.interfaces[if1].frames_out().len(), 1);

        r.route_one_datagram(dgram([10, 2, 0, 1], 64));
        assert_eq!(r.interfaces[if0].frames_out().len(), 1);

        r.route_one_datagram(dgram([8, 8, 8, 8], 64));
        assert_eq!(r.interfaces[if2].frames_out().len(), 1);
    }

    #[test]
    fn ttl_one_is_dropped() {
        let mut r = Router::new();
        let if0 = r.add_interface(new_interface([10, 0, 0, 1]));
        r.add_route(0, 0, None, if0);

        r.route_one_datagram(dgram([1, 2, 3, 4], 1));
        assert!(r.interfaces[if0].frames_out().is_empty());
    }

    #[test]
    fn zero_prefix_length_never_shifts_by_32() {
        let mut r = Router::new();
        let if0 = r.add_interface(new_interface([10, 0, 0, 1]));
        r.add_route(0, 0, None, if0);
        r.route_one_datagram(dgram([192, 168, 1, 1], 64));
        assert_eq!(r.interfaces[if0].frames_out().len(), 1);
    }
}
