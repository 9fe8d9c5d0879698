//! A user-space TCP/IP stack core: byte stream, stream reassembler,
//! wrapping sequence-number arithmetic, the TCP sender/receiver/connection
//! state machines, and an ARP-backed network interface with a
//! longest-prefix-match router.
//!
//! Wire serialization of Ethernet frames and TCP segments, and the actual
//! TUN/TAP device a real stack would sit on top of, are left to callers;
//! this crate owns the state machines, not the byte-level framing around
//! them.

pub mod address;
pub mod arp;
pub mod byte_stream;
pub mod config;
pub mod ethernet;
pub mod ip;
pub mod network_interface;
pub mod reassembler;
pub mod router;
pub mod tcp;
pub mod timer;
pub mod wrapping_int;

pub use address::{Address, EthernetAddress};
pub use byte_stream::ByteStream;
pub use config::TCPConfig;
pub use network_interface::NetworkInterface;
pub use reassembler::StreamReassembler;
pub use router::Router;
pub use tcp::connection::TCPConnection;
pub use tcp::receiver::TCPReceiver;
pub use tcp::sender::TCPSender;
pub use wrapping_int::{unwrap, wrap, WrappingInt32};
