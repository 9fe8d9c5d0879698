//! Tunable parameters shared by the sender, receiver and connection.

use crate::wrapping_int::WrappingInt32;

/// Default byte stream capacity for both directions of a connection.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Linger multiplier applied to the initial RTO after an active close.
pub const LINGER_RTO_MULTIPLE: u64 = 10;

#[derive(Clone, Copy, Debug)]
pub struct TCPConfig {
    /// Capacity of the receiver's (inbound) byte stream.
    pub recv_capacity: usize,
    /// Capacity of the sender's (outbound) byte stream.
    pub send_capacity: usize,
    /// Initial retransmission timeout, in milliseconds.
    pub rt_timeout: u64,
    /// Largest payload placed in a single outgoing segment.
    pub max_payload_size: usize,
    /// Consecutive retransmissions beyond which the connection gives up
    /// and resets.
    pub max_retx_attempts: u32,
    /// Initial sequence number to use instead of drawing one from `rand`,
    /// for deterministic tests.
    pub fixed_isn: Option<WrappingInt32>,
}

impl Default for TCPConfig {
    fn default() -> Self {
        TCPConfig {
            recv_capacity: DEFAULT_CAPACITY,
            send_capacity: DEFAULT_CAPACITY,
            rt_timeout: 1000,
            max_payload_size: 1000,
            max_retx_attempts: 8,
            fixed_isn: None,
        }
    }
}
