//! The in-memory TCP segment type the sender, receiver and connection
//! operate on. Wire encoding/decoding is out of scope here: callers that
//! sit on top of a real link hand this crate already-parsed segments and
//! take already-built ones back out.

use crate::wrapping_int::WrappingInt32;

#[derive(Clone, Debug, Default)]
pub struct TcpHeader {
    pub seqno: WrappingInt32,
    pub ackno: Option<WrappingInt32>,
    pub syn: bool,
    pub fin: bool,
    pub rst: bool,
    pub win: u16,
}

#[derive(Clone, Debug, Default)]
pub struct TcpSegment {
    pub header: TcpHeader,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    /// Payload bytes, plus one for SYN and one for FIN if set.
    pub fn length_in_sequence_space(&self) -> usize {
        self.payload.len() + usize::from(self.header.syn) + usize::from(self.header.fin)
    }
}
