//! Assembles the incoming byte stream from received segments and tracks
//! the ackno/window to advertise back.

use crate::reassembler::StreamReassembler;
use crate::tcp::segment::TcpSegment;
use crate::wrapping_int::{unwrap, wrap, WrappingInt32};

pub struct TCPReceiver {
    isn: Option<WrappingInt32>,
    reassembler: StreamReassembler,
    capacity: usize,
}

impl TCPReceiver {
    pub fn new(capacity: usize) -> Self {
        TCPReceiver { isn: None, reassembler: StreamReassembler::new(capacity), capacity }
    }

    pub fn segment_received(&mut self, seg: &TcpSegment) {
        if self.isn.is_none() {
            if !seg.header.syn {
                return;
            }
            self.isn = Some(seg.header.seqno);
        }
        let isn = self.isn.unwrap();

        let checkpoint = self.reassembler.output().bytes_written();
        let abs_seqno = unwrap(seg.header.seqno, isn, checkpoint);
        let stream_index = abs_seqno - 1 + u64::from(seg.header.syn);

        self.reassembler.push_substring(&seg.payload, stream_index, seg.header.fin);
    }

    pub fn ackno(&self) -> Option<WrappingInt32> {
        let isn = self.isn?;
        let abs_seq = self.reassembler.output().bytes_written()
            + 1
            + u64::from(self.reassembler.output().input_ended());
        Some(wrap(abs_seq, isn))
    }

    pub fn window_size(&self) -> usize {
        self.capacity - self.reassembler.output().buffered()
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.reassembler.unassembled_bytes()
    }

    pub fn stream_out(&self) -> &crate::byte_stream::ByteStream {
        self.reassembler.output()
    }

    pub fn stream_out_mut(&mut self) -> &mut crate::byte_stream::ByteStream {
        self.reassembler.output_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::segment::TcpHeader;

    fn seg(seqno: u32, syn: bool, fin: bool, payload: &[u8]) -> TcpSegment {
        TcpSegment {
            header: TcpHeader { seqno: WrappingInt32::new(seqno), syn, fin, ..Default::default() },
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn syn_sets_isn_and_ackno() {
        let mut r = TCPReceiver::new(1000);
        assert_eq!(r.ackno(), None);
        r.segment_received(&seg(100, true, false, b""));
        assert_eq!(r.ackno().unwrap().raw_value(), 101);
    }

    #[test]
    fn non_syn_before_syn_is_dropped() {
        let mut r = TCPReceiver::new(1000);
        r.segment_received(&seg(100, false, false, b"hi"));
        assert_eq!(r.ackno(), None);
    }

    #[test]
    fn payload_and_fin_advance_ackno() {
        let mut r = TCPReceiver::new(1000);
        r.segment_received(&seg(100, true, false, b""));
        r.segment_received(&seg(101, false, false, b"abc"));
        assert_eq!(r.ackno().unwrap().raw_value(), 104);
        r.segment_received(&seg(104, false, true, b""));
        assert_eq!(r.ackno().unwrap().raw_value(), 105);
    }
}
