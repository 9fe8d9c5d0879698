//! Fills the peer's advertised window from the outbound byte stream,
//! tracks outstanding segments, and retransmits on timeout with
//! exponential backoff.

use std::collections::VecDeque;

use rand::random;

use crate::byte_stream::ByteStream;
use crate::config::TCPConfig;
use crate::tcp::segment::{TcpHeader, TcpSegment};
use crate::timer::RetxTimer;
use crate::wrapping_int::{unwrap, wrap, WrappingInt32};

/// A segment sent but not yet cumulatively acknowledged.
struct Outstanding {
    abs_seqno: u64,
    seg: TcpSegment,
}

pub struct TCPSender {
    isn: WrappingInt32,
    stream: ByteStream,
    max_payload_size: usize,
    initial_rto: u64,

    next_seqno: u64,
    bytes_in_flight: usize,
    window_size: u16,
    syn_sent: bool,
    fin_sent: bool,

    outstanding: VecDeque<Outstanding>,
    outbound: VecDeque<TcpSegment>,

    timer: RetxTimer,
    consecutive_retransmissions: u32,
}

impl TCPSender {
    pub fn new(config: &TCPConfig) -> Self {
        let isn = config.fixed_isn.unwrap_or_else(|| WrappingInt32::new(random()));
        TCPSender {
            isn,
            stream: ByteStream::new(config.send_capacity),
            max_payload_size: config.max_payload_size,
            initial_rto: config.rt_timeout,
            next_seqno: 0,
            bytes_in_flight: 0,
            window_size: 0,
            syn_sent: false,
            fin_sent: false,
            outstanding: VecDeque::new(),
            outbound: VecDeque::new(),
            timer: RetxTimer::new(config.rt_timeout),
            consecutive_retransmissions: 0,
        }
    }

    pub fn stream_in(&self) -> &ByteStream {
        &self.stream
    }

    pub fn stream_in_mut(&mut self) -> &mut ByteStream {
        &mut self.stream
    }

    pub fn bytes_in_flight(&self) -> usize {
        self.bytes_in_flight
    }

    pub fn consecutive_retransmissions(&self) -> u32 {
        self.consecutive_retransmissions
    }

    pub fn syn_sent(&self) -> bool {
        self.syn_sent
    }

    pub fn fin_sent(&self) -> bool {
        self.fin_sent
    }

    pub fn next_seqno(&self) -> WrappingInt32 {
        wrap(self.next_seqno, self.isn)
    }

    pub fn outbound(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.outbound
    }

    /// Sends as many segments as the advertised window allows.
    pub fn fill_window(&mut self) {
        let window = self.window_size.max(1) as usize;

        while self.bytes_in_flight < window {
            let mut header = TcpHeader { seqno: self.next_seqno(), ..Default::default() };
            if !self.syn_sent {
                header.syn = true;
                self.syn_sent = true;
            }

            let occupied = self.bytes_in_flight + usize::from(header.syn);
            let payload_len = self
                .max_payload_size
                .min(window.saturating_sub(occupied))
                .min(self.stream.buffered());
            let payload = self.stream.read(payload_len);

            if !self.fin_sent
                && self.stream.eof()
                && self.bytes_in_flight + usize::from(header.syn) + payload.len() + 1 <= window
            {
                header.fin = true;
                self.fin_sent = true;
            }

            let seg = TcpSegment { header, payload };
            let len = seg.length_in_sequence_space();
            if len == 0 {
                break;
            }

            let abs_seqno = self.next_seqno;
            self.outbound.push_back(seg.clone());
            self.outstanding.push_back(Outstanding { abs_seqno, seg });

            if !self.timer.is_running() {
                self.timer.restart();
            }

            self.next_seqno += len as u64;
            self.bytes_in_flight += len;
        }
    }

    pub fn ack_received(&mut self, ackno: WrappingInt32, window_size: u16) {
        let abs_ack = unwrap(ackno, self.isn, self.next_seqno);
        if abs_ack > self.next_seqno {
            return;
        }

        let mut progressed = false;
        while let Some(front) = self.outstanding.front() {
            let end = front.abs_seqno + front.seg.length_in_sequence_space() as u64;
            if end <= abs_ack {
                let front = self.outstanding.pop_front().unwrap();
                self.bytes_in_flight -= front.seg.length_in_sequence_space();
                progressed = true;
            } else {
                break;
            }
        }

        if progressed {
            self.consecutive_retransmissions = 0;
            self.timer.set_rto(self.initial_rto);
            self.timer.restart();
        }

        if self.bytes_in_flight == 0 {
            self.timer.stop();
        }

        self.window_size = window_size;
        self.fill_window();
    }

    pub fn tick(&mut self, ms: u64) {
        self.timer.tick(ms);
        if self.timer.is_expired() {
            if let Some(oldest) = self.outstanding.front() {
                self.outbound.push_back(oldest.seg.clone());
                if self.window_size > 0 {
                    self.consecutive_retransmissions += 1;
                    self.timer.set_rto(self.timer.rto() * 2);
                }
                self.timer.restart();
            }
        }
    }

    pub fn send_empty_segment(&mut self) {
        let seg = TcpSegment { header: TcpHeader { seqno: self.next_seqno(), ..Default::default() }, payload: Vec::new() };
        self.outbound.push_back(seg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender_with_isn(isn: u32, capacity: usize, rto: u64) -> TCPSender {
        let config = TCPConfig {
            send_capacity: capacity,
            rt_timeout: rto,
            fixed_isn: Some(WrappingInt32::new(isn)),
            ..Default::default()
        };
        TCPSender::new(&config)
    }

    #[test]
    fn fill_window_emits_syn_first() {
        let mut s = sender_with_isn(0, 1000, 1000);
        s.fill_window();
        assert_eq!(s.outbound().len(), 1);
        let seg = s.outbound().pop_front().unwrap();
        assert!(seg.header.syn);
        assert_eq!(seg.header.seqno.raw_value(), 0);
    }

    #[test]
    fn zero_window_probe() {
        let mut s = sender_with_isn(0, 100, 1000);
        s.fill_window();
        s.outbound().clear();
        s.ack_received(WrappingInt32::new(1), 0);
        s.stream_in_mut().write(b"abc");
        s.fill_window();

        assert_eq!(s.outbound().len(), 1);
        let probe = s.outbound().pop_front().unwrap();
        assert_eq!(probe.payload.len(), 1);

        s.tick(999);
        assert!(s.outbound().is_empty());
        s.tick(1);
        assert_eq!(s.outbound().len(), 1);
        assert_eq!(s.consecutive_retransmissions(), 0);
    }

    #[test]
    fn ack_clears_outstanding_and_stops_timer() {
        let mut s = sender_with_isn(0, 1000, 1000);
        s.fill_window();
        s.outbound().clear();
        s.ack_received(WrappingInt32::new(1), 1000);
        assert_eq!(s.bytes_in_flight(), 0);
    }
}
