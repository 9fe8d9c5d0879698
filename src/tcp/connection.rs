//! Composes `TCPSender` and `TCPReceiver` into the full connection state
//! machine: handshakes, piggy-backed ACKs, keep-alive replies, clean
//! active/passive close, and linger.

use std::collections::VecDeque;

use log::debug;

use crate::config::{TCPConfig, LINGER_RTO_MULTIPLE};
use crate::tcp::receiver::TCPReceiver;
use crate::tcp::segment::{TcpHeader, TcpSegment};
use crate::tcp::sender::TCPSender;

/// Derived receiver-side summary used only to decide state-machine
/// transitions; the connection does not store this, it recomputes it.
#[derive(PartialEq, Eq)]
enum ReceiverSummary {
    Listen,
    SynReceived,
    FinReceived,
}

/// Derived sender-side summary, same idea.
#[derive(PartialEq, Eq)]
enum SenderSummary {
    Closed,
    SynSent,
    SynAcked,
    FinSent,
    FinAcked,
}

pub struct TCPConnection {
    sender: TCPSender,
    receiver: TCPReceiver,
    config: TCPConfig,
    outbound: VecDeque<TcpSegment>,
    time_since_last_segment_received: u64,
    linger_after_streams_finish: bool,
    active: bool,
}

impl TCPConnection {
    pub fn new(config: TCPConfig) -> Self {
        TCPConnection {
            sender: TCPSender::new(&config),
            receiver: TCPReceiver::new(config.recv_capacity),
            config,
            outbound: VecDeque::new(),
            time_since_last_segment_received: 0,
            linger_after_streams_finish: true,
            active: true,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn remaining_outbound_capacity(&self) -> usize {
        self.sender.stream_in().remaining_capacity()
    }

    pub fn bytes_in_flight(&self) -> usize {
        self.sender.bytes_in_flight()
    }

    pub fn unassembled_bytes(&self) -> usize {
        self.receiver.unassembled_bytes()
    }

    pub fn time_since_last_segment_received(&self) -> u64 {
        self.time_since_last_segment_received
    }

    pub fn outbound(&mut self) -> &mut VecDeque<TcpSegment> {
        &mut self.outbound
    }

    pub fn inbound_stream(&self) -> &crate::byte_stream::ByteStream {
        self.receiver.stream_out()
    }

    fn receiver_summary(&self) -> ReceiverSummary {
        if self.receiver.stream_out().input_ended() {
            ReceiverSummary::FinReceived
        } else if self.receiver.ackno().is_some() {
            ReceiverSummary::SynReceived
        } else {
            ReceiverSummary::Listen
        }
    }

    fn sender_summary(&self) -> SenderSummary {
        if !self.sender.syn_sent() {
            return SenderSummary::Closed;
        }
        let fin_sent = self.sender.fin_sent();
        let fully_acked = self.sender.bytes_in_flight() == 0;
        match (fin_sent, fully_acked) {
            (true, true) => SenderSummary::FinAcked,
            (true, false) => SenderSummary::FinSent,
            (false, true) => SenderSummary::SynAcked,
            (false, false) => SenderSummary::SynSent,
        }
    }

    pub fn segment_received(&mut self, seg: &TcpSegment) {
        self.time_since_last_segment_received = 0;

        if seg.header.rst {
            debug!("RST received, aborting connection without a reply");
            self.set_rst_state(false);
            return;
        }

        self.receiver.segment_received(seg);

        let mut need_empty_ack = seg.length_in_sequence_space() > 0;

        if let Some(ackno) = seg.header.ackno {
            self.sender.ack_received(ackno, seg.header.win);
            if need_empty_ack && !self.sender.outbound().is_empty() {
                need_empty_ack = false;
            }
        }

        if self.receiver_summary() == ReceiverSummary::SynReceived
            && self.sender_summary() == SenderSummary::Closed
        {
            self.connect();
            return;
        }

        if self.receiver_summary() == ReceiverSummary::FinReceived
            && self.sender_summary() != SenderSummary::FinAcked
            && self.sender_summary() != SenderSummary::Closed
        {
            self.linger_after_streams_finish = false;
        }

        if !self.linger_after_streams_finish
            && self.receiver_summary() == ReceiverSummary::FinReceived
            && self.sender_summary() == SenderSummary::FinAcked
        {
            self.active = false;
            self.linger_after_streams_finish = false;
            return;
        }

        if let Some(ackno) = self.receiver.ackno() {
            if seg.length_in_sequence_space() == 0 && seg.header.seqno == ackno - 1 {
                need_empty_ack = true;
            }
        }

        if need_empty_ack {
            self.sender.send_empty_segment();
        }

        self.decorate_and_enqueue();
    }

    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = self.sender.stream_in_mut().write(data);
        self.sender.fill_window();
        self.decorate_and_enqueue();
        n
    }

    pub fn end_input_stream(&mut self) {
        self.sender.stream_in_mut().end_input();
        self.sender.fill_window();
        self.decorate_and_enqueue();
    }

    pub fn connect(&mut self) {
        self.sender.fill_window();
        self.decorate_and_enqueue();
    }

    pub fn tick(&mut self, ms: u64) {
        self.time_since_last_segment_received += ms;
        self.sender.tick(ms);

        if self.sender.consecutive_retransmissions() > self.config.max_retx_attempts {
            self.sender.outbound().clear();
            debug!("retransmission cap exceeded, resetting connection");
            self.set_rst_state(true);
            return;
        }

        self.decorate_and_enqueue();

        if self.linger_after_streams_finish
            && self.receiver_summary() == ReceiverSummary::FinReceived
            && self.sender_summary() == SenderSummary::FinAcked
            && self.time_since_last_segment_received >= LINGER_RTO_MULTIPLE * self.config.rt_timeout
        {
            self.active = false;
        }
    }

    fn set_rst_state(&mut self, send_rst: bool) {
        if send_rst {
            let seg = TcpSegment {
                header: TcpHeader { seqno: self.sender.next_seqno(), rst: true, ..Default::default() },
                payload: Vec::new(),
            };
            self.outbound.push_back(seg);
        }
        self.sender.stream_in_mut().set_error();
        self.receiver.stream_out_mut().set_error();
        self.linger_after_streams_finish = false;
        self.active = false;
    }

    fn decorate_and_enqueue(&mut self) {
        while let Some(mut seg) = self.sender.outbound().pop_front() {
            if let Some(ackno) = self.receiver.ackno() {
                seg.header.ackno = Some(ackno);
            }
            seg.header.win = self.receiver.window_size().min(u16::MAX as usize) as u16;
            self.outbound.push_back(seg);
        }
    }
}

impl Drop for TCPConnection {
    fn drop(&mut self) {
        if self.active {
            debug!("unclean shutdown of TCPConnection, sending RST");
            self.set_rst_state(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapping_int::WrappingInt32;

    fn syn(seqno: u32) -> TcpSegment {
        TcpSegment {
            header: TcpHeader { seqno: WrappingInt32::new(seqno), syn: true, ..Default::default() },
            payload: Vec::new(),
        }
    }

    fn ack(seqno: u32, ackno: u32, win: u16) -> TcpSegment {
        TcpSegment {
            header: TcpHeader {
                seqno: WrappingInt32::new(seqno),
                ackno: Some(WrappingInt32::new(ackno)),
                win,
                ..Default::default()
            },
            payload: Vec::new(),
        }
    }

    fn fin(seqno: u32, ackno: u32, win: u16) -> TcpSegment {
        let mut s = ack(seqno, ackno, win);
        s.header.fin = true;
        s
    }

    fn config_with_isn(isn: u32) -> TCPConfig {
        TCPConfig { fixed_isn: Some(WrappingInt32::new(isn)), ..Default::default() }
    }

    #[test]
    fn passive_open_replies_syn_ack() {
        let mut c = TCPConnection::new(config_with_isn(200));
        c.segment_received(&syn(100));
        let reply = c.outbound().pop_front().expect("expected SYN+ACK");
        assert!(reply.header.syn);
        assert_eq!(reply.header.seqno.raw_value(), 200);
        assert_eq!(reply.header.ackno.unwrap().raw_value(), 101);
    }

    #[test]
    fn passive_close_sequence() {
        let mut c = TCPConnection::new(config_with_isn(200));
        c.segment_received(&syn(100));
        c.outbound().clear();

        c.segment_received(&ack(101, 201, 1000));
        assert!(c.active());

        c.segment_received(&fin(101, 201, 1000));
        let reply = c.outbound().pop_front().expect("expected ACK of FIN");
        assert_eq!(reply.header.ackno.unwrap().raw_value(), 102);
        assert!(c.active());

        c.end_input_stream();
        let our_fin = c.outbound().pop_front().expect("expected our FIN");
        assert!(our_fin.header.fin);
        assert_eq!(our_fin.header.seqno.raw_value(), 201);

        c.segment_received(&ack(102, 202, 1000));
        assert!(!c.active());
    }

    #[test]
    fn rst_received_aborts_without_reply() {
        let mut c = TCPConnection::new(config_with_isn(200));
        c.segment_received(&syn(100));
        c.outbound().clear();

        let mut rst = ack(101, 201, 1000);
        rst.header.rst = true;
        c.segment_received(&rst);

        assert!(!c.active());
        assert!(c.outbound().is_empty());
        assert!(c.inbound_stream().error());
    }
}
