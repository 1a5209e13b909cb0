//! Link lifecycle driver for a Pozyx sensor on a serial transport

use tracing::debug;

use crate::decoder::FrameDecoder;
use crate::error::Result;
use crate::solution::{LinkStats, NavigationSolution};
use crate::wire::DEFAULT_BAUD;

/// Startup and steady-state phases of the sensor link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkState {
    /// Link created, baud change not yet requested
    Initializing,
    /// Baud change requested, waiting to finalize
    ChangeBaud,
    /// Version probe phase; the sensor has none, passed through
    CheckVersion,
    /// Device configuration phase; the sensor needs none, passed through
    Configure,
    /// Steady state, draining and decoding sentences
    ReceivingData,
}

/// Byte-level serial transport a link runs over.
///
/// Implementations expose the bytes the port has already buffered plus
/// the two-step baud reconfiguration the startup sequence drives. The
/// driver never blocks on the transport: it only reads bytes reported
/// as waiting.
pub trait Transport {
    /// Number of bytes currently buffered and readable
    fn bytes_waiting(&self) -> usize;

    /// Read the next buffered byte
    fn read_byte(&mut self) -> Result<u8>;

    /// Request a switch of the port to `baud`
    fn request_baud(&mut self, baud: u32) -> Result<()>;

    /// Complete a previously requested baud switch
    fn finalize_baud(&mut self) -> Result<()>;
}

/// Per-cycle driver owning the frame decoder and sequencing link
/// startup.
///
/// Invoke [`poll`] once per scheduling cycle. The first cycles walk the
/// link through baud setup; every later cycle drains the transport
/// through the decoder and reports whether a fresh navigation solution
/// became available.
///
/// [`poll`]: PozyxLink::poll
pub struct PozyxLink<T: Transport> {
    transport: T,
    state: LinkState,
    baud: u32,
    decoder: FrameDecoder,
}

impl<T: Transport> PozyxLink<T> {
    /// Create a driver over `transport` using the default baud rate
    pub fn new(transport: T) -> Self {
        Self::with_baud(transport, DEFAULT_BAUD)
    }

    /// Create a driver over `transport` with an explicit baud rate
    pub fn with_baud(transport: T, baud: u32) -> Self {
        PozyxLink {
            transport,
            state: LinkState::Initializing,
            baud,
            decoder: FrameDecoder::new(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The decoder driving sentence reassembly
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Consume the driver and hand back the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Run one scheduling cycle.
    ///
    /// Performs a bounded amount of work — at most the bytes the
    /// transport has already buffered — and never blocks. Returns true
    /// when at least one navigation frame committed during this cycle.
    pub fn poll(
        &mut self,
        solution: &mut NavigationSolution,
        stats: &mut LinkStats,
    ) -> Result<bool> {
        match self.state {
            LinkState::Initializing => {
                self.transport.request_baud(self.baud)?;
                self.set_state(LinkState::ChangeBaud);
                Ok(false)
            }
            LinkState::ChangeBaud => {
                self.transport.finalize_baud()?;
                self.set_state(LinkState::CheckVersion);
                Ok(false)
            }
            // no version handshake and no configuration on this sensor
            LinkState::CheckVersion | LinkState::Configure => {
                self.set_state(LinkState::ReceivingData);
                Ok(false)
            }
            LinkState::ReceivingData => self.receive(solution, stats),
        }
    }

    fn receive(
        &mut self,
        solution: &mut NavigationSolution,
        stats: &mut LinkStats,
    ) -> Result<bool> {
        let mut fresh = false;
        while self.transport.bytes_waiting() > 0 {
            let byte = self.transport.read_byte()?;
            if self.decoder.feed_byte(byte, solution, stats) {
                let heartbeat = solution.flags.heartbeat();
                solution.flags.set_heartbeat(!heartbeat);
                self.decoder.clear_pending();
                fresh = true;
            }
        }
        Ok(fresh)
    }

    fn set_state(&mut self, next: LinkState) {
        debug!(from = ?self.state, to = ?next, "link state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct MockTransport {
        rx: VecDeque<u8>,
        requested_baud: Option<u32>,
        finalized: bool,
        fail_reads: bool,
    }

    impl MockTransport {
        fn queue(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes);
        }
    }

    impl Transport for MockTransport {
        fn bytes_waiting(&self) -> usize {
            self.rx.len()
        }

        fn read_byte(&mut self) -> Result<u8> {
            if self.fail_reads {
                return Err(LinkError::transport("read failed"));
            }
            self.rx
                .pop_front()
                .ok_or_else(|| LinkError::transport("no bytes waiting"))
        }

        fn request_baud(&mut self, baud: u32) -> Result<()> {
            self.requested_baud = Some(baud);
            Ok(())
        }

        fn finalize_baud(&mut self) -> Result<()> {
            self.finalized = true;
            Ok(())
        }
    }

    fn sentence(payload: &str) -> Vec<u8> {
        let parity = payload.bytes().fold(0u8, |acc, b| acc ^ b);
        format!("${}*{:02X}\r\n", payload, parity).into_bytes()
    }

    #[test]
    fn test_lifecycle_reaches_receiving() -> Result<()> {
        let mut link = PozyxLink::new(MockTransport::default());
        let mut solution = NavigationSolution::default();
        let mut stats = LinkStats::default();

        assert_eq!(link.state(), LinkState::Initializing);
        assert!(!link.poll(&mut solution, &mut stats)?);
        assert_eq!(link.state(), LinkState::ChangeBaud);
        assert!(!link.poll(&mut solution, &mut stats)?);
        assert_eq!(link.state(), LinkState::CheckVersion);
        assert!(!link.poll(&mut solution, &mut stats)?);
        assert_eq!(link.state(), LinkState::ReceivingData);

        let transport = link.into_transport();
        assert_eq!(transport.requested_baud, Some(DEFAULT_BAUD));
        assert!(transport.finalized);
        Ok(())
    }

    #[test]
    fn test_nav_sentence_reports_fresh_data() -> Result<()> {
        let mut transport = MockTransport::default();
        transport.queue(&sentence("1,0,0,37000000,12200000,1500,10,20,5"));

        let mut link = PozyxLink::with_baud(transport, 57_600);
        let mut solution = NavigationSolution::default();
        let mut stats = LinkStats::default();

        // startup cycles; bytes stay queued until ReceivingData
        for _ in 0..3 {
            assert!(!link.poll(&mut solution, &mut stats)?);
        }

        assert!(link.poll(&mut solution, &mut stats)?);
        assert_eq!(solution.latitude, 37_000_000);
        assert!(solution.flags.heartbeat());
        assert!(!link.decoder().has_new_position());
        assert!(!link.decoder().has_new_speed());

        // nothing queued, nothing fresh
        assert!(!link.poll(&mut solution, &mut stats)?);
        Ok(())
    }

    #[test]
    fn test_two_sentences_in_one_drain() -> Result<()> {
        let mut transport = MockTransport::default();
        transport.queue(&sentence("1,0,0,1,2,30,10,0,0"));
        transport.queue(&sentence("1,0,0,2,3,40,20,0,0"));

        let mut link = PozyxLink::new(transport);
        let mut solution = NavigationSolution::default();
        let mut stats = LinkStats::default();

        for _ in 0..3 {
            link.poll(&mut solution, &mut stats)?;
        }

        assert!(link.poll(&mut solution, &mut stats)?);
        assert_eq!(stats.packets, 2);
        assert_eq!(solution.latitude, 2);
        // the heartbeat toggled once per committed frame
        assert!(!solution.flags.heartbeat());
        Ok(())
    }

    #[test]
    fn test_mag_sentence_is_not_fresh_data() -> Result<()> {
        let mut transport = MockTransport::default();
        transport.queue(&sentence("2,12.25,8.50,3.75"));

        let mut link = PozyxLink::new(transport);
        let mut solution = NavigationSolution::default();
        let mut stats = LinkStats::default();

        for _ in 0..3 {
            link.poll(&mut solution, &mut stats)?;
        }

        assert!(!link.poll(&mut solution, &mut stats)?);
        assert_eq!(stats.packets, 1);
        assert!(solution.flags.valid_mag());
        assert!(!solution.flags.heartbeat());
        Ok(())
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut transport = MockTransport::default();
        transport.queue(b"$1,");
        transport.fail_reads = true;

        let mut link = PozyxLink::new(transport);
        let mut solution = NavigationSolution::default();
        let mut stats = LinkStats::default();

        for _ in 0..3 {
            link.poll(&mut solution, &mut stats).unwrap();
        }

        let err = link.poll(&mut solution, &mut stats).unwrap_err();
        assert_eq!(err, LinkError::transport("read failed"));
    }
}
