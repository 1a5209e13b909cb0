//! # Pozyx Navigation Protocol Parser
//!
//! A Rust library for decoding the ASCII sentence protocol emitted by a
//! Pozyx positioning sensor over a serial link.
//!
//! The sensor streams comma-delimited sentences of the form
//! `$<type>,<field>,...*<checksum>\r\n`, carrying either a navigation
//! frame (position, velocity, timestamp) or a magnetometer frame, with
//! a trailing two-hex-digit XOR checksum over the payload. This library
//! provides:
//!
//! - An incremental, byte-at-a-time frame decoder with checksum
//!   verification
//! - Fixed-point decoding of the ASCII numeric fields
//! - A link lifecycle driver that sequences baud setup before
//!   steady-state decoding
//!
//! ## Features
//!
//! - `serde`: enable serialization/deserialization of the data model
//!
//! ## Example
//!
//! ```
//! use pozyx_nav_parser::{FrameDecoder, LinkStats, NavigationSolution};
//!
//! let payload = b"2,12.25,8.50,3.75";
//! let checksum = payload.iter().fold(0u8, |acc, b| acc ^ b);
//! let mut sentence = vec![b'$'];
//! sentence.extend_from_slice(payload);
//! sentence.extend_from_slice(format!("*{:02X}\r\n", checksum).as_bytes());
//!
//! let mut decoder = FrameDecoder::new();
//! let mut solution = NavigationSolution::default();
//! let mut stats = LinkStats::default();
//! for byte in sentence {
//!     decoder.feed_byte(byte, &mut solution, &mut stats);
//! }
//!
//! assert_eq!(stats.packets, 1);
//! assert_eq!(solution.mag.x, 1225);
//! ```

pub mod decoder;
pub mod error;
pub mod fields;
pub mod link;
pub mod solution;

pub use decoder::FrameDecoder;
pub use error::{LinkError, Result};
pub use link::{LinkState, PozyxLink, Transport};
pub use solution::{
    FixType, FrameType, GpsTime, LinkStats, MagnetometerReading, NavigationSolution, PendingFrame,
    SolutionFlags,
};

/// Wire-level constants of the sentence protocol
pub mod wire {
    /// Frame-type code of a navigation frame
    pub const FRAME_NAV: u32 = 1;

    /// Frame-type code of a magnetometer frame
    pub const FRAME_MAG: u32 = 2;

    /// Field text buffer capacity; one byte stays reserved for a
    /// terminator
    pub const FIELD_BUFFER_SIZE: usize = 16;

    /// Scan position at which a numeric field is treated as invalid
    pub const MAX_FIELD_SCAN: usize = 15;

    /// Serial baud rate the link switches the sensor to
    pub const DEFAULT_BAUD: u32 = 115_200;
}
