//! Incremental frame decoder for the Pozyx sentence protocol

use tracing::{trace, warn};

use crate::fields::{checksum_from_hex, decode_scaled, FieldBuffer};
use crate::solution::{FixType, FrameType, LinkStats, NavigationSolution, PendingFrame};

/// Persistent byte-driven sentence decoder.
///
/// Feed one byte at a time: the decoder buffers field text, tracks the
/// running XOR parity, dispatches decoded fields by frame type and
/// commits into the shared [`NavigationSolution`] only once the trailing
/// checksum verifies. Every `$` is a full recovery point, so a malformed
/// or interrupted sentence needs no explicit reset.
///
/// Exactly one decoder exists per link and it is never fed concurrently;
/// the commit step runs to completion within a single `feed_byte` call,
/// so a cooperative reader never observes a partial write.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: PendingFrame,
    frame: FrameType,
    field_index: u8,
    buffer: FieldBuffer,
    parity: u8,
    checksum_capture: bool,
    new_position: bool,
    new_speed: bool,
}

impl FrameDecoder {
    /// Create a decoder in its start condition
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte from the transport.
    ///
    /// Returns true while both a new position and a new speed are
    /// pending — in practice right after a navigation frame commits,
    /// since magnetometer frames never touch the speed flag. The caller
    /// acknowledges a completed solution with [`Self::clear_pending`].
    pub fn feed_byte(
        &mut self,
        byte: u8,
        solution: &mut NavigationSolution,
        stats: &mut LinkStats,
    ) -> bool {
        match byte {
            b'$' => {
                self.field_index = 0;
                self.buffer.clear();
                self.parity = 0;
                self.checksum_capture = false;
            }
            b',' | b'*' => {
                if self.field_index == 0 {
                    self.frame = FrameType::from_code(decode_scaled(self.buffer.as_bytes(), 0));
                } else {
                    self.store_field();
                }
                self.field_index = self.field_index.wrapping_add(1);
                self.buffer.clear();
                if byte == b'*' {
                    self.checksum_capture = true;
                } else {
                    self.parity ^= byte;
                }
            }
            b'\r' | b'\n' => {
                if self.checksum_capture {
                    let expected =
                        checksum_from_hex(self.buffer.byte_at(0), self.buffer.byte_at(1));
                    if expected == self.parity {
                        stats.record_packet();
                        self.commit(solution);
                    } else {
                        warn!(
                            frame = %self.frame,
                            expected,
                            parity = self.parity,
                            "checksum mismatch, sentence dropped"
                        );
                        stats.record_error();
                    }
                }
                self.checksum_capture = false;
            }
            _ => {
                // bytes dropped past capacity stay out of the parity too
                if self.buffer.push(byte) && !self.checksum_capture {
                    self.parity ^= byte;
                }
            }
        }

        self.new_position && self.new_speed
    }

    /// True while a committed position has not been consumed
    pub fn has_new_position(&self) -> bool {
        self.new_position
    }

    /// True while a committed speed has not been consumed
    pub fn has_new_speed(&self) -> bool {
        self.new_speed
    }

    /// Acknowledge a completed solution, clearing both pending markers
    pub fn clear_pending(&mut self) {
        self.new_position = false;
        self.new_speed = false;
    }

    fn store_field(&mut self) {
        match (self.frame, self.field_index) {
            (FrameType::Nav, 1) => self.pending.time = decode_scaled(self.buffer.as_bytes(), 2),
            (FrameType::Nav, 2) => self.pending.date = decode_scaled(self.buffer.as_bytes(), 0),
            (FrameType::Nav, 3) => self.pending.latitude = decode_scaled(self.buffer.as_bytes(), 8),
            (FrameType::Nav, 4) => {
                self.pending.longitude = decode_scaled(self.buffer.as_bytes(), 8)
            }
            (FrameType::Nav, 5) => {
                self.pending.altitude = decode_scaled(self.buffer.as_bytes(), 8) / 10
            }
            (FrameType::Nav, 6) => self.pending.vel_north = decode_scaled(self.buffer.as_bytes(), 0),
            (FrameType::Nav, 7) => self.pending.vel_east = decode_scaled(self.buffer.as_bytes(), 0),
            (FrameType::Nav, 8) => self.pending.vel_down = decode_scaled(self.buffer.as_bytes(), 0),
            (FrameType::Mag, 1) => self.pending.mag_x = decode_scaled(self.buffer.as_bytes(), 2),
            (FrameType::Mag, 2) => self.pending.mag_y = decode_scaled(self.buffer.as_bytes(), 2),
            (FrameType::Mag, 3) => self.pending.mag_z = decode_scaled(self.buffer.as_bytes(), 2),
            _ => {}
        }
    }

    fn commit(&mut self, solution: &mut NavigationSolution) {
        match self.frame {
            FrameType::Nav => self.commit_nav(solution),
            FrameType::Mag => self.commit_mag(solution),
            FrameType::None => {}
        }
    }

    fn commit_nav(&mut self, solution: &mut NavigationSolution) {
        let msg = &self.pending;

        solution.latitude = msg.latitude as i32;
        solution.longitude = msg.longitude as i32;
        solution.altitude = msg.altitude as i32;

        // 00:00:00.00 on day zero reads as "no timestamp"; the next
        // report carries a valid one
        if msg.date != 0 && msg.time != 0 {
            solution.time.year = (msg.date % 100) as u16 + 2000;
            solution.time.month = ((msg.date / 100) % 100) as u8;
            solution.time.day = ((msg.date / 10_000) % 100) as u8;
            solution.time.hours = ((msg.time / 1_000_000) % 100) as u8;
            solution.time.minutes = ((msg.time / 10_000) % 100) as u8;
            solution.time.seconds = ((msg.time / 100) % 100) as u8;
            solution.time.millis = ((msg.time & 100) * 10) as u16;
            solution.flags.set_valid_time(true);
        } else {
            solution.flags.set_valid_time(false);
        }

        // no fix-quality signal on this link
        solution.fix_type = FixType::Fix3D;

        solution.vel_ned[0] = msg.vel_north as i16; // cm/s
        solution.vel_ned[1] = msg.vel_east as i16;
        solution.vel_ned[2] = msg.vel_down as i16;

        // the sensor reports no accuracy estimates
        solution.pdop = 1;
        solution.h_acc = 1; // cm
        solution.v_acc = 1; // cm
        solution.sat_count = 12;

        let vel_n = solution.vel_ned[0] as f32;
        let vel_e = solution.vel_ned[1] as f32;
        solution.ground_speed = (vel_n * vel_n + vel_e * vel_e).sqrt() as u16; // cm/s
        solution.ground_course = heading_decidegrees(vel_e, vel_n);

        solution.flags.set_valid_velocity_ne(true);
        solution.flags.set_valid_velocity_d(true);
        solution.flags.set_valid_accuracy(true);

        self.new_speed = true;
        self.new_position = true;

        trace!(
            lat = solution.latitude,
            lon = solution.longitude,
            alt = solution.altitude,
            "navigation frame committed"
        );
    }

    fn commit_mag(&mut self, solution: &mut NavigationSolution) {
        solution.mag.x = self.pending.mag_x as i16;
        solution.mag.y = self.pending.mag_y as i16;
        solution.mag.z = self.pending.mag_z as i16;
        solution.flags.set_valid_mag(true);

        trace!(
            x = solution.mag.x,
            y = solution.mag.y,
            z = solution.mag.z,
            "magnetometer frame committed"
        );
    }
}

/// Heading of a north/east velocity pair in decidegrees, [0, 3600).
///
/// A zero vector yields 0.
fn heading_decidegrees(vel_e: f32, vel_n: f32) -> u16 {
    let decideg = vel_e.atan2(vel_n).to_degrees() * 10.0;
    ((decideg + 3600.0) % 3600.0) as u16
}
