//! Sensor data source collaborator.
//!
//! The engine never talks to the bus directly; everything it needs from the
//! chip comes through [`SampleSource`]. Register framing, bit layouts and
//! unit conversions live behind this trait.

use thiserror::Error;

use crate::sample::Sample;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("bus transfer failed: {0}")]
    Bus(String),
    #[error("gesture fifo underrun")]
    FifoUnderrun,
}

/// Gesture-engine status flags (GSTATUS register on real hardware).
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureStatus {
    /// Hardware currently considers a gesture in progress (data in the FIFO).
    pub data_valid: bool,
    /// The hardware FIFO filled faster than it was drained.
    pub fifo_overflow: bool,
}

/// General device status flags (STATUS register on real hardware).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceStatus {
    /// The gesture interrupt line is asserted.
    pub gesture_int_asserted: bool,
}

/// A register-backed gesture sensor, reduced to the calls the engine makes.
///
/// Every call may fail with a transport error. The engine's contract on
/// failure is to abort the current sub-step, leave its state unchanged, and
/// resume from the same state on the next tick.
pub trait SampleSource {
    /// Number of buffered sample quads ready to read.
    fn pending_samples(&mut self) -> Result<u8, SourceError>;

    /// Pop one sample quad. Must be called exactly `pending_samples()` times
    /// per tick before the count is queried again.
    fn next_sample(&mut self) -> Result<Sample, SourceError>;

    fn gesture_status(&mut self) -> Result<GestureStatus, SourceError>;

    fn device_status(&mut self) -> Result<DeviceStatus, SourceError>;

    /// Best-effort latch/clear of the gesture interrupt flag.
    fn clear_gesture_interrupt(&mut self) -> Result<(), SourceError>;
}
