//! Unified error types for the doorlink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be cheaply passed around the poll loop without allocation.
//!
//! None of these are fatal: the loop logs the error, skips the operation for
//! the current iteration, and retries on the next pass (or via the broker
//! reconnect backoff).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// A remote payload could not be decoded.
    Decode(DecodeError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Ranging trigger fired but no echo returned within the timeout.
    NoEcho,
    /// DHT read returned NaN for temperature or humidity.
    EnvReadFailed,
    /// GPIO read/write returned an error.
    GpioFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEcho => write!(f, "no echo within timeout"),
            Self::EnvReadFailed => write!(f, "DHT read failed"),
            Self::GpioFailed => write!(f, "GPIO access failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiDisconnected,
    BrokerConnectFailed,
    PublishFailed,
    /// HTTP request failed at the transport level (no status received).
    HttpTransport,
    /// HTTP request completed with a non-2xx status.
    HttpStatus(u16),
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiDisconnected => write!(f, "WiFi disconnected"),
            Self::BrokerConnectFailed => write!(f, "broker connect failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::HttpTransport => write!(f, "HTTP transport failure"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Filesystem mount failed; running without persistence this session.
    MountFailed,
    /// Requested key does not exist.
    NotFound,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MountFailed => write!(f, "mount failed"),
            Self::NotFound => write!(f, "key not found"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Failures while decoding the remote status document.
///
/// Decoding validates hard instead of best-effort, so callers choose their
/// failure policy explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Base64 input length is not a multiple of 4.
    BadLength,
    /// A byte outside the Base64 alphabet (or misplaced padding).
    BadCharacter,
    /// Decoded bytes are not the JSON document we expect.
    BadJson,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength => write!(f, "base64 length not a multiple of 4"),
            Self::BadCharacter => write!(f, "byte outside base64 alphabet"),
            Self::BadJson => write!(f, "unexpected JSON shape"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
