//! Low-level communication with OBD-II adapters

mod elm327;
pub use elm327::{Elm327, Elm327Options};

mod protocol;
pub use protocol::Protocol;

mod serial_comm;
pub use serial_comm::{SerialComm, DEFAULT_BAUD_RATE};

#[cfg(feature = "serialport_comm")]
mod serialport_comm;
#[cfg(feature = "serialport_comm")]
pub use serialport_comm::{candidate_ports, SerialPort};

#[cfg(test)]
pub(crate) mod scripted;

pub type Result<T> = std::result::Result<T, Error>;

/// How far the adapter handshake got
///
/// The variants are ordered, so `status >= ConnectionStatus::ElmConnected` means the adapter
/// itself answered, whatever happened afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionStatus {
    /// Nothing answered
    NotConnected,
    /// The adapter answered its reset command
    ElmConnected,
    /// The adapter accepted a protocol selection
    ObdConnected,
    /// An ECU on the vehicle answered a request
    CarConnected,
}

/// A device that carries OBD-II requests to the vehicle
pub trait Obd2BaseDevice: Obd2Reader {
    /// Reset the device and re-select the protocol
    fn reset(&mut self) -> Result<()>;

    /// Drop anything still waiting in the receive path
    fn flush(&mut self) -> Result<()>;

    /// Send an OBD-II request, encoded as hex, without reading the reply
    fn send_cmd(&mut self, data: &[u8]) -> Result<()>;

    /// How far the handshake with the adapter and vehicle got
    fn status(&self) -> ConnectionStatus;

    /// Send an OBD-II request and read the reply up to the next prompt
    fn cmd(&mut self, cmd: &[u8]) -> Result<Option<String>> {
        self.send_cmd(cmd)?;
        self.get_response()
            .map(|o| o.and_then(|resp| String::from_utf8(resp).ok()))
    }
}

pub trait Obd2Reader {
    fn get_line(&mut self) -> Result<Option<Vec<u8>>>;
    fn get_response(&mut self) -> Result<Option<Vec<u8>>>;
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "serialport_comm")]
    #[error("Serial port error: `{0:?}`")]
    Serialport(serialport::Error),
    #[error("IO error: `{0:?}`")]
    IO(std::io::Error),
    #[error("Communication error: `{0}`")]
    Communication(String),
}

#[cfg(feature = "serialport_comm")]
impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error::Serialport(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IO(e)
    }
}
