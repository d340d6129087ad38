use super::serial_comm::SerialComm;
use super::Result;
use log::debug;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Communicate with a serial device using the
/// serialport library
///
/// /dev/tty* or /dev/rfcomm* on unix-like systems
/// COM devices on Windows systems
pub struct SerialPort {
    device: Box<dyn serialport::SerialPort>,
}

impl SerialPort {
    /// Opens the port at `path` with 8N1 framing
    pub fn new(path: &str, baud_rate: u32) -> Result<Self> {
        let device = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(10))
            .parity(serialport::Parity::None)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .open()?;

        Ok(Self { device })
    }
}

impl SerialComm for SerialPort {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.device.write_all(data)?)
    }

    fn read(&mut self, data: &mut [u8]) -> Result<usize> {
        match self.device.read(data) {
            Ok(len) => Ok(len),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        Ok(self.device.set_baud_rate(baud_rate)?)
    }

    fn purge_buffers(&mut self) -> Result<()> {
        Ok(self.device.clear(serialport::ClearBuffer::All)?)
    }
}

/// List the serial ports an OBD-II adapter could be behind
///
/// Bluetooth RFCOMM ports come first, then USB serial converters, then everything else that looks
/// like a serial port.
pub fn candidate_ports() -> Result<Vec<String>> {
    let mut ports: Vec<String> = serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .filter(|name| port_rank(name).is_some())
        .collect();
    ports.sort_by_key(|name| port_rank(name));
    debug!("candidate_ports: {:?}", ports);
    Ok(ports)
}

fn port_rank(name: &str) -> Option<u8> {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.starts_with("rfcomm") || base.contains("Bluetooth") || base.contains("OBD") {
        Some(0)
    } else if base.starts_with("ttyUSB") || base.starts_with("ttyACM") || base.contains("usbserial")
    {
        Some(1)
    } else if base.starts_with("ttyS")
        || base.starts_with("cu.")
        || base.starts_with("tty.")
        || base.starts_with("COM")
    {
        Some(2)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::port_rank;

    #[test]
    fn bluetooth_ports_rank_first() {
        assert_eq!(port_rank("/dev/rfcomm0"), Some(0));
        assert_eq!(port_rank("/dev/cu.OBDII-SPPDev"), Some(0));
        assert_eq!(port_rank("/dev/ttyUSB0"), Some(1));
        assert_eq!(port_rank("/dev/tty.usbserial-A50285BI"), Some(1));
        assert_eq!(port_rank("COM3"), Some(2));
    }

    #[test]
    fn unrelated_devices_are_skipped() {
        assert_eq!(port_rank("/dev/null"), None);
        assert_eq!(port_rank("/dev/video0"), None);
    }
}
