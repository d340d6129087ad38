use log::{debug, info, trace, warn};
use std::{collections::VecDeque, thread, time};

use super::{
    serial_comm::PROBE_BAUD_RATES, ConnectionStatus, Error, Obd2BaseDevice, Obd2Reader, Protocol,
    Result, SerialComm, DEFAULT_BAUD_RATE,
};

/// Longest wait for the prompt while probing one baud rate
const PROBE_TIMEOUT: time::Duration = time::Duration::from_millis(250);

/// Below this the adapter is not being powered by a running vehicle
const MIN_VEHICLE_VOLTAGE: f32 = 6.0;

/// Settings for the ELM327 handshake
#[derive(Debug, Clone)]
pub struct Elm327Options {
    /// Fixed baud rate, or `None` to probe the usual rates
    pub baud_rate: Option<u32>,
    pub protocol: Protocol,
    /// Longest wait for a complete reply
    pub timeout: time::Duration,
    /// Pause after resets, giving the adapter time to settle
    pub settle_delay: time::Duration,
}

impl Default for Elm327Options {
    fn default() -> Self {
        Self {
            baud_rate: None,
            protocol: Protocol::Auto,
            timeout: time::Duration::from_secs(5),
            settle_delay: time::Duration::from_millis(500),
        }
    }
}

/// An ELM327 OBD-II adapter
///
/// It communicates with the computer over a serial link: a USB-to-UART converter, or a Bluetooth
/// RFCOMM channel for wireless adapters. Commands to the device itself are indicated by sending
/// "AT" followed by the command, while plain strings of hex data indicate OBD-II requests to be
/// sent to the vehicle. The responses of the vehicle are echoed back as hex characters.
/// Capitalization and spaces are always ignored.
///
/// [Datasheet for v1.4b](https://github.com/rsammelson/obd2/blob/master/docs/ELM327DSH.pdf), and
/// the [source](https://www.elmelectronics.com/products/dsheets/).
pub struct Elm327<T: SerialComm> {
    device: T,
    buffer: VecDeque<u8>,
    baud_rate: u32,
    options: Elm327Options,
    status: ConnectionStatus,
    voltage: Option<f32>,
    protocol_number: Option<String>,
}

impl<T: SerialComm> Obd2BaseDevice for Elm327<T> {
    fn reset(&mut self) -> Result<()> {
        self.status = ConnectionStatus::NotConnected;
        self.flush_buffers()?;
        if !self.reset_ic()? {
            return Ok(());
        }
        thread::sleep(self.options.settle_delay);
        self.reset_protocol()?;
        self.flush_buffers()?;
        Ok(())
    }

    /// Flush the device's buffer
    fn flush(&mut self) -> Result<()> {
        thread::sleep(self.options.settle_delay);
        self.read_into_queue()?;
        self.buffer.clear();
        Ok(())
    }

    fn send_cmd(&mut self, data: &[u8]) -> Result<()> {
        let hex: String = data.iter().map(|v| format!("{:02X}", v)).collect();
        trace!("send_cmd: sending {:?}", hex);
        self.send_serial_str(&hex)
    }

    fn status(&self) -> ConnectionStatus {
        self.status
    }
}

impl<T: SerialComm> Obd2Reader for Elm327<T> {
    fn get_line(&mut self) -> Result<Option<Vec<u8>>> {
        self.get_until(b'\n', false, self.options.timeout)
    }

    /// Read data until the ELM327's prompt character is printed
    ///
    /// This will receive the entire OBD-II response. The prompt signifies that the ELM327 is ready
    /// for another command. If this is not called after each OBD-II command is sent, the prompt
    /// character will come out of the receive queue later and because it is not valid hex this
    /// could cause problems. If a timeout occurs, `Ok(None)` will be returned.
    fn get_response(&mut self) -> Result<Option<Vec<u8>>> {
        self.get_until(b'>', true, self.options.timeout)
    }
}

impl<T: SerialComm> Elm327<T> {
    /// Run the adapter handshake over `device`
    ///
    /// An adapter that never answers is not an error: the returned device reports
    /// [ConnectionStatus::NotConnected]. Errors are reserved for failures of the link itself.
    pub fn connect(device: T, options: Elm327Options) -> Result<Self> {
        let mut elm = Elm327 {
            device,
            buffer: VecDeque::new(),
            baud_rate: options.baud_rate.unwrap_or(DEFAULT_BAUD_RATE),
            options,
            status: ConnectionStatus::NotConnected,
            voltage: None,
            protocol_number: None,
        };

        elm.flush_buffers()?;
        match elm.options.baud_rate {
            Some(rate) => elm.device.set_baud_rate(rate)?,
            None => match elm.find_baud_rate()? {
                Some(rate) => info!("Found adapter at baud rate {}", rate),
                None => {
                    warn!("Adapter did not answer at any baud rate");
                    return Ok(elm);
                }
            },
        }

        elm.reset()?;
        elm.flush()?;
        info!("Adapter handshake finished with status {:?}", elm.status);
        Ok(elm)
    }

    /// The baud rate in use
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Supply voltage the adapter measured during the handshake
    pub fn voltage(&self) -> Option<f32> {
        self.voltage
    }

    /// The protocol number the adapter settled on (`ATDPN`), `A` prefixed when auto-detected
    pub fn protocol_number(&self) -> Option<&str> {
        self.protocol_number.as_deref()
    }

    fn flush_buffers(&mut self) -> Result<()> {
        self.buffer.clear();
        self.device.purge_buffers()?;
        Ok(())
    }

    fn find_baud_rate(&mut self) -> Result<Option<u32>> {
        let timeout = self.options.timeout.min(PROBE_TIMEOUT);
        for rate in PROBE_BAUD_RATES {
            debug!("Trying baud rate {}", rate);
            self.device.set_baud_rate(rate)?;
            self.flush_buffers()?;

            // two DEL characters make the adapter drop any partial command and prompt again
            self.device.write_all(b"\x7F\x7F\r")?;
            if self.get_until(b'>', true, timeout)?.is_some() {
                self.baud_rate = rate;
                return Ok(Some(rate));
            }
        }
        Ok(None)
    }

    /// Returns whether the adapter answered
    fn reset_ic(&mut self) -> Result<bool> {
        info!("Performing IC reset");
        let response = match self.serial_cmd("ATZ") {
            Ok(response) => response,
            Err(Error::Communication(e)) => {
                warn!("reset_ic: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        debug!("reset_ic: got response {:?}", response);

        match response {
            Some(_) => {
                self.status = ConnectionStatus::ElmConnected;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reset_protocol(&mut self) -> Result<()> {
        info!("Performing protocol reset");
        let select = self.options.protocol.elm_command();
        let response = self.serial_cmd(&select)?;
        debug!("reset_protocol: got response {:?}", response);
        if !response.as_deref().is_some_and(|r| r.contains("OK")) {
            warn!("Adapter rejected {}: {:?}", select, response);
            return Ok(());
        }
        self.status = ConnectionStatus::ObdConnected;

        let response = self.serial_cmd("ATRV")?;
        self.voltage = response.as_deref().and_then(parse_voltage);
        match self.voltage {
            Some(v) if v < MIN_VEHICLE_VOLTAGE => {
                warn!("Adapter reports {:.1}V, is the ignition off?", v);
                return Ok(());
            }
            Some(v) => info!("Adapter reports {:.1}V", v),
            None => debug!("reset_protocol: unreadable voltage {:?}", response),
        }

        let response = self.cmd(&[0x01, 0x00])?;
        debug!("reset_protocol: got OBD response {:?}", response);
        if response.as_deref().is_some_and(has_hex_data) {
            self.status = ConnectionStatus::CarConnected;
            self.protocol_number = self
                .serial_cmd("ATDPN")?
                .map(|r| r.trim().to_owned())
                .filter(|r| !r.is_empty());
            info!("Vehicle answered using protocol {:?}", self.protocol_number);
        } else {
            warn!("Vehicle did not answer: {:?}", response);
        }
        Ok(())
    }

    fn get_until(
        &mut self,
        end_byte: u8,
        allow_empty: bool,
        timeout: time::Duration,
    ) -> Result<Option<Vec<u8>>> {
        trace!("get_until: getting until {}", end_byte);

        let mut buf = Vec::new();
        let start = time::Instant::now();
        while start.elapsed() < timeout {
            let Some(b) = self.get_byte()? else { continue };
            let b = match b {
                b'\r' => Some(b'\n'),
                b'\n' => None, // no push here
                _ => Some(b),
            };
            if let Some(b) = b {
                buf.push(b);
                if b == end_byte {
                    break;
                }
            }
        }

        trace!(
            "get_until: got {:?} ({:?})",
            buf,
            std::str::from_utf8(buf.as_slice())
        );

        match buf.pop() {
            Some(b) if b == end_byte => {
                if allow_empty || !buf.is_empty() {
                    Ok(Some(buf))
                } else {
                    // empty line, try again
                    self.get_until(end_byte, allow_empty, timeout)
                }
            } // we got it
            Some(f) => {
                // incomplete line read
                self.buffer.push_front(f);
                for b in buf.iter().rev() {
                    self.buffer.push_front(*b);
                }
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn get_byte(&mut self) -> Result<Option<u8>> {
        match self.buffer.pop_front() {
            Some(b'\0') => Ok(None),
            Some(b) => Ok(Some(b)),
            None => {
                self.read_into_queue()?;
                Ok(None)
            }
        }
    }

    fn read_into_queue(&mut self) -> Result<()> {
        let mut buf = [0u8; 16];
        loop {
            let len = self.device.read(&mut buf)?;
            if len > 0 {
                self.buffer.extend(&buf[0..len]);
                trace!(
                    "read_into_queue: values {:?}",
                    std::str::from_utf8(&buf[0..len])
                );
            } else {
                trace!("read_into_queue: no values left to read");
                break;
            }
        }
        Ok(())
    }

    fn serial_cmd(&mut self, cmd: &str) -> Result<Option<String>> {
        self.send_serial_str(cmd)?;
        self.get_response()
            .map(|o| o.and_then(|resp| String::from_utf8(resp).ok()))
    }

    /// Function for sending a raw string, without encoding into ASCII hex
    fn send_serial_str(&mut self, data: &str) -> Result<()> {
        trace!("send_serial_str: sending {:?}", data);

        let data = data.as_bytes();

        self.device.write_all(data)?;
        self.device.write_all(b"\r\n")?;
        let line = self.get_line()?;
        if line.as_ref().is_some_and(|v| v == data) {
            Ok(())
        } else {
            Err(Error::Communication(format!(
                "send_serial_str: got {:?} instead of echoed command ({:?})",
                line, data
            )))
        }
    }
}

/// Parse an `ATRV` reply such as `12.6V`
fn parse_voltage(response: &str) -> Option<f32> {
    response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .trim_end_matches(['V', 'v'])
        .parse()
        .ok()
}

/// Whether a reply holds at least one line made only of hex byte pairs
fn has_hex_data(response: &str) -> bool {
    response.lines().any(|l| {
        let mut tokens = l.split_whitespace().peekable();
        tokens.peek().is_some()
            && tokens.all(|t| t.len() == 2 && t.chars().all(|c| c.is_ascii_hexdigit()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::scripted::ScriptedComm;

    fn options() -> Elm327Options {
        Elm327Options {
            timeout: time::Duration::from_millis(20),
            settle_delay: time::Duration::ZERO,
            ..Elm327Options::default()
        }
    }

    #[test]
    fn handshake_reaches_the_vehicle() {
        let comm = ScriptedComm::vehicle();
        let elm = Elm327::connect(comm, options()).unwrap();

        assert_eq!(elm.status(), ConnectionStatus::CarConnected);
        assert_eq!(elm.baud_rate(), 38_400);
        assert_eq!(elm.voltage(), Some(12.6));
        assert_eq!(elm.protocol_number(), Some("A6"));
    }

    #[test]
    fn probes_for_the_adapter_baud_rate() {
        let comm = ScriptedComm::vehicle().answering_at(115_200);
        let elm = Elm327::connect(comm, options()).unwrap();

        assert_eq!(elm.baud_rate(), 115_200);
        assert_eq!(elm.status(), ConnectionStatus::CarConnected);
    }

    #[test]
    fn fixed_baud_rate_skips_probing() {
        let comm = ScriptedComm::vehicle().answering_at(9_600);
        let elm = Elm327::connect(
            comm,
            Elm327Options {
                baud_rate: Some(9_600),
                ..options()
            },
        )
        .unwrap();

        assert_eq!(elm.baud_rate(), 9_600);
        assert!(!elm.device.written().iter().any(|l| l.starts_with('\x7F')));
        assert_eq!(elm.status(), ConnectionStatus::CarConnected);
    }

    #[test]
    fn silent_port_is_not_connected() {
        let comm = ScriptedComm::vehicle().answering_at(1);
        let elm = Elm327::connect(comm, options()).unwrap();

        assert_eq!(elm.status(), ConnectionStatus::NotConnected);
    }

    #[test]
    fn low_voltage_stops_before_querying_the_vehicle() {
        let comm = ScriptedComm::vehicle().reply("ATRV", "\r3.1V\r\r");
        let elm = Elm327::connect(comm, options()).unwrap();

        assert_eq!(elm.status(), ConnectionStatus::ObdConnected);
        assert!(!elm.device.written().iter().any(|l| l == "0100"));
    }

    #[test]
    fn vehicle_that_does_not_answer() {
        let comm = ScriptedComm::vehicle().reply("0100", "SEARCHING...\rUNABLE TO CONNECT\r\r");
        let elm = Elm327::connect(comm, options()).unwrap();

        assert_eq!(elm.status(), ConnectionStatus::ObdConnected);
        assert_eq!(elm.protocol_number(), None);
    }

    #[test]
    fn selects_the_configured_protocol() {
        let comm = ScriptedComm::vehicle().reply("ATSP6", "\rOK\r\r");
        let elm = Elm327::connect(
            comm,
            Elm327Options {
                protocol: Protocol::Iso15765_4Can11bit500,
                ..options()
            },
        )
        .unwrap();

        assert!(elm.device.written().iter().any(|l| l == "ATSP6"));
        assert_eq!(elm.status(), ConnectionStatus::CarConnected);
    }

    #[test]
    fn command_reply_is_read_up_to_the_prompt() {
        let comm = ScriptedComm::vehicle().reply("011F", "41 1F 0E 10\r\r");
        let mut elm = Elm327::connect(comm, options()).unwrap();

        let reply = elm.cmd(&[0x01, 0x1F]).unwrap().unwrap();
        assert_eq!(reply.trim(), "41 1F 0E 10");
    }

    #[test]
    fn voltage_and_hex_detection() {
        assert_eq!(parse_voltage("\n12.3V\n\n"), Some(12.3));
        assert_eq!(parse_voltage("?"), None);
        assert!(has_hex_data("SEARCHING...\n41 00 BE 3F A8 13\n"));
        assert!(!has_hex_data("SEARCHING...\nUNABLE TO CONNECT\n"));
        assert!(!has_hex_data("NO DATA"));
    }
}
