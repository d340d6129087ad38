use log::{debug, trace};

use super::{
    device::{ConnectionStatus, Obd2BaseDevice},
    Error, Obd2Device, Result,
};

/// An OBD-II interface
///
/// Wraps an implementer of [Obd2BaseDevice] to allow for higher-level usage of the OBD-II
/// interface.
pub struct Obd2<T: Obd2BaseDevice> {
    device: T,
}

impl<T: Obd2BaseDevice> Obd2Device for Obd2<T> {
    fn obd_command(&mut self, mode: u8, pid: u8) -> Result<Vec<Vec<u8>>> {
        let result = self.command(&[mode, pid])?;

        for response in result.iter() {
            if response.first() != Some(&(0x40 | mode)) {
                return Err(Error::MismatchedResponse(
                    "mode",
                    0x40 | mode,
                    response.first().copied(),
                ));
            }
            if response.get(1) != Some(&pid) {
                return Err(Error::MismatchedResponse(
                    "PID",
                    pid,
                    response.get(1).copied(),
                ));
            }
        }

        Ok(result.iter().map(|l| l.split_at(2).1.to_vec()).collect())
    }
}

impl<T: Obd2BaseDevice> Obd2<T> {
    pub fn new(device: T) -> Self {
        Obd2 { device }
    }

    /// The wrapped device
    pub fn device(&self) -> &T {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut T {
        &mut self.device
    }

    pub fn status(&self) -> ConnectionStatus {
        self.device.status()
    }

    fn command(&mut self, command: &[u8]) -> Result<Vec<Vec<u8>>> {
        let response = self
            .device
            .cmd(command)?
            .ok_or(Error::Other("no response to command".to_owned()))?;

        trace!(
            "Sent OBD command {:?} and got response {:?}",
            command,
            response
        );

        let data = if response.lines().any(|l| l.trim_start().starts_with("0:")) {
            vec![parse_command_multiline(&response)?]
        } else {
            parse_command(&response)?
        };

        debug!("Sent OBD command {:?} and got data {:?}", command, data);

        data.iter()
            .map(|l| {
                l.iter()
                    .map(|s| u8::from_str_radix(s, 16).map_err(|e| e.into()))
                    .collect()
            })
            .collect()
    }
}

/// Lines the adapter prints while it is still working on a request
fn is_progress_line(line: &str) -> bool {
    line.starts_with("SEARCHING") || (line.starts_with("BUS INIT") && !line.contains("ERROR"))
}

fn is_hex_byte(token: &str) -> bool {
    token.len() == 2 && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Split a reply into one list of hex bytes per responding ECU
fn parse_command(response: &str) -> Result<Vec<Vec<String>>> {
    let mut result = Vec::new();
    for line in response.lines().map(str::trim) {
        if line.is_empty() || is_progress_line(line) {
            continue;
        }
        if line == "NO DATA" {
            return Err(Error::NoData);
        }
        let res: Vec<_> = line.split_whitespace().map(|s| s.to_owned()).collect();
        if !res.iter().all(|s| is_hex_byte(s)) {
            return Err(Error::AdapterMessage(line.to_owned()));
        }
        result.push(res);
    }

    if !result.is_empty() {
        Ok(result)
    } else {
        Err(Error::Other("parse_command: found no responses".to_owned()))
    }
}

/// Join the frames of an ISO-TP reply
///
/// The adapter prints the total byte count first, then each frame prefixed with its index
/// (`0:`, `1:`, ...), which wraps around after `F:`.
fn parse_command_multiline(response: &str) -> Result<Vec<String>> {
    let mut n_idx = 0;
    let mut count = None;
    let mut data = Vec::new();
    for line in response.lines().map(str::trim) {
        if line.is_empty() || is_progress_line(line) {
            continue;
        }
        let Some((idx, frame)) = line.split_once(':') else {
            if line == "NO DATA" {
                return Err(Error::NoData);
            }
            count = Some(usize::from_str_radix(line, 16).map_err(|_| {
                Error::AdapterMessage(line.to_owned())
            })?);
            continue;
        };
        if u8::from_str_radix(idx.trim(), 16) != Ok(n_idx) {
            return Err(Error::Other(format!(
                "parse_command_multiline: line index {}, should be {:X}",
                idx, n_idx
            )));
        }
        n_idx = (n_idx + 1) % 0x10;
        data.extend(frame.split_whitespace().map(|s| s.to_owned()));
    }

    if let Some(count) = count {
        if data.len() < count {
            return Err(Error::IncorrectResponseLength("multiline", count, data.len()));
        }
        data.truncate(count);
    }
    Ok(data)
}
