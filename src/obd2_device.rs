use crate::{Error, Result};

/// Request/response access to the vehicle, one reply per answering ECU
pub trait Obd2Device {
    /// Send a request for `pid` of service `mode`
    ///
    /// Each ECU that answers contributes one entry. The leading `0x40 | mode` and PID bytes of
    /// every reply are checked against the request and removed, leaving only the data bytes.
    fn obd_command(&mut self, mode: u8, pid: u8) -> Result<Vec<Vec<u8>>>;

    /// Like [obd_command](Self::obd_command), with every reply checked to hold exactly
    /// `RESPONSE_LENGTH` data bytes
    ///
    /// Fixed-size arrays let decoders index into the data without bounds checks of their own.
    fn obd_command_len<const RESPONSE_LENGTH: usize>(
        &mut self,
        mode: u8,
        pid: u8,
    ) -> Result<Vec<[u8; RESPONSE_LENGTH]>> {
        self.obd_command(mode, pid)?
            .into_iter()
            .map(|v| {
                let l = v.len();
                <[u8; RESPONSE_LENGTH]>::try_from(v)
                    .map_err(|_| Error::IncorrectResponseLength("length", RESPONSE_LENGTH, l))
            })
            .collect()
    }
}
