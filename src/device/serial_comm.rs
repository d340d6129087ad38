use super::Result;

/// Baud rate most ELM327 adapters ship with
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// Baud rates tried, in order, when the adapter's rate is not configured
pub(crate) const PROBE_BAUD_RATES: [u32; 6] = [38_400, 9_600, 230_400, 115_200, 57_600, 19_200];

/// An API to communicate with a serial device
///
/// `read` must not block for long: when nothing is pending it returns `Ok(0)`.
pub trait SerialComm {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
    fn read(&mut self, data: &mut [u8]) -> Result<usize>;
    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()>;
    fn purge_buffers(&mut self) -> Result<()>;
}
