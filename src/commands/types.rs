use std::{fmt, time::Duration};

/// Time since the engine was started, as reported by service 0x01 PID 0x1F
///
/// The vehicle counts whole seconds in two bytes, so the value saturates at 65535 s (just over
/// 18 hours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTime(u16);

impl RunTime {
    pub fn from_seconds(seconds: u16) -> Self {
        RunTime(seconds)
    }

    pub fn seconds(&self) -> u16 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }

    /// Run time in fractional hours
    pub fn hours(&self) -> f32 {
        f32::from(self.0) / 3600.0
    }
}

/// Formatted as `H:MM:SS`
impl fmt::Display for RunTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        write!(f, "{}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }
}

/// Which of the PIDs 0x01 to 0x20 of service 0x01 an ECU supports
///
/// Read from PID 0x00. The most significant bit stands for PID 0x01 and the least significant
/// for PID 0x20, which itself announces support for the next range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SupportedPids(u32);

impl SupportedPids {
    pub fn from_bitmap(bitmap: u32) -> Self {
        SupportedPids(bitmap)
    }

    pub fn bitmap(&self) -> u32 {
        self.0
    }

    /// Whether `pid` is listed; PIDs outside 0x01..=0x20 never are
    pub fn contains(&self, pid: u8) -> bool {
        (0x01..=0x20).contains(&pid) && self.0 & (1 << (0x20 - u32::from(pid))) != 0
    }

    /// The PIDs supported by either set, for vehicles where several ECUs answer
    pub fn union(self, other: SupportedPids) -> SupportedPids {
        SupportedPids(self.0 | other.0)
    }
}
