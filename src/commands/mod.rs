//! High level OBD-II interface

#[macro_use]
mod macros;

mod implementation;
use implementation::GetObd2Values;

mod types;
pub use types::{RunTime, SupportedPids};

use crate::{Obd2Device, Result};

/// Service 0x01 PID for the time since engine start
pub const PID_RUN_TIME: u8 = 0x1F;

func! {
    /// Trait for devices that can retrieve data over OBD-II
    ///
    /// Automatically implemented for implementors of [Obd2Device](crate::Obd2Device). Getters
    /// return one value for each ECU that answered.
    trait Obd2DataRetrieval;

    {
        /// Retrieve the VIN (vehicle identification number)
        ///
        /// Service 0x09, PID 0x02. This should match the number printed on the vehicle, and is a
        /// good command for checking that the OBD-II interface is working correctly.
        fn get_vin(self, 0x09, 0x02) -> Result<String> {
            implementation::get_vin(self)
        }
    }

    /// Get which of the PIDs 0x01 to 0x20 are supported
    fn get_supported_pids<u32>(0x01, 0x00, SupportedPids::from_bitmap) -> SupportedPids;

    /// Get the time since the engine was started, in seconds
    fn get_run_time<u16>(0x01, 0x1F, RunTime::from_seconds) -> RunTime;
}

mod private {
    pub trait Sealed {}
    impl<T: crate::Obd2Device> Sealed for T {}
}
