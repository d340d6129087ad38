//! Read a vehicle's engine run time over an OBD-II adapter
//!
//! The crate talks to ELM327-compatible adapters, whether wired or Bluetooth (which show up as
//! serial ports), and carries a small application around it: one label and one button that
//! fetches the engine hours.
//!
//! # Usage
//! ```no_run
//! use engine_hours::{app::EngineHoursApp, connection::SerialConnector, device::Elm327Options};
//!
//! let connector = SerialConnector::new(Some("/dev/rfcomm0".to_owned()), Elm327Options::default());
//! let mut app = EngineHoursApp::new(connector);
//! app.get_engine_hours();
//! println!("{}", app.label());
//! ```

#![forbid(unsafe_code)]

pub mod app;

pub mod commands;

pub mod config;

pub mod connection;

pub mod device;

mod error;
pub use error::{Error, Result};

#[cfg(feature = "gui")]
pub mod gui;

mod interface;
pub use interface::Obd2;

pub mod logging;

mod obd2_device;
pub use obd2_device::Obd2Device;
