//! The engine hours application, independent of how it is displayed
//!
//! [EngineHoursApp] owns the single label the user sees and the optional connection behind it.
//! The GUI and the headless mode both drive it through [EngineHoursApp::get_engine_hours].

use log::{error, info, warn};

use crate::connection::{Connection, Connector};

/// Text of the one button
pub const BUTTON_TEXT: &str = "Get Engine Hours";

pub const LABEL_NOT_CONNECTED: &str = "Not connected to OBD";
pub const LABEL_CONNECTED: &str = "Connected to OBD";
pub const LABEL_ALREADY_CONNECTED: &str = "Already connected to OBD";
pub const LABEL_CONNECT_FAILED: &str = "Failed to connect to OBD";
pub const LABEL_CONNECT_ERROR: &str = "Error connecting to OBD";
pub const LABEL_READ_FAILED: &str = "Failed to read Engine Hours";
pub const LABEL_READ_ERROR: &str = "Error getting engine hours";
pub const LABEL_PERMISSION_DENIED: &str = "Storage permission denied. Logging to file might fail.";

pub struct EngineHoursApp<C: Connector> {
    connector: C,
    connection: Option<Connection<C::Device>>,
    label: String,
}

impl<C: Connector> EngineHoursApp<C> {
    pub fn new(connector: C) -> Self {
        EngineHoursApp {
            connector,
            connection: None,
            label: LABEL_NOT_CONNECTED.to_owned(),
        }
    }

    /// What the label currently says
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn connection(&self) -> Option<&Connection<C::Device>> {
        self.connection.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    /// Connect to the adapter unless a live connection is already held
    ///
    /// A connection that reached the adapter but not the vehicle is kept, so the label keeps
    /// explaining why no reading is shown. It is closed before the next attempt, since serial
    /// ports are opened exclusively.
    pub fn connect_obd(&mut self) {
        if self.is_connected() {
            self.label = LABEL_ALREADY_CONNECTED.to_owned();
            return;
        }
        self.connection = None;

        match self.connector.connect() {
            Ok(connection) => {
                if connection.is_connected() {
                    self.label = LABEL_CONNECTED.to_owned();
                    info!("Successfully connected to OBD.");
                } else {
                    self.label = LABEL_CONNECT_FAILED.to_owned();
                    warn!(
                        "Auto-connect did not reach a vehicle (status {:?}).",
                        connection.status()
                    );
                }
                self.connection = Some(connection);
            }
            Err(e) => {
                self.label = LABEL_CONNECT_ERROR.to_owned();
                error!("Error during OBD connection: {}", e);
            }
        }
    }

    /// Handle a press of the button: connect if needed, then read the engine run time
    pub fn get_engine_hours(&mut self) {
        if !self.is_connected() {
            self.connect_obd();
        }

        let Some(connection) = self.connection.as_mut().filter(|c| c.is_connected()) else {
            return;
        };

        match connection.query_run_time() {
            Ok(response) => match response.value() {
                Some(run_time) => {
                    self.label = format!("Engine Hours: {}", run_time);
                    info!("Successfully retrieved engine hours: {}", run_time);
                }
                None => {
                    self.label = LABEL_READ_FAILED.to_owned();
                    warn!("Failed to read Engine Hours, response was null.");
                }
            },
            Err(e) => {
                // the link is gone, reconnect on the next press
                self.connection = None;
                self.label = LABEL_READ_ERROR.to_owned();
                error!("Error while getting engine hours: {}", e);
            }
        }
    }

    /// Record the outcome of the platform's storage permission request
    ///
    /// One entry per permission asked for, `true` when granted.
    pub fn on_permissions_result(&mut self, results: &[bool]) {
        if results.iter().all(|&granted| granted) {
            info!("All permissions granted.");
        } else {
            warn!("Not all permissions were granted.");
            self.label = LABEL_PERMISSION_DENIED.to_owned();
        }
    }
}
