//! A connection to the vehicle, as seen by the application
//!
//! [Connection] answers the two questions the application asks, "is there a vehicle at the other
//! end?" and "what is the engine run time?", and turns the usual ways a query can come back empty
//! into a null [Response] instead of an error.

use log::{debug, info, warn};

#[cfg(feature = "serialport_comm")]
use crate::device::{candidate_ports, SerialPort};
use crate::{
    commands::{Obd2DataRetrieval, RunTime, SupportedPids, PID_RUN_TIME},
    device::{
        self, ConnectionStatus, Elm327, Elm327Options, Obd2BaseDevice, SerialComm,
        DEFAULT_BAUD_RATE,
    },
    Error, Obd2, Result,
};

/// The outcome of a query, which may be null
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    value: Option<T>,
}

impl<T> Response<T> {
    pub fn new(value: T) -> Self {
        Response { value: Some(value) }
    }

    pub fn null() -> Self {
        Response { value: None }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }
}

/// A handle on an adapter, or on nothing when auto-connect found no adapter
pub struct Connection<T: Obd2BaseDevice> {
    obd: Option<Obd2<T>>,
    supported: SupportedPids,
}

impl<T: Obd2BaseDevice> Connection<T> {
    /// Wrap a device whose handshake already ran
    ///
    /// When the vehicle answered, the PIDs it supports are read straight away.
    pub fn new(device: T) -> Result<Self> {
        let mut obd = Obd2::new(device);
        let mut supported = SupportedPids::default();

        if obd.status() == ConnectionStatus::CarConnected {
            match obd.get_supported_pids() {
                Ok(sets) => {
                    supported = sets.into_iter().fold(supported, SupportedPids::union);
                    debug!("Supported PIDs bitmap {:08X}", supported.bitmap());
                }
                Err(e) if e.is_device_error() => return Err(e),
                Err(e) => warn!("Could not read supported PIDs: {}", e),
            }
            match obd.get_vin() {
                Ok(vin) => info!("Connected to vehicle {}", vin),
                Err(e) if e.is_device_error() => return Err(e),
                Err(e) => debug!("VIN not available: {}", e),
            }
        }

        Ok(Connection {
            obd: Some(obd),
            supported,
        })
    }

    /// A connection that never reached an adapter
    pub fn disconnected() -> Self {
        Connection {
            obd: None,
            supported: SupportedPids::default(),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.obd
            .as_ref()
            .map_or(ConnectionStatus::NotConnected, Obd2::status)
    }

    /// Whether a vehicle answered, not merely the adapter
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::CarConnected
    }

    /// Whether the vehicle listed `pid` of service 0x01 as supported
    pub fn supports(&self, pid: u8) -> bool {
        self.supported.contains(pid)
    }

    /// The underlying device, if any
    pub fn device(&self) -> Option<&T> {
        self.obd.as_ref().map(Obd2::device)
    }

    #[cfg(test)]
    pub(crate) fn obd_mut(&mut self) -> Option<&mut Obd2<T>> {
        self.obd.as_mut()
    }

    /// Query the engine run time
    ///
    /// A missing connection, an unsupported PID, or a reply that holds no usable value gives a
    /// null response. Only failures of the link to the adapter are errors.
    pub fn query_run_time(&mut self) -> Result<Response<RunTime>> {
        if !self.is_connected() {
            warn!("Query for run time made without a vehicle connection");
            return Ok(Response::null());
        }
        if !self.supports(PID_RUN_TIME) {
            warn!("Run time (PID {:02X}) is not supported by this vehicle", PID_RUN_TIME);
            return Ok(Response::null());
        }
        let Some(obd) = self.obd.as_mut() else {
            return Ok(Response::null());
        };

        match obd.get_run_time() {
            Ok(values) => {
                if values.len() > 1 {
                    debug!("{} ECUs answered the run time query, using the first", values.len());
                }
                Ok(values.into_iter().next().map_or(Response::null(), Response::new))
            }
            Err(e) if e.is_device_error() => Err(e),
            Err(e @ Error::NoData) => {
                warn!("Run time query: {}", e);
                Ok(Response::null())
            }
            Err(e) => {
                warn!("Run time query gave an unusable reply: {}", e);
                Ok(Response::null())
            }
        }
    }
}

/// Something that can produce a [Connection], such as the serial port auto-connect
pub trait Connector {
    type Device: Obd2BaseDevice;

    fn connect(&mut self) -> Result<Connection<Self::Device>>;
}

/// Lists the ports to try when none is configured
pub type ListPorts = fn() -> device::Result<Vec<String>>;

/// Opens one port at the given baud rate
pub type OpenPort<T> = fn(&str, u32) -> device::Result<T>;

/// Auto-connect over serial ports
///
/// Tries the configured port, or every listed port in turn, and keeps the first one where an
/// adapter answers.
pub struct SerialConnector<T: SerialComm> {
    port: Option<String>,
    options: Elm327Options,
    list_ports: ListPorts,
    open: OpenPort<T>,
}

#[cfg(feature = "serialport_comm")]
impl SerialConnector<SerialPort> {
    /// Auto-connect over the system's serial ports, see [candidate_ports]
    pub fn new(port: Option<String>, options: Elm327Options) -> Self {
        SerialConnector::with_ports(port, options, candidate_ports, SerialPort::new)
    }
}

impl<T: SerialComm> SerialConnector<T> {
    pub fn with_ports(
        port: Option<String>,
        options: Elm327Options,
        list_ports: ListPorts,
        open: OpenPort<T>,
    ) -> Self {
        SerialConnector {
            port,
            options,
            list_ports,
            open,
        }
    }
}

impl<T: SerialComm> Connector for SerialConnector<T> {
    type Device = Elm327<T>;

    fn connect(&mut self) -> Result<Connection<Self::Device>> {
        let ports = match &self.port {
            Some(port) => vec![port.clone()],
            None => (self.list_ports)()?,
        };
        info!("Looking for an OBD-II adapter on {:?}", ports);

        let baud_rate = self.options.baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
        for port in ports {
            let link = match (self.open)(&port, baud_rate) {
                Ok(link) => link,
                Err(e) => {
                    warn!("Could not open {}: {}", port, e);
                    continue;
                }
            };
            let elm = match Elm327::connect(link, self.options.clone()) {
                Ok(elm) => elm,
                Err(e) => {
                    warn!("Handshake on {} failed: {}", port, e);
                    continue;
                }
            };
            if elm.status() >= ConnectionStatus::ElmConnected {
                info!("Adapter found on {} with status {:?}", port, elm.status());
                return Connection::new(elm);
            }
            info!("No adapter answered on {}", port);
        }

        warn!("No OBD-II adapter found");
        Ok(Connection::disconnected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::scripted::ScriptedComm, interface::tests::FakeDevice};
    use std::{io, time::Duration};

    fn car() -> FakeDevice {
        FakeDevice::new(ConnectionStatus::CarConnected)
            .reply("0100", "41 00 BE 3F A8 13\n")
            .reply("011F", "41 1F 0E 10\n")
    }

    #[test]
    fn reads_run_time() {
        let mut connection = Connection::new(car()).unwrap();
        assert!(connection.is_connected());
        assert!(connection.supports(PID_RUN_TIME));

        let response = connection.query_run_time().unwrap();
        assert_eq!(response.value(), Some(&RunTime::from_seconds(3600)));
    }

    #[test]
    fn disconnected_gives_null() {
        let mut connection = Connection::<FakeDevice>::disconnected();
        assert!(!connection.is_connected());
        assert_eq!(connection.status(), ConnectionStatus::NotConnected);
        assert!(connection.query_run_time().unwrap().is_null());
    }

    #[test]
    fn adapter_without_vehicle_gives_null() {
        let device =
            FakeDevice::new(ConnectionStatus::ObdConnected).reply("011F", "41 1F 0E 10\n");
        let mut connection = Connection::new(device).unwrap();
        assert!(!connection.is_connected());
        assert!(connection.query_run_time().unwrap().is_null());
    }

    #[test]
    fn unsupported_pid_gives_null() {
        let device = car().reply("0100", "41 00 BE 3F A8 11\n");
        let mut connection = Connection::new(device).unwrap();
        assert!(!connection.supports(PID_RUN_TIME));
        assert!(connection.query_run_time().unwrap().is_null());
    }

    #[test]
    fn supported_pids_merge_across_ecus() {
        let device = car().reply("0100", "41 00 BE 3F A8 11\n41 00 00 00 00 02\n");
        let connection = Connection::new(device).unwrap();
        assert!(connection.supports(PID_RUN_TIME));
        assert!(connection.supports(0x01));
    }

    #[test]
    fn no_data_gives_null() {
        let device = car().reply("011F", "NO DATA\n");
        let mut connection = Connection::new(device).unwrap();
        assert!(connection.query_run_time().unwrap().is_null());
    }

    #[test]
    fn link_failure_is_an_error() {
        let mut connection = Connection::new(car()).unwrap();
        if let Some(obd) = connection.obd.as_mut() {
            obd.device_mut().fail_io = true;
        }
        let result = connection.query_run_time();
        assert!(matches!(result, Err(e) if e.is_device_error()));
    }

    #[test]
    fn end_to_end_over_scripted_adapter() {
        let elm = Elm327::connect(ScriptedComm::vehicle(), scripted_options()).unwrap();
        let mut connection = Connection::new(elm).unwrap();

        assert!(connection.is_connected());
        let response = connection.query_run_time().unwrap();
        assert_eq!(response.into_value(), Some(RunTime::from_seconds(3600)));
    }

    fn scripted_options() -> Elm327Options {
        Elm327Options {
            timeout: Duration::from_millis(20),
            settle_delay: Duration::ZERO,
            ..Elm327Options::default()
        }
    }

    fn all_ports() -> device::Result<Vec<String>> {
        Ok(["/dev/busy", "/dev/silent", "/dev/broken", "/dev/rfcomm0", "/dev/rfcomm1"]
            .map(String::from)
            .to_vec())
    }

    fn dead_ports() -> device::Result<Vec<String>> {
        Ok(vec!["/dev/busy".to_owned(), "/dev/silent".to_owned()])
    }

    fn listing_fails() -> device::Result<Vec<String>> {
        Err(device::Error::Communication("cannot list ports".to_owned()))
    }

    fn open_scripted(path: &str, _baud_rate: u32) -> device::Result<ScriptedComm> {
        match path {
            "/dev/busy" => Err(io::Error::from(io::ErrorKind::PermissionDenied).into()),
            "/dev/silent" => Ok(ScriptedComm::vehicle().answering_at(1)),
            "/dev/broken" => Ok(ScriptedComm::vehicle().broken()),
            "/dev/rfcomm0" => Ok(ScriptedComm::vehicle()),
            _ => Ok(ScriptedComm::vehicle().reply("ATDPN", "A7\r\r")),
        }
    }

    #[test]
    fn auto_connect_takes_the_first_answering_port() {
        let mut connector =
            SerialConnector::with_ports(None, scripted_options(), all_ports, open_scripted);
        let connection = connector.connect().unwrap();

        assert!(connection.is_connected());
        let elm = connection.device().unwrap();
        assert_eq!(elm.protocol_number(), Some("A6"));
    }

    #[test]
    fn configured_port_skips_the_listing() {
        let mut connector = SerialConnector::with_ports(
            Some("/dev/rfcomm1".to_owned()),
            scripted_options(),
            listing_fails,
            open_scripted,
        );
        let connection = connector.connect().unwrap();

        assert!(connection.is_connected());
        assert_eq!(connection.device().unwrap().protocol_number(), Some("A7"));
    }

    #[test]
    fn configured_port_that_fails_to_open() {
        let mut connector = SerialConnector::with_ports(
            Some("/dev/busy".to_owned()),
            scripted_options(),
            all_ports,
            open_scripted,
        );
        let connection = connector.connect().unwrap();

        assert_eq!(connection.status(), ConnectionStatus::NotConnected);
    }

    #[test]
    fn no_adapter_gives_a_disconnected_connection() {
        let mut connector =
            SerialConnector::with_ports(None, scripted_options(), dead_ports, open_scripted);
        let connection = connector.connect().unwrap();

        assert_eq!(connection.status(), ConnectionStatus::NotConnected);
        assert!(connection.device().is_none());
    }

    #[test]
    fn listing_failure_is_an_error() {
        let mut connector =
            SerialConnector::with_ports(None, scripted_options(), listing_fails, open_scripted);
        assert!(matches!(connector.connect(), Err(e) if e.is_device_error()));
    }
}
