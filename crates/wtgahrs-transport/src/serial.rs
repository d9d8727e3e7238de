use std::io::Read;
use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Factory baud rate of the WTGAHRS2.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout. A read that times out means "no data yet".
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial port settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM6`.
    pub port: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Read timeout for blocking reads.
    pub timeout: Duration,
}

impl SerialConfig {
    /// Settings for `port` with the sensor's factory defaults.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A receive-only serial connection to the sensor.
///
/// Only [`Read`] is implemented: the sensor streams frames unprompted and
/// nothing is ever written back to it.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open the port described by `config` (8N1, no flow control).
    pub fn open(config: &SerialConfig) -> Result<Self> {
        if config.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(config.baud_rate));
        }

        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(port = %config.port, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            name: config.port.clone(),
        })
    }

    /// The port name this transport was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.name)
            .finish()
    }
}

/// A serial port present on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// Short description of the port hardware ("usb 1a86:7523", "pci", ...).
    pub kind: String,
}

/// List the serial ports present on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            kind: describe_port_type(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => match &usb.product {
            Some(product) => format!("usb {:04x}:{:04x} {product}", usb.vid, usb.pid),
            None => format!("usb {:04x}:{:04x}", usb.vid, usb.pid),
        },
        SerialPortType::PciPort => "pci".to_string(),
        SerialPortType::BluetoothPort => "bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn config_defaults() {
        let cfg = SerialConfig::new("/dev/ttyUSB0");
        assert_eq!(cfg.port, "/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.timeout, Duration::from_secs(1));
    }

    #[test]
    fn zero_baud_rejected_before_open() {
        let cfg = SerialConfig {
            baud_rate: 0,
            ..SerialConfig::new("/dev/does-not-exist")
        };
        let err = SerialTransport::open(&cfg).unwrap_err();
        assert!(matches!(err, TransportError::InvalidBaudRate(0)));
    }

    #[test]
    fn open_missing_port_fails() {
        let cfg = SerialConfig::new("/dev/wtgahrs-missing-port");
        let err = SerialTransport::open(&cfg).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[test]
    fn describes_usb_ports() {
        let usb = SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x1a86,
            pid: 0x7523,
            serial_number: None,
            manufacturer: None,
            product: Some("CH340".to_string()),
        });
        assert_eq!(describe_port_type(&usb), "usb 1a86:7523 CH340");
        assert_eq!(describe_port_type(&SerialPortType::PciPort), "pci");
    }
}
