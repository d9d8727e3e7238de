//! Serial monitor: decodes the sensor stream by hand, carrying the leftover
//! bytes of each pass into the next read.
//!
//! Run with:
//!   cargo run --example serial-monitor -- /dev/ttyUSB0 9600

use std::io::{ErrorKind, Read};

use wtgahrs::frame::decode;
use wtgahrs::transport::{SerialConfig, SerialTransport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let mut config = SerialConfig::new(port);
    if let Some(baud) = args.next() {
        config.baud_rate = baud.parse()?;
    }

    let mut serial = SerialTransport::open(&config)?;
    eprintln!("Reading {} at {} baud", serial.name(), config.baud_rate);

    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 256];

    loop {
        let n = match serial.read(&mut chunk) {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => continue,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        pending.extend_from_slice(&chunk[..n]);

        let (records, remainder) = decode(&pending).into_parts();

        if let Some(acc) = records.acceleration() {
            println!("acc  [{:8.3}, {:8.3}, {:8.3}] m/s²", acc[0], acc[1], acc[2]);
        }
        if let Some(gyro) = records.angular_velocity() {
            println!("gyro [{:8.2}, {:8.2}, {:8.2}] deg/s", gyro[0], gyro[1], gyro[2]);
        }
        if let Some(angles) = records.angles() {
            println!(
                "ang  [{:8.2}, {:8.2}, {:8.2}] deg",
                angles[0], angles[1], angles[2]
            );
        }
        if let Some(mag) = records.magnetic_field() {
            println!("mag  [{:8.3}, {:8.3}, {:8.3}]", mag[0], mag[1], mag[2]);
        }
        if let Some([pressure, altitude]) = records.pressure_altitude() {
            println!("baro {pressure:.0} Pa, {altitude:.2} m");
        }
        if let Some([lon, lat]) = records.lon_lat() {
            println!("gps  {lon:.7}, {lat:.7}");
        }
        if let Some(hyv) = records.height_yaw_velocity() {
            println!(
                "gps  height {} yaw {} speed {}",
                hyv.height, hyv.yaw, hyv.velocity
            );
        }

        pending = remainder.to_vec();
    }
}
