//! Serial device transport over termios.
//!
//! The port is put in raw mode with `VMIN = 0` and `VTIME` set from the read
//! timeout, so a read returns whatever arrived within the timeout or nothing.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::time::Duration;

use nix::sys::termios::{
    BaudRate, FlushArg, SetArg, SpecialCharacterIndices, cfmakeraw, cfsetspeed, tcflush,
    tcgetattr, tcsetattr,
};
use venitrain_traits::{ReadOutcome, Transport};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const READ_BUF_BYTES: usize = 512;

/// Map a numeric baud rate to the termios constant.
pub fn baud_rate(baud: u32) -> Result<BaudRate, HwError> {
    Ok(match baud {
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115200 => BaudRate::B115200,
        other => return Err(HwError::UnsupportedBaud(other)),
    })
}

/// `VTIME` is in deciseconds, 1..=255.
fn vtime(timeout: Duration) -> u8 {
    let ds = timeout.as_millis().div_ceil(100).clamp(1, 255);
    u8::try_from(ds).unwrap_or(u8::MAX)
}

#[derive(Debug)]
pub struct TtyTransport {
    path: PathBuf,
    baud: u32,
    read_timeout: Duration,
    file: Option<File>,
}

impl TtyTransport {
    pub fn new(path: impl Into<PathBuf>, baud: u32, read_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud,
            read_timeout,
            file: None,
        }
    }

    fn configure(&self, file: &File) -> Result<(), HwError> {
        let speed = baud_rate(self.baud)?;
        let nix_err = |e: nix::Error| HwError::Device(format!("termios: {e}"));
        let mut t = tcgetattr(file).map_err(nix_err)?;
        cfmakeraw(&mut t);
        cfsetspeed(&mut t, speed).map_err(nix_err)?;
        t.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        t.control_chars[SpecialCharacterIndices::VTIME as usize] = vtime(self.read_timeout);
        tcsetattr(file, SetArg::TCSANOW, &t).map_err(nix_err)?;
        // Drop whatever the device sent before we were listening.
        tcflush(file, FlushArg::TCIFLUSH).map_err(nix_err)?;
        Ok(())
    }
}

impl Transport for TtyTransport {
    fn open(&mut self) -> Result<(), BoxError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(HwError::from)?;
        self.configure(&file)?;
        tracing::info!(path = %self.path.display(), baud = self.baud, "serial port opened");
        self.file = Some(file);
        Ok(())
    }

    fn read(&mut self, _timeout: Duration) -> Result<ReadOutcome, BoxError> {
        let file = self.file.as_mut().ok_or(HwError::NotOpen)?;
        let mut buf = [0u8; READ_BUF_BYTES];
        match file.read(&mut buf) {
            Ok(0) => Ok(ReadOutcome::Idle),
            Ok(n) => Ok(ReadOutcome::Data(buf[..n].to_vec())),
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                Ok(ReadOutcome::Idle)
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "serial read failed");
                Err(Box::new(HwError::Io(e)))
            }
        }
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if self.file.take().is_some() {
            tracing::info!(path = %self.path.display(), "serial port closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_baud_rates_map() {
        assert!(baud_rate(9600).is_ok());
        assert!(baud_rate(115200).is_ok());
        assert!(matches!(baud_rate(300), Err(HwError::UnsupportedBaud(300))));
    }

    #[test]
    fn vtime_is_clamped_deciseconds() {
        assert_eq!(vtime(Duration::from_millis(1)), 1);
        assert_eq!(vtime(Duration::from_millis(100)), 1);
        assert_eq!(vtime(Duration::from_millis(250)), 3);
        assert_eq!(vtime(Duration::from_secs(60)), 255);
    }

    #[test]
    fn missing_device_fails_to_open() {
        let mut t = TtyTransport::new("/dev/venitrain-does-not-exist", 9600, Duration::from_millis(100));
        assert!(t.open().is_err());
        assert!(t.read(Duration::from_millis(1)).is_err());
    }
}
