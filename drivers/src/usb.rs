use crate::configuration;

/// Vendor request, host to device.
pub const REQUEST_TYPE_OUT: u8 = 0x40;

/// Vendor request, device to host.
pub const REQUEST_TYPE_IN: u8 = 0xc0;

pub const REQUEST_REGISTER: u8 = 0x0c;
pub const REQUEST_BUFFER: u8 = 0x04;

pub const VALUE_BUFFER: u16 = 0x82;
pub const VALUE_SET_REGISTER: u16 = 0x83;
pub const VALUE_READ_REGISTER: u16 = 0x84;

pub const ENDPOINT_OUT: u8 = 2 | libusb1_sys::constants::LIBUSB_ENDPOINT_OUT;
pub const ENDPOINT_IN: u8 = 1 | libusb1_sys::constants::LIBUSB_ENDPOINT_IN;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Rusb(#[from] rusb::Error),

    #[error("device with name not found")]
    Name(String),

    #[error("device not found")]
    Device,

    #[error("short write ({requested} bytes requested, {written} bytes written)")]
    ShortWrite { requested: usize, written: usize },

    #[error("short read ({requested} bytes requested, {read} bytes read)")]
    ShortRead { requested: usize, read: usize },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Speed {
    Unknown,
    Low,
    Full,
    High,
    Super,
    SuperPlus,
}

impl From<rusb::Speed> for Speed {
    fn from(speed: rusb::Speed) -> Self {
        match speed {
            rusb::Speed::Low => Self::Low,
            rusb::Speed::Full => Self::Full,
            rusb::Speed::High => Self::High,
            rusb::Speed::Super => Self::Super,
            rusb::Speed::SuperPlus => Self::SuperPlus,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for Speed {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Self::Unknown => "USB Unknown speed",
            Self::Low => "USB 1.0 Low Speed (1.5 Mb/s)",
            Self::Full => "USB 1.1 Full Speed (12 Mb/s)",
            Self::High => "USB 2.0 High Speed (480 Mb/s)",
            Self::Super => "USB 3.0 SuperSpeed (5.0 Gb/s)",
            Self::SuperPlus => "USB 3.1 SuperSpeed+ (10.0 Gb/s)",
        })
    }
}

/// Timed USB transfers on an open device.
///
/// This is the subset of `rusb::DeviceHandle` used by the chip driver.
/// Implementing it for another type lets the register layer run without hardware.
pub trait Transport {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &[u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize>;

    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &mut [u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize>;

    fn write_bulk(
        &self,
        endpoint: u8,
        buffer: &[u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize>;

    fn read_bulk(
        &self,
        endpoint: u8,
        buffer: &mut [u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize>;
}

impl<Context: rusb::UsbContext> Transport for rusb::DeviceHandle<Context> {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &[u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        rusb::DeviceHandle::<Context>::write_control(
            self,
            request_type,
            request,
            value,
            index,
            buffer,
            timeout,
        )
    }

    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buffer: &mut [u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        rusb::DeviceHandle::<Context>::read_control(
            self,
            request_type,
            request,
            value,
            index,
            buffer,
            timeout,
        )
    }

    fn write_bulk(
        &self,
        endpoint: u8,
        buffer: &[u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        rusb::DeviceHandle::<Context>::write_bulk(self, endpoint, buffer, timeout)
    }

    fn read_bulk(
        &self,
        endpoint: u8,
        buffer: &mut [u8],
        timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        rusb::DeviceHandle::<Context>::read_bulk(self, endpoint, buffer, timeout)
    }
}

/// Calls `transfer` until it returns something other than `rusb::Error::Interrupted`.
///
/// `attempts` bounds the total number of calls (0 behaves like 1).
/// Every other error is returned after the first occurrence.
pub fn retry_interrupted<T, Transfer>(
    attempts: u32,
    pause: Option<std::time::Duration>,
    mut transfer: Transfer,
) -> rusb::Result<T>
where
    Transfer: FnMut() -> rusb::Result<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match transfer() {
            Err(rusb::Error::Interrupted) if attempt < attempts => {
                attempt += 1;
                if let Some(pause) = pause {
                    std::thread::sleep(pause);
                }
            }
            result => return result,
        }
    }
}

pub fn control_out<Handle: Transport + ?Sized>(
    handle: &Handle,
    configuration: &configuration::Configuration,
    request: u8,
    value: u16,
    buffer: &[u8],
    timeout: std::time::Duration,
) -> Result<(), Error> {
    let written = retry_interrupted(
        configuration.interrupted_attempts,
        Some(configuration.interrupted_pause),
        || handle.write_control(REQUEST_TYPE_OUT, request, value, 0, buffer, timeout),
    )?;
    if written != buffer.len() {
        return Err(Error::ShortWrite {
            requested: buffer.len(),
            written,
        });
    }
    Ok(())
}

pub fn control_in<Handle: Transport + ?Sized>(
    handle: &Handle,
    configuration: &configuration::Configuration,
    request: u8,
    value: u16,
    buffer: &mut [u8],
    timeout: std::time::Duration,
) -> Result<(), Error> {
    let requested = buffer.len();
    let read = retry_interrupted(
        configuration.interrupted_attempts,
        Some(configuration.interrupted_pause),
        || handle.read_control(REQUEST_TYPE_IN, request, value, 0, buffer, timeout),
    )?;
    if read != requested {
        return Err(Error::ShortRead { requested, read });
    }
    Ok(())
}

pub fn bulk_out<Handle: Transport + ?Sized>(
    handle: &Handle,
    configuration: &configuration::Configuration,
    buffer: &[u8],
    timeout: std::time::Duration,
) -> Result<(), Error> {
    let written = retry_interrupted(configuration.interrupted_attempts, None, || {
        handle.write_bulk(ENDPOINT_OUT, buffer, timeout)
    })?;
    if written != buffer.len() {
        return Err(Error::ShortWrite {
            requested: buffer.len(),
            written,
        });
    }
    Ok(())
}

/// Returns the number of bytes read, which may be smaller than the buffer.
pub fn bulk_in<Handle: Transport + ?Sized>(
    handle: &Handle,
    configuration: &configuration::Configuration,
    buffer: &mut [u8],
    timeout: std::time::Duration,
) -> Result<usize, Error> {
    Ok(retry_interrupted(configuration.interrupted_attempts, None, || {
        handle.read_bulk(ENDPOINT_IN, buffer, timeout)
    })?)
}
