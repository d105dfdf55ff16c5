pub mod chip;
pub mod configuration;
pub mod device;
pub mod devices;
pub mod error;
pub mod properties;
pub mod registers;
pub mod usb;

pub use crate::chip::Chip;
pub use crate::devices::list_devices;
pub use crate::devices::open;
pub use crate::devices::Device;
pub use crate::devices::Error;
pub use crate::devices::Type;
pub use crate::registers::Register;

pub use bincode;
pub use gl843_types as types;
pub use libusb1_sys;
pub use rusb;
