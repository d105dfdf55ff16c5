use crate::chip;
use crate::configuration;
use crate::properties;
use crate::usb;
use rusb::UsbContext;

pub type Handle = rusb::DeviceHandle<rusb::Context>;

pub trait Usb: Sized {
    type Error;

    const VENDOR_ID: u16;

    const PRODUCT_ID: u16;

    const PROPERTIES: properties::Scanner;

    const DEFAULT_CONFIGURATION: configuration::Configuration;

    fn open(
        name: &Option<&str>,
        configuration: configuration::Configuration,
        context: &rusb::Context,
    ) -> Result<Self, Self::Error>;

    fn name(&self) -> String;

    fn speed(&self) -> usb::Speed;

    fn chip(&mut self) -> &mut chip::Chip<Handle>;

    /// Returns "<short name>:<bus>:<address>", for instance "cs4400f:001:005".
    fn device_name(device: &rusb::Device<rusb::Context>) -> String {
        format!(
            "{}:{:03}:{:03}",
            Self::PROPERTIES.name,
            device.bus_number(),
            device.address()
        )
    }

    fn matches(device: &rusb::Device<rusb::Context>) -> bool {
        match device.device_descriptor() {
            Ok(descriptor) => {
                descriptor.vendor_id() == Self::VENDOR_ID
                    && descriptor.product_id() == Self::PRODUCT_ID
            }
            Err(_) => false,
        }
    }

    fn list_names_and_speeds(devices: &rusb::DeviceList<rusb::Context>) -> Vec<(String, usb::Speed)> {
        devices
            .iter()
            .filter(|device| Self::matches(device))
            .map(|device| (Self::device_name(&device), device.speed().into()))
            .collect()
    }

    fn handle_from_name(
        context: &rusb::Context,
        name: &Option<&str>,
    ) -> Result<(Handle, String), usb::Error> {
        let device = context.devices()?.iter().find(|device| {
            Self::matches(device)
                && match name {
                    Some(name) => *name == Self::device_name(device),
                    None => true,
                }
        });
        match device {
            Some(device) => {
                let device_name = Self::device_name(&device);
                Ok((device.open()?, device_name))
            }
            None => Err(match name {
                Some(name) => usb::Error::Name((*name).to_owned()),
                None => usb::Error::Device,
            }),
        }
    }
}
