use crate::chip;
use crate::configuration;
use crate::device;
use crate::device::Usb;
use crate::properties;
use crate::usb;

macro_rules! register {
    ($($module:ident),+) => {
        paste::paste! {
            $(
                pub mod $module;
            )+

            #[derive(Debug, Copy, Clone, PartialEq, Eq)]
            pub enum Type {
                $(
                    [<$module:camel>],
                )+
            }

            impl std::fmt::Display for Type {
                fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    match self {
                        $(
                            Self::[<$module:camel>] => write!(formatter, stringify!($module)),
                        )+
                    }
                }
            }

            impl Type {
                pub fn model(self) -> &'static str  {
                    match self {
                        $(
                            Type::[<$module:camel>] => $module::Device::PROPERTIES.model,
                        )+
                    }
                }

                pub fn properties(self) -> properties::Scanner {
                    match self {
                        $(
                            Type::[<$module:camel>] => $module::Device::PROPERTIES,
                        )+
                    }
                }

                pub fn default_configuration(self) -> configuration::Configuration {
                    match self {
                        $(
                            Type::[<$module:camel>] => $module::Device::DEFAULT_CONFIGURATION,
                        )+
                    }
                }
            }

            pub enum Device {
                $(
                    [<$module:camel>]($module::Device),
                )+
            }

            pub struct ListedDevice {
                pub device_type: Type,
                pub speed: usb::Speed,
                pub name: String,
            }

            pub fn list_devices() -> rusb::Result<Vec<ListedDevice>> {
                let context = rusb::Context::new()?;
                let devices = rusb::UsbContext::devices(&context)?;
                let mut result = Vec::new();
                $(
                    result.extend(
                        $module::Device::list_names_and_speeds(&devices)
                            .into_iter()
                            .map(|(name, speed)| ListedDevice {
                                device_type: Type::[<$module:camel>],
                                speed,
                                name,
                            }),
                    );
                )+
                Ok(result)
            }

            /// Opens the first supported scanner, or the one called `name`.
            ///
            /// Each device type uses its default configuration if `configuration` is `None`.
            pub fn open(
                name: Option<&str>,
                configuration: Option<configuration::Configuration>,
            ) -> Result<Device, Error> {
                let context = rusb::Context::new().map_err(usb::Error::from)?;
                $(
                    match $module::Device::open(
                        &name,
                        configuration
                            .clone()
                            .unwrap_or($module::Device::DEFAULT_CONFIGURATION),
                        &context,
                    ) {
                        Ok(device) => return Ok(Device::[<$module:camel>](device)),
                        Err(error) => match Error::from(error).unpack() {
                            Error::DeviceWithName { device_type: _, name: _ } => (),
                            Error::Device(_) => (),
                            error => return Err(error),
                        }
                    };
                )+
                Err(match name {
                    Some(name) => Error::Name(name.to_owned()),
                    None => Error::NoDevice,
                })
            }

            impl Device {
                pub fn device_type(&self) -> Type {
                    match self {
                        $(
                            Self::[<$module:camel>](_) => Type::[<$module:camel>],
                        )+
                    }
                }

                pub fn properties(&self) -> properties::Scanner {
                    self.device_type().properties()
                }

                pub fn name(&self) -> String {
                    match self {
                        $(
                            Self::[<$module:camel>](device) => device.name(),
                        )+
                    }
                }

                pub fn speed(&self) -> usb::Speed {
                    match self {
                        $(
                            Self::[<$module:camel>](device) => device.speed(),
                        )+
                    }
                }

                pub fn chip(&mut self) -> &mut chip::Chip<device::Handle> {
                    match self {
                        $(
                            Self::[<$module:camel>](device) => device.chip(),
                        )+
                    }
                }
            }

            #[derive(Debug, PartialEq, Eq)]
            pub struct ParseTypeError {
                on: String
            }

            impl std::fmt::Display for ParseTypeError {
                fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    write!(formatter, "unknown device type \"{}\"", self.on)
                }
            }

            impl std::error::Error for ParseTypeError {}

            impl std::str::FromStr for Type {
                type Err = ParseTypeError;

                fn from_str(string: &str) -> Result<Self, Self::Err> {
                    match string {
                        $(
                            stringify!($module) => Ok(Self::[<$module:camel>]),
                        )+
                        _ => Err(Self::Err {on: string.to_owned()}),
                    }
                }
            }

            #[derive(thiserror::Error, Debug, Clone)]
            pub enum Error {
                #[error(transparent)]
                Usb(#[from] usb::Error),

                #[error("{device_type} with name \"{name}\" not found")]
                DeviceWithName { device_type: Type, name: String },

                #[error("no {0} found")]
                Device(Type),

                #[error("name \"{0}\" not found")]
                Name(String),

                #[error("no device found")]
                NoDevice,

                $(
                    #[error(transparent)]
                    [<$module:camel>](#[from] $module::Error),
                )+
            }

            impl Error {
                /// Replaces "not found" errors with errors that name the device type.
                pub fn unpack(self) -> Self {
                    match self {
                        $(
                            Self::[<$module:camel>](error) => {
                                match error {
                                    $module::Error::Usb(error) => match error {
                                        usb::Error::Name(name) => Self::DeviceWithName {
                                            device_type: Type::[<$module:camel>],
                                            name,
                                        },
                                        usb::Error::Device => Self::Device(Type::[<$module:camel>]),
                                        error => Self::[<$module:camel>]($module::Error::Usb(error)),
                                    },
                                    #[allow(unreachable_patterns)]
                                    error => Self::[<$module:camel>](error)
                                }
                            }
                        )+
                        error => error
                    }
                }
            }
        }
    };
}

register! { canoscan_4400f }
