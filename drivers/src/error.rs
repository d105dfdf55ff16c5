use crate::usb;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Usb(#[from] usb::Error),

    #[error("register id {0} is out of range")]
    RegisterOutOfRange(u16),

    #[error("table index {0} is out of range (indices start at 1)")]
    TableOutOfRange(u8),

    #[error("motor table has {0} entries, the chip holds at most 1020")]
    MotorTableLength(usize),

    #[error("bulk window length {0} does not fit in 32 bits")]
    BulkLength(usize),

    #[error("the analog frontend is still busy after {0} polls")]
    FrontendBusy(u32),
}

impl From<rusb::Error> for Error {
    fn from(error: rusb::Error) -> Self {
        usb::Error::from(error).into()
    }
}

impl Error {
    /// Errors caused by invalid arguments rather than by the device.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::RegisterOutOfRange(_)
                | Self::TableOutOfRange(_)
                | Self::MotorTableLength(_)
                | Self::BulkLength(_)
        )
    }
}
