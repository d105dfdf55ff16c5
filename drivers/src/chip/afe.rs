use crate::chip::Chip;
use crate::error;
use crate::registers::Register;
use crate::usb;

impl<Handle: usb::Transport> Chip<Handle> {
    /// Writes a register of the analog frontend.
    ///
    /// FEBUSY is read from the hardware up to `frontend_busy_polls` times.
    /// If it never clears, nothing is written and `Error::FrontendBusy` is returned.
    pub fn write_afe(&mut self, address: u8, value: u16) -> Result<(), error::Error> {
        tracing::debug!(address, value, "analog frontend write");
        let polls = self.configuration.frontend_busy_polls;
        let mut busy = true;
        for _ in 0..polls {
            if self.get_fresh(Register::FEBUSY)? == 0 {
                busy = false;
                break;
            }
        }
        if busy {
            tracing::error!(address, polls, "the analog frontend is busy");
            return Err(error::Error::FrontendBusy(polls));
        }
        self.write(Register::FEWRA, address as u32)?;
        self.write(Register::FEWRDATA, value as u32)
    }
}
