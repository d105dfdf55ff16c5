pub mod afe;
pub mod bulk;

use crate::configuration;
use crate::error;
use crate::registers;
use crate::registers::Register;
use crate::usb;

#[derive(Debug, Default, Copy, Clone)]
struct IoRegister {
    value: u8,

    /// Bits that are stale relative to the hardware.
    dirty: u8,
}

/// Register cache of one open GL843 connection.
///
/// `set` only touches the cache and widens the dirty interval.
/// `flush` writes back every dirty physical register once, and `refresh` reads the ones backing the named registers.
/// The chip is not synchronized, callers must serialize access.
pub struct Chip<Handle: usb::Transport> {
    handle: Handle,
    map: &'static registers::RegisterMap,
    io: [IoRegister; registers::IO_REGISTERS],
    min_dirty: usize,
    max_dirty: usize,
    configuration: configuration::Configuration,
}

impl<Handle: usb::Transport> Chip<Handle> {
    pub fn new(handle: Handle, configuration: configuration::Configuration) -> Self {
        Self::with_map(handle, registers::gl843(), configuration)
    }

    pub fn with_map(
        handle: Handle,
        map: &'static registers::RegisterMap,
        configuration: configuration::Configuration,
    ) -> Self {
        Self {
            handle,
            map,
            io: [IoRegister::default(); registers::IO_REGISTERS],
            min_dirty: registers::IO_REGISTERS,
            max_dirty: 0,
            configuration,
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn configuration(&self) -> &configuration::Configuration {
        &self.configuration
    }

    pub fn map(&self) -> &'static registers::RegisterMap {
        self.map
    }

    pub fn try_get(&self, register: Register) -> Result<u32, error::Error> {
        let fields = self
            .map
            .fields(register)
            .ok_or(error::Error::RegisterOutOfRange(register.id()))?;
        Ok(fields.iter().fold(0u32, |value, field| {
            value | field.extract(self.io[field.address as usize].value)
        }))
    }

    /// Returns the cached value of a register.
    ///
    /// An invalid id is a programming error, it is logged with the caller's location and 0 is returned.
    #[track_caller]
    pub fn get(&self, register: Register) -> u32 {
        match self.try_get(register) {
            Ok(value) => value,
            Err(error) => {
                let location = std::panic::Location::caller();
                tracing::error!(%location, "{error}");
                0
            }
        }
    }

    /// Updates the cache and marks the register's bits dirty.
    ///
    /// Bits of `value` outside the register's fields are dropped.
    #[track_caller]
    pub fn set(&mut self, register: Register, value: u32) {
        let map = self.map;
        let Some(fields) = map.fields(register) else {
            let location = std::panic::Location::caller();
            tracing::error!(
                %location,
                "{}",
                error::Error::RegisterOutOfRange(register.id())
            );
            return;
        };
        tracing::trace!(%register, value, "set");
        for field in fields {
            let io = &mut self.io[field.address as usize];
            io.value = field.insert(io.value, value);
            self.mark_io_dirty(field.address, field.mask);
        }
    }

    /// Applies `set` to every entry, in order.
    #[track_caller]
    pub fn set_many(&mut self, values: &[(Register, u32)]) {
        for (register, value) in values {
            self.set(*register, *value);
        }
    }

    /// Marks the register's bits dirty without changing the cache.
    #[track_caller]
    pub fn mark_dirty(&mut self, register: Register) {
        let map = self.map;
        match map.fields(register) {
            Some(fields) => {
                for field in fields {
                    self.mark_io_dirty(field.address, field.mask);
                }
            }
            None => {
                let location = std::panic::Location::caller();
                tracing::error!(
                    %location,
                    "{}",
                    error::Error::RegisterOutOfRange(register.id())
                );
            }
        }
    }

    fn mark_io_dirty(&mut self, address: u8, mask: u8) {
        let address = address as usize;
        self.io[address].dirty |= mask;
        self.min_dirty = self.min_dirty.min(address);
        self.max_dirty = self.max_dirty.max(address);
    }

    /// Addresses that may hold dirty bits, `None` if no register is dirty.
    pub fn dirty_range(&self) -> Option<std::ops::RangeInclusive<u8>> {
        if self.min_dirty > self.max_dirty {
            None
        } else {
            Some(self.min_dirty as u8..=self.max_dirty as u8)
        }
    }

    pub fn cached(&self, address: u8) -> u8 {
        self.io[address as usize].value
    }

    pub fn is_dirty(&self, address: u8) -> bool {
        self.io[address as usize].dirty != 0
    }

    /// Writes every dirty physical register, one transaction per address.
    ///
    /// The dirty interval is reset even if a transfer fails.
    /// In that case the registers left in the interval are dropped from the write-back:
    /// their cached values were never sent, so the cache no longer matches the chip
    /// for these addresses until they are set or refreshed again.
    pub fn flush(&mut self) -> Result<(), error::Error> {
        let mut result = Ok(());
        if let Some(range) = self.dirty_range() {
            for address in range.clone() {
                if self.io[address as usize].dirty == 0 {
                    continue;
                }
                if let Err(error) = self.write_io_register(address) {
                    result = Err(error);
                    break;
                }
            }
            if result.is_err() {
                let mut dropped = Vec::new();
                for address in range {
                    let io = &mut self.io[address as usize];
                    if io.dirty != 0 {
                        io.dirty = 0;
                        dropped.push(Register::io(address).to_string());
                    }
                }
                tracing::warn!(
                    ?dropped,
                    "flush aborted, the cache does not match the chip for the dropped registers"
                );
            }
        }
        self.min_dirty = registers::IO_REGISTERS;
        self.max_dirty = 0;
        result
    }

    /// Reads the physical registers backing `registers`, one transaction per address, in ascending order.
    ///
    /// Only the bits of the named registers are replaced by the hardware values.
    /// Pending writes to other bits, and the dirty interval, are left untouched.
    #[track_caller]
    pub fn refresh(&mut self, registers: &[Register]) -> Result<(), error::Error> {
        let map = self.map;
        let mut requested = [0u8; registers::IO_REGISTERS];
        for register in registers {
            match map.fields(*register) {
                Some(fields) => {
                    for field in fields {
                        requested[field.address as usize] |= field.mask;
                    }
                }
                None => {
                    let location = std::panic::Location::caller();
                    tracing::error!(
                        %location,
                        "{}",
                        error::Error::RegisterOutOfRange(register.id())
                    );
                }
            }
        }
        for (address, mask) in requested.iter().enumerate() {
            if *mask != 0 {
                self.read_io_register(address as u8, *mask)?;
            }
        }
        Ok(())
    }

    /// Reads a register from the hardware and returns its value.
    #[track_caller]
    pub fn get_fresh(&mut self, register: Register) -> Result<u32, error::Error> {
        self.refresh(&[register])?;
        Ok(self.get(register))
    }

    /// `set` followed by `flush`.
    #[track_caller]
    pub fn write(&mut self, register: Register, value: u32) -> Result<(), error::Error> {
        self.set(register, value);
        self.flush()
    }

    #[track_caller]
    pub fn write_many(&mut self, values: &[(Register, u32)]) -> Result<(), error::Error> {
        self.set_many(values);
        self.flush()
    }

    /// Writes a physical register immediately, bypassing the dirty interval.
    pub fn write_io(&mut self, address: u8, value: u8) -> Result<(), error::Error> {
        self.io[address as usize].value = value;
        self.write_io_register(address)
    }

    pub fn lamp_is_on(&mut self) -> Result<bool, error::Error> {
        Ok(self.get_fresh(Register::LAMPSTS)? != 0)
    }

    pub fn is_home(&mut self) -> Result<bool, error::Error> {
        Ok(self.get_fresh(Register::HOMESNR)? != 0)
    }

    fn write_io_register(&mut self, address: u8) -> Result<(), error::Error> {
        let value = self.io[address as usize].value;
        tracing::trace!(register = %Register::io(address), value, "write");
        usb::control_out(
            &self.handle,
            &self.configuration,
            usb::REQUEST_BUFFER,
            usb::VALUE_SET_REGISTER,
            &[address, value],
            self.configuration.register_timeout,
        )?;
        self.io[address as usize].dirty = 0;
        Ok(())
    }

    /// Reads a physical register. The bits in `mask` take the hardware value and become clean,
    /// the other bits keep their cached value if they hold a pending write.
    fn read_io_register(&mut self, address: u8, mask: u8) -> Result<(), error::Error> {
        self.select(address, self.configuration.register_timeout)?;
        let mut buffer = [0u8; 1];
        usb::control_in(
            &self.handle,
            &self.configuration,
            usb::REQUEST_REGISTER,
            usb::VALUE_READ_REGISTER,
            &mut buffer,
            self.configuration.register_timeout,
        )?;
        tracing::trace!(register = %Register::io(address), value = buffer[0], "read");
        let io = &mut self.io[address as usize];
        let pending = io.dirty & !mask;
        io.value = (buffer[0] & !pending) | (io.value & pending);
        io.dirty = pending;
        Ok(())
    }

    /// Selects the physical register targeted by the next read or buffer transfer.
    fn select(&self, address: u8, timeout: std::time::Duration) -> Result<(), error::Error> {
        usb::control_out(
            &self.handle,
            &self.configuration,
            usb::REQUEST_REGISTER,
            usb::VALUE_SET_REGISTER,
            &[address],
            timeout,
        )?;
        Ok(())
    }
}
