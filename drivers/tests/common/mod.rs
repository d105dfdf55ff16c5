#![allow(dead_code)]

use gl843_drivers::configuration::Configuration;
use gl843_drivers::usb;
use gl843_drivers::Chip;
use std::cell::RefCell;
use std::rc::Rc;

/// Bus transactions recorded by the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Select(u8),
    Read { address: u8, value: u8 },
    Write { address: u8, value: u8 },
    BulkSetup([u8; 8]),
    BulkOut { endpoint: u8, data: Vec<u8> },
    BulkIn { endpoint: u8, length: usize },
}

struct State {
    registers: [u8; 256],
    selected: Option<u8>,
    operations: Vec<Operation>,
    calls: usize,
    interrupted: u32,
    next_error: Option<rusb::Error>,
    fail_write_address: Option<u8>,
    busy_reads: u32,
    bulk_in: Vec<u8>,
}

/// Simulated GL843 bus. Clones share their state, so a test can keep one
/// clone to inspect what the chip driver did with the other.
#[derive(Clone)]
pub struct MockTransport {
    state: Rc<RefCell<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                registers: [0; 256],
                selected: None,
                operations: Vec::new(),
                calls: 0,
                interrupted: 0,
                next_error: None,
                fail_write_address: None,
                busy_reads: 0,
                bulk_in: Vec::new(),
            })),
        }
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Buffered register writes, as (address, value).
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|operation| match operation {
                Operation::Write { address, value } => Some((*address, *value)),
                _ => None,
            })
            .collect()
    }

    /// Addresses of register reads.
    pub fn reads(&self) -> Vec<u8> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|operation| match operation {
                Operation::Read { address, .. } => Some(*address),
                _ => None,
            })
            .collect()
    }

    pub fn register(&self, address: u8) -> u8 {
        self.state.borrow().registers[address as usize]
    }

    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers[address as usize] = value;
    }

    /// Number of transport calls, including failed ones.
    pub fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    /// The next `count` calls fail with `rusb::Error::Interrupted`.
    pub fn interrupt_next(&self, count: u32) {
        self.state.borrow_mut().interrupted = count;
    }

    /// The next call fails with `error`.
    pub fn fail_next(&self, error: rusb::Error) {
        self.state.borrow_mut().next_error = Some(error);
    }

    /// Buffered writes to `address` fail with `rusb::Error::Pipe`.
    pub fn fail_writes_to(&self, address: u8) {
        self.state.borrow_mut().fail_write_address = Some(address);
    }

    /// The next `count` reads of register 0x41 report FEBUSY.
    pub fn set_busy_reads(&self, count: u32) {
        self.state.borrow_mut().busy_reads = count;
    }

    /// Data returned by bulk reads.
    pub fn set_bulk_in(&self, data: Vec<u8>) {
        self.state.borrow_mut().bulk_in = data;
    }

    fn begin(&self) -> rusb::Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        if state.interrupted > 0 {
            state.interrupted -= 1;
            return Err(rusb::Error::Interrupted);
        }
        match state.next_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl usb::Transport for MockTransport {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        _index: u16,
        buffer: &[u8],
        _timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        self.begin()?;
        assert_eq!(request_type, usb::REQUEST_TYPE_OUT);
        let mut state = self.state.borrow_mut();
        match (request, value, buffer) {
            (usb::REQUEST_REGISTER, usb::VALUE_SET_REGISTER, [address]) => {
                state.selected = Some(*address);
                state.operations.push(Operation::Select(*address));
            }
            (usb::REQUEST_BUFFER, usb::VALUE_SET_REGISTER, [address, value]) => {
                if state.fail_write_address == Some(*address) {
                    return Err(rusb::Error::Pipe);
                }
                state.registers[*address as usize] = *value;
                state.operations.push(Operation::Write {
                    address: *address,
                    value: *value,
                });
            }
            (usb::REQUEST_BUFFER, usb::VALUE_BUFFER, record) => {
                let record: [u8; 8] = record.try_into().map_err(|_| rusb::Error::InvalidParam)?;
                state.operations.push(Operation::BulkSetup(record));
            }
            _ => return Err(rusb::Error::NotSupported),
        }
        Ok(buffer.len())
    }

    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        _index: u16,
        buffer: &mut [u8],
        _timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        self.begin()?;
        assert_eq!(request_type, usb::REQUEST_TYPE_IN);
        assert_eq!(request, usb::REQUEST_REGISTER);
        assert_eq!(value, usb::VALUE_READ_REGISTER);
        let mut state = self.state.borrow_mut();
        let address = state.selected.ok_or(rusb::Error::Io)?;
        let mut register = state.registers[address as usize];
        if address == 0x41 && state.busy_reads > 0 {
            state.busy_reads -= 1;
            register |= 0x02;
        }
        buffer[0] = register;
        state.operations.push(Operation::Read {
            address,
            value: register,
        });
        Ok(1)
    }

    fn write_bulk(
        &self,
        endpoint: u8,
        buffer: &[u8],
        _timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        self.begin()?;
        self.state.borrow_mut().operations.push(Operation::BulkOut {
            endpoint,
            data: buffer.to_vec(),
        });
        Ok(buffer.len())
    }

    fn read_bulk(
        &self,
        endpoint: u8,
        buffer: &mut [u8],
        _timeout: std::time::Duration,
    ) -> rusb::Result<usize> {
        self.begin()?;
        let mut state = self.state.borrow_mut();
        let length = buffer.len().min(state.bulk_in.len());
        buffer[..length].copy_from_slice(&state.bulk_in[..length]);
        state.operations.push(Operation::BulkIn {
            endpoint,
            length: buffer.len(),
        });
        Ok(length)
    }
}

pub fn configuration() -> Configuration {
    Configuration {
        interrupted_pause: std::time::Duration::ZERO,
        ..Configuration::DEFAULT
    }
}

pub fn chip() -> (Chip<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    (Chip::new(transport.clone(), configuration()), transport)
}
