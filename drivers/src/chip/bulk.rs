use crate::chip::Chip;
use crate::error;
use crate::registers::Register;
use crate::types;
use crate::usb;

/// Size of a shading block on the wire.
pub const SHADING_BLOCK_SIZE: usize = 512;

/// Bytes of a shading block that carry data, the chip drops the rest.
pub const SHADING_BLOCK_PAYLOAD: usize = 504;

const MOTOR_TABLE_GRANULARITY: u32 = 2048;
const GAMMA_TABLE_GRANULARITY: u32 = 256;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    In = 0,
    Out = 1,
}

/// Number of bytes announced to the chip for `length` bytes of shading data.
///
/// At least one padded block is announced, even for an empty payload.
pub fn shading_padded_length(length: usize) -> usize {
    length
        + length.div_ceil(SHADING_BLOCK_PAYLOAD).max(1)
            * (SHADING_BLOCK_SIZE - SHADING_BLOCK_PAYLOAD)
}

pub fn host_is_big_endian() -> bool {
    cfg!(target_endian = "big")
}

/// Swaps the two bytes of every 16-bit sample in place. Applying it twice restores the input.
///
/// A trailing odd byte is left untouched.
pub fn swap_byte_pairs(bytes: &mut [u8]) {
    for pair in bytes.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

/// Serializes words in the chip's byte order (little-endian) on any host.
fn little_endian_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

impl<Handle: usb::Transport> Chip<Handle> {
    /// Prepares the chip's RAM window for the next bulk transfer.
    ///
    /// `port` is the buffer register (GMMWRDATA, RAMWRDATA or RAMRDDATA).
    pub fn setup_bulk_window(
        &mut self,
        port: Register,
        direction: Direction,
        length: usize,
    ) -> Result<(), error::Error> {
        let address = self
            .map
            .fields(port)
            .and_then(|fields| fields.first())
            .ok_or(error::Error::RegisterOutOfRange(port.id()))?
            .address;
        let length_bytes = u32::try_from(length)
            .map_err(|_| error::Error::BulkLength(length))?
            .to_le_bytes();
        tracing::debug!(%port, ?direction, length, "bulk window");
        self.select(address, self.configuration.bulk_setup_timeout)?;
        usb::control_out(
            &self.handle,
            &self.configuration,
            usb::REQUEST_BUFFER,
            usb::VALUE_BUFFER,
            &[
                direction as u8,
                0x00,
                usb::VALUE_BUFFER as u8,
                0x00,
                length_bytes[0],
                length_bytes[1],
                length_bytes[2],
                length_bytes[3],
            ],
            self.configuration.bulk_setup_timeout,
        )?;
        Ok(())
    }

    /// Uploads a motor acceleration table. Tables are numbered from 1.
    ///
    /// The words are sent little-endian whatever the host byte order.
    pub fn upload_motor_table(&mut self, table: u8, entries: &[u16]) -> Result<(), error::Error> {
        tracing::debug!(table, entries = entries.len(), "motor table");
        if entries.len() > types::MOTOR_TABLE_LENGTH {
            tracing::error!("{}", error::Error::MotorTableLength(entries.len()));
            return Err(error::Error::MotorTableLength(entries.len()));
        }
        self.upload_table(table, MOTOR_TABLE_GRANULARITY, &little_endian_bytes(entries))
    }

    /// Uploads a gamma table. Tables are numbered from 1.
    pub fn upload_gamma_table(&mut self, table: u8, entries: &[u8]) -> Result<(), error::Error> {
        tracing::debug!(table, entries = entries.len(), "gamma table");
        self.upload_table(table, GAMMA_TABLE_GRANULARITY, entries)
    }

    fn upload_table(
        &mut self,
        table: u8,
        granularity: u32,
        bytes: &[u8],
    ) -> Result<(), error::Error> {
        if table == 0 {
            tracing::error!("{}", error::Error::TableOutOfRange(table));
            return Err(error::Error::TableOutOfRange(table));
        }
        self.set(Register::MTRTBL, 1);
        self.set(Register::GMMADDR, (table as u32 - 1) * granularity);
        self.flush()?;
        self.setup_bulk_window(Register::GMMWRDATA, Direction::Out, bytes.len())?;
        usb::bulk_out(
            &self.handle,
            &self.configuration,
            bytes,
            self.configuration.table_timeout,
        )?;
        self.set(Register::MTRTBL, 0);
        self.set(Register::GMMADDR, 0);
        self.flush()
    }

    /// Uploads shading reference data to the chip's RAM at `address`.
    ///
    /// The data is sent little-endian in 512 bytes blocks, each carrying 504 bytes of data.
    pub fn upload_shading(&mut self, address: u32, data: &[u16]) -> Result<(), error::Error> {
        let bytes = little_endian_bytes(data);
        let padded_length = shading_padded_length(bytes.len());
        tracing::debug!(
            address,
            length = bytes.len(),
            padding = padded_length - bytes.len(),
            "shading"
        );
        self.write(Register::RAMADDR, address)?;
        self.setup_bulk_window(Register::RAMWRDATA, Direction::Out, padded_length)?;
        let mut block = [0u8; SHADING_BLOCK_SIZE];
        let mut payloads = bytes.chunks(SHADING_BLOCK_PAYLOAD);
        let mut remaining = padded_length;
        while remaining > 0 {
            let payload = payloads.next().unwrap_or(&[]);
            block[..payload.len()].copy_from_slice(payload);
            block[payload.len()..].fill(0);
            usb::bulk_out(
                &self.handle,
                &self.configuration,
                &block,
                self.configuration.shading_timeout,
            )?;
            remaining = remaining.saturating_sub(SHADING_BLOCK_SIZE);
        }
        Ok(())
    }

    /// Reads one chunk of scan data into `buffer` and returns the number of bytes received.
    ///
    /// Samples of 16-bit formats are converted to host order.
    pub fn read_line(
        &mut self,
        buffer: &mut [u8],
        format: types::PixelFormat,
        timeout: std::time::Duration,
    ) -> Result<usize, error::Error> {
        self.write(Register::RAMADDR, 0)?;
        self.setup_bulk_window(Register::RAMRDDATA, Direction::In, buffer.len())?;
        let read = usb::bulk_in(&self.handle, &self.configuration, buffer, timeout)?;
        tracing::debug!(requested = buffer.len(), read, "line");
        if host_is_big_endian() && format.has_16_bit_samples() {
            swap_byte_pairs(&mut buffer[..read]);
        }
        Ok(read)
    }
}
