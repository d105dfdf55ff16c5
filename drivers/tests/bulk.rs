mod common;

use common::Operation;
use gl843_drivers::chip::bulk;
use gl843_drivers::error::Error;
use gl843_drivers::registers::Register;
use gl843_drivers::types::{PixelFormat, MOTOR_TABLE_LENGTH};

#[test]
fn shading_padding() {
    assert_eq!(bulk::shading_padded_length(0), 8);
    assert_eq!(bulk::shading_padded_length(1), 9);
    assert_eq!(bulk::shading_padded_length(504), 512);
    assert_eq!(bulk::shading_padded_length(505), 521);
    assert_eq!(bulk::shading_padded_length(1000), 1016);
    assert_eq!(bulk::shading_padded_length(1008), 1024);
}

#[test]
fn swap_is_self_inverse() {
    let mut bytes = [1u8, 2, 3, 4, 5];
    bulk::swap_byte_pairs(&mut bytes);
    assert_eq!(bytes, [2, 1, 4, 3, 5]);
    bulk::swap_byte_pairs(&mut bytes);
    assert_eq!(bytes, [1, 2, 3, 4, 5]);
}

#[test]
fn bulk_window_record() {
    let (mut chip, transport) = common::chip();
    chip.setup_bulk_window(Register::RAMWRDATA, bulk::Direction::Out, 0x0102_0304)
        .unwrap();
    chip.setup_bulk_window(Register::RAMRDDATA, bulk::Direction::In, 10)
        .unwrap();
    assert_eq!(
        transport.operations(),
        vec![
            Operation::Select(0x3c),
            Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 0x04, 0x03, 0x02, 0x01]),
            Operation::Select(0x45),
            Operation::BulkSetup([0x00, 0x00, 0x82, 0x00, 10, 0, 0, 0]),
        ]
    );
}

#[cfg(target_pointer_width = "64")]
#[test]
fn bulk_window_length_must_fit_in_32_bits() {
    let (mut chip, transport) = common::chip();
    let length = u32::MAX as usize + 1;
    assert!(matches!(
        chip.setup_bulk_window(Register::RAMWRDATA, bulk::Direction::Out, length),
        Err(Error::BulkLength(invalid)) if invalid == length
    ));
    assert!(transport.operations().is_empty());
}

#[test]
fn motor_table_upload() {
    let (mut chip, transport) = common::chip();
    chip.upload_motor_table(2, &[0x1234, 0xabcd, 0x0001]).unwrap();
    assert_eq!(
        transport.operations(),
        vec![
            Operation::Write {
                address: 0x5b,
                value: 0x48
            },
            Operation::Write {
                address: 0x5c,
                value: 0x00
            },
            Operation::Select(0x28),
            Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 6, 0, 0, 0]),
            Operation::BulkOut {
                endpoint: 0x02,
                data: vec![0x34, 0x12, 0xcd, 0xab, 0x01, 0x00]
            },
            Operation::Write {
                address: 0x5b,
                value: 0x00
            },
            Operation::Write {
                address: 0x5c,
                value: 0x00
            },
        ]
    );
    assert!(chip.dirty_range().is_none());
}

#[test]
fn motor_tables_are_bounded() {
    let (mut chip, transport) = common::chip();
    let entries = vec![0u16; MOTOR_TABLE_LENGTH + 1];
    let result = chip.upload_motor_table(1, &entries);
    assert!(matches!(result, Err(Error::MotorTableLength(1021))));
    assert!(result.unwrap_err().is_programming_error());
    assert!(transport.operations().is_empty());

    chip.upload_motor_table(1, &entries[..MOTOR_TABLE_LENGTH])
        .unwrap();
    assert!(transport
        .operations()
        .contains(&Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 0xf8, 0x07, 0x00, 0x00])));
}

#[test]
fn gamma_table_upload() {
    let (mut chip, transport) = common::chip();
    let entries: Vec<u8> = (0..=255).collect();
    chip.upload_gamma_table(3, &entries).unwrap();
    let operations = transport.operations();
    assert_eq!(
        operations[..4],
        [
            Operation::Write {
                address: 0x5b,
                value: 0x42
            },
            Operation::Write {
                address: 0x5c,
                value: 0x00
            },
            Operation::Select(0x28),
            Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 0x00, 0x01, 0x00, 0x00]),
        ]
    );
    assert_eq!(
        operations[4],
        Operation::BulkOut {
            endpoint: 0x02,
            data: entries
        }
    );
    assert_eq!(chip.get(Register::MTRTBL), 0);
    assert_eq!(chip.get(Register::GMMADDR), 0);
}

#[test]
fn table_indices_start_at_one() {
    let (mut chip, transport) = common::chip();
    let result = chip.upload_gamma_table(0, &[0; 256]);
    assert!(matches!(result, Err(Error::TableOutOfRange(0))));
    assert!(result.unwrap_err().is_programming_error());
    assert!(transport.operations().is_empty());
}

#[test]
fn shading_upload_pads_every_block() {
    let (mut chip, transport) = common::chip();
    let data: Vec<u16> = (0..500).collect();
    let bytes: Vec<u8> = data.iter().flat_map(|word| word.to_le_bytes()).collect();
    chip.upload_shading(0x0102, &data).unwrap();
    let operations = transport.operations();
    assert_eq!(
        operations[..4],
        [
            Operation::Write {
                address: 0x2a,
                value: 0x01
            },
            Operation::Write {
                address: 0x2b,
                value: 0x02
            },
            Operation::Select(0x3c),
            Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 0xf8, 0x03, 0x00, 0x00]),
        ]
    );
    let blocks: Vec<&Vec<u8>> = operations[4..]
        .iter()
        .map(|operation| match operation {
            Operation::BulkOut { endpoint, data } => {
                assert_eq!(*endpoint, 0x02);
                data
            }
            operation => panic!("unexpected {operation:?}"),
        })
        .collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|block| block.len() == 512));
    assert_eq!(blocks[0][..504], bytes[..504]);
    assert!(blocks[0][504..].iter().all(|byte| *byte == 0));
    assert_eq!(blocks[1][..496], bytes[504..]);
    assert!(blocks[1][496..].iter().all(|byte| *byte == 0));
}

#[test]
fn shading_upload_of_whole_blocks() {
    let (mut chip, transport) = common::chip();
    chip.upload_shading(0, &[0x1111; 504]).unwrap();
    let blocks = transport
        .operations()
        .iter()
        .filter(|operation| matches!(operation, Operation::BulkOut { .. }))
        .count();
    assert_eq!(blocks, 2);
    assert!(transport
        .operations()
        .contains(&Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 0x00, 0x04, 0x00, 0x00])));
}

#[test]
fn empty_shading_upload_sends_one_block() {
    let (mut chip, transport) = common::chip();
    chip.upload_shading(0, &[]).unwrap();
    let operations = transport.operations();
    assert!(operations.contains(&Operation::BulkSetup([0x01, 0x00, 0x82, 0x00, 8, 0, 0, 0])));
    assert_eq!(
        operations.last(),
        Some(&Operation::BulkOut {
            endpoint: 0x02,
            data: vec![0; 512]
        })
    );
}

#[test]
fn line_read() {
    let (mut chip, transport) = common::chip();
    transport.set_bulk_in(vec![1, 2, 3, 4, 5, 6]);
    let mut buffer = [0u8; 8];
    let read = chip
        .read_line(
            &mut buffer,
            PixelFormat::Gray16,
            std::time::Duration::from_millis(100),
        )
        .unwrap();
    assert_eq!(read, 6);
    assert_eq!(
        transport.operations(),
        vec![
            Operation::Write {
                address: 0x2a,
                value: 0x00
            },
            Operation::Write {
                address: 0x2b,
                value: 0x00
            },
            Operation::Select(0x45),
            Operation::BulkSetup([0x00, 0x00, 0x82, 0x00, 8, 0, 0, 0]),
            Operation::BulkIn {
                endpoint: 0x81,
                length: 8
            },
        ]
    );
    if bulk::host_is_big_endian() {
        assert_eq!(buffer, [2, 1, 4, 3, 6, 5, 0, 0]);
    } else {
        assert_eq!(buffer, [1, 2, 3, 4, 5, 6, 0, 0]);
    }
}

#[test]
fn eight_bit_lines_are_never_swapped() {
    let (mut chip, transport) = common::chip();
    transport.set_bulk_in(vec![1, 2, 3, 4]);
    let mut buffer = [0u8; 4];
    chip.read_line(
        &mut buffer,
        PixelFormat::Rgb8,
        std::time::Duration::from_millis(100),
    )
    .unwrap();
    assert_eq!(buffer, [1, 2, 3, 4]);
}
