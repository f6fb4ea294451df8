// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU

use super::*;
use byteorder::{ByteOrder as _, LittleEndian};

pub mod client;
pub mod server;
pub use crate::frame::rtu::*;

// [MODBUS over Serial Line Specification and Implementation Guide V1.02](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf), page 13
// "The maximum size of a MODBUS RTU frame is 256 bytes."
pub const MAX_FRAME_LEN: usize = 256;

/// Calculate the CRC (Cyclic Redundancy Check) sum.
///
/// Modbus polynomial 0xA001 (reflected), initial value 0xFFFF, no final
/// XOR. The accumulator is returned as-is; on the wire the low byte goes
/// first, unlike every other 16-bit field.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Extract the PDU length out of the ADU request buffer.
///
/// `Ok(None)` means the buffer is still too short to tell.
pub const fn request_pdu_len(adu_buf: &[u8]) -> Result<Option<usize>> {
    if adu_buf.len() < 2 {
        return Ok(None);
    }
    let fn_code = adu_buf[1];
    let len = match fn_code {
        0x01..=0x06 => Some(5),
        0x11 => Some(1),
        0x0F | 0x10 => {
            if adu_buf.len() > 6 {
                Some(6 + adu_buf[6] as usize)
            } else {
                // incomplete frame
                None
            }
        }
        0x17 => {
            if adu_buf.len() > 10 {
                Some(10 + adu_buf[10] as usize)
            } else {
                // incomplete frame
                None
            }
        }
        _ => {
            return Err(Error::FnCode(fn_code));
        }
    };
    Ok(len)
}

/// Extract the PDU length out of the ADU response buffer.
///
/// A read server id response carries no length information beyond the
/// server id count, so the whole remaining buffer counts as its PDU.
pub const fn response_pdu_len(adu_buf: &[u8]) -> Result<Option<usize>> {
    if adu_buf.len() < 2 {
        return Ok(None);
    }
    let fn_code = adu_buf[1];
    let len = match fn_code {
        0x01..=0x04 | 0x17 => {
            if adu_buf.len() > 2 {
                Some(2 + adu_buf[2] as usize)
            } else {
                // incomplete frame
                None
            }
        }
        0x05 | 0x06 | 0x0F | 0x10 => Some(5),
        0x11 => Some(adu_buf.len() - 1),
        0x81..=0xFF => Some(2),
        _ => return Err(Error::FnCode(fn_code)),
    };
    Ok(len)
}

/// Slice the PDU region of `buf`, accepting CRC-inclusive and CRC-omitted
/// totals.
fn extract_pdu(buf: &[u8], pdu_len: usize) -> Result<&[u8]> {
    let adu_len = 1 + pdu_len;
    if buf.len() != adu_len && buf.len() != adu_len + 2 {
        return Err(Error::BufferSize);
    }
    Ok(&buf[1..adu_len])
}

/// Verify the trailing CRC and slice the PDU region of `buf`.
fn extract_pdu_checked(buf: &[u8], pdu_len: usize) -> Result<&[u8]> {
    let adu_len = 1 + pdu_len;
    if buf.len() != adu_len + 2 {
        return Err(Error::BufferSize);
    }
    let expected_crc = LittleEndian::read_u16(&buf[adu_len..]);
    let actual_crc = crc16(&buf[..adu_len]);
    if expected_crc != actual_crc {
        return Err(Error::Crc(expected_crc, actual_crc));
    }
    Ok(&buf[1..adu_len])
}

/// Extract a typed exception frame, if that is what the buffer holds.
///
/// `Ok(None)` means "not an error packet": the buffer is too short to be
/// one or the function byte has no error bit set.
pub fn decode_exception_response(buf: &[u8]) -> Result<Option<(Header, ExceptionResponse)>> {
    if buf.len() < 5 {
        return Ok(None);
    }
    if buf[1] & 0x80 == 0 {
        return Ok(None);
    }
    let exception = ExceptionResponse::try_from(&buf[1..3])?;
    Ok(Some((Header { slave: buf[0] }, exception)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_crc16() {
        assert_eq!(crc16(&[0x10, 0x03, 0x00, 0x6B, 0x00, 0x03]), 0x7756);
        assert_eq!(crc16(&[0x11, 0x03, 0x00, 0x6B, 0x00, 0x03]), 0x8776);
        assert_eq!(crc16(&[0x01, 0x04, 0x02, 0xFF, 0xFF]), 0x80B8);
        assert_eq!(crc16(&[0x01, 0x82, 0x03]), 0xA100);
    }

    #[test]
    fn crc16_is_deterministic_and_total() {
        assert_eq!(crc16(&[]), 0xFFFF);
        let msg = &[0x01, 0x03, 0x08, 0x2B, 0x00, 0x02];
        assert_eq!(crc16(msg), crc16(msg));
    }

    #[test]
    fn test_request_pdu_len() {
        let buf = &mut [0x10, 0x66, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(request_pdu_len(buf).err().unwrap(), Error::FnCode(0x66));

        for fc in 0x01..=0x06 {
            buf[1] = fc;
            assert_eq!(request_pdu_len(buf).unwrap(), Some(5));
        }

        buf[1] = 0x11;
        assert_eq!(request_pdu_len(buf).unwrap(), Some(1));

        // Byte count sits behind address and quantity.
        buf[1] = 0x0F;
        buf[6] = 99;
        assert_eq!(request_pdu_len(buf).unwrap(), Some(105));

        buf[1] = 0x10;
        buf[6] = 4;
        assert_eq!(request_pdu_len(buf).unwrap(), Some(10));

        buf[1] = 0x17;
        buf[10] = 4; // write byte count
        assert_eq!(request_pdu_len(buf).unwrap(), Some(14));

        // Not enough bytes to read the byte count yet.
        let buf = &[0x10, 0x0F, 0, 0, 0];
        assert_eq!(request_pdu_len(buf).unwrap(), None);
        let buf = &[0x10];
        assert_eq!(request_pdu_len(buf).unwrap(), None);
    }

    #[test]
    fn test_response_pdu_len() {
        let buf = &mut [0x66, 0x01, 99];
        assert_eq!(response_pdu_len(buf).unwrap(), Some(101));

        let buf = &mut [0x66, 0x00, 99, 0x00];
        assert_eq!(response_pdu_len(buf).err().unwrap(), Error::FnCode(0));

        let buf = &mut [0x66, 0x01, 99, 0x00];
        for fc in 0x01..=0x04 {
            buf[1] = fc;
            assert_eq!(response_pdu_len(buf).unwrap(), Some(101));
        }

        for fc in [0x05, 0x06, 0x0F, 0x10] {
            buf[1] = fc;
            assert_eq!(response_pdu_len(buf).unwrap(), Some(5));
        }

        buf[1] = 0x17;
        assert_eq!(response_pdu_len(buf).unwrap(), Some(101));

        // Exception responses are always two PDU bytes.
        for fc in [0x81u8, 0x90, 0xFF] {
            buf[1] = fc;
            assert_eq!(response_pdu_len(buf).unwrap(), Some(2));
        }

        // Server id responses span whatever is left.
        let buf = &[0x0A, 0x11, 0x02, 0x42, 0x43, 0xFF];
        assert_eq!(response_pdu_len(buf).unwrap(), Some(5));
    }

    mod adu_round_trips {
        use super::*;

        #[test]
        fn every_request_variant_survives_the_wire() {
            let coil_buf = &mut [0; 2];
            let word_buf = &mut [0; 6];
            let rw_buf = &mut [0; 4];
            let requests = [
                Request::ReadCoils(0x6B, 3),
                Request::ReadDiscreteInputs(0x03, 19),
                Request::ReadHoldingRegisters(107, 3),
                Request::ReadInputRegisters(0x09, 77),
                Request::WriteSingleCoil(0x1234, false),
                Request::WriteSingleRegister(0x07, [0xAB, 0xCD]),
                Request::WriteMultipleCoils(
                    0x3311,
                    Coils::from_bools(&[true, false, true, true], coil_buf).unwrap(),
                ),
                Request::WriteMultipleRegisters(
                    0x06,
                    Data::from_words(&[0xABCD, 0xEF12, 0x5566], word_buf).unwrap(),
                ),
                Request::ReadServerId,
                Request::ReadWriteMultipleRegisters(
                    0x05,
                    51,
                    0x03,
                    Data::from_words(&[0xABCD, 0xEF12], rw_buf).unwrap(),
                ),
            ];
            for req in requests {
                let adu = RequestAdu {
                    hdr: Header { slave: 0x21 },
                    pdu: RequestPdu(req),
                };
                let bytes = client::request_bytes(adu).unwrap();
                assert_eq!(bytes.len(), adu.request_len());
                // The trailer is the CRC of everything before it, low
                // byte first.
                let crc = crc16(&bytes[..bytes.len() - 2]);
                assert_eq!(bytes[bytes.len() - 2], crc as u8);
                assert_eq!(bytes[bytes.len() - 1], (crc >> 8) as u8);
                assert_eq!(server::decode_request(&bytes).unwrap(), adu);
                assert_eq!(server::decode_request_with_crc(&bytes).unwrap(), adu);
            }
        }

        #[test]
        fn every_response_variant_survives_the_wire() {
            let coil_buf = &mut [0; 1];
            let word_buf = &mut [0; 6];
            let rw_buf = &mut [0; 2];
            let responses = [
                ResponsePdu(Ok(Response::ReadCoils(
                    Coils::from_bools(&[true; 8], coil_buf).unwrap(),
                ))),
                ResponsePdu(Ok(Response::ReadHoldingRegisters(
                    Data::from_words(&[0xAA00, 0xCCBB, 0xEEDD], word_buf).unwrap(),
                ))),
                ResponsePdu(Ok(Response::WriteSingleCoil(0x33, true))),
                ResponsePdu(Ok(Response::WriteSingleRegister(0x07, [0xAB, 0xCD]))),
                ResponsePdu(Ok(Response::WriteMultipleCoils(0x3311, 5))),
                ResponsePdu(Ok(Response::WriteMultipleRegisters(0x06, 2))),
                ResponsePdu(Ok(Response::ReadServerId(ServerId {
                    server_id: &[0x42, 0x43],
                    run_status: 0xFF,
                    additional_data: &[0x99],
                }))),
                ResponsePdu(Ok(Response::ReadWriteMultipleRegisters(
                    Data::from_words(&[0x1234], rw_buf).unwrap(),
                ))),
                ResponsePdu(Err(ExceptionResponse {
                    function: FunctionCode::ReadCoils,
                    exception: Exception::Acknowledge,
                })),
            ];
            for pdu in responses {
                let adu = ResponseAdu {
                    hdr: Header { slave: 0x21 },
                    pdu,
                };
                let bytes = server::response_bytes(adu).unwrap();
                assert_eq!(bytes.len(), adu.response_len());
                let crc = crc16(&bytes[..bytes.len() - 2]);
                assert_eq!(bytes[bytes.len() - 2], crc as u8);
                assert_eq!(bytes[bytes.len() - 1], (crc >> 8) as u8);
                assert_eq!(client::decode_response_with_crc(&bytes).unwrap(), adu);
            }
        }
    }

    mod exception_extraction {
        use super::*;

        #[test]
        fn typed_frame_for_error_packets() {
            let buf = &[0x01, 0x82, 0x03, 0x00, 0xA1];
            let (hdr, exception) = decode_exception_response(buf).unwrap().unwrap();
            assert_eq!(hdr.slave, 0x01);
            assert_eq!(
                exception,
                ExceptionResponse {
                    function: FunctionCode::ReadDiscreteInputs,
                    exception: Exception::IllegalDataValue,
                }
            );
        }

        #[test]
        fn not_an_error_packet() {
            // Top bit clear.
            let buf = &[0x01, 0x02, 0x03, 0x00, 0xA1];
            assert_eq!(decode_exception_response(buf).unwrap(), None);
            // Too short to tell.
            let buf = &[0x01, 0x82, 0x03, 0x00];
            assert_eq!(decode_exception_response(buf).unwrap(), None);
        }
    }
}
