// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU server (slave) specific functions.
use super::*;
use byteorder::{ByteOrder as _, LittleEndian};

/// Decode a complete RTU request frame without verifying the CRC.
///
/// Accepts buffers with and without the two CRC trailer bytes; integrity
/// is assumed to be handled by the transport. [`decode_request_with_crc`]
/// verifies the trailer instead. Frame errors come back with the offending
/// slave address filled in so the caller can answer with the matching
/// exception response.
pub fn decode_request(buf: &[u8]) -> Result<RequestAdu<'_>> {
    if buf.is_empty() {
        return Err(Error::BufferSize);
    }
    let pdu_len = request_frame_pdu_len(buf)?;
    let pdu = extract_pdu(buf, pdu_len)?;
    decode_request_pdu(buf[0], pdu)
}

/// Decode a complete RTU request frame after verifying the trailing CRC.
pub fn decode_request_with_crc(buf: &[u8]) -> Result<RequestAdu<'_>> {
    if buf.is_empty() {
        return Err(Error::BufferSize);
    }
    let pdu_len = request_frame_pdu_len(buf)?;
    let pdu = extract_pdu_checked(buf, pdu_len)?;
    decode_request_pdu(buf[0], pdu)
}

fn request_frame_pdu_len(buf: &[u8]) -> Result<usize> {
    request_pdu_len(buf)
        .map_err(|err| match err {
            // An unrecognized request deserves an IllegalFunction reply,
            // not just a local diagnostic.
            Error::FnCode(fn_code) => {
                FrameError::illegal_function(fn_code).in_frame(buf[0], None)
            }
            other => other,
        })?
        .ok_or(Error::BufferSize)
}

fn decode_request_pdu<'r>(slave: SlaveId, pdu: &'r [u8]) -> Result<RequestAdu<'r>> {
    let hdr = Header { slave };
    Request::try_from(pdu)
        .map(RequestPdu)
        .map(|pdu| RequestAdu { hdr, pdu })
        .map_err(|err| {
            #[cfg(feature = "log")]
            log::warn!("Failed to decode request PDU: {err}");
            err.in_frame(slave, None)
        })
}

/// Encode an RTU response.
pub fn encode_response(adu: ResponseAdu<'_>, buf: &mut [u8]) -> Result<usize> {
    let ResponseAdu { hdr, pdu } = adu;
    if buf.len() < adu.response_len() {
        return Err(Error::BufferSize);
    }
    let len = pdu.encode(&mut buf[1..])?;
    buf[0] = hdr.slave;
    let crc = crc16(&buf[0..=len]);
    LittleEndian::write_u16(&mut buf[len + 1..], crc);
    Ok(len + 3)
}

/// Encode an RTU response into an exactly sized byte vector.
pub fn response_bytes(adu: ResponseAdu<'_>) -> Result<Vec<u8>> {
    let mut buf = vec![0; adu.response_len()];
    encode_response(adu, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_empty_request() {
        assert_eq!(decode_request(&[]).err().unwrap(), Error::BufferSize);
    }

    #[test]
    fn decode_partly_received_request() {
        let buf = &[
            0x12, // slave address
            0x0F, // function code
        ];
        assert_eq!(decode_request(buf).err().unwrap(), Error::BufferSize);
    }

    #[test]
    fn decode_write_single_register_request() {
        let buf = &[
            0x12, // slave address
            0x06, // function code
            0x22, // addr
            0x22, // addr
            0xAB, // value
            0xCD, // value
            0x9F, // crc
            0xBE, // crc
        ];
        let adu = decode_request(buf).unwrap();
        assert_eq!(adu.hdr.slave, 0x12);
        assert_eq!(
            adu.pdu,
            RequestPdu(Request::WriteSingleRegister(0x2222, [0xAB, 0xCD]))
        );
        // The same frame without its CRC trailer decodes as well.
        assert_eq!(decode_request(&buf[..6]).unwrap(), adu);
    }

    #[test]
    fn decode_request_verifying_crc() {
        let buf = &[0x10, 0x03, 0x00, 0x6B, 0x00, 0x03, 0x56, 0x77];
        let adu = decode_request_with_crc(buf).unwrap();
        assert_eq!(adu.hdr.slave, 0x10);
        assert_eq!(adu.pdu, RequestPdu(Request::ReadHoldingRegisters(107, 3)));

        let mut corrupted = *buf;
        corrupted[3] ^= 0xFF;
        assert!(matches!(
            decode_request_with_crc(&corrupted).err().unwrap(),
            Error::Crc(_, _)
        ));
        // Without the trailer there is nothing to verify against.
        assert_eq!(
            decode_request_with_crc(&buf[..6]).err().unwrap(),
            Error::BufferSize
        );
    }

    #[test]
    fn decode_request_with_unknown_function_code() {
        let buf = &[0x12, 0x66, 0x00, 0x00, 0x00, 0x00];
        let Error::Frame(frame) = decode_request(buf).err().unwrap() else {
            panic!("expected frame error");
        };
        assert_eq!(frame.exception, Exception::IllegalFunction);
        assert_eq!(frame.function, 0x66);
        assert_eq!(frame.unit_id, 0x12);
        assert_eq!(frame.transaction_id, None);
    }

    #[test]
    fn decode_request_with_zero_quantity() {
        let buf = &[0x11, 0x04, 0x00, 0x6B, 0x00, 0x00];
        let Error::Frame(frame) = decode_request(buf).err().unwrap() else {
            panic!("expected frame error");
        };
        assert_eq!(frame.exception, Exception::IllegalDataValue);
        assert_eq!(frame.unit_id, 0x11);
        assert_eq!(frame.transaction_id, None);
    }

    #[test]
    fn decode_read_server_id_request() {
        let adu = &[0x0A, 0x11];
        let crc = crc16(adu);
        let frame = &[0x0A, 0x11, crc as u8, (crc >> 8) as u8];
        let adu = decode_request_with_crc(frame).unwrap();
        assert_eq!(adu.hdr.slave, 0x0A);
        assert_eq!(adu.pdu, RequestPdu(Request::ReadServerId));
    }

    #[test]
    fn encode_write_single_register_response() {
        let adu = ResponseAdu {
            hdr: Header { slave: 0x12 },
            pdu: ResponsePdu(Ok(Response::WriteSingleRegister(0x2222, [0xAB, 0xCD]))),
        };
        let buf = &mut [0; 100];
        let len = encode_response(adu, buf).unwrap();
        assert_eq!(len, 8);
        assert_eq!(&buf[..len], &[0x12, 0x06, 0x22, 0x22, 0xAB, 0xCD, 0x9F, 0xBE]);
    }

    #[test]
    fn encode_exception_response() {
        let adu = ResponseAdu {
            hdr: Header { slave: 0x01 },
            pdu: ResponsePdu(Err(ExceptionResponse {
                function: FunctionCode::ReadDiscreteInputs,
                exception: Exception::IllegalDataValue,
            })),
        };
        let bytes = response_bytes(adu).unwrap();
        assert_eq!(bytes, vec![0x01, 0x82, 0x03, 0x00, 0xA1]);
    }

    #[test]
    fn encode_read_coils_response() {
        let coil_buf = &mut [0];
        let adu = ResponseAdu {
            hdr: Header { slave: 0x10 },
            pdu: ResponsePdu(Ok(Response::ReadCoils(
                Coils::from_bools(&[true, false, true], coil_buf).unwrap(),
            ))),
        };
        let bytes = response_bytes(adu).unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(&bytes[..4], &[0x10, 0x01, 0x01, 0b101]);
        let crc = crc16(&bytes[..4]);
        assert_eq!(bytes[4], crc as u8);
        assert_eq!(bytes[5], (crc >> 8) as u8);
    }
}
