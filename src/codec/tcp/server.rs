//! Modbus TCP server (slave) specific functions.
use super::*;

/// Decode a complete TCP request frame.
///
/// Frame errors come back with the offending unit id and transaction id
/// filled in so the caller can answer with the matching exception response.
pub fn decode_request(buf: &[u8]) -> Result<RequestAdu<'_>> {
    let mbap = decode_mbap_header(buf)?;
    let unit_id = buf[6];
    let hdr = Header {
        transaction_id: mbap.transaction_id,
        unit_id,
    };
    Request::try_from(&buf[7..])
        .map(RequestPdu)
        .map(|pdu| RequestAdu { hdr, pdu })
        .map_err(|err| {
            #[cfg(feature = "log")]
            log::warn!("Failed to decode request PDU: {err}");
            err.in_frame(unit_id, Some(mbap.transaction_id))
        })
}

/// Encode a TCP response.
pub fn encode_response(adu: ResponseAdu<'_>, buf: &mut [u8]) -> Result<usize> {
    let ResponseAdu { hdr, pdu } = adu;
    if buf.len() < adu.response_len() {
        return Err(Error::BufferSize);
    }
    let len = pdu.encode(&mut buf[7..])?;
    encode_mbap_header(
        MbapHeader {
            transaction_id: hdr.transaction_id,
            length: 1 + len as u16,
        },
        buf,
    )?;
    buf[6] = hdr.unit_id;
    Ok(len + 7)
}

/// Encode a TCP response into an exactly sized byte vector.
pub fn response_bytes(adu: ResponseAdu<'_>) -> Result<Vec<u8>> {
    let mut buf = vec![0; adu.response_len()];
    encode_response(adu, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_read_input_registers_request() {
        let buf = &[
            0x00, 0x01, // transaction id
            0x00, 0x00, // protocol id
            0x00, 0x06, // length
            0x01, // unit id
            0x04, // function code
            0x00, 0x6B, // start address
            0x00, 0x01, // quantity
        ];
        let adu = decode_request(buf).unwrap();
        assert_eq!(adu.hdr.transaction_id, 1);
        assert_eq!(adu.hdr.unit_id, 1);
        assert_eq!(adu.pdu, RequestPdu(Request::ReadInputRegisters(0x6B, 1)));
    }

    #[test]
    fn decode_request_with_zero_quantity() {
        let buf = &[
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x04, 0x00, 0x6B, 0x00, 0x00,
        ];
        let err = decode_request(buf).err().unwrap();
        let Error::Frame(frame) = err else {
            panic!("expected frame error");
        };
        assert_eq!(frame.exception, Exception::IllegalDataValue);
        assert_eq!(frame.function, 0x04);
        assert_eq!(frame.unit_id, 0x01);
        assert_eq!(frame.transaction_id, Some(1));
        assert_eq!(err.to_string(), "invalid quantity. valid range 1..125");
    }

    #[test]
    fn decode_request_with_unknown_function_code() {
        let buf = &[
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x09, 0x2B, 0x00, 0x6B, 0x00, 0x01,
        ];
        let Error::Frame(frame) = decode_request(buf).err().unwrap() else {
            panic!("expected frame error");
        };
        assert_eq!(frame.exception, Exception::IllegalFunction);
        assert_eq!(frame.function, 0x2B);
        assert_eq!(frame.unit_id, 0x09);
        assert_eq!(frame.transaction_id, Some(1));
    }

    #[test]
    fn decode_request_with_bad_protocol_id() {
        let buf = &[
            0x00, 0x01, 0x00, 0x02, 0x00, 0x06, 0x01, 0x04, 0x00, 0x6B, 0x00, 0x01,
        ];
        assert_eq!(decode_request(buf).err().unwrap(), Error::ProtocolId(2));
    }

    #[test]
    fn decode_write_multiple_coils_request() {
        let buf = &[
            0x00, 0x07, 0x00, 0x00, 0x00, 0x08, 0x11, 0x0F, 0x33, 0x11, 0x00, 0x04, 0x01,
            0b_0000_1101,
        ];
        let adu = decode_request(buf).unwrap();
        assert_eq!(
            adu.pdu,
            RequestPdu(Request::WriteMultipleCoils(
                0x3311,
                Coils {
                    quantity: 4,
                    data: &[0b1101],
                }
            ))
        );
    }

    #[test]
    fn encode_write_single_register_response() {
        let adu = ResponseAdu {
            hdr: Header {
                transaction_id: 0x1234,
                unit_id: 0x12,
            },
            pdu: ResponsePdu(Ok(Response::WriteSingleRegister(0x2222, [0xAB, 0xCD]))),
        };
        let buf = &mut [0; 100];
        let len = encode_response(adu, buf).unwrap();
        assert_eq!(
            &buf[..len],
            &[0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x12, 0x06, 0x22, 0x22, 0xAB, 0xCD]
        );
    }

    #[test]
    fn encode_exception_response() {
        let adu = ResponseAdu {
            hdr: Header {
                transaction_id: 1,
                unit_id: 0x01,
            },
            pdu: ResponsePdu(Err(ExceptionResponse {
                function: FunctionCode::ReadInputRegisters,
                exception: Exception::IllegalDataValue,
            })),
        };
        let bytes = response_bytes(adu).unwrap();
        assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0x84, 0x03]);
    }

    #[test]
    fn request_decode_then_response_encode_share_the_transaction_id() {
        let buf = &[
            0x00, 0x2A, 0x00, 0x00, 0x00, 0x06, 0x05, 0x03, 0x00, 0x10, 0x00, 0x02,
        ];
        let req = decode_request(buf).unwrap();
        let words = &mut [0; 4];
        let rsp = ResponseAdu {
            hdr: req.hdr,
            pdu: ResponsePdu(Ok(Response::ReadHoldingRegisters(
                Data::from_words(&[0xAAAA, 0xBBBB], words).unwrap(),
            ))),
        };
        let bytes = response_bytes(rsp).unwrap();
        assert_eq!(
            bytes,
            vec![0x00, 0x2A, 0x00, 0x00, 0x00, 0x07, 0x05, 0x03, 0x04, 0xAA, 0xAA, 0xBB, 0xBB]
        );
    }
}
