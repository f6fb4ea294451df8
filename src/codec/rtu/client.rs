// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU client (master) specific functions.
use super::*;
use byteorder::{ByteOrder as _, LittleEndian};

/// Encode an RTU request.
pub fn encode_request(adu: RequestAdu<'_>, buf: &mut [u8]) -> Result<usize> {
    let RequestAdu { hdr, pdu } = adu;
    if buf.len() < adu.request_len() {
        return Err(Error::BufferSize);
    }
    let len = pdu.encode(&mut buf[1..])?;
    buf[0] = hdr.slave;
    let crc = crc16(&buf[0..=len]);
    LittleEndian::write_u16(&mut buf[len + 1..], crc);
    Ok(len + 3)
}

/// Encode an RTU request into an exactly sized byte vector.
pub fn request_bytes(adu: RequestAdu<'_>) -> Result<Vec<u8>> {
    let mut buf = vec![0; adu.request_len()];
    encode_request(adu, &mut buf)?;
    Ok(buf)
}

/// Decode a complete RTU response frame without verifying the CRC.
///
/// Accepts buffers with and without the two CRC trailer bytes. Use
/// [`decode_response_with_crc`] when the transport does not already
/// guarantee integrity.
pub fn decode_response(buf: &[u8]) -> Result<ResponseAdu<'_>> {
    if buf.is_empty() {
        return Err(Error::BufferSize);
    }
    let pdu_len = response_pdu_len(buf)?.ok_or(Error::BufferSize)?;
    let pdu = extract_pdu(buf, pdu_len)?;
    decode_response_pdu(buf[0], pdu)
}

/// Decode a complete RTU response frame after verifying the trailing CRC.
pub fn decode_response_with_crc(buf: &[u8]) -> Result<ResponseAdu<'_>> {
    if buf.is_empty() {
        return Err(Error::BufferSize);
    }
    // The server id response PDU swallows the whole buffer unless the CRC
    // trailer is accounted for first.
    let pdu_len = if buf.len() > 2 && buf[1] == 0x11 {
        buf.len() - 3
    } else {
        response_pdu_len(buf)?.ok_or(Error::BufferSize)?
    };
    let pdu = extract_pdu_checked(buf, pdu_len)?;
    decode_response_pdu(buf[0], pdu)
}

fn decode_response_pdu<'r>(slave: SlaveId, pdu: &'r [u8]) -> Result<ResponseAdu<'r>> {
    let hdr = Header { slave };
    ExceptionResponse::try_from(pdu)
        .map(|er| ResponsePdu(Err(er)))
        .or_else(|_| Response::try_from(pdu).map(|r| ResponsePdu(Ok(r))))
        .map(|pdu| ResponseAdu { hdr, pdu })
        .inspect_err(|&_err| {
            #[cfg(feature = "log")]
            log::error!("Failed to decode response PDU: {_err}");
        })
}
