// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP client (master) specific functions.
use super::*;

/// Encode a TCP request.
pub fn encode_request(adu: RequestAdu<'_>, buf: &mut [u8]) -> Result<usize> {
    let RequestAdu { hdr, pdu } = adu;
    if buf.len() < adu.request_len() {
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

/// Encode a TCP request into an exactly sized byte vector.
pub fn request_bytes(adu: RequestAdu<'_>) -> Result<Vec<u8>> {
    let mut buf = vec![0; adu.request_len()];
    encode_request(adu, &mut buf)?;
    Ok(buf)
}

/// Decode a complete TCP response frame.
pub fn decode_response(buf: &[u8]) -> Result<ResponseAdu<'_>> {
    let mbap = decode_mbap_header(buf)?;
    let hdr = Header {
        transaction_id: mbap.transaction_id,
        unit_id: buf[6],
    };
    let pdu = &buf[7..];
    ExceptionResponse::try_from(pdu)
        .map(|er| ResponsePdu(Err(er)))
        .or_else(|_| Response::try_from(pdu).map(|r| ResponsePdu(Ok(r))))
        .map(|pdu| ResponseAdu { hdr, pdu })
        .inspect_err(|&_err| {
            #[cfg(feature = "log")]
            log::error!("Failed to decode response PDU: {_err}");
        })
}
