// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP

use super::*;
use byteorder::{BigEndian, ByteOrder as _};

pub mod client;
pub mod server;
pub use crate::frame::tcp::*;

// [MODBUS MESSAGING ON TCP/IP IMPLEMENTATION GUIDE V1.0b](http://modbus.org/docs/Modbus_Messaging_Implementation_Guide_V1_0b.pdf), page 18
// "a MODBUS request needs a maximum of 256 bytes + the MBAP header size"
pub const MAX_FRAME_LEN: usize = 256;

/// The fixed six-byte prefix of every Modbus TCP frame.
///
/// `length` counts every byte after the prefix, unit id included; the
/// protocol id is implicit because any value other than zero is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: TransactionId,
    pub length: u16,
}

/// Write the MBAP prefix into the first six bytes of `buf`.
pub fn encode_mbap_header(hdr: MbapHeader, buf: &mut [u8]) -> Result<()> {
    if buf.len() < 6 {
        return Err(Error::BufferSize);
    }
    BigEndian::write_u16(&mut buf[0..], hdr.transaction_id);
    buf[2..4].fill(0);
    BigEndian::write_u16(&mut buf[4..], hdr.length);
    Ok(())
}

/// Parse the MBAP prefix of a complete frame.
///
/// The whole frame must be present: the length field has to account for
/// every byte after the prefix.
pub fn decode_mbap_header(buf: &[u8]) -> Result<MbapHeader> {
    if buf.len() < 6 {
        return Err(Error::MbapHeaderTooShort);
    }
    let protocol_id = BigEndian::read_u16(&buf[2..4]);
    if protocol_id != 0 {
        return Err(Error::ProtocolId(protocol_id));
    }
    let length = BigEndian::read_u16(&buf[4..6]);
    if length == 0 {
        return Err(Error::MbapLengthZero);
    }
    if buf.len() != 6 + length as usize {
        return Err(Error::MbapLengthMismatch);
    }
    Ok(MbapHeader {
        transaction_id: BigEndian::read_u16(&buf[0..2]),
        length,
    })
}

/// Verdict of [`check_frame`] on a possibly partial buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCheck {
    /// Bytes are consistent with a Modbus TCP frame; the expected total
    /// length may exceed the bytes seen so far.
    LooksLikeFrame,
    /// Framing is consistent but the function code is not supported.
    UnsupportedFunctionCode,
    /// Fewer than eight bytes; nothing can be decided yet.
    DataTooShort,
    /// Structurally impossible as a Modbus TCP frame.
    NotModbusFrame,
}

/// Decide whether `buf` is the prefix of a Modbus TCP frame.
///
/// Returns the expected total frame length together with the verdict so a
/// streaming caller knows how many bytes to accumulate before decoding.
/// Runs in constant time and never panics, whatever the input.
#[must_use]
pub fn check_frame(buf: &[u8], allow_unsupported_fc: bool) -> (usize, FrameCheck) {
    if buf.len() < 8 {
        return (0, FrameCheck::DataTooShort);
    }
    let protocol_id = BigEndian::read_u16(&buf[2..4]);
    if protocol_id != 0 {
        return (0, FrameCheck::NotModbusFrame);
    }
    let length = BigEndian::read_u16(&buf[4..6]) as usize;
    if length < 4 {
        return (0, FrameCheck::NotModbusFrame);
    }
    let fn_code = buf[7];
    if fn_code == 0 {
        return (0, FrameCheck::NotModbusFrame);
    }
    let expected_len = 6 + length;
    let supported = FunctionCode::new(fn_code).is_some()
        || (fn_code > 0x80 && FunctionCode::new(fn_code - 0x80).is_some());
    if !supported && !allow_unsupported_fc {
        return (expected_len, FrameCheck::UnsupportedFunctionCode);
    }
    (expected_len, FrameCheck::LooksLikeFrame)
}

/// Extract a typed exception frame, if that is what the buffer holds.
///
/// `Ok(None)` means "not an error packet": the buffer is too short to be
/// one or the function byte has no error bit. Malformed exception frames
/// (an unknown exception code) are reported as errors.
pub fn decode_exception_response(buf: &[u8]) -> Result<Option<(Header, ExceptionResponse)>> {
    if buf.len() < 9 {
        return Ok(None);
    }
    if buf[7] & 0x80 == 0 {
        return Ok(None);
    }
    let exception = ExceptionResponse::try_from(&buf[7..9])?;
    let hdr = Header {
        transaction_id: BigEndian::read_u16(&buf[0..2]),
        unit_id: buf[6],
    };
    Ok(Some((hdr, exception)))
}
