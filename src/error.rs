// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

use crate::frame::Exception;

/// modbus-codec Error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Structurally well-formed packet with logically invalid content.
    ///
    /// Carries everything a server needs to emit the matching Modbus
    /// exception response to the peer.
    Frame(FrameError),
    /// Invalid coil value
    CoilValue(u16),
    /// Invalid buffer size
    BufferSize,
    /// Invalid function code
    FnCode(u8),
    /// Invalid exception code
    ExceptionCode(u8),
    /// Invalid exception function code
    ExceptionFnCode(u8),
    /// Invalid CRC (expected, actual)
    Crc(u16, u16),
    /// Invalid byte count
    ByteCount(u8),
    /// Buffer too short for the 6-byte MBAP prefix
    MbapHeaderTooShort,
    /// MBAP protocol id was not zero
    ProtocolId(u16),
    /// MBAP length field was zero
    MbapLengthZero,
    /// Buffer length disagrees with the MBAP length field
    MbapLengthMismatch,
    /// Register payload with an odd number of bytes
    OddDataLength,
    /// FC 23 write payload with an odd number of bytes
    OddWriteDataLength,
    /// Coil quantity outside the encodable range
    CoilCountOutOfRange(u16),
    /// Register quantity outside the encodable range (count, max)
    RegisterCountOutOfRange(u16, u16),
    /// Read quantity outside the encodable range (quantity, max)
    QuantityOutOfRange(u16, u16),
    /// Register access below the window start
    AddressUnderBounds,
    /// Register access beyond the window end
    AddressOverQuantityBounds,
    /// Byte access beyond the raw data window
    AddressOverDataBounds,
    /// Register bit index above 15
    BitIndex(u8),
    /// Coil lookup below the response start address
    BitBeforeStart,
    /// Coil lookup beyond the packed response bits
    BitOutOfBounds,
}

impl Error {
    /// Attach the enclosing frame's addressing to a [`FrameError`].
    ///
    /// Parsers working below the transport layer do not know the unit id
    /// or transaction id; the ADU decoders patch them in on the way out.
    #[must_use]
    pub const fn in_frame(self, unit_id: u8, transaction_id: Option<u16>) -> Self {
        match self {
            Self::Frame(e) => Self::Frame(FrameError {
                unit_id,
                transaction_id,
                ..e
            }),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Frame(e) => e.fmt(f),
            Self::CoilValue(v) => write!(f, "invalid coil value: {v}"),
            Self::BufferSize => write!(f, "invalid buffer size"),
            Self::FnCode(fn_code) => write!(f, "invalid function code: 0x{fn_code:0>2X}"),
            Self::ExceptionCode(code) => write!(f, "Unknown error code: {code}"),
            Self::ExceptionFnCode(code) => {
                write!(f, "invalid exception function code: 0x{code:0>2X}")
            }
            Self::Crc(_, _) => write!(
                f,
                "packet cyclic redundancy check does not match Modbus RTU packet bytes"
            ),
            Self::ByteCount(cnt) => write!(f, "invalid byte count: {cnt}"),
            Self::MbapHeaderTooShort => write!(f, "data too short to contain MBAP header"),
            Self::ProtocolId(_) => write!(f, "invalid protocol id"),
            Self::MbapLengthZero => write!(f, "pdu length in header can not be 0"),
            Self::MbapLengthMismatch => {
                write!(f, "packet length does not match length in header")
            }
            Self::OddDataLength => write!(f, "data length must be even number of bytes"),
            Self::OddWriteDataLength => {
                write!(f, "write data length must be even number of bytes")
            }
            Self::CoilCountOutOfRange(_) => write!(f, "coils count out of range 1..1968"),
            Self::RegisterCountOutOfRange(_, max) => {
                write!(f, "registers count out of range 1..{max}")
            }
            Self::QuantityOutOfRange(_, max) => write!(f, "quantity out of range 1..{max}"),
            Self::AddressUnderBounds => write!(f, "address under startAddress bounds"),
            Self::AddressOverQuantityBounds => {
                write!(f, "address over startAddress+quantity bounds")
            }
            Self::AddressOverDataBounds => write!(f, "address over data bounds"),
            Self::BitIndex(bit) => write!(f, "bit out of range 0..15: {bit}"),
            Self::BitBeforeStart => write!(f, "bit can not be before startBit"),
            Self::BitOutOfBounds => write!(f, "bit value more than data contains bits"),
        }
    }
}

impl std::error::Error for Error {}

/// The Modbus-exception half of the error taxonomy.
///
/// Raised when an inbound packet frames correctly but its content violates
/// the protocol (unrecognized function code, out-of-range quantity). The
/// `(transaction_id, unit_id, function)` trio mirrors the offending packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameError {
    pub exception: Exception,
    /// Function code of the offending packet, without the error bit.
    pub function: u8,
    pub unit_id: u8,
    /// `None` for RTU frames.
    pub transaction_id: Option<u16>,
    reason: &'static str,
}

impl FrameError {
    pub(crate) const fn illegal_function(function: u8) -> Error {
        Error::Frame(Self {
            exception: Exception::IllegalFunction,
            function,
            unit_id: 0,
            transaction_id: None,
            reason: "function code is not supported",
        })
    }

    pub(crate) const fn illegal_data_value(function: u8, reason: &'static str) -> Error {
        Error::Frame(Self {
            exception: Exception::IllegalDataValue,
            function,
            unit_id: 0,
            transaction_id: None,
            reason,
        })
    }

    /// The human readable parse failure, e.g. `invalid quantity. valid range 1..125`.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        self.reason
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}
