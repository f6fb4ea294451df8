// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

mod coils;
mod data;
mod registers;
#[cfg(feature = "rtu")]
pub(crate) mod rtu;
#[cfg(feature = "tcp")]
pub(crate) mod tcp;

pub use self::{coils::*, data::*, registers::*};
use crate::error::Error;

/// A Modbus function code.
///
/// It is represented by an unsigned 8 bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// Modbus Function Code: `01` (`0x01`).
    ReadCoils,

    /// Modbus Function Code: `02` (`0x02`).
    ReadDiscreteInputs,

    /// Modbus Function Code: `03` (`0x03`).
    ReadHoldingRegisters,

    /// Modbus Function Code: `04` (`0x04`).
    ReadInputRegisters,

    /// Modbus Function Code: `05` (`0x05`).
    WriteSingleCoil,

    /// Modbus Function Code: `06` (`0x06`).
    WriteSingleRegister,

    /// Modbus Function Code: `15` (`0x0F`).
    WriteMultipleCoils,

    /// Modbus Function Code: `16` (`0x10`).
    WriteMultipleRegisters,

    /// Modbus Function Code: `17` (`0x11`).
    ReadServerId,

    /// Modbus Function Code: `23` (`0x17`).
    ReadWriteMultipleRegisters,
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] with `value`.
    ///
    /// Returns `None` for codes outside the supported set.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        let code = match value {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x04 => Self::ReadInputRegisters,
            0x05 => Self::WriteSingleCoil,
            0x06 => Self::WriteSingleRegister,
            0x0F => Self::WriteMultipleCoils,
            0x10 => Self::WriteMultipleRegisters,
            0x11 => Self::ReadServerId,
            0x17 => Self::ReadWriteMultipleRegisters,
            _ => return None,
        };
        Some(code)
    }

    /// Get the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadDiscreteInputs => 0x02,
            Self::ReadHoldingRegisters => 0x03,
            Self::ReadInputRegisters => 0x04,
            Self::WriteSingleCoil => 0x05,
            Self::WriteSingleRegister => 0x06,
            Self::WriteMultipleCoils => 0x0F,
            Self::WriteMultipleRegisters => 0x10,
            Self::ReadServerId => 0x11,
            Self::ReadWriteMultipleRegisters => 0x17,
        }
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

/// A Modbus address is represented by 16 bit (from `0` to `65535`).
pub type Address = u16;

/// A Coil represents a single bit.
///
/// - `true` is equivalent to `ON`, `1` and `0xFF00`.
/// - `false` is equivalent to `OFF`, `0` and `0x0000`.
pub type Coil = bool;

/// Modbus uses 16 bit for its data items (big-endian representation).
pub type Word = u16;

/// Number of items to process (`0` - `65535`).
pub type Quantity = u16;

/// Raw PDU data
type RawData<'r> = &'r [u8];

/// Quantity limits, constructor side.
///
/// Encoders stay permissive where vendor devices are known to stretch the
/// canonical ranges; parsers apply the stricter wire limits.
pub const MAX_READ_BITS: Quantity = 2000;
pub const MAX_READ_REGISTERS: Quantity = 125;
pub const MAX_WRITE_COILS: Quantity = 1968;
pub const MAX_WRITE_REGISTERS: Quantity = 124;
pub const MAX_RW_READ_REGISTERS: Quantity = 124;

/// A request represents a message from the client (master) to the server (slave).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'r> {
    ReadCoils(Address, Quantity),
    ReadDiscreteInputs(Address, Quantity),
    ReadHoldingRegisters(Address, Quantity),
    ReadInputRegisters(Address, Quantity),
    WriteSingleCoil(Address, Coil),
    /// The 16-bit value is opaque; its byte order is chosen by the sender.
    WriteSingleRegister(Address, [u8; 2]),
    WriteMultipleCoils(Address, Coils<'r>),
    WriteMultipleRegisters(Address, Data<'r>),
    ReadServerId,
    ReadWriteMultipleRegisters(Address, Quantity, Address, Data<'r>),
}

impl<'r> Request<'r> {
    /// Read coils request with the permissive encoder limit of 2000.
    pub const fn read_coils(address: Address, quantity: Quantity) -> Result<Self, Error> {
        if quantity < 1 || quantity > MAX_READ_BITS {
            return Err(Error::QuantityOutOfRange(quantity, MAX_READ_BITS));
        }
        Ok(Self::ReadCoils(address, quantity))
    }

    /// Read discrete inputs request with the permissive encoder limit of 2000.
    pub const fn read_discrete_inputs(address: Address, quantity: Quantity) -> Result<Self, Error> {
        if quantity < 1 || quantity > MAX_READ_BITS {
            return Err(Error::QuantityOutOfRange(quantity, MAX_READ_BITS));
        }
        Ok(Self::ReadDiscreteInputs(address, quantity))
    }

    pub const fn read_holding_registers(
        address: Address,
        quantity: Quantity,
    ) -> Result<Self, Error> {
        if quantity < 1 || quantity > MAX_READ_REGISTERS {
            return Err(Error::QuantityOutOfRange(quantity, MAX_READ_REGISTERS));
        }
        Ok(Self::ReadHoldingRegisters(address, quantity))
    }

    pub const fn read_input_registers(
        address: Address,
        quantity: Quantity,
    ) -> Result<Self, Error> {
        if quantity < 1 || quantity > MAX_READ_REGISTERS {
            return Err(Error::QuantityOutOfRange(quantity, MAX_READ_REGISTERS));
        }
        Ok(Self::ReadInputRegisters(address, quantity))
    }

    #[must_use]
    pub const fn write_single_coil(address: Address, state: Coil) -> Self {
        Self::WriteSingleCoil(address, state)
    }

    #[must_use]
    pub const fn write_single_register(address: Address, value: [u8; 2]) -> Self {
        Self::WriteSingleRegister(address, value)
    }

    pub const fn write_multiple_coils(address: Address, coils: Coils<'r>) -> Result<Self, Error> {
        let count = coils.len();
        if count < 1 || count > MAX_WRITE_COILS as usize {
            return Err(Error::CoilCountOutOfRange(count as u16));
        }
        Ok(Self::WriteMultipleCoils(address, coils))
    }

    pub const fn write_multiple_registers(
        address: Address,
        data: Data<'r>,
    ) -> Result<Self, Error> {
        let count = data.len();
        if count < 1 || count > MAX_WRITE_REGISTERS as usize {
            return Err(Error::RegisterCountOutOfRange(
                count as u16,
                MAX_WRITE_REGISTERS,
            ));
        }
        Ok(Self::WriteMultipleRegisters(address, data))
    }

    pub const fn read_write_multiple_registers(
        read_address: Address,
        read_quantity: Quantity,
        write_address: Address,
        write_data: Data<'r>,
    ) -> Result<Self, Error> {
        if read_quantity < 1 || read_quantity > MAX_RW_READ_REGISTERS {
            return Err(Error::QuantityOutOfRange(
                read_quantity,
                MAX_RW_READ_REGISTERS,
            ));
        }
        let count = write_data.len();
        if count < 1 || count > MAX_WRITE_REGISTERS as usize {
            return Err(Error::RegisterCountOutOfRange(
                count as u16,
                MAX_WRITE_REGISTERS,
            ));
        }
        Ok(Self::ReadWriteMultipleRegisters(
            read_address,
            read_quantity,
            write_address,
            write_data,
        ))
    }
}

/// A server (slave) exception response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function: FunctionCode,
    pub exception: Exception,
}

/// Represents a message from the client (slave) to the server (master).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPdu<'r>(pub Request<'r>);

/// Represents a message from the server (slave) to the client (master).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePdu<'r>(pub Result<Response<'r>, ExceptionResponse>);

impl ResponsePdu<'_> {
    /// Number of bytes required for a serialized PDU frame.
    ///
    /// Exception responses always occupy two bytes.
    #[must_use]
    pub const fn pdu_len(&self) -> usize {
        match self.0 {
            Ok(rsp) => rsp.pdu_len(),
            Err(_) => 2,
        }
    }
}

/// Payload of a read server id response.
///
/// The byte-count prefix on the wire covers `server_id` only; `run_status`
/// and any additional data follow it uncounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerId<'r> {
    pub server_id: &'r [u8],
    pub run_status: u8,
    pub additional_data: &'r [u8],
}

/// The response data of a successful request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'r> {
    ReadCoils(Coils<'r>),
    ReadDiscreteInputs(Coils<'r>),
    ReadHoldingRegisters(Data<'r>),
    ReadInputRegisters(Data<'r>),
    WriteSingleCoil(Address, Coil),
    /// Echo of the opaque 16-bit value.
    WriteSingleRegister(Address, [u8; 2]),
    WriteMultipleCoils(Address, Quantity),
    WriteMultipleRegisters(Address, Quantity),
    ReadServerId(ServerId<'r>),
    ReadWriteMultipleRegisters(Data<'r>),
}

impl<'r> From<Request<'r>> for FunctionCode {
    fn from(r: Request<'r>) -> Self {
        use Request as R;

        match r {
            R::ReadCoils(_, _) => Self::ReadCoils,
            R::ReadDiscreteInputs(_, _) => Self::ReadDiscreteInputs,
            R::ReadHoldingRegisters(_, _) => Self::ReadHoldingRegisters,
            R::ReadInputRegisters(_, _) => Self::ReadInputRegisters,
            R::WriteSingleCoil(_, _) => Self::WriteSingleCoil,
            R::WriteSingleRegister(_, _) => Self::WriteSingleRegister,
            R::WriteMultipleCoils(_, _) => Self::WriteMultipleCoils,
            R::WriteMultipleRegisters(_, _) => Self::WriteMultipleRegisters,
            R::ReadServerId => Self::ReadServerId,
            R::ReadWriteMultipleRegisters(_, _, _, _) => Self::ReadWriteMultipleRegisters,
        }
    }
}

impl<'r> From<Response<'r>> for FunctionCode {
    fn from(r: Response<'r>) -> Self {
        use Response as R;

        match r {
            R::ReadCoils(_) => Self::ReadCoils,
            R::ReadDiscreteInputs(_) => Self::ReadDiscreteInputs,
            R::ReadHoldingRegisters(_) => Self::ReadHoldingRegisters,
            R::ReadInputRegisters(_) => Self::ReadInputRegisters,
            R::WriteSingleCoil(_, _) => Self::WriteSingleCoil,
            R::WriteSingleRegister(_, _) => Self::WriteSingleRegister,
            R::WriteMultipleCoils(_, _) => Self::WriteMultipleCoils,
            R::WriteMultipleRegisters(_, _) => Self::WriteMultipleRegisters,
            R::ReadServerId(_) => Self::ReadServerId,
            R::ReadWriteMultipleRegisters(_) => Self::ReadWriteMultipleRegisters,
        }
    }
}

/// A server (slave) exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerFailure = 0x04,
    Acknowledge = 0x05,
    ServerBusy = 0x06,
    MemoryParityError = 0x08,
    GatewayPathUnavailable = 0x0A,
    GatewayTargetFailedToRespond = 0x0B,
}

impl Exception {
    const fn get_name(self) -> &'static str {
        match self {
            Self::IllegalFunction => "Illegal function",
            Self::IllegalDataAddress => "Illegal data address",
            Self::IllegalDataValue => "Illegal data value",
            Self::ServerFailure => "Server failure",
            Self::Acknowledge => "Acknowledge",
            Self::ServerBusy => "Server busy",
            Self::MemoryParityError => "Memory parity error",
            Self::GatewayPathUnavailable => "Gateway path unavailable",
            Self::GatewayTargetFailedToRespond => "Gateway target device failed to respond",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

impl Request<'_> {
    /// Number of bytes required for a serialized PDU frame.
    #[must_use]
    pub const fn pdu_len(&self) -> usize {
        match *self {
            Self::ReadCoils(_, _)
            | Self::ReadDiscreteInputs(_, _)
            | Self::ReadHoldingRegisters(_, _)
            | Self::ReadInputRegisters(_, _)
            | Self::WriteSingleRegister(_, _)
            | Self::WriteSingleCoil(_, _) => 5,
            Self::WriteMultipleCoils(_, coils) => 6 + coils.packed_len(),
            Self::WriteMultipleRegisters(_, words) => 6 + words.data.len(),
            Self::ReadServerId => 1,
            Self::ReadWriteMultipleRegisters(_, _, _, words) => 10 + words.data.len(),
        }
    }

    /// Number of PDU bytes the matching response will occupy.
    ///
    /// For read server id requests this is the minimum possible length: the
    /// response size depends on the server.
    #[must_use]
    pub const fn expected_response_pdu_len(&self) -> usize {
        match *self {
            Self::ReadCoils(_, quantity) | Self::ReadDiscreteInputs(_, quantity) => {
                2 + (quantity as usize).div_ceil(8)
            }
            Self::ReadHoldingRegisters(_, quantity) | Self::ReadInputRegisters(_, quantity) => {
                2 + 2 * quantity as usize
            }
            Self::WriteSingleCoil(_, _)
            | Self::WriteSingleRegister(_, _)
            | Self::WriteMultipleCoils(_, _)
            | Self::WriteMultipleRegisters(_, _) => 5,
            Self::ReadServerId => 4,
            Self::ReadWriteMultipleRegisters(_, read_quantity, _, _) => {
                2 + 2 * read_quantity as usize
            }
        }
    }
}

impl Response<'_> {
    /// Number of bytes required for a serialized PDU frame.
    #[must_use]
    pub const fn pdu_len(&self) -> usize {
        match *self {
            Self::ReadCoils(coils) | Self::ReadDiscreteInputs(coils) => 2 + coils.packed_len(),
            Self::WriteSingleCoil(_, _)
            | Self::WriteSingleRegister(_, _)
            | Self::WriteMultipleCoils(_, _)
            | Self::WriteMultipleRegisters(_, _) => 5,
            Self::ReadHoldingRegisters(words)
            | Self::ReadInputRegisters(words)
            | Self::ReadWriteMultipleRegisters(words) => 2 + words.len() * 2,
            Self::ReadServerId(id) => 3 + id.server_id.len() + id.additional_data.len(),
        }
    }
}

/// Routing projection of a request: where it goes and what it touches.
///
/// `address` names the remote endpoint and is filled by the caller; the
/// codec only knows the wire-level fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestDestination {
    pub address: String,
    pub unit_id: u8,
    pub function_code: u8,
    pub start_address: Address,
    pub quantity: Quantity,
}

impl Request<'_> {
    /// Project the request onto its destination for routing and logging.
    ///
    /// Read/write multiple requests project the read side; single writes
    /// count as quantity one; read server id touches no data address.
    #[must_use]
    pub fn destination(&self, unit_id: u8) -> RequestDestination {
        let function_code = FunctionCode::from(*self).value();
        let (start_address, quantity) = match *self {
            Self::ReadCoils(address, quantity)
            | Self::ReadDiscreteInputs(address, quantity)
            | Self::ReadHoldingRegisters(address, quantity)
            | Self::ReadInputRegisters(address, quantity) => (address, quantity),
            Self::WriteSingleCoil(address, _) | Self::WriteSingleRegister(address, _) => {
                (address, 1)
            }
            Self::WriteMultipleCoils(address, coils) => (address, coils.len() as Quantity),
            Self::WriteMultipleRegisters(address, words) => (address, words.len() as Quantity),
            Self::ReadServerId => (0, 0),
            Self::ReadWriteMultipleRegisters(read_address, read_quantity, _, _) => {
                (read_address, read_quantity)
            }
        };
        RequestDestination {
            address: String::new(),
            unit_id,
            function_code,
            start_address,
            quantity,
        }
    }
}
