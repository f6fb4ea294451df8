// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{error::*, frame::*};
use byteorder::{BigEndian, ByteOrder as _};

#[cfg(feature = "rtu")]
pub mod rtu;
#[cfg(feature = "tcp")]
pub mod tcp;

type Result<T> = core::result::Result<T, Error>;

impl TryFrom<u8> for Exception {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        let ex = match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerBusy,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetFailedToRespond,
            _ => {
                return Err(Error::ExceptionCode(code));
            }
        };
        Ok(ex)
    }
}

impl From<ExceptionResponse> for [u8; 2] {
    fn from(ex: ExceptionResponse) -> [u8; 2] {
        let data = &mut [0; 2];
        let fn_code: u8 = ex.function.value();
        debug_assert!(fn_code < 0x80);
        data[0] = fn_code + 0x80;
        data[1] = ex.exception as u8;
        *data
    }
}

impl TryFrom<&[u8]> for ExceptionResponse {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::BufferSize);
        }
        let fn_err_code = bytes[0];
        if fn_err_code < 0x80 {
            return Err(Error::ExceptionFnCode(fn_err_code));
        }
        let function =
            FunctionCode::new(fn_err_code - 0x80).ok_or(Error::ExceptionFnCode(fn_err_code))?;
        let exception = Exception::try_from(bytes[1])?;
        Ok(ExceptionResponse {
            function,
            exception,
        })
    }
}

impl<'r> TryFrom<&'r [u8]> for Request<'r> {
    type Error = Error;

    fn try_from(bytes: &'r [u8]) -> Result<Self> {
        use FunctionCode as F;

        if bytes.is_empty() {
            return Err(Error::BufferSize);
        }

        let fn_code = bytes[0];
        let Some(function) = FunctionCode::new(fn_code) else {
            return Err(FrameError::illegal_function(fn_code));
        };

        if bytes.len() < min_request_pdu_len(function) {
            return Err(Error::BufferSize);
        }

        let req = match function {
            F::ReadCoils | F::ReadDiscreteInputs | F::ReadInputRegisters
            | F::ReadHoldingRegisters => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                let quantity = BigEndian::read_u16(&bytes[3..5]);
                if !(1..=125).contains(&quantity) {
                    return Err(FrameError::illegal_data_value(
                        fn_code,
                        "invalid quantity. valid range 1..125",
                    ));
                }

                match function {
                    F::ReadCoils => Self::ReadCoils(addr, quantity),
                    F::ReadDiscreteInputs => Self::ReadDiscreteInputs(addr, quantity),
                    F::ReadInputRegisters => Self::ReadInputRegisters(addr, quantity),
                    F::ReadHoldingRegisters => Self::ReadHoldingRegisters(addr, quantity),
                    _ => unreachable!(),
                }
            }
            F::WriteSingleCoil => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                let state = u16_coil_to_bool(BigEndian::read_u16(&bytes[3..5])).map_err(|_| {
                    FrameError::illegal_data_value(
                        fn_code,
                        "invalid coil state. must be 0x0000 or 0xFF00",
                    )
                })?;
                Self::WriteSingleCoil(addr, state)
            }
            F::WriteSingleRegister => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                Self::WriteSingleRegister(addr, [bytes[3], bytes[4]])
            }
            F::WriteMultipleCoils => {
                let address = BigEndian::read_u16(&bytes[1..3]);
                let quantity = BigEndian::read_u16(&bytes[3..5]);
                if !(1..=1968).contains(&quantity) {
                    return Err(FrameError::illegal_data_value(
                        fn_code,
                        "coils count out of range 1..1968",
                    ));
                }
                let byte_count = bytes[5];
                if usize::from(byte_count) != bytes.len() - 6
                    || usize::from(byte_count) != (quantity as usize).div_ceil(8)
                {
                    return Err(Error::ByteCount(byte_count));
                }
                let coils = Coils {
                    data: &bytes[6..],
                    quantity: quantity as usize,
                };
                Self::WriteMultipleCoils(address, coils)
            }
            F::WriteMultipleRegisters => {
                let address = BigEndian::read_u16(&bytes[1..3]);
                let quantity = BigEndian::read_u16(&bytes[3..5]);
                if !(1..=123).contains(&quantity) {
                    return Err(FrameError::illegal_data_value(
                        fn_code,
                        "registers count out of range 1..123",
                    ));
                }
                let byte_count = bytes[5];
                if usize::from(byte_count) != bytes.len() - 6
                    || usize::from(byte_count) != 2 * quantity as usize
                {
                    return Err(Error::ByteCount(byte_count));
                }
                let data = Data {
                    quantity: quantity as usize,
                    data: &bytes[6..],
                };
                Self::WriteMultipleRegisters(address, data)
            }
            F::ReadServerId => Self::ReadServerId,
            F::ReadWriteMultipleRegisters => {
                let read_address = BigEndian::read_u16(&bytes[1..3]);
                let read_quantity = BigEndian::read_u16(&bytes[3..5]);
                if !(1..=125).contains(&read_quantity) {
                    return Err(FrameError::illegal_data_value(
                        fn_code,
                        "invalid read quantity. valid range 1..125",
                    ));
                }
                let write_address = BigEndian::read_u16(&bytes[5..7]);
                let write_quantity = BigEndian::read_u16(&bytes[7..9]);
                if !(1..=121).contains(&write_quantity) {
                    return Err(FrameError::illegal_data_value(
                        fn_code,
                        "invalid write quantity. valid range 1..121",
                    ));
                }
                let write_count = bytes[9];
                if write_count % 2 != 0 {
                    return Err(Error::OddWriteDataLength);
                }
                if usize::from(write_count) != bytes.len() - 10
                    || usize::from(write_count) != 2 * write_quantity as usize
                {
                    return Err(Error::ByteCount(write_count));
                }
                let data = Data {
                    quantity: write_quantity as usize,
                    data: &bytes[10..],
                };
                Self::ReadWriteMultipleRegisters(read_address, read_quantity, write_address, data)
            }
        };
        Ok(req)
    }
}

impl<'r> TryFrom<&'r [u8]> for Response<'r> {
    type Error = Error;

    fn try_from(bytes: &'r [u8]) -> Result<Self> {
        use FunctionCode as F;

        if bytes.is_empty() {
            return Err(Error::BufferSize);
        }
        let fn_code = bytes[0];
        let Some(function) = FunctionCode::new(fn_code) else {
            return Err(Error::FnCode(fn_code));
        };
        if bytes.len() < min_response_pdu_len(function) {
            return Err(Error::BufferSize);
        }
        let rsp = match function {
            F::ReadCoils | F::ReadDiscreteInputs => {
                let byte_count = bytes[1];
                if usize::from(byte_count) != bytes.len() - 2 {
                    return Err(Error::ByteCount(byte_count));
                }
                let data = &bytes[2..];
                // Without the originating request the requested quantity is
                // unknown; assume every packed bit is meant.
                let quantity = usize::from(byte_count) * 8;

                let coils = Coils { data, quantity };
                match function {
                    F::ReadCoils => Self::ReadCoils(coils),
                    F::ReadDiscreteInputs => Self::ReadDiscreteInputs(coils),
                    _ => unreachable!(),
                }
            }
            F::WriteSingleCoil => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                let state = u16_coil_to_bool(BigEndian::read_u16(&bytes[3..5]))?;
                Self::WriteSingleCoil(addr, state)
            }
            F::WriteSingleRegister => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                Self::WriteSingleRegister(addr, [bytes[3], bytes[4]])
            }
            F::WriteMultipleCoils | F::WriteMultipleRegisters => {
                let addr = BigEndian::read_u16(&bytes[1..3]);
                let payload = BigEndian::read_u16(&bytes[3..5]);
                match function {
                    F::WriteMultipleCoils => Self::WriteMultipleCoils(addr, payload),
                    F::WriteMultipleRegisters => Self::WriteMultipleRegisters(addr, payload),
                    _ => unreachable!(),
                }
            }
            F::ReadHoldingRegisters | F::ReadInputRegisters | F::ReadWriteMultipleRegisters => {
                let byte_count = bytes[1];
                if usize::from(byte_count) != bytes.len() - 2 {
                    return Err(Error::ByteCount(byte_count));
                }
                if byte_count % 2 != 0 {
                    return Err(Error::OddDataLength);
                }
                let data = Data {
                    data: &bytes[2..],
                    quantity: usize::from(byte_count) / 2,
                };
                match function {
                    F::ReadHoldingRegisters => Self::ReadHoldingRegisters(data),
                    F::ReadInputRegisters => Self::ReadInputRegisters(data),
                    F::ReadWriteMultipleRegisters => Self::ReadWriteMultipleRegisters(data),
                    _ => unreachable!(),
                }
            }
            F::ReadServerId => {
                let byte_count = bytes[1];
                // The count covers the server id only; the run status byte
                // must still follow it.
                if byte_count == 0 || usize::from(byte_count) > bytes.len() - 3 {
                    return Err(Error::ByteCount(byte_count));
                }
                let id_end = 2 + usize::from(byte_count);
                Self::ReadServerId(ServerId {
                    server_id: &bytes[2..id_end],
                    run_status: bytes[id_end],
                    additional_data: &bytes[id_end + 1..],
                })
            }
        };
        Ok(rsp)
    }
}

/// Encode a struct into a buffer.
pub trait Encode {
    fn encode(&self, buf: &mut [u8]) -> Result<usize>;
}

impl Encode for Request<'_> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.pdu_len() {
            return Err(Error::BufferSize);
        }
        buf[0] = FunctionCode::from(*self).value();
        match self {
            Self::ReadCoils(address, payload)
            | Self::ReadDiscreteInputs(address, payload)
            | Self::ReadInputRegisters(address, payload)
            | Self::ReadHoldingRegisters(address, payload) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                BigEndian::write_u16(&mut buf[3..], *payload);
            }
            Self::WriteSingleCoil(address, state) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                BigEndian::write_u16(&mut buf[3..], bool_to_u16_coil(*state));
            }
            Self::WriteSingleRegister(address, value) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                buf[3..5].copy_from_slice(value);
            }
            Self::WriteMultipleCoils(address, coils) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                let len = coils.len();
                BigEndian::write_u16(&mut buf[3..], len as u16);
                buf[5] = coils.packed_len() as u8;
                coils.copy_to(&mut buf[6..]);
            }
            Self::WriteMultipleRegisters(address, words) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                let len = words.len();
                BigEndian::write_u16(&mut buf[3..], len as u16);
                buf[5] = len as u8 * 2;
                words.copy_to(&mut buf[6..]);
            }
            Self::ReadServerId => (),
            Self::ReadWriteMultipleRegisters(read_address, quantity, write_address, words) => {
                BigEndian::write_u16(&mut buf[1..], *read_address);
                BigEndian::write_u16(&mut buf[3..], *quantity);
                BigEndian::write_u16(&mut buf[5..], *write_address);
                let n = words.len();
                BigEndian::write_u16(&mut buf[7..], n as u16);
                buf[9] = n as u8 * 2;
                words.copy_to(&mut buf[10..]);
            }
        }
        Ok(self.pdu_len())
    }
}

impl Encode for Response<'_> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.pdu_len() {
            return Err(Error::BufferSize);
        }

        buf[0] = FunctionCode::from(*self).value();
        match self {
            Self::ReadCoils(coils) | Self::ReadDiscreteInputs(coils) => {
                buf[1] = coils.packed_len() as u8;
                coils.copy_to(&mut buf[2..]);
            }
            Self::ReadInputRegisters(registers)
            | Self::ReadHoldingRegisters(registers)
            | Self::ReadWriteMultipleRegisters(registers) => {
                buf[1] = (registers.len() * 2) as u8;
                registers.copy_to(&mut buf[2..]);
            }
            Self::WriteSingleCoil(address, state) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                BigEndian::write_u16(&mut buf[3..], bool_to_u16_coil(*state));
            }
            Self::WriteSingleRegister(address, value) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                buf[3..5].copy_from_slice(value);
            }
            Self::WriteMultipleCoils(address, payload)
            | Self::WriteMultipleRegisters(address, payload) => {
                BigEndian::write_u16(&mut buf[1..], *address);
                BigEndian::write_u16(&mut buf[3..], *payload);
            }
            Self::ReadServerId(id) => {
                buf[1] = id.server_id.len() as u8;
                let id_end = 2 + id.server_id.len();
                buf[2..id_end].copy_from_slice(id.server_id);
                buf[id_end] = id.run_status;
                buf[id_end + 1..id_end + 1 + id.additional_data.len()]
                    .copy_from_slice(id.additional_data);
            }
        }
        Ok(self.pdu_len())
    }
}

impl Encode for RequestPdu<'_> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        self.0.encode(buf)
    }
}

impl Encode for ResponsePdu<'_> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::BufferSize);
        }
        match self.0 {
            Ok(res) => res.encode(buf),
            Err(e) => e.encode(buf),
        }
    }
}

impl Encode for ExceptionResponse {
    fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(Error::BufferSize);
        }
        let [code, ex]: [u8; 2] = (*self).into();
        buf[0] = code;
        buf[1] = ex;
        Ok(2)
    }
}

const fn min_request_pdu_len(fn_code: FunctionCode) -> usize {
    use FunctionCode as F;
    match fn_code {
        F::ReadCoils
        | F::ReadDiscreteInputs
        | F::ReadInputRegisters
        | F::WriteSingleCoil
        | F::ReadHoldingRegisters
        | F::WriteSingleRegister => 5,
        F::WriteMultipleCoils | F::WriteMultipleRegisters => 6,
        F::ReadServerId => 1,
        F::ReadWriteMultipleRegisters => 10,
    }
}

const fn min_response_pdu_len(fn_code: FunctionCode) -> usize {
    use FunctionCode as F;
    match fn_code {
        F::ReadCoils
        | F::ReadDiscreteInputs
        | F::ReadInputRegisters
        | F::ReadHoldingRegisters
        | F::ReadWriteMultipleRegisters => 2,
        F::WriteSingleCoil
        | F::WriteMultipleCoils
        | F::WriteSingleRegister
        | F::WriteMultipleRegisters => 5,
        F::ReadServerId => 4,
    }
}
