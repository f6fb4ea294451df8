// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use crate::error::*;
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Byte and word ordering of multi-register values.
///
/// Two independent axes packed into one bitfield: the endianness of each
/// 16-bit word and the word order inside 32/64-bit scalars. Word order is
/// not standardized across vendors, so both axes stay maskable instead of
/// collapsing into a four-value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteOrder(u8);

impl ByteOrder {
    /// Most significant byte first within each 16-bit word.
    pub const BIG_ENDIAN: Self = Self(0b0001);
    /// Least significant byte first within each 16-bit word.
    pub const LITTLE_ENDIAN: Self = Self(0b0010);
    /// Most significant word first within 32/64-bit values.
    pub const HIGH_WORD_FIRST: Self = Self(0b0100);
    /// Least significant word first within 32/64-bit values.
    pub const LOW_WORD_FIRST: Self = Self(0b1000);

    /// Plain big-endian, the wire default.
    pub const BIG_ENDIAN_HIGH_WORD_FIRST: Self = Self(0b0101);
    /// Big-endian words, low word first (common legacy vendor layout).
    pub const BIG_ENDIAN_LOW_WORD_FIRST: Self = Self(0b1001);
    pub const LITTLE_ENDIAN_HIGH_WORD_FIRST: Self = Self(0b0110);
    pub const LITTLE_ENDIAN_LOW_WORD_FIRST: Self = Self(0b1010);

    /// Combine the flags of both orders.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether all flags of `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    const fn is_little_endian(self) -> bool {
        self.0 & Self::LITTLE_ENDIAN.0 != 0
    }

    const fn is_low_word_first(self) -> bool {
        self.0 & Self::LOW_WORD_FIRST.0 != 0
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::BIG_ENDIAN_HIGH_WORD_FIRST
    }
}

/// Typed read-only view over the register bytes of a read response.
///
/// The window starts at the register address the originating request asked
/// for; every reader takes absolute register addresses, not offsets. The
/// view borrows the response payload and never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers<'r> {
    start_address: Address,
    /// One past the last register, as `start_address + data.len() / 2`.
    end_address: u32,
    data: RawData<'r>,
    default_byte_order: ByteOrder,
}

impl<'r> Registers<'r> {
    /// Create a view with the default big-endian, high-word-first order.
    pub fn new(start_address: Address, data: &'r [u8]) -> Result<Self, Error> {
        Self::with_byte_order(start_address, data, ByteOrder::default())
    }

    /// Create a view with an explicit default byte order.
    pub fn with_byte_order(
        start_address: Address,
        data: &'r [u8],
        byte_order: ByteOrder,
    ) -> Result<Self, Error> {
        if data.len() < 2 {
            return Err(Error::BufferSize);
        }
        if data.len() % 2 != 0 {
            return Err(Error::OddDataLength);
        }
        let end_address = u32::from(start_address) + (data.len() / 2) as u32;
        Ok(Self {
            start_address,
            end_address,
            data,
            default_byte_order: byte_order,
        })
    }

    #[must_use]
    pub const fn start_address(&self) -> Address {
        self.start_address
    }

    /// Number of 16-bit registers in the window.
    #[must_use]
    pub const fn register_count(&self) -> usize {
        self.data.len() / 2
    }

    #[must_use]
    pub const fn default_byte_order(&self) -> ByteOrder {
        self.default_byte_order
    }

    /// Byte offset of `address`, requiring `quantity` whole registers.
    fn offset_of(&self, address: Address, quantity: usize) -> Result<usize, Error> {
        if address < self.start_address {
            return Err(Error::AddressUnderBounds);
        }
        let offset = (address - self.start_address) as usize;
        if u32::from(address) + quantity as u32 > self.end_address {
            return Err(Error::AddressOverQuantityBounds);
        }
        Ok(offset * 2)
    }

    /// Byte offset of `address` for a raw window of `bytes` bytes.
    ///
    /// Odd lengths are rounded up to the enclosing register.
    fn offset_of_bytes(&self, address: Address, bytes: usize) -> Result<usize, Error> {
        if address < self.start_address {
            return Err(Error::AddressUnderBounds);
        }
        let offset = (address - self.start_address) as usize;
        let quantity = bytes.div_ceil(2);
        if u32::from(address) + quantity as u32 > self.end_address {
            return Err(Error::AddressOverDataBounds);
        }
        Ok(offset * 2)
    }

    /// Single bit of one register.
    ///
    /// Bits count from 0 in big-endian register convention: 0..=7 live in
    /// the low byte, 8..=15 in the high byte.
    pub fn bit(&self, address: Address, bit: u8) -> Result<bool, Error> {
        if bit > 15 {
            return Err(Error::BitIndex(bit));
        }
        let offset = self.offset_of(address, 1)?;
        let byte = if bit < 8 {
            self.data[offset + 1]
        } else {
            self.data[offset]
        };
        Ok((byte >> (bit % 8)) & 0b1 > 0)
    }

    /// One byte of a register; the high byte is wire offset 0.
    pub fn read_u8(&self, address: Address, from_high_byte: bool) -> Result<u8, Error> {
        let offset = self.offset_of(address, 1)?;
        Ok(if from_high_byte {
            self.data[offset]
        } else {
            self.data[offset + 1]
        })
    }

    pub fn read_i8(&self, address: Address, from_high_byte: bool) -> Result<i8, Error> {
        self.read_u8(address, from_high_byte).map(|b| b as i8)
    }

    /// One register, endianness per the view's default byte order.
    ///
    /// The word-order axis is meaningless for a single word and ignored.
    pub fn read_u16(&self, address: Address) -> Result<u16, Error> {
        let offset = self.offset_of(address, 1)?;
        let bytes = &self.data[offset..offset + 2];
        Ok(if self.default_byte_order.is_little_endian() {
            LittleEndian::read_u16(bytes)
        } else {
            BigEndian::read_u16(bytes)
        })
    }

    pub fn read_i16(&self, address: Address) -> Result<i16, Error> {
        self.read_u16(address).map(|v| v as i16)
    }

    pub fn read_u32(&self, address: Address) -> Result<u32, Error> {
        self.read_u32_with(address, self.default_byte_order)
    }

    /// Two registers; the low word leads when `LOW_WORD_FIRST` is set,
    /// endianness applies within each word afterwards.
    pub fn read_u32_with(&self, address: Address, byte_order: ByteOrder) -> Result<u32, Error> {
        let mut bytes = self.double_register(address, byte_order)?;
        if byte_order.is_little_endian() {
            swap_word_bytes(&mut bytes);
        }
        Ok(BigEndian::read_u32(&bytes))
    }

    pub fn read_i32(&self, address: Address) -> Result<i32, Error> {
        self.read_u32(address).map(|v| v as i32)
    }

    pub fn read_i32_with(&self, address: Address, byte_order: ByteOrder) -> Result<i32, Error> {
        self.read_u32_with(address, byte_order).map(|v| v as i32)
    }

    pub fn read_f32(&self, address: Address) -> Result<f32, Error> {
        self.read_f32_with(address, self.default_byte_order)
    }

    pub fn read_f32_with(&self, address: Address, byte_order: ByteOrder) -> Result<f32, Error> {
        self.read_u32_with(address, byte_order).map(f32::from_bits)
    }

    pub fn read_u64(&self, address: Address) -> Result<u64, Error> {
        self.read_u64_with(address, self.default_byte_order)
    }

    /// Four registers; `LOW_WORD_FIRST` reverses the word sequence
    /// (register 3 first, then 2, 1, 0).
    pub fn read_u64_with(&self, address: Address, byte_order: ByteOrder) -> Result<u64, Error> {
        let mut bytes = self.quad_register(address, byte_order)?;
        if byte_order.is_little_endian() {
            swap_word_bytes(&mut bytes);
        }
        Ok(BigEndian::read_u64(&bytes))
    }

    pub fn read_i64(&self, address: Address) -> Result<i64, Error> {
        self.read_u64(address).map(|v| v as i64)
    }

    pub fn read_i64_with(&self, address: Address, byte_order: ByteOrder) -> Result<i64, Error> {
        self.read_u64_with(address, byte_order).map(|v| v as i64)
    }

    pub fn read_f64(&self, address: Address) -> Result<f64, Error> {
        self.read_f64_with(address, self.default_byte_order)
    }

    pub fn read_f64_with(&self, address: Address, byte_order: ByteOrder) -> Result<f64, Error> {
        self.read_u64_with(address, byte_order).map(f64::from_bits)
    }

    /// ASCII string of at most `length` bytes starting at `address`.
    ///
    /// The scan stops at the first NUL; the terminator is not returned.
    /// Register data is big-endian on the wire; a little-endian order swaps
    /// the two bytes of every register before the scan.
    pub fn read_string(&self, address: Address, length: u16) -> Result<String, Error> {
        self.read_string_with(address, length, self.default_byte_order)
    }

    pub fn read_string_with(
        &self,
        address: Address,
        length: u16,
        byte_order: ByteOrder,
    ) -> Result<String, Error> {
        let bytes = self.read_bytes_with(address, length, byte_order)?;
        let terminated = match bytes.iter().position(|&b| b == 0) {
            Some(nul) => &bytes[..nul],
            None => &bytes[..],
        };
        Ok(String::from_utf8_lossy(terminated).into_owned())
    }

    /// Raw byte window with the same per-register swap rule as
    /// [`read_string`](Self::read_string).
    ///
    /// An odd `length` reads one extra byte to complete the last register
    /// and returns exactly `length` bytes.
    pub fn read_bytes(&self, address: Address, length: u16) -> Result<Vec<u8>, Error> {
        self.read_bytes_with(address, length, self.default_byte_order)
    }

    pub fn read_bytes_with(
        &self,
        address: Address,
        length: u16,
        byte_order: ByteOrder,
    ) -> Result<Vec<u8>, Error> {
        let length = length as usize;
        let offset = self.offset_of_bytes(address, length)?;
        let full = length.div_ceil(2) * 2;
        let mut bytes = self.data[offset..offset + full].to_vec();
        if byte_order.is_little_endian() {
            swap_word_bytes(&mut bytes);
        }
        bytes.truncate(length);
        Ok(bytes)
    }

    /// Compare `pattern` against the raw wire bytes at `address`.
    pub fn is_equal_bytes(
        &self,
        address: Address,
        length: u16,
        pattern: &[u8],
    ) -> Result<bool, Error> {
        let length = length as usize;
        let offset = self.offset_of_bytes(address, length)?;
        Ok(&self.data[offset..offset + length] == pattern)
    }

    /// Raw copy of one register.
    pub fn register(&self, address: Address) -> Result<[u8; 2], Error> {
        let offset = self.offset_of(address, 1)?;
        let mut out = [0; 2];
        out.copy_from_slice(&self.data[offset..offset + 2]);
        Ok(out)
    }

    /// Raw copy of two registers with the word-order swap applied.
    pub fn double_register(
        &self,
        address: Address,
        byte_order: ByteOrder,
    ) -> Result<[u8; 4], Error> {
        let offset = self.offset_of(address, 2)?;
        let mut out = [0; 4];
        out.copy_from_slice(&self.data[offset..offset + 4]);
        if byte_order.is_low_word_first() {
            out.swap(0, 2);
            out.swap(1, 3);
        }
        Ok(out)
    }

    /// Raw copy of four registers with the word-order swap applied.
    pub fn quad_register(
        &self,
        address: Address,
        byte_order: ByteOrder,
    ) -> Result<[u8; 8], Error> {
        let offset = self.offset_of(address, 4)?;
        let mut out = [0; 8];
        out.copy_from_slice(&self.data[offset..offset + 8]);
        if byte_order.is_low_word_first() {
            out.swap(0, 6);
            out.swap(1, 7);
            out.swap(2, 4);
            out.swap(3, 5);
        }
        Ok(out)
    }
}

/// Swap the two bytes of every 16-bit word in place.
fn swap_word_bytes(bytes: &mut [u8]) {
    for word in bytes.chunks_exact_mut(2) {
        word.swap(0, 1);
    }
}
