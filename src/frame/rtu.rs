// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

/// Slave ID
pub type SlaveId = u8;

/// RTU header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub slave: SlaveId,
}

/// RTU Request ADU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAdu<'r> {
    pub hdr: Header,
    pub pdu: RequestPdu<'r>,
}

/// RTU Response ADU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseAdu<'r> {
    pub hdr: Header,
    pub pdu: ResponsePdu<'r>,
}

impl ResponseAdu<'_> {
    /// Total wire length of the encoded response, trailing CRC included.
    #[must_use]
    pub const fn response_len(&self) -> usize {
        3 + self.pdu.pdu_len()
    }
}

impl RequestAdu<'_> {
    /// Total wire length of the encoded request, trailing CRC included.
    #[must_use]
    pub const fn request_len(&self) -> usize {
        3 + self.pdu.0.pdu_len()
    }

    /// Total wire length of the expected response, trailing CRC included.
    #[must_use]
    pub const fn expected_response_len(&self) -> usize {
        3 + self.pdu.0.expected_response_pdu_len()
    }

    /// Routing projection with the unit id filled in from the header.
    #[must_use]
    pub fn destination(&self) -> RequestDestination {
        self.pdu.0.destination(self.hdr.slave)
    }
}
