use super::*;
use rand::Rng as _;

pub type TransactionId = u16;
pub type UnitId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: TransactionId,
    pub unit_id: UnitId,
}

impl Header {
    /// Header with a fresh pseudo-random transaction id in `[1, 65534]`.
    ///
    /// Zero and 65535 are avoided so a correlation failure is always
    /// distinguishable from an uninitialized or saturated field. Overwrite
    /// `transaction_id` to inject a deterministic value.
    #[must_use]
    pub fn new(unit_id: UnitId) -> Self {
        Self {
            transaction_id: rand::thread_rng().gen_range(1..=0xFFFE),
            unit_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAdu<'r> {
    pub hdr: Header,
    pub pdu: RequestPdu<'r>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseAdu<'r> {
    pub hdr: Header,
    pub pdu: ResponsePdu<'r>,
}

impl ResponseAdu<'_> {
    /// Total wire length of the encoded response, MBAP prefix included.
    #[must_use]
    pub const fn response_len(&self) -> usize {
        7 + self.pdu.pdu_len()
    }
}

impl RequestAdu<'_> {
    /// Total wire length of the encoded request, MBAP prefix included.
    #[must_use]
    pub const fn request_len(&self) -> usize {
        7 + self.pdu.0.pdu_len()
    }

    /// Total wire length of the expected response, MBAP prefix included.
    #[must_use]
    pub const fn expected_response_len(&self) -> usize {
        7 + self.pdu.0.expected_response_pdu_len()
    }

    /// Routing projection with the unit id filled in from the header.
    #[must_use]
    pub fn destination(&self) -> RequestDestination {
        self.pdu.0.destination(self.hdr.unit_id)
    }
}
