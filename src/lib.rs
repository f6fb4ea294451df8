mod codec;
mod error;
mod frame;

pub use codec::*;
pub use error::*;
pub use frame::*;
