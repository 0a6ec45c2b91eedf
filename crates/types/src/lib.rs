//! Tollgate core types
//!
//! Value types shared by the fee assessor, the block minter and the
//! governance handlers. Everything here is deterministic: amounts are
//! big integers, fractions are fixed-point, and no clock is ever read.

pub mod address;
pub mod coin;
pub mod decimal;
pub mod event;
pub mod fault;
pub mod keeper;
pub mod message;
pub mod time;

pub use address::*;
pub use coin::*;
pub use decimal::*;
pub use event::*;
pub use fault::*;
pub use keeper::*;
pub use message::*;
pub use time::*;
