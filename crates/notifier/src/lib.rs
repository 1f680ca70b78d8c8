//! Broadcast fan-out: recipient listing, addressee normalization, transports
//! and the dispatcher tying them together.

pub mod dispatcher;
pub mod email;
pub mod phone;
pub mod sms;
pub mod source;
pub mod transport;
