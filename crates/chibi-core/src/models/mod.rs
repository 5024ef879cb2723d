//! Domain models for the Chibi backend

pub mod call;
pub mod cdr;
pub mod message;
pub mod user;
pub mod worker;

pub use call::PhoneCall;
pub use cdr::{CarrierCall, Cdr};
pub use message::Message;
pub use user::User;
pub use worker::{JobClaim, WorkerSnapshot};
