//! Types shared by every ticketai crate
//!
//! - **Correlation**: `RequestId` and `RequestContext` carried through a
//!   report or assignment request
//! - **Sensitive data**: `Sensitive<T>` keeps API keys out of logs
//! - **Schema constants**: canonical structured-log field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestContext, RequestId};
pub use sensitive::Sensitive;
