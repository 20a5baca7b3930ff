//! Wire protocol shared by charging points, the coordinator and clients.
//!
//! Every message is a single JSON line shaped `{"action": ..., "content": {...}}`.

mod codec;
mod message;
mod transport;

pub use crate::codec::{ProtocolError, decode, encode};
pub use crate::message::*;
pub use crate::transport::{Endpoint, TransportError, serve};
