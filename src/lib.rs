pub mod decoder;
pub mod encode;
pub mod error;
pub mod logging;
pub mod packet;
pub mod reader;

pub use decoder::{DecodedPacket, Values, depacketize, depacketize_hex};
pub use error::{DecodeError, PacketError};
pub use packet::{Element, ElementType, Packet, PacketState};
