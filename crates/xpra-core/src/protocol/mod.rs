//! Protocol module containing the packet vocabulary and the JSON codec.

pub mod codec;
pub mod packets;

pub use codec::{
    decode_packet, decode_packet_text, encode_packet, encode_packet_text, ProtocolError,
};
pub use packets::*;
