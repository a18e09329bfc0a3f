//! Mapping between the store's typed-field wire format and plain records.

mod document;
mod value;

pub use document::{decode, encode, Document, Record};
pub use value::{decode_fields, encode_fields, CodecError, Fields, Value, WireFields};
