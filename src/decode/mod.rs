//! Field decoders for inconsistently encoded legacy columns
//!
//! Everything here is pure: no decoder panics or errors on malformed input,
//! it returns `None` instead and the caller picks a default.

pub mod cascade;
pub mod text_array;

pub use cascade::{
    decode_url_list, Cascade, Decoded, NamedStrategy, Strategy, URL_LIST, URL_LIST_STRATEGIES,
};
pub use text_array::{decode_non_empty, decode_string_array, normalize_array_text};
