//! Signature codec and wire objects for a payment-link gateway.
//!
//! * [`signature`] — canonical JSON, HMAC-SHA256 signing, bracket-notation
//!   form encoding.
//! * [`link`] — signed outbound payment URLs.
//! * [`redirect`] — verification of the post-payment browser redirect.
//! * [`objects`] — typed payloads.

#![forbid(unsafe_code)]

pub mod link;
pub mod objects;
pub mod redirect;
pub mod signature;
