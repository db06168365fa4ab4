//! Wire objects: gateway payloads and the checkout service's own API types.

pub mod checkout;
pub mod notification;
pub mod payment_link;

pub use notification::{NotifiedProduct, PaymentNotification, PaymentStatus};
pub use payment_link::{LinkAction, PaymentLinkRequest, Product};

use crate::signature::{self, SignatureError};

/// Marker trait for payloads that are signed with the gateway's scheme.
pub trait Signable: serde::Serialize {
    /// Lowercase hex HMAC-SHA256 over the canonical form of `self`.
    fn signature(&self, secret: &[u8]) -> Result<String, SignatureError> {
        signature::sign(self, secret)
    }

    /// Compare `candidate` with the signature of `self`.
    fn verify_signature(&self, secret: &[u8], candidate: &str) -> Result<bool, SignatureError> {
        signature::verify(self, secret, candidate)
    }
}
