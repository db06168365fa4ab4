//! Outbound payment links.
//!
//! A payment link is the gateway base URL with the flattened payload as its
//! query string and the signature of the *unflattened* payload appended as
//! one more `signature` pair.

use serde::Serialize;
use url::Url;

use crate::signature::{self, SIGNATURE_FIELD, SignatureError};

/// Form-urlencode flattened pairs into a query string.
pub fn query_string(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Sign and flatten `payload`, then append the signature as the last pair.
pub fn signed_pairs<T: Serialize + ?Sized>(
    payload: &T,
    secret: &[u8],
) -> Result<Vec<(String, String)>, SignatureError> {
    let signature = signature::sign(payload, secret)?;
    let mut pairs = signature::flatten(payload)?;
    pairs.push((SIGNATURE_FIELD.to_owned(), signature));
    Ok(pairs)
}

/// Build the URL the buyer's browser is redirected to.
///
/// Any query already present on `base_url` is replaced.
pub fn build_payment_url<T: Serialize + ?Sized>(
    base_url: &Url,
    payload: &T,
    secret: &[u8],
) -> Result<Url, SignatureError> {
    let pairs = signed_pairs(payload, secret)?;
    let mut url = base_url.clone();
    url.set_query(Some(&query_string(&pairs)));
    Ok(url)
}
