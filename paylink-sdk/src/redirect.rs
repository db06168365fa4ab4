//! Verification of the browser redirect that follows a payment.
//!
//! The gateway appends `_payform_*` parameters and a `_payform_sign`
//! signature to the return URL. Which parameters it signs is not fixed by
//! its documentation, so two scopes are tried in order:
//!
//! 1. every query parameter except the signature;
//! 2. only the `_payform_`-prefixed parameters.
//!
//! A redirect is accepted only if one of them reproduces the signature.

use serde_json::{Map, Value};

use crate::signature::{self, SignatureError};

/// Query parameter carrying the redirect signature.
pub const RETURN_SIGNATURE_FIELD: &str = "_payform_sign";

/// Prefix of the gateway-owned redirect parameters.
pub const RETURN_PARAM_PREFIX: &str = "_payform_";

pub const RETURN_STATUS_FIELD: &str = "_payform_status";
pub const RETURN_ORDER_FIELD: &str = "_payform_order_id";
pub const RETURN_PAYMENT_FIELD: &str = "_payform_id";

/// Status value the gateway reports for a completed payment.
pub const RETURN_STATUS_SUCCESS: &str = "success";

/// Which parameter subset reproduced the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningScope {
    All,
    Namespaced,
}

/// The gateway-owned fields of a verified redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnParams {
    pub status: Option<String>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
}

impl ReturnParams {
    fn from_params(params: &Map<String, Value>) -> Self {
        let field = |name: &str| params.get(name).and_then(Value::as_str).map(str::to_owned);
        Self {
            status: field(RETURN_STATUS_FIELD),
            order_id: field(RETURN_ORDER_FIELD),
            payment_id: field(RETURN_PAYMENT_FIELD),
        }
    }

    /// Whether the gateway reported the payment as completed.
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(RETURN_STATUS_SUCCESS)
    }
}

/// Outcome of [`verify_return`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnVerification {
    Verified {
        scope: SigningScope,
        params: ReturnParams,
    },
    MissingSignature,
    /// Neither scope matched. Both computed signatures are kept for logging.
    Rejected {
        received: String,
        primary: String,
        fallback: String,
    },
}

/// Verify the raw query string of a return redirect.
pub fn verify_return(query: &str, secret: &[u8]) -> Result<ReturnVerification, SignatureError> {
    let Value::Object(mut params) = signature::parse(query) else {
        return Ok(ReturnVerification::MissingSignature);
    };
    let Some(Value::String(received)) = params.remove(RETURN_SIGNATURE_FIELD) else {
        return Ok(ReturnVerification::MissingSignature);
    };

    let primary = signature::sign(&params, secret)?;
    if primary == received {
        return Ok(ReturnVerification::Verified {
            scope: SigningScope::All,
            params: ReturnParams::from_params(&params),
        });
    }

    let namespaced: Map<String, Value> = params
        .iter()
        .filter(|(key, _)| key.starts_with(RETURN_PARAM_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let fallback = signature::sign(&namespaced, secret)?;
    if fallback == received {
        return Ok(ReturnVerification::Verified {
            scope: SigningScope::Namespaced,
            params: ReturnParams::from_params(&namespaced),
        });
    }

    Ok(ReturnVerification::Rejected {
        received,
        primary,
        fallback,
    })
}
