//! Signature codec for the payment gateway.
//!
//! Outbound payment links and inbound callbacks are signed the same way:
//!
//! ```text
//! hex(HMAC-SHA256(escape_slashes(compact_json(canonicalize(payload))), secret))
//! ```
//!
//! * `canonicalize` sorts object keys at every depth and keeps array order.
//! * `compact_json` is serde_json's compact output, except that floats are
//!   written the way a JavaScript `JSON.stringify` writes them: plain
//!   decimal for `1e-7 <= |x| < 1e21`, exponent form (`1e+21`) outside.
//! * `escape_slashes` rewrites every `/` as `\/`, because the gateway's
//!   reference SDK is written in PHP and `json_encode` escapes slashes.
//!
//! The same module also converts payloads to and from the bracket-notation
//! form encoding (`products[0][name]=...`) that the gateway uses on the wire.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::io;

/// Header carrying the signature of an inbound webhook body.
pub const SIGNATURE_HEADER: &str = "Sign";

/// Query key under which the signature of an outbound payment link is sent.
pub const SIGNATURE_FIELD: &str = "signature";

/// Largest index a form key may use to be read back as an array slot.
///
/// Objects with bigger numeric keys stay objects.
pub const MAX_ARRAY_INDEX: usize = 10_000;

/// `Number.MAX_SAFE_INTEGER` of the reference JSON serializer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),
}

// ---------------------------------------------------------------------------
// Canonical form
// ---------------------------------------------------------------------------

/// Rebuild `value` with object keys in ordinal order at every depth.
///
/// Arrays keep their order. Floats holding an integral value within the safe
/// integer range become integers, so `2.0` serializes as `2`.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let canonical: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key.clone(), canonicalize(value)))
                .collect();
            Value::Object(canonical)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Number(number) => Value::Number(normalize_number(number)),
        other => other.clone(),
    }
}

fn normalize_number(number: &Number) -> Number {
    match number.as_f64() {
        Some(float)
            if number.is_f64() && float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER =>
        {
            Number::from(float as i64)
        }
        _ => number.clone(),
    }
}

/// The exact text that gets signed for `payload`.
pub fn signing_text<T: Serialize + ?Sized>(payload: &T) -> Result<String, SignatureError> {
    let value = canonicalize(&serde_json::to_value(payload)?);
    let mut out = Vec::new();
    value.serialize(&mut serde_json::Serializer::with_formatter(
        &mut out,
        CanonicalFormatter,
    ))?;
    let json = String::from_utf8(out)
        .map_err(|_| SignatureError::InvalidPayload("signing text is not valid UTF-8"))?;
    Ok(json.replace('/', "\\/"))
}

/// Compact JSON with JavaScript number formatting for floats.
struct CanonicalFormatter;

impl serde_json::ser::Formatter for CanonicalFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(js_number(value).as_bytes())
    }
}

/// Format a finite float like JavaScript's `Number.prototype.toString`.
///
/// Shortest round-trip digits, laid out as plain decimal for
/// `1e-7 <= |x| < 1e21` and as `d.ddde±x` otherwise. `-0` is `0`.
fn js_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    // `{:e}` yields the shortest round-trip digits, e.g. `1.5e-6`, `1e16`.
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    // Position of the decimal point relative to the first digit.
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exponent.abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exponent.abs())
        }
    };

    if value < 0.0 { format!("-{body}") } else { body }
}

/// Text of a number leaf, matching its form in the signing text.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() => js_number(float),
        _ => number.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Sign `payload` with `secret`, returning the lowercase hex digest.
pub fn sign<T: Serialize + ?Sized>(payload: &T, secret: &[u8]) -> Result<String, SignatureError> {
    let text = signing_text(payload)?;
    tracing::trace!(%text, "signing payload");
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        text.as_bytes(),
    );
    Ok(hex::encode(tag.as_ref()))
}

/// Recompute the signature of `payload` and compare it with `candidate`.
///
/// The comparison is an exact string match: an upper-case hex digest does
/// not match. A mismatch is `Ok(false)`; errors only come from payloads that
/// cannot be represented as JSON.
pub fn verify<T: Serialize + ?Sized>(
    payload: &T,
    secret: &[u8],
    candidate: &str,
) -> Result<bool, SignatureError> {
    Ok(sign(payload, secret)? == candidate)
}

// ---------------------------------------------------------------------------
// Bracket-notation form encoding
// ---------------------------------------------------------------------------

/// Flatten `payload` into `(bracket_path, value)` pairs.
///
/// `{"a": {"b": 1}, "c": [{"d": "x"}]}` becomes `a[b]=1`, `c[0][d]=x`.
/// Booleans render as `true`/`false` and `null` as an empty string. Empty
/// objects and arrays produce no pairs.
pub fn flatten<T: Serialize + ?Sized>(
    payload: &T,
) -> Result<Vec<(String, String)>, SignatureError> {
    let value = canonicalize(&serde_json::to_value(payload)?);
    let mut pairs = Vec::new();
    match &value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(key.clone(), child, &mut pairs);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(index.to_string(), child, &mut pairs);
            }
        }
        _ => {
            return Err(SignatureError::InvalidPayload(
                "top-level payload must be an object or an array",
            ));
        }
    }
    Ok(pairs)
}

fn flatten_into(path: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(format!("{path}[{key}]"), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(format!("{path}[{index}]"), child, out);
            }
        }
        Value::String(s) => out.push((path, s.clone())),
        Value::Number(n) => out.push((path, number_text(n))),
        Value::Bool(b) => out.push((path, b.to_string())),
        Value::Null => out.push((path, String::new())),
    }
}

/// Decode an `application/x-www-form-urlencoded` body with bracket-notation
/// keys into a nested structure.
///
/// Every leaf is a string. Objects whose keys are all array indices become
/// arrays, with missing slots filled by `null`. Repeated keys keep the last
/// value; `a[]` appends to `a`.
///
/// Not every digit-only key is an index: keys with a leading zero (`01`)
/// and keys above [`MAX_ARRAY_INDEX`] keep their object. A peer that turns
/// such objects into arrays signs a different text, so signatures over
/// those bodies will not match.
pub fn parse(body: &str) -> Value {
    let mut root = Map::new();
    for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
        let path = split_key(&key);
        insert_path(&mut root, &path, Value::String(value.into_owned()));
    }
    arrays_from_indexed_objects(Value::Object(root))
}

/// `products[0][name]` -> `["products", "0", "name"]`.
///
/// Keys that are not a well-formed bracket path are kept whole.
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_owned()];
    };
    let (root, mut rest) = key.split_at(open);
    let mut segments = vec![root.to_owned()];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return vec![key.to_owned()];
        };
        let Some(close) = inner.find(']') else {
            return vec![key.to_owned()];
        };
        segments.push(inner[..close].to_owned());
        rest = &inner[close + 1..];
    }
    segments
}

fn insert_path(node: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    let key = if head.is_empty() {
        next_index(node)
    } else {
        head.clone()
    };

    if tail.is_empty() {
        node.insert(key, value);
        return;
    }

    let child = node
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        // A scalar written earlier under the same prefix loses to the deeper path.
        *child = Value::Object(Map::new());
    }
    if let Value::Object(child) = child {
        insert_path(child, tail, value);
    }
}

fn next_index(node: &Map<String, Value>) -> String {
    node.keys()
        .filter_map(|key| array_index(key))
        .max()
        .map_or(0, |max| max + 1)
        .to_string()
}

/// `Some(i)` when `key` is a canonical decimal index (`0`, `1`, `17`, not `01`).
fn array_index(key: &str) -> Option<usize> {
    let digits = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());
    if !digits || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok().filter(|index| *index <= MAX_ARRAY_INDEX)
}

fn arrays_from_indexed_objects(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, child)| (key, arrays_from_indexed_objects(child)))
                .collect();

            let indices: Option<Vec<usize>> = map.keys().map(|key| array_index(key)).collect();
            match indices {
                Some(indices) if !indices.is_empty() => {
                    let len = indices.iter().max().map_or(0, |max| max + 1);
                    let mut items = vec![Value::Null; len];
                    for (key, child) in map {
                        if let Some(slot) = array_index(&key).and_then(|i| items.get_mut(i)) {
                            *slot = child;
                        }
                    }
                    Value::Array(items)
                }
                _ => Value::Object(map),
            }
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(arrays_from_indexed_objects).collect())
        }
        other => other,
    }
}
