//! Coordinate tokens for the explore endpoint.
//!
//! The site expects latitude and longitude as base64 of the coordinate
//! formatted with exactly 8 fraction digits. The encoding operates on the
//! formatted text, so the digit count is part of the wire format: `40.7128`
//! must encode as `"40.71280000"`, not any numerically equal rendering.
//! Base64 padding is escaped for URL embedding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode a decimal coordinate as the site's opaque location token.
///
/// Deterministic and reversible: unescaping `%3D` back to `=`, base64
/// decoding, and parsing the result recovers the coordinate to 8 decimal
/// places.
#[must_use]
pub fn encode_coordinate(value: f64) -> String {
    let fixed = format!("{value:.8}");
    let token = STANDARD.encode(fixed.as_bytes());
    token.replace('=', "%3D")
}
