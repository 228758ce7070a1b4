use base64::alphabet;
use base64::engine::general_purpose::{self, GeneralPurpose};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

/// Decoder used for subscription blobs: padding optional, trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    general_purpose::NO_PAD
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Decodes standard or URL-safe Base64 into UTF-8 text.
///
/// Whitespace inside the input is ignored and padding is optional. Returns `None`
/// when the input is not Base64 or does not decode to valid UTF-8.
pub fn try_base64_decode(input: &str) -> Option<String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    if compact.is_empty() {
        return None;
    }
    let bytes = LENIENT.decode(compact.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Converts a Base64 string to URL-safe Base64 format by replacing specific characters.
pub fn url_safe_base64_apply(input: &str) -> String {
    input
        .replace('+', "-")
        .replace('/', "_")
        .replace('=', "") // Remove padding
}

/// Encodes a string to URL-safe Base64 format.
pub fn url_safe_base64_encode(input: &str) -> String {
    url_safe_base64_apply(&base64_encode(input))
}
