//! URL validation: the only gate in front of outbound network access.

use url::Url;

use founderfuel_shared::{FounderFuelError, Result};

/// Parse `input` as an absolute URL and accept only `http` and `https`.
///
/// Any parse failure or other scheme yields [`FounderFuelError::InvalidUrl`]
/// carrying the original input.
pub fn validate_url(input: &str) -> Result<Url> {
    let parsed = Url::parse(input).map_err(|_| FounderFuelError::invalid_url(input))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FounderFuelError::invalid_url(input)),
    }
}
