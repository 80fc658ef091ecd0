//! Free-text city identifier resolution

use crate::{CityKey, CoreError, CoreResult};

/// Map a caller-supplied city string onto a supported [`CityKey`]
///
/// The input is lower-cased with whitespace removed, then matched by
/// substring: `cdmx`/`mexicocity` first, then `la`/`losangeles`. The bare `la`
/// token matches any name containing those two letters in a row.
pub fn resolve(raw: &str) -> CoreResult<CityKey> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    if compact.contains("cdmx") || compact.contains("mexicocity") {
        Ok(CityKey::Cdmx)
    } else if compact.contains("la") || compact.contains("losangeles") {
        Ok(CityKey::La)
    } else {
        Err(CoreError::UnsupportedCity(raw.to_string()))
    }
}
