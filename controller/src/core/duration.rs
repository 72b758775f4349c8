//! Go-style duration strings (`500ms`, `30s`, `1m30s`, `1.5h`)

use std::time::Duration;

const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60.0 * 1e9),
    ("h", 3600.0 * 1e9),
];

/// Parse a positive duration made of `<number><unit>` segments
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("duration is empty".to_string());
    }

    let mut rest = text;
    let mut nanos = 0f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {input:?}: expected a number"));
        }
        let number: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {input:?}: bad number {:?}", &rest[..number_len]))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| {
                if unit.is_empty() {
                    format!("invalid duration {input:?}: missing unit")
                } else {
                    format!("invalid duration {input:?}: unknown unit {unit:?}")
                }
            })?;
        rest = &rest[unit_len..];

        nanos += number * scale;
    }

    if nanos < 1.0 {
        return Err(format!("invalid duration {input:?}: must be positive"));
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
