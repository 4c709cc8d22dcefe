use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;

/// A user as returned by the directory API
///
/// Records are read-only once received. Text fields may be missing or null in
/// the upstream payload; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub company: Company,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub geo: Geo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    pub lat: Option<Coordinate>,
    pub lng: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: Option<String>,
}

/// Latitude or longitude as sent by the API: either a JSON number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    /// Numeric value of the coordinate, parsed the lenient way browsers parse
    /// floats: leading whitespace is skipped and trailing garbage ignored.
    /// Non-finite values are rejected.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Coordinate::Number(v) if v.is_finite() => Some(*v),
            Coordinate::Number(_) => None,
            Coordinate::Text(text) => parse_leading_float(text),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Coordinate::Number(_))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Number(v) => write!(f, "{}", v),
            Coordinate::Text(text) => f.write_str(text),
        }
    }
}

impl UserRecord {
    /// Parsed (latitude, longitude), if both are valid numbers
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.address.geo.lat.as_ref()?.to_f64()?;
        let lng = self.address.geo.lng.as_ref()?.to_f64()?;
        Some((lat, lng))
    }
}

fn parse_leading_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            b'e' | b'E' if seen_digit => {
                // Only consume the exponent when digits follow it
                let mut j = end + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                let digits_start = j;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > digits_start {
                    end = j;
                }
                break;
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
