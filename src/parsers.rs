/// Cell value parsers shared by the ingestion pipeline
///
/// Lab sheets are filled in by hand, so a numeric cell may hold a real number,
/// a string with a comma decimal separator, or a range-qualified reading such
/// as `"<0.05"` (below the detection limit). These parsers never fail: a cell
/// that cannot be read becomes [`NumericValue::Absent`].
use calamine::Data;
use serde::Serialize;
use std::fmt;

/// Out-of-range marker attached to a reading by the instrument or the lab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Qualifier {
    /// Value was below the measurable range (`<`)
    #[serde(rename = "<")]
    Below,
    /// Value was above the measurable range (`>`)
    #[serde(rename = ">")]
    Above,
}

impl Qualifier {
    pub fn symbol(self) -> char {
        match self {
            Qualifier::Below => '<',
            Qualifier::Above => '>',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '<' => Some(Qualifier::Below),
            '>' => Some(Qualifier::Above),
            _ => None,
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Outcome of reading one numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    /// Nothing usable in the cell (empty, text, or a malformed number)
    Absent,
    /// A finite reading, optionally carrying an out-of-range qualifier
    Value {
        value: f64,
        qualifier: Option<Qualifier>,
    },
}

impl NumericValue {
    pub fn plain(value: f64) -> Self {
        NumericValue::Value {
            value,
            qualifier: None,
        }
    }

    pub fn qualified(value: f64, qualifier: Qualifier) -> Self {
        NumericValue::Value {
            value,
            qualifier: Some(qualifier),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            NumericValue::Value { value, .. } => Some(*value),
            NumericValue::Absent => None,
        }
    }

    pub fn qualifier(&self) -> Option<Qualifier> {
        match self {
            NumericValue::Value { qualifier, .. } => *qualifier,
            NumericValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NumericValue::Absent)
    }
}

/// Decimal-degree position of a sampling point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Parse a numeric cell that may carry a `<`/`>` qualifier
///
/// Numbers pass straight through. Strings are trimmed, a leading `<` or `>`
/// is captured as the qualifier, and commas are treated as decimal points.
/// A string that still does not parse yields [`NumericValue::Absent`], which
/// also drops any qualifier that was already seen.
pub fn parse_numeric(cell: &Data) -> NumericValue {
    match cell {
        Data::Float(f) if f.is_finite() => NumericValue::plain(*f),
        Data::Int(i) => NumericValue::plain(*i as f64),
        Data::String(s) => parse_numeric_str(s),
        _ => NumericValue::Absent,
    }
}

/// String form of [`parse_numeric`]
///
/// ```
/// use water_quality_charts::parsers::{parse_numeric_str, NumericValue, Qualifier};
///
/// assert_eq!(parse_numeric_str("12,5"), NumericValue::plain(12.5));
/// assert_eq!(parse_numeric_str("<0,05"), NumericValue::qualified(0.05, Qualifier::Below));
/// assert_eq!(parse_numeric_str("abc"), NumericValue::Absent);
/// ```
pub fn parse_numeric_str(raw: &str) -> NumericValue {
    let text = raw.trim();
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return NumericValue::Absent;
    };

    let (qualifier, rest) = match Qualifier::from_symbol(first) {
        Some(q) => (Some(q), chars.as_str()),
        None => (None, text),
    };

    match parse_decimal(rest) {
        Some(value) => NumericValue::Value { value, qualifier },
        None => NumericValue::Absent,
    }
}

/// Parse a `"lat lon"` coordinate cell
///
/// Accepts `"52.2297 21.0122"`, `"52,2297 21,0122"` and `"52,2297;21,0122"`.
/// Both numbers must parse or the whole pair is rejected.
pub fn parse_coordinates(cell: &Data) -> Option<Coordinates> {
    match cell {
        Data::String(s) => parse_coordinates_str(s),
        _ => None,
    }
}

pub fn parse_coordinates_str(raw: &str) -> Option<Coordinates> {
    let text = raw.trim().replace(',', ".").replace(';', " ");

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 2 {
        return None;
    }

    let latitude = parse_decimal(parts[0])?;
    let longitude = parse_decimal(parts[1])?;

    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Finite float with `,` accepted as the decimal separator
fn parse_decimal(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_int_and_float() {
        assert_eq!(parse_numeric(&Data::Int(42)), NumericValue::plain(42.0));
        assert_eq!(parse_numeric(&Data::Float(3.14)), NumericValue::plain(3.14));
    }

    #[test]
    fn test_parse_numeric_non_numeric_cells() {
        assert!(parse_numeric(&Data::Empty).is_absent());
        assert!(parse_numeric(&Data::Bool(true)).is_absent());
        assert!(parse_numeric(&Data::Float(f64::NAN)).is_absent());
    }

    #[test]
    fn test_parse_numeric_str_qualifiers() {
        assert_eq!(
            parse_numeric_str(">100"),
            NumericValue::qualified(100.0, Qualifier::Above)
        );
        assert_eq!(
            parse_numeric_str("  < 0.05 "),
            NumericValue::qualified(0.05, Qualifier::Below)
        );
    }

    #[test]
    fn test_parse_numeric_str_malformed_drops_qualifier() {
        assert_eq!(parse_numeric_str("<"), NumericValue::Absent);
        assert_eq!(parse_numeric_str("<abc"), NumericValue::Absent);
        assert_eq!(parse_numeric_str("   "), NumericValue::Absent);
    }

    #[test]
    fn test_parse_numeric_str_rejects_non_finite() {
        assert!(parse_numeric_str("inf").is_absent());
        assert!(parse_numeric_str("NaN").is_absent());
    }

    #[test]
    fn test_qualifier_symbol_round_trip() {
        assert_eq!(Qualifier::from_symbol('<'), Some(Qualifier::Below));
        assert_eq!(Qualifier::Above.to_string(), ">");
        assert_eq!(Qualifier::from_symbol('='), None);
    }

    #[test]
    fn test_parse_coordinates_partial_failure_discards_both() {
        assert_eq!(parse_coordinates_str("52.2297 abc"), None);
        assert_eq!(parse_coordinates_str("52.2297 21.0 7.0"), None);
    }

    #[test]
    fn test_parse_coordinates_non_string_cell() {
        assert_eq!(parse_coordinates(&Data::Float(52.0)), None);
    }
}
