use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CatalogError, Result};

const MAX_TENTHS: f64 = 2_550.0;

/// Taxonomic status code such as `2.2`, held at tenths resolution.
///
/// Codes live in the store as REAL values; converting them to an integer
/// pair once at the boundary keeps band checks free of float comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode {
    tenths: u16,
}

/// Semantic band a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBand {
    Approved,
    Grouping,
    Synonym,
    Variety,
    Polytype,
    Mixture,
    Unclassified,
    Other,
}

impl StatusCode {
    pub const IMA_APPROVED: Self = Self::from_parts(0, 0);
    pub const MIXTURE_SPECIES: Self = Self::from_parts(5, 0);
    pub const NOT_YET_CLASSIFIED: Self = Self::from_parts(8, 0);

    #[must_use]
    pub const fn from_parts(major: u8, minor: u8) -> Self {
        let minor = if minor > 9 { 9 } else { minor };
        Self {
            tenths: major as u16 * 10 + minor as u16,
        }
    }

    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(CatalogError::DataIntegrity(format!(
                "status code out of range: {value}"
            )));
        }
        let scaled = value * 10.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 || rounded > MAX_TENTHS {
            return Err(CatalogError::DataIntegrity(format!(
                "status code must have at most one decimal place: {value}"
            )));
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "rounded is a non-negative integer no larger than MAX_TENTHS"
        )]
        let tenths = rounded as u16;
        Ok(Self { tenths })
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.tenths) / 10.0
    }

    #[must_use]
    pub const fn major(self) -> u16 {
        self.tenths / 10
    }

    #[must_use]
    pub const fn minor(self) -> u16 {
        self.tenths % 10
    }

    #[must_use]
    pub const fn band(self) -> StatusBand {
        match (self.major(), self.minor()) {
            (0, _) => StatusBand::Approved,
            (1, _) => StatusBand::Grouping,
            (2, _) => StatusBand::Synonym,
            (3, _) => StatusBand::Variety,
            (4, _) => StatusBand::Polytype,
            (5, 0) => StatusBand::Mixture,
            (8, 0) => StatusBand::Unclassified,
            _ => StatusBand::Other,
        }
    }
}

impl StatusBand {
    /// Whether a status in this band points the reader at another mineral record.
    #[must_use]
    pub const fn surfaces_relations(self) -> bool {
        matches!(self, Self::Synonym | Self::Mixture)
    }

    /// Bands counted by the "basic" status statistics.
    #[must_use]
    pub const fn is_basic(self) -> bool {
        matches!(self, Self::Grouping | Self::Unclassified)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Self::from_f64(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: f64) -> StatusCode {
        StatusCode::from_f64(value).expect("valid status code")
    }

    #[test]
    fn parses_tenths_and_formats_back() {
        let common = code(2.2);
        assert_eq!(common.major(), 2);
        assert_eq!(common.minor(), 2);
        assert_eq!(common.to_string(), "2.2");
        assert!((common.as_f64() - 2.2).abs() < f64::EPSILON);
        assert_eq!(code(4.0).to_string(), "4.0");
    }

    #[test]
    fn rejects_codes_finer_than_tenths_or_negative() {
        assert!(matches!(
            StatusCode::from_f64(2.25),
            Err(CatalogError::DataIntegrity(_))
        ));
        assert!(StatusCode::from_f64(-1.0).is_err());
        assert!(StatusCode::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn band_membership_is_explicit() {
        assert_eq!(code(0.0).band(), StatusBand::Approved);
        assert_eq!(code(1.3).band(), StatusBand::Grouping);
        for minor in 0..=9 {
            let synonym = StatusCode::from_parts(2, minor);
            assert_eq!(synonym.band(), StatusBand::Synonym);
        }
        assert_eq!(code(3.1).band(), StatusBand::Variety);
        assert_eq!(code(4.0).band(), StatusBand::Polytype);
        assert_eq!(code(5.0).band(), StatusBand::Mixture);
        assert_eq!(code(5.1).band(), StatusBand::Other);
        assert_eq!(code(8.0).band(), StatusBand::Unclassified);
        assert_eq!(code(9.9).band(), StatusBand::Other);
    }

    #[test]
    fn only_synonym_and_mixture_surface_relations() {
        assert!(code(2.2).band().surfaces_relations());
        assert!(StatusCode::MIXTURE_SPECIES.band().surfaces_relations());
        assert!(!StatusCode::IMA_APPROVED.band().surfaces_relations());
        assert!(!code(3.0).band().surfaces_relations());
        assert!(!code(5.1).band().surfaces_relations());
    }

    #[test]
    fn serializes_as_plain_number() {
        let value = serde_json::to_value(code(2.2)).expect("serialize");
        assert_eq!(value, serde_json::json!(2.2));
        let parsed: StatusCode = serde_json::from_value(serde_json::json!(1.4)).expect("parse");
        assert_eq!(parsed, code(1.4));
    }
}
