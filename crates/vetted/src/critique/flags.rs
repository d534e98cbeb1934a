//! Named validation flags.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named validation failure attached to a review item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CritiqueFlag {
    /// Word count outside the allowed range.
    WordCountOutOfRange,
    /// Neither city nor country is mentioned.
    LocationMissing,
    /// The star rating is not mentioned.
    RatingMissing,
    /// Too few or too many scored attributes are referenced.
    AmenityCountInvalid,
    /// Marketing superlative without a supporting number.
    VagueSuperlative,
    /// The input record was malformed; set by the pipeline, not the engine.
    DataError,
    /// The generator produced nothing usable; set by the pipeline.
    GenerationFailed,
}

/// Ordered set of flags. Ordering keeps serialized output stable.
pub type FlagSet = BTreeSet<CritiqueFlag>;

impl CritiqueFlag {
    /// Flags the critique engine can raise.
    pub const ADVISORY: [CritiqueFlag; 5] = [
        CritiqueFlag::WordCountOutOfRange,
        CritiqueFlag::LocationMissing,
        CritiqueFlag::RatingMissing,
        CritiqueFlag::AmenityCountInvalid,
        CritiqueFlag::VagueSuperlative,
    ];

    /// Stable kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CritiqueFlag::WordCountOutOfRange => "word-count-out-of-range",
            CritiqueFlag::LocationMissing => "location-missing",
            CritiqueFlag::RatingMissing => "rating-missing",
            CritiqueFlag::AmenityCountInvalid => "amenity-count-invalid",
            CritiqueFlag::VagueSuperlative => "vague-superlative",
            CritiqueFlag::DataError => "data-error",
            CritiqueFlag::GenerationFailed => "generation-failed",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CritiqueFlag::WordCountOutOfRange => "Word count out of range",
            CritiqueFlag::LocationMissing => "Location missing",
            CritiqueFlag::RatingMissing => "Star rating missing",
            CritiqueFlag::AmenityCountInvalid => "Amenity count invalid",
            CritiqueFlag::VagueSuperlative => "Vague superlative",
            CritiqueFlag::DataError => "Data error",
            CritiqueFlag::GenerationFailed => "Generation failed",
        }
    }

    /// Whether this flag comes from critiquing a summary, as opposed to a
    /// pipeline failure.
    pub fn is_advisory(&self) -> bool {
        !matches!(self, CritiqueFlag::DataError | CritiqueFlag::GenerationFailed)
    }

    /// Instruction for the generator when this flag keeps appearing in
    /// rejected drafts. Pipeline failures have none.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            CritiqueFlag::WordCountOutOfRange => Some("keep the summary between 60 and 100 words"),
            CritiqueFlag::LocationMissing => Some("name the city or country"),
            CritiqueFlag::RatingMissing => Some("state the star rating"),
            CritiqueFlag::AmenityCountInvalid => Some("cite two to four of the scored attributes"),
            CritiqueFlag::VagueSuperlative => Some("avoid vague superlatives"),
            CritiqueFlag::DataError | CritiqueFlag::GenerationFailed => None,
        }
    }
}

impl fmt::Display for CritiqueFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CritiqueFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "word-count-out-of-range" => Ok(CritiqueFlag::WordCountOutOfRange),
            "location-missing" => Ok(CritiqueFlag::LocationMissing),
            "rating-missing" => Ok(CritiqueFlag::RatingMissing),
            "amenity-count-invalid" => Ok(CritiqueFlag::AmenityCountInvalid),
            "vague-superlative" => Ok(CritiqueFlag::VagueSuperlative),
            "data-error" => Ok(CritiqueFlag::DataError),
            "generation-failed" => Ok(CritiqueFlag::GenerationFailed),
            other => Err(format!("Unknown critique flag: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_names_match_as_str() {
        for flag in CritiqueFlag::ADVISORY {
            let json = serde_json::to_string(&flag).unwrap();
            assert_eq!(json, format!("\"{}\"", flag.as_str()));
            assert_eq!(flag.as_str().parse::<CritiqueFlag>().unwrap(), flag);
        }
        assert_eq!(
            serde_json::to_string(&CritiqueFlag::GenerationFailed).unwrap(),
            "\"generation-failed\""
        );
    }

    #[test]
    fn test_pipeline_flags_have_no_guidance() {
        assert!(!CritiqueFlag::DataError.is_advisory());
        assert!(CritiqueFlag::DataError.guidance().is_none());
        assert!(CritiqueFlag::VagueSuperlative.guidance().is_some());
    }
}
