//! Hotel records as read from the input batch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VettedError};

/// Lowest valid quality score.
pub const MIN_SCORE: f64 = 0.0;
/// Highest valid quality score.
pub const MAX_SCORE: f64 = 10.0;

/// One of the six scored hotel attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityAttribute {
    Cleanliness,
    Comfort,
    Facilities,
    Location,
    Staff,
    Value,
}

impl QualityAttribute {
    /// All attributes, in display order.
    pub const ALL: [QualityAttribute; 6] = [
        QualityAttribute::Cleanliness,
        QualityAttribute::Comfort,
        QualityAttribute::Facilities,
        QualityAttribute::Location,
        QualityAttribute::Staff,
        QualityAttribute::Value,
    ];

    /// Lowercase name used in summaries and prompts.
    pub fn name(&self) -> &'static str {
        match self {
            QualityAttribute::Cleanliness => "cleanliness",
            QualityAttribute::Comfort => "comfort",
            QualityAttribute::Facilities => "facilities",
            QualityAttribute::Location => "location",
            QualityAttribute::Staff => "staff",
            QualityAttribute::Value => "value",
        }
    }

    /// Word stems that count as a reference to this attribute.
    pub fn stems(&self) -> &'static [&'static str] {
        match self {
            QualityAttribute::Cleanliness => &["clean"],
            QualityAttribute::Comfort => &["comfort"],
            QualityAttribute::Facilities => &["facilit"],
            QualityAttribute::Location => &["location"],
            QualityAttribute::Staff => &["staff"],
            QualityAttribute::Value => &["value"],
        }
    }

    /// Column name in the hotel CSV.
    pub fn column(&self) -> &'static str {
        match self {
            QualityAttribute::Cleanliness => "cleanliness_base",
            QualityAttribute::Comfort => "comfort_base",
            QualityAttribute::Facilities => "facilities_base",
            QualityAttribute::Location => "location_base",
            QualityAttribute::Staff => "staff_base",
            QualityAttribute::Value => "value_for_money_base",
        }
    }
}

impl fmt::Display for QualityAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Where a hotel is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Create a location without coordinates.
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            coordinates: None,
        }
    }

    /// Attach coordinates.
    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lon });
        self
    }

    /// True when neither city nor country is known.
    pub fn is_blank(&self) -> bool {
        self.city.trim().is_empty() && self.country.trim().is_empty()
    }

    /// "City, Country", skipping whichever part is blank.
    pub fn display(&self) -> String {
        [self.city.trim(), self.country.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The six quality scores, each on a 0-10 scale. Missing scores are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanliness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfort: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl QualityScores {
    /// Create an empty score set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one score.
    pub fn with(mut self, attribute: QualityAttribute, score: f64) -> Self {
        self.set(attribute, Some(score));
        self
    }

    /// Get one score.
    pub fn get(&self, attribute: QualityAttribute) -> Option<f64> {
        match attribute {
            QualityAttribute::Cleanliness => self.cleanliness,
            QualityAttribute::Comfort => self.comfort,
            QualityAttribute::Facilities => self.facilities,
            QualityAttribute::Location => self.location,
            QualityAttribute::Staff => self.staff,
            QualityAttribute::Value => self.value,
        }
    }

    /// Replace one score.
    pub fn set(&mut self, attribute: QualityAttribute, score: Option<f64>) {
        let slot = match attribute {
            QualityAttribute::Cleanliness => &mut self.cleanliness,
            QualityAttribute::Comfort => &mut self.comfort,
            QualityAttribute::Facilities => &mut self.facilities,
            QualityAttribute::Location => &mut self.location,
            QualityAttribute::Staff => &mut self.staff,
            QualityAttribute::Value => &mut self.value,
        };
        *slot = score;
    }

    /// Present scores in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (QualityAttribute, f64)> + '_ {
        QualityAttribute::ALL
            .into_iter()
            .filter_map(|attr| self.get(attr).map(|score| (attr, score)))
    }

    /// Number of present scores.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Present scores sorted from highest to lowest. Ties keep attribute order.
    pub fn ranked(&self) -> Vec<(QualityAttribute, f64)> {
        let mut scores: Vec<_> = self.iter().collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores
    }
}

/// An immutable input record describing one hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    /// Identifier, unique within a batch.
    pub id: String,
    /// Hotel name.
    pub name: String,
    /// Location, if known.
    pub location: Option<Location>,
    /// Star rating (1-5), if known.
    pub star_rating: Option<u8>,
    /// Quality scores.
    pub scores: QualityScores,
}

impl HotelRecord {
    /// Create a record with only an identifier and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
            star_rating: None,
            scores: QualityScores::default(),
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the star rating.
    pub fn with_star_rating(mut self, rating: u8) -> Self {
        self.star_rating = Some(rating);
        self
    }

    /// Set the scores.
    pub fn with_scores(mut self, scores: QualityScores) -> Self {
        self.scores = scores;
        self
    }

    /// City, or an empty string.
    pub fn city(&self) -> &str {
        self.location.as_ref().map(|l| l.city.as_str()).unwrap_or("")
    }

    /// Country, or an empty string.
    pub fn country(&self) -> &str {
        self.location.as_ref().map(|l| l.country.as_str()).unwrap_or("")
    }

    /// Check that the fields required for drafting are present and in range.
    ///
    /// All problems are reported together in one `MalformedRecord` error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        match &self.location {
            None => problems.push("missing location".to_string()),
            Some(loc) if loc.is_blank() => {
                problems.push("location has neither city nor country".to_string())
            }
            Some(_) => {}
        }

        match self.star_rating {
            None => problems.push("missing star rating".to_string()),
            Some(r) if !(1..=5).contains(&r) => {
                problems.push(format!("star rating {} outside 1-5", r))
            }
            Some(_) => {}
        }

        if self.scores.count() == 0 {
            problems.push("no quality scores".to_string());
        }

        for (attr, score) in self.scores.iter() {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                problems.push(format!("{} score {} outside 0-10", attr, score));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(VettedError::MalformedRecord {
                hotel_id: self.id.clone(),
                reason: problems.join("; "),
            })
        }
    }
}
