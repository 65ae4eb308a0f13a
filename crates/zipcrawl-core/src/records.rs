//! Domain records shared by the scraper and the CSV layer.

use serde::{Deserialize, Serialize};

/// Column order of the result CSV. Matches the field order of [`ResultRecord`].
pub const RESULT_FIELDS: [&str; 8] = [
    "location",
    "name",
    "address",
    "city",
    "state",
    "zipcode",
    "phone",
    "specialties",
];

/// The query key driving one scrape task, typically a five-digit ZIP code.
///
/// Used both as the locator query parameter and as the value a result's
/// postal code must equal to be kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when `zip` names this location.
    ///
    /// Surrounding whitespace is ignored; anything else must match exactly.
    #[must_use]
    pub fn matches(&self, zip: &str) -> bool {
        self.0.trim() == zip.trim()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One matched locator entry, as written to the result CSV.
///
/// Absent provider values are stored as empty strings so a row read back
/// from disk reconstructs the record exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub location: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub phone: String,
    pub specialties: String,
}

/// A ZIP code row produced by the geocoding provider.
///
/// Stored header-less in `zipcodes.csv` in field order, so the ZIP code
/// lands in column index 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipRecord {
    #[serde(alias = "major_city")]
    pub city: String,
    pub state: String,
    pub zipcode: String,
    #[serde(default)]
    pub zipcode_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_matches_exact_zip() {
        let loc = Location::new("90022");
        assert!(loc.matches("90022"));
        assert!(loc.matches(" 90022\n"));
        assert!(!loc.matches("90023"));
        assert!(!loc.matches("9002"));
    }

    #[test]
    fn result_fields_follow_struct_order() {
        let record = ResultRecord {
            location: "l".to_string(),
            name: "n".to_string(),
            address: "a".to_string(),
            city: "c".to_string(),
            state: "s".to_string(),
            zipcode: "z".to_string(),
            phone: "p".to_string(),
            specialties: "sp".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = RESULT_FIELDS.to_vec();
        expected.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
    }

    #[test]
    fn zip_record_accepts_major_city_alias() {
        let json = r#"{"major_city":"Boston","state":"MA","zipcode":"02108","zipcode_type":"STANDARD"}"#;
        let rec: ZipRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.city, "Boston");
        assert_eq!(rec.zipcode, "02108");
        assert_eq!(rec.zipcode_type, "STANDARD");
    }

    #[test]
    fn zip_record_type_defaults_to_empty() {
        let json = r#"{"city":"Austin","state":"TX","zipcode":"78701"}"#;
        let rec: ZipRecord = serde_json::from_str(json).unwrap();
        assert!(rec.zipcode_type.is_empty());
    }
}
