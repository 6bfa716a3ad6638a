//! Movie domain types: the raw CSV row and the normalized document.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One CSV row as column name to untyped text.
///
/// Columns missing from the file read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text for `column`, or `""` if the column is absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Sets a column value (builder pattern).
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Number of columns present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no column is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Treats an explicit null like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Genre tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Studio credited on a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCompany {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin_country: String,
}

/// Country of production (ISO 3166-1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCountry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub iso_3166_1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Spoken language (ISO 639-1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokenLanguage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub iso_639_1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub english_name: String,
}

/// Keyword tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Normalized, typed movie document derived from one [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    /// Source identity (`id` column). `0` when unparsable.
    pub movie_id: i64,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub tagline: String,
    /// Release status, `"Unknown"` when blank.
    pub status: String,
    pub release_date: Option<NaiveDate>,
    /// Minutes.
    pub runtime: i64,
    pub adult: bool,
    pub original_language: String,
    pub homepage: String,
    pub imdb_id: String,

    pub budget: i64,
    pub revenue: i64,

    pub vote_average: f64,
    pub vote_count: i64,
    pub popularity: f64,

    pub backdrop_path: String,
    pub poster_path: String,

    pub genres: Vec<Genre>,
    pub production_companies: Vec<ProductionCompany>,
    pub production_countries: Vec<ProductionCountry>,
    pub spoken_languages: Vec<SpokenLanguage>,
    pub keywords: Vec<Keyword>,

    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_missing_column_is_empty() {
        let raw = RawRecord::new().with("title", "Heat");
        assert_eq!(raw.get("title"), "Heat");
        assert_eq!(raw.get("tagline"), "");
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn test_raw_record_from_iter() {
        let raw: RawRecord = vec![("id", "1"), ("title", "Alien")].into_iter().collect();
        assert_eq!(raw.get("id"), "1");
        assert_eq!(raw.get("title"), "Alien");
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let language: SpokenLanguage = serde_json::from_str(
            r#"{"iso_639_1": "xx", "name": null, "english_name": "No Language"}"#,
        )
        .unwrap();
        assert_eq!(language.name, "");
        assert_eq!(language.english_name, "No Language");

        let genre: Genre = serde_json::from_str(r#"{"id": null, "name": "Drama"}"#).unwrap();
        assert_eq!(genre.id, 0);
    }

    #[test]
    fn test_company_logo_path_optional() {
        let company: ProductionCompany =
            serde_json::from_str(r#"{"id": 4, "name": "Paramount", "origin_country": "US"}"#)
                .unwrap();
        assert_eq!(company.logo_path, None);
        assert_eq!(company.origin_country, "US");
    }
}
