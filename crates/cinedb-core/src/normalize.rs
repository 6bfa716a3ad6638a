//! Raw CSV row to typed movie document.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::fields::{parse_bool, parse_date, parse_float, parse_int, parse_list_field, text_or};
use crate::movie::{CleanRecord, RawRecord};

/// Normalize one row, stamping provenance with the current time.
///
/// Never fails: every field has a fallback.
pub fn normalize(raw: &RawRecord) -> CleanRecord {
    normalize_at(raw, Utc::now())
}

/// Normalize one row with an explicit provenance timestamp.
pub fn normalize_at(raw: &RawRecord, now: DateTime<Utc>) -> CleanRecord {
    CleanRecord {
        movie_id: parse_int(raw.get("id")),
        title: text_or(raw.get("title"), ""),
        original_title: text_or(raw.get("original_title"), ""),
        overview: text_or(raw.get("overview"), ""),
        tagline: text_or(raw.get("tagline"), ""),
        status: text_or(raw.get("status"), "Unknown"),
        release_date: parse_date(raw.get("release_date")),
        runtime: parse_int(raw.get("runtime")),
        adult: parse_bool(raw.get("adult")),
        original_language: text_or(raw.get("original_language"), ""),
        homepage: text_or(raw.get("homepage"), ""),
        imdb_id: text_or(raw.get("imdb_id"), ""),

        budget: parse_int(raw.get("budget")),
        revenue: parse_int(raw.get("revenue")),

        vote_average: parse_float(raw.get("vote_average")),
        vote_count: parse_int(raw.get("vote_count")),
        popularity: parse_float(raw.get("popularity")),

        backdrop_path: text_or(raw.get("backdrop_path"), ""),
        poster_path: text_or(raw.get("poster_path"), ""),

        genres: parse_list_field(raw.get("genres")),
        production_companies: parse_list_field(raw.get("production_companies")),
        production_countries: parse_list_field(raw.get("production_countries")),
        spoken_languages: parse_list_field(raw.get("spoken_languages")),
        keywords: parse_list_field(raw.get("keywords")),

        inserted_at: now,
        updated_at: now,
    }
}

/// Result of normalizing a whole file.
#[derive(Debug, Clone, Default)]
pub struct NormalizeSummary {
    /// Normalized records, in source order.
    pub records: Vec<CleanRecord>,

    /// Records whose `movie_id` resolved to `0`.
    pub zero_ids: usize,

    /// Records repeating a `movie_id` seen earlier in the file.
    pub duplicate_ids: usize,
}

/// Normalize every row with a single shared timestamp and tally identity
/// problems that would collide under a unique index.
pub fn normalize_all(raws: &[RawRecord], now: DateTime<Utc>) -> NormalizeSummary {
    let mut seen = HashSet::with_capacity(raws.len());
    let mut summary = NormalizeSummary {
        records: Vec::with_capacity(raws.len()),
        ..Default::default()
    };

    for raw in raws {
        let record = normalize_at(raw, now);
        if record.movie_id == 0 {
            summary.zero_ids += 1;
        }
        if !seen.insert(record.movie_id) {
            summary.duplicate_ids += 1;
        }
        summary.records.push(record);
    }

    summary
}
