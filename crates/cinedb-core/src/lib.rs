//! Core domain types for the CineDB movie loader.
//!
//! This crate is I/O free apart from configuration loading: it owns the
//! movie data model, the field parsers that coerce CSV text into typed
//! values, and the record normalizer built on top of them.

pub mod config;
pub mod error;
pub mod fields;
pub mod literal;
pub mod movie;
pub mod normalize;

pub use config::ImportConfig;
pub use error::{CoreError, CoreResult};
pub use fields::parse_list_field;
pub use literal::{parse_literal, LiteralError};
pub use movie::{
    CleanRecord, Genre, Keyword, ProductionCompany, ProductionCountry, RawRecord, SpokenLanguage,
};
pub use normalize::{normalize, normalize_all, normalize_at, NormalizeSummary};
