//! MongoDB-backed movie store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use cinedb_core::{
    CleanRecord, CoreError, Genre, ImportConfig, Keyword, ProductionCompany, ProductionCountry,
    SpokenLanguage,
};

use crate::backend::{
    CollectionStats, DocumentFailure, IndexDirection, IndexSpec, InsertOutcome, MovieStore,
};
use crate::error::Result;

/// Persisted shape of a movie: [`CleanRecord`] with BSON dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDocument {
    pub movie_id: i64,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub tagline: String,
    pub status: String,
    pub release_date: Option<bson::DateTime>,
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
    pub inserted_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: bson::DateTime) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(dt.timestamp_millis())
        .single()
        .ok_or_else(|| CoreError::storage(format!("timestamp out of range: {}", dt)))
}

/// Dates are stored as UTC midnight.
fn date_to_bson(date: NaiveDate) -> Option<bson::DateTime> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| to_bson_datetime(Utc.from_utc_datetime(&midnight)))
}

impl From<&CleanRecord> for MovieDocument {
    fn from(m: &CleanRecord) -> Self {
        Self {
            movie_id: m.movie_id,
            title: m.title.clone(),
            original_title: m.original_title.clone(),
            overview: m.overview.clone(),
            tagline: m.tagline.clone(),
            status: m.status.clone(),
            release_date: m.release_date.and_then(date_to_bson),
            runtime: m.runtime,
            adult: m.adult,
            original_language: m.original_language.clone(),
            homepage: m.homepage.clone(),
            imdb_id: m.imdb_id.clone(),
            budget: m.budget,
            revenue: m.revenue,
            vote_average: m.vote_average,
            vote_count: m.vote_count,
            popularity: m.popularity,
            backdrop_path: m.backdrop_path.clone(),
            poster_path: m.poster_path.clone(),
            genres: m.genres.clone(),
            production_companies: m.production_companies.clone(),
            production_countries: m.production_countries.clone(),
            spoken_languages: m.spoken_languages.clone(),
            keywords: m.keywords.clone(),
            inserted_at: to_bson_datetime(m.inserted_at),
            updated_at: to_bson_datetime(m.updated_at),
        }
    }
}

impl TryFrom<MovieDocument> for CleanRecord {
    type Error = CoreError;

    fn try_from(d: MovieDocument) -> Result<Self> {
        let release_date = match d.release_date {
            Some(dt) => Some(from_bson_datetime(dt)?.date_naive()),
            None => None,
        };

        Ok(Self {
            movie_id: d.movie_id,
            title: d.title,
            original_title: d.original_title,
            overview: d.overview,
            tagline: d.tagline,
            status: d.status,
            release_date,
            runtime: d.runtime,
            adult: d.adult,
            original_language: d.original_language,
            homepage: d.homepage,
            imdb_id: d.imdb_id,
            budget: d.budget,
            revenue: d.revenue,
            vote_average: d.vote_average,
            vote_count: d.vote_count,
            popularity: d.popularity,
            backdrop_path: d.backdrop_path,
            poster_path: d.poster_path,
            genres: d.genres,
            production_companies: d.production_companies,
            production_countries: d.production_countries,
            spoken_languages: d.spoken_languages,
            keywords: d.keywords,
            inserted_at: from_bson_datetime(d.inserted_at)?,
            updated_at: from_bson_datetime(d.updated_at)?,
        })
    }
}

/// Key document for an index spec (`{ title: 1 }`, `{ title: "text" }`).
pub fn index_keys(spec: &IndexSpec) -> Document {
    let mut keys = Document::new();
    for (field, direction) in &spec.keys {
        let value = match direction {
            IndexDirection::Ascending => Bson::Int32(1),
            IndexDirection::Descending => Bson::Int32(-1),
            IndexDirection::Text => Bson::String("text".to_string()),
        };
        keys.insert(*field, value);
    }
    keys
}

fn storage_error(e: mongodb::error::Error) -> CoreError {
    CoreError::storage(e.to_string())
}

/// Movie collection on a MongoDB deployment.
#[derive(Clone)]
pub struct MongoMovieStore {
    client: Client,
    database: Database,
    collection: Collection<MovieDocument>,
    database_name: String,
    collection_name: String,
    closed: Arc<AtomicBool>,
}

impl MongoMovieStore {
    /// Open a client for `config` and verify it with a `ping`.
    pub async fn connect(config: &ImportConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.connection_string)
            .await
            .map_err(storage_error)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(storage_error)?;

        let store = Self::from_client(client, &config.database, &config.collection);

        info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );

        Ok(store)
    }

    fn from_client(client: Client, database_name: &str, collection_name: &str) -> Self {
        let database = client.database(database_name);
        let collection = database.collection::<MovieDocument>(collection_name);

        Self {
            client,
            database,
            collection,
            database_name: database_name.to_string(),
            collection_name: collection_name.to_string(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CoreError::NotConnected);
        }
        Ok(())
    }

    /// Underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Configured database handle.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The movie collection as untyped documents, for ad-hoc queries.
    pub fn raw_collection(&self) -> Collection<Document> {
        self.database.collection::<Document>(&self.collection_name)
    }
}

#[async_trait]
impl MovieStore for MongoMovieStore {
    async fn ping(&self) -> Result<()> {
        self.ensure_open()?;
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn insert_unordered(&self, batch: &[CleanRecord]) -> Result<InsertOutcome> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let documents: Vec<MovieDocument> = batch.iter().map(MovieDocument::from).collect();

        match self.collection.insert_many(&documents).ordered(false).await {
            Ok(result) => {
                debug!(inserted = result.inserted_ids.len(), "insert_many acknowledged");
                Ok(InsertOutcome::complete(result.inserted_ids.len()))
            }
            Err(e) => {
                // Unordered mode: the server attempted every document and
                // reports the rejected ones individually.
                if let ErrorKind::InsertMany(failure) = e.kind.as_ref() {
                    if failure.write_concern_error.is_none() {
                        let failures: Vec<DocumentFailure> = failure
                            .write_errors
                            .iter()
                            .flatten()
                            .map(|w| DocumentFailure {
                                index: w.index,
                                code: w.code,
                                message: w.message.clone(),
                            })
                            .collect();

                        return Ok(InsertOutcome {
                            attempted: batch.len(),
                            inserted: batch.len().saturating_sub(failures.len()),
                            failures,
                        });
                    }
                }
                Err(storage_error(e))
            }
        }
    }

    async fn clear(&self) -> Result<u64> {
        self.ensure_open()?;
        let result = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(storage_error)?;
        Ok(result.deleted_count)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<String> {
        self.ensure_open()?;
        let mut model = IndexModel::builder().keys(index_keys(spec)).build();
        if spec.unique {
            model.options = Some(IndexOptions::builder().unique(true).build());
        }

        let result = self
            .collection
            .create_index(model)
            .await
            .map_err(|e| CoreError::index_creation(spec.name(), e.to_string()))?;
        Ok(result.index_name)
    }

    async fn stats(&self) -> Result<CollectionStats> {
        self.ensure_open()?;
        let total_documents = self
            .collection
            .count_documents(doc! {})
            .await
            .map_err(storage_error)?;
        let indexes = self
            .collection
            .list_index_names()
            .await
            .map_err(storage_error)?;

        Ok(CollectionStats {
            total_documents,
            database: self.database_name.clone(),
            collection: self.collection_name.clone(),
            indexes,
        })
    }

    async fn find_by_movie_id(&self, movie_id: i64) -> Result<Option<CleanRecord>> {
        self.ensure_open()?;
        self.collection
            .find_one(doc! { "movie_id": movie_id })
            .await
            .map_err(storage_error)?
            .map(CleanRecord::try_from)
            .transpose()
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.client.clone().shutdown().await;
        info!("MongoDB connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> CleanRecord {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        CleanRecord {
            movie_id: 603,
            title: "The Matrix".to_string(),
            original_title: "The Matrix".to_string(),
            overview: String::new(),
            tagline: "Welcome to the Real World.".to_string(),
            status: "Released".to_string(),
            release_date: NaiveDate::from_ymd_opt(1999, 3, 30),
            runtime: 136,
            adult: false,
            original_language: "en".to_string(),
            homepage: String::new(),
            imdb_id: "tt0133093".to_string(),
            budget: 63_000_000,
            revenue: 463_517_383,
            vote_average: 8.2,
            vote_count: 24_000,
            popularity: 70.5,
            backdrop_path: String::new(),
            poster_path: String::new(),
            genres: vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }],
            production_companies: vec![],
            production_countries: vec![],
            spoken_languages: vec![],
            keywords: vec![],
            inserted_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_document_conversion_preserves_fields() {
        let movie = sample();
        let doc = MovieDocument::from(&movie);

        assert_eq!(
            doc.release_date.map(|d| d.timestamp_millis()),
            Some(922_752_000_000)
        );

        let back = CleanRecord::try_from(doc).unwrap();
        assert_eq!(back, movie);
    }

    #[test]
    fn test_document_serializes_with_bson_dates() {
        let doc = bson::to_document(&MovieDocument::from(&sample())).unwrap();
        assert!(matches!(doc.get("release_date"), Some(Bson::DateTime(_))));
        assert!(matches!(doc.get("inserted_at"), Some(Bson::DateTime(_))));
        assert_eq!(doc.get_i64("movie_id").unwrap(), 603);
        let genres = doc.get_array("genres").unwrap();
        assert_eq!(genres.len(), 1);
    }

    #[test]
    fn test_missing_release_date_is_null() {
        let mut movie = sample();
        movie.release_date = None;
        let doc = bson::to_document(&MovieDocument::from(&movie)).unwrap();
        assert_eq!(doc.get("release_date"), Some(&Bson::Null));
    }

    #[tokio::test]
    async fn test_closed_store_reports_not_connected() {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let store = MongoMovieStore::from_client(client, "movies_db", "movies");
        let copy = store.clone();

        store.close().await.unwrap();

        assert!(matches!(copy.ping().await, Err(CoreError::NotConnected)));
        assert!(matches!(
            copy.insert_unordered(&[sample()]).await,
            Err(CoreError::NotConnected)
        ));
        assert!(matches!(store.stats().await, Err(CoreError::NotConnected)));
        assert!(matches!(
            store.find_by_movie_id(603).await,
            Err(CoreError::NotConnected)
        ));
        assert!(store.close().await.is_ok());
    }

    #[test]
    fn test_index_keys() {
        let spec = IndexSpec::compound(vec![
            ("release_date", IndexDirection::Descending),
            ("popularity", IndexDirection::Descending),
        ]);
        assert_eq!(index_keys(&spec), doc! { "release_date": -1, "popularity": -1 });

        let text = IndexSpec::compound(vec![
            ("title", IndexDirection::Text),
            ("overview", IndexDirection::Text),
        ]);
        assert_eq!(index_keys(&text), doc! { "title": "text", "overview": "text" });
    }
}
