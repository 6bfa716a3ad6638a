//! `queries`: read-only example queries over an imported collection.

use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Collection;

use cinedb_core::{CoreError, CoreResult};
use cinedb_storage::MongoMovieStore;

const TOP_N: i64 = 5;

#[derive(Debug, Clone, Default)]
pub struct QueryReport {
    pub total: u64,
    /// Title and popularity.
    pub most_popular: Vec<(String, f64)>,
    /// Title and revenue.
    pub highest_revenue: Vec<(String, i64)>,
    /// Genre name and movie count.
    pub top_genres: Vec<(String, i64)>,
    /// Decade start year and movie count, oldest first.
    pub decades: Vec<(i64, i64)>,
}

impl QueryReport {
    pub fn print(&self) {
        println!("🔍 Example queries");
        println!("{}", "═".repeat(50));
        println!("📊 Total movies: {}", self.total);

        println!("\n🔥 Top {} by popularity:", TOP_N);
        for (i, (title, popularity)) in self.most_popular.iter().enumerate() {
            println!("  {}. {} ({:.1})", i + 1, title, popularity);
        }

        println!("\n💰 Top {} by revenue:", TOP_N);
        for (i, (title, revenue)) in self.highest_revenue.iter().enumerate() {
            println!(
                "  {}. {} - ${:.1}M",
                i + 1,
                title,
                *revenue as f64 / 1_000_000.0
            );
        }

        println!("\n🎭 Top {} genres:", TOP_N);
        for (i, (genre, count)) in self.top_genres.iter().enumerate() {
            println!("  {}. {}: {} movies", i + 1, genre, count);
        }

        println!("\n📅 Movies per decade:");
        for (decade, count) in &self.decades {
            println!("  {}s: {} movies", decade, count);
        }
    }
}

/// Groups unwound genres by name, most frequent first.
pub fn genre_pipeline() -> Vec<Document> {
    vec![
        doc! { "$unwind": "$genres" },
        doc! { "$group": { "_id": "$genres.name", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
        doc! { "$limit": TOP_N },
    ]
}

/// Counts dated movies per decade, oldest first.
pub fn decade_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "release_date": { "$ne": null } } },
        doc! { "$addFields": { "year": { "$year": "$release_date" } } },
        doc! { "$addFields": {
            "decade": { "$multiply": [{ "$floor": { "$divide": ["$year", 10] } }, 10] }
        } },
        doc! { "$group": { "_id": "$decade", "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

/// Numeric BSON as an integer; server arithmetic may yield any width.
fn as_i64(value: Option<&Bson>) -> i64 {
    match value {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) if n.is_finite() => *n as i64,
        _ => 0,
    }
}

fn as_f64(value: Option<&Bson>) -> f64 {
    match value {
        Some(Bson::Double(n)) => *n,
        Some(Bson::Int32(n)) => f64::from(*n),
        Some(Bson::Int64(n)) => *n as f64,
        _ => 0.0,
    }
}

fn title_of(doc: &Document) -> String {
    doc.get_str("title").unwrap_or_default().to_string()
}

fn group_key(doc: &Document) -> String {
    match doc.get("_id") {
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::Null) | None => "(none)".to_string(),
        Some(other) => other.to_string(),
    }
}

async fn collect(
    cursor: mongodb::error::Result<mongodb::Cursor<Document>>,
) -> CoreResult<Vec<Document>> {
    cursor
        .map_err(|e| CoreError::storage(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| CoreError::storage(e.to_string()))
}

/// Run every example query against the store's movie collection.
pub async fn run_queries(store: &MongoMovieStore) -> CoreResult<QueryReport> {
    let movies: Collection<Document> = store.raw_collection();

    let total = movies
        .count_documents(doc! {})
        .await
        .map_err(|e| CoreError::storage(e.to_string()))?;

    let most_popular = collect(
        movies
            .find(doc! {})
            .sort(doc! { "popularity": -1 })
            .limit(TOP_N)
            .await,
    )
    .await?
    .iter()
    .map(|d| (title_of(d), as_f64(d.get("popularity"))))
    .collect();

    let highest_revenue = collect(
        movies
            .find(doc! { "revenue": { "$gt": 0 } })
            .sort(doc! { "revenue": -1 })
            .limit(TOP_N)
            .await,
    )
    .await?
    .iter()
    .map(|d| (title_of(d), as_i64(d.get("revenue"))))
    .collect();

    let top_genres = collect(movies.aggregate(genre_pipeline()).await)
        .await?
        .iter()
        .map(|d| (group_key(d), as_i64(d.get("count"))))
        .collect();

    let decades = collect(movies.aggregate(decade_pipeline()).await)
        .await?
        .iter()
        .map(|d| (as_i64(d.get("_id")), as_i64(d.get("count"))))
        .collect();

    Ok(QueryReport {
        total,
        most_popular,
        highest_revenue,
        top_genres,
        decades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widths() {
        assert_eq!(as_i64(Some(&Bson::Int32(7))), 7);
        assert_eq!(as_i64(Some(&Bson::Int64(1 << 40))), 1 << 40);
        assert_eq!(as_i64(Some(&Bson::Double(1990.0))), 1990);
        assert_eq!(as_i64(Some(&Bson::Double(f64::NAN))), 0);
        assert_eq!(as_i64(None), 0);
        assert_eq!(as_f64(Some(&Bson::Int32(3))), 3.0);
    }

    #[test]
    fn test_group_keys() {
        assert_eq!(group_key(&doc! { "_id": "Drama", "count": 3 }), "Drama");
        assert_eq!(group_key(&doc! { "_id": null }), "(none)");
        assert_eq!(title_of(&doc! { "popularity": 1.0 }), "");
    }

    #[test]
    fn test_pipelines_order_stages() {
        let genres = genre_pipeline();
        assert_eq!(genres[0], doc! { "$unwind": "$genres" });
        assert_eq!(genres.last(), Some(&doc! { "$limit": TOP_N }));

        let decades = decade_pipeline();
        assert!(decades[0].contains_key("$match"));
        assert_eq!(decades.last(), Some(&doc! { "$sort": { "_id": 1 } }));
    }
}
