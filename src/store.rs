// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed listing storage.
//!
//! Owns persistence, uniqueness-by-URL, and field-based filtering. The
//! ranking core never talks to the database directly; it receives the
//! pre-filtered corpus as a snapshot.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::listing::{Listing, NewListing};

/// Default cap for filtered local search.
pub const DEFAULT_LOCAL_LIMIT: usize = 50;

/// Filter parameters for non-semantic local search.
#[derive(Debug, Clone, Default)]
pub struct LocalSearchParams {
    /// Per-word case-insensitive substring match over title and description
    pub query: Option<String>,
    /// Exact city match
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
}

/// SQLite-based storage for marketplace listings.
pub struct ListingStore {
    conn: Connection,
    path: PathBuf,
}

impl ListingStore {
    /// Opens or creates a listing store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let store = Self { conn, path };
        store.init_schema()?;

        Ok(store)
    }

    /// Opens the store at the default per-user data location.
    pub fn open_default() -> Result<Self> {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from(".adsearch"));
        Self::open(base.join("adsearch").join("listings.sqlite"))
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                description TEXT,
                price REAL,
                url TEXT NOT NULL UNIQUE,
                city TEXT,
                embedding TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ads_city ON ads(city);
            CREATE INDEX IF NOT EXISTS idx_ads_price ON ads(price);
            "#,
            )
            .context("Failed to initialize database schema")?;

        self.conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '1')",
            [],
        )?;

        Ok(())
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts a new listing; the embedding, when present, is the JSON
    /// serialization of the provider's vector. Fails on duplicate URL.
    pub fn insert(&self, listing: &NewListing, embedding: Option<&str>) -> Result<i64> {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        self.conn
            .execute(
                r#"
                INSERT INTO ads (title, description, price, url, city, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    listing.title,
                    listing.description,
                    listing.price,
                    listing.url,
                    listing.city,
                    embedding,
                    created_at
                ],
            )
            .with_context(|| format!("Failed to insert listing: {}", listing.url))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Looks up a listing by its URL identity key.
    pub fn get_by_url(&self, url: &str) -> Result<Option<Listing>> {
        let listing = self
            .conn
            .query_row(
                &format!("SELECT {} FROM ads WHERE url = ?1", LISTING_COLUMNS),
                params![url],
                row_to_listing,
            )
            .optional()
            .context("Failed to query listing by url")?;

        Ok(listing)
    }

    /// All listings with a stored embedding — the ranker's corpus. Listings
    /// without one are excluded here so the ranking core never sees them.
    pub fn corpus(&self) -> Result<Vec<Listing>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM ads WHERE embedding IS NOT NULL ORDER BY id",
            LISTING_COLUMNS
        ))?;

        let listings = stmt
            .query_map([], row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to load corpus")?;

        Ok(listings)
    }

    /// Listings whose embedding is missing, for the lazy backfill pass.
    pub fn listings_missing_embedding(&self) -> Result<Vec<Listing>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM ads WHERE embedding IS NULL ORDER BY id",
            LISTING_COLUMNS
        ))?;

        let listings = stmt
            .query_map([], row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to list listings missing embeddings")?;

        Ok(listings)
    }

    /// Stores the embedding for an existing listing.
    pub fn set_embedding(&self, id: i64, embedding: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE ads SET embedding = ?1 WHERE id = ?2",
            params![embedding, id],
        )?;
        anyhow::ensure!(updated == 1, "no listing with id {}", id);
        Ok(())
    }

    /// Field-filtered search: per-word substring match on title/description,
    /// city equality, price range. Newest first, capped.
    pub fn local_search(&self, filter: &LocalSearchParams) -> Result<Vec<Listing>> {
        let mut sql = format!("SELECT {} FROM ads WHERE 1=1", LISTING_COLUMNS);
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(query) = filter.query.as_deref() {
            for word in query.split_whitespace() {
                let pattern = format!("%{}%", word.to_lowercase());
                values.push(Box::new(pattern));
                let idx = values.len();
                sql.push_str(&format!(
                    " AND (lower(ifnull(title, '')) LIKE ?{n} OR lower(ifnull(description, '')) LIKE ?{n})",
                    n = idx
                ));
            }
        }

        if let Some(city) = filter.city.as_deref() {
            values.push(Box::new(city.to_string()));
            sql.push_str(&format!(" AND city = ?{}", values.len()));
        }

        if let Some(min_price) = filter.min_price {
            values.push(Box::new(min_price));
            sql.push_str(&format!(" AND price >= ?{}", values.len()));
        }

        if let Some(max_price) = filter.max_price {
            values.push(Box::new(max_price));
            sql.push_str(&format!(" AND price <= ?{}", values.len()));
        }

        values.push(Box::new(
            filter.limit.unwrap_or(DEFAULT_LOCAL_LIMIT) as i64
        ));
        sql.push_str(&format!(" ORDER BY id DESC LIMIT ?{}", values.len()));

        let mut stmt = self.conn.prepare(&sql)?;
        let params_vec: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let listings = stmt
            .query_map(params_vec.as_slice(), row_to_listing)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to run local search")?;

        Ok(listings)
    }

    /// Total number of stored listings.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ads", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Number of listings with a stored embedding.
    pub fn count_embedded(&self) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM ads WHERE embedding IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

const LISTING_COLUMNS: &str = "id, title, description, price, url, city, embedding, created_at";

fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        url: row.get(4)?,
        city: row.get(5)?,
        embedding: row.get(6)?,
        created_at: row.get(7)?,
    })
}
