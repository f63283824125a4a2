//! Cached-entry CRUD operations.
//!
//! Entries hold everything needed to replay a response: status, headers,
//! body, plus an optional `cached_at` annotation used for freshness checks
//! and age-based eviction. Writes are upserts; an overwrite replaces the
//! annotation wholesale rather than mutating it.

use std::collections::BTreeMap;

use super::connection::StoreDb;
use crate::Error;
use crate::http::ServedResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedEntry {
    /// Original request URL, kept for diagnostics and status reports.
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// RFC 3339 write timestamp. Entries without one are never aged out.
    pub cached_at: Option<String>,
}

impl CachedEntry {
    /// Snapshot a response for storage, optionally annotating it with a
    /// write timestamp.
    pub fn from_response(url: &str, response: &ServedResponse, cached_at: Option<DateTime<Utc>>) -> Self {
        Self {
            url: url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.to_vec(),
            cached_at: cached_at.map(|t| t.to_rfc3339()),
        }
    }

    /// Rebuild the response this entry was snapshotted from.
    pub fn into_response(self) -> ServedResponse {
        ServedResponse { status: self.status, headers: self.headers, body: self.body.into() }
    }

    /// Entry age relative to `now`, if the entry is annotated.
    ///
    /// Unparseable annotations count as unannotated.
    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let cached_at = self.cached_at.as_deref()?;
        let cached_at = DateTime::parse_from_rfc3339(cached_at).ok()?;
        Some(now.signed_duration_since(cached_at.with_timezone(&Utc)))
    }
}

impl StoreDb {
    /// Insert or update a cached entry.
    ///
    /// Uses UPSERT semantics and creates the partition row when absent, so
    /// a write never depends on install ordering. Concurrent writers to the
    /// same key resolve last-writer-wins.
    pub async fn put_entry(&self, partition: &str, key: &str, entry: &CachedEntry) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        let entry = entry.clone();
        let created_at = Utc::now().to_rfc3339();
        let headers_json = serde_json::to_string(&entry.headers).unwrap_or_else(|_| "{}".to_string());

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![partition, created_at],
                )?;
                conn.execute(
                    "INSERT INTO entries (partition, request_key, url, status, headers_json, body, cached_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(partition, request_key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        cached_at = excluded.cached_at",
                    params![
                        partition,
                        key,
                        entry.url,
                        entry.status as i64,
                        headers_json,
                        entry.body,
                        entry.cached_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by partition and key.
    ///
    /// Returns None if the key doesn't exist in the partition.
    pub async fn get_entry(&self, partition: &str, key: &str) -> Result<Option<CachedEntry>, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, headers_json, body, cached_at
                    FROM entries WHERE partition = ?1 AND request_key = ?2",
                )?;

                let result = stmt.query_row(params![partition, key], |row| {
                    let headers_json: String = row.get(2)?;
                    Ok(CachedEntry {
                        url: row.get(0)?,
                        status: row.get::<_, i64>(1)? as u16,
                        headers: serde_json::from_str(&headers_json).unwrap_or_default(),
                        body: row.get(3)?,
                        cached_at: row.get(4)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a single entry.
    ///
    /// Returns true if the entry existed. Deleting an absent entry is not
    /// an error, which keeps overlapping sweeps safe.
    pub async fn delete_entry(&self, partition: &str, key: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND request_key = ?2",
                    params![partition, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// All request keys currently stored in a partition.
    pub async fn entry_keys(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT request_key FROM entries WHERE partition = ?1")?;
                let keys = stmt
                    .query_map(params![partition], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry in a partition, keeping the partition itself.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_partition(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE partition = ?1", params![partition])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
