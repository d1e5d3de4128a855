//! Entry reads and writes on the SQLite store.

use super::connection::CacheDb;
use super::hash::RequestKey;
use super::storage::EntrySummary;
use crate::Error;
use crate::http::Response;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u16, String, Vec<u8>, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode((status, headers_json, body, url): (u16, String, Vec<u8>, String)) -> Result<Response, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(Response { status, headers, body, url })
}

impl CacheDb {
    /// Get an entry from one partition.
    ///
    /// Returns None if the partition or the key doesn't exist.
    pub async fn get_entry(&self, partition: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body, final_url
                FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                match stmt.query_row(params![partition, hash], row_to_response) {
                    Ok(raw) => Ok(Some(decode(raw)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Find an entry in any partition, preferring the oldest partition.
    pub async fn find_entry(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.headers_json, e.body, e.final_url
                FROM entries e JOIN partitions p ON p.name = e.partition
                WHERE e.key_hash = ?1
                ORDER BY p.rowid ASC
                LIMIT 1",
                )?;

                match stmt.query_row(params![hash], row_to_response) {
                    Ok(raw) => Ok(Some(decode(raw)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace entries in a single transaction.
    ///
    /// The partition must already exist; a missing one fails the whole batch
    /// with `Error::Storage`. Existing rows for the same key are overwritten
    /// wholesale.
    pub async fn upsert_entries(&self, partition: &str, entries: Vec<(RequestKey, Response)>) -> Result<(), Error> {
        let partition = partition.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let mut rows = Vec::with_capacity(entries.len());
        for (key, response) in entries {
            let headers_json = serde_json::to_string(&response.headers)?;
            rows.push((key, response, headers_json));
        }

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![partition],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::Storage(format!("no such partition: {partition}")));
                }
                for (key, response, headers_json) in &rows {
                    tx.execute(
                        "INSERT INTO entries (
                        partition, key_hash, method, url, status, headers_json, body, final_url, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        final_url = excluded.final_url,
                        stored_at = excluded.stored_at",
                        params![
                            &partition,
                            &key.hash,
                            key.method.as_str(),
                            &key.url,
                            response.status,
                            headers_json,
                            &response.body,
                            &response.url,
                            &now,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List the entries of a partition, oldest write first.
    pub async fn list_entries(&self, partition: &str) -> Result<Vec<EntrySummary>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status, stored_at
                FROM entries WHERE partition = ?1
                ORDER BY stored_at ASC, rowid ASC",
                )?;
                let entries = stmt
                    .query_map(params![partition], |row| {
                        Ok(EntrySummary {
                            hash: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status: row.get(3)?,
                            stored_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::super::connection::CacheDb;
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("https://legallyup.test").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let response = Response::new(200, "<html></html>")
            .with_header("content-type", "text/html")
            .with_url("https://legallyup.test/");
        db.create_partition("legallyup-static-v1").await.unwrap();

        db.upsert_entries("legallyup-static-v1", vec![(key("/"), response.clone())])
            .await
            .unwrap();

        let retrieved = db.get_entry("legallyup-static-v1", &key("/")).await.unwrap().unwrap();
        assert_eq!(retrieved, response);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("legallyup-static-v1", &key("/nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_partition("legallyup-api-v1").await.unwrap();
        db.upsert_entries("legallyup-api-v1", vec![(key("/api/widgets"), Response::new(200, "old"))])
            .await
            .unwrap();
        db.upsert_entries("legallyup-api-v1", vec![(key("/api/widgets"), Response::new(200, "new"))])
            .await
            .unwrap();

        let retrieved = db.get_entry("legallyup-api-v1", &key("/api/widgets")).await.unwrap().unwrap();
        assert_eq!(retrieved.body, b"new");
        assert_eq!(db.list_entries("legallyup-api-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_partition("legallyup-api-v1").await.unwrap();
        db.upsert_entries("legallyup-api-v1", vec![(key("/api/widgets"), Response::new(200, "api"))])
            .await
            .unwrap();
        db.create_partition("legallyup-static-v1").await.unwrap();

        let hit = db.get_entry("legallyup-static-v1", &key("/api/widgets")).await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_find_prefers_oldest_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_partition("first").await.unwrap();
        db.create_partition("second").await.unwrap();
        db.upsert_entries("second", vec![(key("/"), Response::new(200, "second"))])
            .await
            .unwrap();
        db.upsert_entries("first", vec![(key("/"), Response::new(200, "first"))])
            .await
            .unwrap();

        let hit = db.find_entry(&key("/")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"first");
    }

    #[tokio::test]
    async fn test_drop_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_partition("legallyup-static-v0").await.unwrap();
        db.upsert_entries("legallyup-static-v0", vec![(key("/"), Response::new(200, "shell"))])
            .await
            .unwrap();

        db.drop_partition("legallyup-static-v0").await.unwrap();

        assert!(db.find_entry(&key("/")).await.unwrap().is_none());
        assert!(db.list_entries("legallyup-static-v0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_into_dropped_partition_fails() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.create_partition("legallyup-api-v1").await.unwrap();
        db.drop_partition("legallyup-api-v1").await.unwrap();

        let result = db
            .upsert_entries("legallyup-api-v1", vec![(key("/api/widgets"), Response::new(200, "[]"))])
            .await;

        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(db.list_partitions().await.unwrap().is_empty());
    }
}
