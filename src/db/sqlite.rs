use crate::db::models::DbItem;
use crate::db::schema::SQLITE_INIT;
use crate::error::TrackerError;
use crate::types::{Item, ItemDraft};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqliteConnection};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

const ITEM_COLUMNS: &str =
    "id, name, description, status, purchase_value, purchase_date, created_at, updated_at";

// Stays well under SQLite's bound-parameter limit.
const TAG_LOOKUP_CHUNK: usize = 500;

// Writers take the write lock up front and wait out the busy timeout.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Open a pool for `database_url`, creating the database file if missing.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, TrackerError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(connect_opts)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory pool; the database lives as long as the pool.
pub async fn connect_in_memory() -> Result<SqlitePool, TrackerError> {
    let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_opts)
        .await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct ItemStorage {
    pool: SqlitePool,
}

impl ItemStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), TrackerError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a new item, or replace the item whose id matches `draft.id`.
    ///
    /// An id that matches no row is not honored: a fresh id is assigned.
    /// The tag set is replaced wholesale in the same transaction.
    pub async fn save(&self, draft: &ItemDraft) -> Result<Item, TrackerError> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;
        let now = Utc::now().trunc_subsecs(6);

        let previous: Option<(String,)> = match draft.id {
            Some(id) => {
                sqlx::query_as("SELECT updated_at FROM items WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        let purchase_date = draft.purchase_date.map(format_ts);
        let id = match (draft.id, previous) {
            (Some(id), Some((prev_updated,))) => {
                let updated_at = advance(parse_ts(&prev_updated)?, now);
                sqlx::query(
                    r#"UPDATE items SET
                        name = ?,
                        description = ?,
                        status = ?,
                        purchase_value = ?,
                        purchase_date = ?,
                        updated_at = ?
                      WHERE id = ?"#,
                )
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(&draft.status)
                .bind(draft.purchase_value)
                .bind(purchase_date)
                .bind(format_ts(updated_at))
                .bind(id)
                .execute(&mut *tx)
                .await?;

                sqlx::query("DELETE FROM item_tags WHERE item_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            _ => {
                let stamp = format_ts(now);
                sqlx::query(
                    r#"
                    INSERT INTO items (
                        name, description, status, purchase_value, purchase_date,
                        created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(&draft.status)
                .bind(draft.purchase_value)
                .bind(purchase_date)
                .bind(&stamp)
                .bind(&stamp)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid()
            }
        };

        for tag in &draft.tags {
            sqlx::query("INSERT INTO item_tags (item_id, tag) VALUES (?, ?)")
                .bind(id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        let saved = Self::find_one(&mut tx, id)
            .await?
            .ok_or(TrackerError::ItemNotFound(id))?;
        tx.commit().await?;
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Item>, TrackerError> {
        let mut conn = self.pool.acquire().await?;
        Self::find_one(&mut conn, id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Item>, TrackerError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
            .fetch_all(&mut *conn)
            .await?;
        Self::hydrate(&mut conn, rows).await
    }

    /// Exact, case-sensitive match on `status`.
    pub async fn find_by_status(&self, status: &str) -> Result<Vec<Item>, TrackerError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE status = ? ORDER BY id"
        ))
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;
        Self::hydrate(&mut conn, rows).await
    }

    /// Items carrying exactly `tag`, each listed once.
    pub async fn find_by_tag(&self, tag: &str) -> Result<Vec<Item>, TrackerError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            r#"SELECT {ITEM_COLUMNS} FROM items
               WHERE id IN (SELECT item_id FROM item_tags WHERE tag = ?)
               ORDER BY id"#
        ))
        .bind(tag)
        .fetch_all(&mut *conn)
        .await?;
        Self::hydrate(&mut conn, rows).await
    }

    /// Case-insensitive substring match on `name`. The fragment is matched
    /// literally; LIKE wildcards in it are escaped.
    pub async fn find_by_name_containing(
        &self,
        fragment: &str,
    ) -> Result<Vec<Item>, TrackerError> {
        let mut conn = self.pool.acquire().await?;
        let pattern = format!("%{}%", escape_like(fragment));
        let rows = sqlx::query(&format!(
            r#"SELECT {ITEM_COLUMNS} FROM items
               WHERE name LIKE ? ESCAPE '\'
               ORDER BY id"#
        ))
        .bind(pattern)
        .fetch_all(&mut *conn)
        .await?;
        Self::hydrate(&mut conn, rows).await
    }

    /// Hard delete of the item and its tags. Returns whether a row existed;
    /// a missing id is not an error.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, TrackerError> {
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;
        sqlx::query("DELETE FROM item_tags WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(removed > 0)
    }

    async fn find_one(conn: &mut SqliteConnection, id: i64) -> Result<Option<Item>, TrackerError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Self::hydrate(conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Attach each row's tag set, preserving row order.
    async fn hydrate(
        conn: &mut SqliteConnection,
        rows: Vec<SqliteRow>,
    ) -> Result<Vec<Item>, TrackerError> {
        let models = rows
            .into_iter()
            .map(Self::row_to_model)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let mut tags = Self::load_tags(conn, &ids).await?;
        Ok(models
            .into_iter()
            .map(|m| {
                let item_tags = tags.remove(&m.id).unwrap_or_default();
                m.into_item(item_tags)
            })
            .collect())
    }

    async fn load_tags(
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> Result<BTreeMap<i64, BTreeSet<String>>, TrackerError> {
        let mut tags: BTreeMap<i64, BTreeSet<String>> = BTreeMap::new();
        for chunk in ids.chunks(TAG_LOOKUP_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT item_id, tag FROM item_tags WHERE item_id IN (");
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(&mut *conn).await?;
            for (item_id, tag) in rows {
                tags.entry(item_id).or_default().insert(tag);
            }
        }
        Ok(tags)
    }

    fn row_to_model(row: SqliteRow) -> Result<DbItem, TrackerError> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let description: Option<String> = row.try_get("description")?;
        let status: String = row.try_get("status")?;
        let purchase_value: Option<f64> = row.try_get("purchase_value")?;
        let purchase_date_str: Option<String> = row.try_get("purchase_date")?;
        let created_at_str: String = row.try_get("created_at")?;
        let updated_at_str: String = row.try_get("updated_at")?;

        let purchase_date = purchase_date_str.as_deref().map(parse_ts).transpose()?;

        Ok(DbItem {
            id,
            name,
            description,
            status,
            purchase_value,
            purchase_date,
            created_at: parse_ts(&created_at_str)?,
            updated_at: parse_ts(&updated_at_str)?,
        })
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, TrackerError> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(parsed)
}

/// Next `updated_at`: the current time, or one microsecond past the previous
/// stamp when the clock has not moved forward.
fn advance(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> ItemStorage {
        let pool = connect_in_memory().await.expect("in-memory pool");
        let storage = ItemStorage::new(pool);
        storage.init_schema().await.expect("schema");
        storage
    }

    #[tokio::test]
    async fn save_assigns_id_and_stamps_both_timestamps() {
        let storage = storage().await;
        let draft = ItemDraft::new("Drill", "stored").with_tags(["tools", "garage"]);

        let saved = storage.save(&draft).await.unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.created_at, saved.updated_at);
        assert_eq!(saved.tags, draft.tags);

        let loaded = storage.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn find_by_id_absent_is_none() {
        let storage = storage().await;
        assert!(storage.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_with_existing_id_replaces_record_and_tags() {
        let storage = storage().await;
        let first = storage
            .save(&ItemDraft::new("Drill", "stored").with_tags(["tools", "garage"]))
            .await
            .unwrap();

        let replaced = storage
            .save(
                &ItemDraft::new("Cordless drill", "in use")
                    .with_tags(["tools"])
                    .with_id(first.id),
            )
            .await
            .unwrap();

        assert_eq!(replaced.id, first.id);
        assert_eq!(replaced.created_at, first.created_at);
        assert!(replaced.updated_at > first.updated_at);
        assert_eq!(replaced.name, "Cordless drill");
        assert_eq!(replaced.tags.len(), 1);
        assert!(storage.find_by_tag("garage").await.unwrap().is_empty());
        assert_eq!(storage.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_with_unknown_id_assigns_fresh_id() {
        let storage = storage().await;
        let saved = storage
            .save(&ItemDraft::new("Ladder", "stored").with_id(999))
            .await
            .unwrap();
        assert_ne!(saved.id, 999);
        assert!(storage.find_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_tag_lists_each_item_once() {
        let storage = storage().await;
        let tagged = storage
            .save(&ItemDraft::new("Hammer", "stored").with_tags(["tools"]))
            .await
            .unwrap();
        storage
            .save(&ItemDraft::new("Toolbox", "stored").with_tags(["toolset"]))
            .await
            .unwrap();

        // duplicate association rows written behind the store's back
        sqlx::query("INSERT INTO item_tags (item_id, tag) VALUES (?, 'tools'), (?, 'tools')")
            .bind(tagged.id)
            .bind(tagged.id)
            .execute(storage.pool())
            .await
            .unwrap();

        let found = storage.find_by_tag("tools").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tagged.id);
        assert!(storage.find_by_tag("tool").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_status_is_exact_and_case_sensitive() {
        let storage = storage().await;
        storage.save(&ItemDraft::new("Lamp", "in use")).await.unwrap();
        storage.save(&ItemDraft::new("Tent", "stored")).await.unwrap();

        assert_eq!(storage.find_by_status("in use").await.unwrap().len(), 1);
        assert!(storage.find_by_status("In Use").await.unwrap().is_empty());
        assert!(storage.find_by_status("in").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_name_ignores_case_and_matches_literally() {
        let storage = storage().await;
        storage
            .save(&ItemDraft::new("Abc Widget", "stored"))
            .await
            .unwrap();
        storage
            .save(&ItemDraft::new("100% cotton shirt", "in use"))
            .await
            .unwrap();

        let upper = storage.find_by_name_containing("ABC").await.unwrap();
        let lower = storage.find_by_name_containing("abc").await.unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper, lower);

        assert_eq!(storage.find_by_name_containing("0% c").await.unwrap().len(), 1);
        assert!(storage.find_by_name_containing("a_c").await.unwrap().is_empty());
        assert_eq!(storage.find_by_name_containing("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_item_and_tags() {
        let storage = storage().await;
        let saved = storage
            .save(&ItemDraft::new("Drill", "stored").with_tags(["tools"]))
            .await
            .unwrap();

        assert!(storage.delete_by_id(saved.id).await.unwrap());
        assert!(storage.find_by_id(saved.id).await.unwrap().is_none());

        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM item_tags")
            .fetch_one(storage.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        assert!(!storage.delete_by_id(saved.id).await.unwrap());
    }

    #[test]
    fn advance_is_strictly_monotonic() {
        let prev = Utc::now();
        assert!(advance(prev, prev) > prev);
        assert!(advance(prev, prev - Duration::seconds(5)) > prev);
        let later = prev + Duration::seconds(1);
        assert_eq!(advance(prev, later), later);
    }
}
