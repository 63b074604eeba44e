use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;

use super::{
    error::{SqlDaoError, SqlResult},
    schema::{COMMENTS_TABLE, RECORDS_TABLE},
};
use crate::dao::{
    models::{CommentEntity, RecordEntity, Scope},
    scoped_store::{ScopedStore, check_fields, clamp_limit},
    storage::StorageResult,
};

const SELECT_COMMENT: &str = "SELECT data FROM comments
    WHERE comment_name = ?1 AND parent_type = ?2 AND parent_name = ?3";
const LIST_COMMENTS: &str = "SELECT data FROM comments
    WHERE parent_type = ?1 AND parent_name = ?2
    ORDER BY time DESC, comment_name ASC
    LIMIT ?3 OFFSET ?4";
const UPSERT_COMMENT: &str = "INSERT INTO comments
    (comment_name, parent_type, parent_name, author, time, content, data)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT (comment_name, parent_type, parent_name) DO UPDATE SET
        author = excluded.author,
        time = excluded.time,
        content = excluded.content,
        data = excluded.data";
const DELETE_COMMENT: &str = "DELETE FROM comments
    WHERE comment_name = ?1 AND parent_type = ?2 AND parent_name = ?3";
const COUNT_COMMENTS: &str = "SELECT COUNT(*) FROM comments
    WHERE parent_type = ?1 AND parent_name = ?2";

const SELECT_RECORD: &str = "SELECT data FROM leaderboard_records
    WHERE record_name = ?1 AND parent_type = ?2 AND parent_name = ?3 AND leaderboard_name = ?4";
// Numeric ranks (non-empty, digits only) first, by value; everything else after, by name.
const LIST_RECORDS: &str = "SELECT data FROM leaderboard_records
    WHERE parent_type = ?1 AND parent_name = ?2 AND leaderboard_name = ?3
    ORDER BY
        CASE WHEN rank <> '' AND rank NOT GLOB '*[^0-9]*' THEN 0 ELSE 1 END,
        CASE WHEN rank <> '' AND rank NOT GLOB '*[^0-9]*' THEN length(ltrim(rank, '0')) ELSE 0 END,
        CASE WHEN rank <> '' AND rank NOT GLOB '*[^0-9]*' THEN ltrim(rank, '0') ELSE '' END,
        record_name ASC
    LIMIT ?4 OFFSET ?5";
const UPSERT_RECORD: &str = "INSERT INTO leaderboard_records
    (record_name, parent_type, parent_name, leaderboard_name, rank, player, value, data)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (record_name, parent_type, parent_name, leaderboard_name) DO UPDATE SET
        rank = excluded.rank,
        player = excluded.player,
        value = excluded.value,
        data = excluded.data";
const DELETE_RECORD: &str = "DELETE FROM leaderboard_records
    WHERE record_name = ?1 AND parent_type = ?2 AND parent_name = ?3 AND leaderboard_name = ?4";
const COUNT_RECORDS: &str = "SELECT COUNT(*) FROM leaderboard_records
    WHERE parent_type = ?1 AND parent_name = ?2 AND leaderboard_name = ?3";

fn as_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn encode<E: Serialize>(table: &'static str, entity: &E) -> SqlResult<String> {
    serde_json::to_string(entity).map_err(|source| SqlDaoError::Payload { table, source })
}

fn decode<E: DeserializeOwned>(table: &'static str, data: &str) -> SqlResult<E> {
    serde_json::from_str(data).map_err(|source| SqlDaoError::Payload { table, source })
}

fn query_err(operation: &'static str, table: &'static str) -> impl Fn(sqlx::Error) -> SqlDaoError {
    move |source| SqlDaoError::Query {
        operation,
        table,
        source,
    }
}

/// Comments of one item stored as rows of the shared `comments` table.
#[derive(Clone)]
pub struct SqliteCommentStore {
    pool: SqlitePool,
    scope: Arc<Scope>,
}

impl SqliteCommentStore {
    pub fn new(pool: SqlitePool, scope: Scope) -> Self {
        Self {
            pool,
            scope: Arc::new(scope),
        }
    }

    fn parent_type(&self) -> &'static str {
        self.scope.category.as_str()
    }

    async fn find(&self, name: &str) -> SqlResult<Option<CommentEntity>> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_COMMENT)
            .bind(name)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err("load comment", COMMENTS_TABLE))?;

        row.map(|(data,)| decode(COMMENTS_TABLE, &data)).transpose()
    }

    async fn page(&self, limit: usize, offset: usize) -> SqlResult<Vec<CommentEntity>> {
        let rows: Vec<(String,)> = sqlx::query_as(LIST_COMMENTS)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(as_sql_int(clamp_limit(limit)))
            .bind(as_sql_int(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(query_err("list comments", COMMENTS_TABLE))?;

        rows.iter()
            .map(|(data,)| decode(COMMENTS_TABLE, data))
            .collect()
    }

    async fn upsert(&self, comment: CommentEntity) -> SqlResult<()> {
        let data = encode(COMMENTS_TABLE, &comment)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_err("begin upsert", COMMENTS_TABLE))?;

        sqlx::query(UPSERT_COMMENT)
            .bind(comment.name.as_str())
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(comment.author.as_str())
            .bind(comment.time)
            .bind(comment.content.as_str())
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(query_err("upsert comment", COMMENTS_TABLE))?;

        tx.commit()
            .await
            .map_err(query_err("commit upsert", COMMENTS_TABLE))
    }

    async fn remove(&self, name: &str) -> SqlResult<()> {
        sqlx::query(DELETE_COMMENT)
            .bind(name)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .execute(&self.pool)
            .await
            .map_err(query_err("delete comment", COMMENTS_TABLE))?;
        Ok(())
    }

    async fn total(&self) -> SqlResult<usize> {
        let (count,): (i64,) = sqlx::query_as(COUNT_COMMENTS)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(query_err("count comments", COMMENTS_TABLE))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl ScopedStore<CommentEntity> for SqliteCommentStore {
    fn get(&self, name: &str) -> BoxFuture<'static, StorageResult<Option<CommentEntity>>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move { store.find(&name).await.map_err(Into::into) })
    }

    fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<CommentEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.page(limit, offset).await.map_err(Into::into) })
    }

    fn add(&self, entity: CommentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await.map_err(Into::into)
        })
    }

    fn update(&self, entity: CommentEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await.map_err(Into::into)
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move { store.remove(&name).await.map_err(Into::into) })
    }

    fn count(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.total().await.map_err(Into::into) })
    }
}

/// Records of one item leaderboard stored as rows of the shared `leaderboard_records` table.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    scope: Arc<Scope>,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool, scope: Scope) -> Self {
        Self {
            pool,
            scope: Arc::new(scope),
        }
    }

    fn parent_type(&self) -> &'static str {
        self.scope.category.as_str()
    }

    fn leaderboard_name(&self) -> &str {
        self.scope.sub_key.as_deref().unwrap_or_default()
    }

    async fn find(&self, name: &str) -> SqlResult<Option<RecordEntity>> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_RECORD)
            .bind(name)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(self.leaderboard_name())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err("load record", RECORDS_TABLE))?;

        row.map(|(data,)| decode(RECORDS_TABLE, &data)).transpose()
    }

    async fn page(&self, limit: usize, offset: usize) -> SqlResult<Vec<RecordEntity>> {
        let rows: Vec<(String,)> = sqlx::query_as(LIST_RECORDS)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(self.leaderboard_name())
            .bind(as_sql_int(clamp_limit(limit)))
            .bind(as_sql_int(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(query_err("list records", RECORDS_TABLE))?;

        rows.iter()
            .map(|(data,)| decode(RECORDS_TABLE, data))
            .collect()
    }

    async fn upsert(&self, record: RecordEntity) -> SqlResult<()> {
        let data = encode(RECORDS_TABLE, &record)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_err("begin upsert", RECORDS_TABLE))?;

        sqlx::query(UPSERT_RECORD)
            .bind(record.name.as_str())
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(self.leaderboard_name())
            .bind(record.rank.as_str())
            .bind(record.player.as_str())
            .bind(record.value.as_str())
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(query_err("upsert record", RECORDS_TABLE))?;

        tx.commit()
            .await
            .map_err(query_err("commit upsert", RECORDS_TABLE))
    }

    async fn remove(&self, name: &str) -> SqlResult<()> {
        sqlx::query(DELETE_RECORD)
            .bind(name)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(self.leaderboard_name())
            .execute(&self.pool)
            .await
            .map_err(query_err("delete record", RECORDS_TABLE))?;
        Ok(())
    }

    async fn total(&self) -> SqlResult<usize> {
        let (count,): (i64,) = sqlx::query_as(COUNT_RECORDS)
            .bind(self.parent_type())
            .bind(self.scope.item_name.as_str())
            .bind(self.leaderboard_name())
            .fetch_one(&self.pool)
            .await
            .map_err(query_err("count records", RECORDS_TABLE))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl ScopedStore<RecordEntity> for SqliteRecordStore {
    fn get(&self, name: &str) -> BoxFuture<'static, StorageResult<Option<RecordEntity>>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move { store.find(&name).await.map_err(Into::into) })
    }

    fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<RecordEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.page(limit, offset).await.map_err(Into::into) })
    }

    fn add(&self, entity: RecordEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await.map_err(Into::into)
        })
    }

    fn update(&self, entity: RecordEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            check_fields(&entity)?;
            store.upsert(entity).await.map_err(Into::into)
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let name = name.to_owned();
        Box::pin(async move { store.remove(&name).await.map_err(Into::into) })
    }

    fn count(&self) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.total().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        dao::scoped_store::sqlite::{SqliteConfig, connect},
        state::category::ItemCategory,
    };

    async fn pool(tmp: &TempDir) -> SqlitePool {
        let url = format!("sqlite://{}?mode=rwc", tmp.path().join("test.db").display());
        connect(&SqliteConfig::new(url)).await.unwrap()
    }

    fn record(name: &str, rank: &str) -> RecordEntity {
        RecordEntity {
            name: name.into(),
            rank: rank.into(),
            player: format!("player-{name}"),
            value: "9000".into(),
            payload: Map::new(),
        }
    }

    #[tokio::test]
    async fn comment_round_trip_keeps_every_field() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteCommentStore::new(pool(&tmp).await, Scope::item(ItemCategory::Post, "p1"));

        let mut payload = Map::new();
        payload.insert("actions".into(), json!([{"type": "delete"}]));
        let comment = CommentEntity {
            name: "c1".into(),
            author: "alice".into(),
            time: 1_700_000_000_000,
            content: "nice".into(),
            payload,
        };
        store.add(comment.clone()).await.unwrap();

        let loaded = store.get("c1").await.unwrap().unwrap();
        assert_eq!(loaded, comment);
        assert_eq!(loaded.payload["actions"][0]["type"], Value::from("delete"));
    }

    #[tokio::test]
    async fn update_of_missing_comment_inserts_it() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteCommentStore::new(pool(&tmp).await, Scope::item(ItemCategory::Post, "p1"));
        let comment = CommentEntity {
            name: "late".into(),
            author: "bob".into(),
            time: 5,
            content: "hello".into(),
            payload: Map::new(),
        };
        store.update(comment.clone()).await.unwrap();
        assert_eq!(store.get("late").await.unwrap(), Some(comment));
    }

    #[tokio::test]
    async fn records_follow_numeric_rank_order() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteRecordStore::new(
            pool(&tmp).await,
            Scope::leaderboard(ItemCategory::Level, "lv", "top"),
        );
        for (name, rank) in [("c", "3"), ("x", "abc"), ("a", "1"), ("b", "2"), ("big", "10")] {
            store.add(record(name, rank)).await.unwrap();
        }

        let ranks: Vec<String> = store
            .list(20, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.rank)
            .collect();
        assert_eq!(ranks, vec!["1", "2", "3", "10", "abc"]);
    }

    #[tokio::test]
    async fn scopes_share_the_table_without_leaking() {
        let tmp = TempDir::new().unwrap();
        let pool = pool(&tmp).await;
        let top = SqliteRecordStore::new(
            pool.clone(),
            Scope::leaderboard(ItemCategory::Level, "lv", "top"),
        );
        let weekly = SqliteRecordStore::new(pool, Scope::leaderboard(ItemCategory::Level, "lv", "weekly"));

        top.add(record("r1", "1")).await.unwrap();
        weekly.add(record("r1", "4")).await.unwrap();
        weekly.delete("r1").await.unwrap();

        assert_eq!(top.count().await.unwrap(), 1);
        assert_eq!(weekly.count().await.unwrap(), 0);
        assert_eq!(top.get("r1").await.unwrap(), Some(record("r1", "1")));
    }
}
