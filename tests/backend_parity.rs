//! The same command script must produce identical observations on every storage backend.

use std::sync::Arc;

use serde_json::{Map, json};
use sonolus_back::{
    dao::{
        models::{CommentEntity, RecordEntity},
        scoped_store::{
            BackendOptions, CommentStore, MAX_PAGE_SIZE, RecordStore, StorageBackendKind,
            StoreFactory,
        },
        storage::StorageError,
    },
    state::category::ItemCategory,
};
use tempfile::TempDir;

#[derive(Debug, PartialEq)]
struct Observation<E> {
    page: Vec<E>,
    window: Vec<E>,
    looked_up: Option<E>,
    count: usize,
}

async fn factories(tmp: &TempDir) -> Vec<(StorageBackendKind, StoreFactory)> {
    let mut out = vec![(StorageBackendKind::Memory, StoreFactory::memory())];

    let json = BackendOptions {
        path: Some(tmp.path().join("json")),
        url: None,
    };
    out.push((
        StorageBackendKind::Json,
        StoreFactory::select(StorageBackendKind::Json, &json)
            .await
            .unwrap(),
    ));

    #[cfg(feature = "sqlite-store")]
    {
        let database = BackendOptions {
            path: None,
            url: Some("sqlite::memory:".into()),
        };
        out.push((
            StorageBackendKind::Database,
            StoreFactory::select(StorageBackendKind::Database, &database)
                .await
                .unwrap(),
        ));
    }

    out
}

fn comment(name: &str, time: i64, content: &str) -> CommentEntity {
    let mut payload = Map::new();
    payload.insert("actions".into(), json!([]));
    CommentEntity {
        name: name.into(),
        author: "author".into(),
        time,
        content: content.into(),
        payload,
    }
}

fn record(name: &str, rank: &str) -> RecordEntity {
    RecordEntity {
        name: name.into(),
        rank: rank.into(),
        player: format!("player-{name}"),
        value: format!("{rank}-pts"),
        payload: Map::new(),
    }
}

async fn observe_comments(store: &CommentStore, name: &str) -> Observation<CommentEntity> {
    Observation {
        page: store.list(100, 0).await.unwrap(),
        window: store.list(2, 1).await.unwrap(),
        looked_up: store.get(name).await.unwrap(),
        count: store.count().await.unwrap(),
    }
}

async fn observe_records(store: &RecordStore, name: &str) -> Observation<RecordEntity> {
    Observation {
        page: store.list(100, 0).await.unwrap(),
        window: store.list(3, 2).await.unwrap(),
        looked_up: store.get(name).await.unwrap(),
        count: store.count().await.unwrap(),
    }
}

async fn comment_script(store: Arc<CommentStore>) -> Vec<Observation<CommentEntity>> {
    let mut seen = Vec::new();

    store.add(comment("c1", 10, "first")).await.unwrap();
    store.add(comment("c2", 30, "second")).await.unwrap();
    store.add(comment("c4", 20, "tie b")).await.unwrap();
    store.add(comment("c3", 20, "tie a")).await.unwrap();
    seen.push(observe_comments(&*store, "c2").await);

    store.update(comment("c1", 40, "edited")).await.unwrap();
    store.update(comment("c9", 5, "late insert")).await.unwrap();
    seen.push(observe_comments(&*store, "c1").await);

    store.delete("c2").await.unwrap();
    store.delete("ghost").await.unwrap();
    seen.push(observe_comments(&*store, "c2").await);

    for i in 0..25 {
        store
            .add(comment(&format!("bulk-{i:02}"), 100 + i, "bulk"))
            .await
            .unwrap();
    }
    seen.push(observe_comments(&*store, "bulk-07").await);
    seen.push(Observation {
        page: store.list(MAX_PAGE_SIZE, 20).await.unwrap(),
        window: store.list(0, 0).await.unwrap(),
        looked_up: None,
        count: store.count().await.unwrap(),
    });

    seen
}

async fn record_script(store: Arc<RecordStore>) -> Vec<Observation<RecordEntity>> {
    let mut seen = Vec::new();

    for (name, rank) in [("r3", "3"), ("r1", "1"), ("rx", "abc"), ("r2", "2")] {
        store.add(record(name, rank)).await.unwrap();
    }
    seen.push(observe_records(&*store, "rx").await);

    store.add(record("r10", "10")).await.unwrap();
    store.add(record("r7", "007")).await.unwrap();
    store.add(record("blank", "")).await.unwrap();
    store.update(record("r3", "30")).await.unwrap();
    seen.push(observe_records(&*store, "r3").await);

    store.delete("r1").await.unwrap();
    store.delete("missing").await.unwrap();
    seen.push(observe_records(&*store, "r1").await);

    seen
}

#[tokio::test]
async fn comment_backends_agree() {
    let tmp = TempDir::new().unwrap();
    let mut reference = None;

    for (kind, factory) in factories(&tmp).await {
        let store = factory.comments(ItemCategory::Post, "parity").await.unwrap();
        let observed = comment_script(store).await;

        let first = &observed[0];
        let times: Vec<i64> = first.page.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![30, 20, 20, 10], "{kind}");
        assert_eq!(first.page[1].name, "c3", "{kind}");
        assert!(observed[3].page.len() <= MAX_PAGE_SIZE, "{kind}");
        assert_eq!(observed[3].count, 29, "{kind}");
        assert!(observed[4].window.is_empty(), "{kind}");

        match &reference {
            None => reference = Some(observed),
            Some(expected) => assert_eq!(&observed, expected, "{kind} diverged from memory"),
        }
    }
}

#[tokio::test]
async fn record_backends_agree() {
    let tmp = TempDir::new().unwrap();
    let mut reference = None;

    for (kind, factory) in factories(&tmp).await {
        let store = factory
            .records(ItemCategory::Level, "parity", "top")
            .await
            .unwrap();
        let observed = record_script(store).await;

        let ranks: Vec<&str> = observed[0].page.iter().map(|r| r.rank.as_str()).collect();
        assert_eq!(ranks, vec!["1", "2", "3", "abc"], "{kind}");

        let ranks: Vec<&str> = observed[1].page.iter().map(|r| r.rank.as_str()).collect();
        assert_eq!(ranks, vec!["1", "2", "007", "10", "30", "", "abc"], "{kind}");
        assert_eq!(observed[2].count, 6, "{kind}");
        assert_eq!(observed[2].looked_up, None, "{kind}");

        match &reference {
            None => reference = Some(observed),
            Some(expected) => assert_eq!(&observed, expected, "{kind} diverged from memory"),
        }
    }
}

#[tokio::test]
async fn payloads_shadowing_fixed_fields_are_refused_everywhere() {
    let tmp = TempDir::new().unwrap();

    for (kind, factory) in factories(&tmp).await {
        let comments = factory.comments(ItemCategory::Post, "shadow").await.unwrap();
        let mut shadowing = comment("c1", 1, "text");
        shadowing.payload.insert("author".into(), json!("shadow"));

        let err = comments.add(shadowing.clone()).await.unwrap_err();
        assert!(
            matches!(&err, StorageError::ReservedField { field, .. } if field == "author"),
            "{kind}: {err}"
        );
        assert!(comments.update(shadowing).await.is_err(), "{kind}");
        assert_eq!(comments.count().await.unwrap(), 0, "{kind}");
        assert_eq!(comments.get("c1").await.unwrap(), None, "{kind}");

        let records = factory
            .records(ItemCategory::Level, "shadow", "top")
            .await
            .unwrap();
        let mut shadowing = record("r1", "1");
        shadowing.payload.insert("rank".into(), json!("0"));
        assert!(records.add(shadowing).await.is_err(), "{kind}");

        let mut carried = record("r2", "2");
        carried.payload.insert("replays".into(), json!(["replay-1"]));
        records.add(carried.clone()).await.unwrap();
        assert_eq!(records.get("r2").await.unwrap(), Some(carried), "{kind}");
        assert_eq!(records.count().await.unwrap(), 1, "{kind}");
    }
}

#[tokio::test]
async fn json_scopes_survive_a_new_factory() {
    let tmp = TempDir::new().unwrap();
    let options = BackendOptions {
        path: Some(tmp.path().to_owned()),
        url: None,
    };

    let factory = StoreFactory::select(StorageBackendKind::Json, &options)
        .await
        .unwrap();
    let store = factory.comments(ItemCategory::Level, "lv-1").await.unwrap();
    store.add(comment("c1", 1, "persisted")).await.unwrap();
    drop(factory);

    let reopened = StoreFactory::select(StorageBackendKind::Json, &options)
        .await
        .unwrap();
    let store = reopened.comments(ItemCategory::Level, "lv-1").await.unwrap();
    assert_eq!(store.get("c1").await.unwrap(), Some(comment("c1", 1, "persisted")));
}
