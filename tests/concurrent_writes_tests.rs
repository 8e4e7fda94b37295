use inventory_tracker::ItemDraft;
use inventory_tracker::db::{ItemStorage, connect};
use inventory_tracker::service::ItemService;
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

const WRITERS: usize = 40;

struct TempDb {
    path: PathBuf,
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

async fn file_backed_service(tag: &str) -> (ItemService, TempDb) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "inventory-tracker-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let pool = connect(&format!("sqlite:{}", path.display()), 5)
        .await
        .expect("open database");
    let storage = ItemStorage::new(pool);
    storage.init_schema().await.expect("init schema");
    (ItemService::new(storage), TempDb { path })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_to_one_item_resolve_last_write_wins() {
    let (svc, _db) = file_backed_service("same-row").await;
    let item = svc
        .save_item(ItemDraft::new("Drill", "stored").with_tags(["tools"]))
        .await
        .expect("seed item");

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.update_item(
                    item.id,
                    ItemDraft::new(format!("Drill{i}"), "in use").with_tags([format!("t{i}")]),
                )
                .await
            })
        })
        .collect();

    for handle in handles {
        let updated = handle.await.expect("task panicked").expect("update failed");
        assert_eq!(updated.id, item.id);
        assert_eq!(updated.created_at, item.created_at);
    }

    let all = svc.find_all().await.expect("list items");
    assert_eq!(all.len(), 1);
    let last = &all[0];
    let suffix = last
        .name
        .strip_prefix("Drill")
        .and_then(|n| n.parse::<usize>().ok())
        .expect("final name comes from one of the writers");
    assert!(suffix < WRITERS);
    // tags were written in the same transaction as the name
    assert_eq!(
        last.tags.iter().cloned().collect::<Vec<_>>(),
        vec![format!("t{suffix}")]
    );
    assert!(last.updated_at > item.updated_at);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_distinct_items_all_succeed() {
    let (svc, _db) = file_backed_service("distinct-rows").await;

    let mut ids = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        let item = svc
            .save_item(ItemDraft::new(format!("Box{i}"), "stored"))
            .await
            .expect("seed item");
        ids.push(item.id);
    }

    let updates: Vec<_> = ids
        .iter()
        .copied()
        .map(|id| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.update_item(id, ItemDraft::new(format!("Box#{id}"), "in use"))
                    .await
            })
        })
        .collect();
    let creates: Vec<_> = (0..WRITERS)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.save_item(ItemDraft::new(format!("Crate{i}"), "stored").with_tags(["new"]))
                    .await
            })
        })
        .collect();

    for handle in updates.into_iter().chain(creates) {
        handle.await.expect("task panicked").expect("write failed");
    }

    assert_eq!(svc.find_by_status("in use").await.unwrap().len(), WRITERS);
    assert_eq!(svc.find_by_tag("new").await.unwrap().len(), WRITERS);
    for id in ids {
        let item = svc.find_by_id(id).await.unwrap().expect("item present");
        assert_eq!(item.name, format!("Box#{id}"));
    }
}
