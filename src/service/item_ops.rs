use crate::db::sqlite::ItemStorage;
use crate::error::TrackerError;
use crate::types::{Item, ItemDraft};
use tracing::{debug, info};

/// Business-facing item operations over an explicitly injected store.
#[derive(Clone)]
pub struct ItemService {
    storage: ItemStorage,
}

impl ItemService {
    pub fn new(storage: ItemStorage) -> Self {
        Self { storage }
    }

    /// Create, or replace when `draft.id` names an existing item.
    pub async fn save_item(&self, draft: ItemDraft) -> Result<Item, TrackerError> {
        draft.validate()?;
        let item = self.storage.save(&draft).await?;
        info!(id = item.id, name = %item.name, "item saved");
        Ok(item)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Item>, TrackerError> {
        self.storage.find_by_id(id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Item>, TrackerError> {
        self.storage.find_all().await
    }

    pub async fn find_by_status(&self, status: &str) -> Result<Vec<Item>, TrackerError> {
        self.storage.find_by_status(status).await
    }

    pub async fn find_by_tag(&self, tag: &str) -> Result<Vec<Item>, TrackerError> {
        self.storage.find_by_tag(tag).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Item>, TrackerError> {
        self.storage.find_by_name_containing(name).await
    }

    /// Overwrite every mutable field of an existing item with `new_values`.
    /// `id` and `createdAt` are kept; the store refreshes `updatedAt`.
    pub async fn update_item(&self, id: i64, new_values: ItemDraft) -> Result<Item, TrackerError> {
        new_values.validate()?;
        let Some(mut existing) = self.storage.find_by_id(id).await? else {
            return Err(TrackerError::ItemNotFound(id));
        };

        existing.name = new_values.name;
        existing.description = new_values.description;
        existing.status = new_values.status;
        existing.purchase_value = new_values.purchase_value;
        existing.purchase_date = new_values.purchase_date;
        existing.tags = new_values.tags;

        let item = self.storage.save(&existing.into()).await?;
        info!(id = item.id, "item updated");
        Ok(item)
    }

    /// Deleting an absent id succeeds silently.
    pub async fn delete_item(&self, id: i64) -> Result<(), TrackerError> {
        let removed = self.storage.delete_by_id(id).await?;
        if removed {
            info!(id, "item deleted");
        } else {
            debug!(id, "delete requested for absent item");
        }
        Ok(())
    }
}

impl From<Item> for ItemDraft {
    fn from(item: Item) -> Self {
        ItemDraft {
            id: Some(item.id),
            name: item.name,
            description: item.description,
            status: item.status,
            purchase_value: item.purchase_value,
            purchase_date: item.purchase_date,
            tags: item.tags,
        }
    }
}
