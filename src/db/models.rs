use crate::types::Item;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Scalar columns of one `items` row; tags live in `item_tags`.
#[derive(Debug, Clone, PartialEq)]
pub struct DbItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub purchase_value: Option<f64>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbItem {
    pub fn into_item(self, tags: BTreeSet<String>) -> Item {
        Item {
            id: self.id,
            name: self.name,
            description: self.description,
            status: self.status,
            purchase_value: self.purchase_value,
            purchase_date: self.purchase_date,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
