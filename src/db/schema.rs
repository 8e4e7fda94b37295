//! SQL DDL for initializing the item storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `items`: scalar fields keyed by `id` INTEGER PRIMARY KEY AUTOINCREMENT
/// - timestamps stored as RFC3339 text
/// - `item_tags`: one row per (item, tag); no uniqueness constraint, queries
///   de-duplicate
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NULL,
    status TEXT NOT NULL,
    purchase_value REAL NULL,
    purchase_date TEXT NULL, -- RFC3339
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS item_tags (
    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    tag TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
CREATE INDEX IF NOT EXISTS idx_item_tags_item_id ON item_tags(item_id);
CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag);
"#;
