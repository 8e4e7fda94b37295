pub mod item_ops;

pub use item_ops::ItemService;
