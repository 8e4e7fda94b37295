pub mod item_request;

pub use item_request::ValidItem;
