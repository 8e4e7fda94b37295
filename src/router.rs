use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{items, web};
use crate::service::ItemService;

/// Shared handler state. Dependencies are constructed by the caller and
/// passed in; handlers never look them up globally.
#[derive(Clone)]
pub struct TrackerState {
    pub items: ItemService,
}

impl TrackerState {
    pub fn new(items: ItemService) -> Self {
        Self { items }
    }
}

/// REST routes, mounted under `/api`.
pub fn api_router() -> Router<TrackerState> {
    Router::new()
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/search", get(items::search_items))
        .route("/items/status/{status}", get(items::items_by_status))
        .route("/items/tag/{tag}", get(items::items_by_tag))
        .route(
            "/items/{id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
}

/// Server-rendered page routes, mounted at the root.
pub fn web_router() -> Router<TrackerState> {
    Router::new()
        .route("/", get(web::index))
        .route("/item/save", post(web::save_item))
        .route("/item/edit/{id}", get(web::edit_item))
        .route("/item/delete/{id}", get(web::delete_item))
}

pub fn tracker_router(state: TrackerState, enable_web_ui: bool) -> Router {
    let mut router = Router::new().nest("/api", api_router());
    if enable_web_ui {
        router = router.merge(web_router());
    }
    router.with_state(state)
}
