//! Server-rendered item page: a listing plus one create/edit form.

use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::types::{Item, ItemDraft, item::parse_purchase_date};
use crate::{TrackerError, router::TrackerState};

/// Urlencoded body posted by the page's form. Empty fields mean "absent".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub purchase_value: String,
    #[serde(default)]
    pub purchase_date: String,
    #[serde(default)]
    pub tag_string: String,
}

impl ItemForm {
    pub fn into_draft(self) -> Result<ItemDraft, TrackerError> {
        let id = non_empty(&self.id)
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| TrackerError::Validation(format!("invalid id `{raw}`")))
            })
            .transpose()?;
        let purchase_value = non_empty(&self.purchase_value)
            .map(|raw| {
                raw.parse::<f64>().map_err(|_| {
                    TrackerError::Validation(format!("invalid purchaseValue `{raw}`"))
                })
            })
            .transpose()?;
        let purchase_date = non_empty(&self.purchase_date)
            .map(|raw| {
                parse_purchase_date(raw).ok_or_else(|| {
                    TrackerError::Validation(format!("invalid purchaseDate `{raw}`"))
                })
            })
            .transpose()?;

        let draft = ItemDraft {
            id,
            name: self.name,
            description: non_empty(&self.description).map(str::to_string),
            status: self.status,
            purchase_value,
            purchase_date,
            tags: split_tags(&self.tag_string),
        };
        draft.validate()?;
        Ok(draft)
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Split a comma-separated tag string, trimming and dropping empty entries.
pub fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /
pub async fn index(State(state): State<TrackerState>) -> Result<Html<String>, TrackerError> {
    let items = state.items.find_all().await?;
    Ok(Html(render_page(&items, None)))
}

/// GET /item/edit/{id}
pub async fn edit_item(
    State(state): State<TrackerState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, TrackerError> {
    let item = state
        .items
        .find_by_id(id)
        .await?
        .ok_or(TrackerError::ItemNotFound(id))?;
    let items = state.items.find_all().await?;
    Ok(Html(render_page(&items, Some(&item))))
}

/// POST /item/save
pub async fn save_item(
    State(state): State<TrackerState>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, TrackerError> {
    let draft = form.into_draft()?;
    state.items.save_item(draft).await?;
    Ok(Redirect::to("/"))
}

/// GET /item/delete/{id}
pub async fn delete_item(
    State(state): State<TrackerState>,
    Path(id): Path<i64>,
) -> Result<Redirect, TrackerError> {
    state.items.delete_item(id).await?;
    Ok(Redirect::to("/"))
}

pub fn render_page(items: &[Item], editing: Option<&Item>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Inventory</title></head>\n<body>\n<h1>Inventory</h1>\n",
    );
    render_table(&mut html, items);
    render_form(&mut html, editing);
    html.push_str("</body>\n</html>\n");
    html
}

fn render_table(html: &mut String, items: &[Item]) {
    html.push_str(
        "<table>\n<tr><th>Name</th><th>Description</th><th>Status</th><th>Value</th><th>Purchased</th><th>Tags</th><th></th></tr>\n",
    );
    for item in items {
        let tags = item.tags.iter().cloned().collect::<Vec<_>>().join(", ");
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><a href=\"/item/edit/{id}\">Edit</a> <a href=\"/item/delete/{id}\">Delete</a></td></tr>\n",
            encode_text(&item.name),
            encode_text(item.description.as_deref().unwrap_or("")),
            encode_text(&item.status),
            item.purchase_value.map(|v| v.to_string()).unwrap_or_default(),
            item.purchase_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            encode_text(&tags),
            id = item.id,
        ));
    }
    html.push_str("</table>\n");
}

fn render_form(html: &mut String, editing: Option<&Item>) {
    let id = editing.map(|i| i.id.to_string()).unwrap_or_default();
    let name = editing.map(|i| i.name.as_str()).unwrap_or("");
    let description = editing
        .and_then(|i| i.description.as_deref())
        .unwrap_or("");
    let status = editing.map(|i| i.status.as_str()).unwrap_or("");
    let value = editing
        .and_then(|i| i.purchase_value)
        .map(|v| v.to_string())
        .unwrap_or_default();
    let date = editing
        .and_then(|i| i.purchase_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let tags = editing
        .map(|i| i.tags.iter().cloned().collect::<Vec<_>>().join(", "))
        .unwrap_or_default();

    html.push_str(&format!(
        "<h2>{heading}</h2>\n<form method=\"post\" action=\"/item/save\">\n\
         <input type=\"hidden\" name=\"id\" value=\"{id}\">\n\
         <label>Name <input name=\"name\" value=\"{name}\" required></label>\n\
         <label>Description <textarea name=\"description\" maxlength=\"1000\">{description}</textarea></label>\n\
         <label>Status <input name=\"status\" value=\"{status}\" required></label>\n\
         <label>Value <input name=\"purchaseValue\" type=\"number\" step=\"any\" value=\"{value}\"></label>\n\
         <label>Purchased <input name=\"purchaseDate\" type=\"date\" value=\"{date}\"></label>\n\
         <label>Tags <input name=\"tagString\" value=\"{tags}\"></label>\n\
         <button type=\"submit\">Save</button>\n</form>\n",
        heading = if editing.is_some() { "Edit item" } else { "New item" },
        name = encode_double_quoted_attribute(name),
        description = encode_text(description),
        status = encode_double_quoted_attribute(status),
        tags = encode_double_quoted_attribute(&tags),
    ));
}
