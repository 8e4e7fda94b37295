pub mod items;
pub mod web;
