//! Article catalog reader: a cached, filterable view over the hosted
//! content store.

pub mod cache;
pub mod client;
pub mod config;
pub mod content;
pub mod detail;
pub mod error;
pub mod gateway;
pub mod listing;
pub mod models;
pub mod navigation;
pub mod writes;

#[cfg(test)]
mod mock_gateway;

pub use cache::ContentCache;
pub use error::{ContentError, Result};
pub use gateway::ContentGateway;
pub use models::{Article, ArticleDraft};
pub use navigation::{ArticleFilters, NavigationState};
