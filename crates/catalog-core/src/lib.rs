pub mod cache;
pub mod catalog;
pub mod category;
pub mod classifier;
pub mod config;
pub mod discover;
pub mod error;
pub mod frontmatter;
pub mod io;
pub mod paths;
pub mod query;
pub mod record;
pub mod types;
pub mod validator;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
