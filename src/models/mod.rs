//! Data models for the catalog backend.
//!
//! Field names follow the stored document layout, so the same shapes serve the
//! store adapters and the HTTP API.

mod category;
mod import;
mod page;
mod preference;
mod product;

pub use category::*;
pub use import::*;
pub use page::*;
pub use preference::*;
pub use product::*;
