//! Remote catalog client: wire types, normalization and the TMDB HTTP client.

pub mod error;
pub mod models;
pub mod normalize;
pub mod tmdb;
pub mod traits;

pub use error::CatalogError;
pub use traits::CatalogService;
