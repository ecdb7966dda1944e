pub mod browser;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod key;
pub mod pagination;
pub mod playback;
pub mod provider;

#[cfg(test)]
mod testing;
