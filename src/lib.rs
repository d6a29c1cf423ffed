//! Content-based anime recommendations served over HTTP
//!
//! A catalog of titles is vectorized once with TF-IDF. Each user session
//! then walks a queue of suggestions produced by the strategy that fits its
//! wishlist and watched history.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
