//! Shared foundation for the embedding processor.
//!
//! Holds the typed error enum, the Figment-based configuration loader
//! (`config.toml` + `config.<env>.toml` + `APP_*` env vars), the `Embedder`
//! trait implemented by the model stack, and the JSON batch codec that maps
//! the stdin blob to an ordered batch of texts and the embeddings back to a
//! single output line.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod batch;
pub mod config;
pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::Embedder;
