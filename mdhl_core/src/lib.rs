//! `mdhl_core` is the core library for [mdhl](https://github.com/mdhl-rs/mdhl), a markdown plugin that rewrites fenced code blocks into syntax-highlighted markup driven by the browser's CSS Custom Highlight API. Tokenization is delegated to an external highlighting engine; grammars are loaded lazily, exactly once per process, based on the languages a document actually uses.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Parsed markdown tree (mdast)
//!   → Language discovery (collect distinct code-block languages)
//!   → Grammar loading (custom loader once per plugin, then bundled
//!     grammars into the shared engine instance, idempotently)
//!   → Block transformation (snapshot positions, highlight each block,
//!     splice markup + style + script fragments over the code node)
//! ```
//!
//! Failures stay local: a grammar that fails to load is warned about and
//! skipped, a block that fails to highlight keeps its original form. Only a
//! failing custom-language loader aborts a transformation.
//!
//! ## Modules
//!
//! - [`config`] — [`HighlightOptions`]: theme selection and the optional
//!   custom-language loader callback.
//! - [`engine`] — interfaces to the external collaborators: the
//!   [`HighlightEngine`] and [`EngineFactory`] traits and the
//!   [`GrammarRegistry`] of lazily-loadable bundled grammars.
//!
//! ## Key Types
//!
//! - [`HighlightPlugin`] — the public surface; `transform` mutates a parsed
//!   [`markdown::mdast::Node`] tree in place.
//! - [`HighlighterProvider`] — shared state: the memoized engine instance,
//!   the grammar cache with in-flight load deduplication, and the block-id
//!   counter.
//! - [`HighlightOutput`] — the markup, style-rule, and activation-script
//!   fragments generated for one block.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use mdhl_core::HighlightOptions;
//! use mdhl_core::HighlightPlugin;
//! use mdhl_core::HighlighterProvider;
//!
//! // `factory` and `registry` come from the highlighting-engine backend.
//! let provider = Arc::new(HighlighterProvider::new(factory, registry));
//! let plugin = HighlightPlugin::new(HighlightOptions::new(), provider);
//!
//! let mut tree = markdown::to_mdast(input, &markdown::ParseOptions::gfm())?;
//! plugin.transform(&mut tree).await?;
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use highlighter::*;
pub use transform::*;

pub mod config;
pub mod engine;
mod error;
mod highlighter;
mod transform;
pub(crate) mod tree;

#[cfg(test)]
mod __fixtures;
