//! Interfaces to the external highlighting engine.
//!
//! This crate orchestrates *when* grammars load and *where* generated markup
//! lands in the document tree; the tokenizer itself is a collaborator behind
//! [`HighlightEngine`]. An embedder supplies an [`EngineFactory`] for
//! creating the shared instance and a [`GrammarRegistry`] describing the
//! grammars that can be loaded on demand.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::AnyResult;

/// A loadable language grammar descriptor. The engine defines what `source`
/// contains (a serialized TextMate grammar, for example); this crate only
/// moves descriptors from the registry into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
	/// Identifier the grammar registers under, e.g. `"javascript"`.
	pub id: String,
	/// Engine-defined grammar payload.
	pub source: String,
}

/// One highlight invocation for a single code block.
#[derive(Debug, Clone)]
pub struct HighlightRequest<'a> {
	/// Raw text of the fenced block.
	pub code: &'a str,
	/// Effective language identifier (never empty; unlabeled blocks use
	/// [`DEFAULT_LANGUAGE`](crate::DEFAULT_LANGUAGE)).
	pub language: &'a str,
	/// Theme identifier.
	pub theme: &'a str,
	/// Unique block identifier. Keeps generated highlight names from
	/// colliding across blocks, documents, and the whole provider lifetime.
	pub block_id: u64,
}

/// Fragments produced for one code block. They replace the original code
/// node in the tree in field order: markup, then style rules, then the
/// activation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOutput {
	/// The highlighted `<pre>`/`<code>` markup fragment.
	pub markup: String,
	/// `::highlight(...)` style rules for the block's ranges.
	pub style_rules: String,
	/// Script fragment that registers the ranges with `CSS.highlights` at
	/// render time.
	pub activation_script: String,
}

/// The shared highlighting-engine instance.
#[async_trait]
pub trait HighlightEngine: Send + Sync {
	/// Register a grammar with this instance. Must be safe to invoke
	/// redundantly with the same grammar.
	async fn load_language(&self, grammar: Grammar) -> AnyResult<()>;

	/// Produce the output fragments for one code block. Fails when the
	/// language is unknown to the instance or the input is unprocessable.
	async fn highlight(&self, request: HighlightRequest<'_>) -> AnyResult<HighlightOutput>;
}

/// Creates engine instances. [`HighlighterProvider`](crate::HighlighterProvider)
/// calls this at most once per provider; languages are loaded on demand
/// afterwards, so `initial_languages` is always empty in practice.
#[async_trait]
pub trait EngineFactory: Send + Sync {
	async fn create(
		&self,
		theme: &str,
		initial_languages: Vec<Grammar>,
	) -> AnyResult<Arc<dyn HighlightEngine>>;
}

/// Future returned by a registry loader.
pub type GrammarFuture = Pin<Box<dyn Future<Output = AnyResult<Grammar>> + Send>>;

/// Registry of bundled grammars keyed by language identifier. Loaders are
/// lazy: nothing is fetched or parsed until a document actually uses the
/// language.
#[derive(Default)]
pub struct GrammarRegistry {
	loaders: HashMap<String, Box<dyn Fn() -> GrammarFuture + Send + Sync>>,
}

impl GrammarRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a lazy loader for `id`, replacing any previous loader for
	/// the same identifier.
	pub fn register<F, Fut>(&mut self, id: impl Into<String>, loader: F)
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = AnyResult<Grammar>> + Send + 'static,
	{
		self.loaders
			.insert(id.into(), Box::new(move || Box::pin(loader())));
	}

	/// Whether a bundled grammar exists for `id`. Comparison is exact; no
	/// alias resolution happens here.
	pub fn contains(&self, id: &str) -> bool {
		self.loaders.contains_key(id)
	}

	/// Start loading the grammar descriptor for `id`.
	pub(crate) fn load(&self, id: &str) -> Option<GrammarFuture> {
		self.loaders.get(id).map(|loader| loader())
	}

	pub fn len(&self) -> usize {
		self.loaders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.loaders.is_empty()
	}
}

impl fmt::Debug for GrammarRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut languages: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
		languages.sort_unstable();
		f.debug_struct("GrammarRegistry")
			.field("languages", &languages)
			.finish()
	}
}
