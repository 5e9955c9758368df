use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::AnyError;
use crate::AnyResult;
use crate::engine::EngineFactory;
use crate::engine::GrammarRegistry;
use crate::engine::HighlightEngine;

/// Outcome of [`HighlighterProvider::ensure_language`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
	/// The grammar is available in the shared instance, loaded either by
	/// this call or by an earlier one.
	Loaded,
	/// No bundled grammar matches the identifier. Skipped without loading;
	/// the identifier surfaces later as a per-block highlight error.
	NotInRegistry,
}

/// Shared highlighting state: the lazily-created engine instance, the record
/// of grammars already loaded into it, and the block-id counter.
///
/// One provider is typically shared by every plugin instance in a process so
/// each grammar loads once per process. Tests construct isolated providers
/// instead of touching ambient global state.
pub struct HighlighterProvider {
	factory: Box<dyn EngineFactory>,
	registry: GrammarRegistry,
	engine: OnceCell<Arc<dyn HighlightEngine>>,
	/// Per-language load cells. A cell initializes exactly once, on the
	/// first successful load; concurrent callers await the in-flight load
	/// instead of issuing a duplicate. Failed loads leave the cell empty so
	/// a later document retries.
	loads: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
	next_block_id: AtomicU64,
}

impl HighlighterProvider {
	pub fn new(factory: Box<dyn EngineFactory>, registry: GrammarRegistry) -> Self {
		Self {
			factory,
			registry,
			engine: OnceCell::new(),
			loads: Mutex::new(HashMap::new()),
			next_block_id: AtomicU64::new(1),
		}
	}

	/// Get the shared engine instance, creating it on first use with the
	/// given theme and no pre-loaded languages. The first caller's theme
	/// wins for the lifetime of the provider.
	pub async fn engine(&self, theme: &str) -> AnyResult<Arc<dyn HighlightEngine>> {
		let engine = self
			.engine
			.get_or_try_init(|| async { self.factory.create(theme, Vec::new()).await })
			.await?;
		Ok(Arc::clone(engine))
	}

	/// Whether the shared instance has been created yet.
	pub fn has_engine(&self) -> bool {
		self.engine.initialized()
	}

	/// Whether a grammar has been successfully loaded into the shared
	/// instance.
	pub fn is_loaded(&self, language: &str) -> bool {
		let loads = self.loads.lock().expect("load map lock poisoned");
		loads.get(language).is_some_and(|cell| cell.initialized())
	}

	/// Ensure the grammar for `language` is loaded into the shared instance.
	///
	/// Idempotent: the first successful load is recorded and every later
	/// call short-circuits. Concurrent callers for the same language await a
	/// single load.
	pub async fn ensure_language(&self, theme: &str, language: &str) -> AnyResult<LoadOutcome> {
		if !self.registry.contains(language) {
			return Ok(LoadOutcome::NotInRegistry);
		}

		let cell = self.load_cell(language);
		if cell.initialized() {
			debug!(language, "grammar already loaded");
			return Ok(LoadOutcome::Loaded);
		}

		let engine = self.engine(theme).await?;
		cell
			.get_or_try_init(|| async {
				let grammar = self
					.registry
					.load(language)
					.ok_or_else(|| AnyError::from(format!("no registry loader for `{language}`")))?
					.await?;
				debug!(language, "loading grammar into shared instance");
				engine.load_language(grammar).await
			})
			.await?;

		Ok(LoadOutcome::Loaded)
	}

	/// Next process-unique block identifier. Monotonic for the lifetime of
	/// the provider, so fragments generated for different blocks never
	/// collide, even across documents.
	pub fn next_block_id(&self) -> u64 {
		self.next_block_id.fetch_add(1, Ordering::Relaxed)
	}

	fn load_cell(&self, language: &str) -> Arc<OnceCell<()>> {
		let mut loads = self.loads.lock().expect("load map lock poisoned");
		Arc::clone(loads.entry(language.to_string()).or_default())
	}
}
