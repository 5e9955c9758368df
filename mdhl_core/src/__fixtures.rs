use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::AnyError;
use crate::AnyResult;
use crate::DEFAULT_LANGUAGE;
use crate::HighlightOptions;
use crate::HighlightPlugin;
use crate::HighlighterProvider;
use crate::engine::EngineFactory;
use crate::engine::Grammar;
use crate::engine::GrammarRegistry;
use crate::engine::HighlightEngine;
use crate::engine::HighlightOutput;
use crate::engine::HighlightRequest;

/// Engine double that records every call. Highlighting succeeds for loaded
/// languages and plain text; any other language errors like an engine that
/// does not know it.
pub(crate) struct MockEngine {
	/// Every grammar id passed to `load_language`, in call order.
	pub loaded: Mutex<Vec<String>>,
	/// Every theme seen by `highlight`, in call order.
	pub themes_seen: Mutex<Vec<String>>,
	pub highlight_calls: AtomicUsize,
	/// Grammar ids whose `load_language` call should fail.
	fail_loads_for: HashSet<String>,
}

impl MockEngine {
	pub fn new() -> Self {
		Self {
			loaded: Mutex::new(Vec::new()),
			themes_seen: Mutex::new(Vec::new()),
			highlight_calls: AtomicUsize::new(0),
			fail_loads_for: HashSet::new(),
		}
	}

	pub fn failing_loads(languages: &[&str]) -> Self {
		Self {
			fail_loads_for: languages.iter().map(ToString::to_string).collect(),
			..Self::new()
		}
	}

	/// How many times a grammar with this id was loaded.
	pub fn load_count(&self, language: &str) -> usize {
		self.loaded
			.lock()
			.unwrap()
			.iter()
			.filter(|loaded| *loaded == language)
			.count()
	}

	fn knows(&self, language: &str) -> bool {
		language == DEFAULT_LANGUAGE
			|| self
				.loaded
				.lock()
				.unwrap()
				.iter()
				.any(|loaded| loaded == language)
	}
}

#[async_trait]
impl HighlightEngine for MockEngine {
	async fn load_language(&self, grammar: Grammar) -> AnyResult<()> {
		if self.fail_loads_for.contains(&grammar.id) {
			return Err(AnyError::from(format!(
				"grammar for `{}` is corrupt",
				grammar.id
			)));
		}
		self.loaded.lock().unwrap().push(grammar.id);
		Ok(())
	}

	async fn highlight(&self, request: HighlightRequest<'_>) -> AnyResult<HighlightOutput> {
		self.highlight_calls.fetch_add(1, Ordering::Relaxed);
		self.themes_seen
			.lock()
			.unwrap()
			.push(request.theme.to_string());

		if !self.knows(request.language) {
			return Err(AnyError::from(format!(
				"unknown language `{}`",
				request.language
			)));
		}

		Ok(HighlightOutput {
			markup: format!(
				"<pre class=\"mdhl\" data-language=\"{}\"><code>{}</code></pre>",
				request.language, request.code
			),
			style_rules: format!(
				"<style>::highlight(mdhl-{id}) {{ color: var(--mdhl-token); }}</style>",
				id = request.block_id
			),
			activation_script: format!(
				"<script>CSS.highlights.set(\"mdhl-{id}\", new Highlight());</script>",
				id = request.block_id
			),
		})
	}
}

/// Factory double that counts instance creations and hands out one shared
/// [`MockEngine`].
pub(crate) struct MockFactory {
	engine: Arc<MockEngine>,
	created: Arc<AtomicUsize>,
	fail: bool,
}

impl MockFactory {
	pub fn new(engine: Arc<MockEngine>) -> Self {
		Self {
			engine,
			created: Arc::new(AtomicUsize::new(0)),
			fail: false,
		}
	}

	pub fn failing(engine: Arc<MockEngine>) -> Self {
		Self {
			fail: true,
			..Self::new(engine)
		}
	}

	/// Handle onto the creation counter, usable after the factory moves into
	/// a provider.
	pub fn created_handle(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.created)
	}
}

#[async_trait]
impl EngineFactory for MockFactory {
	async fn create(
		&self,
		_theme: &str,
		initial_languages: Vec<Grammar>,
	) -> AnyResult<Arc<dyn HighlightEngine>> {
		self.created.fetch_add(1, Ordering::Relaxed);
		if self.fail {
			return Err(AnyError::from("engine backend unavailable"));
		}
		assert!(
			initial_languages.is_empty(),
			"languages are loaded on demand, never eagerly"
		);
		Ok(Arc::clone(&self.engine) as Arc<dyn HighlightEngine>)
	}
}

pub(crate) fn grammar(id: &str) -> Grammar {
	Grammar {
		id: id.to_string(),
		source: format!("{id}-grammar"),
	}
}

/// Registry with a handful of bundled grammars.
pub(crate) fn bundled_registry() -> GrammarRegistry {
	let mut registry = GrammarRegistry::new();
	for id in ["javascript", "python", "rust"] {
		registry.register(id, move || async move { Ok(grammar(id)) });
	}
	registry
}

/// Registry whose single loader always fails.
pub(crate) fn failing_registry(id: &'static str) -> GrammarRegistry {
	let mut registry = GrammarRegistry::new();
	registry.register(id, move || {
		async move { Err(AnyError::from(format!("fetch of `{id}` grammar failed"))) }
	});
	registry
}

/// Plugin wired to a fresh provider over the given engine and registry.
pub(crate) fn plugin_with(
	engine: Arc<MockEngine>,
	registry: GrammarRegistry,
	options: HighlightOptions,
) -> HighlightPlugin {
	let provider = Arc::new(HighlighterProvider::new(
		Box::new(MockFactory::new(engine)),
		registry,
	));
	HighlightPlugin::new(options, provider)
}

pub(crate) fn parse(input: &str) -> Node {
	to_mdast(input, &ParseOptions::gfm()).expect("valid markdown")
}

/// Raw-HTML node values in document order.
pub(crate) fn html_values(node: &Node) -> Vec<String> {
	let mut values = Vec::new();
	collect_html_values(node, &mut values);
	values
}

/// Remaining code blocks as `(lang, value)` pairs, in document order.
pub(crate) fn code_blocks(node: &Node) -> Vec<(Option<String>, String)> {
	let mut blocks = Vec::new();
	collect_code_blocks(node, &mut blocks);
	blocks
}

/// Block ids extracted from generated activation-script fragments.
pub(crate) fn script_block_ids(node: &Node) -> Vec<u64> {
	html_values(node)
		.iter()
		.filter(|value| value.starts_with("<script>"))
		.filter_map(|value| {
			let start = value.find("mdhl-")? + "mdhl-".len();
			let digits: String = value[start..]
				.chars()
				.take_while(char::is_ascii_digit)
				.collect();
			digits.parse().ok()
		})
		.collect()
}

fn collect_html_values(node: &Node, values: &mut Vec<String>) {
	if let Node::Html(html) = node {
		values.push(html.value.clone());
		return;
	}
	if let Some(children) = node.children() {
		for child in children {
			collect_html_values(child, values);
		}
	}
}

fn collect_code_blocks(node: &Node, blocks: &mut Vec<(Option<String>, String)>) {
	if let Node::Code(code) = node {
		blocks.push((code.lang.clone(), code.value.clone()));
		return;
	}
	if let Some(children) = node.children() {
		for child in children {
			collect_code_blocks(child, blocks);
		}
	}
}
