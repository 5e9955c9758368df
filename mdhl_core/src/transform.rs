use std::collections::HashSet;
use std::sync::Arc;

use markdown::mdast::Node;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::DEFAULT_LANGUAGE;
use crate::HighlightOptions;
use crate::MdhlError;
use crate::MdhlResult;
use crate::engine::HighlightRequest;
use crate::highlighter::HighlighterProvider;
use crate::highlighter::LoadOutcome;
use crate::tree::discover_languages;
use crate::tree::snapshot_code_blocks;
use crate::tree::splice_fragments;

/// The plugin: one configuration (theme plus optional custom-language
/// loader) bound to a shared [`HighlighterProvider`].
///
/// [`transform`](Self::transform) mutates a parsed mdast tree in place,
/// replacing each fenced code block with highlighted markup, a
/// `::highlight()` style-rule fragment, and an activation-script fragment.
/// Blocks that cannot be highlighted keep their original form.
pub struct HighlightPlugin {
	options: HighlightOptions,
	provider: Arc<HighlighterProvider>,
	/// Set once the custom-language loader has completed successfully. A
	/// failed run leaves this empty, so the next transformation retries.
	custom_loaded: OnceCell<()>,
}

impl HighlightPlugin {
	pub fn new(options: HighlightOptions, provider: Arc<HighlighterProvider>) -> Self {
		Self {
			options,
			provider,
			custom_loaded: OnceCell::new(),
		}
	}

	/// The shared provider, for embedders wiring several plugin instances to
	/// one grammar cache.
	pub fn provider(&self) -> &Arc<HighlighterProvider> {
		&self.provider
	}

	/// Highlight every fenced code block in `tree`.
	///
	/// Only a failing custom-language loader propagates an error. Grammar
	/// loading and per-block highlighting failures are logged and the
	/// affected blocks keep their original form, so a document always
	/// renders.
	pub async fn transform(&self, tree: &mut Node) -> MdhlResult<()> {
		let languages = discover_languages(tree);
		self.load_languages(&languages).await?;
		self.transform_blocks(tree).await;
		Ok(())
	}

	/// Resolution and loading stage: run the custom loader first (once per
	/// plugin instance, whether or not the document has code blocks), then
	/// load every discovered language the registry knows about.
	async fn load_languages(&self, languages: &HashSet<String>) -> MdhlResult<()> {
		if let Some(loader) = &self.options.custom_languages {
			self.custom_loaded
				.get_or_try_init(|| loader())
				.await
				.map_err(MdhlError::CustomLanguages)?;
		}

		if languages.is_empty() {
			return Ok(());
		}

		for language in languages {
			match self
				.provider
				.ensure_language(&self.options.theme, language)
				.await
			{
				Ok(LoadOutcome::Loaded) => {}
				Ok(LoadOutcome::NotInRegistry) => {
					// Surfaces as a per-block error during transformation.
					debug!(language, "no bundled grammar for language");
				}
				Err(e) => {
					warn!(language, error = %e, "failed to load grammar");
				}
			}
		}

		Ok(())
	}

	/// Transformation pass: snapshot block positions, highlight each block
	/// in document order, then splice the results in reverse order so
	/// earlier replacements don't shift the positions of later ones.
	async fn transform_blocks(&self, tree: &mut Node) {
		let snapshot = snapshot_code_blocks(tree);
		if snapshot.is_empty() {
			return;
		}

		let engine = match self.provider.engine(&self.options.theme).await {
			Ok(engine) => engine,
			Err(e) => {
				error!(error = %e, "failed to create highlighter instance");
				return;
			}
		};

		// Ids are allocated in the forward pass so they track document
		// order even though splicing runs in reverse.
		let mut outputs = Vec::with_capacity(snapshot.len());
		for entry in &snapshot {
			let language = entry
				.lang
				.as_deref()
				.filter(|lang| !lang.is_empty())
				.unwrap_or(DEFAULT_LANGUAGE);
			let block_id = self.provider.next_block_id();
			let request = HighlightRequest {
				code: &entry.value,
				language,
				theme: &self.options.theme,
				block_id,
			};

			match engine.highlight(request).await {
				Ok(output) => outputs.push(Some(output)),
				Err(e) => {
					error!(language, block_id, error = %e, "failed to highlight code block");
					outputs.push(None);
				}
			}
		}

		for (entry, output) in snapshot.iter().zip(&outputs).rev() {
			if let Some(output) = output {
				splice_fragments(tree, entry, output);
			}
		}
	}
}
