use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::AnyResult;

/// Theme identifier used when none is configured.
pub const DEFAULT_THEME: &str = "dark-plus";

/// Effective language for fenced blocks with an absent or empty info string.
/// Plain text needs no grammar, so this identifier is excluded from discovery
/// and never triggers a registry lookup.
pub const DEFAULT_LANGUAGE: &str = "text";

/// Future returned by a [`CustomLanguageLoader`].
pub type LoaderFuture = Pin<Box<dyn Future<Output = AnyResult<()>> + Send>>;

/// User-supplied callback that registers extra languages with the
/// highlighting engine (grammars not present in the bundled registry). It
/// runs at most once per [`HighlightPlugin`](crate::HighlightPlugin)
/// instance, before any grammar loading, regardless of how many documents
/// that instance processes.
pub type CustomLanguageLoader = Box<dyn Fn() -> LoaderFuture + Send + Sync>;

/// Configuration for a [`HighlightPlugin`](crate::HighlightPlugin).
///
/// ```
/// use mdhl_core::HighlightOptions;
///
/// let options = HighlightOptions::new().with_theme("nord");
/// assert_eq!(options.theme, "nord");
/// ```
pub struct HighlightOptions {
	/// Theme passed to the engine when the shared instance is created and
	/// with every highlight request.
	pub theme: String,
	/// Optional callback for registering custom languages.
	pub custom_languages: Option<CustomLanguageLoader>,
}

impl HighlightOptions {
	/// Options with the [`DEFAULT_THEME`] and no custom language loader.
	pub fn new() -> Self {
		Self {
			theme: DEFAULT_THEME.to_string(),
			custom_languages: None,
		}
	}

	/// Set the theme identifier.
	pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
		self.theme = theme.into();
		self
	}

	/// Set the custom language loader. The loader's failure is fatal to the
	/// transformation call that triggers it (see
	/// [`MdhlError::CustomLanguages`](crate::MdhlError::CustomLanguages)).
	pub fn with_custom_languages<F, Fut>(mut self, loader: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = AnyResult<()>> + Send + 'static,
	{
		self.custom_languages = Some(Box::new(move || Box::pin(loader())));
		self
	}
}

impl Default for HighlightOptions {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for HighlightOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HighlightOptions")
			.field("theme", &self.theme)
			.field("custom_languages", &self.custom_languages.is_some())
			.finish()
	}
}
