use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdhlError {
	#[error("custom language loader failed: {0}")]
	#[diagnostic(
		code(mdhl::custom_languages),
		help(
			"the `custom_languages` callback configured in `HighlightOptions` returned an error; \
			 fix the callback or remove it from the options"
		)
	)]
	CustomLanguages(#[source] AnyError),
}

pub type MdhlResult<T> = Result<T, MdhlError>;
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;
pub type AnyResult<T> = Result<T, AnyError>;
