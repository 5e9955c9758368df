//! mdast traversal and mutation primitives.
//!
//! The transformation runs in two passes over the tree: a read-only pass
//! that records languages and block positions, and a mutation pass that
//! splices generated fragments over the original code nodes. Positions are
//! captured before any mutation so splices can never invalidate them.

use std::collections::HashSet;

use markdown::mdast::Code;
use markdown::mdast::Html;
use markdown::mdast::Node;

use crate::engine::HighlightOutput;

/// Position of one code block, captured before any mutation. The parent is
/// identified by its child-index path from the root and the block by its
/// index within that parent's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodeBlockEntry {
	pub parent_path: Vec<usize>,
	pub index: usize,
	pub lang: Option<String>,
	pub value: String,
}

/// Collect the distinct language identifiers declared on code blocks in the
/// tree. Absent and empty identifiers mean plain text and are excluded;
/// nothing needs loading for them. Identifiers are compared exactly, with no
/// normalization or alias resolution.
pub(crate) fn discover_languages(root: &Node) -> HashSet<String> {
	let mut languages = HashSet::new();
	visit_code_blocks(root, &mut |code| {
		if let Some(lang) = &code.lang {
			if !lang.is_empty() {
				languages.insert(lang.clone());
			}
		}
	});
	languages
}

/// Snapshot every code block with its parent path and index, in document
/// order.
pub(crate) fn snapshot_code_blocks(root: &Node) -> Vec<CodeBlockEntry> {
	let mut entries = Vec::new();
	let mut path = Vec::new();
	collect_code_blocks(root, &mut path, &mut entries);
	entries
}

/// Replace the code block recorded in `entry` with three raw-HTML nodes:
/// markup, style rules, activation script. Returns `false` when the recorded
/// position no longer refers to a code block.
pub(crate) fn splice_fragments(
	root: &mut Node,
	entry: &CodeBlockEntry,
	output: &HighlightOutput,
) -> bool {
	let Some(parent) = node_at_path_mut(root, &entry.parent_path) else {
		return false;
	};
	let Some(children) = parent.children_mut() else {
		return false;
	};
	if !matches!(children.get(entry.index), Some(Node::Code(_))) {
		return false;
	}

	let replacements = [&output.markup, &output.style_rules, &output.activation_script]
		.into_iter()
		.map(|value| {
			Node::Html(Html {
				value: value.clone(),
				position: None,
			})
		});
	children.splice(entry.index..=entry.index, replacements);
	true
}

fn visit_code_blocks(node: &Node, f: &mut impl FnMut(&Code)) {
	if let Node::Code(code) = node {
		f(code);
		return;
	}
	if let Some(children) = node.children() {
		for child in children {
			visit_code_blocks(child, f);
		}
	}
}

fn collect_code_blocks(node: &Node, path: &mut Vec<usize>, entries: &mut Vec<CodeBlockEntry>) {
	let Some(children) = node.children() else {
		return;
	};
	for (index, child) in children.iter().enumerate() {
		if let Node::Code(code) = child {
			entries.push(CodeBlockEntry {
				parent_path: path.clone(),
				index,
				lang: code.lang.clone(),
				value: code.value.clone(),
			});
		} else {
			path.push(index);
			collect_code_blocks(child, path, entries);
			path.pop();
		}
	}
}

fn node_at_path_mut<'a>(root: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
	let mut node = root;
	for &index in path {
		node = node.children_mut()?.get_mut(index)?;
	}
	Some(node)
}
