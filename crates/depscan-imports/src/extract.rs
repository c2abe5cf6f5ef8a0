//! Tree-sitter based import extraction.

use crate::name_path::DottedName;
use thiserror::Error;
use tree_sitter::{Node, Parser};

/// Imports nested deeper than this many named syntax nodes (counting the
/// module root) are ignored: an import buried four levels down a function or
/// exception handler is an unreliable signal of a real dependency.
pub const MAX_IMPORT_DEPTH: usize = 4;

/// One dotted path referenced by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImport {
    pub path: DottedName,
    /// Number of named ancestor nodes, module root included.
    pub depth: usize,
    /// 1-based source line of the import statement.
    pub line: usize,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to load Python grammar: {0}")]
    Grammar(String),
    #[error("syntax error in source")]
    Parse,
}

/// Extract every import path from one Python source.
///
/// `import a.b, c as d` emits one entry per comma-separated alias; a
/// `from x.y import …` emits the module path itself. Relative imports
/// contribute their identifier part only, so a bare `from . import x`
/// emits nothing.
pub fn extract_imports(source: &str) -> Result<Vec<ExtractedImport>, ExtractError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| ExtractError::Grammar(err.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ExtractError::Parse)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(ExtractError::Parse);
    }

    let mut imports = Vec::new();
    collect_imports(root, 0, source, &mut imports);
    Ok(imports)
}

fn collect_imports(node: Node, depth: usize, source: &str, out: &mut Vec<ExtractedImport>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.is_named() {
            continue;
        }
        let child_depth = depth + 1;
        match child.kind() {
            "import_statement" => {
                if child_depth <= MAX_IMPORT_DEPTH {
                    emit_import(child, child_depth, source, out);
                }
            }
            "import_from_statement" => {
                if child_depth <= MAX_IMPORT_DEPTH {
                    emit_from_import(child, child_depth, source, out);
                }
            }
            _ => collect_imports(child, child_depth, source, out),
        }
    }
}

/// `import a.b [as c], d.e [as f]` — one path per alias.
fn emit_import(node: Node, depth: usize, source: &str, out: &mut Vec<ExtractedImport>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let target = match child.kind() {
            "dotted_name" => Some(child),
            "aliased_import" => child.child_by_field_name("name"),
            _ => None,
        };
        if let Some(name_node) = target {
            push_path(name_node, node, depth, source, out);
        }
    }
}

/// `from a.b import …` — the module path only. For relative forms the
/// leading dots carry no identifier and only the trailing dotted name (if
/// any) is emitted.
fn emit_from_import(node: Node, depth: usize, source: &str, out: &mut Vec<ExtractedImport>) {
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };
    match module.kind() {
        "dotted_name" => push_path(module, node, depth, source, out),
        "relative_import" => {
            let mut cursor = module.walk();
            for part in module.children(&mut cursor) {
                if part.kind() == "dotted_name" {
                    push_path(part, node, depth, source, out);
                }
            }
        }
        _ => {}
    }
}

fn push_path(
    name_node: Node,
    stmt: Node,
    depth: usize,
    source: &str,
    out: &mut Vec<ExtractedImport>,
) {
    let text = &source[name_node.byte_range()];
    if let Some(path) = DottedName::parse(text) {
        out.push(ExtractedImport {
            path,
            depth,
            line: stmt.start_position().row + 1,
        });
    }
}
