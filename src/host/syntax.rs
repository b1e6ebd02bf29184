//! Tree-sitter backed code model for the filesystem host.

use std::path::Path;

use tree_sitter::{Language, Node, Parser, Point, Tree};
use tracing::warn;

use super::{CodeElement, ElementKind, TextPoint};

/// Languages the filesystem host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    Rust,
    Cpp,
    Python,
}

impl SourceLanguage {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "rs" => Some(SourceLanguage::Rust),
            "c" | "cc" | "cpp" | "cxx" | "h" | "hh" | "hpp" | "hxx" | "inl" => {
                Some(SourceLanguage::Cpp)
            }
            "py" | "pyi" => Some(SourceLanguage::Python),
            _ => None,
        }
    }

    fn grammar(self) -> Language {
        match self {
            SourceLanguage::Rust => tree_sitter_rust::language(),
            SourceLanguage::Cpp => tree_sitter_cpp::language(),
            SourceLanguage::Python => tree_sitter_python::language(),
        }
    }

    fn separator(self) -> &'static str {
        match self {
            SourceLanguage::Python => ".",
            _ => "::",
        }
    }

    /// Element kind of `node`, or `None` for nodes that are not code elements.
    fn classify(self, node: Node<'_>) -> Option<ElementKind> {
        match self {
            SourceLanguage::Rust => match node.kind() {
                "function_item" | "function_signature_item" => Some(ElementKind::Function),
                "struct_item" | "enum_item" | "union_item" | "trait_item" | "impl_item"
                | "type_item" => Some(ElementKind::Type),
                "mod_item" => Some(ElementKind::Namespace),
                "field_declaration" | "const_item" | "static_item" => Some(ElementKind::Property),
                _ => None,
            },
            SourceLanguage::Cpp => match node.kind() {
                "function_definition" => Some(ElementKind::Function),
                "declaration" | "field_declaration" => {
                    if cpp_function_declarator(node).is_some() {
                        Some(ElementKind::Function)
                    } else if node.kind() == "field_declaration" {
                        Some(ElementKind::Property)
                    } else {
                        None
                    }
                }
                "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier"
                    if node.child_by_field_name("body").is_some() =>
                {
                    Some(ElementKind::Type)
                }
                "namespace_definition" => Some(ElementKind::Namespace),
                _ => None,
            },
            SourceLanguage::Python => match node.kind() {
                "function_definition" => Some(ElementKind::Function),
                "class_definition" => Some(ElementKind::Type),
                _ => None,
            },
        }
    }

    /// The node that carries an element's declared name.
    fn name_node<'t>(self, node: Node<'t>) -> Option<Node<'t>> {
        match (self, node.kind()) {
            (SourceLanguage::Rust, "impl_item") => node.child_by_field_name("type"),
            (SourceLanguage::Cpp, "function_definition" | "declaration" | "field_declaration") => {
                match cpp_function_declarator(node) {
                    Some(declarator) => declarator.child_by_field_name("declarator"),
                    None => cpp_innermost_declarator(node),
                }
            }
            _ => node.child_by_field_name("name"),
        }
    }
}

/// Follows a C++ declarator chain (pointers, references) to its function declarator.
fn cpp_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.child_by_field_name("declarator")?;
    loop {
        if current.kind() == "function_declarator" {
            return Some(current);
        }
        current = next_declarator(current)?;
    }
}

fn cpp_innermost_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.child_by_field_name("declarator")?;
    while let Some(next) = next_declarator(current) {
        current = next;
    }
    Some(current)
}

fn next_declarator(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("declarator").or_else(|| {
        if node.kind() == "reference_declarator" {
            node.named_child(0)
        } else {
            None
        }
    })
}

fn parse(source: &str, language: SourceLanguage) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&language.grammar()) {
        warn!("Failed to load {:?} grammar: {}", language, e);
        return None;
    }
    parser.parse(source, None)
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn element_name(language: SourceLanguage, node: Node<'_>, source: &str) -> Option<String> {
    let name = node_text(language.name_node(node)?, source).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Last segment of a possibly qualified name (`Scene::Render` -> `Render`).
fn simple_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

fn qualified_name(language: SourceLanguage, node: Node<'_>, source: &str) -> String {
    let own = element_name(language, node, source).unwrap_or_else(|| "<anonymous>".to_string());
    let mut scopes = Vec::new();
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if matches!(
            language.classify(ancestor),
            Some(ElementKind::Namespace | ElementKind::Type)
        ) {
            if let Some(name) = element_name(language, ancestor, source) {
                scopes.push(name);
            }
        }
        current = ancestor.parent();
    }
    scopes.reverse();
    scopes.push(own);
    scopes.join(language.separator())
}

fn line_of(point: Point) -> u32 {
    u32::try_from(point.row).unwrap_or(u32::MAX - 1) + 1
}

/// Innermost function-level element that contains `point`.
pub fn enclosing_function(
    source: &str,
    language: SourceLanguage,
    point: TextPoint,
) -> Option<CodeElement> {
    let tree = parse(source, language)?;
    let target = Point::new(
        point.line.saturating_sub(1) as usize,
        point.column.saturating_sub(1) as usize,
    );
    let mut node = tree.root_node().descendant_for_point_range(target, target)?;
    loop {
        if language.classify(node) == Some(ElementKind::Function) {
            return Some(CodeElement {
                kind: ElementKind::Function,
                full_name: qualified_name(language, node, source),
                start_line: line_of(node.start_position()),
                end_line: line_of(node.end_position()),
            });
        }
        node = node.parent()?;
    }
}

/// Positions of the names of declarations whose simple name satisfies `accept`,
/// in document order.
pub fn declarations_matching<F>(source: &str, language: SourceLanguage, accept: F) -> Vec<TextPoint>
where
    F: Fn(&str) -> bool,
{
    let Some(tree) = parse(source, language) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        // `impl Foo` is a use of Foo, not a declaration of it
        if language.classify(node).is_some() && node.kind() != "impl_item" {
            if let Some(name_node) = language.name_node(node) {
                if accept(simple_name(node_text(name_node, source))) {
                    let start = name_node.start_position();
                    found.push(TextPoint::new(
                        line_of(start),
                        u32::try_from(start.column).unwrap_or(u32::MAX - 1) + 1,
                    ));
                }
            }
        }
        push_children(&mut stack, node);
    }
    found
}

fn push_children<'t>(stack: &mut Vec<Node<'t>>, node: Node<'t>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    stack.extend(children.into_iter().rev());
}

/// One row of a code outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Number of enclosing code elements.
    pub depth: usize,
    pub kind: ElementKind,
    pub full_name: String,
    pub line: u32,
}

/// Pre-order outline of the code elements in `source`. Elements nested deeper
/// than `max_depth` are not visited.
pub fn outline(source: &str, language: SourceLanguage, max_depth: usize) -> Vec<OutlineEntry> {
    let Some(tree) = parse(source, language) else {
        return Vec::new();
    };
    let mut entries = Vec::new();
    let mut stack = vec![(tree.root_node(), 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let child_depth = match language.classify(node) {
            Some(kind) => {
                entries.push(OutlineEntry {
                    depth,
                    kind,
                    full_name: qualified_name(language, node, source),
                    line: line_of(node.start_position()),
                });
                if depth >= max_depth {
                    continue;
                }
                depth + 1
            }
            None => depth,
        };
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, child_depth)));
    }
    entries
}
