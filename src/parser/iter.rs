//! Depth-first traversal and textual dump of a [`ParseTree`]
//!
//! The iterator keeps its own stack, so walking a deeply nested tree costs
//! heap, not native stack.

use std::fmt;

use super::ast::{LexemeIndex, NodeIndex, ParseTree, Symbol, ROOT_NODE};

/// Pre-order walk yielding `(node, depth)` pairs.
pub struct TreeIter<'a> {
    tree: &'a ParseTree,
    stack: Vec<(NodeIndex, usize)>,
}

impl<'a> TreeIter<'a> {
    pub fn new(tree: &'a ParseTree, start: NodeIndex) -> Self {
        Self {
            tree,
            stack: vec![(start, 0)],
        }
    }
}

impl Iterator for TreeIter<'_> {
    type Item = (NodeIndex, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (nodi, depth) = self.stack.pop()?;
        // Reverse so the first child is popped first.
        self.stack.extend(
            self.tree
                .children(nodi)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((nodi, depth))
    }
}

impl ParseTree {
    /// Walk the whole tree from the root.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter::new(self, ROOT_NODE)
    }

    pub fn iter_from(&self, nodi: NodeIndex) -> TreeIter<'_> {
        TreeIter::new(self, nodi)
    }

    /// Symbols in pre-order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.iter().map(|(nodi, _)| self.symbol(nodi)).collect()
    }

    /// Display adapter printing one indented line per node.
    pub fn dump<'a>(&'a self, source: &'a [u8]) -> Dump<'a> {
        Dump { tree: self, source }
    }

    /// One-line description of a node's own payload (no children).
    pub fn describe(&self, source: &[u8], nodi: NodeIndex) -> String {
        let symbol = self.symbol(nodi);
        match symbol {
            Symbol::VarDecl => {
                let decl = self.as_vardecl(nodi);
                let mut text = String::new();
                if decl.is_public {
                    text.push_str("pub ");
                }
                text.push_str(&self.join(source, decl.identifiers, ", "));
                text
            }
            Symbol::Name => {
                let name = self.as_name(nodi);
                let mut text = String::new();
                if name.implicit_this {
                    text.push_str("this");
                }
                for &ns in name.namespaces {
                    text.push_str(&self.lexeme_text(source, ns));
                    text.push_str("::");
                }
                for (i, &field) in name.fields.iter().enumerate() {
                    if i > 0 || name.implicit_this {
                        text.push('.');
                    }
                    text.push_str(&self.lexeme_text(source, field));
                }
                text
            }
            symbol if symbol.is_literal() || symbol.is_binary() => {
                self.lexeme_text(source, self.nodes.lexi(nodi)).into_owned()
            }
            _ => String::new(),
        }
    }

    fn join(&self, source: &[u8], lexemes: &[LexemeIndex], separator: &str) -> String {
        lexemes
            .iter()
            .map(|&lexi| self.lexeme_text(source, lexi))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Indented tree dump, see [`ParseTree::dump`].
pub struct Dump<'a> {
    tree: &'a ParseTree,
    source: &'a [u8],
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (nodi, depth) in self.tree.iter() {
            let symbol = self.tree.symbol(nodi);
            let detail = self.tree.describe(self.source, nodi);
            write!(f, "{:indent$}{}", "", symbol, indent = depth * 2)?;
            if detail.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, " {detail}")?;
            }
        }
        Ok(())
    }
}
