//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Generic AST traversal for the ecc compiler core
//
// A pass implements `Visitor` and dispatches on the node kind inside
// its `before`/`after` hooks; kinds a pass does not care about fall
// through. Children are visited in source order, so `after` callbacks
// fire in post-order.
//

use crate::ast::{Ast, NodeId};

/// Pre/post visitor over the AST
pub trait Visitor {
    /// Called before a node's children are visited
    fn before(&mut self, _ast: &mut Ast, _id: NodeId) {}

    /// Called after a node's children are visited
    fn after(&mut self, _ast: &mut Ast, _id: NodeId) {}
}

/// Walk the subtree rooted at `root`, invoking the visitor's hooks
pub fn traverse(ast: &mut Ast, root: NodeId, visitor: &mut impl Visitor) {
    visitor.before(ast, root);
    for child in ast.children(root) {
        traverse(ast, child, visitor);
    }
    visitor.after(ast, root);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::types::TypeClass;

    #[derive(Default)]
    struct OrderRecorder {
        pre: Vec<NodeId>,
        post: Vec<NodeId>,
    }

    impl Visitor for OrderRecorder {
        fn before(&mut self, _ast: &mut Ast, id: NodeId) {
            self.pre.push(id);
        }
        fn after(&mut self, _ast: &mut Ast, id: NodeId) {
            self.post.push(id);
        }
    }

    #[test]
    fn test_traversal_order() {
        let mut ast = Ast::new();
        let lhs = ast.add(
            NodeKind::IntegerConstant {
                value: 1,
                class: TypeClass::Int,
            },
            1,
            1,
        );
        let rhs = ast.add(
            NodeKind::IntegerConstant {
                value: 2,
                class: TypeClass::Int,
            },
            1,
            5,
        );
        let add = ast.add(
            NodeKind::Binary {
                op: crate::ast::BinaryOp::Add,
                lhs,
                rhs,
            },
            1,
            3,
        );
        ast.link_parents(add);

        let mut rec = OrderRecorder::default();
        traverse(&mut ast, add, &mut rec);
        assert_eq!(rec.pre, vec![add, lhs, rhs]);
        assert_eq!(rec.post, vec![lhs, rhs, add]);
    }
}
