//! Recursive-descent builder for the concrete syntax tree.
//!
//! The grammar is deliberately looser than the compiled language: untyped
//! parameters, declarations inside blocks, `and`/`or` and `/` all produce a
//! tree, and the syntax builder reports them with a precise message.

use crate::cst::{NodeId, NodeKind, SyntaxTree, TreeBuilder};
use crate::error::{CompileError, CompileResult};
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

pub fn parse_tree(src: &str, tokens: &[Token]) -> CompileResult<SyntaxTree> {
    let mut p = Grammar {
        src,
        tokens,
        pos: 0,
        tree: TreeBuilder::new(),
    };
    let root = p.parse_script()?;
    let tree = p.tree.finish(root);
    log::trace!("built concrete syntax tree with {} nodes", tree.len());
    Ok(tree)
}

struct Grammar<'a> {
    src: &'a str,
    tokens: &'a [Token],
    pos: usize,
    tree: TreeBuilder,
}

impl<'a> Grammar<'a> {
    fn parse_script(&mut self) -> CompileResult<NodeId> {
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.bump();
                }
                _ => stmts.push(self.parse_stmt()?),
            }
        }
        let end = self.src.len();
        Ok(self
            .tree
            .node(NodeKind::Script, Span::new(0, end), stmts))
    }

    fn parse_stmt(&mut self) -> CompileResult<NodeId> {
        match self.peek_kind() {
            TokenKind::Def => self.parse_function(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Indent => Err(self.error_here("Unexpected indent")),
            _ => {
                let stmt = self.parse_simple_stmt()?;
                self.expect(TokenKind::Newline, "end of line")?;
                Ok(stmt)
            }
        }
    }

    fn parse_simple_stmt(&mut self) -> CompileResult<NodeId> {
        match self.peek_kind() {
            TokenKind::Pass => {
                let kw = self.leaf_bump(NodeKind::Keyword);
                Ok(self.tree.branch(NodeKind::PassStatement, vec![kw]))
            }
            TokenKind::Return => {
                let kw = self.leaf_bump(NodeKind::Keyword);
                let mut children = vec![kw];
                if self.peek_kind() != TokenKind::Newline {
                    children.push(self.parse_expr()?);
                }
                Ok(self.tree.branch(NodeKind::ReturnStatement, children))
            }
            TokenKind::Identifier if self.peek_kind_at(1) == TokenKind::Colon => {
                let name = self.leaf_bump(NodeKind::VariableName);
                let colon = self.leaf_bump(NodeKind::Punctuation);
                let ty = self.parse_type_name()?;
                let typedef = self.tree.branch(NodeKind::TypeDef, vec![colon, ty]);
                let assign = self.expect_leaf(TokenKind::Assign, NodeKind::AssignOp, "'='")?;
                let value = self.parse_expr()?;
                Ok(self
                    .tree
                    .branch(NodeKind::AssignStatement, vec![name, typedef, assign, value]))
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.peek_kind() == TokenKind::Assign {
                    let assign = self.leaf_bump(NodeKind::AssignOp);
                    let value = self.parse_expr()?;
                    Ok(self
                        .tree
                        .branch(NodeKind::AssignStatement, vec![expr, assign, value]))
                } else {
                    Ok(self.tree.branch(NodeKind::ExpressionStatement, vec![expr]))
                }
            }
        }
    }

    fn parse_type_name(&mut self) -> CompileResult<NodeId> {
        match self.peek_kind() {
            TokenKind::Identifier => Ok(self.leaf_bump(NodeKind::VariableName)),
            TokenKind::NoneKeyword => Ok(self.leaf_bump(NodeKind::None)),
            _ => Err(self.error_here("Expected a type name")),
        }
    }

    fn parse_function(&mut self) -> CompileResult<NodeId> {
        let def = self.leaf_bump(NodeKind::Keyword);
        let name = self.expect_leaf(TokenKind::Identifier, NodeKind::VariableName, "function name")?;
        let params = self.parse_params()?;
        let mut children = vec![def, name, params];
        if self.peek_kind() == TokenKind::Arrow {
            let arrow = self.leaf_bump(NodeKind::Punctuation);
            let ty = self.parse_type_name()?;
            children.push(self.tree.branch(NodeKind::TypeDef, vec![arrow, ty]));
        }
        children.push(self.parse_body()?);
        Ok(self.tree.branch(NodeKind::FunctionDefinition, children))
    }

    fn parse_params(&mut self) -> CompileResult<NodeId> {
        let open = self.expect_leaf(TokenKind::LParen, NodeKind::Punctuation, "'('")?;
        let mut children = vec![open];
        if self.peek_kind() != TokenKind::RParen {
            loop {
                children.push(self.expect_leaf(
                    TokenKind::Identifier,
                    NodeKind::VariableName,
                    "parameter name",
                )?);
                if self.peek_kind() == TokenKind::Colon {
                    let colon = self.leaf_bump(NodeKind::Punctuation);
                    let ty = self.parse_type_name()?;
                    children.push(self.tree.branch(NodeKind::TypeDef, vec![colon, ty]));
                }
                if self.peek_kind() != TokenKind::Comma {
                    break;
                }
                children.push(self.leaf_bump(NodeKind::Punctuation));
            }
        }
        children.push(self.expect_leaf(TokenKind::RParen, NodeKind::Punctuation, "')'")?);
        Ok(self.tree.branch(NodeKind::ParamList, children))
    }

    /// `: NEWLINE INDENT stmt+ DEDENT` or a single simple statement on the
    /// same line.
    fn parse_body(&mut self) -> CompileResult<NodeId> {
        let colon = self.expect_leaf(TokenKind::Colon, NodeKind::Punctuation, "':'")?;
        let mut children = vec![colon];
        if self.peek_kind() == TokenKind::Newline {
            self.bump();
            self.expect(TokenKind::Indent, "an indented block")?;
            while !matches!(self.peek_kind(), TokenKind::Dedent | TokenKind::Eof) {
                if self.peek_kind() == TokenKind::Newline {
                    self.bump();
                    continue;
                }
                children.push(self.parse_stmt()?);
            }
            self.expect(TokenKind::Dedent, "end of block")?;
        } else {
            children.push(self.parse_simple_stmt()?);
            self.expect(TokenKind::Newline, "end of line")?;
        }
        Ok(self.tree.branch(NodeKind::Body, children))
    }

    fn parse_if(&mut self) -> CompileResult<NodeId> {
        let kw = self.leaf_bump(NodeKind::Keyword);
        let cond = self.parse_expr()?;
        let body = self.parse_body()?;
        let mut children = vec![kw, cond, body];
        while self.peek_kind() == TokenKind::Elif {
            children.push(self.leaf_bump(NodeKind::Keyword));
            children.push(self.parse_expr()?);
            children.push(self.parse_body()?);
        }
        if self.peek_kind() == TokenKind::Else {
            children.push(self.leaf_bump(NodeKind::Keyword));
            children.push(self.parse_body()?);
        }
        Ok(self.tree.branch(NodeKind::IfStatement, children))
    }

    fn parse_while(&mut self) -> CompileResult<NodeId> {
        let kw = self.leaf_bump(NodeKind::Keyword);
        let cond = self.parse_expr()?;
        let body = self.parse_body()?;
        Ok(self
            .tree
            .branch(NodeKind::WhileStatement, vec![kw, cond, body]))
    }

    fn parse_expr(&mut self) -> CompileResult<NodeId> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> CompileResult<NodeId> {
        let mut node = self.parse_and()?;
        while self.peek_kind() == TokenKind::Or {
            let op = self.leaf_bump(NodeKind::Operator);
            let right = self.parse_and()?;
            node = self.binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> CompileResult<NodeId> {
        let mut node = self.parse_not()?;
        while self.peek_kind() == TokenKind::And {
            let op = self.leaf_bump(NodeKind::Operator);
            let right = self.parse_not()?;
            node = self.binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> CompileResult<NodeId> {
        if self.peek_kind() == TokenKind::Not {
            let op = self.leaf_bump(NodeKind::Operator);
            let operand = self.parse_not()?;
            return Ok(self
                .tree
                .branch(NodeKind::UnaryExpression, vec![op, operand]));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> CompileResult<NodeId> {
        let mut node = self.parse_add()?;
        while matches!(
            self.peek_kind(),
            TokenKind::EqualTo
                | TokenKind::NotEqual
                | TokenKind::LessThan
                | TokenKind::LessThanEqual
                | TokenKind::GreaterThan
                | TokenKind::GreaterThanEqual
                | TokenKind::Is
        ) {
            let op = self.leaf_bump(NodeKind::Operator);
            let right = self.parse_add()?;
            node = self.binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_add(&mut self) -> CompileResult<NodeId> {
        let mut node = self.parse_mul()?;
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            let op = self.leaf_bump(NodeKind::Operator);
            let right = self.parse_mul()?;
            node = self.binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_mul(&mut self) -> CompileResult<NodeId> {
        let mut node = self.parse_unary()?;
        while matches!(
            self.peek_kind(),
            TokenKind::Star | TokenKind::Slash | TokenKind::DoubleSlash | TokenKind::Percent
        ) {
            let op = self.leaf_bump(NodeKind::Operator);
            let right = self.parse_unary()?;
            node = self.binary(node, op, right);
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> CompileResult<NodeId> {
        if matches!(self.peek_kind(), TokenKind::Minus | TokenKind::Plus) {
            let op = self.leaf_bump(NodeKind::Operator);
            let operand = self.parse_unary()?;
            return Ok(self
                .tree
                .branch(NodeKind::UnaryExpression, vec![op, operand]));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> CompileResult<NodeId> {
        let mut node = self.parse_primary()?;
        while self.peek_kind() == TokenKind::LParen {
            let args = self.parse_args()?;
            node = self.tree.branch(NodeKind::CallExpression, vec![node, args]);
        }
        Ok(node)
    }

    fn parse_args(&mut self) -> CompileResult<NodeId> {
        let open = self.leaf_bump(NodeKind::Punctuation);
        let mut children = vec![open];
        if self.peek_kind() != TokenKind::RParen {
            loop {
                children.push(self.parse_expr()?);
                if self.peek_kind() != TokenKind::Comma {
                    break;
                }
                children.push(self.leaf_bump(NodeKind::Punctuation));
            }
        }
        children.push(self.expect_leaf(TokenKind::RParen, NodeKind::Punctuation, "')'")?);
        Ok(self.tree.branch(NodeKind::ArgList, children))
    }

    fn parse_primary(&mut self) -> CompileResult<NodeId> {
        match self.peek_kind() {
            TokenKind::Number => Ok(self.leaf_bump(NodeKind::Number)),
            TokenKind::Identifier => Ok(self.leaf_bump(NodeKind::VariableName)),
            TokenKind::True | TokenKind::False => Ok(self.leaf_bump(NodeKind::Boolean)),
            TokenKind::NoneKeyword => Ok(self.leaf_bump(NodeKind::None)),
            TokenKind::LParen => {
                let open = self.leaf_bump(NodeKind::Punctuation);
                let inner = self.parse_expr()?;
                let close = self.expect_leaf(TokenKind::RParen, NodeKind::Punctuation, "')'")?;
                Ok(self
                    .tree
                    .branch(NodeKind::ParenthesizedExpression, vec![open, inner, close]))
            }
            _ => Err(self.error_here("Expected an expression")),
        }
    }

    fn binary(&mut self, left: NodeId, op: NodeId, right: NodeId) -> NodeId {
        self.tree
            .branch(NodeKind::BinaryExpression, vec![left, op, right])
    }

    fn peek(&self) -> Token {
        // The lexer always terminates the stream with `Eof`.
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or(Token {
                kind: TokenKind::Eof,
                span: Span::new(self.src.len(), self.src.len()),
            })
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn leaf_bump(&mut self, kind: NodeKind) -> NodeId {
        let tok = self.bump();
        self.tree.leaf(kind, tok.span)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> CompileResult<Token> {
        if self.peek_kind() == kind {
            Ok(self.bump())
        } else {
            Err(self.error_here(&format!("Expected {}", what)))
        }
    }

    fn expect_leaf(&mut self, kind: TokenKind, node: NodeKind, what: &str) -> CompileResult<NodeId> {
        let tok = self.expect(kind, what)?;
        Ok(self.tree.leaf(node, tok.span))
    }

    fn error_here(&self, message: &str) -> CompileError {
        let tok = self.peek();
        let found = match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            _ => format!("'{}'", tok.text(self.src)),
        };
        CompileError::syntax_at(format!("{}, found {}", message, found), tok.span)
    }
}
