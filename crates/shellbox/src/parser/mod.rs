//! Parser module: recursive descent over the token stream.
//!
//! The recursion ordering `sequence → and_or → pipeline → command` fixes
//! operator precedence: `|` binds tighter than `&&`/`||`, which bind
//! tighter than `;`/newline. `&&` and `||` are left-associative.

mod ast;
mod lexer;
mod span;
mod tokens;

pub use ast::{Assignment, CaseArm, CaseNode, Expr, ForNode, IfNode, LoopNode, Node, Redirect, SimpleCommand};
pub use lexer::Lexer;
pub use span::Position;
pub use tokens::{AssignValue, Keyword, QuotePart, RedirectMode, Token};

use crate::error::{Error, Result};

/// Maximum nesting depth for `$(...)` re-parsing. Guards against stack
/// exhaustion on pathological inputs.
const MAX_SUBSTITUTION_DEPTH: usize = 64;

/// Parser for shell source.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser for the given input. Lexes eagerly (with newline
    /// preservation, so `;` and newline are interchangeable separators)
    /// and fails on lex errors.
    pub fn new(input: &str) -> Result<Self> {
        Self::with_depth(input, 0)
    }

    fn with_depth(input: &str, depth: usize) -> Result<Self> {
        if depth > MAX_SUBSTITUTION_DEPTH {
            return Err(Error::ResourceLimit(
                "maximum substitution depth exceeded".to_string(),
            ));
        }
        let tokens = Lexer::new(input).preserve_newlines(true).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            depth,
        })
    }

    /// Parse the input into a command tree.
    pub fn parse(mut self) -> Result<Node> {
        let node = self.parse_program()?;
        Ok(node)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::EndOfInput)
    }

    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or(Token::EndOfInput);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    /// Consume `;` and newline separators.
    fn skip_separators(&mut self) {
        while matches!(self.peek(), Token::Newline | Token::Semicolon) {
            self.advance();
        }
    }

    fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k) if *k == keyword)
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.is_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(Error::parse_at(
                format!("expected '{}', found {}", keyword.as_str(), self.peek()),
                self.pos,
            ))
        }
    }

    /// True for tokens that convert to an argument expression.
    fn is_word_class(token: &Token) -> bool {
        matches!(
            token,
            Token::Word(_)
                | Token::SingleQuote(_)
                | Token::DoubleQuote(_)
                | Token::Variable(_)
                | Token::Substitution(_)
                | Token::Glob(_)
                | Token::Arithmetic(_)
        )
    }

    /// program := sequence
    fn parse_program(&mut self) -> Result<Node> {
        self.skip_newlines();
        let mut list = Vec::new();

        if !matches!(self.peek(), Token::EndOfInput) {
            list.push(self.parse_and_or()?);
            while matches!(self.peek(), Token::Semicolon | Token::Newline) {
                self.skip_separators();
                if matches!(self.peek(), Token::EndOfInput) {
                    break;
                }
                list.push(self.parse_and_or()?);
            }
        }

        if !matches!(self.peek(), Token::EndOfInput) {
            return Err(Error::parse_at(
                format!("unexpected {}", self.peek()),
                self.pos,
            ));
        }

        Ok(if list.len() == 1 {
            list.remove(0)
        } else {
            Node::Sequence { list }
        })
    }

    /// and_or := pipeline (('&&' | '||') pipeline)*
    fn parse_and_or(&mut self) -> Result<Node> {
        let mut left = self.parse_pipeline()?;
        loop {
            let and = match self.peek() {
                Token::And => true,
                Token::Or => false,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            let right = Box::new(self.parse_pipeline()?);
            let boxed = Box::new(left);
            left = if and {
                Node::And {
                    left: boxed,
                    right,
                }
            } else {
                Node::Or {
                    left: boxed,
                    right,
                }
            };
        }
        Ok(left)
    }

    /// pipeline := command ('|' command)*
    fn parse_pipeline(&mut self) -> Result<Node> {
        let first = self.parse_command()?;
        let mut stages = vec![first];

        while matches!(self.peek(), Token::Pipe) {
            self.advance();
            self.skip_newlines();
            stages.push(self.parse_command()?);
        }

        Ok(if stages.len() == 1 {
            stages.remove(0)
        } else {
            Node::Pipeline { stages }
        })
    }

    /// A single command: compound construct or simple command.
    fn parse_command(&mut self) -> Result<Node> {
        match self.peek() {
            Token::Keyword(Keyword::If) => self.parse_if(),
            Token::Keyword(Keyword::While) => self.parse_loop(false),
            Token::Keyword(Keyword::Until) => self.parse_loop(true),
            Token::Keyword(Keyword::For) => self.parse_for(),
            Token::Keyword(Keyword::Case) => self.parse_case(),
            _ => self.parse_simple_command().map(Node::Command),
        }
    }

    /// command := assignment* (word | heredoc)* redirect* (word | redirect)*
    fn parse_simple_command(&mut self) -> Result<SimpleCommand> {
        let mut assignments = Vec::new();
        let mut name: Option<Expr> = None;
        let mut args = Vec::new();
        let mut redirects = Vec::new();

        loop {
            match self.peek().clone() {
                Token::Assignment(asg_name, value) => {
                    self.advance();
                    let value = self.assign_value_expr(value)?;
                    if name.is_none() {
                        assignments.push(Assignment {
                            name: asg_name,
                            value,
                        });
                    } else {
                        // After the command name, NAME=value is an ordinary
                        // argument.
                        args.push(Expr::Concat(vec![
                            Expr::Literal(format!("{}=", asg_name)),
                            value,
                        ]));
                    }
                }
                Token::Keyword(keyword) => {
                    // Reserved words are only special in command position.
                    if name.is_none() {
                        break;
                    }
                    self.advance();
                    args.push(Expr::Literal(keyword.as_str().to_string()));
                }
                token if Self::is_word_class(&token) => {
                    self.advance();
                    let expr = self.expr_from_token(token)?;
                    if name.is_none() {
                        name = Some(expr);
                    } else {
                        args.push(expr);
                    }
                }
                Token::Redirect(mode) => {
                    self.advance();
                    if mode.is_dup() {
                        redirects.push(Redirect {
                            mode,
                            target: Expr::empty(),
                            heredoc: false,
                        });
                    } else {
                        let target = self.parse_redirect_target(mode)?;
                        redirects.push(Redirect {
                            mode,
                            target,
                            heredoc: false,
                        });
                    }
                }
                Token::Heredoc(content, expand) => {
                    self.advance();
                    redirects.push(Redirect {
                        mode: RedirectMode::In,
                        target: heredoc_expr(&content, expand),
                        heredoc: true,
                    });
                }
                _ => break,
            }
        }

        if name.is_none() && assignments.is_empty() && redirects.is_empty() {
            return Err(Error::parse_at(
                format!("expected command, found {}", self.peek()),
                self.pos,
            ));
        }

        Ok(SimpleCommand {
            name,
            args,
            redirects,
            assignments,
        })
    }

    fn parse_redirect_target(&mut self, mode: RedirectMode) -> Result<Expr> {
        let token = self.peek().clone();
        match token {
            Token::Keyword(keyword) => {
                self.advance();
                Ok(Expr::Literal(keyword.as_str().to_string()))
            }
            token if Self::is_word_class(&token) => {
                self.advance();
                self.expr_from_token(token)
            }
            other => Err(Error::parse_at(
                format!("redirect '{}' has no valid target, found {}", mode, other),
                self.pos,
            )),
        }
    }

    /// if condition; then ...; [elif ...;] [else ...;] fi
    fn parse_if(&mut self) -> Result<Node> {
        self.advance(); // consume 'if'
        let condition = self.parse_list_until(&[Keyword::Then])?;
        self.expect_keyword(Keyword::Then)?;
        let then_branch = self.parse_list_until(&[Keyword::Elif, Keyword::Else, Keyword::Fi])?;

        let mut elif_branches = Vec::new();
        while self.is_keyword(Keyword::Elif) {
            self.advance();
            let elif_condition = self.parse_list_until(&[Keyword::Then])?;
            self.expect_keyword(Keyword::Then)?;
            let elif_body =
                self.parse_list_until(&[Keyword::Elif, Keyword::Else, Keyword::Fi])?;
            elif_branches.push((elif_condition, elif_body));
        }

        let else_branch = if self.is_keyword(Keyword::Else) {
            self.advance();
            Some(self.parse_list_until(&[Keyword::Fi])?)
        } else {
            None
        };

        self.expect_keyword(Keyword::Fi)?;

        Ok(Node::If(IfNode {
            condition,
            then_branch,
            elif_branches,
            else_branch,
        }))
    }

    /// while/until condition; do body; done
    fn parse_loop(&mut self, until: bool) -> Result<Node> {
        self.advance(); // consume 'while' / 'until'
        let condition = self.parse_list_until(&[Keyword::Do])?;
        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_list_until(&[Keyword::Done])?;
        self.expect_keyword(Keyword::Done)?;

        let node = LoopNode { condition, body };
        Ok(if until {
            Node::Until(node)
        } else {
            Node::While(node)
        })
    }

    /// for NAME [in words]; do body; done
    fn parse_for(&mut self) -> Result<Node> {
        self.advance(); // consume 'for'
        self.skip_newlines();

        let variable = match self.peek().clone() {
            Token::Word(w) => {
                self.advance();
                w
            }
            other => {
                return Err(Error::parse_at(
                    format!("expected variable name in for loop, found {}", other),
                    self.pos,
                ))
            }
        };

        let mut words = Vec::new();
        if self.is_keyword(Keyword::In) {
            self.advance();
            loop {
                match self.peek().clone() {
                    token if Self::is_word_class(&token) => {
                        self.advance();
                        words.push(self.expr_from_token(token)?);
                    }
                    Token::Semicolon | Token::Newline => break,
                    Token::Keyword(Keyword::Do) => break,
                    other => {
                        return Err(Error::parse_at(
                            format!("unexpected {} in for loop word list", other),
                            self.pos,
                        ))
                    }
                }
            }
        }
        self.skip_separators();

        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_list_until(&[Keyword::Done])?;
        self.expect_keyword(Keyword::Done)?;

        Ok(Node::For(ForNode {
            variable,
            words,
            body,
        }))
    }

    /// case word in pattern) body ;; ... esac
    fn parse_case(&mut self) -> Result<Node> {
        self.advance(); // consume 'case'
        self.skip_newlines();

        let subject = match self.peek().clone() {
            token if Self::is_word_class(&token) => {
                self.advance();
                self.expr_from_token(token)?
            }
            other => {
                return Err(Error::parse_at(
                    format!("expected word after 'case', found {}", other),
                    self.pos,
                ))
            }
        };

        self.skip_newlines();
        self.expect_keyword(Keyword::In)?;

        let mut arms = Vec::new();
        loop {
            self.skip_separators();
            if self.is_keyword(Keyword::Esac) || matches!(self.peek(), Token::EndOfInput) {
                break;
            }

            if matches!(self.peek(), Token::OpenParen) {
                self.advance();
            }

            let mut patterns = Vec::new();
            loop {
                match self.peek().clone() {
                    token if Self::is_word_class(&token) => {
                        self.advance();
                        patterns.push(self.expr_from_token(token)?);
                    }
                    Token::Keyword(keyword) => {
                        self.advance();
                        patterns.push(Expr::Literal(keyword.as_str().to_string()));
                    }
                    other => {
                        return Err(Error::parse_at(
                            format!("expected pattern in case arm, found {}", other),
                            self.pos,
                        ))
                    }
                }
                if matches!(self.peek(), Token::Pipe) {
                    self.advance();
                } else {
                    break;
                }
            }

            if !matches!(self.peek(), Token::CloseParen) {
                return Err(Error::parse_at(
                    format!("expected ')' after case pattern, found {}", self.peek()),
                    self.pos,
                ));
            }
            self.advance();

            let body = self.parse_case_body()?;
            arms.push(CaseArm { patterns, body });

            if matches!(self.peek(), Token::DoubleSemicolon) {
                self.advance();
            }
        }

        self.expect_keyword(Keyword::Esac)?;
        Ok(Node::Case(CaseNode { subject, arms }))
    }

    /// Commands of one case arm, terminated by `;;` or `esac`.
    fn parse_case_body(&mut self) -> Result<Vec<Node>> {
        let mut list = Vec::new();
        loop {
            while matches!(self.peek(), Token::Newline | Token::Semicolon) {
                self.advance();
            }
            if matches!(self.peek(), Token::DoubleSemicolon | Token::EndOfInput)
                || self.is_keyword(Keyword::Esac)
            {
                break;
            }
            list.push(self.parse_and_or()?);
        }
        Ok(list)
    }

    /// Commands until one of the given keywords appears in command position.
    fn parse_list_until(&mut self, terminators: &[Keyword]) -> Result<Vec<Node>> {
        let mut list = Vec::new();
        loop {
            self.skip_separators();
            if let Token::Keyword(k) = self.peek() {
                if terminators.contains(k) {
                    break;
                }
            }
            if matches!(self.peek(), Token::EndOfInput) {
                break;
            }
            list.push(self.parse_and_or()?);
        }
        Ok(list)
    }

    /// Convert a word-class token into an expression.
    fn expr_from_token(&self, token: Token) -> Result<Expr> {
        Ok(match token {
            Token::Word(s) => Expr::Literal(s),
            Token::SingleQuote(s) => Expr::Literal(s),
            Token::Keyword(k) => Expr::Literal(k.as_str().to_string()),
            Token::Variable(name) => Expr::Variable(name),
            Token::Glob(pattern) => Expr::Glob(pattern),
            Token::Arithmetic(expr) => Expr::Arithmetic(expr),
            Token::Substitution(raw) => {
                let inner = Parser::with_depth(&raw, self.depth + 1)?.parse()?;
                Expr::Substitution(Box::new(inner))
            }
            Token::DoubleQuote(parts) => {
                let mut exprs = Vec::with_capacity(parts.len());
                for part in parts {
                    exprs.push(match part {
                        QuotePart::Literal(s) => Expr::Literal(s),
                        QuotePart::Token(t) => self.expr_from_token(t)?,
                    });
                }
                match exprs.len() {
                    0 => Expr::Literal(String::new()),
                    1 => exprs.remove(0),
                    _ => Expr::Concat(exprs),
                }
            }
            other => {
                return Err(Error::parse(format!("unexpected {} in word position", other)));
            }
        })
    }

    /// Convert an assignment value into an expression.
    fn assign_value_expr(&self, value: AssignValue) -> Result<Expr> {
        Ok(match value {
            AssignValue::Literal(s) => Expr::Literal(s),
            AssignValue::Tokens(tokens) => {
                let mut exprs = Vec::with_capacity(tokens.len());
                for token in tokens {
                    exprs.push(self.expr_from_token(token)?);
                }
                match exprs.len() {
                    0 => Expr::Literal(String::new()),
                    1 => exprs.remove(0),
                    _ => Expr::Concat(exprs),
                }
            }
        })
    }
}

/// Heredoc content with `expand=true` is scanned for `$NAME` and
/// `${NAME}` fragments; other text stays literal.
fn heredoc_expr(content: &str, expand: bool) -> Expr {
    if !expand {
        return Expr::Literal(content.to_string());
    }

    let mut parts: Vec<Expr> = Vec::new();
    let mut literal = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            literal.push(ch);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    if !literal.is_empty() {
                        parts.push(Expr::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Expr::Variable(name));
                } else {
                    literal.push_str("${");
                    literal.push_str(&name);
                }
            }
            Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !literal.is_empty() {
                    parts.push(Expr::Literal(std::mem::take(&mut literal)));
                }
                parts.push(Expr::Variable(name));
            }
            _ => literal.push('$'),
        }
    }
    if !literal.is_empty() {
        parts.push(Expr::Literal(literal));
    }

    match parts.len() {
        0 => Expr::Literal(String::new()),
        1 => parts.remove(0),
        _ => Expr::Concat(parts),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Node {
        Parser::new(input).unwrap().parse().unwrap()
    }

    fn simple(node: &Node) -> &SimpleCommand {
        match node {
            Node::Command(cmd) => cmd,
            other => panic!("expected simple command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_simple_command() {
        let node = parse("echo hello world");
        let cmd = simple(&node);
        assert_eq!(cmd.name, Some(Expr::Literal("echo".to_string())));
        assert_eq!(
            cmd.args,
            vec![
                Expr::Literal("hello".to_string()),
                Expr::Literal("world".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_pipeline() {
        let node = parse("echo hi | cat | wc -l");
        match node {
            Node::Pipeline { stages } => assert_eq!(stages.len(), 3),
            other => panic!("expected pipeline, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_and_or_left_associative() {
        let node = parse("a && b || c");
        match node {
            Node::Or { left, .. } => match *left {
                Node::And { .. } => {}
                other => panic!("expected And on the left, got {other:?}"),
            },
            other => panic!("expected Or at the top, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_binds_tighter_than_and() {
        let node = parse("a | b && c");
        match node {
            Node::And { left, .. } => match *left {
                Node::Pipeline { ref stages } => assert_eq!(stages.len(), 2),
                other => panic!("expected pipeline on the left, got {other:?}"),
            },
            other => panic!("expected And at the top, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_sequence() {
        let node = parse("echo one; echo two; echo three");
        match node {
            Node::Sequence { list } => assert_eq!(list.len(), 3),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_newline_separates_sequence() {
        let node = parse("echo one\necho two");
        match node {
            Node::Sequence { list } => assert_eq!(list.len(), 2),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_semicolon() {
        let node = parse("echo one;");
        assert!(matches!(node, Node::Command(_)));
    }

    #[test]
    fn test_parse_redirects() {
        let node = parse("echo hi > out.txt 2>&1");
        let cmd = simple(&node);
        assert_eq!(cmd.redirects.len(), 2);
        assert_eq!(cmd.redirects[0].mode, RedirectMode::Out);
        assert_eq!(cmd.redirects[0].target, Expr::Literal("out.txt".to_string()));
        assert_eq!(cmd.redirects[1].mode, RedirectMode::ErrToOut);
        assert_eq!(cmd.redirects[1].target, Expr::empty());
    }

    #[test]
    fn test_redirect_without_target_is_error() {
        let err = Parser::new("echo hi >").unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_empty_pipeline_stage_is_error() {
        let err = Parser::new("echo hi |").unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_pure_assignment() {
        let node = parse("FOO=bar");
        let cmd = simple(&node);
        assert!(cmd.name.is_none());
        assert_eq!(cmd.assignments.len(), 1);
        assert_eq!(cmd.assignments[0].name, "FOO");
        assert_eq!(cmd.assignments[0].value, Expr::Literal("bar".to_string()));
    }

    #[test]
    fn test_leading_assignments() {
        let node = parse("A=1 B=2 env");
        let cmd = simple(&node);
        assert_eq!(cmd.assignments.len(), 2);
        assert_eq!(cmd.name, Some(Expr::Literal("env".to_string())));
    }

    #[test]
    fn test_double_quote_concat() {
        let node = parse("echo \"Hello, $USER!\"");
        let cmd = simple(&node);
        assert_eq!(
            cmd.args[0],
            Expr::Concat(vec![
                Expr::Literal("Hello, ".to_string()),
                Expr::Variable("USER".to_string()),
                Expr::Literal("!".to_string()),
            ])
        );
    }

    #[test]
    fn test_substitution_parses_inner_ast() {
        let node = parse("echo $(echo nested)");
        let cmd = simple(&node);
        match &cmd.args[0] {
            Expr::Substitution(inner) => {
                let inner = simple(inner);
                assert_eq!(inner.name, Some(Expr::Literal("echo".to_string())));
            }
            other => panic!("expected substitution, got {other:?}"),
        }
    }

    #[test]
    fn test_substitution_depth_is_bounded() {
        let mut src = String::new();
        for _ in 0..80 {
            src.push_str("$(echo ");
        }
        src.push('x');
        for _ in 0..80 {
            src.push(')');
        }
        let err = Parser::new(&src).unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::ResourceLimit(_)), "got {err:?}");
    }

    #[test]
    fn test_heredoc_becomes_input_redirect() {
        let node = parse("cat <<EOF\nhello\nEOF");
        let cmd = simple(&node);
        assert_eq!(cmd.redirects.len(), 1);
        assert!(cmd.redirects[0].heredoc);
        assert_eq!(cmd.redirects[0].mode, RedirectMode::In);
        assert_eq!(cmd.redirects[0].target, Expr::Literal("hello\n".to_string()));
    }

    #[test]
    fn test_heredoc_expansion_scan() {
        let node = parse("cat <<EOF\nhi $USER\nEOF");
        let cmd = simple(&node);
        assert_eq!(
            cmd.redirects[0].target,
            Expr::Concat(vec![
                Expr::Literal("hi ".to_string()),
                Expr::Variable("USER".to_string()),
                Expr::Literal("\n".to_string()),
            ])
        );
    }

    #[test]
    fn test_heredoc_quoted_delimiter_stays_literal() {
        let node = parse("cat <<'EOF'\nhi $USER\nEOF");
        let cmd = simple(&node);
        assert_eq!(
            cmd.redirects[0].target,
            Expr::Literal("hi $USER\n".to_string())
        );
    }

    #[test]
    fn test_parse_if_else() {
        let node = parse("if true; then echo yes; else echo no; fi");
        match node {
            Node::If(if_node) => {
                assert_eq!(if_node.condition.len(), 1);
                assert_eq!(if_node.then_branch.len(), 1);
                assert!(if_node.else_branch.is_some());
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_if_elif() {
        let node = parse("if false; then echo a; elif true; then echo b; fi");
        match node {
            Node::If(if_node) => assert_eq!(if_node.elif_branches.len(), 1),
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_for() {
        let node = parse("for i in a b c; do echo $i; done");
        match node {
            Node::For(for_node) => {
                assert_eq!(for_node.variable, "i");
                assert_eq!(for_node.words.len(), 3);
                assert_eq!(for_node.body.len(), 1);
            }
            other => panic!("expected for, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_while() {
        let node = parse("while false; do echo x; done");
        assert!(matches!(node, Node::While(_)));
    }

    #[test]
    fn test_parse_until() {
        let node = parse("until true; do echo x; done");
        assert!(matches!(node, Node::Until(_)));
    }

    #[test]
    fn test_parse_case() {
        let node = parse("case foo in bar|foo) echo hit ;; *) echo miss ;; esac");
        match node {
            Node::Case(case) => {
                assert_eq!(case.arms.len(), 2);
                assert_eq!(case.arms[0].patterns.len(), 2);
                assert_eq!(case.arms[1].patterns, vec![Expr::Glob("*".to_string())]);
            }
            other => panic!("expected case, got {other:?}"),
        }
    }

    #[test]
    fn test_keyword_as_argument() {
        let node = parse("echo done");
        let cmd = simple(&node);
        assert_eq!(cmd.args, vec![Expr::Literal("done".to_string())]);
    }

    #[test]
    fn test_stray_keyword_is_error() {
        let err = Parser::new("then").unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_empty_source_parses() {
        let node = parse("");
        match node {
            Node::Sequence { list } => assert!(list.is_empty()),
            other => panic!("expected empty sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_redirect_only_command() {
        let node = parse("> empty.txt");
        let cmd = simple(&node);
        assert!(cmd.name.is_none());
        assert_eq!(cmd.redirects.len(), 1);
    }
}
