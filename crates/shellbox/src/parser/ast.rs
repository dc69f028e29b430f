//! AST types for parsed shell source.
//!
//! An AST is immutable once parsed and may be executed repeatedly against
//! different environments.

use super::tokens::RedirectMode;

/// An expression that evaluates to a string at execution time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal text
    Literal(String),
    /// Variable lookup (`$NAME`, `${NAME}`); unset expands to empty
    Variable(String),
    /// Command substitution: the inner program, executed with captured
    /// output and spliced in with trailing newlines stripped
    Substitution(Box<Node>),
    /// Glob pattern; expansion happens at argument binding
    Glob(String),
    /// Arithmetic expansion with the raw expression text
    Arithmetic(String),
    /// Concatenation of parts (mixed literals and expansions)
    Concat(Vec<Expr>),
}

impl Expr {
    /// Empty literal, used as the target of `2>&1`/`1>&2` redirects.
    pub fn empty() -> Self {
        Expr::Literal(String::new())
    }
}

/// A redirection attached to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub mode: RedirectMode,
    /// Evaluated to a path, or to heredoc content when `heredoc` is set.
    /// Empty for the dup modes `2>&1` and `1>&2`.
    pub target: Expr,
    /// True when this redirect carries heredoc content instead of a path
    pub heredoc: bool,
}

/// A `NAME=value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}

/// A simple command: optional name, arguments, redirections, assignments.
///
/// `name` is `None` for pure-assignment commands (`FOO=1`) and for
/// redirect-only commands (`> file`).
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCommand {
    pub name: Option<Expr>,
    pub args: Vec<Expr>,
    pub redirects: Vec<Redirect>,
    pub assignments: Vec<Assignment>,
}

/// `if`/`elif`/`else` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub condition: Vec<Node>,
    pub then_branch: Vec<Node>,
    pub elif_branches: Vec<(Vec<Node>, Vec<Node>)>,
    pub else_branch: Option<Vec<Node>>,
}

/// `for NAME in words; do body; done`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub variable: String,
    pub words: Vec<Expr>,
    pub body: Vec<Node>,
}

/// `while`/`until` loop; the variant on [`Node`] selects the sense.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopNode {
    pub condition: Vec<Node>,
    pub body: Vec<Node>,
}

/// One `pattern) body ;;` arm of a case statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub patterns: Vec<Expr>,
    pub body: Vec<Node>,
}

/// `case word in ... esac`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseNode {
    pub subject: Expr,
    pub arms: Vec<CaseArm>,
}

/// A node in the command tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A simple command
    Command(SimpleCommand),
    /// `a | b | c`; stages run concurrently over in-memory pipes
    Pipeline { stages: Vec<Node> },
    /// `left && right`
    And { left: Box<Node>, right: Box<Node> },
    /// `left || right`
    Or { left: Box<Node>, right: Box<Node> },
    /// Commands separated by `;` or newline
    Sequence { list: Vec<Node> },
    /// If statement
    If(IfNode),
    /// For loop
    For(ForNode),
    /// While loop
    While(LoopNode),
    /// Until loop
    Until(LoopNode),
    /// Case statement
    Case(CaseNode),
}
