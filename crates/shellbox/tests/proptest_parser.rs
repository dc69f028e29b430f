//! Property tests for the lexer and parser.

use proptest::prelude::*;
use shellbox::parser::{Keyword, Lexer, Parser, Token};
use shellbox::Shell;

proptest! {
    /// Lexing arbitrary input (including newlines and non-ASCII) never
    /// panics, and every successful lex ends with exactly one
    /// end-of-input token.
    #[test]
    fn lex_terminates_with_single_end(input in any::<String>()) {
        if let Ok(tokens) = Lexer::new(&input).preserve_newlines(true).tokenize() {
            let ends = tokens.iter().filter(|t| **t == Token::EndOfInput).count();
            prop_assert_eq!(ends, 1);
            prop_assert_eq!(tokens.last(), Some(&Token::EndOfInput));
        }
    }

    /// Simple word/operator soup always parses.
    #[test]
    fn well_formed_scripts_parse(
        words in proptest::collection::vec(
            "[a-z]{1,8}".prop_filter("reserved word", |w| Keyword::from_word(w).is_none()),
            1..6,
        ),
        ops in proptest::collection::vec(prop_oneof![
            Just(" | "),
            Just(" && "),
            Just(" || "),
            Just("; "),
        ], 0..5),
    ) {
        let mut source = String::new();
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                source.push_str(ops.get(i - 1).copied().unwrap_or("; "));
            }
            source.push_str(word);
        }
        let parsed = Parser::new(&source).and_then(Parser::parse);
        prop_assert!(parsed.is_ok(), "source {:?} failed: {:?}", source, parsed.err());
    }

    /// Quoted strings lex to a single token plus end-of-input, whatever
    /// their contents.
    #[test]
    fn single_quoted_lexes_verbatim(body in "[^']{0,40}") {
        let source = format!("'{}'", body);
        let tokens = Lexer::new(&source).tokenize().unwrap();
        prop_assert_eq!(&tokens[0], &Token::SingleQuote(body));
        prop_assert_eq!(tokens.len(), 2);
    }

    /// Assignments round-trip their name through classification.
    #[test]
    fn assignments_classify(name in "[a-z_][a-z0-9_]{0,8}", value in "[a-z0-9]{0,8}") {
        let source = format!("{}={}", name, value);
        let tokens = Lexer::new(&source).tokenize().unwrap();
        match &tokens[0] {
            Token::Assignment(n, _) => prop_assert_eq!(n, &name),
            other => prop_assert!(false, "expected assignment, got {:?}", other),
        }
    }

    /// `&&`/`||` chains over `true`/`false` exit with the same success
    /// value as a plain Rust evaluation of the left-associative
    /// short-circuit algebra.
    #[test]
    fn and_or_exit_code_algebra(
        first in any::<bool>(),
        rest in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..6),
    ) {
        let mut source = String::from(if first { "true" } else { "false" });
        let mut expected = first;
        for (is_and, value) in &rest {
            source.push_str(if *is_and { " && " } else { " || " });
            source.push_str(if *value { "true" } else { "false" });
            expected = if *is_and { expected && *value } else { expected || *value };
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let output = runtime
            .block_on(async {
                let mut shell = Shell::new();
                shell.exec(&source).await
            })
            .unwrap();
        prop_assert_eq!(output.exit_code == 0, expected, "source {:?}", source);
    }
}
