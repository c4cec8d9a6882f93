#[cfg(test)]
mod scanner_tests {
    use quill::error::QuillError;
    use quill::scanner::*;
    use quill::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenKind, &str)]) {
        let tokens: Vec<Token> = scan(source).expect("scan failed");

        assert_eq!(
            tokens.len(),
            expected.len(),
            "token count mismatch for {:?}",
            source
        );

        for (actual, (expected_kind, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.kind, *expected_kind);
            assert_eq!(actual.lexeme(source), *expected_lexeme);
        }
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source)
            .expect("scan failed")
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*}):;",
            &[
                (TokenKind::LEFT_PAREN, "("),
                (TokenKind::LEFT_BRACE, "{"),
                (TokenKind::STAR, "*"),
                (TokenKind::DOT, "."),
                (TokenKind::COMMA, ","),
                (TokenKind::PLUS, "+"),
                (TokenKind::STAR, "*"),
                (TokenKind::RIGHT_BRACE, "}"),
                (TokenKind::RIGHT_PAREN, ")"),
                (TokenKind::COLON, ":"),
                (TokenKind::SEMICOLON, ";"),
                (TokenKind::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators_with_separators() {
        assert_token_sequence(
            "a != b == c <= d >= e && f || g",
            &[
                (TokenKind::IDENTIFIER, "a"),
                (TokenKind::BANG_EQUAL, "!="),
                (TokenKind::IDENTIFIER, "b"),
                (TokenKind::EQUAL_EQUAL, "=="),
                (TokenKind::IDENTIFIER, "c"),
                (TokenKind::LESS_EQUAL, "<="),
                (TokenKind::IDENTIFIER, "d"),
                (TokenKind::GREATER_EQUAL, ">="),
                (TokenKind::IDENTIFIER, "e"),
                (TokenKind::AND, "&&"),
                (TokenKind::IDENTIFIER, "f"),
                (TokenKind::OR, "||"),
                (TokenKind::IDENTIFIER, "g"),
                (TokenKind::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_operator_boundary() {
        // A two-character operator needs a separator after it.
        assert_eq!(
            kinds("&&x"),
            vec![
                TokenKind::AMPERSAND,
                TokenKind::AMPERSAND,
                TokenKind::IDENTIFIER,
                TokenKind::EOF
            ]
        );

        assert_eq!(
            kinds("a==b"),
            vec![
                TokenKind::IDENTIFIER,
                TokenKind::EQUAL,
                TokenKind::EQUAL,
                TokenKind::IDENTIFIER,
                TokenKind::EOF
            ]
        );

        // End of input counts as a separator.
        assert_eq!(kinds("!="), vec![TokenKind::BANG_EQUAL, TokenKind::EOF]);
        assert_eq!(
            kinds("x = !y"),
            vec![
                TokenKind::IDENTIFIER,
                TokenKind::EQUAL,
                TokenKind::BANG,
                TokenKind::IDENTIFIER,
                TokenKind::EOF
            ]
        );
    }

    #[test]
    fn test_scanner_04_keywords_and_identifiers() {
        assert_token_sequence(
            "class if else while for nil return this base var function true false classy _x",
            &[
                (TokenKind::CLASS, "class"),
                (TokenKind::IF, "if"),
                (TokenKind::ELSE, "else"),
                (TokenKind::WHILE, "while"),
                (TokenKind::FOR, "for"),
                (TokenKind::NIL, "nil"),
                (TokenKind::RETURN, "return"),
                (TokenKind::THIS, "this"),
                (TokenKind::BASE, "base"),
                (TokenKind::VAR, "var"),
                (TokenKind::FUNCTION, "function"),
                (TokenKind::TRUE, "true"),
                (TokenKind::FALSE, "false"),
                (TokenKind::IDENTIFIER, "classy"),
                (TokenKind::IDENTIFIER, "_x"),
                (TokenKind::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_strings_exclude_quotes() {
        let source = "\"hello\" \"two\nlines\" \"\"";

        assert_token_sequence(
            source,
            &[
                (TokenKind::STRING, "hello"),
                (TokenKind::STRING, "two\nlines"),
                (TokenKind::STRING, ""),
                (TokenKind::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_numbers() {
        assert_token_sequence(
            "12 3.25 0.5.",
            &[
                (TokenKind::NUMBER, "12"),
                (TokenKind::NUMBER, "3.25"),
                (TokenKind::NUMBER, "0.5"),
                (TokenKind::DOT, "."),
                (TokenKind::EOF, ""),
            ],
        );

        // A dot not followed by a digit is a property access.
        assert_token_sequence(
            "7.x",
            &[
                (TokenKind::NUMBER, "7"),
                (TokenKind::DOT, "."),
                (TokenKind::IDENTIFIER, "x"),
                (TokenKind::EOF, ""),
            ],
        );

        // Two decimal points are fatal even when they are adjacent.
        for source in ["5..5", "print(1.2.3);", "x = 10..25;"] {
            assert!(
                matches!(scan(source), Err(QuillError::Lex { line: 1, .. })),
                "{:?} should not lex",
                source
            );
        }

        // Without a digit after them the dots stay separate tokens.
        assert_eq!(
            kinds("1..x"),
            vec![
                TokenKind::NUMBER,
                TokenKind::DOT,
                TokenKind::DOT,
                TokenKind::IDENTIFIER,
                TokenKind::EOF
            ]
        );
    }

    #[test]
    fn test_scanner_07_comments_are_filtered() {
        let source = "# leading\nvar x = 1; # trailing\n# last";

        assert_eq!(
            kinds(source),
            vec![
                TokenKind::VAR,
                TokenKind::IDENTIFIER,
                TokenKind::EQUAL,
                TokenKind::NUMBER,
                TokenKind::SEMICOLON,
                TokenKind::EOF
            ]
        );
    }

    #[test]
    fn test_scanner_08_eof_span() {
        let source = "x  \n";
        let tokens = scan(source).unwrap();
        let eof = tokens.last().unwrap();

        assert_eq!(eof.kind, TokenKind::EOF);
        assert_eq!(eof.span, Span::new(source.len(), source.len()));
        assert_eq!(kinds(""), vec![TokenKind::EOF]);
        assert_eq!(kinds(" \t\r\n"), vec![TokenKind::EOF]);
    }

    #[test]
    fn test_scanner_09_spans_slice_the_source() {
        let source = "var greeting = \"hi\";\nprint(greeting);";

        for token in scan(source).unwrap() {
            let lexeme = token.lexeme(source);
            assert_eq!(lexeme, &source[token.span.range()]);
            assert_eq!(lexeme.len(), token.span.len());
        }
    }

    #[test]
    fn test_scanner_10_lines() {
        let source = "a\nb\n\nc";
        let tokens = scan(source).unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line(source)).collect();

        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn test_scanner_11_malformed_number_is_fatal() {
        let err = scan("var x = 5.5.5;").unwrap_err();

        assert!(matches!(err, QuillError::Lex { line: 1, .. }));
    }

    #[test]
    fn test_scanner_12_unterminated_string_is_fatal() {
        let err = scan("\n\"never closed").unwrap_err();

        match err {
            QuillError::Lex { message, line } => {
                assert_eq!(line, 2);
                assert!(message.contains("Unterminated string"));
            }
            other => panic!("expected a lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_13_iterator_stops_after_error() {
        let results: Vec<_> = Scanner::new("a \"open").collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_length_helpers() {
        assert!(is_match(b"== b", b"=="));
        assert!(is_match(b"==", b"=="));
        assert!(!is_match(b"==b", b"=="));
        assert!(!is_match(b"=", b"=="));

        assert_eq!(comment_length(b"# hi\nnext"), 5);
        assert_eq!(comment_length(b"# to the end"), 12);

        assert_eq!(string_length(b"\"abc\" rest"), Some(5));
        assert_eq!(string_length(b"\"\""), Some(2));
        assert_eq!(string_length(b"\"abc"), None);

        assert_eq!(string_length(b"\"A\nB\""), Some(5));

        assert_eq!(number_length(b"0.5"), Some(3));
        assert_eq!(number_length(b"5 "), Some(1));
        assert_eq!(number_length(b"123;"), Some(3));
        assert_eq!(number_length(b"1.5)"), Some(3));
        assert_eq!(number_length(b"1."), Some(1));
        assert_eq!(number_length(b"1.5.x"), Some(3));
        assert_eq!(number_length(b"1.5.5"), None);
        assert_eq!(number_length(b"5..5"), None);
        assert_eq!(number_length(b"5.."), Some(1));

        assert_eq!(other_length(b"name(x)"), 4);
        assert_eq!(other_length(b"name"), 4);
    }
}
