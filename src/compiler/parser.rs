//! Condition expression parsing.
//!
//! Tokenizes and parses detection condition strings such as
//! `not (sel1 or sel2)` or `1 of selection_*` into a [`ConditionNode`]
//! tree. Selection references are resolved later, by the tree compiler.

use crate::error::{BackendError, Result};
use crate::ir::{ConditionNode, QuantifierKind};

/// Tokens in a condition expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Identifier(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    Of,
    Them,
    All,
    Number(u32),
    Wildcard(String),
}

/// Recursive descent parser over a token stream.
pub(crate) struct ConditionParser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> ConditionParser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.current_token().cloned();
        self.position += 1;
        token
    }

    /// Parse OR expressions (lowest precedence).
    pub(crate) fn parse_or_expression(&mut self) -> Result<ConditionNode> {
        let mut children = vec![self.parse_and_expression()?];

        while let Some(Token::Or) = self.current_token() {
            self.advance();
            children.push(self.parse_and_expression()?);
        }

        Ok(flatten(children, true))
    }

    fn parse_and_expression(&mut self) -> Result<ConditionNode> {
        let mut children = vec![self.parse_not_expression()?];

        while let Some(Token::And) = self.current_token() {
            self.advance();
            children.push(self.parse_not_expression()?);
        }

        Ok(flatten(children, false))
    }

    fn parse_not_expression(&mut self) -> Result<ConditionNode> {
        if let Some(Token::Not) = self.current_token() {
            self.advance();
            let operand = self.parse_primary()?;
            Ok(ConditionNode::not(operand))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<ConditionNode> {
        match self.current_token() {
            Some(Token::LeftParen) => {
                self.advance();
                let expr = self.parse_or_expression()?;
                if let Some(Token::RightParen) = self.current_token() {
                    self.advance();
                    Ok(expr)
                } else {
                    Err(BackendError::ConditionError(
                        "Expected closing parenthesis".to_string(),
                    ))
                }
            }
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(ConditionNode::Leaf(name))
            }
            Some(Token::Number(n)) => {
                let count = *n;
                self.advance();
                if count == 0 {
                    return Err(BackendError::ConditionError(
                        "Quantifier count must be at least 1".to_string(),
                    ));
                }
                let pattern = self.parse_quantifier_target()?;
                Ok(ConditionNode::Quantified {
                    kind: QuantifierKind::CountOf,
                    pattern,
                    count: Some(count),
                })
            }
            Some(Token::All) => {
                self.advance();
                let pattern = self.parse_quantifier_target()?;
                Ok(ConditionNode::Quantified {
                    kind: QuantifierKind::AllOf,
                    pattern,
                    count: None,
                })
            }
            _ => Err(BackendError::ConditionError(
                "Unexpected token in condition".to_string(),
            )),
        }
    }

    /// Parse the `of <target>` tail shared by count and all quantifiers.
    fn parse_quantifier_target(&mut self) -> Result<String> {
        if !matches!(self.current_token(), Some(Token::Of)) {
            return Err(BackendError::ConditionError(
                "Expected 'of' in quantifier".to_string(),
            ));
        }
        self.advance();

        match self.advance() {
            Some(Token::Them) => Ok("them".to_string()),
            Some(Token::Wildcard(pattern)) => Ok(pattern),
            Some(Token::Identifier(name)) => Ok(name),
            _ => Err(BackendError::ConditionError(
                "Expected 'them' or pattern after 'of'".to_string(),
            )),
        }
    }
}

fn flatten(mut children: Vec<ConditionNode>, disjunction: bool) -> ConditionNode {
    if children.len() == 1 {
        children.pop().unwrap()
    } else if disjunction {
        ConditionNode::Or(children)
    } else {
        ConditionNode::And(children)
    }
}

/// Tokenize a condition string.
pub(crate) fn tokenize_condition(condition: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = condition.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LeftParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RightParen);
                chars.next();
            }
            '0'..='9' => {
                let mut number_str = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() {
                        number_str.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num = number_str.parse::<u32>().map_err(|_| {
                    BackendError::ConditionError(format!("Invalid count: {number_str}"))
                })?;
                tokens.push(Token::Number(num));
            }
            'a'..='z' | 'A'..='Z' | '_' | '*' => {
                let mut identifier = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' || ch == '*' {
                        identifier.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }

                match identifier.as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    "of" => tokens.push(Token::Of),
                    "them" => tokens.push(Token::Them),
                    "all" => tokens.push(Token::All),
                    _ => {
                        if identifier.contains('*') {
                            tokens.push(Token::Wildcard(identifier));
                        } else {
                            tokens.push(Token::Identifier(identifier));
                        }
                    }
                }
            }
            _ => {
                return Err(BackendError::ConditionError(format!(
                    "Unexpected character in condition: '{ch}'"
                )));
            }
        }
    }

    Ok(tokens)
}

/// Parse a condition string into a [`ConditionNode`] tree.
pub(crate) fn parse_condition(condition: &str) -> Result<ConditionNode> {
    let tokens = tokenize_condition(condition)?;
    if tokens.is_empty() {
        return Err(BackendError::ConditionError("Empty condition".to_string()));
    }

    let mut parser = ConditionParser::new(&tokens);
    let node = parser.parse_or_expression()?;

    if parser.current_token().is_some() {
        return Err(BackendError::ConditionError(
            "Trailing tokens after condition".to_string(),
        ));
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_identifier() {
        let tokens = tokenize_condition("selection1").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::Identifier(ref s) if s == "selection1"));
    }

    #[test]
    fn test_tokenize_boolean_operators() {
        let tokens = tokenize_condition("sel1 and not (sel2 or sel3)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("sel1".to_string()),
                Token::And,
                Token::Not,
                Token::LeftParen,
                Token::Identifier("sel2".to_string()),
                Token::Or,
                Token::Identifier("sel3".to_string()),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_quantifiers() {
        let tokens = tokenize_condition("1 of sel*").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(1),
                Token::Of,
                Token::Wildcard("sel*".to_string()),
            ]
        );

        let tokens = tokenize_condition("all of *_filter").unwrap();
        assert_eq!(
            tokens,
            vec![Token::All, Token::Of, Token::Wildcard("*_filter".to_string())]
        );

        let tokens = tokenize_condition("all of them").unwrap();
        assert_eq!(tokens, vec![Token::All, Token::Of, Token::Them]);
    }

    #[test]
    fn test_tokenize_invalid_character() {
        let result = tokenize_condition("sel1 @ sel2");
        match result {
            Err(BackendError::ConditionError(msg)) => {
                assert!(msg.contains("Unexpected character"))
            }
            other => panic!("Expected ConditionError, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_leaf() {
        let node = parse_condition("selection").unwrap();
        assert_eq!(node, ConditionNode::leaf("selection"));
    }

    #[test]
    fn test_parse_and_is_n_ary() {
        let node = parse_condition("a and b and c").unwrap();
        assert_eq!(
            node,
            ConditionNode::And(vec![
                ConditionNode::leaf("a"),
                ConditionNode::leaf("b"),
                ConditionNode::leaf("c"),
            ])
        );
    }

    #[test]
    fn test_parse_precedence_and_binds_tighter() {
        let node = parse_condition("a and b or c").unwrap();
        assert_eq!(
            node,
            ConditionNode::Or(vec![
                ConditionNode::And(vec![ConditionNode::leaf("a"), ConditionNode::leaf("b")]),
                ConditionNode::leaf("c"),
            ])
        );
    }

    #[test]
    fn test_parse_not_over_group() {
        let node = parse_condition("not (sel1 or sel2)").unwrap();
        assert_eq!(
            node,
            ConditionNode::not(ConditionNode::Or(vec![
                ConditionNode::leaf("sel1"),
                ConditionNode::leaf("sel2"),
            ]))
        );
    }

    #[test]
    fn test_parse_not_binds_to_primary() {
        // `not a and b` negates only `a`.
        let node = parse_condition("not a and b").unwrap();
        assert_eq!(
            node,
            ConditionNode::And(vec![
                ConditionNode::not(ConditionNode::leaf("a")),
                ConditionNode::leaf("b"),
            ])
        );
    }

    #[test]
    fn test_parse_count_of_pattern() {
        let node = parse_condition("1 of sel*").unwrap();
        assert_eq!(
            node,
            ConditionNode::Quantified {
                kind: QuantifierKind::CountOf,
                pattern: "sel*".to_string(),
                count: Some(1),
            }
        );

        let node = parse_condition("2 of filter_*").unwrap();
        assert!(matches!(
            node,
            ConditionNode::Quantified {
                kind: QuantifierKind::CountOf,
                count: Some(2),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_all_of_them() {
        let node = parse_condition("all of them").unwrap();
        assert_eq!(
            node,
            ConditionNode::Quantified {
                kind: QuantifierKind::AllOf,
                pattern: "them".to_string(),
                count: None,
            }
        );
    }

    #[test]
    fn test_parse_zero_count_rejected() {
        let result = parse_condition("0 of sel*");
        assert!(matches!(result, Err(BackendError::ConditionError(_))));
    }

    #[test]
    fn test_parse_missing_closing_paren() {
        let result = parse_condition("(sel1 and sel2");
        match result {
            Err(BackendError::ConditionError(msg)) => {
                assert!(msg.contains("closing parenthesis"))
            }
            other => panic!("Expected ConditionError, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_of() {
        let result = parse_condition("all them");
        assert!(matches!(result, Err(BackendError::ConditionError(_))));
    }

    #[test]
    fn test_parse_empty_condition() {
        let result = parse_condition("   ");
        match result {
            Err(BackendError::ConditionError(msg)) => assert!(msg.contains("Empty condition")),
            other => panic!("Expected ConditionError, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_trailing_tokens() {
        let result = parse_condition("sel1 sel2");
        match result {
            Err(BackendError::ConditionError(msg)) => assert!(msg.contains("Trailing tokens")),
            other => panic!("Expected ConditionError, got {other:?}"),
        }
    }
}
