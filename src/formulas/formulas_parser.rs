//! Arithmetic expression parser for formula definitions.
//!
//! The grammar is deliberately small: `+ - * /`, unary minus, parentheses,
//! numeric literals and identifiers. There are no function calls, no
//! attribute access and no way to reach anything outside the evaluation
//! context, so admin-supplied expressions can never execute code.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;

use super::formulas_errors::FormulaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Decimal),
    Identifier(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Collects every identifier referenced by the expression, sorted and
    /// de-duplicated. This is the source of truth for formula dependencies.
    pub fn identifiers(&self) -> Vec<String> {
        let mut found = BTreeSet::new();
        self.collect_identifiers(&mut found);
        found.into_iter().collect()
    }

    fn collect_identifiers(&self, found: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Identifier(name) => {
                found.insert(name.clone());
            }
            Expr::Negate(inner) => inner.collect_identifiers(found),
            Expr::Binary { left, right, .. } => {
                left.collect_identifiers(found);
                right.collect_identifiers(found);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Decimal),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = Decimal::from_str(&literal).map_err(|_| {
                    FormulaError::Parse(format!("Invalid numeric literal '{}'", literal))
                })?;
                tokens.push(Token::Number(number));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Identifier(name));
            }
            other => {
                return Err(FormulaError::Parse(format!(
                    "Unsupported character '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.term()?;
        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.factor()?;
        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.next();
            let right = self.factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // factor := '-' factor | '(' expr ')' | number | identifier
    fn factor(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Minus) => Ok(Expr::Negate(Box::new(self.factor()?))),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FormulaError::Parse("Unbalanced parentheses".to_string())),
                }
            }
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => Ok(Expr::Identifier(name)),
            Some(token) => Err(FormulaError::Parse(format!(
                "Unexpected token {:?}",
                token
            ))),
            None => Err(FormulaError::Parse(
                "Unexpected end of expression".to_string(),
            )),
        }
    }
}

/// Parses an expression into its AST.
pub fn parse_expression(input: &str) -> Result<Expr, FormulaError> {
    if input.trim().is_empty() {
        return Err(FormulaError::Parse("Expression is empty".to_string()));
    }

    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        position: 0,
    };
    let expr = parser.expression()?;

    if parser.position != parser.tokens.len() {
        return Err(FormulaError::Parse(format!(
            "Trailing input after expression: {:?}",
            parser.tokens[parser.position..].to_vec()
        )));
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_precedence() {
        let expr = parse_expression("a + b * c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Add, ..
            } => {}
            other => panic!("expected top-level add, got {:?}", other),
        }
    }

    #[test]
    fn parses_parentheses_and_unary_minus() {
        let expr = parse_expression("-(price - 2.5) * quantity").unwrap();
        assert_eq!(
            expr.identifiers(),
            vec!["price".to_string(), "quantity".to_string()]
        );
    }

    #[test]
    fn collects_identifiers_sorted_and_unique() {
        let expr = parse_expression("b + a + b / a").unwrap();
        assert_eq!(expr.identifiers(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn parses_numeric_literals() {
        let expr = parse_expression("1.5 * 2").unwrap();
        match expr {
            Expr::Binary { left, right, .. } => {
                assert_eq!(*left, Expr::Number(dec!(1.5)));
                assert_eq!(*right, Expr::Number(dec!(2)));
            }
            other => panic!("unexpected expr {:?}", other),
        }
    }

    #[test]
    fn rejects_function_calls() {
        assert!(parse_expression("max(a, b)").is_err());
    }

    #[test]
    fn rejects_attribute_access() {
        assert!(parse_expression("holding.quantity").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_expression("a + b )").is_err());
        assert!(parse_expression("(a + b").is_err());
        assert!(parse_expression("").is_err());
    }
}
