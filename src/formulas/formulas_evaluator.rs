use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

use crate::constants::DEFAULT_DECIMAL_PLACES;

use super::formulas_errors::{FormulaError, Result};
use super::formulas_model::Formula;
use super::formulas_parser::{parse_expression, BinaryOp, Expr};

/// Evaluates formulas against a resolved numeric context.
///
/// Identifiers missing from the context resolve to `Decimal::ZERO`. This is a
/// deliberate v1 simplification: a missing dependency changes the answer
/// rather than failing the evaluation, so callers that need stricter
/// semantics must ensure the context is complete before calling.
pub struct FormulaEvaluator;

impl FormulaEvaluator {
    /// Evaluates `formula` against `context`, rounding last.
    ///
    /// System formulas round to the caller-supplied decimal places (typically
    /// the owning column's `decimal_places` constraint), falling back to the
    /// formula's own precision. All other formulas round to two places,
    /// half-up.
    pub fn evaluate(
        formula: &Formula,
        context: &HashMap<String, Decimal>,
        constraint_places: Option<u32>,
    ) -> Result<Decimal> {
        let expr = parse_expression(&formula.expression)?;
        let raw = Self::evaluate_expr(&expr, context, &formula.key)?;

        let places = if formula.is_system {
            constraint_places
                .or(formula.decimal_places)
                .unwrap_or(DEFAULT_DECIMAL_PLACES)
        } else {
            DEFAULT_DECIMAL_PLACES
        };

        Ok(raw.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
    }

    fn evaluate_expr(
        expr: &Expr,
        context: &HashMap<String, Decimal>,
        key: &str,
    ) -> Result<Decimal> {
        match expr {
            Expr::Number(n) => Ok(*n),
            Expr::Identifier(name) => Ok(context.get(name).copied().unwrap_or(Decimal::ZERO)),
            Expr::Negate(inner) => Ok(-Self::evaluate_expr(inner, context, key)?),
            Expr::Binary { op, left, right } => {
                let lhs = Self::evaluate_expr(left, context, key)?;
                let rhs = Self::evaluate_expr(right, context, key)?;
                match op {
                    BinaryOp::Add => lhs.checked_add(rhs).ok_or_else(|| overflow(key)),
                    BinaryOp::Sub => lhs.checked_sub(rhs).ok_or_else(|| overflow(key)),
                    BinaryOp::Mul => lhs.checked_mul(rhs).ok_or_else(|| overflow(key)),
                    BinaryOp::Div => {
                        if rhs.is_zero() {
                            return Err(FormulaError::DivisionByZero(key.to_string()));
                        }
                        lhs.checked_div(rhs).ok_or_else(|| overflow(key))
                    }
                }
            }
        }
    }
}

fn overflow(key: &str) -> FormulaError {
    FormulaError::Evaluation {
        key: key.to_string(),
        reason: "Arithmetic overflow".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn formula(key: &str, expression: &str, is_system: bool) -> Formula {
        Formula {
            key: key.to_string(),
            title: key.to_string(),
            expression: expression.to_string(),
            dependencies: vec![],
            decimal_places: None,
            is_system,
            created_at: chrono::NaiveDateTime::default(),
        }
    }

    #[test]
    fn evaluates_unrealized_gain() {
        let f = formula("unrealized_gain", "(price - purchase_price) * quantity", false);
        let mut ctx = HashMap::new();
        ctx.insert("price".to_string(), dec!(150));
        ctx.insert("purchase_price".to_string(), dec!(100));
        ctx.insert("quantity".to_string(), dec!(10));

        let result = FormulaEvaluator::evaluate(&f, &ctx, None).unwrap();
        assert_eq!(result, dec!(500.00));
        assert_eq!(result.scale(), 2);
    }

    #[test]
    fn missing_identifiers_default_to_zero() {
        let f = formula("total", "price * quantity", false);
        let ctx = HashMap::new();
        assert_eq!(FormulaEvaluator::evaluate(&f, &ctx, None).unwrap(), dec!(0.00));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let f = formula("ratio", "a / b", false);
        let mut ctx = HashMap::new();
        ctx.insert("a".to_string(), dec!(10));
        ctx.insert("b".to_string(), dec!(0));

        match FormulaEvaluator::evaluate(&f, &ctx, None) {
            Err(FormulaError::DivisionByZero(key)) => assert_eq!(key, "ratio"),
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn system_formula_uses_constraint_precision() {
        let f = formula("weighted", "a / b", true);
        let mut ctx = HashMap::new();
        ctx.insert("a".to_string(), dec!(1));
        ctx.insert("b".to_string(), dec!(3));

        let result = FormulaEvaluator::evaluate(&f, &ctx, Some(4)).unwrap();
        assert_eq!(result, dec!(0.3333));
    }

    #[test]
    fn non_system_formula_rounds_to_two_places_half_up() {
        let f = formula("ratio", "a / b", false);
        let mut ctx = HashMap::new();
        ctx.insert("a".to_string(), dec!(1));
        ctx.insert("b".to_string(), dec!(3));

        // constraint precision must be ignored for non-system formulas
        let result = FormulaEvaluator::evaluate(&f, &ctx, Some(6)).unwrap();
        assert_eq!(result, dec!(0.33));

        ctx.insert("a".to_string(), dec!(0.125));
        ctx.insert("b".to_string(), dec!(1));
        assert_eq!(FormulaEvaluator::evaluate(&f, &ctx, None).unwrap(), dec!(0.13));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let f = formula("gain", "(price - purchase_price) * quantity", false);
        let mut ctx = HashMap::new();
        ctx.insert("price".to_string(), dec!(12.34));
        ctx.insert("purchase_price".to_string(), dec!(10));
        ctx.insert("quantity".to_string(), dec!(7));

        let first = FormulaEvaluator::evaluate(&f, &ctx, None).unwrap();
        let second = FormulaEvaluator::evaluate(&f, &ctx, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_expression_is_a_parse_error() {
        let f = formula("bad", "price +* quantity", false);
        assert!(matches!(
            FormulaEvaluator::evaluate(&f, &HashMap::new(), None),
            Err(FormulaError::Parse(_))
        ));
    }
}
