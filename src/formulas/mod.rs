pub(crate) mod formulas_errors;
pub(crate) mod formulas_evaluator;
pub(crate) mod formulas_model;
pub(crate) mod formulas_parser;
pub(crate) mod formulas_repository;
pub(crate) mod formulas_service;

// Re-export the public interface
pub use formulas_errors::FormulaError;
pub use formulas_evaluator::FormulaEvaluator;
pub use formulas_model::{Formula, FormulaDB, NewFormula};
pub use formulas_parser::{parse_expression, Expr};
pub use formulas_repository::FormulaRepository;
pub use formulas_service::FormulaService;
