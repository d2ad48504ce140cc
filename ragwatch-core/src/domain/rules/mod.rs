// ragwatch-core/src/domain/rules/mod.rs
//
// RAG rule engine: a small whitelisted predicate language over job runs.
// Expressions never reach host reflection; only the members resolved by
// `ast::Property` and `ast::Method` exist.

pub mod ast;
pub mod error;
mod eval;
pub mod lexer;
pub mod parser;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::entity::{JobRun, RagIndicator, RagRuleConfig, RagStatus};
use ast::Expr;

pub use error::{CompileError, EvalError, RuleError, RuleFailure};

/// A parsed expression, shared through the evaluator cache.
#[derive(Debug)]
pub struct CompiledRule {
    expression: String,
    ast: Expr,
}

impl CompiledRule {
    pub fn compile(expression: &str) -> Result<Self, RuleError> {
        let ast = parser::parse(expression).map_err(|source| RuleError::Compile {
            expression: expression.to_string(),
            source,
        })?;
        Ok(Self {
            expression: expression.to_string(),
            ast,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn evaluate(&self, runs: &[JobRun], reference: NaiveDateTime) -> Result<bool, RuleError> {
        eval::evaluate_predicate(&self.ast, runs, reference).map_err(|source| {
            RuleError::Evaluation {
                expression: self.expression.clone(),
                source,
            }
        })
    }
}

/// Evaluates Red, Amber, Green in that order; the first true rule wins.
///
/// All three expressions are compiled before any is run, so a broken Green
/// rule is reported even when Red matches. Compiled rules are cached by
/// expression text and shared across concurrent evaluations.
#[derive(Debug, Default)]
pub struct RuleEvaluator {
    cache: RwLock<HashMap<String, Arc<CompiledRule>>>,
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, expression: &str) -> Result<Arc<CompiledRule>, RuleError> {
        let key = expression.trim();
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(rule) = cache.get(key) {
                return Ok(Arc::clone(rule));
            }
        }

        let rule = Arc::new(CompiledRule::compile(key)?);
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key.to_string()).or_insert(rule)))
    }

    /// Compiles the three expressions without evaluating them.
    pub fn check(&self, rules: &RagRuleConfig) -> Result<(), RuleFailure> {
        self.compile_all(rules).map(|_| ())
    }

    pub fn evaluate(
        &self,
        runs: &[JobRun],
        rules: &RagRuleConfig,
        reference: NaiveDateTime,
    ) -> Result<RagStatus, RuleFailure> {
        let compiled = self.compile_all(rules)?;

        for (indicator, rule) in RagIndicator::PRECEDENCE.into_iter().zip(compiled) {
            let matched = rule
                .evaluate(runs, reference)
                .map_err(|source| RuleFailure { indicator, source })?;
            if matched {
                return Ok(RagStatus::new(indicator));
            }
        }

        debug!(runs = runs.len(), "No RAG rule matched, falling back to Green");
        Ok(RagStatus::new(RagIndicator::Green))
    }

    pub fn cached_rules(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn compile_all(&self, rules: &RagRuleConfig) -> Result<[Arc<CompiledRule>; 3], RuleFailure> {
        let compile = |indicator: RagIndicator, expression: &str| {
            self.compile(expression)
                .map_err(|source| RuleFailure { indicator, source })
        };
        Ok([
            compile(RagIndicator::Red, &rules.red)?,
            compile(RagIndicator::Amber, &rules.amber)?,
            compile(RagIndicator::Green, &rules.green)?,
        ])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    const ALL_PASS: &str =
        r#"runs.all(r => r.jobStatus.toLower() == "success" && r.qualityStatus.toLower() == "pass")"#;
    const ANY_FULL_FAIL: &str =
        r#"runs.any(r => r.jobStatus.toLower() == "fail" && r.qualityStatus.toLower() == "fail")"#;

    // Rule set used by the operations team for daily loads.
    const RED: &str = r#"!jobStats.Any() || jobStats.Count(j => j.JobStatus.ToLower() == "fail" && j.QualityStatus.ToLower() == "fail") >= 2 || (jobStats.Any(j => j.JobStatus.ToLower() == "fail" && j.QualityStatus.ToLower() == "fail") && !jobStats.Any(j => j.JobStatus.ToLower() == "success" && j.QualityStatus.ToLower() == "pass"))"#;
    const AMBER: &str = r#"jobStats.Any(j => j.JobStatus.ToLower() == "success" && j.QualityStatus.ToLower() == "fail" && j.RecordFailed > 0)"#;
    const GREEN: &str = r#"jobStats.All(j => j.JobStatus.ToLower() == "success" && j.QualityStatus.ToLower() == "pass") || (jobStats.OrderBy(j => j.JobStart).First().JobStatus.ToLower() == "fail" && jobStats.OrderBy(j => j.JobStart).First().QualityStatus.ToLower() == "fail" && jobStats.OrderBy(j => j.JobStart).Skip(1).All(j => j.JobStatus.ToLower() == "success" && j.QualityStatus.ToLower() == "pass"))"#;

    fn day() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 13)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn run(hour: i64, status: &str, quality: &str, loaded: u64, failed: u64) -> JobRun {
        let start = day() + TimeDelta::hours(hour);
        JobRun {
            business_entity: "BE".to_string(),
            job_start: start,
            job_end: start + TimeDelta::minutes(30),
            job_status: status.to_string(),
            quality_status: quality.to_string(),
            record_as_of_date: day().date(),
            record_loaded: loaded,
            record_failed: failed,
            message: None,
        }
    }

    fn indicator(runs: &[JobRun], rules: &RagRuleConfig) -> RagIndicator {
        RuleEvaluator::new()
            .evaluate(runs, rules, day())
            .unwrap()
            .indicator
    }

    fn ops_rules() -> RagRuleConfig {
        RagRuleConfig::new(RED, AMBER, GREEN)
    }

    #[test]
    fn test_red_wins_over_amber_and_green() {
        let rules = RagRuleConfig::new("true", "true", "true");
        assert_eq!(indicator(&[], &rules), RagIndicator::Red);
    }

    #[test]
    fn test_amber_checked_before_green() {
        let rules = RagRuleConfig::new("false", "true", "true");
        assert_eq!(indicator(&[], &rules), RagIndicator::Amber);
    }

    #[test]
    fn test_falls_back_to_green_when_nothing_matches() {
        let rules = RagRuleConfig::new("false", "false", "false");
        let status = RuleEvaluator::new().evaluate(&[], &rules, day()).unwrap();
        assert_eq!(status, RagStatus::new(RagIndicator::Green));
        assert_eq!(status.description, "Green");
    }

    #[test]
    fn test_no_runs_is_red() {
        let rules = RagRuleConfig::new("!runs.any()", "false", "true");
        assert_eq!(indicator(&[], &rules), RagIndicator::Red);
    }

    #[test]
    fn test_all_success_and_pass_is_green() {
        let runs = vec![
            run(9, "Success", "Pass", 100, 0),
            run(10, "Success", "Pass", 150, 0),
        ];
        let rules = RagRuleConfig::new(ANY_FULL_FAIL, "false", ALL_PASS);
        assert_eq!(indicator(&runs, &rules), RagIndicator::Green);
    }

    #[test]
    fn test_single_full_failure_is_red() {
        let runs = vec![run(9, "Fail", "Fail", 0, 10)];
        let rules = RagRuleConfig::new(ANY_FULL_FAIL, "false", ALL_PASS);
        assert_eq!(indicator(&runs, &rules), RagIndicator::Red);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let evaluator = RuleEvaluator::new();
        let runs = vec![run(9, "Fail", "Fail", 0, 1), run(10, "Success", "Pass", 5, 0)];
        let rules = ops_rules();
        let first = evaluator.evaluate(&runs, &rules, day()).unwrap();
        let second = evaluator.evaluate(&runs, &rules, day()).unwrap();
        assert_eq!(first, second);
        assert_eq!(evaluator.cached_rules(), 3);
    }

    #[test]
    fn test_ops_rules_green_paths() {
        let perfect = vec![
            run(8, "Success", "Pass", 100, 0),
            run(9, "Success", "Pass", 150, 0),
            run(10, "Success", "Pass", 200, 0),
        ];
        assert_eq!(indicator(&perfect, &ops_rules()), RagIndicator::Green);

        let recovered = vec![
            run(9, "Success", "Pass", 180, 0),
            run(7, "Fail", "Fail", 0, 5),
            run(8, "Success", "Pass", 120, 0),
        ];
        assert_eq!(indicator(&recovered, &ops_rules()), RagIndicator::Green);
    }

    #[test]
    fn test_ops_rules_amber_paths() {
        let quality_dip = vec![
            run(9, "Success", "Pass", 100, 0),
            run(10, "Success", "Pass", 150, 0),
            run(11, "Success", "Fail", 0, 20),
        ];
        assert_eq!(indicator(&quality_dip, &ops_rules()), RagIndicator::Amber);

        let fail_then_dip = vec![
            run(7, "Fail", "Fail", 0, 10),
            run(8, "Success", "Pass", 200, 0),
            run(9, "Success", "Fail", 0, 25),
        ];
        assert_eq!(indicator(&fail_then_dip, &ops_rules()), RagIndicator::Amber);
    }

    #[test]
    fn test_ops_rules_red_paths() {
        assert_eq!(indicator(&[], &ops_rules()), RagIndicator::Red);

        let two_failures = vec![run(9, "Fail", "Fail", 0, 10), run(10, "Fail", "Fail", 0, 5)];
        assert_eq!(indicator(&two_failures, &ops_rules()), RagIndicator::Red);

        let failure_then_dip = vec![
            run(8, "Fail", "Fail", 0, 20),
            run(9, "Success", "Fail", 50, 5),
        ];
        assert_eq!(indicator(&failure_then_dip, &ops_rules()), RagIndicator::Red);

        let alternating = vec![
            run(8, "Fail", "Fail", 0, 5),
            run(9, "Success", "Pass", 100, 0),
            run(10, "Fail", "Fail", 0, 10),
            run(11, "Success", "Pass", 200, 0),
            run(12, "Success", "Fail", 0, 100),
        ];
        assert_eq!(indicator(&alternating, &ops_rules()), RagIndicator::Red);
    }

    #[test]
    fn test_reference_date_arithmetic() {
        let rules = RagRuleConfig::new(
            "!runs.any(r => r.jobStart >= referenceDate.addHours(9))",
            "false",
            "true",
        );
        assert_eq!(indicator(&[run(8, "Success", "Pass", 1, 0)], &rules), RagIndicator::Red);
        assert_eq!(indicator(&[run(9, "Success", "Pass", 1, 0)], &rules), RagIndicator::Green);
    }

    #[test]
    fn test_aggregates_and_string_helpers() {
        let runs = vec![
            run(9, "Success", "Pass", 100, 0),
            run(14, " SUCCESS ", "Pass", 250, 3),
        ];
        let evaluator = RuleEvaluator::new();
        let holds = |expr: &str| {
            evaluator
                .compile(expr)
                .unwrap()
                .evaluate(&runs, day())
                .unwrap()
        };

        assert!(holds("runs.sum(r => r.loaded) == 350"));
        assert!(holds("runs.max(r => r.loaded) - runs.min(r => r.loaded) == 150"));
        assert!(holds("runs.orderByDescending(r => r.start).first().failed == 3"));
        assert!(holds("runs.last().status.trim().equalsIgnoreCase(\"success\")"));
        assert!(holds("runs.where(r => r.start.hour >= 12).count() == 1"));
        assert!(holds("runs.take(1).all(r => r.status.startsWith(\"Succ\"))"));
        assert!(holds("runs.first().asOf == today.date"));
        assert!(holds("runs.first().end > runs.first().start.addMinutes(29)"));
        assert!(holds("runs.first().start.addDays(-1) < today"));
        assert!(holds("runs.first().message.length == 0"));
        assert!(holds("-runs.count() == 0 - 2"));
        assert!(!holds("runs.skip(5).any()"));
    }

    #[test]
    fn test_blank_expression_is_a_compile_error() {
        let rules = RagRuleConfig::new("false", "", "true");
        let err = RuleEvaluator::new().evaluate(&[], &rules, day()).unwrap_err();
        assert_eq!(err.indicator, RagIndicator::Amber);
        assert!(err.source.is_compile());
    }

    #[test]
    fn test_unknown_identifier_is_not_false() {
        let rules = RagRuleConfig::new("jobs.any()", "false", "true");
        let err = RuleEvaluator::new().check(&rules).unwrap_err();
        assert_eq!(err.indicator, RagIndicator::Red);
        assert!(matches!(
            err.source,
            RuleError::Compile {
                source: CompileError::UnknownIdentifier { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_deeply_nested_rule_is_rejected_not_fatal() {
        let evaluator = RuleEvaluator::new();
        let nested = format!("{}true{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = evaluator.compile(&nested).unwrap_err();
        assert!(err.is_compile());
        assert_eq!(evaluator.cached_rules(), 0);

        let rules = RagRuleConfig::new(&format!("{}false", "!".repeat(300)), "false", "true");
        let failure = evaluator.check(&rules).unwrap_err();
        assert_eq!(failure.indicator, RagIndicator::Red);
    }

    #[test]
    fn test_broken_green_reported_even_when_red_matches() {
        let rules = RagRuleConfig::new("true", "false", "runs.any(");
        let err = RuleEvaluator::new().evaluate(&[], &rules, day()).unwrap_err();
        assert_eq!(err.indicator, RagIndicator::Green);
    }

    #[test]
    fn test_runtime_errors_surface_as_evaluation_errors() {
        let evaluator = RuleEvaluator::new();
        let runs = vec![run(9, "Success", "Pass", 1, 0)];

        let mismatch = evaluator
            .compile("runs.first().status == 1")
            .unwrap()
            .evaluate(&runs, day())
            .unwrap_err();
        assert!(matches!(
            mismatch,
            RuleError::Evaluation {
                source: EvalError::TypeMismatch { .. },
                ..
            }
        ));

        let empty = evaluator
            .compile("runs.first().loaded > 0")
            .unwrap()
            .evaluate(&[], day())
            .unwrap_err();
        assert!(matches!(
            empty,
            RuleError::Evaluation {
                source: EvalError::EmptySequence("first"),
                ..
            }
        ));

        let not_bool = evaluator
            .compile("runs.count()")
            .unwrap()
            .evaluate(&runs, day())
            .unwrap_err();
        assert!(matches!(
            not_bool,
            RuleError::Evaluation {
                source: EvalError::NotBoolean(_),
                ..
            }
        ));
    }

    #[test]
    fn test_cache_keys_on_trimmed_text() {
        let evaluator = RuleEvaluator::new();
        let a = evaluator.compile("runs.any()").unwrap();
        let b = evaluator.compile("  runs.any()  ").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(evaluator.cached_rules(), 1);
    }
}
