//! Strategy code generator
//!
//! Turns user rule objects (indicator, period, comparison) into a Python
//! strategy skeleton rendered through `StrategyTemplate`. The output only
//! depends on the input, so regenerating an unchanged strategy yields the
//! same code.

pub mod indicators;
pub mod rules;

use askama::Template;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, AppResult};
use crate::templates::StrategyTemplate;
pub use indicators::{IndicatorRegistry, IndicatorTemplate, MAX_PERIOD, MIN_PERIOD};
pub use rules::{Comparison, IndicatorRef, RuleAction, StrategyRule};

pub const MAX_RULES: usize = 20;
const MIN_STARTUP_CANDLES: u32 = 30;

const BODY_INDENT: &str = "        ";

fn word_regex() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").expect("static regex is valid"))
}

/// Python class name for a strategy: CamelCase of its alphanumeric words,
/// prefixed with `Strategy` when it would not start with a letter.
pub fn class_name_for(strategy_name: &str) -> String {
    let mut class_name: String = word_regex()
        .find_iter(strategy_name)
        .map(|word| {
            let mut chars = word.as_str().chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect();

    if !class_name.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        class_name.insert_str(0, "Strategy");
    }
    class_name
}

/// Strategy name as it may appear in a Python comment: one line, no control characters
fn comment_text(strategy_name: &str) -> String {
    strategy_name
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A resolved side of a condition: the dataframe column and what computes it
struct Operand {
    column: String,
    period: u32,
    lines: Vec<String>,
}

fn resolve(registry: &IndicatorRegistry, indicator: &str, period: Option<u32>) -> AppResult<Operand> {
    let template = registry.get(indicator).ok_or_else(|| {
        AppError::validation(format!(
            "unknown indicator '{}', supported: {}",
            indicator,
            registry.names().join(", ")
        ))
    })?;

    let period = match period {
        Some(p) if p != 0 && !template.accepts_any_period() && !(MIN_PERIOD..=MAX_PERIOD).contains(&p) => {
            return Err(AppError::validation(format!(
                "{} period must be between {} and {}, got {}",
                template.name(),
                MIN_PERIOD,
                MAX_PERIOD,
                p
            )))
        }
        _ if !template.uses_period() => 0,
        None | Some(0) => template.default_period(),
        Some(p) => p,
    };

    Ok(Operand {
        column: template.column(period),
        period,
        lines: template.populate_lines(period),
    })
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn render_condition(left: &str, comparison: Comparison, right: &str) -> String {
    match comparison {
        Comparison::CrossesAbove => format!("qtpylib.crossed_above({}, {})", left, right),
        Comparison::CrossesBelow => format!("qtpylib.crossed_below({}, {})", left, right),
        plain => format!("{} {} {}", left, plain.operator().unwrap_or("=="), right),
    }
}

fn column_ref(column: &str) -> String {
    format!("dataframe['{}']", column)
}

/// Check rules without generating anything
pub fn validate_rules(rules: &[StrategyRule]) -> AppResult<()> {
    let registry = IndicatorRegistry::new();
    for rule in rules_checked(rules)? {
        check_rule(&registry, rule)?;
    }
    Ok(())
}

fn rules_checked(rules: &[StrategyRule]) -> AppResult<&[StrategyRule]> {
    if rules.is_empty() {
        return Err(AppError::validation("a strategy needs at least one rule"));
    }
    if rules.len() > MAX_RULES {
        return Err(AppError::validation(format!(
            "a strategy can have at most {} rules, got {}",
            MAX_RULES,
            rules.len()
        )));
    }
    Ok(rules)
}

enum RightSide {
    Value(f64),
    Indicator(Operand),
}

struct CheckedRule {
    left: Operand,
    right: RightSide,
}

fn check_rule(registry: &IndicatorRegistry, rule: &StrategyRule) -> AppResult<CheckedRule> {
    let left = resolve(registry, &rule.indicator, rule.period)?;
    let right = match (&rule.value, &rule.compare_to) {
        (Some(value), None) => {
            if !value.is_finite() {
                return Err(AppError::validation("rule value must be a finite number"));
            }
            RightSide::Value(*value)
        }
        (None, Some(other)) => RightSide::Indicator(resolve(registry, &other.indicator, other.period)?),
        (Some(_), Some(_)) => {
            return Err(AppError::validation(format!(
                "rule on {} must compare against either a value or an indicator, not both",
                rule.indicator
            )))
        }
        (None, None) => {
            return Err(AppError::validation(format!(
                "rule on {} needs a value or an indicator to compare against",
                rule.indicator
            )))
        }
    };
    Ok(CheckedRule { left, right })
}

fn push_unique(lines: &mut Vec<String>, new_lines: Vec<String>) {
    for line in new_lines {
        if !lines.contains(&line) {
            lines.push(line);
        }
    }
}

fn signal_block(conditions: &[String], column: &str) -> String {
    if conditions.is_empty() {
        return format!("{}dataframe['{}'] = 0", BODY_INDENT, column);
    }
    let joined = conditions
        .iter()
        .map(|c| format!("{}        ({})", BODY_INDENT, c))
        .collect::<Vec<_>>()
        .join(" &\n");
    format!(
        "{indent}dataframe.loc[\n{indent}    (\n{joined}\n{indent}    ),\n{indent}    '{column}'] = 1",
        indent = BODY_INDENT,
        joined = joined,
        column = column
    )
}

/// Generate the Python source of a strategy from its rules
pub fn generate_strategy_code(strategy_name: &str, timeframe: &str, rules: &[StrategyRule]) -> AppResult<String> {
    let registry = IndicatorRegistry::new();
    let rules = rules_checked(rules)?;

    let mut indicator_lines: Vec<String> = Vec::new();
    let mut entry_conditions: Vec<String> = Vec::new();
    let mut exit_conditions: Vec<String> = Vec::new();
    let mut max_period = 0u32;

    for rule in rules {
        let checked = check_rule(&registry, rule)?;
        max_period = max_period.max(checked.left.period);
        push_unique(&mut indicator_lines, checked.left.lines);

        let right = match checked.right {
            RightSide::Indicator(operand) => {
                max_period = max_period.max(operand.period);
                push_unique(&mut indicator_lines, operand.lines);
                column_ref(&operand.column)
            }
            RightSide::Value(value) => format_number(value),
        };

        let condition = render_condition(&column_ref(&checked.left.column), rule.comparison, &right);
        match rule.action {
            RuleAction::Entry => entry_conditions.push(condition),
            RuleAction::Exit => exit_conditions.push(condition),
        }
    }

    let indicator_block = if indicator_lines.is_empty() {
        format!("{}pass", BODY_INDENT)
    } else {
        indicator_lines
            .iter()
            .map(|line| format!("{}{}", BODY_INDENT, line))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let template = StrategyTemplate {
        strategy_name: comment_text(strategy_name),
        class_name: class_name_for(strategy_name),
        timeframe: timeframe.to_string(),
        startup_candle_count: MIN_STARTUP_CANDLES.max(max_period * 2),
        indicator_block,
        entry_block: signal_block(&entry_conditions, "enter_long"),
        exit_block: signal_block(&exit_conditions, "exit_long"),
    };

    Ok(template.render()?)
}
