//! Direct evaluation of simple arithmetic questions

use regex::Regex;

/// Evaluator for basic two-operand arithmetic embedded in a question
pub struct ArithmeticShortcut {
    add: Regex,
    sub: Regex,
    mul: Regex,
    div: Regex,
}

impl ArithmeticShortcut {
    #[must_use]
    pub fn new() -> Self {
        Self {
            add: Regex::new(r"(\d+)\s*\+\s*(\d+)").expect("static pattern"),
            sub: Regex::new(r"(\d+)\s*-\s*(\d+)").expect("static pattern"),
            mul: Regex::new(r"(\d+)\s*[*×]\s*(\d+)").expect("static pattern"),
            div: Regex::new(r"(\d+)\s*[/÷]\s*(\d+)").expect("static pattern"),
        }
    }

    /// Evaluate the first simple arithmetic expression in the question, if
    /// any. Division yields an integer when it is exact. Results that do not
    /// fit an `i64` yield `None` so the question takes the normal path.
    #[must_use]
    pub fn evaluate(&self, question: &str) -> Option<String> {
        if let Some((a, b)) = self.operands(&self.add, question) {
            return a.checked_add(b).map(|value| value.to_string());
        }
        if let Some((a, b)) = self.operands(&self.sub, question) {
            return a.checked_sub(b).map(|value| value.to_string());
        }
        if let Some((a, b)) = self.operands(&self.mul, question) {
            return a.checked_mul(b).map(|value| value.to_string());
        }
        if let Some((a, b)) = self.operands(&self.div, question) {
            if b != 0 {
                if a % b == 0 {
                    return Some((a / b).to_string());
                }
                return Some((a as f64 / b as f64).to_string());
            }
        }
        None
    }

    /// Human-readable name of the operation found in the question.
    #[must_use]
    pub fn operation_name(question: &str) -> &'static str {
        if question.contains('+') {
            "addition"
        } else if question.contains('-') {
            "subtraction"
        } else if question.contains('*') || question.contains('×') {
            "multiplication"
        } else if question.contains('/') || question.contains('÷') {
            "division"
        } else {
            "calculation"
        }
    }

    fn operands(&self, pattern: &Regex, question: &str) -> Option<(i64, i64)> {
        let captures = pattern.captures(question)?;
        let a = captures.get(1)?.as_str().parse().ok()?;
        let b = captures.get(2)?.as_str().parse().ok()?;
        Some((a, b))
    }
}

impl Default for ArithmeticShortcut {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition() {
        let shortcut = ArithmeticShortcut::new();
        assert_eq!(shortcut.evaluate("5 + 7"), Some("12".to_string()));
        assert_eq!(shortcut.evaluate("what is 10+20?"), Some("30".to_string()));
    }

    #[test]
    fn test_subtraction_and_multiplication() {
        let shortcut = ArithmeticShortcut::new();
        assert_eq!(shortcut.evaluate("9 - 4"), Some("5".to_string()));
        assert_eq!(shortcut.evaluate("6 × 7"), Some("42".to_string()));
    }

    #[test]
    fn test_division_exact_and_fractional() {
        let shortcut = ArithmeticShortcut::new();
        assert_eq!(shortcut.evaluate("10 / 2"), Some("5".to_string()));
        assert_eq!(shortcut.evaluate("7 / 2"), Some("3.5".to_string()));
        assert_eq!(shortcut.evaluate("7 / 0"), None);
    }

    #[test]
    fn test_overflowing_expressions_return_none() {
        let shortcut = ArithmeticShortcut::new();
        assert_eq!(shortcut.evaluate("What is 9223372036854775807 + 1?"), None);
        assert_eq!(shortcut.evaluate("3000000000 * 4000000000"), None);
        // Operands beyond i64 never parse in the first place
        assert_eq!(shortcut.evaluate("99999999999999999999 + 1"), None);
    }

    #[test]
    fn test_non_arithmetic_question() {
        let shortcut = ArithmeticShortcut::new();
        assert_eq!(shortcut.evaluate("find the derivative of sin(x)"), None);
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(ArithmeticShortcut::operation_name("5 + 7"), "addition");
        assert_eq!(ArithmeticShortcut::operation_name("6 ÷ 3"), "division");
    }
}
