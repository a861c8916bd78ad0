//! Text preprocessing for mathematical content
//!
//! Normalizes LaTeX-heavy problem text into plain searchable terms and
//! expands domain concepts with synonyms before vectorization. The
//! preprocessing is deterministic: the same input always produces the same
//! output, which keeps knowledge-base searches idempotent.

use regex::Regex;

/// Domain synonym expansions appended when a concept appears in the text.
const MATH_SYNONYMS: &[(&str, &str)] = &[
    ("derivative", "differentiate differentiation diff slope rate of change"),
    ("integral", "integrate integration area under curve antiderivative"),
    ("equation", "formula expression relation"),
    ("solve", "find determine calculate compute"),
    ("quadratic", "second degree degree 2 x squared parabola"),
    ("circle", "circular round radius diameter circumference"),
    ("triangle", "triangular three sided trigon"),
    ("algebra", "algebraic variables unknowns polynomial"),
    ("geometry", "geometric shapes figures"),
    ("calculus", "differential integral limits"),
    ("probability", "chance random statistics"),
];

/// Phrase expansions inserted after common question phrasings.
const PHRASE_EXPANSIONS: &[(&str, &str)] = &[
    ("find the", "calculate determine solve"),
    ("what is", "find calculate"),
    ("given that", "if when"),
    ("such that", "where if"),
    ("show that", "prove demonstrate"),
    ("prove that", "show demonstrate verify"),
];

/// Preprocessor for mathematical text
pub struct MathTextPreprocessor {
    latex_mappings: Vec<(Regex, String)>,
    environment_block: Regex,
    command_with_arg: Regex,
    bare_command: Regex,
    whitespace: Regex,
}

impl MathTextPreprocessor {
    #[must_use]
    pub fn new() -> Self {
        let latex_mappings = [
            (r"\\boxed\{([^}]+)\}", "$1"),
            (r"\\frac\{([^}]+)\}\{([^}]+)\}", "($1)/($2)"),
            (r"\^2", " squared"),
            (r"\^3", " cubed"),
            (r"\^\{([^}]+)\}", " to the power of $1"),
            (r"\\sqrt\{([^}]+)\}", "square root of $1"),
            (r"\\sin", "sine"),
            (r"\\cos", "cosine"),
            (r"\\tan", "tangent"),
            (r"\\pi", "pi"),
            (r"\\theta", "theta"),
            (r"\\alpha", "alpha"),
            (r"\\beta", "beta"),
            (r"\$([^$]+)\$", "$1"),
        ]
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("static latex pattern"),
                (*replacement).to_string(),
            )
        })
        .collect();

        Self {
            latex_mappings,
            environment_block: Regex::new(r"(?s)\\begin\{.*?\}.*?\\end\{.*?\}")
                .expect("static pattern"),
            command_with_arg: Regex::new(r"\\[a-zA-Z]+\{[^}]*\}").expect("static pattern"),
            bare_command: Regex::new(r"\\[a-zA-Z]+").expect("static pattern"),
            whitespace: Regex::new(r"\s+").expect("static pattern"),
        }
    }

    /// Normalize and expand mathematical text for vectorization.
    ///
    /// Strips LaTeX markup, lowercases, then appends synonym terms for
    /// recognized concepts and common question phrasings.
    #[must_use]
    pub fn preprocess(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let cleaned = self.strip_latex(text);
        let mut expanded = cleaned.to_lowercase();

        for (concept, synonyms) in MATH_SYNONYMS {
            if expanded.contains(concept) {
                expanded.push(' ');
                expanded.push_str(synonyms);
            }
        }

        let mut normalized = expanded;
        for (phrase, expansion) in PHRASE_EXPANSIONS {
            if normalized.contains(phrase) {
                normalized = normalized.replace(phrase, &format!("{phrase} {expansion}"));
            }
        }

        normalized
    }

    /// Strip LaTeX markup from solution or answer text, keeping the
    /// mathematical content readable.
    #[must_use]
    pub fn clean_latex(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let cleaned = self.environment_block.replace_all(text, "");
        let cleaned = cleaned.replace("\\\\", " ");
        let cleaned = self.strip_latex(&cleaned);
        cleaned.replace("&=", "=")
    }

    fn strip_latex(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for (pattern, replacement) in &self.latex_mappings {
            cleaned = pattern.replace_all(&cleaned, replacement.as_str()).into_owned();
        }
        cleaned = self.command_with_arg.replace_all(&cleaned, "").into_owned();
        cleaned = self.bare_command.replace_all(&cleaned, "").into_owned();
        cleaned = cleaned.replace('$', "");
        self.whitespace.replace_all(&cleaned, " ").trim().to_string()
    }
}

impl Default for MathTextPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_expands_synonyms() {
        let preprocessor = MathTextPreprocessor::new();
        let result = preprocessor.preprocess("Find the derivative of x^2");

        assert!(result.contains("derivative"));
        assert!(result.contains("differentiate"));
        assert!(result.contains("squared"));
        // Phrase expansion for "find the"
        assert!(result.contains("calculate determine solve"));
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let preprocessor = MathTextPreprocessor::new();
        let a = preprocessor.preprocess("Solve the quadratic equation $x^2 + 5x + 6 = 0$");
        let b = preprocessor.preprocess("Solve the quadratic equation $x^2 + 5x + 6 = 0$");
        assert_eq!(a, b);
    }

    #[test]
    fn test_clean_latex_boxed_and_frac() {
        let preprocessor = MathTextPreprocessor::new();
        let cleaned = preprocessor.clean_latex(r"The answer is \boxed{42}");
        assert_eq!(cleaned, "The answer is 42");

        let cleaned = preprocessor.clean_latex(r"\frac{1}{2} of the total");
        assert_eq!(cleaned, "(1)/(2) of the total");
    }

    #[test]
    fn test_clean_latex_removes_environments() {
        let preprocessor = MathTextPreprocessor::new();
        let cleaned =
            preprocessor.clean_latex("Before \\begin{align}x &= 2\\end{align} after");
        assert_eq!(cleaned, "Before after");
    }

    #[test]
    fn test_clean_latex_empty_input() {
        let preprocessor = MathTextPreprocessor::new();
        assert_eq!(preprocessor.clean_latex(""), "");
    }
}
