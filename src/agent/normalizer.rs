//! Solution normalization
//!
//! Turns heterogeneous free text — a generated completion or a stored
//! knowledge-base solution — into an ordered list of typed steps plus a
//! final answer. Step extraction tries strategies in priority order and
//! falls back to a fixed placeholder sequence: the normalizer never returns
//! zero steps. Answer extraction is a prioritized list of pure functions so
//! each cue is independently testable.

use regex::Regex;

use crate::kb::MathTextPreprocessor;
use crate::models::SolutionStep;

/// Maximum characters kept per step text.
const STEP_TEXT_LIMIT: usize = 300;

/// Minimum sentence length considered a usable step.
const MIN_SENTENCE_LENGTH: usize = 20;

/// Normalizer for free-text solutions
pub struct SolutionNormalizer {
    max_steps: usize,
    step_marker: Regex,
    dot_marker: Regex,
    paren_marker: Regex,
    whitespace: Regex,
    cleaner: MathTextPreprocessor,
}

impl SolutionNormalizer {
    #[must_use]
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            step_marker: Regex::new(r"(?i)\bstep\s+(\d+)\s*:").expect("static pattern"),
            dot_marker: Regex::new(r"(?m)^\s*(\d+)\.\s+").expect("static pattern"),
            paren_marker: Regex::new(r"(?m)^\s*(\d+)\)\s+").expect("static pattern"),
            whitespace: Regex::new(r"\s+").expect("static pattern"),
            cleaner: MathTextPreprocessor::new(),
        }
    }

    /// Extract ordered steps from free text.
    ///
    /// Strategies in priority order: explicit `Step N:` markers, `N.`
    /// numbered lists, `N)` numbered lists, sentence segmentation, then the
    /// generic placeholder sequence. Never returns an empty list.
    #[must_use]
    pub fn extract_steps(&self, text: &str) -> Vec<SolutionStep> {
        for marker in [&self.step_marker, &self.dot_marker, &self.paren_marker] {
            let steps = self.split_on_markers(marker, text);
            // A single marker is more likely a stray number than a list
            if steps.len() >= 2 {
                return self.renumber(steps);
            }
        }

        let sentences = self.sentence_steps(text);
        if !sentences.is_empty() {
            return self.renumber(sentences);
        }

        placeholder_steps()
    }

    /// Extract the final answer using prioritized cue strategies, then the
    /// stored answer, then a fixed sentinel.
    #[must_use]
    pub fn extract_final_answer(&self, text: &str, stored_answer: Option<&str>) -> String {
        for strategy in ANSWER_STRATEGIES {
            if let Some(answer) = strategy(text) {
                let cleaned = self.cleaner.clean_latex(&answer);
                if cleaned.len() > 1 {
                    return cleaned;
                }
            }
        }

        if let Some(stored) = stored_answer {
            let cleaned = self.cleaner.clean_latex(stored);
            if !cleaned.is_empty() {
                return cleaned;
            }
        }

        "See solution steps above".to_string()
    }

    /// Clean LaTeX markup out of reference text.
    #[must_use]
    pub fn clean_reference(&self, text: &str) -> String {
        self.cleaner.clean_latex(text)
    }

    fn split_on_markers(&self, marker: &Regex, text: &str) -> Vec<String> {
        let matches: Vec<_> = marker.find_iter(text).collect();
        let mut steps = Vec::new();

        for (position, found) in matches.iter().enumerate() {
            let body_start = found.end();
            let body_end = matches
                .get(position + 1)
                .map_or(text.len(), |next| next.start());
            let body = self
                .whitespace
                .replace_all(text[body_start..body_end].trim(), " ")
                .to_string();

            if body.len() > 5 {
                steps.push(truncate(&body, STEP_TEXT_LIMIT));
            }
        }

        steps
    }

    fn sentence_steps(&self, text: &str) -> Vec<String> {
        text.split('.')
            .map(str::trim)
            .filter(|sentence| sentence.len() > MIN_SENTENCE_LENGTH)
            .take(5)
            .map(|sentence| {
                truncate(
                    &format!("Apply mathematical reasoning: {sentence}"),
                    STEP_TEXT_LIMIT,
                )
            })
            .collect()
    }

    fn renumber(&self, texts: Vec<String>) -> Vec<SolutionStep> {
        texts
            .into_iter()
            .take(self.max_steps)
            .enumerate()
            .map(|(index, text)| SolutionStep::new(index + 1, text))
            .collect()
    }
}

/// The fixed placeholder sequence used when no strategy yields steps.
#[must_use]
pub fn placeholder_steps() -> Vec<SolutionStep> {
    vec![
        SolutionStep::new(1, "Analyze the given mathematical problem"),
        SolutionStep::new(2, "Apply appropriate mathematical techniques"),
        SolutionStep::new(3, "Calculate the result step by step"),
        SolutionStep::new(4, "Verify and state the final answer"),
    ]
}

/// Keyword-sensitive fallback steps used when generation fails entirely.
#[must_use]
pub fn fallback_steps(question: &str) -> Vec<SolutionStep> {
    let question_lower = question.to_lowercase();
    if question_lower.contains("expand") {
        vec![
            SolutionStep::new(1, "Identify the expression to expand using distributive property"),
            SolutionStep::new(
                2,
                "Multiply each term in the first bracket by each term in the second bracket",
            ),
            SolutionStep::new(3, "Combine like terms by adding coefficients of the same variables"),
            SolutionStep::new(4, "Write the final expanded form in standard polynomial notation"),
        ]
    } else if question_lower.contains("solve") {
        vec![
            SolutionStep::new(1, "Set up the equation by identifying known and unknown variables"),
            SolutionStep::new(2, "Apply algebraic operations to isolate the variable"),
            SolutionStep::new(3, "Perform calculations to find the numerical value"),
            SolutionStep::new(4, "Verify the solution by substituting back into original equation"),
        ]
    } else {
        placeholder_steps()
    }
}

// Answer-extraction strategies, tried in order. Each is a pure function of
// the text so it can be tested on its own.
type AnswerStrategy = fn(&str) -> Option<String>;

const ANSWER_STRATEGIES: &[AnswerStrategy] = &[
    final_answer_cue,
    answer_is_cue,
    answer_cue,
    therefore_cue,
    result_cue,
    equation_expression,
];

fn answer_after_cue(text: &str, cue: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?i){cue}[:\s]+([^\n.]+)")).expect("static pattern");
    let captures = pattern.captures(text)?;
    let answer = captures.get(1)?.as_str().trim();
    if answer.len() > 1 && answer != "**" {
        Some(answer.to_string())
    } else {
        None
    }
}

fn final_answer_cue(text: &str) -> Option<String> {
    answer_after_cue(text, "final answer")
}

fn answer_is_cue(text: &str) -> Option<String> {
    answer_after_cue(text, "the answer is")
}

fn answer_cue(text: &str) -> Option<String> {
    answer_after_cue(text, "answer")
}

fn therefore_cue(text: &str) -> Option<String> {
    answer_after_cue(text, "therefore")
}

fn result_cue(text: &str) -> Option<String> {
    answer_after_cue(text, "result")
}

fn equation_expression(text: &str) -> Option<String> {
    let pattern = Regex::new(r"([a-zA-Z0-9\s+\-*^()]+\s*=\s*[a-zA-Z0-9\s+\-*^()]+)")
        .expect("static pattern");
    let captures = pattern.captures(text)?;
    let expression = captures.get(1)?.as_str().trim();
    if expression.len() > 1 {
        Some(expression.to_string())
    } else {
        None
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    // Cut on a char boundary at or below the limit
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepKind;

    #[test]
    fn test_explicit_step_markers_win() {
        let normalizer = SolutionNormalizer::new(8);
        let text = "Step 1: Factor the expression into two binomials\n\
                    Step 2: Set each factor equal to zero\n\
                    Step 3: Solve the resulting linear equations";
        let steps = normalizer.extract_steps(text);
        assert_eq!(steps.len(), 3);
        assert!(steps[0].text.starts_with("Factor"));
        assert_eq!(steps[2].step_number, 3);
        assert_eq!(steps[0].kind, StepKind::SolutionStep);
    }

    #[test]
    fn test_numbered_list_markers() {
        let normalizer = SolutionNormalizer::new(8);
        let text = "1. Identify coefficients of the quadratic\n2. Apply the quadratic formula";
        let steps = normalizer.extract_steps(text);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].text.starts_with("Identify"));
    }

    #[test]
    fn test_sentence_segmentation_fallback() {
        let normalizer = SolutionNormalizer::new(8);
        let text = "We substitute the given values into the formula. \
                    Then the expression simplifies to a single constant term.";
        let steps = normalizer.extract_steps(text);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].text.starts_with("Apply mathematical reasoning:"));
    }

    #[test]
    fn test_never_returns_zero_steps() {
        let normalizer = SolutionNormalizer::new(8);
        for text in ["", "short", "x = 2"] {
            let steps = normalizer.extract_steps(text);
            assert_eq!(steps.len(), 4, "placeholder expected for {text:?}");
        }
    }

    #[test]
    fn test_step_cap_enforced() {
        let normalizer = SolutionNormalizer::new(3);
        let text = (1..=6)
            .map(|i| format!("Step {i}: Perform operation number {i} carefully"))
            .collect::<Vec<_>>()
            .join("\n");
        let steps = normalizer.extract_steps(&text);
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_answer_strategy_priority() {
        let normalizer = SolutionNormalizer::new(8);
        let text = "Therefore x is small\nFinal answer: 42";
        assert_eq!(normalizer.extract_final_answer(text, None), "42");
    }

    #[test]
    fn test_answer_falls_back_to_stored_then_sentinel() {
        let normalizer = SolutionNormalizer::new(8);
        assert_eq!(
            normalizer.extract_final_answer("no cues here", Some(r"\boxed{7}")),
            "7"
        );
        assert_eq!(
            normalizer.extract_final_answer("no cues here", None),
            "See solution steps above"
        );
    }

    #[test]
    fn test_individual_cue_strategies() {
        assert_eq!(
            final_answer_cue("Final answer: cos(2x)"),
            Some("cos(2x)".to_string())
        );
        assert_eq!(answer_is_cue("the answer is 12"), Some("12".to_string()));
        assert_eq!(therefore_cue("Therefore: x = 5"), Some("x = 5".to_string()));
        assert_eq!(final_answer_cue("nothing relevant"), None);
    }

    #[test]
    fn test_keyword_fallback_steps() {
        let steps = fallback_steps("Expand (x+1)(x+2)");
        assert!(steps[0].text.contains("distributive"));
        let steps = fallback_steps("Solve for x");
        assert!(steps[0].text.contains("equation"));
        assert_eq!(fallback_steps("something else").len(), 4);
    }
}
