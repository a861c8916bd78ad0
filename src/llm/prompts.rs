//! Prompt templates for solution generation

use std::collections::HashMap;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Tutor prompt templates for the solving pipeline
pub struct TutorPrompts;

impl TutorPrompts {
    /// Break a knowledge-base reference solution into numbered steps
    #[must_use]
    pub fn step_breakdown() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a math tutor. Break down the solution into clear, numbered steps.

Student Question: {{question}}
Reference Problem: {{reference_question}}
Reference Solution: {{reference_solution}}

Create exactly 4-6 numbered steps. Each step should be one clear mathematical operation or concept.

Format EXACTLY like this:
Step 1: [First action - what to do and why]
Step 2: [Second action - show the calculation]
Step 3: [Third action - combine or simplify]
Step 4: [Fourth action - state the result]

Make each step complete but concise. End with the final numerical answer.",
        )
    }

    /// Solve a question using aggregated web search context
    #[must_use]
    pub fn web_solution() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a math tutor solving a question with the help of web sources.

Web context:
{{context}}

Question: {{question}}

Produce a numbered list of solution steps (one operation per step) and finish
with a line of the form 'Final answer: ...'. If the sources are not relevant,
solve from first principles instead.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_variables() {
        let template = PromptTemplate::new("Hello {{name}}, you are {{age}} years old.");
        assert_eq!(template.variables(), &["name", "age"]);
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Hello {{name}}!");
        let mut values = HashMap::new();
        values.insert("name".to_string(), "Alice".to_string());
        assert_eq!(template.render(&values), "Hello Alice!");
    }

    #[test]
    fn test_tutor_prompts_have_expected_variables() {
        let template = TutorPrompts::step_breakdown();
        assert!(template.variables().contains(&"question".to_string()));
        assert!(template
            .variables()
            .contains(&"reference_solution".to_string()));
    }
}
