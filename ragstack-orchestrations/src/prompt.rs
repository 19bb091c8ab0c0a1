//! Operator prompt port
//!
//! Interactive questions go through [`OperatorPrompt`]. The CLI answers them
//! from standard input; [`ScriptedPrompt`] answers them from a fixed script so
//! non-interactive runs and tests never block.

use std::collections::VecDeque;
use std::sync::Mutex;

pub trait OperatorPrompt: Send + Sync {
    /// Yes/no question. Anything but an explicit yes is a no.
    fn confirm(&self, question: &str) -> bool;

    /// Pick zero or more entries from `options`
    fn choose(&self, question: &str, options: &[String]) -> Vec<String>;
}

/// Prompt with canned answers, in the order questions are asked
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    confirmations: Mutex<VecDeque<bool>>,
    choices: Mutex<VecDeque<Vec<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every confirmation with no
    pub fn declining() -> Self {
        Self::new()
    }

    pub fn confirm_with(self, answer: bool) -> Self {
        if let Ok(mut queue) = self.confirmations.lock() {
            queue.push_back(answer);
        }
        self
    }

    pub fn choose_with(self, answer: Vec<String>) -> Self {
        if let Ok(mut queue) = self.choices.lock() {
            queue.push_back(answer);
        }
        self
    }

    /// Questions asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, question: &str) {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
    }
}

impl OperatorPrompt for ScriptedPrompt {
    fn confirm(&self, question: &str) -> bool {
        self.record(question);
        self.confirmations
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(false)
    }

    fn choose(&self, question: &str, options: &[String]) -> Vec<String> {
        self.record(question);
        let answer = self
            .choices
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_default();
        answer.into_iter().filter(|a| options.contains(a)).collect()
    }
}

/// Interpret a menu answer such as `1,3`, `2 4`, `a` or `all`.
///
/// Numbers are 1-based indexes into `options`. Out-of-range numbers and
/// duplicates are dropped; `None` means the answer could not be understood.
pub fn parse_menu_answer(answer: &str, options: &[String]) -> Option<Vec<String>> {
    let answer = answer.trim().to_lowercase();
    if answer.is_empty() || answer == "q" || answer == "quit" {
        return Some(Vec::new());
    }
    if answer == "a" || answer == "all" {
        return Some(options.to_vec());
    }

    let mut picked: Vec<String> = Vec::new();
    for token in answer.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let index: usize = token.parse().ok()?;
        if let Some(option) = index.checked_sub(1).and_then(|i| options.get(i)) {
            if !picked.contains(option) {
                picked.push(option.clone());
            }
        }
    }
    Some(picked)
}

/// Confirmation answer check shared by interactive prompts
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["qdrant".into(), "localai".into(), "anythingllm".into()]
    }

    #[test]
    fn test_scripted_prompt_defaults_to_no() {
        let prompt = ScriptedPrompt::declining();
        assert!(!prompt.confirm("Delete storage?"));
        assert_eq!(prompt.asked(), vec!["Delete storage?".to_string()]);
    }

    #[test]
    fn test_scripted_prompt_answers_in_order() {
        let prompt = ScriptedPrompt::new()
            .confirm_with(true)
            .confirm_with(false)
            .choose_with(vec!["localai".into(), "bogus".into()]);
        assert!(prompt.confirm("first"));
        assert!(!prompt.confirm("second"));
        assert_eq!(prompt.choose("which?", &options()), vec!["localai".to_string()]);
    }

    #[test]
    fn test_parse_menu_answer() {
        let opts = options();
        assert_eq!(
            parse_menu_answer("1,3", &opts),
            Some(vec!["qdrant".to_string(), "anythingllm".to_string()])
        );
        assert_eq!(parse_menu_answer(" 2 2 9 ", &opts), Some(vec!["localai".to_string()]));
        assert_eq!(parse_menu_answer("all", &opts), Some(opts.clone()));
        assert_eq!(parse_menu_answer("", &opts), Some(vec![]));
        assert_eq!(parse_menu_answer("one", &opts), None);
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("Y\n"));
        assert!(is_affirmative("yes"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
    }
}
