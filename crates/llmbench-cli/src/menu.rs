use std::io::{BufRead, Write};

use anyhow::{bail, Result};

use crate::selection::{models_at, parse_custom_prompts, parse_indices, PROMPT_SEPARATOR};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelChoice {
    Use(Vec<String>),
    Skip(Vec<String>),
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuSelection {
    pub models: ModelChoice,
    pub verbose: bool,
    pub prompts: Vec<String>,
}

/// Interactive terminal menu. Reads answers from `input` and writes
/// questions to `out`, so it can be driven from tests.
pub struct Menu<'a, R, W> {
    input: R,
    out: W,
    available: &'a [String],
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(input: R, out: W, available: &'a [String]) -> Self {
        Self { input, out, available }
    }

    pub fn run(&mut self, verbose: bool, prompts: Vec<String>, default_prompts: &[String]) -> Result<MenuSelection> {
        writeln!(self.out, "\nWhat would you like to do?")?;
        let choice = self.choose(
            &["A", "B", "C"],
            "A) Select models to benchmark\nB) Select models to skip in benchmark\nC) Run benchmark on all models\n\n>> ",
        )?;

        let models = match choice.as_str() {
            "A" => ModelChoice::Use(self.pick_models("use")?),
            "B" => ModelChoice::Skip(self.pick_models("skip")?),
            _ => ModelChoice::All,
        };

        let verbose = verbose || {
            let answer = self.ask("\nVerbose? [y/n] : ")?;
            answer.trim().eq_ignore_ascii_case("y")
        };

        let prompts = if prompts.is_empty() { default_prompts.to_vec() } else { prompts };
        let label = if prompts == default_prompts { "Default" } else { "Currently set" };
        let prompt_choice = self.choose(&["A", "B"], &format!("\nA) Use {label} prompts\nB) Use Custom prompts\n\n>> "))?;

        let prompts = match prompt_choice.as_str() {
            "B" => self.custom_prompts()?,
            _ => prompts,
        };

        Ok(MenuSelection {
            models,
            verbose,
            prompts,
        })
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.out, "{question}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("No input received");
        }
        Ok(line)
    }

    fn choose(&mut self, choices: &[&str], question: &str) -> Result<String> {
        loop {
            let answer = self.ask(question)?.trim().to_uppercase();
            if choices.contains(&answer.as_str()) {
                return Ok(answer);
            }
            writeln!(self.out, "\nInvalid choice. Please try again.")?;
        }
    }

    fn pick_models(&mut self, verb: &str) -> Result<Vec<String>> {
        writeln!(self.out, "\nAvailable models:\n")?;
        for (i, name) in self.available.iter().enumerate() {
            writeln!(self.out, "{}. {}", i + 1, name)?;
        }

        let answer = self.ask(&format!(
            "\nEnter a comma separated list of model numbers to {verb} (e.g., 1,2,3):\n\n>> "
        ))?;
        let indices = parse_indices(answer.trim(), self.available.len())?;
        Ok(models_at(self.available, &indices))
    }

    fn custom_prompts(&mut self) -> Result<Vec<String>> {
        writeln!(
            self.out,
            "\nCustom prompts should be separated by {sep}. Quotes are optional. e.g.: prompt1 {sep} \"prompt 2\" {sep} prompt3",
            sep = PROMPT_SEPARATOR
        )?;

        loop {
            let answer = self.ask(&format!("Enter custom prompts ({PROMPT_SEPARATOR}-separated):\n\n>> "))?;
            let prompts = parse_custom_prompts(&answer);
            if !prompts.is_empty() {
                return Ok(prompts);
            }
            writeln!(self.out, "\nError: No valid prompts entered. Please try again.")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn available() -> Vec<String> {
        vec!["llama3:8b".to_string(), "phi3:mini".to_string(), "mistral:7b".to_string()]
    }

    fn defaults() -> Vec<String> {
        vec!["Why is the sky blue?".to_string()]
    }

    fn run_menu(answers: &str, verbose: bool) -> (Result<MenuSelection>, String) {
        let models = available();
        let mut out = Vec::new();
        let result = Menu::new(Cursor::new(answers.to_string()), &mut out, &models).run(verbose, Vec::new(), &defaults());
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_select_models_by_number() {
        let (result, out) = run_menu("a\n3, 1\ny\nA\n", false);
        let selection = result.unwrap();
        assert_eq!(
            selection.models,
            ModelChoice::Use(vec!["mistral:7b".to_string(), "llama3:8b".to_string()])
        );
        assert!(selection.verbose);
        assert_eq!(selection.prompts, defaults());
        assert!(out.contains("2. phi3:mini"));
        assert!(out.contains("Use Default prompts"));
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let (result, out) = run_menu("x\nc\nn\na\n", false);
        let selection = result.unwrap();
        assert_eq!(selection.models, ModelChoice::All);
        assert!(!selection.verbose);
        assert!(out.contains("Invalid choice"));
    }

    #[test]
    fn test_verbose_flag_skips_question() {
        let (result, out) = run_menu("B\n2\nA\n", true);
        let selection = result.unwrap();
        assert_eq!(selection.models, ModelChoice::Skip(vec!["phi3:mini".to_string()]));
        assert!(selection.verbose);
        assert!(!out.contains("Verbose?"));
    }

    #[test]
    fn test_custom_prompts_retry_until_valid() {
        let (result, out) = run_menu("C\nn\nB\n  |  \nfirst | \"second one\"\n", false);
        let selection = result.unwrap();
        assert_eq!(selection.prompts, vec!["first".to_string(), "second one".to_string()]);
        assert!(out.contains("No valid prompts entered"));
    }

    #[test]
    fn test_out_of_range_number_is_error() {
        let (result, _) = run_menu("A\n7\n", false);
        assert!(result.is_err());
    }

    #[test]
    fn test_eof_is_error() {
        let (result, _) = run_menu("", false);
        assert!(result.is_err());
    }
}
