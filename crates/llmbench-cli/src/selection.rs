use anyhow::{bail, Result};

pub const PROMPT_SEPARATOR: char = '|';

/// Filter `available` down to the models to benchmark, keeping its order.
pub fn select_models(available: &[String], use_models: &[String], skip_models: &[String]) -> Result<Vec<String>> {
    if !use_models.is_empty() && !skip_models.is_empty() {
        bail!("Cannot provide both 'Models to use' and 'Models to skip' at the same time");
    }

    let selected = available
        .iter()
        .filter(|m| use_models.is_empty() || use_models.contains(m))
        .filter(|m| !skip_models.contains(m))
        .cloned()
        .collect();

    Ok(selected)
}

/// Parse a comma separated list of 1-based model numbers, e.g. `1, 3,4`.
pub fn parse_indices(input: &str, max: usize) -> Result<Vec<usize>> {
    let input: String = input.chars().filter(|c| *c != ' ').collect();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit() || c == ',') {
        bail!("Invalid input. Please enter only digits and commas.");
    }

    input
        .split(',')
        .map(|part| -> Result<usize> {
            let index: usize = part
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid input. Please enter only digits and commas."))?;
            if index == 0 || index > max {
                bail!("Invalid selection '{}'. Use 1-{}", index, max);
            }
            Ok(index)
        })
        .collect()
}

pub fn models_at(available: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|i| i.checked_sub(1).and_then(|i| available.get(i)))
        .cloned()
        .collect()
}

/// Split `|`-separated prompts, trimming whitespace and surrounding quotes.
pub fn parse_custom_prompts(input: &str) -> Vec<String> {
    input
        .split(PROMPT_SEPARATOR)
        .map(|p| p.trim().trim_matches('"'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_use_keeps_available_order() {
        let available = names(&["a", "b", "c"]);
        let selected = select_models(&available, &names(&["c", "a", "missing"]), &[]).unwrap();
        assert_eq!(selected, names(&["a", "c"]));
    }

    #[test]
    fn test_select_skip() {
        let available = names(&["a", "b", "c"]);
        let selected = select_models(&available, &[], &names(&["b"])).unwrap();
        assert_eq!(selected, names(&["a", "c"]));
    }

    #[test]
    fn test_select_without_filters_is_everything() {
        let available = names(&["a", "b"]);
        assert_eq!(select_models(&available, &[], &[]).unwrap(), available);
    }

    #[test]
    fn test_select_use_and_skip_conflict() {
        let available = names(&["a"]);
        assert!(select_models(&available, &names(&["a"]), &names(&["a"])).is_err());
    }

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("1, 3,2", 3).unwrap(), vec![1, 3, 2]);
        assert!(parse_indices("0", 3).is_err());
        assert!(parse_indices("4", 3).is_err());
        assert!(parse_indices("1;2", 3).is_err());
        assert!(parse_indices("1,,2", 3).is_err());
        assert!(parse_indices("", 3).is_err());
    }

    #[test]
    fn test_models_at() {
        let available = names(&["a", "b", "c"]);
        assert_eq!(models_at(&available, &[3, 1]), names(&["c", "a"]));
    }

    #[test]
    fn test_parse_custom_prompts() {
        let prompts = parse_custom_prompts(r#" prompt1 | "prompt 2" ||  prompt3 "#);
        assert_eq!(prompts, names(&["prompt1", "prompt 2", "prompt3"]));
        assert!(parse_custom_prompts(" | \"\" ").is_empty());
    }
}
