/// Characters kept when trimming a whitespace-separated word
const WORD_JOINERS: [char; 2] = ['_', '-'];

/// Split text on whitespace and trim surrounding punctuation.
///
/// `_` and `-` survive the trim; they are handled by [`split_casing`].
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && !WORD_JOINERS.contains(&c)))
        .filter(|word| !word.is_empty())
}

/// Split an identifier into its parts.
///
/// `snake_case` keeps each underscore with the part before it (`foo_`, `bar`),
/// `kebab-case` drops the hyphens, anything else is split at lower-to-upper
/// camel case boundaries.
pub fn split_casing(word: &str) -> Vec<String> {
    if word.contains('_') {
        return word
            .split_inclusive('_')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
    }
    if word.contains('-') {
        return word
            .split('-')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for c in word.chars() {
        if previous_lower && c.is_uppercase() && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase();
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_trims_punctuation() {
        let words: Vec<&str> = split_words("// (parse_input), \"file-name\" ;").collect();
        assert_eq!(words, vec!["parse_input", "file-name"]);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(split_casing("read_config_file"), vec!["read_", "config_", "file"]);
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(split_casing("file-name"), vec!["file", "name"]);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(split_casing("parseHTTPRequest"), vec!["parse", "HTTPRequest"]);
        assert_eq!(split_casing("ConfigLoader"), vec!["Config", "Loader"]);
        assert_eq!(split_casing("word1"), vec!["word1"]);
    }
}
