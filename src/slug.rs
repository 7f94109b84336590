/// slugify
///
/// Derives the URL key for an author or article: lower-cased, spaces replaced by
/// hyphens. Deterministic and without collision handling, so two entities with the
/// same name map to the same slug and the second insert hits the unique index.
pub fn slugify(input: &str) -> String {
    input.to_lowercase().replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Article 1"), "article-1");
        assert_eq!(slugify("John Tavener"), "john-tavener");
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(slugify("Same Title Twice"), slugify("Same Title Twice"));
    }

    #[test]
    fn keeps_other_characters() {
        // Only spaces are rewritten; punctuation passes through.
        assert_eq!(slugify("Rust: A Tour"), "rust:-a-tour");
        assert_eq!(slugify("two  spaces"), "two--spaces");
    }
}
