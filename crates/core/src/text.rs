//! Character-class helpers shared by the detectors.

/// Title case: every cased run starts with an uppercase letter followed only
/// by lowercase letters, and at least one cased character exists.
pub fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut prev_cased = false;

    for c in text.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else {
            prev_cased = false;
        }
    }

    cased
}

/// At least one cased character and no lowercase ones.
pub fn is_all_uppercase(text: &str) -> bool {
    text.chars().any(|c| c.is_uppercase()) && !text.chars().any(|c| c.is_lowercase())
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert!(is_title_case("Foundation Level Extensions"));
        assert!(is_title_case("1. Introduction"));
        assert!(is_title_case("Overview"));
        assert!(!is_title_case("Foundation level"));
        assert!(!is_title_case("CHAPTER ONE"));
        assert!(!is_title_case("123"));
    }

    #[test]
    fn test_title_case_after_punctuation() {
        assert!(is_title_case("Risk-Based Testing"));
        assert!(!is_title_case("Risk-based Testing"));
    }

    #[test]
    fn test_all_uppercase() {
        assert!(is_all_uppercase("CHAPTER 1 INTRODUCTION"));
        assert!(!is_all_uppercase("Chapter 1"));
        assert!(!is_all_uppercase("2024"));
    }

    #[test]
    fn test_counts() {
        assert_eq!(word_count("  two   words "), 2);
        assert_eq!(char_count("café"), 4);
    }
}
