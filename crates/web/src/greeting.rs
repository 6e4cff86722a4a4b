//! Greeting for the `/api/:name` route

/// Upper-case the first character and leave the rest alone
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `Hello, <Name>!`
pub fn greet(name: &str) -> String {
    format!("Hello, {}!", capitalize_first(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("john", "Hello, John!" ; "lowercase")]
    #[test_case("alice", "Hello, Alice!" ; "alice")]
    #[test_case("bob", "Hello, Bob!" ; "bob")]
    #[test_case("MARY", "Hello, MARY!" ; "already uppercase")]
    #[test_case("123test", "Hello, 123test!" ; "leading digit")]
    #[test_case("a", "Hello, A!" ; "single character")]
    #[test_case("test-name", "Hello, Test-name!" ; "hyphenated")]
    #[test_case("test_name", "Hello, Test_name!" ; "underscored")]
    #[test_case("123", "Hello, 123!" ; "numeric")]
    #[test_case("mIxEd", "Hello, MIxEd!" ; "rest untouched")]
    fn test_greet(name: &str, expected: &str) {
        assert_eq!(greet(name), expected);
    }

    #[test]
    fn test_capitalize_empty_and_multibyte() {
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("élodie"), "Élodie");
    }
}
