use serde::Serialize;
use std::fmt;

/// More Arabic characters than this and the query is answered in Arabic.
const ARABIC_CHAR_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Arabic => "ar",
            Language::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn is_arabic(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

/// Guesses the reply language from the number of Arabic-block characters.
pub fn detect_language(text: &str) -> Language {
    let arabic_chars = text.chars().filter(|c| is_arabic(*c)).count();
    if arabic_chars > ARABIC_CHAR_THRESHOLD {
        Language::Arabic
    } else {
        Language::English
    }
}
