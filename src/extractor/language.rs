use whatlang::{Lang, detect};

const MIN_DETECTION_CONFIDENCE: f64 = 0.25;
const MIN_TEXT_LENGTH: usize = 50;

/// Guesses the language of a body text as a two-letter code.
///
/// Short or ambiguous text yields `None`.
pub fn detect_language(text: &str) -> Option<String> {
    if text.trim().chars().count() < MIN_TEXT_LENGTH {
        return None;
    }

    let info = detect(text)?;
    if info.confidence() < MIN_DETECTION_CONFIDENCE {
        return None;
    }
    Some(lang_to_code(info.lang()))
}

/// Like [`detect_language`], falling back to `default_language`.
pub fn detect_language_or(text: &str, default_language: &str) -> String {
    detect_language(text).unwrap_or_else(|| default_language.to_string())
}

fn lang_to_code(lang: Lang) -> String {
    let code = match lang {
        Lang::Kor => "ko",
        Lang::Eng => "en",
        Lang::Jpn => "ja",
        Lang::Cmn => "zh",
        Lang::Rus => "ru",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Swe => "sv",
        Lang::Vie => "vi",
        Lang::Tha => "th",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        // whatlang's own ISO 639-3 code for the long tail
        other => return other.code().to_string(),
    };
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_english() {
        let text = "This is a test of the English language detection system. It should work well.";
        assert_eq!(detect_language(text), Some("en".to_string()));
    }

    #[test]
    fn test_detect_korean() {
        let text = "이 문서는 한국어 언어 감지 기능을 확인하기 위한 예제 문장입니다. 충분히 긴 문장이 필요합니다. 오늘은 날씨가 정말 좋습니다.";
        assert_eq!(detect_language(text), Some("ko".to_string()));
    }

    #[test]
    fn test_short_text_uses_default() {
        assert_eq!(detect_language("Short"), None);
        assert_eq!(detect_language_or("Short", "ko"), "ko");
    }

    #[test]
    fn test_symbols_only_returns_none() {
        let text =
            "1 2 3 4 5 6 7 8 9 0 ! @ # $ % ^ & * ( ) - = + [ ] { } | \\ : ; \" ' < > , . ? /";
        assert_eq!(detect_language(text), None);
    }
}
