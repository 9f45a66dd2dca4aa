//! Language tagging from URL structure
//!
//! Multilingual sites almost always encode language in the URL, either as a
//! path segment ("/en/about", "/nb-no/om-oss") or implicitly through the
//! domain's TLD. That makes URL inspection a cheap and surprisingly reliable
//! detector, and it needs no page text at all.

use url::Url;

/// Path segments recognized as language selectors.
const PATH_LANGUAGE_CODES: &[&str] = &[
    "en", "no", "nb", "nn", "fr", "de", "es", "it", "pt", "zh", "ja", "ru", "ar", "ko", "sv", "da",
    "fi", "nl", "pl", "cs",
];

/// TLD to most-likely site language.
const TLD_LANGUAGES: &[(&str, &str)] = &[
    (".no", "no"),
    (".se", "sv"),
    (".dk", "da"),
    (".fi", "fi"),
    (".de", "de"),
    (".fr", "fr"),
    (".es", "es"),
    (".it", "it"),
    (".pt", "pt"),
    (".nl", "nl"),
    (".be", "nl"),
    (".jp", "ja"),
    (".cn", "zh"),
    (".kr", "ko"),
    (".ru", "ru"),
    (".com", "en"),
    (".org", "en"),
    (".net", "en"),
    (".edu", "en"),
    (".gov", "en"),
];

/// The language code a path segment selects, if any.
///
/// Matches a bare code ("en") or a locale form ("en-us", "nb-no"), in which
/// case the language half wins.
pub(crate) fn segment_language(segment: &str) -> Option<&'static str> {
    let lower = segment.to_lowercase();
    for code in PATH_LANGUAGE_CODES {
        if lower == *code {
            return Some(code);
        }
        if lower.starts_with(code) && lower.as_bytes().get(code.len()) == Some(&b'-') {
            return Some(code);
        }
    }
    None
}

/// Detects page language; `None` when it cannot be determined.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, url: &Url, text: &str) -> Option<String>;
}

/// Language from URL structure only: the first language-code path segment if
/// present, else the language implied by the crawl domain's TLD.
pub struct UrlLanguageDetector {
    domain_language: Option<String>,
}

impl UrlLanguageDetector {
    /// `host` is the crawl's anchor host; its TLD supplies the fallback
    /// language for pages without a language segment. Unmapped TLDs leave
    /// the fallback empty, so those pages come back undetermined.
    pub fn for_host(host: &str) -> Self {
        let lower = host.to_lowercase();
        let domain_language = TLD_LANGUAGES
            .iter()
            .find(|(tld, _)| lower.ends_with(tld))
            .map(|(_, lang)| (*lang).to_string());
        Self { domain_language }
    }
}

impl LanguageDetector for UrlLanguageDetector {
    fn detect(&self, url: &Url, _text: &str) -> Option<String> {
        if let Some(segments) = url.path_segments() {
            for segment in segments.filter(|s| !s.is_empty()) {
                if let Some(code) = segment_language(segment) {
                    return Some(code.to_string());
                }
            }
        }
        self.domain_language.clone()
    }
}
