//! Language codes.
//!
//! Configuration accepts ISO 639-1 (`fr`) and ISO 639-3 (`fra`) codes. Both
//! resolve to the same [`whatlang::Lang`], and the canonical form is the
//! shortest code known for it.

use whatlang::Lang;

/// ISO 639-1 to ISO 639-3 for the languages whatlang knows.
const ISO_639_1: &[(&str, &str)] = &[
    ("af", "afr"),
    ("ak", "aka"),
    ("am", "amh"),
    ("ar", "ara"),
    ("az", "aze"),
    ("be", "bel"),
    ("bg", "bul"),
    ("bn", "ben"),
    ("ca", "cat"),
    ("cs", "ces"),
    ("cy", "cym"),
    ("da", "dan"),
    ("de", "deu"),
    ("el", "ell"),
    ("en", "eng"),
    ("eo", "epo"),
    ("es", "spa"),
    ("et", "est"),
    ("fa", "pes"),
    ("fi", "fin"),
    ("fr", "fra"),
    ("gu", "guj"),
    ("he", "heb"),
    ("hi", "hin"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("hy", "hye"),
    ("id", "ind"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("jv", "jav"),
    ("ka", "kat"),
    ("km", "khm"),
    ("kn", "kan"),
    ("ko", "kor"),
    ("la", "lat"),
    ("lt", "lit"),
    ("lv", "lav"),
    ("mk", "mkd"),
    ("ml", "mal"),
    ("mr", "mar"),
    ("my", "mya"),
    ("ne", "nep"),
    ("nl", "nld"),
    ("nb", "nob"),
    ("or", "ori"),
    ("pa", "pan"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ro", "ron"),
    ("ru", "rus"),
    ("si", "sin"),
    ("sk", "slk"),
    ("sl", "slv"),
    ("sn", "sna"),
    ("sr", "srp"),
    ("sv", "swe"),
    ("ta", "tam"),
    ("te", "tel"),
    ("th", "tha"),
    ("tk", "tuk"),
    ("tl", "tgl"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("ur", "urd"),
    ("uz", "uzb"),
    ("vi", "vie"),
    ("yi", "yid"),
    ("zh", "cmn"),
    ("zu", "zul"),
];

/// Resolve a configured code, case-insensitively.
#[must_use]
pub fn lookup(code: &str) -> Option<Lang> {
    let code = code.trim().to_lowercase();
    let three = ISO_639_1
        .iter()
        .find(|(two, _)| *two == code)
        .map_or(code.as_str(), |&(_, three)| three);
    Lang::from_code(three)
}

/// Shortest code for a language.
#[must_use]
pub fn code_of(lang: Lang) -> String {
    let three = lang.code();
    ISO_639_1
        .iter()
        .find(|(_, t)| *t == three)
        .map_or(three, |&(two, _)| two)
        .to_string()
}

/// Canonical form of a code, or `None` when the language is unknown.
#[must_use]
pub fn canonical(code: &str) -> Option<String> {
    lookup(code).map(code_of)
}
