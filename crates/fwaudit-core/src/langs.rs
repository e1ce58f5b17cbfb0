use std::collections::HashMap;

/// One language known to the device line.
///
/// The numeric id follows the legacy device convention and is what voice
/// data files embed in their names; the short code is the 3-letter form
/// used by OCR training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LangEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub id: u32,
    pub short: &'static str,
}

impl LangEntry {
    /// Display name with the first letter capitalized ("english" -> "English").
    pub fn title_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Sentinel returned for unrecognized codes.
pub const UNKNOWN: LangEntry = LangEntry {
    code: "??",
    name: "unknown",
    id: 0,
    short: "xxx",
};

const LANGS: &[LangEntry] = &[
    LangEntry { code: "ar", name: "arabic", id: 1, short: "ara" },
    LangEntry { code: "bg", name: "bulgarian", id: 2, short: "bul" },
    LangEntry { code: "bs", name: "bosnian", id: 46, short: "bos" },
    LangEntry { code: "cs", name: "czech", id: 5, short: "cze" },
    LangEntry { code: "da", name: "danish", id: 6, short: "dan" },
    LangEntry { code: "de", name: "german", id: 7, short: "deu" },
    LangEntry { code: "el", name: "greek", id: 8, short: "gre" },
    LangEntry { code: "en", name: "english", id: 9, short: "eng" },
    LangEntry { code: "es", name: "spanish", id: 10, short: "spa" },
    LangEntry { code: "et", name: "estonian", id: 37, short: "est" },
    LangEntry { code: "fa", name: "farsi", id: 41, short: "far" },
    LangEntry { code: "fi", name: "finnish", id: 11, short: "fin" },
    LangEntry { code: "fr", name: "french", id: 12, short: "fre" },
    LangEntry { code: "he", name: "hebrew", id: 13, short: "heb" },
    LangEntry { code: "hi", name: "hindi", id: 57, short: "hin" },
    LangEntry { code: "hr", name: "croatian", id: 49, short: "cro" },
    LangEntry { code: "hu", name: "hungarian", id: 14, short: "hun" },
    LangEntry { code: "hy", name: "armenian", id: 43, short: "arm" },
    LangEntry { code: "id", name: "indonesian", id: 33, short: "ind" },
    LangEntry { code: "it", name: "italian", id: 16, short: "ita" },
    LangEntry { code: "ja", name: "japanese", id: 17, short: "jap" },
    LangEntry { code: "ko", name: "korean", id: 18, short: "kor" },
    LangEntry { code: "lt", name: "lithuanian", id: 39, short: "lit" },
    LangEntry { code: "lv", name: "latvian", id: 38, short: "lat" },
    LangEntry { code: "nl", name: "dutch", id: 19, short: "dut" },
    LangEntry { code: "nn", name: "norwegian", id: 20, short: "nno" },
    LangEntry { code: "pl", name: "polish", id: 21, short: "pol" },
    LangEntry { code: "pt", name: "portuguese", id: 22, short: "por" },
    LangEntry { code: "ro", name: "romanian", id: 24, short: "rom" },
    LangEntry { code: "ru", name: "russian", id: 25, short: "rus" },
    LangEntry { code: "sk", name: "slovak", id: 27, short: "svk" },
    LangEntry { code: "sq", name: "albanian", id: 28, short: "alb" },
    LangEntry { code: "sr", name: "serbian", id: 66, short: "srb" },
    LangEntry { code: "sv", name: "swedish", id: 29, short: "swe" },
    LangEntry { code: "th", name: "thai", id: 30, short: "tha" },
    LangEntry { code: "tl", name: "tagalog", id: 53, short: "tgl" },
    LangEntry { code: "tr", name: "turkish", id: 31, short: "tur" },
    LangEntry { code: "uk", name: "ukrainian", id: 34, short: "ukr" },
    LangEntry { code: "vi", name: "vietnamese", id: 42, short: "vie" },
    LangEntry { code: "zh", name: "chinese", id: 4, short: "chi" },
];

/// Historical 2-letter variants still found in release data.
const ALIASES: &[(&str, &str)] = &[("iw", "he"), ("jp", "ja"), ("ua", "uk"), ("us", "en")];

/// Lookup over the device line's language table.
///
/// `by_code` is total: any unrecognized code resolves to [`UNKNOWN`]
/// rather than failing. The reverse indexes over numeric and short codes
/// are partial and cover canonical entries only.
#[derive(Debug)]
pub struct LangRegistry {
    by_code: HashMap<&'static str, &'static LangEntry>,
    by_id: HashMap<u32, &'static LangEntry>,
    by_short: HashMap<&'static str, &'static LangEntry>,
}

impl LangRegistry {
    pub fn new() -> Self {
        let mut by_code = HashMap::new();
        let mut by_id = HashMap::new();
        let mut by_short = HashMap::new();
        for entry in LANGS {
            by_code.insert(entry.code, entry);
            by_id.insert(entry.id, entry);
            by_short.insert(entry.short, entry);
        }
        for &(alias, canonical) in ALIASES {
            let entry = by_code[canonical];
            by_code.insert(alias, entry);
        }
        Self {
            by_code,
            by_id,
            by_short,
        }
    }

    /// Resolve a 2-letter code, falling back to the unknown sentinel.
    pub fn by_code(&self, code: &str) -> &LangEntry {
        self.by_code
            .get(code.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(&UNKNOWN)
    }

    /// True if `code` is a known 2-letter code or alias.
    pub fn is_code(&self, code: &str) -> bool {
        self.by_code.contains_key(code.to_ascii_lowercase().as_str())
    }

    pub fn by_numeric_id(&self, id: u32) -> Option<&LangEntry> {
        self.by_id.get(&id).copied()
    }

    pub fn by_short_code(&self, short: &str) -> Option<&LangEntry> {
        self.by_short
            .get(short.to_ascii_lowercase().as_str())
            .copied()
    }
}

impl Default for LangRegistry {
    fn default() -> Self {
        Self::new()
    }
}
