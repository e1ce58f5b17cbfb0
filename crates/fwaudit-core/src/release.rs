use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::scan::ScanFacts;

/// The classified facts of one firmware release package.
///
/// Every field is a display-ready string: set-valued accumulations are
/// de-duplicated, sorted case-insensitively, and joined with `", "`;
/// anything that would otherwise be empty renders as `"-"`. A `Release`
/// is built complete or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub project_id: String,
    pub project_model: String,
    pub apps_vendor: String,
    pub apps_other: String,
    pub voice_dictionary: String,
    pub voice_phrasebook: String,
    pub photo_text: String,
    pub tts_voices: String,
    pub speech_typing: String,
    pub translate_text: String,
    pub translator_packs: String,
    pub learning_pairs: String,
    pub learning_pairs_adv: String,
    pub sd_size: String,
    pub sd_translate_text: String,
    pub sd_translator_packs: String,
    pub sd_voice_dictionary: String,
    pub sd_voice_phrasebook: String,
}

impl Release {
    /// Fold accumulated scan facts into a complete record.
    pub fn from_facts(project_id: &str, facts: &ScanFacts) -> Self {
        Self {
            project_id: project_id.trim().to_string(),
            project_model: dash(facts.project_model.as_deref().unwrap_or("")),
            apps_vendor: glue(&facts.apps_vendor),
            apps_other: glue(&facts.apps_other),
            voice_dictionary: glue(&facts.voice_dictionary),
            voice_phrasebook: glue(&facts.voice_phrasebook),
            photo_text: glue(&facts.photo_text),
            tts_voices: glue(&facts.tts_voices),
            speech_typing: glue(&facts.speech_typing),
            translate_text: glue(&facts.translate_text),
            translator_packs: glue(&facts.translator_packs),
            learning_pairs: glue(&facts.learning_pairs),
            learning_pairs_adv: glue(&facts.learning_pairs_adv),
            sd_size: dash(facts.sd_size.as_deref().unwrap_or("")),
            sd_translate_text: glue(&facts.sd_translate_text),
            sd_translator_packs: glue(&facts.sd_translator_packs),
            sd_voice_dictionary: glue(&facts.sd_voice_dictionary),
            sd_voice_phrasebook: glue(&facts.sd_voice_phrasebook),
        }
    }

    /// All fields in declaration order, paired with their snapshot keys.
    pub fn fields(&self) -> [(&'static str, &str); 18] {
        [
            ("project_id", &self.project_id),
            ("project_model", &self.project_model),
            ("apps_vendor", &self.apps_vendor),
            ("apps_other", &self.apps_other),
            ("voice_dictionary", &self.voice_dictionary),
            ("voice_phrasebook", &self.voice_phrasebook),
            ("photo_text", &self.photo_text),
            ("tts_voices", &self.tts_voices),
            ("speech_typing", &self.speech_typing),
            ("translate_text", &self.translate_text),
            ("translator_packs", &self.translator_packs),
            ("learning_pairs", &self.learning_pairs),
            ("learning_pairs_adv", &self.learning_pairs_adv),
            ("sd_size", &self.sd_size),
            ("sd_translate_text", &self.sd_translate_text),
            ("sd_translator_packs", &self.sd_translator_packs),
            ("sd_voice_dictionary", &self.sd_voice_dictionary),
            ("sd_voice_phrasebook", &self.sd_voice_phrasebook),
        ]
    }
}

fn dash(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn glue(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        return "-".to_string();
    }
    let mut values: Vec<&str> = set.iter().map(String::as_str).collect();
    values.sort_by_key(|v| v.to_lowercase());
    values.join(", ")
}
