use std::path::Path;

use anyhow::Result;

use fwaudit_core::{Release, ReleaseCollection};

use crate::write_file;

const WRAP_WIDTH: usize = 70;
const INDENT: &str = "    ";

/// Render the whole collection as an indented human-readable report.
pub fn format_report(collection: &ReleaseCollection) -> String {
    let mut out = String::new();
    for release in collection.values() {
        out.push_str(&format_release(release));
    }
    out
}

pub fn export_text(collection: &ReleaseCollection, path: &Path) -> Result<()> {
    write_file(path, &format_report(collection))
}

/// One release as a titled block with wrapped application lists.
pub fn format_release(release: &Release) -> String {
    format!(
        "{id}\n{underline}\nModel: {model}\n\n\
         Vendor Applications\n-------------------\n{vendor}\n\n\
         3rd party Applications\n----------------------\n{other}\n\n\
         - Dictionary Voice: {voice_dictionary}\n\
         - PhraseBook Voice: {voice_phrasebook}\n\
         - PhotoText Langs: {photo_text}\n\
         - TTS Voices: {tts_voices}\n\
         - Speech Typing: {speech_typing}\n\
         - Translate Text: {translate_text}\n\
         - Translator Packs: {translator_packs}\n\
         - Learning Pairs: {learning_pairs}\n\
         - Learning Pairs Advanced: {learning_pairs_adv}\n\n\
         SD card\n-------\nSize: {sd_size}\n\n\
         - Translate Text: {sd_translate_text}\n\
         - Translator Packs: {sd_translator_packs}\n\
         - Dictionary Voice: {sd_voice_dictionary}\n\
         - PhraseBook Voice: {sd_voice_phrasebook}\n\n\
         *****\n\n",
        id = release.project_id,
        underline = "=".repeat(release.project_id.len()),
        model = release.project_model,
        vendor = wrap(&release.apps_vendor),
        other = wrap(&release.apps_other),
        voice_dictionary = release.voice_dictionary,
        voice_phrasebook = release.voice_phrasebook,
        photo_text = release.photo_text,
        tts_voices = release.tts_voices,
        speech_typing = release.speech_typing,
        translate_text = release.translate_text,
        translator_packs = release.translator_packs,
        learning_pairs = release.learning_pairs,
        learning_pairs_adv = release.learning_pairs_adv,
        sd_size = release.sd_size,
        sd_translate_text = release.sd_translate_text,
        sd_translator_packs = release.sd_translator_packs,
        sd_voice_dictionary = release.sd_voice_dictionary,
        sd_voice_phrasebook = release.sd_voice_phrasebook,
    )
}

// Greedy word wrap with a fixed indent on every line.
fn wrap(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > WRAP_WIDTH {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
        .iter()
        .map(|l| format!("{INDENT}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwaudit_core::scan::ScanFacts;

    #[test]
    fn test_format_release_contains_fields() {
        let mut facts = ScanFacts::default();
        facts.project_model = Some("ModelX".to_string());
        facts.translate_text.insert("English".to_string());
        let release = Release::from_facts("lux2_100.zip", &facts);
        let text = format_release(&release);
        assert!(text.starts_with("lux2_100.zip\n============\n"));
        assert!(text.contains("Model: ModelX"));
        assert!(text.contains("- Translate Text: English"));
        assert!(text.contains("SD card\n-------\nSize: -"));
    }

    #[test]
    fn test_wrap_long_app_list() {
        let mut facts = ScanFacts::default();
        for i in 0..30 {
            facts.apps_other.insert(format!("Application Number {i}"));
        }
        let release = Release::from_facts("p", &facts);
        let text = format_release(&release);
        let wrapped = text
            .lines()
            .filter(|l| l.starts_with(INDENT))
            .collect::<Vec<_>>();
        assert!(wrapped.len() > 2, "long list should wrap over lines");
        for line in wrapped {
            assert!(line.len() <= WRAP_WIDTH + INDENT.len() + 24, "overlong: {line}");
        }
    }

    #[test]
    fn test_export_text_writes_all_releases() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = ReleaseCollection::new();
        collection.insert(Release::from_facts("lux2_b.zip", &ScanFacts::default()));
        collection.insert(Release::from_facts("lux2_a.zip", &ScanFacts::default()));
        let target = dir.path().join("report.txt");
        export_text(&collection, &target).unwrap();
        let content = std::fs::read_to_string(&target).unwrap();
        let pos_a = content.find("lux2_a.zip").unwrap();
        let pos_b = content.find("lux2_b.zip").unwrap();
        assert!(pos_a < pos_b, "releases should appear in sorted key order");
    }
}
