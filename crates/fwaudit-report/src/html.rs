use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use fwaudit_core::collection::is_package_name;
use fwaudit_core::config::Config;
use fwaudit_core::{Release, ReleaseCollection};

use crate::{escape, write_file, CSS_STYLE};

const HEADERS: &[(&str, &str)] = &[
    ("header", "No."),
    ("header", "File Name"),
    ("header", "Model"),
    ("header", "Vendor Applications"),
    ("header", "3rd party Applications"),
    ("header", "Dictionary Voice"),
    ("header", "PhraseBook Voice"),
    ("header", "PhotoText Langs"),
    ("header", "TTS Voices"),
    ("header", "Speech Typing"),
    ("header", "Translate Text"),
    ("header", "Translator Packs"),
    ("header", "Learning Pairs"),
    ("header", "Learning Pairs Advanced"),
    ("header2", "SD: card Size"),
    ("header", "SD: Translate Text"),
    ("header", "SD: Translator Packs"),
    ("header", "SD: Dictionary Voice"),
    ("header", "SD: PhraseBook Voice"),
];

/// Render the collection as a styled summary table.
pub fn format_page(collection: &ReleaseCollection, config: &Config) -> String {
    let mut out = String::new();
    out.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
         \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"en\" xml:lang=\"en\">\n\
         <head><title>Release Summary</title>\n\
         <meta http-equiv=\"content-type\" content=\"text/html; charset=utf-8\" />\n\
         <style>\n",
    );
    out.push_str(CSS_STYLE);
    out.push_str("</style></head><body>\n<h3>Release Summary</h3>\n<table>\n<tr>\n");
    for (class, label) in HEADERS {
        let _ = writeln!(out, "<td class=\"{class}\">{label}</td>");
    }
    out.push_str("</tr>\n");
    for (index, release) in collection.values().enumerate() {
        write_row(&mut out, index + 1, release, config);
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

pub fn export_html(collection: &ReleaseCollection, path: &Path, config: &Config) -> Result<()> {
    write_file(path, &format_page(collection, config))
}

fn write_row(out: &mut String, index: usize, release: &Release, config: &Config) {
    let _ = writeln!(out, "<tr>\n<td align=\"right\">{index}</td>");
    let _ = writeln!(out, "<td>{}</td>", name_cell(release, config));
    for field in [
        &release.project_model,
        &release.apps_vendor,
        &release.apps_other,
        &release.voice_dictionary,
        &release.voice_phrasebook,
        &release.photo_text,
        &release.tts_voices,
        &release.speech_typing,
        &release.translate_text,
        &release.translator_packs,
        &release.learning_pairs,
        &release.learning_pairs_adv,
    ] {
        let _ = writeln!(out, "<td>{}</td>", escape(field));
    }
    let _ = writeln!(
        out,
        "<td align=\"center\" class=\"dimmed\">{}</td>",
        escape(&release.sd_size)
    );
    for field in [
        &release.sd_translate_text,
        &release.sd_translator_packs,
        &release.sd_voice_dictionary,
        &release.sd_voice_phrasebook,
    ] {
        let _ = writeln!(out, "<td class=\"dimmed\">{}</td>", escape(field));
    }
    out.push_str("</tr>\n");
}

// The file-name cell links to the release repository when a base URL is
// configured and the id follows the package naming convention.
fn name_cell(release: &Release, config: &Config) -> String {
    let id = escape(&release.project_id);
    match &config.packages.link_base_url {
        Some(base) if is_package_name(&release.project_id, &config.packages.prefixes) => {
            format!(
                "<a href=\"{}/{}\">{}</a>",
                escape(base.trim_end_matches('/')),
                id,
                id
            )
        }
        _ => id,
    }
}
