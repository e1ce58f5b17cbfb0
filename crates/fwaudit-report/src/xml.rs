use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use fwaudit_core::error::AuditError;
use fwaudit_core::{Release, ReleaseCollection};

use crate::{escape, write_file, CSS_STYLE};

/// Fields serialized as direct children of `<release>`.
const TOP_FIELDS: &[&str] = &[
    "apps_vendor",
    "apps_other",
    "voice_dictionary",
    "voice_phrasebook",
    "photo_text",
];

/// Fields grouped under `<features>`.
const FEATURE_FIELDS: &[&str] = &[
    "tts_voices",
    "speech_typing",
    "translate_text",
    "translator_packs",
    "learning_pairs",
    "learning_pairs_adv",
];

/// Fields grouped under `<sdcard>`.
const SD_FIELDS: &[&str] = &[
    "sd_translate_text",
    "sd_translator_packs",
    "sd_voice_dictionary",
    "sd_voice_phrasebook",
];

/// Write the XML snapshot plus its generated XSLT stylesheet and the
/// shared `style.css` asset next to it.
pub fn export_xml(collection: &ReleaseCollection, path: &Path) -> Result<()> {
    let xslt_path = path.with_extension("xslt");
    let xslt_name = xslt_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "releases.xslt".to_string());
    write_file(path, &format_snapshot(collection, &xslt_name))?;
    write_file(&xslt_path, &format_stylesheet())?;
    let css_path = path.with_file_name("style.css");
    write_file(&css_path, CSS_STYLE)?;
    Ok(())
}

fn format_snapshot(collection: &ReleaseCollection, xslt_name: &str) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>",
        escape(xslt_name)
    );
    out.push_str("<releases>\n");
    for release in collection.values() {
        write_release(&mut out, release);
    }
    out.push_str("</releases>\n");
    out
}

fn write_release(out: &mut String, release: &Release) {
    let fields: std::collections::HashMap<&str, &str> = release.fields().into_iter().collect();
    let _ = writeln!(
        out,
        "  <release project_id=\"{}\" project_model=\"{}\">",
        escape(&release.project_id),
        escape(&release.project_model)
    );
    for &name in TOP_FIELDS {
        let _ = writeln!(out, "    <{name}>{}</{name}>", escape(fields[name]));
    }
    out.push_str("    <features>\n");
    for &name in FEATURE_FIELDS {
        let _ = writeln!(out, "      <{name}>{}</{name}>", escape(fields[name]));
    }
    out.push_str("    </features>\n");
    let _ = writeln!(out, "    <sdcard sd_size=\"{}\">", escape(&release.sd_size));
    for &name in SD_FIELDS {
        let _ = writeln!(out, "      <{name}>{}</{name}>", escape(fields[name]));
    }
    out.push_str("    </sdcard>\n");
    out.push_str("  </release>\n");
}

/// Rebuild a collection from an XML snapshot.
///
/// A `<release>` element missing an expected attribute or child is
/// logged and skipped.
pub fn import_xml(path: &Path) -> Result<ReleaseCollection> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot '{}'", path.display()))?;
    let doc = roxmltree::Document::parse(&content).context("failed to parse XML snapshot")?;
    let mut collection = ReleaseCollection::new();
    for node in doc
        .descendants()
        .filter(|n| n.has_tag_name("release"))
    {
        match read_release(node) {
            Ok(release) => collection.insert(release),
            Err(err) => warn!(error = %err, "partial snapshot record"),
        }
    }
    Ok(collection)
}

fn read_release(node: roxmltree::Node<'_, '_>) -> Result<Release, AuditError> {
    let id = node.attribute("project_id").unwrap_or("").to_string();
    let partial = |detail: String| AuditError::PartialRecord {
        id: id.clone(),
        detail,
    };
    if id.is_empty() {
        return Err(partial("missing attribute 'project_id'".to_string()));
    }
    let project_model = node
        .attribute("project_model")
        .ok_or_else(|| partial("missing attribute 'project_model'".to_string()))?
        .to_string();
    let sd_size = node
        .descendants()
        .find(|n| n.has_tag_name("sdcard"))
        .and_then(|n| n.attribute("sd_size"))
        .ok_or_else(|| partial("missing attribute 'sd_size'".to_string()))?
        .to_string();
    let text = |name: &str| -> Result<String, AuditError> {
        node.descendants()
            .find(|n| n.has_tag_name(name))
            .map(|n| n.text().unwrap_or("").trim().to_string())
            .ok_or_else(|| partial(format!("missing element '{name}'")))
    };
    Ok(Release {
        project_id: id.clone(),
        project_model,
        apps_vendor: text("apps_vendor")?,
        apps_other: text("apps_other")?,
        voice_dictionary: text("voice_dictionary")?,
        voice_phrasebook: text("voice_phrasebook")?,
        photo_text: text("photo_text")?,
        tts_voices: text("tts_voices")?,
        speech_typing: text("speech_typing")?,
        translate_text: text("translate_text")?,
        translator_packs: text("translator_packs")?,
        learning_pairs: text("learning_pairs")?,
        learning_pairs_adv: text("learning_pairs_adv")?,
        sd_size,
        sd_translate_text: text("sd_translate_text")?,
        sd_translator_packs: text("sd_translator_packs")?,
        sd_voice_dictionary: text("sd_voice_dictionary")?,
        sd_voice_phrasebook: text("sd_voice_phrasebook")?,
    })
}

fn format_stylesheet() -> String {
    let header_cells = [
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
    ]
    .iter()
    .map(|(class, label)| format!("        <td class=\"{class}\">{label}</td>"))
    .collect::<Vec<_>>()
    .join("\n");

    let field_templates = TOP_FIELDS
        .iter()
        .map(|name| {
            format!(
                "<xsl:template match=\"{name}\">\n    <td><xsl:value-of select=\".\"/></td>\n</xsl:template>"
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let feature_cells = FEATURE_FIELDS
        .iter()
        .map(|name| format!("    <td><xsl:value-of select=\"./{name}\"/></td>"))
        .collect::<Vec<_>>()
        .join("\n");

    let sd_cells = SD_FIELDS
        .iter()
        .map(|name| format!("    <td class=\"dimmed\"><xsl:value-of select=\"./{name}\"/></td>"))
        .collect::<Vec<_>>()
        .join("\n");

    let apply_fields = TOP_FIELDS
        .iter()
        .map(|name| format!("        <xsl:apply-templates select=\"{name}\"/>"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<xsl:stylesheet version="1.0"
    xmlns:xsl="http://www.w3.org/1999/XSL/Transform"
    xmlns="http://www.w3.org/1999/xhtml">
<xsl:output method="xml" indent="yes"
    doctype-public="-//W3C//DTD XHTML 1.0 Strict//EN"
    doctype-system="http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"/>
<xsl:template match="/">
    <html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en" lang="en">
        <head>
            <meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
            <title>Releases</title>
            <link rel="stylesheet" type="text/css" href="style.css" />
        </head>
        <body>
            <table>
                <xsl:apply-templates/>
            </table>
        </body>
    </html>
</xsl:template>
<xsl:template match="releases/*">
    <tr>
{header_cells}
    </tr>
    <tr>
        <td><xsl:value-of select="@project_id"/></td>
        <td><xsl:value-of select="@project_model"/></td>
{apply_fields}
        <xsl:apply-templates select="features"/>
        <xsl:apply-templates select="sdcard"/>
    </tr>
</xsl:template>
{field_templates}
<xsl:template match="features">
{feature_cells}
</xsl:template>
<xsl:template match="sdcard">
    <td class="dimmed"><xsl:value-of select="@sd_size"/></td>
{sd_cells}
</xsl:template>
</xsl:stylesheet>
"#
    )
}
