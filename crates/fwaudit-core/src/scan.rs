//! Directory tree classification.
//!
//! One engine walks an expanded package tree and updates a mutable
//! accumulator of named feature sets. All classification rules are data:
//! compiled patterns here, application tables in [`crate::apps`], both
//! resolved through the language registry. Nested containers and disk
//! images recurse through the expander and mounter with a bounded depth;
//! a failed nested extraction never aborts the enclosing scan.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::apps::{AppClass, AppRules};
use crate::config::Config;
use crate::error::AuditError;
use crate::expand::Expander;
use crate::langs::LangRegistry;
use crate::scratch::{ImageMount, ScratchDir};
use crate::tools::ToolSet;

/// Compiled file-name patterns for language-bearing data files.
#[derive(Debug)]
pub struct Patterns {
    translate_txt: Regex,
    translator_s2s: Regex,
    voice_dictionary: Regex,
    voice_phrasebook: Regex,
    tts_pil: Regex,
    learning_pair: Regex,
}

impl Patterns {
    pub fn new() -> Self {
        Self {
            translate_txt: Regex::new(r"c_(\w\w)_(\w\w)\.txt").expect("pattern compiles"),
            translator_s2s: Regex::new(r"s2s-mob-(\w\w).{4}(\w\w).{9}\.s2s")
                .expect("pattern compiles"),
            voice_dictionary: Regex::new(r"db_(\d\d?)_.+\.snd").expect("pattern compiles"),
            voice_phrasebook: Regex::new(r"phr_(\d\d)\.snd").expect("pattern compiles"),
            tts_pil: Regex::new(r"svox-.{6}(\w\w).{5}\.pil").expect("pattern compiles"),
            learning_pair: Regex::new(r"DATA(\d\d)_(\d\d)").expect("pattern compiles"),
        }
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable accumulator of everything one scan observes.
///
/// Set-valued buckets collapse duplicates; SD-tagged buckets stay
/// distinct from their main-package counterparts and are never merged.
#[derive(Debug, Default)]
pub struct ScanFacts {
    pub project_model: Option<String>,
    pub sd_size: Option<String>,
    pub apps_vendor: BTreeSet<String>,
    pub apps_other: BTreeSet<String>,
    pub voice_dictionary: BTreeSet<String>,
    pub voice_phrasebook: BTreeSet<String>,
    pub photo_text: BTreeSet<String>,
    pub tts_voices: BTreeSet<String>,
    pub speech_typing: BTreeSet<String>,
    pub translate_text: BTreeSet<String>,
    pub translator_packs: BTreeSet<String>,
    pub learning_pairs: BTreeSet<String>,
    pub learning_pairs_adv: BTreeSet<String>,
    pub sd_translate_text: BTreeSet<String>,
    pub sd_translator_packs: BTreeSet<String>,
    pub sd_voice_dictionary: BTreeSet<String>,
    pub sd_voice_phrasebook: BTreeSet<String>,
}

/// Walks expanded trees and classifies what it finds.
#[derive(Debug)]
pub struct Scanner {
    registry: LangRegistry,
    patterns: Patterns,
    rules: AppRules,
    tools: ToolSet,
    max_depth: usize,
}

impl Scanner {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: LangRegistry::new(),
            patterns: Patterns::new(),
            rules: AppRules::new(&config.apps),
            tools: ToolSet::new(&config.tools),
            max_depth: config.scan.max_depth,
        }
    }

    pub fn registry(&self) -> &LangRegistry {
        &self.registry
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Scan an expanded package tree from the top.
    pub fn scan(&self, root: &Path, facts: &mut ScanFacts) {
        self.scan_tree(root, facts, false, 0);
    }

    fn scan_tree(&self, root: &Path, facts: &mut ScanFacts, sd: bool, depth: usize) {
        let walk = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "unreadable entry skipped");
                    None
                }
            });
        for entry in walk {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().is_dir() {
                self.classify_dir(entry.path(), &name, facts);
            } else if entry.file_type().is_file() {
                if !self.enter_container(entry.path(), &name, facts, sd, depth) {
                    self.classify_file(entry.path(), &name, facts, sd);
                }
            }
        }
    }

    /// Recurse into a nested container or image. Returns true when the
    /// entry was one, whether or not descending into it worked.
    fn enter_container(
        &self,
        path: &Path,
        name: &str,
        facts: &mut ScanFacts,
        sd: bool,
        depth: usize,
    ) -> bool {
        let lower = name.to_ascii_lowercase();
        let is_image = matches!(lower.as_str(), "system.img" | "userdata.img" | "ext.img");
        let is_sd_container = matches!(lower.as_str(), "sdcard.zip" | "sdcard.7z")
            || lower.ends_with(".tar.gz")
            || lower.ends_with(".tgz");
        if !is_image && !is_sd_container {
            return false;
        }
        if depth >= self.max_depth {
            warn!(
                container = %path.display(),
                max_depth = self.max_depth,
                "recursion bound reached, skipping nested container"
            );
            return true;
        }
        if is_image {
            // Internal partition: the SD flag stays unset inside.
            match ImageMount::mount(path, &self.tools) {
                Ok(mount) => self.scan_tree(mount.path(), facts, false, depth + 1),
                Err(e) => {
                    warn!(image = %path.display(), error = %e, "skipping unmountable image")
                }
            }
        } else {
            match self.expand_nested(path) {
                Ok(scratch) => {
                    self.scan_tree(scratch.path(), facts, true, depth + 1);
                    if !sd {
                        let size = dir_size(scratch.path());
                        facts.sd_size = Some(format!("{:.2} GB", size as f64 / 1e9));
                    }
                }
                Err(e) => {
                    warn!(container = %path.display(), error = %e, "skipping nested container")
                }
            }
        }
        true
    }

    fn expand_nested(&self, archive: &Path) -> Result<ScratchDir, AuditError> {
        let scratch = ScratchDir::new()?;
        Expander::new(&self.tools).unpack(archive, scratch.path())?;
        Ok(scratch)
    }

    fn classify_file(&self, path: &Path, name: &str, facts: &mut ScanFacts, sd: bool) {
        let lower = name.to_ascii_lowercase();
        if lower == "build.prop" {
            // First match wins; later build.prop files never overwrite.
            if facts.project_model.is_none() {
                facts.project_model = read_product_model(path);
            }
        } else if lower.ends_with(".apk") {
            match self.rules.classify(name) {
                Some(AppClass::Vendor(label)) => {
                    facts.apps_vendor.insert(label);
                }
                Some(AppClass::ThirdParty(label)) => {
                    facts.apps_other.insert(label);
                }
                None => {}
            }
        } else if lower.ends_with(".txt") {
            if let Some(caps) = self.patterns.translate_txt.captures(name) {
                let bucket = if sd {
                    &mut facts.sd_translate_text
                } else {
                    &mut facts.translate_text
                };
                for idx in 1..=2 {
                    bucket.insert(self.registry.by_code(&caps[idx]).title_name());
                }
            }
        } else if lower.ends_with(".s2s") {
            if let Some(caps) = self.patterns.translator_s2s.captures(name) {
                let bucket = if sd {
                    &mut facts.sd_translator_packs
                } else {
                    &mut facts.translator_packs
                };
                for idx in 1..=2 {
                    bucket.insert(self.registry.by_code(&caps[idx]).title_name());
                }
            }
        } else if lower.ends_with(".pil") {
            if let Some(caps) = self.patterns.tts_pil.captures(name) {
                facts
                    .tts_voices
                    .insert(self.registry.by_code(&caps[1]).title_name());
            }
        } else if lower.ends_with(".snd") {
            if let Some(lang) = self.numeric_lang(&self.patterns.voice_dictionary, name) {
                let bucket = if sd {
                    &mut facts.sd_voice_dictionary
                } else {
                    &mut facts.voice_dictionary
                };
                bucket.insert(lang);
            }
            if let Some(lang) = self.numeric_lang(&self.patterns.voice_phrasebook, name) {
                let bucket = if sd {
                    &mut facts.sd_voice_phrasebook
                } else {
                    &mut facts.voice_phrasebook
                };
                bucket.insert(lang);
            }
        } else if lower.ends_with(".traineddata") {
            let stem = &name[..name.len() - ".traineddata".len()];
            let prefix: String = stem.chars().take(3).collect();
            if prefix.chars().count() == 3 {
                if let Some(entry) = self.registry.by_short_code(&prefix) {
                    facts.photo_text.insert(entry.title_name());
                }
            }
        }
    }

    fn classify_dir(&self, path: &Path, name: &str, facts: &mut ScanFacts) {
        let lower = name.to_ascii_lowercase();
        if lower == "srec" {
            for child in list_child_names(path) {
                let prefix = child.split('-').next().unwrap_or(&child);
                if self.registry.is_code(prefix) {
                    facts
                        .speech_typing
                        .insert(self.registry.by_code(prefix).title_name());
                }
            }
        } else if lower == "ulearn" || lower == "ulearn2" {
            for child in list_child_names(path) {
                if let Some(pair) = self.learning_pair(&child) {
                    if lower == "ulearn" {
                        facts.learning_pairs.insert(pair);
                    } else {
                        facts.learning_pairs_adv.insert(pair);
                    }
                }
            }
        }
    }

    // Resolve a numeric-id capture through the reverse registry index.
    // Ids outside the table contribute nothing.
    fn numeric_lang(&self, pattern: &Regex, name: &str) -> Option<String> {
        let caps = pattern.captures(name)?;
        let id: u32 = caps[1].parse().ok()?;
        self.registry.by_numeric_id(id).map(|e| e.title_name())
    }

    fn learning_pair(&self, child: &str) -> Option<String> {
        let caps = self.patterns.learning_pair.captures(child)?;
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let first = self.registry.by_numeric_id(first)?;
        let second = self.registry.by_numeric_id(second)?;
        Some(format!("{}-{}", first.title_name(), second.title_name()))
    }
}

fn read_product_model(path: &Path) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            info!(file = %path.display(), error = %e, "unreadable build.prop");
            return None;
        }
    };
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("ro.product.model=") {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn list_child_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "unreadable directory skipped");
            Vec::new()
        }
    };
    names.sort();
    names
}

/// Aggregate byte size of all files under `path`.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
