use std::collections::{HashMap, HashSet};

use crate::config::AppsConfig;

/// System packages that never count as an installed application.
const DENY: &[&str] = &[
    "AccountAndSyncSettings.apk",
    "ApplicationsProvider.apk",
    "AppWizardService.apk",
    "AtciService.apk",
    "BackupRestoreConfirmation.apk",
    "BackupTransport.apk",
    "BasicDreams.apk",
    "CalendarImporter.apk",
    "CalendarProvider.apk",
    "CDS_INFO.apk",
    "CertInstaller.apk",
    "com.android.backupconfirm",
    "ConnectivityManagerTest.apk",
    "Contacts.apk",
    "ContactsProvider.apk",
    "DefaultContainerService.apk",
    "Development.apk",
    "dm.apk",
    "DownloadProvider.apk",
    "DrmProvider.apk",
    "EctacoLiveWallpaper.apk",
    "EctacoLiveWallpaper_ics.apk",
    "EngineerCode.apk",
    "EngineerMode.apk",
    "EngineerModeSim.apk",
    "Exchange.apk",
    "FBReaderJ-plugin-tts.apk",
    "framework-res.apk",
    "FusedLocation.apk",
    "Galaxy4.apk",
    "GestureBuilder.apk",
    "GmsCore.apk",
    "go.apk",
    "GoogleBackupTransport.apk",
    "GoogleContactsSyncAdapter.apk",
    "GoogleEars.apk",
    "GoogleLoginService.apk",
    "GoogleLoginServiceICS",
    "GoogleLoginServiceICS.apk",
    "GooglePartnerSetup.apk",
    "GoogleQuickSearchBox.apk",
    "GoogleQuickSearchBoxJB.apk",
    "GoogleServicesFramework.apk",
    "GoogleServicesFrameworkICS.apk",
    "HoloSpiralWallpaper.apk",
    "HTMLViewer.apk",
    "InputDevices.apk",
    "KeyChain.apk",
    "LatinIME.apk",
    "LatinImeDictionaryPack.apk",
    "Launcher2.apk",
    "LiveWallpapers.apk",
    "LiveWallpapersPicker.apk",
    "LuxChk.apk",
    "LuxTtsService.apk",
    "MagicSmokeWallpapers.apk",
    "MediaProvider.apk",
    "mediatek-res.apk",
    "MediaTekLocationProvider.apk",
    "MTKAndroidSuiteDaemon.apk",
    "MtkBt.apk",
    "MtkVideoLiveWallpaper.apk",
    "MtkWorldClockWidget.apk",
    "MusicFX.apk",
    "NoiseField.apk",
    "PackageInstaller.apk",
    "PhaseBeam.apk",
    "PicoTts.apk",
    "Protips.apk",
    "Provision.apk",
    "QuickSearchBox.apk",
    "RootExplorer.apk",
    "SettingsProvider.apk",
    "SetupWizard.apk",
    "SharedStorageBackup.apk",
    "Stk1.apk",
    "Stk2.apk",
    "Superuser.apk",
    "SystemUI.apk",
    "TelephonyProvider.apk",
    "theme-res-mint.apk",
    "theme-res-mocha.apk",
    "theme-res-raspberry.apk",
    "TtsService.apk",
    "UserDictionaryProvider.apk",
    "Velvet.apk",
    "VisualizationWallpapers.apk",
    "VoiceSearchStub.apk",
    "VpnDialogs.apk",
    "VpnServices.apk",
    "WAPPushManager.apk",
];

/// First-party suite markers, matched against the base name with a
/// trailing `_N`/`-N` qualifier stripped, or the full file name.
const SUITE: &[&str] = &[
    "Crossword",
    "Dictionary",
    "EngLessons.apk",
    "FlashCards",
    "grammar",
    "Hangman",
    "Idioms",
    "IrregularVerbs",
    "JetbookReader.apk",
    "LT",
    "LTPW",
    "MT",
    "MTLauncher.apk",
    "Oxford",
    "PB",
    "PhotoText",
    "PhotoTranslation",
    "PictDict.apk",
    "Sat.apk",
    "SpeedReading.apk",
    "ULearn",
    "ULearn2",
    "Usatest.apk",
    "UT.apk",
];

/// Known package file names mapped to the label shown on the device.
const RENAME: &[(&str, &str)] = &[
    ("1MobileMarket.apk", "1 Mobile Market"),
    ("ApplicationsProvider.apk", "Search Applications Provider"),
    ("bbc.mobile.news.ww.apk", "BBC News"),
    ("biz.bookdesign.librivox-1.apk", "LibriVox Audio Books"),
    ("Browser.apk", "Internet"),
    ("CalendarProvider.apk", "Calendar Storage"),
    ("CertInstaller.apk", "Certificate Installer"),
    ("com.adobe.flashplayer-2.apk", "Adobe Flash Player 11.1"),
    ("com.adobe.reader-1.apk", "Adobe Reader"),
    ("com.alensw.PicFolder-1.apk", "QuickPic"),
    ("com.alphonso.pulse.apk", "Pulse"),
    ("com.anddoes.launcher-1.apk", "Apex Launcher"),
    ("com.android.chrome-1.apk", "Google Chrome"),
    ("com.badoo.mobile.apk", "Badoo"),
    ("com.bytesequencing.android.dominoes.apk", "Dominoes!"),
    ("com.easternspark.android.emergencynumbers-1.apk", "World Emergency Numbers"),
    ("com.ebay.mobile-1.apk", "eBay"),
    ("com.facebook.katana-1.apk", "Facebook"),
    ("com.flyersoft.moonreader-1.apk", "Moon+ Reader"),
    ("com.fsck.k9-1.apk", "K-9 Mail"),
    ("com.google.android.apps.inputmethod.cantonese.apk", "Google Cantonese Input"),
    ("com.google.android.apps.inputmethod.hindi.apk", "Google Hindi Input"),
    ("com.google.android.apps.inputmethod.zhuyin.apk", "Google Zhuyin Input"),
    ("com.google.android.apps.translate-1.apk", "Google Translate"),
    ("com.google.android.chess.apk", "Chess"),
    ("com.google.android.inputmethod.japanese.apk", "Google Japanese Input"),
    ("com.google.android.inputmethod.korean.apk", "Google Korean Input"),
    ("com.google.android.inputmethod.latin.apk", "Google Keyboard"),
    ("com.google.android.inputmethod.pinyin.apk", "Google Pinyin Input"),
    ("com.google.android.voicesearch.apk", "Voice Search"),
    ("com.google.android.youtube-1.apk", "YouTube"),
    ("com.gsmdev.worldfactbook-1.apk", "World Factbook"),
    ("com.guardian.apk", "Guardian"),
    ("com.hi5.app.apk", "Hi5"),
    ("com.icenta.sudoku.apk", "Sudoku Free"),
    ("com.jayuins.mp3p_59.apk", "MePlayer Audio"),
    ("com.jibbigo.player-1.apk", "Jibbigo Translator"),
    ("com.klye.ime.latin.apk", "MultiLing Keyboard"),
    ("com.klye.ime.latin_103.apk", "MultiLing Keyboard"),
    ("com.livejournal.client-1.apk", "LiveJournal"),
    ("com.magmamobile.game.checkers.apk", "Kings"),
    ("com.microsoft.bing.apk", "Bing"),
    ("com.mobilityware.solitaire.apk", "Solitaire"),
    ("com.obreey.reader.apk", "PocketBook Reader"),
    ("com.rmf.apk", "RMFon.pl"),
    ("com.skype.raider-1.apk", "Skype"),
    ("com.tripadvisor.tripadvisor-1.apk", "TripAdvisor"),
    ("com.triposo.droidguide.world-1.apk", "World Travel Guide by Triposo"),
    ("com.twitter.android.apk", "Twitter"),
    ("com.vkontakte.android-1.apk", "Vkontakte"),
    ("com.weather.Weather-1.apk", "The Weather Channel"),
    ("com.workpail.inkpad.notepad.notes-1.apk", "Inkpad NotePad"),
    ("com.xuvi.pretoefl.apk", "TOEFL iBT Preparation"),
    ("com.zaggisworkshop.polishpress.apk", "Polska Prasa"),
    ("CPenService.apk", "C-Pen Core"),
    ("Crossword_ML.apk", "Linguistic Crossword"),
    ("DefaultContainerService.apk", "Package Access Helper"),
    ("Dictionary_Ml.apk", "Dictionary"),
    ("DictOnline.apk", "Dictionary Online"),
    ("DownloadProvider.apk", "Download Manager"),
    ("DownloadProviderUi.apk", "Downloads"),
    ("DrmProvider.apk", "DRM Protected Content Storage"),
    ("EMarket.apk", "ECTACO Market"),
    ("EngLessons.apk", "Video Courses 48 English Lessons"),
    ("es_file_explorer.apk", "ES File Explorer"),
    ("Exchange.apk", "Exchange Services"),
    ("FBReaderJ-plugin-tts.apk", "FBReader TTS plugin"),
    ("FBReaderJ.apk", "FBReader"),
    ("FlashCards_ML.apk", "Learning Settings, Linguistic FlashCards, Pockets, Spell-It-Right, Translation Test"),
    ("Gallery3D.apk", "Gallery"),
    ("Gazeta.apk", "Gazeta.Ru"),
    ("GmsCore.apk", "Google Play services"),
    ("go.apk", "Google Search"),
    ("GTranslate.apk", "Voice Translator"),
    ("Hangman_Ml.apk", "Vocabulary Builder"),
    ("Idioms_ML.apk", "Idioms"),
    ("imoblife.androidsensorbox-1.apk", "Android Sensor Box"),
    ("IrregularVerbs_ML.apk", "Irregular Verbs"),
    ("JetbookReader.apk", "jetBook Reader"),
    ("Launcher2.apk", "Launcher"),
    ("Leventhal.apk", "Video Courses"),
    ("LibRu.apk", "Russian Books Online"),
    ("LiveMocha.apk", "English Online"),
    ("LiveWallpapers.apk", "Android Live Wallpapers"),
    ("LT-ML.apk", "Language Teacher"),
    ("LTPW-ML.apk", "Language Teacher PixWord"),
    ("LuxChk.apk", "LuxSelfTest"),
    ("LuxTtsService.apk", "Lux TTS"),
    ("maildroid.apk", "MailDroid"),
    ("MediaProvider.apk", "Media Storage"),
    ("miyowa.android.microsoft.wlm.apk", "Messenger WithYou"),
    ("net.gordons.uscitizenship2011Edition.apk", "US Citizenship Test 2012 Edition"),
    ("northern.captain.seabattle.apk", "Naval Clash"),
    ("org.wikipedia-1.apk", "Wikipedia"),
    ("Oxford_Eng-Eng.apk", "English Dictionary in English"),
    ("Oxford_Eng-Spa.apk", "English Dictionary in Spanish"),
    ("PB-ML.apk", "PhraseBook"),
    ("PhotoText-lux2.apk", "PhotoText"),
    ("PhotoTranslation-lux2.apk", "Photo Translator"),
    ("PictDict.apk", "Picture Dictionary"),
    ("pl.allegro.apk", "Allegro"),
    ("pl.gadugadu.apk", "GG"),
    ("pl.onet.onethd.apk", "Onet News"),
    ("pl.pleng.russian-1.apk", "Russian Translator"),
    ("ru.odnoklassniki.android-1.apk", "Odnoklassniki"),
    ("ru.yandex.searchplugin-1.apk", "Yandex Search"),
    ("Rurem.apk", "Russian TV and Video"),
    ("Sat.apk", "SAT/TOEFL"),
    ("SpeedReading.apk", "SpeedReading Course"),
    ("Talk.apk", "Google Talk"),
    ("tunein.player-1.apk", "TuneIn Radio"),
    ("ULearn2_Ml.apk", "U-Learn Advanced"),
    ("ULearn_Ml.apk", "U-Learn"),
    ("Usatest.apk", "USA Interview"),
    ("UT.apk", "Universal Translator"),
    ("Vending.apk", "Google Play Store"),
    ("VideoEditor.apk", "Movie Studio"),
    ("Webinar.apk", "English Language Webinar"),
];

/// Compiled application classification tables.
///
/// Built once from the built-in production tables extended by
/// configuration; rename entries from configuration override built-ins.
#[derive(Debug)]
pub struct AppRules {
    deny: HashSet<String>,
    suite: HashSet<String>,
    rename: HashMap<String, String>,
}

/// Classification of one `.apk` into an application list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppClass {
    Vendor(String),
    ThirdParty(String),
}

impl AppRules {
    pub fn new(config: &AppsConfig) -> Self {
        let mut deny: HashSet<String> = DENY.iter().map(|s| s.to_string()).collect();
        deny.extend(config.deny.iter().cloned());
        let mut suite: HashSet<String> = SUITE.iter().map(|s| s.to_string()).collect();
        suite.extend(config.suite.iter().cloned());
        let mut rename: HashMap<String, String> = RENAME
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (k, v) in &config.rename {
            rename.insert(k.clone(), v.clone());
        }
        Self {
            deny,
            suite,
            rename,
        }
    }

    /// Classify an `.apk` file name, or `None` when it is deny-listed.
    ///
    /// The display label is the rename-table entry when one exists,
    /// otherwise the file stem. First-party membership is decided by
    /// matching the stem up to a trailing `_`/`-` qualifier, or the full
    /// file name, against the suite table.
    pub fn classify(&self, filename: &str) -> Option<AppClass> {
        if self.deny.contains(filename) {
            return None;
        }
        let stem = filename.strip_suffix(".apk").unwrap_or(filename);
        let label = self
            .rename
            .get(filename)
            .cloned()
            .unwrap_or_else(|| stem.to_string());
        let mut markers: HashSet<&str> = HashSet::new();
        markers.insert(stem.split('_').next().unwrap_or(stem));
        markers.insert(stem.split('-').next().unwrap_or(stem));
        markers.insert(filename);
        if markers.iter().any(|m| self.suite.contains(*m)) {
            Some(AppClass::Vendor(label))
        } else {
            Some(AppClass::ThirdParty(label))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> AppRules {
        AppRules::new(&AppsConfig::default())
    }

    #[test]
    fn test_deny_listed_apk_is_skipped() {
        assert_eq!(rules().classify("LatinIME.apk"), None);
        assert_eq!(rules().classify("SystemUI.apk"), None);
    }

    #[test]
    fn test_unknown_apk_is_third_party_with_stem_label() {
        assert_eq!(
            rules().classify("foo.apk"),
            Some(AppClass::ThirdParty("foo".to_string()))
        );
    }

    #[test]
    fn test_suite_apk_with_qualifier_is_vendor() {
        // "Dictionary_Ml" strips to "Dictionary", a suite marker
        assert_eq!(
            rules().classify("Dictionary_Ml.apk"),
            Some(AppClass::Vendor("Dictionary".to_string()))
        );
        assert_eq!(
            rules().classify("LT-ML.apk"),
            Some(AppClass::Vendor("Language Teacher".to_string()))
        );
    }

    #[test]
    fn test_renamed_apk_keeps_third_party_class() {
        assert_eq!(
            rules().classify("com.skype.raider-1.apk"),
            Some(AppClass::ThirdParty("Skype".to_string()))
        );
    }

    #[test]
    fn test_full_filename_suite_marker() {
        assert_eq!(
            rules().classify("UT.apk"),
            Some(AppClass::Vendor("Universal Translator".to_string()))
        );
    }

    #[test]
    fn test_config_extends_tables() {
        let mut config = AppsConfig::default();
        config.deny.push("Spyware.apk".to_string());
        config.suite.push("HouseApp".to_string());
        config
            .rename
            .insert("HouseApp-3.apk".to_string(), "House App".to_string());
        let rules = AppRules::new(&config);
        assert_eq!(rules.classify("Spyware.apk"), None);
        assert_eq!(
            rules.classify("HouseApp-3.apk"),
            Some(AppClass::Vendor("House App".to_string()))
        );
    }
}
