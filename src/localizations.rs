use i18n_embed::DesktopLanguageRequester;
use std::collections::HashMap;
use unic_langid::{langid, LanguageIdentifier};

// Simple in-memory translations
#[derive(Default)]
pub struct Translations {
    strings: HashMap<&'static str, &'static str>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: &'static str) {
        self.strings.insert(key, value);
    }

    pub fn extend(&mut self, pairs: &[(&'static str, &'static str)]) {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.strings.get(key).copied()
    }
}

const EN: &[(&str, &str)] = &[
    ("app-title", "YouTube Downloader"),
    ("url-label", "YouTube playlist / video link:"),
    ("url-placeholder", "https://..."),
    ("download-format", "Download as:"),
    ("format-mp4", "Video (MP4)"),
    ("format-mp3", "Audio (MP3)"),
    ("max-resolution", "Max. resolution:"),
    ("download-to", "Save to:"),
    ("dir-placeholder", "Select download directory"),
    ("browse-button", "Browse..."),
    ("ignore-archive", "Ignore archive (download again)"),
    ("ignore-archive-tooltip", "When checked, videos already recorded in the archive are downloaded again"),
    ("cookies-file-button", "Load cookies.txt"),
    ("cookies-browser-button", "Cookies from browser"),
    ("open-log-button", "Open log"),
    ("history-label", "Operations:"),
    ("skipped-label", "Skipped:"),
    ("clear-button", "Clear"),
    ("download-button", "Download"),
    ("stop-button", "Stop"),
    ("resume-button", "Resume"),
    ("exit-button", "Exit"),
    ("status-ready", "Ready"),
    ("status-downloading", "Downloading..."),
    ("status-stopping", "Stopping..."),
    ("status-stopped", "Stopped"),
    ("status-complete", "Completed"),
    ("status-resuming", "Resuming... (finished items will be skipped)"),
    ("status-failed", "Error: {message}"),
    ("status-progress", "{speed} | ETA: {eta}"),
    ("cookies-loaded", "Cookies loaded: {name}"),
    ("cookies-browser-selected", "Cookies will be read from {browser}"),
    ("choose-browser", "Browser to read cookies from:"),
    ("cancel-button", "Cancel"),
    ("ok-button", "OK"),
    ("error-title", "Download error"),
    ("error-intro", "An error occurred."),
    ("error-copied", "The error text was copied to the clipboard. The last log lines are below."),
    ("summary-title", "Summary"),
    ("summary-intro", "A short summary of this session."),
    ("error-no-url", "Please enter a link"),
    ("error-url-is-error-text", "Error text is not a link, please enter the real link"),
    ("error-url-scheme", "Enter a valid link (http/https)"),
    ("error-url-host", "A YouTube link is expected"),
    ("error-ytdlp-missing", "yt-dlp not found. Please install yt-dlp and make sure it's in your PATH."),
    ("error-stop-first", "Stop the current download before resuming"),
    ("error-nothing-to-resume", "There is nothing to resume"),
    ("log-location", "Log file: {path}"),
];

const ES: &[(&str, &str)] = &[
    ("app-title", "Descargador de YouTube"),
    ("url-label", "Enlace de lista / video de YouTube:"),
    ("download-format", "Descargar como:"),
    ("format-mp4", "Video (MP4)"),
    ("format-mp3", "Audio (MP3)"),
    ("max-resolution", "Resolución máx.:"),
    ("download-to", "Guardar en:"),
    ("dir-placeholder", "Seleccione el directorio de descarga"),
    ("browse-button", "Examinar..."),
    ("ignore-archive", "Ignorar archivo (descargar de nuevo)"),
    ("ignore-archive-tooltip", "Si se marca, los videos ya registrados en el archivo se descargan de nuevo"),
    ("cookies-file-button", "Cargar cookies.txt"),
    ("cookies-browser-button", "Cookies del navegador"),
    ("open-log-button", "Abrir registro"),
    ("history-label", "Operaciones:"),
    ("skipped-label", "Omitidos:"),
    ("clear-button", "Limpiar"),
    ("download-button", "Descargar"),
    ("stop-button", "Detener"),
    ("resume-button", "Reanudar"),
    ("exit-button", "Salir"),
    ("status-ready", "Listo"),
    ("status-downloading", "Descargando..."),
    ("status-stopping", "Deteniendo..."),
    ("status-stopped", "Detenido"),
    ("status-complete", "Completado"),
    ("status-resuming", "Reanudando... (se omitirán los terminados)"),
    ("status-failed", "Error: {message}"),
    ("cookies-loaded", "Cookies cargadas: {name}"),
    ("cookies-browser-selected", "Las cookies se leerán de {browser}"),
    ("choose-browser", "Navegador del que leer las cookies:"),
    ("cancel-button", "Cancelar"),
    ("ok-button", "Aceptar"),
    ("error-title", "Error de descarga"),
    ("error-intro", "Ocurrió un error."),
    ("error-copied", "El texto del error se copió al portapapeles. Las últimas líneas del registro están abajo."),
    ("summary-title", "Resumen"),
    ("summary-intro", "Un breve resumen de esta sesión."),
    ("error-no-url", "Por favor ingrese un enlace"),
    ("error-url-is-error-text", "El texto de error no es un enlace, ingrese el enlace real"),
    ("error-url-scheme", "Ingrese un enlace válido (http/https)"),
    ("error-url-host", "Se espera un enlace de YouTube"),
    ("error-ytdlp-missing", "No se encontró yt-dlp. Por favor instale yt-dlp y asegúrese de que esté en su PATH."),
    ("error-stop-first", "Detenga la descarga actual antes de reanudar"),
    ("error-nothing-to-resume", "No hay nada que reanudar"),
    ("log-location", "Archivo de registro: {path}"),
];

const TR: &[(&str, &str)] = &[
    ("app-title", "YouTube İndirici"),
    ("url-label", "YouTube Playlist / Video Linki:"),
    ("download-format", "İndirme Türü:"),
    ("format-mp4", "Video (MP4)"),
    ("format-mp3", "Ses (MP3)"),
    ("max-resolution", "Maks. Çözünürlük:"),
    ("download-to", "Kayıt Klasörü:"),
    ("dir-placeholder", "İndirme klasörünü seçin"),
    ("browse-button", "Gözat"),
    ("ignore-archive", "Arşivi yoksay (yeniden indir)"),
    ("ignore-archive-tooltip", "İşaretlenirse daha önce arşive kaydedilmiş videolar da yeniden indirilir"),
    ("cookies-file-button", "cookies.txt Yükle"),
    ("cookies-browser-button", "Tarayıcıdan Cookies Al"),
    ("open-log-button", "Logu Aç"),
    ("history-label", "İşlemler:"),
    ("skipped-label", "Atlananlar:"),
    ("clear-button", "Temizle"),
    ("download-button", "İndir"),
    ("stop-button", "Durdur"),
    ("resume-button", "Devam Et"),
    ("exit-button", "Çıkış"),
    ("status-ready", "Hazır"),
    ("status-downloading", "İndiriliyor..."),
    ("status-stopping", "Durduruluyor..."),
    ("status-stopped", "Durduruldu"),
    ("status-complete", "Tamamlandı"),
    ("status-resuming", "Devam başlatılıyor... (bitmişler atlanacak)"),
    ("status-failed", "Hata: {message}"),
    ("cookies-loaded", "Cookies eklendi: {name}"),
    ("cookies-browser-selected", "Cookies {browser} tarayıcısından alınacak"),
    ("choose-browser", "Cookies alınacak tarayıcı:"),
    ("cancel-button", "İptal"),
    ("ok-button", "Tamam"),
    ("error-title", "İndirme Hatası"),
    ("error-intro", "Bir hata oluştu."),
    ("error-copied", "Hata metni panoya kopyalandı. Son log satırları aşağıda."),
    ("summary-title", "Özet"),
    ("summary-intro", "Bu oturumun kısa özeti aşağıda."),
    ("error-no-url", "Lütfen bir bağlantı girin"),
    ("error-url-is-error-text", "Hata metni URL değildir, lütfen gerçek bağlantıyı girin"),
    ("error-url-scheme", "Geçerli bir bağlantı girin (http/https)"),
    ("error-url-host", "YouTube bağlantısı bekleniyor"),
    ("error-ytdlp-missing", "yt-dlp bulunamadı. Lütfen yt-dlp kurun ve PATH içinde olduğundan emin olun."),
    ("error-stop-first", "Devam etmek için önce indirmeyi durdurun"),
    ("error-nothing-to-resume", "Devam edecek bir işlem bulunamadı"),
    ("log-location", "Log dosyası: {path}"),
];

fn default_language() -> LanguageIdentifier {
    langid!("en-US")
}

pub struct Localizations {
    translations: HashMap<LanguageIdentifier, Translations>,
    current_lang: LanguageIdentifier,
}

impl Default for Localizations {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizations {
    /// Tables for every bundled language, English selected.
    pub fn bundled() -> Self {
        let mut translations = HashMap::new();
        for (lang, pairs) in [
            (langid!("en-US"), EN),
            (langid!("es-ES"), ES),
            (langid!("tr-TR"), TR),
        ] {
            let mut table = Translations::new();
            table.extend(pairs);
            translations.insert(lang, table);
        }
        Self {
            translations,
            current_lang: default_language(),
        }
    }

    /// Bundled tables with the desktop's preferred language selected.
    pub fn new() -> Self {
        let mut localizer = Self::bundled();
        let requested = DesktopLanguageRequester::requested_languages();
        localizer.select_first(&requested);
        log::debug!("ui language: {}", localizer.current_lang);
        localizer
    }

    pub fn current(&self) -> &LanguageIdentifier {
        &self.current_lang
    }

    /// Picks the first requested language we have a table for.
    pub fn select_first(&mut self, requested: &[LanguageIdentifier]) {
        for lang in requested {
            if self.select(lang) {
                return;
            }
        }
        self.current_lang = default_language();
    }

    /// Exact match first, then any table for the same language subtag.
    pub fn select(&mut self, lang: &LanguageIdentifier) -> bool {
        if self.translations.contains_key(lang) {
            self.current_lang = lang.clone();
            return true;
        }
        let same_language = self
            .translations
            .keys()
            .find(|candidate| candidate.language == lang.language)
            .cloned();
        match same_language {
            Some(found) => {
                self.current_lang = found;
                true
            }
            None => false,
        }
    }

    /// Looks `key` up in the current language, falling back to English, and
    /// substitutes `{name}` placeholders from `args`.
    pub fn lookup_single_language(&self, key: &str, args: Option<&[(&str, &str)]>) -> Option<String> {
        let text = self
            .translations
            .get(&self.current_lang)
            .and_then(|t| t.lookup(key))
            .or_else(|| {
                self.translations
                    .get(&default_language())
                    .and_then(|t| t.lookup(key))
            })?;

        let mut text = text.to_string();
        for (name, value) in args.unwrap_or_default() {
            text = text.replace(&format!("{{{}}}", name), value);
        }
        Some(text)
    }

    /// Like [`Self::lookup_single_language`] without arguments; unknown keys
    /// render as themselves.
    pub fn text(&self, key: &str) -> String {
        self.lookup_single_language(key, None)
            .unwrap_or_else(|| key.to_string())
    }

    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.lookup_single_language(key, Some(args))
            .unwrap_or_else(|| key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english() {
        let mut localizer = Localizations::bundled();
        assert!(localizer.select(&langid!("es-ES")));
        assert_eq!(localizer.text("download-button"), "Descargar");
        // Only the English table has a progress template.
        assert_eq!(
            localizer.format("status-progress", &[("speed", "1MiB/s"), ("eta", "00:10")]),
            "1MiB/s | ETA: 00:10"
        );
        assert_eq!(localizer.text("no-such-key"), "no-such-key");
    }

    #[test]
    fn matches_language_subtag() {
        let mut localizer = Localizations::bundled();
        localizer.select_first(&[langid!("de-DE"), langid!("tr")]);
        assert_eq!(localizer.current(), &langid!("tr-TR"));
        assert_eq!(
            localizer.format("status-failed", &[("message", "HTTP 403")]),
            "Hata: HTTP 403"
        );
    }

    #[test]
    fn unknown_languages_use_english() {
        let mut localizer = Localizations::bundled();
        localizer.select(&langid!("es-ES"));
        localizer.select_first(&[langid!("ja-JP")]);
        assert_eq!(localizer.current(), &langid!("en-US"));
    }

    #[test]
    fn every_key_has_english_text() {
        let english: Vec<&str> = EN.iter().map(|(key, _)| *key).collect();
        for table in [ES, TR] {
            for (key, _) in table {
                assert!(english.contains(key), "{} missing from English", key);
            }
        }
    }
}
