//! Translation tables.
//!
//! Tables are keyed by namespace and language and hold flat `key -> text`
//! maps. Main keys carry the resource file stem as prefix
//! (`common.json` + `welcome` gives `common.welcome`); plugin keys do not.

use crate::error::{I18nError, I18nResult};
use crate::namespace::TranslationNamespace;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type Table = HashMap<String, String>;

/// Directory under a plugin unit that holds its translations.
pub const PLUGIN_LOCALES_DIR: &str = "locales";

/// In-memory translation tables for every namespace and language.
#[derive(Debug, Default)]
pub struct TranslationStore {
    tables: HashMap<(TranslationNamespace, String), Table>,
}

impl TranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one resource file into `(namespace, language)`.
    ///
    /// For a plugin namespace the table is replaced. For the main namespace
    /// only keys under this file's prefix are replaced. On error the store
    /// is left untouched. Returns the number of keys loaded.
    pub fn load(
        &mut self,
        namespace: &TranslationNamespace,
        language: &str,
        path: &Path,
    ) -> I18nResult<usize> {
        let entries = read_table(path)?;
        let count = entries.len();

        match namespace {
            TranslationNamespace::Main => {
                let prefix = file_prefix(path)?;
                let table = self
                    .tables
                    .entry((namespace.clone(), language.to_string()))
                    .or_default();
                let dotted = format!("{}.", prefix);
                table.retain(|k, _| !k.starts_with(&dotted));
                table.extend(
                    entries
                        .into_iter()
                        .map(|(k, v)| (format!("{}{}", dotted, k), v)),
                );
            }
            TranslationNamespace::Plugin(_) => {
                self.tables
                    .insert((namespace.clone(), language.to_string()), entries);
            }
        }

        debug!(
            "Loaded {} translations for {}/{} from {:?}",
            count, namespace, language, path
        );
        Ok(count)
    }

    /// Look up a key. Never fails.
    pub fn lookup(&self, namespace: &TranslationNamespace, language: &str, key: &str) -> Option<&str> {
        self.tables
            .get(&(namespace.clone(), language.to_string()))
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }

    /// Add a single entry. Keys are stored as given, without prefixing.
    pub fn insert(
        &mut self,
        namespace: TranslationNamespace,
        language: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.tables
            .entry((namespace, language.into()))
            .or_default()
            .insert(key.into(), text.into());
    }

    /// Load `<base>/<lang>/*.json` into the main namespace.
    ///
    /// Files that fail to load are logged and skipped. Returns the number of
    /// files loaded.
    pub fn load_main_directory(&mut self, base: &Path, languages: &[String]) -> usize {
        let mut loaded = 0;
        for lang in languages {
            for path in json_files(&base.join(lang)) {
                match self.load(&TranslationNamespace::Main, lang, &path) {
                    Ok(_) => loaded += 1,
                    Err(e) => warn!("Skipping translation file: {}", e),
                }
            }
        }
        info!("Loaded {} main translation files from {:?}", loaded, base);
        loaded
    }

    /// Load `<plugin_dir>/locales/<lang>/*.json` into the plugin's namespace.
    ///
    /// All files of one language are merged and replace that language's
    /// table. Returns the number of languages loaded.
    pub fn load_plugin_directory(
        &mut self,
        plugin: &str,
        plugin_dir: &Path,
        languages: &[String],
    ) -> usize {
        let locales = plugin_dir.join(PLUGIN_LOCALES_DIR);
        if !locales.is_dir() {
            return 0;
        }

        let namespace = TranslationNamespace::plugin(plugin);
        let mut loaded = 0;
        for lang in languages {
            let mut merged = Table::new();
            let mut any = false;
            for path in json_files(&locales.join(lang)) {
                match read_table(&path) {
                    Ok(entries) => {
                        merged.extend(entries);
                        any = true;
                    }
                    Err(e) => warn!("Skipping translation file for {}: {}", plugin, e),
                }
            }
            if any {
                self.tables
                    .insert((namespace.clone(), lang.clone()), merged);
                loaded += 1;
            }
        }

        if loaded > 0 {
            info!("Loaded translations for plugin {} ({} languages)", plugin, loaded);
        }
        loaded
    }

    /// Whether any table exists for the namespace.
    pub fn has_namespace(&self, namespace: &TranslationNamespace) -> bool {
        self.tables.keys().any(|(ns, _)| ns == namespace)
    }

    /// Languages with a table for the namespace, sorted.
    pub fn languages(&self, namespace: &TranslationNamespace) -> Vec<&str> {
        let mut langs: Vec<_> = self
            .tables
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, lang)| lang.as_str())
            .collect();
        langs.sort_unstable();
        langs
    }

    pub fn key_count(&self, namespace: &TranslationNamespace, language: &str) -> usize {
        self.tables
            .get(&(namespace.clone(), language.to_string()))
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Drop every table of the namespace.
    pub fn remove_namespace(&mut self, namespace: &TranslationNamespace) {
        self.tables.retain(|(ns, _), _| ns != namespace);
    }
}

/// Parse a flat JSON object of strings.
fn read_table(path: &Path) -> I18nResult<Table> {
    let content = std::fs::read_to_string(path).map_err(|e| I18nError::resource(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| I18nError::resource(path, e))?;

    let Value::Object(map) = value else {
        return Err(I18nError::resource(path, "expected a JSON object"));
    };

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok((key, text)),
            _ => Err(I18nError::resource(
                path,
                format!("value of '{}' is not a string", key),
            )),
        })
        .collect()
}

fn file_prefix(path: &Path) -> I18nResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| I18nError::resource(path, "file name has no stem"))
}

/// `*.json` files in `dir`, sorted. A missing directory yields nothing.
fn json_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_main_keys_are_prefixed() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("ko/common.json");
        write(&file, r#"{"welcome": "환영합니다"}"#);

        let mut store = TranslationStore::new();
        store.load(&TranslationNamespace::Main, "ko", &file).unwrap();

        assert_eq!(
            store.lookup(&TranslationNamespace::Main, "ko", "common.welcome"),
            Some("환영합니다")
        );
        assert!(store
            .lookup(&TranslationNamespace::Main, "ko", "welcome")
            .is_none());
    }

    #[test]
    fn test_reload_replaces_prefix_only() {
        let temp_dir = TempDir::new().unwrap();
        let common = temp_dir.path().join("en/common.json");
        let splash = temp_dir.path().join("en/splash.json");
        write(&common, r#"{"a": "1", "b": "2"}"#);
        write(&splash, r#"{"loading": "Loading"}"#);

        let mut store = TranslationStore::new();
        store.load(&TranslationNamespace::Main, "en", &common).unwrap();
        store.load(&TranslationNamespace::Main, "en", &splash).unwrap();

        write(&common, r#"{"a": "one"}"#);
        store.load(&TranslationNamespace::Main, "en", &common).unwrap();

        let main = TranslationNamespace::Main;
        assert_eq!(store.lookup(&main, "en", "common.a"), Some("one"));
        assert!(store.lookup(&main, "en", "common.b").is_none());
        assert_eq!(store.lookup(&main, "en", "splash.loading"), Some("Loading"));
    }

    #[test]
    fn test_plugin_table_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("strings.json");
        let ns = TranslationNamespace::plugin("sample");

        let mut store = TranslationStore::new();
        write(&file, r#"{"greeting": "hi", "bye": "bye"}"#);
        store.load(&ns, "en", &file).unwrap();
        write(&file, r#"{"greeting": "hello"}"#);
        store.load(&ns, "en", &file).unwrap();

        assert_eq!(store.lookup(&ns, "en", "greeting"), Some("hello"));
        assert!(store.lookup(&ns, "en", "bye").is_none());
    }

    #[test]
    fn test_malformed_resource_leaves_store_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("common.json");
        write(&file, r#"{"a": "1"}"#);

        let mut store = TranslationStore::new();
        store.load(&TranslationNamespace::Main, "en", &file).unwrap();

        write(&file, r#"{"a": {"nested": true}}"#);
        let err = store
            .load(&TranslationNamespace::Main, "en", &file)
            .unwrap_err();
        assert!(matches!(err, I18nError::Resource { .. }));
        assert_eq!(
            store.lookup(&TranslationNamespace::Main, "en", "common.a"),
            Some("1")
        );

        let missing = store.load(
            &TranslationNamespace::Main,
            "en",
            &temp_dir.path().join("nope.json"),
        );
        assert!(matches!(missing, Err(I18nError::Resource { .. })));
    }

    #[test]
    fn test_load_main_directory_skips_bad_files() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir.path().join("ko/common.json"), r#"{"ok": "확인"}"#);
        write(&temp_dir.path().join("ko/broken.json"), "not json");
        write(&temp_dir.path().join("en/common.json"), r#"{"ok": "OK"}"#);

        let mut store = TranslationStore::new();
        let loaded =
            store.load_main_directory(temp_dir.path(), &["ko".to_string(), "en".to_string()]);

        assert_eq!(loaded, 2);
        assert_eq!(
            store.lookup(&TranslationNamespace::Main, "en", "common.ok"),
            Some("OK")
        );
    }

    #[test]
    fn test_load_plugin_directory() {
        let temp_dir = TempDir::new().unwrap();
        let plugin_dir = temp_dir.path().join("sample");
        write(
            &plugin_dir.join("locales/ko/strings.json"),
            r#"{"greeting": "안녕하세요"}"#,
        );

        let mut store = TranslationStore::new();
        let loaded = store.load_plugin_directory(
            "sample",
            &plugin_dir,
            &["ko".to_string(), "en".to_string()],
        );

        let ns = TranslationNamespace::plugin("sample");
        assert_eq!(loaded, 1);
        assert_eq!(store.lookup(&ns, "ko", "greeting"), Some("안녕하세요"));
        assert_eq!(store.languages(&ns), vec!["ko"]);
        assert!(!store.has_namespace(&TranslationNamespace::plugin("other")));
    }
}
