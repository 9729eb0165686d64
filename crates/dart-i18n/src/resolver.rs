//! Localization resolver.
//!
//! Answers "what text corresponds to this key, for this caller, in the current
//! language". Plugin callers read their own namespace first and only fall
//! through to the main namespace when they hold `read_main_locales`.

use crate::error::I18nResult;
use crate::language::LanguageState;
use crate::namespace::TranslationNamespace;
use crate::permissions::{Decision, PermissionGate};
use crate::store::TranslationStore;
use dart_plugin_runtime::{HostServices, Permission};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Translation store, language state and permission gate behind one handle.
///
/// Shared with running extensions through `Arc`, so every method takes `&self`.
#[derive(Debug)]
pub struct Localization {
    store: RwLock<TranslationStore>,
    language: RwLock<LanguageState>,
    gate: PermissionGate,
}

impl Localization {
    pub fn new(language: LanguageState, gate: PermissionGate) -> Self {
        Self {
            store: RwLock::new(TranslationStore::new()),
            language: RwLock::new(language),
            gate,
        }
    }

    fn store(&self) -> RwLockReadGuard<'_, TranslationStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_mut(&self) -> RwLockWriteGuard<'_, TranslationStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn language(&self) -> RwLockReadGuard<'_, LanguageState> {
        self.language.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve display text for `key`.
    ///
    /// `caller` is the requesting extension, or `None` for the host. Walks
    /// the current language and then the fallback chain. Never fails: when
    /// nothing matches the result is `default`, or the key itself.
    pub fn get_text(&self, key: &str, caller: Option<&str>, default: Option<&str>) -> String {
        let candidates = self.language().candidates();
        let namespace = TranslationNamespace::for_caller(caller);
        let store = self.store();

        // Asked at most once per call, and only after an own-namespace miss.
        let mut main_access: Option<bool> = None;

        for lang in &candidates {
            if let Some(text) = store.lookup(&namespace, lang, key) {
                return text.to_string();
            }

            let TranslationNamespace::Plugin(plugin) = &namespace else {
                continue;
            };

            let allowed = *main_access.get_or_insert_with(|| {
                let reason = format!("Looking up '{}' in the main application's translations", key);
                self.gate
                    .request_one(plugin, Permission::ReadMainLocales, &reason)
                    .is_granted()
            });
            if allowed {
                if let Some(text) = store.lookup(&TranslationNamespace::Main, lang, key) {
                    return text.to_string();
                }
            }
        }

        debug!("No translation for '{}' (namespace: {})", key, namespace);
        default.unwrap_or(key).to_string()
    }

    /// Switch the current language. Unsupported languages change nothing.
    pub fn set_language(&self, language: &str) -> I18nResult<()> {
        self.language
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_current(language)?;
        info!("Language set to {}", language);
        Ok(())
    }

    pub fn current_language(&self) -> String {
        self.language().current().to_string()
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.language().supported().to_vec()
    }

    pub fn fallback_chain(&self) -> Vec<String> {
        self.language().fallback_chain().to_vec()
    }

    /// Load one resource file.
    pub fn load(
        &self,
        namespace: &TranslationNamespace,
        language: &str,
        path: &Path,
    ) -> I18nResult<usize> {
        self.store_mut().load(namespace, language, path)
    }

    /// Add a single entry.
    pub fn insert(
        &self,
        namespace: TranslationNamespace,
        language: &str,
        key: &str,
        text: &str,
    ) {
        self.store_mut().insert(namespace, language, key, text);
    }

    /// Load the host's translations from `<base>/<lang>/*.json`.
    pub fn load_main_directory(&self, base: &Path) -> usize {
        let languages = self.supported_languages();
        self.store_mut().load_main_directory(base, &languages)
    }

    /// Load a plugin's translations from `<plugin_dir>/locales/<lang>/`.
    pub fn load_plugin_translations(&self, plugin: &str, plugin_dir: &Path) -> usize {
        let languages = self.supported_languages();
        self.store_mut()
            .load_plugin_directory(plugin, plugin_dir, &languages)
    }

    /// Drop every translation a plugin has loaded.
    pub fn remove_plugin_translations(&self, plugin: &str) {
        self.store_mut()
            .remove_namespace(&TranslationNamespace::plugin(plugin));
    }

    /// Whether translations exist for the namespace.
    pub fn has_translations(&self, namespace: &TranslationNamespace) -> bool {
        self.store().has_namespace(namespace)
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Stored decision for a plugin, without prompting.
    pub fn permission(&self, plugin: &str, permission: Permission) -> Option<Decision> {
        self.gate.check(plugin, permission)
    }
}

impl HostServices for Localization {
    fn text(&self, caller: Option<&str>, key: &str, default: Option<&str>) -> String {
        self.get_text(key, caller, default)
    }
}
