use std::fmt;

/// Reserved name of the host application's namespace.
pub const MAIN_NAMESPACE: &str = "main";

/// Owner of a translation table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TranslationNamespace {
    /// The host application.
    Main,

    /// One extension, by name.
    Plugin(String),
}

impl TranslationNamespace {
    pub fn plugin(name: impl Into<String>) -> Self {
        TranslationNamespace::Plugin(name.into())
    }

    /// Namespace a caller reads from first. `None` and `"main"` are the host.
    pub fn for_caller(caller: Option<&str>) -> Self {
        match caller {
            None | Some(MAIN_NAMESPACE) => TranslationNamespace::Main,
            Some(name) => TranslationNamespace::plugin(name),
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, TranslationNamespace::Main)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TranslationNamespace::Main => MAIN_NAMESPACE,
            TranslationNamespace::Plugin(name) => name,
        }
    }
}

impl fmt::Display for TranslationNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
