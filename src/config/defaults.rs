//! Default values for configuration fields, shared by serde and educe.

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn database() -> PathBuf {
        "database".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn languages() -> Vec<String> {
        vec!["fr".into(), "en".into()]
    }

    pub fn workers() -> usize {
        0
    }

    pub fn links() -> Option<PathBuf> {
        None
    }

    pub fn progress() -> Option<PathBuf> {
        None
    }
}

// ============================================================================
// [develop] Section Defaults
// ============================================================================

pub mod develop {
    pub fn debounce_ms() -> u64 {
        300
    }
}
