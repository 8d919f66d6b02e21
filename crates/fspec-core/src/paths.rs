use crate::error::{FspecError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SPEC_DIR: &str = "spec";
pub const FEATURES_DIR: &str = "spec/features";

pub const WORK_UNITS_FILE: &str = "spec/work-units.json";
pub const EPICS_FILE: &str = "spec/epics.json";
pub const PREFIXES_FILE: &str = "spec/prefixes.json";
pub const TAGS_FILE: &str = "spec/tags.json";
pub const FOUNDATION_FILE: &str = "spec/foundation.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn spec_dir(root: &Path) -> PathBuf {
    root.join(SPEC_DIR)
}

pub fn features_dir(root: &Path) -> PathBuf {
    root.join(FEATURES_DIR)
}

pub fn work_units_path(root: &Path) -> PathBuf {
    root.join(WORK_UNITS_FILE)
}

pub fn epics_path(root: &Path) -> PathBuf {
    root.join(EPICS_FILE)
}

pub fn prefixes_path(root: &Path) -> PathBuf {
    root.join(PREFIXES_FILE)
}

pub fn tags_path(root: &Path) -> PathBuf {
    root.join(TAGS_FILE)
}

pub fn foundation_path(root: &Path) -> PathBuf {
    root.join(FOUNDATION_FILE)
}

pub fn feature_file_path(root: &Path, name: &str) -> PathBuf {
    features_dir(root).join(format!("{name}.feature"))
}

// ---------------------------------------------------------------------------
// Prefix and ID validation
// ---------------------------------------------------------------------------

static PREFIX_RE: OnceLock<Regex> = OnceLock::new();
static ID_RE: OnceLock<Regex> = OnceLock::new();

fn prefix_re() -> &'static Regex {
    PREFIX_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]{1,9}$").unwrap())
}

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^([A-Z][A-Z0-9]{1,9})-(\d+)$").unwrap())
}

pub fn validate_prefix(prefix: &str) -> Result<()> {
    if !prefix_re().is_match(prefix) {
        return Err(FspecError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Split a work unit ID into its prefix and sequence number.
pub fn split_id(id: &str) -> Option<(&str, u32)> {
    let caps = id_re().captures(id)?;
    let prefix = caps.get(1)?.as_str();
    let seq = caps.get(2)?.as_str().parse().ok()?;
    Some((prefix, seq))
}

/// Lowercase a title into a kebab-case feature file stem.
pub fn kebab_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_prefixes() {
        for p in ["AUTH", "UI", "API2"] {
            validate_prefix(p).unwrap_or_else(|_| panic!("expected valid: {p}"));
        }
    }

    #[test]
    fn invalid_prefixes() {
        for p in ["", "A", "auth", "2FA", "TOOLONGPREFIX", "AU-TH"] {
            assert!(validate_prefix(p).is_err(), "expected invalid: {p}");
        }
    }

    #[test]
    fn split_id_parses() {
        assert_eq!(split_id("AUTH-001"), Some(("AUTH", 1)));
        assert_eq!(split_id("UI-42"), Some(("UI", 42)));
        assert_eq!(split_id("auth-001"), None);
        assert_eq!(split_id("AUTH"), None);
    }

    #[test]
    fn kebab_case_titles() {
        assert_eq!(kebab_case("User Login Flow"), "user-login-flow");
        assert_eq!(kebab_case("OAuth 2.0 (PKCE)"), "oauth-2-0-pkce");
        assert_eq!(kebab_case("  trailing  "), "trailing");
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            work_units_path(root),
            PathBuf::from("/tmp/proj/spec/work-units.json")
        );
        assert_eq!(
            feature_file_path(root, "user-login"),
            PathBuf::from("/tmp/proj/spec/features/user-login.feature")
        );
    }
}
