//! Intent validation. Runs before any side effect.

use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

/// Lower-case `raw` and check it is usable as a hosts entry and a file name.
pub fn normalize_domain(raw: &str) -> Result<String, ProvisionError> {
    let domain = raw.trim().to_ascii_lowercase();
    if domain.is_empty() {
        return Err(ProvisionError::Validation("domain must not be empty".into()));
    }
    if let Some(bad) = domain
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
    {
        return Err(ProvisionError::Validation(format!(
            "domain '{raw}' contains invalid character {bad:?}"
        )));
    }
    if domain.starts_with(['.', '-']) || domain.ends_with('.') {
        return Err(ProvisionError::Validation(format!(
            "domain '{raw}' must not start with '.' or '-' or end with '.'"
        )));
    }
    if domain.contains("..") {
        return Err(ProvisionError::Validation(format!(
            "domain '{raw}' contains an empty label"
        )));
    }
    Ok(domain)
}

/// Canonicalise `path`, which must be an existing directory.
pub fn resolve_document_root(path: &Path) -> Result<PathBuf, ProvisionError> {
    let canonical = path.canonicalize().map_err(|e| {
        ProvisionError::Validation(format!("path {} is not accessible: {e}", path.display()))
    })?;
    if !canonical.is_dir() {
        return Err(ProvisionError::Validation(format!(
            "path {} is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("shop.test", "shop.test")]
    #[case("Shop.TEST", "shop.test")]
    #[case("  api.shop.test ", "api.shop.test")]
    #[case("my-app.localhost", "my-app.localhost")]
    #[case("localhost", "localhost")]
    fn accepts_valid_domains(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_domain(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("shop test")]
    #[case("shop/test")]
    #[case("../etc")]
    #[case(".shop.test")]
    #[case("-shop.test")]
    #[case("shop.test.")]
    #[case("shop..test")]
    #[case("shöp.test")]
    #[case("shop_test")]
    fn rejects_invalid_domains(#[case] raw: &str) {
        assert!(matches!(
            normalize_domain(raw),
            Err(ProvisionError::Validation(_))
        ));
    }

    #[test]
    fn missing_path_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_document_root(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
    }

    #[test]
    fn file_path_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("index.php");
        std::fs::write(&file, "<?php").unwrap();
        let err = resolve_document_root(&file).unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
    }

    #[test]
    fn relative_path_is_canonicalised() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("public")).unwrap();
        let dotted = tmp.path().join("public").join("..").join("public");
        let resolved = resolve_document_root(&dotted).unwrap();
        assert_eq!(resolved, tmp.path().canonicalize().unwrap().join("public"));
        assert!(resolved.is_absolute());
    }
}
