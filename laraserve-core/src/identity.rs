//! The invoking user, resolved once per command.
//!
//! laraserve usually runs under `sudo`; the site still belongs to the human
//! who typed the command, so `SUDO_USER` wins over `USER`.

use std::path::PathBuf;

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub home: PathBuf,
}

impl Identity {
    /// Resolve from the process environment.
    pub fn resolve() -> Result<Self, RegistryError> {
        Self::resolve_with(|key| std::env::var(key).ok(), dirs::home_dir)
    }

    /// Resolve from an arbitrary variable lookup; `fallback_home` is used when
    /// neither `SUDO_USER` nor `HOME` yields a home directory.
    pub fn resolve_with(
        var: impl Fn(&str) -> Option<String>,
        fallback_home: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, RegistryError> {
        let non_empty = |key: &str| var(key).filter(|v| !v.is_empty());

        if let Some(sudo_user) = non_empty("SUDO_USER") {
            let home = PathBuf::from("/home").join(&sudo_user);
            return Ok(Self { user: sudo_user, home });
        }

        let user = non_empty("USER").unwrap_or_else(|| "root".to_string());
        let home = match non_empty("HOME") {
            Some(h) => PathBuf::from(h),
            None => fallback_home().ok_or(RegistryError::HomeNotFound)?,
        };
        Ok(Self { user, home })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sudo_user_takes_precedence() {
        let vars = env(&[("SUDO_USER", "alice"), ("USER", "root"), ("HOME", "/root")]);
        let id = Identity::resolve_with(|k| vars.get(k).cloned(), || None).unwrap();
        assert_eq!(id.user, "alice");
        assert_eq!(id.home, PathBuf::from("/home/alice"));
    }

    #[test]
    fn plain_user_and_home() {
        let vars = env(&[("USER", "bob"), ("HOME", "/Users/bob")]);
        let id = Identity::resolve_with(|k| vars.get(k).cloned(), || None).unwrap();
        assert_eq!(id.user, "bob");
        assert_eq!(id.home, PathBuf::from("/Users/bob"));
    }

    #[test]
    fn defaults_to_root_and_fallback_home() {
        let vars = env(&[("SUDO_USER", "")]);
        let id = Identity::resolve_with(|k| vars.get(k).cloned(), || Some("/root".into())).unwrap();
        assert_eq!(id.user, "root");
        assert_eq!(id.home, PathBuf::from("/root"));
    }

    #[test]
    fn missing_home_is_an_error() {
        let err = Identity::resolve_with(|_| None, || None).unwrap_err();
        assert!(matches!(err, RegistryError::HomeNotFound));
    }
}
