//! Document root ownership and ACLs.
//!
//! The invoking user keeps ownership; the web group gets write access so PHP
//! can write caches. With `setfacl` available, access and default ACLs are
//! used so new files inherit the grant. Without it, plain modes are applied.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use laraserve_core::types::BackendId;
use laraserve_core::Identity;

use crate::capability::PermissionFixer;
use crate::command::{CommandRunner, CommandSpec};
use crate::error::StepError;

/// Laravel directories that must stay group-writable.
const WRITABLE_DIRS: &[&str] = &["storage", "bootstrap/cache"];

pub struct AclPermissionFixer {
    identity: Identity,
    web_group: String,
    backend_groups: BTreeMap<BackendId, String>,
    runner: Rc<dyn CommandRunner>,
}

impl AclPermissionFixer {
    pub fn new(
        identity: Identity,
        web_group: impl Into<String>,
        runner: Rc<dyn CommandRunner>,
    ) -> Self {
        Self {
            identity,
            web_group: web_group.into(),
            backend_groups: BTreeMap::new(),
            runner,
        }
    }

    /// Use `group` instead of the shared web group for `backend`.
    pub fn with_backend_group(mut self, backend: BackendId, group: impl Into<String>) -> Self {
        self.backend_groups.insert(backend, group.into());
        self
    }

    fn group_for(&self, backend: BackendId) -> &str {
        self.backend_groups
            .get(&backend)
            .map(String::as_str)
            .unwrap_or(&self.web_group)
    }

    fn acl_spec(&self, group: &str) -> String {
        format!(
            "u::rwx,g::rwx,o::rx,u:{}:rwx,g:{group}:rwx",
            self.identity.user
        )
    }

    fn apply_acls(&self, target: &str, group: &str) -> Result<(), StepError> {
        let spec = self.acl_spec(group);
        self.runner
            .run(&CommandSpec::new("setfacl").args(["-R", "-m", spec.as_str(), target]))?;
        self.runner
            .run(&CommandSpec::new("setfacl").args(["-R", "-d", "-m", spec.as_str(), target]))
    }

    fn apply_modes(&self, target: &str) -> Result<(), StepError> {
        self.runner.run(&CommandSpec::new("find").args([
            target, "-type", "d", "-exec", "chmod", "755", "{}", "+",
        ]))?;
        self.runner.run(&CommandSpec::new("find").args([
            target, "-type", "f", "-exec", "chmod", "644", "{}", "+",
        ]))
    }

    fn fix_writable_dir(&self, dir: &Path, group: &str, use_acl: bool) {
        let target = dir.display().to_string();
        let setgid = CommandSpec::new("chmod").args(["g+s", target.as_str()]);
        let group_writable = CommandSpec::new("chmod").args(["-R", "775", target.as_str()]);
        let result = if use_acl {
            self.apply_acls(&target, group)
                .and_then(|()| self.runner.run(&setgid))
                .or_else(|e| {
                    tracing::warn!(dir = %target, error = %e, "ACL failed, falling back to chmod 775");
                    self.runner.run(&group_writable)
                })
        } else {
            self.runner.run(&group_writable)
        };
        if let Err(e) = result {
            tracing::warn!(dir = %target, error = %e, "could not make directory writable");
        }
    }
}

impl PermissionFixer for AclPermissionFixer {
    fn fix_permissions(&self, path: &Path, backend: BackendId) -> Result<(), StepError> {
        let target = path.display().to_string();
        let group = self.group_for(backend);
        let owner = format!("{}:{group}", self.identity.user);
        tracing::debug!(path = %target, %owner, %backend, "fixing permissions");

        self.runner
            .run(&CommandSpec::new("chown").args(["-R", owner.as_str(), target.as_str()]))?;

        let use_acl = self.runner.is_available("setfacl");
        if use_acl {
            if let Err(e) = self.apply_acls(target.as_str(), group) {
                tracing::warn!(path = %target, error = %e, "ACL failed, falling back to chmod");
                self.apply_modes(target.as_str())?;
            }
        } else {
            tracing::debug!("setfacl not found, using chmod");
            self.apply_modes(target.as_str())?;
        }

        for rel in WRITABLE_DIRS {
            let dir = path.join(rel);
            if dir.is_dir() {
                self.fix_writable_dir(&dir, group, use_acl);
            }
        }
        tracing::info!(path = %target, "permissions fixed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::recording::RecordingRunner;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn identity() -> Identity {
        Identity {
            user: "alice".into(),
            home: PathBuf::from("/home/alice"),
        }
    }

    fn fixer(runner: &Rc<RecordingRunner>) -> AclPermissionFixer {
        AclPermissionFixer::new(identity(), "www-data", runner.clone())
    }

    #[test]
    fn acl_path_chowns_then_sets_access_and_default_acls() {
        let root = TempDir::new().unwrap();
        let runner = Rc::new(RecordingRunner::available(&["setfacl"]));
        fixer(&runner)
            .fix_permissions(root.path(), BackendId::Nginx)
            .unwrap();

        let t = root.path().display();
        let spec = "u::rwx,g::rwx,o::rx,u:alice:rwx,g:www-data:rwx";
        assert_eq!(
            runner.calls(),
            vec![
                format!("chown -R alice:www-data {t}"),
                format!("setfacl -R -m {spec} {t}"),
                format!("setfacl -R -d -m {spec} {t}"),
            ]
        );
    }

    #[test]
    fn without_setfacl_falls_back_to_modes() {
        let root = TempDir::new().unwrap();
        let runner = Rc::new(RecordingRunner::default());
        fixer(&runner)
            .fix_permissions(root.path(), BackendId::Apache)
            .unwrap();

        let calls = runner.calls();
        assert!(calls[1].contains("-type d -exec chmod 755"));
        assert!(calls[2].contains("-type f -exec chmod 644"));
    }

    #[test]
    fn laravel_writable_dirs_get_setgid() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("storage")).unwrap();
        std::fs::create_dir_all(root.path().join("bootstrap/cache")).unwrap();
        let runner = Rc::new(RecordingRunner::available(&["setfacl"]));
        fixer(&runner)
            .fix_permissions(root.path(), BackendId::Nginx)
            .unwrap();

        let setgid: Vec<String> = runner
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("chmod g+s"))
            .collect();
        assert_eq!(setgid.len(), 2);
        assert!(setgid[0].ends_with("storage"));
        assert!(setgid[1].ends_with("cache"));
    }

    #[test]
    fn chown_failure_is_an_error() {
        let root = TempDir::new().unwrap();
        let runner = Rc::new(RecordingRunner::default().failing("chown"));
        let err = fixer(&runner).fix_permissions(root.path(), BackendId::Nginx);
        assert!(matches!(err, Err(StepError::Command { .. })));
    }

    #[test]
    fn acl_failure_falls_back_without_error() {
        let root = TempDir::new().unwrap();
        let runner = Rc::new(RecordingRunner::available(&["setfacl"]).failing("setfacl"));
        fixer(&runner)
            .fix_permissions(root.path(), BackendId::Nginx)
            .unwrap();
        assert!(runner.calls().iter().any(|c| c.contains("chmod 755")));
    }

    #[test]
    fn backend_group_replaces_shared_group() {
        let root = TempDir::new().unwrap();
        let runner = Rc::new(RecordingRunner::available(&["setfacl"]));
        let acl = fixer(&runner).with_backend_group(BackendId::Nginx, "nginx");
        acl.fix_permissions(root.path(), BackendId::Nginx).unwrap();
        acl.fix_permissions(root.path(), BackendId::Apache).unwrap();

        let t = root.path().display();
        let calls = runner.calls();
        assert_eq!(calls[0], format!("chown -R alice:nginx {t}"));
        assert!(calls[1].contains("g:nginx:rwx"));
        assert_eq!(calls[3], format!("chown -R alice:www-data {t}"));
        assert!(calls[4].contains("g:www-data:rwx"));
    }
}
