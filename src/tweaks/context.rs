//! Per-invocation runtime state shared by every task and condition handler.

use std::path::{Path, PathBuf};

use crate::error::TaskError;
use crate::prefix::Prefix;

/// Placeholder token for the prefix root.
const PFXDIR: &str = "<pfxdir>";
/// Placeholder token for the wrapped program's working-files directory.
const GAMEDIR: &str = "<gamedir>";
/// Placeholder token for the per-invocation scratch directory.
const TEMPDIR: &str = "<tempdir>";

/// Scratch space for one engine invocation.
///
/// The default variant removes itself on drop; `Kept` survives for
/// post-mortem inspection when the user asks for it.
enum Scratch {
    Temp(tempfile::TempDir),
    Kept(PathBuf),
}

impl Scratch {
    fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Kept(path) => path,
        }
    }
}

/// Everything a handler needs: the target prefix, the scratch directory,
/// and the offline flag.
pub struct RuntimeContext {
    prefix: Prefix,
    scratch: Scratch,
    offline: bool,
}

impl RuntimeContext {
    /// Create a context for one invocation against `prefix`.
    ///
    /// With `keep_scratch` set, the scratch directory is persisted instead
    /// of being removed on drop.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Io`] when the scratch directory cannot be
    /// created or persisted.
    pub fn new(prefix: Prefix, keep_scratch: bool, offline: bool) -> Result<Self, TaskError> {
        let dir = tempfile::Builder::new()
            .prefix("prefixer-")
            .tempdir()
            .map_err(|source| TaskError::io(std::env::temp_dir(), source))?;
        let scratch = if keep_scratch {
            let path = dir.keep();
            tracing::info!("keeping scratch directory {}", path.display());
            Scratch::Kept(path)
        } else {
            Scratch::Temp(dir)
        };
        Ok(Self {
            prefix,
            scratch,
            offline,
        })
    }

    /// The target prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// The per-invocation scratch directory.
    #[must_use]
    pub fn operation_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Whether network access is disallowed for this invocation.
    #[must_use]
    pub const fn offline(&self) -> bool {
        self.offline
    }

    /// Substitute placeholder tokens in `input`.
    ///
    /// Single pass, left to right: at each position the earliest-starting
    /// token is replaced and scanning resumes after the substituted text, so
    /// tokens introduced by a substitution are never expanded again.
    #[must_use]
    pub fn expand(&self, input: &str) -> String {
        let replacements = [
            (PFXDIR, self.prefix.pfx_path.as_path()),
            (GAMEDIR, self.prefix.files_path.as_path()),
            (TEMPDIR, self.scratch.path()),
        ];

        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        loop {
            let hit = replacements
                .iter()
                .filter_map(|(token, path)| rest.find(token).map(|at| (at, *token, *path)))
                .min_by_key(|(at, _, _)| *at);
            let Some((at, token, path)) = hit else {
                out.push_str(rest);
                return out;
            };
            out.push_str(&rest[..at]);
            out.push_str(&path.to_string_lossy());
            rest = &rest[at + token.len()..];
        }
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("prefix", &self.prefix)
            .field("scratch", &self.scratch.path())
            .field("offline", &self.offline)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::super::test_helpers::make_runtime;

    #[test]
    fn expands_all_three_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let pfx = runtime.prefix().pfx_path.display().to_string();
        let game = runtime.prefix().files_path.display().to_string();
        let temp = runtime.operation_path().display().to_string();

        assert_eq!(runtime.expand("<pfxdir>/user.reg"), format!("{pfx}/user.reg"));
        assert_eq!(runtime.expand("<gamedir>/bin"), format!("{game}/bin"));
        assert_eq!(runtime.expand("<tempdir>/dl"), format!("{temp}/dl"));
    }

    #[test]
    fn substitution_is_single_pass() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        // A token produced by an earlier substitution must not expand.
        let out = runtime.expand("<tempdir>");
        let again = runtime.expand(&format!("{out}<pfxdir>"));
        assert!(again.starts_with(&out));
        assert!(!again.contains("<pfxdir>"));

        let plain = runtime.expand("no tokens here");
        assert_eq!(plain, "no tokens here");
    }

    #[test]
    fn multiple_tokens_in_one_string() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());

        let out = runtime.expand("<pfxdir>:<gamedir>");
        let pfx = runtime.prefix().pfx_path.display().to_string();
        let game = runtime.prefix().files_path.display().to_string();
        assert_eq!(out, format!("{pfx}:{game}"));

        let temp = runtime.operation_path().display().to_string();
        let mixed = runtime.expand("<pfxdir>/x/<tempdir>/y");
        assert_eq!(mixed, format!("{pfx}/x/{temp}/y"));
    }

    #[test]
    fn scratch_directory_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let (runtime, _) = make_runtime(tmp.path());
        assert!(runtime.operation_path().is_dir());
    }
}
