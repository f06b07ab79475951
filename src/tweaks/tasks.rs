//! Built-in task handlers.
//!
//! Handlers receive a spec whose placeholders are already resolved and whose
//! field contract has been validated, plus the runtime context for the
//! current invocation. Every handler is side-effecting; failures abort the
//! whole tweak.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{DefinitionError, Result, TaskError};
use crate::regedit::{self, DELETE_SENTINEL, quote};

use super::context::RuntimeContext;
use super::model::TaskSpec;

/// User-Agent header sent with downloads.
const USER_AGENT: &str = concat!("prefixer/", env!("CARGO_PKG_VERSION"), " (Linux)");

/// `download`: fetch `url` into the scratch directory as `filename` and
/// verify its SHA-256 digest against `checksum`.
///
/// Offline mode skips the network entirely: the file must already sit in
/// the user's download directory and is copied into scratch unverified.
/// A checksum mismatch prompts the user; declining removes the file and
/// fails the task.
pub fn download(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let filename = spec.filename()?;
    let dest = runtime.operation_path().join(filename);

    if runtime.offline() {
        let local = dirs::download_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(filename);
        if !local.is_file() {
            return Err(TaskError::MissingSource { path: local }.into());
        }
        tracing::info!("offline: using local file {}", local.display());
        fs::copy(&local, &dest).map_err(|source| TaskError::io(&dest, source))?;
        return Ok(());
    }

    let url = spec.url()?;
    tracing::info!("downloading {filename} from {url}");
    fetch(url, &dest)?;

    tracing::info!("verifying checksum");
    let expected = spec.checksum()?;
    let actual = sha256_file(&dest)?;
    if actual != expected.to_lowercase() {
        tracing::warn!("checksum mismatch: expected {expected}, got {actual}");
        if !confirm("Keep the unverified file anyway?")? {
            let _ = fs::remove_file(&dest);
            return Err(TaskError::ChecksumRejected {
                filename: filename.to_string(),
                expected: expected.to_string(),
                actual,
            }
            .into());
        }
        tracing::warn!("keeping unverified file at user request");
    }
    Ok(())
}

fn fetch(url: &str, dest: &Path) -> Result<()> {
    let response = ureq::get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| TaskError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let mut reader = response.into_body().into_reader();
    let mut file = fs::File::create(dest).map_err(|source| TaskError::io(dest, source))?;
    io::copy(&mut reader, &mut file).map_err(|source| TaskError::io(dest, source))?;
    Ok(())
}

/// SHA-256 digest of a file as a lowercase hex string.
pub(crate) fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).map_err(|source| TaskError::io(path, source))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|source| TaskError::io(path, source))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Ask the user a yes/no question on the controlling terminal.
///
/// Anything other than an explicit yes (including EOF) answers no.
fn confirm(prompt: &str) -> Result<bool> {
    let mut out = io::stderr();
    write!(out, "{prompt} [y/N] ").map_err(|source| TaskError::io("stderr", source))?;
    out.flush().map_err(|source| TaskError::io("stderr", source))?;

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return Ok(false);
    }
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// `extract`: unpack the zip archive `filename` from the scratch directory
/// into `path`, creating the target directory when needed.
pub fn extract(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let target = PathBuf::from(spec.path()?);
    if !target.exists() {
        tracing::info!("target {} does not exist, creating", target.display());
        fs::create_dir_all(&target).map_err(|source| TaskError::io(&target, source))?;
    }

    let archive_path = runtime.operation_path().join(spec.filename()?);
    let file = fs::File::open(&archive_path).map_err(|source| TaskError::io(&archive_path, source))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|_| TaskError::BadArchive {
        path: archive_path.clone(),
    })?;
    archive.extract(&target).map_err(|_| TaskError::BadArchive {
        path: archive_path.clone(),
    })?;
    tracing::info!("extracted {} into {}", archive_path.display(), target.display());
    Ok(())
}

/// `extract_cab`: unpack the CAB archive `filename` from the scratch
/// directory into `path`, creating the target directory when needed.
///
/// CAB extraction goes through the host's `cabextract` tool; a missing
/// tool or a non-zero exit fails the task.
pub fn extract_cab(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let target = PathBuf::from(spec.path()?);
    if !target.exists() {
        tracing::info!("target {} does not exist, creating", target.display());
        fs::create_dir_all(&target).map_err(|source| TaskError::io(&target, source))?;
    }

    let archive = runtime.operation_path().join(spec.filename()?);
    tracing::info!("extracting CAB {}", archive.display());

    let status = std::process::Command::new("cabextract")
        .arg("-q")
        .arg("-d")
        .arg(&target)
        .arg(&archive)
        .status()
        .map_err(|source| TaskError::io("cabextract", source))?;
    if !status.success() {
        return Err(TaskError::Process {
            program: "cabextract".to_string(),
            code: status.code(),
        }
        .into());
    }
    Ok(())
}

/// `copy`: copy the file or directory tree at `path` to `new_path`.
pub fn copy(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let from = PathBuf::from(spec.path()?);
    let to = PathBuf::from(spec.new_path()?);
    tracing::info!("copying {} to {}", from.display(), to.display());

    if from.is_file() {
        fs::copy(&from, &to).map_err(|source| TaskError::io(&to, source))?;
    } else {
        copy_recursive(&from, &to)?;
    }
    Ok(())
}

/// Recursive directory copy; existing destination directories are merged.
fn copy_recursive(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|source| TaskError::io(to, source))?;
    let entries = fs::read_dir(from).map_err(|source| TaskError::io(from, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| TaskError::io(from, source))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let kind = entry
            .file_type()
            .map_err(|source| TaskError::io(&src, source))?;
        if kind.is_dir() {
            copy_recursive(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|source| TaskError::io(&dst, source))?;
        }
    }
    Ok(())
}

/// `rename`: move `path` to `new_path`.
pub fn rename(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let from = spec.path()?;
    let to = spec.new_path()?;
    tracing::info!("renaming {from} to {to}");
    fs::rename(from, to).map_err(|source| TaskError::io(from, source))?;
    Ok(())
}

/// `delete`: remove the file or directory tree at `path`.
pub fn delete(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let target = PathBuf::from(spec.path()?);
    tracing::info!("deleting {}", target.display());
    if target.is_file() {
        fs::remove_file(&target).map_err(|source| TaskError::io(&target, source))?;
    } else {
        fs::remove_dir_all(&target).map_err(|source| TaskError::io(&target, source))?;
    }
    Ok(())
}

/// `create`: write `content` to a new file at `path`.
pub fn create(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let target = spec.path()?;
    tracing::info!("creating {target}");
    fs::write(target, spec.content()?).map_err(|source| TaskError::io(target, source))?;
    Ok(())
}

/// `regedit`: apply `values` to the node at `path` in the hive named by
/// `filename` under the prefix root.
///
/// Bare string values are quoted; values already carrying a `dword:` or
/// `hex:` marker, and the removal sentinel, pass through raw. The previous
/// hive is kept alongside as a `.bak` copy.
pub fn regedit(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let filename = spec.filename()?;
    let hive_path = runtime.prefix().pfx_path.join(filename);
    let mut hive = regedit::load_hive(&hive_path)?;

    let node_path = spec.path()?.replace('\\', "\\\\");
    let node = hive.ensure_node(&node_path);

    for (name, value) in spec.values()? {
        let raw = format_reg_value(value);
        node.set(name, &raw);
    }

    let backup = runtime.prefix().pfx_path.join(format!("{filename}.bak"));
    fs::copy(&hive_path, &backup).map_err(|source| TaskError::io(&backup, source))?;
    regedit::save_hive(&hive, &hive_path)?;
    tracing::info!("updated {} ({node_path})", hive_path.display());
    Ok(())
}

/// Format a definition-supplied registry value as its raw stored form.
fn format_reg_value(value: &str) -> String {
    if value == DELETE_SENTINEL
        || value.starts_with("dword:")
        || value.starts_with("hex:")
        || value.starts_with("hex(")
    {
        value.to_string()
    } else {
        quote(value)
    }
}

/// `run_exe`: run the executable at `path` with `args` inside the prefix.
///
/// A non-zero exit from the wrapped runtime fails the task.
pub fn run_exe(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let path = spec.path()?;
    let args = spec.args()?;
    tracing::info!("running {path} with args {args:?}");

    let result = runtime.prefix().run(Path::new(path), args, false)?;
    if !result.success {
        return Err(TaskError::Process {
            program: path.to_string(),
            code: result.code,
        }
        .into());
    }
    Ok(())
}

/// `wineserver`: control the prefix's server process.
///
/// `kill` forcibly terminates it, `wait` blocks until all prefix processes
/// exit. The exit status is ignored; killing an idle prefix is not an
/// error.
pub fn wineserver(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let action = spec.action()?;
    let flag = match action {
        "kill" => "-k",
        "wait" => "-w",
        other => {
            return Err(DefinitionError::InvalidValue {
                field: "action",
                value: other.to_string(),
                message: "expected 'kill' or 'wait'".to_string(),
            }
            .into());
        }
    };

    if action == "wait" {
        tracing::info!("waiting for prefix processes to exit (this might take a while)");
    } else {
        tracing::info!(
            "terminating prefix {}",
            runtime.prefix().pfx_path.display()
        );
    }
    runtime
        .prefix()
        .run(Path::new("wineserver"), &[flag.to_string()], true)?;
    Ok(())
}

/// `install_font`: copy `filename` from the scratch directory into the
/// prefix's font directory and register it as `name` in `system.reg`.
pub fn install_font(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let filename = spec.filename()?;
    let font_name = spec.name()?;
    let source = runtime.operation_path().join(filename);
    let fonts_dir = runtime
        .prefix()
        .pfx_path
        .join("drive_c")
        .join("windows")
        .join("Fonts");

    tracing::info!("installing font {font_name} ({filename})");
    fs::create_dir_all(&fonts_dir).map_err(|source| TaskError::io(&fonts_dir, source))?;
    let dest = fonts_dir.join(filename);
    fs::copy(&source, &dest).map_err(|source| TaskError::io(&dest, source))?;

    let mut values = std::collections::BTreeMap::new();
    values.insert(font_name.to_string(), filename.to_string());
    let reg_spec = TaskSpec {
        description: "register font".to_string(),
        task_type: "regedit".to_string(),
        path: Some("Software\\Microsoft\\Windows NT\\CurrentVersion\\Fonts".to_string()),
        filename: Some("system.reg".to_string()),
        values: Some(values),
        ..Default::default()
    };
    regedit(&reg_spec, runtime)
}

/// `message`: surface `content` to the user.
pub fn message(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    tracing::info!("{}", spec.content()?);
    Ok(())
}

/// `pause`: block until the user presses Enter.
///
/// Takes no fields. EOF on stdin (non-interactive runs) continues
/// immediately.
pub fn pause(_spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let mut out = io::stderr();
    write!(out, "Press Enter to continue... ").map_err(|source| TaskError::io("stderr", source))?;
    out.flush().map_err(|source| TaskError::io("stderr", source))?;

    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
    Ok(())
}

/// `edit_ini`: set `values` in section `path` of the INI file `filename`.
///
/// The file is edited line by line rather than through an INI parser, so
/// comments and nonstandard formatting elsewhere in the file survive. The
/// file and the section are created when absent; existing keys are matched
/// case-insensitively and rewritten in place.
pub fn edit_ini(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let filepath = PathBuf::from(spec.filename()?);
    let section = spec.path()?;
    let values = spec.values()?;
    tracing::info!("editing {} [{section}]", filepath.display());

    if !filepath.exists() {
        let mut content = format!("[{section}]\n");
        for (k, v) in values {
            content.push_str(&format!("{k}={v}\n"));
        }
        fs::write(&filepath, content).map_err(|source| TaskError::io(&filepath, source))?;
        return Ok(());
    }

    let original = fs::read_to_string(&filepath).map_err(|source| TaskError::io(&filepath, source))?;
    let mut lines: Vec<String> = original.lines().map(str::to_string).collect();

    let header = format!("[{section}]");
    let section_idx = lines.iter().position(|l| l.trim() == header);

    if let Some(start) = section_idx {
        let mut written: Vec<&str> = Vec::new();
        let mut i = start + 1;
        while i < lines.len() {
            if lines[i].trim().starts_with('[') {
                break;
            }
            for (k, v) in values {
                let key_prefix = format!("{}=", k.to_lowercase());
                if lines[i].trim().to_lowercase().starts_with(&key_prefix) {
                    lines[i] = format!("{k}={v}");
                    written.push(k);
                }
            }
            i += 1;
        }
        for (k, v) in values.iter().rev() {
            if !written.contains(&k.as_str()) {
                lines.insert(start + 1, format!("{k}={v}"));
            }
        }
    } else {
        lines.push(String::new());
        lines.push(header);
        for (k, v) in values {
            lines.push(format!("{k}={v}"));
        }
    }

    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&filepath, content).map_err(|source| TaskError::io(&filepath, source))?;
    Ok(())
}

/// `text_replace`: apply every `values` substitution to the file at `path`.
///
/// Pairs are applied one at a time in sorted key order (the `values` map
/// is a `BTreeMap`), so overlapping patterns resolve deterministically:
/// `"a"` is applied before `"ab"`, regardless of definition-file order.
pub fn text_replace(spec: &TaskSpec, _runtime: &RuntimeContext) -> Result<()> {
    let target = spec.path()?;
    let mut content = fs::read_to_string(target).map_err(|source| TaskError::io(target, source))?;
    for (old, new) in spec.values()? {
        content = content.replace(old, new);
    }
    fs::write(target, content).map_err(|source| TaskError::io(target, source))?;
    Ok(())
}

/// `register_dll`: register the DLL at `path` through `regsvr32`.
///
/// A missing DLL is logged and skipped rather than failing the tweak.
pub fn register_dll(spec: &TaskSpec, runtime: &RuntimeContext) -> Result<()> {
    let path = spec.path()?;
    if !Path::new(path).exists() {
        tracing::warn!("DLL not found at {path}, skipping registration");
        return Ok(());
    }

    tracing::info!("registering DLL {path}");
    runtime.prefix().run(
        Path::new("regsvr32"),
        &["/s".to_string(), path.to_string()],
        true,
    )?;
    Ok(())
}
