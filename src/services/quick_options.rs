use crate::models::QuickOption;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::{ErrorKind, Write};
use std::sync::{Mutex, PoisonError, RwLock};
use tempfile::NamedTempFile;

const COMMANDS_HEADER: &str = "# Frequently used commands and hotkeys\n\
# One entry per line, lines starting with # are comments\n\
# A [KEY] prefix sends the entry as a hotkey instead of text\n\n";

const PHRASES_HEADER: &str = "# Frequently used phrases\n\
# One entry per line, lines starting with # are comments\n\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Collections {
    commands: Vec<String>,
    phrases: Vec<String>,
}

/// Saved commands and phrases shown on the phone, backed by two flat files.
///
/// Readers always see a consistent pair of collections: both lists are swapped
/// together, and only after both backing files were written.
#[derive(Debug)]
pub struct QuickOptionsStore {
    commands_path: Utf8PathBuf,
    phrases_path: Utf8PathBuf,
    collections: RwLock<Collections>,
    /// Serialises saves and reloads so neither sees the other's files half done.
    save_lock: Mutex<()>,
}

impl QuickOptionsStore {
    /// Create a store bound to its files without reading them.
    pub fn new(commands_path: impl Into<Utf8PathBuf>, phrases_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            commands_path: commands_path.into(),
            phrases_path: phrases_path.into(),
            collections: RwLock::new(Collections::default()),
            save_lock: Mutex::new(()),
        }
    }

    /// Create a store and populate it from its files.
    pub fn load(
        commands_path: impl Into<Utf8PathBuf>,
        phrases_path: impl Into<Utf8PathBuf>,
    ) -> Result<Self> {
        let store = Self::new(commands_path, phrases_path);
        store.reload()?;
        Ok(store)
    }

    /// Re-read both files. Missing files yield empty collections.
    pub fn reload(&self) -> Result<()> {
        // A save must not rename files between the two reads
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let commands = read_entries(&self.commands_path)?;
        let phrases = read_entries(&self.phrases_path)?;

        tracing::info!(
            "Loaded quick options: {} commands, {} phrases",
            commands.len(),
            phrases.len()
        );

        *self.write_collections() = Collections { commands, phrases };
        Ok(())
    }

    /// Replace and persist both collections.
    ///
    /// Entries are trimmed; blank and `#` entries are dropped since they would not
    /// survive a reload. On error the in-memory collections are left untouched and
    /// the commands file is put back byte for byte.
    pub fn save(&self, commands: &[String], phrases: &[String]) -> Result<()> {
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let next = Collections {
            commands: normalize(commands),
            phrases: normalize(phrases),
        };
        let previous_commands = read_existing(&self.commands_path)?;

        let commands_file = stage(&self.commands_path, COMMANDS_HEADER, &next.commands)?;
        let phrases_file = stage(&self.phrases_path, PHRASES_HEADER, &next.phrases)?;

        commands_file
            .persist(&self.commands_path)
            .with_context(|| format!("Failed to replace {}", self.commands_path))?;

        if let Err(e) = phrases_file.persist(&self.phrases_path) {
            // Put the previous commands file back so the files stay a matching pair
            if let Err(restore_err) = restore(&self.commands_path, previous_commands.as_deref()) {
                tracing::error!(
                    "Failed to restore {} after aborted save: {:#}",
                    self.commands_path,
                    restore_err
                );
            }
            return Err(e.error)
                .with_context(|| format!("Failed to replace {}", self.phrases_path));
        }

        tracing::info!(
            "Saved quick options: {} commands, {} phrases",
            next.commands.len(),
            next.phrases.len()
        );
        *self.write_collections() = next;
        Ok(())
    }

    /// Current `(commands, phrases)`.
    pub fn snapshot(&self) -> (Vec<String>, Vec<String>) {
        let collections = self.read_collections();
        (collections.commands.clone(), collections.phrases.clone())
    }

    pub fn commands(&self) -> Vec<String> {
        self.read_collections().commands.clone()
    }

    pub fn phrases(&self) -> Vec<String> {
        self.read_collections().phrases.clone()
    }

    /// Commands parsed into text or hotkey directives.
    pub fn parsed_commands(&self) -> Vec<QuickOption> {
        self.read_collections()
            .commands
            .iter()
            .map(|c| QuickOption::parse(c))
            .collect()
    }

    pub fn commands_path(&self) -> &Utf8Path {
        &self.commands_path
    }

    pub fn phrases_path(&self) -> &Utf8Path {
        &self.phrases_path
    }

    fn read_collections(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_collections(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_entries(path: &Utf8Path) -> Result<Vec<String>> {
    if !path.exists() {
        tracing::warn!("Quick option file not found at {}, starting empty", path);
        return Ok(Vec::new());
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    Ok(content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn normalize(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && !e.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn render(header: &str, entries: &[String]) -> String {
    let mut body = String::from(header);
    for entry in entries {
        body.push_str(entry);
        body.push('\n');
    }
    body
}

/// Write `entries` into a temp file next to `target`, ready to be persisted.
fn stage(target: &Utf8Path, header: &str, entries: &[String]) -> Result<NamedTempFile> {
    let dir = target
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir))?;
    file.write_all(render(header, entries).as_bytes())
        .with_context(|| format!("Failed to write staged copy of {}", target))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush staged copy of {}", target))?;
    Ok(file)
}

/// Current bytes of `path`, or `None` when it does not exist.
fn read_existing(path: &Utf8Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path)),
    }
}

/// Return `path` to the state captured by [`read_existing`].
fn restore(path: &Utf8Path, previous: Option<&[u8]>) -> Result<()> {
    match previous {
        Some(bytes) => {
            fs::write(path, bytes).with_context(|| format!("Failed to restore {}", path))
        }
        None => fs::remove_file(path).with_context(|| format!("Failed to remove {}", path)),
    }
}
