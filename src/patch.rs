use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A text anchor: the documented, narrowly-scoped way this tool locates an
/// edit point inside a file it does not own.
///
/// Anchors are deliberately literal. The target files are generated by another
/// tool's scaffolder, and any drift from the spelling documented here must
/// surface as [`PatchOutcome::PatternNotFound`] instead of a guessed edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// First exact occurrence of the substring, anywhere in the file.
    Substring(String),
    /// First line whose text, after leading whitespace, starts with the
    /// prefix. A leading `#` is not whitespace, so `LineStart("DB_HOST=")`
    /// does not match a commented `# DB_HOST=...` line.
    LineStart(String),
}

/// Matched byte range within the file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Anchor {
    pub fn substring(text: impl Into<String>) -> Self {
        Anchor::Substring(text.into())
    }

    pub fn line_start(prefix: impl Into<String>) -> Self {
        Anchor::LineStart(prefix.into())
    }

    /// Locate the anchor in `content`.
    ///
    /// For [`Anchor::LineStart`] the span covers the whole matched line,
    /// excluding its terminator (`\n` or `\r\n`).
    pub fn find(&self, content: &str) -> Option<Span> {
        match self {
            Anchor::Substring(needle) => content.find(needle.as_str()).map(|start| Span {
                start,
                end: start + needle.len(),
            }),
            Anchor::LineStart(prefix) => {
                let mut offset = 0;
                for line in content.split_inclusive('\n') {
                    let body = line.strip_suffix('\n').unwrap_or(line);
                    let body = body.strip_suffix('\r').unwrap_or(body);
                    if body.trim_start().starts_with(prefix.as_str()) {
                        return Some(Span {
                            start: offset,
                            end: offset + body.len(),
                        });
                    }
                    offset += line.len();
                }
                None
            }
        }
    }

    pub fn matches(&self, content: &str) -> bool {
        self.find(content).is_some()
    }
}

/// The edit a rule performs once its anchor is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace exactly the matched span.
    ReplaceSpan { with: String },
    /// Replace the whole line containing the match, keeping its terminator.
    ReplaceLine { with: String },
    /// Insert a block on its own line(s) directly below the matched line.
    InsertAfterLine { text: String },
    /// Replace the entire file content. Still gated on marker and anchor so
    /// an operator's hand-rolled file is reported, never clobbered.
    ReplaceFile { with: String },
}

/// One conditional edit against a well-known target file.
///
/// `marker` is the idempotence gate: its presence means the edit has already
/// been made, and it is checked before anything else. Every `Edit` must write
/// text that makes `marker` match on the next run; the rule tests in
/// `recipe::rules` pin that property for each concrete rule.
#[derive(Debug, Clone)]
pub struct PatchRule {
    /// Short name used in status lines, e.g. `"env app name"`.
    pub label: &'static str,
    pub marker: Anchor,
    /// Tried in order; first hit wins. Multiple spellings let a rule tolerate
    /// the known variants a generator emits for the same insertion point.
    pub anchors: Vec<Anchor>,
    pub edit: Edit,
    /// Operator-facing diagnostic when every anchor misses.
    pub not_found: String,
}

/// Append-only rule: register one entry at the end of a list-style file.
#[derive(Debug, Clone)]
pub struct AppendRule {
    pub label: &'static str,
    /// Containment test for the entry; a hit means already registered.
    pub present: Anchor,
    /// Written before `text` when the target file has to be bootstrapped.
    pub header: String,
    pub text: String,
}

/// Scaffold rule: create a file from a template, never overwrite.
#[derive(Debug, Clone)]
pub struct ScaffoldRule {
    pub label: &'static str,
    pub contents: String,
}

/// Result of one patch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be reported, not dropped"]
pub enum PatchOutcome {
    /// The edit was made and the file rewritten.
    Applied { file: PathBuf },
    /// The marker (or target file, for scaffolds) was already present.
    AlreadyPresent { file: PathBuf },
    /// The target file does not exist; nothing was created.
    FileMissing { file: PathBuf },
    /// No anchor matched; content untouched. Recoverable by the operator.
    PatternNotFound { file: PathBuf, detail: String },
}

impl std::fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchOutcome::Applied { file } => write!(f, "applied to {}", file.display()),
            PatchOutcome::AlreadyPresent { file } => {
                write!(f, "already present in {}", file.display())
            }
            PatchOutcome::FileMissing { file } => {
                write!(f, "file missing: {}", file.display())
            }
            PatchOutcome::PatternNotFound { file, detail } => {
                write!(f, "anchor not found in {}: {}", file.display(), detail)
            }
        }
    }
}

impl PatchOutcome {
    pub fn file(&self) -> &Path {
        match self {
            PatchOutcome::Applied { file }
            | PatchOutcome::AlreadyPresent { file }
            | PatchOutcome::FileMissing { file }
            | PatchOutcome::PatternNotFound { file, .. } => file,
        }
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of evaluating a rule against content, without touching the disk.
///
/// This is the pure decision ladder shared by [`patch`] and the read-only
/// `status` path: marker first, anchors second, transform last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    AlreadyPresent,
    PatternNotFound,
    Apply { new_content: String },
}

pub fn evaluate(content: &str, rule: &PatchRule) -> Decision {
    // Idempotence gate: checked before anchors so a file that was hand-edited
    // after install (marker kept, anchor gone) reads as already done.
    if rule.marker.matches(content) {
        return Decision::AlreadyPresent;
    }

    let Some(span) = rule.anchors.iter().find_map(|a| a.find(content)) else {
        return Decision::PatternNotFound;
    };

    let new_content = match &rule.edit {
        Edit::ReplaceSpan { with } => {
            let mut out = String::with_capacity(content.len() + with.len());
            out.push_str(&content[..span.start]);
            out.push_str(with);
            out.push_str(&content[span.end..]);
            out
        }
        Edit::ReplaceLine { with } => {
            let (line_start, line_end, _) = line_bounds(content, span);
            let mut out = String::with_capacity(content.len() + with.len());
            out.push_str(&content[..line_start]);
            out.push_str(with);
            out.push_str(&content[line_end..]);
            out
        }
        Edit::InsertAfterLine { text } => {
            let (_, _, after_terminator) = line_bounds(content, span);
            let mut out = String::with_capacity(content.len() + text.len() + 2);
            out.push_str(&content[..after_terminator]);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(text);
            out.push('\n');
            out.push_str(&content[after_terminator..]);
            out
        }
        Edit::ReplaceFile { with } => with.clone(),
    };

    Decision::Apply { new_content }
}

/// Apply one rule to the file at `target`.
///
/// Contract, in order: missing file is `FileMissing` with no side effect;
/// a marker hit is `AlreadyPresent` with no side effect; an anchor miss is
/// `PatternNotFound` with no side effect. Only then is the new content built
/// in memory and the file replaced with a single atomic whole-file write.
pub fn patch(target: &Path, rule: &PatchRule) -> Result<PatchOutcome, PatchError> {
    if !target.exists() {
        return Ok(PatchOutcome::FileMissing {
            file: target.to_path_buf(),
        });
    }

    let content = read(target)?;

    match evaluate(&content, rule) {
        Decision::AlreadyPresent => Ok(PatchOutcome::AlreadyPresent {
            file: target.to_path_buf(),
        }),
        Decision::PatternNotFound => Ok(PatchOutcome::PatternNotFound {
            file: target.to_path_buf(),
            detail: rule.not_found.clone(),
        }),
        Decision::Apply { new_content } => {
            atomic_write(target, new_content.as_bytes())?;
            Ok(PatchOutcome::Applied {
                file: target.to_path_buf(),
            })
        }
    }
}

/// Append variant: register an entry at the end of a list-style file.
///
/// A missing target is the bootstrap case: parent directories are created and
/// the file is written as `header + text`. Otherwise the original bytes stay
/// untouched at the start and `text` is appended after a newline separator.
pub fn append(target: &Path, rule: &AppendRule) -> Result<PatchOutcome, PatchError> {
    if !target.exists() {
        ensure_parent(target)?;
        let mut bootstrap = String::with_capacity(rule.header.len() + rule.text.len() + 1);
        bootstrap.push_str(&rule.header);
        bootstrap.push_str(&rule.text);
        if !bootstrap.ends_with('\n') {
            bootstrap.push('\n');
        }
        atomic_write(target, bootstrap.as_bytes())?;
        return Ok(PatchOutcome::Applied {
            file: target.to_path_buf(),
        });
    }

    let content = read(target)?;

    if rule.present.matches(&content) {
        return Ok(PatchOutcome::AlreadyPresent {
            file: target.to_path_buf(),
        });
    }

    let mut out = String::with_capacity(content.len() + rule.text.len() + 2);
    out.push_str(&content);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&rule.text);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    atomic_write(target, out.as_bytes())?;

    Ok(PatchOutcome::Applied {
        file: target.to_path_buf(),
    })
}

/// Scaffold variant: write the template only if nothing exists at `target`.
pub fn scaffold(target: &Path, rule: &ScaffoldRule) -> Result<PatchOutcome, PatchError> {
    if target.exists() {
        return Ok(PatchOutcome::AlreadyPresent {
            file: target.to_path_buf(),
        });
    }

    ensure_parent(target)?;
    atomic_write(target, rule.contents.as_bytes())?;

    Ok(PatchOutcome::Applied {
        file: target.to_path_buf(),
    })
}

/// Bounds of the line containing `span`: (line start, line end excluding the
/// terminator, first byte after the terminator). `\r\n` counts as terminator.
fn line_bounds(content: &str, span: Span) -> (usize, usize, usize) {
    let line_start = content[..span.start].rfind('\n').map_or(0, |i| i + 1);
    match content[span.end..].find('\n') {
        Some(i) => {
            let newline = span.end + i;
            let mut line_end = newline;
            if line_end > line_start && content.as_bytes()[line_end - 1] == b'\r' {
                line_end -= 1;
            }
            (line_start, line_end, newline + 1)
        }
        None => (line_start, content.len(), content.len()),
    }
}

fn read(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<(), PatchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PatchError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Atomic file write: tempfile in the same directory + fsync + rename.
///
/// Either the full write lands or the prior content survives, so a run
/// interrupted between a patch and the next package-manager invocation never
/// leaves a half-written file behind.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PatchError> {
    let io_err = |source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).ok_or_else(|| {
        io_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(content).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}
