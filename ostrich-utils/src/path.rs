//! Longest common sub-path of POSIX and Windows path names.
//!
//! Unlike a character prefix, the result always ends on a segment boundary:
//! the common path of `/usr/lib` and `/usr/lib64` is `/usr`, not `/usr/lib`.

use ostrich_core::{OstrichError, Result};

const CURDIR: &[u8] = b".";
const POSIX_SEP: u8 = b'/';
const NT_SEP: u8 = b'\\';
const NT_ALTSEP: u8 = b'/';

/// Which path syntax to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    /// The path style of the platform this crate was built for
    pub fn host() -> Self {
        if cfg!(windows) {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }
}

/// A path given either as text or as raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArg {
    Text(String),
    Bytes(Vec<u8>),
}

impl PathArg {
    fn as_bytes(&self) -> &[u8] {
        match self {
            PathArg::Text(text) => text.as_bytes(),
            PathArg::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for PathArg {
    fn from(s: &str) -> Self {
        PathArg::Text(s.to_string())
    }
}

impl From<&[u8]> for PathArg {
    fn from(b: &[u8]) -> Self {
        PathArg::Bytes(b.to_vec())
    }
}

/// Common sub-path of `paths` using the given path style.
///
/// # Errors
/// `InvalidArgument` if `paths` is empty, mixes absolute and relative paths,
/// or (Windows) spans different drives.
pub fn commonpath<S: AsRef<str>>(paths: &[S], style: PathStyle) -> Result<String> {
    match style {
        PathStyle::Posix => posix_commonpath(paths),
        PathStyle::Windows => nt_commonpath(paths),
    }
}

/// Common sub-path using the host platform's path style.
pub fn host_commonpath<S: AsRef<str>>(paths: &[S]) -> Result<String> {
    commonpath(paths, PathStyle::host())
}

/// Common sub-path of a batch that may mix text and byte paths.
///
/// The result has the representation of the inputs. Mixing representations
/// fails with `TypeMismatch`.
pub fn commonpath_args(paths: &[PathArg], style: PathStyle) -> Result<PathArg> {
    ensure_not_empty(paths)?;

    let has_text = paths.iter().any(|p| matches!(p, PathArg::Text(_)));
    let has_bytes = paths.iter().any(|p| matches!(p, PathArg::Bytes(_)));
    if has_text && has_bytes {
        return Err(OstrichError::TypeMismatch(
            "Can't mix strings and bytes in path components".to_string(),
        ));
    }

    let raw: Vec<&[u8]> = paths.iter().map(PathArg::as_bytes).collect();
    let common = match style {
        PathStyle::Posix => posix_common(&raw)?,
        PathStyle::Windows if has_text => nt_common(&raw, CaseFold::Unicode)?,
        PathStyle::Windows => nt_common(&raw, CaseFold::Ascii)?,
    };

    if has_text {
        Ok(PathArg::Text(into_text(common)?))
    } else {
        Ok(PathArg::Bytes(common))
    }
}

/// Common sub-path of POSIX path names.
pub fn posix_commonpath<S: AsRef<str>>(paths: &[S]) -> Result<String> {
    let raw: Vec<&[u8]> = paths.iter().map(|p| p.as_ref().as_bytes()).collect();
    into_text(posix_common(&raw)?)
}

/// Common sub-path of POSIX path names given as bytes.
pub fn posix_commonpath_bytes<B: AsRef<[u8]>>(paths: &[B]) -> Result<Vec<u8>> {
    let raw: Vec<&[u8]> = paths.iter().map(|p| p.as_ref()).collect();
    posix_common(&raw)
}

/// Common sub-path of Windows path names.
///
/// `/` and `\` are equivalent and comparison ignores case. Segments and drive
/// of the result keep the casing of the first path.
pub fn nt_commonpath<S: AsRef<str>>(paths: &[S]) -> Result<String> {
    let raw: Vec<&[u8]> = paths.iter().map(|p| p.as_ref().as_bytes()).collect();
    into_text(nt_common(&raw, CaseFold::Unicode)?)
}

/// Common sub-path of Windows path names given as bytes (ASCII case folding).
pub fn nt_commonpath_bytes<B: AsRef<[u8]>>(paths: &[B]) -> Result<Vec<u8>> {
    let raw: Vec<&[u8]> = paths.iter().map(|p| p.as_ref()).collect();
    nt_common(&raw, CaseFold::Ascii)
}

/// Split a Windows path (already using `\` separators) into drive and rest.
///
/// The drive is either `X:` or a UNC root `\\server\share`; it is empty when
/// the path has neither. The drive letter is a single byte, see
/// [`split_drive_str`] for text paths.
pub fn split_drive(path: &[u8]) -> (&[u8], &[u8]) {
    split_drive_at(path, 1)
}

/// Text flavor of [`split_drive`], where the drive letter is one character.
pub fn split_drive_str(path: &str) -> (&str, &str) {
    let (drive, _) = split_drive_at(path.as_bytes(), first_char_len(path.as_bytes()));
    path.split_at(drive.len())
}

fn split_drive_at(path: &[u8], letter_len: usize) -> (&[u8], &[u8]) {
    if path.starts_with(&[NT_SEP, NT_SEP]) && path.get(2) != Some(&NT_SEP) {
        let Some(index) = find_from(path, NT_SEP, 2) else {
            return (&[], path);
        };
        let end = match find_from(path, NT_SEP, index + 1) {
            Some(next) if next == index + 1 => return (&[], path),
            Some(next) => next,
            None => path.len(),
        };
        return path.split_at(end);
    }
    if path.get(letter_len) == Some(&b':') {
        return path.split_at(letter_len + 1);
    }
    (&[], path)
}

/// Case-insensitive comparison rules for one path representation
#[derive(Clone, Copy)]
enum CaseFold {
    /// Text: Unicode lowercase, drive letter is one character
    Unicode,
    /// Bytes: ASCII lowercase, drive letter is one byte
    Ascii,
}

impl CaseFold {
    fn fold(self, part: &[u8]) -> Vec<u8> {
        match self {
            CaseFold::Unicode => String::from_utf8_lossy(part).to_lowercase().into_bytes(),
            CaseFold::Ascii => part.to_ascii_lowercase(),
        }
    }

    fn split_drive(self, path: &[u8]) -> (&[u8], &[u8]) {
        match self {
            CaseFold::Unicode => split_drive_at(path, first_char_len(path)),
            CaseFold::Ascii => split_drive(path),
        }
    }
}

fn posix_common(paths: &[&[u8]]) -> Result<Vec<u8>> {
    ensure_not_empty(paths)?;

    let is_abs = same_absoluteness(paths.iter().map(|p| p.first() == Some(&POSIX_SEP)))?;
    let split: Vec<Vec<&[u8]>> = paths.iter().map(|p| segments(p, POSIX_SEP)).collect();
    let (min, max) = extremes(&split)?;
    let common = &min[..common_len(min, max)];

    let mut out = if is_abs { vec![POSIX_SEP] } else { Vec::new() };
    out.extend(common.join(&POSIX_SEP));
    Ok(out)
}

fn nt_common(paths: &[&[u8]], case: CaseFold) -> Result<Vec<u8>> {
    ensure_not_empty(paths)?;

    // Drives are split before folding, which may change byte lengths.
    let normalized: Vec<Vec<u8>> = paths.iter().map(|p| to_nt_separators(p)).collect();
    let drive_splits: Vec<(&[u8], &[u8])> = normalized.iter().map(|p| case.split_drive(p)).collect();

    let is_abs = same_absoluteness(drive_splits.iter().map(|(_, p)| p.first() == Some(&NT_SEP)))?;

    // Checked after absoluteness so that the relative/absolute error wins.
    let drives: Vec<Vec<u8>> = drive_splits.iter().map(|(d, _)| case.fold(d)).collect();
    if drives.iter().any(|d| *d != drives[0]) {
        return Err(OstrichError::invalid_argument("Paths don't have the same drive"));
    }

    let folded: Vec<Vec<Vec<u8>>> = drive_splits
        .iter()
        .map(|(_, rest)| segments(rest, NT_SEP).into_iter().map(|s| case.fold(s)).collect())
        .collect();
    let (min, max) = extremes(&folded)?;

    let (drive, rest) = drive_splits[0];
    let first = segments(rest, NT_SEP);
    let common = &first[..common_len(min, max)];

    let mut out = drive.to_vec();
    if is_abs {
        out.push(NT_SEP);
    }
    out.extend(common.join(&NT_SEP));
    Ok(out)
}

fn ensure_not_empty<T>(paths: &[T]) -> Result<()> {
    if paths.is_empty() {
        return Err(OstrichError::invalid_argument(
            "commonpath() arg is an empty sequence",
        ));
    }
    Ok(())
}

fn same_absoluteness(mut flags: impl Iterator<Item = bool>) -> Result<bool> {
    let first = flags.next().unwrap_or(false);
    if flags.any(|flag| flag != first) {
        return Err(OstrichError::invalid_argument("Can't mix absolute and relative paths"));
    }
    Ok(first)
}

fn segments(path: &[u8], sep: u8) -> Vec<&[u8]> {
    path.split(|&b| b == sep)
        .filter(|s| !s.is_empty() && *s != CURDIR)
        .collect()
}

fn extremes<T: Ord>(split: &[Vec<T>]) -> Result<(&[T], &[T])> {
    match (split.iter().min(), split.iter().max()) {
        (Some(min), Some(max)) => Ok((min.as_slice(), max.as_slice())),
        _ => Err(OstrichError::invalid_argument(
            "commonpath() arg is an empty sequence",
        )),
    }
}

/// Length of the shared prefix of the smallest and largest sequences, which
/// is the shared prefix of every sequence in between.
fn common_len<T: PartialEq>(min: &[T], max: &[T]) -> usize {
    min.iter().zip(max).take_while(|(a, b)| a == b).count()
}

fn to_nt_separators(path: &[u8]) -> Vec<u8> {
    path.iter()
        .map(|&b| if b == NT_ALTSEP { NT_SEP } else { b })
        .collect()
}

fn find_from(haystack: &[u8], needle: u8, start: usize) -> Option<usize> {
    haystack
        .get(start..)?
        .iter()
        .position(|&b| b == needle)
        .map(|pos| pos + start)
}

/// Byte length of the first UTF-8 character, 1 for an empty or invalid path.
fn first_char_len(path: &[u8]) -> usize {
    let head = &path[..path.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or_default(),
    };
    valid.chars().next().map_or(1, char::len_utf8)
}

fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| OstrichError::Decode(e.utf8_error()))
}
