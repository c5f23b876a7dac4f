//! Filesystem marker helpers.
//!
//! Small wrappers used by the gate, the lock, and the status reporter:
//! touching marker files, measuring their age, and rendering `ls -l`-style
//! metadata lines for human inspection.

use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

/// Set a file's mtime to `mtime`, creating it empty first if it does not
/// exist. Also works on existing directories.
pub fn touch(path: &Path, mtime: SystemTime) -> io::Result<()> {
    let file = if path.is_dir() {
        fs::File::open(path)?
    } else {
        OpenOptions::new().create(true).append(true).open(path)?
    };
    file.set_modified(mtime)
}

/// A file's age relative to `now`, from its mtime.
///
/// mtimes in the future clamp to zero. Does not follow symlinks.
pub fn age(path: &Path, now: SystemTime) -> io::Result<Duration> {
    let mtime = fs::symlink_metadata(path)?.modified()?;
    Ok(now.duration_since(mtime).unwrap_or(Duration::ZERO))
}

/// True if the file's mtime is within `window` of `now`.
pub fn modified_within(path: &Path, window: Duration, now: SystemTime) -> io::Result<bool> {
    Ok(age(path, now)? < window)
}

/// Render one `ls -l`-style metadata line for a path:
///
/// ```text
/// mode links uid gid size mtime path [-> target]
/// ```
///
/// Returns `Ok(None)` if the path does not exist; any other error is
/// propagated. Does not follow symlinks.
pub fn metadata_line(path: &Path) -> io::Result<Option<String>> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mode = filemode(meta.mode());
    // Size is only meaningful for regular files, directories, and symlinks.
    let size = match mode.as_bytes()[0] {
        b'-' | b'd' | b'l' => meta.size().to_string(),
        _ => "-".to_string(),
    };
    let mtime = meta.modified()?;

    let mut line = format!(
        "{} {} {} {} {} {} {}",
        mode,
        meta.nlink(),
        meta.uid(),
        meta.gid(),
        size,
        format_mtime(mtime),
        path.display()
    );
    if meta.file_type().is_symlink() {
        if let Ok(target) = fs::read_link(path) {
            line.push_str(&format!(" -> {}", target.display()));
        }
    }
    Ok(Some(line))
}

/// Timestamps older than six months drop the clock in favor of the year,
/// the same convention `ls -l` uses.
fn format_mtime(mtime: SystemTime) -> String {
    const SIX_MONTHS: Duration = Duration::from_secs(60 * 60 * 24 * 183);
    let local: DateTime<Local> = mtime.into();
    let stale = SystemTime::now()
        .duration_since(mtime)
        .map(|age| age > SIX_MONTHS)
        .unwrap_or(false);
    if stale {
        local.format("%b %d %Y").to_string()
    } else {
        local.format("%b %d %H:%M").to_string()
    }
}

/// Render a mode word the way `ls -l` does, type character included.
fn filemode(mode: u32) -> String {
    let type_char = match mode & 0o170000 {
        0o140000 => 's',
        0o120000 => 'l',
        0o100000 => '-',
        0o060000 => 'b',
        0o040000 => 'd',
        0o020000 => 'c',
        0o010000 => 'p',
        _ => '?',
    };

    let mut out = String::with_capacity(10);
    out.push(type_char);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        // setuid/setgid/sticky replace the execute character in their triad.
        let special = match shift {
            6 => mode & 0o4000 != 0,
            3 => mode & 0o2000 != 0,
            _ => mode & 0o1000 != 0,
        };
        let exec = bits & 0o1 != 0;
        out.push(match (special, exec, shift) {
            (true, true, 0) => 't',
            (true, false, 0) => 'T',
            (true, true, _) => 's',
            (true, false, _) => 'S',
            (false, true, _) => 'x',
            (false, false, _) => '-',
        });
    }
    out
}
