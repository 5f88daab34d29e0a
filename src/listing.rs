//! Produces UNIX `ls -l`-style lines from filesystem metadata for the LIST
//! command. See <https://files.stairways.com/other/ftp-list-specs-info.txt>.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use chrono::{DateTime, Local};

/// Builds the full listing for `dir`, a host path already known to be inside
/// the jail. Synthesizes `.` and `..` entries first, then one line per
/// directory entry. Entries that cannot be `stat`ed are silently skipped.
pub fn list_dir(dir: &Path) -> std::io::Result<String> {
    let mut out = String::new();

    if let Ok(meta) = fs::metadata(dir) {
        push_entry(&mut out, &meta, ".");
    }
    if let Ok(meta) = fs::metadata(dir.parent().unwrap_or(dir)) {
        push_entry(&mut out, &meta, "..");
    }

    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(meta) = entry.metadata() else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        push_entry(&mut out, &meta, name);
    }

    Ok(out)
}

/// Formats a single entry as a 10-char mode string, link count, uid, gid,
/// size, `mtime` (local time, abbreviated month / space-padded day / 4-digit
/// year), and name, terminated by `CRLF`.
fn push_entry(out: &mut String, meta: &fs::Metadata, name: &str) {
    let mode = mode_string(meta);
    let nlink = meta.nlink();
    let uid = meta.uid();
    let gid = meta.gid();
    let size = meta.len();
    let date = mtime_string(meta);

    out.push_str(&format!(
        "{mode} {nlink:>3} {uid:>8} {gid:>8} {size:>8} {date}  {name}\r\n"
    ));
}

fn mtime_string(meta: &fs::Metadata) -> String {
    match meta.modified() {
        Ok(time) => {
            let secs = time
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            DateTime::from_timestamp(secs, 0)
                .unwrap_or_else(|| DateTime::from_timestamp(0, 0).expect("epoch is valid"))
                .with_timezone(&Local)
                .format("%b %e %Y")
                .to_string()
        }
        Err(_) => "Jan  1 1970".to_string(),
    }
}

/// Builds the canonical 10-character UNIX permission string, e.g.
/// `-rwxr-xr-x` or `drwx------`.
fn mode_string(meta: &fs::Metadata) -> String {
    let file_type = type_letter(meta);
    let bits = meta.permissions().mode();

    let mut s = String::with_capacity(10);
    s.push(file_type);
    for &(read, write, exec) in &[(0o400, 0o200, 0o100), (0o040, 0o020, 0o010), (0o004, 0o002, 0o001)] {
        s.push(if bits & read != 0 { 'r' } else { '-' });
        s.push(if bits & write != 0 { 'w' } else { '-' });
        s.push(if bits & exec != 0 { 'x' } else { '-' });
    }
    s
}

fn type_letter(meta: &fs::Metadata) -> char {
    let ft = meta.file_type();
    if ft.is_dir() {
        'd'
    } else if ft.is_symlink() {
        'l'
    } else if ft.is_file() {
        '-'
    } else {
        use std::os::unix::fs::FileTypeExt;
        if ft.is_block_device() {
            'b'
        } else if ft.is_char_device() {
            'c'
        } else if ft.is_fifo() {
            'p'
        } else if ft.is_socket() {
            's'
        } else {
            '?'
        }
    }
}
