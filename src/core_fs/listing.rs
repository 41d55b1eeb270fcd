//! Renders directory entries as `LIST` and `NLST` lines.

use chrono::{DateTime, Utc};

use super::{EntryInfo, EntryKind};

/// One Unix-style `LIST` line:
/// `Tmode  1 ftp ftp 0000001234 Mon DD  YYYY name\r\n`.
pub fn format_list_line(entry: &EntryInfo) -> String {
    let type_char = match entry.kind {
        EntryKind::Dir => 'd',
        EntryKind::Symlink => 'l',
        EntryKind::File => '-',
    };
    let date = DateTime::<Utc>::from(entry.mtime).format("%b %d  %Y");
    format!(
        "{}{}  1 ftp ftp {:010} {} {}\r\n",
        type_char,
        mode_string(entry.mode_bits),
        entry.size,
        date,
        entry.name
    )
}

/// One `NLST` line: the bare name.
pub fn format_nlst_line(entry: &EntryInfo) -> String {
    format!("{}\r\n", entry.name)
}

fn mode_string(mode_bits: u32) -> String {
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = (mode_bits >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn entry(name: &str, kind: EntryKind, size: u64, mode_bits: u32) -> EntryInfo {
        EntryInfo {
            name: name.to_string(),
            kind,
            size,
            // 2021-03-14 00:00:00 UTC
            mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(1_615_680_000),
            mode_bits,
        }
    }

    #[test]
    fn list_line_layout() {
        let line = format_list_line(&entry("track.mp3", EntryKind::File, 1234, 0o644));
        assert_eq!(line, "-rw-r--r--  1 ftp ftp 0000001234 Mar 14  2021 track.mp3\r\n");
    }

    #[test]
    fn directories_and_symlinks_get_type_chars() {
        let line = format_list_line(&entry("music", EntryKind::Dir, 0, 0o755));
        assert!(line.starts_with("drwxr-xr-x"));
        let line = format_list_line(&entry("link", EntryKind::Symlink, 0, 0o777));
        assert!(line.starts_with("lrwxrwxrwx"));
    }

    #[test]
    fn virtual_mounts_render_read_only() {
        let line = format_list_line(&entry("media", EntryKind::Dir, 0, 0o555));
        assert!(line.starts_with("dr-xr-xr-x"));
    }

    #[test]
    fn sizes_are_zero_padded_to_ten() {
        let line = format_list_line(&entry("f", EntryKind::File, 7, 0o644));
        assert!(line.contains(" 0000000007 "));
    }

    #[test]
    fn nlst_is_name_only() {
        let line = format_nlst_line(&entry("track.mp3", EntryKind::File, 1, 0o644));
        assert_eq!(line, "track.mp3\r\n");
    }
}
