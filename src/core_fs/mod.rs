//! Rooted, virtualized view of local storage.
//!
//! Every path handed to the facade is a *virtual* absolute path already
//! resolved against a session's working directory. The facade maps it under
//! the configured storage root and never lets `..` escape it. A mount table
//! overlays synthetic directories on prefixes that may have no concrete
//! backing, so a listing of `/` can show declared mount points even on an
//! empty filesystem.

pub mod error;
pub mod listing;

pub use error::FsError;

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::fs::{File, OpenOptions, ReadDir};

pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// One directory entry as rendered to clients. Mode bits are synthetic.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub mtime: SystemTime,
    pub mode_bits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    /// Seekable overwrite without truncation, used for restarted uploads.
    Overwrite,
    Append,
}

const FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;
const SYMLINK_MODE: u32 = 0o777;
const VIRTUAL_DIR_MODE: u32 = 0o555;

pub struct VirtualFs {
    root: PathBuf,
    mounts: BTreeMap<String, Vec<String>>,
}

impl VirtualFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounts: BTreeMap::new(),
        }
    }

    /// Declares synthetic child names under a virtual path prefix.
    pub fn add_mount(&mut self, prefix: &str, children: Vec<String>) {
        self.mounts.insert(Self::resolve("/", prefix), children);
    }

    /// Resolves a client-supplied path argument against a working directory
    /// into a normalized virtual absolute path. `.` and `..` collapse
    /// segment-wise; attempts to climb above the root stop at `/`.
    pub fn resolve(cwd: &str, arg: &str) -> String {
        let base = if arg.starts_with('/') { "" } else { cwd };
        let mut parts: Vec<&str> = Vec::new();
        for segment in base.split('/').chain(arg.split('/')) {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }
        if parts.is_empty() {
            String::from("/")
        } else {
            format!("/{}", parts.join("/"))
        }
    }

    /// Returns the final segment of a virtual path, or `/` for the root.
    pub fn base_name(vpath: &str) -> &str {
        match vpath.rsplit('/').next() {
            Some("") | None => "/",
            Some(name) => name,
        }
    }

    pub fn real_path(&self, vpath: &str) -> PathBuf {
        self.root.join(vpath.trim_start_matches('/'))
    }

    fn virtual_dir_entry(name: &str) -> EntryInfo {
        EntryInfo {
            name: name.to_string(),
            kind: EntryKind::Dir,
            size: 0,
            mtime: SystemTime::now(),
            mode_bits: VIRTUAL_DIR_MODE,
        }
    }

    pub async fn stat(&self, vpath: &str) -> FsResult<EntryInfo> {
        match tokio::fs::metadata(self.real_path(vpath)).await {
            Ok(md) => {
                let kind = if md.is_dir() {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                };
                Ok(EntryInfo {
                    name: Self::base_name(vpath).to_string(),
                    kind,
                    size: md.len(),
                    mtime: md.modified().unwrap_or_else(|_| SystemTime::now()),
                    mode_bits: synth_mode(kind),
                })
            }
            Err(_) if self.mounts.contains_key(vpath) => {
                Ok(Self::virtual_dir_entry(Self::base_name(vpath)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn is_dir(&self, vpath: &str) -> bool {
        match self.stat(vpath).await {
            Ok(info) => info.kind == EntryKind::Dir,
            Err(_) => false,
        }
    }

    /// Resolves `arg` against `cwd` and commits only if the target is a
    /// directory (concrete or virtual).
    pub async fn chdir(&self, cwd: &str, arg: &str) -> FsResult<String> {
        let target = Self::resolve(cwd, arg);
        match self.stat(&target).await {
            Ok(info) if info.kind == EntryKind::Dir => Ok(target),
            Ok(_) => Err(FsError::NotADirectory),
            Err(e) => Err(e),
        }
    }

    pub async fn open_read(&self, vpath: &str) -> FsResult<File> {
        let real = self.real_path(vpath);
        let md = tokio::fs::metadata(&real).await?;
        if md.is_dir() {
            return Err(FsError::IsADirectory);
        }
        Ok(File::open(real).await?)
    }

    /// Opens a file for writing, creating missing parent directories.
    pub async fn open_write(&self, vpath: &str, mode: WriteMode) -> FsResult<File> {
        let real = self.real_path(vpath);
        if let Some(parent) = real.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        match mode {
            WriteMode::Truncate => {
                options.truncate(true);
            }
            WriteMode::Overwrite => {}
            WriteMode::Append => {
                options.append(true);
            }
        }
        Ok(options.open(real).await?)
    }

    pub async fn open_dir(&self, vpath: &str) -> FsResult<DirSource> {
        let overlay = self.mounts.get(vpath).cloned();
        match tokio::fs::read_dir(self.real_path(vpath)).await {
            Ok(rd) => match overlay {
                Some(names) if !names.is_empty() => Ok(DirSource::Merged {
                    concrete: rd,
                    overlay: names.into_iter(),
                    seen: HashSet::new(),
                    concrete_done: false,
                }),
                _ => Ok(DirSource::Concrete(rd)),
            },
            Err(_) if overlay.is_some() => {
                Ok(DirSource::Virtual(overlay.unwrap_or_default().into_iter()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn mkdir(&self, vpath: &str) -> FsResult<()> {
        Ok(tokio::fs::create_dir(self.real_path(vpath)).await?)
    }

    pub async fn rmdir(&self, vpath: &str) -> FsResult<()> {
        Ok(tokio::fs::remove_dir(self.real_path(vpath)).await?)
    }

    pub async fn unlink(&self, vpath: &str) -> FsResult<()> {
        let real = self.real_path(vpath);
        let md = tokio::fs::metadata(&real).await?;
        if md.is_dir() {
            return Err(FsError::IsADirectory);
        }
        Ok(tokio::fs::remove_file(real).await?)
    }

    pub async fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        Ok(tokio::fs::rename(self.real_path(from), self.real_path(to)).await?)
    }
}

fn synth_mode(kind: EntryKind) -> u32 {
    match kind {
        EntryKind::File => FILE_MODE,
        EntryKind::Dir => DIR_MODE,
        EntryKind::Symlink => SYMLINK_MODE,
    }
}

async fn entry_from_dirent(entry: tokio::fs::DirEntry) -> EntryInfo {
    let name = entry.file_name().to_string_lossy().into_owned();
    let kind = match entry.file_type().await {
        Ok(ft) if ft.is_dir() => EntryKind::Dir,
        Ok(ft) if ft.is_symlink() => EntryKind::Symlink,
        _ => EntryKind::File,
    };
    // Unreadable entries are still listed, with size 0 and mtime now.
    let (size, mtime) = match entry.metadata().await {
        Ok(md) => (
            md.len(),
            md.modified().unwrap_or_else(|_| SystemTime::now()),
        ),
        Err(_) => (0, SystemTime::now()),
    };
    EntryInfo {
        name,
        kind,
        size,
        mtime,
        mode_bits: synth_mode(kind),
    }
}

/// A directory iterator over concrete storage, a synthetic mount, or both.
/// When merged, concrete entries win and overlay names are appended only if
/// the concrete listing did not already produce them.
pub enum DirSource {
    Concrete(ReadDir),
    Virtual(std::vec::IntoIter<String>),
    Merged {
        concrete: ReadDir,
        overlay: std::vec::IntoIter<String>,
        seen: HashSet<String>,
        concrete_done: bool,
    },
}

impl DirSource {
    pub async fn next_entry(&mut self) -> FsResult<Option<EntryInfo>> {
        match self {
            DirSource::Concrete(rd) => match rd.next_entry().await? {
                Some(entry) => Ok(Some(entry_from_dirent(entry).await)),
                None => Ok(None),
            },
            DirSource::Virtual(names) => Ok(names
                .next()
                .map(|name| VirtualFs::virtual_dir_entry(&name))),
            DirSource::Merged {
                concrete,
                overlay,
                seen,
                concrete_done,
            } => {
                if !*concrete_done {
                    match concrete.next_entry().await? {
                        Some(entry) => {
                            let info = entry_from_dirent(entry).await;
                            seen.insert(info.name.clone());
                            return Ok(Some(info));
                        }
                        None => *concrete_done = true,
                    }
                }
                loop {
                    match overlay.next() {
                        Some(name) if seen.contains(&name) => continue,
                        Some(name) => return Ok(Some(VirtualFs::virtual_dir_entry(&name))),
                        None => return Ok(None),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_collapses_segments() {
        assert_eq!(VirtualFs::resolve("/", ""), "/");
        assert_eq!(VirtualFs::resolve("/a/b", ""), "/a/b");
        assert_eq!(VirtualFs::resolve("/a/b", "c"), "/a/b/c");
        assert_eq!(VirtualFs::resolve("/a/b", "/c"), "/c");
        assert_eq!(VirtualFs::resolve("/a/b", ".."), "/a");
        assert_eq!(VirtualFs::resolve("/a/b", "../.."), "/");
        assert_eq!(VirtualFs::resolve("/a", "./c/./d"), "/a/c/d");
        assert_eq!(VirtualFs::resolve("/a", "c//d"), "/a/c/d");
        assert_eq!(VirtualFs::resolve("/a", "c/"), "/a/c");
    }

    #[test]
    fn resolve_clamps_escapes_at_root() {
        assert_eq!(VirtualFs::resolve("/", "../../.."), "/");
        assert_eq!(VirtualFs::resolve("/a", "../../../etc/passwd"), "/etc/passwd");
        assert_eq!(VirtualFs::resolve("/", "/../x"), "/x");
    }

    #[test]
    fn base_name_of_root_is_slash() {
        assert_eq!(VirtualFs::base_name("/"), "/");
        assert_eq!(VirtualFs::base_name("/a/b"), "b");
    }

    #[tokio::test]
    async fn stat_and_chdir_follow_concrete_dirs() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("music")).unwrap();
        std::fs::write(tmp.path().join("music/track.mp3"), b"abc").unwrap();
        let fs = VirtualFs::new(tmp.path());

        let info = fs.stat("/music").await.unwrap();
        assert_eq!(info.kind, EntryKind::Dir);

        let cwd = fs.chdir("/", "music").await.unwrap();
        assert_eq!(cwd, "/music");

        let info = fs.stat("/music/track.mp3").await.unwrap();
        assert_eq!(info.kind, EntryKind::File);
        assert_eq!(info.size, 3);

        assert!(matches!(
            fs.chdir("/", "music/track.mp3").await,
            Err(FsError::NotADirectory)
        ));
        assert!(matches!(fs.chdir("/", "nope").await, Err(FsError::NotFound)));
    }

    #[tokio::test]
    async fn virtual_mounts_are_listed_and_enterable() {
        let tmp = TempDir::new().unwrap();
        let mut fs = VirtualFs::new(tmp.path());
        fs.add_mount("/", vec!["media".into(), "docs".into()]);
        fs.add_mount("/media", Vec::new());

        // The mount point stats as a read-only directory without backing.
        let info = fs.stat("/media").await.unwrap();
        assert_eq!(info.kind, EntryKind::Dir);
        assert_eq!(info.mode_bits, 0o555);
        assert_eq!(fs.chdir("/", "media").await.unwrap(), "/media");

        // An empty concrete root still lists the declared mounts.
        let mut dir = fs.open_dir("/").await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.name);
        }
        names.sort();
        assert_eq!(names, vec!["docs".to_string(), "media".to_string()]);
    }

    #[tokio::test]
    async fn merged_listing_prefers_concrete_entries() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("media")).unwrap();
        std::fs::write(tmp.path().join("readme.txt"), b"hi").unwrap();
        let mut fs = VirtualFs::new(tmp.path());
        fs.add_mount("/", vec!["media".into(), "docs".into()]);

        let mut dir = fs.open_dir("/").await.unwrap();
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            entries.push(entry);
        }
        let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["docs", "media", "readme.txt"]);
        // "media" appears once, from the concrete listing.
        let media = entries.iter().find(|e| e.name == "media").unwrap();
        assert_eq!(media.mode_bits, 0o755);
    }

    #[tokio::test]
    async fn write_modes_and_removal() {
        let tmp = TempDir::new().unwrap();
        let fs = VirtualFs::new(tmp.path());

        // Parents are created on demand.
        let file = fs.open_write("/a/b/new.bin", WriteMode::Truncate).await.unwrap();
        drop(file);
        assert!(tmp.path().join("a/b/new.bin").exists());

        fs.mkdir("/keep").await.unwrap();
        std::fs::write(tmp.path().join("keep/x"), b"x").unwrap();
        assert!(matches!(fs.rmdir("/keep").await, Err(FsError::NotEmpty)));
        fs.unlink("/keep/x").await.unwrap();
        fs.rmdir("/keep").await.unwrap();

        assert!(matches!(
            fs.unlink("/a/b").await,
            Err(FsError::IsADirectory)
        ));

        fs.rename("/a/b/new.bin", "/a/renamed.bin").await.unwrap();
        assert!(tmp.path().join("a/renamed.bin").exists());
        assert!(!tmp.path().join("a/b/new.bin").exists());
    }

    #[tokio::test]
    async fn open_read_rejects_directories() {
        let tmp = TempDir::new().unwrap();
        let fs = VirtualFs::new(tmp.path());
        fs.mkdir("/d").await.unwrap();
        assert!(matches!(
            fs.open_read("/d").await,
            Err(FsError::IsADirectory)
        ));
        assert!(matches!(
            fs.open_read("/missing").await,
            Err(FsError::NotFound)
        ));
    }
}
