//! On-disk layout for cores, content and system files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Shared library extension for the current platform
#[cfg(target_os = "windows")]
pub const CORE_EXTENSION: &str = "dll";
#[cfg(target_os = "macos")]
pub const CORE_EXTENSION: &str = "dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const CORE_EXTENSION: &str = "so";

/// Create `dir` (and parents) if needed and return it
pub fn ensure_dir(dir: &Path) -> io::Result<&Path> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(dir)
}

/// Find the first core library in `dir`, in file-name order
pub fn find_first_core(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    let mut cores: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(CORE_EXTENSION))
        })
        .collect();

    cores.sort();
    cores.into_iter().next()
}

/// Find a content file by exact name inside `dir`
pub fn find_content(dir: &Path, name: &str) -> Option<PathBuf> {
    let target = dir.join(name);
    target.is_file().then_some(target)
}

/// Copy `src` into `dest_dir`, keeping its file name
pub fn import_file(src: &Path, dest_dir: &Path) -> io::Result<PathBuf> {
    let name = src.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", src.display()),
        )
    })?;

    ensure_dir(dest_dir)?;
    let dest = dest_dir.join(name);
    fs::copy(src, &dest)?;

    tracing::info!("Imported {} -> {}", src.display(), dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_core() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_first_core(dir.path()).is_none());

        fs::write(dir.path().join("readme.txt"), b"not a core").unwrap();
        fs::write(dir.path().join(format!("b_libretro.{}", CORE_EXTENSION)), b"").unwrap();
        fs::write(dir.path().join(format!("a_libretro.{}", CORE_EXTENSION)), b"").unwrap();

        let core = find_first_core(dir.path()).unwrap();
        assert_eq!(
            core.file_name().unwrap().to_string_lossy(),
            format!("a_libretro.{}", CORE_EXTENSION)
        );
    }

    #[test]
    fn test_find_first_core_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_first_core(&dir.path().join("absent")).is_none());
    }

    #[test]
    fn test_find_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("game.rom"), b"rom").unwrap();

        assert_eq!(find_content(dir.path(), "game.rom"), Some(dir.path().join("game.rom")));
        assert!(find_content(dir.path(), "other.rom").is_none());
    }

    #[test]
    fn test_import_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_root = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("bios.bin");
        fs::write(&src, b"\x01\x02\x03").unwrap();

        let dest = import_file(&src, &dest_root.path().join("system")).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"\x01\x02\x03");
    }
}
