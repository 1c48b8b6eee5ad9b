use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

/// Extension membership test, case-insensitive.
pub fn is_video_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Finds video files under `path`. A matching file is returned as a
/// single-element list, a non-matching file as an empty one. Directories are
/// walked recursively in lexical order; dot-prefixed files and directories
/// are skipped.
pub fn find_video_files(path: &Path) -> io::Result<Vec<PathBuf>> {
    let metadata = fs::metadata(path)?;

    if metadata.is_file() {
        if is_video_file(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        return Ok(vec![]);
    }

    let mut found = Vec::new();
    walk(path, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&entry.path(), found)?;
        } else if file_type.is_file() && is_video_file(&entry.path()) {
            found.push(entry.path());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "batchenc_scanner_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("a.mp4")));
        assert!(is_video_file(Path::new("A.MKV")));
        assert!(is_video_file(Path::new("/x/y/clip.WebM")));
        assert!(!is_video_file(Path::new("a.txt")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_single_file() {
        let dir = scratch_dir("single");
        let video = dir.join("clip.mp4");
        let other = dir.join("notes.txt");
        fs::write(&video, b"").unwrap();
        fs::write(&other, b"").unwrap();

        assert_eq!(find_video_files(&video).unwrap(), vec![video]);
        assert!(find_video_files(&other).unwrap().is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_path_is_error() {
        let dir = scratch_dir("missing");
        assert!(find_video_files(&dir.join("nope.mp4")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_recursive_walk_skips_dot_entries() {
        let dir = scratch_dir("walk");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::create_dir_all(dir.join(".hidden")).unwrap();
        fs::write(dir.join("b.mkv"), b"").unwrap();
        fs::write(dir.join("a.mp4"), b"").unwrap();
        fs::write(dir.join("skip.txt"), b"").unwrap();
        fs::write(dir.join(".partial.mp4"), b"").unwrap();
        fs::write(dir.join("sub").join("c.webm"), b"").unwrap();
        fs::write(dir.join(".hidden").join("d.mp4"), b"").unwrap();

        let found = find_video_files(&dir).unwrap();
        assert_eq!(
            found,
            vec![
                dir.join("a.mp4"),
                dir.join("b.mkv"),
                dir.join("sub").join("c.webm"),
            ]
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
