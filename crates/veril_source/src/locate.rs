//! Include-path search used by the preprocessor to resolve `include targets.

use std::path::{Path, PathBuf};

/// Locates a file by name against an ordered list of search directories.
///
/// The name is first tried as-is (absolute paths and paths relative to the
/// working directory), then joined against each search directory in order.
/// Returns the first existing match.
pub fn locate(name: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Some(direct);
    }
    for dir in search_paths {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Returns the path of a file named `name` next to `path`.
///
/// Used for resolving includes relative to the including file.
pub fn sibling(path: &Path, name: &str) -> PathBuf {
    match path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn locate_in_search_path() {
        let tmp = TempDir::new().unwrap();
        let inc = tmp.path().join("inc");
        fs::create_dir_all(&inc).unwrap();
        fs::write(inc.join("defs.svh"), "`define FOO").unwrap();

        let found = locate("defs.svh", &[inc.clone()]).unwrap();
        assert_eq!(found, inc.join("defs.svh"));
    }

    #[test]
    fn locate_search_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("x.svh"), "first").unwrap();
        fs::write(b.join("x.svh"), "second").unwrap();

        let found = locate("x.svh", &[a.clone(), b]).unwrap();
        assert_eq!(found, a.join("x.svh"));
    }

    #[test]
    fn locate_miss_returns_none() {
        let tmp = TempDir::new().unwrap();
        assert!(locate("missing.svh", &[tmp.path().to_path_buf()]).is_none());
    }

    #[test]
    fn locate_absolute_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("abs.svh");
        fs::write(&file, "x").unwrap();
        let found = locate(file.to_str().unwrap(), &[]).unwrap();
        assert_eq!(found, file);
    }

    #[test]
    fn sibling_of_nested_path() {
        let p = sibling(Path::new("rtl/core/top.sv"), "defs.svh");
        assert_eq!(p, PathBuf::from("rtl/core/defs.svh"));
    }

    #[test]
    fn sibling_of_bare_name() {
        let p = sibling(Path::new("top.sv"), "defs.svh");
        assert_eq!(p, PathBuf::from("defs.svh"));
    }
}
