use std::fs;
use std::path::{Component, Path, PathBuf};

const MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024; //10MB

/// Reads a project document from under `base_dir` and returns its content.
///
/// Every failure comes back as descriptive text rather than an error: the
/// result is fed straight back to the model as a tool observation, and the
/// conversation must continue either way.
///
/// Containment is checked twice. The filename is first resolved lexically
/// (rejecting absolute paths and `..` escapes without touching the
/// filesystem, so a traversal attempt on a missing file is still reported as
/// denied, not as not-found), then the resolved path is canonicalized and
/// required to stay a strict descendant of the canonical base directory,
/// which defeats symlink escapes.
pub fn read_project_document(base_dir: &Path, filename: &str) -> String {
    let Some(relative) = resolve_within_base(filename) else {
        return format!(
            "Error: access denied. Cannot read '{}' outside the project directory.",
            filename
        );
    };

    let canonical_base = match base_dir.canonicalize() {
        Ok(path) => path,
        Err(err) => {
            return format!(
                "An error occurred while reading the file: project directory '{}' is not accessible: {}",
                base_dir.display(),
                err
            );
        }
    };

    let candidate = canonical_base.join(relative);
    let canonical = match candidate.canonicalize() {
        Ok(path) => path,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return format!("File '{}' not found in the project directory.", filename);
        }
        Err(err) => {
            return format!("An error occurred while reading the file: {}", err);
        }
    };

    if !canonical.starts_with(&canonical_base) {
        return format!(
            "Error: access denied. Cannot read '{}' outside the project directory.",
            filename
        );
    }

    match fs::metadata(&canonical) {
        Ok(meta) if meta.len() > MAX_DOCUMENT_SIZE => {
            return format!(
                "Error: file '{}' is too large to read ({} bytes, max {} bytes).",
                filename,
                meta.len(),
                MAX_DOCUMENT_SIZE
            );
        }
        Ok(_) => {}
        Err(err) => {
            return format!("An error occurred while reading the file: {}", err);
        }
    }

    match fs::read_to_string(&canonical) {
        Ok(content) => content,
        Err(err) => format!("An error occurred while reading the file: {}", err),
    }
}

// Lexical resolution: normal components are kept, `.` is dropped, `..` pops.
// Anything that would leave the base (absolute path, drive prefix, or a pop
// past the root) means the filename is not a plain relative document name.
fn resolve_within_base(filename: &str) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in Path::new(filename).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::resolve_within_base;
    use std::path::PathBuf;

    #[test]
    fn plain_names_resolve_as_is() {
        assert_eq!(
            resolve_within_base("notes.txt"),
            Some(PathBuf::from("notes.txt"))
        );
        assert_eq!(
            resolve_within_base("plans/roadmap.md"),
            Some(PathBuf::from("plans/roadmap.md"))
        );
    }

    #[test]
    fn dot_segments_are_normalized() {
        assert_eq!(
            resolve_within_base("./plans/../notes.txt"),
            Some(PathBuf::from("notes.txt"))
        );
    }

    #[test]
    fn traversal_out_of_base_is_rejected() {
        assert_eq!(resolve_within_base("../secret.txt"), None);
        assert_eq!(resolve_within_base("plans/../../secret.txt"), None);
    }

    #[test]
    fn absolute_paths_are_rejected() {
        assert_eq!(resolve_within_base("/etc/passwd"), None);
    }
}
