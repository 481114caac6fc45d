use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Ordered list of directories searched for a `Content/` tree.
///
/// The first root containing the requested file wins.
#[derive(Debug, Clone, Default)]
pub struct ContentPaths {
    roots: Vec<PathBuf>,
}

impl ContentPaths {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Roots used when nothing else is configured: the executable's directory.
    pub fn from_exe_dir() -> Self {
        let mut paths = Self::default();
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(dir);
        }
        paths
    }

    /// Appends a root with the lowest priority so far. Duplicates are skipped.
    pub fn push(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Path of `relative` below `<root>/Content/` for the first root where it exists.
    pub fn find(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        let relative = relative.as_ref();
        self.roots
            .iter()
            .map(|root| root.join("Content").join(relative))
            .find(|candidate| candidate.is_file())
    }

    /// Like `find`, but reports every searched location on failure.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let relative = relative.as_ref();
        if let Some(found) = self.find(relative) {
            return Ok(found);
        }

        let searched: Vec<String> = self
            .roots
            .iter()
            .map(|root| root.join("Content").join(relative).display().to_string())
            .collect();
        bail!(
            "content file {} not found (searched: {})",
            relative.display(),
            if searched.is_empty() { "<no roots>".to_string() } else { searched.join(", ") }
        )
    }

    pub fn shader(&self, file_name: &str) -> Option<PathBuf> {
        self.find(Path::new("Shaders").join(file_name))
    }

    pub fn compiled_spirv(&self, name: &str) -> Option<PathBuf> {
        self.find(Path::new("Shaders/Compiled/SPIRV").join(format!("{name}.spv")))
    }

    pub fn image(&self, name: &str) -> Result<PathBuf> {
        self.resolve(Path::new("Images").join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gpulab-content-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn first_root_with_file_wins() {
        let a = scratch_dir("first-a");
        let b = scratch_dir("first-b");
        fs::create_dir_all(b.join("Content/Images")).unwrap();
        fs::write(b.join("Content/Images/x.bmp"), b"b").unwrap();

        let paths = ContentPaths::new([a.clone(), b.clone()]);
        assert_eq!(paths.image("x.bmp").unwrap(), b.join("Content/Images/x.bmp"));

        fs::create_dir_all(a.join("Content/Images")).unwrap();
        fs::write(a.join("Content/Images/x.bmp"), b"a").unwrap();
        assert_eq!(paths.image("x.bmp").unwrap(), a.join("Content/Images/x.bmp"));

        let _ = fs::remove_dir_all(a);
        let _ = fs::remove_dir_all(b);
    }

    #[test]
    fn missing_file_lists_searched_roots() {
        let a = scratch_dir("missing");
        let paths = ContentPaths::new([a.clone()]);
        let err = paths.resolve("Shaders/Nope.vert.wgsl").unwrap_err().to_string();
        assert!(err.contains("Nope.vert.wgsl"), "{err}");
        assert!(err.contains(&a.display().to_string()), "{err}");
        let _ = fs::remove_dir_all(a);
    }

    #[test]
    fn compiled_spirv_lives_next_to_wgsl_sources() {
        let root = scratch_dir("spirv");
        let shaders = root.join("Content/Shaders");
        fs::create_dir_all(shaders.join("Compiled/SPIRV")).unwrap();
        fs::write(shaders.join("Fill.comp.wgsl"), b"").unwrap();

        let paths = ContentPaths::new([root.clone()]);
        assert_eq!(paths.compiled_spirv("Fill.comp"), None);
        assert_eq!(paths.shader("Fill.comp.wgsl"), Some(shaders.join("Fill.comp.wgsl")));

        fs::write(shaders.join("Compiled/SPIRV/Fill.comp.spv"), b"").unwrap();
        assert_eq!(
            paths.compiled_spirv("Fill.comp"),
            Some(shaders.join("Compiled/SPIRV/Fill.comp.spv"))
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn push_skips_duplicates() {
        let mut paths = ContentPaths::default();
        paths.push("/tmp/x");
        paths.push("/tmp/x");
        paths.push("/tmp/y");
        assert_eq!(paths.roots().len(), 2);
    }
}
