pub mod fake_notebooks;

pub mod test_helpers {
    use super::fake_notebooks::FakeNotebook;
    use std::path::PathBuf;

    /// Writes fake exports into a temporary directory that lives as long as
    /// this value.
    pub struct TempNotebookDir {
        temp_dir: tempfile::TempDir,
        paths: Vec<PathBuf>,
    }

    impl TempNotebookDir {
        pub fn new(notebooks: &[(&str, FakeNotebook)]) -> Result<Self, Box<dyn std::error::Error>> {
            let temp_dir = tempfile::TempDir::new()?;
            let mut paths = Vec::new();
            for (file_name, notebook) in notebooks {
                paths.push(notebook.write_to(temp_dir.path(), file_name)?);
            }
            Ok(Self { temp_dir, paths })
        }

        pub fn path(&self) -> &std::path::Path {
            self.temp_dir.path()
        }

        /// Paths of the written exports, in the order they were given.
        pub fn paths(&self) -> &[PathBuf] {
            &self.paths
        }
    }
}
