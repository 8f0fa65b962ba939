use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write primitive used by the page saver workers.
///
/// Implementations are expected to be atomic: a page is either fully written
/// or not written at all. Writing over an existing file replaces it.
pub trait PageWriter: Send + Sync + 'static {
    fn write_page(&self, content: &[u8], path: &Path) -> io::Result<()>;
}

/// Filesystem writer: writes a sibling temp file then renames it into place.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl PageWriter for FsWriter {
    fn write_page(&self, content: &[u8], path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }
}

/// `<save_dir>/<identifier>.html`
pub fn page_path(save_dir: &Path, identifier: &str) -> PathBuf {
    save_dir.join(format!("{}.html", identifier))
}
