//! Shared writer for header/body/footer documents (KML, GPX).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use super::ensure_parent;
use super::traits::SinkError;

/// Streaming writer for an XML document that is only valid once its footer
/// has been written.
///
/// The header goes out when the file is created (or found empty). A file
/// left behind by an earlier orderly shutdown ends with the footer; that
/// footer is cut off on open so new entries extend the same document.
/// [`finalize`](Self::finalize) writes the footer exactly once, and `Drop`
/// runs it as a fallback.
pub struct DocumentWriter {
    path: PathBuf,
    footer: &'static str,
    file: Mutex<Option<File>>,
}

impl DocumentWriter {
    pub fn open(
        path: impl AsRef<Path>,
        header: &str,
        footer: &'static str,
    ) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(header.as_bytes())?;
            file.flush()?;
        } else {
            strip_footer(&mut file, len, footer)?;
            file.seek(SeekFrom::End(0))?;
        }

        Ok(Self {
            path,
            footer,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush.
    pub fn append(&self, entry: &str) -> Result<(), SinkError> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(SinkError::Finalized)?;
        file.write_all(entry.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Write the footer and close the file. Later calls do nothing.
    pub fn finalize(&self) -> Result<(), SinkError> {
        let Some(mut file) = self.file.lock().take() else {
            return Ok(());
        };
        file.write_all(self.footer.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.file.lock().is_none()
    }
}

impl Drop for DocumentWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!(path = %self.path.display(), error = %e, "Failed to finalize document");
        }
    }
}

fn strip_footer(file: &mut File, len: u64, footer: &str) -> Result<(), SinkError> {
    let footer_len = footer.len() as u64;
    if len < footer_len {
        return Ok(());
    }

    let mut tail = vec![0u8; footer.len()];
    file.seek(SeekFrom::Start(len - footer_len))?;
    file.read_exact(&mut tail)?;
    if tail == footer.as_bytes() {
        file.set_len(len - footer_len)?;
    }
    Ok(())
}

/// Escape text for use in XML character data or attribute values.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap text in a CDATA section, splitting any embedded `]]>`.
pub fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &str = "<doc>\n";
    const FOOTER: &str = "</doc>\n";

    #[test]
    fn test_header_entries_footer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.xml");
        let doc = DocumentWriter::open(&path, HEADER, FOOTER).unwrap();
        doc.append("<e/>\n").unwrap();
        doc.finalize().unwrap();
        doc.finalize().unwrap();

        assert!(doc.is_finalized());
        assert!(matches!(doc.append("<e/>\n"), Err(SinkError::Finalized)));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<doc>\n<e/>\n</doc>\n"
        );
    }

    #[test]
    fn test_drop_writes_footer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.xml");
        {
            let doc = DocumentWriter::open(&path, HEADER, FOOTER).unwrap();
            doc.append("<e/>\n").unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<doc>\n<e/>\n</doc>\n"
        );
    }

    #[test]
    fn test_reopen_continues_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.xml");
        {
            let doc = DocumentWriter::open(&path, HEADER, FOOTER).unwrap();
            doc.append("<one/>\n").unwrap();
        }
        {
            let doc = DocumentWriter::open(&path, HEADER, FOOTER).unwrap();
            doc.append("<two/>\n").unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<doc>\n<one/>\n<two/>\n</doc>\n"
        );
    }

    #[test]
    fn test_reopen_unterminated_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.xml");
        std::fs::write(&path, "<doc>\n<one/>\n").unwrap();

        let doc = DocumentWriter::open(&path, HEADER, FOOTER).unwrap();
        doc.append("<two/>\n").unwrap();
        doc.finalize().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<doc>\n<one/>\n<two/>\n</doc>\n"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(xml_escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(cdata("x]]>y"), "<![CDATA[x]]]]><![CDATA[>y]]>");
    }
}
