//! Stream a skill folder as a gzip-compressed tar archive.
//!
//! Blobs are fetched lazily, one per archive entry, and compressed output is
//! yielded as it accumulates; the archive is never buffered whole. The
//! first fetch failure terminates the stream as an error; a partial archive
//! is never delivered as success.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use {async_stream::try_stream, bytes::Bytes, futures::Stream};

use crate::{
    client::{EntryKind, GithubClient, TreeEntry},
    error::{Error, Result},
};

/// Select the blob entries under `prefix/` from a full tree listing.
pub fn select_archive_files(entries: &[TreeEntry], prefix: &str) -> Result<Vec<TreeEntry>> {
    let prefix_slash = prefix_slash(prefix);
    let files: Vec<TreeEntry> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Blob && e.path.starts_with(&prefix_slash))
        .cloned()
        .collect();
    if files.is_empty() {
        return Err(Error::SkillFolderNotFound(prefix.to_string()));
    }
    Ok(files)
}

/// Produce the `.tar.gz` byte stream for the selected files.
///
/// Paths inside the archive are relative to `prefix`. Entry order follows
/// the input; consumers only rely on the set of paths.
pub fn stream_skill_archive(
    client: GithubClient,
    owner: String,
    repo: String,
    prefix: String,
    files: Vec<TreeEntry>,
) -> impl Stream<Item = Result<Bytes>> {
    try_stream! {
        let prefix_slash = prefix_slash(&prefix);
        let sink = ChunkSink::default();
        let encoder = flate2::write::GzEncoder::new(sink.clone(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for file in &files {
            let contents = client.fetch_blob(&owner, &repo, &file.sha).await?;
            let relative = file
                .path
                .strip_prefix(&prefix_slash)
                .unwrap_or(&file.path)
                .to_string();

            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, &relative, contents.as_slice())?;

            if let Some(chunk) = sink.drain() {
                yield chunk;
            }
        }

        let encoder = builder.into_inner()?;
        encoder.finish()?;
        if let Some(chunk) = sink.drain() {
            yield chunk;
        }
    }
}

fn prefix_slash(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// `Write` sink the tar builder compresses into; the stream drains it after
/// every appended entry.
#[derive(Clone, Default)]
struct ChunkSink(Arc<Mutex<Vec<u8>>>);

impl ChunkSink {
    fn drain(&self) -> Option<Bytes> {
        let mut buf = self.0.lock().ok()?;
        if buf.is_empty() {
            None
        } else {
            Some(Bytes::from(std::mem::take(&mut *buf)))
        }
    }
}

impl Write for ChunkSink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("archive sink poisoned"))?
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
