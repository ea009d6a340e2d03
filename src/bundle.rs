use std::collections::BTreeMap;
use std::io;
use std::io::Read;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::LoadError;

const RES_TAR_GZ: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/res.tar.gz"));

/// Read-only tree of the resources packed by the build script.
///
/// Paths are relative to `res/` and always use `/` as separator, e.g.
/// `writing/2024-01-01.md` or `templates/base.html`.
#[derive(Debug, Default)]
pub struct Bundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl Bundle {
    pub fn embedded() -> Result<Bundle, LoadError> {
        Ok(Self::from_tar_gz(RES_TAR_GZ)?)
    }

    pub fn from_tar_gz(tar_gz: &[u8]) -> io::Result<Bundle> {
        let tar = GzDecoder::new(tar_gz);
        let mut archive = Archive::new(tar);
        let mut files = BTreeMap::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry.path()?.to_string_lossy().replace('\\', "/");
            let path = path.trim_start_matches("./").to_string();
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content)?;
            files.insert(path, content);
        }

        Ok(Bundle { files })
    }

    pub fn from_files<P, C>(files: impl IntoIterator<Item=(P, C)>) -> Bundle
        where P: Into<String>,
              C: Into<Vec<u8>>,
    {
        let files = files.into_iter()
            .map(|(p, c)| (p.into(), c.into()))
            .collect();
        Bundle { files }
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|c| c.as_slice())
    }

    /// Every file below `dir`, at any depth, in path order.
    pub fn walk<'a>(&'a self, dir: &str) -> impl Iterator<Item=(&'a str, &'a [u8])> + 'a {
        let prefix = dir_prefix(dir);
        self.files.iter()
            .filter(move |(path, _)| path.starts_with(&prefix))
            .map(|(path, content)| (path.as_str(), content.as_slice()))
    }

    /// Direct children of `dir` only.
    pub fn read_dir<'a>(&'a self, dir: &str) -> impl Iterator<Item=(&'a str, &'a [u8])> + 'a {
        let prefix_len = dir_prefix(dir).len();
        self.walk(dir)
            .filter(move |(path, _)| !path[prefix_len..].contains('/'))
    }
}

fn dir_prefix(dir: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}/", dir)
    }
}

/// Last component of a bundle path.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}
