// src/source/locate.rs

use std::path::{Path, PathBuf};

/// Folder the ledger exports are dropped into, under the project root.
pub const LEDGER_DIR: &str = "거래내역서";

/// Default file names tried inside [`LEDGER_DIR`], in order.
pub static DEFAULT_CANDIDATES: &[&str] = &["거래내역서 커서용.csv", "data.csv", "거래내역서 합계.csv"];

/// Where the input file was looked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(PathBuf),
    /// Nothing exists; carries the path reported to the operator.
    Missing(PathBuf),
}

/// Resolve the ledger CSV under `root`.
///
/// An explicit `file` is always relative to `root` and may use either `/` or
/// `\` as separator. Without one, the default candidates are tried followed
/// by `<root>/data.csv`.
pub fn locate_source(root: &Path, file: Option<&str>) -> Located {
    let path = match file {
        Some(rel) => root.join(normalize_separators(rel)),
        None => match default_candidates(root).into_iter().find(|p| p.exists()) {
            Some(p) => p,
            None => root.join(LEDGER_DIR).join(DEFAULT_CANDIDATES[0]),
        },
    };

    if path.exists() {
        Located::Found(path)
    } else {
        Located::Missing(path)
    }
}

pub fn default_candidates(root: &Path) -> Vec<PathBuf> {
    let dir = root.join(LEDGER_DIR);
    DEFAULT_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .chain(std::iter::once(root.join("data.csv")))
        .collect()
}

/// Rebuild a user-supplied relative path with the platform separator.
/// Leading and repeated separators are ignored, so `/a/b.csv` is read as `a/b.csv`.
pub fn normalize_separators(rel: &str) -> PathBuf {
    rel.split(['/', '\\']).filter(|part| !part.is_empty()).collect()
}
