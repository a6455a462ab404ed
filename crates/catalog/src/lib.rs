use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use common::Song;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub song: String,
    pub artist: String,
}

#[derive(Debug)]
pub struct CatalogStore {
    songs: Vec<Song>,
    scores: Vec<f32>,
}

impl CatalogStore {
    pub fn load(catalog_path: &Path, matrix_path: &Path) -> Result<Self, LoadError> {
        let started = Instant::now();
        let entries = read_catalog(catalog_path)?;
        let rows = read_matrix(matrix_path)?;
        let store = Self::from_parts(entries, rows)?;
        info!(
            songs = store.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded catalog from {:?} and similarity matrix from {:?}",
            catalog_path,
            matrix_path
        );
        Ok(store)
    }

    pub fn from_parts(entries: Vec<CatalogEntry>, rows: Vec<Vec<f32>>) -> Result<Self, LoadError> {
        let n = entries.len();
        if rows.len() != n {
            return Err(LoadError::DimensionMismatch {
                catalog: n,
                rows: rows.len(),
            });
        }

        let mut scores = Vec::with_capacity(n * n);
        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(LoadError::RaggedRow {
                    row: row_index,
                    len: row.len(),
                    expected: n,
                });
            }
            if let Some(column) = row.iter().position(|score| !score.is_finite()) {
                return Err(LoadError::NonFiniteScore {
                    row: row_index,
                    column,
                });
            }
            scores.extend(row);
        }

        let songs = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Song {
                index,
                title: entry.song,
                artist: entry.artist,
            })
            .collect();

        Ok(Self { songs, scores })
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn song(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn resolve_index(&self, title: &str) -> Result<usize, LookupError> {
        self.songs
            .iter()
            .position(|song| song.title == title)
            .ok_or_else(|| LookupError::NotFound(title.to_string()))
    }

    pub fn artist_for(&self, title: &str) -> Result<&str, LookupError> {
        let index = self.resolve_index(title)?;
        Ok(self.songs[index].artist.as_str())
    }

    /// Every `(j, matrix[index][j])` pair, `j == index` included.
    ///
    /// Panics if `index` is out of range; callers obtain it from `resolve_index`.
    pub fn scores_for(&self, index: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.row(index).iter().copied().enumerate()
    }

    fn row(&self, index: usize) -> &[f32] {
        let n = self.songs.len();
        &self.scores[index * n..(index + 1) * n]
    }

    pub fn search(&self, query: Option<&str>, limit: usize, offset: usize) -> (Vec<Song>, usize) {
        let query = query
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_lowercase());

        let mut total = 0usize;
        let mut items = Vec::new();
        for song in &self.songs {
            if let Some(query) = &query {
                if !song.title.to_lowercase().contains(query)
                    && !song.artist.to_lowercase().contains(query)
                {
                    continue;
                }
            }

            total += 1;
            if total <= offset {
                continue;
            }
            if items.len() >= limit {
                continue;
            }
            items.push(song.clone());
        }

        (items, total)
    }
}

fn read_catalog(path: &Path) -> Result<Vec<CatalogEntry>, LoadError> {
    let file = File::open(path)?;
    let entries: Vec<CatalogEntry> = serde_json::from_reader(BufReader::new(file))?;
    debug!("Read {} catalog entries from {:?}", entries.len(), path);
    Ok(entries)
}

fn read_matrix(path: &Path) -> Result<Vec<Vec<f32>>, LoadError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let rows: Vec<Vec<f32>> = if is_json {
        serde_json::from_reader(reader)?
    } else {
        bincode::deserialize_from(reader)?
    };
    debug!("Read {} matrix rows from {:?}", rows.len(), path);
    Ok(rows)
}

pub fn write_matrix(path: &Path, rows: &[Vec<f32>]) -> Result<(), LoadError> {
    let bytes = bincode::serialize(rows)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Bincode(Box<bincode::ErrorKind>),
    DimensionMismatch { catalog: usize, rows: usize },
    RaggedRow { row: usize, len: usize, expected: usize },
    NonFiniteScore { row: usize, column: usize },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "io error: {}", err),
            LoadError::Json(err) => write!(f, "json error: {}", err),
            LoadError::Bincode(err) => write!(f, "bincode error: {}", err),
            LoadError::DimensionMismatch { catalog, rows } => write!(
                f,
                "similarity matrix has {} rows but catalog has {} songs",
                rows, catalog
            ),
            LoadError::RaggedRow { row, len, expected } => write!(
                f,
                "similarity row {} has {} scores, expected {}",
                row, len, expected
            ),
            LoadError::NonFiniteScore { row, column } => {
                write!(f, "similarity score at ({}, {}) is not finite", row, column)
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json(err)
    }
}

impl From<Box<bincode::ErrorKind>> for LoadError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LoadError::Bincode(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    NotFound(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::NotFound(title) => write!(f, "song not found: {}", title),
        }
    }
}

impl std::error::Error for LookupError {}

#[cfg(test)]
mod tests {
    use super::{write_matrix, CatalogEntry, CatalogStore, LoadError, LookupError};

    fn entries(titles: &[(&str, &str)]) -> Vec<CatalogEntry> {
        titles
            .iter()
            .map(|(song, artist)| CatalogEntry {
                song: song.to_string(),
                artist: artist.to_string(),
            })
            .collect()
    }

    fn identity(n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect()
    }

    #[test]
    fn resolves_first_title_match() {
        let store = CatalogStore::from_parts(
            entries(&[("A", "x"), ("B", "y"), ("A", "z")]),
            identity(3),
        )
        .unwrap();
        assert_eq!(store.resolve_index("A"), Ok(0));
        assert_eq!(store.resolve_index("B"), Ok(1));
        assert_eq!(store.artist_for("A"), Ok("x"));
    }

    #[test]
    fn unknown_title_is_not_found() {
        let store = CatalogStore::from_parts(entries(&[("A", "x")]), identity(1)).unwrap();
        assert_eq!(
            store.resolve_index("a"),
            Err(LookupError::NotFound("a".to_string()))
        );
    }

    #[test]
    fn scores_for_includes_self() {
        let rows = vec![vec![1.0, 0.2], vec![0.3, 1.0]];
        let store = CatalogStore::from_parts(entries(&[("A", "x"), ("B", "y")]), rows).unwrap();
        let scores: Vec<_> = store.scores_for(1).collect();
        assert_eq!(scores, vec![(0, 0.3), (1, 1.0)]);
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let err = CatalogStore::from_parts(entries(&[("A", "x"), ("B", "y")]), identity(3))
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::DimensionMismatch {
                catalog: 2,
                rows: 3
            }
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![vec![1.0, 0.5], vec![0.5]];
        let err = CatalogStore::from_parts(entries(&[("A", "x"), ("B", "y")]), rows).unwrap_err();
        assert!(matches!(
            err,
            LoadError::RaggedRow {
                row: 1,
                len: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn rejects_nan_scores() {
        let rows = vec![vec![1.0, f32::NAN], vec![0.5, 1.0]];
        let err = CatalogStore::from_parts(entries(&[("A", "x"), ("B", "y")]), rows).unwrap_err();
        assert!(matches!(err, LoadError::NonFiniteScore { row: 0, column: 1 }));
    }

    #[test]
    fn empty_catalog_is_valid() {
        let store = CatalogStore::from_parts(Vec::new(), Vec::new()).unwrap();
        assert!(store.is_empty());
        assert!(store.resolve_index("A").is_err());
    }

    #[test]
    fn search_pages_over_titles_and_artists() {
        let store = CatalogStore::from_parts(
            entries(&[
                ("Yellow", "Coldplay"),
                ("Clocks", "Coldplay"),
                ("Creep", "Radiohead"),
                ("Mellow Yellow", "Donovan"),
            ]),
            identity(4),
        )
        .unwrap();

        let (items, total) = store.search(Some("yellow"), 10, 0);
        assert_eq!(total, 2);
        assert_eq!(items[0].title, "Yellow");
        assert_eq!(items[1].title, "Mellow Yellow");

        let (items, total) = store.search(Some(" COLDPLAY "), 1, 1);
        assert_eq!(total, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Clocks");

        let (items, total) = store.search(None, 2, 0);
        assert_eq!(total, 4);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn loads_json_catalog_with_bincode_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let matrix_path = dir.path().join("similarity.bin");
        std::fs::write(
            &catalog_path,
            r#"[{"song":"A","artist":"x"},{"song":"B","artist":"y"}]"#,
        )
        .unwrap();
        write_matrix(&matrix_path, &[vec![1.0, 0.4], vec![0.4, 1.0]]).unwrap();

        let store = CatalogStore::load(&catalog_path, &matrix_path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.song(1).unwrap().artist, "y");
        assert_eq!(store.scores_for(0).nth(1), Some((1, 0.4)));
    }

    #[test]
    fn loads_json_matrix_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let matrix_path = dir.path().join("similarity.json");
        std::fs::write(&catalog_path, r#"[{"song":"A","artist":"x"}]"#).unwrap();
        std::fs::write(&matrix_path, "[[1.0]]").unwrap();

        let store = CatalogStore::load(&catalog_path, &matrix_path).unwrap();
        assert_eq!(store.scores_for(0).collect::<Vec<_>>(), vec![(0, 1.0)]);
    }

    #[test]
    fn missing_blob_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatalogStore::load(
            &dir.path().join("missing.json"),
            &dir.path().join("missing.bin"),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn corrupt_matrix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("catalog.json");
        let matrix_path = dir.path().join("similarity.json");
        std::fs::write(&catalog_path, r#"[{"song":"A","artist":"x"}]"#).unwrap();
        std::fs::write(&matrix_path, "[[1.0").unwrap();

        let err = CatalogStore::load(&catalog_path, &matrix_path).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }
}
