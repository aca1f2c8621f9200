use crate::domain::model::{SourceKey, StorageKey};

/// Maps a (year, month) coordinate to file name, remote URL and data key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub base_url: String,
    pub file_stem: String,
    pub extension: String,
    pub data_prefix: String,
}

impl SourceLayout {
    pub fn file_name(&self, year: i32, month: u32) -> String {
        format!("{}_{}-{:02}.{}", self.file_stem, year, month, self.extension)
    }

    pub fn source_key(&self, year: i32, month: u32) -> SourceKey {
        let file_name = self.file_name(year, month);
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), file_name);
        let storage_key = StorageKey::new(format!("{}{}", self.data_prefix, file_name));

        SourceKey {
            year,
            month,
            file_name,
            url,
            storage_key,
        }
    }
}

/// Inclusive range of (year, month) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpace {
    pub start: (i32, u32),
    pub end: (i32, u32),
}

impl KeySpace {
    pub fn new(start: (i32, u32), end: (i32, u32)) -> Self {
        Self { start, end }
    }

    /// Every month of every year from `start_year` through `end_year`.
    pub fn years(start_year: i32, end_year: i32) -> Self {
        Self::new((start_year, 1), (end_year, 12))
    }

    /// Ascending year, then ascending month.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u32)> {
        let (start, end) = (self.start, self.end);
        (start.0..=end.0)
            .flat_map(|year| (1..=12).map(move |month| (year, month)))
            .filter(move |coord| *coord >= start && *coord <= end)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}
