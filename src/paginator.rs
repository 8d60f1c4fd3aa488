use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::photo_store::PhotoRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("invalid layout configuration: {0}")]
    InvalidConfiguration(String),
}

/// Caption size category. The paginator only guarantees the ordering
/// Small < Medium < Large; concrete point sizes are the renderer's choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFontSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Layout options for one pagination run. Immutable once handed to
/// `paginate`; any change means a full recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub photos_per_page: usize,
    pub columns: usize,
    pub include_captions: bool,
    pub caption_font_size: CaptionFontSize,
    pub paper_size: PaperSize,
    pub orientation: Orientation,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            photos_per_page: 6,
            columns: 3,
            include_captions: true,
            caption_font_size: CaptionFontSize::Medium,
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
        }
    }
}

impl LayoutConfig {
    /// Rows a full page occupies. The last row may be partially filled since
    /// `columns` need not divide `photos_per_page`.
    pub fn rows_per_page(&self) -> usize {
        self.photos_per_page.div_ceil(self.columns)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.photos_per_page == 0 {
            return Err(LayoutError::InvalidConfiguration(
                "photosPerPage must be at least 1".to_string(),
            ));
        }
        if self.columns == 0 {
            return Err(LayoutError::InvalidConfiguration(
                "columns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One occupied grid position. Trailing positions of a partial final row are
/// simply absent, never emitted as empty cells.
#[derive(Debug, Clone, Serialize)]
pub struct Cell<'a> {
    pub row: usize,
    pub column: usize,
    pub photo: &'a PhotoRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<'a> {
    /// 1-based, contiguous.
    pub page_number: usize,
    pub cells: Vec<Cell<'a>>,
}

/// Partitions `photos`, in order, into pages of `photos_per_page` cells laid
/// out row-major across `columns`. Pure and deterministic: identical inputs
/// produce structurally identical output, and no photo is dropped,
/// duplicated, or reordered. Zero photos yields zero pages.
pub fn paginate<'a>(
    photos: &'a [PhotoRecord],
    config: &LayoutConfig,
) -> Result<Vec<Page<'a>>, LayoutError> {
    config.validate()?;

    if photos.is_empty() {
        return Ok(Vec::new());
    }

    let pages = photos
        .chunks(config.photos_per_page)
        .enumerate()
        .map(|(page_idx, group)| Page {
            page_number: page_idx + 1,
            cells: group
                .iter()
                .enumerate()
                .map(|(i, photo)| Cell {
                    row: i / config.columns,
                    column: i % config.columns,
                    photo,
                })
                .collect(),
        })
        .collect();

    Ok(pages)
}

/// Total page count for a photo count: `ceil(n / photos_per_page)`, zero for
/// zero photos.
pub fn page_count(photo_count: usize, config: &LayoutConfig) -> Result<usize, LayoutError> {
    config.validate()?;
    Ok(photo_count.div_ceil(config.photos_per_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo_store::{PhotoOrigin, PhotoRecord};

    fn photos(n: usize) -> Vec<PhotoRecord> {
        (0..n)
            .map(|i| {
                PhotoRecord::new(
                    format!("p{}", i),
                    format!("IMG_{}.jpg", i),
                    PhotoOrigin::Uploaded,
                    "image/jpeg".to_string(),
                    Vec::new(),
                )
            })
            .collect()
    }

    #[test]
    fn test_ten_photos_six_per_page_three_columns() {
        let photos = photos(10);
        let config = LayoutConfig {
            photos_per_page: 6,
            columns: 3,
            ..LayoutConfig::default()
        };
        let pages = paginate(&photos, &config).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].cells.len(), 6);
        assert_eq!(pages[1].cells.len(), 4);

        // Page 2: three cells on row 0, one on row 1 column 0.
        let positions: Vec<(usize, usize)> =
            pages[1].cells.iter().map(|c| (c.row, c.column)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
    }

    #[test]
    fn test_row_major_packing() {
        let photos = photos(12);
        let config = LayoutConfig {
            photos_per_page: 12,
            columns: 4,
            ..LayoutConfig::default()
        };
        let pages = paginate(&photos, &config).unwrap();
        assert_eq!(pages.len(), 1);

        for (k, cell) in pages[0].cells.iter().enumerate() {
            assert_eq!(cell.row, k / 4);
            assert_eq!(cell.column, k % 4);
            assert!(cell.column < config.columns);
        }
    }

    #[test]
    fn test_conservation_of_photo_ids() {
        let photos = photos(23);
        let config = LayoutConfig {
            photos_per_page: 5,
            columns: 2,
            ..LayoutConfig::default()
        };
        let pages = paginate(&photos, &config).unwrap();

        let emitted: Vec<&str> = pages
            .iter()
            .flat_map(|p| p.cells.iter().map(|c| c.photo.id.as_str()))
            .collect();
        let input: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(emitted, input);
    }

    #[test]
    fn test_zero_photos_zero_pages() {
        let pages = paginate(&[], &LayoutConfig::default()).unwrap();
        assert!(pages.is_empty());
        assert_eq!(page_count(0, &LayoutConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_invalid_configuration_fails_fast() {
        let photos = photos(3);
        let zero_per_page = LayoutConfig {
            photos_per_page: 0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            paginate(&photos, &zero_per_page),
            Err(LayoutError::InvalidConfiguration(_))
        ));

        let zero_columns = LayoutConfig {
            columns: 0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            paginate(&photos, &zero_columns),
            Err(LayoutError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_idempotence() {
        let photos = photos(7);
        let config = LayoutConfig {
            photos_per_page: 4,
            columns: 2,
            ..LayoutConfig::default()
        };
        let first = paginate(&photos, &config).unwrap();
        let second = paginate(&photos, &config).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.page_number, b.page_number);
            let cells_a: Vec<(usize, usize, &str)> = a
                .cells
                .iter()
                .map(|c| (c.row, c.column, c.photo.id.as_str()))
                .collect();
            let cells_b: Vec<(usize, usize, &str)> = b
                .cells
                .iter()
                .map(|c| (c.row, c.column, c.photo.id.as_str()))
                .collect();
            assert_eq!(cells_a, cells_b);
        }
    }

    #[test]
    fn test_page_count_matches_ceil() {
        let config = LayoutConfig {
            photos_per_page: 6,
            ..LayoutConfig::default()
        };
        assert_eq!(page_count(1, &config).unwrap(), 1);
        assert_eq!(page_count(6, &config).unwrap(), 1);
        assert_eq!(page_count(7, &config).unwrap(), 2);
        assert_eq!(page_count(13, &config).unwrap(), 3);
    }

    #[test]
    fn test_rows_per_page_with_partial_row() {
        let config = LayoutConfig {
            photos_per_page: 7,
            columns: 3,
            ..LayoutConfig::default()
        };
        assert_eq!(config.rows_per_page(), 3);
    }
}
