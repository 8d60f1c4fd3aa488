use photo_report::natural_sort;
use photo_report::paginator::{paginate, page_count, LayoutConfig, LayoutError};
use photo_report::photo_store::{PhotoOrigin, PhotoRecord, PhotoStore};

fn photo(id: &str, name: &str) -> PhotoRecord {
    PhotoRecord::new(
        id.to_string(),
        name.to_string(),
        PhotoOrigin::Uploaded,
        "image/jpeg".to_string(),
        vec![0u8; 8],
    )
}

#[test]
fn test_store_order_flows_through_pagination() {
    let store = PhotoStore::new();
    store.add(
        "job-1",
        vec![
            photo("c", "IMG_10.jpg"),
            photo("a", "IMG_1.jpg"),
            photo("b", "IMG_2.jpg"),
            photo("d", "site plan.png"),
        ],
    );

    let photos = store.list_sorted("job-1");
    let config = LayoutConfig {
        photos_per_page: 3,
        columns: 3,
        ..LayoutConfig::default()
    };
    let pages = paginate(&photos, &config).unwrap();

    assert_eq!(pages.len(), 2);
    let first_row: Vec<&str> = pages[0]
        .cells
        .iter()
        .map(|c| c.photo.name.as_str())
        .collect();
    assert_eq!(first_row, vec!["IMG_1.jpg", "IMG_2.jpg", "IMG_10.jpg"]);
    assert_eq!(pages[1].cells[0].photo.name, "site plan.png");
}

#[test]
fn test_natural_sort_handles_mixed_names() {
    let mut names = vec![
        "photo-2.jpg",
        "photo-10.jpg",
        "photo-1.jpg",
        "annex.jpg",
        "IMG_0003.jpg",
        "IMG_3.jpg",
    ];
    names.sort_by(|a, b| natural_sort::compare(a, b));
    assert_eq!(
        names,
        vec![
            "IMG_0003.jpg",
            "IMG_3.jpg",
            "annex.jpg",
            "photo-1.jpg",
            "photo-2.jpg",
            "photo-10.jpg",
        ]
    );
}

#[test]
fn test_removal_repacks_following_pages() {
    let store = PhotoStore::new();
    store.add(
        "s",
        (1..=7)
            .map(|i| photo(&format!("p{}", i), &format!("IMG_{}.jpg", i)))
            .collect(),
    );
    let config = LayoutConfig {
        photos_per_page: 4,
        columns: 2,
        ..LayoutConfig::default()
    };

    let photos_before = store.list_sorted("s");
    let before = paginate(&photos_before, &config).unwrap();
    assert_eq!(before.len(), 2);

    // Removing a photo from page 1 pulls the first photo of page 2 forward.
    assert!(store.remove("s", "p2"));
    let photos_after = store.list_sorted("s");
    let after = paginate(&photos_after, &config).unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].cells.len(), 4);
    assert_eq!(after[0].cells[1].photo.name, "IMG_3.jpg");
    assert_eq!(after[1].cells.len(), 2);
}

#[test]
fn test_last_page_has_no_trailing_cells() {
    let photos: Vec<PhotoRecord> = (0..5)
        .map(|i| photo(&format!("p{}", i), &format!("{}.jpg", i)))
        .collect();
    let config = LayoutConfig {
        photos_per_page: 4,
        columns: 2,
        ..LayoutConfig::default()
    };
    let pages = paginate(&photos, &config).unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].cells.len(), 1);
    assert_eq!(pages[1].cells[0].row, 0);
    assert_eq!(pages[1].cells[0].column, 0);
}

#[test]
fn test_invalid_configuration_rejected_before_layout() {
    let photos = vec![photo("a", "a.jpg")];
    let bad = LayoutConfig {
        columns: 0,
        ..LayoutConfig::default()
    };
    assert!(matches!(
        paginate(&photos, &bad),
        Err(LayoutError::InvalidConfiguration(_))
    ));
    assert!(page_count(1, &bad).is_err());
}

#[test]
fn test_layout_config_accepts_client_json() {
    let config: LayoutConfig = serde_json::from_str(
        r#"{"photosPerPage": 9, "columns": 3, "captionFontSize": "small"}"#,
    )
    .unwrap();
    assert_eq!(config.photos_per_page, 9);
    assert_eq!(config.columns, 3);
    // Unspecified fields keep their defaults.
    assert!(config.include_captions);
}
