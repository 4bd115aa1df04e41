#![cfg(feature = "serde")]

extern crate icogen;

use icogen::{
    CropRegion, IconConfig, IconSizeSet, PngCompression, ResampleFilter,
};

//===========================================================================//

#[test]
fn size_set_deserializes_sorted_and_deduplicated() {
    let sizes: IconSizeSet = serde_json::from_str("[32,16,16]").unwrap();
    assert_eq!(sizes.to_vec(), vec![16, 32]);
    assert_eq!(serde_json::to_string(&sizes).unwrap(), "[16,32]");
}

#[test]
fn size_set_rejects_out_of_range_sizes() {
    assert!(serde_json::from_str::<IconSizeSet>("[512]").is_err());
    assert!(serde_json::from_str::<IconSizeSet>("[16,0]").is_err());
}

#[test]
fn partial_config_uses_defaults() {
    let config: IconConfig =
        serde_json::from_str(r#"{"filter":"lanczos3"}"#).unwrap();
    assert_eq!(
        config,
        IconConfig::default().with_filter(ResampleFilter::Lanczos3)
    );
    assert_eq!(config.max_file_size, 50 * 1024 * 1024);
}

#[test]
fn config_round_trips_through_json() {
    let config = IconConfig::default()
        .with_filter(ResampleFilter::CatmullRom)
        .with_compression(PngCompression::Best)
        .with_multithreading(false);
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""filter":"catmullrom""#));
    assert!(json.contains(r#""compression":"best""#));
    let parsed: IconConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn crop_region_serializes_as_struct() {
    let crop: CropRegion =
        serde_json::from_str(r#"{"x":5,"y":3,"side":40}"#).unwrap();
    assert_eq!(crop, CropRegion::new(5, 3, 40));
}

//===========================================================================//
