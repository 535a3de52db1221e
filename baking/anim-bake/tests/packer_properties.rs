//! Layout properties of the atlas packer

use anim_bake::atlas::{AtlasPacker, PackOptions, PackResult, Rect};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn assert_valid_layout(sizes: &[(u32, u32)], result: &PackResult) {
    assert_eq!(result.regions.len(), sizes.len());
    for (region, (width, height)) in result.regions.iter().zip(sizes) {
        assert_eq!((region.width, region.height), (*width, *height));
        assert!(
            region.fits_within(result.width, result.height),
            "{region:?} outside {}x{}",
            result.width,
            result.height
        );
    }
    for (i, a) in result.regions.iter().enumerate() {
        for b in &result.regions[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn test_scenario_three_clips() {
    let sizes = [(10, 8), (4, 8), (6, 8)];
    let result = AtlasPacker::default().pack(&sizes).unwrap();

    assert_valid_layout(&sizes, &result);
    let used: u64 = sizes.iter().map(|(w, h)| u64::from(*w * *h)).sum();
    assert_eq!(result.used_area(), used);

    // 10 on top, 6 and 4 side by side below: nothing left empty
    assert_eq!((result.width, result.height), (10, 16));
    assert_eq!(result.total_area() - used, 0);
    assert_eq!(result.efficiency(), 1.0);
}

#[test]
fn test_layout_is_deterministic() {
    let sizes = [(7, 4), (7, 4), (3, 4), (12, 4), (3, 4)];
    let packer = AtlasPacker::default();
    assert_eq!(packer.pack(&sizes).unwrap(), packer.pack(&sizes).unwrap());
}

#[test]
fn test_tighter_fill_factor_widens_atlas() {
    let sizes = [(8, 6); 9];
    let dense = AtlasPacker::new(PackOptions { fill_factor: 1.0 })
        .pack(&sizes)
        .unwrap();
    let loose = AtlasPacker::new(PackOptions { fill_factor: 0.25 })
        .pack(&sizes)
        .unwrap();

    assert_valid_layout(&sizes, &dense);
    assert_valid_layout(&sizes, &loose);
    assert!(loose.width >= dense.width);
    assert_eq!(dense.regions[0], Rect::new(0, 0, 8, 6));
}

proptest! {
    #[test]
    fn prop_same_height_regions_never_overlap(
        widths in prop::collection::vec(1u32..200, 1..24),
        height in 1u32..64,
    ) {
        let sizes: Vec<(u32, u32)> = widths.iter().map(|w| (*w, height)).collect();
        let result = AtlasPacker::default().pack(&sizes).unwrap();
        assert_valid_layout(&sizes, &result);

        let widest = widths.iter().copied().max().unwrap_or(0);
        prop_assert!(result.width >= widest);
        prop_assert!(result.efficiency() > 0.0 && result.efficiency() <= 1.0);
    }

    #[test]
    fn prop_mixed_sizes_never_overlap(
        sizes in prop::collection::vec((1u32..64, 1u32..64), 1..16),
        fill in 0.1f32..=1.0,
    ) {
        let packer = AtlasPacker::new(PackOptions { fill_factor: fill });
        let result = packer.pack(&sizes).unwrap();
        assert_valid_layout(&sizes, &result);
    }
}
