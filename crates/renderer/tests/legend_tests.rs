//! Tests for legend gradients and reduced color ramps.

use renderer::{
    build_legend, build_reduced_ramp, sample, Palette, TransparencyPolicy, TRANSPARENT_HEX,
};

#[test]
fn test_reduced_ramp_quarter_threshold() {
    let ramp = build_reduced_ramp("viridis", &TransparencyPolicy::new(0.25), 12);

    assert_eq!(ramp.len(), 12);
    assert!(ramp[..3].iter().all(|c| c == TRANSPARENT_HEX));

    for (i, hex) in ramp[3..].iter().enumerate() {
        let t = (i + 1) as f64 / 9.0;
        assert_ne!(hex, TRANSPARENT_HEX);
        assert_eq!(hex, &Palette::Viridis.color_at(t).to_hex(), "entry {}", i + 3);
    }
    assert_eq!(ramp[11], "#fde725");
}

#[test]
fn test_reduced_ramp_uses_same_curve_as_tiles() {
    let policy = TransparencyPolicy::new(0.0);
    let ramp = build_reduced_ramp("plasma", &policy, 4);
    let tile_colors: Vec<String> = [0.25f32, 0.5, 0.75, 1.0]
        .iter()
        .map(|v| sample(*v, Palette::Plasma, &policy).to_hex())
        .collect();
    assert_eq!(ramp, tile_colors);
}

#[test]
fn test_legend_positions_monotonic_and_span_full_width() {
    for palette in Palette::ALL {
        for threshold in [0.0, 0.05, 0.3, 0.99, 1.0] {
            let legend = build_legend(palette.name(), &TransparencyPolicy::new(threshold));
            let positions: Vec<f64> = legend.gradient_stops.iter().map(|s| s.position).collect();

            assert_eq!(positions.first(), Some(&0.0));
            assert_eq!(positions.last(), Some(&100.0));
            assert!(
                positions.windows(2).all(|w| w[0] <= w[1]),
                "{} threshold {}: {:?}",
                palette,
                threshold,
                positions
            );
        }
    }
}

#[test]
fn test_legend_band_then_named_stops() {
    let policy = TransparencyPolicy::new(0.0).with_legend_percent(Some(20.0));
    let legend = build_legend("turbo", &policy);

    assert!(legend.gradient_stops[..2].iter().all(|s| s.color.a == 0));
    let colored = &legend.gradient_stops[2..];
    assert_eq!(colored.len(), Palette::Turbo.stops().len());
    assert_eq!(colored[0].position, 20.0);
    // 7 stops over the remaining 80%
    assert!((colored[1].position - (20.0 + 80.0 / 6.0)).abs() < 1e-9);
    for (stop, color) in colored.iter().zip(Palette::Turbo.stops()) {
        assert_eq!(&stop.color, color);
    }
}

#[test]
fn test_legend_percent_does_not_change_sampling() {
    let narrow = TransparencyPolicy::new(0.4).with_legend_percent(Some(1.0));
    let wide = TransparencyPolicy::new(0.4).with_legend_percent(Some(90.0));
    for i in 0..=10 {
        let v = i as f32 / 10.0;
        assert_eq!(
            sample(v, Palette::Blues, &narrow),
            sample(v, Palette::Blues, &wide)
        );
    }
}

#[test]
fn test_legend_serializes_to_json() {
    let legend = build_legend("magma", &TransparencyPolicy::default());
    let json = serde_json::to_value(&legend).unwrap();
    assert_eq!(json["palette"], "magma");
    assert_eq!(json["gradient_stops"].as_array().unwrap().len(), 7);
    assert_eq!(json["labels"][0], "0.00");
}
