use crate::contour::assemble::{ClosedPath, assemble_regions};
use crate::contour::border::Boundary;
use crate::contour::config::{LevelStyle, Tunables};
use crate::contour::field::ScalarField;
use crate::contour::fill::{Color, Fill, FillResolver, ThresholdTable};
use crate::contour::strip::{Strip, StripSource};
use crate::contour::style::LevelStyleStrategy;
use crate::geom::{Point2, Tolerance};

const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

fn boundary() -> Boundary {
    Boundary::new(0.0, 0.0, 10.0, 10.0)
}

fn across(level: usize, y: f64) -> Strip {
    let mut s = Strip::new(
        Some(level),
        StripSource::Traced { list: 0 },
        Vec::new(),
        vec![Point2::new(0.0, y), Point2::new(10.0, y)],
    );
    s.classify(&boundary(), Tolerance::PLOT, false, None);
    s
}

/// Bottom, middle and top bands split by level 0 at `y = 3` and level 1 at
/// `y = 7`.
fn three_bands() -> [ClosedPath; 3] {
    let assembly = assemble_regions(
        &boundary(),
        &[across(0, 3.0), across(1, 7.0)],
        &Tunables::default(),
    );
    assert_eq!(assembly.paths.len(), 3);
    let band = |levels: &[usize]| {
        assembly
            .paths
            .iter()
            .find(|p| p.levels == levels)
            .cloned()
            .expect("band")
    };
    [band(&[0]), band(&[0, 1]), band(&[1])]
}

fn red_blue() -> LevelStyleStrategy {
    LevelStyleStrategy::new(vec![LevelStyle::new(0.0, RED), LevelStyle::new(10.0, BLUE)])
}

#[test]
fn nan_sample_leaves_region_empty() {
    let [bottom, middle, top] = three_bands();
    let thresholds = ThresholdTable::new(vec![0.0, 10.0]).expect("ascending");
    let style = red_blue();
    let field: &dyn ScalarField = &|_x: f64, y: f64| {
        if y > 7.0 {
            f64::NAN
        } else if y > 3.0 {
            5.0
        } else {
            -1.0
        }
    };
    let resolver = FillResolver::new(&thresholds, &style).with_field(Some(field));

    let resolved = resolver.resolve(&top);
    assert!(resolved.undefined);
    assert!(resolved.fill.fill.is_empty());
    assert_eq!((resolved.fill.first, resolved.fill.second), (None, None));
    assert!(resolved.sample.is_some_and(|p| p.y > 7.0));

    let resolved = resolver.resolve(&middle);
    assert!(!resolved.undefined);
    assert_eq!((resolved.fill.first, resolved.fill.second), (Some(0.0), Some(10.0)));

    let resolved = resolver.resolve(&bottom);
    assert!(!resolved.undefined);
    assert_eq!((resolved.fill.first, resolved.fill.second), (None, Some(0.0)));
}

#[test]
fn single_level_uses_its_fill_or_half_alpha_line() {
    let thresholds = ThresholdTable::new(vec![5.0]).expect("ascending");
    let plain = LevelStyleStrategy::new(vec![LevelStyle::new(5.0, RED)]);
    let resolver = FillResolver::new(&thresholds, &plain);

    let fill = resolver.fill_for_levels(&[0]);
    assert_eq!((fill.first, fill.second), (Some(5.0), None));
    assert!(fill.fill.approx_eq(&Fill::color(Color::rgba(1.0, 0.0, 0.0, 0.5)), 1e-12));

    // Outside the levels on either side only one level bounds the band.
    let above = resolver.fill_for_value(9.0).expect("defined");
    assert_eq!((above.first, above.second), (Some(5.0), None));
    assert!(above.fill.approx_eq(&fill.fill, 1e-12));
    let below = resolver.fill_for_value(1.0).expect("defined");
    assert_eq!((below.first, below.second), (None, Some(5.0)));

    let hatched = LevelStyleStrategy::new(vec![
        LevelStyle::new(5.0, RED).with_fill(Fill::image("hatch", false)),
    ]);
    let resolver = FillResolver::new(&thresholds, &hatched);
    assert_eq!(resolver.fill_for_levels(&[0]).fill, Fill::image("hatch", false));
}

#[test]
fn two_levels_average_line_colors() {
    let [_, middle, _] = three_bands();
    let thresholds = ThresholdTable::new(vec![0.0, 10.0]).expect("ascending");
    let style = red_blue();
    let resolver = FillResolver::new(&thresholds, &style);
    let purple = Fill::color(Color::rgba(0.5, 0.0, 0.5, 1.0));

    let by_levels = resolver.fill_for_levels(&[1, 0, 1]);
    assert_eq!((by_levels.first, by_levels.second), (Some(0.0), Some(10.0)));
    assert!(by_levels.fill.approx_eq(&purple, 1e-12));

    let by_value = resolver.fill_for_value(5.0).expect("defined");
    assert!(by_value.matches(&by_levels));

    // Without a field the region's outline levels decide.
    let resolved = resolver.resolve(&middle);
    assert!(!resolved.undefined);
    assert!(resolved.fill.matches(&by_levels));
}

#[test]
fn band_fills_replace_blended_colors() {
    let thresholds = ThresholdTable::new(vec![0.0, 10.0]).expect("ascending");
    let style = red_blue();
    let bands = [
        Fill::color(Color::gray(0.1, 1.0)),
        Fill::image("dots", true),
        Fill::color(Color::gray(0.9, 1.0)),
    ];
    let resolver = FillResolver::new(&thresholds, &style).with_band_fills(Some(&bands[..]));

    let below = resolver.fill_for_value(-1.0).expect("defined");
    assert_eq!(below.fill, bands[0]);
    assert_eq!((below.first, below.second), (None, Some(0.0)));
    assert_eq!(resolver.fill_for_value(5.0).expect("defined").fill, bands[1]);
    assert_eq!(resolver.fill_for_value(12.0).expect("defined").fill, bands[2]);
    assert_eq!(resolver.fill_for_levels(&[0, 1]).fill, bands[1]);

    assert!(resolver.fill_for_value(f64::NAN).is_none());
}
