use contour_engine::contour::{
    BorderDirection, BorderEdge, CatmullRomAlpha, CurveSmoother, StripKind, StripSource,
    ThresholdTable, assemble_regions, collect_border_strips, resolve_discontinuities,
};
use contour_engine::contour::strip::Strip;
use contour_engine::geom::{contains_point, signed_area};
use contour_engine::{
    Boundary, ContourConfig, ContourEngine, ExpressionField, InterpolationMode, Point2, Tolerance,
    Tunables,
};

fn plot() -> Boundary {
    Boundary::new(0.0, 0.0, 10.0, 10.0)
}

fn classified(level: usize, points: &[(f64, f64)]) -> Strip {
    let mut strip = Strip::new(
        Some(level),
        StripSource::Traced { list: 0 },
        Vec::new(),
        points.iter().map(|&p| Point2::from(p)).collect(),
    );
    strip.classify(&plot(), Tolerance::PLOT, false, None);
    strip
}

fn paraboloid_engine() -> ContourEngine {
    let field = ExpressionField::parse("x^2 + y^2").expect("expression");
    let config = ContourConfig::with_level_values(plot(), &[25.0, 50.0]);
    ContourEngine::from_field(config, Box::new(field), 10, 10).expect("engine")
}

#[test]
fn corner_cut_strip_is_bucketed_on_bottom_edge() {
    let strips = vec![classified(0, &[(5.0, 0.0), (10.0, 5.0)])];
    assert_eq!(strips[0].kind, StripKind::Boundary);
    assert_eq!(strips[0].start, BorderDirection::XForward);
    assert_eq!(strips[0].end, BorderDirection::YForward);

    let buckets = collect_border_strips(&plot(), &strips);
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets.edge(BorderEdge::Bottom).len(), 1);
    assert_eq!(buckets.edge(BorderEdge::Bottom)[0].strip, 0);
    assert!(buckets.edge(BorderEdge::Right).is_empty());
}

#[test]
fn paraboloid_fills_three_bands_without_gaps() {
    let mut engine = paraboloid_engine();
    let frame = engine.frame();

    assert_eq!(frame.regions.len(), 3);
    assert_eq!(frame.fills.len(), 3);
    assert!((frame.covered_area() - 100.0).abs() < 1e-6);

    let mut bounds: Vec<(Option<f64>, Option<f64>)> = frame
        .regions
        .iter()
        .map(|r| {
            let fill = frame.fill_of(r).expect("fill");
            (fill.first, fill.second)
        })
        .collect();
    bounds.sort_by(|a, b| a.0.unwrap_or(f64::NEG_INFINITY).total_cmp(&b.0.unwrap_or(f64::NEG_INFINITY)));
    assert_eq!(
        bounds,
        vec![(None, Some(25.0)), (Some(25.0), Some(50.0)), (Some(50.0), None)]
    );
}

#[test]
fn every_region_is_closed_and_sampled_inside() {
    let mut engine = paraboloid_engine();
    let frame = engine.frame();
    for region in &frame.regions {
        let path = &region.path;
        assert!(path.is_closed(Tolerance::DEFAULT));
        let inside = path.interior_point().expect("interior point");
        assert!(contains_point(&path.points, inside));
        assert!(path.holes.iter().all(|h| !contains_point(h, inside)));
    }
}

#[test]
fn distant_undefined_zones_stay_separate() {
    let mut points = Vec::new();
    for i in 0..3 {
        for j in 0..3 {
            points.push(Point2::new(1.0 + f64::from(i), 1.0 + f64::from(j)));
            points.push(Point2::new(8.0 + f64::from(i), 8.0 + f64::from(j)));
        }
    }
    let clusters = resolve_discontinuities(&points, 1.0, &Tunables::default());
    assert_eq!(clusters.len(), 2);
}

#[test]
fn context_bends_catmull_rom_but_not_linear() {
    let a = Point2::new(0.0, 0.0);
    let b = Point2::new(4.0, 0.0);
    let before = Some(Point2::new(-2.0, 3.0));
    let after = Some(Point2::new(6.0, 3.0));

    let linear = CurveSmoother::new(InterpolationMode::Linear);
    let catmull = CurveSmoother::new(InterpolationMode::CatmullRom(CatmullRomAlpha::Centripetal));

    for smoother in [linear, catmull] {
        let path = smoother.smooth_points_with_context(&[a, b], before, after);
        assert!(Tolerance::DEFAULT.approx_eq_point2(path.start().expect("start"), a));
        assert!(Tolerance::DEFAULT.approx_eq_point2(path.end().expect("end"), b));
    }

    let straight = linear.smooth_points_with_context(&[a, b], before, after).flatten(8);
    assert!(straight.iter().flatten().all(|p| p.y.abs() < 1e-12));
    let bent = catmull.smooth_points_with_context(&[a, b], before, after).flatten(8);
    assert!(bent.iter().flatten().any(|p| p.y.abs() > 1e-3));

    let bare = catmull.smooth_points(&[a, b]).flatten(8);
    assert!(bare.iter().flatten().all(|p| p.y.abs() < 1e-12));
}

#[test]
fn smoothing_keeps_endpoints_in_every_mode() {
    let points: Vec<Point2> = [(0.0, 0.0), (1.0, 2.0), (3.0, 1.5), (4.0, 4.0), (6.0, 3.0)]
        .iter()
        .map(|&p| Point2::from(p))
        .collect();
    for mode in [
        InterpolationMode::Linear,
        InterpolationMode::CubicSpline,
        InterpolationMode::CatmullRom(CatmullRomAlpha::Uniform),
        InterpolationMode::CatmullRom(CatmullRomAlpha::Chordal),
        InterpolationMode::Hermite,
        InterpolationMode::MonotoneHermite,
    ] {
        let path = CurveSmoother::new(mode).smooth_points(&points);
        assert!(Tolerance::DEFAULT.approx_eq_point2(path.start().expect("start"), points[0]));
        assert!(Tolerance::DEFAULT.approx_eq_point2(path.end().expect("end"), points[4]));
    }
}

#[test]
fn thresholds_pick_the_containing_band() {
    let table = ThresholdTable::new(vec![0.0, 10.0, 20.0]).expect("ascending");
    assert_eq!(table.band_bounds(table.band(5.0).expect("band")), (Some(0.0), Some(10.0)));
    assert_eq!(table.band_bounds(table.band(-5.0).expect("band")), (None, Some(0.0)));
    assert_eq!(table.band_bounds(table.band(25.0).expect("band")), (Some(20.0), None));
    assert_eq!(table.band(f64::NAN), None);

    assert!(ThresholdTable::new(vec![10.0, 0.0]).is_err());
    assert_eq!(ThresholdTable::normalized(vec![10.0, 0.0]).values(), &[0.0, 10.0]);
}

#[test]
fn reassembly_is_stable() {
    let strips = vec![
        classified(0, &[(5.0, 0.0), (10.0, 5.0)]),
        classified(1, &[(0.0, 5.0), (5.0, 10.0)]),
        classified(0, &[(2.0, 6.0), (4.0, 6.0), (4.0, 8.0), (2.0, 8.0), (2.0, 6.0)]),
    ];
    let first = assemble_regions(&plot(), &strips, &Tunables::default());
    let second = assemble_regions(&plot(), &strips, &Tunables::default());
    assert_eq!(first.paths.len(), second.paths.len());
    for (a, b) in first.paths.iter().zip(&second.paths) {
        let (ca, cb) = (a.centroid().expect("centroid"), b.centroid().expect("centroid"));
        assert!(Tolerance::DEFAULT.approx_eq_point2(ca, cb));
    }
}

#[test]
fn same_loop_in_two_orderings_is_emitted_once() {
    let strips = vec![
        classified(0, &[(3.0, 3.0), (6.0, 3.0), (6.0, 6.0), (3.0, 6.0), (3.0, 3.0)]),
        classified(0, &[(6.0, 6.0), (6.0, 3.0), (3.0, 3.0), (3.0, 6.0), (6.0, 6.0)]),
    ];
    let assembly = assemble_regions(&plot(), &strips, &Tunables::default());
    let loops: Vec<_> = assembly.paths.iter().filter(|p| p.from_loop).collect();
    assert_eq!(loops.len(), 1);
    assert!(signed_area(&loops[0].points) > 0.0);
}

#[test]
fn square_root_edge_leaves_an_undefined_zone() {
    let field = ExpressionField::parse("sqrt(x - 3)").expect("expression");
    let config = ContourConfig::with_level_values(plot(), &[1.0, 2.0])
        .with_tunables(Tunables::default().with_merge_floor(2));
    let mut engine = ContourEngine::from_field(config, Box::new(field), 21, 21).expect("engine");
    let frame = engine.frame();

    assert_eq!(frame.clusters.len(), 1);
    assert_eq!(frame.diagnostics.cluster_count, 1);
    assert!(frame.clusters[0].points.iter().all(|p| p.x < 3.0));
    assert!(!frame.regions.is_empty());
    for region in &frame.regions {
        assert!(region.path.is_closed(Tolerance::DEFAULT));
    }
}
