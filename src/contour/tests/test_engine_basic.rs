use crate::contour::border::Boundary;
use crate::contour::config::{ContourConfig, LevelStyle, Tunables};
use crate::contour::engine::{ContourEngine, UpdateReason};
use crate::contour::fill::Color;
use crate::contour::style::{StyleEntry, StyleResult};
use crate::contour::tracer::StripTracer;
use crate::geom::Point2;

fn boundary() -> Boundary {
    Boundary::new(0.0, 0.0, 10.0, 10.0)
}

fn pts(points: &[(f64, f64)]) -> Vec<Point2> {
    points.iter().map(|&p| Point2::from(p)).collect()
}

fn horizontal_tracer() -> StripTracer {
    let mut tracer = StripTracer::new(boundary(), 1).with_grid((1.0, 1.0), (11, 11));
    tracer.add_strip(0, &pts(&[(0.0, 5.0), (5.0, 5.0), (10.0, 5.0)]));
    tracer
}

#[test]
fn frame_is_cached_until_marked_dirty() {
    let config = ContourConfig::with_level_values(boundary(), &[5.0]);
    let mut engine = ContourEngine::new(config, Box::new(horizontal_tracer())).expect("engine");
    assert!(engine.is_dirty());

    let regions = engine.frame().regions.len();
    assert_eq!(regions, 2);
    let again = engine.frame().regions.len();
    assert_eq!(again, regions);
    assert_eq!(engine.recompute_count(), 1);
    assert!(!engine.is_dirty());

    engine.mark_dirty(UpdateReason::PlotSize);
    let _ = engine.frame();
    assert_eq!(engine.recompute_count(), 2);
}

#[test]
fn rejected_levels_keep_previous_configuration() {
    let config = ContourConfig::with_level_values(boundary(), &[5.0]);
    let mut engine = ContourEngine::new(config, Box::new(horizontal_tracer())).expect("engine");
    let _ = engine.frame();

    let black = Color::gray(0.0, 1.0);
    let result = engine.set_levels(vec![LevelStyle::new(2.0, black), LevelStyle::new(1.0, black)]);
    assert!(result.is_err());
    assert_eq!(engine.config().level_values(), vec![5.0]);
    assert!(!engine.is_dirty());

    engine
        .set_levels(vec![LevelStyle::new(4.0, black)])
        .expect("ascending levels");
    assert!(engine.is_dirty());
}

#[test]
fn style_strategy_styles_lines() {
    let config = ContourConfig::with_level_values(boundary(), &[5.0]);
    let style = |entry: &StyleEntry| StyleResult {
        width: 3.0 + entry.level as f64,
        color: Color::rgba(1.0, 0.0, 0.0, 1.0),
        fill: None,
    };
    let mut engine = ContourEngine::new(config, Box::new(horizontal_tracer()))
        .expect("engine")
        .with_style_strategy(Box::new(style));

    let frame = engine.frame();
    assert_eq!(frame.lines.len(), 1);
    assert_eq!(frame.lines[0].style.width, 3.0);
    assert_eq!(frame.lines[0].style.color, Color::rgba(1.0, 0.0, 0.0, 1.0));
}

#[test]
fn pixel_scale_snaps_to_pixel_centres() {
    let config = ContourConfig::with_level_values(boundary(), &[5.0]).with_pixel_scale(2.0);
    let mut engine = ContourEngine::new(config, Box::new(horizontal_tracer())).expect("engine");
    let frame = engine.frame();

    let on_centre = |v: f64| ((v * 2.0 - 0.5).rem_euclid(1.0)).abs() < 1e-9;
    for line in &frame.lines {
        assert!(line.points.iter().all(|p| on_centre(p.x) && on_centre(p.y)));
    }
    for region in &frame.regions {
        assert!(region.path.points.iter().all(|p| on_centre(p.x) && on_centre(p.y)));
    }
}

#[test]
fn crossing_strips_are_reorganized_before_assembly() {
    let mut tracer = StripTracer::new(boundary(), 1).with_grid((1.0, 1.0), (11, 11));
    tracer
        .add_strip(0, &pts(&[(0.0, 2.0), (10.0, 8.0)]))
        .add_strip(0, &pts(&[(0.0, 8.0), (10.0, 2.0)]));
    let config = ContourConfig::with_level_values(boundary(), &[0.0]);
    let mut engine = ContourEngine::new(config, Box::new(tracer)).expect("engine");

    let frame = engine.frame();
    assert_eq!(frame.diagnostics.intersection_count, 1);
    assert_eq!(frame.diagnostics.reorganized_strip_count, 2);
    assert_eq!(frame.diagnostics.region_count, 3);
    assert_eq!(frame.regions.len(), 3);
    // Lines keep the traced geometry.
    assert_eq!(frame.lines.len(), 2);
    assert!((frame.covered_area() - 100.0).abs() < 1e-9);
}

#[test]
fn undefined_block_becomes_empty_region() {
    let mut undefined = Vec::new();
    for x in [4.5, 5.0, 5.5] {
        for y in [4.5, 5.0, 5.5] {
            undefined.push(Point2::new(x, y));
        }
    }
    let tracer = StripTracer::new(boundary(), 1)
        .with_grid((0.5, 0.5), (21, 21))
        .with_undefined_points(&undefined);
    let config = ContourConfig::with_level_values(boundary(), &[0.0])
        .with_tunables(Tunables::default().with_merge_floor(2));
    let mut engine = ContourEngine::new(config, Box::new(tracer)).expect("engine");

    let frame = engine.frame();
    assert_eq!(frame.diagnostics.cluster_count, 1);
    assert_eq!(frame.clusters.len(), 1);

    let hole = frame
        .regions
        .iter()
        .find(|r| r.path.from_loop)
        .expect("cluster region");
    assert!(hole.path.levels.is_empty());
    let fill = frame.fill_of(hole).expect("fill entry");
    assert!(fill.fill.is_empty());

    let plot = frame.regions.iter().find(|r| !r.path.from_loop).expect("plot");
    assert_eq!(plot.path.holes.len(), 1);
}

#[test]
fn field_engine_splits_plot_at_level() {
    let config = ContourConfig::with_level_values(boundary(), &[4.5]);
    let field = |x: f64, _y: f64| x;
    let mut engine = ContourEngine::from_field(config, Box::new(field), 11, 11).expect("engine");

    let frame = engine.frame();
    assert_eq!(frame.regions.len(), 2);
    assert_ne!(frame.regions[0].fill, frame.regions[1].fill);
    assert!((frame.covered_area() - 100.0).abs() < 1e-9);
    assert_eq!(frame.diagnostics.undefined_fill_count, 0);
    assert_eq!(frame.timing.is_some(), cfg!(feature = "engine_metrics"));
}

#[test]
fn nan_field_samples_count_as_undefined_fills() {
    let config = ContourConfig::with_level_values(boundary(), &[5.0]);
    let field = |_x: f64, y: f64| if y > 5.0 { f64::NAN } else { 0.0 };
    let mut engine = ContourEngine::new(config, Box::new(horizontal_tracer()))
        .expect("engine")
        .with_field(Box::new(field));

    let frame = engine.frame();
    assert_eq!(frame.regions.len(), 2);
    assert_eq!(frame.diagnostics.undefined_fill_count, 1);
    assert_eq!(frame.diagnostics.cluster_count, 0);

    let top = frame
        .regions
        .iter()
        .find(|r| r.path.centroid().is_some_and(|c| c.y > 5.0))
        .expect("top region");
    assert!(frame.fill_of(top).expect("fill entry").fill.is_empty());
    let bottom = frame
        .regions
        .iter()
        .find(|r| r.path.centroid().is_some_and(|c| c.y < 5.0))
        .expect("bottom region");
    let fill = frame.fill_of(bottom).expect("fill entry");
    assert!(!fill.fill.is_empty());
    assert_eq!((fill.first, fill.second), (None, Some(5.0)));
}

#[test]
fn crossing_repair_and_undefined_zone_share_a_level() {
    // Left wedge of the X spans y in [3.5, 6.5] at x = 2.5; the block sits
    // inside it, two units left of the crossing at (5, 5).
    let mut undefined = Vec::new();
    for x in [1.5, 2.0, 2.5] {
        for y in [4.5, 5.0, 5.5] {
            undefined.push(Point2::new(x, y));
        }
    }
    let mut tracer = StripTracer::new(boundary(), 1)
        .with_grid((0.5, 0.5), (21, 21))
        .with_undefined_points(&undefined);
    tracer
        .add_strip(0, &pts(&[(0.0, 2.0), (10.0, 8.0)]))
        .add_strip(0, &pts(&[(0.0, 8.0), (10.0, 2.0)]));
    let config = ContourConfig::with_level_values(boundary(), &[0.0])
        .with_tunables(Tunables::default().with_merge_floor(2));
    let mut engine = ContourEngine::new(config, Box::new(tracer)).expect("engine");

    let frame = engine.frame();
    assert_eq!(frame.diagnostics.intersection_count, 1);
    assert_eq!(frame.diagnostics.reorganized_strip_count, 2);
    assert_eq!(frame.diagnostics.cluster_count, 1);
    assert_eq!(frame.diagnostics.fallback_closure_count, 0);
    assert_eq!(frame.regions.len(), 4);
    assert!((frame.covered_area() - 100.0).abs() < 1e-6);

    let zone = frame
        .regions
        .iter()
        .find(|r| r.path.from_loop)
        .expect("cluster region");
    assert!(zone.path.levels.is_empty());
    assert!(frame.fill_of(zone).expect("fill entry").fill.is_empty());

    let wedge = frame
        .regions
        .iter()
        .find(|r| !r.path.holes.is_empty())
        .expect("wedge holding the zone");
    assert_eq!(wedge.path.holes.len(), 1);
    assert!(!frame.fill_of(wedge).expect("fill entry").fill.is_empty());
}
