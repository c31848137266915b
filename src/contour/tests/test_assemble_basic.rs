use crate::contour::assemble::assemble_regions;
use crate::contour::border::Boundary;
use crate::contour::config::Tunables;
use crate::contour::strip::{Strip, StripKind, StripSource};
use crate::geom::{Point2, Tolerance, contains_point, signed_area};

fn boundary() -> Boundary {
    Boundary::new(0.0, 0.0, 10.0, 10.0)
}

fn strip(level: usize, points: &[(f64, f64)]) -> Strip {
    hinted(level, points, None)
}

fn hinted(level: usize, points: &[(f64, f64)], hint: Option<[bool; 2]>) -> Strip {
    let mut s = Strip::new(
        Some(level),
        StripSource::Traced { list: 0 },
        Vec::new(),
        points.iter().map(|&p| Point2::from(p)).collect(),
    );
    s.classify(&boundary(), Tolerance::PLOT, false, hint);
    s
}

fn square(level: usize, lo: f64, hi: f64) -> Strip {
    strip(level, &[(lo, lo), (hi, lo), (hi, hi), (lo, hi), (lo, lo)])
}

#[test]
fn two_corner_cuts_close_three_regions() {
    let strips = vec![
        strip(0, &[(5.0, 0.0), (10.0, 5.0)]),
        strip(1, &[(0.0, 5.0), (5.0, 10.0)]),
    ];
    let assembly = assemble_regions(&boundary(), &strips, &Tunables::default());

    assert_eq!(assembly.paths.len(), 3);
    assert_eq!(assembly.diagnostics.region_count, 3);
    assert_eq!(assembly.diagnostics.fallback_closure_count, 0);
    for path in &assembly.paths {
        assert!(path.is_closed(Tolerance::DEFAULT));
        assert!(signed_area(&path.points) > 0.0, "outer rings run anti-clockwise");
        assert!(!path.from_loop);
    }
    let total: f64 = assembly.paths.iter().map(|p| p.area()).sum();
    assert!((total - 100.0).abs() < 1e-9);

    let middle = assembly
        .paths
        .iter()
        .find(|p| (p.area() - 75.0).abs() < 1e-9)
        .expect("middle band");
    assert_eq!(middle.levels, vec![0, 1]);
}

#[test]
fn assembly_is_repeatable() {
    let strips = vec![
        strip(0, &[(5.0, 0.0), (10.0, 5.0)]),
        strip(1, &[(0.0, 5.0), (5.0, 10.0)]),
        square(0, 2.0, 4.0),
    ];
    let first = assemble_regions(&boundary(), &strips, &Tunables::default());
    let second = assemble_regions(&boundary(), &strips, &Tunables::default());
    assert_eq!(first.paths, second.paths);
}

#[test]
fn duplicate_loops_yield_one_region() {
    let strips = vec![square(0, 3.0, 6.0), square(0, 3.0, 6.0)];
    let assembly = assemble_regions(&boundary(), &strips, &Tunables::default());
    assert_eq!(assembly.paths.iter().filter(|p| p.from_loop).count(), 1);
    assert_eq!(assembly.paths.len(), 2);

    let plot = assembly.paths.iter().find(|p| !p.from_loop).expect("plot");
    assert_eq!(plot.holes.len(), 1);
    assert!((plot.area() - 91.0).abs() < 1e-9);
}

#[test]
fn duplicate_boundary_strips_discard_the_sliver_walk() {
    let strips = vec![
        strip(0, &[(5.0, 0.0), (10.0, 5.0)]),
        strip(0, &[(5.0, 0.0), (10.0, 5.0)]),
    ];
    let assembly = assemble_regions(&boundary(), &strips, &Tunables::default());
    assert_eq!(assembly.paths.len(), 2);
    assert_eq!(assembly.diagnostics.discarded_walk_count, 1);
    let total: f64 = assembly.paths.iter().map(|p| p.area()).sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[test]
fn nested_loops_become_holes() {
    let strips = vec![square(0, 2.0, 8.0), square(1, 4.0, 6.0)];
    let assembly = assemble_regions(&boundary(), &strips, &Tunables::default());
    assert_eq!(assembly.paths.len(), 3);

    let ring = assembly
        .paths
        .iter()
        .find(|p| p.from_loop && p.holes.len() == 1)
        .expect("outer loop with hole");
    assert_eq!(ring.levels, vec![0, 1]);
    assert!((ring.area() - 32.0).abs() < 1e-9);
    assert!(signed_area(&ring.holes[0]) < 0.0, "holes run clockwise");

    let inside = ring.interior_point().expect("interior point");
    assert!(contains_point(&ring.points, inside));
    assert!(!contains_point(&ring.holes[0], inside));

    let plot = assembly.paths.iter().find(|p| !p.from_loop).expect("plot");
    assert_eq!(plot.holes.len(), 1);
    assert_eq!(plot.levels, vec![0]);
}

#[test]
fn lost_far_end_closes_with_fallback() {
    let strips = vec![hinted(0, &[(5.0, 0.0), (5.0, 5.0)], Some([false, true]))];
    assert_eq!(strips[0].kind, StripKind::Boundary);

    let assembly = assemble_regions(&boundary(), &strips, &Tunables::default());
    assert!(assembly.diagnostics.fallback_closure_count >= 1);
    assert!(assembly.diagnostics.has_warnings());
    assert!(!assembly.paths.is_empty());
    assert!(assembly.paths.iter().any(|p| p.fallback));
    for path in &assembly.paths {
        assert!(path.is_closed(Tolerance::DEFAULT));
        assert!(path.vertex_count() >= 3);
    }
}
