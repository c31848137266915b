use crate::contour::border::Boundary;
use crate::contour::config::Tunables;
use crate::contour::intersect::{find_intersections, reorganize_level};
use crate::contour::strip::{Strip, StripKind, StripSource};
use crate::geom::{Point2, Tolerance, signed_area};

fn boundary() -> Boundary {
    Boundary::new(0.0, 0.0, 10.0, 10.0)
}

fn strip(list: usize, points: &[(f64, f64)]) -> Strip {
    let mut s = Strip::new(
        Some(0),
        StripSource::Traced { list },
        Vec::new(),
        points.iter().map(|&p| Point2::from(p)).collect(),
    );
    s.classify(&boundary(), Tolerance::PLOT, false, None);
    s
}

#[test]
fn intersections_are_ranked_by_angle() {
    let strips = vec![
        strip(0, &[(0.0, 5.0), (10.0, 5.0)]),
        strip(1, &[(3.0, 0.0), (5.0, 8.0), (7.0, 0.0)]),
    ];
    let found = find_intersections(&strips, boundary().center());
    assert_eq!(found.len(), 2);
    // Right-hand crossing first: angle 0 around the centre.
    assert!(found[0].point.x > 5.0);
    assert!(found[1].point.x < 5.0);
    assert_eq!(found[0].intersection_index, 0);
    assert_eq!(found[1].intersection_index, 1);
    for x in &found {
        assert!((x.point.y - 5.0).abs() < 1e-9);
        assert!((0.0..1.0).contains(&x.t_a));
        assert!((0.0..1.0).contains(&x.t_b));
    }
}

#[test]
fn touching_strips_do_not_cross() {
    let strips = vec![
        strip(0, &[(0.0, 2.0), (5.0, 5.0), (10.0, 2.0)]),
        strip(1, &[(0.0, 8.0), (5.0, 5.0), (10.0, 8.0)]),
    ];
    assert!(find_intersections(&strips, boundary().center()).is_empty());
}

#[test]
fn double_crossing_is_split_into_non_crossing_chords() {
    let strips = vec![
        strip(0, &[(0.0, 5.0), (10.0, 5.0)]),
        strip(1, &[(3.0, 0.0), (5.0, 8.0), (7.0, 0.0)]),
    ];
    let outcome = reorganize_level(0, strips, &boundary(), &Tunables::default());

    assert!(outcome.reorganized);
    assert_eq!(outcome.intersections.len(), 2);
    assert_eq!(outcome.unresolved, 0);
    assert_eq!(outcome.strips.len(), 2);
    assert!(outcome.strips.iter().all(|s| s.kind == StripKind::Boundary));
    assert!(outcome.strips.iter().all(|s| s.level == Some(0)));
    assert!(find_intersections(&outcome.strips, boundary().center()).is_empty());

    // The bottom endpoints pair with each other.
    let bottom = outcome
        .strips
        .iter()
        .find(|s| s.points[0].y.abs() < 1e-9)
        .expect("bottom chord");
    assert!(bottom.points[bottom.points.len() - 1].y.abs() < 1e-9);
}

#[test]
fn loop_crossing_a_chord_leaves_a_cycle() {
    let strips = vec![
        strip(0, &[(0.0, 5.0), (10.0, 5.0)]),
        strip(
            1,
            &[(3.0, 3.0), (7.0, 3.0), (7.0, 7.0), (3.0, 7.0), (3.0, 3.0)],
        ),
    ];
    assert_eq!(strips[1].kind, StripKind::Closed);

    let outcome = reorganize_level(0, strips, &boundary(), &Tunables::default());
    assert!(outcome.reorganized);
    assert_eq!(outcome.strips.len(), 2);

    let closed: Vec<&Strip> = outcome
        .strips
        .iter()
        .filter(|s| s.kind == StripKind::Closed)
        .collect();
    assert_eq!(closed.len(), 1);
    assert!((signed_area(&closed[0].points).abs() - 8.0).abs() < 1e-9);
    assert_eq!(
        outcome
            .strips
            .iter()
            .filter(|s| s.kind == StripKind::Boundary)
            .count(),
        1
    );
    assert!(find_intersections(&outcome.strips, boundary().center()).is_empty());
}

#[test]
fn tiny_cycles_are_dropped_as_slivers() {
    let strips = vec![
        strip(0, &[(0.0, 5.0), (10.0, 5.0)]),
        strip(
            1,
            &[(3.0, 3.0), (7.0, 3.0), (7.0, 7.0), (3.0, 7.0), (3.0, 3.0)],
        ),
    ];
    let tunables = Tunables::default().with_min_region_area_ratio(2.0);
    let outcome = reorganize_level(0, strips, &boundary(), &tunables);
    assert_eq!(outcome.slivers, 1);
    assert_eq!(outcome.strips.len(), 1);
    assert_eq!(outcome.strips[0].source, StripSource::Reorganized);
}
