use crate::geom::{
    Point2, Tolerance, centroid, collapse_collinear, contains_point, distance_to_ring,
    interior_point, is_closed, open_ring, region_contains_point, segment_intersection,
    signed_area,
};

fn square(min: f64, max: f64) -> Vec<Point2> {
    vec![
        Point2::new(min, min),
        Point2::new(max, min),
        Point2::new(max, max),
        Point2::new(min, max),
    ]
}

#[test]
fn signed_area_is_positive_for_counter_clockwise() {
    let ring = square(0.0, 2.0);
    assert!((signed_area(&ring) - 4.0).abs() < 1e-12);

    let mut reversed = ring.clone();
    reversed.reverse();
    assert!((signed_area(&reversed) + 4.0).abs() < 1e-12);
}

#[test]
fn closing_vertex_is_ignored() {
    let mut ring = square(0.0, 1.0);
    ring.push(ring[0]);
    assert_eq!(open_ring(&ring).len(), 4);
    assert!((signed_area(&ring) - 1.0).abs() < 1e-12);
    assert!(is_closed(&ring, Tolerance::PLOT));
}

#[test]
fn centroid_of_square_is_center() {
    let c = centroid(&square(0.0, 4.0)).expect("centroid");
    assert!((c.x - 2.0).abs() < 1e-12);
    assert!((c.y - 2.0).abs() < 1e-12);
}

#[test]
fn containment_respects_holes() {
    let outer = square(0.0, 10.0);
    let hole = square(4.0, 6.0);
    let holes = vec![hole];

    assert!(contains_point(&outer, Point2::new(5.0, 5.0)));
    assert!(!region_contains_point(&outer, &holes, Point2::new(5.0, 5.0)));
    assert!(region_contains_point(&outer, &holes, Point2::new(2.0, 2.0)));
    assert!(!region_contains_point(&outer, &holes, Point2::new(12.0, 2.0)));
}

#[test]
fn interior_point_avoids_hole() {
    let outer = square(0.0, 10.0);
    let holes = vec![square(3.0, 7.0)];
    let p = interior_point(&outer, &holes).expect("interior point");
    assert!(region_contains_point(&outer, &holes, p));
}

#[test]
fn interior_point_of_concave_ring_is_inside() {
    // U shape: centroid falls in the notch.
    let ring = vec![
        Point2::new(0.0, 0.0),
        Point2::new(10.0, 0.0),
        Point2::new(10.0, 10.0),
        Point2::new(8.0, 10.0),
        Point2::new(8.0, 2.0),
        Point2::new(2.0, 2.0),
        Point2::new(2.0, 10.0),
        Point2::new(0.0, 10.0),
    ];
    let p = interior_point(&ring, &[]).expect("interior point");
    assert!(contains_point(&ring, p));
}

#[test]
fn distance_to_ring_measures_nearest_edge() {
    let d = distance_to_ring(&square(0.0, 10.0), Point2::new(5.0, 1.0));
    assert!((d - 1.0).abs() < 1e-12);
}

#[test]
fn segment_intersection_reports_parameters() {
    let (p, t, u) = segment_intersection(
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 2.0),
        Point2::new(0.0, 2.0),
        Point2::new(2.0, 0.0),
    )
    .expect("crossing");
    assert!((p.x - 1.0).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
    assert!((t - 0.5).abs() < 1e-12 && (u - 0.5).abs() < 1e-12);

    assert!(
        segment_intersection(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
        )
        .is_none()
    );
}

#[test]
fn collapse_collinear_drops_straight_through_vertices() {
    let points = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(2.0, 1.0),
    ];
    let out = collapse_collinear(&points, 1e-3);
    assert_eq!(
        out,
        vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(2.0, 1.0)]
    );
}

#[test]
fn collapse_collinear_keeps_reversal() {
    let points = vec![Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(1.0, 0.0)];
    assert_eq!(collapse_collinear(&points, 1e-3).len(), 3);
}
