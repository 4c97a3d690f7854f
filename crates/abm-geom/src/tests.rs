//! Unit tests for abm-geom.

#[cfg(test)]
mod sequence {
    use abm_core::{CoreError, Point3};

    use crate::{CoordinateSequence, Dimension};

    #[test]
    fn single_point_matches_general_path() {
        let p = Point3::new(3.5, -2.0, 7.0);
        let unique = CoordinateSequence::single(p, Dimension::Three);
        let general = CoordinateSequence::from_points(vec![p], Dimension::Three);

        assert!(unique.is_unique());
        assert_eq!(unique.size(), 1);
        assert_eq!(unique.size(), general.size());
        assert_eq!(unique.coordinate(0).unwrap(), general.coordinate(0).unwrap());
        assert_eq!(unique.envelope(), general.envelope());
    }

    #[test]
    fn with_size_one_takes_single_path() {
        let seq = CoordinateSequence::with_size(1, Dimension::Two);
        assert!(seq.is_unique());
        assert_eq!(*seq.coordinate(0).unwrap(), Point3::ORIGIN);
    }

    #[test]
    fn coordinate_mut_is_live() {
        let mut seq = CoordinateSequence::single(Point3::ORIGIN, Dimension::Three);
        seq.coordinate_mut(0).unwrap().x = 9.0;
        assert_eq!(seq.coordinate(0).unwrap().x, 9.0);

        let mut many = CoordinateSequence::from_points(vec![Point3::ORIGIN; 3], Dimension::Three);
        many.coordinate_mut(2).unwrap().y = -1.0;
        assert_eq!(many.as_slice()[2].y, -1.0);
    }

    #[test]
    fn out_of_bounds_is_index_error() {
        let seq = CoordinateSequence::single(Point3::ORIGIN, Dimension::Three);
        assert_eq!(seq.coordinate(1).unwrap_err(), CoreError::Index { index: 1, len: 1 });
        let mut seq = CoordinateSequence::with_size(3, Dimension::Three);
        assert!(matches!(seq.coordinate_mut(3), Err(CoreError::Index { index: 3, len: 3 })));
    }

    #[test]
    fn copies_never_share_storage() {
        let original = CoordinateSequence::from_points(
            vec![Point3::new_2d(0.0, 0.0), Point3::new_2d(1.0, 1.0)],
            Dimension::Two,
        );
        let mut copy = CoordinateSequence::copy_of(&original);
        copy.translate(5.0, 5.0, 0.0);
        assert_eq!(original.as_slice()[1], Point3::new_2d(1.0, 1.0));
        assert_eq!(copy.as_slice()[1], Point3::new_2d(6.0, 6.0));
    }

    #[test]
    fn mixed_dimensions_report_every_row() {
        let rows: Vec<Vec<f64>> = vec![vec![0.0, 0.0], vec![1.0, 1.0, 1.0], vec![2.0], vec![3.0, 3.0]];
        let err = CoordinateSequence::from_ordinates(&rows).unwrap_err();
        let CoreError::Validation(v) = err else { panic!("expected validation error, got {err:?}") };
        assert_eq!(v.violations.len(), 2);
        assert_eq!(v.violations[0].subject, "row 1");
        assert_eq!(v.violations[1].subject, "row 2");
    }

    #[test]
    fn from_ordinates_picks_dimension() {
        let seq = CoordinateSequence::from_ordinates(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(seq.dimension(), Dimension::Two);
        let seq = CoordinateSequence::from_ordinates(&[[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(seq.dimension(), Dimension::Three);
        assert!(seq.is_unique());
    }

    #[test]
    fn two_d_sequences_keep_z_flat() {
        let mut seq = CoordinateSequence::from_points(vec![Point3::new(1.0, 1.0, 4.0)], Dimension::Two);
        assert_eq!(seq.as_slice()[0].z, 0.0);
        seq.translate(0.0, 0.0, 3.0);
        assert_eq!(seq.as_slice()[0].z, 0.0);
        seq.replace_z(2.0);
        assert_eq!(seq.dimension(), Dimension::Three);
        assert_eq!(seq.as_slice()[0].z, 2.0);
    }

    #[test]
    fn push_grows_out_of_single_storage() {
        let mut seq = CoordinateSequence::single(Point3::new_2d(0.0, 0.0), Dimension::Two);
        seq.push(Point3::new_2d(1.0, 0.0));
        assert!(!seq.is_unique());
        assert_eq!(seq.size(), 2);
    }

    #[test]
    fn ring_winding() {
        let mut ring = CoordinateSequence::from_points(
            vec![
                Point3::new_2d(0.0, 0.0),
                Point3::new_2d(1.0, 0.0),
                Point3::new_2d(1.0, 1.0),
                Point3::new_2d(0.0, 1.0),
            ],
            Dimension::Two,
        );
        assert!(!ring.is_ring());
        ring.close_ring();
        assert!(ring.is_ring());
        assert_eq!(ring.signed_area(), 1.0);
        assert!(!ring.is_clockwise());
        ring.ensure_clockwise();
        assert!(ring.is_clockwise());
        assert_eq!(ring.signed_area(), -1.0);
    }
}

#[cfg(test)]
mod geometry {
    use abm_core::{CoreError, Point3};

    use crate::{Geometry, GeometryKind};

    fn square(side: f64) -> Vec<Point3> {
        vec![
            Point3::new_2d(0.0, 0.0),
            Point3::new_2d(side, 0.0),
            Point3::new_2d(side, side),
            Point3::new_2d(0.0, side),
        ]
    }

    #[test]
    fn polygon_closes_and_normalises_shell() {
        let g = Geometry::polygon(square(2.0), Vec::new()).unwrap();
        assert_eq!(g.kind(), GeometryKind::Polygon);
        assert!(g.shell().is_ring());
        assert!(g.shell().is_clockwise());
        assert_eq!(g.area(), 4.0);
        assert_eq!(g.length(), 8.0);
        assert!(g.centroid().approx_eq(Point3::new_2d(1.0, 1.0), 1e-12));
    }

    #[test]
    fn polygon_with_hole() {
        let hole = vec![
            Point3::new_2d(1.0, 1.0),
            Point3::new_2d(2.0, 1.0),
            Point3::new_2d(2.0, 2.0),
            Point3::new_2d(1.0, 2.0),
        ];
        let g = Geometry::polygon(square(4.0), vec![hole]).unwrap();
        assert_eq!(g.area(), 15.0);
        assert_eq!(g.num_points(), 10);
    }

    #[test]
    fn polygon_reports_every_short_ring() {
        let short = vec![Point3::new_2d(0.0, 0.0), Point3::new_2d(1.0, 0.0)];
        let err = Geometry::polygon(short.clone(), vec![square(1.0), short]).unwrap_err();
        let CoreError::Validation(v) = err else { panic!("expected validation error, got {err:?}") };
        assert_eq!(v.violations.len(), 2);
        assert_eq!(v.violations[0].subject, "shell");
        assert_eq!(v.violations[1].subject, "hole 1");
    }

    #[test]
    fn line_string_needs_two_points() {
        assert!(matches!(
            Geometry::line_string(vec![Point3::ORIGIN]),
            Err(CoreError::Argument(_))
        ));
        let g = Geometry::line_string(vec![Point3::ORIGIN, Point3::new_2d(4.0, 0.0)]).unwrap();
        assert_eq!(g.length(), 4.0);
        assert_eq!(g.centroid(), Point3::new_2d(2.0, 0.0));
    }

    #[test]
    fn mutation_invalidates_cache() {
        let mut g = Geometry::polygon(square(2.0), Vec::new()).unwrap();
        assert_eq!(g.envelope().max_x, 2.0);
        g.translate(10.0, 0.0, 0.0);
        assert_eq!(g.envelope().max_x, 12.0);
        assert!(g.centroid().approx_eq(Point3::new_2d(11.0, 1.0), 1e-12));

        let mut p = Geometry::point(Point3::ORIGIN);
        assert_eq!(p.centroid(), Point3::ORIGIN);
        p.set_coordinate(0, Point3::new_2d(3.0, 3.0)).unwrap();
        assert_eq!(p.centroid(), Point3::new_2d(3.0, 3.0));
        assert!(p.set_coordinate(1, Point3::ORIGIN).is_err());
    }

    #[test]
    fn failed_try_apply_leaves_geometry_untouched() {
        let mut g = Geometry::line_string(vec![Point3::ORIGIN, Point3::new_2d(1.0, 1.0)]).unwrap();
        let before = g.clone();
        let mut seen = 0;
        let res: Result<(), &str> = g.try_apply(|p| {
            seen += 1;
            if seen == 2 {
                return Err("boom");
            }
            p.x += 100.0;
            Ok(())
        });
        assert!(res.is_err());
        assert_eq!(g, before);
    }
}

#[cfg(test)]
mod crs {
    use abm_core::{CoreError, Point3};

    use crate::{Affine2, Crs, GeomError, MathTransform, WebMercator, find_math_transform};

    #[test]
    fn registry_codes() {
        assert!(Crs::from_code("epsg:4326").unwrap().is_geographic());
        assert_eq!(Crs::from_code("EPSG:900913").unwrap().unit(), "metre");
        assert!(matches!(
            Crs::from_code("EPSG:1"),
            Err(GeomError::Core(CoreError::Argument(_)))
        ));
    }

    #[test]
    fn singular_affine_rejected() {
        assert!(matches!(
            Affine2::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0),
            Err(GeomError::Core(CoreError::Argument(_)))
        ));
    }

    #[test]
    fn affine_inverse() {
        let a = Affine2::new(2.0, 1.0, 5.0, -1.0, 3.0, -2.0).unwrap();
        let mut p = Point3::new(1.5, -4.0, 9.0);
        a.forward(&mut p).unwrap();
        a.inverse(&mut p).unwrap();
        assert!(p.approx_eq(Point3::new(1.5, -4.0, 9.0), 1e-12));
    }

    #[test]
    fn web_mercator_known_values() {
        let mut p = Point3::new_2d(180.0, 0.0);
        WebMercator.forward(&mut p).unwrap();
        assert!((p.x - 20_037_508.342_789_244).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);

        let mut pole = Point3::new_2d(0.0, 90.0);
        assert!(matches!(WebMercator.forward(&mut pole), Err(GeomError::Domain { .. })));
    }

    #[test]
    fn find_transform_between_projected_systems() {
        let merc = Crs::from_code("EPSG:3857").unwrap();
        let local = Crs::custom("LOCAL:1", Affine2::scale_translate(1000.0, 1000.0, 0.0, 0.0).unwrap());
        assert!(find_math_transform(&merc, &merc).is_identity());

        let t = find_math_transform(&merc, &local);
        let mut p = Point3::new_2d(0.0, 0.0);
        t.forward(&mut p).unwrap();
        assert!(p.approx_eq(Point3::ORIGIN, 1e-9));

        let mut q = Point3::new_2d(111_319.490_793_273_57, 0.0);
        t.forward(&mut q).unwrap();
        assert!((q.x - 1000.0).abs() < 1e-6, "{q}");
    }
}

#[cfg(test)]
mod projection {
    use abm_core::{CoreError, Envelope3, Point3, RandomGenerator, RngAlgorithm};

    use crate::{
        Crs, CrsProjection, GeomError, Geometry, Projection, ProjectionConfig, ProjectionFactory,
        ScalingProjection, WebMercator,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn random_geometry(rng: &mut RandomGenerator) -> Geometry {
        let kind = rng.next_int(3).unwrap();
        let mut pt = || {
            Point3::new(
                rng.next_float_range(-10.0, 10.0).unwrap(),
                rng.next_float_range(40.0, 50.0).unwrap(),
                rng.next_float_range(0.0, 100.0).unwrap(),
            )
        };
        match kind {
            0 => Geometry::point(pt()),
            1 => Geometry::line_string((0..5).map(|_| pt()).collect()).unwrap(),
            _ => {
                let c = pt();
                let ring = vec![
                    c,
                    Point3::new(c.x + 0.5, c.y, c.z),
                    Point3::new(c.x + 0.5, c.y + 0.5, c.z),
                    Point3::new(c.x, c.y + 0.5, c.z),
                ];
                Geometry::polygon(ring, Vec::new()).unwrap()
            }
        }
    }

    #[test]
    fn crs_round_trip_over_random_geometries() {
        let config = ProjectionConfig::Crs {
            source: "EPSG:4326".into(),
            target: "EPSG:3857".into(),
            world_bounds: Some([-10.0, 40.0, 10.0, 50.5]),
            unit_factor: 0.001,
        };
        let projection = ProjectionFactory::from_config(&config).unwrap();
        let mut rng = RandomGenerator::new(RngAlgorithm::ChaCha, 2024);

        for _ in 0..100 {
            let original = random_geometry(&mut rng);
            let mut g = original.clone();
            projection.transform(&mut g).unwrap();
            assert_ne!(g, original);
            projection.inverse_transform(&mut g).unwrap();
            for (a, b) in original.coordinates().zip(g.coordinates()) {
                assert!(close(a.x, b.x) && close(a.y, b.y) && close(a.z, b.z), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn world_translation_flips_y() {
        let mut p = CrsProjection::initialized(Crs::wgs84(), Crs::from_code("EPSG:3857").unwrap());
        let world = Envelope3::from_corners(Point3::new_2d(0.0, 0.0), Point3::new_2d(1.0, 1.0));
        let projected = p.fit_to(&world).unwrap();

        // The world's north-west corner lands on the model origin.
        let mut nw = Point3::new_2d(0.0, 1.0);
        p.transform_point(&mut nw).unwrap();
        assert!(nw.approx_eq(Point3::ORIGIN, 1e-6));

        let mut se = Point3::new_2d(1.0, 0.0);
        p.transform_point(&mut se).unwrap();
        assert!(close(se.x, projected.width()));
        assert!(close(se.y, projected.height()));
    }

    #[test]
    fn translate_and_unit_are_exact_inverses() {
        let mut p = CrsProjection::initialized(Crs::wgs84(), Crs::from_code("EPSG:3857").unwrap())
            .with_unit_factor(0.5)
            .unwrap();
        p.fit_to(&Envelope3::from_corners(Point3::new_2d(2.0, 2.0), Point3::new_2d(3.0, 3.0))).unwrap();
        let original = Geometry::line_string(vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-4.0, 5.0, 6.0)]).unwrap();

        let mut g = original.clone();
        p.translate(&mut g);
        p.inverse_translate(&mut g);
        p.convert_unit(&mut g);
        p.inverse_convert_unit(&mut g);
        for (a, b) in original.coordinates().zip(g.coordinates()) {
            assert!(a.approx_eq(*b, 1e-9));
        }
    }

    #[test]
    fn transform_before_ready_fails() {
        let p = CrsProjection::new(Crs::wgs84(), Crs::from_code("EPSG:3857").unwrap());
        assert!(!p.is_ready());
        let mut g = Geometry::point(Point3::new_2d(1.0, 1.0));
        assert!(matches!(p.transform(&mut g), Err(GeomError::Core(CoreError::NotReady(_)))));
        assert!(matches!(p.inverse_transform(&mut g), Err(GeomError::Core(CoreError::NotReady(_)))));
    }

    #[test]
    fn create_transformation_makes_ready() {
        let mut p = CrsProjection::new(Crs::wgs84(), Crs::from_code("EPSG:3857").unwrap());
        p.create_transformation(std::sync::Arc::new(WebMercator));
        let mut g = Geometry::point(Point3::new_2d(180.0, 0.0));
        p.transform(&mut g).unwrap();
        assert!((g.shell().as_slice()[0].x - 20_037_508.342_789_244).abs() < 1e-6);
    }

    #[test]
    fn transform_marks_geometry_changed() {
        let p = ScalingProjection::new(2.0).unwrap();
        let mut g = Geometry::line_string(vec![Point3::ORIGIN, Point3::new_2d(1.0, 1.0)]).unwrap();
        assert_eq!(g.envelope().max_x, 1.0);
        p.transform(&mut g).unwrap();
        assert_eq!(g.envelope().max_x, 2.0);
    }

    #[test]
    fn scaling_projection() {
        let p = ScalingProjection::new(4.0).unwrap();
        let mut g = Geometry::point(Point3::new(1.0, 2.0, 3.0));
        p.transform(&mut g).unwrap();
        assert_eq!(g.centroid(), Point3::new(4.0, 8.0, 12.0));
        p.translate(&mut g);
        p.convert_unit(&mut g);
        assert_eq!(g.centroid(), Point3::new(4.0, 8.0, 12.0));
        p.inverse_transform(&mut g).unwrap();
        assert_eq!(g.centroid(), Point3::new(1.0, 2.0, 3.0));
        assert!(p.source_crs().is_none());
        assert!(p.target_crs().is_none());
    }

    #[test]
    fn zero_scale_and_factor_rejected() {
        assert!(matches!(ScalingProjection::new(0.0), Err(GeomError::Core(CoreError::Argument(_)))));
        assert!(matches!(
            ProjectionFactory::from_config(&ProjectionConfig::Scaling { scale: 0.0 }),
            Err(GeomError::Core(CoreError::Argument(_)))
        ));
        let p = CrsProjection::new(Crs::wgs84(), Crs::wgs84());
        assert!(p.with_unit_factor(0.0).is_err());
    }

    #[test]
    fn failed_transform_leaves_geometry_untouched() {
        let p = CrsProjection::initialized(Crs::wgs84(), Crs::from_code("EPSG:3857").unwrap());
        let original = Geometry::line_string(vec![Point3::new_2d(0.0, 10.0), Point3::new_2d(0.0, 90.0)]).unwrap();
        let mut g = original.clone();
        assert!(matches!(p.transform(&mut g), Err(GeomError::Domain { .. })));
        assert_eq!(g, original);
    }
}
