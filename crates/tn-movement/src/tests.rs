//! Unit tests for tn-movement.

#[cfg(test)]
mod helpers {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use geo::Coord;
    use tn_core::{GeoPoint, Location};
    use tn_field::PlayingField;
    use tn_spatial::{LocalProjection, StreetNetwork, StreetNetworkBuilder};

    pub fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    pub fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    pub fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn builder() -> StreetNetworkBuilder {
        StreetNetworkBuilder::new(LocalProjection::new(GeoPoint::new(50.88, 4.70)))
    }

    /// Straight path A (0,0) ── B (10,0) ── C (25,0).
    pub fn abc() -> StreetNetwork {
        let mut b = builder();
        let a  = b.add_node(c(0.0, 0.0));
        let bb = b.add_node(c(10.0, 0.0));
        let cc = b.add_node(c(25.0, 0.0));
        b.add_straight_street(a, bb);
        b.add_straight_street(bb, cc);
        b.build()
    }

    /// A street P–Q, a link Q–X, and two ways out of X: X–Y bridges over
    /// P–Q without a junction, X–Z does not.
    ///
    /// ```text
    ///                     Z (20,40)
    ///   Q (0,20)          |
    ///   |     \           |
    /// Y ┼──────────────── X (20,0)
    ///   |
    ///   P (0,-20)
    /// ```
    ///
    /// Y sits at (-20, 0).  X's out-edges in adjacency order: X→Q, X→Y, X→Z.
    pub fn bridge() -> StreetNetwork {
        let mut b = builder();
        let p = b.add_node(c(0.0, -20.0));
        let q = b.add_node(c(0.0, 20.0));
        let x = b.add_node(c(20.0, 0.0));
        let y = b.add_node(c(-20.0, 0.0));
        let z = b.add_node(c(20.0, 40.0));
        b.add_straight_street(p, q);
        b.add_straight_street(q, x);
        b.add_straight_street(x, y);
        b.add_straight_street(x, z);
        b.build()
    }

    /// 3 × 3 grid of two-way streets, 30 m apart.
    pub fn grid() -> StreetNetwork {
        let mut b = builder();
        let mut ids = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                ids.push(b.add_node(c(col as f64 * 30.0, row as f64 * 30.0)));
            }
        }
        for row in 0..3 {
            for col in 0..3 {
                let i = row * 3 + col;
                if col < 2 {
                    b.add_straight_street(ids[i], ids[i + 1]);
                }
                if row < 2 {
                    b.add_straight_street(ids[i], ids[i + 3]);
                }
            }
        }
        b.build()
    }

    pub fn loc(net: &StreetNetwork, x: f64, y: f64, secs: i64) -> Location {
        Location::from_point(net.to_geo(c(x, y)), at(secs))
    }

    pub fn planar<R: tn_spatial::Router>(field: &PlayingField<R>, l: Location) -> Coord<f64> {
        field.network().to_planar(l.point)
    }

    pub fn dist(a: Coord<f64>, b: Coord<f64>) -> f64 {
        (a.x - b.x).hypot(a.y - b.y)
    }

    pub fn near(a: Coord<f64>, b: Coord<f64>) -> bool {
        dist(a, b) < 1e-6
    }
}

// ── Strategy enum & config ────────────────────────────────────────────────────

#[cfg(test)]
mod strategy {
    use tn_core::TnError;

    use crate::{LoopClosingStrategy, LoopConfig, StationaryStrategy, Strategy};

    #[test]
    fn default_is_stationary() {
        assert!(matches!(Strategy::default(), Strategy::Stationary(_)));
        assert_eq!(Strategy::default().name(), "stationary");
    }

    #[test]
    fn conversions() {
        let s: Strategy = StationaryStrategy.into();
        assert!(matches!(s, Strategy::Stationary(_)));
        let s: Strategy = LoopClosingStrategy::default().into();
        assert_eq!(s.name(), "loop-closing");
    }

    #[test]
    fn loop_config_defaults_validate() {
        let config = LoopConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_loop_length_m, 500.0);
    }

    #[test]
    fn invalid_loop_config_rejected() {
        let negative = LoopConfig { min_loop_length_m: -1.0, ..LoopConfig::default() };
        assert!(matches!(negative.validate(), Err(TnError::Config(_))));

        let nan = LoopConfig { intersection_tolerance_m: f64::NAN, ..LoopConfig::default() };
        assert!(Strategy::loop_closing(nan).is_err());
        assert!(LoopClosingStrategy::new(negative).is_err());
    }
}

// ── Stationary ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stationary {
    use tn_field::PlayingField;

    use super::helpers::{abc, at, loc};
    use crate::{MovementStrategy, Player, StationaryStrategy};

    #[test]
    fn returns_last_location_unchanged() {
        let mut field = PlayingField::new(abc());
        let start = field.add_player("p1", loc(field.network(), 5.0, 0.0, 0)).unwrap();
        let next = StationaryStrategy.next_move(&start, &field, 10.0, &"p1".into(), at(60));
        assert_eq!(next, Some(start));
        assert_eq!(next.map(|l| l.timestamp), Some(start.timestamp));
    }

    #[test]
    fn player_stays_put() {
        let mut field = PlayingField::new(abc());
        let start = loc(field.network(), 5.0, 0.0, 0);
        let mut player = Player::join(&mut field, "p1", "Stan", start).unwrap();
        let before = player.current_location(&field).unwrap();

        assert!(player.move_on(&mut field, at(30)));
        assert_eq!(player.current_location(&field), Some(before));
        let traj = player.trajectory(&field).unwrap();
        assert_eq!(traj.coords(), &[before.point]);
    }
}

// ── Loop closing ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod loop_closing {
    use tn_core::{GeoPoint, PlayerId};
    use tn_field::PlayingField;
    use tn_spatial::{snap, LocalProjection, StreetNetworkBuilder};

    use super::helpers::{abc, at, bridge, c, dist, grid, loc, near, planar};
    use crate::{LoopClosingStrategy, LoopConfig, LoopPhase, MovementStrategy, Player};

    fn p1() -> PlayerId {
        PlayerId::from("p1")
    }

    #[test]
    fn twenty_metres_reach_ten_metres_into_the_second_edge() {
        let mut field = PlayingField::new(abc());
        let start = field.add_player("p1", loc(field.network(), 0.0, 0.0, 0)).unwrap();

        let mut strategy = LoopClosingStrategy::default();
        let next = strategy.next_move(&start, &field, 5.0, &p1(), at(4)).unwrap();

        assert!(near(planar(&field, next), c(20.0, 0.0)));
        assert_eq!(next.timestamp, at(4));
        assert_eq!(strategy.phase(), LoopPhase::Exploring);
        assert_eq!(strategy.visited_count(), 2);
        assert!((strategy.loop_length_m() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn budget_smaller_than_gap_stops_mid_edge() {
        let mut field = PlayingField::new(abc());
        field.add_player("p1", loc(field.network(), 0.0, 0.0, 0)).unwrap();
        // Last seen 3 m along A–B, heading nowhere yet: nearer end is A.
        let last = loc(field.network(), 3.0, 0.0, 0);

        let mut strategy = LoopClosingStrategy::default();
        let next = strategy.next_move(&last, &field, 1.0, &p1(), at(2)).unwrap();
        assert!(near(planar(&field, next), c(1.0, 0.0)));
        assert_eq!(strategy.visited_count(), 0);
    }

    #[test]
    fn zero_or_negative_elapsed_time_means_no_movement() {
        let mut field = PlayingField::new(abc());
        let start = field.add_player("p1", loc(field.network(), 0.0, 0.0, 10)).unwrap();

        let mut strategy = LoopClosingStrategy::default();
        let same = strategy.next_move(&start, &field, 5.0, &p1(), at(10)).unwrap();
        assert!(near(planar(&field, same), c(0.0, 0.0)));

        let mut strategy = LoopClosingStrategy::default();
        let earlier = strategy.next_move(&start, &field, 5.0, &p1(), at(0)).unwrap();
        assert!(near(planar(&field, earlier), c(0.0, 0.0)));
    }

    #[test]
    fn dead_end_leaves_no_way_home() {
        let mut field = PlayingField::new(abc());
        let start = field.add_player("p1", loc(field.network(), 0.0, 0.0, 0)).unwrap();
        let mut strategy = LoopClosingStrategy::default();

        let first = strategy.next_move(&start, &field, 5.0, &p1(), at(4)).unwrap();
        assert!(field.update_current_location(&p1(), first).unwrap().is_moved());

        // C is a dead end and the only street back retraces the trail, so
        // the walk stops at C.
        let last = field.last_known_location(&p1()).unwrap();
        let second = strategy.next_move(&last, &field, 5.0, &p1(), at(8)).unwrap();
        assert!(near(planar(&field, second), c(25.0, 0.0)));
        assert_eq!(strategy.phase(), LoopPhase::Returning);
        assert!(field.update_current_location(&p1(), second).unwrap().is_moved());

        let last = field.last_known_location(&p1()).unwrap();
        let third = strategy.next_move(&last, &field, 5.0, &p1(), at(12)).unwrap();
        assert!(near(planar(&field, third), c(25.0, 0.0)));
        assert_eq!(third.timestamp, at(12));
        assert_eq!(strategy.phase(), LoopPhase::Returning);
    }

    #[test]
    fn one_way_street_blocks_the_return() {
        // A ── B two-way, then B → C one way: C has no street out.
        let mut b = StreetNetworkBuilder::new(LocalProjection::new(GeoPoint::new(50.88, 4.70)));
        let a  = b.add_node(c(0.0, 0.0));
        let bb = b.add_node(c(10.0, 0.0));
        let cc = b.add_node(c(10.0, 10.0));
        b.add_straight_street(a, bb);
        b.add_directed_edge(bb, cc, 10.0, None);
        let mut field = PlayingField::new(b.build());
        let start = field.add_player("p1", loc(field.network(), 0.0, 0.0, 0)).unwrap();

        let config = LoopConfig { min_loop_length_m: 15.0, ..LoopConfig::default() };
        let mut strategy = LoopClosingStrategy::new(config).unwrap();
        let next = strategy.next_move(&start, &field, 1.0, &p1(), at(30)).unwrap();

        // Exploring ends at C after 20 m; the return finds no route and the
        // exploration result stands.
        assert!(near(planar(&field, next), c(10.0, 10.0)));
        assert_eq!(strategy.phase(), LoopPhase::Returning);
        assert!((strategy.loop_length_m() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn return_goes_around_the_block() {
        // A (0,0) ── B (10,0) ── C (10,30) ── D (0,30) ── A
        let mut b = StreetNetworkBuilder::new(LocalProjection::new(GeoPoint::new(50.88, 4.70)));
        let a  = b.add_node(c(0.0, 0.0));
        let bb = b.add_node(c(10.0, 0.0));
        let cc = b.add_node(c(10.0, 30.0));
        let d  = b.add_node(c(0.0, 30.0));
        b.add_straight_street(a, bb);
        b.add_straight_street(bb, cc);
        b.add_straight_street(cc, d);
        b.add_straight_street(d, a);
        let mut field = PlayingField::new(b.build());

        let start = loc(field.network(), 0.0, 0.0, 0);
        let config = LoopConfig { min_loop_length_m: 5.0, ..LoopConfig::default() };
        let mut player = Player::join(&mut field, "p1", "Rex", start)
            .unwrap()
            .with_strategy(LoopClosingStrategy::new(config).unwrap())
            .with_max_speed(1.0);

        let mut closed_at = None;
        for secs in 1..=120 {
            if !player.move_on(&mut field, at(secs)) {
                closed_at = Some(secs);
                break;
            }
            if secs > 10 {
                // Never back onto A ── B once B is reached.
                let here = planar(&field, player.current_location(&field).unwrap());
                assert!(here.y > 1e-6 || here.x < 1e-6, "t={secs}: back on A-B at {here:?}");
            }
        }

        // Out along A ── B (10 m), home via C and D (70 m).
        assert_eq!(closed_at, Some(81));
        let here = planar(&field, player.current_location(&field).unwrap());
        assert!(near(here, c(0.0, 0.0)));
        let net = field.network();
        let max_y = player
            .trajectory(&field)
            .unwrap()
            .coords()
            .iter()
            .map(|p| net.to_planar(*p).y)
            .fold(f64::MIN, f64::max);
        assert!((max_y - 30.0).abs() < 1e-6);
        assert!(matches!(
            player.strategy(),
            crate::Strategy::LoopClosing(s) if s.phase() == LoopPhase::Closed
        ));
    }

    #[test]
    fn exploration_skips_edges_that_cut_the_trail() {
        let mut field = PlayingField::new(bridge());
        let start = loc(field.network(), 0.0, -20.0, 0);
        let mut player = Player::join(&mut field, "p1", "Bea", start)
            .unwrap()
            .with_strategy(LoopClosingStrategy::default())
            .with_max_speed(5.0);

        // P → Q (40 m), then 10 m toward X.
        assert!(player.move_on(&mut field, at(10)));
        let first = planar(&field, player.current_location(&field).unwrap());
        assert!(dist(first, c(0.0, 20.0)) > 9.99 && dist(first, c(0.0, 20.0)) < 10.01);

        // At X the bridge toward Y would cut P–Q, so the walk turns to Z.
        assert!(player.move_on(&mut field, at(20)));
        let second = planar(&field, player.current_location(&field).unwrap());
        assert!((second.x - 20.0).abs() < 1e-6);
        assert!(second.y > 0.0);
    }

    #[test]
    fn steps_never_exceed_the_budget() {
        let mut field = PlayingField::new(grid());
        let start = loc(field.network(), 30.0, 0.0, 0);
        let config = LoopConfig { min_loop_length_m: 120.0, ..LoopConfig::default() };
        let mut player = Player::join(&mut field, "p1", "Gus", start)
            .unwrap()
            .with_strategy(LoopClosingStrategy::new(config).unwrap())
            .with_max_speed(2.0);

        let mut previous = planar(&field, player.current_location(&field).unwrap());
        for step in 1..=60 {
            if !player.move_on(&mut field, at(step * 6)) {
                break;
            }
            let here = planar(&field, player.current_location(&field).unwrap());
            assert!(dist(previous, here) <= 12.0 + 1e-6, "step {step} moved {:.3} m", dist(previous, here));
            let on_net = snap(field.network(), here).unwrap();
            assert!(near(on_net.point, here));
            previous = here;
        }
    }

    #[test]
    fn empty_network_yields_no_proposal() {
        let field = PlayingField::new(tn_spatial::StreetNetwork::empty());
        let last = tn_core::Location::at(50.88, 4.70, at(0));
        let mut strategy = LoopClosingStrategy::default();
        assert_eq!(strategy.next_move(&last, &field, 5.0, &p1(), at(4)), None);
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod player {
    use tn_field::{FieldError, PlayingField, UpdateOutcome};
    use tn_spatial::{SpatialError, StreetNetwork};

    use super::helpers::{abc, at, c, loc, near, planar};
    use crate::{Player, Strategy};

    #[test]
    fn join_registers_with_defaults() {
        let mut field = PlayingField::new(abc());
        let start = loc(field.network(), 5.0, 3.0, 0);
        let player = Player::join(&mut field, "p1", "Ann", start).unwrap();

        assert_eq!(player.id().as_str(), "p1");
        assert_eq!(player.name(), "Ann");
        assert_eq!(player.max_speed_mps(), Player::DEFAULT_MAX_SPEED_MPS);
        assert!(matches!(player.strategy(), Strategy::Stationary(_)));
        assert!(near(planar(&field, player.current_location(&field).unwrap()), c(5.0, 0.0)));
        assert!(player.trajectory(&field).unwrap().is_empty());
    }

    #[test]
    fn join_on_empty_network_fails() {
        let mut field = PlayingField::new(StreetNetwork::empty());
        let result = Player::join(&mut field, "p1", "Ann", tn_core::Location::at(0.0, 0.0, at(0)));
        assert!(matches!(result, Err(FieldError::Spatial(SpatialError::NoNearestEdge))));
    }

    #[test]
    fn external_updates_go_through_the_field() {
        let mut field = PlayingField::new(abc());
        let start = loc(field.network(), 0.0, 0.0, 0);
        let player = Player::join(&mut field, "p1", "Ann", start).unwrap();
        let target = loc(field.network(), 18.0, 2.0, 30);
        let outcome = player.update_current_location(&mut field, target).unwrap();
        assert!(outcome.is_moved());
        assert!(near(planar(&field, player.current_location(&field).unwrap()), c(18.0, 0.0)));
        assert_eq!(player.trajectory(&field).unwrap().len(), 3);
    }

    #[test]
    fn move_on_a_foreign_field_is_false() {
        let mut home = PlayingField::new(abc());
        let start = loc(home.network(), 0.0, 0.0, 0);
        let mut player = Player::join(&mut home, "p1", "Ann", start).unwrap();

        let mut other = PlayingField::new(abc());
        assert!(!player.move_on(&mut other, at(10)));
        let elsewhere = loc(other.network(), 5.0, 0.0, 10);
        assert_eq!(
            player.update_current_location(&mut other, elsewhere),
            Ok(UpdateOutcome::UnknownPlayer)
        );
    }
}
