//! Property-based tests for hex geometry, path planning and combat math.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use carrier_war::battle::{find_path, scaled_damage, DistanceField, HexCoord, HexGrid, Passability};

fn coord() -> impl Strategy<Value = HexCoord> {
    (-20i32..40, -20i32..40).prop_map(|(x, y)| HexCoord::new(x, y))
}

/// A small grid plus land mask; row-major, 1 = land
fn island_grid() -> impl Strategy<Value = HexGrid> {
    (3u32..10, 3u32..10).prop_flat_map(|(w, h)| {
        prop::collection::vec(prop::bool::weighted(0.3), (w * h) as usize).prop_map(move |land| {
            let rows: Vec<Vec<u8>> = land
                .chunks(w as usize)
                .map(|row| row.iter().map(|&l| u8::from(l)).collect())
                .collect();
            HexGrid::from_rows(&rows)
        })
    })
}

proptest! {
    #[test]
    fn prop_distance_is_metric(a in coord(), b in coord(), c in coord()) {
        prop_assert_eq!(a.distance(&a), 0);
        prop_assert_eq!(a.distance(&b), b.distance(&a));
        prop_assert_eq!(a.distance(&b) == 0, a == b);
        prop_assert!(a.distance(&c) <= a.distance(&b) + b.distance(&c));
    }

    #[test]
    fn prop_neighbors_are_adjacent(a in coord()) {
        for n in a.neighbors() {
            prop_assert_eq!(a.distance(&n), 1);
        }
    }

    #[test]
    fn prop_line_spans_distance(a in coord(), b in coord()) {
        let line = a.line_to(&b);
        prop_assert_eq!(line.len() as u32, a.distance(&b) + 1);
        prop_assert_eq!(line.first(), Some(&a));
        prop_assert_eq!(line.last(), Some(&b));
        for pair in line.windows(2) {
            prop_assert_eq!(pair[0].distance(&pair[1]), 1);
        }
    }

    #[test]
    fn prop_damage_within_bounds(
        hp in -50i32..200,
        max_hp in 0i32..200,
        base in 0i32..100,
        seed in any::<u64>()
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let damage = scaled_damage(hp, max_hp, base, &mut rng);
        prop_assert!(damage >= 0);
        prop_assert!(damage as f32 <= base as f32 * 1.2);
    }

    #[test]
    fn prop_planner_agrees_with_field(
        grid in island_grid(),
        sx in 0i32..10, sy in 0i32..10,
        gx in 0i32..10, gy in 0i32..10,
        stop_range in 0u32..2,
        aircraft in any::<bool>()
    ) {
        let start = HexCoord::new(sx % grid.width as i32, sy % grid.height as i32);
        let goal = HexCoord::new(gx % grid.width as i32, gy % grid.height as i32);
        let pass = if aircraft { Passability::aircraft() } else { Passability::ships() };

        let field = DistanceField::build(&grid, goal, &pass, stop_range);
        let path = find_path(&grid, start, goal, &pass, stop_range, 10_000);

        prop_assert_eq!(field.reaches(start), path.is_some());
        if let Some(path) = path {
            prop_assert_eq!(Some(path.len() as u32 - 1), field.get(start));
            prop_assert!(path.iter().all(|c| pass.allows(&grid, *c)));
            let end = path.last().copied().unwrap();
            prop_assert!(end.distance(&goal) <= stop_range);

            let descent = field.gradient_path(start).unwrap();
            prop_assert_eq!(descent.len(), path.len());
        }
    }
}
