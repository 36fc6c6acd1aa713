//! Property tests for archive maintenance.

use std::sync::Arc;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use u_vns::{
    dominates, AcceptanceCriterion, ParetoAcceptance, Problem, Sense, SkewedAcceptance, Solution,
    Verdict,
};

fn problem(objectives: usize) -> Arc<Problem<Vec<f64>>> {
    let mut builder = Problem::builder(move |_rng| vec![0.0; objectives])
        .with_distance(|a: &Vec<f64>, b: &Vec<f64>| {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
        });
    for i in 0..objectives {
        builder = builder.with_objective(move |v: &Vec<f64>| v[i]);
    }
    builder.build().unwrap()
}

fn vectors(dim: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    // Integer-valued coordinates make ties and exact duplicates common.
    prop::collection::vec(prop::collection::vec((0i32..8).prop_map(f64::from), dim), 1..60)
}

fn sense() -> impl Strategy<Value = Sense> {
    prop_oneof![Just(Sense::Minimize), Just(Sense::Maximize)]
}

fn assert_mutually_non_dominated(archive: &[Solution<Vec<f64>>], sense: Sense) {
    for (i, a) in archive.iter().enumerate() {
        for (j, b) in archive.iter().enumerate() {
            if i != j {
                assert!(
                    !dominates(a.objectives(), b.objectives(), sense).unwrap(),
                    "{:?} dominates {:?} inside the archive",
                    a.objectives(),
                    b.objectives()
                );
            }
        }
    }
}

proptest! {
    #[test]
    fn archive_stays_non_dominated(points in vectors(3), sense in sense()) {
        let problem = problem(3);
        let mut archive = ParetoAcceptance::new(sense).with_buffer(5);
        for p in points {
            archive.accept(Solution::new(Arc::clone(&problem), p)).unwrap();
            assert_mutually_non_dominated(archive.solutions(), sense);
        }
    }

    #[test]
    fn skewed_archive_stays_non_dominated(points in vectors(2), sense in sense()) {
        let problem = problem(2);
        let mut archive = SkewedAcceptance::from_problem(&problem, sense, 0.3, 4).unwrap();
        for p in points {
            archive.accept(Solution::new(Arc::clone(&problem), p)).unwrap();
            assert_mutually_non_dominated(archive.solutions(), sense);
        }
    }

    #[test]
    fn dominated_insertion_is_a_no_op(points in vectors(2), sense in sense()) {
        let problem = problem(2);
        let mut archive = ParetoAcceptance::new(sense);
        for p in points {
            archive.accept(Solution::new(Arc::clone(&problem), p)).unwrap();
        }

        let before: Vec<Vec<f64>> =
            archive.solutions().iter().map(|s| s.objectives().to_vec()).collect();
        // Re-offering every member is rejected and changes nothing.
        for member in archive.solutions().to_vec() {
            let copy = member.variant(member.data().clone());
            prop_assert_eq!(archive.accept(copy).unwrap(), Verdict::Rejected);
        }
        // So is a strictly worse copy of any member.
        let worse_by = match sense { Sense::Minimize => 1.0, Sense::Maximize => -1.0 };
        for member in archive.solutions().to_vec() {
            let worse: Vec<f64> = member.data().iter().map(|v| v + worse_by).collect();
            prop_assert_eq!(archive.accept(member.variant(worse)).unwrap(), Verdict::Rejected);
        }
        let after: Vec<Vec<f64>> =
            archive.solutions().iter().map(|s| s.objectives().to_vec()).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn single_objective_best_is_monotone(values in prop::collection::vec(-100i32..100, 1..80)) {
        let problem = problem(1);
        for sense in [Sense::Minimize, Sense::Maximize] {
            let mut archive = ParetoAcceptance::new(sense);
            let mut best: Option<f64> = None;
            for v in &values {
                archive.accept(Solution::new(Arc::clone(&problem), vec![f64::from(*v)])).unwrap();
                prop_assert_eq!(archive.solutions().len(), 1);
                let now = archive.solutions()[0].objectives()[0];
                if let Some(prev) = best {
                    match sense {
                        Sense::Minimize => prop_assert!(now <= prev),
                        Sense::Maximize => prop_assert!(now >= prev),
                    }
                }
                best = Some(now);
            }
        }
    }

    #[test]
    fn buffer_never_exceeds_capacity(points in vectors(2), capacity in 1usize..6) {
        let problem = problem(2);
        let mut plain = ParetoAcceptance::new(Sense::Minimize).with_buffer(capacity);
        let mut skewed =
            SkewedAcceptance::from_problem(&problem, Sense::Minimize, 1.0, capacity).unwrap();
        for p in points {
            plain.accept(Solution::new(Arc::clone(&problem), p.clone())).unwrap();
            skewed.accept(Solution::new(Arc::clone(&problem), p)).unwrap();
            prop_assert!(plain.buffered() <= capacity);
            prop_assert!(skewed.buffered() <= capacity);
        }
    }

    #[test]
    fn current_solution_comes_from_archive_or_buffer(points in vectors(2), seed in any::<u64>()) {
        let problem = problem(2);
        let mut archive = ParetoAcceptance::new(Sense::Minimize).with_buffer(3);
        for p in points {
            archive.accept(Solution::new(Arc::clone(&problem), p)).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..10 {
            let drawn = archive.current_solution(&mut rng).unwrap();
            let known = archive.solutions().iter().any(|s| Solution::ptr_eq(s, &drawn))
                || archive.buffer().iter().any(|s| Solution::ptr_eq(s, &drawn));
            prop_assert!(known);
        }
    }
}

#[test]
fn buffer_evicts_oldest_first() {
    let problem = problem(1);
    let mut archive = ParetoAcceptance::new(Sense::Minimize).with_buffer(2);
    for v in [5.0, 4.0, 3.0, 2.0] {
        archive.accept(Solution::new(Arc::clone(&problem), vec![v])).unwrap();
    }
    // 5 was displaced first and evicted when 3 was displaced.
    let buffered: Vec<f64> = archive.buffer().iter().map(|s| s.objectives()[0]).collect();
    assert_eq!(buffered, vec![4.0, 3.0]);
}
