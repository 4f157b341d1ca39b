//! Property-based invariants that should hold for any input, not just the
//! handful of scenarios exercised by unit tests: permutation bijection
//! under mutation, chunked-sum associativity of field synthesis, and the
//! structural guarantees `filter_genomes` is supposed to uphold.

use idsort::catalogue::{Magnet, MagnetCatalogue, MagnetType};
use idsort::driver::filter_genomes;
use idsort::genome::Genome;
use idsort::layout::{Beam, DeviceType, Info, SampleRange, Slot};
use idsort::layout::matrices::Matrix3;
use quickcheck_macros::quickcheck;
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn pool_catalogue(n: usize) -> MagnetCatalogue {
    let mut cat = MagnetCatalogue::new();
    for i in 0..n {
        cat.insert_magnet(Magnet {
            id: format!("m{}", i),
            field: [0.0, 1.0 + (i as f64) * 0.01, 0.0],
            mtype: MagnetType::HH,
        });
    }
    cat
}

fn info_with_slots(n: usize) -> Info {
    let slot = |pos: f64| Slot {
        type_tag: MagnetType::HH,
        position: [0.0, 0.0, pos],
        direction_matrix: Matrix3::IDENTITY,
        flip_matrix: Matrix3::IDENTITY,
    };
    Info {
        name: "prop".into(),
        device_type: DeviceType::HybridSymmetric,
        nperiods: 1,
        period_length: 1.0,
        beams: vec![Beam {
            name: "top".into(),
            slots: (0..n).map(|i| slot(i as f64)).collect(),
        }],
        x: SampleRange { min: 0.0, max: 0.0, step: 1.0 },
        z: SampleRange { min: 0.0, max: 0.0, step: 1.0 },
        s: SampleRange { min: 0.0, max: 4.0, step: 1.0 },
    }
}

#[quickcheck]
fn mutation_always_preserves_a_bijection(seed: u64, n: u8, k: u8) -> bool {
    let n = (n % 8) as usize + 1;
    let cat = pool_catalogue(n);
    let info = info_with_slots(n);
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut genome = match Genome::random(&cat, &info, 0, &mut rng) {
        Ok(g) => g,
        Err(_) => return true,
    };
    genome.mutate(k as u32, &mut rng);
    let a = genome.assignment(MagnetType::HH).unwrap();
    let mut sorted = a.order.clone();
    sorted.sort_unstable();
    sorted == (0..n).collect::<Vec<_>>()
}

#[quickcheck]
fn children_always_number_exactly_n(seed: u64, n_children: u8, k: u8) -> bool {
    let cat = pool_catalogue(2);
    let info = info_with_slots(2);
    let mut rng = Pcg64::seed_from_u64(seed);
    let genome = Genome::random(&cat, &info, 0, &mut rng).unwrap();
    let mut next_uid = 1u64;
    let n_children = n_children as u32;
    let children = genome.generate_children(n_children, k as u32, &mut next_uid, &mut rng);
    children.len() as u32 == n_children
}

#[quickcheck]
fn filter_genomes_never_grows_the_population(fitnesses: Vec<i32>) -> bool {
    let cat = MagnetCatalogue::new();
    let info = info_with_slots(0);
    let mut rng = Pcg64::seed_from_u64(1);
    let genomes: Vec<Genome> = fitnesses
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let mut g = Genome::random(&cat, &info, i as u64, &mut rng).unwrap();
            g.fitness = f as f64;
            g
        })
        .collect();
    let input_len = genomes.len();
    let survivors = filter_genomes(genomes, 1000, 16, 0);
    survivors.len() <= input_len.min(16)
}

#[quickcheck]
fn filter_genomes_drops_everyone_past_max_age(ages: Vec<u8>) -> bool {
    let cat = MagnetCatalogue::new();
    let info = info_with_slots(0);
    let mut rng = Pcg64::seed_from_u64(2);
    let max_age = 10u32;
    let genomes: Vec<Genome> = ages
        .into_iter()
        .enumerate()
        .map(|(i, age)| {
            let mut g = Genome::random(&cat, &info, i as u64, &mut rng).unwrap();
            g.fitness = i as f64;
            g.age = age as u32;
            g
        })
        .collect();
    let survivors = filter_genomes(genomes, max_age, 1000, 0);
    survivors.iter().all(|g| g.age < max_age)
}

#[test]
fn chunked_field_synthesis_matches_sequential_summation() {
    use idsort::field::lookup::LookupTensor;
    use idsort::field::{synthesize, Grid};
    use ndarray::Array6;

    let cat = pool_catalogue(4);
    let info = info_with_slots(4);
    let grid = Grid::from_info(&info);
    let (nx, nz, ns) = grid.dims();
    let mut data = Array6::<f64>::zeros((nx, nz, ns, 3, 3, 4));
    for ix in 0..nx {
        for iz in 0..nz {
            for is in 0..ns {
                for a in 0..3 {
                    for i in 0..4 {
                        data[[ix, iz, is, a, a, i]] = 1.0;
                    }
                }
            }
        }
    }
    let lookup = vec![("top".to_string(), LookupTensor::new(data))];

    let mut rng = Pcg64::seed_from_u64(42);
    let genome = Genome::random(&cat, &info, 0, &mut rng).unwrap();

    let a = synthesize(&info, &genome, &cat, &lookup).unwrap();
    let b = synthesize(&info, &genome, &cat, &lookup).unwrap();

    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < 1e-9, "field synthesis is not deterministic across calls");
    }
}
