use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::time::{Duration, Instant};
use wolsim_core::bacteria::BacteriaPattern;
use wolsim_core::config::{ModelVariant, SimConfig};
use wolsim_core::world::World;

fn build_world(model: ModelVariant, size: usize, seed: u64) -> World {
    let config = SimConfig {
        n_x: size,
        n_y: size,
        model,
        seed,
        ..SimConfig::default()
    };
    let mut world = World::with_rng(config, ChaCha12Rng::seed_from_u64(seed))
        .unwrap_or_else(|e| panic!("{e}"));
    for k in 0..world.num_virus() {
        world
            .set_virus_parameters(k, 1.5, 1.6, 40.0)
            .unwrap_or_else(|e| panic!("{e}"));
    }
    world
        .initialize_bacteria(BacteriaPattern::RandomPatch { p: 0.3 })
        .unwrap_or_else(|e| panic!("{e}"));
    world
        .seed_virus(0, (size / 2, size / 2))
        .unwrap_or_else(|e| panic!("{e}"));
    world
}

fn bench(model: ModelVariant, size: usize, steps: usize) {
    let mut world = build_world(model, size, 42);
    let mut virus_time = Duration::ZERO;
    let mut concentration_time = Duration::ZERO;

    let start = Instant::now();
    for _ in 0..steps {
        let t = world.step();
        virus_time += Duration::from_micros(t.virus_update_us);
        concentration_time += Duration::from_micros(t.concentration_us);
    }
    let total = start.elapsed();

    println!(
        "{model} {size}x{size}: {steps} steps in {total:?} (avg {:?}/step)",
        total / steps as u32
    );
    println!("  virus update:  {virus_time:?}");
    println!("  concentration: {concentration_time:?}");
    println!("  final totals:  {:?}", world.virus_totals());
}

fn main() {
    let steps = 20;
    for size in [32, 64] {
        bench(ModelVariant::Signalling, size, steps);
        bench(ModelVariant::Genetic, size, steps);
    }
}
