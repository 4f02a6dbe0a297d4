//! Run these benches with `cargo bench --bench wind -- --verbose`
use criterion::{criterion_group, criterion_main, Criterion};
use metfor::{HectoPascal, Knots, Meters, WindUV};
use sounding_params::{
    bunkers_storm_motion, define_parcel, effective_inflow_layer_with, helicity, lift, mean_wind,
    EffectiveLayerConfig, ParcelSelection,
};

mod utils;

fn build_tester() -> Criterion {
    Criterion::default()
        .sample_size(200)
        .measurement_time(std::time::Duration::from_secs(10))
        .noise_threshold(0.03)
        .significance_level(0.01)
}

criterion_main!(wind_benches);

criterion_group!(
    name = wind_benches;
    config = build_tester();
    targets = mean_wind_bench, sr_helicity_bench, bunkers_storm_motion_bench
);

fn mean_wind_bench(c: &mut Criterion) {
    let snds = utils::load_all_test_soundings();

    c.bench_function("mean_wind", |b| {
        b.iter(|| {
            for snd in &snds {
                let _x = mean_wind(snd, HectoPascal(850.0), HectoPascal(250.0)).expect("oops");
            }
        });
    });
}

fn sr_helicity_bench(c: &mut Criterion) {
    let snds = utils::load_all_test_soundings();

    let storm_motion = WindUV {
        u: Knots(12.0),
        v: Knots(12.0),
    };

    c.bench_function("sr_helicity", |b| {
        b.iter(|| {
            for snd in &snds {
                let _x = helicity(snd, Meters(0.0), Meters(3000.0), storm_motion).expect("oops");
            }
        });
    });
}

fn bunkers_storm_motion_bench(c: &mut Criterion) {
    let cfg = EffectiveLayerConfig::default();
    let inputs: Vec<_> = utils::load_all_test_soundings()
        .to_vec()
        .into_iter()
        .map(|snd| {
            let mu = define_parcel(&snd, ParcelSelection::MOST_UNSTABLE).unwrap();
            let mu = lift(&snd, &mu).unwrap();
            let eff = effective_inflow_layer_with(&snd, &cfg, &mu).ok();
            (snd, mu, eff)
        })
        .collect();

    c.bench_function("bunkers_storm_motion", |b| {
        b.iter(|| {
            for (snd, mu, eff) in &inputs {
                let _x = bunkers_storm_motion(snd, mu, *eff);
            }
        });
    });
}
