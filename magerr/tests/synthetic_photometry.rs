//! End-to-end synthetic photometry with fixed seeds

use magerr::io::{read_synthetic_sample, write_simulated, BandColumns};
use magerr::photometry::{Band, PerBand, UncertaintyModel};
use magerr::synthetic::{
    derive_reference_counts, NoiseCoupling, ObservedSample, PhotometrySimulator, SyntheticSample,
};
use magerr::testing::edr3_like_table;
use magerr::MagErrError;
use ndarray::{array, Array1};

fn model() -> UncertaintyModel {
    UncertaintyModel::gaia_edr3(&edr3_like_table()).unwrap()
}

fn five_stars() -> SyntheticSample {
    let g = array![10.0, 12.0, 14.0, 16.0, 18.0];
    SyntheticSample::new(PerBand::new(g.clone(), &g + 0.5, &g - 0.7)).unwrap()
}

#[test]
fn five_stars_within_ten_sigma() {
    let model = model();
    let sample = five_stars();
    let mut simulator = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(2024));
    let simulated = simulator.simulate(&sample).unwrap();

    assert_eq!(simulated.len(), 5);
    for band in Band::ALL {
        for i in 0..5 {
            let noisy = simulated.magnitude[band][i];
            let sigma = simulated.uncertainty[band][i];
            let truth = sample.magnitudes(band)[i];
            assert!(noisy.is_finite());
            assert!(
                (noisy - truth).abs() < 10.0 * sigma,
                "band {band} star {i}: {noisy} vs {truth} (sigma {sigma})"
            );
        }
    }
}

#[test]
fn fixed_seed_is_reproducible() {
    let model = model();
    let sample = five_stars();
    let run = |seed| {
        PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(seed))
            .with_noise_coupling(NoiseCoupling::Independent)
            .generate_noisy(&sample)
            .unwrap()
    };
    assert_eq!(run(17), run(17));
}

#[test]
fn observed_medians_drive_the_simulation() {
    let observed = ObservedSample::from_counts(PerBand::new(
        array![10.0, 20.0, 30.0],
        array![19.0, 21.0, 20.0, f64::NAN],
        array![18.0, 25.0, 22.0],
    ));
    // Ragged columns are rejected before any median is taken
    assert!(matches!(observed, Err(MagErrError::InvalidArgument(_))));

    let observed = ObservedSample::from_counts(PerBand::new(
        array![10.0, 20.0, 30.0, 40.0],
        array![19.0, 21.0, 20.0, f64::NAN],
        array![18.0, 25.0, 22.0, 23.0],
    ))
    .unwrap();
    let means = derive_reference_counts(&observed).unwrap();
    assert_eq!(means, PerBand::new(25, 20, 22));

    let model = model();
    let mut simulator = PhotometrySimulator::from_observed(&model, &observed, Some(3)).unwrap();
    let counts = simulator.draw_observation_counts(1000).unwrap();
    let mean = counts.g.iter().map(|&n| f64::from(n)).sum::<f64>() / 1000.0;
    assert!((mean - 25.0).abs() < 1.0, "mean = {mean}");
}

#[test]
fn zero_observation_count_is_reported() {
    let model = model();
    let sample = five_stars();
    let mut simulator = PhotometrySimulator::new(&model, PerBand::new(200, 20, 0), Some(8));
    match simulator.simulate(&sample) {
        Err(MagErrError::Numerical { band, stars, .. }) => {
            assert_eq!(band, Band::Rp);
            assert_eq!(stars.len(), 5);
            assert!(stars.iter().all(|s| s.n_obs == 0));
        }
        other => panic!("expected numerical error, got {other:?}"),
    }
}

#[test]
fn simulated_csv_reads_back() {
    let model = model();
    let sample = five_stars();
    let mut simulator = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(11));
    let simulated = simulator.simulate(&sample).unwrap();

    let mut out = Vec::new();
    write_simulated(&mut out, &sample, &simulated, &BandColumns::default()).unwrap();

    let mut columns = BandColumns::default();
    columns.magnitude = PerBand::new(
        "Gmag_syn".into(),
        "G_BPmag_syn".into(),
        "G_RPmag_syn".into(),
    );
    let noisy = read_synthetic_sample(out.as_slice(), &columns).unwrap();
    for band in Band::ALL {
        assert_eq!(noisy.magnitudes(band), &simulated.magnitude[band]);
    }

    let truth = read_synthetic_sample(out.as_slice(), &BandColumns::default()).unwrap();
    assert_eq!(truth, sample);
}

#[test]
fn large_sample_statistics() {
    let model = model();
    let n = 4000;
    let g = Array1::from_elem(n, 15.0);
    let sample = SyntheticSample::new(PerBand::new(g.clone(), g.clone(), g)).unwrap();
    let mut simulator = PhotometrySimulator::new(&model, PerBand::new(200, 20, 20), Some(77));
    let simulated = simulator.simulate(&sample).unwrap();

    // Normalised offsets should look like a unit normal
    let z: Vec<f64> = (0..n)
        .map(|i| (simulated.magnitude.g[i] - 15.0) / simulated.uncertainty.g[i])
        .collect();
    let mean = z.iter().sum::<f64>() / n as f64;
    let var = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    assert!(mean.abs() < 0.1, "mean = {mean}");
    assert!((var - 1.0).abs() < 0.1, "var = {var}");
}
