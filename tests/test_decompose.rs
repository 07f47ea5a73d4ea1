mod common;
use common::sines;
use ecogproc::bands::{chang_lab, high_gamma_reference, HIGH_GAMMA_FIRST_BAND};
use ecogproc::{composite, decompose, BandSpec, EcogError};
use ndarray::Axis;

#[test]
fn one_envelope_per_channel_and_band() {
    let x = sines(3, 800, 400.0, 20.0, 1.0);
    let power = decompose(&x, 400.0, &chang_lab()).unwrap();
    assert_eq!(power.data.dim(), (3, 40, 800));
    let rows = power.to_rows();
    assert_eq!(rows.dim(), (120, 800));
    assert_eq!(rows.row(41), power.trace(1, 1).unwrap());
    assert!(power.data.iter().all(|&v| v >= 0.0));
}

#[test]
fn tone_lands_in_its_band() {
    let x = sines(1, 4000, 400.0, 100.0, 1.0);
    let bands = BandSpec::from_table(&[10.0, 100.0], &[2.0, 5.0]).unwrap();
    let power = decompose(&x, 400.0, &bands).unwrap();
    let mid = 1000..3000;
    let low: f64 = power.trace(0, 0).unwrap().iter().skip(mid.start).take(mid.len()).sum();
    let high: f64 = power.trace(0, 1).unwrap().iter().skip(mid.start).take(mid.len()).sum();
    assert!(high > 100.0 * low, "100 Hz band {high} vs 10 Hz band {low}");
    // Unit-peak kernel: envelope of a centred tone is its amplitude.
    approx::assert_abs_diff_eq!(power.trace(0, 1).unwrap()[2000], 1.0, epsilon = 1e-2);
}

#[test]
fn composite_is_mean_of_selected_bands() {
    let x = sines(2, 1600, 400.0, 90.0, 1.0) + &sines(2, 1600, 400.0, 140.0, 0.5);
    let reference = high_gamma_reference();
    let power = decompose(&x, 400.0, &reference).unwrap();
    let mut mask = vec![true; reference.len()];
    mask[4] = false;
    let trace = composite(&power, &mask).unwrap();
    assert_eq!(trace.dim(), (2, 1600));

    let selected: Vec<usize> = (0..reference.len()).filter(|&b| b != 4).collect();
    let expected = power
        .data
        .select(Axis(1), &selected)
        .mean_axis(Axis(1))
        .unwrap();
    for (a, b) in trace.iter().zip(expected.iter()) {
        approx::assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    assert_eq!(reference.bands()[0], chang_lab().bands()[HIGH_GAMMA_FIRST_BAND]);
}

#[test]
fn bad_band_tables_are_rejected_up_front() {
    let x = sines(2, 400, 200.0, 10.0, 1.0);
    // High-gamma centres reach ~194 Hz; Nyquist here is 100 Hz.
    assert!(matches!(
        decompose(&x, 200.0, &high_gamma_reference()),
        Err(EcogError::Configuration { .. })
    ));
    assert!(matches!(
        decompose(&x, 200.0, &BandSpec::default()),
        Err(EcogError::Configuration { .. })
    ));
    let power = decompose(&x, 200.0, &BandSpec::from_table(&[10.0], &[1.0]).unwrap()).unwrap();
    assert!(matches!(composite(&power, &[false]), Err(EcogError::Configuration { .. })));
    assert!(matches!(composite(&power, &[true, true]), Err(EcogError::Configuration { .. })));
}
