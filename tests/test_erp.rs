use ecogproc::store::{HIGH_GAMMA, RAW};
use ecogproc::{erp, Alignment, ChannelStore, EcogError, ErpCache, MemoryStore, TrialSet};
use ndarray::{Array1, Array2};

#[test]
fn constant_channel_gives_flat_zero_erp() {
    let x = Array1::from_elem(4000, 5.0);
    let trials = TrialSet { alignment: Alignment::Onset, times: vec![2.0, 4.0, 6.0] };
    let e = erp(x.view(), 400.0, &trials, 2.0).unwrap();
    assert_eq!(e.mean.len(), 800);
    assert!(e.counts.iter().all(|&n| n == 3));
    for (&m, &s) in e.mean.iter().zip(e.sem.iter()) {
        approx::assert_abs_diff_eq!(m, 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(s, 0.0, epsilon = 1e-12);
    }
    approx::assert_abs_diff_eq!(e.dc, 5.0, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(e.time[400], 1.0, epsilon = 1e-12);
}

#[test]
fn trials_near_the_edges_cover_fewer_offsets() {
    let x = Array1::from_shape_fn(1000, |i| (i as f64 * 0.1).sin());
    let trials = TrialSet { alignment: Alignment::Offset, times: vec![0.5, 5.0, 9.8] };
    // fs 100, half = 100 samples: the first trial starts 50 samples early,
    // the last ends 80 samples late.
    let e = erp(x.view(), 100.0, &trials, 2.0).unwrap();
    assert_eq!(e.counts[0], 2);
    assert_eq!(e.counts[49], 2);
    assert_eq!(e.counts[50], 3);
    assert_eq!(e.counts[119], 3);
    assert_eq!(e.counts[120], 2);
    assert_eq!(e.counts[199], 2);
    assert!(e.mean.iter().all(|v| v.is_finite()));
}

fn session_store() -> MemoryStore {
    let data = Array2::from_shape_fn((3, 2000), |(c, t)| (c as f64 + 1.0) * (t as f64 * 0.05).sin());
    let mut store = MemoryStore::with_raw(Array2::zeros((3, 10)), 1000.0);
    store.put_interface(HIGH_GAMMA, data, 200.0, String::new()).unwrap();
    store.set_trials(vec![2.0, 4.0, 6.0], vec![3.0, 5.0, 7.0]);
    store
}

#[test]
fn cache_is_per_channel_and_alignment() {
    let store = session_store();
    let mut cache = ErpCache::new(1.0);
    let on = cache.get_or_compute(&store, HIGH_GAMMA, 0, Alignment::Onset).unwrap();
    let off = cache.get_or_compute(&store, HIGH_GAMMA, 0, Alignment::Offset).unwrap();
    assert_eq!(cache.len(), 2);
    assert_ne!(on.mean, off.mean);
    let hit = cache.get_or_compute(&store, HIGH_GAMMA, 0, Alignment::Onset).unwrap();
    assert!(std::sync::Arc::ptr_eq(&on, &hit));
    assert_eq!(on.mean.len(), 200);
}

#[test]
fn width_change_clears_every_entry() {
    let store = session_store();
    let mut cache = ErpCache::new(1.0);
    for ch in 0..3 {
        cache.get_or_compute(&store, HIGH_GAMMA, ch, Alignment::Onset).unwrap();
    }
    assert!(!cache.set_epoch_width(1.0));
    assert_eq!(cache.len(), 3);
    assert!(cache.set_epoch_width(0.5));
    assert!(cache.is_empty());
    let e = cache.get_or_compute(&store, HIGH_GAMMA, 2, Alignment::Onset).unwrap();
    assert_eq!(e.mean.len(), 100);
    assert_eq!(cache.epoch_width(), 0.5);
}

#[test]
fn cache_errors() {
    let mut store = session_store();
    let mut cache = ErpCache::new(1.0);
    assert!(matches!(
        cache.get_or_compute(&store, HIGH_GAMMA, 3, Alignment::Onset),
        Err(EcogError::ChannelIndex { channel: 3, n_channels: 3 })
    ));
    assert!(matches!(
        cache.get_or_compute(&store, "missing", 0, Alignment::Onset),
        Err(EcogError::Store(_))
    ));
    store.set_trials(vec![], vec![]);
    assert!(matches!(
        cache.get_or_compute(&store, RAW, 0, Alignment::Onset),
        Err(EcogError::InsufficientData(_))
    ));
    assert!(cache.is_empty());
}
