use ferrite_backprop::{CheckpointName, CheckpointStore, Sample, TrainConfig};

/// Two well-separated clusters in four dimensions.
fn clusters(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let label = i % 2;
            let base = if label == 0 { 0.1 } else { 0.9 };
            let jitter = (i as f64 * 0.618).fract() * 0.1;
            Sample::new(vec![base + jitter, base - jitter, base, 1.0 - base], label, 2)
        })
        .collect()
}

#[test]
fn training_learns_and_checkpoints_the_best_epoch() {
    let dir = tempfile::tempdir().unwrap();
    let train = clusters(40);
    let test = clusters(10);

    let mut config = TrainConfig::new(vec![4, 6, 2]);
    config.epochs = 30;
    config.learning_rate = 0.5;
    config.seed = Some(12);
    config.checkpoint_dir = Some(dir.path().to_path_buf());

    let mut network = config.build_network().unwrap();
    let report = ferrite_backprop::train_loop(&mut network, &train, &test, &config).unwrap();

    assert_eq!(report.epochs_run, 30);
    let best = report.best_accuracy.unwrap();
    assert!(best >= 0.9, "best accuracy {best}");
    assert!(report.history.last().unwrap().train_loss < report.history[0].train_loss);

    // Every save has been joined, so exactly the best one survives.
    let signature = network.architecture().signature();
    let files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 1, "left {files:?}");
    let name = CheckpointName::parse(&files[0]).unwrap();
    assert_eq!(name.signature, signature);
    assert_eq!(Some(name.epoch), report.best_epoch);

    let mut restored = CheckpointStore::load(dir.path().join(&files[0])).unwrap();
    let restored_acc = ferrite_backprop::accuracy(&mut restored, &test).unwrap();
    assert_eq!(restored_acc, best);
}

#[test]
fn seeded_runs_are_reproducible() {
    let train = clusters(12);
    let mut config = TrainConfig::new(vec![4, 3, 2]);
    config.epochs = 3;
    config.seed = Some(5);

    let mut a = config.build_network().unwrap();
    let mut b = config.build_network().unwrap();
    let ra = ferrite_backprop::train_loop(&mut a, &train, &train, &config).unwrap();
    let rb = ferrite_backprop::train_loop(&mut b, &train, &train, &config).unwrap();

    assert_eq!(a.layers, b.layers);
    let losses = |r: &ferrite_backprop::TrainReport| r.history.iter().map(|s| s.train_loss).collect::<Vec<_>>();
    assert_eq!(losses(&ra), losses(&rb));
}
