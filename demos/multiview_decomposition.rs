extern crate multiview_multiclass;

use multiview_multiclass::{
    datasets::NoiseParams,
    estimators::MultiviewEstimator,
    helpers::test_helpers::{generate_separable_data, CentroidClassifier},
    multiclass::{get_mc_estim, MulticlassEstimator},
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    let dataset = generate_separable_data(42, 60, 3, 5, 4);
    let y = dataset.get_labels(None).unwrap();
    let train = (0..60).filter(|i| i % 4 != 0).collect::<Vec<_>>();
    let test = (0..60).filter(|i| i % 4 == 0).collect::<Vec<_>>();

    // A binary-only estimator with probabilities is wrapped in a one-vs-rest
    let estimator = CentroidClassifier::<f64>::new().multiclass(false);
    let mut ovr = get_mc_estim(estimator.clone(), 42, Some(y.view()), true, false);
    assert!(matches!(ovr, MulticlassEstimator::OneVsRest(_)));

    // ... and in a one-vs-one without them
    let mut ovo = get_mc_estim(estimator.probability(false), 42, Some(y.view()), true, false);
    assert!(matches!(ovo, MulticlassEstimator::OneVsOne(_)));

    let mut rng = StdRng::seed_from_u64(42);
    let noisy = dataset
        .add_gaussian_noise(&mut rng, None, &NoiseParams::new().noise_std(0.05))
        .unwrap();

    for (name, X) in [("clean", &dataset), ("noisy", &noisy)] {
        ovr.fit(X, y.view(), Some(&train), None).unwrap();
        ovo.fit(X, y.view(), Some(&train), None).unwrap();
        println!(
            "#### {} data: {} accuracy {:.3}, {} accuracy {:.3}",
            name,
            ovr.name(),
            ovr.score(X, y.view(), Some(&test), None).unwrap(),
            ovo.name(),
            ovo.score(X, y.view(), Some(&test), None).unwrap(),
        );
    }
}
