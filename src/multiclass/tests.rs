use ndarray::{array, Array1, Array2, ArrayView1};

use super::binary::{fit_binary, predict_binary};
use super::*;
use crate::datasets::MultiviewDataset;
use crate::error::{MultiviewError, Result};
use crate::estimators::{Capabilities, MultiviewEstimator};
use crate::helpers::helpers::first_argmax;
use crate::helpers::test_helpers::*;
use crate::param_guard::ParamGuard;

/// Centroid classifier declaring a margin it does not implement.
#[derive(Debug, Clone)]
struct BrokenMargin(CentroidClassifier<f64>);

impl MultiviewEstimator<f64> for BrokenMargin {
    fn name(&self) -> String {
        "broken_margin".to_string()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            margin: true,
            probability: true,
            ..Capabilities::default()
        }
    }

    fn fit(
        &mut self,
        X: &MultiviewDataset<f64>,
        y: ArrayView1<usize>,
        train_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<()> {
        self.0.fit(X, y, train_indices, view_indices)
    }

    fn predict(
        &self,
        X: &MultiviewDataset<f64>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array1<usize>> {
        self.0.predict(X, sample_indices, view_indices)
    }

    fn predict_proba(
        &self,
        X: &MultiviewDataset<f64>,
        sample_indices: Option<&[usize]>,
        view_indices: Option<&[usize]>,
    ) -> Result<Array2<f64>> {
        self.0.predict_proba(X, sample_indices, view_indices)
    }
}

fn binary_centroid() -> CentroidClassifier<f64> {
    CentroidClassifier::new().multiclass(false)
}

fn seeded_scenario() -> (MultiviewDataset<f64>, Array1<usize>) {
    let X = generate_multiview_data(42, 5, 3, 7, 3);
    (X, array![0, 1, 2, 0, 1])
}

#[test]
fn one_vs_one_trains_one_estimator_per_pair() {
    let (X, y) = seeded_scenario();
    let mut ovo = OneVsOne::new(binary_centroid());
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.estimators().len(), 3);
    assert_eq!(ovo.classes(), &[0, 1, 2]);
    assert!(ovo.pairwise_indices().is_none());

    let X = generate_separable_data(0, 12, 2, 3, 4);
    let y = X.get_labels(None).unwrap();
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.estimators().len(), 6);
    assert_eq!(ovo.n_classes(), 4);
}

#[test]
fn one_vs_rest_trains_one_estimator_per_class() {
    let (X, y) = seeded_scenario();
    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovr.estimators().len(), 3);
    assert_eq!(ovr.classes(), &[0, 1, 2]);
    assert_eq!(
        ovr.label_binarizer().unwrap().target_type(),
        TargetType::Multiclass
    );
}

#[test]
fn seeded_predictions_are_reproducible() {
    let run = || {
        let (X, y) = seeded_scenario();
        let mut ovo = OneVsOne::new(binary_centroid());
        ovo.fit(&X, y.view(), None, None).unwrap();
        let mut ovr = OneVsRest::new(binary_centroid());
        ovr.fit(&X, y.view(), None, None).unwrap();
        (
            ovo.predict(&X, None, None).unwrap(),
            ovo.decision_matrix(&X, None, None).unwrap(),
            ovr.predict(&X, None, None).unwrap(),
            ovr.score_samples(&X, None, None).unwrap(),
        )
    };
    let (ovo_a, ovo_scores_a, ovr_a, ovr_scores_a) = run();
    let (ovo_b, ovo_scores_b, ovr_b, ovr_scores_b) = run();
    assert_eq!(ovo_a, ovo_b);
    assert_eq!(ovr_a, ovr_b);
    // Bit-identical, not merely close.
    assert_eq!(ovo_scores_a, ovo_scores_b);
    assert_eq!(ovr_scores_a, ovr_scores_b);
}

#[test]
fn one_vs_one_single_class_is_a_configuration_error() {
    let X = generate_multiview_data(0, 6, 2, 3, 2);
    let y = Array1::from_elem(6, 1);
    let mut ovo = OneVsOne::new(binary_centroid());
    match ovo.fit(&X, y.view(), None, None) {
        Err(MultiviewError::Configuration(_)) => println!("Good"),
        other => panic!("Expected a configuration error, got {:?}", other.err()),
    }
    assert!(!ovo.is_fitted());
}

#[test]
fn predicting_before_fit_is_a_state_error() {
    let X = generate_multiview_data(0, 6, 2, 3, 2);
    let ovr = OneVsRest::new(binary_centroid());
    let ovo = OneVsOne::new(binary_centroid());
    assert!(matches!(
        ovr.predict(&X, None, None),
        Err(MultiviewError::NotFitted(_))
    ));
    assert!(matches!(
        ovo.predict(&X, None, None),
        Err(MultiviewError::NotFitted(_))
    ));
    assert!(matches!(
        ovo.decision_matrix(&X, None, None),
        Err(MultiviewError::NotFitted(_))
    ));
}

#[test]
fn decompositions_recover_separable_classes() {
    let X = generate_separable_data(3, 16, 3, 2, 4);
    let y = X.get_labels(None).unwrap();

    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovr.predict(&X, None, None).unwrap(), y);
    let proba = ovr.predict_proba(&X, None, None).unwrap();
    let sums = proba.sum_axis(ndarray::Axis(1));
    assert_array_all_close(sums.view(), Array1::ones(16).view(), 1e-10);

    let mut ovo = OneVsOne::new(binary_centroid());
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), y);

    let mut ovo = OneVsOne::new(binary_centroid().margin(false));
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), y);
    assert_eq!(ovo.score(&X, y.view(), None, None).unwrap(), 1.);
}

#[test]
fn decompositions_respect_train_and_view_subsets() {
    let X = generate_separable_data(5, 12, 3, 2, 3);
    let y = X.get_labels(None).unwrap();
    let train = [0, 1, 2, 3, 4, 5, 6, 7];
    let test = [8, 9, 10, 11];

    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit(&X, y.view(), Some(&train), Some(&[0, 2])).unwrap();
    let pred = ovr.predict(&X, Some(&test), Some(&[0, 2])).unwrap();
    assert_eq!(pred, array![2, 0, 1, 2]);

    let mut ovo = OneVsOne::new(binary_centroid());
    ovo.fit(&X, y.view(), Some(&train), Some(&[1])).unwrap();
    let pred = ovo.predict(&X, Some(&test), Some(&[1])).unwrap();
    assert_eq!(pred, array![2, 0, 1, 2]);
}

#[test]
fn binary_one_vs_rest_matches_the_unwrapped_estimator() {
    let X = generate_multiview_data(11, 20, 2, 4, 2);
    let y = Array1::from_shape_fn(20, |i| i % 2);

    let mut direct = binary_centroid();
    direct.fit(&X, y.view(), None, None).unwrap();
    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovr.estimators().len(), 1);

    let margins = direct.decision_function(&X, None, None).unwrap();
    let thresholded = margins.mapv(|m| (m > 0.) as usize);
    assert_eq!(ovr.predict(&X, None, None).unwrap(), thresholded);
    assert_eq!(direct.predict(&X, None, None).unwrap(), thresholded);
    assert_array_all_close(
        ovr.decision_function(&X, None, None).unwrap().view(),
        margins.view(),
        1e-12,
    );
}

#[test]
fn binary_one_vs_rest_maps_back_to_class_values() {
    let X = generate_separable_data(2, 10, 1, 3, 2);
    let y = X.get_labels(None).unwrap().mapv(|label| 3 + 2 * label);

    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovr.classes(), &[3, 5]);
    assert_eq!(ovr.predict(&X, None, None).unwrap(), y);

    let mut ovo = OneVsOne::new(binary_centroid());
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), y);
}

#[test]
fn single_class_one_vs_rest_predicts_that_class() {
    let X = generate_multiview_data(0, 6, 2, 3, 2);
    let y = Array1::from_elem(6, 2);
    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert!(ovr.estimators().is_empty());
    assert_eq!(ovr.predict(&X, Some(&[0, 3]), None).unwrap(), array![2, 2]);
}

#[test]
fn one_vs_rest_ties_go_to_the_last_estimator() {
    let X = generate_multiview_data(0, 6, 1, 2, 3);
    let y = array![0, 1, 2, 0, 1, 2];
    let mut ovr = OneVsRest::new(ConstantMargin::new(0.25));
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovr.predict(&X, None, None).unwrap(), Array1::from_elem(6, 2));
}

#[test]
fn one_vs_one_ties_go_to_the_first_class() {
    // Pairs (0, 1), (0, 2), (1, 2) vote for 1, 0 and 2.
    let predictions = array![[1, 0, 1]];
    let decision =
        pairwise_decision_function(predictions.view(), Array2::zeros((1, 3)).view(), 3).unwrap();
    assert_array_all_close(decision.row(0), array![1., 1., 1.].view(), 1e-12);
    assert_eq!(first_argmax(decision.row(0)), 0);
}

#[test]
fn pairwise_decision_function_adds_squashed_confidences() {
    let predictions = array![[1, 0, 1]];
    let confidences = array![[0.5, -0.5, 1.0]];
    let decision = pairwise_decision_function(predictions.view(), confidences.view(), 3).unwrap();
    let expected = array![1., 1. - 1. / 9., 1. + 1. / 9.];
    assert_array_all_close(decision.row(0), expected.view(), 1e-12);
    assert_eq!(first_argmax(decision.row(0)), 2);

    assert!(pairwise_decision_function(predictions.view(), confidences.view(), 4).is_err());
}

#[test]
fn binary_one_vs_one_short_circuits_on_the_pair_score() {
    let X = generate_multiview_data(0, 6, 1, 2, 2);
    let y = array![4, 7, 4, 7, 4, 7];
    let mut ovo = OneVsOne::new(ConstantMargin::new(1.5));
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), Array1::from_elem(6, 7));

    let mut ovo = OneVsOne::new(ConstantMargin::new(-1.5));
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), Array1::from_elem(6, 4));
}

#[test]
fn pairwise_estimators_record_pair_training_samples() {
    let X = generate_multiview_data(1, 8, 2, 8, 3);
    let y = array![0, 1, 2, 0, 1, 2, 0, 1];
    let train = [7, 0, 2, 4, 5, 0];

    let mut ovo = OneVsOne::new(binary_centroid().pairwise(true));
    ovo.fit(&X, y.view(), Some(&train), None).unwrap();
    let indices = ovo.pairwise_indices().unwrap();
    assert_eq!(indices.len(), 3);
    assert_eq!(indices[0], vec![0, 4, 7]);
    assert_eq!(indices[1], vec![0, 2, 5]);
    assert_eq!(indices[2], vec![2, 4, 5, 7]);
    assert_eq!(ovo.predict(&X, None, None).unwrap().len(), 8);
}

/// Square view whose entry `(i, j)` is one when samples `i` and `j` share a
/// label.
fn label_kernel(y: &Array1<usize>) -> MultiviewDataset<f64> {
    let n = y.len();
    let kernel = Array2::from_shape_fn((n, n), |(i, j)| (y[i] == y[j]) as usize as f64);
    MultiviewDataset::from_arrays(vec![kernel], y.clone()).unwrap()
}

#[test]
fn pairwise_one_vs_one_restricts_kernel_columns_at_fit_and_predict() {
    let y = Array1::from_shape_fn(9, |i| i % 3);
    let X = label_kernel(&y);

    let mut ovo = OneVsOne::new(binary_centroid().pairwise(true));
    ovo.fit(&X, y.view(), None, None).unwrap();
    let indices = ovo.pairwise_indices().unwrap();
    assert_eq!(indices[0], vec![0, 1, 3, 4, 6, 7]);
    for (estimator, columns) in ovo.estimators().iter().zip(indices.iter()) {
        let X_pair = X.select_features(columns).unwrap();
        assert_eq!(X_pair.get_shape(0).unwrap(), (9, 6));
        assert_eq!(estimator.predict(&X_pair, None, None).unwrap().len(), 9);
    }
    assert_eq!(ovo.predict(&X, None, None).unwrap(), y);
    assert_eq!(ovo.predict(&X, Some(&[5, 1]), None).unwrap(), array![2, 1]);
}

#[test]
fn scoring_falls_back_to_probabilities() {
    let X = generate_separable_data(0, 10, 2, 2, 2);
    let y = X.get_labels(None).unwrap();
    let samples = (0..10).collect::<Vec<_>>();
    let views = [0, 1];

    let broken = fit_binary(&BrokenMargin(binary_centroid()), &X, y.view(), &samples, &views).unwrap();
    let (scores, threshold) = predict_binary(&broken, &X, &samples, &views).unwrap();
    let proba = broken.predict_proba(&X, None, None).unwrap();
    assert_array_all_close(scores.view(), proba.column(1), 1e-12);
    assert_eq!(threshold, 0.5);

    let mute = binary_centroid().margin(false).probability(false);
    let mute = fit_binary(&mute, &X, y.view(), &samples, &views).unwrap();
    assert!(matches!(
        predict_binary(&mute, &X, &samples, &views),
        Err(MultiviewError::Capability { .. })
    ));
}

#[test]
fn fit_binary_leaves_the_original_untouched() {
    let X = generate_separable_data(0, 6, 1, 2, 2);
    let y = X.get_labels(None).unwrap();
    let original = binary_centroid();
    let fitted = fit_binary(&original, &X, y.view(), &[0, 1, 2, 3], &[0]).unwrap();
    assert!(original.classes().is_empty());
    assert_eq!(fitted.classes(), &[0, 1]);
}

#[test]
fn threshold_depends_on_the_scoring_method_used() {
    let X = generate_separable_data(0, 6, 1, 2, 2);
    let y = X.get_labels(None).unwrap();
    let samples = [0, 1, 2, 3, 4, 5];

    let margin = fit_binary(&binary_centroid(), &X, y.view(), &samples, &[0]).unwrap();
    let (_, threshold) = predict_binary(&margin, &X, &samples, &[0]).unwrap();
    assert_eq!(threshold, 0.);

    let proba = binary_centroid().margin(false);
    let proba = fit_binary(&proba, &X, y.view(), &samples, &[0]).unwrap();
    let (_, threshold) = predict_binary(&proba, &X, &samples, &[0]).unwrap();
    assert_eq!(threshold, 0.5);
}

#[test]
fn decompositions_threshold_fallback_probabilities_at_one_half() {
    let X = generate_separable_data(0, 10, 2, 2, 2);
    let y = X.get_labels(None).unwrap();

    let mut ovo = OneVsOne::new(BrokenMargin(binary_centroid()));
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), y);
    let decision = ovo.decision_function(&X, None, None).unwrap();
    assert_eq!(decision.mapv(|d| (d > 0.) as usize), y);

    let mut ovr = OneVsRest::new(BrokenMargin(binary_centroid()));
    ovr.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovr.predict(&X, None, None).unwrap(), y);

    let X = generate_separable_data(0, 12, 2, 2, 3);
    let y = X.get_labels(None).unwrap();
    let mut ovo = OneVsOne::new(BrokenMargin(binary_centroid()));
    ovo.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(ovo.predict(&X, None, None).unwrap(), y);
}

#[test]
fn multilabel_one_vs_rest_predicts_label_sets() {
    let X = generate_separable_data(4, 9, 2, 2, 3);
    let y = X.get_labels(None).unwrap();
    let Y = Array2::from_shape_fn((9, 3), |(i, k)| match k {
        0 => y[i] == 0,
        1 => y[i] >= 1,
        _ => y[i] == 2,
    });

    let mut ovr = OneVsRest::new(binary_centroid());
    ovr.fit_multilabel(&X, Y.view(), None, None).unwrap();
    assert_eq!(ovr.estimators().len(), 3);
    let label_sets = ovr.predict_label_sets(&X, Some(&[0, 1, 2]), None).unwrap();
    assert_eq!(label_sets, vec![vec![0], vec![1], vec![1, 2]]);
    assert!(matches!(
        ovr.predict(&X, None, None),
        Err(MultiviewError::Configuration(_))
    ));
}

#[test]
fn parallel_fits_match_sequential_ones() {
    let X = generate_separable_data(9, 20, 3, 3, 4);
    let y = X.get_labels(None).unwrap();
    let params = DecompositionParams::new().n_jobs(3);

    let mut sequential = OneVsRest::new(binary_centroid());
    sequential.fit(&X, y.view(), None, None).unwrap();
    let mut parallel = OneVsRest::with_params(binary_centroid(), params.clone()).unwrap();
    parallel.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(
        sequential.score_samples(&X, None, None).unwrap(),
        parallel.score_samples(&X, None, None).unwrap()
    );

    let mut sequential = OneVsOne::new(binary_centroid());
    sequential.fit(&X, y.view(), None, None).unwrap();
    let mut parallel = OneVsOne::with_params(binary_centroid(), params).unwrap();
    parallel.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(
        sequential.decision_matrix(&X, None, None).unwrap(),
        parallel.decision_matrix(&X, None, None).unwrap()
    );
}

#[test]
fn zero_jobs_is_rejected() {
    let res = DecompositionParams::new().n_jobs(0).check();
    assert!(matches!(res, Err(MultiviewError::InvalidJobs(0))));
    assert!(OneVsOne::with_params(binary_centroid(), DecompositionParams::new().n_jobs(0)).is_err());

    let params = DecompositionParams::new()
        .n_jobs(2)
        .view_mode(ViewMode::Monoview)
        .check_unwrap();
    assert_eq!(params.n_jobs(), 2);
    assert_eq!(params.view_mode(), ViewMode::Monoview);
}

#[test]
fn dispatcher_leaves_binary_problems_unwrapped() {
    let y = array![0, 1, 0, 1];
    let estim = get_mc_estim(binary_centroid(), 42, Some(y.view()), true, false);
    assert!(matches!(estim, MulticlassEstimator::Native(_)));

    let estim = get_mc_estim(binary_centroid(), 42, None, true, false);
    assert!(!estim.is_wrapped());
}

#[test]
fn dispatcher_leaves_native_multiclass_estimators_unwrapped() {
    let y = array![0, 1, 2, 1];
    let estim = get_mc_estim(CentroidClassifier::<f64>::new(), 42, Some(y.view()), true, false);
    assert!(matches!(estim, MulticlassEstimator::Native(_)));
}

#[test]
fn dispatcher_picks_the_decomposition_from_capabilities() {
    let y = array![0, 1, 2, 1];
    let estim = get_mc_estim(binary_centroid(), 42, Some(y.view()), true, false);
    assert!(matches!(estim, MulticlassEstimator::OneVsRest(_)));
    // The probe works on a clone.
    assert!(estim.inner().classes().is_empty());

    let estim = get_mc_estim(binary_centroid().probability(false), 42, Some(y.view()), true, false);
    assert!(matches!(estim, MulticlassEstimator::OneVsOne(_)));

    let estim = get_mc_estim(binary_centroid().probability(false), 42, None, true, true);
    assert!(matches!(estim, MulticlassEstimator::OneVsOne(_)));
}

#[test]
fn monoview_wrappers_require_a_single_view() {
    let X = generate_separable_data(0, 9, 3, 2, 3);
    let y = X.get_labels(None).unwrap();
    let mut estim = get_mc_estim(binary_centroid(), 0, Some(y.view()), false, false);
    assert!(matches!(
        estim.fit(&X, y.view(), None, None),
        Err(MultiviewError::ShapeMismatch { .. })
    ));
    estim.fit(&X, y.view(), None, Some(&[1])).unwrap();
    assert_eq!(estim.predict(&X, None, Some(&[1])).unwrap(), y);
    assert_eq!(estim.name(), "ovr_centroid");
}
