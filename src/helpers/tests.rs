use super::helpers::*;
use super::test_helpers::*;
use crate::estimators::MultiviewEstimator;
use ndarray::{array, Array1};

#[test]
fn unique_sorted_works() {
    let res = unique_sorted(vec![4, 1, 4, 0, 1]);
    assert_eq!(res, vec![0, 1, 4]);
}

#[test]
fn intersect_sorted_works() {
    let res = intersect_sorted(&[7, 3, 5, 3, 1], &[5, 1, 1, 8]);
    assert_eq!(res, vec![1, 5]);
    assert!(intersect_sorted(&[1, 2], &[]).is_empty());
}

#[test]
fn first_argmax_takes_first_occurrence() {
    let row = array![1., 3., 2., 3.];
    assert_eq!(first_argmax(row.view()), 1);
    let row = array![f64::NAN, 0., -1.];
    assert_eq!(first_argmax(row.view()), 1);
}

#[test]
fn generate_multiview_data_is_seeded() {
    let a = generate_multiview_data(42, 5, 3, 7, 3);
    let b = generate_multiview_data(42, 5, 3, 7, 3);
    assert_eq!(a, b);
    assert_eq!(a.get_nb_view(), 3);
    assert_eq!(a.get_shape(2).unwrap(), (5, 7));
    assert!(a.get_labels(None).unwrap().iter().all(|&l| l < 3));
}

#[test]
fn centroid_classifier_separates_classes() {
    let X = generate_separable_data(0, 12, 2, 3, 3);
    let y = X.get_labels(None).unwrap();
    let mut clf = CentroidClassifier::new();
    clf.fit(&X, y.view(), None, None).unwrap();
    assert_eq!(clf.classes(), &[0, 1, 2]);
    let pred = clf.predict(&X, None, None).unwrap();
    assert_eq!(pred, y);

    let proba = clf.predict_proba(&X, None, None).unwrap();
    let sums = proba.sum_axis(ndarray::Axis(1));
    assert_array_all_close(sums.view(), Array1::ones(12).view(), 1e-10);
}

#[test]
fn centroid_classifier_margin_sign() {
    let X = generate_separable_data(0, 8, 1, 2, 2);
    let y = X.get_labels(None).unwrap();
    let mut clf = CentroidClassifier::new().multiclass(false);
    clf.fit(&X, y.view(), None, None).unwrap();
    let margins = clf.decision_function(&X, None, None).unwrap();
    for (margin, label) in margins.iter().zip(y.iter()) {
        assert_eq!(*margin > 0., *label == 1);
    }
}

#[test]
fn centroid_classifier_refuses_multiclass_when_disabled() {
    let X = generate_separable_data(0, 9, 1, 2, 3);
    let y = X.get_labels(None).unwrap();
    let mut clf = CentroidClassifier::new().multiclass(false);
    assert!(clf.fit(&X, y.view(), None, None).is_err());
    assert!(!clf.accepts_multiclass(0));
    assert!(CentroidClassifier::<f64>::new().accepts_multiclass(0));
}

#[test]
fn centroid_classifier_requires_fit() {
    let X = generate_separable_data(0, 4, 1, 2, 2);
    let clf = CentroidClassifier::<f64>::new();
    match clf.predict(&X, None, None) {
        Err(_) => println!("Good"),
        Ok(_) => panic!("Should return an error but didn't"),
    }
}
