#[cfg(test)]
mod tests;

/// This module contains index and label manipulation helpers shared by the
/// datasets and the decompositions.
pub mod helpers {
    use crate::Float;
    use ndarray::ArrayView1;

    /// Sorted distinct values of an iterator.
    pub fn unique_sorted<I: IntoIterator<Item = usize>>(values: I) -> Vec<usize> {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Sorted distinct values present in both `a` and `b`.
    pub fn intersect_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
        let b = unique_sorted(b.iter().copied());
        unique_sorted(a.iter().copied())
            .into_iter()
            .filter(|value| b.binary_search(value).is_ok())
            .collect()
    }

    /// Index of the first maximum of a non-empty row. NaN entries never win.
    pub fn first_argmax<F: Float>(row: ArrayView1<F>) -> usize {
        let mut best = 0;
        for (index, &value) in row.iter().enumerate() {
            if value > row[best] || row[best].is_nan() {
                best = index;
            }
        }
        best
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::datasets::{MultiviewDataset, View};
    use crate::error::{MultiviewError, Result};
    use crate::estimators::{check_labels, Capabilities, MultiviewEstimator};
    use crate::helpers::helpers::unique_sorted;
    use crate::Float;
    use approx::AbsDiffEq;
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    pub fn assert_array_all_close<F>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    pub fn assert_array2d_all_close<F>(x: ArrayView2<F>, y: ArrayView2<F>, delta: F)
    where
        F: Float + AbsDiffEq<Epsilon = F>,
    {
        assert_eq!(x.shape(), y.shape());
        for ((i, j), value) in x.indexed_iter() {
            if value.abs_diff_ne(&y[[i, j]], delta) {
                panic!(
                    "x: {}, y: {} ; with precision level {}",
                    value,
                    y[[i, j]],
                    delta
                );
            }
        }
    }

    /// This function draws a dense multiview dataset with integer features in
    /// `[0, 10)` and labels in `[0, n_classes)`, named `ViewN<i>`, the way the
    /// dataset fixtures are built. Label names are the label values.
    pub fn generate_multiview_data(
        seed: u64,
        n_samples: usize,
        n_views: usize,
        n_features: usize,
        n_classes: usize,
    ) -> MultiviewDataset<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let views = (0..n_views)
            .map(|v| {
                let data = Array2::from_shape_simple_fn((n_samples, n_features), || {
                    rng.gen_range(0..10) as f64
                });
                View::dense(format!("ViewN{}", v), data).unwrap()
            })
            .collect::<Vec<_>>();
        let labels = (0..n_samples)
            .map(|_| rng.gen_range(0..n_classes))
            .collect::<Array1<usize>>();
        let label_names = (0..n_classes).map(|label| label.to_string()).collect();
        MultiviewDataset::new(views, labels, label_names)
            .unwrap()
            .with_name("test")
    }

    /// This function draws a dataset whose classes are well separated: every
    /// feature of a sample of class `c` is `10 * c` plus a uniform jitter in
    /// `[0, 1)`. Samples cycle through the classes.
    pub fn generate_separable_data(
        seed: u64,
        n_samples: usize,
        n_views: usize,
        n_features: usize,
        n_classes: usize,
    ) -> MultiviewDataset<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let labels = (0..n_samples)
            .map(|i| i % n_classes)
            .collect::<Array1<usize>>();
        let views = (0..n_views)
            .map(|v| {
                let data = Array2::from_shape_fn((n_samples, n_features), |(i, _)| {
                    10. * labels[i] as f64 + rng.gen::<f64>()
                });
                View::dense(format!("ViewN{}", v), data).unwrap()
            })
            .collect::<Vec<_>>();
        let label_names = (0..n_classes).map(|label| label.to_string()).collect();
        MultiviewDataset::new(views, labels, label_names)
            .unwrap()
            .with_name("separable")
    }

    /// Nearest centroid classifier over the horizontally stacked views.
    ///
    /// Its capability flags are configurable so that every decomposition path
    /// can be exercised. The margin is `||x - c_0||^2 - ||x - c_1||^2` for a
    /// binary problem; probabilities are a softmax of the negated squared
    /// distances.
    #[derive(Debug, Clone)]
    pub struct CentroidClassifier<F> {
        capabilities: Capabilities,
        classes: Vec<usize>,
        centroids: Option<Array2<F>>,
    }

    impl<F: Float> Default for CentroidClassifier<F> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<F: Float> CentroidClassifier<F> {
        /// Margin, probability and multiclass capable.
        pub fn new() -> Self {
            CentroidClassifier {
                capabilities: Capabilities {
                    margin: true,
                    probability: true,
                    multiclass: true,
                    pairwise: false,
                    regressor: false,
                },
                classes: Vec::new(),
                centroids: None,
            }
        }

        pub fn margin(mut self, margin: bool) -> Self {
            self.capabilities.margin = margin;
            self
        }

        pub fn probability(mut self, probability: bool) -> Self {
            self.capabilities.probability = probability;
            self
        }

        pub fn multiclass(mut self, multiclass: bool) -> Self {
            self.capabilities.multiclass = multiclass;
            self
        }

        pub fn pairwise(mut self, pairwise: bool) -> Self {
            self.capabilities.pairwise = pairwise;
            self
        }

        pub fn classes(&self) -> &[usize] {
            &self.classes
        }

        fn squared_distances(
            &self,
            X: &MultiviewDataset<F>,
            sample_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<Array2<F>> {
            let centroids = self
                .centroids
                .as_ref()
                .ok_or(MultiviewError::NotFitted("CentroidClassifier"))?;
            let (stacked, _) = X.to_concatenated_array(sample_indices, view_indices)?;
            if stacked.ncols() != centroids.ncols() {
                return Err(MultiviewError::ShapeMismatch {
                    what: "stacked features",
                    expected: centroids.ncols(),
                    found: stacked.ncols(),
                });
            }
            Ok(Array2::from_shape_fn(
                (stacked.nrows(), centroids.nrows()),
                |(i, k)| {
                    stacked
                        .row(i)
                        .iter()
                        .zip(centroids.row(k).iter())
                        .map(|(&x, &c)| (x - c) * (x - c))
                        .sum()
                },
            ))
        }
    }

    impl<F: Float> MultiviewEstimator<F> for CentroidClassifier<F> {
        fn name(&self) -> String {
            "centroid".to_string()
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn fit(
            &mut self,
            X: &MultiviewDataset<F>,
            y: ArrayView1<usize>,
            train_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<()> {
            check_labels(X, y)?;
            let (train_indices, view_indices) = X.resolve_indices(train_indices, view_indices)?;
            let classes = unique_sorted(train_indices.iter().map(|&i| y[i]));
            if classes.is_empty() {
                return Err(MultiviewError::Configuration(
                    "cannot fit on an empty training set".to_string(),
                ));
            }
            if classes.len() > 2 && !self.capabilities.multiclass {
                return Err(MultiviewError::Configuration(format!(
                    "{} only handles binary problems, got {} classes",
                    MultiviewEstimator::<F>::name(self),
                    classes.len()
                )));
            }

            let (stacked, _) = X.to_concatenated_array(Some(&train_indices), Some(&view_indices))?;
            let mut centroids = Array2::<F>::zeros((classes.len(), stacked.ncols()));
            for (k, &class) in classes.iter().enumerate() {
                let rows = train_indices
                    .iter()
                    .enumerate()
                    .filter(|&(_, &i)| y[i] == class)
                    .map(|(row, _)| row)
                    .collect::<Vec<_>>();
                let members = stacked.select(Axis(0), &rows);
                let count = F::cast(rows.len());
                let mut centroid = centroids.row_mut(k);
                for member in members.rows() {
                    centroid += &member;
                }
                centroid /= count;
            }
            self.classes = classes;
            self.centroids = Some(centroids);
            Ok(())
        }

        fn predict(
            &self,
            X: &MultiviewDataset<F>,
            sample_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<Array1<usize>> {
            let distances = self.squared_distances(X, sample_indices, view_indices)?;
            Ok(distances
                .rows()
                .into_iter()
                .map(|row| {
                    let negated = row.mapv(|d| -d);
                    self.classes[super::helpers::first_argmax(negated.view())]
                })
                .collect())
        }

        fn decision_function(
            &self,
            X: &MultiviewDataset<F>,
            sample_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<Array1<F>> {
            if !self.capabilities.margin {
                return Err(MultiviewError::Capability {
                    estimator: MultiviewEstimator::<F>::name(self),
                    method: "decision_function",
                });
            }
            let distances = self.squared_distances(X, sample_indices, view_indices)?;
            match self.classes.len() {
                1 => {
                    let sign = if self.classes[0] == 1 { F::one() } else { -F::one() };
                    Ok(Array1::from_elem(distances.nrows(), sign))
                }
                2 => Ok(distances
                    .rows()
                    .into_iter()
                    .map(|row| row[0] - row[1])
                    .collect()),
                n_classes => Err(MultiviewError::Configuration(format!(
                    "a margin is only defined for binary problems, got {} classes",
                    n_classes
                ))),
            }
        }

        fn predict_proba(
            &self,
            X: &MultiviewDataset<F>,
            sample_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<Array2<F>> {
            if !self.capabilities.probability {
                return Err(MultiviewError::Capability {
                    estimator: MultiviewEstimator::<F>::name(self),
                    method: "predict_proba",
                });
            }
            let distances = self.squared_distances(X, sample_indices, view_indices)?;
            if self.classes.len() == 1 {
                let positive = if self.classes[0] == 1 { 1 } else { 0 };
                return Ok(Array2::from_shape_fn((distances.nrows(), 2), |(_, k)| {
                    if k == positive {
                        F::one()
                    } else {
                        F::zero()
                    }
                }));
            }
            let mut proba = distances.mapv(|d| -d);
            for mut row in proba.rows_mut() {
                let max = row.fold(F::neg_infinity(), |acc, &v| acc.max(v));
                row.mapv_inplace(|v| (v - max).exp());
                let total = row.sum();
                row /= total;
            }
            Ok(proba)
        }
    }

    /// Estimator returning the same margin for every sample. It fits on
    /// anything and is used to pin down tie-breaking rules.
    #[derive(Debug, Clone)]
    pub struct ConstantMargin<F> {
        margin: F,
        fitted: bool,
    }

    impl<F: Float> ConstantMargin<F> {
        pub fn new(margin: F) -> Self {
            ConstantMargin {
                margin,
                fitted: false,
            }
        }
    }

    impl<F: Float> MultiviewEstimator<F> for ConstantMargin<F> {
        fn name(&self) -> String {
            "constant_margin".to_string()
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                margin: true,
                ..Capabilities::default()
            }
        }

        fn fit(
            &mut self,
            X: &MultiviewDataset<F>,
            y: ArrayView1<usize>,
            train_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<()> {
            check_labels(X, y)?;
            X.resolve_indices(train_indices, view_indices)?;
            self.fitted = true;
            Ok(())
        }

        fn predict(
            &self,
            X: &MultiviewDataset<F>,
            sample_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<Array1<usize>> {
            let margins = self.decision_function(X, sample_indices, view_indices)?;
            Ok(margins.mapv(|m| (m > F::zero()) as usize))
        }

        fn decision_function(
            &self,
            X: &MultiviewDataset<F>,
            sample_indices: Option<&[usize]>,
            view_indices: Option<&[usize]>,
        ) -> Result<Array1<F>> {
            if !self.fitted {
                return Err(MultiviewError::NotFitted("ConstantMargin"));
            }
            let (sample_indices, _) = X.resolve_indices(sample_indices, view_indices)?;
            Ok(Array1::from_elem(sample_indices.len(), self.margin))
        }
    }
}
