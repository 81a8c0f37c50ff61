use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use ndarray::{Array1, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::{check_bounds, store, MultiviewDataset, View};
use crate::error::{IndexKind, MultiviewError, Result};
use crate::helpers::helpers::unique_sorted;
use crate::Float;

/// This implementation block provides the operations producing a new dataset
/// out of an existing one (filtering, label and view selection, column
/// restriction) and the view-level mutations.
impl<F: Float> MultiviewDataset<F> {
    /// This method produces a new dataset retaining only the selected samples
    /// and views.
    ///
    /// Labels are remapped so that value `k` stands for `label_names[k]`:
    /// - when `labels` is given, it must hold one label per selected sample,
    ///   already expressed in that range;
    /// - otherwise each kept sample is relabeled by looking its label name up
    ///   in `label_names`.
    ///
    /// Without `label_names`, the names of the labels present among the kept
    /// samples are used, in label order. Without `view_names`, every view is
    /// kept. When `destination` is set, the result is also written there as
    /// `<name>_temp_filter`.
    pub fn filter(
        &self,
        labels: Option<&[usize]>,
        label_names: Option<&[String]>,
        sample_indices: &[usize],
        view_names: Option<&[String]>,
        destination: Option<&Path>,
    ) -> Result<Self>
    where
        F: Serialize,
    {
        check_bounds(sample_indices, IndexKind::Sample, self.get_nb_samples())?;
        let view_indices = match view_names {
            Some(names) => names
                .iter()
                .map(|name| self.view_index(name))
                .collect::<Result<Vec<_>>>()?,
            None => (0..self.get_nb_view()).collect(),
        };
        let label_names = match label_names {
            Some(names) => names.to_vec(),
            None => self.get_label_names(Some(sample_indices))?,
        };

        let labels = match labels {
            Some(labels) => {
                if labels.len() != sample_indices.len() {
                    return Err(MultiviewError::ShapeMismatch {
                        what: "filtered labels",
                        expected: sample_indices.len(),
                        found: labels.len(),
                    });
                }
                check_bounds(labels, IndexKind::Label, label_names.len())?;
                Array1::from(labels.to_vec())
            }
            None => sample_indices
                .iter()
                .map(|&i| {
                    let name = &self.label_names[self.labels[i]];
                    label_names
                        .iter()
                        .position(|candidate| candidate == name)
                        .ok_or_else(|| MultiviewError::UnknownLabel(name.clone()))
                })
                .collect::<Result<Array1<_>>>()?,
        };

        let views = view_indices
            .iter()
            .map(|&v| {
                let view = &self.views[v];
                view.with_data(view.data.select_rows(sample_indices), view.limits.clone())
            })
            .collect();
        let sample_ids = sample_indices
            .iter()
            .map(|&i| self.sample_ids[i].clone())
            .collect();

        let filtered = MultiviewDataset {
            name: self.name.clone(),
            views,
            labels,
            label_names,
            sample_ids,
        };
        filtered.validate()?;
        info!(
            "filtered dataset {} down to {} samples, {} views and {} labels",
            self.artifact_stem(),
            filtered.get_nb_samples(),
            filtered.get_nb_view(),
            filtered.label_names.len()
        );

        if let Some(destination) = destination {
            store::save(&filtered, destination, &format!("{}_temp_filter", self.artifact_stem()))?;
        }
        Ok(filtered)
    }

    /// This method completes, trims or draws a selection of label names so
    /// that it holds `nb_labels` names:
    /// - nothing selected: `nb_labels` names are drawn without replacement;
    /// - too few selected: the selection is completed with unselected names;
    /// - too many selected: `nb_labels` of them are drawn.
    ///
    /// With neither a selection nor a count, every label name is returned.
    pub fn check_selected_label_names<R: Rng + ?Sized>(
        &self,
        nb_labels: Option<usize>,
        selected_label_names: Option<&[String]>,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        if let Some(selected) = selected_label_names {
            for name in selected {
                if !self.label_names.contains(name) {
                    return Err(MultiviewError::UnknownLabel(name.clone()));
                }
            }
        }

        match (selected_label_names, nb_labels) {
            (None, None) => Ok(self.label_names.clone()),
            (Some(selected), None) => Ok(selected.to_vec()),
            (selected, Some(nb_labels)) => {
                let mut selected = selected.map(<[String]>::to_vec).unwrap_or_default();
                if selected.len() > nb_labels {
                    return Ok(selected.choose_multiple(rng, nb_labels).cloned().collect());
                }
                let candidates = self
                    .label_names
                    .iter()
                    .filter(|name| !selected.contains(*name))
                    .cloned()
                    .collect::<Vec<_>>();
                let nb_to_add = nb_labels - selected.len();
                if nb_to_add > candidates.len() {
                    return Err(MultiviewError::Configuration(format!(
                        "cannot select {} labels out of {}",
                        nb_labels,
                        self.label_names.len()
                    )));
                }
                selected.extend(candidates.choose_multiple(rng, nb_to_add).cloned());
                Ok(selected)
            }
        }
    }

    /// This method selects the samples carrying one of the given labels.
    ///
    /// It returns the labels of those samples remapped to the position of their
    /// name in the selection, the selection itself, and the sample indices.
    pub fn select_labels(
        &self,
        selected_label_names: &[String],
    ) -> Result<(Array1<usize>, Vec<String>, Vec<usize>)> {
        let selected_labels = selected_label_names
            .iter()
            .map(|name| {
                self.label_names
                    .iter()
                    .position(|candidate| candidate == name)
                    .ok_or_else(|| MultiviewError::UnknownLabel(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut labels = Vec::new();
        let mut sample_indices = Vec::new();
        for (index, label) in self.labels.iter().enumerate() {
            if let Some(position) = selected_labels.iter().position(|selected| selected == label) {
                labels.push(position);
                sample_indices.push(index);
            }
        }
        Ok((
            Array1::from(labels),
            selected_label_names.to_vec(),
            sample_indices,
        ))
    }

    /// This method subsamples labels (see
    /// [`MultiviewDataset::check_selected_label_names`]) and views, then
    /// filters the dataset accordingly. It returns the filtered dataset along
    /// with its label-index to label-name mapping.
    ///
    /// When no selector is given, the dataset is returned unchanged.
    pub fn select_views_and_labels<R: Rng + ?Sized>(
        &self,
        nb_labels: Option<usize>,
        selected_label_names: Option<&[String]>,
        rng: &mut R,
        view_names: Option<&[String]>,
        destination: Option<&Path>,
    ) -> Result<(Self, BTreeMap<usize, String>)>
    where
        F: Serialize,
    {
        let selected = if view_names.is_none() && selected_label_names.is_none() && nb_labels.is_none() {
            self.clone()
        } else {
            let names = self.check_selected_label_names(nb_labels, selected_label_names, rng)?;
            let (labels, label_names, sample_indices) = self.select_labels(&names)?;
            let labels = labels.to_vec();
            self.filter(
                Some(&labels),
                Some(&label_names),
                &sample_indices,
                view_names,
                destination,
            )?
        };
        let dictionary = selected
            .label_names
            .iter()
            .cloned()
            .enumerate()
            .collect();
        Ok((selected, dictionary))
    }

    /// This method returns a copy of the dataset whose views only keep the
    /// given columns. It is used to restrict precomputed kernel (Gram) views to
    /// the training samples of a pair-specific model.
    pub fn select_features(&self, columns: &[usize]) -> Result<Self> {
        let columns = unique_sorted(columns.iter().copied());
        let mut views = Vec::with_capacity(self.views.len());
        for view in self.views.iter() {
            check_bounds(&columns, IndexKind::Feature, view.data.ncols())?;
            views.push(view.with_data(
                view.data.select_columns(&columns),
                view.limits.select(Axis(0), &columns),
            ));
        }
        Ok(MultiviewDataset {
            views,
            ..self.clone()
        })
    }

    /// This method duplicates the view named `source_view_name` into `target`
    /// at `target_view_index`. An existing view at that index is replaced; an
    /// index equal to the number of views of `target` appends the view.
    pub fn copy_view(
        &self,
        target: &mut MultiviewDataset<F>,
        source_view_name: &str,
        target_view_index: usize,
    ) -> Result<()> {
        let view = self.views[self.view_index(source_view_name)?].clone();
        target.set_view(target_view_index, view)
    }

    /// This method appends a view and returns its index.
    pub fn add_view(&mut self, view: View<F>) -> Result<usize> {
        let index = self.views.len();
        self.set_view(index, view)?;
        Ok(index)
    }

    /// This method removes a view; the following views are renumbered.
    pub fn remove_view(&mut self, view_index: usize) -> Result<View<F>> {
        self.view(view_index)?;
        Ok(self.views.remove(view_index))
    }

    fn set_view(&mut self, view_index: usize, view: View<F>) -> Result<()> {
        if view_index > self.views.len() {
            return Err(MultiviewError::out_of_range(
                IndexKind::View,
                view_index,
                self.views.len() + 1,
            ));
        }
        if view.data.nrows() != self.get_nb_samples() {
            return Err(MultiviewError::ShapeMismatch {
                what: "view rows",
                expected: self.get_nb_samples(),
                found: view.data.nrows(),
            });
        }
        let clashes = self
            .views
            .iter()
            .enumerate()
            .any(|(index, other)| index != view_index && other.name == view.name);
        if clashes {
            return Err(MultiviewError::Configuration(format!(
                "duplicated view name {:?}",
                view.name
            )));
        }
        if view_index == self.views.len() {
            self.views.push(view);
        } else {
            self.views[view_index] = view;
        }
        Ok(())
    }

    pub(crate) fn artifact_stem(&self) -> &str {
        self.name.as_deref().unwrap_or("dataset")
    }
}

impl<F: Float> View<F> {
    /// This method returns a copy of the view under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        View {
            name: name.into(),
            ..self.clone()
        }
    }
}
