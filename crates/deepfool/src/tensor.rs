//! Flat row-major batch containers.
//!
//! A [`Batch`] holds `N` samples of identical shape; sample `i` occupies
//! `data[i * D..(i + 1) * D]` with `D` the product of the sample shape.
//! [`Logits`] holds the `N x C` class scores a model produces for a batch.

use crate::error::{ensure_len, AttackError, Result};

/// Valid input domain shared by every element of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    /// # Errors
    ///
    /// Returns [`AttackError::InvalidBounds`] if either end is not finite or
    /// `min > max`.
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(AttackError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// The unit interval `[0, 1]`, the usual image domain.
    pub fn unit() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    #[inline]
    pub fn clip(&self, v: f32) -> f32 {
        v.max(self.min).min(self.max)
    }
}

/// `N` samples of a fixed shape stored flat, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    data: Vec<f32>,
    /// Full shape; `shape[0]` is the batch size.
    shape: Vec<usize>,
}

impl Batch {
    /// Wrap `data` with the given full shape (`[N, ...sample dims]`).
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::ShapeMismatch`] if the shape is empty or its
    /// product differs from `data.len()`.
    pub fn new(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        if shape.is_empty() {
            return Err(AttackError::ShapeMismatch {
                what: "batch rank",
                expected: 1,
                got: 0,
            });
        }
        ensure_len("batch", shape.iter().product(), data.len())?;
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    /// Build an `N x D` batch from equally sized rows.
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::ShapeMismatch`] if the rows differ in length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let d = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * d);
        for row in rows {
            ensure_len("batch row", d, row.len())?;
            data.extend_from_slice(row);
        }
        Self::new(data, &[rows.len(), d])
    }

    /// Same shape as `self`, different contents.
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::ShapeMismatch`] if `data` has the wrong length.
    pub fn with_data(&self, data: Vec<f32>) -> Result<Self> {
        ensure_len("batch", self.data.len(), data.len())?;
        Ok(Self {
            data,
            shape: self.shape.clone(),
        })
    }

    /// Number of samples `N`.
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn sample_shape(&self) -> &[usize] {
        &self.shape[1..]
    }

    /// Elements per sample `D`.
    pub fn sample_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn sample(&self, i: usize) -> &[f32] {
        let d = self.sample_len();
        &self.data[i * d..(i + 1) * d]
    }

    pub fn sample_mut(&mut self, i: usize) -> &mut [f32] {
        let d = self.sample_len();
        &mut self.data[i * d..(i + 1) * d]
    }

    pub fn samples(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.len()).map(move |i| self.sample(i))
    }

    /// Clip every element into `bounds` in place.
    pub fn clip(&mut self, bounds: Bounds) {
        for v in &mut self.data {
            *v = bounds.clip(*v);
        }
    }
}

/// Class scores for a batch: `N x C`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Logits {
    data: Vec<f32>,
    classes: usize,
}

impl Logits {
    /// # Errors
    ///
    /// Returns [`AttackError::ShapeMismatch`] if `data.len()` is not a
    /// multiple of `classes` (or `classes` is zero with data present).
    pub fn new(data: Vec<f32>, classes: usize) -> Result<Self> {
        if classes == 0 {
            ensure_len("logits", 0, data.len())?;
        } else if data.len() % classes != 0 {
            return Err(AttackError::ShapeMismatch {
                what: "logits",
                expected: data.len().next_multiple_of(classes),
                got: data.len(),
            });
        }
        Ok(Self { data, classes })
    }

    /// Number of rows `N`.
    pub fn len(&self) -> usize {
        if self.classes == 0 {
            0
        } else {
            self.data.len() / self.classes
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.classes..(i + 1) * self.classes]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Predicted class per row (first maximum on ties).
    pub fn argmax(&self) -> Vec<usize> {
        (0..self.len())
            .map(|i| crate::kernels::ops::argmax(self.row(i)))
            .collect()
    }
}
