//! The differentiable classifier the attack consumes.
//!
//! The attack needs three things from a model: its class scores for a batch,
//! the valid input domain, and a way to differentiate a scalar function of
//! those scores w.r.t. the input. The last one is expressed as a
//! vector-Jacobian product: given a cotangent `v` of shape `N x C`,
//! [`Model::vjp`] returns `d(sum(v * logits(x))) / dx`.
//!
//! Two reference models are provided: [`LinearModel`] and [`ReluMlp`].

use crate::error::{ensure_len, AttackError, Result};
use crate::kernels::linear::{linear, linear_input_grad};
use crate::tensor::{Batch, Bounds, Logits};

/// A classifier with a vector-Jacobian product w.r.t. its input.
///
/// Implementations must be pure: repeated calls with the same input return
/// the same scores, and no call mutates model state.
pub trait Model {
    fn num_classes(&self) -> usize;

    fn bounds(&self) -> Bounds;

    /// Class scores for every sample of `x`.
    ///
    /// # Errors
    ///
    /// Implementations report inputs they cannot evaluate, typically as
    /// [`AttackError::ShapeMismatch`].
    fn forward(&self, x: &Batch) -> Result<Logits>;

    /// Gradient of `sum(cotangent * forward(x))` w.r.t. `x`.
    ///
    /// `cotangent` is `N x C`, row-major. The result has the shape of `x`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Model::forward`], plus a cotangent of the wrong
    /// length.
    fn vjp(&self, x: &Batch, cotangent: &[f32]) -> Result<Batch>;
}

impl<M: Model + ?Sized> Model for &M {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }

    fn forward(&self, x: &Batch) -> Result<Logits> {
        (**self).forward(x)
    }

    fn vjp(&self, x: &Batch, cotangent: &[f32]) -> Result<Batch> {
        (**self).vjp(x, cotangent)
    }
}

/// Affine classifier `logits = x W^T + b`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    weight: Vec<f32>,
    bias: Vec<f32>,
    in_features: usize,
    classes: usize,
    bounds: Bounds,
}

impl LinearModel {
    /// `weight` is `classes x in_features`, row-major; `bias` is empty or
    /// has one entry per class.
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::ShapeMismatch`] if the weight or bias lengths
    /// are inconsistent with `in_features`.
    pub fn new(weight: Vec<f32>, bias: Vec<f32>, in_features: usize, bounds: Bounds) -> Result<Self> {
        if in_features == 0 || weight.len() % in_features != 0 {
            return Err(AttackError::ShapeMismatch {
                what: "weight",
                expected: in_features,
                got: weight.len(),
            });
        }
        let classes = weight.len() / in_features;
        if !bias.is_empty() {
            ensure_len("bias", classes, bias.len())?;
        }
        Ok(Self {
            weight,
            bias,
            in_features,
            classes,
            bounds,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }
}

impl Model for LinearModel {
    fn num_classes(&self) -> usize {
        self.classes
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn forward(&self, x: &Batch) -> Result<Logits> {
        ensure_len("input features", self.in_features, x.sample_len())?;
        let n = x.len();
        let mut out = vec![0.0f32; n * self.classes];
        linear(x.data(), &self.weight, &self.bias, n, self.in_features, self.classes, &mut out);
        Logits::new(out, self.classes)
    }

    fn vjp(&self, x: &Batch, cotangent: &[f32]) -> Result<Batch> {
        ensure_len("input features", self.in_features, x.sample_len())?;
        let n = x.len();
        ensure_len("cotangent", n * self.classes, cotangent.len())?;
        let mut grad = vec![0.0f32; n * self.in_features];
        linear_input_grad(cotangent, &self.weight, n, self.in_features, self.classes, &mut grad);
        x.with_data(grad)
    }
}

/// Two-layer perceptron `logits = relu(x W1^T + b1) W2^T + b2`.
#[derive(Debug, Clone)]
pub struct ReluMlp {
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
    in_features: usize,
    hidden: usize,
    classes: usize,
    bounds: Bounds,
}

impl ReluMlp {
    /// Build from a hidden layer (`hidden x in_features`) and an output layer
    /// (`classes x hidden`). Biases may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`AttackError::ShapeMismatch`] on inconsistent layer sizes.
    pub fn new(
        hidden_layer: (Vec<f32>, Vec<f32>),
        output_layer: (Vec<f32>, Vec<f32>),
        in_features: usize,
        bounds: Bounds,
    ) -> Result<Self> {
        let (w1, b1) = hidden_layer;
        let (w2, b2) = output_layer;
        if in_features == 0 || w1.len() % in_features != 0 {
            return Err(AttackError::ShapeMismatch {
                what: "hidden weight",
                expected: in_features,
                got: w1.len(),
            });
        }
        let hidden = w1.len() / in_features;
        if hidden == 0 || w2.len() % hidden != 0 {
            return Err(AttackError::ShapeMismatch {
                what: "output weight",
                expected: hidden,
                got: w2.len(),
            });
        }
        let classes = w2.len() / hidden;
        if !b1.is_empty() {
            ensure_len("hidden bias", hidden, b1.len())?;
        }
        if !b2.is_empty() {
            ensure_len("output bias", classes, b2.len())?;
        }
        Ok(Self {
            w1,
            b1,
            w2,
            b2,
            in_features,
            hidden,
            classes,
            bounds,
        })
    }

    fn hidden_pre_activation(&self, x: &Batch) -> Result<Vec<f32>> {
        ensure_len("input features", self.in_features, x.sample_len())?;
        let mut pre = vec![0.0f32; x.len() * self.hidden];
        linear(x.data(), &self.w1, &self.b1, x.len(), self.in_features, self.hidden, &mut pre);
        Ok(pre)
    }
}

impl Model for ReluMlp {
    fn num_classes(&self) -> usize {
        self.classes
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn forward(&self, x: &Batch) -> Result<Logits> {
        let mut h = self.hidden_pre_activation(x)?;
        for v in &mut h {
            *v = v.max(0.0);
        }
        let mut out = vec![0.0f32; x.len() * self.classes];
        linear(&h, &self.w2, &self.b2, x.len(), self.hidden, self.classes, &mut out);
        Logits::new(out, self.classes)
    }

    fn vjp(&self, x: &Batch, cotangent: &[f32]) -> Result<Batch> {
        let n = x.len();
        ensure_len("cotangent", n * self.classes, cotangent.len())?;
        let pre = self.hidden_pre_activation(x)?;

        let mut grad_h = vec![0.0f32; n * self.hidden];
        linear_input_grad(cotangent, &self.w2, n, self.hidden, self.classes, &mut grad_h);
        // relu'(0) = 0
        for (g, p) in grad_h.iter_mut().zip(&pre) {
            if *p <= 0.0 {
                *g = 0.0;
            }
        }

        let mut grad_x = vec![0.0f32; n * self.in_features];
        linear_input_grad(&grad_h, &self.w1, n, self.in_features, self.hidden, &mut grad_x);
        x.with_data(grad_x)
    }
}
