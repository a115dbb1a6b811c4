use ndarray::{Array1, Array2, Array3, Array4};
use rand::Rng;

use crate::shared::constants::CLASSIFIER_INPUT_SIZE;
use crate::shared::emotion::EmotionLabel;

/// Flattened feature count entering the first dense layer: 128 channels of
/// 4x4 maps after the third pooling stage.
pub const FLATTENED_FEATURES: usize = 128 * 4 * 4;

/// Width of the hidden dense layer.
pub const HIDDEN_UNITS: usize = 1024;

/// A 2D convolution layer with 3x3 kernels, valid padding, stride 1.
///
/// Kernel layout is `(out_channels, in_channels, ky, kx)`.
pub(crate) struct Conv2d {
    pub(crate) kernel: Array4<f32>,
    pub(crate) bias: Array1<f32>,
}

impl Conv2d {
    fn random(out_c: usize, in_c: usize, k: usize, rng: &mut impl Rng) -> Self {
        // Glorot uniform, the Keras Conv2D default
        let limit = (6.0 / ((in_c + out_c) * k * k) as f32).sqrt();
        let kernel =
            Array4::from_shape_fn((out_c, in_c, k, k), |_| rng.gen_range(-limit..limit));
        let bias = Array1::zeros(out_c);
        Self { kernel, bias }
    }

    /// Valid convolution: `(in_c, h, w)` -> `(out_c, h-k+1, w-k+1)`.
    fn forward(&self, input: &Array3<f32>) -> Array3<f32> {
        let (out_c, in_c, k, _) = self.kernel.dim();
        let (c, h, w) = input.dim();
        debug_assert_eq!(c, in_c, "input channel count must match kernel");
        let out_h = h - k + 1;
        let out_w = w - k + 1;

        let mut out = Array3::<f32>::zeros((out_c, out_h, out_w));
        for o in 0..out_c {
            for y in 0..out_h {
                for x in 0..out_w {
                    let mut acc = self.bias[o];
                    for i in 0..in_c {
                        for ky in 0..k {
                            for kx in 0..k {
                                acc += self.kernel[[o, i, ky, kx]] * input[[i, y + ky, x + kx]];
                            }
                        }
                    }
                    out[[o, y, x]] = acc;
                }
            }
        }
        out
    }
}

/// A fully connected layer; weight layout is `(in, out)`.
pub(crate) struct Dense {
    pub(crate) weight: Array2<f32>,
    pub(crate) bias: Array1<f32>,
}

impl Dense {
    fn random(in_dim: usize, out_dim: usize, rng: &mut impl Rng) -> Self {
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let weight = Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-limit..limit));
        let bias = Array1::zeros(out_dim);
        Self { weight, bias }
    }

    fn forward(&self, input: &Array1<f32>) -> Array1<f32> {
        input.dot(&self.weight) + &self.bias
    }
}

/// The emotion CNN: conv(32) → conv(64) → pool → conv(128) → pool →
/// conv(128) → pool → dense(1024) → dense(7, softmax).
///
/// Layer order, filter counts, and dense sizes are fixed for weight
/// compatibility; the dropout layers of the training-time architecture are
/// identity at inference and carry no parameters. Weights are immutable
/// after construction, so a shared instance is safe to use from concurrent
/// inference calls.
pub struct EmotionNet {
    pub(crate) conv1: Conv2d,
    pub(crate) conv2: Conv2d,
    pub(crate) conv3: Conv2d,
    pub(crate) conv4: Conv2d,
    pub(crate) dense1: Dense,
    pub(crate) dense2: Dense,
}

impl EmotionNet {
    /// Build the network with Glorot-uniform random parameters.
    ///
    /// Inference on a random network is statistically meaningless but always
    /// well-formed; the classifier relies on that for its weight-load
    /// fallback.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            conv1: Conv2d::random(32, 1, 3, rng),
            conv2: Conv2d::random(64, 32, 3, rng),
            conv3: Conv2d::random(128, 64, 3, rng),
            conv4: Conv2d::random(128, 128, 3, rng),
            dense1: Dense::random(FLATTENED_FEATURES, HIDDEN_UNITS, rng),
            dense2: Dense::random(HIDDEN_UNITS, EmotionLabel::COUNT, rng),
        }
    }

    /// Forward pass: 48x48 normalized grayscale in, 7-way probability
    /// distribution out (aligned to [`EmotionLabel::ALL`]).
    ///
    /// The shape contract is guaranteed upstream by the preprocessor; a
    /// violation here is a programming error, not a recoverable condition.
    pub fn forward(&self, face: &Array2<f32>) -> [f32; EmotionLabel::COUNT] {
        assert_eq!(
            face.dim(),
            (CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE),
            "classifier input must be 48x48"
        );

        // (1, 48, 48)
        let input = face
            .to_owned()
            .insert_axis(ndarray::Axis(0));

        let x = relu(self.conv1.forward(&input)); // 32 x 46 x 46
        let x = relu(self.conv2.forward(&x)); // 64 x 44 x 44
        let x = max_pool2(&x); // 64 x 22 x 22
        let x = relu(self.conv3.forward(&x)); // 128 x 20 x 20
        let x = max_pool2(&x); // 128 x 10 x 10
        let x = relu(self.conv4.forward(&x)); // 128 x 8 x 8
        let x = max_pool2(&x); // 128 x 4 x 4

        let flat = Array1::from_iter(x.iter().copied());
        debug_assert_eq!(flat.len(), FLATTENED_FEATURES);

        let hidden = self.dense1.forward(&flat).mapv(|v| v.max(0.0));
        let logits = self.dense2.forward(&hidden);
        softmax(&logits)
    }
}

fn relu(mut x: Array3<f32>) -> Array3<f32> {
    x.mapv_inplace(|v| v.max(0.0));
    x
}

/// 2x2 max pooling, stride 2, floor on odd sizes.
fn max_pool2(input: &Array3<f32>) -> Array3<f32> {
    let (c, h, w) = input.dim();
    let out_h = h / 2;
    let out_w = w / 2;
    Array3::from_shape_fn((c, out_h, out_w), |(ch, y, x)| {
        let a = input[[ch, 2 * y, 2 * x]];
        let b = input[[ch, 2 * y, 2 * x + 1]];
        let d = input[[ch, 2 * y + 1, 2 * x]];
        let e = input[[ch, 2 * y + 1, 2 * x + 1]];
        a.max(b).max(d).max(e)
    })
}

/// Numerically stable softmax over the class logits.
fn softmax(logits: &Array1<f32>) -> [f32; EmotionLabel::COUNT] {
    debug_assert_eq!(logits.len(), EmotionLabel::COUNT);
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut out = [0.0f32; EmotionLabel::COUNT];
    let mut sum = 0.0f32;
    for (i, &l) in logits.iter().enumerate() {
        let e = (l - max).exp();
        out[i] = e;
        sum += e;
    }
    for v in &mut out {
        *v /= sum;
    }
    out
}
