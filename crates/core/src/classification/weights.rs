use std::fs;
use std::io::Write;
use std::path::Path;

use ndarray::{Array1, Array2, Array4};
use thiserror::Error;

use crate::classification::network::{Conv2d, Dense, EmotionNet, FLATTENED_FEATURES, HIDDEN_UNITS};
use crate::shared::emotion::EmotionLabel;

/// Weight artifact magic bytes; bump the digit on layout changes.
const MAGIC: &[u8; 4] = b"EMO1";

/// Parameterized layer shapes in network order: (kernel/weight dims, bias len).
/// Dropout layers carry no parameters and do not appear in the artifact.
const LAYOUT: &[(&[usize], usize)] = &[
    (&[32, 1, 3, 3], 32),
    (&[64, 32, 3, 3], 64),
    (&[128, 64, 3, 3], 128),
    (&[128, 128, 3, 3], 128),
    (&[FLATTENED_FEATURES, HIDDEN_UNITS], HIDDEN_UNITS),
    (&[HIDDEN_UNITS, EmotionLabel::COUNT], EmotionLabel::COUNT),
];

#[derive(Debug, Error)]
pub enum WeightError {
    #[error("weight I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an emotion weight artifact (bad magic)")]
    BadMagic,
    #[error("weight artifact has {actual} bytes, expected {expected}")]
    Size { expected: usize, actual: usize },
}

fn total_parameters() -> usize {
    LAYOUT
        .iter()
        .map(|(dims, bias)| dims.iter().product::<usize>() + bias)
        .sum()
}

/// Load a serialized network from `path`.
///
/// The format is `EMO1` followed by every parameter tensor in network order
/// as little-endian f32. Shapes are implied by the fixed architecture;
/// anything that does not match exactly is rejected.
pub fn load(path: &Path) -> Result<EmotionNet, WeightError> {
    let bytes = fs::read(path)?;
    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(WeightError::BadMagic);
    }

    let expected = MAGIC.len() + total_parameters() * 4;
    if bytes.len() != expected {
        return Err(WeightError::Size {
            expected,
            actual: bytes.len(),
        });
    }

    let mut values = bytes[MAGIC.len()..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
    let mut take = |n: usize| -> Vec<f32> { values.by_ref().take(n).collect() };

    let mut conv = |dims: &[usize; 4]| -> Conv2d {
        let count: usize = dims.iter().product();
        let kernel = Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), take(count))
            .expect("layout table and shape agree");
        let bias = Array1::from_vec(take(dims[0]));
        Conv2d { kernel, bias }
    };

    let conv1 = conv(&[32, 1, 3, 3]);
    let conv2 = conv(&[64, 32, 3, 3]);
    let conv3 = conv(&[128, 64, 3, 3]);
    let conv4 = conv(&[128, 128, 3, 3]);

    let mut dense = |in_dim: usize, out_dim: usize| -> Dense {
        let weight = Array2::from_shape_vec((in_dim, out_dim), take(in_dim * out_dim))
            .expect("layout table and shape agree");
        let bias = Array1::from_vec(take(out_dim));
        Dense { weight, bias }
    };

    let dense1 = dense(FLATTENED_FEATURES, HIDDEN_UNITS);
    let dense2 = dense(HIDDEN_UNITS, EmotionLabel::COUNT);

    Ok(EmotionNet {
        conv1,
        conv2,
        conv3,
        conv4,
        dense1,
        dense2,
    })
}

/// Serialize a network to `path` in the `EMO1` format.
pub fn save(net: &EmotionNet, path: &Path) -> Result<(), WeightError> {
    let mut out = Vec::with_capacity(MAGIC.len() + total_parameters() * 4);
    out.extend_from_slice(MAGIC);

    let mut push = |values: &mut dyn Iterator<Item = f32>| {
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
    };

    push(&mut net.conv1.kernel.iter().copied());
    push(&mut net.conv1.bias.iter().copied());
    push(&mut net.conv2.kernel.iter().copied());
    push(&mut net.conv2.bias.iter().copied());
    push(&mut net.conv3.kernel.iter().copied());
    push(&mut net.conv3.bias.iter().copied());
    push(&mut net.conv4.kernel.iter().copied());
    push(&mut net.conv4.bias.iter().copied());
    push(&mut net.dense1.weight.iter().copied());
    push(&mut net.dense1.bias.iter().copied());
    push(&mut net.dense2.weight.iter().copied());
    push(&mut net.dense2.bias.iter().copied());

    let mut file = fs::File::create(path)?;
    file.write_all(&out)?;
    file.flush()?;
    Ok(())
}
