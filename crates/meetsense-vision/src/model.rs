//! Mini-Xception emotion classifier implemented with Candle.
//!
//! The network takes a single 48x48 grayscale face and produces softmax
//! probabilities over the seven [`Emotion`](crate::Emotion) classes.
//!
//! Weights are read from a safetensors file with the following layout
//! (`i` is the residual block index, 0..4):
//!
//! | tensor | shape |
//! |---|---|
//! | `entry.conv1.weight` | `(8, 1, 3, 3)` |
//! | `entry.conv2.weight` | `(8, 8, 3, 3)` |
//! | `entry.bn{1,2}.{weight,bias,running_mean,running_var}` | `(8)` |
//! | `blocks.i.shortcut.weight` | `(out, in, 1, 1)` |
//! | `blocks.i.shortcut_bn.*` | `(out)` |
//! | `blocks.i.sep1.depthwise.weight` | `(in, 1, 3, 3)` |
//! | `blocks.i.sep1.pointwise.weight` | `(out, in, 1, 1)` |
//! | `blocks.i.sep2.depthwise.weight` | `(out, 1, 3, 3)` |
//! | `blocks.i.sep2.pointwise.weight` | `(out, out, 1, 1)` |
//! | `blocks.i.bn{1,2}.*` | `(out)` |
//! | `head.weight` / `head.bias` | `(7, 128, 3, 3)` / `(7)` |
//!
//! Convolution kernels use Candle's `(out, in/groups, kh, kw)` layout, so
//! Keras kernels must be transposed when the artifact is exported.

use candle_core::{Device, Module, ModuleT, Result as CandleResult, Tensor, D};
use candle_nn::{
    batch_norm, conv2d, conv2d_no_bias, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig,
    VarBuilder,
};

use crate::classifier::Classifier;
use crate::error::{Result, VisionError};
use crate::labels::Emotion;

/// Spatial size of the model input.
pub const INPUT_SIZE: usize = 48;

/// Expected NHWC input shape.
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE, INPUT_SIZE, 1];

const ENTRY_FILTERS: usize = 8;
const BLOCK_FILTERS: [usize; 4] = [16, 32, 64, 128];
const BN_EPS: f64 = 1e-3;

fn bn(channels: usize, vb: VarBuilder) -> CandleResult<BatchNorm> {
    batch_norm(
        channels,
        BatchNormConfig {
            eps: BN_EPS,
            ..Default::default()
        },
        vb,
    )
}

fn padded(padding: usize) -> Conv2dConfig {
    Conv2dConfig {
        padding,
        ..Default::default()
    }
}

/// Depthwise 3x3 followed by pointwise 1x1, both without bias.
struct SeparableConv {
    depthwise: Conv2d,
    pointwise: Conv2d,
}

impl SeparableConv {
    fn load(in_channels: usize, out_channels: usize, vb: VarBuilder) -> CandleResult<Self> {
        let depthwise = conv2d_no_bias(
            in_channels,
            in_channels,
            3,
            Conv2dConfig {
                padding: 1,
                groups: in_channels,
                ..Default::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d_no_bias(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;
        Ok(Self {
            depthwise,
            pointwise,
        })
    }
}

impl Module for SeparableConv {
    fn forward(&self, x: &Tensor) -> CandleResult<Tensor> {
        x.apply(&self.depthwise)?.apply(&self.pointwise)
    }
}

struct ResidualBlock {
    shortcut: Conv2d,
    shortcut_bn: BatchNorm,
    sep1: SeparableConv,
    bn1: BatchNorm,
    sep2: SeparableConv,
    bn2: BatchNorm,
}

impl ResidualBlock {
    fn load(in_channels: usize, out_channels: usize, vb: VarBuilder) -> CandleResult<Self> {
        Ok(Self {
            shortcut: conv2d_no_bias(
                in_channels,
                out_channels,
                1,
                Conv2dConfig {
                    stride: 2,
                    ..Default::default()
                },
                vb.pp("shortcut"),
            )?,
            shortcut_bn: bn(out_channels, vb.pp("shortcut_bn"))?,
            sep1: SeparableConv::load(in_channels, out_channels, vb.pp("sep1"))?,
            bn1: bn(out_channels, vb.pp("bn1"))?,
            sep2: SeparableConv::load(out_channels, out_channels, vb.pp("sep2"))?,
            bn2: bn(out_channels, vb.pp("bn2"))?,
        })
    }

    fn forward(&self, x: &Tensor) -> CandleResult<Tensor> {
        let residual = x.apply(&self.shortcut)?.apply_t(&self.shortcut_bn, false)?;

        let y = x.apply(&self.sep1)?.apply_t(&self.bn1, false)?.relu()?;
        let y = y.apply(&self.sep2)?.apply_t(&self.bn2, false)?;
        let y = max_pool_same(&y, 3, 2)?;

        y + residual
    }
}

/// Max pooling with TensorFlow "same" padding on an NCHW tensor.
///
/// Edges are replicated rather than filled with -inf; the maximum over a
/// window is the same either way.
fn max_pool_same(x: &Tensor, kernel: usize, stride: usize) -> CandleResult<Tensor> {
    let mut x = x.clone();
    for dim in [2, 3] {
        let size = x.dim(dim)?;
        let out = size.div_ceil(stride);
        let pad = ((out - 1) * stride + kernel).saturating_sub(size);
        let before = pad / 2;
        x = x.pad_with_same(dim, before, pad - before)?;
    }
    x.max_pool2d_with_stride(kernel, stride)
}

/// Mini-Xception network (entry flow, four residual modules, conv head).
pub struct MiniXception {
    conv1: Conv2d,
    bn1: BatchNorm,
    conv2: Conv2d,
    bn2: BatchNorm,
    blocks: Vec<ResidualBlock>,
    head: Conv2d,
    device: Device,
}

impl MiniXception {
    pub fn load(vb: VarBuilder) -> CandleResult<Self> {
        let entry = vb.pp("entry");
        let conv1 = conv2d_no_bias(1, ENTRY_FILTERS, 3, padded(0), entry.pp("conv1"))?;
        let bn1 = bn(ENTRY_FILTERS, entry.pp("bn1"))?;
        let conv2 = conv2d_no_bias(ENTRY_FILTERS, ENTRY_FILTERS, 3, padded(0), entry.pp("conv2"))?;
        let bn2 = bn(ENTRY_FILTERS, entry.pp("bn2"))?;

        let mut blocks = Vec::with_capacity(BLOCK_FILTERS.len());
        let mut in_channels = ENTRY_FILTERS;
        for (i, &out_channels) in BLOCK_FILTERS.iter().enumerate() {
            blocks.push(ResidualBlock::load(
                in_channels,
                out_channels,
                vb.pp("blocks").pp(i.to_string()),
            )?);
            in_channels = out_channels;
        }

        let head = conv2d(in_channels, Emotion::COUNT, 3, padded(1), vb.pp("head"))?;

        Ok(Self {
            conv1,
            bn1,
            conv2,
            bn2,
            blocks,
            head,
            device: vb.device().clone(),
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Forward pass on an NHWC batch; returns `(batch, 7)` probabilities.
    pub fn forward(&self, input: &Tensor) -> CandleResult<Tensor> {
        let x = input.permute((0, 3, 1, 2))?.contiguous()?;

        let x = x.apply(&self.conv1)?.apply_t(&self.bn1, false)?.relu()?;
        let mut x = x.apply(&self.conv2)?.apply_t(&self.bn2, false)?.relu()?;
        for block in &self.blocks {
            x = block.forward(&x)?;
        }

        let logits = x.apply(&self.head)?.mean((2, 3))?;
        candle_nn::ops::softmax(&logits, D::Minus1)
    }
}

impl Classifier for MiniXception {
    fn classify(&self, input: &Tensor) -> Result<Vec<f32>> {
        if input.dims() != INPUT_SHAPE {
            return Err(VisionError::Shape {
                expected: INPUT_SHAPE.to_vec(),
                actual: input.dims().to_vec(),
            });
        }

        let input = input.to_device(&self.device)?;
        let probabilities = self.forward(&input)?.squeeze(0)?;
        Ok(probabilities.to_vec1::<f32>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    fn input(height: usize, width: usize) -> Tensor {
        Tensor::full(0.5f32, (1, height, width, 1), &Device::Cpu).unwrap()
    }

    #[test]
    fn test_zero_weights_give_uniform_distribution() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = MiniXception::load(vb).unwrap();

        let probs = model.classify(&input(48, 48)).unwrap();
        assert_eq!(probs.len(), Emotion::COUNT);
        for p in &probs {
            assert!((p - 1.0 / 7.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_random_weights_are_a_distribution() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = MiniXception::load(vb).unwrap();

        let probs = model.classify(&input(48, 48)).unwrap();
        assert_eq!(probs.len(), Emotion::COUNT);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);

        let again = model.classify(&input(48, 48)).unwrap();
        assert_eq!(probs, again);
    }

    #[test]
    fn test_wrong_size_is_rejected() {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = MiniXception::load(vb).unwrap();

        let err = model.classify(&input(64, 48)).unwrap_err();
        match err {
            VisionError::Shape { expected, actual } => {
                assert_eq!(expected, vec![1, 48, 48, 1]);
                assert_eq!(actual, vec![1, 64, 48, 1]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_max_pool_same_output_sizes() {
        for (size, expected) in [(44, 22), (22, 11), (11, 6), (6, 3)] {
            let x = Tensor::zeros((1, 2, size, size), DType::F32, &Device::Cpu).unwrap();
            let y = max_pool_same(&x, 3, 2).unwrap();
            assert_eq!(y.dims(), &[1, 2, expected, expected]);
        }
    }

    #[test]
    fn test_max_pool_same_keeps_edge_maximum() {
        // 4x4 with the maximum in the bottom-right corner; that pixel only
        // falls inside the padded last window.
        let mut data = vec![0f32; 16];
        data[15] = 9.0;
        let x = Tensor::from_vec(data, (1, 1, 4, 4), &Device::Cpu).unwrap();

        let y = max_pool_same(&x, 3, 2).unwrap();
        assert_eq!(y.dims(), &[1, 1, 2, 2]);
        let values = y.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(values, vec![0.0, 0.0, 0.0, 9.0]);
    }
}
