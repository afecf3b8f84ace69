//! Signature regression network.
//!
//! A flat signature row is folded into pairs of adjacent features (two
//! channels), pushed through two 1-D convolutions, then widened through two
//! dense layers before projecting onto the target signature width. Every
//! layer is initialized to ones, which makes construction fully
//! deterministic: training runs are reproducible without seeding the
//! parameter store.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Initializer, Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use crate::error::Error;

#[derive(Config, Debug)]
pub struct SignatureNetConfig {
    /// Width of an input signature row. Must be even: rows are folded into
    /// `num_features / 2` steps of two channels.
    pub num_features: usize,
    /// Width of a target signature row.
    pub num_outputs: usize,
    #[config(default = 4)]
    pub conv1_kernel: usize,
    #[config(default = 2)]
    pub conv1_stride: usize,
    #[config(default = 2)]
    pub conv2_kernel: usize,
}

#[derive(Module, Debug)]
pub struct SignatureNet<B: Backend> {
    conv1: Conv1d<B>,
    conv2: Conv1d<B>,
    dense1: Linear<B>,
    dense2: Linear<B>,
    output: Linear<B>,
    activation: Relu,
    num_features: usize,
    pairs: usize,
}

/// Layer widths derived from the configuration, after kernel clamping.
struct TopologyPlan {
    pairs: usize,
    conv1_kernel: usize,
    conv2_kernel: usize,
    conv2_steps: usize,
}

impl SignatureNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> crate::error::Result<SignatureNet<B>> {
        let plan = self.plan()?;
        let ones = Initializer::Ones;

        let conv1 = Conv1dConfig::new(2, plan.pairs, plan.conv1_kernel)
            .with_stride(self.conv1_stride)
            .with_initializer(ones.clone())
            .init(device);
        let conv2 = Conv1dConfig::new(plan.pairs, plan.pairs, plan.conv2_kernel)
            .with_initializer(ones.clone())
            .init(device);

        let flat = plan.pairs * plan.conv2_steps;
        let dense1 = LinearConfig::new(flat, self.num_features * 4)
            .with_initializer(ones.clone())
            .init(device);
        let dense2 = LinearConfig::new(self.num_features * 4, self.num_features * 2)
            .with_initializer(ones.clone())
            .init(device);
        let output = LinearConfig::new(self.num_features * 2, self.num_outputs)
            .with_initializer(ones)
            .init(device);

        Ok(SignatureNet {
            conv1,
            conv2,
            dense1,
            dense2,
            output,
            activation: Relu::new(),
            num_features: self.num_features,
            pairs: plan.pairs,
        })
    }

    fn plan(&self) -> crate::error::Result<TopologyPlan> {
        if self.num_features < 2 || self.num_features % 2 != 0 {
            return Err(Error::Shape(format!(
                "signature width must be a positive even number, got {}",
                self.num_features
            )));
        }
        if self.num_outputs == 0 {
            return Err(Error::Shape("the network needs at least one output".into()));
        }
        if self.conv1_kernel == 0 || self.conv2_kernel == 0 || self.conv1_stride == 0 {
            return Err(Error::Shape(
                "convolution kernels and stride must be at least 1".into(),
            ));
        }

        let pairs = self.num_features / 2;
        // Short signatures get kernels clamped to the steps actually
        // available, keeping the stack usable down to num_features == 2.
        let conv1_kernel = self.conv1_kernel.min(pairs);
        let conv1_steps = (pairs - conv1_kernel) / self.conv1_stride + 1;
        let conv2_kernel = self.conv2_kernel.min(conv1_steps);
        let conv2_steps = conv1_steps - conv2_kernel + 1;
        if conv1_kernel < self.conv1_kernel || conv2_kernel < self.conv2_kernel {
            log::warn!(
                "clamped convolution kernels to {conv1_kernel}/{conv2_kernel} \
                 for a {}-wide signature",
                self.num_features
            );
        }

        Ok(TopologyPlan {
            pairs,
            conv1_kernel,
            conv2_kernel,
            conv2_steps,
        })
    }
}

impl<B: Backend> SignatureNet<B> {
    /// Maps a batch of signature rows `[batch, num_features]` to predicted
    /// target rows `[batch, num_outputs]`.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = input.dims();
        // [batch, features] -> [batch, 2, pairs]: adjacent features become
        // the two channels of one step.
        let x = input.reshape([batch, self.pairs, 2]).swap_dims(1, 2);
        let x = self.conv2.forward(self.conv1.forward(x));
        let x: Tensor<B, 2> = x.flatten(1, 2);
        let x = self.dense1.forward(x);
        let x = self.activation.forward(self.dense2.forward(x));
        self.output.forward(x)
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}
