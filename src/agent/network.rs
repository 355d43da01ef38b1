//! Q-network: a two-layer perceptron mapping a state vector to one value per action.
//!
//! Layout is `STATE_SIZE → hidden (ReLU) → ACTION_COUNT`. Forward and backward
//! passes are batched matrix products, so a singleton batch (the per-tick
//! update) and a 1000-transition batch (the end-of-episode update) go through
//! the same code.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::encoder::{StateVector, STATE_SIZE};
use super::memory::Transition;
use crate::config::OptimizerKind;
use crate::error::{Error, Result};
use crate::game::ACTION_COUNT;

pub type ActionValues = [f32; ACTION_COUNT];

const ADAM_BETA1: f32 = 0.9;
const ADAM_BETA2: f32 = 0.999;
const ADAM_EPSILON: f32 = 1e-8;

/// Largest checkpoint file `load_checkpoint` will decode
const MAX_CHECKPOINT_BYTES: u64 = 64 * 1024 * 1024;

/// Weights and biases; also reused for gradients and optimizer moments
#[derive(Debug, Clone, PartialEq)]
struct Params {
    w1: Array2<f32>,
    b1: Array1<f32>,
    w2: Array2<f32>,
    b2: Array1<f32>,
}

impl Params {
    fn zeros(hidden_size: usize) -> Self {
        Self {
            w1: Array2::zeros((STATE_SIZE, hidden_size)),
            b1: Array1::zeros(hidden_size),
            w2: Array2::zeros((hidden_size, ACTION_COUNT)),
            b2: Array1::zeros(ACTION_COUNT),
        }
    }
}

#[derive(Debug, Clone)]
enum Optimizer {
    Sgd,
    Adam { step: i32, m: Params, v: Params },
}

impl Optimizer {
    fn new(kind: OptimizerKind, hidden_size: usize) -> Self {
        match kind {
            OptimizerKind::Sgd => Optimizer::Sgd,
            OptimizerKind::Adam => Optimizer::Adam {
                step: 0,
                m: Params::zeros(hidden_size),
                v: Params::zeros(hidden_size),
            },
        }
    }

    fn kind(&self) -> OptimizerKind {
        match self {
            Optimizer::Sgd => OptimizerKind::Sgd,
            Optimizer::Adam { .. } => OptimizerKind::Adam,
        }
    }
}

/// Intermediate values of a forward pass kept for backpropagation
struct Forward {
    pre_activation: Array2<f32>,
    hidden: Array2<f32>,
    q: Array2<f32>,
}

/// On-disk form of the network parameters
#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct QNetwork {
    params: Params,
    learning_rate: f32,
    optimizer: Optimizer,
}

impl QNetwork {
    /// He-initialised weights drawn from `rng`, zero biases
    pub fn new(
        hidden_size: usize,
        learning_rate: f32,
        optimizer: OptimizerKind,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if hidden_size == 0 {
            return Err(Error::invalid("hidden layer needs at least one unit"));
        }

        let w1 = he_init((STATE_SIZE, hidden_size), STATE_SIZE, rng)?;
        let w2 = he_init((hidden_size, ACTION_COUNT), hidden_size, rng)?;

        Ok(Self {
            params: Params {
                w1,
                b1: Array1::zeros(hidden_size),
                w2,
                b2: Array1::zeros(ACTION_COUNT),
            },
            learning_rate,
            optimizer: Optimizer::new(optimizer, hidden_size),
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.params.b1.len()
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Action values for a single state
    pub fn predict(&self, state: &StateVector) -> ActionValues {
        let input = Array2::from_shape_fn((1, STATE_SIZE), |(_, j)| state[j]);
        let q = self.forward(&input).q;
        let mut values = [0.0; ACTION_COUNT];
        for (value, &q) in values.iter_mut().zip(q.row(0)) {
            *value = q;
        }
        values
    }

    /// One optimisation step on the one-step Q-learning targets of `batch`.
    ///
    /// The target for a transition is its reward, plus `gamma` times the best
    /// predicted value of the next state unless the transition is terminal.
    /// Returns the mean squared error of the taken actions' values before the
    /// update.
    pub fn train_step(&mut self, batch: &[Transition], gamma: f32) -> f32 {
        if batch.is_empty() {
            return 0.0;
        }
        let n = batch.len();

        let states = Array2::from_shape_fn((n, STATE_SIZE), |(i, j)| batch[i].state[j]);
        let next_states = Array2::from_shape_fn((n, STATE_SIZE), |(i, j)| batch[i].next_state[j]);

        let forward = self.forward(&states);
        let next_q = self.forward(&next_states).q;

        // Error only flows through the value of the action actually taken
        let mut d_q = Array2::<f32>::zeros((n, ACTION_COUNT));
        let mut loss = 0.0;
        for (i, transition) in batch.iter().enumerate() {
            let mut target = transition.reward;
            if !transition.terminal {
                let best_next = next_q
                    .row(i)
                    .fold(f32::NEG_INFINITY, |best, &v| best.max(v));
                target += gamma * best_next;
            }
            let column = transition.action.index();
            let error = forward.q[[i, column]] - target;
            loss += error * error;
            d_q[[i, column]] = 2.0 * error / n as f32;
        }

        let grads = self.backward(&states, &forward, &d_q);
        self.apply(&grads);

        loss / n as f32
    }

    /// Write the parameters to `path`, creating parent directories
    pub fn save_checkpoint(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let checkpoint = Checkpoint {
            input_size: STATE_SIZE,
            hidden_size: self.hidden_size(),
            output_size: ACTION_COUNT,
            w1: self.params.w1.iter().copied().collect(),
            b1: self.params.b1.to_vec(),
            w2: self.params.w2.iter().copied().collect(),
            b2: self.params.b2.to_vec(),
        };

        // Write beside the target and rename so a crash never leaves half a model
        let staging = path.with_extension("tmp");
        let written = write_checkpoint(&staging, &checkpoint)
            .and_then(|()| fs::rename(&staging, path).map_err(Error::from));
        if written.is_err() {
            let _ = fs::remove_file(&staging);
        }
        written
    }

    /// Replace the parameters with those stored at `path`.
    ///
    /// The checkpoint must describe a network of exactly this shape; on any
    /// mismatch the current parameters are left untouched. Optimizer state
    /// restarts from zero.
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(path)?);
        let checkpoint: Checkpoint = checkpoint_options().deserialize_from(reader)?;

        expect_size("input size", STATE_SIZE, checkpoint.input_size)?;
        expect_size("hidden size", self.hidden_size(), checkpoint.hidden_size)?;
        expect_size("output size", ACTION_COUNT, checkpoint.output_size)?;

        let hidden = checkpoint.hidden_size;
        let params = Params {
            w1: matrix("w1 length", STATE_SIZE, hidden, checkpoint.w1)?,
            b1: vector("b1 length", hidden, checkpoint.b1)?,
            w2: matrix("w2 length", hidden, ACTION_COUNT, checkpoint.w2)?,
            b2: vector("b2 length", ACTION_COUNT, checkpoint.b2)?,
        };

        self.params = params;
        self.optimizer = Optimizer::new(self.optimizer.kind(), hidden);
        Ok(())
    }

    fn forward(&self, input: &Array2<f32>) -> Forward {
        let pre_activation = input.dot(&self.params.w1) + &self.params.b1;
        let hidden = pre_activation.mapv(|v| v.max(0.0));
        let q = hidden.dot(&self.params.w2) + &self.params.b2;
        Forward {
            pre_activation,
            hidden,
            q,
        }
    }

    fn backward(&self, input: &Array2<f32>, forward: &Forward, d_q: &Array2<f32>) -> Params {
        let w2 = forward.hidden.t().dot(d_q);
        let b2 = d_q.sum_axis(Axis(0));

        let mut d_hidden = d_q.dot(&self.params.w2.t());
        d_hidden.zip_mut_with(&forward.pre_activation, |g, &z| {
            if z <= 0.0 {
                *g = 0.0;
            }
        });

        let w1 = input.t().dot(&d_hidden);
        let b1 = d_hidden.sum_axis(Axis(0));

        Params { w1, b1, w2, b2 }
    }

    fn apply(&mut self, grads: &Params) {
        let lr = self.learning_rate;
        match &mut self.optimizer {
            Optimizer::Sgd => {
                self.params.w1.scaled_add(-lr, &grads.w1);
                self.params.b1.scaled_add(-lr, &grads.b1);
                self.params.w2.scaled_add(-lr, &grads.w2);
                self.params.b2.scaled_add(-lr, &grads.b2);
            }
            Optimizer::Adam { step, m, v } => {
                *step += 1;
                let bias1 = 1.0 - ADAM_BETA1.powi(*step);
                let bias2 = 1.0 - ADAM_BETA2.powi(*step);
                let adam = |p: &mut f32, g: f32, m: &mut f32, v: &mut f32| {
                    *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                    *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                    let m_hat = *m / bias1;
                    let v_hat = *v / bias2;
                    *p -= lr * m_hat / (v_hat.sqrt() + ADAM_EPSILON);
                };
                adam_update(&mut self.params.w1, &grads.w1, &mut m.w1, &mut v.w1, adam);
                adam_update(&mut self.params.b1, &grads.b1, &mut m.b1, &mut v.b1, adam);
                adam_update(&mut self.params.w2, &grads.w2, &mut m.w2, &mut v.w2, adam);
                adam_update(&mut self.params.b2, &grads.b2, &mut m.b2, &mut v.b2, adam);
            }
        }
    }
}

fn adam_update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    update: impl Fn(&mut f32, f32, &mut f32, &mut f32),
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| update(p, g, m, v));
}

fn he_init(shape: (usize, usize), fan_in: usize, rng: &mut impl Rng) -> Result<Array2<f32>> {
    let std = (2.0 / fan_in as f32).sqrt();
    let normal = Normal::new(0.0, std).map_err(|e| Error::invalid(e.to_string()))?;
    Ok(Array2::from_shape_fn(shape, |_| normal.sample(rng)))
}

// Same byte layout as `bincode::serialize`, with a cap on what a corrupt
// length prefix can make the decoder read
fn checkpoint_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(MAX_CHECKPOINT_BYTES)
}

fn write_checkpoint(staging: &Path, checkpoint: &Checkpoint) -> Result<()> {
    let mut writer = BufWriter::new(File::create(staging)?);
    checkpoint_options().serialize_into(&mut writer, checkpoint)?;
    writer.flush()?;
    Ok(())
}

fn expect_size(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::ConfigMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

fn matrix(what: &'static str, rows: usize, cols: usize, data: Vec<f32>) -> Result<Array2<f32>> {
    expect_size(what, rows * cols, data.len())?;
    let found = data.len();
    Array2::from_shape_vec((rows, cols), data).map_err(|_| Error::ConfigMismatch {
        what,
        expected: rows * cols,
        found,
    })
}

fn vector(what: &'static str, len: usize, data: Vec<f32>) -> Result<Array1<f32>> {
    expect_size(what, len, data.len())?;
    Ok(Array1::from(data))
}
