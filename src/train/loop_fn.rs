use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::config::NetworkConfig;
use crate::network::network::NeuralNetwork;
use crate::optim::Optimizer;
use crate::train::dataset::{Dataset, Sample};
use crate::train::epoch_stats::EpochStats;
use crate::train::report::Report;

/// Training stops as soon as the training loss is at or below this value
/// when callers have no better threshold.
pub const DEFAULT_MIN_ERROR: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` and returns the report of the run.
///
/// # Arguments
/// - `network`    — modified in place
/// - `training`   — training samples; shuffled and split into batches every epoch
/// - `validation` — optional samples scored after every epoch
/// - `test`       — optional samples scored after every epoch
/// - `min_error`  — training loss at which the run stops early
///
/// Empty validation or test slices are treated as absent.
///
/// # Errors
/// Fails before the first epoch if the topology cannot be trained or any
/// sample set has the wrong width; every later error comes from the layers.
pub fn train_loop(
    network: &mut NeuralNetwork,
    training: &[Sample],
    validation: Option<&[Sample]>,
    test: Option<&[Sample]>,
    min_error: f64,
) -> Result<Report> {
    network.validate_topology()?;
    let train = load_set(network, "training samples", training)?;
    let validation = match validation.filter(|s| !s.is_empty()) {
        Some(samples) => Some(load_set(network, "validation samples", samples)?),
        None => None,
    };
    let test = match test.filter(|s| !s.is_empty()) {
        Some(samples) => Some(load_set(network, "test samples", samples)?),
        None => None,
    };

    let config = network.config().clone();
    let total = train.len();
    let batch_size = config.optimizer.effective_batch_size(config.batch_size, total);
    let optimizer = config.optimizer.optimizer();
    let mut report = Report::new(config.max_epochs, min_error, config.metric);

    info!(
        samples = total,
        batch_size,
        max_epochs = config.max_epochs,
        optimizer = %config.optimizer,
        loss = %config.loss,
        "training started"
    );

    for epoch in 0..config.max_epochs {
        let t_start = Instant::now();

        // ── One full pass over the shuffled training data ────────────────
        let shuffled = train.shuffled(network.rng_mut());
        for (inputs, targets) in shuffled.windows(batch_size) {
            let batch_ratio = inputs.rows as f64 / total as f64;
            optimizer.run_batch(network, &inputs, &targets, batch_ratio, config.loss)?;
        }

        // ── Whole-set scores with the updated weights ────────────────────
        let (training_loss, training_metric) = evaluate(network, &train, &config)?;
        if !training_loss.is_finite() {
            warn!(epoch, training_loss, "training loss is not finite");
        }

        let (validation_loss, validation_metric) = match &validation {
            Some(set) => {
                let (loss, metric) = evaluate(network, set, &config)?;
                (Some(loss), metric)
            }
            None => (None, None),
        };

        let test_loss = match &test {
            Some(set) => Some(config.loss.loss(&network.predict(set.inputs())?, set.targets())),
            None => None,
        };

        let stats = EpochStats {
            epoch,
            training_loss,
            training_metric,
            validation_loss,
            validation_metric,
            test_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        debug!(
            epoch,
            training_loss,
            ?training_metric,
            ?validation_loss,
            ?validation_metric,
            ?test_loss,
            elapsed_ms = stats.elapsed_ms,
            "epoch finished"
        );
        report.record(&stats)?;

        network.update_learning_rates(epoch);

        if training_loss <= min_error {
            report.mark_converged();
            info!(epoch, training_loss, min_error, "training loss reached threshold");
            break;
        }
    }

    info!(
        epochs = report.epochs_run(),
        final_loss = ?report.final_training_error(),
        converged = report.converged(),
        "training finished"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn load_set(network: &NeuralNetwork, context: &'static str, samples: &[Sample]) -> Result<Dataset> {
    let set = Dataset::from_samples(samples)?;
    set.check_dimensions(context, network.input_dimension(), network.output_dimension())?;
    Ok(set)
}

/// Loss and optional metric over a whole set (eval mode, no updates).
fn evaluate(
    network: &mut NeuralNetwork,
    set: &Dataset,
    config: &NetworkConfig,
) -> Result<(f64, Option<f64>)> {
    let predicted: Matrix = network.predict(set.inputs())?;
    let loss = config.loss.loss(&predicted, set.targets());
    let metric = config.metric.map(|m| m.evaluate(&predicted, set.targets()));
    Ok((loss, metric))
}
