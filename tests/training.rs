use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_backprop::{
    Activation, ActivationFunction, ErrorKind, ErrorSignal, Layer, LayerKind, LayerSpec,
    LearningRate, LossType, Matrix, MetricType, NetworkConfig, NetworkSpec, NeuralNetwork,
    OptimizerKind, Sample, Schedule, WeightInit,
};

fn linear() -> Arc<dyn Activation> {
    Arc::new(ActivationFunction::Identity)
}

fn xor() -> Vec<Sample> {
    vec![
        (vec![0.0, 0.0], vec![0.0]),
        (vec![0.0, 1.0], vec![1.0]),
        (vec![1.0, 0.0], vec![1.0]),
        (vec![1.0, 1.0], vec![0.0]),
    ]
}

fn rows(samples: &[Sample]) -> (Matrix, Matrix) {
    let x: Vec<Vec<f64>> = samples.iter().map(|(x, _)| x.clone()).collect();
    let y: Vec<Vec<f64>> = samples.iter().map(|(_, y)| y.clone()).collect();
    (Matrix::from_rows(&x).unwrap(), Matrix::from_rows(&y).unwrap())
}

fn layer(kind: LayerKind, weights: Matrix, rate: f64, activation: Arc<dyn Activation>) -> Layer {
    let lr = LearningRate::constant(weights.rows, weights.cols - 1, rate).unwrap();
    Layer::new(kind, weights, lr, activation).unwrap()
}

/// 2 → hidden → 1 network with seeded Xavier weights.
fn two_layer_network(config: NetworkConfig, hidden_units: usize, hidden: ActivationFunction, rate: f64) -> NeuralNetwork {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut nn = NeuralNetwork::new(config).unwrap();
    let hidden_layer = Layer::initialized(
        LayerKind::Hidden,
        hidden_units,
        2,
        WeightInit::Xavier,
        LearningRate::constant(hidden_units, 2, rate).unwrap(),
        Arc::new(hidden),
        &mut rng,
    )
    .unwrap();
    let output_layer = Layer::initialized(
        LayerKind::Output,
        1,
        hidden_units,
        WeightInit::Xavier,
        LearningRate::constant(1, hidden_units, rate).unwrap(),
        linear(),
        &mut rng,
    )
    .unwrap();
    nn.add_layer(hidden_layer).unwrap();
    nn.add_layer(output_layer).unwrap();
    nn
}

/// Forward + backward over one batch, leaving the gradients on the layers.
fn backprop(hidden: &mut Layer, output: &mut Layer, x: &Matrix, y: &Matrix) {
    let h = hidden.forward_signal(x).unwrap();
    let out = output.forward_signal(&h).unwrap();
    output
        .error_signal(ErrorSignal::Output { targets: y, outputs: &out, loss: LossType::MeanSquaredError })
        .unwrap();
    hidden
        .error_signal(ErrorSignal::Hidden {
            downstream_errors: output.errors().unwrap(),
            downstream_weights: output.weights(),
        })
        .unwrap();
}

/// ½ Σ‖p - y‖² over the batch: the objective whose gradient the layers sum.
fn half_sse(hidden: &Layer, output: &Layer, x: &Matrix, y: &Matrix) -> f64 {
    let mut hidden = hidden.deep_copy();
    let mut output = output.deep_copy();
    let p = output.forward_signal(&hidden.forward_signal(x).unwrap()).unwrap();
    0.5 * p.zip_map(y, |a, b| (a - b).powi(2)).sum()
}

fn assert_matches_finite_differences(hidden: Layer, output: Layer, x: &Matrix, y: &Matrix) {
    let h = 1e-5;
    let (mut hidden, mut output) = (hidden, output);
    backprop(&mut hidden, &mut output, x, y);

    for which in 0..2 {
        let analytic = if which == 0 {
            hidden.current_delta_w().unwrap().clone()
        } else {
            output.current_delta_w().unwrap().clone()
        };
        let base = if which == 0 { hidden.weights().clone() } else { output.weights().clone() };
        for i in 0..base.rows {
            for j in 0..base.cols {
                let mut energies = [0.0; 2];
                for (k, sign) in [1.0, -1.0].into_iter().enumerate() {
                    let mut w = base.clone();
                    w.data[i][j] += sign * h;
                    let (mut hc, mut oc) = (hidden.deep_copy(), output.deep_copy());
                    if which == 0 {
                        hc.set_weights(w).unwrap();
                    } else {
                        oc.set_weights(w).unwrap();
                    }
                    energies[k] = half_sse(&hc, &oc, x, y);
                }
                let numeric = (energies[0] - energies[1]) / (2.0 * h);
                assert_abs_diff_eq!(analytic.data[i][j], numeric, epsilon = 1e-5);
            }
        }
    }
}

#[test]
fn predict_shape_follows_layer_chain() {
    for (hidden_units, batch) in [(1, 1), (3, 4), (8, 17)] {
        let mut nn = two_layer_network(NetworkConfig::new(1), hidden_units, ActivationFunction::Tanh, 0.1);
        let out = nn.predict(&Matrix::filled(batch, 2, 0.3)).unwrap();
        assert_eq!(out.cols, nn.output_dimension());
        assert_eq!(out.rows, batch);
    }
}

#[test]
fn predict_is_deterministic() {
    let mut nn = two_layer_network(NetworkConfig::new(1), 4, ActivationFunction::Sigmoid, 0.1);
    let (x, _) = rows(&xor());
    let first = nn.predict(&x).unwrap();
    let second = nn.predict(&x).unwrap();
    assert_eq!(first, second);
}

#[test]
fn linear_gradient_matches_finite_differences() {
    let hidden = layer(LayerKind::Hidden, Matrix::from_rows(&[vec![0.3, -0.7]]).unwrap(), 0.1, linear());
    let output = layer(LayerKind::Output, Matrix::from_rows(&[vec![0.2, 1.5]]).unwrap(), 0.1, linear());
    let x = Matrix::from_rows(&[vec![0.5], vec![-1.0], vec![2.0]]).unwrap();
    let y = Matrix::from_rows(&[vec![1.0], vec![0.0], vec![-0.5]]).unwrap();
    assert_matches_finite_differences(hidden, output, &x, &y);
}

#[test]
fn nonlinear_gradient_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(99);
    let hidden = layer(LayerKind::Hidden, WeightInit::Xavier.build(3, 2, &mut rng).unwrap(), 0.1, Arc::new(ActivationFunction::Tanh));
    let output = layer(LayerKind::Output, WeightInit::Xavier.build(1, 3, &mut rng).unwrap(), 0.1, Arc::new(ActivationFunction::Sigmoid));
    let (x, y) = rows(&xor());
    assert_matches_finite_differences(hidden, output, &x, &y);
}

#[test]
fn batched_gradient_equals_sum_of_single_sample_gradients() {
    let mut rng = StdRng::seed_from_u64(5);
    let hidden = layer(LayerKind::Hidden, WeightInit::Xavier.build(3, 2, &mut rng).unwrap(), 0.1, Arc::new(ActivationFunction::Tanh));
    let output = layer(LayerKind::Output, WeightInit::Xavier.build(1, 3, &mut rng).unwrap(), 0.1, linear());
    let (x, y) = rows(&xor());

    let (mut hb, mut ob) = (hidden.deep_copy(), output.deep_copy());
    backprop(&mut hb, &mut ob, &x, &y);

    let mut hidden_sum = Matrix::zeros(3, 3);
    let mut output_sum = Matrix::zeros(1, 4);
    for i in 0..x.rows {
        let (mut hs, mut os) = (hidden.deep_copy(), output.deep_copy());
        backprop(&mut hs, &mut os, &x.row_window(i, i + 1), &y.row_window(i, i + 1));
        hidden_sum = &hidden_sum + hs.current_delta_w().unwrap();
        output_sum = &output_sum + os.current_delta_w().unwrap();
    }

    for (a, b) in hb.current_delta_w().unwrap().data.iter().flatten().zip(hidden_sum.data.iter().flatten()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    for (a, b) in ob.current_delta_w().unwrap().data.iter().flatten().zip(output_sum.data.iter().flatten()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn full_batch_epoch_applies_summed_gradient() {
    let rate = 0.05;
    let config = NetworkConfig::new(1).with_optimizer(OptimizerKind::FullBatch).with_seed(3);
    let mut nn = two_layer_network(config, 2, ActivationFunction::Tanh, rate);
    let before: Vec<Matrix> = nn.layers().iter().map(|l| l.weights().clone()).collect();

    // Summed per-sample gradients at the starting weights.
    let (x, y) = rows(&xor());
    let mut sums = vec![Matrix::zeros(2, 3), Matrix::zeros(1, 3)];
    for i in 0..x.rows {
        let mut hidden = nn.layers()[0].deep_copy();
        let mut output = nn.layers()[1].deep_copy();
        backprop(&mut hidden, &mut output, &x.row_window(i, i + 1), &y.row_window(i, i + 1));
        sums[0] = &sums[0] + hidden.current_delta_w().unwrap();
        sums[1] = &sums[1] + output.current_delta_w().unwrap();
    }

    nn.fit(&xor(), None, None, 0.0).unwrap();

    for (k, layer) in nn.layers().iter().enumerate() {
        let expected = &before[k] - &sums[k].scale(rate);
        for (a, b) in layer.weights().data.iter().flatten().zip(expected.data.iter().flatten()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }
}

#[test]
fn regularization_per_epoch_does_not_depend_on_batch_size() {
    let regularization = 1e-4;
    let samples: Vec<Sample> = (0..5).map(|i| (vec![i as f64, 1.0], vec![0.5])).collect();

    let weights_after = |batch_size: usize| -> Vec<f64> {
        let config = NetworkConfig::new(1)
            .with_optimizer(OptimizerKind::MiniBatch)
            .with_batch_size(batch_size)
            .with_regularization(regularization)
            .with_seed(1);
        // Zero learning rate isolates the penalty term.
        let mut nn = two_layer_network(config, 2, ActivationFunction::Tanh, 0.0);
        nn.fit(&samples, None, None, -1.0).unwrap();
        nn.layers().iter().flat_map(|l| l.weights().data.concat()).collect()
    };

    let full = weights_after(5);
    for batch_size in [1, 2, 3] {
        for (a, b) in weights_after(batch_size).iter().zip(full.iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-7);
        }
    }

    let start = two_layer_network(NetworkConfig::new(1), 2, ActivationFunction::Tanh, 0.0);
    let w0 = start.layers()[0].weights().data[0][1];
    assert_relative_eq!(full[1], w0 * (1.0 - regularization), max_relative = 1e-12);
}

#[test]
fn linear_network_loss_never_increases_on_xor() {
    let config = NetworkConfig::new(200)
        .with_optimizer(OptimizerKind::FullBatch)
        .with_seed(8);
    let mut nn = two_layer_network(config, 2, ActivationFunction::Identity, 0.005);
    let report = nn.fit(&xor(), None, None, 1e-3).unwrap();

    let losses = report.training_error().values();
    assert_eq!(losses.len(), 200);
    for pair in losses.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "loss went up: {} -> {}", pair[0], pair[1]);
    }
    // A linear model cannot fit XOR better than predicting 0.5 everywhere.
    assert!(losses[199] >= 0.25 - 1e-9);
    assert!(!report.converged());
}

#[test]
fn training_stops_once_loss_reaches_threshold() {
    let samples: Vec<Sample> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.5, 0.2), (0.3, 0.9)]
        .iter()
        .map(|&(a, b)| (vec![a, b], vec![2.0 * a - b + 0.5]))
        .collect();
    let config = NetworkConfig::new(5000).with_optimizer(OptimizerKind::FullBatch).with_seed(2);
    let mut nn = NeuralNetwork::new(config).unwrap();
    nn.add_layer(layer(LayerKind::Output, Matrix::zeros(1, 3), 0.05, linear())).unwrap();

    let report = nn.fit(&samples, None, None, 1e-6).unwrap();
    assert!(report.converged());
    assert!(report.epochs_run() < 5000);
    assert!(report.final_training_error().unwrap() <= 1e-6);

    let w = nn.layers()[0].weights();
    assert_abs_diff_eq!(w.data[0][0], 0.5, epsilon = 1e-2);
    assert_abs_diff_eq!(w.data[0][1], 2.0, epsilon = 1e-2);
    assert_abs_diff_eq!(w.data[0][2], -1.0, epsilon = 1e-2);
}

#[test]
fn report_tracks_validation_test_and_metric() {
    let config = NetworkConfig::new(30)
        .with_optimizer(OptimizerKind::MiniBatch)
        .with_batch_size(2)
        .with_momentum(0.5)
        .with_metric(MetricType::ClassificationAccuracy)
        .with_seed(4);
    let mut nn = two_layer_network(config, 4, ActivationFunction::Tanh, 0.1);
    let data = xor();
    let report = nn.fit(&data, Some(&data[..2]), Some(&data[2..]), 0.0).unwrap();

    let epochs = report.epochs_run();
    assert_eq!(epochs, 30);
    assert_eq!(report.training_accuracy().len(), epochs);
    assert_eq!(report.validation_error().len(), epochs);
    assert_eq!(report.validation_accuracy().len(), epochs);
    assert_eq!(report.test_error().len(), epochs);
    assert!(report.training_accuracy().values().iter().all(|a| (0.0..=1.0).contains(a)));
    assert!(report.best_validation_accuracy().is_some());
}

#[test]
fn report_scores_match_final_predictions() {
    let config = NetworkConfig::new(20)
        .with_optimizer(OptimizerKind::FullBatch)
        .with_metric(MetricType::ClassificationAccuracy)
        .with_seed(9);
    let mut nn = two_layer_network(config, 3, ActivationFunction::Tanh, 0.05);
    let data = xor();
    let validation = &data[..3];
    let test = &data[3..];
    let report = nn.fit(&data, Some(validation), Some(test), 0.0).unwrap();

    let (vx, vy) = rows(validation);
    let predicted = nn.predict(&vx).unwrap();
    assert_relative_eq!(
        report.validation_error().last().unwrap(),
        LossType::MeanSquaredError.loss(&predicted, &vy),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        report.validation_accuracy().last().unwrap(),
        MetricType::ClassificationAccuracy.evaluate(&predicted, &vy),
        epsilon = 1e-12
    );

    // A single test sample: the per-sample mean is that sample's squared error.
    let (tx, ty) = rows(test);
    let predicted = nn.predict(&tx).unwrap();
    let squared_error: f64 = predicted.data[0].iter().zip(&ty.data[0]).map(|(p, y)| (p - y).powi(2)).sum();
    let test_error = report.test_error().last().unwrap();
    assert_relative_eq!(test_error, LossType::MeanSquaredError.loss(&predicted, &ty), epsilon = 1e-12);
    assert_relative_eq!(test_error, squared_error, epsilon = 1e-12);
}

#[test]
fn empty_validation_set_is_ignored() {
    let mut nn = two_layer_network(NetworkConfig::new(3).with_seed(1), 2, ActivationFunction::Tanh, 0.1);
    let empty: Vec<Sample> = Vec::new();
    let report = nn.fit(&xor(), Some(&empty[..]), None, 0.0).unwrap();
    assert!(report.validation_error().is_empty());
}

#[test]
fn seeded_runs_are_reproducible() {
    let spec = NetworkSpec {
        name: "xor".into(),
        input_size: 2,
        hidden: vec![LayerSpec { units: 3, activation: ActivationFunction::Sigmoid }],
        output: LayerSpec { units: 1, activation: ActivationFunction::Sigmoid },
        init: WeightInit::RangedUniform { low: -0.7, high: 0.7 },
        learning_rate: 0.5,
        schedule: Schedule::Constant,
        config: NetworkConfig::new(25)
            .with_optimizer(OptimizerKind::MiniBatch)
            .with_batch_size(3)
            .with_momentum(0.8)
            .with_seed(77),
    };
    let a = spec.build().unwrap().fit(&xor(), None, None, 0.0).unwrap();
    let b = spec.build().unwrap().fit(&xor(), None, None, 0.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn schedules_advance_once_per_epoch() {
    let mut nn = NeuralNetwork::new(NetworkConfig::new(3).with_optimizer(OptimizerKind::FullBatch)).unwrap();
    let schedule = Schedule::StepDecay { step_size: 1, gamma: 0.5 };
    let lr = LearningRate::scheduled(1, 2, 0.8, schedule).unwrap();
    nn.add_layer(Layer::output(Matrix::zeros(1, 3), lr, linear()).unwrap()).unwrap();

    nn.fit(&xor(), None, None, 0.0).unwrap();
    assert_relative_eq!(nn.layers()[0].learning_rates().value().data[0][0], 0.1);
}

#[test]
fn deep_copy_survives_training_of_the_original() {
    let mut nn = two_layer_network(NetworkConfig::new(5).with_seed(6), 3, ActivationFunction::Tanh, 0.1);
    let copy = nn.deep_copy();
    let snapshot = copy.layers()[0].weights().clone();
    nn.fit(&xor(), None, None, 0.0).unwrap();
    assert_ne!(nn.layers()[0].weights(), &snapshot);
    assert_eq!(copy.layers()[0].weights(), &snapshot);
}

#[test]
fn mismatched_layer_is_rejected_atomically() {
    let mut nn = two_layer_network(NetworkConfig::new(1), 3, ActivationFunction::Tanh, 0.1);
    let before = nn.topology();
    let extra = layer(LayerKind::Output, Matrix::zeros(1, 6), 0.1, linear());
    let err = nn.add_layer(extra).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(nn.topology(), before);
    assert_eq!(nn.layers().len(), 2);
}

#[test]
fn zero_epochs_fail_before_any_layer_exists() {
    let err = NeuralNetwork::new(NetworkConfig::new(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = NetworkConfig::from_names(0, "batch", "mse", "", 0.0, 0.0, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn fit_rejects_wrong_sample_width() {
    let mut nn = two_layer_network(NetworkConfig::new(2), 2, ActivationFunction::Tanh, 0.1);
    let bad = vec![(vec![1.0, 2.0, 3.0], vec![1.0])];
    assert_eq!(nn.fit(&bad, None, None, 0.0).unwrap_err().kind(), ErrorKind::Shape);

    let bad_targets = vec![(vec![1.0, 2.0], vec![1.0, 0.0])];
    assert_eq!(nn.fit(&bad_targets, None, None, 0.0).unwrap_err().kind(), ErrorKind::Shape);
}

#[test]
fn fit_requires_an_output_layer_last() {
    let mut nn = NeuralNetwork::new(NetworkConfig::new(2)).unwrap();
    nn.add_layer(layer(LayerKind::Hidden, Matrix::zeros(1, 3), 0.1, linear())).unwrap();
    assert_eq!(nn.fit(&xor(), None, None, 0.0).unwrap_err().kind(), ErrorKind::Structural);
}
