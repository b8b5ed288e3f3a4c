use ferrite_backprop::{
    ActivationFunction, LayerSpec, MetricType, NetworkConfig, NetworkSpec, OptimizerKind,
    Sample, Schedule, WeightInit,
};
use tracing_subscriber::EnvFilter;

fn main() -> ferrite_backprop::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let spec = NetworkSpec {
        name: "xor".into(),
        input_size: 2,
        hidden: vec![LayerSpec { units: 4, activation: ActivationFunction::Tanh }],
        output: LayerSpec { units: 1, activation: ActivationFunction::Sigmoid },
        init: WeightInit::Xavier,
        learning_rate: 0.5,
        schedule: Schedule::Constant,
        config: NetworkConfig::new(5000)
            .with_optimizer(OptimizerKind::FullBatch)
            .with_momentum(0.8)
            .with_metric(MetricType::ClassificationAccuracy)
            .with_seed(42),
    };
    let mut network = spec.build()?;

    let samples: Vec<Sample> = vec![
        (vec![1.0, 0.0], vec![1.0]),
        (vec![1.0, 1.0], vec![0.0]),
        (vec![0.0, 1.0], vec![1.0]),
        (vec![0.0, 0.0], vec![0.0]),
    ];

    let report = network.fit(&samples, None, None, 1e-3)?;

    for (epoch, loss) in report.training_error().iter().step_by(500) {
        println!("Epoch {epoch}: loss = {loss:.6}");
    }
    println!(
        "Stopped after {} epochs (converged: {})",
        report.epochs_run(),
        report.converged()
    );

    let inputs: Vec<Vec<f64>> = samples.iter().map(|(x, _)| x.clone()).collect();
    let outputs = network.predict_rows(&inputs)?;
    for (input, output) in inputs.iter().zip(outputs.iter_rows()) {
        println!("Input: {:?} -> Output: {:.4}", input, output[0]);
    }
    Ok(())
}
