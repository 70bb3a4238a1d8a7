//! Attack a small linear classifier with both DeepFool variants.
//!
//! Optionally reads the attack configuration from a YAML file.
//!
//! Usage:
//!   cargo run --example linear_attack -- [config.yaml]

use std::path::PathBuf;
use std::process;

use deepfool::{
    Batch, Bounds, DeepFoolConfig, L2DeepFool, LinearModel, LinfDeepFool, Misclassification, Model,
};

fn main() {
    let config = std::env::args().nth(1).map_or_else(DeepFoolConfig::default, |path| {
        DeepFoolConfig::from_path(&PathBuf::from(&path)).unwrap_or_else(|e| {
            eprintln!("Cannot load {path}: {e}");
            process::exit(1);
        })
    });

    // three classes over four features
    let weight = vec![
        1.0, -0.5, 0.25, 0.0, //
        -0.25, 1.0, 0.0, 0.5, //
        0.0, 0.25, 1.0, -0.75,
    ];
    let model = LinearModel::new(weight, vec![0.1, 0.0, -0.1], 4, Bounds::unit())
        .unwrap_or_else(|e| {
            eprintln!("Invalid model: {e}");
            process::exit(1);
        });
    let x = Batch::from_rows(&[
        vec![0.9, 0.1, 0.2, 0.3],
        vec![0.2, 0.8, 0.1, 0.6],
        vec![0.1, 0.3, 0.9, 0.2],
    ])
    .unwrap_or_else(|e| {
        eprintln!("Invalid batch: {e}");
        process::exit(1);
    });

    let criterion = match model.forward(&x) {
        Ok(logits) => Misclassification::from_predictions(&logits),
        Err(e) => {
            eprintln!("Forward pass failed: {e}");
            process::exit(1);
        }
    };

    let l2 = L2DeepFool::new(config.clone()).and_then(|a| a.run_with_report(&model, &x, &criterion));
    let linf = LinfDeepFool::new(config).and_then(|a| a.run_with_report(&model, &x, &criterion));

    for (name, result) in [("L2", l2), ("Linf", linf)] {
        match result {
            Ok(report) => {
                println!(
                    "{name}: {}/{} fooled in {} steps",
                    report.success_count(),
                    report.success.len(),
                    report.steps
                );
                for (i, (l2n, linfn)) in report
                    .l2_perturbation
                    .iter()
                    .zip(&report.linf_perturbation)
                    .enumerate()
                {
                    println!("  sample {i}: ||d||_2 = {l2n:.4}, ||d||_inf = {linfn:.4}");
                }
            }
            Err(e) => {
                eprintln!("{name} attack failed: {e}");
                process::exit(1);
            }
        }
    }
}
