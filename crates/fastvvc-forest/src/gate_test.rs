// Decision gate tests

use super::*;
use crate::model::{ShapeForest, Tree, TreeNode};
use fastvvc_core::{PcaThreshold, ThresholdPreset};
use fastvvc_features::{HOR_VER_DIMS, QT_MTT_DIMS};

fn constant_forest(prob: f64) -> ShapeForest {
    ShapeForest {
        selector: vec![0],
        trees: vec![Tree {
            nodes: vec![TreeNode::Leaf { prob }],
        }],
    }
}

fn bundle(hor_ver_valid: bool) -> FeatureBundle {
    FeatureBundle {
        qt_mtt: [1.0; QT_MTT_DIMS],
        hor_ver: [1.0; HOR_VER_DIMS],
        hor_ver_valid,
    }
}

#[test]
fn test_classify_bands() {
    assert_eq!(classify(0.6, 0.5), Decision::Force);
    assert_eq!(classify(0.4, 0.5), Decision::Forbid);
    assert_eq!(classify(0.5, 0.5), Decision::Undecided);

    assert_eq!(classify(0.8, 0.75), Decision::Force);
    assert_eq!(classify(0.2, 0.75), Decision::Forbid);
    assert_eq!(classify(0.6, 0.75), Decision::Undecided);
    assert_eq!(classify(0.3, 0.75), Decision::Undecided);
}

#[test]
fn test_threshold_monotonicity() {
    // raising t never increases the number of decided verdicts
    let probs: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
    let thresholds = [0.5, 0.75, 0.85, 0.9, 0.95, 0.975];
    let mut last_decided = usize::MAX;
    for t in thresholds {
        let decided = probs
            .iter()
            .filter(|&&p| classify(p, t) != Decision::Undecided)
            .count();
        assert!(decided <= last_decided, "t={t} decided {decided}");
        last_decided = decided;
    }
}

#[test]
fn test_untrained_model_all_undecided() {
    let model = ForestModel::empty();
    let gate = DecisionGate::new(&model, GateConfig::default());
    let verdicts = gate.assess(32, 32, &bundle(true));
    assert_eq!(verdicts, GateVerdicts::undecided());
}

#[test]
fn test_qt_force_short_circuits_hor() {
    let mut model = ForestModel::empty();
    model.insert(ForestKind::QtMtt, 32, 32, constant_forest(0.95));
    model.insert(ForestKind::HorVer, 32, 32, constant_forest(0.95));
    let gate = DecisionGate::new(&model, GateConfig::default());
    let verdicts = gate.assess(32, 32, &bundle(true));
    assert_eq!(verdicts.qt, Decision::Force);
    // hor was never queried
    assert_eq!(verdicts.hor, Decision::Undecided);
}

#[test]
fn test_no_split_force_short_circuits_all() {
    let mut model = ForestModel::empty();
    model.insert(ForestKind::NoSplit, 32, 32, constant_forest(0.99));
    model.insert(ForestKind::QtMtt, 32, 32, constant_forest(0.99));
    let gate = DecisionGate::new(&model, GateConfig::default());
    let verdicts = gate.assess(32, 32, &bundle(true));
    assert_eq!(verdicts.no_split, Decision::Force);
    assert_eq!(verdicts.qt, Decision::Undecided);
    assert_eq!(verdicts.hor, Decision::Undecided);
}

#[test]
fn test_singular_hor_ver_stays_undecided() {
    let mut model = ForestModel::empty();
    model.insert(ForestKind::QtMtt, 32, 32, constant_forest(0.3));
    model.insert(ForestKind::HorVer, 32, 32, constant_forest(0.95));
    let gate = DecisionGate::new(&model, GateConfig::default());
    let verdicts = gate.assess(32, 32, &bundle(false));
    assert_eq!(verdicts.qt, Decision::Forbid);
    assert_eq!(verdicts.hor, Decision::Undecided);
}

#[test]
fn test_non_square_shape_skips_qt_forest() {
    let mut model = ForestModel::empty();
    // even a trained square entry must not fire for a 32x16 CU
    model.insert(ForestKind::QtMtt, 32, 32, constant_forest(0.99));
    model.insert(ForestKind::HorVer, 32, 16, constant_forest(0.9));
    let gate = DecisionGate::new(&model, GateConfig::default());
    let verdicts = gate.assess(32, 16, &bundle(true));
    assert_eq!(verdicts.qt, Decision::Undecided);
    assert_eq!(verdicts.hor, Decision::Force);
}

#[test]
fn test_pca_thresholds_apply_per_shape() {
    let mut model = ForestModel::empty();
    model.insert(ForestKind::QtMtt, 64, 64, constant_forest(0.7));
    let config = GateConfig {
        preset: ThresholdPreset::PcaTable,
        pca: vec![PcaThreshold {
            width: 64,
            height: 64,
            qt: 0.65,
            hor: 0.8,
        }],
    };
    let gate = DecisionGate::new(&model, config);
    let verdicts = gate.assess(64, 64, &bundle(true));
    assert_eq!(verdicts.qt, Decision::Force);

    // a stricter uniform preset leaves the same probability undecided
    let gate = DecisionGate::new(
        &model,
        GateConfig {
            preset: ThresholdPreset::P85,
            pca: Vec::new(),
        },
    );
    let verdicts = gate.assess(64, 64, &bundle(true));
    assert_eq!(verdicts.qt, Decision::Undecided);
}
