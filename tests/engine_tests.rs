//! End-to-end behavior across the engine: analytic gradients against finite
//! differences, stepped execution against whole passes, and a full training
//! step wired through the optimizer.

use approx::assert_relative_eq;
use gradnet::loss::{mse, mse_grad};
use gradnet::{DenseLayer, Network, Relu, Sgd, Sigmoid, Tensor, Unit, WeightInit};

fn two_layer_network() -> Network {
    Network::new(vec![
        Box::new(DenseLayer::new(3, 4, WeightInit::Xavier, Some(7)).unwrap()),
        Box::new(Sigmoid::new()),
        Box::new(DenseLayer::new(4, 2, WeightInit::Xavier, Some(11)).unwrap()),
        Box::new(Sigmoid::new()),
    ])
}

#[test]
fn textbook_single_neuron_pass() {
    let mut layer = DenseLayer::from_weights(
        Tensor::from_rows(vec![vec![1.0, 2.0, -1.0]]).unwrap(),
        Tensor::from_rows(vec![vec![0.0]]).unwrap(),
    )
    .unwrap();
    let x = Tensor::column(&[4.0, 2.0, 3.0]).unwrap();

    let y = layer.forward(&x).unwrap();
    assert_relative_eq!(y.get(0, 0).unwrap(), 5.0);

    let grad_in = layer.backward(&Tensor::column(&[1.0]).unwrap()).unwrap();
    assert_eq!(grad_in.shape(), (3, 1));
    assert_relative_eq!(grad_in.get(0, 0).unwrap(), 1.0);
    assert_relative_eq!(grad_in.get(1, 0).unwrap(), 2.0);
    assert_relative_eq!(grad_in.get(2, 0).unwrap(), -1.0);

    let opt = Sgd::new(0.1);
    let pairs = layer.params_and_grads().unwrap();
    let (params, grads): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
    opt.step(params, &grads).unwrap();

    assert_relative_eq!(layer.weights().get(0, 0).unwrap(), 0.6, epsilon = 1e-12);
    assert_relative_eq!(layer.weights().get(0, 1).unwrap(), 1.8, epsilon = 1e-12);
    assert_relative_eq!(layer.weights().get(0, 2).unwrap(), -1.3, epsilon = 1e-12);
    assert_relative_eq!(layer.bias().get(0, 0).unwrap(), -0.1, epsilon = 1e-12);
}

/// Analytic input gradients must agree with central finite differences of the
/// loss along every input coordinate.
#[test]
fn backward_matches_finite_differences() {
    const EPS: f64 = 1e-5;

    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let target = Tensor::column(&[1.0, 0.0]).unwrap();

    let mut net = two_layer_network();
    let y = net.forward(&x).unwrap();
    let analytic = net.backward(&mse_grad(&y, &target).unwrap()).unwrap();

    for i in 0..3 {
        let mut probe = |delta: f64| -> f64 {
            let mut bumped = x.clone();
            bumped.data_mut()[[i, 0]] += delta;
            let out = net.forward(&bumped).unwrap();
            mse(&out, &target).unwrap()
        };
        let numeric = (probe(EPS) - probe(-EPS)) / (2.0 * EPS);
        assert_relative_eq!(
            analytic.get(i, 0).unwrap(),
            numeric,
            epsilon = 1e-4,
            max_relative = 1e-4
        );
    }
}

/// Same check for the weight gradients of the first dense layer.
#[test]
fn weight_gradients_match_finite_differences() {
    const EPS: f64 = 1e-5;

    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let target = Tensor::column(&[1.0]).unwrap();

    let mut layer = DenseLayer::from_weights(
        Tensor::from_rows(vec![vec![0.3, -0.5, 0.8]]).unwrap(),
        Tensor::from_rows(vec![vec![0.1]]).unwrap(),
    )
    .unwrap();
    let mut act = Sigmoid::new();

    let y = act.forward(&layer.forward(&x).unwrap()).unwrap();
    let g = act.backward(&mse_grad(&y, &target).unwrap()).unwrap();
    layer.backward(&g).unwrap();
    let analytic = layer.grads()[0].clone();

    for j in 0..3 {
        let loss_at = |delta: f64| -> f64 {
            let mut w = Tensor::from_rows(vec![vec![0.3, -0.5, 0.8]]).unwrap();
            w.data_mut()[[0, j]] += delta;
            let mut probe = DenseLayer::from_weights(
                w,
                Tensor::from_rows(vec![vec![0.1]]).unwrap(),
            )
            .unwrap();
            let mut probe_act = Sigmoid::new();
            let out = probe_act.forward(&probe.forward(&x).unwrap()).unwrap();
            mse(&out, &target).unwrap()
        };
        let numeric = (loss_at(EPS) - loss_at(-EPS)) / (2.0 * EPS);
        assert_relative_eq!(
            analytic.get(0, j).unwrap(),
            numeric,
            epsilon = 1e-4,
            max_relative = 1e-4
        );
    }
}

#[test]
fn stepped_execution_equals_whole_pass() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();

    let mut whole = two_layer_network();
    let expected = whole.forward(&x).unwrap();

    let mut stepped = two_layer_network();
    let mut last = stepped.step_forward(Some(&x)).unwrap().unwrap();
    for _ in 0..3 {
        last = stepped.step_forward(None).unwrap().unwrap();
    }
    assert!(stepped.step_forward(None).unwrap().is_none());
    assert_eq!(last, expected);
}

#[test]
fn stepping_can_restart_after_reset() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let mut net = two_layer_network();

    let first = net.step_forward(Some(&x)).unwrap().unwrap();
    net.step_forward(None).unwrap();
    net.reset(0, true).unwrap();

    let again = net.step_forward(Some(&x)).unwrap().unwrap();
    assert_eq!(first, again);
}

#[test]
fn graph_export_is_stable_and_pure() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let mut net = two_layer_network();
    net.forward(&x).unwrap();

    let a = net.to_graph().unwrap();
    let b = net.to_graph().unwrap();
    let ids_a: Vec<_> = a.nodes.iter().map(|n| n.id.clone()).collect();
    let ids_b: Vec<_> = b.nodes.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids_a, ids_b);

    // 3 inputs + 4 hidden + 2 outputs; activations pass columns through.
    assert_eq!(a.nodes.len(), 9);
    // Fully connected: 3*4 + 4*2.
    assert_eq!(a.links.len(), 20);
    assert!(a.links.iter().all(|l| l.weight.is_some()));

    // Every activation populated after a forward pass.
    assert!(a.nodes.iter().all(|n| n.activation.is_some()));

    // Export did not disturb the model.
    let y1 = net.forward(&x).unwrap();
    net.to_graph().unwrap();
    let y2 = net.forward(&x).unwrap();
    assert_eq!(y1, y2);
}

#[test]
fn graph_links_reference_existing_nodes() {
    let net = two_layer_network();
    let snapshot = net.to_graph().unwrap();
    let ids: std::collections::HashSet<_> =
        snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    for link in &snapshot.links {
        assert!(ids.contains(link.source.as_str()), "dangling {}", link.source);
        assert!(ids.contains(link.target.as_str()), "dangling {}", link.target);
    }
}

#[test]
fn training_step_reduces_loss() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let target = Tensor::column(&[1.0, 0.0]).unwrap();
    let mut net = two_layer_network();
    let opt = Sgd::new(0.5);

    let y = net.forward(&x).unwrap();
    let before = mse(&y, &target).unwrap();

    net.backward(&mse_grad(&y, &target).unwrap()).unwrap();
    let (params, grads) = net.params_and_grads().unwrap();
    opt.step(params, &grads).unwrap();

    let after = mse(&net.forward(&x).unwrap(), &target).unwrap();
    assert!(
        after < before,
        "loss did not decrease: {before} -> {after}"
    );
}

#[test]
fn repeated_training_converges_on_one_sample() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let target = Tensor::column(&[1.0, 0.0]).unwrap();
    let mut net = two_layer_network();
    let opt = Sgd::new(1.0);

    let mut loss = f64::MAX;
    for _ in 0..2000 {
        let y = net.forward(&x).unwrap();
        loss = mse(&y, &target).unwrap();
        net.backward(&mse_grad(&y, &target).unwrap()).unwrap();
        let (params, grads) = net.params_and_grads().unwrap();
        opt.step(params, &grads).unwrap();
    }
    assert!(loss < 1e-2, "loss stuck at {loss}");
}

#[test]
fn relu_network_trains_without_nan() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let target = Tensor::column(&[0.5]).unwrap();
    let mut net = Network::new(vec![
        Box::new(DenseLayer::new(3, 4, WeightInit::He, Some(3)).unwrap()),
        Box::new(Relu::new()),
        Box::new(DenseLayer::new(4, 1, WeightInit::He, Some(5)).unwrap()),
    ]);
    let opt = Sgd::new(0.05);

    for _ in 0..50 {
        let y = net.forward(&x).unwrap();
        assert!(!y.has_invalid_values());
        net.backward(&mse_grad(&y, &target).unwrap()).unwrap();
        let (params, grads) = net.params_and_grads().unwrap();
        opt.step(params, &grads).unwrap();
    }
    for p in net.params() {
        assert!(!p.has_invalid_values());
    }
}

#[test]
fn snapshot_serializes_without_null_padding() {
    let x = Tensor::column(&[0.4, -1.2, 0.9]).unwrap();
    let mut net = two_layer_network();
    net.forward(&x).unwrap();

    let json = serde_json::to_string(&net.to_graph().unwrap()).unwrap();
    assert!(!json.contains("null"));
    assert!(json.contains("\"type\":\"input\""));
    assert!(json.contains("layer-0:in:0"));
}
