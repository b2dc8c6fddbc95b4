use std::{
    f64::consts::TAU,
    fmt,
    sync::{ Arc, Mutex },
};
use ndarray as nd;
use tracing::{ field::{ Field, Visit }, Event, Level, Subscriber };
use tracing_subscriber::{ layer::Context, prelude::*, Layer };
use multilevel_solution::{
    hilbert,
    Couplings,
    ExperimentParams,
    ProbeRabi,
    Solution,
};

#[derive(Clone, Debug, Default)]
struct Captured {
    message: String,
    max_od: Option<f64>,
}

impl Visit for Captured {
    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "max_od" { self.max_od = Some(value); }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" { self.message = format!("{:?}", value); }
    }
}

#[derive(Clone, Default)]
struct WarnLayer(Arc<Mutex<Vec<Captured>>>);

impl<S> Layer<S> for WarnLayer
where S: Subscriber
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN { return; }
        let mut captured = Captured::default();
        event.record(&mut captured);
        self.0.lock().unwrap().push(captured);
    }
}

fn with_warnings<F>(f: F) -> Vec<Captured>
where F: FnOnce()
{
    let layer = WarnLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    tracing::subscriber::with_default(subscriber, f);
    let captured = layer.0.lock().unwrap().clone();
    captured
}

fn absorbing(im_rho_10: f64, cell_length: f64) -> Solution {
    let rho: nd::Array1<f64> = nd::array![im_rho_10, 0.0, 0.0];
    Solution::new(
        rho,
        hilbert::basis_labels(2),
        vec![],
        vec![],
        Couplings::new(),
        "1.2.0",
    )
    .unwrap()
    .with_experiment(ExperimentParams {
        kappa: Some(1e12),
        probe_tuple: Some((0, 1)),
        probe_freq: Some(TAU * 384.2e12),
        probe_rabi: Some(ProbeRabi::Scalar(1.0)),
        cell_length: Some(cell_length),
        ..Default::default()
    })
}

#[test]
fn thick_sample_logs_warning() {
    let sol = absorbing(1e-3, 1.0);
    let mut od = nd::ArrayD::<f64>::zeros(vec![]);
    let warnings = with_warnings(|| {
        od = sol.get_od().unwrap();
        sol.get_transmission_coef().unwrap();
    });
    assert!(od.sum() > 1.0);
    assert_eq!(warnings.len(), 2);
    for warning in warnings.iter() {
        assert_eq!(warning.max_od, Some(od.sum()));
        assert!(warning.message.contains("optical depth greater than 1"));
    }
}

#[test]
fn thin_sample_logs_nothing() {
    let sol = absorbing(1e-3, 1e-12);
    let warnings = with_warnings(|| {
        let od = sol.get_od().unwrap();
        assert!(od.sum() > 0.0 && od.sum() < 1.0);
    });
    assert!(warnings.is_empty());
}
