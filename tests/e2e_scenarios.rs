// tests/e2e_scenarios.rs
use expansion_mc::config::SimulationInput;
use expansion_mc::distributions::Distribution;
use expansion_mc::mc::EngineConfig;
use expansion_mc::processes::{Regime, RegimeSwitchingModel};
use expansion_mc::simulation::RiskEventConfig;

fn fixed_config(value_overrides: impl FnOnce(&mut EngineConfig)) -> EngineConfig {
    let mut cfg = EngineConfig::default();
    cfg.n_simulations = 100;
    cfg.time_horizon = 12;
    cfg.seed = Some(1);
    value_overrides(&mut cfg);
    cfg
}

#[test]
fn scenario_1_deterministic_zero_variance() {
    use expansion_mc::distributions::Triangular;
    use expansion_mc::simulation::Channel;

    let severity = Triangular::new(1.0, 1.0, 1.0).unwrap();
    let shock = RiskEventConfig::new("fixed-shock", 1.0, Channel::Revenue, severity, 0.5, 0, None).unwrap();

    let cfg = fixed_config(|cfg| {
        cfg.initial_capital_dist = Distribution::fixed(5000.0).unwrap();
        cfg.dev_duration_dist = Distribution::fixed(6.0).unwrap();
        cfg.dev_burn_dist = Distribution::fixed(200.0).unwrap();
        cfg.leads_per_month_dist = Distribution::fixed(7.0).unwrap();
        cfg.win_rate_bumn_dist = Distribution::fixed(0.7).unwrap();
        cfg.win_rate_open_dist = Distribution::fixed(0.3).unwrap();
        cfg.churn_rate_dist = Distribution::fixed(0.1).unwrap();
        cfg.contract_small_dist = Distribution::fixed(180.0).unwrap();
        cfg.contract_medium_dist = Distribution::fixed(320.0).unwrap();
        cfg.contract_large_dist = Distribution::fixed(550.0).unwrap();
        cfg.sales_cycle_dist = Distribution::fixed(1.0).unwrap();
        cfg.enable_regime_switching = false;
        cfg.enable_risk_events = true;
        cfg.risk_events = vec![shock];
    });

    let engine = expansion_mc::mc::SimulationEngine::new(cfg).unwrap();
    let (_, result) = engine.run().unwrap();

    assert!(result.summary.prob_profit == 0.0 || result.summary.prob_profit == 1.0);
    assert!(result.summary.return_std.abs() < 1e-9);
    let band0 = &result.paths.percentiles[0];
    assert!((band0.p5 - band0.p95).abs() < 1e-6);
}

#[test]
fn scenario_2_ruin_certainty() {
    let cfg = fixed_config(|cfg| {
        cfg.n_simulations = 50;
        cfg.time_horizon = 6;
        cfg.initial_capital_dist = Distribution::fixed(100.0).unwrap();
        cfg.dev_duration_dist = Distribution::fixed(3.0).unwrap();
        cfg.dev_burn_dist = Distribution::fixed(1000.0).unwrap();
        cfg.leads_per_month_dist = Distribution::fixed(0.0).unwrap();
        cfg.enable_regime_switching = false;
        cfg.enable_risk_events = false;
    });

    let engine = expansion_mc::mc::SimulationEngine::new(cfg).unwrap();
    let (paths, result) = engine.run().unwrap();

    assert!((result.summary.prob_ruin - 1.0).abs() < 1e-9);
    for path in &paths {
        assert!(path.is_ruin);
    }
}

#[test]
fn scenario_3_noop_risk_events_match_empty_list() {
    use expansion_mc::distributions::Triangular;
    use expansion_mc::simulation::Channel;

    let severity = Triangular::new(0.5, 1.0, 1.5).unwrap();
    let shock = RiskEventConfig::new("noise", 2.0, Channel::Cost, severity, 0.3, 0, None).unwrap();

    let with_inert_events = fixed_config(|cfg| {
        cfg.enable_risk_events = false;
        cfg.risk_events = vec![shock];
    });
    let with_empty_list = fixed_config(|cfg| {
        cfg.enable_risk_events = true;
        cfg.risk_events = Vec::new();
    });

    let (_, result_a) = expansion_mc::mc::SimulationEngine::new(with_inert_events)
        .unwrap()
        .run()
        .unwrap();
    let (_, result_b) = expansion_mc::mc::SimulationEngine::new(with_empty_list)
        .unwrap()
        .run()
        .unwrap();

    assert!((result_a.summary.return_mean - result_b.summary.return_mean).abs() < 1e-9);
    assert!((result_a.summary.prob_ruin - result_b.summary.prob_ruin).abs() < 1e-9);
}

#[test]
fn scenario_4_stress_only_regime_is_absorbing() {
    let transition = vec![
        vec![0.0, 1.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 1.0, 0.0],
    ];
    let model = RegimeSwitchingModel::new(transition, Regime::Normal).unwrap();
    let stationary = model.stationary_distribution();

    assert!((stationary[Regime::Stress.index()] - 1.0).abs() < 1e-6);
    assert!(stationary[Regime::Normal.index()].abs() < 1e-6);
    assert!(stationary[Regime::Boom.index()].abs() < 1e-6);

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    let mut rng = StdRng::seed_from_u64(9);
    let path = model.path(20, &mut rng);
    assert!(path.iter().skip(1).all(|&r| r == Regime::Stress));
}

#[test]
fn scenario_5_replay_determinism_with_base_preset() {
    let engine_config = SimulationInput::base().to_engine_config().unwrap();
    let mut cfg_a = engine_config.clone();
    cfg_a.seed = Some(42);
    cfg_a.n_simulations = 500;
    cfg_a.time_horizon = 36;
    let mut cfg_b = cfg_a.clone();
    cfg_b.seed = Some(42);

    let (_, result_a) = expansion_mc::mc::SimulationEngine::new(cfg_a).unwrap().run().unwrap();
    let (_, result_b) = expansion_mc::mc::SimulationEngine::new(cfg_b).unwrap().run().unwrap();

    assert_eq!(result_a.summary.return_mean.to_bits(), result_b.summary.return_mean.to_bits());
    assert_eq!(result_a.summary.prob_ruin.to_bits(), result_b.summary.prob_ruin.to_bits());
    assert_eq!(result_a.summary.var_5.to_bits(), result_b.summary.var_5.to_bits());
    assert_eq!(result_a.summary.recommendation, result_b.summary.recommendation);
}

#[test]
fn scenario_6_tornado_swing_widens_with_wider_inputs() {
    use expansion_mc::analytics::SensitivityAnalyzer;
    use expansion_mc::analytics::OutputMetric;

    let narrow = fixed_config(|cfg| {
        cfg.n_simulations = 300;
        cfg.win_rate_bumn_dist = Distribution::beta(40.0, 10.0).unwrap();
        cfg.churn_rate_dist = Distribution::beta(8.0, 40.0).unwrap();
        cfg.enable_regime_switching = false;
        cfg.enable_risk_events = false;
    });
    let wide = fixed_config(|cfg| {
        cfg.n_simulations = 300;
        cfg.win_rate_bumn_dist = Distribution::beta(2.0, 2.0).unwrap();
        cfg.churn_rate_dist = Distribution::beta(1.0, 3.0).unwrap();
        cfg.enable_regime_switching = false;
        cfg.enable_risk_events = false;
    });

    let (paths_narrow, _) = expansion_mc::mc::SimulationEngine::new(narrow).unwrap().run().unwrap();
    let (paths_wide, _) = expansion_mc::mc::SimulationEngine::new(wide).unwrap().run().unwrap();

    let tornado_narrow = SensitivityAnalyzer::new(&paths_narrow, OutputMetric::Return)
        .unwrap()
        .compute_tornado();
    let tornado_wide = SensitivityAnalyzer::new(&paths_wide, OutputMetric::Return)
        .unwrap()
        .compute_tornado();

    let swing_of = |items: &[expansion_mc::analytics::TornadoItem], param: &str| -> Option<f64> {
        items.iter().find(|t| t.parameter == param).map(|t| t.swing)
    };

    if let (Some(narrow_swing), Some(wide_swing)) =
        (swing_of(&tornado_narrow, "win_rate_bumn"), swing_of(&tornado_wide, "win_rate_bumn"))
    {
        assert!(wide_swing >= narrow_swing - 1e-6);
    }
}

#[test]
fn cross_cutting_analytics_invariants() {
    use expansion_mc::analytics::{PremortemAnalyzer, RiskAnalyzer};

    let cfg = fixed_config(|cfg| {
        cfg.n_simulations = 200;
    });
    let (paths, result) = expansion_mc::mc::SimulationEngine::new(cfg).unwrap().run().unwrap();

    let risk = RiskAnalyzer::new(&paths, None).unwrap().analyze();
    let var95 = &risk.var["95"];
    let var99 = &risk.var["99"];
    assert!(var95.var_absolute <= var99.var_absolute + 1e-6);
    let cvar95 = &risk.cvar["95"];
    assert!(cvar95.cvar_absolute >= var95.var_absolute - 1e-6);

    for w in risk.survival.survival_curve.windows(2) {
        assert!(w[1] <= w[0] + 1e-9);
    }
    for &p in &risk.underwater.underwater_probability_curve {
        assert!((0.0..=1.0).contains(&p));
    }

    let premortem = PremortemAnalyzer::new(&paths, -20.0).analyze();
    assert_eq!(
        premortem.failure_count + (paths.len() - premortem.failure_count),
        paths.len()
    );

    for band in &result.paths.percentiles {
        assert!(band.p5 <= band.p25 + 1e-6);
        assert!(band.p25 <= band.p50 + 1e-6);
        assert!(band.p50 <= band.p75 + 1e-6);
        assert!(band.p75 <= band.p95 + 1e-6);
    }

    let outcomes = &result.outcomes;
    assert_eq!(
        outcomes.double_plus + outcomes.profitable + outcomes.loss + outcomes.ruin,
        outcomes.total
    );
}
