// src/output.rs
use crate::mc::SimulationResult;
use crate::simulation::PathResult;
use std::fs::File;
use std::io::{self, Write};

/// Writes one row per simulated path: initial/final capital, return,
/// drawdown, ruin flag, breakeven month.
pub fn write_paths_to_csv(filename: &str, paths: &[PathResult]) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(
        file,
        "path_id,initial_capital,final_capital,total_return,max_drawdown,is_ruin,breakeven_month"
    )?;
    for (i, path) in paths.iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            i,
            path.initial_capital,
            path.final_capital,
            path.total_return,
            path.max_drawdown,
            path.is_ruin,
            path.breakeven_month
        )?;
    }
    Ok(())
}

/// Writes the headline summary statistics as `key,value` rows.
pub fn write_summary_to_csv(filename: &str, result: &SimulationResult) -> io::Result<()> {
    let mut file = File::create(filename)?;
    let summary = &result.summary;
    writeln!(file, "metric,value")?;
    writeln!(file, "prob_profit,{}", summary.prob_profit)?;
    writeln!(file, "prob_double,{}", summary.prob_double)?;
    writeln!(file, "prob_ruin,{}", summary.prob_ruin)?;
    writeln!(file, "return_mean,{}", summary.return_mean)?;
    writeln!(file, "return_median,{}", summary.return_median)?;
    writeln!(file, "return_std,{}", summary.return_std)?;
    writeln!(file, "return_p5,{}", summary.return_p5)?;
    writeln!(file, "return_p95,{}", summary.return_p95)?;
    writeln!(file, "var_5,{}", summary.var_5)?;
    writeln!(file, "cvar_5,{}", summary.cvar_5)?;
    writeln!(file, "max_drawdown_mean,{}", summary.max_drawdown_mean)?;
    writeln!(file, "max_drawdown_p95,{}", summary.max_drawdown_p95)?;
    writeln!(
        file,
        "breakeven_mean,{}",
        summary
            .breakeven_mean
            .map(|v| v.to_string())
            .unwrap_or_else(|| "".to_string())
    )?;
    writeln!(file, "breakeven_rate,{}", summary.breakeven_rate)?;
    writeln!(file, "recommendation,{:?}", summary.recommendation)?;
    writeln!(file, "n_simulations,{}", result.meta.n_simulations)?;
    writeln!(file, "time_horizon,{}", result.meta.time_horizon)?;
    writeln!(file, "seed,{}", result.meta.seed.map(|s| s.to_string()).unwrap_or_default())?;
    writeln!(file, "computation_time_ms,{}", result.meta.computation_time_ms)?;
    writeln!(file, "timestamp,{}", result.meta.timestamp.to_rfc3339())?;
    Ok(())
}

/// Writes the per-month percentile bands (5/25/50/75/95) used for the
/// fan chart.
pub fn write_percentile_bands_to_csv(filename: &str, result: &SimulationResult) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "month,p5,p25,p50,p75,p95")?;
    for band in &result.paths.percentiles {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            band.month, band.p5, band.p25, band.p50, band.p75, band.p95
        )?;
    }
    Ok(())
}
