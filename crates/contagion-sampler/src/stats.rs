use contagion_core::{CountColumns, Ensemble, StopReason};

/// Statistical summary of an ensemble of traces
#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleStats {
    pub n_runs: usize,
    pub columns: &'static [&'static str],
    /// Mean of each count column at the last recorded step
    pub mean_final: Vec<f64>,
    /// Mean over runs of each column's maximum along the trace
    pub mean_peak: Vec<f64>,
    pub mean_final_step: f64,
    pub stop_reasons: Vec<(StopReason, usize)>,
}

impl EnsembleStats {
    pub fn from_ensemble<C: CountColumns>(ensemble: &Ensemble<C>) -> Self {
        let columns = C::column_names();
        let traces: Vec<_> = ensemble.traces.iter().filter(|t| !t.is_empty()).collect();

        if traces.is_empty() {
            return Self::empty(columns);
        }

        let dim = columns.len();
        let mut mean_final = vec![0.0; dim];
        let mut mean_peak = vec![0.0; dim];
        let mut step_sum = 0.0;

        for trace in &traces {
            if let Some(last) = trace.final_counts() {
                for (acc, v) in mean_final.iter_mut().zip(last.values()) {
                    *acc += v as f64;
                }
            }

            let mut peaks = vec![0u64; dim];
            for counts in &trace.counts {
                for (peak, v) in peaks.iter_mut().zip(counts.values()) {
                    *peak = (*peak).max(v);
                }
            }
            for (acc, peak) in mean_peak.iter_mut().zip(peaks) {
                *acc += peak as f64;
            }

            step_sum += trace.final_step().unwrap_or(0) as f64;
        }

        let n = traces.len() as f64;
        for value in mean_final.iter_mut().chain(mean_peak.iter_mut()) {
            *value /= n;
        }

        let mut stop_reasons: Vec<(StopReason, usize)> = Vec::new();
        for reason in traces.iter().filter_map(|t| t.stop) {
            match stop_reasons.iter_mut().find(|(r, _)| *r == reason) {
                Some((_, count)) => *count += 1,
                None => stop_reasons.push((reason, 1)),
            }
        }

        Self {
            n_runs: traces.len(),
            columns,
            mean_final,
            mean_peak,
            mean_final_step: step_sum / n,
            stop_reasons,
        }
    }

    fn empty(columns: &'static [&'static str]) -> Self {
        Self {
            n_runs: 0,
            columns,
            mean_final: vec![0.0; columns.len()],
            mean_peak: vec![0.0; columns.len()],
            mean_final_step: 0.0,
            stop_reasons: Vec::new(),
        }
    }

    /// Mean final value of the named column
    pub fn final_of(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| *c == column)?;
        self.mean_final.get(idx).copied()
    }

    /// Mean peak value of the named column
    pub fn peak_of(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| *c == column)?;
        self.mean_peak.get(idx).copied()
    }
}
