//! Simulation driver
//!
//! Runs the strict `evaluate -> commit` sequence over a module tree, one pair
//! per simulated clock cycle, and handles calibration of open formats.

use crate::calibration::{Readiness, MIN_CALIBRATION_RUNS};
use crate::cycle::Cycle;
use crate::description::DesignDescription;
use crate::design::Design;
use crate::error::{SimulationError, SimulationResult};
use crate::module::{Hardware, Instance, Scope};
use crate::register::{Reg, RegArray};
use crate::value::{Signal, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Requantize register writes to the declared format; when off, a format
    /// difference is an error
    pub auto_resize: bool,
    /// Evaluations recorded before formats are finalized (at least 2)
    pub calibration_runs: usize,
    /// Let `run` calibrate on its leading inputs when formats are open
    pub auto_calibrate: bool,
    /// Output latency in cycles
    pub latency: usize,
    /// Record every register after each commit
    pub capture_registers: bool,
    pub max_cycles: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            auto_resize: true,
            calibration_runs: MIN_CALIBRATION_RUNS,
            auto_calibrate: true,
            latency: 0,
            capture_registers: false,
            max_cycles: 1_000_000,
        }
    }
}

/// Register values after one commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterSnapshot {
    pub cycle: u64,
    pub registers: IndexMap<String, Value>,
}

pub struct Simulator<H: Hardware> {
    name: String,
    design: Design,
    top: Instance<H>,
    config: SimulationConfig,
    cycle: u64,
    trace: Vec<RegisterSnapshot>,
}

impl<H: Hardware> Simulator<H> {
    /// Build the top module `name` and wrap it in a simulator
    pub fn new<F>(name: &str, config: SimulationConfig, build: F) -> SimulationResult<Self>
    where
        F: FnOnce(&mut Scope<'_>) -> SimulationResult<H>,
    {
        let mut design = Design::new();
        let id = design.add_module(name, name.to_string(), None);
        let inner = build(&mut Scope::new(&mut design, id))?;

        info!(
            "Built design '{}': {} modules, {} registers, {:?}",
            name,
            design.module_count(),
            design.register_count(),
            design.readiness()
        );

        Ok(Self {
            name: name.to_string(),
            design,
            top: Instance::new(id, inner),
            config,
            cycle: 0,
            trace: Vec::new(),
        })
    }

    /// Evaluate the top module without committing
    pub fn evaluate(&mut self, input: H::Input) -> SimulationResult<H::Output> {
        if !self.design.readiness().is_final() {
            return Err(SimulationError::NotReady {
                design: self.name.clone(),
            });
        }
        self.evaluate_with(input, false)
    }

    fn evaluate_with(&mut self, input: H::Input, tentative: bool) -> SimulationResult<H::Output> {
        let mut cx = Cycle::new(
            &mut self.design,
            self.top.id(),
            self.config.auto_resize,
            tentative,
        );
        self.top.evaluate(&mut cx, input)
    }

    /// Copy every pending value into `current` across the whole tree
    pub fn commit(&mut self) {
        self.design.commit_all(self.top.id());
        self.cycle += 1;
        if self.config.capture_registers {
            self.trace.push(RegisterSnapshot {
                cycle: self.cycle,
                registers: self.design.snapshot(),
            });
        }
    }

    /// One clock cycle: evaluate, then commit
    pub fn step(&mut self, input: H::Input) -> SimulationResult<H::Output> {
        let output = self.evaluate(input)?;
        self.commit();
        Ok(output)
    }

    /// Restore every register to its initial value
    pub fn reset(&mut self) {
        self.design.reset_all(self.top.id());
        self.cycle = 0;
        self.trace.clear();
        info!("Reset design '{}'", self.name);
    }

    /// Fix open formats from the calibration runs recorded so far
    pub fn finalize(&mut self) -> SimulationResult<()> {
        let required = self.required_runs();
        self.design.finalize(self.top.id(), required)?;
        self.cycle = 0;
        self.trace.clear();
        Ok(())
    }

    fn required_runs(&self) -> usize {
        self.config.calibration_runs.max(MIN_CALIBRATION_RUNS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn readiness(&self) -> Readiness {
        self.design.readiness()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Snapshots captured since the last reset (see `capture_registers`)
    pub fn trace(&self) -> &[RegisterSnapshot] {
        &self.trace
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn top(&self) -> &Instance<H> {
        &self.top
    }

    pub fn describe(&self) -> DesignDescription {
        self.design.describe(self.top.id())
    }

    pub fn current<T: Signal>(&self, reg: Reg<T>) -> SimulationResult<T> {
        self.design.current(reg)
    }

    pub fn current_all<T: Signal>(&self, reg: RegArray<T>) -> SimulationResult<Vec<T>> {
        self.design.current_all(reg)
    }

    pub fn pending<T: Signal>(&self, reg: Reg<T>) -> SimulationResult<T> {
        self.design.pending(reg)
    }

    pub fn snapshot(&self) -> IndexMap<String, Value> {
        self.design.snapshot()
    }
}

impl<H> Simulator<H>
where
    H: Hardware,
    H::Input: Clone,
{
    /// Evaluate and commit the leading `calibration_runs` inputs with open
    /// formats recorded, then finalize. Does nothing on a final design.
    pub fn calibrate(&mut self, inputs: &[H::Input]) -> SimulationResult<()> {
        if self.design.readiness().is_final() {
            debug!("Design '{}' has no open formats to calibrate", self.name);
            return Ok(());
        }
        let required = self.required_runs();
        for (run, input) in inputs.iter().take(required).enumerate() {
            self.evaluate_with(input.clone(), true)?;
            self.commit();
            self.design.record_run();
            debug!("Calibration run {} of {} on '{}'", run + 1, required, self.name);
        }
        self.finalize()
    }

    /// Simulate one cycle per input, continuing from the current state.
    ///
    /// With a configured latency the last input is repeated `latency` more
    /// times and the first `latency` outputs are dropped, so the result lines
    /// up with `inputs`.
    pub fn run(&mut self, inputs: &[H::Input]) -> SimulationResult<Vec<H::Output>> {
        let Some(last) = inputs.last() else {
            return Ok(Vec::new());
        };
        let latency = self.config.latency;
        let requested = (inputs.len() + latency) as u64;
        if requested > self.config.max_cycles {
            return Err(SimulationError::CycleLimit {
                requested,
                limit: self.config.max_cycles,
            });
        }

        if !self.design.readiness().is_final() {
            if !self.config.auto_calibrate {
                return Err(SimulationError::NotReady {
                    design: self.name.clone(),
                });
            }
            self.calibrate(inputs)?;
        }

        let mut outputs = Vec::with_capacity(inputs.len() + latency);
        for input in inputs.iter().chain(std::iter::repeat(last).take(latency)) {
            outputs.push(self.step(input.clone())?);
        }
        outputs.drain(..latency);

        info!("Simulated {} cycles of '{}'", requested, self.name);
        Ok(outputs)
    }
}
