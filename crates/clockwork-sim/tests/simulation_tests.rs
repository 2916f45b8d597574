//! End-to-end simulation tests
//!
//! Quantization through register writes, two-phase commit semantics,
//! delegation latency, ownership checks, format calibration and output
//! comparison, each driven through `Simulator`.

use clockwork_sim::*;

// ---------------------------------------------------------------------------
// Test modules
// ---------------------------------------------------------------------------

/// Single fixed-point register fed with raw reals
struct Quantizer {
    value: Reg<Sfix>,
}

impl Hardware for Quantizer {
    type Input = f64;
    type Output = Sfix;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: f64) -> SimulationResult<Sfix> {
        let raw = Sfix::exact(input, Overflow::Saturate, Rounding::Round)?;
        cx.set(self.value, raw)?;
        cx.get(self.value)
    }
}

fn quantizer(
    config: SimulationConfig,
    overflow: Overflow,
    rounding: Rounding,
) -> Simulator<Quantizer> {
    Simulator::new("top", config, |scope| {
        Ok(Quantizer {
            value: scope.register("value", Sfix::new(0.0, 0, -4, overflow, rounding)?)?,
        })
    })
    .unwrap()
}

fn observe(sim: &mut Simulator<Quantizer>, inputs: &[f64]) -> Vec<f64> {
    let mut observed = Vec::new();
    for &input in inputs {
        sim.step(input).unwrap();
        observed.push(sim.current(sim.top().value).unwrap().to_f64());
    }
    observed
}

/// One-cycle delay: returns the previous input
struct Delay {
    value: Reg<i64>,
}

impl Hardware for Delay {
    type Input = i64;
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: i64) -> SimulationResult<i64> {
        let previous = cx.get(self.value)?;
        cx.set(self.value, input)?;
        Ok(previous)
    }
}

fn delay(scope: &mut Scope<'_>) -> SimulationResult<Delay> {
    Ok(Delay {
        value: scope.register("value", 0i64)?,
    })
}

/// Delegates to a child and reports the child's register
struct Wrapper {
    child: Instance<Delay>,
}

impl Hardware for Wrapper {
    type Input = i64;
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: i64) -> SimulationResult<i64> {
        cx.call(&self.child, input)?;
        cx.get(self.child.value)
    }
}

fn wrapper(scope: &mut Scope<'_>) -> SimulationResult<Wrapper> {
    Ok(Wrapper {
        child: scope.submodule("child", delay)?,
    })
}

struct Swap {
    a: Reg<i64>,
    b: Reg<i64>,
}

impl Hardware for Swap {
    type Input = ();
    type Output = ();

    fn evaluate(&self, cx: &mut Cycle<'_>, _input: ()) -> SimulationResult<()> {
        let a = cx.get(self.a)?;
        let b = cx.get(self.b)?;
        cx.set(self.a, b)?;
        cx.set(self.b, a)
    }
}

struct Counter {
    count: Reg<i64>,
    step: Const<i64>,
}

impl Hardware for Counter {
    type Input = ();
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, _input: ()) -> SimulationResult<i64> {
        let count = cx.get(self.count)?;
        cx.set(self.count, 100)?;
        cx.set(self.count, count + self.step.get())?;
        Ok(count)
    }
}

fn counter(config: SimulationConfig) -> Simulator<Counter> {
    Simulator::new("top", config, |scope| {
        Ok(Counter {
            step: scope.constant("step", 1i64)?,
            count: scope.register("count", 0i64)?,
        })
    })
    .unwrap()
}

/// Register with a format fixed by calibration
struct Follower {
    x: Reg<Sfix>,
}

impl Hardware for Follower {
    type Input = Sfix;
    type Output = Sfix;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: Sfix) -> SimulationResult<Sfix> {
        cx.set(self.x, input)?;
        cx.get(self.x)
    }
}

fn follower(config: SimulationConfig, spec: FormatSpec) -> Simulator<Follower> {
    Simulator::new("top", config, move |scope| {
        let init = Sfix::exact(0.0, spec.overflow, spec.rounding)?;
        Ok(Follower {
            x: scope.lazy_register("x", init, FieldFormat::Fixed(spec))?,
        })
    })
    .unwrap()
}

fn sfix(value: f64, left: i32, right: i32) -> Sfix {
    Sfix::new(value, left, right, Overflow::Saturate, Rounding::Truncate).unwrap()
}

// ---------------------------------------------------------------------------
// Quantization through register writes
// ---------------------------------------------------------------------------

#[test]
fn test_saturate_round_register_sequence() {
    let mut sim = quantizer(SimulationConfig::default(), Overflow::Saturate, Rounding::Round);
    let inputs = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
    assert_eq!(
        observe(&mut sim, &inputs),
        vec![0.0, 0.125, 0.1875, 0.3125, 0.375, 0.5, 0.625, 0.6875, 0.8125, 0.875]
    );
    assert_eq!(sim.cycle(), 10);
}

#[test]
fn test_wrap_truncate_register_sequence() {
    let mut sim = quantizer(SimulationConfig::default(), Overflow::Wrap, Rounding::Truncate);
    assert_eq!(observe(&mut sim, &[0.9, 1.0, 1.5, 2.0]), vec![0.875, -1.0, -0.5, 0.0]);
}

#[test]
fn test_saturate_truncate_register_sequence() {
    let mut sim = quantizer(SimulationConfig::default(), Overflow::Saturate, Rounding::Truncate);
    assert_eq!(
        observe(&mut sim, &[0.9, 1.0, 1.5, 2.0]),
        vec![0.875, 0.9375, 0.9375, 0.9375]
    );
}

#[test]
fn test_register_keeps_declared_format() {
    let mut sim = quantizer(SimulationConfig::default(), Overflow::Saturate, Rounding::Round);
    sim.step(0.3).unwrap();
    let value = sim.current(sim.top().value).unwrap();
    assert_eq!((value.left(), value.right()), (0, -4));
    assert_eq!(value.rounding(), Rounding::Round);
}

#[test]
fn test_strict_writes_reject_other_formats() {
    let config = SimulationConfig {
        auto_resize: false,
        ..Default::default()
    };
    let mut sim = quantizer(config, Overflow::Saturate, Rounding::Round);
    assert!(matches!(
        sim.step(0.1),
        Err(SimulationError::FormatMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// Two-phase commit
// ---------------------------------------------------------------------------

#[test]
fn test_commit_atomicity() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Swap {
            a: scope.register("a", 1i64)?,
            b: scope.register("b", 2i64)?,
        })
    })
    .unwrap();
    let (a, b) = (sim.top().a, sim.top().b);

    sim.evaluate(()).unwrap();
    // writes are pending, reads in the same cycle saw the old state
    assert_eq!(sim.current(a).unwrap(), 1);
    assert_eq!(sim.pending(a).unwrap(), 2);
    assert_eq!(sim.pending(b).unwrap(), 1);

    sim.commit();
    assert_eq!(sim.current(a).unwrap(), 2);
    assert_eq!(sim.current(b).unwrap(), 1);

    // nothing written since: a second commit changes nothing
    sim.commit();
    assert_eq!(sim.current(a).unwrap(), 2);
    assert_eq!(sim.current(b).unwrap(), 1);
}

#[test]
fn test_last_write_wins() {
    let mut sim = counter(SimulationConfig::default());
    let outputs = sim.run(&[(), (), ()]).unwrap();
    assert_eq!(outputs, vec![0, 1, 2]);
    assert_eq!(sim.current(sim.top().count).unwrap(), 3);
}

#[test]
fn test_reset_restores_initial_values() {
    let mut sim = counter(SimulationConfig::default());
    sim.run(&[(), (), (), ()]).unwrap();
    assert_eq!(sim.current(sim.top().count).unwrap(), 4);

    sim.reset();
    assert_eq!(sim.cycle(), 0);
    assert_eq!(sim.current(sim.top().count).unwrap(), 0);
    assert_eq!(sim.pending(sim.top().count).unwrap(), 0);
    assert_eq!(sim.top().step.get(), 1);
}

#[test]
fn test_constants_are_not_registers() {
    let sim = counter(SimulationConfig::default());
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["top.count"]);

    let description = sim.describe();
    let fields = &description.modules[0].fields;
    assert_eq!(
        fields[0],
        FieldDescription::Constant {
            name: "step".to_string(),
            value: Value::Int(1)
        }
    );
    assert_eq!(fields[1].name(), "count");
}

#[test]
fn test_register_trace_capture() {
    let config = SimulationConfig {
        capture_registers: true,
        ..Default::default()
    };
    let mut sim = counter(config);
    sim.run(&[(), (), ()]).unwrap();

    let trace = sim.trace();
    assert_eq!(trace.len(), 3);
    assert_eq!(trace[2].cycle, 3);
    assert_eq!(trace[0].registers["top.count"], Value::Int(1));
    assert_eq!(trace[2].registers["top.count"], Value::Int(3));

    sim.reset();
    assert!(sim.trace().is_empty());
}

// ---------------------------------------------------------------------------
// Module tree
// ---------------------------------------------------------------------------

#[test]
fn test_delegation_has_one_cycle_latency() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), wrapper).unwrap();
    let outputs = sim.run(&[1, 2, 3, 4]).unwrap();
    assert_eq!(outputs, vec![0, 1, 2, 3]);
    assert_eq!(sim.current(sim.top().child.value).unwrap(), 4);
    assert_eq!(sim.design().lookup("top.child.value").unwrap(), Value::Int(4));
}

struct Cascade {
    stages: Vec<Instance<Delay>>,
}

impl Hardware for Cascade {
    type Input = i64;
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: i64) -> SimulationResult<i64> {
        let mut value = input;
        for stage in &self.stages {
            value = cx.call(stage, value)?;
        }
        Ok(value)
    }
}

#[test]
fn test_submodule_array_cascade() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Cascade {
            stages: scope.submodule_array("stages", 3, |_, stage| delay(stage))?,
        })
    })
    .unwrap();

    let outputs = sim.run(&[1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(outputs, vec![0, 0, 0, 1, 2, 3]);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot["top.stages[0].value"], Value::Int(6));
    assert_eq!(snapshot["top.stages[2].value"], Value::Int(4));
}

struct Delayline {
    taps: ShiftRegister<i64>,
}

impl Hardware for Delayline {
    type Input = i64;
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: i64) -> SimulationResult<i64> {
        self.taps.push_next(cx, input)?;
        self.taps.peek(cx)
    }
}

fn delayline(config: SimulationConfig) -> Simulator<Delayline> {
    Simulator::new("top", config, |scope| {
        Ok(Delayline {
            taps: ShiftRegister::new(scope, "taps", vec![0i64; 3])?,
        })
    })
    .unwrap()
}

#[test]
fn test_shift_register() {
    let mut sim = delayline(SimulationConfig::default());
    let outputs = sim.run(&[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(outputs, vec![0, 0, 0, 1, 2]);
    assert_eq!(
        sim.current_all(sim.top().taps.taps()).unwrap(),
        vec![3, 4, 5]
    );
}

#[test]
fn test_latency_compensation() {
    let config = SimulationConfig {
        latency: 3,
        ..Default::default()
    };
    let mut sim = delayline(config);
    let outputs = sim.run(&[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(outputs, vec![1, 2, 3, 4, 5]);
    assert_eq!(sim.cycle(), 8);
}

#[test]
fn test_complex_register_accumulates() {
    struct Accumulator {
        acc: Reg<Complex>,
    }

    impl Hardware for Accumulator {
        type Input = Complex;
        type Output = Complex;

        fn evaluate(&self, cx: &mut Cycle<'_>, input: Complex) -> SimulationResult<Complex> {
            let acc = cx.get(self.acc)?;
            cx.set(self.acc, acc + input)?;
            Ok(acc)
        }
    }

    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        let zero = Complex::from_parts(0.0, 0.0, 0, -8, Overflow::Saturate, Rounding::Truncate)?;
        Ok(Accumulator {
            acc: scope.register("acc", zero)?,
        })
    })
    .unwrap();

    let step =
        Complex::from_parts(0.25, -0.125, 0, -4, Overflow::Saturate, Rounding::Truncate).unwrap();
    sim.run(&[step; 5]).unwrap();
    let acc = sim.current(sim.top().acc).unwrap();
    // real part saturates at 1 - 2^-8
    assert_eq!(acc.to_f64(), (0.99609375, -0.625));
    assert_eq!((acc.re.left(), acc.re.right()), (0, -8));
}

// ---------------------------------------------------------------------------
// Ownership and configuration errors
// ---------------------------------------------------------------------------

struct Meddler {
    child: Instance<Delay>,
}

impl Hardware for Meddler {
    type Input = ();
    type Output = ();

    fn evaluate(&self, cx: &mut Cycle<'_>, _input: ()) -> SimulationResult<()> {
        cx.set(self.child.value, 1)
    }
}

#[test]
fn test_foreign_write_rejected() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Meddler {
            child: scope.submodule("child", delay)?,
        })
    })
    .unwrap();
    assert_eq!(
        sim.step(()),
        Err(SimulationError::ForeignWrite {
            register: "top.child.value".to_string(),
            scope: "top".to_string()
        })
    );
}

struct Peeker {
    outer: Reg<i64>,
}

impl Hardware for Peeker {
    type Input = ();
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, _input: ()) -> SimulationResult<i64> {
        cx.get(self.outer)
    }
}

struct Outer {
    peeker: Instance<Peeker>,
}

impl Hardware for Outer {
    type Input = ();
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: ()) -> SimulationResult<i64> {
        cx.call(&self.peeker, input)
    }
}

#[test]
fn test_foreign_read_rejected() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        let value = scope.register("value", 7i64)?;
        Ok(Outer {
            peeker: scope.submodule("peeker", |_| Ok(Peeker { outer: value }))?,
        })
    })
    .unwrap();
    assert_eq!(
        sim.step(()),
        Err(SimulationError::ForeignRead {
            register: "top.value".to_string(),
            scope: "top.peeker".to_string()
        })
    );
}

struct Skipper {
    inner: Instance<Wrapper>,
}

impl Hardware for Skipper {
    type Input = i64;
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: i64) -> SimulationResult<i64> {
        cx.call(&self.inner.child, input)
    }
}

#[test]
fn test_foreign_call_rejected() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Skipper {
            inner: scope.submodule("inner", wrapper)?,
        })
    })
    .unwrap();
    assert_eq!(
        sim.step(1),
        Err(SimulationError::ForeignCall {
            module: "top.inner.child".to_string(),
            scope: "top".to_string()
        })
    );
}

struct Taps {
    taps: RegArray<i64>,
}

impl Hardware for Taps {
    type Input = Vec<i64>;
    type Output = i64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: Vec<i64>) -> SimulationResult<i64> {
        let index = input.len();
        cx.set_all(self.taps, input)?;
        cx.get_at(self.taps, index)
    }
}

fn taps() -> Simulator<Taps> {
    Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Taps {
            taps: scope.register_array("taps", vec![0i64; 3])?,
        })
    })
    .unwrap()
}

#[test]
fn test_sequence_length_mismatch() {
    let mut sim = taps();
    assert_eq!(
        sim.step(vec![1, 2]),
        Err(SimulationError::LengthMismatch {
            register: "top.taps".to_string(),
            expected: 3,
            actual: 2
        })
    );
}

#[test]
fn test_sequence_index_out_of_range() {
    let mut sim = taps();
    assert_eq!(
        sim.step(vec![1, 2, 3]),
        Err(SimulationError::IndexOutOfRange {
            register: "top.taps".to_string(),
            index: 3,
            len: 3
        })
    );
}

#[test]
fn test_construction_errors() {
    let duplicate = Simulator::new("top", SimulationConfig::default(), |scope| {
        let count = scope.register("count", 0i64)?;
        scope.register("count", 1i64)?;
        Ok(Counter {
            count,
            step: scope.constant("step", 1i64)?,
        })
    })
    .err();
    assert_eq!(
        duplicate,
        Some(SimulationError::DuplicateField {
            module: "top".to_string(),
            field: "count".to_string()
        })
    );

    let empty = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Taps {
            taps: scope.register_array("taps", Vec::<i64>::new())?,
        })
    })
    .err();
    assert!(matches!(empty, Some(SimulationError::EmptyArray { .. })));

    let mixed = Simulator::new("top", SimulationConfig::default(), |scope| {
        let regs = scope.register_array("regs", vec![sfix(0.0, 0, -4), sfix(0.0, 1, -4)])?;
        Ok(Quantizer {
            value: regs.element(0).unwrap(),
        })
    })
    .err();
    assert!(matches!(mixed, Some(SimulationError::NonHomogeneous { .. })));

    let plain = Simulator::new("top", SimulationConfig::default(), |scope| {
        let spec = FormatSpec::lazy(Overflow::Wrap, Rounding::Round);
        Ok(Delay {
            value: scope.lazy_register("value", 0i64, FieldFormat::Fixed(spec))?,
        })
    })
    .err();
    assert!(matches!(
        plain,
        Some(SimulationError::LazyPlainRegister { .. })
    ));
}

#[test]
fn test_cycle_limit() {
    let config = SimulationConfig {
        max_cycles: 3,
        ..Default::default()
    };
    let mut sim = counter(config);
    assert_eq!(
        sim.run(&[(), (), (), (), ()]),
        Err(SimulationError::CycleLimit {
            requested: 5,
            limit: 3
        })
    );
    assert_eq!(sim.cycle(), 0);
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

#[test]
fn test_evaluate_before_calibration_fails() {
    let config = SimulationConfig {
        auto_calibrate: false,
        ..Default::default()
    };
    let mut sim = follower(config, FormatSpec::lazy(Overflow::Saturate, Rounding::Truncate));
    assert_eq!(sim.readiness(), Readiness::Tentative { runs: 0 });

    let input = sfix(0.1, 2, -27);
    assert_eq!(
        sim.step(input),
        Err(SimulationError::NotReady {
            design: "top".to_string()
        })
    );
    assert!(matches!(
        sim.run(&[input, input]),
        Err(SimulationError::NotReady { .. })
    ));
}

#[test]
fn test_lazy_format_taken_from_calibration() {
    let mut sim = follower(
        SimulationConfig::default(),
        FormatSpec::lazy(Overflow::Saturate, Rounding::Truncate),
    );
    let input = sfix(0.1, 2, -27);
    sim.run(&[input; 3]).unwrap();

    assert!(sim.readiness().is_final());
    let x = sim.top().x;
    assert_eq!(
        sim.design().register_format(x.slot()),
        Some(FieldFormat::Fixed(FormatSpec::new(
            2,
            -27,
            Overflow::Saturate,
            Rounding::Truncate
        )))
    );
    assert_eq!(sim.current(x).unwrap(), input);
    // calibration cycles are not counted: finalize resets the design
    assert_eq!(sim.cycle(), 3);
}

#[test]
fn test_lazy_format_with_declared_left() {
    let spec = FormatSpec::lazy(Overflow::Saturate, Rounding::Truncate).with_left(1);
    let mut sim = follower(SimulationConfig::default(), spec);
    sim.run(&[sfix(0.1, 2, -27); 2]).unwrap();

    let value = sim.current(sim.top().x).unwrap();
    assert_eq!((value.left(), value.right()), (1, -27));
}

#[test]
fn test_lazy_format_with_declared_right() {
    let spec = FormatSpec::lazy(Overflow::Saturate, Rounding::Truncate).with_right(-4);
    let mut sim = follower(SimulationConfig::default(), spec);
    sim.run(&[sfix(0.1, 2, -27); 2]).unwrap();

    let value = sim.current(sim.top().x).unwrap();
    assert_eq!((value.left(), value.right()), (2, -4));
    assert_eq!(value.to_f64(), 0.0625);
}

#[test]
fn test_calibration_needs_two_runs() {
    let mut sim = follower(
        SimulationConfig::default(),
        FormatSpec::lazy(Overflow::Wrap, Rounding::Round),
    );
    assert_eq!(
        sim.calibrate(&[sfix(0.1, 2, -27)]),
        Err(SimulationError::InsufficientCalibration {
            runs: 1,
            required: 2
        })
    );
    assert!(!sim.readiness().is_final());
}

#[test]
fn test_unstable_formats_reported() {
    let mut sim = follower(
        SimulationConfig::default(),
        FormatSpec::lazy(Overflow::Saturate, Rounding::Truncate),
    );
    let result = sim.run(&[sfix(0.1, 2, -27), sfix(0.1, 3, -27)]);
    assert_eq!(
        result,
        Err(SimulationError::UnstableFormats(vec!["top.x".to_string()]))
    );
}

#[test]
fn test_final_design_skips_calibration() {
    let mut sim = counter(SimulationConfig::default());
    assert!(sim.readiness().is_final());
    sim.calibrate(&[(), ()]).unwrap();
    assert_eq!(sim.cycle(), 0);
}

// ---------------------------------------------------------------------------
// Description and comparison
// ---------------------------------------------------------------------------

#[test]
fn test_description_serializes() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Cascade {
            stages: scope.submodule_array("stages", 2, |_, stage| delay(stage))?,
        })
    })
    .unwrap();
    sim.run(&[1, 2]).unwrap();

    let description = sim.describe();
    assert_eq!(description.top, "top");
    assert_eq!(description.modules.len(), 3);
    assert_eq!(
        description.modules[0].submodules,
        vec!["top.stages[0]".to_string(), "top.stages[1]".to_string()]
    );

    let json = serde_json::to_string(&description).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["modules"][0]["fields"][0]["role"], "submodule_array");
    assert_eq!(parsed["modules"][1]["fields"][0]["role"], "register");
    assert_eq!(parsed["modules"][1]["fields"][0]["kind"], "int");
    assert_eq!(parsed["modules"][1]["fields"][0]["format"]["format"], "plain");
}

#[test]
fn test_fixed_description_has_resolved_format() {
    let mut sim = follower(
        SimulationConfig::default(),
        FormatSpec::lazy(Overflow::Wrap, Rounding::Round),
    );
    sim.run(&[sfix(0.5, 0, -8); 2]).unwrap();

    let json = serde_json::to_value(sim.describe()).unwrap();
    let format = &json["modules"][0]["fields"][0]["format"];
    assert_eq!(format["format"], "fixed");
    assert_eq!(format["left"], 0);
    assert_eq!(format["right"], -8);
    assert_eq!(format["overflow"], "wrap");
    assert_eq!(format["rounding"], "round");
}

#[test]
fn test_config_from_json() {
    let config: SimulationConfig = serde_json::from_str(r#"{"latency": 2}"#).unwrap();
    assert_eq!(config.latency, 2);
    assert!(config.auto_resize);
    assert_eq!(config.calibration_runs, 2);
    assert_eq!(config.max_cycles, 1_000_000);
}

#[test]
fn test_outputs_compare_against_reference() {
    let mut sim = quantizer(SimulationConfig::default(), Overflow::Saturate, Rounding::Round);
    let inputs = [0.0, 0.1, 0.2, 0.3];
    let outputs = sim.run(&inputs).unwrap();

    // outputs lag the inputs by one register
    let reference = vec![0.0, 0.0, 0.1, 0.2];
    assert!(sims_close(&outputs, &reference, 0.0, 1.0 / 32.0));

    let comparison = compare(&outputs, &reference, 0.0, 1e-6).unwrap();
    assert!(!comparison.is_close());
    assert_eq!(comparison.mismatches.len(), 2);
    assert!(comparison.generate_report().contains("Samples: 4"));
}

#[test]
fn test_failed_sequence_write_leaves_pending_untouched() {
    struct Pair {
        taps: RegArray<Sfix>,
    }

    impl Hardware for Pair {
        type Input = Vec<Sfix>;
        type Output = ();

        fn evaluate(&self, cx: &mut Cycle<'_>, input: Vec<Sfix>) -> SimulationResult<()> {
            cx.set_all(self.taps, input)
        }
    }

    let config = SimulationConfig {
        auto_resize: false,
        ..Default::default()
    };
    let mut sim = Simulator::new("top", config, |scope| {
        Ok(Pair {
            taps: scope.register_array("taps", vec![sfix(0.0, 0, -4); 2])?,
        })
    })
    .unwrap();

    assert_eq!(
        sim.step(vec![sfix(0.5, 0, -4), sfix(0.5, 0, -8)]),
        Err(SimulationError::FormatMismatch {
            register: "top.taps[1]".to_string(),
            expected: "sfix[0, -4] saturate/truncate".to_string(),
            actual: "sfix[0, -8]".to_string()
        })
    );
    let first = sim.top().taps.element(0).unwrap();
    assert_eq!(sim.pending(first).unwrap().to_f64(), 0.0);

    sim.step(vec![sfix(0.5, 0, -4), sfix(0.25, 0, -4)]).unwrap();
    assert_eq!(
        sim.current_all(sim.top().taps).unwrap(),
        vec![sfix(0.5, 0, -4), sfix(0.25, 0, -4)]
    );
}

// ---------------------------------------------------------------------------
// Lazy register arrays
// ---------------------------------------------------------------------------

struct LazyTaps {
    taps: RegArray<Sfix>,
}

impl Hardware for LazyTaps {
    type Input = Vec<Sfix>;
    type Output = Sfix;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: Vec<Sfix>) -> SimulationResult<Sfix> {
        cx.set_all(self.taps, input)?;
        cx.get_at(self.taps, 0)
    }
}

fn lazy_taps() -> Simulator<LazyTaps> {
    Simulator::new("top", SimulationConfig::default(), |scope| {
        let init = Sfix::exact(0.0, Overflow::Saturate, Rounding::Truncate)?;
        let open = FieldFormat::Fixed(FormatSpec::lazy(Overflow::Saturate, Rounding::Truncate));
        Ok(LazyTaps {
            taps: scope.lazy_register_array("taps", vec![init; 2], open)?,
        })
    })
    .unwrap()
}

#[test]
fn test_lazy_array_elements_must_agree() {
    let mut sim = lazy_taps();
    let input = vec![sfix(0.1, 2, -27), sfix(0.1, 5, -9)];
    assert_eq!(
        sim.run(&[input.clone(), input]),
        Err(SimulationError::UnstableFormats(vec!["top.taps".to_string()]))
    );
    assert!(!sim.readiness().is_final());
}

#[test]
fn test_lazy_array_resolves_and_describes_one_format() {
    let mut sim = lazy_taps();
    let input = vec![sfix(0.1, 2, -27), sfix(-0.3, 2, -27)];
    sim.run(&[input.clone(), input.clone()]).unwrap();

    let taps = sim.top().taps;
    let expected =
        FieldFormat::Fixed(FormatSpec::new(2, -27, Overflow::Saturate, Rounding::Truncate));
    for index in 0..2 {
        let slot = taps.slot(index).unwrap();
        assert_eq!(sim.design().register_format(slot), Some(expected));
    }
    assert_eq!(sim.current_all(taps).unwrap(), input);

    let description = sim.describe();
    assert_eq!(
        description.modules[0].fields[0],
        FieldDescription::RegisterArray {
            name: "taps".to_string(),
            kind: ValueKind::Fixed,
            format: expected,
            len: 2
        }
    );
}

// ---------------------------------------------------------------------------
// Float and enum registers
// ---------------------------------------------------------------------------

#[test]
fn test_float_register() {
    struct Hold {
        a: Reg<f64>,
    }

    impl Hardware for Hold {
        type Input = f64;
        type Output = ();

        fn evaluate(&self, cx: &mut Cycle<'_>, input: f64) -> SimulationResult<()> {
            cx.set(self.a, input)
        }
    }

    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Hold {
            a: scope.register("a", 1.0f64)?,
        })
    })
    .unwrap();
    let a = sim.top().a;

    sim.evaluate(2.0).unwrap();
    assert_eq!(sim.current(a).unwrap(), 1.0);
    sim.commit();
    assert_eq!(sim.current(a).unwrap(), 2.0);
    sim.step(3.0).unwrap();
    assert_eq!(sim.current(a).unwrap(), 3.0);
    assert_eq!(sim.design().lookup("top.a").unwrap(), Value::Float(3.0));
}

/// Float delay line returning its oldest committed element
struct FloatShift {
    a: RegArray<f64>,
}

impl Hardware for FloatShift {
    type Input = f64;
    type Output = f64;

    fn evaluate(&self, cx: &mut Cycle<'_>, input: f64) -> SimulationResult<f64> {
        let current = cx.get_all(self.a)?;
        let mut next = vec![input];
        next.extend_from_slice(&current[..current.len() - 1]);
        cx.set_all(self.a, next)?;
        Ok(current[current.len() - 1])
    }
}

struct FloatCascade {
    shift: Instance<FloatShift>,
    l: RegArray<f64>,
}

impl Hardware for FloatCascade {
    type Input = f64;
    type Output = ();

    fn evaluate(&self, cx: &mut Cycle<'_>, input: f64) -> SimulationResult<()> {
        let last = cx.call(&self.shift, input)?;
        let l = cx.get_all(self.l)?;
        cx.set_all(self.l, vec![last, l[0]])
    }
}

#[test]
fn test_float_list_cascade_register() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(FloatCascade {
            shift: scope.submodule("shift", |child| {
                Ok(FloatShift {
                    a: child.register_array("a", vec![1.0, 2.0, 3.0])?,
                })
            })?,
            l: scope.register_array("l", vec![0.0, 0.0])?,
        })
    })
    .unwrap();
    let l = sim.top().l;

    sim.evaluate(4.0).unwrap();
    assert_eq!(sim.current_all(l).unwrap(), vec![0.0, 0.0]);
    sim.commit();

    sim.step(3.0).unwrap();
    assert_eq!(sim.current_all(l).unwrap(), vec![2.0, 3.0]);
    assert_eq!(
        sim.current_all(sim.top().shift.a).unwrap(),
        vec![3.0, 4.0, 1.0]
    );
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Idle,
    Busy,
}

impl HardwareEnum for Mode {
    const TYPE_NAME: &'static str = "Mode";

    fn index(self) -> u32 {
        self as u32
    }

    fn from_index(index: u32) -> Option<Self> {
        [Mode::Idle, Mode::Busy].get(index as usize).copied()
    }
}

struct Toggle {
    mode: Reg<Mode>,
    rest: Const<Mode>,
}

impl Hardware for Toggle {
    type Input = ();
    type Output = Mode;

    fn evaluate(&self, cx: &mut Cycle<'_>, _input: ()) -> SimulationResult<Mode> {
        let mode = cx.get(self.mode)?;
        let next = match mode {
            Mode::Idle => Mode::Busy,
            Mode::Busy => self.rest.get(),
        };
        cx.set(self.mode, next)?;
        Ok(mode)
    }
}

#[test]
fn test_enum_register_and_constant() {
    let mut sim = Simulator::new("top", SimulationConfig::default(), |scope| {
        Ok(Toggle {
            mode: scope.register("mode", Mode::Idle)?,
            rest: scope.constant("rest", Mode::Idle)?,
        })
    })
    .unwrap();

    let outputs = sim.run(&[(), (), ()]).unwrap();
    assert_eq!(outputs, vec![Mode::Idle, Mode::Busy, Mode::Idle]);
    assert_eq!(
        sim.snapshot()["top.mode"],
        Value::Enum(EnumValue { ty: "Mode", index: 1 })
    );

    let json = serde_json::to_value(sim.describe()).unwrap();
    let fields = &json["modules"][0]["fields"];
    assert_eq!(fields[0]["kind"], "enum");
    assert_eq!(fields[1]["role"], "constant");
    assert_eq!(fields[1]["value"]["Enum"]["ty"], "Mode");
    assert_eq!(fields[1]["value"]["Enum"]["index"], 0);
}

/// Module with no behavior, used to exercise field declarations
struct Bare;

impl Hardware for Bare {
    type Input = ();
    type Output = ();

    fn evaluate(&self, _cx: &mut Cycle<'_>, _input: ()) -> SimulationResult<()> {
        Ok(())
    }
}

#[test]
fn test_declared_format_must_match_kind() {
    let lazy_float = Simulator::new("top", SimulationConfig::default(), |scope| {
        let open = FieldFormat::Fixed(FormatSpec::lazy(Overflow::Wrap, Rounding::Round));
        scope.lazy_register("f", 0.5f64, open)?;
        Ok(Bare)
    })
    .err();
    assert_eq!(
        lazy_float,
        Some(SimulationError::LazyPlainRegister {
            field: "top.f".to_string(),
            kind: ValueKind::Float
        })
    );

    let plain_fixed = Simulator::new("top", SimulationConfig::default(), |scope| {
        scope.lazy_register("x", sfix(0.0, 0, -4), FieldFormat::Plain)?;
        Ok(Bare)
    })
    .err();
    assert_eq!(
        plain_fixed,
        Some(SimulationError::PlainFormatMismatch {
            field: "top.x".to_string(),
            kind: ValueKind::Fixed
        })
    );
}
