use enum_dispatch::enum_dispatch;
use ndarray::{Array1, Array2};
use ndarray_linalg::{Norm, Solve};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{dataset::Method, error::{PlotError, Result}, type_lib::NumericData};

const NEWTON_TOLERANCE: NumericData = 1e-10;
const NEWTON_MAX_STEPS: usize = 10;

/// Right-hand side of `y' = f(t, y)`.
pub trait OdeFunction: Sync {
    fn dim(&self) -> usize;
    fn evaluate(&self, t: NumericData, x: &Array1<NumericData>, f: &mut Array1<NumericData>);
    /// Jacobian `df/dx`.
    fn evaluate_deriv(&self, t: NumericData, x: &Array1<NumericData>, df: &mut Array2<NumericData>);

    /// Output row for the state at time `t`.
    fn record(&self, t: NumericData, x: &Array1<NumericData>) -> Vec<NumericData> {
        std::iter::once(t).chain(x.iter().copied()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassSpring {
    pub mass: NumericData,
    pub stiffness: NumericData,
}

impl Default for MassSpring {
    fn default() -> Self {
        MassSpring { mass: 1.0, stiffness: 1.0 }
    }
}

impl OdeFunction for MassSpring {
    fn dim(&self) -> usize {
        2
    }

    fn evaluate(&self, _t: NumericData, x: &Array1<NumericData>, f: &mut Array1<NumericData>) {
        f[0] = x[1];
        f[1] = -self.stiffness / self.mass * x[0];
    }

    fn evaluate_deriv(&self, _t: NumericData, _x: &Array1<NumericData>, df: &mut Array2<NumericData>) {
        df.fill(0.0);
        df[[0, 1]] = 1.0;
        df[[1, 0]] = -self.stiffness / self.mass;
    }
}

/// Capacitor charged through a resistor by `U_0(t) = cos(2 pi f t)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcCircuit {
    pub resistance: NumericData,
    pub capacitance: NumericData,
    pub frequency: NumericData,
}

impl Default for RcCircuit {
    fn default() -> Self {
        RcCircuit { resistance: 1000.0, capacitance: 1e-6, frequency: 50.0 }
    }
}

impl RcCircuit {
    pub fn source(&self, t: NumericData) -> NumericData {
        (2.0 * std::f64::consts::PI * self.frequency * t).cos()
    }
}

impl OdeFunction for RcCircuit {
    fn dim(&self) -> usize {
        1
    }

    fn evaluate(&self, t: NumericData, x: &Array1<NumericData>, f: &mut Array1<NumericData>) {
        f[0] = (self.source(t) - x[0]) / (self.resistance * self.capacitance);
    }

    fn evaluate_deriv(&self, _t: NumericData, _x: &Array1<NumericData>, df: &mut Array2<NumericData>) {
        df[[0, 0]] = -1.0 / (self.resistance * self.capacitance);
    }

    fn record(&self, t: NumericData, x: &Array1<NumericData>) -> Vec<NumericData> {
        vec![t, self.source(t), x[0]]
    }
}

/// Planar pendulum, x = (angle, angular velocity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pendulum {
    pub length: NumericData,
    pub gravity: NumericData,
}

impl Default for Pendulum {
    fn default() -> Self {
        Pendulum { length: 1.0, gravity: 9.81 }
    }
}

impl OdeFunction for Pendulum {
    fn dim(&self) -> usize {
        2
    }

    fn evaluate(&self, _t: NumericData, x: &Array1<NumericData>, f: &mut Array1<NumericData>) {
        f[0] = x[1];
        f[1] = -self.gravity / self.length * x[0].sin();
    }

    fn evaluate_deriv(&self, _t: NumericData, x: &Array1<NumericData>, df: &mut Array2<NumericData>) {
        df.fill(0.0);
        df[[0, 1]] = 1.0;
        df[[1, 0]] = -self.gravity / self.length * x[0].cos();
    }
}

#[enum_dispatch]
pub trait TimeStepperTrait {
    /// Advances `y` from `t` to `t + tau`.
    fn do_step(&mut self, rhs: &dyn OdeFunction, t: NumericData, tau: NumericData, y: &mut Array1<NumericData>) -> Result<()>;
}

#[enum_dispatch(TimeStepperTrait)]
pub enum TimeStepperKinds {
    ExplicitEuler(ExplicitEuler),
    ImprovedEuler(ImprovedEuler),
    ImplicitEuler(ImplicitEuler),
    CrankNicolson(CrankNicolson),
}

impl TimeStepperKinds {
    pub fn for_method(method: Method) -> Self {
        match method {
            Method::Explicit => ExplicitEuler.into(),
            Method::Improved => ImprovedEuler.into(),
            Method::Implicit => ImplicitEuler.into(),
            Method::Crank => CrankNicolson.into(),
        }
    }
}

pub struct ExplicitEuler;

impl TimeStepperTrait for ExplicitEuler {
    fn do_step(&mut self, rhs: &dyn OdeFunction, t: NumericData, tau: NumericData, y: &mut Array1<NumericData>) -> Result<()> {
        let mut f = Array1::zeros(rhs.dim());
        rhs.evaluate(t, y, &mut f);
        y.scaled_add(tau, &f);
        Ok(())
    }
}

/// Midpoint rule.
pub struct ImprovedEuler;

impl TimeStepperTrait for ImprovedEuler {
    fn do_step(&mut self, rhs: &dyn OdeFunction, t: NumericData, tau: NumericData, y: &mut Array1<NumericData>) -> Result<()> {
        let mut f = Array1::zeros(rhs.dim());
        rhs.evaluate(t, y, &mut f);
        let mut y_half = y.clone();
        y_half.scaled_add(tau / 2.0, &f);
        rhs.evaluate(t + tau / 2.0, &y_half, &mut f);
        y.scaled_add(tau, &f);
        Ok(())
    }
}

pub struct ImplicitEuler;

impl TimeStepperTrait for ImplicitEuler {
    fn do_step(&mut self, rhs: &dyn OdeFunction, t: NumericData, tau: NumericData, y: &mut Array1<NumericData>) -> Result<()> {
        let y_old = y.clone();
        let offset = Array1::zeros(rhs.dim());
        newton_solve(rhs, t + tau, tau, &y_old, &offset, y)?;
        Ok(())
    }
}

pub struct CrankNicolson;

impl TimeStepperTrait for CrankNicolson {
    fn do_step(&mut self, rhs: &dyn OdeFunction, t: NumericData, tau: NumericData, y: &mut Array1<NumericData>) -> Result<()> {
        let y_old = y.clone();
        let mut f_old = Array1::zeros(rhs.dim());
        rhs.evaluate(t, &y_old, &mut f_old);
        let offset = f_old * (tau / 2.0);
        newton_solve(rhs, t + tau, tau / 2.0, &y_old, &offset, y)?;
        Ok(())
    }
}

/// Solves `y - y_old - offset - weight * f(t, y) = 0` in place, starting from `y`.
/// Returns the number of corrections applied.
fn newton_solve(rhs: &dyn OdeFunction, t: NumericData, weight: NumericData, y_old: &Array1<NumericData>, offset: &Array1<NumericData>, y: &mut Array1<NumericData>) -> Result<usize> {
    let n = rhs.dim();
    let mut f = Array1::zeros(n);
    let mut df = Array2::zeros((n, n));

    for iteration in 0..NEWTON_MAX_STEPS {
        let residual = newton_residual(rhs, t, weight, y_old, offset, y, &mut f);
        if residual.norm_l2() < NEWTON_TOLERANCE {
            return Ok(iteration);
        }

        rhs.evaluate_deriv(t, y, &mut df);
        let jacobian = Array2::<NumericData>::eye(n) - &df * weight;
        let correction = jacobian.solve(&residual)?;
        *y -= &correction;
    }

    let residual = newton_residual(rhs, t, weight, y_old, offset, y, &mut f).norm_l2();
    if residual < NEWTON_TOLERANCE {
        return Ok(NEWTON_MAX_STEPS);
    }
    Err(PlotError::Convergence { iterations: NEWTON_MAX_STEPS, residual })
}

fn newton_residual(rhs: &dyn OdeFunction, t: NumericData, weight: NumericData, y_old: &Array1<NumericData>, offset: &Array1<NumericData>, y: &Array1<NumericData>, f: &mut Array1<NumericData>) -> Array1<NumericData> {
    rhs.evaluate(t, y, f);
    y - y_old - offset - &*f * weight
}

/// Integrates from `t = 0` to `t_end` in `steps` equal steps; one row per time point.
pub fn integrate(rhs: &dyn OdeFunction, stepper: &mut TimeStepperKinds, y0: &Array1<NumericData>, t_end: NumericData, steps: usize) -> Result<Array2<NumericData>> {
    if steps == 0 {
        return Err(PlotError::Config("step count must be positive".to_string()));
    }
    if y0.len() != rhs.dim() {
        return Err(PlotError::Config(format!("initial state has {} entries, system needs {}", y0.len(), rhs.dim())));
    }

    let tau = t_end / steps as NumericData;
    let mut y = y0.clone();
    let mut rows = rhs.record(0.0, &y);
    let width = rows.len();
    rows.reserve(width * steps);

    for i in 0..steps {
        stepper.do_step(rhs, i as NumericData * tau, tau, &mut y)?;
        rows.extend(rhs.record((i + 1) as NumericData * tau, &y));
    }
    debug!(steps, tau, "integration finished");

    Ok(Array2::from_shape_vec((steps + 1, width), rows)?)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;

    fn run(method: Method, steps: usize) -> Array2<NumericData> {
        let mut stepper = TimeStepperKinds::for_method(method);
        integrate(&MassSpring::default(), &mut stepper, &array![1.0, 0.0], 4.0 * PI, steps).unwrap()
    }

    fn energy(row: ndarray::ArrayView1<NumericData>) -> NumericData {
        row[1] * row[1] + row[2] * row[2]
    }

    #[test]
    fn explicit_euler_first_step() {
        let mut y = array![1.0, 0.0];
        ExplicitEuler.do_step(&MassSpring::default(), 0.0, 0.1, &mut y).unwrap();
        assert_abs_diff_eq!(y[0], 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(y[1], -0.1, epsilon = 1e-14);
    }

    #[test]
    fn implicit_euler_matches_the_linear_solve() {
        // (I - tau A) y1 = y0 with A = [[0, 1], [-1, 0]]
        let tau = 0.1;
        let mut y = array![1.0, 0.0];
        ImplicitEuler.do_step(&MassSpring::default(), 0.0, tau, &mut y).unwrap();
        let det = 1.0 + tau * tau;
        assert_abs_diff_eq!(y[0], 1.0 / det, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], -tau / det, epsilon = 1e-12);
    }

    #[test]
    fn table_layout() {
        let table = run(Method::Explicit, 100);
        assert_eq!(table.shape(), &[101, 3]);
        assert_abs_diff_eq!(table[[0, 0]], 0.0);
        assert_abs_diff_eq!(table[[100, 0]], 4.0 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(table[[0, 1]], 1.0);
    }

    #[test]
    fn energy_behaviour_per_method() {
        let steps = 150;
        let start = 1.0;
        let explicit = energy(run(Method::Explicit, steps).row(steps));
        let implicit = energy(run(Method::Implicit, steps).row(steps));
        let crank = energy(run(Method::Crank, steps).row(steps));

        assert!(explicit > start);
        assert!(implicit < start);
        assert_abs_diff_eq!(crank, start, epsilon = 1e-9);
    }

    #[test]
    fn higher_order_methods_track_the_exact_solution() {
        let steps = 400;
        let t_end = 4.0 * PI;
        for method in [Method::Improved, Method::Crank] {
            let table = run(method, steps);
            assert_abs_diff_eq!(table[[steps, 1]], t_end.cos(), epsilon = 5e-3);
        }
    }

    #[test]
    fn circuit_rows_carry_the_source_voltage() {
        let circuit = RcCircuit::default();
        let mut stepper = TimeStepperKinds::for_method(Method::Implicit);
        let table = integrate(&circuit, &mut stepper, &array![0.0], 0.1, 100).unwrap();
        assert_eq!(table.shape(), &[101, 3]);
        for row in table.rows() {
            assert_abs_diff_eq!(row[1], circuit.source(row[0]), epsilon = 1e-12);
            assert!(row[2].abs() <= 1.0);
        }
    }

    #[test]
    fn pendulum_jacobian_matches_the_analytic_one() {
        let pendulum = Pendulum::default();
        let x = array![PI / 4.0, 0.5];

        let mut f = Array1::zeros(2);
        pendulum.evaluate(0.0, &x, &mut f);
        assert_abs_diff_eq!(f[0], 0.5);
        assert_abs_diff_eq!(f[1], -9.81 * (PI / 4.0).sin(), epsilon = 1e-12);

        let mut df = Array2::zeros((2, 2));
        pendulum.evaluate_deriv(0.0, &x, &mut df);
        assert_abs_diff_eq!(df[[0, 0]], 0.0);
        assert_abs_diff_eq!(df[[0, 1]], 1.0);
        assert_abs_diff_eq!(df[[1, 0]], -6.936717523, epsilon = 1e-8);
        assert_abs_diff_eq!(df[[1, 1]], 0.0);
    }

    #[test]
    fn implicit_pendulum_step_needs_several_newton_iterations() {
        let pendulum = Pendulum::default();
        let tau = 0.2;
        let y_old = array![PI / 4.0, 0.5];
        let mut y = y_old.clone();
        let iterations = newton_solve(&pendulum, tau, tau, &y_old, &Array1::zeros(2), &mut y).unwrap();
        assert!(iterations > 1, "took {iterations} iterations");

        let mut f = Array1::zeros(2);
        pendulum.evaluate(tau, &y, &mut f);
        assert_abs_diff_eq!(y[0], y_old[0] + tau * f[0], epsilon = 1e-9);
        assert_abs_diff_eq!(y[1], y_old[1] + tau * f[1], epsilon = 1e-9);
    }

    #[test]
    fn pendulum_crank_nicolson_keeps_its_energy() {
        let pendulum = Pendulum::default();
        let mut stepper = TimeStepperKinds::for_method(Method::Crank);
        let table = integrate(&pendulum, &mut stepper, &array![PI / 4.0, 0.0], 10.0, 1000).unwrap();
        let energy = |row: ndarray::ArrayView1<NumericData>| 0.5 * row[2] * row[2] - 9.81 * row[1].cos();
        assert_abs_diff_eq!(energy(table.row(1000)), energy(table.row(0)), epsilon = 1e-3);
    }

    /// f(x) = x, but reports a zero Jacobian, so Newton degrades to a
    /// diverging fixed-point iteration for weights above one.
    struct WrongJacobian;

    impl OdeFunction for WrongJacobian {
        fn dim(&self) -> usize {
            1
        }

        fn evaluate(&self, _t: NumericData, x: &Array1<NumericData>, f: &mut Array1<NumericData>) {
            f[0] = x[0];
        }

        fn evaluate_deriv(&self, _t: NumericData, _x: &Array1<NumericData>, df: &mut Array2<NumericData>) {
            df.fill(0.0);
        }
    }

    #[test]
    fn newton_reports_non_convergence() {
        let mut y = array![1.0];
        let err = ImplicitEuler.do_step(&WrongJacobian, 0.0, 2.0, &mut y).unwrap_err();
        match err {
            PlotError::Convergence { iterations, residual } => {
                assert_eq!(iterations, NEWTON_MAX_STEPS);
                assert!(residual > NEWTON_TOLERANCE);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zero_steps_rejected() {
        let mut stepper = TimeStepperKinds::for_method(Method::Crank);
        assert!(integrate(&MassSpring::default(), &mut stepper, &array![1.0, 0.0], 1.0, 0).is_err());
        assert!(integrate(&MassSpring::default(), &mut stepper, &array![1.0], 1.0, 5).is_err());
    }
}
