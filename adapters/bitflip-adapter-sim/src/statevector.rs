//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use bitflip_ir::{Instruction, InstructionKind, StandardGate};

/// Amplitudes below this magnitude are treated as zero when collapsing.
const COLLAPSE_EPSILON: f64 = 1e-12;

/// A statevector representing a quantum state.
///
/// Basis index bit `k` holds the value of qubit `k`.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Borrow the amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Consume the state, returning the amplitudes.
    pub fn into_amplitudes(self) -> Vec<Complex64> {
        self.amplitudes
    }

    /// Apply a unitary instruction. Measurements and resets are ignored.
    pub fn apply_unitary(&mut self, instruction: &Instruction) {
        if let InstructionKind::Gate(gate) = &instruction.kind {
            let qubits: Vec<_> = instruction.qubits.iter().map(|q| q.0 as usize).collect();
            self.apply_gate(gate.kind, &qubits);
        }
    }

    /// Apply an instruction along a single measurement trajectory.
    ///
    /// `register` holds the classical bits written so far and is updated by
    /// measurements. Conditional gates fire only when their condition holds.
    pub fn apply_shot<R: Rng + ?Sized>(
        &mut self,
        instruction: &Instruction,
        register: &mut [bool],
        rng: &mut R,
    ) {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                if let Some(cond) = &gate.condition {
                    if !cond.is_satisfied(register) {
                        return;
                    }
                }
                let qubits: Vec<_> = instruction.qubits.iter().map(|q| q.0 as usize).collect();
                self.apply_gate(gate.kind, &qubits);
            }
            InstructionKind::Measure => {
                for (qubit, clbit) in instruction.qubits.iter().zip(&instruction.clbits) {
                    let bit = self.measure(qubit.0 as usize, rng);
                    if let Some(slot) = register.get_mut(clbit.0 as usize) {
                        *slot = bit;
                    }
                }
            }
            InstructionKind::Reset => {
                for qubit in &instruction.qubits {
                    let q = qubit.0 as usize;
                    if self.measure(q, rng) {
                        self.apply_x(q);
                    }
                }
            }
            InstructionKind::Barrier { .. } => {}
        }
    }

    /// Apply a standard gate.
    fn apply_gate(&mut self, gate: StandardGate, qubits: &[usize]) {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_phase(qubits[0], PI),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            StandardGate::T => self.apply_phase(qubits[0], PI / 4.0),
            StandardGate::Tdg => self.apply_phase(qubits[0], -PI / 4.0),
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CY => self.apply_cy(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),
            StandardGate::CCX => self.apply_ccx(qubits[0], qubits[1], qubits[2]),
        }
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= phase;
            }
        }
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cy(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let mask = (1 << control) | (1 << target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp = -*amp;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let ctrl_mask = (1 << c1) | (1 << c2);
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask == ctrl_mask) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Probability of reading `qubit` as 1.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Measure one qubit, collapsing the state onto the observed value.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let p1 = self.probability_one(qubit);
        let outcome = rng.r#gen::<f64>() < p1;
        let kept = if outcome { p1 } else { 1.0 - p1 };
        let mask = 1 << qubit;
        let norm = if kept > COLLAPSE_EPSILON {
            kept.sqrt()
        } else {
            1.0
        };
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp /= norm;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        }
        outcome
    }

    /// Sample a full basis-state outcome without collapsing.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.r#gen();

        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }

        self.amplitudes.len() - 1
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitflip_ir::{ClassicalCondition, ClbitId, Gate, QubitId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert_eq!(sv.num_qubits(), 2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        for amp in &sv.amplitudes[1..] {
            assert!(approx_eq(*amp, Complex64::new(0.0, 0.0)));
        }
    }

    #[test]
    fn test_encoding_copies_superposition() {
        let mut sv = Statevector::new(3);
        sv.apply_h(0);
        sv.apply_cx(0, 1);
        sv.apply_cx(0, 2);

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0b000], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[0b111], Complex64::new(sqrt2_inv, 0.0)));
        assert!((sv.probability_one(1) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_x_gate_sets_low_bit() {
        let mut sv = Statevector::new(3);
        sv.apply_unitary(&Instruction::single_qubit_gate(StandardGate::X, QubitId(0)));
        assert!(approx_eq(sv.amplitudes[0b001], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_z_on_minus_state() {
        let mut sv = Statevector::new(1);
        sv.apply_x(0);
        sv.apply_h(0);
        sv.apply_phase(0, PI);
        sv.apply_h(0);
        // Z|−⟩ = |+⟩, so H brings it back to |0⟩.
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sv = Statevector::new(2);
        sv.apply_h(0);
        sv.apply_cx(0, 1);

        let first = sv.measure(0, &mut rng);
        let second = sv.measure(1, &mut rng);
        assert_eq!(first, second);
        let norm: f64 = sv.amplitudes.iter().map(|a| a.norm_sqr()).sum();
        assert!((norm - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_conditional_gate_reads_register() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sv = Statevector::new(1);
        let cond = ClassicalCondition::from_pattern([ClbitId(0)], "1").unwrap();
        let inst = Instruction::gate(Gate::standard(StandardGate::X).with_condition(cond), [QubitId(0)]);

        let mut register = vec![false];
        sv.apply_shot(&inst, &mut register, &mut rng);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));

        register[0] = true;
        sv.apply_shot(&inst, &mut register, &mut rng);
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sv = Statevector::new(1);
        sv.apply_h(0);
        let mut register = Vec::new();
        sv.apply_shot(&Instruction::reset(QubitId(0)), &mut register, &mut rng);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_sample_deterministic() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sv = Statevector::new(2);
        sv.apply_x(1);

        for _ in 0..100 {
            assert_eq!(sv.sample(&mut rng), 0b10);
        }
    }
}
