//! Simulator backend implementation.

use async_trait::async_trait;
use num_complex::Complex64;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use bitflip_hal::{
    Backend, Capabilities, Counts, ExecutionResult, HalError, HalResult, Job, JobId, JobStatus,
    StatevectorBackend,
};
use bitflip_ir::{Circuit, Instruction};

use crate::statevector::Statevector;

/// Largest register the simulator will allocate (2^26 amplitudes, 1 GiB).
pub const MAX_QUBITS: u32 = 26;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Local simulator backend.
///
/// Circuits whose measurements all sit at the end are evolved once and
/// sampled; anything with mid-circuit measurement, reset or classically
/// conditioned gates is simulated one trajectory per shot.
///
/// A job is dropped from the job table once its result has been collected.
pub struct SimulatorBackend {
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Jobs whose results have not been collected yet.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Fixed RNG seed for reproducible runs.
    seed: Option<u64>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            capabilities: Capabilities::simulator(max_qubits.min(MAX_QUBITS)),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            seed: None,
        }
    }

    /// Seed the sampler so repeated runs produce identical counts.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn check_size(&self, circuit: &Circuit) -> HalResult<()> {
        let max = self.capabilities.num_qubits as usize;
        if circuit.num_qubits() > max {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                max
            )));
        }
        Ok(())
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits();
        let num_clbits = circuit.num_clbits();
        debug!(
            "Starting simulation: {} qubits, {} clbits, {} shots",
            num_qubits, num_clbits, shots
        );

        let instructions: Vec<Instruction> = circuit
            .dag()
            .topological_ops()
            .map(|(_, inst)| inst.clone())
            .collect();

        let mut rng = self.rng();
        let mut counts = Counts::new();

        if measurements_are_terminal(&instructions) {
            debug!("Terminal measurements only, sampling one evolved state");
            let mut sv = Statevector::new(num_qubits);
            let mut measured = Vec::new();
            for inst in &instructions {
                if inst.is_measure() {
                    measured.extend(inst.qubits.iter().zip(&inst.clbits));
                } else {
                    sv.apply_unitary(inst);
                }
            }
            for _ in 0..shots {
                let outcome = sv.sample(&mut rng);
                let mut register = vec![false; num_clbits];
                for (qubit, clbit) in &measured {
                    if let Some(slot) = register.get_mut(clbit.0 as usize) {
                        *slot = outcome & (1 << qubit.0) != 0;
                    }
                }
                counts.insert(register_to_bitstring(&register), 1);
            }
        } else {
            debug!("Classical feedback present, simulating per shot");
            for shot in 0..shots {
                let mut sv = Statevector::new(num_qubits);
                let mut register = vec![false; num_clbits];
                for inst in &instructions {
                    sv.apply_shot(inst, &mut register, &mut rng);
                }
                counts.insert(register_to_bitstring(&register), 1);

                if shot > 0 && shot % 1000 == 0 {
                    debug!("Completed {} shots", shot);
                }
            }
        }

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = elapsed.as_millis() as u64;
        ExecutionResult::new(counts, shots).with_execution_time(elapsed_ms)
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of jobs whose results have not been collected.
    pub fn pending_jobs(&self) -> usize {
        self.lock_jobs().len()
    }
}

/// True when no gate, reset or conditional follows a measurement.
fn measurements_are_terminal(instructions: &[Instruction]) -> bool {
    let mut seen_measure = false;
    for inst in instructions {
        if inst.is_reset() || inst.condition().is_some() {
            return false;
        }
        if inst.is_measure() {
            seen_measure = true;
        } else if seen_measure && inst.is_gate() {
            return false;
        }
    }
    true
}

/// Render a classical register with bit 0 first.
fn register_to_bitstring(register: &[bool]) -> String {
    register.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        self.check_size(circuit)?;
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} (allowed 1..={})",
                self.capabilities.max_shots
            )));
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut job = Job::new(job_id.clone(), circuit.name(), shots);
        job.transition(JobStatus::Running);
        self.lock_jobs()
            .insert(job_id.0.clone(), SimJob { job, result: None });

        debug!("Submitted job: {}", job_id);

        let result = self.run_simulation(circuit, shots);

        if let Some(sim_job) = self.lock_jobs().get_mut(&job_id.0) {
            sim_job.result = Some(result);
            sim_job.job.transition(JobStatus::Completed);
        }

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.lock_jobs()
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = self.lock_jobs();
        let finished = jobs.get(&job_id.0).is_some_and(|j| j.result.is_some());
        if !finished {
            return Err(HalError::JobNotFound(job_id.0.clone()));
        }
        jobs.remove(&job_id.0)
            .and_then(|j| j.result)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }
}

#[async_trait]
impl StatevectorBackend for SimulatorBackend {
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    async fn statevector(&self, circuit: &Circuit) -> HalResult<Vec<Complex64>> {
        self.check_size(circuit)?;
        let mut sv = Statevector::new(circuit.num_qubits());
        for (_, inst) in circuit.dag().topological_ops() {
            if inst.is_measure() || inst.is_reset() || inst.condition().is_some() {
                return Err(HalError::Unsupported(format!(
                    "statevector of a circuit containing '{}'",
                    inst.name()
                )));
            }
            sv.apply_unitary(inst);
        }
        Ok(sv.into_amplitudes())
    }
}
