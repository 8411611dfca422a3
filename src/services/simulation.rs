//! Periodic event simulation.
//!
//! [`SimulationMachine`] is the whole scheduling policy as a pure transition
//! function: it never touches a timer or the network, it only says what should
//! happen next. [`Simulator`] interprets those effects on tokio, owns the
//! cancellation handle and merges cycle results into the [`StateStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};

use super::inference::ChatClient;
use super::prompts::{event_generation_messages, EnvironmentContext};
use super::validator::parse_event_batch;
use crate::error::{Result, WizardError};
use crate::models::{SimulationSettings, SystemEvent};
use crate::state::{ScenarioState, StateStore};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

const MISSING_KEY_MESSAGE: &str = "Please enter an API key";

// ─── Pure state machine ───

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationStatus {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationInput {
    Start { configured: bool },
    Stop,
    TimerFired { generation: u64 },
    CycleSucceeded { generation: u64, added: usize },
    CycleFailed { generation: u64, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationEffect {
    RunCycle { generation: u64 },
    ScheduleNext { generation: u64, after: Duration },
    CancelTimer,
    Report(String),
}

/// Scheduling state. Each entry into Running gets a fresh generation, and
/// leaving Running bumps it again, so inputs tagged with an older generation
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationMachine {
    status: SimulationStatus,
    generation: u64,
    interval: Duration,
    cycles_completed: u64,
    last_error: Option<String>,
}

impl Default for SimulationMachine {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl SimulationMachine {
    pub fn new(interval: Duration) -> Self {
        Self {
            status: SimulationStatus::Idle,
            generation: 0,
            interval,
            cycles_completed: 0,
            last_error: None,
        }
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.status == SimulationStatus::Running && self.generation == generation
    }

    pub fn step(&self, input: SimulationInput) -> (SimulationMachine, Vec<SimulationEffect>) {
        use SimulationEffect::*;
        use SimulationInput::*;
        use SimulationStatus::*;

        let mut next = self.clone();
        let effects = match (self.status, input) {
            (Idle, Start { configured: false }) => {
                next.last_error = Some(MISSING_KEY_MESSAGE.to_string());
                vec![Report(MISSING_KEY_MESSAGE.to_string())]
            }
            (Idle, Start { configured: true }) => {
                next.status = Running;
                next.generation += 1;
                next.last_error = None;
                vec![RunCycle {
                    generation: next.generation,
                }]
            }
            (Running, Stop) => {
                next.status = Idle;
                next.generation += 1;
                vec![CancelTimer]
            }
            (Running, CycleSucceeded { generation, .. }) if self.is_current(generation) => {
                next.cycles_completed += 1;
                vec![ScheduleNext {
                    generation,
                    after: self.interval,
                }]
            }
            (Running, CycleFailed { generation, message }) if self.is_current(generation) => {
                next.status = Idle;
                next.generation += 1;
                next.last_error = Some(message.clone());
                vec![CancelTimer, Report(message)]
            }
            (Running, TimerFired { generation }) if self.is_current(generation) => {
                vec![RunCycle { generation }]
            }
            // Start while running, stop while idle, and anything stale.
            _ => vec![],
        };
        (next, effects)
    }
}

// ─── Cycle body ───

/// One pass: prompt from `state`, query the model, validate the batch.
pub async fn run_cycle(
    client: &dyn ChatClient,
    state: &ScenarioState,
    env: &EnvironmentContext,
) -> Result<Vec<SystemEvent>> {
    let messages = event_generation_messages(state, env);
    let content = client.complete(&messages, None).await?;
    parse_event_batch(&content)
}

// ─── Driver ───

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationUpdate {
    CycleCompleted {
        generation: u64,
        added: Vec<SystemEvent>,
        history_len: usize,
    },
    /// `reason` is set when a failure stopped the simulation.
    Stopped { reason: Option<String> },
}

struct Shared {
    machine: Mutex<SimulationMachine>,
    store: Arc<StateStore>,
    propagate_device_values: bool,
    cancel: Mutex<Option<watch::Sender<bool>>>,
    updates: broadcast::Sender<SimulationUpdate>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn publish(&self, update: SimulationUpdate) {
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }

    /// Applies a finished cycle. Results from a stale generation are dropped
    /// without touching the store.
    fn settle(&self, generation: u64, outcome: Result<Vec<SystemEvent>>) -> Vec<SimulationEffect> {
        let mut machine = lock(&self.machine);
        if !machine.is_current(generation) {
            log::info!("[Simulation] Discarding result of cancelled cycle {}", generation);
            return vec![];
        }

        let input = match outcome {
            Ok(events) => {
                let added = events.len();
                let snapshot = self
                    .store
                    .apply(|s| s.with_events(events.clone(), self.propagate_device_values));
                log::info!(
                    "[Simulation] Cycle {} added {} event(s), history at {}",
                    generation,
                    added,
                    snapshot.history.len()
                );
                self.publish(SimulationUpdate::CycleCompleted {
                    generation,
                    added: events,
                    history_len: snapshot.history.len(),
                });
                SimulationInput::CycleSucceeded { generation, added }
            }
            Err(err) => {
                log::error!("[Simulation] Cycle {} failed: {}", generation, err);
                SimulationInput::CycleFailed {
                    generation,
                    message: err.user_message(),
                }
            }
        };

        let (next, effects) = machine.step(input);
        *machine = next;
        for effect in &effects {
            match effect {
                SimulationEffect::Report(message) => self.publish(SimulationUpdate::Stopped {
                    reason: Some(message.clone()),
                }),
                SimulationEffect::CancelTimer => {
                    lock(&self.cancel).take();
                }
                _ => {}
            }
        }
        effects
    }

    fn fire_timer(&self, generation: u64) -> bool {
        let mut machine = lock(&self.machine);
        let (next, effects) = machine.step(SimulationInput::TimerFired { generation });
        *machine = next;
        effects
            .iter()
            .any(|e| matches!(e, SimulationEffect::RunCycle { .. }))
    }
}

/// Cycles never overlap within a run: the next one is only scheduled once the
/// previous one has settled.
async fn run_loop(
    shared: Arc<Shared>,
    client: Arc<dyn ChatClient>,
    generation: u64,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        let snapshot = shared.store.snapshot();
        let env = EnvironmentContext::at(&chrono::Local::now());
        let outcome = run_cycle(client.as_ref(), &snapshot, &env).await;

        let effects = shared.settle(generation, outcome);
        let Some(after) = effects.iter().find_map(|e| match e {
            SimulationEffect::ScheduleNext { after, .. } => Some(*after),
            _ => None,
        }) else {
            break;
        };

        tokio::select! {
            _ = tokio::time::sleep(after) => {}
            _ = cancel.changed() => break,
        }

        if !shared.fire_timer(generation) {
            break;
        }
    }
    log::debug!("[Simulation] Run {} finished", generation);
}

/// Cancellable handle over the periodic simulation.
#[derive(Clone)]
pub struct Simulator {
    shared: Arc<Shared>,
}

impl Simulator {
    pub fn new(store: Arc<StateStore>, settings: &SimulationSettings) -> Self {
        let (updates, _) = broadcast::channel(64);
        let interval = Duration::from_secs(settings.interval_secs.max(1));
        Self {
            shared: Arc::new(Shared {
                machine: Mutex::new(SimulationMachine::new(interval)),
                store,
                propagate_device_values: settings.propagate_device_values,
                cancel: Mutex::new(None),
                updates,
            }),
        }
    }

    /// Idle → Running and one cycle right away. Fails with a configuration
    /// error, staying Idle, when `client` has no API key. A no-op if already
    /// running. Must be called from within a tokio runtime.
    pub fn start(&self, client: Arc<dyn ChatClient>) -> Result<()> {
        let mut machine = lock(&self.shared.machine);
        let (next, effects) = machine.step(SimulationInput::Start {
            configured: client.is_configured(),
        });
        *machine = next;

        if machine.status() == SimulationStatus::Idle {
            let message = machine.last_error().unwrap_or(MISSING_KEY_MESSAGE).to_string();
            return Err(WizardError::Configuration(message));
        }

        for effect in effects {
            if let SimulationEffect::RunCycle { generation } = effect {
                let (tx, rx) = watch::channel(false);
                *lock(&self.shared.cancel) = Some(tx);
                log::info!("[Simulation] Started run {}", generation);
                tokio::spawn(run_loop(self.shared.clone(), client.clone(), generation, rx));
            }
        }
        Ok(())
    }

    /// Running → Idle. Clears the pending timer. A request already in flight
    /// is not aborted, but its result is discarded.
    pub fn stop(&self) {
        let mut machine = lock(&self.shared.machine);
        let (next, effects) = machine.step(SimulationInput::Stop);
        *machine = next;
        if effects.contains(&SimulationEffect::CancelTimer) {
            // Dropping the sender wakes the sleeping loop.
            lock(&self.shared.cancel).take();
            log::info!("[Simulation] Stopped");
            self.shared.publish(SimulationUpdate::Stopped { reason: None });
        }
    }

    pub fn status(&self) -> SimulationStatus {
        lock(&self.shared.machine).status()
    }

    pub fn is_running(&self) -> bool {
        self.status() == SimulationStatus::Running
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.machine).last_error().map(str::to_string)
    }

    pub fn cycles_completed(&self) -> u64 {
        lock(&self.shared.machine).cycles_completed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimulationUpdate> {
        self.shared.updates.subscribe()
    }
}
