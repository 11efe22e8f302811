//! # ACO Controller
//!
//! The outer search loop.
//!
//! ```text
//!   INIT ──baseline ant (random rule)──▶ ITERATING ──depth > max_depth──▶ DONE
//!     │                                    ▲    │
//!     └──────── resumed: skip baseline ────┘    └─ one round per step():
//!                                                  ants → rank → best → global
//!                                                  update → depth+1 → checkpoint
//! ```
//!
//! Ants of one round are generated and evaluated strictly in order. Each
//! successful ant gets its local update before the next ant walks, so later
//! ants see earlier ants' decay. The global update waits until the round is
//! ranked and touches only the best ant's path.

mod ant;
mod checkpoint;

use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::{Metric, PathShape, SearchConfig};
use crate::evaluator::Evaluator;
use crate::graph::Graph;
use crate::model::PathNode;
use crate::pheromone::UpdateRule;
use crate::selection::{AcoSelect, RandomSelect, SelectionRule};
use crate::storage::Persistence;
use crate::{Error, Result};

pub use ant::Ant;
pub use checkpoint::Checkpoint;

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Init,
    Iterating,
    Done,
}

/// Ant Colony Optimization over a [`Graph`].
pub struct Aco<E, P> {
    config: SearchConfig,
    graph: Graph,
    evaluator: E,
    storage: P,
    rng: ChaCha8Rng,
    best_ant: Option<Ant>,
    iteration: usize,
    state: SearchState,
    resumed: bool,
}

impl<E, P> Aco<E, P>
where
    E: Evaluator,
    P: Persistence<E::Artifact>,
{
    // ========================================================================
    // Construction
    // ========================================================================

    /// Fresh search. The graph starts at `config.min_depth`.
    pub fn new(config: SearchConfig, catalog: Arc<dyn Catalog>, evaluator: E, storage: P) -> Result<Self> {
        check(&config, catalog.as_ref())?;
        let graph = Graph::with_depth(catalog, config.pheromone.start, config.min_depth)?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Ok(Self::assemble(config, graph, evaluator, storage, rng, None, 0, false))
    }

    /// Continue from `checkpoint`. No baseline ant is generated.
    pub fn resume(
        config: SearchConfig,
        catalog: Arc<dyn Catalog>,
        evaluator: E,
        storage: P,
        checkpoint: Checkpoint,
    ) -> Result<Self> {
        check(&config, catalog.as_ref())?;
        let graph = Graph::from_topology(catalog, config.pheromone.start, checkpoint.topology);
        let best_ant = checkpoint.best_ant.map(|mut ant| {
            ant.metric = config.metric;
            ant
        });
        Ok(Self::assemble(
            config,
            graph,
            evaluator,
            storage,
            checkpoint.rng,
            best_ant,
            checkpoint.iteration,
            true,
        ))
    }

    /// Resume when `storage` holds a checkpoint, otherwise start fresh.
    pub async fn open(config: SearchConfig, catalog: Arc<dyn Catalog>, evaluator: E, storage: P) -> Result<Self> {
        if storage.loaded_from_save() {
            if let Some(checkpoint) = storage.load_checkpoint().await? {
                return Self::resume(config, catalog, evaluator, storage, checkpoint);
            }
            warn!("storage reports a previous run but holds no checkpoint, starting fresh");
        }
        Self::new(config, catalog, evaluator, storage)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        config: SearchConfig,
        graph: Graph,
        evaluator: E,
        storage: P,
        rng: ChaCha8Rng,
        best_ant: Option<Ant>,
        iteration: usize,
        resumed: bool,
    ) -> Self {
        Self {
            config,
            graph,
            evaluator,
            storage,
            rng,
            best_ant,
            iteration,
            state: SearchState::Init,
            resumed,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn best_ant(&self) -> Option<&Ant> {
        self.best_ant.as_ref()
    }

    /// Completed iterations, including those of a resumed run.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn storage(&self) -> &P {
        &self.storage
    }

    /// Snapshot of the current controller state.
    pub fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            topology: self.graph.snapshot(),
            best_ant: self.best_ant.clone(),
            iteration: self.iteration,
            rng: self.rng.clone(),
            saved_at: Utc::now(),
        }
    }

    // ========================================================================
    // Search loop
    // ========================================================================

    /// Run until DONE and return the best ant of the whole run.
    pub async fn search(&mut self) -> Result<Ant> {
        while self.state != SearchState::Done {
            self.step().await?;
        }
        self.best_ant.clone().ok_or(Error::NoViableAnt)
    }

    /// Advance the state machine: INIT runs the baseline (unless resumed),
    /// ITERATING runs exactly one round, DONE is a no-op.
    pub async fn step(&mut self) -> Result<SearchState> {
        match self.state {
            SearchState::Init => self.init().await?,
            SearchState::Iterating => self.iterate().await?,
            SearchState::Done => {}
        }
        Ok(self.state)
    }

    async fn init(&mut self) -> Result<()> {
        if self.resumed {
            info!(
                depth = self.graph.current_depth(),
                iteration = self.iteration,
                best = self.best_ant.as_ref().map(Ant::cost),
                "resuming ACO search"
            );
        } else {
            info!(
                max_depth = self.config.max_depth,
                ant_count = self.config.ant_count,
                metric = %self.config.metric,
                "starting ACO search"
            );
            let path = {
                let mut rule = RandomSelect::new(&mut self.rng);
                generate_path(&self.graph, self.config.shape, &mut rule)?
            };
            let mut ant = Ant::new(path, self.config.metric);
            match ant.evaluate(&self.evaluator, &self.storage, self.config.reuse_artifacts).await {
                Ok(()) => {
                    info!(ant = %ant, "baseline ant");
                    self.best_ant = Some(ant);
                }
                Err(e) => warn!(error = %e, "baseline ant failed"),
            }
        }
        self.state = self.loop_state();
        Ok(())
    }

    async fn iterate(&mut self) -> Result<()> {
        let mut ants = self.generate_ants().await?;
        rank(&mut ants, self.config.metric);

        if let Some(candidate) = ants.into_iter().next() {
            if self.best_ant.as_ref().is_none_or(|best| candidate.is_better_than(best)) {
                info!(ant = %candidate, "new best ant found");
                self.best_ant = Some(candidate);
            }
        }

        if let Some(best) = &self.best_ant {
            info!(iteration = self.iteration + 1, ant = %best, "best ant during iteration");
            let rule = UpdateRule::global(&self.config.pheromone, self.config.metric);
            self.graph.update_pheromone(&best.path, &rule, best.cost());
        } else {
            warn!(iteration = self.iteration + 1, "no viable ant yet, skipping global update");
        }

        self.graph.show_pheromone(self.config.pheromone.verbose);
        self.graph.increase_depth();
        self.iteration += 1;
        self.checkpoint().await;
        self.state = self.loop_state();
        Ok(())
    }

    /// Generate and evaluate one population. Ants whose evaluation fails are
    /// logged and dropped; they get no pheromone update.
    async fn generate_ants(&mut self) -> Result<Vec<Ant>> {
        let local = UpdateRule::local(&self.config.pheromone);
        let mut ants = Vec::with_capacity(self.config.ant_count);

        for number in 1..=self.config.ant_count {
            debug!(ant = number, depth = self.graph.current_depth(), "generating ant");
            let path = {
                let mut rule = AcoSelect::new(&mut self.rng, self.config.greediness);
                generate_path(&self.graph, self.config.shape, &mut rule)?
            };
            let mut ant = Ant::new(path, self.config.metric);
            if let Err(e) = ant.evaluate(&self.evaluator, &self.storage, self.config.reuse_artifacts).await {
                warn!(ant = number, path = ant.path_description.as_deref(), error = %e, "ant failed, excluded");
                continue;
            }
            info!(ant = number, summary = %ant, "ant evaluated");
            self.graph.update_pheromone(&ant.path, &local, ant.cost());
            ants.push(ant);
        }
        Ok(ants)
    }

    async fn checkpoint(&self) {
        let checkpoint = self.snapshot();
        if let Err(e) = self.storage.checkpoint(&checkpoint).await {
            warn!(iteration = self.iteration, error = %e, "checkpoint failed, resume point not saved");
        }
    }

    fn loop_state(&self) -> SearchState {
        if self.graph.current_depth() <= self.config.max_depth {
            SearchState::Iterating
        } else {
            SearchState::Done
        }
    }
}

/// Validate `config` against itself and the catalog.
fn check(config: &SearchConfig, catalog: &dyn Catalog) -> Result<()> {
    config.validate()?;
    if config.shape == PathShape::Autoencoder && catalog.decoder().is_none() {
        return Err(Error::Config("shape = autoencoder needs a catalog with a decoder".into()));
    }
    Ok(())
}

fn generate_path(graph: &Graph, shape: PathShape, rule: &mut dyn SelectionRule) -> Result<Vec<PathNode>> {
    match shape {
        PathShape::Single => graph.generate_path(rule),
        PathShape::Autoencoder => graph.generate_autoencoder_path(rule),
    }
}

/// Best first.
fn rank(ants: &mut [Ant], metric: Metric) {
    match metric {
        Metric::Loss => ants.sort_by(|a, b| a.cost().total_cmp(&b.cost())),
        Metric::Accuracy => ants.sort_by(|a, b| b.cost().total_cmp(&a.cost())),
    }
}
