use crate::census::{Census, Counter, Log};
use crate::laws::{LawSet, Species};
use crate::model::{Agent, AgentId, AgentIds, Gender, JuvenileIndex};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, mem};

/// Initial number of agents of each species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InitialPopulation {
    pub predator_count: u64,
    pub host_count: u64,
}

/// Population of predators and hosts evolving one day per step.
///
/// Agents born or killed during a day are only added to or removed from
/// the rosters once every agent of their species has been processed.
pub struct Population<'a> {
    laws: &'a LawSet,
    rng: ChaCha12Rng,
    instant: u32,

    predators: Vec<Agent>,
    hosts: Vec<Agent>,
    new_predators: Vec<Agent>,
    new_hosts: Vec<Agent>,

    host_slots: HashMap<AgentId, usize>,
    juveniles: JuvenileIndex,
    ids: AgentIds,

    log: Log,
}

impl<'a> Population<'a> {
    /// Create a population with initial agents of random ages and record its census.
    pub fn new(laws: &'a LawSet, init: InitialPopulation, rng: ChaCha12Rng) -> Self {
        let mut pop = Self {
            laws,
            rng,
            instant: 0,
            predators: Vec::new(),
            hosts: Vec::new(),
            new_predators: Vec::new(),
            new_hosts: Vec::new(),
            host_slots: HashMap::new(),
            juveniles: JuvenileIndex::new(),
            ids: AgentIds::default(),
            log: Log::default(),
        };

        for _ in 0..init.predator_count {
            let agent = Agent::initial(pop.ids.next_id(), Species::Predator, laws, &mut pop.rng);
            pop.new_predators.push(agent);
        }
        for _ in 0..init.host_count {
            let agent = Agent::initial(pop.ids.next_id(), Species::Host, laws, &mut pop.rng);
            pop.new_hosts.push(agent);
        }
        pop.commit(Species::Predator);
        pop.commit(Species::Host);

        let mut census = Census::default();
        for agent in pop.predators.iter().chain(pop.hosts.iter()) {
            pop.record(agent, &mut census);
        }
        pop.log.push(census);

        pop
    }

    /// Simulate `n_steps` days and return the log of `n_steps + 1` censuses.
    pub fn run(mut self, n_steps: usize) -> Log {
        self.log.reserve(n_steps);
        for _ in 0..n_steps {
            self.step();
        }
        self.log
    }

    /// Simulate one day.
    pub fn step(&mut self) {
        self.instant += 1;
        let mut census = Census::default();

        self.step_predators(&mut census);

        // Hosts killed by predators must be removed before hosts are processed.
        self.commit(Species::Predator);
        self.commit(Species::Host);

        self.step_hosts(&mut census);
        self.commit(Species::Host);

        self.log.push(census);
    }

    fn step_predators(&mut self, census: &mut Census) {
        let mut predators = mem::take(&mut self.predators);
        let n_predators = predators.len();

        for predator in &mut predators {
            if predator.random_death(self.laws, &mut self.juveniles, &mut self.rng) {
                census.predator[Counter::RandomlyKilled] += 1.0;
            } else if predator.old_age_death(&mut self.juveniles) {
                census.predator[Counter::OldAgeKilled] += 1.0;
                if predator.can_procreate() && self.predation_happens(n_predators) {
                    self.predation(predator, census);
                }
            } else {
                predator.increment_age(self.laws, &mut self.juveniles);
            }
            self.record(predator, census);
        }

        self.predators = predators;
    }

    fn step_hosts(&mut self, census: &mut Census) {
        let mut hosts = mem::take(&mut self.hosts);

        for host in &mut hosts {
            if host.random_death(self.laws, &mut self.juveniles, &mut self.rng) {
                census.host[Counter::RandomlyKilled] += 1.0;
            } else if host.old_age_death(&mut self.juveniles) {
                census.host[Counter::OldAgeKilled] += 1.0;
                if host.can_procreate() {
                    self.procreate(host, census);
                }
            } else {
                host.increment_age(self.laws, &mut self.juveniles);
            }
            self.record(host, census);
        }

        self.hosts = hosts;
    }

    /// Probability of predation is the juvenile-to-predator ratio scaled by the
    /// predation coefficient, with the roster counted before today's removals.
    fn predation_happens(&mut self, n_predators: usize) -> bool {
        if n_predators == 0 {
            return false;
        }
        let prob = self.laws.predation_coef() * self.juveniles.len() as f64 / n_predators as f64;
        self.rng.random::<f64>() < prob
    }

    fn predation(&mut self, predator: &mut Agent, census: &mut Census) {
        let Some(prey) = self.juveniles.choose(&mut self.rng) else {
            return;
        };
        let slot = self.host_slots[&prey];
        self.hosts[slot].kill(&mut self.juveniles);

        census.predator[Counter::Predation] += 1.0;
        census.host[Counter::Dead] += 1.0;

        self.procreate(predator, census);
    }

    fn procreate(&mut self, parent: &mut Agent, census: &mut Census) {
        let generation = self.instant + 1;
        let children =
            parent.produce_offspring(self.laws, generation, &mut self.ids, &mut self.rng);

        let counters = &mut census[parent.species()];
        counters[Counter::Parents] += 1.0;
        counters[Counter::Newborn] += children.len() as f64;

        match parent.species() {
            Species::Predator => self.new_predators.extend(children),
            Species::Host => self.new_hosts.extend(children),
        }
    }

    /// Drop dead agents and admit pending newborns.
    fn commit(&mut self, species: Species) {
        match species {
            Species::Predator => {
                self.predators.retain(Agent::is_alive);
                self.predators.append(&mut self.new_predators);
            }
            Species::Host => {
                self.hosts.retain(Agent::is_alive);
                for host in &self.new_hosts {
                    self.juveniles.sync(host, self.laws);
                }
                self.hosts.append(&mut self.new_hosts);

                self.host_slots.clear();
                for (slot, host) in self.hosts.iter().enumerate() {
                    self.host_slots.insert(host.id(), slot);
                }
            }
        }
    }

    fn record(&self, agent: &Agent, census: &mut Census) {
        let counters = &mut census[agent.species()];
        let alive = agent.is_alive();
        counters.add(Counter::Living, alive);
        counters.add(Counter::Dead, !alive);
        counters.add(Counter::Male, agent.gender() == Gender::Male);
        counters.add(Counter::Female, agent.gender() == Gender::Female);
        counters.add(Counter::Juveniles, alive && agent.is_juvenile(self.laws));
        counters.add(Counter::Adults, agent.is_adult(self.laws));
    }
}
