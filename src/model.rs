//! Individual agents and the index of juvenile hosts.

use crate::laws::{LawSet, Species};
use rand::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(u64);

/// Source of unique agent identifiers within a population.
#[derive(Debug, Default)]
pub struct AgentIds {
    next: u64,
}

impl AgentIds {
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// Agent of the simulation.
///
/// Gender, fertility and lifespan are drawn once at creation and never change.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    species: Species,
    gender: Gender,
    fertile: bool,
    lifespan: u32,
    age: u32,
    alive: bool,
    generation: u32,
    offspring_count: u32,
}

impl Agent {
    /// Create an agent present when the world is initialized, with a seed age.
    pub fn initial<R: Rng + ?Sized>(
        id: AgentId,
        species: Species,
        laws: &LawSet,
        rng: &mut R,
    ) -> Self {
        let mut agent = Self::newborn(id, species, laws, 0, rng);
        agent.age = laws
            .species(species)
            .sample_initial_age(agent.lifespan, rng);
        agent
    }

    /// Create an agent of age zero.
    pub fn newborn<R: Rng + ?Sized>(
        id: AgentId,
        species: Species,
        laws: &LawSet,
        generation: u32,
        rng: &mut R,
    ) -> Self {
        let sp_laws = laws.species(species);
        let gender = if sp_laws.sample_male(rng) {
            Gender::Male
        } else {
            Gender::Female
        };
        Self {
            id,
            species,
            gender,
            fertile: sp_laws.sample_fertile(rng),
            lifespan: sp_laws.sample_lifespan(rng),
            age: 0,
            alive: true,
            generation,
            offspring_count: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn offspring_count(&self) -> u32 {
        self.offspring_count
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_adult(&self, laws: &LawSet) -> bool {
        self.alive && self.age >= laws.species(self.species).adult_age()
    }

    pub fn is_egg(&self, laws: &LawSet) -> bool {
        self.age <= laws.species(self.species).egg_age()
    }

    /// Only hosts have a juvenile stage, strictly between egg and adult ages.
    pub fn is_juvenile(&self, laws: &LawSet) -> bool {
        match self.species {
            Species::Predator => false,
            Species::Host => {
                let sp_laws = laws.species(self.species);
                sp_laws.egg_age() < self.age && self.age < sp_laws.adult_age()
            }
        }
    }

    /// Female and fertile, regardless of age.
    pub fn can_procreate(&self) -> bool {
        self.gender == Gender::Female && self.fertile
    }

    pub fn increment_age(&mut self, laws: &LawSet, juveniles: &mut JuvenileIndex) {
        self.age += 1;
        juveniles.sync(self, laws);
    }

    pub fn kill(&mut self, juveniles: &mut JuvenileIndex) {
        self.alive = false;
        juveniles.leave(self.id);
    }

    /// Kill the agent with the species random-death probability.
    pub fn random_death<R: Rng + ?Sized>(
        &mut self,
        laws: &LawSet,
        juveniles: &mut JuvenileIndex,
        rng: &mut R,
    ) -> bool {
        if laws.species(self.species).sample_random_death(rng) {
            self.kill(juveniles);
            return true;
        }
        false
    }

    /// Kill the agent if it has outlived its lifespan.
    pub fn old_age_death(&mut self, juveniles: &mut JuvenileIndex) -> bool {
        if self.age > self.lifespan {
            self.kill(juveniles);
            return true;
        }
        false
    }

    /// Draw a number of children and create them at age zero.
    pub fn produce_offspring<R: Rng + ?Sized>(
        &mut self,
        laws: &LawSet,
        generation: u32,
        ids: &mut AgentIds,
        rng: &mut R,
    ) -> Vec<Agent> {
        let n_children = laws.species(self.species).sample_offspring(rng);
        self.offspring_count += n_children;
        (0..n_children)
            .map(|_| Agent::newborn(ids.next_id(), self.species, laws, generation, rng))
            .collect()
    }
}

/// Set of live juvenile hosts supporting uniform random choice.
///
/// Membership is updated by the agent operations that change age or liveness.
#[derive(Debug, Default)]
pub struct JuvenileIndex {
    members: Vec<AgentId>,
    positions: HashMap<AgentId, usize>,
}

impl JuvenileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Make membership of `agent` match its current state.
    pub fn sync(&mut self, agent: &Agent, laws: &LawSet) {
        if agent.is_alive() && agent.is_juvenile(laws) {
            self.enter(agent.id());
        } else {
            self.leave(agent.id());
        }
    }

    fn enter(&mut self, id: AgentId) {
        if self.positions.contains_key(&id) {
            return;
        }
        self.positions.insert(id, self.members.len());
        self.members.push(id);
    }

    fn leave(&mut self, id: AgentId) {
        let Some(pos) = self.positions.remove(&id) else {
            return;
        };
        self.members.swap_remove(pos);
        if let Some(&moved) = self.members.get(pos) {
            self.positions.insert(moved, pos);
        }
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<AgentId> {
        self.members.choose(rng).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{LawsConfig, tests::species};
    use rand_chacha::ChaCha12Rng;

    pub(crate) fn host_laws(egg_age: u32, adult_age: u32) -> LawSet {
        LawSet::new(&LawsConfig {
            predator: species(100.0, 3, 1),
            host: species(100.0, adult_age, egg_age),
            predation_coef: 1.0,
        })
        .unwrap()
    }

    fn check_index(agents: &[Agent], juveniles: &JuvenileIndex, laws: &LawSet) {
        let expected = agents
            .iter()
            .filter(|agt| agt.is_alive() && agt.is_juvenile(laws))
            .count();
        assert_eq!(juveniles.len(), expected);
        for agt in agents {
            assert_eq!(
                juveniles.contains(agt.id()),
                agt.is_alive() && agt.is_juvenile(laws)
            );
        }
    }

    #[test]
    fn juvenile_stage_is_strictly_between_thresholds() {
        let laws = host_laws(2, 5);
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let mut ids = AgentIds::default();
        let mut juveniles = JuvenileIndex::new();
        let mut host = Agent::newborn(ids.next_id(), Species::Host, &laws, 0, &mut rng);
        let mut stages = Vec::new();
        for _ in 0..7 {
            stages.push((host.age(), host.is_egg(&laws), host.is_juvenile(&laws)));
            host.increment_age(&laws, &mut juveniles);
        }
        assert_eq!(
            stages,
            vec![
                (0, true, false),
                (1, true, false),
                (2, true, false),
                (3, false, true),
                (4, false, true),
                (5, false, false),
                (6, false, false),
            ]
        );
        assert!(host.is_adult(&laws));
    }

    #[test]
    fn predators_are_never_juvenile() {
        let laws = host_laws(2, 5);
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let mut ids = AgentIds::default();
        let mut juveniles = JuvenileIndex::new();
        let mut predator = Agent::newborn(ids.next_id(), Species::Predator, &laws, 0, &mut rng);
        for _ in 0..10 {
            predator.increment_age(&laws, &mut juveniles);
            assert!(!predator.is_juvenile(&laws));
            assert!(juveniles.is_empty());
        }
    }

    #[test]
    fn index_tracks_scripted_sequence() {
        let laws = host_laws(1, 4);
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let mut ids = AgentIds::default();
        let mut juveniles = JuvenileIndex::new();
        let mut agents: Vec<_> = (0..6)
            .map(|_| Agent::newborn(ids.next_id(), Species::Host, &laws, 0, &mut rng))
            .collect();
        check_index(&agents, &juveniles, &laws);

        let script: &[(usize, bool)] = &[
            (0, false),
            (0, false),
            (1, false),
            (1, false),
            (2, false),
            (2, false),
            (0, true),
            (3, false),
            (3, false),
            (1, false),
            (1, false),
            (1, false),
            (2, true),
            (4, false),
            (4, false),
            (5, false),
            (5, false),
            (4, true),
            (5, false),
            (5, false),
            (5, true),
        ];
        for &(i_agt, kill) in script {
            if kill {
                agents[i_agt].kill(&mut juveniles);
            } else {
                agents[i_agt].increment_age(&laws, &mut juveniles);
            }
            check_index(&agents, &juveniles, &laws);
        }

        // Killing twice or aging a dead agent leaves the index untouched.
        agents[0].kill(&mut juveniles);
        agents[0].increment_age(&laws, &mut juveniles);
        check_index(&agents, &juveniles, &laws);
        assert_eq!(juveniles.len(), 1);
        assert!(juveniles.contains(agents[3].id()));
    }

    #[test]
    fn choose_picks_only_members() {
        let laws = host_laws(0, 10);
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        let mut ids = AgentIds::default();
        let mut juveniles = JuvenileIndex::new();
        assert_eq!(juveniles.choose(&mut rng), None);

        let mut agents: Vec<_> = (0..4)
            .map(|_| Agent::newborn(ids.next_id(), Species::Host, &laws, 0, &mut rng))
            .collect();
        for agt in &mut agents {
            agt.increment_age(&laws, &mut juveniles);
        }
        agents[1].kill(&mut juveniles);
        for _ in 0..50 {
            let id = juveniles.choose(&mut rng).unwrap();
            assert_ne!(id, agents[1].id());
            assert!(juveniles.contains(id));
        }
    }

    #[test]
    fn old_age_death_after_lifespan() {
        let laws = host_laws(1, 4);
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let mut ids = AgentIds::default();
        let mut juveniles = JuvenileIndex::new();
        let mut host = Agent::newborn(ids.next_id(), Species::Host, &laws, 0, &mut rng);
        // Zero standard deviation: the lifespan equals the rounded mean.
        assert_eq!(host.lifespan(), 100);
        for _ in 0..100 {
            host.increment_age(&laws, &mut juveniles);
            assert!(!host.old_age_death(&mut juveniles));
        }
        host.increment_age(&laws, &mut juveniles);
        assert!(host.old_age_death(&mut juveniles));
        assert!(!host.is_alive());
        assert!(!host.is_adult(&laws));
    }

    #[test]
    fn offspring_are_newborns_of_same_species() {
        let mut cfg_host = species(30.0, 10, 2);
        cfg_host.offspring_mean = 3.0;
        let laws = LawSet::new(&LawsConfig {
            predator: species(30.0, 10, 2),
            host: cfg_host,
            predation_coef: 0.0,
        })
        .unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        let mut ids = AgentIds::default();
        let mut parent = Agent::newborn(ids.next_id(), Species::Host, &laws, 0, &mut rng);
        let children = parent.produce_offspring(&laws, 7, &mut ids, &mut rng);
        assert_eq!(children.len(), 3);
        assert_eq!(parent.offspring_count(), 3);
        for child in &children {
            assert_eq!(child.species(), Species::Host);
            assert_eq!(child.age(), 0);
            assert_eq!(child.generation(), 7);
            assert_ne!(child.id(), parent.id());
        }
    }
}
