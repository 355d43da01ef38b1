// Epsilon-greedy DQN agent

use rand::Rng;

use super::encoder::StateVector;
use super::memory::{ReplayMemory, Transition};
use super::network::{ActionValues, QNetwork};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::game::{Action, ACTION_COUNT};

/// Learning agent driving the left paddle.
///
/// Owns its replay memory and Q-network; `R` is the random source used for
/// exploration, minibatch sampling and weight initialisation.
pub struct Agent<R: Rng> {
    episodes: u64,
    gamma: f32,
    epsilon_start: i64,
    exploration_range: i64,
    batch_size: usize,
    exploring: bool,
    memory: ReplayMemory,
    network: QNetwork,
    rng: R,
}

impl<R: Rng> Agent<R> {
    pub fn new(config: &AgentConfig, mut rng: R) -> Result<Self> {
        let network = QNetwork::new(
            config.hidden_size,
            config.learning_rate,
            config.optimizer,
            &mut rng,
        )?;

        Ok(Self {
            episodes: 0,
            gamma: config.gamma,
            epsilon_start: config.epsilon_start,
            exploration_range: config.exploration_range.max(1),
            batch_size: config.batch_size.max(1),
            exploring: true,
            memory: ReplayMemory::new(config.memory_capacity),
            network,
            rng,
        })
    }

    /// Exploration threshold out of `exploration_range`; shrinks by one per
    /// finished episode and stops mattering once it goes negative
    pub fn epsilon(&self) -> i64 {
        self.epsilon_start - self.episodes as i64
    }

    /// Pick the next move: random with probability `epsilon / range`, otherwise
    /// the highest-valued action
    pub fn select_action(&mut self, state: &StateVector) -> Action {
        let draw = self.rng.gen_range(0..self.exploration_range);
        if self.exploring && draw < self.epsilon() {
            return Action::ALL[self.rng.gen_range(0..ACTION_COUNT)];
        }
        self.greedy_action(state)
    }

    /// Highest-valued action; ties go to the first action in `[UP, DOWN, STOP]`
    pub fn greedy_action(&self, state: &StateVector) -> Action {
        argmax(&self.network.predict(state))
    }

    pub fn observe(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Immediate update on the transition just played
    pub fn train_short(&mut self, transition: &Transition) -> f32 {
        self.network
            .train_step(std::slice::from_ref(transition), self.gamma)
    }

    /// Update on a minibatch sampled from replay memory. Early on the memory
    /// may hold fewer transitions than a batch; everything stored is used.
    pub fn train_long(&mut self) -> Result<f32> {
        let batch = self.memory.sample(self.batch_size, &mut self.rng)?;
        Ok(self.network.train_step(&batch, self.gamma))
    }

    pub fn finish_episode(&mut self) {
        self.episodes += 1;
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Disable to always exploit, e.g. when evaluating a trained model
    pub fn set_exploring(&mut self, exploring: bool) {
        self.exploring = exploring;
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn network(&self) -> &QNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut QNetwork {
        &mut self.network
    }
}

fn argmax(values: &ActionValues) -> Action {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    Action::ALL[best]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config() -> AgentConfig {
        AgentConfig {
            hidden_size: 32,
            memory_capacity: 50,
            batch_size: 10,
            ..AgentConfig::default()
        }
    }

    fn transition(reward: f32, terminal: bool) -> Transition {
        Transition {
            state: [0.4, 0.5, 0.1],
            action: Action::MoveDown,
            reward,
            next_state: [0.41, 0.51, 0.1],
            terminal,
        }
    }

    #[test]
    fn test_argmax_first_index_wins_ties() {
        assert_eq!(argmax(&[1.0, 1.0, 0.0]), Action::MoveUp);
        assert_eq!(argmax(&[0.0, 2.0, 2.0]), Action::MoveDown);
        assert_eq!(argmax(&[-1.0, -3.0, 0.5]), Action::Stop);
    }

    #[test]
    fn test_epsilon_shrinks_with_episodes() {
        let mut agent = Agent::new(&config(), ChaCha8Rng::seed_from_u64(0)).unwrap();
        assert_eq!(agent.epsilon(), 80);
        for _ in 0..100 {
            agent.finish_episode();
        }
        assert_eq!(agent.epsilon(), -20);
    }

    #[test]
    fn test_zero_epsilon_always_exploits() {
        let config = AgentConfig {
            epsilon_start: 0,
            ..config()
        };
        let mut agent = Agent::new(&config, ChaCha8Rng::seed_from_u64(1)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        for _ in 0..200 {
            let state = [rng.gen(), rng.gen(), rng.gen()];
            let expected = argmax(&agent.network().predict(&state));
            assert_eq!(agent.select_action(&state), expected);
        }
    }

    #[test]
    fn test_early_episodes_explore() {
        let mut agent = Agent::new(&config(), ChaCha8Rng::seed_from_u64(3)).unwrap();
        let state = [0.4, 0.5, 0.1];
        let greedy = agent.greedy_action(&state);

        let deviations = (0..1000)
            .filter(|_| agent.select_action(&state) != greedy)
            .count();
        // 80/200 of picks are random and two thirds of those differ from greedy
        assert!(deviations > 150 && deviations < 400, "{}", deviations);

        agent.set_exploring(false);
        assert!((0..100).all(|_| agent.select_action(&state) == greedy));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let mut a = Agent::new(&config(), ChaCha8Rng::seed_from_u64(4)).unwrap();
        let mut b = Agent::new(&config(), ChaCha8Rng::seed_from_u64(4)).unwrap();
        let state = [0.2, 0.7, 0.5];
        for _ in 0..500 {
            assert_eq!(a.select_action(&state), b.select_action(&state));
        }
    }

    #[test]
    fn test_observe_fills_memory_up_to_capacity() {
        let mut agent = Agent::new(&config(), ChaCha8Rng::seed_from_u64(5)).unwrap();
        for _ in 0..80 {
            agent.observe(transition(0.0, false));
        }
        assert_eq!(agent.memory().len(), 50);
    }

    #[test]
    fn test_train_long_with_sparse_memory() {
        let mut agent = Agent::new(&config(), ChaCha8Rng::seed_from_u64(6)).unwrap();
        assert_eq!(agent.train_long().unwrap(), 0.0);

        agent.observe(transition(-10.0, true));
        agent.observe(transition(0.0, false));
        let loss = agent.train_long().unwrap();
        assert!(loss > 0.0 && loss.is_finite());
    }

    #[test]
    fn test_train_short_updates_network() {
        let mut agent = Agent::new(&config(), ChaCha8Rng::seed_from_u64(7)).unwrap();
        let t = transition(10.0, true);
        let before = agent.network().predict(&t.state);
        agent.train_short(&t);
        assert_ne!(agent.network().predict(&t.state), before);
    }
}
