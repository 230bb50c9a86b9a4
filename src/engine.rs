use std::{fmt, str::FromStr};

use rand::{
    rngs::{OsRng, StdRng},
    RngCore, SeedableRng,
};

/// Source of randomness used by [roll_with_engine](crate::roll_with_engine).
///
/// The engine is handed to every roll explicitly, there is no global engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// `thread`, the thread local generator of `rand`.
    #[default]
    Thread,
    /// `os`, the operating system's random source.
    Os,
    /// `seeded:<n>`, a deterministic generator, the same seed rolls the same dice.
    Seeded(u64),
}

impl Engine {
    pub fn rng(self) -> Box<dyn RngCore> {
        match self {
            Engine::Thread => Box::new(rand::thread_rng()),
            Engine::Os => Box::new(OsRng),
            Engine::Seeded(seed) => Box::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown engine `{0}`, expected `thread`, `os` or `seeded:<number>`")]
pub struct ParseEngineError(String);

impl FromStr for Engine {
    type Err = ParseEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "thread" => Ok(Engine::Thread),
            "os" => Ok(Engine::Os),
            _ => name
                .strip_prefix("seeded:")
                .and_then(|seed| seed.trim().parse().ok())
                .map(Engine::Seeded)
                .ok_or_else(|| ParseEngineError(s.to_owned())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Thread => write!(f, "thread"),
            Engine::Os => write!(f, "os"),
            Engine::Seeded(seed) => write!(f, "seeded:{seed}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_parse_engine() {
        assert_eq!("thread".parse(), Ok(Engine::Thread));
        assert_eq!("OS".parse(), Ok(Engine::Os));
        assert_eq!("seeded:42".parse(), Ok(Engine::Seeded(42)));
        assert!("seeded:".parse::<Engine>().is_err());
        assert!("crypto".parse::<Engine>().is_err());
    }

    #[test]
    fn test_engine_display_round_trips() {
        for engine in [Engine::Thread, Engine::Os, Engine::Seeded(7)] {
            assert_eq!(engine.to_string().parse(), Ok(engine));
        }
    }

    #[test]
    fn test_seeded_engine_is_deterministic() {
        let mut first = Engine::Seeded(3).rng();
        let mut second = Engine::Seeded(3).rng();

        let first: Vec<u32> = (0..5).map(|_| first.gen_range(1..=20)).collect();
        let second: Vec<u32> = (0..5).map(|_| second.gen_range(1..=20)).collect();
        assert_eq!(first, second);
    }
}
