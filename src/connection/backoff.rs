use {rand::Rng, std::time::Duration};

/// Exponential reconnect delay with a ceiling and no attempt limit
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    /// Fraction of the delay added as random jitter, 0.0..=1.0
    jitter: f64,
    current_attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max.max(initial),
            jitter: jitter.clamp(0.0, 1.0),
            current_attempt: 0,
        }
    }

    /// Delay for the next attempt, advancing the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let factor = 2_u32.saturating_pow(self.current_attempt.min(31));
        let base = self
            .initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        self.current_attempt = self.current_attempt.saturating_add(1);

        if self.jitter > 0.0 {
            let extra = base.mul_f64(rand::thread_rng().gen_range(0.0..=self.jitter));
            (base + extra).min(self.max_delay)
        } else {
            base
        }
    }

    pub fn attempt(&self) -> u32 {
        self.current_attempt
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }
}
