//! Política de reintentos con backoff exponencial
//!
//! Los conflictos de escritura son esperables bajo carga: el servicio los
//! reintenta con delay exponencial acotado y jitter aleatorio para
//! desincronizar a los clientes que compiten por la misma ruta.

use rand::Rng;
use std::time::Duration;

/// Configuración de reintentos para las transacciones del servicio
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Cantidad máxima de intentos (incluye el primero)
    pub max_attempts: u32,
    /// Delay base antes del segundo intento
    pub base_delay_ms: u64,
    /// Factor multiplicativo entre intentos
    pub multiplier: u32,
    /// Tope duro del delay
    pub max_delay_ms: u64,
    /// Deadline de cada intento individual
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 25,
            multiplier: 2,
            max_delay_ms: 1_000,
            attempt_timeout_ms: 5_000,
        }
    }
}

impl RetryConfig {
    /// Configuración agresiva para tests: sin esperas largas
    pub fn fast() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1,
            multiplier: 2,
            max_delay_ms: 5,
            attempt_timeout_ms: 1_000,
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Delay antes del intento `attempt` (1-based para el primer reintento).
    /// Mitad fija, mitad jitter, sobre `base * multiplier^(attempt-1)`
    /// con tope en `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(u64::from(self.multiplier).saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay_ms).max(1);
        let jitter = rand::thread_rng().gen_range(0..=capped / 2);
        Duration::from_millis(capped / 2 + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay_ms: 100,
            multiplier: 2,
            max_delay_ms: 400,
            attempt_timeout_ms: 1_000,
        };

        // attempt 1 -> 100ms nominal, attempt 2 -> 200, attempt 3+ -> tope 400
        for (attempt, nominal) in [(1u32, 100u64), (2, 200), (3, 400), (8, 400)] {
            let delay = config.delay_for(attempt).as_millis() as u64;
            assert!(delay >= nominal / 2, "attempt {}: {} demasiado corto", attempt, delay);
            assert!(delay <= nominal, "attempt {}: {} supera el nominal", attempt, delay);
        }
    }

    #[test]
    fn test_no_overflow_on_high_attempts() {
        let config = RetryConfig::default();
        let delay = config.delay_for(u32::MAX);
        assert!(delay.as_millis() as u64 <= config.max_delay_ms);
    }
}
