//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core
//! services as `Arc<CoreConfig>`. The intent is to avoid reading
//! process-wide environment variables during request handling, which can
//! lead to inconsistent behaviour in multi-threaded runtimes and test
//! harnesses.

use crate::constants::DEFAULT_INVOICE_DUE_DAYS;
use crate::error::{WardError, WardResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    invoice_due_days: i64,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `invoice_due_days` is the payment horizon applied to invoices the
    /// system creates on a patient's behalf; it must be positive.
    pub fn new(invoice_due_days: i64) -> WardResult<Self> {
        if invoice_due_days <= 0 {
            return Err(WardError::InvalidInput(
                "invoice_due_days must be positive".into(),
            ));
        }
        Ok(Self { invoice_due_days })
    }

    pub fn invoice_due_days(&self) -> i64 {
        self.invoice_due_days
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            invoice_due_days: DEFAULT_INVOICE_DUE_DAYS,
        }
    }
}

/// Parse the invoice due-days horizon from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default horizon.
pub fn invoice_due_days_from_env_value(value: Option<String>) -> WardResult<i64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(DEFAULT_INVOICE_DUE_DAYS),
        Some(v) => v
            .parse::<i64>()
            .map_err(|_| WardError::InvalidInput(format!("invalid invoice due days: {v:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_due_days() {
        assert!(CoreConfig::new(0).is_err());
        assert!(CoreConfig::new(-3).is_err());
        assert_eq!(CoreConfig::new(14).unwrap().invoice_due_days(), 14);
    }

    #[test]
    fn due_days_env_value_defaults_when_unset() {
        assert_eq!(
            invoice_due_days_from_env_value(None).unwrap(),
            DEFAULT_INVOICE_DUE_DAYS
        );
        assert_eq!(
            invoice_due_days_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_INVOICE_DUE_DAYS
        );
        assert_eq!(invoice_due_days_from_env_value(Some("7".into())).unwrap(), 7);
        assert!(invoice_due_days_from_env_value(Some("soon".into())).is_err());
    }
}
