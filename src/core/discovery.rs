//! Capability Discovery: bounded two-phase polling for the host SDK
//!
//! Phase 1 tries a ranked list of lookups until one yields the SDK object.
//! Phase 2 waits for the component-registration API on that object.
//! Each phase has its own attempt ceiling; lookup errors count as
//! "not yet available". Exhaustion is terminal.

use std::sync::Arc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use tracing::{debug, info, warn};

use crate::config::DiscoveryConfig;
use crate::core::host::{ComponentsApi, CrmSdk};
use crate::error::Result;
use crate::types::DiscoveryOutcome;

pub type CapabilityLookup = Box<dyn Fn() -> Result<Option<Arc<dyn CrmSdk>>> + Send + Sync>;
pub type SubCapabilityLookup =
    Box<dyn Fn(&Arc<dyn CrmSdk>) -> Result<Option<Arc<dyn ComponentsApi>>> + Send + Sync>;
/// Lists host global names, for operator diagnostics only
pub type GlobalsSource = Box<dyn Fn() -> Vec<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    Capability,
    SubCapability,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryState {
    pub phase: DiscoveryPhase,
    /// Retries scheduled so far in the current phase
    pub attempt_count: u32,
    pub max_attempts: u32,
}

pub struct Discovery {
    config: DiscoveryConfig,
    lookups: Vec<CapabilityLookup>,
    sub_lookup: SubCapabilityLookup,
    globals: Option<GlobalsSource>,
    name_filter: Option<Regex>,
    state: DiscoveryState,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        let name_filter = match RegexBuilder::new(&config.name_pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(pattern = %config.name_pattern, error = %e, "Invalid diagnostic name pattern");
                None
            }
        };
        let state = DiscoveryState {
            phase: DiscoveryPhase::Capability,
            attempt_count: 0,
            max_attempts: config.max_capability_attempts,
        };
        Self {
            config,
            lookups: Vec::new(),
            sub_lookup: Box::new(|sdk| sdk.components()),
            globals: None,
            name_filter,
            state,
        }
    }

    /// Append a lookup strategy. Lookups are tried in the order added.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn() -> Result<Option<Arc<dyn CrmSdk>>> + Send + Sync + 'static,
    {
        self.lookups.push(Box::new(lookup));
        self
    }

    /// Replace the default sub-lookup (`CrmSdk::components`)
    pub fn with_sub_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&Arc<dyn CrmSdk>) -> Result<Option<Arc<dyn ComponentsApi>>> + Send + Sync + 'static,
    {
        self.sub_lookup = Box::new(lookup);
        self
    }

    pub fn with_globals<F>(mut self, source: F) -> Self
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        self.globals = Some(Box::new(source));
        self
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Run both phases. `on_ready` fires exactly once, only on success.
    ///
    /// The returned outcome is the only report of exhaustion; nothing else
    /// is notified.
    pub async fn run<F>(&mut self, on_ready: F) -> DiscoveryOutcome
    where
        F: FnOnce(Arc<dyn CrmSdk>, Arc<dyn ComponentsApi>),
    {
        let Self {
            config,
            lookups,
            sub_lookup,
            globals,
            name_filter,
            state,
        } = self;
        let interval = config.poll_interval();
        let every = config.diagnostic_every;
        let lookups: &[CapabilityLookup] = lookups;

        let sdk = poll(state, interval, |attempt| {
            if let Some(sdk) = first_available(lookups) {
                return Some(sdk);
            }
            if is_diagnostic_attempt(attempt, every) {
                let visible = visible_names(globals.as_ref(), name_filter.as_ref());
                info!(attempt, ?visible, "Waiting for SDK…");
            }
            None
        })
        .await;

        let Some(sdk) = sdk else {
            let outcome = DiscoveryOutcome::CapabilityExhausted {
                attempts: state.attempt_count,
            };
            warn!(code = outcome.code(), "{}", outcome.description());
            state.phase = DiscoveryPhase::Done;
            return outcome;
        };

        state.phase = DiscoveryPhase::SubCapability;
        state.attempt_count = 0;
        state.max_attempts = config.max_sub_capability_attempts;

        let sub_lookup: &SubCapabilityLookup = sub_lookup;
        let components = poll(state, interval, |attempt| {
            match sub_lookup(&sdk) {
                Ok(Some(api)) => return Some(api),
                Ok(None) => {}
                Err(e) => debug!(attempt, error = %e, "Registration lookup failed"),
            }
            if is_diagnostic_attempt(attempt, every) {
                info!(attempt, "customComponentsApi not ready, retrying…");
            }
            None
        })
        .await;

        state.phase = DiscoveryPhase::Done;
        let Some(components) = components else {
            let outcome = DiscoveryOutcome::SubCapabilityExhausted {
                attempts: state.attempt_count,
            };
            warn!(code = outcome.code(), "{}", outcome.description());
            return outcome;
        };

        info!("SDK ready, initializing");
        on_ready(sdk, components);
        DiscoveryOutcome::Ready
    }
}

/// Call `attempt` until it yields, sleeping `interval` between tries, at
/// most `state.max_attempts` retries.
async fn poll<T>(
    state: &mut DiscoveryState,
    interval: Duration,
    mut attempt: impl FnMut(u32) -> Option<T>,
) -> Option<T> {
    loop {
        if let Some(found) = attempt(state.attempt_count) {
            return Some(found);
        }
        if state.attempt_count >= state.max_attempts {
            return None;
        }
        state.attempt_count += 1;
        tokio::time::sleep(interval).await;
    }
}

fn first_available(lookups: &[CapabilityLookup]) -> Option<Arc<dyn CrmSdk>> {
    for lookup in lookups {
        match lookup() {
            Ok(Some(sdk)) => return Some(sdk),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "SDK lookup failed"),
        }
    }
    None
}

fn is_diagnostic_attempt(attempt: u32, every: u32) -> bool {
    every != 0 && attempt % every == 0
}

fn visible_names(globals: Option<&GlobalsSource>, filter: Option<&Regex>) -> Vec<String> {
    let Some(globals) = globals else {
        return Vec::new();
    };
    globals()
        .into_iter()
        .filter(|name| filter.map_or(true, |re| re.is_match(name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ComponentBundle;
    use crate::error::DialerError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NoopComponents;

    impl ComponentsApi for NoopComponents {
        fn register_components(&self, _bundle: ComponentBundle) -> Result<()> {
            Ok(())
        }
    }

    struct ReadySdk;

    impl CrmSdk for ReadySdk {
        fn components(&self) -> Result<Option<Arc<dyn ComponentsApi>>> {
            Ok(Some(Arc::new(NoopComponents)))
        }
    }

    fn fast_config(max: u32, sub_max: u32) -> DiscoveryConfig {
        DiscoveryConfig {
            poll_interval_ms: 250,
            max_capability_attempts: max,
            max_sub_capability_attempts: sub_max,
            diagnostic_every: 2,
            ..DiscoveryConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_calls_on_ready_once() {
        let mut discovery = Discovery::new(fast_config(3, 3))
            .with_lookup(|| Ok(Some(Arc::new(ReadySdk) as Arc<dyn CrmSdk>)));
        let mut calls = 0;
        let outcome = discovery.run(|_, _| calls += 1).await;
        assert_eq!(outcome, DiscoveryOutcome::Ready);
        assert_eq!(calls, 1);
        assert_eq!(discovery.state().phase, DiscoveryPhase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_errors_are_retried() {
        let tries = Arc::new(AtomicU32::new(0));
        let counter = tries.clone();
        let mut discovery = Discovery::new(fast_config(10, 3)).with_lookup(move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DialerError::CapabilityUnavailable("boom".into()))
            } else {
                Ok(Some(Arc::new(ReadySdk) as Arc<dyn CrmSdk>))
            }
        });
        let outcome = discovery.run(|_, _| {}).await;
        assert!(outcome.is_ready());
        assert_eq!(tries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_tried_in_rank_order() {
        let second_called = Arc::new(AtomicU32::new(0));
        let flag = second_called.clone();
        let mut discovery = Discovery::new(fast_config(0, 0))
            .with_lookup(|| Ok(Some(Arc::new(ReadySdk) as Arc<dyn CrmSdk>)))
            .with_lookup(move || {
                flag.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            });
        assert!(discovery.run(|_, _| {}).await.is_ready());
        assert_eq!(second_called.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_visible_names_filter() {
        let globals: GlobalsSource =
            Box::new(|| vec!["Five9".into(), "jQuery".into(), "CrmSdk".into()]);
        let re = RegexBuilder::new("five9|crm")
            .case_insensitive(true)
            .build()
            .unwrap();
        assert_eq!(
            visible_names(Some(&globals), Some(&re)),
            vec!["Five9".to_string(), "CrmSdk".to_string()]
        );
        assert!(visible_names(None, Some(&re)).is_empty());
    }

    #[test]
    fn test_diagnostic_cadence() {
        assert!(is_diagnostic_attempt(0, 40));
        assert!(!is_diagnostic_attempt(39, 40));
        assert!(is_diagnostic_attempt(80, 40));
        assert!(!is_diagnostic_attempt(0, 0));
    }
}
