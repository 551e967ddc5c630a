//! Component handle trait.
//!
//! The registry holds every registered component as `Arc<dyn Component>`
//! and never downcasts it; everything it can do with a component goes
//! through the optional capability accessors below. Each accessor defaults
//! to `None` — override the ones your component supports.

use crate::{CaptureState, Configure, HealthCheck, Initialize, Terminate};

/// Opaque handle to a live component instance.
///
/// Components must be `Send + Sync`; use interior mutability if your
/// capabilities need to mutate state.
pub trait Component: Send + Sync {
    /// Returns this component as an [`Initialize`] if supported.
    fn as_initialize(&self) -> Option<&dyn Initialize> {
        None
    }

    /// Returns this component as a [`Terminate`] if supported.
    fn as_terminate(&self) -> Option<&dyn Terminate> {
        None
    }

    /// Returns this component as a [`HealthCheck`] if supported.
    ///
    /// Components without this capability are reported as healthy.
    fn as_health_check(&self) -> Option<&dyn HealthCheck> {
        None
    }

    /// Returns this component as a [`Configure`] if supported.
    fn as_configure(&self) -> Option<&dyn Configure> {
        None
    }

    /// Returns this component as a [`CaptureState`] if supported.
    ///
    /// Export snapshots include a state blob only for components that
    /// expose this.
    fn as_capture_state(&self) -> Option<&dyn CaptureState> {
        None
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct Bare;

    impl Component for Bare {}

    struct Startable;

    #[async_trait]
    impl Initialize for Startable {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }
    }

    impl Component for Startable {
        fn as_initialize(&self) -> Option<&dyn Initialize> {
            Some(self)
        }
    }

    #[test]
    fn default_accessors_return_none() {
        let c = Bare;
        assert!(c.as_initialize().is_none());
        assert!(c.as_terminate().is_none());
        assert!(c.as_health_check().is_none());
        assert!(c.as_configure().is_none());
        assert!(c.as_capture_state().is_none());
    }

    #[tokio::test]
    async fn overridden_accessor_exposes_capability() {
        let c = Startable;
        let init = c.as_initialize().unwrap();
        assert!(init.initialize().await.is_ok());
        assert!(c.as_terminate().is_none());
    }
}
