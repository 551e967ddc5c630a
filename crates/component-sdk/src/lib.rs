//! Telaio Component SDK
//!
//! Traits implemented by component and extension authors:
//! - [`Component`] — the opaque handle the registry holds for a registered
//!   component, with optional capability accessors
//! - capability interfaces ([`Initialize`], [`Terminate`], [`HealthCheck`],
//!   [`Configure`], [`CaptureState`]) a component may or may not implement
//! - [`Extension`] — an instance registered at an extension point, inspected
//!   against the point's declared contract

mod capability;
mod component;
mod extension;

pub use capability::{CaptureState, Configure, HealthCheck, Initialize, Terminate};
pub use component::Component;
pub use extension::Extension;
