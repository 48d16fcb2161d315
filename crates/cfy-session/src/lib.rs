//! # cfy-session
//!
//! The session resolver gates every page. It subscribes to identity changes,
//! asks the profile store whether the visitor has a profile, publishes a
//! [`SessionState`](cfy_core::SessionState), and issues at most one redirect
//! per state transition.
//!
//! Page shells consume the published state through [`PageView`] and
//! [`LoginView`].

pub mod navigator;
pub mod resolver;
pub mod retry;
pub mod view;

pub use navigator::{Navigator, RecordingNavigator, SessionListener, StateLog};
pub use resolver::{ResolverConfig, ResolverHandle, SessionResolver};
pub use retry::RetryPolicy;
pub use view::{LoginView, PageView, ProfileView};
