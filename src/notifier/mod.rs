mod listener;
mod notifier;

pub use listener::DatumListener;
pub use listener::ListenerError;
pub use listener::ListenerId;
pub(crate) use notifier::create;
pub(crate) use notifier::Action;
pub(crate) use notifier::Notifier;
