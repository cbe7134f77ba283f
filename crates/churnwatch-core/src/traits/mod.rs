mod backend;
mod notifier;
mod push;

pub use backend::IWatchlistBackend;
pub use notifier::INotifier;
pub use push::{IPushConnector, IPushSink, IPushStream, PushConnection};
