use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const DEFAULT_FILTER: &str = "info";

pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let tree = HierarchicalLayer::new(2)
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_targets(true)
        .with_bracketed_fields(true);

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = Registry::default().with(filter).with(tree).try_init();
}
