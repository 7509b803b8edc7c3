use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

/// Installs the global subscriber. `RUST_LOG` selects what is shown; the
/// default is `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let tree = HierarchicalLayer::default()
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_indent_amount(2)
        .with_bracketed_fields(true)
        .with_targets(true);

    // A subscriber may already be installed by an embedding application.
    let _ = Registry::default().with(filter).with(tree).try_init();
}
