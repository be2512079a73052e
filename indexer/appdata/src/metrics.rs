use metrics::{describe_counter, describe_histogram};

pub fn init_appdata_metrics() {
    describe_counter!(
        "indexer.packets.total",
        "Total packets handled by async listener workers"
    );
    describe_counter!("indexer.commits.total", "Total commits applied by workers");
    describe_counter!(
        "indexer.callback.errors.total",
        "Total listener callback errors latched by workers"
    );
    describe_histogram!(
        "indexer.commit.duration",
        "Time spent applying a commit, in seconds"
    );
}
