//! End-to-end extract, transform and load run
//!
//! Stages run strictly in sequence and the first failure aborts the run. The
//! error returned names the failing [`Stage`]. The database connection is
//! opened once, shared by the load and every query, and closed before
//! returning whether or not those steps succeeded.

use crate::config::EtlConfig;
use crate::error::{Result, Stage};
use crate::extract::{DocumentSource, Extractor};
use crate::load::{save_to_file, Store};
use crate::progress::ProgressLog;
use crate::query::QueryResult;
use crate::rates::load_rates;
use crate::transform::transform;
use crate::types::Dataset;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The normalized dataset that was persisted
    pub dataset: Dataset,
    /// Each configured statement with its result, in configuration order
    pub queries: Vec<(String, QueryResult)>,
}

/// Pipeline driven by an [`EtlConfig`]
pub struct EtlPipeline {
    config: EtlConfig,
    progress: ProgressLog,
}

impl EtlPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: EtlConfig) -> Result<Self> {
        config.validate()?;
        let progress = match &config.log_path {
            Some(path) => ProgressLog::new(path),
            None => ProgressLog::disabled(),
        };
        Ok(Self { config, progress })
    }

    /// Replace the progress log
    pub fn with_progress(mut self, progress: ProgressLog) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run every stage against the document provided by `source`
    pub fn run(&self, source: &dyn DocumentSource) -> Result<RunReport> {
        let config = &self.config;
        self.progress
            .record("Preliminaries complete. Initiating ETL process")?;

        log::debug!("Fetching {} from {} source", config.data_url, source.name());
        let markup = source
            .fetch(&config.data_url)
            .map_err(|e| e.in_stage(Stage::Extract))?;
        let records = Extractor::new()
            .and_then(|extractor| extractor.extract(&markup))
            .map_err(|e| e.in_stage(Stage::Extract))?;
        if records.is_empty() {
            log::warn!("No banks found in {}", config.data_url);
        }
        self.progress
            .record("Data extraction complete. Initiating Transformation process")?;

        let rates = load_rates(&config.rates_path).map_err(|e| e.in_stage(Stage::Rates))?;
        let dataset = transform(
            records,
            &rates,
            &config.base_currency,
            &config.currency_codes(),
        )
        .map_err(|e| e.in_stage(Stage::Transform))?;
        self.progress
            .record("Data transformation complete. Initiating Loading process")?;

        save_to_file(&dataset, &config.csv_path).map_err(|e| e.in_stage(Stage::SaveFile))?;
        self.progress.record("Data saved to CSV file")?;

        let mut store = Store::open(&config.db_path).map_err(|e| e.in_stage(Stage::SaveTable))?;
        let outcome = self
            .progress
            .record("SQL Connection initiated.")
            .and_then(|_| self.load_and_query(&mut store, &dataset));
        let closed = store.close();

        let queries = outcome?;
        closed.map_err(|e| e.in_stage(Stage::SaveTable))?;
        self.progress.record("Server Connection closed")?;

        Ok(RunReport { dataset, queries })
    }

    fn load_and_query(
        &self,
        store: &mut Store,
        dataset: &Dataset,
    ) -> Result<Vec<(String, QueryResult)>> {
        store
            .save(dataset, &self.config.table_name)
            .map_err(|e| e.in_stage(Stage::SaveTable))?;
        self.progress
            .record("Data loaded to Database as a table, Executing queries")?;

        let mut results = Vec::new();
        for statement in self.config.expanded_queries() {
            let result = store
                .query(&statement)
                .map_err(|e| e.in_stage(Stage::Query))?;
            results.push((statement, result));
        }

        self.progress.record("Process Complete.")?;
        Ok(results)
    }
}
