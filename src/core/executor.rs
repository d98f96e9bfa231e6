//! Two-pass execution of planned operations

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::client::{GraphQLRequest, GraphQLTransport};
use crate::core::errors::{MUTATION_SKIPPED_MESSAGE, RecordError, ScraperError};
use crate::core::introspection::{FetchedSchema, fetch_schema};
use crate::core::params::ParameterPool;
use crate::core::planner::{ArgumentBinding, Operation, QueryPlanner};
use crate::core::type_ref::TypeKind;

/// Pause after every request sent to the endpoint
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Phases of a run; a run only ever moves forward through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RunPhase {
    Idle,
    SchemaFetched,
    Pass1Running,
    ExtractionDone,
    Pass2Running,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub field_name: String,
    pub operation: Operation,
    pub variables_used: Map<String, Value>,
    pub raw_result: Value,
    pub succeeded: bool,
    pub error_detail: Option<RecordError>,
}

impl ExecutionRecord {
    fn skipped(operation: Operation) -> Self {
        Self {
            field_name: operation.field_name.clone(),
            variables_used: operation.variables.clone(),
            raw_result: json!({ "skipped": true, "message": MUTATION_SKIPPED_MESSAGE }),
            succeeded: false,
            error_detail: Some(RecordError::MutationSkipped),
            operation,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.error_detail == Some(RecordError::MutationSkipped)
    }

    /// The `data` member of a successful response
    pub fn data(&self) -> Option<&Value> {
        self.raw_result.get("data").filter(|data| !data.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percentage of all planned operations that succeeded
    pub coverage: f64,
}

impl CoverageSummary {
    pub fn from_records(records: &[ExecutionRecord]) -> Self {
        let total = records.len();
        let successful = records.iter().filter(|record| record.succeeded).count();
        let skipped = records.iter().filter(|record| record.is_skipped()).count();

        let coverage = match total {
            0 => 0.0,
            _ => successful as f64 / total as f64 * 100.0,
        };

        Self {
            total,
            successful,
            failed: total - successful - skipped,
            skipped,
            coverage,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: CoverageSummary,
    pub records: Vec<ExecutionRecord>,
    pub parameters: ParameterPool,
}

/// Runs argument-free queries first, harvests values from their responses and
/// feeds those into the queries that need arguments. Mutations and
/// subscriptions are recorded as skipped and never sent.
///
/// An executor drives a single run.
pub struct TwoPassExecutor<T> {
    transport: T,
    delay: Duration,
    phase: RunPhase,
}

impl<T: GraphQLTransport> TwoPassExecutor<T> {
    pub fn new(transport: T, delay: Duration) -> Self {
        Self {
            transport,
            delay,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn advance(&mut self, next: RunPhase) {
        debug_assert!(next > self.phase, "{:?} -> {:?}", self.phase, next);
        debug!(from = ?self.phase, to = ?next, "run phase");
        self.phase = next;
    }

    /// Introspect the endpoint; failure here ends the run
    pub async fn fetch_schema(&mut self) -> Result<FetchedSchema, ScraperError> {
        let fetched = fetch_schema(&self.transport).await?;
        self.advance(RunPhase::SchemaFetched);
        Ok(fetched)
    }

    /// Fetch the schema, plan every root field and run both passes
    pub async fn scrape(&mut self) -> Result<(FetchedSchema, RunReport), ScraperError> {
        let fetched = self.fetch_schema().await?;

        let operations = QueryPlanner::new(&fetched.model).plan_all();
        let report = self.run(operations).await;

        Ok((fetched, report))
    }

    pub async fn run(&mut self, operations: Vec<Operation>) -> RunReport {
        let mut first_pass = Vec::new();
        let mut second_pass = Vec::new();
        let mut skipped = Vec::new();

        for operation in operations {
            match (operation.kind.is_executable(), operation.requires_arguments()) {
                (false, _) => skipped.push(ExecutionRecord::skipped(operation)),
                (true, false) => first_pass.push(operation),
                (true, true) => second_pass.push(operation),
            }
        }

        let query_count = first_pass.len() + second_pass.len();
        info!(
            queries = query_count,
            mutations = skipped.len(),
            "Generated {} queries and {} mutations",
            query_count,
            skipped.len()
        );

        let mut records = Vec::with_capacity(query_count + skipped.len());
        let mut pool = ParameterPool::new();

        self.advance(RunPhase::Pass1Running);
        for operation in first_pass {
            let index = records.len() + 1;
            info!("Executing query {index}/{query_count}: {}", operation.field_name);

            let variables = operation.variables.clone();
            let record = self.execute(operation, variables).await;
            if let Some(data) = record.data().filter(|_| record.succeeded) {
                pool.extract(data);
            }
            records.push(record);
        }

        self.advance(RunPhase::ExtractionDone);
        info!(harvested = pool.len(), "Parameter extraction complete");

        self.advance(RunPhase::Pass2Running);
        for operation in second_pass {
            let index = records.len() + 1;
            info!("Executing query {index}/{query_count}: {}", operation.field_name);

            let variables = bind_variables(&operation.arguments, &pool);
            records.push(self.execute(operation, variables).await);
        }

        records.extend(skipped);
        self.advance(RunPhase::Completed);

        RunReport {
            summary: CoverageSummary::from_records(&records),
            records,
            parameters: pool,
        }
    }

    async fn execute(&self, operation: Operation, variables: Map<String, Value>) -> ExecutionRecord {
        debug!(query = %operation.text, variables = %serde_json::Value::Object(variables.clone()), "sending");
        let request = GraphQLRequest::new(operation.text.clone(), variables.clone());
        let result = self.transport.execute(&request).await;

        let (raw_result, error_detail) = match result {
            Err(e) => {
                warn!(field = %operation.field_name, "Request failed: {e}");
                (
                    json!({ "error": e.to_string() }),
                    Some(RecordError::Transport(e.to_string())),
                )
            }
            Ok(body) => match response_errors(&body) {
                Some(errors) => {
                    let error = RecordError::from_errors(errors);
                    warn!(field = %operation.field_name, "{error}");
                    (body, Some(error))
                }
                None => (body, None),
            },
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        ExecutionRecord {
            field_name: operation.field_name.clone(),
            operation,
            variables_used: variables,
            raw_result,
            succeeded: error_detail.is_none(),
            error_detail,
        }
    }
}

/// The `errors` member of a response, or a non-standard top-level `error`
fn response_errors(body: &Value) -> Option<&Value> {
    ["errors", "error"]
        .into_iter()
        .find_map(|key| body.get(key).filter(|errors| !errors.is_null()))
}

/// Variables for a second-pass operation, preferring harvested values.
///
/// List and input object arguments keep their synthesized value since a
/// harvested scalar cannot stand in for them.
pub fn bind_variables(arguments: &[ArgumentBinding], pool: &ParameterPool) -> Map<String, Value> {
    arguments
        .iter()
        .map(|arg| {
            let nullable = match arg.type_ref.kind {
                TypeKind::NonNull => arg.type_ref.of_type.as_deref(),
                _ => Some(&arg.type_ref),
            };
            let harvested = nullable
                .filter(|type_ref| type_ref.kind.is_leaf())
                .and_then(|type_ref| pool.candidate_for(&arg.name, type_ref));

            (
                arg.name.clone(),
                harvested.unwrap_or_else(|| arg.synthesized.clone()),
            )
        })
        .collect()
}
