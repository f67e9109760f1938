//! CLI runner - executes commands

use crate::binding::{JsonPage, PageFetcher, PaginatedOperation};
use crate::cli::commands::{Cli, Commands, OutputFormat, RunArgs};
use crate::config::{load_config, RuntimeConfig};
use crate::error::{Error, Result, ResultExt};
use crate::model::{load_model, short_name, SmithyModel};
use crate::pagination::Items;
use futures::StreamExt;
use serde_json::{json, Value};
use std::io::Write;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing messages to stdout
    pub async fn run(&self) -> Result<()> {
        self.run_to(&mut std::io::stdout()).await
    }

    /// Run the CLI command, writing messages to `out`
    pub async fn run_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Operations => self.operations(out),
            Commands::Validate => self.validate(out),
            Commands::Pages(args) => self.pages(args, out).await,
            Commands::Items(args) => self.items(args, out).await,
        }
    }

    fn load_model(&self) -> Result<SmithyModel> {
        let path = self
            .cli
            .model
            .as_ref()
            .ok_or_else(|| Error::config("Model file not specified (use -m flag)"))?;
        load_model(path)
    }

    fn load_config(&self) -> Result<Option<RuntimeConfig>> {
        self.cli.config.as_ref().map(load_config).transpose()
    }

    fn require_config(&self) -> Result<RuntimeConfig> {
        self.load_config()?
            .ok_or_else(|| Error::config("Runtime config not specified (use -C flag)"))
    }

    /// List paginated operations
    fn operations<W: Write>(&self, out: &mut W) -> Result<()> {
        let model = self.load_model()?;

        let operations: Vec<Value> = model
            .paginated_operations()?
            .into_iter()
            .map(|entry| {
                json!({
                    "operation": entry.operation,
                    "service": entry.service,
                    "paginated": entry.paginated,
                })
            })
            .collect();

        self.output_message(
            out,
            &json!({
                "type": "OPERATIONS",
                "operations": operations
            }),
        )
    }

    /// Resolve every paginated operation
    fn validate<W: Write>(&self, out: &mut W) -> Result<()> {
        let model = self.load_model()?;
        let config = self.load_config()?;

        let entries = model.paginated_operations()?;
        let mut failures = 0;

        for entry in &entries {
            let result = self.resolve(&model, config.as_ref(), &entry.operation);
            let message = match result {
                Ok(_) => json!({
                    "type": "VALIDATION",
                    "operation": entry.operation,
                    "valid": true
                }),
                Err(e) => {
                    failures += 1;
                    warn!(operation = %entry.operation, error = %e, "Invalid paginated operation");
                    json!({
                        "type": "VALIDATION",
                        "operation": entry.operation,
                        "valid": false,
                        "error": e.to_string()
                    })
                }
            };
            self.output_message(out, &message)?;
        }

        if failures > 0 {
            return Err(Error::config(format!(
                "{failures} of {} paginated operations are invalid",
                entries.len()
            )));
        }

        self.output_message(
            out,
            &json!({
                "type": "LOG",
                "log": {
                    "level": "INFO",
                    "message": format!("{} paginated operations are valid", entries.len())
                }
            }),
        )
    }

    /// Resolve one operation with its configured end behavior and page size
    fn resolve(
        &self,
        model: &SmithyModel,
        config: Option<&RuntimeConfig>,
        operation: &str,
    ) -> Result<PaginatedOperation> {
        let behavior = config
            .map(|c| c.end_behavior_for(operation))
            .unwrap_or_default();
        let resolved = model.resolve(operation, behavior)?;

        if let Some(size) = config.and_then(|c| c.page_size_for(operation)) {
            resolved.prepare_input(Value::Null, Some(size))?;
        }
        Ok(resolved)
    }

    /// Print every page
    async fn pages<W: Write>(&self, args: &RunArgs, out: &mut W) -> Result<()> {
        let run = self.prepare_run(args)?;
        let operation = run.operation.name().to_string();
        let started = Instant::now();

        let mut pages = pin!(run
            .operation
            .paginate_with(run.fetcher, run.input)
            .take(run.max_pages));

        let mut count = 0usize;
        while let Some(page) = pages.next().await {
            let page = page?;
            count += 1;
            self.output_message(
                out,
                &json!({
                    "type": "PAGE",
                    "operation": operation,
                    "page": count,
                    "body": page.into_body()
                }),
            )?;
        }

        info!(
            operation = %operation,
            pages = count,
            elapsed = ?started.elapsed(),
            "Pagination finished"
        );
        Ok(())
    }

    /// Print every item
    async fn items<W: Write>(&self, args: &RunArgs, out: &mut W) -> Result<()> {
        let run = self.prepare_run(args)?;
        let operation = run.operation.name().to_string();
        if run.operation.items().is_none() {
            return Err(Error::config(format!(
                "Operation '{operation}' has no items member"
            )));
        }
        let started = Instant::now();

        let pages = run
            .operation
            .paginate_with(run.fetcher, run.input)
            .take(run.max_pages);
        let mut items = pin!(Items::new(pages, JsonPage::into_items));

        let mut count = 0usize;
        while let Some(item) = items.next().await {
            let item = item?;
            count += 1;
            self.output_message(
                out,
                &json!({
                    "type": "ITEM",
                    "operation": operation,
                    "item": item
                }),
            )?;
        }

        info!(
            operation = %operation,
            items = count,
            elapsed = ?started.elapsed(),
            "Pagination finished"
        );
        Ok(())
    }

    /// Everything a page-fetching command needs, checked before any request
    fn prepare_run(&self, args: &RunArgs) -> Result<PreparedRun> {
        let model = self.load_model()?;
        let config = self.require_config()?;

        let id = model.find_operation(&args.operation)?;
        let operation = model.resolve(id, config.end_behavior_for(id))?;

        let input = match args.input_json.as_deref() {
            Some(json) => serde_json::from_str(json).context("Invalid --input-json")?,
            None => Value::Null,
        };
        let page_size = args.page_size.or_else(|| config.page_size_for(id));
        let input = operation.prepare_input(input, page_size)?;

        let fetcher: Arc<dyn PageFetcher> = Arc::new(config.operation_client()?);
        let max_pages = match args.max_pages {
            Some(0) => usize::MAX,
            Some(limit) => limit,
            None => config.max_pages().unwrap_or(usize::MAX),
        };

        info!(operation = %short_name(id), ?page_size, "Starting pagination");
        Ok(PreparedRun {
            operation: Arc::new(operation),
            fetcher,
            input,
            max_pages,
        })
    }

    fn output_message<W: Write>(&self, out: &mut W, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(out, "{line}")?;
        Ok(())
    }
}

struct PreparedRun {
    operation: Arc<PaginatedOperation>,
    fetcher: Arc<dyn PageFetcher>,
    input: Value,
    max_pages: usize,
}
