use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

use batch_converter::{BatchConverter, ConverterConfig, prepare};
use code_synthesizer::tool_descriptions;
use prompt_rewriter::rewrite_prompt;
use react_runtime::{
    AgentState, ClientConfig, OpenAiCompatClient, ReactRuntime, Termination, ToolRegistry,
};
use source_extractor::{ParamType, ToolDefinition, ToolParameter, is_already_converted};

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_convert_overrides(
    cfg: &mut ConverterConfig,
    roots: Vec<PathBuf>,
    pattern: Option<String>,
    jobs: Option<usize>,
) {
    if !roots.is_empty() {
        cfg.batch.roots = roots;
    }
    if let Some(pattern) = pattern {
        cfg.batch.pattern = pattern;
    }
    if let Some(jobs) = jobs {
        cfg.batch.concurrent_limit = jobs;
    }
}

pub async fn run_convert(cfg: ConverterConfig, dry_run: bool) -> Result<()> {
    info!(
        "Converting {} under {:?}",
        cfg.batch.pattern, cfg.batch.roots
    );
    let converter = BatchConverter::new(cfg);
    let summary = converter.run(dry_run).await?;
    println!("{}", summary);

    if summary.is_success() {
        Ok(())
    } else {
        Err(anyhow!("{} file(s) failed to convert", summary.failed))
    }
}

pub fn run_preview(path: &Path, cfg: &ConverterConfig, full: bool) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    if is_already_converted(&text) {
        println!("{} is already converted", path.display());
        return Ok(());
    }

    let prepared =
        prepare(&text, cfg).with_context(|| format!("Cannot convert {}", path.display()))?;
    if full {
        print!("{}", prepared.generated.text);
        return Ok(());
    }

    let bundle = &prepared.bundle;
    println!("File: {}", path.display());
    println!("Tools ({}):", bundle.tools.len());
    println!("{}", tool_descriptions(&bundle.tools));
    match &bundle.prompt {
        Some(prompt) => println!("Prompt: {}", prompt.source),
        None => println!("Prompt: not found, default prompt used"),
    }
    println!(
        "Helper: {}",
        bundle
            .helper
            .as_ref()
            .map(|h| h.name.as_str())
            .unwrap_or("default read_input_file")
    );
    let names = |items: Vec<&str>| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };
    println!(
        "State: {}",
        names(bundle.state.iter().map(|s| s.name.as_str()).collect())
    );
    println!(
        "Support: {}",
        names(bundle.support.iter().map(|s| s.name.as_str()).collect())
    );
    println!("Carried imports: {}", bundle.imports.len());
    for warning in &bundle.warnings {
        println!("Warning: {}", warning);
    }
    println!("Tools section: {:?}", prepared.prompt.section);
    println!("--- prompt template ---");
    println!("{}", prepared.prompt.template);
    Ok(())
}

const CHECK_PROMPT: &str = "You are checking connectivity. Follow the response format exactly.";
const CHECK_TASK: &str =
    "Call the echo tool with the text \"ping\", then give its result as the final answer.";

fn echo_definition() -> ToolDefinition {
    ToolDefinition {
        name: "echo".to_string(),
        parameters: vec![ToolParameter {
            name: "text".to_string(),
            param_type: ParamType::String,
            has_default: false,
        }],
        docstring: Some("Return the given text unchanged.".to_string()),
        source: String::new(),
        line: 0,
    }
}

fn echo_tools() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register("echo", "Return the given text unchanged.", |args, state| {
        let text = args
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("missing string argument 'text'"))?;
        state.set("echoed", json!(text));
        Ok(text.to_string())
    });
    tools
}

pub async fn run_check_endpoint(
    cfg: &ConverterConfig,
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let client_cfg = ClientConfig {
        base_url: base_url.unwrap_or_else(|| cfg.generation.default_base_url.clone()),
        model: model.unwrap_or_else(|| cfg.generation.default_model.clone()),
        api_key: api_key.unwrap_or_else(|| cfg.generation.default_api_key.clone()),
        ..ClientConfig::default()
    };
    println!("Checking {} with model {}", client_cfg.base_url, client_cfg.model);
    let client = OpenAiCompatClient::new(client_cfg)?;

    let prompt = rewrite_prompt(CHECK_PROMPT, &["echo"]);
    let runtime = ReactRuntime::new(client, echo_tools(), prompt.template)
        .with_tool_descriptions(tool_descriptions(&[echo_definition()]))
        .with_max_iterations(cfg.generation.max_iterations);

    let mut state = AgentState::from_value(json!({ "echoed": null }));
    let report = runtime
        .run(CHECK_TASK, &mut state)
        .await
        .context("Endpoint check failed")?;

    println!("Iterations: {}", report.iterations);
    println!("Answer: {}", report.answer);
    println!("Echo tool called: {}", state.get("echoed") != Some(&Value::Null));

    match report.termination {
        Termination::FinalAnswer => {
            println!("Endpoint follows the response protocol");
            Ok(())
        }
        Termination::ImplicitAnswer => {
            warn!("Endpoint answered without the final answer marker");
            println!("Endpoint answered, but without the protocol's final answer marker");
            Ok(())
        }
        Termination::BudgetExhausted => Err(anyhow!(
            "No final answer within {} iteration(s)",
            report.iterations
        )),
    }
}
