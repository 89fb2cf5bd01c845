//! Script state dumping tool
//!
//! Loads one or more scripts and prints, per script, the requirement set, the
//! framebuffer format, the vertex layout and the materialized state of every
//! distinct pipeline as JSON.

use serde::Serialize;
use std::{env, process};
use vkscript_config::{GraphicsPipelineState, PipelineKind, PipelineSet, Requirements, Script, Stage, Vbo, WindowFormat};

/// One distinct pipeline of a script
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PipelineDump {
    Graphics(GraphicsPipelineState),
    Compute { entry_point: String },
}

/// Everything dumped for one script
#[derive(Debug, Serialize)]
struct ScriptDump<'a> {
    path: &'a str,
    requirements: &'a Requirements,
    required_features: Vec<&'static str>,
    window_format: &'a WindowFormat,
    vertex_data: Option<&'a Vbo>,
    pipelines: Vec<PipelineDump>,
}

fn dump_script(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let script = Script::from_file(path)?;
    let set = PipelineSet::new(&script);

    let pipelines = set
        .keys()
        .iter()
        .map(|key| match key.kind() {
            PipelineKind::Graphics => PipelineDump::Graphics(key.materialize(set.stages(), 1)),
            PipelineKind::Compute => PipelineDump::Compute {
                entry_point: key.entrypoint(Stage::Compute).to_string(),
            },
        })
        .collect();

    let dump = ScriptDump {
        path,
        requirements: script.requirements(),
        required_features: script.requirements().feature_names().collect(),
        window_format: script.window_format(),
        vertex_data: script.vertex_data(),
        pipelines,
    };

    Ok(serde_json::to_string_pretty(&dump)?)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <script>...", args[0]);
        eprintln!("Prints the requirements and pipeline state of each script as JSON");
        process::exit(1);
    }

    let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error installing logger: {e}");
    }

    let mut failed = false;
    for path in &args[1..] {
        match dump_script(path) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("{path}: {e}");
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
