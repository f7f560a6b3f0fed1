use jfunc::{
    DocumentPipeline, Document, FunctionRegistry, JsonFileStore, LoaderOptions, Method, Pipeline,
    PipelineOptions, RegistryLoader, Request, Visitor,
};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

struct CliVisitor(i64);

impl Visitor for CliVisitor {
    fn visitor_id(&self) -> Option<i64> {
        Some(self.0)
    }
}

fn usage() -> ! {
    eprintln!("Usage: jf '<json document>' [options]");
    eprintln!("       jf --call \"expression\" --json '{{\"key\": \"value\"}}'");
    eprintln!("       jf --self-check");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --functions FILE  Remote function records to load and verify (default: $JFUNC_FUNCTIONS)");
    eprintln!("  --method M        Request method: GET, HEAD, GETS, HEADS, POST, PUT, DELETE (default GET)");
    eprintln!("  --tag T           Request tag");
    eprintln!("  --version N       Request version");
    eprintln!("  --visitor ID      Id of the logged-in visitor");
    eprintln!("  --strict          Only allow functions whitelisted by a loaded record");
    eprintln!("  --output-json     Wrap --call results with type and timing");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  jf --call \"countArray(array)\" --json '{{\"array\": [1, 2, 3]}}'");
    eprintln!("  jf --call \"getFromArray(array,@position)\" --json '{{\"array\": [5, 6], \"position\": 1}}'");
    eprintln!("  jf '{{\"array\": [1, 2], \"size()\": \"countArray(array)\"}}'");
    eprintln!("  jf '{{\"id\": 1, \"ok()\": \"isContain(array,id)\", \"array\": [1]}}' --functions functions.json --strict");
    std::process::exit(1);
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(v) => v.as_str(),
        None => fail(format!("{} flag requires an argument", flag)),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut document = None;
    let mut call = None;
    let mut json_input = None;
    let mut functions = std::env::var("JFUNC_FUNCTIONS").ok();
    let mut method = Method::Get;
    let mut tag = None;
    let mut version = 0;
    let mut visitor = None;
    let mut pipeline_options = PipelineOptions::from_env();
    let mut output_json = false;
    let mut self_check = false;
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--self-check" => self_check = true,
            "--strict" => pipeline_options.require_whitelist = true,
            "--output-json" => output_json = true,
            "--call" => {
                call = Some(value_of(&args, i, arg).to_string());
                i += 1;
            }
            "--json" => {
                json_input = Some(value_of(&args, i, arg).to_string());
                i += 1;
            }
            "--functions" => {
                functions = Some(value_of(&args, i, arg).to_string());
                i += 1;
            }
            "--method" => {
                method = Method::from_str(value_of(&args, i, arg)).unwrap_or_else(|e| fail(e));
                i += 1;
            }
            "--tag" => {
                tag = Some(value_of(&args, i, arg).to_string());
                i += 1;
            }
            "--version" => {
                version = value_of(&args, i, arg)
                    .parse::<i32>()
                    .unwrap_or_else(|e| fail(format!("invalid --version: {}", e)));
                i += 1;
            }
            "--visitor" => {
                let id = value_of(&args, i, arg)
                    .parse::<i64>()
                    .unwrap_or_else(|e| fail(format!("invalid --visitor: {}", e)));
                visitor = Some(id);
                i += 1;
            }
            "-h" | "--help" => usage(),
            _ if document.is_none() && !arg.starts_with("--") => document = Some(arg.to_string()),
            _ => fail(format!("unexpected argument '{}'", arg)),
        }
        i += 1;
    }

    let registry = Arc::new(FunctionRegistry::with_builtins());
    if let Some(path) = functions {
        let loader = RegistryLoader::new(
            Arc::clone(&registry),
            Arc::new(JsonFileStore::new(&path)),
            Arc::new(DocumentPipeline::new(pipeline_options)),
            LoaderOptions::from_env(),
        );
        match loader.refresh_all() {
            Ok(report) => eprintln!("Loaded {} remote function(s) from {}", report.functions.len(), path),
            Err(e) => fail(e),
        }
    }
    let snapshot = registry.snapshot();

    if self_check {
        match jfunc::self_check(&snapshot) {
            Ok(()) => println!("self-check passed"),
            Err(e) => fail(e),
        }
        return;
    }

    if let Some(expr) = call {
        let mut doc = match json_input.as_deref().map(Document::from_json) {
            None => Document::new(),
            Some(Ok(doc)) => doc,
            Some(Err(e)) => fail(format!("Invalid JSON: {}", e)),
        };
        let start_time = Instant::now();
        let cli_visitor = visitor.map(CliVisitor);
        let mut scope = jfunc::Scope::new(&mut doc);
        if let Some(v) = cli_visitor.as_ref() {
            scope = scope.with_visitor(v);
        }
        let result = jfunc::invoker::call(&snapshot, expr.trim(), &mut scope);
        let execution_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(value) if output_json => {
                let output = json!({
                    "result": value,
                    "type": jfunc::runtime::introspection::type_name(&value),
                    "execution_time": format!("{:.2} ms", execution_time_ms)
                });
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string()));
            }
            Ok(value) => println!("{}", value),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
        }
        return;
    }

    let body = match document.as_deref().map(Document::from_json) {
        Some(Ok(doc)) => doc,
        Some(Err(e)) => fail(format!("Invalid JSON document: {}", e)),
        None => usage(),
    };
    let mut request = Request::new(method, body).with_tag(tag).with_version(version);
    if let Some(id) = visitor {
        request = request.with_visitor(Arc::new(CliVisitor(id)));
    }
    let response = DocumentPipeline::new(pipeline_options).run_request(&snapshot, request);
    println!("{}", serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string()));
    if !response.is_success() {
        std::process::exit(2);
    }
}
