use adamant_core::{ValidationCache, ValidationContext};
use adamant_guard::{load_schema, render_registry_summary, verify_registry};

fn main() {
    let exit_code = match run(std::env::args().skip(1).collect()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(args: Vec<String>) -> Result<i32, String> {
    if args.is_empty() {
        return Err(usage());
    }

    match args[0].as_str() {
        "schema" => run_schema(&args[1..]),
        "help" | "--help" | "-h" => {
            println!("{}", usage());
            Ok(0)
        }
        other => Err(format!("unknown subcommand '{other}'\n\n{}", usage())),
    }
}

fn usage() -> String {
    [
        "adamant-verify usage:",
        "  adamant-verify schema --input <schema.json> [--summary] [--trace-id <id>]",
        "",
        "exit codes:",
        "  0   every registered type and family is structurally immutable",
        "  21  at least one target was rejected",
        "  2   CLI/input error",
    ]
    .join("\n")
}

fn run_schema(args: &[String]) -> Result<i32, String> {
    let mut input_path: Option<&str> = None;
    let mut trace_id: Option<&str> = None;
    let mut summary = false;

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--input" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--input requires a path".to_string())?;
                input_path = Some(value);
            }
            "--trace-id" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--trace-id requires a value".to_string())?;
                trace_id = Some(value);
            }
            "--summary" => summary = true,
            flag => return Err(format!("unknown flag for schema: {flag}")),
        }
        index += 1;
    }

    let input_path = input_path.ok_or_else(|| "missing required --input <path>".to_string())?;
    let schema = load_schema(input_path).map_err(|error| error.to_string())?;
    let ctx = ValidationContext::new(trace_id.unwrap_or("trace-adamant-verify"));

    let report = verify_registry(&schema, ValidationCache::shared(), &ctx)
        .map_err(|error| error.to_string())?;

    if summary {
        println!("{}", render_registry_summary(&report));
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|error| format!("failed to encode sweep report: {error}"))?
        );
    }
    Ok(report.exit_code())
}
