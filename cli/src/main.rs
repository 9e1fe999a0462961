//! rowcast CLI: driving adapter for the rowcast casting and filtering engine.
//!
//! Subcommands:
//! - `filter <rows.json> <criteria>`: print the rows kept by a criteria file
//! - `cast <type> [--shape S] [--delimiter D] [--element T] <raw>...`: cast raw cells
//! - `check <criteria>`: validate a criteria file loads without errors
//! - `info`: print the operators and built-in casters

use std::process;

use rowcast::{
    ArrayCaster, ArrayOptions, ArrayShape, CallbackCaster, Caster, CasterRegistry, Comparison,
    CriteriaConfig, Key, Predicate, Type, TypeDeclaration, Value,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Raw argument standing for a null cell.
const NULL_ARG: &str = "--null";

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "filter" => cmd_filter(&args[2..]),
        "cast" => cmd_cast(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "info" => cmd_info(),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_filter(args: &[String]) -> Result<(), String> {
    let [rows_path, criteria_path] = args else {
        return Err("filter requires a rows file and a criteria file".into());
    };

    let rows = load_rows(rows_path)?;
    let criteria = load_criteria(criteria_path)?
        .load()
        .map_err(|e| format!("criteria invalid: {e}"))?;

    let kept: Vec<(Key, Value)> = criteria
        .filter_array(rows)
        .map_err(|e| format!("filter failed: {e}"))?;
    tracing::info!(kept = kept.len(), "filtered rows");

    let out = serde_json::to_string_pretty(&kept).map_err(|e| format!("JSON write error: {e}"))?;
    println!("{out}");
    Ok(())
}

fn cmd_cast(args: &[String]) -> Result<(), String> {
    let request = parse_cast(args)?;
    let caster = build_caster(&request)?;

    for raw in &request.raws {
        let value = caster
            .to_variable(raw.as_deref())
            .map_err(|e| e.to_string())?;
        let out = serde_json::to_string(&value).map_err(|e| format!("JSON write error: {e}"))?;
        println!("{out}");
    }
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let [criteria_path] = args else {
        return Err("check requires a criteria file path".into());
    };

    let config = load_criteria(criteria_path)?;
    config
        .load()
        .map_err(|e| format!("criteria invalid: {e}"))?;

    println!("Criteria valid (depth {})", config.depth());
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Uniform return type for all commands
fn cmd_info() -> Result<(), String> {
    println!("Operators:");
    for comparison in Comparison::ALL {
        println!("  {comparison}");
    }

    let registry = CasterRegistry::with_builtin_casters();
    println!("\nBuilt-in casters:");
    for t in Type::ALL {
        if registry.supports_type(t.as_str()) {
            println!("  {t}");
        }
    }
    println!("  array (list, csv, json)");

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Caster assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
struct CastRequest {
    types: String,
    options: ArrayOptions,
    raws: Vec<Option<String>>,
}

fn build_caster(request: &CastRequest) -> Result<Box<dyn Caster>, String> {
    let declaration = TypeDeclaration::parameter(None, "cast", "value").with_types(&request.types);
    let is_array = declaration
        .candidates()
        .iter()
        .filter_map(|c| c.name.builtin())
        .any(|t| t.is_one_of(&[Type::Array, Type::Iterable]));

    if is_array {
        let caster = ArrayCaster::new(&declaration, request.options.clone())
            .map_err(|e| e.to_string())?;
        return Ok(Box::new(caster));
    }

    let registry = CasterRegistry::with_builtin_casters();
    let caster = CallbackCaster::new(&registry, &declaration, None).map_err(|e| e.to_string())?;
    Ok(Box::new(caster))
}

// ═══════════════════════════════════════════════════════════════════════════════
// File loading
// ═══════════════════════════════════════════════════════════════════════════════

fn read(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))
}

fn is_json(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn load_criteria(path: &str) -> Result<CriteriaConfig, String> {
    let content = read(path)?;
    if is_json(path) {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

fn load_rows(path: &str) -> Result<Vec<Value>, String> {
    let content = read(path)?;
    let rows: Vec<Value> = if is_json(path) {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))?
    } else {
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))?
    };
    tracing::debug!(path, rows = rows.len(), "loaded rows");
    Ok(rows)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_cast(args: &[String]) -> Result<CastRequest, String> {
    let Some((types, rest)) = args.split_first() else {
        return Err("cast requires a type".into());
    };

    let mut options = ArrayOptions::default();
    let mut raws = Vec::new();
    let mut i = 0;

    while i < rest.len() {
        let arg = rest[i].as_str();
        match arg {
            "--shape" => {
                options.shape = flag_value(rest, &mut i)?
                    .parse::<ArrayShape>()
                    .map_err(|e| e.to_string())?;
            }
            "--delimiter" => options.delimiter = flag_value(rest, &mut i)?.to_owned(),
            "--enclosure" => options.enclosure = flag_value(rest, &mut i)?.to_owned(),
            "--element" => {
                options.element_type = flag_value(rest, &mut i)?
                    .parse::<Type>()
                    .map_err(|e| e.to_string())?;
            }
            NULL_ARG => raws.push(None),
            raw => raws.push(Some(raw.to_owned())),
        }
        i += 1;
    }

    if raws.is_empty() {
        return Err("cast requires at least one raw value".into());
    }

    Ok(CastRequest {
        types: types.clone(),
        options,
        raws,
    })
}

fn flag_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, String> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn print_usage() {
    eprintln!(
        "Usage: rowcast <command> [options]

Commands:
  filter <rows> <criteria>                 Print the rows kept by the criteria
  cast <type> [options] <raw>...           Cast raw cells (use --null for a null cell)
      --shape list|csv|json                Array shape (array and iterable types)
      --delimiter <d>                      Array delimiter
      --enclosure <e>                      CSV enclosure
      --element <type>                     Array element type
  check <criteria>                         Validate a criteria file
  info                                     Print operators and built-in casters
  help                                     Show this help

Files ending in .json are read as JSON, anything else as YAML.
Set RUST_LOG (e.g. RUST_LOG=rowcast=debug) for diagnostics."
    );
}
