//! # custody-slip CLI
//!
//! Usage:
//!   custody-slip input.json -o out/
//!   echo '{ ... }' | custody-slip -o out/
//!   custody-slip input.json --config config.json --seed 42
//!   custody-slip --example > slip.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use custody_slip::{DirectorySink, Engine, EngineConfig, Outcome, RenderContext, RenderTarget, SlipInput};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_slip_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let input_json = match args.get(1).filter(|a| !a.starts_with('-')) {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let config = match flag_value(args, "--config") {
        Some(path) => EngineConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let output_dir = flag_value(args, "-o").unwrap_or(".");

    let mut ctx = match flag_value(args, "--seed") {
        Some(seed) => RenderContext::seeded(RenderContext::now().timestamp, seed.parse()?),
        None => RenderContext::now(),
    };

    let input: SlipInput = serde_json::from_str(&input_json).map_err(custody_slip::SlipError::from)?;
    let engine = Engine::new(config);
    let mut sink = DirectorySink::new(output_dir);

    if let Outcome::Delivered { filename, bytes } = engine.generate(&input, &mut ctx, RenderTarget::File(&mut sink))? {
        eprintln!("✓ Written {} bytes to {}", bytes, sink.dir().join(filename).display());
    }
    Ok(())
}

fn example_slip_json() -> &'static str {
    r##"{
  "item": {
    "code": "LAP-2025-001",
    "name": "Laptop",
    "description": "14 inch, 16GB RAM, 512GB SSD",
    "quantity": 1,
    "unit": "unit",
    "unitPrice": "45000.00"
  },
  "assignee": { "name": "Maria Santos", "position": "Teacher III" },
  "entity": { "name": "Rizal National High School" },
  "custody": {
    "fundCluster": "01",
    "estimatedUsefulLife": "5 years",
    "transferDate": "2025-03-15",
    "receivedFrom": { "name": "Jose Cruz", "position": "Property Custodian" }
  }
}
"##
}
